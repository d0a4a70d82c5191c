use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::http::connection::Connection;
use crate::lifecycle::ShutdownSignal;
use crate::mock::Dispatcher;

/// How long in-flight connections get to finish after shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub struct Server {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// An address that is already taken is reported as such rather than as
    /// a bare I/O error.
    pub async fn bind(
        addr: SocketAddr,
        dispatcher: Dispatcher,
        shutdown: ShutdownSignal,
    ) -> anyhow::Result<Self> {
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                anyhow::bail!("Port {} already in use", addr.port());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Could not start server on {addr}"));
            }
        };

        Ok(Self {
            listener,
            dispatcher: Arc::new(dispatcher),
            shutdown,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until shutdown, then gives in-flight ones
    /// [`SHUTDOWN_GRACE`] to flush their responses.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    debug!("Accepted connection from {}", peer);

                    let dispatcher = Arc::clone(&self.dispatcher);
                    let shutdown = self.shutdown.clone();
                    connections.spawn(async move {
                        let mut conn = Connection::new(socket, Some(peer), dispatcher, shutdown);
                        if let Err(e) = conn.run().await {
                            debug!("Connection error from {}: {}", peer, e);
                        }
                    });
                }

                Some(_) = connections.join_next(), if !connections.is_empty() => {}

                _ = self.shutdown.recv() => break,
            }
        }

        debug!(in_flight = connections.len(), "Stopped accepting connections");

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(remaining = connections.len(), "Aborting connections still open after grace period");
            connections.abort_all();
        }

        Ok(())
    }
}
