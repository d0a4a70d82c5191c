use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::lifecycle::ShutdownSignal;
use crate::mock::{DispatchError, Dispatcher};

const READ_CHUNK: usize = 4096;

pub struct Connection<S = TcpStream> {
    stream: S,
    peer: Option<SocketAddr>,
    buffer: BytesMut,
    state: ConnectionState,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

enum ReadOutcome {
    Request(Request),
    Rejected(ParseError),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: Option<SocketAddr>,
        dispatcher: Arc<Dispatcher>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            dispatcher,
            shutdown,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    ReadOutcome::Request(req) => {
                        self.state = ConnectionState::Processing(req);
                    }
                    ReadOutcome::Rejected(e) => {
                        warn!(peer = ?self.peer, error = %e, "Rejecting malformed request");
                        let mut response = Response::plain(e.status());
                        mark_close(&mut response);
                        self.state = ConnectionState::Writing(ResponseWriter::new(&response), false);
                    }
                    ReadOutcome::Closed => {
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();

                    match self.dispatcher.dispatch(req, self.peer).await {
                        Ok(mut response) => {
                            // Don't hold connections open across shutdown
                            let keep_alive = keep_alive && !self.shutdown.is_triggered();
                            if !keep_alive {
                                mark_close(&mut response);
                            }
                            let writer = ResponseWriter::new(&response);
                            self.state = ConnectionState::Writing(writer, keep_alive);
                        }
                        Err(DispatchError::Interrupted(_)) => {
                            debug!(peer = ?self.peer, "Dropping delayed response on shutdown");
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.dispatcher.response_written(writer.status());

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    // Remove consumed bytes
                    let _ = self.buffer.split_to(consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => return Ok(ReadOutcome::Rejected(e)),
            }

            self.buffer.reserve(READ_CHUNK);
            let n = tokio::select! {
                read = self.stream.read_buf(&mut self.buffer) => read?,
                _ = self.shutdown.recv() => return Ok(ReadOutcome::Closed),
            };

            if n == 0 {
                if !self.buffer.is_empty() {
                    debug!(peer = ?self.peer, pending = self.buffer.len(), "Client closed mid-request");
                }
                // Client closed connection
                return Ok(ReadOutcome::Closed);
            }
        }
    }
}

fn mark_close(response: &mut Response) {
    response
        .headers
        .push(("Connection".to_string(), "close".to_string()));
}
