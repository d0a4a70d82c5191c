//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 transport the mock server runs on,
//! with support for keep-alive connections.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation and the path used for matching
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Dispatch (may wait out a delay)
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closed
//! ```
//!
//! Malformed requests skip `Processing`: an error response is written and the
//! connection closes. A shutdown during `Reading` or during a delay in
//! `Processing` moves straight to `Closed`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use httpmocker::http::connection::Connection;
//! use httpmocker::lifecycle::ShutdownSignal;
//! use httpmocker::mock::Dispatcher;
//! use tokio::net::TcpListener;
//!
//! async fn serve(dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let dispatcher = Arc::clone(&dispatcher);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, Some(addr), dispatcher, ShutdownSignal::never());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
