//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use httpmocker::config::Config;
use httpmocker::lifecycle::Shutdown;
use httpmocker::mock::{Dispatcher, TracingObserver};
use httpmocker::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A mock server running on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(config_json: &str) -> Self {
        let table = Config::from_json_str(config_json)
            .unwrap()
            .to_table()
            .unwrap();

        let shutdown = Shutdown::new();
        let dispatcher = Dispatcher::new(table, Arc::new(TracingObserver), shutdown.subscribe());
        let server = Server::bind("127.0.0.1:0".parse().unwrap(), dispatcher, shutdown.subscribe())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    /// Sends `METHOD target` with `Connection: close` and returns the
    /// parsed response.
    pub async fn request(&self, method: &str, target: &str) -> RawResponse {
        let raw = format!("{method} {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        parse_response(&send_raw(self.addr, raw.as_bytes()).await)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Writes `raw` and reads until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    out
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

/// Parses one complete response; everything after the head is the body.
pub fn parse_response(bytes: &[u8]) -> RawResponse {
    let head_end = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response head terminator");
    let head = std::str::from_utf8(&bytes[..head_end]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();

    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(':').unwrap();
            (k.trim().to_string(), v.trim().to_string())
        })
        .collect();

    RawResponse {
        status,
        headers,
        body: bytes[head_end + 4..].to_vec(),
    }
}

pub fn endpoint_json(method: &str, path: &str, status: u16, delay_ms: u64, payload: &str) -> String {
    format!(
        r#"{{"method":"{method}","path":"{path}","status":{status},"delay_ms":{delay_ms},"payload_inline":{payload}}}"#
    )
}

pub fn config_json(endpoints: &[String]) -> String {
    format!(r#"{{"endpoints":[{}]}}"#, endpoints.join(","))
}
