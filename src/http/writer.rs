use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response into its exact wire bytes.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);

    buf
}

pub struct ResponseWriter {
    status: StatusCode,
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            status: response.status,
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseBuilder;

    #[test]
    fn serializes_in_header_order() {
        let response = ResponseBuilder::new(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(br#"{"ok":true}"#.to_vec())
            .build();

        assert_eq!(
            serialize_response(&response),
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\n\r\n{\"ok\":true}"
                .to_vec()
        );
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let response = ResponseBuilder::new(StatusCode::from_u16(299).unwrap()).build();
        let bytes = serialize_response(&response);
        assert!(bytes.starts_with(b"HTTP/1.1 299 \r\n"));
    }

    #[tokio::test]
    async fn writes_whole_buffer() {
        let response = ResponseBuilder::new(StatusCode::NO_CONTENT).build();
        let mut out = Vec::new();
        ResponseWriter::new(&response)
            .write_to_stream(&mut out)
            .await
            .unwrap();
        assert_eq!(out, b"HTTP/1.1 204 No Content\r\n\r\n".to_vec());
    }
}
