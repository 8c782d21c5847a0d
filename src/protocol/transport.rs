use std::io::{self, Read, Write};

use thiserror::Error;

use super::response::ResponseEnvelope;

/// Length of the fixed16 response preamble.
pub(crate) const HEADER_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed fixed16 header '{0}'")]
    MalformedHeader(String),
}

pub struct ProtocolTransport<T: Read + Write> {
    stream: T,
}

impl<T: Read + Write> ProtocolTransport<T> {
    pub fn new(stream: T) -> Self {
        Self { stream }
    }

    /// Write the full request text to the stream.
    pub fn write_request(&mut self, request: &str) -> Result<(), TransportError> {
        self.stream.write_all(request.as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    /// Read one framed response: the 16-byte fixed16 header followed by a
    /// body of the declared length.
    pub fn read_envelope(&mut self) -> Result<ResponseEnvelope, TransportError> {
        let mut header = [0u8; HEADER_LEN];
        self.stream.read_exact(&mut header)?;

        let (status, length) = parse_header(&header)?;
        let body = self.read_body(length)?;

        Ok(ResponseEnvelope {
            status,
            length,
            body,
        })
    }

    // A zero-byte read means the daemon closed the connection; anything
    // short of the declared length is handed on as-is.
    fn read_body(&mut self, length: usize) -> Result<Vec<u8>, TransportError> {
        let mut body = vec![0u8; length];
        let mut offset = 0;

        while offset < length {
            let read = self.stream.read(&mut body[offset..])?;
            if read == 0 {
                body.truncate(offset);
                break;
            }
            offset += read;
        }

        Ok(body)
    }
}

/// Parse the 3-digit status code and the whitespace-padded decimal body
/// length out of a fixed16 header.
fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(u16, usize), TransportError> {
    let malformed =
        || TransportError::MalformedHeader(String::from_utf8_lossy(header).trim_end().to_string());

    let status = std::str::from_utf8(&header[..3])
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(malformed)?;
    let length = std::str::from_utf8(&header[4..15])
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .ok_or_else(malformed)?;

    Ok((status, length))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Seek};

    use super::*;

    fn framed(status: u16, body: &str) -> Vec<u8> {
        let mut frame = format!("{status} {:>11}\n", body.len()).into_bytes();
        frame.extend_from_slice(body.as_bytes());
        frame
    }

    #[test]
    fn write_request_sends_all_bytes() {
        let stream = Cursor::new(Vec::new());
        let mut transport = ProtocolTransport::new(stream);

        transport
            .write_request("GET hosts\nResponseHeader: fixed16\n\n")
            .unwrap();

        assert_eq!(
            transport.stream.into_inner(),
            b"GET hosts\nResponseHeader: fixed16\n\n"
        );
    }

    #[test]
    fn read_envelope_parses_header_and_body() {
        let body = r#"[["web1","Web Server 1"]]"#;
        let mut transport = ProtocolTransport::new(Cursor::new(framed(200, body)));

        let envelope = transport.read_envelope().unwrap();

        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.length, body.len());
        assert_eq!(envelope.body, body.as_bytes());
    }

    #[test]
    fn read_envelope_keeps_error_statuses() {
        let mut transport =
            ProtocolTransport::new(Cursor::new(framed(404, "Table 'foo' does not exist.")));

        let envelope = transport.read_envelope().unwrap();

        assert_eq!(envelope.status, 404);
        assert_eq!(envelope.body, b"Table 'foo' does not exist.");
    }

    #[test]
    fn short_body_stops_at_connection_close() {
        let mut frame = framed(200, "[[1,2]]");
        frame.truncate(HEADER_LEN + 4);
        let mut transport = ProtocolTransport::new(Cursor::new(frame));

        let envelope = transport.read_envelope().unwrap();

        assert_eq!(envelope.length, 7);
        assert_eq!(envelope.body, b"[[1,");
    }

    #[test]
    fn garbage_header_is_rejected() {
        let mut transport = ProtocolTransport::new(Cursor::new(b"not a header at a".to_vec()));

        let res = transport.read_envelope();

        assert!(matches!(res, Err(TransportError::MalformedHeader(_))));
    }

    #[test]
    fn truncated_header_is_an_io_error() {
        let mut transport = ProtocolTransport::new(Cursor::new(b"200 1\n".to_vec()));

        let res = transport.read_envelope();

        assert!(matches!(res, Err(TransportError::Io(_))));
    }

    #[test]
    fn request_then_response_over_one_stream() {
        let stream = Cursor::new(Vec::new());
        let mut transport = ProtocolTransport::new(stream);

        transport.write_request("GET status\n\n").unwrap();
        transport
            .stream
            .get_mut()
            .extend_from_slice(&framed(200, "[]"));
        transport
            .stream
            .seek(std::io::SeekFrom::Start("GET status\n\n".len() as u64))
            .unwrap();

        let envelope = transport.read_envelope().unwrap();
        assert_eq!(envelope.status, 200);
        assert_eq!(envelope.body, b"[]");
    }
}
