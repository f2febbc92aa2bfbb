//! JSON-RPC 2.0 over length-prefixed frames on stdin/stdout.
//!
//! Frame format:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <JSON payload>
//! ```
//! Headers are accepted with `\r\n` or `\n` endings, and a trailing header
//! line with no terminator at EOF is tolerated.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC error codes the server emits.
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// Wire-level failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

/// A JSON-RPC error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC notification (no id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// A server-initiated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    pub params: Value,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
        }
    }
}

impl Request {
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: Value::String(id.into()),
            method: method.into(),
            params,
        }
    }
}

/// Read one framed message. `Ok(None)` means clean EOF.
pub fn read_message(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut header = String::new();
        let bytes_read = reader.read_line(&mut header)?;
        if bytes_read == 0 {
            return Ok(None); // EOF.
        }

        let header = header.trim();
        if header.is_empty() {
            break; // End of headers.
        }

        if let Some(rest) = header.strip_prefix("Content-Length:") {
            content_length = rest.trim().parse().ok();
        }
        // Other headers (Content-Type, ...) are ignored.
    }

    let length = content_length.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length header")
    })?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;

    String::from_utf8(body)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write one framed message.
pub fn write_message(writer: &mut impl Write, content: &str) -> io::Result<()> {
    write!(
        writer,
        "Content-Length: {}\r\n\r\n{}",
        content.len(),
        content
    )?;
    writer.flush()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_message() {
        let input = "Content-Length: 13\r\n\r\n{\"test\":true}";
        let mut reader = io::BufReader::new(input.as_bytes());
        let msg = read_message(&mut reader).unwrap();
        assert_eq!(msg, Some("{\"test\":true}".into()));
    }

    #[test]
    fn test_read_message_unix_endings() {
        let input = "Content-Length: 13\n\n{\"test\":true}";
        let mut reader = io::BufReader::new(input.as_bytes());
        let msg = read_message(&mut reader).unwrap();
        assert_eq!(msg, Some("{\"test\":true}".into()));
    }

    #[test]
    fn test_read_message_extra_headers() {
        let input =
            "Content-Length: 2\r\nContent-Type: application/vscode-jsonrpc\r\n\r\n{}";
        let mut reader = io::BufReader::new(input.as_bytes());
        assert_eq!(read_message(&mut reader).unwrap(), Some("{}".into()));
    }

    #[test]
    fn test_read_message_eof() {
        let mut reader = io::BufReader::new("".as_bytes());
        assert_eq!(read_message(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_read_message_trailing_header_at_eof() {
        // A lone header line with no terminator: EOF mid-headers.
        let mut reader = io::BufReader::new("Content-Length: 5".as_bytes());
        let err = read_message(&mut reader);
        // The header parses but the body read hits EOF.
        assert!(err.is_err() || err.unwrap().is_none());
    }

    #[test]
    fn test_missing_content_length() {
        let input = "Content-Type: foo\r\n\r\n{}";
        let mut reader = io::BufReader::new(input.as_bytes());
        assert!(read_message(&mut reader).is_err());
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let content = r#"{"jsonrpc":"2.0","id":42,"result":null}"#;
        let mut buf = Vec::new();
        write_message(&mut buf, content).unwrap();
        assert!(String::from_utf8_lossy(&buf).starts_with("Content-Length: 39\r\n\r\n"));

        let mut reader = io::BufReader::new(buf.as_slice());
        assert_eq!(read_message(&mut reader).unwrap(), Some(content.into()));
    }

    #[test]
    fn test_response_shapes() {
        let ok = Response::success(serde_json::json!(1), Value::Null);
        assert!(ok.result.is_some());
        assert!(ok.error.is_none());

        let err = Response::error(serde_json::json!(1), METHOD_NOT_FOUND, "nope");
        assert_eq!(err.error.as_ref().unwrap().code, -32601);
        let encoded = serde_json::to_string(&err).unwrap();
        assert!(!encoded.contains("\"result\""));
    }
}
