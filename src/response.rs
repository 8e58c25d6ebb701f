//! Response parser: splits a driver buffer into status and payload.

use crate::error::ProtocolError;

/// A parsed driver response. `payload` is everything after the status
/// line, untrimmed; on failure it is the driver's human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverReply {
    pub is_error: bool,
    pub payload: String,
}

/// Parses a response buffer.
///
/// The buffer is reinterpreted as text up to its first NUL (the driver
/// zero-pads the 2048-byte exchange buffer). The substring before the
/// first newline is the status token; the literal `ERR` marks failure and
/// any other token success. A buffer without a newline is a framing error.
pub fn parse(buffer: &[u8]) -> Result<DriverReply, ProtocolError> {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    let text =
        std::str::from_utf8(&buffer[..end]).map_err(|_| ProtocolError::InvalidUtf8)?;

    let newline = text.find('\n').ok_or(ProtocolError::MissingStatusLine)?;
    Ok(DriverReply {
        is_error: &text[..newline] == "ERR",
        payload: text[newline + 1..].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(text: &str) -> Vec<u8> {
        let mut buf = text.as_bytes().to_vec();
        buf.resize(2048, 0);
        buf
    }

    #[test]
    fn error_reply() {
        let reply = parse(&padded("ERR\nbad lease\n")).unwrap();
        assert!(reply.is_error);
        assert_eq!(reply.payload, "bad lease\n");
    }

    #[test]
    fn success_reply() {
        let reply = parse(&padded("OK\nfoo\n")).unwrap();
        assert!(!reply.is_error);
        assert_eq!(reply.payload, "foo\n");
    }

    #[test]
    fn any_non_err_token_is_success() {
        let reply = parse(&padded("DONE\n")).unwrap();
        assert!(!reply.is_error);
        assert_eq!(reply.payload, "");
    }

    #[test]
    fn err_must_match_exactly() {
        let reply = parse(&padded("ERROR\nx\n")).unwrap();
        assert!(!reply.is_error);
    }

    #[test]
    fn padding_is_not_part_of_payload() {
        let reply = parse(&padded("OK\nname\n")).unwrap();
        assert_eq!(reply.payload, "name\n");
    }

    #[test]
    fn missing_newline_is_framing_error() {
        assert!(matches!(
            parse(&padded("ERR")),
            Err(ProtocolError::MissingStatusLine)
        ));
    }

    #[test]
    fn invalid_utf8_is_fatal() {
        let mut buf = padded("OK\n");
        buf[3] = 0xff;
        assert!(matches!(parse(&buf), Err(ProtocolError::InvalidUtf8)));
    }
}
