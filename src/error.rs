//! Error types for pagebd.

use std::io;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error text reported by the driver, surfaced verbatim.
    #[error("{0}")]
    Driver(String),

    #[error("image-format provisioning requires a header codec")]
    HeaderCodecRequired,

    #[error("header codec produced {actual} bytes, expected {expected}")]
    HeaderSize { expected: u64, actual: u64 },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Field-level descriptor validation errors. Returned before any channel
/// or network call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid name: {reason}")]
    InvalidName { reason: &'static str },

    #[error("invalid sector count: must not be zero")]
    ZeroSectorCount,

    #[error("invalid account name: {reason}")]
    InvalidAccountName { reason: &'static str },

    #[error("invalid account key: {reason}")]
    InvalidAccountKey { reason: &'static str },

    #[error("invalid path: {reason}")]
    InvalidPath { reason: &'static str },

    #[error("invalid host: {reason}")]
    InvalidHost { reason: &'static str },

    #[error("invalid lease id: {reason}")]
    InvalidLeaseId { reason: &'static str },

    #[error("cannot resolve host: {host}")]
    UnresolvableHost { host: String },
}

/// Control channel failures. Never retried and never wrapped into
/// validation errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("payload is {length} bytes, command buffer holds {max}")]
    PayloadTooLarge { length: usize, max: usize },

    #[error("command did not complete within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("control channel handle is no longer usable")]
    ChannelClosed,

    #[error("channel error: {0}")]
    Io(#[from] io::Error),
}

/// Wire codec and response framing errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("descriptor frame has {actual} fields, expected 10 or 12")]
    FieldCount { actual: usize },

    #[error("unknown disk type token: {token:?}")]
    InvalidDiskType { token: String },

    #[error("field {field} is not a valid number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field {field} must not contain a newline")]
    EmbeddedNewline { field: &'static str },

    #[error("response buffer has no status line")]
    MissingStatusLine,

    #[error("response buffer is not valid utf-8")]
    InvalidUtf8,
}

/// Object store errors, propagated from the external collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("container {container} does not exist")]
    ContainerNotFound { container: String },

    #[error("blob at {path} does not exist")]
    BlobNotFound { path: String },

    #[error("blob at {path} is not a page blob")]
    NotAPageBlob { path: String },

    #[error("lease rejected for blob at {path}")]
    LeaseMismatch { path: String },

    #[error("range write out of bounds: offset {offset} + length {length} exceeds blob size {size}")]
    RangeOutOfBounds { offset: u64, length: u64, size: u64 },

    #[error("page blob size {size_bytes} is not 512-byte aligned")]
    UnalignedSize { size_bytes: u64 },

    #[error("invalid blob size: {reason}")]
    InvalidSize { reason: &'static str },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid configuration: {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::RangeOutOfBounds {
            offset: 1024,
            length: 512,
            size: 1024,
        };
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn driver_error_is_verbatim() {
        let err = Error::Driver("bad lease\n".to_string());
        assert_eq!(err.to_string(), "bad lease\n");
    }
}
