use nlink_utils::BufferError;
use thiserror::Error;

/// Errors surfaced while parsing, formatting, or otherwise manipulating
/// [`crate::Message`]/[`crate::Headers`] values.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("header name must not be empty")]
    BadName,

    #[error("header value must not be empty")]
    BadValue,

    #[error("headers iterator requested on an empty header block")]
    NoHeaders,

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
