use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Protocol(#[from] nlink_protocol::ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    Closed,

    #[error("failed to connect: {0}")]
    ConnectFailed(String),
}
