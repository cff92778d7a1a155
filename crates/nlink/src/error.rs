use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubscriberError {
    #[error(transparent)]
    Protocol(#[from] nlink_protocol::ProtocolError),

    #[error(transparent)]
    Transport(#[from] nlink_transport::TransportError),

    #[error("failed to serialize CONNECT options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to connect: {0}")]
    ConnectFailed(String),

    #[error("fetch timed out")]
    Timeout,

    #[error("subscriber disconnected")]
    Disconnected,
}
