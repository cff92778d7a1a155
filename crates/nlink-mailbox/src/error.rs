use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    #[error("receive timed out")]
    Timeout,
    #[error("mailbox closed")]
    Closed,
}
