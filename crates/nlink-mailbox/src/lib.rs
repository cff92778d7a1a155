//! The mailbox contract sitting between the reader thread and a consumer.
//!
//! Per the core's design, the mailbox primitive is an external collaborator:
//! anything thread-safe, FIFO, and bounded with a timed receive satisfies
//! [`Mailbox`]. [`BlockingMailbox`] is the `Mutex`/`Condvar`-backed default
//! this crate ships so the rest of nlink compiles and tests end to end
//! without forcing a particular channel crate on callers.

mod blocking;
mod error;

pub use blocking::BlockingMailbox;
pub use error::MailboxError;

/// A thread-safe, bounded FIFO with blocking and timed receive.
///
/// Implementors decide their own capacity policy; `send` blocks (or fails)
/// once that capacity is reached. A closed mailbox answers every further
/// `send`/`receive` with [`MailboxError::Closed`].
pub trait Mailbox<T>: Send + Sync {
    /// Enqueues `item`, blocking if the mailbox is at capacity.
    fn send(&self, item: T) -> Result<(), MailboxError>;

    /// Blocks up to `timeout` for an item to become available.
    fn receive(&self, timeout: std::time::Duration) -> Result<T, MailboxError>;

    /// Wakes every blocked `send`/`receive` with [`MailboxError::Closed`] and
    /// causes all future calls to fail the same way.
    fn close(&self);

    /// Number of items currently queued.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
