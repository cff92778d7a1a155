use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

use crate::{Mailbox, MailboxError};

struct Inner<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// A `Mutex` + `Condvar` bounded FIFO: the reference [`Mailbox`] implementation.
///
/// Used for both the free pool (recycled `Message`s) and the delivery queue
/// (decoded inbound `Message`s) by [`nlink`](../nlink/index.html)'s
/// `Subscriber`. A full mailbox blocks its producer, which is exactly the
/// backpressure the design wants: a slow consumer eventually stalls the
/// reader thread, which stalls TCP reads, which applies backpressure to the
/// server.
pub struct BlockingMailbox<T> {
    capacity: usize,
    state: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BlockingMailbox<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(Inner { queue: VecDeque::with_capacity(capacity), closed: false }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }
}

impl<T: Send> Mailbox<T> for BlockingMailbox<T> {
    fn send(&self, item: T) -> Result<(), MailboxError> {
        let mut guard =
            self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        guard = self
            .not_full
            .wait_while(guard, |inner| !inner.closed && inner.queue.len() >= self.capacity)
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if guard.closed {
            return Err(MailboxError::Closed);
        }

        guard.queue.push_back(item);
        drop(guard);
        self.not_empty.notify_one();
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<T, MailboxError> {
        let guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let deadline = Instant::now() + timeout;

        let (mut guard, timed_out) = self
            .not_empty
            .wait_timeout_while(guard, timeout, |inner| {
                inner.queue.is_empty() && !inner.closed
            })
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(item) = guard.queue.pop_front() {
            let was_full = guard.queue.len() + 1 == self.capacity;
            drop(guard);
            if was_full {
                self.not_full.notify_one();
            }
            return Ok(item);
        }

        if guard.closed {
            return Err(MailboxError::Closed);
        }

        debug_assert!(timed_out || Instant::now() >= deadline);
        Err(MailboxError::Timeout)
    }

    fn close(&self) {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.closed = true;
        drop(guard);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner).queue.len()
    }
}
