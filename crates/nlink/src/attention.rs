use std::sync::{Condvar, Mutex};

/// A binary, edge-triggered stop signal shared between a `Subscriber` and
/// its reader thread. `post` is idempotent; once set, `is_set` never goes
/// back to `false` for the lifetime of the signal.
#[derive(Default)]
pub struct Attention {
    signalled: Mutex<bool>,
    changed: Condvar,
}

impl Attention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self) {
        let mut guard = self.signalled.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !*guard {
            *guard = true;
            self.changed.notify_all();
        }
    }

    pub fn is_set(&self) -> bool {
        *self.signalled.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
