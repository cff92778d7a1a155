mod appendable;
mod assert;
mod thread;

pub use appendable::{Appendable, BufferError, DEFAULT_ROUND};
pub use thread::{ThreadPriority, thread_boot};
