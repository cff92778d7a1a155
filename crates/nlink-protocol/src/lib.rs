//! The NATS text-protocol wire codec: [`Headers`], [`Message`], [`Parser`],
//! and [`Formatter`].
//!
//! This crate performs no I/O of its own. [`Parser::read_message`] is
//! generic over [`std::io::BufRead`] and [`Formatter`] writes into a plain
//! [`nlink_utils::Appendable`] scratch buffer; `nlink-transport` is what
//! wires either side to an actual socket.

mod error;
mod formatter;
mod headers;
mod message;
mod parser;

pub use error::ProtocolError;
pub use formatter::Formatter;
pub use headers::{HeaderIter, Headers};
pub use message::{Kind, Message};
pub use parser::Parser;
