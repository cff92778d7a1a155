//! A blocking NATS client core: dial a server, subscribe, and pull decoded
//! messages through a bounded, thread-backed `fetch`/`reuse` API.
//!
//! Built from three lower crates: `nlink-protocol` (the wire codec),
//! `nlink-transport` (the blocking TCP transport and `Connection`), and
//! `nlink-mailbox` (the pool/delivery queue contract). This crate wires
//! them together into [`Subscriber`] and adds the pieces only a live
//! connection needs: [`ConnectOpts`], the reader thread, and the
//! `PING`/`PONG` keepalive handshake.

mod attention;
mod error;
mod options;
mod subscriber;

pub use error::SubscriberError;
pub use nlink_protocol::{Headers, Kind, Message};
pub use nlink_transport::{TcpTransport, Transport};
pub use options::ConnectOpts;
pub use subscriber::{Subscriber, SubscriberState};
