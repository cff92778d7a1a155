//! Blocking transport layer: the [`Transport`] capability trait, its
//! `std::net::TcpStream`-backed default [`TcpTransport`], and [`Connection`]
//! which wires either one to the `nlink-protocol` codec.

mod connection;
mod error;
mod transport;

pub use connection::Connection;
pub use error::TransportError;
pub use transport::{TcpTransport, Transport};
