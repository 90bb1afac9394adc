//! Networking primitives for the local OAuth callback listener.

pub use tokio::net::{TcpListener, TcpStream};
