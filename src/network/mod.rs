//! Network Module
//!
//! TCP server and client handling for the bundled store server.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One thread per connection, capped at `max_connections`
//! - Commands executed directly against a [`Store`](crate::store::Store)

mod connection;
mod server;

pub use connection::{execute_command, Connection};
pub use server::{Server, ShutdownHandle};
