//! Serial port communication and handling.

mod client;
mod port;
mod server;

pub use client::Client;
pub use port::{LinkSettings, OpenPort, Port};
pub use server::{Server, Timing};
