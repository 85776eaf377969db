//! Message definitions for the tank arena protocol.
//!
//! This module contains both client->server and server->client message types.
//! Every message is adjacently tagged: the `event` field names the variant and
//! `data` carries its payload (absent for unit variants).

mod client;
mod server;

pub use client::*;
pub use server::*;
