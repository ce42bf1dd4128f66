//! WebSocket lobby hosting.
//!
//! This crate is the imperative shell around the gameroom: it owns the live
//! connections, fans lobby events out to subscribers, and runs bot turns on
//! timers.
//!
//! ## Core Types
//!
//! - [`Casino`] — Executes client requests against the lobby registry
//! - [`Rooms`] — Lobby subscriptions and broadcast fan-out
//! - [`Link`] — Outbound channel of one WebSocket connection
//!
//! ## HTTP Handlers
//!
//! The [`handlers`] submodule exposes actix-web routes for the socket
//! endpoint and read-only lobby lookup.
mod casino;
mod link;
mod rooms;
pub mod handlers;

pub use casino::*;
pub use link::*;
pub use rooms::*;
