//! Lobby and round state machine for live stat-card battles.
//!
//! Each lobby seats up to four players, some of them bots. Every round all
//! seats reveal their top card and the highest stat in the chosen attribute
//! wins the round. Everything here is synchronous game logic plus the
//! lobby store; sockets and timers live in the hosting crate.
//!
//! ## Architecture
//!
//! - [`Lobby`] — Roster, deck, hands, and history of one game session
//! - [`Registry`] — Lobby store with per-lobby serialized, persisted updates
//! - [`Storage`] — Whole-snapshot persistence seam ([`JsonFile`], [`Memory`])
//! - [`Brain`] — Bot attribute choice ([`Greedy`])
//!
//! ## Protocol
//!
//! - [`Event`] — Things that happened to a lobby, for broadcast
//! - [`ServerMessage`] / [`Request`] — WebSocket wire format
//! - [`Protocol`] — Conversion between the two
mod bot;
mod engine;
mod error;
mod event;
mod lobby;
mod message;
mod player;
mod protocol;
mod registry;
mod round;
mod rules;
mod storage;

pub use bot::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use lobby::*;
pub use message::*;
pub use player::*;
pub use protocol::*;
pub use registry::*;
pub use round::*;
pub use rules::*;
pub use storage::*;
