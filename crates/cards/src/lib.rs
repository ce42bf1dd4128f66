//! Themed stat cards and decks.
//!
//! A card is a name, an image reference, and a stat per attribute. Every card
//! of a deck shares the same ordered attribute set.
//!
//! ## Core Types
//!
//! - [`Card`] — Immutable dealt card
//! - [`Deck`] — Ordered attribute set plus the cards of one theme
//! - [`Forge`] — Card generation collaborator, keyed by theme
//! - [`Synthetic`] — Deterministic offline forge
mod card;
mod deck;
mod forge;
mod synthetic;

pub use card::*;
pub use deck::*;
pub use forge::*;
pub use synthetic::*;
