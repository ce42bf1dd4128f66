use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use std::collections::VecDeque;
use topdeck_cards::Card;
use topdeck_core::*;

/// Marker type for a client connection identity.
/// Connections come and go; a player outlives any one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection;

/// A seat in a lobby, human or bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    id: ID<Player>,
    name: String,
    connection: Option<ID<Connection>>,
    is_bot: bool,
    hand: VecDeque<Card>,
    total_wins: u32,
}

impl Unique for Player {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

impl Player {
    pub fn human(name: impl Into<String>, connection: ID<Connection>) -> Self {
        Self {
            id: ID::default(),
            name: name.into(),
            connection: Some(connection),
            is_bot: false,
            hand: VecDeque::new(),
            total_wins: 0,
        }
    }
    pub fn bot() -> Self {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let ref mut rng = rand::rng();
        let suffix = (0..BOT_SUFFIX)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect::<String>();
        Self {
            id: ID::default(),
            name: format!("BOT-{}", suffix),
            connection: None,
            is_bot: true,
            hand: VecDeque::new(),
            total_wins: 0,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn connection(&self) -> Option<ID<Connection>> {
        self.connection
    }
    pub fn is_bot(&self) -> bool {
        self.is_bot
    }
    pub fn hand(&self) -> &VecDeque<Card> {
        &self.hand
    }
    pub fn total_wins(&self) -> u32 {
        self.total_wins
    }
    /// The card this player would reveal next.
    pub fn top(&self) -> Option<&Card> {
        self.hand.front()
    }
}

impl Player {
    pub(crate) fn bind(&mut self, connection: ID<Connection>) {
        self.connection = Some(connection);
    }
    pub(crate) fn unbind(&mut self) {
        self.connection = None;
    }
    pub(crate) fn clear_hand(&mut self) {
        self.hand.clear();
    }
    pub(crate) fn deal(&mut self, card: Card) {
        self.hand.push_back(card);
    }
    pub(crate) fn reveal(&mut self) -> Option<Card> {
        self.hand.pop_front()
    }
    pub(crate) fn score(&mut self) {
        self.total_wins += 1;
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.is_bot {
            true => write!(f, "{} [bot]", self.name),
            false => write!(f, "{}", self.name),
        }
    }
}
