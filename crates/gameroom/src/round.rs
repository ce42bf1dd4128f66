use super::*;
use serde::Deserialize;
use serde::Serialize;
use topdeck_cards::Card;
use topdeck_core::*;

/// Record of one resolved round. Also the round summary sent to clients.
/// `reveals` is seat-aligned; `None` for seats that had no card left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    round: u32,
    attr: Attribute,
    reveals: Vec<Option<Card>>,
    winner_id: ID<Player>,
}

impl Round {
    pub fn new(round: u32, attr: Attribute, reveals: Vec<Option<Card>>, winner: ID<Player>) -> Self {
        Self {
            round,
            attr,
            reveals,
            winner_id: winner,
        }
    }
    pub fn round(&self) -> u32 {
        self.round
    }
    pub fn attr(&self) -> &str {
        &self.attr
    }
    pub fn reveals(&self) -> &[Option<Card>] {
        &self.reveals
    }
    pub fn winner(&self) -> ID<Player> {
        self.winner_id
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "round {} on {} won by {}", self.round, self.attr, self.winner_id)
    }
}
