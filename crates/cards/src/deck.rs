use super::*;
use serde::Deserialize;
use serde::Serialize;
use topdeck_core::*;

/// All cards generated for one theme.
/// `attributes` is the shared attribute set in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    attributes: Vec<Attribute>,
    cards: Vec<Card>,
}

impl Deck {
    pub fn new(attributes: Vec<Attribute>, cards: Vec<Card>) -> Self {
        Self { attributes, cards }
    }
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
    pub fn len(&self) -> usize {
        self.cards.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
    /// Whether every one of `seats` can be dealt `hand` cards.
    pub fn sufficient(&self, seats: usize, hand: usize) -> bool {
        !self.attributes.is_empty() && self.cards.len() >= seats * hand
    }
    pub fn into_parts(self) -> (Vec<Attribute>, Vec<Card>) {
        (self.attributes, self.cards)
    }
}
