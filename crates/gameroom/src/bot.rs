use super::*;
use topdeck_cards::Card;
use topdeck_core::*;

/// Decides which attribute a bot plays from its top card.
pub trait Brain: Send + Sync {
    fn choose(&self, top: &Card, attributes: &[Attribute]) -> Option<Attribute>;
}

/// Plays the attribute where its own top card is strongest.
/// Ties go to the attribute listed first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Brain for Greedy {
    fn choose(&self, top: &Card, attributes: &[Attribute]) -> Option<Attribute> {
        let candidates = match attributes.is_empty() {
            true => top.stats().keys().cloned().collect::<Vec<_>>(),
            false => attributes.to_vec(),
        };
        leader(
            candidates
                .iter()
                .map(|attr| top.stat(attr))
                .enumerate(),
        )
        .map(|i| candidates[i].clone())
    }
}

impl Lobby {
    /// The bot whose turn it is and the attribute it plays, if a bot is due.
    pub fn bot_choice(&self, brain: &dyn Brain) -> Option<(ID<Player>, Attribute)> {
        if self.state() != State::Playing {
            return None;
        }
        let active = self.active().filter(|p| p.is_bot())?;
        let top = active.top()?;
        brain
            .choose(top, self.attributes())
            .map(|attr| (active.id(), attr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use topdeck_cards::Synthetic;

    fn card() -> Card {
        Card::new(
            "Chopper",
            "",
            [
                ("power".to_string(), 40),
                ("speed".to_string(), 75),
                ("skill".to_string(), 75),
                ("defense".to_string(), 10),
            ],
        )
    }
    fn attributes() -> Vec<Attribute> {
        ["power", "speed", "skill", "defense"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn greedy_takes_first_strongest() {
        assert_eq!(Greedy.choose(&card(), &attributes()), Some("speed".to_string()));
    }
    #[test]
    fn greedy_respects_attribute_order() {
        let order = ["skill", "speed"].iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(Greedy.choose(&card(), &order), Some("skill".to_string()));
    }
    #[test]
    fn greedy_falls_back_to_card_stats() {
        assert_eq!(Greedy.choose(&card(), &[]), Some("skill".to_string()));
        assert_eq!(Greedy.choose(&Card::new("blank", "", []), &[]), None);
    }
    #[test]
    fn no_choice_for_humans_or_idle_lobbies() {
        let mut lobby = Lobby::new(
            Code::from("BOTS1"),
            "One Piece",
            Synthetic::generate("One Piece"),
            Player::human("Luffy", ID::default()),
            &Rules::default(),
        );
        lobby.add_bot().unwrap();
        assert!(lobby.bot_choice(&Greedy).is_none());
        lobby.start(&mut SmallRng::seed_from_u64(7)).unwrap();
        assert!(lobby.bot_choice(&Greedy).is_none());
        lobby.set_current(1);
        let (id, attr) = lobby.bot_choice(&Greedy).unwrap();
        assert_eq!(id, lobby.players()[1].id());
        assert!(lobby.attributes().contains(&attr));
    }
}
