use super::*;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use topdeck_core::*;

/// First seat holding the strictly greatest value.
///
/// A later seat only takes the lead with a strictly greater value, so exact
/// ties always go to the lowest seat. Both the round winner and the final
/// winner are decided this way.
pub fn leader<I, V>(values: I) -> Option<Position>
where
    I: IntoIterator<Item = (Position, V)>,
    V: Ord,
{
    let mut best = None::<(Position, V)>;
    for (seat, value) in values {
        if best.as_ref().is_none_or(|(_, top)| value > *top) {
            best = Some((seat, value));
        }
    }
    best.map(|(seat, _)| seat)
}

/// Turn engine: dealing and round resolution.
impl Lobby {
    /// Pads the roster with bots, shuffles, and deals.
    ///
    /// Cards go out one per seat in seat order, `hand_size` times over.
    /// Whatever is left becomes the kitty. Seat 0 leads round 1.
    pub fn start<R>(&mut self, rng: &mut R) -> Result<(), LobbyError>
    where
        R: Rng + ?Sized,
    {
        if self.state() != State::Waiting {
            return Err(LobbyError::GameInProgress);
        }
        if self.players().len() < 2 {
            return Err(LobbyError::NeedPlayers);
        }
        while !self.is_full() {
            self.add_bot()?;
        }
        let mut shuffled = self.deck().to_vec();
        shuffled.shuffle(rng);
        let mut cards = VecDeque::from(shuffled);
        let hand_size = self.hand_size();
        let players = self.players_mut();
        players.iter_mut().for_each(Player::clear_hand);
        for _ in 0..hand_size {
            for player in players.iter_mut() {
                if let Some(card) = cards.pop_front() {
                    player.deal(card);
                }
            }
        }
        self.set_kitty(cards.into());
        self.set_state(State::Playing);
        self.set_round(1);
        self.set_current(0);
        self.set_winner(None);
        self.clear_history();
        self.bump();
        log::info!("[lobby {}] dealt {} seats", self.id(), self.players().len());
        Ok(())
    }

    /// Resolves one round on `attr` on behalf of `issuer`.
    ///
    /// Only the active player may choose, except that anyone may resolve a
    /// bot's turn. Every seat reveals its top card; the highest stat wins,
    /// scores a point, and leads the next round. The game finishes when no
    /// hand has cards left.
    pub fn resolve(&mut self, attr: &str, issuer: ID<Player>) -> Result<Round, LobbyError> {
        if self.state() != State::Playing {
            return Err(LobbyError::NoActiveGame);
        }
        let active = self.active().ok_or(LobbyError::NoActiveGame)?;
        if active.id() != issuer && !active.is_bot() {
            return Err(LobbyError::NotYourTurn);
        }
        let winner = leader(
            self.players()
                .iter()
                .enumerate()
                .filter_map(|(seat, p)| p.top().map(|card| (seat, card.stat(attr)))),
        )
        .ok_or(LobbyError::NoActiveGame)?;
        let reveals = self
            .players_mut()
            .iter_mut()
            .map(Player::reveal)
            .collect::<Vec<_>>();
        let players = self.players_mut();
        players[winner].score();
        let winner_id = players[winner].id();
        let number = self.round();
        let round = Round::new(number, attr.to_string(), reveals, winner_id);
        self.set_current(winner);
        self.set_round(number + 1);
        self.record(round.clone());
        self.bump();
        log::debug!("[lobby {}] {}", self.id(), round);
        if self.cards_in_hands() == 0 {
            self.finish();
        }
        Ok(round)
    }

    /// Declares the player with the most round wins, first seat on ties.
    fn finish(&mut self) {
        let champion = leader(
            self.players()
                .iter()
                .enumerate()
                .map(|(seat, p)| (seat, p.total_wins()))
                .filter(|(_, wins)| *wins > 0),
        )
        .map(|seat| self.players()[seat].clone());
        log::info!(
            "[lobby {}] finished, winner {}",
            self.id(),
            champion
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| String::from("none"))
        );
        self.set_state(State::Finished);
        self.set_winner(champion);
    }
}
