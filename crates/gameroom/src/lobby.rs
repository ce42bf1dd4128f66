use super::*;
use serde::Deserialize;
use serde::Serialize;
use topdeck_cards::Card;
use topdeck_cards::Deck;
use topdeck_core::*;

/// Lobby lifecycle. Only ever advances Waiting → Playing → Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Waiting,
    Playing,
    Finished,
}

/// One game session: roster, deck, hands, and history.
///
/// Seat order in `players` is also turn order. While playing, every card of
/// `deck` is either in exactly one hand or in the `kitty`, until revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lobby {
    id: Code,
    theme: String,
    attributes: Vec<Attribute>,
    deck: Vec<Card>,
    players: Vec<Player>,
    max_players: usize,
    #[serde(default = "default_hand_size")]
    hand_size: usize,
    state: State,
    current_player_index: Position,
    round: u32,
    history: Vec<Round>,
    #[serde(default)]
    kitty: Vec<Card>,
    winner: Option<Player>,
    #[serde(default)]
    generation: u64,
}

impl Lobby {
    /// Opens a waiting lobby with the host in seat 0.
    pub fn new(id: Code, theme: impl Into<String>, deck: Deck, host: Player, rules: &Rules) -> Self {
        let (attributes, deck) = deck.into_parts();
        Self {
            id,
            theme: theme.into(),
            attributes,
            deck,
            players: vec![host],
            max_players: rules.max_players,
            hand_size: rules.hand_size,
            state: State::Waiting,
            current_player_index: 0,
            round: 0,
            history: Vec::new(),
            kitty: Vec::new(),
            winner: None,
            generation: 0,
        }
    }
    pub fn id(&self) -> &Code {
        &self.id
    }
    pub fn theme(&self) -> &str {
        &self.theme
    }
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
    pub fn deck(&self) -> &[Card] {
        &self.deck
    }
    pub fn players(&self) -> &[Player] {
        &self.players
    }
    pub fn max_players(&self) -> usize {
        self.max_players
    }
    /// Cards dealt to each seat, fixed when the lobby opens.
    pub fn hand_size(&self) -> usize {
        self.hand_size
    }
    pub fn state(&self) -> State {
        self.state
    }
    pub fn current(&self) -> Position {
        self.current_player_index
    }
    /// Player whose turn it is.
    pub fn active(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }
    pub fn round(&self) -> u32 {
        self.round
    }
    pub fn history(&self) -> &[Round] {
        &self.history
    }
    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }
    pub fn winner(&self) -> Option<&Player> {
        self.winner.as_ref()
    }
    /// Bumped by every deal and every round. Stale bot timers compare against it.
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn player(&self, id: ID<Player>) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }
    /// Empty before the game started. Such a lobby is deleted.
    pub fn is_abandoned(&self) -> bool {
        self.state == State::Waiting && self.players.is_empty()
    }
    /// Cards still held across all hands.
    pub fn cards_in_hands(&self) -> usize {
        self.players.iter().map(|p| p.hand().len()).sum()
    }
}

/// Session management: joining, recovery, bots, leaving.
impl Lobby {
    /// Seats a new player, or recovers the existing player with this name.
    ///
    /// Recovery rebinds the connection and works in any state, so a player
    /// who dropped mid-game resumes their seat and hand. Only new names are
    /// subject to capacity and state checks.
    pub fn join(&mut self, name: &str, connection: ID<Connection>) -> Result<Player, LobbyError> {
        if let Some(player) = self.players.iter_mut().find(|p| p.name() == name) {
            log::debug!("[lobby {}] recovering session for {}", self.id, name);
            player.bind(connection);
            return Ok(player.clone());
        }
        if self.is_full() {
            return Err(LobbyError::Full);
        }
        if self.state != State::Waiting {
            return Err(LobbyError::GameInProgress);
        }
        let player = Player::human(name, connection);
        self.players.push(player.clone());
        Ok(player)
    }
    /// Seats a bot. Allowed in any state while a seat is free.
    pub fn add_bot(&mut self) -> Result<Player, LobbyError> {
        if self.is_full() {
            return Err(LobbyError::Full);
        }
        let bot = Player::bot();
        self.players.push(bot.clone());
        Ok(bot)
    }
    /// Removes the players bound to this connection, but only before the
    /// game starts. Mid-game the seat and hand stay for a later recovery.
    /// Returns how many players were removed.
    pub fn leave(&mut self, connection: ID<Connection>) -> usize {
        if self.state != State::Waiting {
            return 0;
        }
        let before = self.players.len();
        self.players.retain(|p| p.connection() != Some(connection));
        before - self.players.len()
    }
    /// Forgets every connection, e.g. after a process restart.
    pub(crate) fn unbind_all(&mut self) {
        self.players.iter_mut().for_each(Player::unbind);
    }
}

impl Lobby {
    pub(crate) fn players_mut(&mut self) -> &mut Vec<Player> {
        &mut self.players
    }
    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }
    pub(crate) fn set_current(&mut self, seat: Position) {
        self.current_player_index = seat;
    }
    pub(crate) fn set_round(&mut self, round: u32) {
        self.round = round;
    }
    pub(crate) fn set_kitty(&mut self, kitty: Vec<Card>) {
        self.kitty = kitty;
    }
    pub(crate) fn set_winner(&mut self, winner: Option<Player>) {
        self.winner = winner;
    }
    pub(crate) fn record(&mut self, round: Round) {
        self.history.push(round);
    }
    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
    }
    pub(crate) fn bump(&mut self) {
        self.generation += 1;
    }
}

fn default_hand_size() -> usize {
    HAND_SIZE
}

impl std::fmt::Display for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}/{} seats, {:?}, round {})",
            self.id,
            self.theme,
            self.players.len(),
            self.max_players,
            self.state,
            self.round
        )
    }
}
