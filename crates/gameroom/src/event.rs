use super::*;

/// Things that happened to a lobby, broadcast to everyone subscribed to it.
/// Each carries the full lobby state after the change.
#[derive(Clone, Debug)]
pub enum Event {
    /// Roster or connection changes.
    LobbyUpdate(Lobby),
    /// Cards were dealt.
    GameStarted(Lobby),
    /// A round was resolved.
    RoundResult { round: Round, lobby: Lobby },
}

impl Event {
    pub fn lobby(&self) -> &Lobby {
        match self {
            Event::LobbyUpdate(lobby) => lobby,
            Event::GameStarted(lobby) => lobby,
            Event::RoundResult { lobby, .. } => lobby,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Event::LobbyUpdate(lobby) => write!(f, "update {}", lobby),
            Event::GameStarted(lobby) => write!(f, "started {}", lobby),
            Event::RoundResult { round, lobby } => write!(f, "{}: {}", lobby.id(), round),
        }
    }
}
