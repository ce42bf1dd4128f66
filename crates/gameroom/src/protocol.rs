use super::*;

/// Errors that can occur while reading client input.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    Malformed(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(s) => write!(f, "malformed request: {}", s),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Handles Event to ServerMessage conversion and request parsing.
/// Centralizes the protocol layer between internal events and wire format.
pub struct Protocol;

impl Protocol {
    /// Converts an internal Event to a wire ServerMessage.
    pub fn encode(event: &Event) -> ServerMessage {
        match event {
            Event::LobbyUpdate(lobby) => ServerMessage::lobby_update(lobby.clone()),
            Event::GameStarted(lobby) => ServerMessage::game_started(lobby.clone()),
            Event::RoundResult { round, lobby } => ServerMessage::round_result(round, lobby.clone()),
        }
    }
    /// Parses a client text frame into a Request.
    pub fn decode(s: &str) -> Result<Request, ProtocolError> {
        serde_json::from_str(s).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
    /// Successful reply carrying whatever the action produced.
    pub fn success(id: Option<u64>, lobby: Option<Lobby>, round: Option<Round>) -> ServerMessage {
        ServerMessage::ok(id, lobby, round)
    }
    /// Failed reply. Lobby rejections carry their wire string; anything
    /// else is reported by its message.
    pub fn failure(id: Option<u64>, error: &anyhow::Error) -> ServerMessage {
        match error.downcast_ref::<LobbyError>() {
            Some(e) => ServerMessage::err(id, Some(e.to_string())),
            None => ServerMessage::err(id, Some(format!("{:#}", error))),
        }
    }
}
