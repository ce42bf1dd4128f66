use super::*;
use serde::Deserialize;
use serde::Serialize;
use topdeck_cards::Card;
use topdeck_core::*;

/// Client request. `id` is echoed back in the matching reply.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub command: Command,
}

/// Actions a client may request, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    CreateLobby {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        theme: Option<String>,
    },
    JoinLobby {
        lobby_id: Code,
        #[serde(default)]
        name: Option<String>,
    },
    AddBot {
        lobby_id: Code,
    },
    StartGame {
        lobby_id: Code,
    },
    ChooseAttribute {
        lobby_id: Code,
        player_id: ID<Player>,
        attr: Attribute,
    },
    LeaveLobby {
        lobby_id: Code,
    },
}

/// Messages sent from server to client over WebSocket.
/// Every broadcast carries the complete lobby so clients never patch state.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Answer to one request.
    Reply {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        lobby: Option<Lobby>,
        #[serde(skip_serializing_if = "Option::is_none")]
        round: Option<Round>,
        #[serde(skip_serializing_if = "Option::is_none")]
        err: Option<String>,
    },
    LobbyUpdate {
        lobby: Lobby,
    },
    GameStarted {
        lobby: Lobby,
    },
    RoundResult {
        attr: Attribute,
        reveals: Vec<Option<Card>>,
        winner_id: ID<Player>,
        lobby: Lobby,
    },
}

impl ServerMessage {
    pub fn ok(id: Option<u64>, lobby: Option<Lobby>, round: Option<Round>) -> Self {
        Self::Reply {
            id,
            ok: true,
            lobby,
            round,
            err: None,
        }
    }
    pub fn err(id: Option<u64>, err: Option<String>) -> Self {
        Self::Reply {
            id,
            ok: false,
            lobby: None,
            round: None,
            err,
        }
    }
    pub fn lobby_update(lobby: Lobby) -> Self {
        Self::LobbyUpdate { lobby }
    }
    pub fn game_started(lobby: Lobby) -> Self {
        Self::GameStarted { lobby }
    }
    pub fn round_result(round: &Round, lobby: Lobby) -> Self {
        Self::RoundResult {
            attr: round.attr().to_string(),
            reveals: round.reveals().to_vec(),
            winner_id: round.winner(),
            lobby,
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}
