/// Rejections of a lobby action. Reported to the caller, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyError {
    NoLobby,
    Full,
    GameInProgress,
    NeedPlayers,
    NotYourTurn,
    NoActiveGame,
}

impl std::fmt::Display for LobbyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLobby => write!(f, "no lobby"),
            Self::Full => write!(f, "full"),
            Self::GameInProgress => write!(f, "game in progress"),
            Self::NeedPlayers => write!(f, "need players"),
            Self::NotYourTurn => write!(f, "not your turn"),
            Self::NoActiveGame => write!(f, "no active game"),
        }
    }
}

impl std::error::Error for LobbyError {}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn survives_anyhow_round_trip() {
        let err = anyhow::Error::from(LobbyError::NotYourTurn);
        assert_eq!(err.downcast_ref::<LobbyError>(), Some(&LobbyError::NotYourTurn));
        assert_eq!(err.to_string(), "not your turn");
    }
}
