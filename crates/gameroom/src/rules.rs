use std::time::Duration;
use topdeck_core::*;

/// Delays before a bot takes its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After a deal that leaves a bot in seat 0.
    pub opening: Duration,
    /// After a human resolved a round and a bot leads next.
    pub reply: Duration,
    /// After a bot resolved a round and a bot leads next.
    pub chain: Duration,
}

impl Pacing {
    pub fn uniform(delay: Duration) -> Self {
        Self {
            opening: delay,
            reply: delay,
            chain: delay,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            opening: Duration::from_millis(BOT_DELAY_OPENING),
            reply: Duration::from_millis(BOT_DELAY_REPLY),
            chain: Duration::from_millis(BOT_DELAY_CHAIN),
        }
    }
}

/// Table size and bot pacing. Lobbies copy the table size when they open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub max_players: usize,
    pub hand_size: usize,
    pub pacing: Pacing,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            hand_size: HAND_SIZE,
            pacing: Pacing::default(),
        }
    }
}

impl Rules {
    /// Defaults overridden by MAX_PLAYERS, HAND_SIZE and BOT_DELAY_MS.
    /// Unparseable or degenerate values are ignored.
    pub fn from_env() -> Self {
        let mut rules = Self::default();
        if let Some(n) = Self::var("MAX_PLAYERS").filter(|n| *n >= 2) {
            rules.max_players = n as usize;
        }
        if let Some(n) = Self::var("HAND_SIZE").filter(|n| *n > 0) {
            rules.hand_size = n as usize;
        }
        if let Some(ms) = Self::var("BOT_DELAY_MS") {
            rules.pacing = Pacing::uniform(Duration::from_millis(ms));
        }
        rules
    }
    /// Rules with no bot delays, for tests and simulations.
    pub fn instant() -> Self {
        Self {
            pacing: Pacing::uniform(Duration::ZERO),
            ..Self::default()
        }
    }
    fn var(key: &str) -> Option<u64> {
        let value = std::env::var(key).ok()?;
        match value.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                log::warn!("[rules] ignoring {}={}", key, value);
                None
            }
        }
    }
}
