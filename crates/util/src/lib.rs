//! Core identifiers, type aliases, and default rules for topdeck.
//!
//! This crate provides the foundational types and configuration parameters
//! used throughout the topdeck workspace.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Seat index around the table (0 = the lobby creator).
pub type Position = usize;
/// Numeric value of a single card attribute.
pub type Stat = i32;
/// Name of a card attribute, e.g. "power".
pub type Attribute = String;

// ============================================================================
// TRAITS
// ============================================================================
/// Random instance generation for identifiers and tests.
pub trait Arbitrary {
    /// Generate a uniformly random instance.
    fn random() -> Self;
}

/// Unique identifier trait for domain entities.
pub trait Unique<T = Self> {
    fn id(&self) -> ID<T>;
}

// ============================================================================
// IDENTITY TYPES
// ============================================================================
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
pub struct ID<T> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T> From<uuid::Uuid> for ID<T> {
    fn from(inner: uuid::Uuid) -> Self {
        Self {
            inner,
            marker: PhantomData,
        }
    }
}
impl<T> TryFrom<&str> for ID<T> {
    type Error = uuid::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        uuid::Uuid::parse_str(s).map(Self::from)
    }
}

impl<T> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T> Copy for ID<T> {}
impl<T> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Eq for ID<T> {}
impl<T> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

impl<T> serde::Serialize for ID<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.inner.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for ID<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        uuid::Uuid::deserialize(deserializer).map(Self::from)
    }
}

/// Alphabet for lobby codes. No 0/O or 1/I so codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Short, human-typeable lobby identifier.
/// Always stored trimmed and uppercase, however the client typed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Code(String);

impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Arbitrary for Code {
    fn random() -> Self {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        Self(
            bytes
                .iter()
                .take(CODE_LENGTH)
                .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
                .collect(),
        )
    }
}

impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Self(s.trim().to_uppercase())
    }
}
impl From<String> for Code {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// GAME RULES
// ============================================================================
/// Seats per lobby. Rosters are padded with bots up to this at deal time.
pub const MAX_PLAYERS: usize = 4;
/// Cards dealt to each seat.
pub const HAND_SIZE: usize = 6;
/// Characters in a lobby code.
pub const CODE_LENGTH: usize = 5;
/// Random suffix length of generated bot names.
pub const BOT_SUFFIX: usize = 3;

/// Bot delay after a deal when seat 0 is a bot (milliseconds).
pub const BOT_DELAY_OPENING: u64 = 400;
/// Bot delay after a human resolved a round (milliseconds).
pub const BOT_DELAY_REPLY: u64 = 600;
/// Bot delay between consecutive bot rounds (milliseconds).
pub const BOT_DELAY_CHAIN: u64 = 500;

/// Display name for a lobby creator who sent none.
pub const DEFAULT_HOST: &str = "Host";
/// Display name for a joiner who sent none.
pub const DEFAULT_NAME: &str = "Player";
/// Theme for a lobby created without one.
pub const DEFAULT_THEME: &str = "One Piece";

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
/// Every committed action is already on disk, so nothing is lost.
#[cfg(feature = "server")]
pub fn kys() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            log::warn!("interrupt received, exiting");
            std::process::exit(0);
        }
    });
}
