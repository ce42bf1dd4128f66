use super::*;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use topdeck_cards::Deck;
use topdeck_core::*;

/// Everything that survives a restart.
///
/// `api_cache` maps lowercased themes to generated decks. A `None` entry
/// marks a theme whose generation was started but never produced a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub lobbies: BTreeMap<Code, Lobby>,
    #[serde(default)]
    pub api_cache: BTreeMap<String, Option<Deck>>,
}

/// Whole-snapshot persistence.
/// Every committed lobby change writes the full snapshot.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self) -> anyhow::Result<Snapshot>;
    async fn write(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

/// Snapshot kept as one JSON document on disk.
///
/// Writes go to a sibling temp file which then replaces the document, so a
/// crash mid-write leaves the previous snapshot intact.
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
    fn staging(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl Storage for JsonFile {
    /// Creates an empty document on first use.
    async fn read(&self) -> anyhow::Result<Snapshot> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("[storage] creating {}", self.path.display());
                let snapshot = Snapshot::default();
                self.write(&snapshot).await?;
                Ok(snapshot)
            }
            Err(e) => Err(e.into()),
        }
    }
    async fn write(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let staging = self.staging();
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

/// In-process storage. Can be told to fail writes.
#[derive(Default)]
pub struct Memory {
    snapshot: Mutex<Snapshot>,
    fail: AtomicBool,
    writes: AtomicUsize,
}

impl Memory {
    /// Makes every following write fail until switched back.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl Storage for Memory {
    async fn read(&self) -> anyhow::Result<Snapshot> {
        Ok(self.snapshot())
    }
    async fn write(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("storage unavailable");
        }
        *self.snapshot.lock().unwrap_or_else(|e| e.into_inner()) = snapshot.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topdeck_cards::Synthetic;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("topdeck-{}", ID::<Snapshot>::default()))
            .join(name)
    }
    fn snapshot() -> Snapshot {
        let lobby = Lobby::new(
            Code::from("ABCDE"),
            "One Piece",
            Synthetic::generate("One Piece"),
            Player::human("Luffy", ID::default()),
            &Rules::default(),
        );
        let mut snapshot = Snapshot::default();
        snapshot.lobbies.insert(lobby.id().clone(), lobby);
        snapshot
            .api_cache
            .insert("one piece".into(), Some(Synthetic::generate("One Piece")));
        snapshot.api_cache.insert("naruto".into(), None);
        snapshot
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let path = scratch("db.json");
        let file = JsonFile::new(&path);
        assert_eq!(file.read().await.unwrap(), Snapshot::default());
        assert!(path.exists());
    }
    #[tokio::test]
    async fn file_keeps_what_was_written() {
        let file = JsonFile::new(scratch("db.json"));
        let snapshot = snapshot();
        file.write(&snapshot).await.unwrap();
        assert_eq!(file.read().await.unwrap(), snapshot);
        assert!(!file.staging().exists());
    }
    #[tokio::test]
    async fn file_shape_is_camel_case() {
        let file = JsonFile::new(scratch("db.json"));
        file.write(&snapshot()).await.unwrap();
        let raw = std::fs::read_to_string(file.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["lobbies"]["ABCDE"].is_object());
        assert!(json["apiCache"]["naruto"].is_null());
        assert!(json["apiCache"]["one piece"]["cards"].is_array());
    }
    #[tokio::test]
    async fn partial_documents_fill_defaults() {
        let path = scratch("db.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(JsonFile::new(&path).read().await.unwrap(), Snapshot::default());
    }
    #[tokio::test]
    async fn memory_can_refuse_writes() {
        let memory = Memory::default();
        let snapshot = snapshot();
        memory.fail(true);
        assert!(memory.write(&snapshot).await.is_err());
        assert_eq!(memory.writes(), 0);
        assert_eq!(memory.read().await.unwrap(), Snapshot::default());
        memory.fail(false);
        memory.write(&snapshot).await.unwrap();
        assert_eq!(memory.writes(), 1);
        assert_eq!(memory.read().await.unwrap(), snapshot);
    }
}
