use super::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use topdeck_cards::Deck;
use topdeck_core::*;

type Handle = Arc<Mutex<Lobby>>;

/// Live lobbies plus the persisted snapshot behind them.
///
/// Each lobby sits behind its own lock, so actions on one lobby run one at a
/// time while different lobbies proceed independently. A change becomes
/// visible only after the snapshot containing it has been written; a failed
/// write leaves both memory and disk as they were.
///
/// Locks are always taken lobby first, then the ledger, then the map.
pub struct Registry {
    lobbies: RwLock<HashMap<Code, Handle>>,
    ledger: Mutex<Snapshot>,
    storage: Arc<dyn Storage>,
}

impl Registry {
    /// Restores every lobby from storage. Connections from a previous
    /// process are meaningless now, so every player starts unbound.
    pub async fn load(storage: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let mut snapshot = storage.read().await?;
        snapshot.lobbies.values_mut().for_each(Lobby::unbind_all);
        let lobbies = snapshot
            .lobbies
            .iter()
            .map(|(id, lobby)| (id.clone(), Arc::new(Mutex::new(lobby.clone()))))
            .collect::<HashMap<_, _>>();
        log::info!(
            "[registry] loaded {} lobbies, {} cached themes",
            lobbies.len(),
            snapshot.api_cache.len()
        );
        Ok(Self {
            lobbies: RwLock::new(lobbies),
            ledger: Mutex::new(snapshot),
            storage,
        })
    }
    pub async fn ids(&self) -> Vec<Code> {
        self.lobbies.read().await.keys().cloned().collect()
    }
    /// Latest committed state of a lobby.
    pub async fn get(&self, id: &Code) -> Option<Lobby> {
        let handle = self.handle(id).await?;
        let lobby = handle.lock().await.clone();
        Some(lobby)
    }
    /// A random code no live lobby uses.
    pub async fn vacant(&self) -> Code {
        let lobbies = self.lobbies.read().await;
        loop {
            let code = Code::random();
            if !lobbies.contains_key(&code) {
                return code;
            }
        }
    }
    /// Persists and registers a brand-new lobby.
    pub async fn insert(&self, lobby: Lobby) -> anyhow::Result<()> {
        let id = lobby.id().clone();
        let copy = lobby.clone();
        self.persist(|snapshot| {
            if snapshot.lobbies.contains_key(&id) {
                anyhow::bail!("lobby {} already exists", id);
            }
            snapshot.lobbies.insert(id.clone(), copy);
            Ok(())
        })
        .await?;
        self.lobbies
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(lobby)));
        Ok(())
    }
    /// Applies `f` to a lobby and commits the result.
    ///
    /// `f` works on a staged copy. If it rejects, nothing changes. If the
    /// staged lobby is abandoned, the lobby is deleted instead of saved and
    /// `None` is returned in place of the new state.
    pub async fn update<T, F>(&self, id: &Code, f: F) -> anyhow::Result<(T, Option<Lobby>)>
    where
        F: FnOnce(&mut Lobby) -> Result<T, LobbyError> + Send,
        T: Send,
    {
        let handle = self.handle(id).await.ok_or(LobbyError::NoLobby)?;
        let mut guard = handle.lock().await;
        if !self.is_current(id, &handle).await {
            return Err(LobbyError::NoLobby.into());
        }
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        if staged.is_abandoned() {
            self.retire(id).await?;
            log::info!("[registry] lobby {} abandoned", id);
            return Ok((out, None));
        }
        let copy = staged.clone();
        self.persist(|snapshot| {
            snapshot.lobbies.insert(id.clone(), copy);
            Ok(())
        })
        .await?;
        *guard = staged.clone();
        Ok((out, Some(staged)))
    }
    /// Deletes a lobby. False if there was none.
    pub async fn delete(&self, id: &Code) -> anyhow::Result<bool> {
        let Some(handle) = self.handle(id).await else {
            return Ok(false);
        };
        let _guard = handle.lock().await;
        if !self.is_current(id, &handle).await {
            return Ok(false);
        }
        self.retire(id).await?;
        Ok(true)
    }
}

/// Theme cache.
impl Registry {
    /// `None` for unknown themes, `Some(None)` for themes whose generation
    /// never finished.
    pub async fn cached(&self, theme: &str) -> Option<Option<Deck>> {
        self.ledger
            .lock()
            .await
            .api_cache
            .get(&Self::key(theme))
            .cloned()
    }
    /// Records a generated deck, or with `None` marks the theme as attempted
    /// without disturbing a deck already stored for it.
    pub async fn remember(&self, theme: &str, deck: Option<Deck>) -> anyhow::Result<()> {
        let key = Self::key(theme);
        self.persist(|snapshot| {
            match deck {
                Some(deck) => {
                    snapshot.api_cache.insert(key, Some(deck));
                }
                None => {
                    snapshot.api_cache.entry(key).or_insert(None);
                }
            }
            Ok(())
        })
        .await
    }
    fn key(theme: &str) -> String {
        theme.trim().to_lowercase()
    }
}

impl Registry {
    async fn handle(&self, id: &Code) -> Option<Handle> {
        self.lobbies.read().await.get(id).cloned()
    }
    /// Whether `handle` still is the registered lobby, i.e. it was not
    /// deleted while the caller waited for its lock.
    async fn is_current(&self, id: &Code, handle: &Handle) -> bool {
        self.lobbies
            .read()
            .await
            .get(id)
            .is_some_and(|h| Arc::ptr_eq(h, handle))
    }
    /// Removes a lobby from storage, then from memory.
    /// Caller holds the lobby lock.
    async fn retire(&self, id: &Code) -> anyhow::Result<()> {
        self.persist(|snapshot| {
            snapshot.lobbies.remove(id);
            Ok(())
        })
        .await?;
        self.lobbies.write().await.remove(id);
        Ok(())
    }
    /// Writes the snapshot as changed by `f`, adopting it only on success.
    async fn persist<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Snapshot) -> anyhow::Result<()> + Send,
    {
        let mut ledger = self.ledger.lock().await;
        let mut staged = ledger.clone();
        f(&mut staged)?;
        self.storage
            .write(&staged)
            .await
            .inspect_err(|e| log::error!("[registry] snapshot write failed: {:#}", e))?;
        *ledger = staged;
        Ok(())
    }
}
