use super::*;
use std::sync::Arc;
use std::time::Duration;
use topdeck_cards::Deck;
use topdeck_cards::Forge;
use topdeck_core::*;
use topdeck_gameroom::*;

/// Executes client requests against the lobby registry and fans the
/// resulting events out to every watcher.
///
/// Bot turns run on timers. A timer remembers the lobby generation it was
/// armed for and does nothing if the lobby moved on in the meantime.
pub struct Casino {
    rules: Rules,
    forge: Arc<dyn Forge>,
    brain: Arc<dyn Brain>,
    registry: Arc<Registry>,
    rooms: Rooms,
}

impl Casino {
    pub fn new(rules: Rules, forge: Arc<dyn Forge>, brain: Arc<dyn Brain>, registry: Arc<Registry>) -> Self {
        Self {
            rules,
            forge,
            brain,
            registry,
            rooms: Rooms::default(),
        }
    }
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
    pub fn rooms(&self) -> &Rooms {
        &self.rooms
    }
}

/// Lobby actions. Each commits through the registry before anything is
/// broadcast, so watchers only ever see persisted state.
impl Casino {
    /// Opens a lobby with the caller as host and subscribes them to it.
    pub async fn create(&self, link: &Link, name: Option<String>, theme: Option<String>) -> anyhow::Result<Lobby> {
        let name = Self::fallback(name, DEFAULT_HOST);
        let theme = Self::fallback(theme, DEFAULT_THEME);
        let deck = self.deck(&theme).await?;
        let code = self.registry.vacant().await;
        let lobby = Lobby::new(code, theme, deck, Player::human(name, link.id()), &self.rules);
        self.registry.insert(lobby.clone()).await?;
        self.rooms.join(lobby.id(), link).await;
        self.rooms.broadcast(&Event::LobbyUpdate(lobby.clone())).await;
        log::info!("[casino] opened {}", lobby);
        Ok(lobby)
    }
    /// Seats the caller, or recovers their seat by name.
    pub async fn join(&self, link: &Link, code: &Code, name: Option<String>) -> anyhow::Result<Lobby> {
        let name = Self::fallback(name, DEFAULT_NAME);
        let (player, lobby) = self
            .registry
            .update(code, |lobby| lobby.join(&name, link.id()))
            .await?;
        let lobby = lobby.ok_or(LobbyError::NoLobby)?;
        self.rooms.join(code, link).await;
        self.rooms.broadcast(&Event::LobbyUpdate(lobby.clone())).await;
        log::info!("[casino] {} joined {}", player, code);
        Ok(lobby)
    }
    pub async fn add_bot(&self, code: &Code) -> anyhow::Result<Lobby> {
        let (_, lobby) = self.registry.update(code, |lobby| lobby.add_bot()).await?;
        let lobby = lobby.ok_or(LobbyError::NoLobby)?;
        self.rooms.broadcast(&Event::LobbyUpdate(lobby.clone())).await;
        Ok(lobby)
    }
    /// Deals, and wakes the first bot if one leads.
    pub async fn start(self: &Arc<Self>, code: &Code) -> anyhow::Result<Lobby> {
        let (_, lobby) = self
            .registry
            .update(code, |lobby| lobby.start(&mut rand::rng()))
            .await?;
        let lobby = lobby.ok_or(LobbyError::NoLobby)?;
        self.rooms.broadcast(&Event::GameStarted(lobby.clone())).await;
        self.schedule(&lobby, self.rules.pacing.opening);
        Ok(lobby)
    }
    /// Resolves a round for a human, then lets the next bot answer.
    pub async fn choose(self: &Arc<Self>, code: &Code, player: ID<Player>, attr: &str) -> anyhow::Result<(Round, Lobby)> {
        let (round, lobby) = self
            .registry
            .update(code, |lobby| lobby.resolve(attr, player))
            .await?;
        let lobby = lobby.ok_or(LobbyError::NoLobby)?;
        self.announce(&round, &lobby).await;
        self.schedule(&lobby, self.rules.pacing.reply);
        Ok((round, lobby))
    }
    /// Unsubscribes the caller. Before the game starts this also gives up
    /// their seat, and the lobby is deleted once nobody is left.
    pub async fn leave(&self, link: &Link, code: &Code) -> anyhow::Result<Option<Lobby>> {
        self.rooms.leave(code, link.id()).await;
        let (removed, lobby) = self
            .registry
            .update(code, |lobby| Ok(lobby.leave(link.id())))
            .await?;
        log::debug!("[casino] {} seats freed in {}", removed, code);
        match lobby {
            Some(ref lobby) => self.rooms.broadcast(&Event::LobbyUpdate(lobby.clone())).await,
            None => {
                self.rooms.close(code).await;
                log::info!("[casino] closed {}", code);
            }
        }
        Ok(lobby)
    }
    /// Re-arms bot timers for lobbies restored from storage.
    pub async fn resume(self: &Arc<Self>) {
        for code in self.registry.ids().await {
            if let Some(lobby) = self.registry.get(&code).await {
                self.schedule(&lobby, self.rules.pacing.opening);
            }
        }
    }
}

/// Bot scheduling.
impl Casino {
    /// Arms a bot timer if a bot is due to play.
    fn schedule(self: &Arc<Self>, lobby: &Lobby, delay: Duration) {
        if lobby.bot_choice(self.brain.as_ref()).is_none() {
            return;
        }
        let casino = self.clone();
        let code = lobby.id().clone();
        let generation = lobby.generation();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = casino.bot_turn(&code, generation).await {
                log::debug!("[casino] bot timer for {} dropped: {}", code, e);
            }
        });
    }
    /// Plays one bot round, provided the lobby is still where the timer
    /// left it, then arms the next bot.
    async fn bot_turn(self: &Arc<Self>, code: &Code, generation: u64) -> anyhow::Result<()> {
        let brain = self.brain.clone();
        let (round, lobby) = self
            .registry
            .update(code, |lobby| {
                if lobby.generation() != generation {
                    return Err(LobbyError::NoActiveGame);
                }
                let (bot, attr) = lobby
                    .bot_choice(brain.as_ref())
                    .ok_or(LobbyError::NoActiveGame)?;
                lobby.resolve(&attr, bot)
            })
            .await?;
        let lobby = lobby.ok_or(LobbyError::NoLobby)?;
        self.announce(&round, &lobby).await;
        self.schedule(&lobby, self.rules.pacing.chain);
        Ok(())
    }
    async fn announce(&self, round: &Round, lobby: &Lobby) {
        self.rooms
            .broadcast(&Event::RoundResult {
                round: round.clone(),
                lobby: lobby.clone(),
            })
            .await;
    }
}

/// Request dispatch.
impl Casino {
    /// Runs one client request and builds its reply.
    pub async fn serve(self: &Arc<Self>, link: &Link, request: Request) -> ServerMessage {
        let id = request.id;
        match request.command {
            Command::CreateLobby { name, theme } => match self.create(link, name, theme).await {
                Ok(lobby) => Protocol::success(id, Some(lobby), None),
                Err(e) => Protocol::failure(id, &e),
            },
            Command::JoinLobby { lobby_id, name } => match self.join(link, &lobby_id, name).await {
                Ok(lobby) => Protocol::success(id, Some(lobby), None),
                Err(e) => Protocol::failure(id, &e),
            },
            Command::AddBot { lobby_id } => match self.add_bot(&lobby_id).await {
                Ok(lobby) => Protocol::success(id, Some(lobby), None),
                Err(e) => Protocol::failure(id, &e),
            },
            Command::StartGame { lobby_id } => match self.start(&lobby_id).await {
                Ok(lobby) => Protocol::success(id, Some(lobby), None),
                Err(e) => Protocol::failure(id, &e),
            },
            Command::ChooseAttribute {
                lobby_id,
                player_id,
                attr,
            } => match self.choose(&lobby_id, player_id, &attr).await {
                Ok((round, lobby)) => Protocol::success(id, Some(lobby), Some(round)),
                Err(e) => Protocol::failure(id, &e),
            },
            Command::LeaveLobby { lobby_id } => match self.leave(link, &lobby_id).await {
                Ok(lobby) => Protocol::success(id, lobby, None),
                Err(e) if e.downcast_ref::<LobbyError>() == Some(&LobbyError::NoLobby) => {
                    ServerMessage::err(id, None)
                }
                Err(e) => Protocol::failure(id, &e),
            },
        }
    }
    /// Spawns the WebSocket bridge for one connection.
    ///
    /// Queued replies and broadcasts drain into the socket; incoming text
    /// frames are decoded and served in arrival order. Closing the socket
    /// only drops subscriptions; seats stay for a later recovery.
    pub async fn bridge(
        self: &Arc<Self>,
        mut session: actix_ws::Session,
        mut streams: actix_ws::MessageStream,
    ) -> anyhow::Result<()> {
        use futures::StreamExt;
        let (link, mut rx) = Link::pair();
        let casino = self.clone();
        log::debug!("[bridge {}] connected", link.id());
        actix_web::rt::spawn(async move {
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(json) => if session.text(json).await.is_err() { break 'sesh },
                        None => break 'sesh,
                    },
                    msg = streams.next() => match msg {
                        Some(Ok(actix_ws::Message::Text(text))) => {
                            let reply = match Protocol::decode(&text) {
                                Ok(request) => casino.serve(&link, request).await,
                                Err(e) => Protocol::failure(None, &anyhow::Error::from(e)),
                            };
                            link.send(&reply);
                        }
                        Some(Ok(actix_ws::Message::Ping(bytes))) => if session.pong(&bytes).await.is_err() { break 'sesh },
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            casino.rooms.forget(link.id()).await;
            log::debug!("[bridge {}] disconnected", link.id());
        });
        Ok(())
    }
}

impl Casino {
    /// Deck for a theme, large enough to deal a full table.
    ///
    /// The theme is marked as attempted before generation so a failed
    /// attempt is still on record. Only decks that can deal a full table
    /// are cached.
    async fn deck(&self, theme: &str) -> anyhow::Result<Deck> {
        let (seats, hand) = (self.rules.max_players, self.rules.hand_size);
        let cached = self.registry.cached(theme).await;
        if cached.is_none() {
            self.registry.remember(theme, None).await?;
        }
        let cached = cached.flatten();
        let deck = self.forge.forge(theme, cached.as_ref(), seats * hand).await?;
        if !deck.sufficient(seats, hand) {
            anyhow::bail!("theme {} has too few cards for a full table", theme);
        }
        if cached.as_ref() != Some(&deck) {
            self.registry.remember(theme, Some(deck.clone())).await?;
            log::info!("[casino] forged {} cards for {}", deck.len(), theme);
        }
        Ok(deck)
    }
    fn fallback(value: Option<String>, fallback: &str) -> String {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;
    use topdeck_cards::Card;
    use topdeck_cards::Synthetic;

    /// Generator that is always down.
    struct Offline;
    #[async_trait::async_trait]
    impl Forge for Offline {
        async fn forge(&self, theme: &str, _: Option<&Deck>, _: usize) -> anyhow::Result<Deck> {
            anyhow::bail!("no cards for {}", theme)
        }
    }
    /// Generator that ignores how many cards were asked for.
    struct Stingy;
    #[async_trait::async_trait]
    impl Forge for Stingy {
        async fn forge(&self, _: &str, _: Option<&Deck>, _: usize) -> anyhow::Result<Deck> {
            Ok(Deck::new(
                vec!["power".into()],
                vec![Card::new("Usopp", "", [("power".to_string(), 1)])],
            ))
        }
    }

    async fn casino_with(forge: Arc<dyn Forge>, memory: Arc<Memory>, rules: Rules) -> Arc<Casino> {
        let registry = Registry::load(memory).await.unwrap();
        Arc::new(Casino::new(rules, forge, Arc::new(Greedy), Arc::new(registry)))
    }
    async fn casino_over(memory: Arc<Memory>, rules: Rules) -> Arc<Casino> {
        casino_with(Arc::new(Synthetic), memory, rules).await
    }
    async fn casino() -> Arc<Casino> {
        casino_over(Arc::new(Memory::default()), Rules::instant()).await
    }
    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|s| serde_json::from_str(&s).unwrap())
            .collect()
    }
    /// Lets bot timers run until the lobby needs a human or is over.
    async fn settle(casino: &Casino, code: &Code) -> Lobby {
        for _ in 0..200 {
            let lobby = casino.registry().get(code).await.unwrap();
            let waiting = lobby.active().is_some_and(|p| !p.is_bot());
            if lobby.state() != State::Playing || waiting {
                return lobby;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("bots never settled in {}", code);
    }
    fn request(json: serde_json::Value) -> Request {
        Protocol::decode(&json.to_string()).unwrap()
    }

    #[tokio::test]
    async fn create_defaults_and_subscribes() {
        let casino = casino().await;
        let (host, mut rx) = Link::pair();
        let lobby = casino.create(&host, None, Some("  ".into())).await.unwrap();
        assert_eq!(lobby.theme(), DEFAULT_THEME);
        assert_eq!(lobby.players()[0].name(), DEFAULT_HOST);
        assert_eq!(lobby.id().as_str().len(), CODE_LENGTH);
        assert_eq!(casino.rooms().members(lobby.id()).await, 1);
        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["type"], "lobbyUpdate");
        assert_eq!(casino.registry().cached("one piece").await.map(|d| d.is_some()), Some(true));
    }
    #[tokio::test]
    async fn larger_tables_get_larger_decks() {
        let rules = Rules {
            max_players: 5,
            hand_size: 7,
            ..Rules::instant()
        };
        let casino = casino_over(Arc::new(Memory::default()), rules).await;
        let (host, _rx) = Link::pair();
        let lobby = casino.create(&host, None, None).await.unwrap();
        assert_eq!(lobby.max_players(), 5);
        let cached = casino.registry().cached(DEFAULT_THEME).await.flatten().unwrap();
        assert!(cached.sufficient(5, 7));
        let code = lobby.id().clone();
        casino.add_bot(&code).await.unwrap();
        let lobby = casino.start(&code).await.unwrap();
        assert!(lobby.players().iter().all(|p| p.hand().len() == 7));
    }
    #[tokio::test]
    async fn undersized_cached_decks_are_replaced() {
        let casino = casino().await;
        let small = Deck::new(vec!["power".into()], Synthetic::generate("Naruto").cards()[..3].to_vec());
        casino.registry().remember("Naruto", Some(small)).await.unwrap();
        let (host, _rx) = Link::pair();
        casino.create(&host, None, Some("Naruto".into())).await.unwrap();
        let cached = casino.registry().cached("naruto").await.flatten().unwrap();
        assert_eq!(cached, Synthetic::generate("Naruto"));
    }
    #[tokio::test]
    async fn generator_failures_abort_creation() {
        let casino = casino_with(Arc::new(Offline), Arc::new(Memory::default()), Rules::instant()).await;
        let (host, mut rx) = Link::pair();
        assert!(casino.create(&host, None, Some("Bleach".into())).await.is_err());
        assert!(casino.registry().ids().await.is_empty());
        assert_eq!(casino.registry().cached("Bleach").await, Some(None));
        assert!(drain(&mut rx).is_empty());
    }
    #[tokio::test]
    async fn short_decks_are_never_cached() {
        let casino = casino_with(Arc::new(Stingy), Arc::new(Memory::default()), Rules::instant()).await;
        let (host, _rx) = Link::pair();
        for _ in 0..2 {
            let error = casino.create(&host, None, Some("Bleach".into())).await.unwrap_err();
            assert!(error.to_string().contains("too few cards"));
            assert_eq!(casino.registry().cached("Bleach").await, Some(None));
        }
        assert!(casino.registry().ids().await.is_empty());
    }
    #[tokio::test]
    async fn joiners_are_announced_to_everyone() {
        let casino = casino().await;
        let (host, mut rx_host) = Link::pair();
        let (guest, mut rx_guest) = Link::pair();
        let lobby = casino.create(&host, Some("Luffy".into()), None).await.unwrap();
        drain(&mut rx_host);
        let lobby = casino.join(&guest, lobby.id(), None).await.unwrap();
        assert_eq!(lobby.players()[1].name(), DEFAULT_NAME);
        assert_eq!(drain(&mut rx_host).len(), 1);
        assert_eq!(drain(&mut rx_guest)[0]["lobby"]["players"][1]["name"], DEFAULT_NAME);
    }
    #[tokio::test]
    async fn recovery_rebinds_a_new_connection() {
        let casino = casino().await;
        let (host, _rx) = Link::pair();
        let lobby = casino.create(&host, Some("Luffy".into()), None).await.unwrap();
        let (again, _rx_again) = Link::pair();
        let lobby = casino.join(&again, lobby.id(), Some("Luffy".into())).await.unwrap();
        assert_eq!(lobby.players().len(), 1);
        assert_eq!(lobby.players()[0].connection(), Some(again.id()));
    }
    #[tokio::test]
    async fn bots_play_until_a_human_is_due() {
        let casino = casino().await;
        let (host, mut rx) = Link::pair();
        let lobby = casino.create(&host, Some("Luffy".into()), None).await.unwrap();
        let code = lobby.id().clone();
        casino.add_bot(&code).await.unwrap();
        let mut lobby = casino.start(&code).await.unwrap();
        assert_eq!(lobby.players().len(), MAX_PLAYERS);
        let luffy = lobby.players()[0].id();
        while lobby.state() == State::Playing {
            let attr = lobby.attributes()[0].clone();
            casino.choose(&code, luffy, &attr).await.unwrap();
            lobby = settle(&casino, &code).await;
        }
        assert_eq!(lobby.state(), State::Finished);
        assert_eq!(lobby.history().len(), HAND_SIZE);
        assert_eq!(lobby.cards_in_hands(), 0);
        let sent = drain(&mut rx);
        let rounds = sent.iter().filter(|m| m["type"] == "roundResult").count();
        assert_eq!(rounds, HAND_SIZE);
        assert_eq!(sent.iter().filter(|m| m["type"] == "gameStarted").count(), 1);
    }
    #[tokio::test]
    async fn stale_bot_timers_do_nothing() {
        let casino = casino().await;
        let (host, _rx) = Link::pair();
        let lobby = casino.create(&host, None, None).await.unwrap();
        let code = lobby.id().clone();
        casino.add_bot(&code).await.unwrap();
        let lobby = casino.start(&code).await.unwrap();
        assert!(casino.bot_turn(&code, lobby.generation() - 1).await.is_err());
        assert!(casino.bot_turn(&code, lobby.generation()).await.is_err());
        assert_eq!(casino.registry().get(&code).await.unwrap(), lobby);
    }
    #[tokio::test]
    async fn timers_resume_after_restart() {
        let memory = Arc::new(Memory::default());
        let frozen = Rules {
            pacing: Pacing::uniform(Duration::from_secs(3600)),
            ..Rules::default()
        };
        let before = casino_over(memory.clone(), frozen).await;
        let (host, _rx) = Link::pair();
        let lobby = before.create(&host, None, None).await.unwrap();
        let code = lobby.id().clone();
        before.add_bot(&code).await.unwrap();
        let mut lobby = before.start(&code).await.unwrap();
        let luffy = lobby.players()[0].id();
        while lobby.state() == State::Playing && !lobby.active().is_some_and(Player::is_bot) {
            let attr = lobby.attributes()[0].clone();
            lobby = before.choose(&code, luffy, &attr).await.unwrap().1;
        }
        if lobby.state() != State::Playing {
            return;
        }
        let after = casino_over(memory, Rules::instant()).await;
        after.resume().await;
        let resumed = settle(&after, &code).await;
        assert!(resumed.generation() > lobby.generation());
        assert!(resumed.players().iter().all(|p| p.connection().is_none()));
    }
    #[tokio::test]
    async fn serve_reports_lobby_errors() {
        let casino = casino().await;
        let (link, _rx) = Link::pair();
        let reply = casino
            .serve(&link, request(serde_json::json!({"type": "joinLobby", "id": 4, "lobbyId": "ZZZZZ"})))
            .await;
        let json = serde_json::to_value(reply).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["ok"], false);
        assert_eq!(json["err"], "no lobby");
    }
    #[tokio::test]
    async fn leaving_a_missing_lobby_is_quiet() {
        let casino = casino().await;
        let (link, _rx) = Link::pair();
        let reply = casino
            .serve(&link, request(serde_json::json!({"type": "leaveLobby", "id": 5, "lobbyId": "ZZZZZ"})))
            .await;
        let json = serde_json::to_value(reply).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json.get("err").is_none());
    }
    #[tokio::test]
    async fn serve_checks_whose_turn_it_is() {
        let casino = casino().await;
        let (host, _rx) = Link::pair();
        let (guest, _rx_guest) = Link::pair();
        let lobby = casino.create(&host, Some("Luffy".into()), None).await.unwrap();
        let code = lobby.id().clone();
        let lobby = casino.join(&guest, &code, Some("Zoro".into())).await.unwrap();
        let zoro = lobby.players()[1].id();
        let started = serde_json::to_value(
            casino
                .serve(&host, request(serde_json::json!({"type": "startGame", "id": 1, "lobbyId": code.as_str()})))
                .await,
        )
        .unwrap();
        assert_eq!(started["ok"], true);
        assert_eq!(started["lobby"]["state"], "playing");
        let chosen = serde_json::to_value(
            casino
                .serve(
                    &guest,
                    request(serde_json::json!({
                        "type": "chooseAttribute",
                        "id": 2,
                        "lobbyId": code.as_str(),
                        "playerId": zoro.to_string(),
                        "attr": "power",
                    })),
                )
                .await,
        )
        .unwrap();
        assert_eq!(chosen["ok"], false);
        assert_eq!(chosen["err"], "not your turn");
    }
    #[tokio::test]
    async fn last_one_out_closes_the_lobby() {
        let casino = casino().await;
        let (host, _rx) = Link::pair();
        let (guest, mut rx_guest) = Link::pair();
        let lobby = casino.create(&host, None, None).await.unwrap();
        let code = lobby.id().clone();
        casino.join(&guest, &code, Some("Zoro".into())).await.unwrap();
        drain(&mut rx_guest);
        let lobby = casino.leave(&host, &code).await.unwrap().unwrap();
        assert_eq!(lobby.players().len(), 1);
        assert_eq!(drain(&mut rx_guest).len(), 1);
        assert!(casino.leave(&guest, &code).await.unwrap().is_none());
        assert!(casino.registry().get(&code).await.is_none());
        assert_eq!(casino.rooms().members(&code).await, 0);
    }
    #[tokio::test]
    async fn leaving_mid_game_keeps_the_seat() {
        let casino = casino().await;
        let (host, _rx) = Link::pair();
        let (guest, _rx_guest) = Link::pair();
        let lobby = casino.create(&host, None, None).await.unwrap();
        let code = lobby.id().clone();
        casino.join(&guest, &code, Some("Zoro".into())).await.unwrap();
        casino.start(&code).await.unwrap();
        let lobby = casino.leave(&guest, &code).await.unwrap().unwrap();
        assert_eq!(lobby.players().len(), MAX_PLAYERS);
        assert_eq!(casino.rooms().members(&code).await, 1);
    }
}
