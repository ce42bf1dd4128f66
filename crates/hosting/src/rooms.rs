use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;
use topdeck_core::Code;
use topdeck_core::ID;
use topdeck_gameroom::Connection;
use topdeck_gameroom::Event;
use topdeck_gameroom::Protocol;

/// Which connections watch which lobby.
///
/// A connection may watch several lobbies. Subscriptions live only in
/// memory; after a restart clients resubscribe by joining again.
#[derive(Default)]
pub struct Rooms {
    rooms: RwLock<HashMap<Code, Vec<Link>>>,
}

impl Rooms {
    pub async fn join(&self, code: &Code, link: &Link) {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(code.clone()).or_default();
        if room.iter().all(|l| l.id() != link.id()) {
            room.push(link.clone());
        }
    }
    pub async fn leave(&self, code: &Code, id: ID<Connection>) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(code) {
            room.retain(|l| l.id() != id);
            if room.is_empty() {
                rooms.remove(code);
            }
        }
    }
    /// Drops a connection from every lobby, e.g. on socket close.
    pub async fn forget(&self, id: ID<Connection>) {
        let mut rooms = self.rooms.write().await;
        rooms.values_mut().for_each(|room| room.retain(|l| l.id() != id));
        rooms.retain(|_, room| !room.is_empty());
    }
    /// Drops every subscription to a deleted lobby.
    pub async fn close(&self, code: &Code) {
        self.rooms.write().await.remove(code);
    }
    pub async fn members(&self, code: &Code) -> usize {
        self.rooms.read().await.get(code).map_or(0, Vec::len)
    }
    /// Sends the event to every watcher of its lobby.
    pub async fn broadcast(&self, event: &Event) {
        let code = event.lobby().id();
        let msg = Protocol::encode(event);
        let rooms = self.rooms.read().await;
        let sent = rooms
            .get(code)
            .map(|room| room.iter().filter(|l| l.send(&msg)).count())
            .unwrap_or(0);
        log::debug!("[rooms] {} -> {} watchers", event, sent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topdeck_cards::Synthetic;
    use topdeck_gameroom::Lobby;
    use topdeck_gameroom::Player;
    use topdeck_gameroom::Rules;

    fn lobby(code: &str) -> Lobby {
        Lobby::new(
            Code::from(code),
            "One Piece",
            Synthetic::generate("One Piece"),
            Player::human("Luffy", ID::default()),
            &Rules::default(),
        )
    }

    #[tokio::test]
    async fn broadcasts_reach_only_watchers() {
        let rooms = Rooms::default();
        let (a, mut rx_a) = Link::pair();
        let (b, mut rx_b) = Link::pair();
        rooms.join(&Code::from("AAAAA"), &a).await;
        rooms.join(&Code::from("BBBBB"), &b).await;
        rooms.broadcast(&Event::LobbyUpdate(lobby("AAAAA"))).await;
        let json: serde_json::Value = serde_json::from_str(&rx_a.try_recv().unwrap()).unwrap();
        assert_eq!(json["type"], "lobbyUpdate");
        assert_eq!(json["lobby"]["id"], "AAAAA");
        assert!(rx_b.try_recv().is_err());
    }
    #[tokio::test]
    async fn joining_twice_subscribes_once() {
        let rooms = Rooms::default();
        let code = Code::from("AAAAA");
        let (a, _rx) = Link::pair();
        rooms.join(&code, &a).await;
        rooms.join(&code, &a).await;
        assert_eq!(rooms.members(&code).await, 1);
    }
    #[tokio::test]
    async fn forgetting_a_connection_clears_all_rooms() {
        let rooms = Rooms::default();
        let (a, _rx_a) = Link::pair();
        let (b, _rx_b) = Link::pair();
        rooms.join(&Code::from("AAAAA"), &a).await;
        rooms.join(&Code::from("BBBBB"), &a).await;
        rooms.join(&Code::from("BBBBB"), &b).await;
        rooms.forget(a.id()).await;
        assert_eq!(rooms.members(&Code::from("AAAAA")).await, 0);
        assert_eq!(rooms.members(&Code::from("BBBBB")).await, 1);
        rooms.leave(&Code::from("BBBBB"), b.id()).await;
        assert_eq!(rooms.members(&Code::from("BBBBB")).await, 0);
    }
    #[tokio::test]
    async fn closed_receivers_are_tolerated() {
        let rooms = Rooms::default();
        let code = Code::from("AAAAA");
        let (a, rx) = Link::pair();
        rooms.join(&code, &a).await;
        drop(rx);
        rooms.broadcast(&Event::LobbyUpdate(lobby("AAAAA"))).await;
        assert_eq!(rooms.members(&code).await, 1);
    }
}
