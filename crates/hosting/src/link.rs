use topdeck_core::ID;
use topdeck_gameroom::Connection;
use topdeck_gameroom::ServerMessage;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Outbound half of one client connection.
///
/// Replies and broadcasts are queued here as JSON and drained into the
/// WebSocket by the bridge task, so everything reaches the client in the
/// order it was sent.
#[derive(Clone, Debug)]
pub struct Link {
    id: ID<Connection>,
    tx: UnboundedSender<String>,
}

impl Link {
    /// A fresh connection identity with the receiving end of its queue.
    pub fn pair() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel::<String>();
        let link = Self {
            id: ID::default(),
            tx,
        };
        (link, rx)
    }
    pub fn id(&self) -> ID<Connection> {
        self.id
    }
    /// False once the connection is gone.
    pub fn send(&self, msg: &ServerMessage) -> bool {
        self.tx.send(msg.to_json()).is_ok()
    }
}
