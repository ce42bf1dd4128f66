//! Topdeck Backend Binary
//!
//! Hosts live stat-card lobbies over WebSocket.
//! Runs on BIND_ADDR (default 127.0.0.1:8888).

#[tokio::main]
async fn main() {
    topdeck_core::log();
    topdeck_core::kys();
    if let Err(e) = topdeck_server::run().await {
        log::error!("server stopped: {:#}", e);
        std::process::exit(1);
    }
}
