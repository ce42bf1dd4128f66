//! Topdeck Server
//!
//! Serves the lobby WebSocket protocol plus a couple of plain HTTP routes
//! from a single actix-web server.
//!
//! Configuration comes from the environment:
//!
//! - `BIND_ADDR` — listen address (default `127.0.0.1:8888`)
//! - `SNAPSHOT_PATH` — JSON snapshot file (default `db.json`)
//! - `MAX_PLAYERS`, `HAND_SIZE`, `BOT_DELAY_MS` — see [`Rules::from_env`]

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;
use topdeck_cards::Synthetic;
use topdeck_gameroom::Greedy;
use topdeck_gameroom::JsonFile;
use topdeck_gameroom::Registry;
use topdeck_gameroom::Rules;
use topdeck_hosting::Casino;
use topdeck_hosting::handlers;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: String,
    pub snapshot: String,
    pub rules: Rules,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            bind: std::env::var("BIND_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:8888")),
            snapshot: std::env::var("SNAPSHOT_PATH").unwrap_or_else(|_| String::from("db.json")),
            rules: Rules::from_env(),
        }
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[rustfmt::skip]
pub async fn run() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    let storage = Arc::new(JsonFile::new(&settings.snapshot));
    let registry = Arc::new(Registry::load(storage).await?);
    let casino = Arc::new(Casino::new(settings.rules, Arc::new(Synthetic), Arc::new(Greedy), registry));
    casino.resume().await;
    let casino = web::Data::from(casino);
    log::info!("starting server on {} with {:?}", settings.bind, settings.rules);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(casino.clone())
            .route("/health", web::get().to(health))
            .route("/lobby/{code}", web::get().to(handlers::lobby))
            .route("/ws", web::get().to(handlers::enter))
    })
    .bind(&settings.bind)?
    .run()
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn settings_fall_back_to_defaults() {
        let settings = Settings::from_env();
        if std::env::var("BIND_ADDR").is_err() {
            assert_eq!(settings.bind, "127.0.0.1:8888");
        }
        if std::env::var("SNAPSHOT_PATH").is_err() {
            assert_eq!(settings.snapshot, "db.json");
        }
    }
}
