use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use topdeck_core::Code;

/// Read-only lobby lookup, e.g. for link previews.
pub async fn lobby(casino: web::Data<Casino>, path: web::Path<String>) -> impl Responder {
    let code = Code::from(path.into_inner());
    match casino.registry().get(&code).await {
        Some(lobby) => HttpResponse::Ok().json(lobby),
        None => HttpResponse::NotFound().body(format!("no lobby {}", code)),
    }
}

/// Upgrades to a WebSocket speaking the lobby protocol.
pub async fn enter(casino: web::Data<Casino>, body: web::Payload, req: HttpRequest) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => match casino.into_inner().bridge(session, stream).await {
            Ok(()) => response.map_into_left_body(),
            Err(e) => HttpResponse::InternalServerError()
                .body(e.to_string())
                .map_into_right_body(),
        },
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
