use std::collections::HashMap;

use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game::{Game, Speed};
use crate::models::{AppState, GameState};

const GAME_ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GAME_ID_LEN: usize = 6;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Kung Fu Chess")
}

#[derive(Deserialize, Debug)]
pub struct NewGameRequest {
    pub speed: Speed,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewGameResponse {
    pub success: bool,
    pub game_id: String,
    pub game: Game,
    pub player_keys: HashMap<u8, String>,
}

/// Create a game: a short shareable id, a secret key per seat, and a fresh
/// board waiting for both ready confirmations.
pub async fn new_game(
    request: web::Json<NewGameRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let mut rng = rand::thread_rng();
    let game_id: String = (0..GAME_ID_LEN)
        .map(|_| GAME_ID_CHARS[rng.gen_range(0..GAME_ID_CHARS.len())] as char)
        .collect();

    let player_keys: HashMap<u8, String> =
        (1..=2).map(|p| (p, Uuid::new_v4().to_string())).collect();
    let players: HashMap<u8, String> = (1..=2).map(|p| (p, "o".to_string())).collect();

    let game = Game::new(request.speed, players);
    info!("Created game {} at {} speed", game_id, request.speed.as_str());

    let response = NewGameResponse {
        success: true,
        game_id: game_id.clone(),
        game: game.snapshot(),
        player_keys: player_keys.clone(),
    };

    app_state
        .games
        .lock()
        .unwrap()
        .insert(game_id, GameState { game, player_keys });

    HttpResponse::Ok().json(response)
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/api/game/new").route(web::post().to(new_game)))
        .service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(fs::Files::new("/static", "./static"));
}
