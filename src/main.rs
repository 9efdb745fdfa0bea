use std::time::Duration;

use actix_web::{web, App, HttpServer};
use log::info;

use kungfu_chess_web::models::messages::ServerMessage;
use kungfu_chess_web::models::AppState;
use kungfu_chess_web::routes;
use kungfu_chess_web::websocket::broadcast_to_game;

/// One engine tick every 100ms.
const TICK_PERIOD: Duration = Duration::from_millis(100);
/// Games nobody has touched for this long are dropped.
const GAME_EXPIRY: Duration = Duration::from_secs(600);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting kung fu chess server at http://127.0.0.1:8080");

    // Create shared application state
    let app_state = web::Data::new(AppState::new());
    start_tick_loop(app_state.clone());

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure_routes)
    })
    .bind("127.0.0.1:8080")?
    .run()
    .await
}

/// Advance every running game on a fixed cadence, broadcasting the ticks
/// that produced meaningful events, and expire idle games.
fn start_tick_loop(app_state: web::Data<AppState>) {
    actix_rt::spawn(async move {
        let mut interval = actix_rt::time::interval(TICK_PERIOD);
        loop {
            interval.tick().await;

            let game_ids: Vec<String> = app_state.games.lock().unwrap().keys().cloned().collect();
            for game_id in game_ids {
                let mut expired = false;
                let mut update = None;

                {
                    let mut games = app_state.games.lock().unwrap();
                    let state = match games.get_mut(&game_id) {
                        Some(state) => state,
                        None => continue,
                    };

                    let game = &mut state.game;
                    let idle = game
                        .last_tick_time
                        .elapsed()
                        .max(game.last_move_time.elapsed());
                    if idle > GAME_EXPIRY {
                        expired = true;
                    } else if game.started && game.finished == 0 {
                        let updates = game.tick();
                        if game.finished != 0 {
                            info!("Game {} finished: {}", game_id, game.finished);
                        }
                        if !updates.is_empty() {
                            update = Some(ServerMessage::Update {
                                game: game.snapshot(),
                                updates,
                            });
                        }
                    }
                }

                if expired {
                    info!("Expiring idle game {}", game_id);
                    app_state.games.lock().unwrap().remove(&game_id);
                    app_state.connections.lock().unwrap().remove(&game_id);
                    continue;
                }

                if let Some(message) = update {
                    broadcast_to_game(&app_state, &game_id, &message);
                }
            }
        }
    });
}
