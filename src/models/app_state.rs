use std::collections::HashMap;
use std::sync::Mutex;

use actix::Addr;

use crate::models::game_state::GameState;
use crate::websocket::handler::GameSocket;

/// Application state shared between connections. Snapshot replacement and
/// broadcast both go through these mutexes, so every reader sees a
/// consistent game per lock acquisition.
pub struct AppState {
    pub games: Mutex<HashMap<String, GameState>>,
    pub connections: Mutex<HashMap<String, Vec<String>>>,
    pub sessions: Mutex<HashMap<String, Addr<GameSocket>>>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState {
            games: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }
}
