use std::collections::HashMap;

use crate::models::game::Game;

/// Server-side record for one hosted game: the game itself plus the secret
/// per-player keys that authenticate move/ready/reset requests.
pub struct GameState {
    pub game: Game,
    pub player_keys: HashMap<u8, String>,
}

impl GameState {
    /// Resolve a presented key to a player number; no key or no match means
    /// player 0, a spectator.
    pub fn auth_player(&self, player_key: Option<&str>) -> u8 {
        if let Some(key) = player_key {
            for (player, known) in &self.player_keys {
                if known == key {
                    return *player;
                }
            }
        }
        0
    }
}
