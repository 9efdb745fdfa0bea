use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::board::{Board, Piece};

/// A waypoint on a move's path. Integral values are board squares; the
/// knight's mid-flight waypoint is the fractional midpoint of its L.
pub type Waypoint = (f64, f64);

/// Game pace. Controls how many ticks a piece needs per square of travel
/// and how long it stays frozen after arriving.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Standard,
    Lightning,
}

impl Speed {
    pub fn move_ticks(self) -> u64 {
        match self {
            Speed::Standard => 10,
            Speed::Lightning => 2,
        }
    }

    pub fn cooldown_ticks(self) -> u64 {
        match self {
            Speed::Standard => 100,
            Speed::Lightning => 20,
        }
    }

    /// Minimum game length before the inactivity draw rule can trigger.
    pub fn min_draw_ticks(self) -> u64 {
        match self {
            Speed::Standard => 1800, // 3 min
            Speed::Lightning => 900, // 90 sec
        }
    }

    /// Ticks without a capture after which the game is declared drawn.
    pub fn draw_limit_ticks(self) -> u64 {
        match self {
            Speed::Standard => 900,  // 90 sec
            Speed::Lightning => 450, // 45 sec
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Speed::Standard => "standard",
            Speed::Lightning => "lightning",
        }
    }
}

/// An in-flight move. `move_seq` runs from the origin square through the
/// destination inclusive, so a one-square move has two waypoints.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub piece_id: Uuid,
    pub player: u8,
    pub move_seq: Vec<Waypoint>,
    pub starting_tick: u64,
}

impl Move {
    /// Ticks the whole path takes to traverse.
    pub fn total_ticks(&self, move_ticks: u64) -> u64 {
        (self.move_seq.len() as u64 - 1) * move_ticks
    }
}

/// Post-move immobilization window for a single piece.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Cooldown {
    pub piece_id: Uuid,
    pub player: u8,
    pub starting_tick: u64,
}

/// Meaningful events produced by a single engine tick, broadcast to clients
/// alongside the refreshed snapshot.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameUpdate {
    Capture { piece: Piece, target: Piece },
    Promotion { piece: Piece },
    #[serde(rename = "startcooldown")]
    StartCooldown { piece: Piece },
    #[serde(rename = "endcooldown")]
    EndCooldown { piece: Piece },
}

/// The whole game state, serialized wholesale as the snapshot clients
/// consume. `finished` is 0 while the game continues, the winner's player
/// number once a king falls, or `Game::DRAW`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub speed: Speed,
    pub players: HashMap<u8, String>,
    pub players_ready: HashMap<u8, bool>,
    pub board: Board,
    pub move_ticks: u64,
    pub cooldown_ticks: u64,
    pub active_moves: Vec<Move>,
    pub cooldowns: Vec<Cooldown>,
    pub move_log: Vec<Move>,
    pub current_tick: u64,
    pub time_since_last_tick: f64,
    pub started: bool,
    pub finished: i32,
    #[serde(skip, default = "Instant::now")]
    pub last_tick_time: Instant,
    #[serde(skip, default = "Instant::now")]
    pub last_move_time: Instant,
    #[serde(skip, default)]
    pub last_capture_tick: u64,
}

impl Game {
    pub const DRAW: i32 = -1;

    /// Clone the game for the wire, stamping how long the server has been
    /// sitting inside the current tick. Clients extrapolate from this.
    pub fn snapshot(&self) -> Game {
        let mut game = self.clone();
        game.time_since_last_tick = self.last_tick_time.elapsed().as_secs_f64();
        game
    }
}
