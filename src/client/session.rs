//! Client-side game session: holds the latest snapshot, drives the clock,
//! and screens outgoing move requests so obviously illegal ones never reach
//! the wire. The server stays the final authority; everything here is a UX
//! filter over the same rules it applies.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use uuid::Uuid;

use crate::client::clock::GameClock;
use crate::game::rules;
use crate::models::game::{Cooldown, Game, Move};
use crate::models::messages::{ClientMessage, ServerMessage};

/// Extra ticks a finished move keeps animating while the server's cooldown
/// entry is still in flight.
const MOVE_LINGER_TICKS: f64 = 10.0;

/// What the UI should be showing for the game right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    WaitingForPlayers,
    ReadyPrompt,
    InProgress,
    Finished,
}

/// Callback run after every accepted snapshot. Listeners get a shared
/// reference and can never mutate the snapshot they observe.
pub type UpdateListener = Box<dyn Fn(&Game)>;

pub struct GameSession {
    game_id: String,
    player_key: Option<String>,
    player: u8,
    game: Option<Game>,
    received_at: Instant,
    clock: GameClock,
    selected: Option<Uuid>,
    listeners: Vec<UpdateListener>,
}

impl GameSession {
    pub fn new(game_id: impl Into<String>, player_key: Option<String>) -> GameSession {
        GameSession {
            game_id: game_id.into(),
            player_key,
            player: 0,
            game: None,
            received_at: Instant::now(),
            clock: GameClock::new(),
            selected: None,
            listeners: Vec::new(),
        }
    }

    /// Register an update listener. It fires immediately with the held
    /// snapshot (if any) and again after every accepted update.
    pub fn subscribe(&mut self, listener: UpdateListener) {
        if let Some(game) = &self.game {
            listener(game);
        }
        self.listeners.push(listener);
    }

    pub fn player(&self) -> u8 {
        self.player
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    /// Absorb a server message. Every game-bearing message replaces the held
    /// snapshot wholesale, subject to the ordering guard.
    pub fn apply(&mut self, message: ServerMessage) {
        let game = match message {
            ServerMessage::JoinAck { game, player, .. } => {
                self.player = player;
                game
            }
            ServerMessage::ReadyAck { game }
            | ServerMessage::MoveAck { game, .. }
            | ServerMessage::ResetAck { game }
            | ServerMessage::Update { game, .. } => game,
            ServerMessage::Error { message } => {
                debug!("server error: {}", message);
                return;
            }
        };
        self.accept(game);
    }

    fn accept(&mut self, game: Game) {
        // reordered delivery must not roll the simulation backwards; a tick
        // of zero is a fresh game after reset and always wins
        if let Some(held) = &self.game {
            if game.current_tick != 0 && game.current_tick < held.current_tick {
                debug!(
                    "discarding out-of-order snapshot (tick {} < {})",
                    game.current_tick, held.current_tick
                );
                return;
            }
        }

        // the selection cannot outlive its piece or survive a reset
        if let Some(selected) = self.selected {
            let alive = game.started
                && game
                    .board
                    .piece_by_id(selected)
                    .map_or(false, |p| !p.captured);
            if !alive {
                self.selected = None;
            }
        }

        self.game = Some(game);
        self.received_at = Instant::now();

        if let Some(game) = &self.game {
            for listener in &self.listeners {
                listener(game);
            }
        }
    }

    /// Smoothly advancing simulation tick for rendering and legality checks.
    pub fn current_tick(&mut self) -> f64 {
        match &self.game {
            Some(game) => self.clock.current_tick(game, self.received_at),
            None => 0.0,
        }
    }

    /// Explicit UI state machine evaluated against the snapshot.
    pub fn phase(&self) -> GamePhase {
        let game = match &self.game {
            Some(game) => game,
            None => return GamePhase::WaitingForPlayers,
        };
        if game.finished != 0 {
            return GamePhase::Finished;
        }
        if game.started {
            return GamePhase::InProgress;
        }
        if self.is_ready() {
            GamePhase::WaitingForPlayers
        } else {
            GamePhase::ReadyPrompt
        }
    }

    /// Whether this client has confirmed readiness. Spectators have nothing
    /// to confirm.
    pub fn is_ready(&self) -> bool {
        let game = match &self.game {
            Some(game) => game,
            None => return false,
        };
        if self.player == 0 {
            return true;
        }
        *game.players_ready.get(&self.player).unwrap_or(&false)
    }

    /// Mark a piece selected for an upcoming move. Only the client's own
    /// live pieces in a started game are selectable.
    pub fn select(&mut self, piece_id: Uuid) -> bool {
        let ok = self.game.as_ref().map_or(false, |game| {
            game.started
                && game
                    .board
                    .piece_by_id(piece_id)
                    .map_or(false, |p| !p.captured && p.player == self.player)
        });
        self.selected = if ok { Some(piece_id) } else { None };
        ok
    }

    pub fn selection(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Validate a move against the current snapshot and tick, and produce
    /// the outbound request if it passes. A piece that is mid-move or on
    /// cooldown cannot be dispatched, on top of the per-kind legality rules.
    pub fn request_move(
        &mut self,
        piece_id: Uuid,
        to_row: i32,
        to_col: i32,
    ) -> Option<ClientMessage> {
        let player_key = self.player_key.clone()?;
        let current_tick = self.current_tick();

        let game = self.game.as_ref()?;
        if !game.started || game.finished != 0 {
            return None;
        }
        let piece = game.board.piece_by_id(piece_id)?;
        if piece.captured || piece.player != self.player {
            return None;
        }
        if rules::is_moving(game, piece) || rules::is_cooldown(game, piece) {
            return None;
        }
        if !rules::is_legal_move(game, current_tick, piece, to_row, to_col) {
            return None;
        }

        Some(ClientMessage::Move {
            game_id: self.game_id.clone(),
            player_key,
            piece_id,
            to_row,
            to_col,
        })
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::Join {
            game_id: self.game_id.clone(),
            player_key: self.player_key.clone(),
        }
    }

    pub fn ready_message(&self) -> Option<ClientMessage> {
        Some(ClientMessage::Ready {
            game_id: self.game_id.clone(),
            player_key: self.player_key.clone()?,
        })
    }

    pub fn reset_message(&self) -> Option<ClientMessage> {
        Some(ClientMessage::Reset {
            game_id: self.game_id.clone(),
            player_key: self.player_key.clone()?,
        })
    }

    /// Moves that should still animate at the given tick: everything in
    /// flight, plus recently finished log entries inside the linger window.
    pub fn animated_moves(&self, current_tick: f64) -> Vec<&Move> {
        let game = match &self.game {
            Some(game) => game,
            None => return Vec::new(),
        };

        let mut by_piece: HashMap<Uuid, &Move> = HashMap::new();
        for mv in &game.move_log {
            let done_at = mv.starting_tick as f64 + mv.total_ticks(game.move_ticks) as f64;
            if current_tick <= done_at + MOVE_LINGER_TICKS {
                by_piece.insert(mv.piece_id, mv);
            }
        }
        for mv in &game.active_moves {
            by_piece.insert(mv.piece_id, mv);
        }
        by_piece.into_values().collect()
    }

    /// Cooldowns that have begun from the renderer's point of view.
    pub fn visible_cooldowns(&self, current_tick: f64) -> Vec<&Cooldown> {
        match &self.game {
            Some(game) => game
                .cooldowns
                .iter()
                .filter(|c| current_tick >= c.starting_tick as f64)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Tear the session down: the clock stops producing ticks and the
    /// returned message tells the server we left.
    pub fn destroy(&mut self) -> ClientMessage {
        self.clock.stop();
        ClientMessage::Leave {
            game_id: self.game_id.clone(),
        }
    }
}
