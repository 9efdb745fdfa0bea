//! Server-side game engine: accepts moves, advances the simulation one tick
//! at a time, and resolves the collisions that continuous motion creates.

use std::collections::HashMap;
use std::time::Instant;

use log::debug;
use uuid::Uuid;

use crate::game::rules;
use crate::models::board::{Board, PieceKind};
use crate::models::game::{Cooldown, Game, GameUpdate, Move, Speed, Waypoint};

/// Pieces closer than this may interact at all; half a square diagonal is
/// the farthest two pieces can be while overlapping visually.
const COARSE_CAPTURE_DIST: f64 = 0.71;
/// Pieces closer than this actually collide.
const CAPTURE_DIST: f64 = 0.4001;
/// Fraction of its hop a knight must complete before it can capture.
const KNIGHT_CAPTURE_PROGRESS: f64 = 0.85;

impl Game {
    pub fn new(speed: Speed, players: HashMap<u8, String>) -> Game {
        let players_ready = players.keys().map(|p| (*p, false)).collect();
        Game {
            speed,
            players,
            players_ready,
            board: Board::initial(),
            move_ticks: speed.move_ticks(),
            cooldown_ticks: speed.cooldown_ticks(),
            active_moves: Vec::new(),
            cooldowns: Vec::new(),
            move_log: Vec::new(),
            current_tick: 0,
            time_since_last_tick: 0.0,
            started: false,
            finished: 0,
            last_tick_time: Instant::now(),
            last_move_time: Instant::now(),
            last_capture_tick: 0,
        }
    }

    /// Record a player's ready confirmation; the game starts once every
    /// player has confirmed.
    pub fn mark_ready(&mut self, player: u8) {
        if let Some(ready) = self.players_ready.get_mut(&player) {
            *ready = true;
        }
        if self.players_ready.values().all(|r| *r) {
            self.started = true;
            self.last_move_time = Instant::now();
            self.last_tick_time = Instant::now();
        }
    }

    /// Try to start a move. Returns whether the move was accepted; a castle
    /// additionally schedules the rook's companion move.
    pub fn move_piece(&mut self, piece_id: Uuid, player: u8, to_row: i32, to_col: i32) -> bool {
        let piece = match self.board.piece_by_id(piece_id) {
            Some(piece) => piece.clone(),
            None => {
                debug!("move failed: piece does not exist");
                return false;
            }
        };
        if piece.player != player || piece.captured {
            debug!("move failed: piece is not controlled by player");
            return false;
        }
        if rules::is_moving(self, &piece) {
            debug!("move failed: piece is already moving");
            return false;
        }
        if rules::is_cooldown(self, &piece) {
            debug!("move failed: piece is on cooldown");
            return false;
        }

        let path = match rules::move_path(self, self.current_tick as f64, &piece, to_row, to_col) {
            Some(path) => path,
            None => {
                debug!("move failed: destination is unreachable or blocked");
                return false;
            }
        };

        let starting_tick = self.current_tick + 1;
        self.schedule_move(piece.id, piece.player, path.seq, starting_tick);
        if let Some(rook) = path.castling_rook {
            debug!("castling with rook {}", rook.piece_id);
            self.schedule_move(rook.piece_id, piece.player, rook.seq, starting_tick);
        }

        self.last_move_time = Instant::now();
        true
    }

    fn schedule_move(&mut self, piece_id: Uuid, player: u8, seq: Vec<Waypoint>, starting_tick: u64) {
        let mv = Move {
            piece_id,
            player,
            move_seq: seq,
            starting_tick,
        };
        self.active_moves.push(mv.clone());
        self.move_log.push(mv);
        if let Some(piece) = self.board.piece_by_id_mut(piece_id) {
            piece.moved = true;
        }
    }

    /// One tick of the game passing. Advances motion, resolves captures and
    /// promotions, rotates finished moves into cooldowns, expires cooldowns,
    /// then checks for game end. Returns the meaningful events of the tick.
    pub fn tick(&mut self) -> Vec<GameUpdate> {
        self.current_tick += 1;
        self.last_tick_time = Instant::now();

        let mut updates = Vec::new();

        // snap every in-flight piece to its waypoint for this tick
        let mut moving: HashMap<Uuid, Move> = HashMap::new();
        for mv in self.active_moves.clone() {
            let tick_delta = self.current_tick.saturating_sub(mv.starting_tick);
            let steps = (tick_delta / self.move_ticks) as usize;
            if steps >= mv.move_seq.len() {
                continue;
            }

            let (wp_row, wp_col) = mv.move_seq[steps];
            let piece_id = mv.piece_id;
            moving.insert(piece_id, mv);
            if let Some(piece) = self.board.piece_by_id_mut(piece_id) {
                // knight midpoints are fractional; the resting square only
                // advances on integral waypoints
                if wp_row.fract() == 0.0 && wp_col.fract() == 0.0 {
                    piece.row = wp_row as i32;
                    piece.col = wp_col as i32;
                }

                // pawns promote the moment they touch the back rank
                if piece.kind == PieceKind::Pawn
                    && ((piece.player == 1 && piece.row == 0)
                        || (piece.player == 2 && piece.row == 7))
                {
                    piece.kind = PieceKind::Queen;
                    updates.push(GameUpdate::Promotion {
                        piece: piece.clone(),
                    });
                }
            }
        }

        self.resolve_captures(&moving, &mut updates);
        self.rotate_moves_and_cooldowns(&mut updates);

        // a fallen king ends the game immediately
        for piece in &self.board.pieces {
            if piece.kind == PieceKind::King && piece.captured {
                self.finished = if piece.player == 2 { 1 } else { 2 };
                return updates;
            }
        }

        // too long without a capture, call it a draw
        if self.current_tick >= self.speed.min_draw_ticks()
            && self.current_tick - self.last_capture_tick > self.speed.draw_limit_ticks()
        {
            self.finished = Game::DRAW;
        }

        updates
    }

    /// Collision arbitration between in-flight pieces and everything else.
    /// Works on interpolated positions: a piece captures what it is about to
    /// overrun, pieces flying apart pass each other, ties go to the move
    /// that started earlier. Straight-pushing pawns cannot capture, so a
    /// collision kills them instead.
    fn resolve_captures(&mut self, moving: &HashMap<Uuid, Move>, updates: &mut Vec<GameUpdate>) {
        let moves_snapshot = self.active_moves.clone();
        'moves: for mv in &moves_snapshot {
            let attacker = match self.board.piece_by_id(mv.piece_id) {
                Some(piece) => piece.clone(),
                None => continue,
            };
            if attacker.captured {
                continue;
            }

            let tick_delta = self.current_tick.saturating_sub(mv.starting_tick);
            if (tick_delta / self.move_ticks) as usize >= mv.move_seq.len() {
                continue;
            }

            let (row, col) = self.interp_position(mv, self.current_tick as f64);
            let straight_pawn = attacker.kind == PieceKind::Pawn
                && mv.move_seq[0].1 == mv.move_seq[mv.move_seq.len() - 1].1;

            for index in 0..self.board.pieces.len() {
                let other = self.board.pieces[index].clone();
                if other.player == attacker.player || other.captured {
                    continue;
                }

                let other_move = moving.get(&other.id);
                let (other_row, other_col) = match other_move {
                    Some(om) => {
                        let pos = self.interp_position(om, self.current_tick as f64);
                        if pos.0 < 0.0 || pos.1 < 0.0 {
                            // a floating knight cannot be touched
                            continue;
                        }
                        pos
                    }
                    None => (other.row as f64, other.col as f64),
                };

                let dist = (row - other_row).hypot(col - other_col);
                if dist > COARSE_CAPTURE_DIST {
                    continue;
                }

                // knights only capture near the end of their hop
                if attacker.kind == PieceKind::Knight {
                    let progress = tick_delta as f64 / (2 * self.move_ticks) as f64;
                    if progress < KNIGHT_CAPTURE_PROGRESS {
                        continue;
                    }
                }

                let om = match other_move {
                    Some(om) => om,
                    None => {
                        // stationary target: close enough means contact
                        if dist < CAPTURE_DIST {
                            if straight_pawn {
                                self.apply_capture(other.id, attacker.id, updates);
                            } else {
                                self.apply_capture(attacker.id, other.id, updates);
                            }
                            continue 'moves;
                        }
                        continue;
                    }
                };

                // both moving: compare distances after a half-tick to tell
                // chasing apart from passing
                let (n_row, n_col) = self.interp_position(mv, self.current_tick as f64 + 0.5);
                let n_dist = (n_row - other_row).hypot(n_col - other_col);
                let (n_other_row, n_other_col) =
                    self.interp_position(om, self.current_tick as f64 + 0.5);
                let n_other_dist = (row - n_other_row).hypot(col - n_other_col);

                if dist.min(n_dist).min(n_other_dist) > CAPTURE_DIST {
                    continue;
                }

                if straight_pawn {
                    // a straight-pushing pawn loses every contest except a
                    // head-on meeting with a later straight pawn
                    let other_straight_pawn = other.kind == PieceKind::Pawn
                        && om.move_seq[0].1 == om.move_seq[om.move_seq.len() - 1].1;
                    if !other_straight_pawn || om.starting_tick < mv.starting_tick {
                        self.apply_capture(other.id, attacker.id, updates);
                        continue 'moves;
                    }
                    continue;
                }

                let captured = if n_dist < dist && n_other_dist > dist {
                    // attacker closing in, target pulling away
                    true
                } else if n_dist > dist && n_other_dist < dist {
                    // the other piece is the aggressor; its own pass decides
                    false
                } else {
                    mv.starting_tick <= om.starting_tick
                };

                if captured {
                    self.apply_capture(attacker.id, other.id, updates);
                    continue 'moves;
                }
            }
        }
    }

    fn apply_capture(&mut self, capturer: Uuid, target: Uuid, updates: &mut Vec<GameUpdate>) {
        self.last_capture_tick = self.current_tick;
        if let Some(piece) = self.board.piece_by_id_mut(target) {
            piece.captured = true;
        }
        let capturer = self.board.piece_by_id(capturer).cloned();
        let target = self.board.piece_by_id(target).cloned();
        if let (Some(piece), Some(target)) = (capturer, target) {
            debug!("{:?} captured {:?}", piece.kind, target.kind);
            updates.push(GameUpdate::Capture { piece, target });
        }
    }

    /// Retire moves whose travel time has elapsed into cooldowns, and expire
    /// cooldowns that have run their course. Captured pieces drop out of
    /// both lists silently.
    fn rotate_moves_and_cooldowns(&mut self, updates: &mut Vec<GameUpdate>) {
        let mut active_moves = Vec::new();
        let mut cooldowns = Vec::new();

        for mv in std::mem::take(&mut self.active_moves) {
            let captured = self
                .board
                .piece_by_id(mv.piece_id)
                .map_or(true, |p| p.captured);
            if captured {
                continue;
            }

            let tick_delta = self.current_tick.saturating_sub(mv.starting_tick);
            if tick_delta >= mv.total_ticks(self.move_ticks) {
                if let Some(piece) = self.board.piece_by_id(mv.piece_id) {
                    updates.push(GameUpdate::StartCooldown {
                        piece: piece.clone(),
                    });
                }
                cooldowns.push(Cooldown {
                    piece_id: mv.piece_id,
                    player: mv.player,
                    starting_tick: self.current_tick,
                });
            } else {
                active_moves.push(mv);
            }
        }

        for cd in std::mem::take(&mut self.cooldowns) {
            let captured = self
                .board
                .piece_by_id(cd.piece_id)
                .map_or(true, |p| p.captured);
            if captured {
                continue;
            }

            let tick_delta = self.current_tick.saturating_sub(cd.starting_tick);
            if tick_delta < self.cooldown_ticks {
                cooldowns.push(cd);
            } else if let Some(piece) = self.board.piece_by_id(cd.piece_id) {
                updates.push(GameUpdate::EndCooldown {
                    piece: piece.clone(),
                });
            }
        }

        self.active_moves = active_moves;
        self.cooldowns = cooldowns;
    }

    /// Interpolated position of an in-flight piece at a (possibly
    /// fractional) tick. Knights report an unreachable position until their
    /// final descent.
    fn interp_position(&self, mv: &Move, current_tick: f64) -> (f64, f64) {
        let total_ticks = mv.total_ticks(self.move_ticks) as f64;
        let tick_delta = current_tick - mv.starting_tick as f64;

        if let Some(piece) = self.board.piece_by_id(mv.piece_id) {
            if piece.kind == PieceKind::Knight
                && tick_delta < total_ticks - (self.move_ticks / 2) as f64
            {
                return (-1.0, -1.0);
            }
        }

        let mut steps = (tick_delta.max(0.0) as u64 / self.move_ticks) as usize;
        if steps >= mv.move_seq.len() {
            steps = mv.move_seq.len() - 1;
        }

        let (row1, col1) = mv.move_seq[steps];
        let (row2, col2) = if steps >= mv.move_seq.len() - 1 {
            (row1, col1)
        } else {
            mv.move_seq[steps + 1]
        };

        let weight = 1.0 - tick_delta.rem_euclid(self.move_ticks as f64) / self.move_ticks as f64;
        (
            row1 * weight + row2 * (1.0 - weight),
            col1 * weight + col2 * (1.0 - weight),
        )
    }
}
