//! Move legality for continuous-time chess. Everything here is a pure
//! function over a game snapshot and a simulated tick, safe to call
//! speculatively: the client consults `is_legal_move` before sending a move
//! request, the server engine asks `move_path` for the full waypoint
//! sequence when accepting one. Illegal and malformed queries both simply
//! come back negative.

use uuid::Uuid;

use crate::models::board::{Piece, PieceKind};
use crate::models::game::{Game, Waypoint};

/// Forward row direction per player: player 1 advances toward row 0,
/// player 2 toward row 7.
pub fn player_direction(player: u8) -> i32 {
    match player {
        1 => -1,
        2 => 1,
        _ => 0,
    }
}

pub fn piece_by_id(game: &Game, piece_id: Uuid) -> Option<&Piece> {
    game.board.piece_by_id(piece_id)
}

pub fn piece_by_location(game: &Game, row: i32, col: i32) -> Option<&Piece> {
    game.board.piece_by_location(row, col)
}

/// Whether the piece is referenced by an active move.
pub fn is_moving(game: &Game, piece: &Piece) -> bool {
    game.active_moves.iter().any(|m| m.piece_id == piece.id)
}

/// Whether the piece is in its post-move cooldown.
pub fn is_cooldown(game: &Game, piece: &Piece) -> bool {
    game.cooldowns.iter().any(|c| c.piece_id == piece.id)
}

/// A validated move: the waypoint path from origin to destination inclusive,
/// plus the rook's companion path when the move is a castle.
#[derive(Debug, Clone)]
pub struct MovePath {
    pub seq: Vec<Waypoint>,
    pub castling_rook: Option<CastlingRook>,
}

#[derive(Debug, Clone)]
pub struct CastlingRook {
    pub piece_id: Uuid,
    pub seq: Vec<Waypoint>,
}

impl MovePath {
    fn plain(piece: &Piece, steps: Vec<Waypoint>) -> MovePath {
        MovePath {
            seq: with_origin(piece, steps),
            castling_rook: None,
        }
    }
}

fn with_origin(piece: &Piece, mut steps: Vec<Waypoint>) -> Vec<Waypoint> {
    steps.insert(0, (piece.row as f64, piece.col as f64));
    steps
}

/// Whether the piece may move to the target square right now. Out-of-board
/// targets and no-op moves are just illegal; the function is total.
pub fn is_legal_move(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> bool {
    move_path(game, current_tick, piece, to_row, to_col).is_some()
}

/// Compute the waypoint path for a candidate move, or `None` if the move is
/// illegal. Dispatches on the piece kind; the match is exhaustive, so a new
/// kind cannot silently fall through.
pub fn move_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    if !(0..8).contains(&to_row) || !(0..8).contains(&to_col) {
        return None;
    }
    if piece.row == to_row && piece.col == to_col {
        return None;
    }

    match piece.kind {
        PieceKind::Pawn => pawn_path(game, current_tick, piece, to_row, to_col),
        PieceKind::Knight => knight_path(game, current_tick, piece, to_row, to_col),
        PieceKind::Bishop => bishop_path(game, current_tick, piece, to_row, to_col),
        PieceKind::Rook => rook_path(game, current_tick, piece, to_row, to_col),
        PieceKind::Queen => queen_path(game, current_tick, piece, to_row, to_col),
        PieceKind::King => king_path(game, current_tick, piece, to_row, to_col),
    }
}

/// The no-cross rule: walk the straight line from the piece toward its
/// destination and fail if any square along it is unavailable.
///
/// A square is unavailable when a stationary piece occupies it, unless it is
/// the final square, holds an enemy, and this move may capture. It is also
/// unavailable when it is the end square of a friendly in-flight move, since
/// two friendly pieces may not land on top of each other. Finally the
/// destination must not lie on the not-yet-traveled tail of any friendly
/// in-flight path; two friendly moves issued near-simultaneously could
/// otherwise be routed into the same square.
fn path_no_cross(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    row_dir: i32,
    col_dir: i32,
    steps: i32,
    capture: bool,
) -> Option<Vec<Waypoint>> {
    let mut path = Vec::with_capacity(steps as usize);
    for i in 1..=steps {
        let i_row = piece.row + row_dir * i;
        let i_col = piece.col + col_dir * i;
        path.push((i_row as f64, i_col as f64));

        // stationary pieces block, except a capturable enemy on the final square
        if let Some(other) = piece_by_location(game, i_row, i_col) {
            if !is_moving(game, other) && (!capture || i != steps || other.player == piece.player) {
                return None;
            }
        }

        // squares a friendly in-flight move will land on are taken
        for mv in &game.active_moves {
            if mv.player != piece.player {
                continue;
            }
            if let Some(end) = mv.move_seq.last() {
                if *end == (i_row as f64, i_col as f64) {
                    return None;
                }
            }
        }
    }

    // the destination cannot be on the future path of any friendly move
    let dest = (
        (piece.row + row_dir * steps) as f64,
        (piece.col + col_dir * steps) as f64,
    );
    for mv in &game.active_moves {
        if mv.player != piece.player {
            continue;
        }
        let tick_delta = current_tick - mv.starting_tick as f64;
        let traveled = ((tick_delta + game.move_ticks as f64 - 1.0) / game.move_ticks as f64)
            .floor()
            .max(0.0) as usize;
        if mv.move_seq.iter().skip(traveled).any(|wp| *wp == dest) {
            return None;
        }
    }

    Some(path)
}

fn pawn_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    // pawns advance one row toward the enemy, or two from their home row
    let dir = player_direction(piece.player);
    let steps = (to_row - piece.row).abs();
    let mut can_capture = true;
    if to_row - piece.row != dir {
        if piece.player == 1 && piece.row == 6 && to_row == 4 {
            can_capture = false;
        } else if piece.player == 2 && piece.row == 1 && to_row == 3 {
            can_capture = false;
        } else {
            return None;
        }
    }

    // staying in the column means moving into empty squares only
    if piece.col == to_col {
        if let Some(path) = path_no_cross(game, current_tick, piece, dir, 0, steps, false) {
            return Some(MovePath::plain(piece, path));
        }
    }

    // a one-column sidestep must capture a stationary enemy
    if can_capture && (to_col - piece.col).abs() == 1 {
        if let Some(target) = piece_by_location(game, to_row, to_col) {
            if target.player != piece.player && !is_moving(game, target) {
                if let Some(path) =
                    path_no_cross(game, current_tick, piece, dir, to_col - piece.col, 1, true)
                {
                    return Some(MovePath::plain(piece, path));
                }
            }
        }
    }

    None
}

fn knight_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    let row_delta = (to_row - piece.row).abs();
    let col_delta = (to_col - piece.col).abs();
    if !((row_delta == 1 && col_delta == 2) || (row_delta == 2 && col_delta == 1)) {
        return None;
    }

    // only the landing square matters; the hop clears everything between
    path_no_cross(
        game,
        current_tick,
        piece,
        to_row - piece.row,
        to_col - piece.col,
        1,
        true,
    )?;

    // the knight floats over the fractional midpoint of its L
    let mid = (
        (to_row + piece.row) as f64 / 2.0,
        (to_col + piece.col) as f64 / 2.0,
    );
    Some(MovePath {
        seq: vec![
            (piece.row as f64, piece.col as f64),
            mid,
            (to_row as f64, to_col as f64),
        ],
        castling_rook: None,
    })
}

fn bishop_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    let row_delta = (to_row - piece.row).abs();
    let col_delta = (to_col - piece.col).abs();
    if row_delta != col_delta || row_delta == 0 {
        return None;
    }

    let row_dir = (to_row - piece.row) / row_delta;
    let col_dir = (to_col - piece.col) / col_delta;
    let path = path_no_cross(game, current_tick, piece, row_dir, col_dir, row_delta, true)?;
    Some(MovePath::plain(piece, path))
}

fn rook_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    let row_delta = (to_row - piece.row).abs();
    let col_delta = (to_col - piece.col).abs();
    if (row_delta > 0 && col_delta > 0) || row_delta + col_delta == 0 {
        return None;
    }

    let row_dir = if row_delta > 0 {
        (to_row - piece.row) / row_delta
    } else {
        0
    };
    let col_dir = if col_delta > 0 {
        (to_col - piece.col) / col_delta
    } else {
        0
    };
    let steps = row_delta.max(col_delta);
    let path = path_no_cross(game, current_tick, piece, row_dir, col_dir, steps, true)?;
    Some(MovePath::plain(piece, path))
}

fn queen_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    bishop_path(game, current_tick, piece, to_row, to_col)
        .or_else(|| rook_path(game, current_tick, piece, to_row, to_col))
}

fn king_path(
    game: &Game,
    current_tick: f64,
    piece: &Piece,
    to_row: i32,
    to_col: i32,
) -> Option<MovePath> {
    let row_delta = (to_row - piece.row).abs();
    let col_delta = (to_col - piece.col).abs();
    if row_delta > 1 || col_delta > 1 {
        // a two-column king move on its own row can only be a castle
        if !piece.moved && row_delta == 0 && (to_col == 2 || to_col == 6) {
            let rook_col = if to_col == 2 { 0 } else { 7 };
            let rook_to_col = if to_col == 2 { 3 } else { 5 };
            if let Some(rook) = piece_by_location(game, piece.row, rook_col) {
                if !rook.moved {
                    let rook = rook.clone();
                    let king_steps =
                        rook_path(game, current_tick, piece, to_row, to_col)?;
                    let rook_steps =
                        rook_path(game, current_tick, &rook, piece.row, rook_to_col)?;
                    return Some(MovePath {
                        seq: king_steps.seq,
                        castling_rook: Some(CastlingRook {
                            piece_id: rook.id,
                            seq: rook_steps.seq,
                        }),
                    });
                }
            }
        }

        return None;
    }

    queen_path(game, current_tick, piece, to_row, to_col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::{Move, Speed};

    fn empty_game() -> Game {
        let mut game = Game::new(Speed::Standard, [(1, "o".to_string()), (2, "o".to_string())].into());
        game.board.pieces.clear();
        game
    }

    fn put(game: &mut Game, kind: PieceKind, player: u8, row: i32, col: i32) -> Uuid {
        let piece = Piece::new(kind, player, row, col);
        let id = piece.id;
        game.board.pieces.push(piece);
        id
    }

    fn piece(game: &Game, id: Uuid) -> Piece {
        game.board.piece_by_id(id).unwrap().clone()
    }

    fn start_move(game: &mut Game, id: Uuid, seq: Vec<Waypoint>, starting_tick: u64) {
        let player = game.board.piece_by_id(id).unwrap().player;
        game.active_moves.push(Move {
            piece_id: id,
            player,
            move_seq: seq,
            starting_tick,
        });
    }

    #[test]
    fn out_of_bounds_and_noop_are_illegal() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Queen, 1, 4, 4);
        let q = piece(&game, id);
        assert!(!is_legal_move(&game, 0.0, &q, 8, 4));
        assert!(!is_legal_move(&game, 0.0, &q, -1, 4));
        assert!(!is_legal_move(&game, 0.0, &q, 4, 8));
        assert!(!is_legal_move(&game, 0.0, &q, 4, 4));
    }

    #[test]
    fn pawn_single_and_double_step() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Pawn, 1, 6, 4);
        let p = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &p, 5, 4));
        assert!(is_legal_move(&game, 0.0, &p, 4, 4));
        assert!(!is_legal_move(&game, 0.0, &p, 3, 4));
        assert!(!is_legal_move(&game, 0.0, &p, 7, 4));

        // off the home row the double step disappears
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Pawn, 1, 5, 4);
        let p = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &p, 4, 4));
        assert!(!is_legal_move(&game, 0.0, &p, 3, 4));
    }

    #[test]
    fn pawn_double_step_needs_clear_path() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Pawn, 1, 6, 4);
        put(&mut game, PieceKind::Knight, 2, 5, 4);
        let p = piece(&game, id);
        assert!(!is_legal_move(&game, 0.0, &p, 5, 4));
        assert!(!is_legal_move(&game, 0.0, &p, 4, 4));

        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Pawn, 1, 6, 4);
        put(&mut game, PieceKind::Knight, 2, 4, 4);
        let p = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &p, 5, 4));
        assert!(!is_legal_move(&game, 0.0, &p, 4, 4));
    }

    #[test]
    fn pawn_diagonal_is_capture_only() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Pawn, 1, 6, 4);
        let p = piece(&game, id);
        assert!(!is_legal_move(&game, 0.0, &p, 5, 3));
        assert!(!is_legal_move(&game, 0.0, &p, 5, 5));

        let enemy = put(&mut game, PieceKind::Pawn, 2, 5, 3);
        let p = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &p, 5, 3));

        // a mid-flight enemy cannot be targeted
        start_move(&mut game, enemy, vec![(5.0, 3.0), (6.0, 3.0)], 0);
        assert!(!is_legal_move(&game, 0.0, &p, 5, 3));
    }

    #[test]
    fn pawn_player_two_advances_down() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Pawn, 2, 1, 4);
        let p = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &p, 2, 4));
        assert!(is_legal_move(&game, 0.0, &p, 3, 4));
        assert!(!is_legal_move(&game, 0.0, &p, 0, 4));
    }

    #[test]
    fn knight_moves_exactly_l_shaped() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Knight, 1, 4, 4);
        let n = piece(&game, id);

        let mut legal = Vec::new();
        for row in 0..8 {
            for col in 0..8 {
                if is_legal_move(&game, 0.0, &n, row, col) {
                    legal.push((row, col));
                }
            }
        }
        legal.sort();
        assert_eq!(
            legal,
            vec![
                (2, 3),
                (2, 5),
                (3, 2),
                (3, 6),
                (5, 2),
                (5, 6),
                (6, 3),
                (6, 5)
            ]
        );
        assert!(!is_legal_move(&game, 0.0, &n, 5, 5));
    }

    #[test]
    fn knight_path_floats_over_midpoint() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Knight, 1, 4, 4);
        let n = piece(&game, id);
        let path = move_path(&game, 0.0, &n, 6, 5).unwrap();
        assert_eq!(path.seq, vec![(4.0, 4.0), (5.0, 4.5), (6.0, 5.0)]);
    }

    #[test]
    fn rook_blocked_by_stationary_friend() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Rook, 1, 0, 0);
        put(&mut game, PieceKind::Bishop, 1, 0, 3);
        let r = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &r, 0, 1));
        assert!(is_legal_move(&game, 0.0, &r, 0, 2));
        assert!(!is_legal_move(&game, 0.0, &r, 0, 3));
        assert!(!is_legal_move(&game, 0.0, &r, 0, 7));
    }

    #[test]
    fn rook_captures_enemy_on_final_square_only() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Rook, 1, 0, 0);
        put(&mut game, PieceKind::Bishop, 2, 0, 3);
        let r = piece(&game, id);
        assert!(is_legal_move(&game, 0.0, &r, 0, 3));
        assert!(!is_legal_move(&game, 0.0, &r, 0, 5));
    }

    #[test]
    fn bishop_and_queen_geometry() {
        let mut game = empty_game();
        let b_id = put(&mut game, PieceKind::Bishop, 1, 4, 4);
        let q_id = put(&mut game, PieceKind::Queen, 1, 0, 0);
        let b = piece(&game, b_id);
        let q = piece(&game, q_id);
        assert!(is_legal_move(&game, 0.0, &b, 1, 1));
        assert!(!is_legal_move(&game, 0.0, &b, 4, 6));
        assert!(is_legal_move(&game, 0.0, &q, 0, 5));
        assert!(is_legal_move(&game, 0.0, &q, 3, 3));
        assert!(!is_legal_move(&game, 0.0, &q, 2, 1));
    }

    #[test]
    fn friendly_in_flight_destination_blocks() {
        let mut game = empty_game();
        let rook = put(&mut game, PieceKind::Rook, 1, 0, 0);
        let other = put(&mut game, PieceKind::Queen, 1, 5, 2);
        // friendly queen flying toward (0, 2)
        start_move(
            &mut game,
            other,
            vec![(5.0, 2.0), (4.0, 2.0), (3.0, 2.0), (2.0, 2.0), (1.0, 2.0), (0.0, 2.0)],
            1,
        );
        let r = piece(&game, rook);
        assert!(!is_legal_move(&game, 1.0, &r, 0, 2));
        assert!(!is_legal_move(&game, 1.0, &r, 0, 4));
        assert!(is_legal_move(&game, 1.0, &r, 0, 1));
    }

    #[test]
    fn destination_on_friendly_future_path_blocks() {
        let mut game = empty_game();
        let rook = put(&mut game, PieceKind::Rook, 1, 0, 1);
        let other = put(&mut game, PieceKind::Rook, 1, 3, 0);
        // friendly rook sliding (3,0) -> (3,7), started at tick 0
        start_move(
            &mut game,
            other,
            (0..=7).map(|c| (3.0, c as f64)).collect(),
            0,
        );

        let r = piece(&game, rook);
        // at tick 5 the slider has yet to pass (3,1)
        assert!(!is_legal_move(&game, 5.0, &r, 3, 1));
        // by tick 15 the square is behind it
        assert!(is_legal_move(&game, 15.0, &r, 3, 1));
    }

    #[test]
    fn enemy_future_path_does_not_block() {
        let mut game = empty_game();
        let rook = put(&mut game, PieceKind::Rook, 1, 0, 1);
        let enemy = put(&mut game, PieceKind::Rook, 2, 3, 0);
        start_move(
            &mut game,
            enemy,
            (0..=7).map(|c| (3.0, c as f64)).collect(),
            0,
        );
        let r = piece(&game, rook);
        assert!(is_legal_move(&game, 5.0, &r, 3, 1));
    }

    #[test]
    fn castling_kingside_and_queenside() {
        let mut game = empty_game();
        let king = put(&mut game, PieceKind::King, 1, 7, 4);
        put(&mut game, PieceKind::Rook, 1, 7, 7);
        put(&mut game, PieceKind::Rook, 1, 7, 0);
        let k = piece(&game, king);

        let path = move_path(&game, 0.0, &k, 7, 6).unwrap();
        let rook = path.castling_rook.unwrap();
        assert_eq!(path.seq, vec![(7.0, 4.0), (7.0, 5.0), (7.0, 6.0)]);
        assert_eq!(rook.seq, vec![(7.0, 7.0), (7.0, 6.0), (7.0, 5.0)]);

        let path = move_path(&game, 0.0, &k, 7, 2).unwrap();
        let rook = path.castling_rook.unwrap();
        assert_eq!(rook.seq, vec![(7.0, 0.0), (7.0, 1.0), (7.0, 2.0), (7.0, 3.0)]);
    }

    #[test]
    fn castling_denied_after_rook_moved_or_blocked() {
        let mut game = empty_game();
        let king = put(&mut game, PieceKind::King, 1, 7, 4);
        let rook = put(&mut game, PieceKind::Rook, 1, 7, 7);
        let k = piece(&game, king);
        assert!(is_legal_move(&game, 0.0, &k, 7, 6));

        game.board.piece_by_id_mut(rook).unwrap().moved = true;
        assert!(!is_legal_move(&game, 0.0, &k, 7, 6));

        game.board.piece_by_id_mut(rook).unwrap().moved = false;
        put(&mut game, PieceKind::Bishop, 1, 7, 5);
        assert!(!is_legal_move(&game, 0.0, &k, 7, 6));
    }

    #[test]
    fn castling_denied_after_king_moved() {
        let mut game = empty_game();
        let king = put(&mut game, PieceKind::King, 1, 7, 4);
        put(&mut game, PieceKind::Rook, 1, 7, 7);
        game.board.piece_by_id_mut(king).unwrap().moved = true;
        let k = piece(&game, king);
        assert!(!is_legal_move(&game, 0.0, &k, 7, 6));
        // ordinary one-square moves still work
        assert!(is_legal_move(&game, 0.0, &k, 7, 5));
    }

    #[test]
    fn moving_and_cooldown_predicates() {
        let mut game = empty_game();
        let id = put(&mut game, PieceKind::Rook, 1, 0, 0);
        let r = piece(&game, id);
        assert!(!is_moving(&game, &r));
        assert!(!is_cooldown(&game, &r));

        start_move(&mut game, id, vec![(0.0, 0.0), (0.0, 1.0)], 1);
        assert!(is_moving(&game, &r));

        game.active_moves.clear();
        game.cooldowns.push(crate::models::game::Cooldown {
            piece_id: id,
            player: 1,
            starting_tick: 1,
        });
        assert!(is_cooldown(&game, &r));
    }
}
