use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Piece kinds, serialized as the single-letter codes used on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    #[serde(rename = "P")]
    Pawn,
    #[serde(rename = "N")]
    Knight,
    #[serde(rename = "B")]
    Bishop,
    #[serde(rename = "R")]
    Rook,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
}

impl PieceKind {
    pub fn from_code(code: char) -> Option<PieceKind> {
        match code {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// A single piece. `row`/`col` hold the resting square; while the piece is
/// referenced by an active move its true position is interpolated from the
/// move's waypoint sequence instead.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Piece {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub player: u8,
    pub row: i32,
    pub col: i32,
    pub captured: bool,
    pub moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, player: u8, row: i32, col: i32) -> Piece {
        Piece {
            id: Uuid::new_v4(),
            kind,
            player,
            row,
            col,
            captured: false,
            moved: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Board {
    pub pieces: Vec<Piece>,
}

/// Starting layout, two characters per square: piece code + player number,
/// `00` for an empty square. Player 1 sits on the high rows and moves toward
/// row 0.
const INITIAL_LAYOUT: &str = "\
R2N2B2Q2K2B2N2R2
P2P2P2P2P2P2P2P2
0000000000000000
0000000000000000
0000000000000000
0000000000000000
P1P1P1P1P1P1P1P1
R1N1B1Q1K1B1N1R1";

impl Board {
    pub fn initial() -> Board {
        Board::from_layout(INITIAL_LAYOUT)
    }

    /// Parse a packed layout string; cells that are not a valid piece code
    /// followed by a player digit are treated as empty.
    pub fn from_layout(layout: &str) -> Board {
        let mut pieces = Vec::new();
        for (row, line) in layout.lines().enumerate().take(8) {
            let chars: Vec<char> = line.chars().collect();
            for col in 0..8 {
                if chars.len() < 2 * col + 2 {
                    break;
                }
                let kind = match PieceKind::from_code(chars[2 * col]) {
                    Some(kind) => kind,
                    None => continue,
                };
                let player = match chars[2 * col + 1].to_digit(10) {
                    Some(p @ 1..=2) => p as u8,
                    _ => continue,
                };
                pieces.push(Piece::new(kind, player, row as i32, col as i32));
            }
        }
        Board { pieces }
    }

    pub fn piece_by_id(&self, id: Uuid) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn piece_by_id_mut(&mut self, id: Uuid) -> Option<&mut Piece> {
        self.pieces.iter_mut().find(|p| p.id == id)
    }

    /// Find the piece resting on a square; captured pieces are ignored.
    pub fn piece_by_location(&self, row: i32, col: i32) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|p| !p.captured && p.row == row && p.col == col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_board_has_full_armies() {
        let board = Board::initial();
        assert_eq!(board.pieces.len(), 32);
        assert_eq!(board.pieces.iter().filter(|p| p.player == 1).count(), 16);
        assert_eq!(board.pieces.iter().filter(|p| p.player == 2).count(), 16);

        let king1 = board.piece_by_location(7, 4).unwrap();
        assert_eq!(king1.kind, PieceKind::King);
        assert_eq!(king1.player, 1);

        let pawn2 = board.piece_by_location(1, 3).unwrap();
        assert_eq!(pawn2.kind, PieceKind::Pawn);
        assert_eq!(pawn2.player, 2);
    }

    #[test]
    fn location_lookup_skips_captured_pieces() {
        let mut board = Board::initial();
        let id = board.piece_by_location(6, 0).unwrap().id;
        board.piece_by_id_mut(id).unwrap().captured = true;
        assert!(board.piece_by_location(6, 0).is_none());
        // captured pieces remain addressable by id
        assert!(board.piece_by_id(id).is_some());
    }

    #[test]
    fn kind_codes_round_trip() {
        assert_eq!(PieceKind::from_code('Q'), Some(PieceKind::Queen));
        assert_eq!(PieceKind::from_code('0'), None);
        let json = serde_json::to_string(&PieceKind::Knight).unwrap();
        assert_eq!(json, "\"N\"");
    }
}
