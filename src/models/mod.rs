pub mod app_state;
pub mod board;
pub mod game;
pub mod game_state;
pub mod messages;

// Re-export important types
pub use app_state::AppState;
pub use board::{Board, Piece, PieceKind};
pub use game::{Cooldown, Game, GameUpdate, Move, Speed, Waypoint};
pub use game_state::GameState;
pub use messages::{ClientMessage, ServerMessage, SocketText};
