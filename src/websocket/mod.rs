pub mod game_handlers;
pub mod handler;

pub use game_handlers::broadcast_to_game;
pub use handler::{ws_index, GameSocket};
