//! Client-side core: the reconciled simulation clock, the game session that
//! holds snapshots and screens outgoing moves, and user preferences.

pub mod clock;
pub mod session;
pub mod settings;

pub use clock::{format_game_time, GameClock};
pub use session::{GamePhase, GameSession};
pub use settings::{MemoryPrefStore, PrefStore, Settings};
