pub mod ai;
pub mod config;
pub mod draw;
pub mod error;
pub mod evaluation;
pub mod opening_book;
pub mod oracle;
pub mod search;

pub use ai::{spawn_select_move, ChessAI, MoveTask};
pub use config::{Difficulty, DifficultyProfile, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use evaluation::{evaluate_position, evaluate_position as evaluate, MATE_UPPER};
pub use opening_book::OpeningBook;
pub use oracle::RulesOracle;
pub use search::{search, search_root, RootResult, SearchStats, SCORE_BOUND};
