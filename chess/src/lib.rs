pub mod board_display;
pub mod fen;
pub mod game;
pub mod san;
pub mod score;
pub mod types;
pub mod uci;

pub use board_display::{DisplayBoard, DisplayBoardError};
pub use game::{Game, GameError, HistoryEntry};
pub use san::{format_san, parse_san, SanError};
pub use score::EvalScore;
pub use types::{PieceColor, PieceKind};
pub use uci::{
    convert_uci_castling, format_square, format_standard_uci, format_uci_move, parse_square,
    parse_uci_move, UciError,
};
