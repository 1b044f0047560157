//! FEN serialization, delegated to the rules engine.

use cozy_chess::Board;

/// Parse a FEN string into a board.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    fen.parse()
        .map_err(|_| FenError::InvalidFen(fen.to_string()))
}

/// Format a board as its canonical FEN string.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}
