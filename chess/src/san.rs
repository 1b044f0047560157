//! Standard Algebraic Notation, generated from and matched against the
//! rules engine's legal move list so legality stays in one place.

use cozy_chess::{Board, GameStatus, Move, Piece, Square};

use crate::uci::{file_char, format_square, format_uci_move, rank_char};

/// Format a move as SAN. `mv` must be legal in `board`.
///
/// Covers piece letters, minimal disambiguation, captures (including en
/// passant), castling, promotion, and `+`/`#` suffixes.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        // Defensive fallback; callers only pass legal moves.
        return format_uci_move(mv);
    };
    let mover = board.side_to_move();

    // The rules engine encodes castling as the king capturing its own rook.
    let mut san = if piece == Piece::King && board.color_on(mv.to) == Some(mover) {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let is_capture = matches!(board.color_on(mv.to), Some(c) if c != mover)
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        let mut s = String::new();
        match piece {
            Piece::Pawn => {
                if is_capture {
                    s.push(file_char(mv.from.file()));
                }
            }
            _ => {
                s.push(piece_char(piece));
                s.push_str(&disambiguation(board, mv, piece));
            }
        }
        if is_capture {
            s.push('x');
        }
        s.push_str(&format_square(mv.to));
        if let Some(promo) = mv.promotion {
            s.push('=');
            s.push(piece_char(promo));
        }
        s
    };

    let mut next = board.clone();
    next.play_unchecked(mv);
    if next.status() == GameStatus::Won {
        san.push('#');
    } else if !next.checkers().is_empty() {
        san.push('+');
    }

    san
}

/// Parse a SAN string against the current position.
///
/// Matching is done by formatting every legal move and comparing after
/// normalization, so anything this crate can print it can also read.
/// Decorations (`+`, `#`, `!`, `?`) are ignored; `0-0` is accepted for
/// `O-O`.
pub fn parse_san(board: &Board, input: &str) -> Result<Move, SanError> {
    let wanted = normalize(input);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(input.to_string()));
    }

    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });

    let mut found = None;
    for mv in moves {
        if normalize(&format_san(board, mv)) == wanted {
            if found.is_some() {
                return Err(SanError::Ambiguous(input.to_string()));
            }
            found = Some(mv);
        }
    }

    found.ok_or_else(|| SanError::NoLegalMove(input.to_string()))
}

fn normalize(s: &str) -> String {
    s.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace("0-0-0", "O-O-O")
        .replace("0-0", "O-O")
}

/// Minimal SAN disambiguation: file if unique, else rank, else both.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals: Vec<Square> = Vec::new();
    board.generate_moves(|mvs| {
        for m in mvs {
            if m.to == mv.to
                && m.from != mv.from
                && board.piece_on(m.from) == Some(piece)
                && !rivals.contains(&m.from)
            {
                rivals.push(m.from);
            }
        }
        false
    });

    if rivals.is_empty() {
        return String::new();
    }
    let file_clash = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let rank_clash = rivals.iter().any(|sq| sq.rank() == mv.from.rank());
    match (file_clash, rank_clash) {
        (false, _) => file_char(mv.from.file()).to_string(),
        (true, false) => rank_char(mv.from.rank()).to_string(),
        (true, true) => format_square(mv.from),
    }
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("no legal move matches: {0}")]
    NoLegalMove(String),
    #[error("ambiguous move: {0}")]
    Ambiguous(String),
    #[error("invalid notation: {0}")]
    InvalidFormat(String),
}
