//! Coordinate (UCI-style) move notation helpers.

use cozy_chess::{File, Move, Piece, Rank, Square};

pub fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

pub fn rank_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

/// Format a square as its coordinate name (`e4`).
pub fn format_square(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

/// Parse a coordinate square name like `e2`.
pub fn parse_square(s: &str) -> Option<Square> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = match bytes[0] {
        b'a'..=b'h' => File::index((bytes[0] - b'a') as usize),
        _ => return None,
    };
    let rank = match bytes[1] {
        b'1'..=b'8' => Rank::index((bytes[1] - b'1') as usize),
        _ => return None,
    };
    Some(Square::new(file, rank))
}

/// Format a move in coordinate notation (`e2e4`, `e7e8q`).
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(promotion_char(promo));
    }
    s
}

/// Parse a coordinate move (`e2e4`, `e7e8q`).
pub fn parse_uci_move(s: &str) -> Result<Move, UciError> {
    if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
        return Err(UciError::InvalidFormat(s.to_string()));
    }
    let from = parse_square(&s[0..2]).ok_or_else(|| UciError::InvalidSquare(s[0..2].to_string()))?;
    let to = parse_square(&s[2..4]).ok_or_else(|| UciError::InvalidSquare(s[2..4].to_string()))?;
    let promotion = match s.as_bytes().get(4) {
        None => None,
        Some(&c) => Some(promotion_piece(c as char).ok_or(UciError::InvalidPromotion(c as char))?),
    };
    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Convert UCI castling notation to the rules engine's convention.
///
/// UCI moves the king two squares (`e1g1`); cozy-chess encodes castling
/// as king-takes-rook (`e1h1`). Returns the move unchanged when it is not
/// a castling move or the converted form is not legal.
pub fn convert_uci_castling(mv: Move, legal_moves: &[Move]) -> Move {
    let on_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let from_e_file = mv.from.file() == File::E;
    let to_castle_file = matches!(mv.to.file(), File::G | File::C);

    if on_back_rank && from_e_file && to_castle_file && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.to.rank()),
            promotion: None,
        };
        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Format a played move in standard coordinate notation for the wire.
///
/// The inverse of [`convert_uci_castling`]: a castling move (king
/// displaced two or more files) goes out as the two-square king move.
pub fn format_standard_uci(mv: Move, piece: Piece) -> String {
    if piece == Piece::King {
        let from_file = mv.from.file() as i8;
        let to_file = mv.to.file() as i8;
        if (from_file - to_file).abs() >= 2 {
            let file = if to_file > from_file { File::G } else { File::C };
            let to = Square::new(file, mv.to.rank());
            return format!("{}{}", format_square(mv.from), format_square(to));
        }
    }
    format_uci_move(mv)
}

fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

fn promotion_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("invalid coordinate move: {0}")]
    InvalidFormat(String),
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(char),
}
