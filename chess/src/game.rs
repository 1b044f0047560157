use cozy_chess::{Board, Color, GameStatus, Move, Piece, Square};

use crate::san::{self, SanError};
use crate::uci;

/// Live game state: the authoritative position plus the derived UI state
/// (selection, legal-target cache, last-move marker).
///
/// The board is owned exclusively by this struct. Analysis and replay
/// always work on their own boards parsed from FEN, never on this one.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    selected: Option<Square>,
    selected_targets: Vec<Square>,
    last_move: Option<(Square, Square)>,
}

/// Immutable record of one applied move.
///
/// Entries are produced only by applying a legal move to the live
/// position; they are never constructed by hand.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub mv: Move,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub piece_color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub san: String,
    pub fen_after: String,
    pub gives_check: bool,
}

impl Game {
    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            selected: None,
            selected_targets: Vec::new(),
            last_move: None,
        }
    }

    /// The current board position (read-only).
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// The current position in FEN.
    pub fn fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Legal destination squares for the currently selected square.
    pub fn selected_targets(&self) -> &[Square] {
        &self.selected_targets
    }

    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// Attempt a move by coordinates. An illegal pair leaves the position
    /// untouched and returns `Err(GameError::IllegalMove)`; this is an
    /// expected outcome, not an exceptional one.
    ///
    /// A promotion-requiring move with no promotion hint promotes to a
    /// queen. UCI-convention castling (king moves two squares) is
    /// normalized to the rules engine's king-takes-rook form.
    pub fn try_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<HistoryEntry, GameError> {
        let legal = self.legal_moves();
        let mv = resolve_move(&legal, from, to, promotion).ok_or(GameError::IllegalMove)?;
        self.apply(mv)
    }

    /// Attempt a move given in algebraic notation. Same contract as
    /// [`Game::try_move`]; used for scripted and auto-played moves.
    pub fn try_move_san(&mut self, notation: &str) -> Result<HistoryEntry, GameError> {
        let mv = san::parse_san(&self.position, notation)?;
        self.apply(mv)
    }

    /// Revert the most recent move. Empty history is a no-op.
    pub fn undo_last(&mut self) {
        if self.history.pop().is_none() {
            return;
        }
        self.rebuild_position();
        self.last_move = self.history.last().map(|e| (e.from, e.to));
        self.clear_selection();
    }

    /// Restore the standard starting position and clear all derived state.
    pub fn reset(&mut self) {
        self.position = Board::default();
        self.history.clear();
        self.last_move = None;
        self.clear_selection();
    }

    /// Record a selection if the square holds a piece of the side to move,
    /// caching its legal destinations. Any other square is a no-op.
    pub fn select_square(&mut self, sq: Square) {
        if self.position.color_on(sq) != Some(self.position.side_to_move()) {
            return;
        }
        let mut targets = Vec::new();
        for mv in self.legal_moves() {
            if mv.from == sq && !targets.contains(&mv.to) {
                targets.push(mv.to);
            }
        }
        self.selected = Some(sq);
        self.selected_targets = targets;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.selected_targets.clear();
    }

    /// The move history in standard coordinate notation (`e2e4`, `e7e8q`,
    /// castling as the two-square king move). This is the key format the
    /// external move database indexes by; promotions are lossless.
    pub fn history_as_uci(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|e| uci::format_standard_uci(e.mv, e.piece))
            .collect()
    }

    fn apply(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        let piece = self
            .position
            .piece_on(mv.from)
            .ok_or(GameError::IllegalMove)?;
        let piece_color = self
            .position
            .color_on(mv.from)
            .ok_or(GameError::IllegalMove)?;

        // A friendly rook on the destination is castling, not a capture.
        let captured = match self.position.piece_on(mv.to) {
            Some(p) if self.position.color_on(mv.to) != Some(piece_color) => Some(p),
            Some(_) => None,
            // Pawn moving diagonally to an empty square: en passant.
            None if piece == Piece::Pawn && mv.from.file() != mv.to.file() => Some(Piece::Pawn),
            None => None,
        };

        // SAN must be generated against the position before the move.
        let san = san::format_san(&self.position, mv);

        let mut next = self.position.clone();
        next.play_unchecked(mv);
        let gives_check = !next.checkers().is_empty();
        let fen_after = crate::fen::format_fen(&next);
        self.position = next;

        let entry = HistoryEntry {
            mv,
            from: mv.from,
            to: mv.to,
            piece,
            piece_color,
            captured,
            promotion: mv.promotion,
            san,
            fen_after,
            gives_check,
        };

        self.history.push(entry.clone());
        self.last_move = Some((mv.from, mv.to));
        self.clear_selection();

        Ok(entry)
    }

    /// Rebuild the position by replaying the remaining history from the
    /// starting position. Every stored move was legal when applied.
    fn rebuild_position(&mut self) {
        let mut board = Board::default();
        for entry in &self.history {
            board.play_unchecked(entry.mv);
        }
        self.position = board;
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a coordinate request against the legal move list.
fn resolve_move(
    legal: &[Move],
    from: Square,
    to: Square,
    promotion: Option<Piece>,
) -> Option<Move> {
    let requested = Move { from, to, promotion };
    if legal.contains(&requested) {
        return Some(requested);
    }

    let converted = uci::convert_uci_castling(requested, legal);
    if converted != requested && legal.contains(&converted) {
        return Some(converted);
    }

    if promotion.is_none() {
        let queen = Move {
            from,
            to,
            promotion: Some(Piece::Queen),
        };
        if legal.contains(&queen) {
            return Some(queen);
        }
    }

    None
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("illegal move")]
    IllegalMove,
    #[error(transparent)]
    San(#[from] SanError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::{File, Rank};
    use rand::seq::SliceRandom;

    fn sq(file: File, rank: Rank) -> Square {
        Square::new(file, rank)
    }

    #[test]
    fn opening_move_records_history() {
        let mut game = Game::new();
        let entry = game
            .try_move(sq(File::E, Rank::Second), sq(File::E, Rank::Fourth), None)
            .unwrap();
        assert_eq!(entry.san, "e4");
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(
            game.last_move(),
            Some((sq(File::E, Rank::Second), sq(File::E, Rank::Fourth)))
        );
    }

    #[test]
    fn illegal_move_leaves_state_untouched() {
        let mut game = Game::new();
        let fen_before = game.fen();
        let result = game.try_move(sq(File::E, Rank::Second), sq(File::E, Rank::Fifth), None);
        assert!(matches!(result, Err(GameError::IllegalMove)));
        assert_eq!(game.fen(), fen_before);
        assert!(game.history().is_empty());
        assert!(game.last_move().is_none());
    }

    #[test]
    fn san_move_application() {
        let mut game = Game::new();
        game.try_move_san("d4").unwrap();
        game.try_move_san("Nf6").unwrap();
        assert_eq!(game.history()[0].san, "d4");
        assert_eq!(game.history()[1].san, "Nf6");
        assert_eq!(game.history_as_uci(), vec!["d2d4", "g8f6"]);
    }

    #[test]
    fn unknown_san_is_rejected() {
        let mut game = Game::new();
        assert!(game.try_move_san("Qh5").is_err());
        assert!(game.history().is_empty());
    }

    #[test]
    fn undo_restores_prior_fen() {
        let mut game = Game::new();
        let initial = game.fen();
        game.try_move_san("e4").unwrap();
        let after_e4 = game.fen();
        game.try_move_san("c5").unwrap();

        game.undo_last();
        assert_eq!(game.fen(), after_e4);
        game.undo_last();
        assert_eq!(game.fen(), initial);

        // No-op on empty history.
        game.undo_last();
        assert_eq!(game.fen(), initial);
    }

    #[test]
    fn reset_clears_everything() {
        let mut game = Game::new();
        game.try_move_san("e4").unwrap();
        game.select_square(sq(File::E, Rank::Seventh));
        game.reset();
        assert_eq!(game.fen(), Game::new().fen());
        assert!(game.history().is_empty());
        assert!(game.selected().is_none());
        assert!(game.last_move().is_none());
    }

    #[test]
    fn select_own_piece_caches_targets() {
        let mut game = Game::new();
        game.select_square(sq(File::E, Rank::Second));
        assert_eq!(game.selected(), Some(sq(File::E, Rank::Second)));
        let targets = game.selected_targets();
        assert!(targets.contains(&sq(File::E, Rank::Third)));
        assert!(targets.contains(&sq(File::E, Rank::Fourth)));
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn select_opponent_piece_is_noop() {
        let mut game = Game::new();
        game.select_square(sq(File::E, Rank::Second));
        game.select_square(sq(File::E, Rank::Seventh));
        // It's black's pawn but white to move: selection unchanged.
        assert_eq!(game.selected(), Some(sq(File::E, Rank::Second)));
    }

    #[test]
    fn selection_cleared_after_move() {
        let mut game = Game::new();
        game.select_square(sq(File::E, Rank::Second));
        game.try_move(sq(File::E, Rank::Second), sq(File::E, Rank::Fourth), None)
            .unwrap();
        assert!(game.selected().is_none());
        assert!(game.selected_targets().is_empty());
    }

    #[test]
    fn en_passant_capture_recorded() {
        let mut game = Game::new();
        for m in ["e4", "a6", "e5", "d5"] {
            game.try_move_san(m).unwrap();
        }
        let entry = game.try_move_san("exd6").unwrap();
        assert_eq!(entry.captured, Some(Piece::Pawn));
        assert_eq!(entry.san, "exd6");
    }

    #[test]
    fn castling_accepted_in_both_conventions() {
        let mut game = Game::new();
        for m in ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"] {
            game.try_move_san(m).unwrap();
        }
        // UCI convention: king two squares (e1g1).
        let entry = game
            .try_move(sq(File::E, Rank::First), sq(File::G, Rank::First), None)
            .unwrap();
        assert_eq!(entry.san, "O-O");
        assert_eq!(
            game.history_as_uci().last().map(String::as_str),
            Some("e1g1")
        );
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game = Game::new();
        for m in ["h4", "g5", "hxg5", "Nf6", "g6", "Nc6", "g7", "Ne5"] {
            game.try_move_san(m).unwrap();
        }
        let entry = game
            .try_move(sq(File::G, Rank::Seventh), sq(File::H, Rank::Eighth), None)
            .unwrap();
        assert_eq!(entry.promotion, Some(Piece::Queen));
        assert_eq!(
            game.history_as_uci().last().map(String::as_str),
            Some("g7h8q")
        );
    }

    #[test]
    fn explicit_underpromotion_is_lossless() {
        let mut game = Game::new();
        for m in ["h4", "g5", "hxg5", "Nf6", "g6", "Nc6", "g7", "Ne5"] {
            game.try_move_san(m).unwrap();
        }
        let entry = game
            .try_move(
                sq(File::G, Rank::Seventh),
                sq(File::H, Rank::Eighth),
                Some(Piece::Knight),
            )
            .unwrap();
        assert_eq!(entry.promotion, Some(Piece::Knight));
        assert_eq!(
            game.history_as_uci().last().map(String::as_str),
            Some("g7h8n")
        );
    }

    /// Replaying the recorded SAN history from the starting position must
    /// reproduce the live position exactly.
    fn assert_history_replays(game: &Game) {
        let mut replayed = Game::new();
        for entry in game.history() {
            replayed.try_move_san(&entry.san).unwrap();
        }
        assert_eq!(replayed.fen(), game.fen());
    }

    #[test]
    fn history_replay_reproduces_position_on_known_line() {
        let mut game = Game::new();
        for m in ["d4", "Nf6", "c4", "e6", "Nc3", "Bb4", "e3", "O-O"] {
            game.try_move_san(m).unwrap();
        }
        assert_history_replays(&game);
    }

    #[test]
    fn history_replay_reproduces_position_on_random_walks() {
        let mut rng = rand::thread_rng();
        for _ in 0..25 {
            let mut game = Game::new();
            for _ in 0..40 {
                if game.status() != GameStatus::Ongoing {
                    break;
                }
                let legal = game.legal_moves();
                let mv = *legal.choose(&mut rng).unwrap();
                game.try_move(mv.from, mv.to, mv.promotion).unwrap();
            }
            assert_history_replays(&game);
        }
    }

    #[test]
    fn checkmate_is_reported_as_terminal() {
        let mut game = Game::new();
        for m in ["f3", "e5", "g4"] {
            game.try_move_san(m).unwrap();
        }
        let entry = game.try_move_san("Qh4").unwrap();
        assert_eq!(entry.san, "Qh4#");
        assert!(entry.gives_check);
        assert_eq!(game.status(), GameStatus::Won);
    }
}
