use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank, Square};
use std::str::FromStr;

use crate::services::errors::chess_service_errors::ChessServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
}

/// Thin wrapper over the `chess` crate speaking coordinate notation
/// (`e2e4`, `e7e8q`), which is what the matches table stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessService;

impl ChessService {
    pub fn new() -> Self {
        ChessService
    }

    /// Rebuilds the position from the starting board.
    pub fn replay(&self, moves: &[String]) -> Result<Board, ChessServiceError> {
        moves
            .iter()
            .try_fold(Board::default(), |board, notation| {
                self.apply_notation(&board, notation)
            })
    }

    pub fn apply_notation(&self, board: &Board, notation: &str) -> Result<Board, ChessServiceError> {
        let chess_move = parse_notation(notation)?;
        if board.status() != BoardStatus::Ongoing {
            return Err(ChessServiceError::GameOver);
        }
        if !board.legal(chess_move) {
            return Err(ChessServiceError::IllegalMove(notation.to_string()));
        }
        Ok(board.make_move_new(chess_move))
    }

    /// Plays `from` → `to` for the side to move. A pawn reaching the last
    /// rank always becomes a queen.
    pub fn apply_move(
        &self,
        board: &Board,
        from: &str,
        to: &str,
    ) -> Result<(Board, String), ChessServiceError> {
        let source = parse_square(from)?;
        let dest = parse_square(to)?;

        if board.status() != BoardStatus::Ongoing {
            return Err(ChessServiceError::GameOver);
        }

        let promotion = match (board.piece_on(source), dest.get_rank()) {
            (Some(Piece::Pawn), Rank::First | Rank::Eighth) => Some(Piece::Queen),
            _ => None,
        };
        let chess_move = ChessMove::new(source, dest, promotion);
        let notation = to_notation(&chess_move);

        if !board.legal(chess_move) {
            return Err(ChessServiceError::IllegalMove(notation));
        }

        Ok((board.make_move_new(chess_move), notation))
    }

    pub fn outcome(&self, board: &Board) -> GameOutcome {
        match board.status() {
            BoardStatus::Ongoing => GameOutcome::Ongoing,
            BoardStatus::Stalemate => GameOutcome::Stalemate,
            // The side to move is the one that got mated.
            BoardStatus::Checkmate => GameOutcome::Checkmate {
                winner: !board.side_to_move(),
            },
        }
    }

    pub fn legal_moves(&self, board: &Board) -> Vec<String> {
        MoveGen::new_legal(board).map(|m| to_notation(&m)).collect()
    }

    pub fn fen(&self, board: &Board) -> String {
        format!("{}", board)
    }
}

fn parse_square(square: &str) -> Result<Square, ChessServiceError> {
    Square::from_str(&square.trim().to_ascii_lowercase())
        .map_err(|_| ChessServiceError::InvalidSquare(square.to_string()))
}

fn parse_notation(notation: &str) -> Result<ChessMove, ChessServiceError> {
    let invalid = || ChessServiceError::InvalidNotation(notation.to_string());
    let normalized = notation.trim().to_ascii_lowercase();
    if !normalized.is_ascii() || !(4..=5).contains(&normalized.len()) {
        return Err(invalid());
    }

    let source = Square::from_str(&normalized[0..2]).map_err(|_| invalid())?;
    let dest = Square::from_str(&normalized[2..4]).map_err(|_| invalid())?;
    let promotion = match normalized.get(4..5) {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return Err(invalid()),
    };

    Ok(ChessMove::new(source, dest, promotion))
}

fn to_notation(chess_move: &ChessMove) -> String {
    let promotion = match chess_move.get_promotion() {
        Some(Piece::Queen) => "q",
        Some(Piece::Rook) => "r",
        Some(Piece::Bishop) => "b",
        Some(Piece::Knight) => "n",
        _ => "",
    };
    format!(
        "{}{}{}",
        chess_move.get_source(),
        chess_move.get_dest(),
        promotion
    )
}
