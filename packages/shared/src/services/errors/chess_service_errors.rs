#[derive(Debug, Clone, PartialEq)]
pub enum ChessServiceError {
    InvalidSquare(String),
    InvalidNotation(String),
    IllegalMove(String),
    GameOver,
}

impl std::fmt::Display for ChessServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChessServiceError::InvalidSquare(square) => write!(f, "Invalid square: {}", square),
            ChessServiceError::InvalidNotation(notation) => {
                write!(f, "Invalid move notation: {}", notation)
            }
            ChessServiceError::IllegalMove(notation) => write!(f, "Illegal move: {}", notation),
            ChessServiceError::GameOver => write!(f, "Game is already over"),
        }
    }
}

impl std::error::Error for ChessServiceError {}
