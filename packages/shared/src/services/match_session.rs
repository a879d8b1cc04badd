use chess::{Board, Color};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::change::{ChangeKind, MatchChange};
use crate::models::match_record::{Match, MatchStatus};
use crate::models::profile::Profile;
use crate::models::time_control::{MatchClock, TimeControl};
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::repositories::errors::profile_repository_errors::ProfileRepositoryError;
use crate::repositories::match_repository::MatchRepository;
use crate::repositories::profile_repository::ProfileRepository;
use crate::services::chess_service::{ChessService, GameOutcome};
use crate::services::errors::match_session_errors::MatchSessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// The match row is still `waiting`.
    Loading,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotResult {
    Applied,
    Ignored,
}

/// A move shown locally before the store has confirmed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub notation: String,
    pub base_move_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchPlayers {
    pub white: Option<Profile>,
    pub black: Option<Profile>,
}

/// One player's live view of a match.
///
/// The stored row is the source of truth: every local change is written with
/// the known move count as a concurrency token, and every snapshot from the
/// store (write responses, change notifications, refreshes) is reconciled
/// through the same path.
pub struct MatchSession {
    repository: Arc<dyn MatchRepository + Send + Sync>,
    chess: ChessService,
    player_id: String,
    color: Color,
    snapshot: Match,
    board: Board,
    applied_moves: Vec<String>,
    pending: Option<PendingMove>,
    clock: Option<MatchClock>,
    players: MatchPlayers,
}

impl MatchSession {
    pub async fn load(
        matches: Arc<dyn MatchRepository + Send + Sync>,
        profiles: Arc<dyn ProfileRepository + Send + Sync>,
        match_id: &str,
        player_id: &str,
        clocked: bool,
    ) -> Result<Self, MatchSessionError> {
        let snapshot = matches
            .get_match(match_id)
            .await?
            .ok_or(MatchSessionError::MatchNotFound)?;

        let color = snapshot
            .color_of(player_id)
            .ok_or(MatchSessionError::NotParticipant)?;

        let chess = ChessService::new();
        let board = chess
            .replay(&snapshot.moves)
            .map_err(MatchSessionError::ChessError)?;

        let players = MatchPlayers {
            white: load_profile(profiles.as_ref(), Some(&snapshot.player1_id)).await,
            black: load_profile(profiles.as_ref(), snapshot.player2_id.as_deref()).await,
        };

        let clock = if clocked {
            let time_control = snapshot
                .time_control
                .parse::<TimeControl>()
                .unwrap_or_else(|e| {
                    warn!("{}; using the default time control", e);
                    TimeControl::default()
                });
            Some(MatchClock::new(time_control))
        } else {
            None
        };

        debug!(
            "Loaded match {} for player {} as {:?} at move {}",
            snapshot.id,
            player_id,
            color,
            snapshot.moves.len()
        );

        Ok(MatchSession {
            repository: matches,
            chess,
            player_id: player_id.to_string(),
            color,
            applied_moves: snapshot.moves.clone(),
            snapshot,
            board,
            pending: None,
            clock,
            players,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        match self.snapshot.status {
            MatchStatus::Waiting => SessionPhase::Loading,
            MatchStatus::Active => SessionPhase::Active,
            MatchStatus::Completed => SessionPhase::Completed,
        }
    }

    pub fn snapshot(&self) -> &Match {
        &self.snapshot
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn applied_moves(&self) -> &[String] {
        &self.applied_moves
    }

    pub fn pending(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    pub fn clock(&self) -> Option<&MatchClock> {
        self.clock.as_ref()
    }

    pub fn players(&self) -> &MatchPlayers {
        &self.players
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn is_my_turn(&self) -> bool {
        self.phase() == SessionPhase::Active && self.board.side_to_move() == self.color
    }

    pub fn fen(&self) -> String {
        self.chess.fen(&self.board)
    }

    pub fn legal_moves(&self) -> Vec<String> {
        if self.phase() == SessionPhase::Active {
            self.chess.legal_moves(&self.board)
        } else {
            vec![]
        }
    }

    /// Reconciles with an authoritative row. Snapshots of other matches,
    /// already-seen versions and status regressions are ignored.
    pub fn apply_snapshot(&mut self, snapshot: Match) -> Result<SnapshotResult, MatchSessionError> {
        self.reconcile(snapshot, false)
    }

    pub fn handle_change(&mut self, change: MatchChange) -> Result<SnapshotResult, MatchSessionError> {
        if change.match_id != self.snapshot.id {
            return Ok(SnapshotResult::Ignored);
        }
        match (change.kind, change.record) {
            (ChangeKind::Delete, _) => {
                warn!("Match {} was deleted under an open session", change.match_id);
                Ok(SnapshotResult::Ignored)
            }
            (_, Some(record)) => self.apply_snapshot(record),
            (_, None) => Ok(SnapshotResult::Ignored),
        }
    }

    /// Re-reads the row and adopts it, discarding any unconfirmed local move.
    pub async fn refresh(&mut self) -> Result<SnapshotResult, MatchSessionError> {
        let snapshot = self
            .repository
            .get_match(&self.snapshot.id)
            .await?
            .ok_or(MatchSessionError::MatchNotFound)?;
        self.reconcile(snapshot, true)
    }

    pub async fn try_move(&mut self, from: &str, to: &str) -> Result<Match, MatchSessionError> {
        self.ensure_active()?;
        if self.board.side_to_move() != self.color {
            return Err(MatchSessionError::NotYourTurn);
        }

        let (board, notation) = self.chess.apply_move(&self.board, from, to)?;
        let expected_move_count = self.applied_moves.len();

        self.board = board;
        self.applied_moves.push(notation.clone());
        self.pending = Some(PendingMove {
            notation: notation.clone(),
            base_move_count: expected_move_count,
        });

        let updated = match self
            .repository
            .append_move(&self.snapshot.id, expected_move_count, &notation)
            .await
        {
            Ok(updated) => updated,
            Err(MatchRepositoryError::ConditionFailed(reason)) => {
                warn!(
                    "Move {} in match {} was rejected by the store: {}",
                    notation, self.snapshot.id, reason
                );
                self.refresh().await?;
                return Err(MatchSessionError::Conflict(reason));
            }
            Err(err) => return Err(err.into()),
        };

        self.reconcile(updated, true)?;
        if let Some(clock) = self.clock.as_mut() {
            clock.credit_increment(self.color);
        }
        info!(
            "Player {} played {} in match {}",
            self.player_id, notation, self.snapshot.id
        );

        match self.chess.outcome(&self.board) {
            GameOutcome::Ongoing => {}
            GameOutcome::Checkmate { winner } => {
                let winner_id = self.snapshot.player_for(winner).map(str::to_string);
                info!("Checkmate in match {}", self.snapshot.id);
                self.complete(winner_id).await?;
            }
            GameOutcome::Stalemate => {
                info!("Stalemate in match {}", self.snapshot.id);
                self.complete(None).await?;
            }
        }

        Ok(self.snapshot.clone())
    }

    /// Concedes: the opponent wins whatever the position.
    pub async fn resign(&mut self) -> Result<Match, MatchSessionError> {
        self.ensure_active()?;
        let winner_id = self.snapshot.opponent_of(&self.player_id).map(str::to_string);

        info!("Player {} resigned match {}", self.player_id, self.snapshot.id);
        self.complete(winner_id).await?;
        Ok(self.snapshot.clone())
    }

    /// Charges elapsed time to the side to move. Returns the colour that ran
    /// out of time, after the match has been completed in the other's favour.
    pub async fn tick(&mut self, elapsed_secs: u32) -> Result<Option<Color>, MatchSessionError> {
        if self.phase() != SessionPhase::Active {
            return Ok(None);
        }
        let side = self.board.side_to_move();
        let flagged = match self.clock.as_mut() {
            Some(clock) => clock.tick(side, elapsed_secs),
            None => return Ok(None),
        };

        match flagged {
            Some(color) => {
                self.flag(color).await?;
                Ok(Some(color))
            }
            None => Ok(None),
        }
    }

    pub async fn flag(&mut self, flagged: Color) -> Result<Match, MatchSessionError> {
        self.ensure_active()?;
        let winner_id = self.snapshot.player_for(!flagged).map(str::to_string);

        info!(
            "{:?} ran out of time in match {}",
            flagged, self.snapshot.id
        );
        self.complete(winner_id).await?;
        Ok(self.snapshot.clone())
    }

    fn ensure_active(&self) -> Result<(), MatchSessionError> {
        match self.phase() {
            SessionPhase::Active => Ok(()),
            SessionPhase::Loading => Err(MatchSessionError::NotActive),
            SessionPhase::Completed => Err(MatchSessionError::AlreadyCompleted),
        }
    }

    async fn complete(&mut self, winner_id: Option<String>) -> Result<(), MatchSessionError> {
        match self
            .repository
            .complete_match(&self.snapshot.id, winner_id.as_deref())
            .await
        {
            Ok(updated) => {
                self.reconcile(updated, true)?;
                Ok(())
            }
            Err(MatchRepositoryError::ConditionFailed(reason)) => {
                self.refresh().await?;
                if self.phase() == SessionPhase::Completed {
                    debug!(
                        "Match {} was already completed with winner {:?}",
                        self.snapshot.id, self.snapshot.winner_id
                    );
                    Ok(())
                } else {
                    Err(MatchSessionError::Conflict(reason))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// `force` also accepts the currently known version, which is how a
    /// refresh discards an unconfirmed local move.
    fn reconcile(&mut self, snapshot: Match, force: bool) -> Result<SnapshotResult, MatchSessionError> {
        if snapshot.id != self.snapshot.id {
            return Ok(SnapshotResult::Ignored);
        }
        if snapshot.status.rank() < self.snapshot.status.rank() {
            debug!(
                "Ignoring {} snapshot of match {} already {}",
                snapshot.status, snapshot.id, self.snapshot.status
            );
            return Ok(SnapshotResult::Ignored);
        }
        let accepts_same_version = force || self.pending.is_some();
        if snapshot.version < self.snapshot.version
            || (snapshot.version == self.snapshot.version && !accepts_same_version)
        {
            return Ok(SnapshotResult::Ignored);
        }

        let extends_local = snapshot.moves.len() >= self.applied_moves.len()
            && snapshot.moves.starts_with(&self.applied_moves);

        if extends_local {
            let mut board = self.board;
            let first_new = self.applied_moves.len();
            for notation in &snapshot.moves[first_new..] {
                board = self
                    .chess
                    .apply_notation(&board, notation)
                    .map_err(MatchSessionError::ChessError)?;
            }
            if let Some(clock) = self.clock.as_mut() {
                for index in first_new..snapshot.moves.len() {
                    clock.credit_increment(mover_at(index));
                }
            }
            self.board = board;
        } else {
            self.board = self
                .chess
                .replay(&snapshot.moves)
                .map_err(MatchSessionError::ChessError)?;
        }

        self.applied_moves = snapshot.moves.clone();
        self.pending = None;
        self.snapshot = snapshot;
        Ok(SnapshotResult::Applied)
    }
}

/// White makes the even-numbered plies.
fn mover_at(index: usize) -> Color {
    if index % 2 == 0 {
        Color::White
    } else {
        Color::Black
    }
}

async fn load_profile(profiles: &dyn ProfileRepository, player_id: Option<&str>) -> Option<Profile> {
    let player_id = player_id?;
    match profiles.get_profile(player_id).await {
        Ok(profile) => Some(profile),
        Err(ProfileRepositoryError::NotFound) => None,
        Err(err) => {
            warn!("Could not load profile for {}: {}", player_id, err);
            None
        }
    }
}
