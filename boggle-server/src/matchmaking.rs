use boggle_core::{Board, derive_phase};
use boggle_persistence::repositories::{GameRepository, UserRepository};
use boggle_types::{GamePhase, SessionError};
use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use tracing::info;
use uuid::Uuid;

pub const MIN_TIME_LIMIT: i32 = 5;
pub const MAX_TIME_LIMIT: i32 = 120;

/// How a join request resolved: either the caller is now waiting for an
/// opponent, or they completed an existing pending game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Waiting { game_id: String },
    Paired { game_id: String },
}

impl JoinOutcome {
    pub fn game_id(&self) -> &str {
        match self {
            JoinOutcome::Waiting { game_id } | JoinOutcome::Paired { game_id } => game_id,
        }
    }

    pub fn phase(&self) -> GamePhase {
        match self {
            JoinOutcome::Waiting { .. } => GamePhase::Pending,
            JoinOutcome::Paired { .. } => GamePhase::Active,
        }
    }
}

/// Pairs the caller with the oldest pending game, or creates a new one.
///
/// Runs inside the registry's critical section and transaction; the caller
/// owns both. When pairing completes, the board is generated and the clock
/// starts here, and the game's effective time limit is the joining player's
/// requested value. The first player's requested limit is discarded.
pub(crate) async fn join<C: ConnectionTrait>(
    db: &C,
    user_token: &str,
    time_limit: i32,
    now: DateTime<Utc>,
) -> Result<JoinOutcome, SessionError> {
    let user = UserRepository::find_by_token(db, user_token)
        .await
        .map_err(SessionError::persistence)?
        .ok_or(SessionError::UnknownToken)?;

    // A token may hold a slot in at most one open game. A game that expired
    // without anyone noticing does not block the join, but the completion
    // observed here is persisted so the phase stays monotonic.
    let open_games = GameRepository::find_open_for_player(db, user_token)
        .await
        .map_err(SessionError::persistence)?;
    for game in open_games {
        let persisted: GamePhase = game.state.parse().map_err(SessionError::persistence)?;
        let derived = derive_phase(persisted, game.start_time, game.time_limit.map(i64::from), now);
        if derived == GamePhase::Completed {
            if persisted != GamePhase::Completed {
                GameRepository::mark_completed(db, &game.id)
                    .await
                    .map_err(SessionError::persistence)?;
            }
        } else {
            return Err(SessionError::AlreadyInGame);
        }
    }

    match GameRepository::find_pending(db)
        .await
        .map_err(SessionError::persistence)?
    {
        Some(pending) => {
            let board = Board::new();
            GameRepository::activate(db, &pending.id, user_token, &board.to_string(), time_limit, now)
                .await
                .map_err(SessionError::persistence)?;
            info!(
                game_id = %pending.id,
                nickname = %user.nickname,
                time_limit,
                "second player joined, game is active"
            );
            Ok(JoinOutcome::Paired { game_id: pending.id })
        }
        None => {
            let game_id = Uuid::new_v4().to_string();
            GameRepository::insert_pending(db, &game_id, user_token, now)
                .await
                .map_err(SessionError::persistence)?;
            info!(game_id = %game_id, nickname = %user.nickname, "created pending game");
            Ok(JoinOutcome::Waiting { game_id })
        }
    }
}

/// Voids the caller's pending game. Only slot 1 can ever cancel: a player in
/// slot 2 joined an already-active game.
pub(crate) async fn cancel<C: ConnectionTrait>(
    db: &C,
    user_token: &str,
) -> Result<(), SessionError> {
    let pending = GameRepository::find_pending_for_player(db, user_token)
        .await
        .map_err(SessionError::persistence)?
        .ok_or(SessionError::NoPendingGame)?;

    GameRepository::delete(db, &pending.id)
        .await
        .map_err(SessionError::persistence)?;
    info!(game_id = %pending.id, "cancelled pending game");
    Ok(())
}
