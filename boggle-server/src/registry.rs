use boggle_core::{Board, Dictionary, MAX_WORD_LEN, derive_phase, score_word, time_left};
use boggle_persistence::repositories::{GameRepository, UserRepository, WordRepository};
use boggle_types::{
    GamePhase, GameStatusResponse, PlayedWord, PlayerStatus, SessionError,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::matchmaking::{self, JoinOutcome, MAX_TIME_LIMIT, MIN_TIME_LIMIT};

pub const MAX_NICKNAME_LEN: usize = 50;

/// The serialized gateway to all session state.
///
/// Every operation — register, join, cancel, submit, status — acquires the
/// single internal mutex and then runs as one transaction against the
/// backing store. Requests may arrive concurrently, but the service mutates
/// and reads as a single writer: two joins can never both grab the same
/// pending slot, and a submission can never race a completion transition.
/// Coarse on purpose; any finer-grained replacement must preserve the same
/// linearizability.
pub struct SessionRegistry {
    db: DatabaseConnection,
    dictionary: Dictionary,
    lock: Mutex<()>,
}

impl SessionRegistry {
    pub fn new(db: DatabaseConnection, dictionary: Dictionary) -> Self {
        Self {
            db,
            dictionary,
            lock: Mutex::new(()),
        }
    }

    /// Issues a fresh opaque token for a new player.
    pub async fn register_user(&self, nickname: &str) -> Result<String, SessionError> {
        let trimmed = nickname.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_NICKNAME_LEN {
            return Err(SessionError::InvalidNickname);
        }

        let _guard = self.lock.lock().await;
        let txn = self.begin().await?;

        let token = Uuid::new_v4().to_string();
        let result = UserRepository::insert(&txn, &token, nickname, Utc::now())
            .await
            .map(|user| user.id)
            .map_err(SessionError::persistence);

        if result.is_ok() {
            info!(nickname = %nickname.trim(), "registered user");
        }
        finish(txn, result).await
    }

    /// Joins the matchmaker: pairs with a waiting game or creates one.
    pub async fn join_game(
        &self,
        user_token: &str,
        time_limit: i32,
    ) -> Result<JoinOutcome, SessionError> {
        if !(MIN_TIME_LIMIT..=MAX_TIME_LIMIT).contains(&time_limit) {
            return Err(SessionError::InvalidTimeLimit(time_limit));
        }

        let _guard = self.lock.lock().await;
        let txn = self.begin().await?;
        let result = matchmaking::join(&txn, user_token, time_limit, Utc::now()).await;
        finish(txn, result).await
    }

    /// Withdraws the caller's pending game, if they have one.
    pub async fn cancel_join(&self, user_token: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let txn = self.begin().await?;
        let result = matchmaking::cancel(&txn, user_token).await;
        finish(txn, result).await
    }

    /// Scores one word submission and appends it to the ledger.
    pub async fn play_word(
        &self,
        game_id: &str,
        user_token: &str,
        word: &str,
    ) -> Result<i32, SessionError> {
        let word = word.trim().to_string();
        if word.is_empty() || word.chars().count() > MAX_WORD_LEN {
            return Err(SessionError::InvalidWord);
        }

        let _guard = self.lock.lock().await;
        let txn = self.begin().await?;
        let result = self.play_word_in_txn(&txn, game_id, user_token, &word).await;
        finish(txn, result).await
    }

    async fn play_word_in_txn(
        &self,
        txn: &DatabaseTransaction,
        game_id: &str,
        user_token: &str,
        word: &str,
    ) -> Result<i32, SessionError> {
        let now = Utc::now();
        let game = GameRepository::find_by_id(txn, game_id)
            .await
            .map_err(SessionError::persistence)?
            .ok_or_else(|| SessionError::UnknownGame(game_id.to_string()))?;

        let persisted: GamePhase = game.state.parse().map_err(SessionError::persistence)?;
        let derived = derive_phase(persisted, game.start_time, game.time_limit.map(i64::from), now);
        if derived == GamePhase::Completed && persisted != GamePhase::Completed {
            // The rejection below still commits, so the observed completion
            // sticks and the phase stays monotonic.
            GameRepository::mark_completed(txn, game_id)
                .await
                .map_err(SessionError::persistence)?;
        }
        if derived != GamePhase::Active {
            return Err(SessionError::GameNotActive);
        }

        if game.player1 != user_token && game.player2.as_deref() != Some(user_token) {
            return Err(SessionError::PlayerNotInGame);
        }

        let board: Board = game
            .board
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(SessionError::persistence)?;

        let ledger = WordRepository::for_player_in_game(txn, game_id, user_token)
            .await
            .map_err(SessionError::persistence)?;
        let prior_words: Vec<String> = ledger.into_iter().map(|entry| entry.word).collect();

        let score = score_word(word, &board, &self.dictionary, &prior_words);
        WordRepository::append(txn, game_id, user_token, word, score, now)
            .await
            .map_err(SessionError::persistence)?;

        info!(game_id = %game_id, word = %word, score, "word recorded");
        Ok(score)
    }

    /// Snapshot of a game. Recomputes the lifecycle phase first, persisting
    /// a newly observed completion before building the response.
    pub async fn game_status(
        &self,
        game_id: &str,
        brief: bool,
    ) -> Result<GameStatusResponse, SessionError> {
        let _guard = self.lock.lock().await;
        let txn = self.begin().await?;
        let result = self.game_status_in_txn(&txn, game_id, brief).await;
        finish(txn, result).await
    }

    async fn game_status_in_txn(
        &self,
        txn: &DatabaseTransaction,
        game_id: &str,
        brief: bool,
    ) -> Result<GameStatusResponse, SessionError> {
        let now = Utc::now();
        let game = GameRepository::find_by_id(txn, game_id)
            .await
            .map_err(SessionError::persistence)?
            .ok_or_else(|| SessionError::UnknownGame(game_id.to_string()))?;

        let persisted: GamePhase = game.state.parse().map_err(SessionError::persistence)?;
        let derived = derive_phase(persisted, game.start_time, game.time_limit.map(i64::from), now);
        if derived == GamePhase::Completed && persisted != GamePhase::Completed {
            GameRepository::mark_completed(txn, game_id)
                .await
                .map_err(SessionError::persistence)?;
        }

        if derived == GamePhase::Pending {
            return Ok(GameStatusResponse::pending());
        }

        // Past pending, both slots and the clock are guaranteed set.
        let (start, limit) = match (game.start_time, game.time_limit) {
            (Some(start), Some(limit)) => (start, limit),
            _ => return Err(SessionError::persistence("active game is missing clock fields")),
        };
        let player2_token = game
            .player2
            .as_deref()
            .ok_or_else(|| SessionError::persistence("active game is missing second player"))?;

        let completed = derived == GamePhase::Completed;
        let left = if completed {
            0
        } else {
            time_left(start, i64::from(limit), now)
        };

        let player1 = self
            .player_status(txn, game_id, &game.player1, brief, completed)
            .await?;
        let player2 = self
            .player_status(txn, game_id, player2_token, brief, completed)
            .await?;

        Ok(GameStatusResponse {
            game_state: derived,
            board: if brief { None } else { game.board.clone() },
            time_limit: if brief { None } else { Some(limit) },
            time_left: Some(left),
            player1: Some(player1),
            player2: Some(player2),
        })
    }

    async fn player_status(
        &self,
        txn: &DatabaseTransaction,
        game_id: &str,
        token: &str,
        brief: bool,
        completed: bool,
    ) -> Result<PlayerStatus, SessionError> {
        let ledger = WordRepository::for_player_in_game(txn, game_id, token)
            .await
            .map_err(SessionError::persistence)?;
        let score: i32 = ledger.iter().map(|entry| entry.score).sum();

        let nickname = if brief {
            None
        } else {
            let user = UserRepository::find_by_token(txn, token)
                .await
                .map_err(SessionError::persistence)?
                .ok_or_else(|| SessionError::persistence("game references unknown user"))?;
            Some(user.nickname)
        };

        // The full ledger is only disclosed once the game is over.
        let words_played = (!brief && completed).then(|| {
            ledger
                .into_iter()
                .map(|entry| PlayedWord {
                    word: entry.word,
                    score: entry.score,
                })
                .collect()
        });

        Ok(PlayerStatus {
            nickname,
            score,
            words_played,
        })
    }

    async fn begin(&self) -> Result<DatabaseTransaction, SessionError> {
        self.db.begin().await.map_err(SessionError::persistence)
    }
}

/// Commits on success and on recoverable domain errors (mirroring the
/// read-then-decide shape of every operation); only a persistence failure
/// rolls the transaction back.
async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, SessionError>,
) -> Result<T, SessionError> {
    if result.as_ref().err().is_some_and(|e| e.is_persistence()) {
        if let Err(err) = txn.rollback().await {
            warn!(error = %err, "rollback failed after persistence error");
        }
        return result;
    }

    txn.commit().await.map_err(SessionError::persistence)?;
    result
}
