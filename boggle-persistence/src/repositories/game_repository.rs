use boggle_types::GamePhase;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{Set, Unchanged},
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::{games, prelude::*};

/// Game record access. Methods take any `ConnectionTrait` so a whole
/// operation (lookup, pairing, phase persist) runs in one transaction.
pub struct GameRepository;

impl GameRepository {
    pub async fn insert_pending<C: ConnectionTrait>(
        db: &C,
        id: &str,
        player1: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let game = games::ActiveModel {
            id: Set(id.to_string()),
            player1: Set(player1.to_string()),
            player2: Set(None),
            board: Set(None),
            time_limit: Set(None),
            start_time: Set(None),
            state: Set(GamePhase::Pending.as_str().to_string()),
            created_at: Set(now),
        };

        Games::insert(game).exec(db).await?;
        Ok(())
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: &str,
    ) -> Result<Option<games::Model>, DbErr> {
        Games::find_by_id(id).one(db).await
    }

    /// Oldest game still waiting on a second player, if any.
    pub async fn find_pending<C: ConnectionTrait>(db: &C) -> Result<Option<games::Model>, DbErr> {
        Games::find()
            .filter(games::Column::State.eq(GamePhase::Pending.as_str()))
            .order_by_asc(games::Column::CreatedAt)
            .one(db)
            .await
    }

    /// Pending game created by this player, if any. Cancellation only ever
    /// targets slot 1: a player in slot 2 is by definition in an active game.
    pub async fn find_pending_for_player<C: ConnectionTrait>(
        db: &C,
        token: &str,
    ) -> Result<Option<games::Model>, DbErr> {
        Games::find()
            .filter(games::Column::State.eq(GamePhase::Pending.as_str()))
            .filter(games::Column::Player1.eq(token))
            .one(db)
            .await
    }

    /// All games in which the player occupies a slot and the persisted phase
    /// is not yet completed. Callers still need to re-derive each game's
    /// phase; a row here may have expired without anyone observing it.
    pub async fn find_open_for_player<C: ConnectionTrait>(
        db: &C,
        token: &str,
    ) -> Result<Vec<games::Model>, DbErr> {
        Games::find()
            .filter(
                Condition::any()
                    .add(games::Column::Player1.eq(token))
                    .add(games::Column::Player2.eq(token)),
            )
            .filter(games::Column::State.ne(GamePhase::Completed.as_str()))
            .all(db)
            .await
    }

    /// Fills the second slot and starts the clock. Board, time limit and
    /// start time are set in the same statement as the phase change so a
    /// pending row can never be observed half-activated.
    pub async fn activate<C: ConnectionTrait>(
        db: &C,
        id: &str,
        player2: &str,
        board: &str,
        time_limit: i32,
        start_time: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let game = games::ActiveModel {
            id: Unchanged(id.to_string()),
            player2: Set(Some(player2.to_string())),
            board: Set(Some(board.to_string())),
            time_limit: Set(Some(time_limit)),
            start_time: Set(Some(start_time)),
            state: Set(GamePhase::Active.as_str().to_string()),
            ..Default::default()
        };

        Games::update(game).exec(db).await?;
        Ok(())
    }

    pub async fn mark_completed<C: ConnectionTrait>(db: &C, id: &str) -> Result<(), DbErr> {
        let game = games::ActiveModel {
            id: Unchanged(id.to_string()),
            state: Set(GamePhase::Completed.as_str().to_string()),
            ..Default::default()
        };

        Games::update(game).exec(db).await?;
        Ok(())
    }

    /// Removes a cancelled pending game. Deleting anything other than exactly
    /// one row means the operation raced something it should not have.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: &str) -> Result<(), DbErr> {
        let result = Games::delete_by_id(id).exec(db).await?;
        if result.rows_affected != 1 {
            return Err(DbErr::Custom(format!(
                "expected to delete 1 game row, deleted {}",
                result.rows_affected
            )));
        }
        Ok(())
    }
}
