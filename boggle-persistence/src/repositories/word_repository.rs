use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::{prelude::*, words};

/// Word ledger access. The ledger is append-only: nothing here updates or
/// deletes rows.
pub struct WordRepository;

impl WordRepository {
    pub async fn append<C: ConnectionTrait>(
        db: &C,
        game_id: &str,
        player: &str,
        word: &str,
        score: i32,
        now: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let entry = words::ActiveModel {
            id: NotSet,
            game_id: Set(game_id.to_string()),
            player: Set(player.to_string()),
            word: Set(word.to_string()),
            score: Set(score),
            created_at: Set(now),
        };

        Words::insert(entry).exec(db).await?;
        Ok(())
    }

    /// The player's ledger for one game, in submission order.
    pub async fn for_player_in_game<C: ConnectionTrait>(
        db: &C,
        game_id: &str,
        player: &str,
    ) -> Result<Vec<words::Model>, DbErr> {
        Words::find()
            .filter(words::Column::GameId.eq(game_id))
            .filter(words::Column::Player.eq(player))
            .order_by_asc(words::Column::Id)
            .all(db)
            .await
    }
}
