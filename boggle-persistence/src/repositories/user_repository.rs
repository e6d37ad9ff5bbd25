use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait};

use crate::entities::{prelude::*, users};

/// User record access. Methods take any `ConnectionTrait` so callers can run
/// them inside a shared transaction.
pub struct UserRepository;

impl UserRepository {
    pub async fn insert<C: ConnectionTrait>(
        db: &C,
        token: &str,
        nickname: &str,
        now: DateTime<Utc>,
    ) -> Result<users::Model, DbErr> {
        let user = users::ActiveModel {
            id: Set(token.to_string()),
            nickname: Set(nickname.to_string()),
            created_at: Set(now),
        };

        Users::insert(user).exec(db).await?;

        Ok(users::Model {
            id: token.to_string(),
            nickname: nickname.to_string(),
            created_at: now,
        })
    }

    pub async fn find_by_token<C: ConnectionTrait>(
        db: &C,
        token: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        Users::find_by_id(token).one(db).await
    }
}
