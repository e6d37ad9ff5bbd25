use sea_orm::entity::prelude::*;

/// A game record. `player2`, `board`, `time_limit` and `start_time` are all
/// NULL while the game is pending and are set together when a second player
/// is paired in. `state` holds the last persisted phase and never moves
/// backwards from "completed".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub player1: String,
    pub player2: Option<String>,
    pub board: Option<String>,
    pub time_limit: Option<i32>,
    pub start_time: Option<DateTimeUtc>,
    pub state: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::words::Entity")]
    Words,
}

impl Related<super::words::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Words.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
