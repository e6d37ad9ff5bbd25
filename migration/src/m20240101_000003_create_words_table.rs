use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Words::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Words::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Words::GameId).string().not_null())
                    .col(ColumnDef::new(Words::Player).string().not_null())
                    .col(ColumnDef::new(Words::Word).string().not_null())
                    .col(ColumnDef::new(Words::Score).integer().not_null())
                    .col(
                        ColumnDef::new(Words::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_words_game")
                            .from(Words::Table, Words::GameId)
                            .to(Games::Table, Games::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_words_player")
                            .from(Words::Table, Words::Player)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Score totals and ledgers are always read per game and player.
        manager
            .create_index(
                Index::create()
                    .name("idx_words_game_player")
                    .table(Words::Table)
                    .col(Words::GameId)
                    .col(Words::Player)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Words::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Words {
    Table,
    Id,
    GameId,
    Player,
    Word,
    Score,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Games {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
