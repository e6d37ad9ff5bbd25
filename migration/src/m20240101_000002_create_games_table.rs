use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Games::Player1).string().not_null())
                    .col(ColumnDef::new(Games::Player2).string().null())
                    .col(ColumnDef::new(Games::Board).string().null())
                    .col(ColumnDef::new(Games::TimeLimit).integer().null())
                    .col(
                        ColumnDef::new(Games::StartTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Games::State)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Games::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_games_player1")
                            .from(Games::Table, Games::Player1)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_games_player2")
                            .from(Games::Table, Games::Player2)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Pairing scans for the oldest pending game; conflict checks scan by
        // occupied slot.
        manager
            .create_index(
                Index::create()
                    .name("idx_games_state")
                    .table(Games::Table)
                    .col(Games::State)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_games_player1")
                    .table(Games::Table)
                    .col(Games::Player1)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_games_player2")
                    .table(Games::Table)
                    .col(Games::Player2)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Games {
    Table,
    Id,
    Player1,
    Player2,
    Board,
    TimeLimit,
    StartTime,
    State,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
