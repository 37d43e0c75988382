use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cards::PassengerId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Cards::Code)
                            .string_len(8)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Cards::Profile).string().not_null())
                    .col(
                        ColumnDef::new(Cards::BalanceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Cards::Status)
                            .string()
                            .not_null()
                            .default("Activa"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Cards::Table, Cards::PassengerId)
                            .to(Passengers::Table, Passengers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .check(Expr::col(Cards::BalanceCents).gte(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Cards::Table)
                    .col(Cards::PassengerId)
                    .name("idx_cards_passenger_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    PassengerId,
    Code,
    Profile,
    BalanceCents,
    Status,
}

#[derive(Iden)]
enum Passengers {
    Table,
    Id,
}
