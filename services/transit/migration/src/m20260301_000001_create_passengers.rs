use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Passengers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Passengers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Passengers::Name).string().not_null())
                    .col(ColumnDef::new(Passengers::Surname1).string().not_null())
                    .col(ColumnDef::new(Passengers::Surname2).string())
                    .col(
                        ColumnDef::new(Passengers::Document)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Passengers::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Passengers::SessionActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Passengers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Passengers {
    Table,
    Id,
    Name,
    #[iden = "surname_1"]
    Surname1,
    #[iden = "surname_2"]
    Surname2,
    Document,
    Email,
    SessionActive,
}
