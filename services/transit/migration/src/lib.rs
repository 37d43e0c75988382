use sea_orm_migration::prelude::*;

mod m20260301_000001_create_passengers;
mod m20260301_000002_create_cards;
mod m20260301_000003_create_verification_tokens;
mod m20260301_000004_create_admin_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_passengers::Migration),
            Box::new(m20260301_000002_create_cards::Migration),
            Box::new(m20260301_000003_create_verification_tokens::Migration),
            Box::new(m20260301_000004_create_admin_users::Migration),
        ]
    }
}
