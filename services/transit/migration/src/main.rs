use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(tuapp_transit_migration::Migrator).await;
}
