pub mod catalog;
pub mod event;
pub mod user;

use log::info;
use sqlx::postgres::PgPoolOptions;

use crate::{config::Settings, PGPool};

/// Opens the pool and brings the schema up to date.
///
/// Migrations are idempotent, so this is the only start-up initialisation
/// the database needs.
pub async fn init_db_pool(settings: &Settings) -> Result<PGPool, sqlx::Error> {
    let pool: PGPool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await?;
    info!("connected to postgresql");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|err| sqlx::Error::Migrate(Box::new(err)))?;
    info!("database schema is up to date");
    Ok(pool)
}
