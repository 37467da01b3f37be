pub mod attendance_repo;
pub mod login_session_repo;
pub mod member_repo;
pub mod push_subscription_repo;
pub mod schedule_repo;
pub mod schema;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Opens the pool (creating the database file when missing) and applies the schema.
pub async fn connect(database_url: &str) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    schema::migrate(&pool).await?;
    Ok(pool)
}
