pub mod entities;
pub mod schema;
pub mod services;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Lifetime for the single in-memory connection. Dropping that connection
/// drops the database, so the pool must never retire it.
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(u32::MAX as u64);

/// Opens the connection pool. In-memory SQLite gets a single connection that
/// is never recycled, so every query sees the same database.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    if is_in_memory(database_url) {
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME);
    } else {
        opt.max_connections(10);
    }
    opt.connect_timeout(Duration::from_secs(10)).sqlx_logging(false);
    Database::connect(opt).await
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}
