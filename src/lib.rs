//! Tournament Server Library
//!
//! Multi-round chess tournament engine: Swiss and round-robin pairing,
//! the claim/confirm result lifecycle, tiebreak standings and the
//! automation loop that advances rounds. Exposed as a library for
//! integration testing.

pub mod automation;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod lookup;
pub mod notify;
pub mod pairing;
pub mod results;
pub mod standings;
pub mod store;

/// Test helper to create an in-memory database and run migrations
pub async fn create_test_db() -> db::DbPool {
    let pool = sqlx::sqlite::SqlitePool::connect(":memory:")
        .await
        .expect("Failed to create in-memory database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
