//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::ops::Deref;
use std::sync::OnceLock;

use peoplehub::migrate::Migrator;
use peoplehub::seed::SeedOptions;
use peoplehub::Database;
use tokio::sync::{Mutex, MutexGuard};

/// Last schema (non-seed) migration.
pub const LAST_SCHEMA_VERSION: i64 = 20240201090200;

/// Returns the test database URL from the `TEST_DATABASE_URL` environment variable.
/// Panics if the variable is not set.
pub fn test_db_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// Returns true if the test database URL is configured.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// Seed options with a fixed RNG seed.
pub fn seeded_options(seed: u64) -> SeedOptions {
    SeedOptions {
        rng_seed: Some(seed),
        email_domain: "example.test".to_string(),
        ..Default::default()
    }
}

/// Every test resets the whole `public` schema, so tests in one binary take
/// turns on the database.
static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// A database handle that holds the test lock until dropped.
pub struct TestDb {
    db: Database,
    _guard: MutexGuard<'static, ()>,
}

impl Deref for TestDb {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

/// Connect and wipe the `public` schema, including `schema_migrations`.
pub async fn fresh_db() -> TestDb {
    let guard = DB_LOCK.get_or_init(|| Mutex::new(())).lock().await;
    let db = Database::connect(&test_db_url())
        .await
        .expect("Failed to connect to test database");
    sqlx::raw_sql("DROP SCHEMA IF EXISTS public CASCADE; CREATE SCHEMA public;")
        .execute(db.pool())
        .await
        .expect("Failed to reset public schema");
    TestDb { db, _guard: guard }
}

/// Fresh database with every schema migration applied and no seed data.
pub async fn migrated_db() -> TestDb {
    let db = fresh_db().await;
    Migrator::new(seeded_options(1))
        .up(&db, Some(LAST_SCHEMA_VERSION))
        .await
        .expect("Failed to apply schema migrations");
    db
}

/// Fresh database with every migration, seeds included, applied.
pub async fn seeded_db(seed: u64) -> TestDb {
    let db = fresh_db().await;
    Migrator::new(seeded_options(seed))
        .up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}
