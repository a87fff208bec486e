//! Applies and reverts registry migrations, tracked in `schema_migrations`.
//!
//! Each migration commits together with its tracking row in a single
//! transaction. A session advisory lock is held on a dedicated connection for
//! the whole of `up`/`down` so two runners never interleave. That connection
//! is detached from the pool: if the run is dropped mid-way the connection
//! closes and the server releases the lock with the session.
//!
//! SQL migrations record the SHA-384 of their `up` text. An applied
//! migration whose embedded SQL no longer matches is reported by `status` as
//! `modified` and stops `up`/`down`. Rows written before checksums were
//! tracked carry none and are not checked.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use super::{validate, Kind, Migration};
use crate::db::Database;
use crate::seed::{SeedContext, SeedOptions};

/// Advisory lock key held while migrations run.
pub const MIGRATION_LOCK_KEY: i64 = 0x7065_6f70_6c65;

const CREATE_TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version    BIGINT PRIMARY KEY,
    name       TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    checksum   BYTEA
)";

const ADD_CHECKSUM_COLUMN: &str =
    "ALTER TABLE schema_migrations ADD COLUMN IF NOT EXISTS checksum BYTEA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "appliedAt", rename_all = "snake_case")]
pub enum MigrationState {
    Pending,
    Applied(DateTime<Utc>),
    /// Recorded as applied but absent from the registry.
    Unknown(DateTime<Utc>),
    /// Applied, but the embedded SQL differs from what was run.
    Modified(DateTime<Utc>),
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: String,
    pub seed: bool,
    #[serde(flatten)]
    pub state: MigrationState,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        !matches!(self.state, MigrationState::Pending)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct AppliedRow {
    version: i64,
    name: String,
    applied_at: DateTime<Utc>,
    checksum: Option<Vec<u8>>,
}

impl AppliedRow {
    fn matches(&self, migration: &Migration) -> bool {
        match (&self.checksum, migration.checksum()) {
            (Some(recorded), Some(expected)) => *recorded == expected,
            _ => true,
        }
    }
}

pub struct Migrator {
    migrations: &'static [Migration],
    seed: SeedContext,
}

impl Migrator {
    /// Runner over the full registry.
    pub fn new(seed_options: SeedOptions) -> Self {
        Self::with_migrations(super::registry(), seed_options)
    }

    /// Runner over an explicit, ordered migration list.
    pub fn with_migrations(migrations: &'static [Migration], seed_options: SeedOptions) -> Self {
        Migrator {
            migrations,
            seed: SeedContext::new(seed_options),
        }
    }

    fn find(&self, version: i64) -> Option<&'static Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }

    /// Every registered migration with its state, followed by applied
    /// versions the registry does not know.
    pub async fn status(&self, db: &Database) -> Result<Vec<MigrationStatus>> {
        let mut conn = db.pool().acquire().await?;
        ensure_table(&mut conn).await?;
        let mut applied: BTreeMap<i64, AppliedRow> = applied_rows(&mut conn)
            .await?
            .into_iter()
            .map(|row| (row.version, row))
            .collect();

        let mut out: Vec<MigrationStatus> = self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                version: m.version,
                name: m.name.to_string(),
                seed: m.is_seed(),
                state: match applied.remove(&m.version) {
                    Some(row) if row.matches(m) => MigrationState::Applied(row.applied_at),
                    Some(row) => MigrationState::Modified(row.applied_at),
                    None => MigrationState::Pending,
                },
            })
            .collect();
        out.extend(applied.into_values().map(|row| MigrationStatus {
            version: row.version,
            name: row.name,
            seed: false,
            state: MigrationState::Unknown(row.applied_at),
        }));
        Ok(out)
    }

    /// Apply pending migrations in version order, up to and including
    /// `target` (all when `None`). Returns the versions applied.
    pub async fn up(&mut self, db: &Database, target: Option<i64>) -> Result<Vec<i64>> {
        validate(self.migrations)?;
        if let Some(target) = target {
            if self.find(target).is_none() {
                anyhow::bail!("unknown target migration {}", target);
            }
        }

        let mut conn = lock(db).await?;
        let result = self.up_locked(&mut conn, target).await;
        release(conn).await;
        result
    }

    async fn up_locked(&mut self, conn: &mut PgConnection, target: Option<i64>) -> Result<Vec<i64>> {
        ensure_table(conn).await?;
        let applied = applied_rows(conn).await?;
        self.check_applied(&applied)?;
        let applied: Vec<i64> = applied.iter().map(|row| row.version).collect();

        let pending: Vec<&'static Migration> = self
            .migrations
            .iter()
            .filter(|m| !applied.contains(&m.version))
            .filter(|m| target.map_or(true, |t| m.version <= t))
            .collect();

        if pending.is_empty() {
            info!("schema is up to date");
        }

        let mut done = Vec::with_capacity(pending.len());
        for migration in pending {
            info!(version = migration.version, name = migration.name, "applying migration");
            self.apply(conn, migration)
                .await
                .with_context(|| format!("migration {} failed", migration.label()))?;
            done.push(migration.version);
        }
        Ok(done)
    }

    /// Revert the `steps` most recently applied migrations.
    pub async fn down(&mut self, db: &Database, steps: usize) -> Result<Vec<i64>> {
        validate(self.migrations)?;
        let mut conn = lock(db).await?;
        let result = self
            .down_locked(&mut conn, |applied| {
                applied.iter().rev().take(steps).copied().collect()
            })
            .await;
        release(conn).await;
        result
    }

    /// Revert every applied migration newer than `version`. `0` reverts all.
    pub async fn down_to(&mut self, db: &Database, version: i64) -> Result<Vec<i64>> {
        validate(self.migrations)?;
        if version != 0 && self.find(version).is_none() {
            anyhow::bail!("unknown target migration {}", version);
        }
        let mut conn = lock(db).await?;
        let result = self
            .down_locked(&mut conn, |applied| {
                applied.iter().rev().copied().filter(|v| *v > version).collect()
            })
            .await;
        release(conn).await;
        result
    }

    async fn down_locked<F>(&mut self, conn: &mut PgConnection, select: F) -> Result<Vec<i64>>
    where
        F: FnOnce(&[i64]) -> Vec<i64>,
    {
        ensure_table(conn).await?;
        let applied = applied_rows(conn).await?;
        self.check_applied(&applied)?;
        let applied: Vec<i64> = applied.iter().map(|row| row.version).collect();

        let mut done = Vec::new();
        for version in select(&applied) {
            let migration = self
                .find(version)
                .with_context(|| format!("applied migration {} is not registered", version))?;
            info!(version = migration.version, name = migration.name, "reverting migration");
            self.revert(conn, migration)
                .await
                .with_context(|| format!("revert of {} failed", migration.label()))?;
            done.push(version);
        }
        if done.is_empty() {
            info!("nothing to revert");
        }
        Ok(done)
    }

    /// Every applied row must be registered and match its checksum.
    fn check_applied(&self, applied: &[AppliedRow]) -> Result<()> {
        let mut unknown = Vec::new();
        let mut modified = Vec::new();
        for row in applied {
            match self.find(row.version) {
                None => unknown.push(format!("{}_{}", row.version, row.name)),
                Some(m) if !row.matches(m) => modified.push(m.label()),
                Some(_) => {}
            }
        }
        if !unknown.is_empty() {
            warn!(?unknown, "database has migrations this build does not know");
            anyhow::bail!("applied migrations missing from registry: {}", unknown.join(", "));
        }
        if !modified.is_empty() {
            warn!(?modified, "applied migrations differ from the embedded SQL");
            anyhow::bail!(
                "applied migrations were modified after being applied: {}",
                modified.join(", ")
            );
        }
        Ok(())
    }

    async fn apply(&mut self, conn: &mut PgConnection, migration: &Migration) -> Result<()> {
        let mut tx = conn.begin().await?;
        match migration.kind {
            Kind::Sql { up, .. } => {
                sqlx::raw_sql(up).execute(&mut *tx).await?;
            }
            Kind::Seed(task) => task.apply(&mut tx, &mut self.seed).await?,
        }
        sqlx::query("INSERT INTO schema_migrations (version, name, checksum) VALUES ($1, $2, $3)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(migration.checksum())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn revert(&mut self, conn: &mut PgConnection, migration: &Migration) -> Result<()> {
        let mut tx = conn.begin().await?;
        match migration.kind {
            Kind::Sql { down, .. } => {
                sqlx::raw_sql(down).execute(&mut *tx).await?;
            }
            Kind::Seed(task) => task.revert(&mut tx).await?,
        }
        sqlx::query("DELETE FROM schema_migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn ensure_table(conn: &mut PgConnection) -> Result<()> {
    sqlx::query(CREATE_TRACKING_TABLE)
        .execute(&mut *conn)
        .await
        .context("failed to create schema_migrations")?;
    sqlx::query(ADD_CHECKSUM_COLUMN)
        .execute(&mut *conn)
        .await
        .context("failed to upgrade schema_migrations")?;
    Ok(())
}

async fn applied_rows(conn: &mut PgConnection) -> Result<Vec<AppliedRow>> {
    let rows = sqlx::query_as::<_, AppliedRow>(
        "SELECT version, name, applied_at, checksum FROM schema_migrations ORDER BY version",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Take a connection out of the pool and acquire the migration lock on it.
/// The connection never returns to the pool, so a dropped run cannot leak
/// the lock to a later borrower.
async fn lock(db: &Database) -> Result<PgConnection> {
    let mut conn = db.pool().acquire().await?.detach();
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut conn)
        .await
        .context("failed to acquire migration lock")?;
    Ok(conn)
}

/// Release the lock and close the session.
async fn release(mut conn: PgConnection) {
    if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut conn)
        .await
    {
        warn!(error = %e, "failed to release migration lock");
    }
    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close migration connection");
    }
}
