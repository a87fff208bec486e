//! # Migrate — Ordered, Reversible Schema and Seed Migrations
//!
//! The registry is the ordered list of every migration the application
//! knows. Each entry carries a 14-digit timestamp version, a name and either
//! an SQL `up`/`down` pair (embedded from `migrations/` at compile time) or a
//! [`SeedTask`] whose `apply`/`revert` are Rust routines.
//!
//! ## Rules
//!
//! - Versions are strictly increasing in registry order; [`validate`] checks
//!   this before every run.
//! - `down` undoes `up` exactly, in reverse order of creation.
//! - Seed migrations come after all schema migrations they depend on.
//! - An SQL migration's `up` text must not change once applied; the runner
//!   records its SHA-384 [`Migration::checksum`] and refuses to continue on a
//!   mismatch.
//!
//! The runner that applies these against a database lives in [`runner`].

pub mod runner;

use anyhow::Result;
use sha2::{Digest, Sha384};

use crate::seed::SeedTask;

pub use runner::{MigrationState, MigrationStatus, Migrator};

/// What a migration executes.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Sql {
        up: &'static str,
        down: &'static str,
    },
    Seed(SeedTask),
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub kind: Kind,
}

impl Migration {
    pub fn is_seed(&self) -> bool {
        matches!(self.kind, Kind::Seed(_))
    }

    /// `<version>_<name>`, the file stem of an SQL migration.
    pub fn label(&self) -> String {
        format!("{}_{}", self.version, self.name)
    }

    /// SHA-384 of the `up` SQL. Seed migrations have none.
    pub fn checksum(&self) -> Option<Vec<u8>> {
        match self.kind {
            Kind::Sql { up, .. } => Some(Sha384::digest(up.as_bytes()).to_vec()),
            Kind::Seed(_) => None,
        }
    }
}

macro_rules! sql_migration {
    ($version:literal, $name:literal) => {
        Migration {
            version: $version,
            name: $name,
            kind: Kind::Sql {
                up: include_str!(concat!(
                    "../../migrations/",
                    stringify!($version),
                    "_",
                    $name,
                    ".up.sql"
                )),
                down: include_str!(concat!(
                    "../../migrations/",
                    stringify!($version),
                    "_",
                    $name,
                    ".down.sql"
                )),
            },
        }
    };
}

const fn seed_migration(version: i64, name: &'static str, task: SeedTask) -> Migration {
    Migration {
        version,
        name,
        kind: Kind::Seed(task),
    }
}

static REGISTRY: &[Migration] = &[
    sql_migration!(20240115100000, "create_users"),
    sql_migration!(20240115100100, "create_departments"),
    sql_migration!(20240115100200, "create_employees"),
    sql_migration!(20240115100300, "create_teams"),
    sql_migration!(20240115100400, "add_department_head"),
    sql_migration!(20240115100500, "create_skills"),
    sql_migration!(20240115100600, "create_employee_skills"),
    sql_migration!(20240115100700, "create_vacations"),
    sql_migration!(20240115100800, "create_projects"),
    sql_migration!(20240115100900, "create_project_assignments"),
    sql_migration!(20240201090000, "add_user_security_fields"),
    sql_migration!(20240201090100, "extend_employee_profile"),
    sql_migration!(20240201090200, "add_vacation_review_fields"),
    seed_migration(20240301120000, "seed_reference_data", SeedTask::ReferenceData),
    seed_migration(20240301120100, "seed_employees", SeedTask::Employees),
    seed_migration(20240301120200, "seed_projects", SeedTask::Projects),
    seed_migration(20240301120300, "seed_project_assignments", SeedTask::Assignments),
];

/// Every registered migration, in version order.
pub fn registry() -> &'static [Migration] {
    REGISTRY
}

/// Only the schema (SQL) migrations.
pub fn schema_migrations() -> impl Iterator<Item = &'static Migration> {
    REGISTRY.iter().filter(|m| !m.is_seed())
}

/// Check that versions are 14-digit timestamps, strictly increasing.
pub fn validate(migrations: &[Migration]) -> Result<()> {
    for m in migrations {
        if !(10_000_000_000_000..100_000_000_000_000).contains(&m.version) {
            anyhow::bail!("migration {} has a malformed version", m.label());
        }
    }
    for pair in migrations.windows(2) {
        if pair[1].version <= pair[0].version {
            anyhow::bail!(
                "migration {} is not ordered after {}",
                pair[1].label(),
                pair[0].label()
            );
        }
    }
    Ok(())
}

/// Find a registered migration by version.
pub fn find(version: i64) -> Option<&'static Migration> {
    REGISTRY.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_valid() {
        validate(registry()).unwrap();
    }

    #[test]
    fn validate_rejects_out_of_order_and_duplicates() {
        let a = seed_migration(20240101000000, "a", SeedTask::Projects);
        let b = seed_migration(20230101000000, "b", SeedTask::Projects);
        assert!(validate(&[a, b]).is_err());
        assert!(validate(&[a, a]).is_err());
        assert!(validate(&[b, a]).is_ok());
    }

    #[test]
    fn validate_rejects_short_versions() {
        let m = seed_migration(2024, "short", SeedTask::Projects);
        let err = validate(&[m]).unwrap_err();
        assert!(err.to_string().contains("malformed version"));
    }

    #[test]
    fn seeds_follow_every_schema_migration() {
        let last_schema = schema_migrations().map(|m| m.version).max().unwrap();
        for m in registry().iter().filter(|m| m.is_seed()) {
            assert!(m.version > last_schema, "{} runs before the schema", m.label());
        }
    }

    #[test]
    fn every_sql_migration_has_both_directions() {
        for m in schema_migrations() {
            match m.kind {
                Kind::Sql { up, down } => {
                    assert!(!up.trim().is_empty(), "{} has empty up", m.label());
                    assert!(!down.trim().is_empty(), "{} has empty down", m.label());
                }
                Kind::Seed(_) => unreachable!(),
            }
        }
    }

    #[test]
    fn down_drops_what_up_creates() {
        for m in schema_migrations() {
            let Kind::Sql { up, down } = m.kind else { continue };
            for line in up.lines() {
                let line = line.trim();
                let created = line
                    .strip_prefix("CREATE TABLE ")
                    .or_else(|| line.strip_prefix("CREATE TYPE "));
                if let Some(rest) = created {
                    let object = rest.split_whitespace().next().unwrap();
                    assert!(
                        down.contains(object),
                        "{} creates {} but down never mentions it",
                        m.label(),
                        object
                    );
                }
            }
        }
    }

    #[test]
    fn checksum_covers_sql_up_only() {
        let users = find(20240115100000).unwrap();
        let sum = users.checksum().unwrap();
        assert_eq!(sum.len(), 48);
        assert_eq!(users.checksum(), Some(sum.clone()));
        assert_ne!(find(20240115100100).unwrap().checksum(), Some(sum));

        let edited = Migration {
            kind: Kind::Sql {
                up: "CREATE TABLE users (id SERIAL PRIMARY KEY);",
                down: "DROP TABLE users;",
            },
            ..*users
        };
        assert_ne!(edited.checksum(), users.checksum());

        for m in registry().iter().filter(|m| m.is_seed()) {
            assert!(m.checksum().is_none(), "{} has a checksum", m.label());
        }
    }

    #[test]
    fn find_by_version() {
        assert_eq!(find(20240115100200).map(|m| m.name), Some("create_employees"));
        assert!(find(1).is_none());
    }
}
