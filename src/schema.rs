//! # Schema — Live Catalog Snapshots
//!
//! Captures the shape of the `public` schema (tables, columns, constraints,
//! indexes, enum types) so two points in time can be compared. Migration
//! tests snapshot before `up`, run `up` then `down`, and require an empty
//! [`SchemaSnapshot::diff`]. The `schema dump` command prints a snapshot as
//! JSON.
//!
//! Constraint and index definitions come from `pg_get_constraintdef` and
//! `pg_indexes.indexdef`, so a diff also catches changed `ON DELETE` rules,
//! partial index predicates and check expressions, not just missing names.
//! The `schema_migrations` tracking table is excluded.

use std::collections::BTreeMap;
use std::fmt::Debug;

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;

const TRACKING_TABLE: &str = "schema_migrations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSnapshot {
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub columns: BTreeMap<String, ColumnSnapshot>,
    /// Constraint name → definition.
    pub constraints: BTreeMap<String, String>,
    /// Index name → `CREATE INDEX` statement.
    pub indexes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeMap<String, TableSnapshot>,
    /// Enum type → labels in sort order.
    pub enums: BTreeMap<String, Vec<String>>,
}

impl SchemaSnapshot {
    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.get(name)
    }

    pub fn has_index(&self, table: &str, index: &str) -> bool {
        self.table(table)
            .map_or(false, |t| t.indexes.contains_key(index))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.enums.is_empty()
    }

    /// Human-readable differences going from `self` to `other`. Empty when
    /// the two schemas are identical.
    pub fn diff(&self, other: &SchemaSnapshot) -> Vec<String> {
        let mut out = Vec::new();
        diff_maps("enum", "", &self.enums, &other.enums, &mut out);

        for (name, table) in &self.tables {
            match other.tables.get(name) {
                None => out.push(format!("table {} removed", name)),
                Some(after) => {
                    let scope = format!("{}.", name);
                    diff_maps("column", &scope, &table.columns, &after.columns, &mut out);
                    diff_maps(
                        "constraint",
                        &scope,
                        &table.constraints,
                        &after.constraints,
                        &mut out,
                    );
                    diff_maps("index", &scope, &table.indexes, &after.indexes, &mut out);
                }
            }
        }
        for name in other.tables.keys() {
            if !self.tables.contains_key(name) {
                out.push(format!("table {} added", name));
            }
        }
        out
    }
}

fn diff_maps<V: PartialEq + Debug>(
    kind: &str,
    scope: &str,
    before: &BTreeMap<String, V>,
    after: &BTreeMap<String, V>,
    out: &mut Vec<String>,
) {
    for (key, old) in before {
        match after.get(key) {
            None => out.push(format!("{} {}{} removed", kind, scope, key)),
            Some(new) if new != old => out.push(format!(
                "{} {}{} changed: {:?} -> {:?}",
                kind, scope, key, old, new
            )),
            Some(_) => {}
        }
    }
    for key in after.keys() {
        if !before.contains_key(key) {
            out.push(format!("{} {}{} added", kind, scope, key));
        }
    }
}

/// Snapshot the `public` schema.
pub async fn capture(pool: &PgPool) -> Result<SchemaSnapshot> {
    let mut snapshot = SchemaSnapshot::default();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE' AND table_name <> $1",
    )
    .bind(TRACKING_TABLE)
    .fetch_all(pool)
    .await?;
    for table in tables {
        snapshot.tables.insert(table, TableSnapshot::default());
    }

    let columns: Vec<(String, String, String, bool, Option<String>)> = sqlx::query_as(
        "SELECT table_name::text, column_name::text,
                CASE WHEN data_type = 'USER-DEFINED' THEN udt_name::text ELSE data_type::text END,
                is_nullable = 'YES',
                column_default::text
         FROM information_schema.columns
         WHERE table_schema = 'public' AND table_name <> $1",
    )
    .bind(TRACKING_TABLE)
    .fetch_all(pool)
    .await?;
    for (table, column, data_type, nullable, default) in columns {
        // Views also appear in information_schema.columns.
        if let Some(t) = snapshot.tables.get_mut(&table) {
            t.columns.insert(
                column,
                ColumnSnapshot {
                    data_type,
                    nullable,
                    default,
                },
            );
        }
    }

    let constraints: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT rel.relname::text, con.conname::text, pg_get_constraintdef(con.oid)
         FROM pg_constraint con
         JOIN pg_class rel ON rel.oid = con.conrelid
         JOIN pg_namespace ns ON ns.oid = rel.relnamespace
         WHERE ns.nspname = 'public' AND rel.relname <> $1",
    )
    .bind(TRACKING_TABLE)
    .fetch_all(pool)
    .await?;
    for (table, name, definition) in constraints {
        if let Some(t) = snapshot.tables.get_mut(&table) {
            t.constraints.insert(name, definition);
        }
    }

    let indexes: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT tablename::text, indexname::text, indexdef
         FROM pg_indexes
         WHERE schemaname = 'public' AND tablename <> $1",
    )
    .bind(TRACKING_TABLE)
    .fetch_all(pool)
    .await?;
    for (table, name, definition) in indexes {
        if let Some(t) = snapshot.tables.get_mut(&table) {
            t.indexes.insert(name, definition);
        }
    }

    let labels: Vec<(String, String)> = sqlx::query_as(
        "SELECT t.typname::text, e.enumlabel::text
         FROM pg_type t
         JOIN pg_enum e ON e.enumtypid = t.oid
         JOIN pg_namespace ns ON ns.oid = t.typnamespace
         WHERE ns.nspname = 'public'
         ORDER BY t.typname, e.enumsortorder",
    )
    .fetch_all(pool)
    .await?;
    for (type_name, label) in labels {
        snapshot.enums.entry(type_name).or_default().push(label);
    }

    Ok(snapshot)
}
