//! # Database — PostgreSQL Storage Layer
//!
//! Async repository operations over the HR schema via `sqlx::PgPool`.
//!
//! ## Schema
//!
//! The tables are created by the versioned migrations in `migrations/` (see
//! [`crate::migrate`]). Row types live in [`crate::model`].
//!
//! ## Module Structure
//!
//! Operations are split into submodules by table group:
//!
//! - [`departments`] — departments and department heads
//! - [`teams`] — teams and team leads
//! - [`employees`] — employee CRUD, soft delete, reporting lines
//! - [`skills`] — skill catalog and per-employee proficiency
//! - [`vacations`] — leave requests, review workflow, yearly balances
//! - [`projects`] — projects, paginated listing, assignments
//! - [`users`] — login accounts and their employee link
//!
//! Rules the schema cannot express are enforced here: the manager forest is
//! kept acyclic by a path lookup on write, and vacation status changes go
//! through [`crate::model::VacationStatus::can_transition_to`].

mod departments;
mod employees;
mod projects;
mod skills;
mod teams;
mod users;
mod vacations;

use anyhow::Result;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::model::{EmployeeStatus, ProjectStatus};

/// Default pool size; the CLI and seed runs are sequential.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// ── Filters ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EmployeeFilter {
    pub search: Option<String>,
    pub department_id: Option<i32>,
    pub team_id: Option<i32>,
    pub status: Option<EmployeeStatus>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl EmployeeFilter {
    /// Whitelist sort column to prevent SQL injection.
    /// Unknown values default to "last_name".
    pub(crate) fn safe_sort_column(&self) -> &str {
        match self.sort_by.as_deref() {
            Some("first_name") => "first_name",
            Some("email") => "email",
            Some("hire_date") => "hire_date",
            Some("position") => "position",
            Some("id") => "id",
            _ => "last_name",
        }
    }

    /// Only "desc"/"DESC" flips the order; everything else is "ASC".
    pub(crate) fn safe_sort_dir(&self) -> &str {
        match self.sort_dir.as_deref() {
            Some("desc") | Some("DESC") => "DESC",
            _ => "ASC",
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProjectFilter {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// Wrap a user-supplied search term for `ILIKE`, escaping the wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Row offset of a 1-based `page`. Fails when the offset does not fit in a
/// `BIGINT`.
pub(crate) fn page_offset(page: i64, limit: i64) -> Result<i64> {
    (page.max(1) - 1)
        .checked_mul(limit)
        .ok_or_else(|| anyhow::anyhow!("page {} is out of range for limit {}", page, limit))
}

// ── Database struct and connection ──────────────────────────────

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect with an explicit pool size.
    ///
    /// Manually parses the URL so percent-encoded credentials are decoded once
    /// and passed through untouched.
    pub async fn connect_with(database_url: &str, max_connections: u32) -> Result<Self> {
        let url = url::Url::parse(database_url)?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(opts)
            .await?;
        Ok(Database { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ── Tests ───────────────────────────────────────────────────────
