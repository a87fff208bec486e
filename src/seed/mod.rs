//! # Seed — Baseline and Sample Data Migrations
//!
//! Seed tasks run as ordinary migrations (see [`crate::migrate`]) inside the
//! migration's transaction, after the schema they depend on is current.
//!
//! ## Tasks
//!
//! - [`SeedTask::ReferenceData`] — departments, their teams, skill catalog
//! - [`SeedTask::Employees`] — roster employees with random profiles and skills
//! - [`SeedTask::Projects`] — sample projects
//! - [`SeedTask::Assignments`] — random project staffing
//!
//! Parent rows are always looked up by natural key (department name, project
//! name), never by an assumed id, so seeds stay valid whatever the sequences
//! have reached.
//!
//! ## Destructive employee seed
//!
//! `Employees` clears `project_assignments`, `employee_skills`, `vacations`
//! and `employees` before inserting. Never run it against real staff data.
//!
//! ## Randomness
//!
//! Draws come from the [`SeedContext`] RNG. With `rng_seed` set the dataset is
//! reproducible; without it every run produces a different but structurally
//! valid dataset.

pub mod catalog;
pub mod roster;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use sqlx::PgConnection;
use tracing::{info, warn};

use crate::model::SkillLevel;
use roster::DepartmentTeams;

pub const DEFAULT_EMAIL_DOMAIN: &str = "peoplehub.local";

/// Seed configuration, the `[seed]` section of `peoplehub.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedOptions {
    /// Roster CSV replacing the embedded one.
    pub roster_csv: Option<PathBuf>,
    /// Fixed RNG seed for a reproducible dataset.
    pub rng_seed: Option<u64>,
    /// Domain of the synthetic employee emails.
    pub email_domain: String,
}

impl Default for SeedOptions {
    fn default() -> Self {
        SeedOptions {
            roster_csv: None,
            rng_seed: None,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

/// Options plus the RNG shared by every seed task of one runner.
pub struct SeedContext {
    pub options: SeedOptions,
    rng: StdRng,
}

impl SeedContext {
    pub fn new(options: SeedOptions) -> Self {
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SeedContext { options, rng }
    }
}

impl Default for SeedContext {
    fn default() -> Self {
        Self::new(SeedOptions::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedTask {
    ReferenceData,
    Employees,
    Projects,
    Assignments,
}

impl SeedTask {
    pub async fn apply(self, conn: &mut PgConnection, ctx: &mut SeedContext) -> Result<()> {
        match self {
            SeedTask::ReferenceData => seed_reference_data(conn).await,
            SeedTask::Employees => seed_employees(conn, ctx).await,
            SeedTask::Projects => seed_projects(conn).await,
            SeedTask::Assignments => seed_assignments(conn, ctx).await,
        }
    }

    pub async fn revert(self, conn: &mut PgConnection) -> Result<()> {
        match self {
            SeedTask::ReferenceData => revert_reference_data(conn).await,
            SeedTask::Employees => clear_employees(conn).await,
            SeedTask::Projects => revert_projects(conn).await,
            SeedTask::Assignments => revert_assignments(conn).await,
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse()
        .with_context(|| format!("invalid catalog date {:?}", value))
}

fn draw_count<R: Rng>(rng: &mut R, (min, max): (usize, usize), available: usize) -> usize {
    rng.gen_range(min..=max).min(available)
}

// ── Reference data ──────────────────────────────────────────────

async fn seed_reference_data(conn: &mut PgConnection) -> Result<()> {
    for &(name, description) in catalog::DEPARTMENTS {
        sqlx::query("INSERT INTO departments (name, description) VALUES ($1, $2)")
            .bind(name)
            .bind(description)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to insert department {}", name))?;
    }

    for &(department, team, description) in catalog::TEAMS {
        let department_id: Option<i32> =
            sqlx::query_scalar("SELECT id FROM departments WHERE name = $1")
                .bind(department)
                .fetch_optional(&mut *conn)
                .await?;
        let department_id = department_id
            .with_context(|| format!("department {} not found for team {}", department, team))?;
        sqlx::query("INSERT INTO teams (department_id, name, description) VALUES ($1, $2, $3)")
            .bind(department_id)
            .bind(team)
            .bind(description)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to insert team {}", team))?;
    }

    for &(name, category, description) in catalog::SKILLS {
        sqlx::query("INSERT INTO skills (name, category, description) VALUES ($1, $2, $3)")
            .bind(name)
            .bind(category)
            .bind(description)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to insert skill {}", name))?;
    }

    info!(
        departments = catalog::DEPARTMENTS.len(),
        teams = catalog::TEAMS.len(),
        skills = catalog::SKILLS.len(),
        "seeded reference data"
    );
    Ok(())
}

async fn revert_reference_data(conn: &mut PgConnection) -> Result<()> {
    let skills: Vec<String> = catalog::SKILLS.iter().map(|(n, _, _)| n.to_string()).collect();
    sqlx::query("DELETE FROM skills WHERE name = ANY($1)")
        .bind(&skills)
        .execute(&mut *conn)
        .await?;

    // Teams go with their department.
    let departments: Vec<String> = catalog::DEPARTMENTS
        .iter()
        .map(|(n, _)| n.to_string())
        .collect();
    sqlx::query("DELETE FROM departments WHERE name = ANY($1)")
        .bind(&departments)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ── Employees ───────────────────────────────────────────────────

async fn clear_employees(conn: &mut PgConnection) -> Result<()> {
    for table in ["project_assignments", "employee_skills", "vacations", "employees"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to clear {}", table))?;
    }
    Ok(())
}

async fn load_department_teams(conn: &mut PgConnection) -> Result<Vec<DepartmentTeams>> {
    let departments: Vec<i32> = sqlx::query_scalar("SELECT id FROM departments ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;
    let teams: Vec<(i32, i32)> =
        sqlx::query_as("SELECT department_id, id FROM teams ORDER BY department_id, id")
            .fetch_all(&mut *conn)
            .await?;

    let mut by_department: BTreeMap<i32, Vec<i32>> =
        departments.into_iter().map(|id| (id, Vec::new())).collect();
    for (department_id, team_id) in teams {
        by_department.entry(department_id).or_default().push(team_id);
    }
    Ok(by_department
        .into_iter()
        .map(|(department_id, team_ids)| DepartmentTeams {
            department_id,
            team_ids,
        })
        .collect())
}

async fn seed_employees(conn: &mut PgConnection, ctx: &mut SeedContext) -> Result<()> {
    let entries = roster::load_roster(ctx.options.roster_csv.as_deref())?;
    let hire_from = parse_date(catalog::HIRE_DATE_FROM)?;
    let hire_to = parse_date(catalog::HIRE_DATE_TO)?;

    clear_employees(conn).await?;

    let departments = load_department_teams(conn).await?;
    if departments.is_empty() {
        warn!("no departments found; seeded employees will have no department");
    }
    let skill_ids: Vec<i32> = sqlx::query_scalar("SELECT id FROM skills ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    let mut skill_rows = 0usize;
    for entry in &entries {
        let profile = roster::draw_profile(&mut ctx.rng, &departments, hire_from, hire_to);
        let email = roster::synthetic_email(
            &entry.first_name,
            &entry.last_name,
            entry.id,
            &ctx.options.email_domain,
        );

        let employee_id: i32 = sqlx::query_scalar(
            "INSERT INTO employees
                (first_name, last_name, email, position, department_id, team_id,
                 english_level, hire_date, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active')
             RETURNING id",
        )
        .bind(&entry.first_name)
        .bind(&entry.last_name)
        .bind(&email)
        .bind(profile.position)
        .bind(profile.department_id)
        .bind(profile.team_id)
        .bind(profile.english_level)
        .bind(profile.hire_date)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to insert employee {} ({})", entry.id, email))?;

        let count = draw_count(&mut ctx.rng, catalog::SKILLS_PER_EMPLOYEE, skill_ids.len());
        let chosen: Vec<i32> = skill_ids
            .choose_multiple(&mut ctx.rng, count)
            .copied()
            .collect();
        for skill_id in chosen {
            let level = SkillLevel::ALL
                .choose(&mut ctx.rng)
                .copied()
                .unwrap_or(SkillLevel::One);
            let years: i32 = ctx.rng.gen_range(0..=10);
            sqlx::query(
                "INSERT INTO employee_skills (employee_id, skill_id, level, years_of_experience)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(employee_id)
            .bind(skill_id)
            .bind(level)
            .bind(years)
            .execute(&mut *conn)
            .await?;
            skill_rows += 1;
        }
    }

    info!(
        employees = entries.len(),
        employee_skills = skill_rows,
        "seeded employees"
    );
    Ok(())
}

// ── Projects ────────────────────────────────────────────────────

fn sample_project_names() -> Vec<String> {
    catalog::PROJECTS.iter().map(|p| p.name.to_string()).collect()
}

async fn seed_projects(conn: &mut PgConnection) -> Result<()> {
    for project in catalog::PROJECTS {
        let start_date = parse_date(project.start_date)?;
        let end_date = project.end_date.map(parse_date).transpose()?;
        sqlx::query(
            "INSERT INTO projects
                (name, description, category, b2b_client, status, priority,
                 start_date, end_date, progress)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(project.name)
        .bind(project.description)
        .bind(project.category)
        .bind(project.b2b_client)
        .bind(project.status)
        .bind(project.priority)
        .bind(start_date)
        .bind(end_date)
        .bind(project.progress)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("failed to insert project {}", project.name))?;
    }
    info!(projects = catalog::PROJECTS.len(), "seeded projects");
    Ok(())
}

async fn revert_projects(conn: &mut PgConnection) -> Result<()> {
    sqlx::query("DELETE FROM projects WHERE name = ANY($1)")
        .bind(sample_project_names())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ── Assignments ─────────────────────────────────────────────────

async fn seed_assignments(conn: &mut PgConnection, ctx: &mut SeedContext) -> Result<()> {
    let employee_ids: Vec<i32> =
        sqlx::query_scalar("SELECT id FROM employees WHERE deleted_at IS NULL ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
    if employee_ids.is_empty() {
        warn!("no employees found; skipping project assignments");
        return Ok(());
    }

    let mut total = 0usize;
    for project in catalog::PROJECTS {
        let row: Option<(i32, Option<NaiveDate>)> =
            sqlx::query_as("SELECT id, start_date FROM projects WHERE name = $1")
                .bind(project.name)
                .fetch_optional(&mut *conn)
                .await?;
        let Some((project_id, start_date)) = row else {
            warn!(project = project.name, "sample project missing; skipping");
            continue;
        };

        let count = draw_count(&mut ctx.rng, catalog::MEMBERS_PER_PROJECT, employee_ids.len());
        let members: Vec<i32> = employee_ids
            .choose_multiple(&mut ctx.rng, count)
            .copied()
            .collect();
        for employee_id in members {
            let role = catalog::ASSIGNMENT_ROLES
                .choose(&mut ctx.rng)
                .copied()
                .unwrap_or("Developer");
            sqlx::query(
                "INSERT INTO project_assignments (project_id, employee_id, role, start_date, is_active)
                 VALUES ($1, $2, $3, $4, TRUE)",
            )
            .bind(project_id)
            .bind(employee_id)
            .bind(role)
            .bind(start_date)
            .execute(&mut *conn)
            .await
            .with_context(|| {
                format!(
                    "failed to assign employee {} to project {}",
                    employee_id, project.name
                )
            })?;
            total += 1;
        }
    }

    info!(assignments = total, "seeded project assignments");
    Ok(())
}

async fn revert_assignments(conn: &mut PgConnection) -> Result<()> {
    sqlx::query(
        "DELETE FROM project_assignments
         WHERE project_id IN (SELECT id FROM projects WHERE name = ANY($1))",
    )
    .bind(sample_project_names())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
