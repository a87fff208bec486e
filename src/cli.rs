//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Each `run_*`
//! function owns a tokio runtime for the duration of one subcommand.
//! Tables go to stderr, machine-readable JSON to stdout.

use anyhow::Result;
use chrono::{Datelike, Utc};
use peoplehub::migrate::{MigrationState, Migrator};
use peoplehub::{schema, Database, ProjectClient, ProjectFilters, Settings};
use tracing::info;

use super::{Cli, EmployeesAction, MigrateAction, ProjectsAction, SchemaAction};

fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load(cli.config.as_deref())
}

fn connect(rt: &tokio::runtime::Runtime, cli: &Cli, settings: &Settings) -> Result<Database> {
    let database_url = cli.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })?;
    rt.block_on(Database::connect_with(
        database_url,
        settings.database.max_connections,
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Migrations ──────────────────────────────────────────────────

pub fn run_migrate(cli: &Cli, action: &MigrateAction) -> Result<()> {
    let settings = load_settings(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let database = connect(&rt, cli, &settings)?;
    let mut migrator = Migrator::new(settings.seed.clone());

    match action {
        MigrateAction::Up { target } => {
            let applied = rt.block_on(migrator.up(&database, *target))?;
            info!(count = applied.len(), "migrations applied");
            for version in applied {
                eprintln!("applied {}", version);
            }
        }
        MigrateAction::Down { steps, to } => {
            let reverted = match to {
                Some(version) => rt.block_on(migrator.down_to(&database, *version))?,
                None => rt.block_on(migrator.down(&database, steps.unwrap_or(1)))?,
            };
            info!(count = reverted.len(), "migrations reverted");
            for version in reverted {
                eprintln!("reverted {}", version);
            }
        }
        MigrateAction::Status { json } => {
            let status = rt.block_on(migrator.status(&database))?;
            if *json {
                return print_json(&status);
            }
            eprintln!("{:<16} {:<32} {:<6} {:<26}", "VERSION", "NAME", "KIND", "APPLIED");
            eprintln!("{}", "-".repeat(82));
            for s in &status {
                let applied = match &s.state {
                    MigrationState::Pending => "pending".to_string(),
                    MigrationState::Applied(at) => at.to_rfc3339(),
                    MigrationState::Unknown(at) => format!("{} (unknown)", at.to_rfc3339()),
                    MigrationState::Modified(at) => format!("{} (modified)", at.to_rfc3339()),
                };
                let kind = if s.seed { "seed" } else { "sql" };
                eprintln!("{:<16} {:<32} {:<6} {:<26}", s.version, s.name, kind, applied);
            }
        }
    }
    Ok(())
}

// ── Schema ──────────────────────────────────────────────────────

pub fn run_schema(cli: &Cli, action: &SchemaAction) -> Result<()> {
    let settings = load_settings(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let database = connect(&rt, cli, &settings)?;
    match action {
        SchemaAction::Dump => {
            let snapshot = rt.block_on(schema::capture(database.pool()))?;
            print_json(&snapshot)
        }
    }
}

// ── Projects ────────────────────────────────────────────────────

pub fn run_projects(cli: &Cli, action: &ProjectsAction) -> Result<()> {
    let api_url = cli.api_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("PEOPLEHUB_API_URL is required (set via --api-url or env)")
    })?;
    let client = ProjectClient::new(api_url)?;
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        ProjectsAction::List {
            search,
            status,
            limit,
        } => {
            let filters = ProjectFilters {
                search: search.clone(),
                status: *status,
                page: None,
                limit: *limit,
            };
            let projects = rt.block_on(client.get_all(&filters))?;
            if projects.is_empty() {
                eprintln!("No projects found");
                return Ok(());
            }
            eprintln!(
                "{:<6} {:<30} {:<10} {:<8} {:>8}",
                "ID", "NAME", "STATUS", "PRIORITY", "PROGRESS"
            );
            eprintln!("{}", "-".repeat(66));
            for p in &projects {
                eprintln!(
                    "{:<6} {:<30} {:<10} {:<8} {:>7}%",
                    p.id, p.name, p.status, p.priority, p.progress
                );
            }
        }
        ProjectsAction::Page {
            search,
            status,
            page,
            limit,
        } => {
            let filters = ProjectFilters {
                search: search.clone(),
                status: *status,
                page: Some(*page),
                limit: Some(*limit),
            };
            let page = rt.block_on(client.get_paginated(&filters))?;
            print_json(&page)?;
        }
        ProjectsAction::Show { id } => {
            let project = rt.block_on(client.get_by_id(*id))?;
            print_json(&project)?;
        }
    }
    Ok(())
}

// ── Employees ───────────────────────────────────────────────────

pub fn run_employees(cli: &Cli, action: &EmployeesAction) -> Result<()> {
    let settings = load_settings(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let database = connect(&rt, cli, &settings)?;

    match action {
        EmployeesAction::SetManager { employee, manager } => {
            rt.block_on(database.set_manager(*employee, *manager))?;
            match manager {
                Some(m) => eprintln!("employee {} now reports to {}", employee, m),
                None => eprintln!("employee {} has no manager", employee),
            }
        }
        EmployeesAction::Chain { id } => {
            let employee = rt
                .block_on(database.get_employee(*id))?
                .ok_or_else(|| anyhow::anyhow!("employee {} not found", id))?;
            let chain = rt.block_on(database.get_reporting_chain(*id))?;
            eprintln!("{} ({})", employee.full_name(), employee.id);
            for (depth, manager) in chain.iter().enumerate() {
                eprintln!(
                    "{}└ {} ({}){}",
                    "  ".repeat(depth),
                    manager.full_name(),
                    manager.id,
                    manager
                        .position
                        .as_deref()
                        .map(|p| format!(", {}", p))
                        .unwrap_or_default()
                );
            }
        }
        EmployeesAction::Balance { id, year } => {
            let year = year.unwrap_or_else(|| Utc::now().year());
            let balance = rt.block_on(database.get_leave_balance(*id, year))?;
            eprintln!("Leave balance for employee {} in {}:", id, year);
            eprintln!(
                "  Vacation:    {} of {} used, {} remaining",
                balance.vacation_used,
                balance.vacation_allowance,
                balance.vacation_remaining()
            );
            eprintln!(
                "  Sick leave:  {} of {} used, {} remaining",
                balance.sick_leave_used,
                balance.sick_leave_allowance,
                balance.sick_leave_remaining()
            );
        }
    }
    Ok(())
}
