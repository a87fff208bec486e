//! # Main — CLI Entry Point
//!
//! Routes subcommands to the migration runner, schema introspection, the
//! project API client and the org-chart repository operations.
//!
//! ## Subcommands
//!
//! - `migrate up|down|status`: apply, revert or list schema and seed migrations.
//! - `schema dump`: print the live schema snapshot as JSON.
//! - `projects list|page|show`: query the REST API through `ProjectClient`.
//! - `employees set-manager|chain|balance`: reporting lines and leave balance.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: PostgreSQL connection.
//! - `--api-url` / `PEOPLEHUB_API_URL`: REST API root for `projects`.
//! - `--config` / `PEOPLEHUB_CONFIG`: settings file (default `./peoplehub.toml`).
//!
//! `LOG_FORMAT=json` switches logs to JSON; `RUST_LOG` sets the filter.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use peoplehub::model::ProjectStatus;

#[derive(Parser)]
#[command(name = "peoplehub", about = "HR database migrations, seeds and project queries")]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Root URL of the HR REST API, e.g. http://localhost:3000/api
    #[arg(long, env = "PEOPLEHUB_API_URL")]
    api_url: Option<String>,

    /// Settings file (defaults to ./peoplehub.toml when present)
    #[arg(long, env = "PEOPLEHUB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply, revert or inspect migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Inspect the live database schema
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
    /// Query projects through the REST API
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
    /// Org chart and leave operations
    Employees {
        #[command(subcommand)]
        action: EmployeesAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply pending migrations
    Up {
        /// Stop after this version (inclusive)
        #[arg(long)]
        target: Option<i64>,
    },
    /// Revert applied migrations, newest first
    Down {
        /// Number of migrations to revert (default 1)
        #[arg(long, conflicts_with = "to")]
        steps: Option<usize>,
        /// Revert everything newer than this version (0 reverts all)
        #[arg(long)]
        to: Option<i64>,
    },
    /// List migrations and whether they are applied
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SchemaAction {
    /// Print tables, columns, constraints, indexes and enum types as JSON
    Dump,
}

#[derive(Subcommand)]
enum ProjectsAction {
    /// List projects (GET /projects)
    List {
        /// Free-text search on name, description and client
        #[arg(long)]
        search: Option<String>,
        /// Filter by status (planning, active, on_hold, completed, cancelled)
        #[arg(long)]
        status: Option<ProjectStatus>,
        /// Maximum number of projects
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Fetch one page of projects with pagination metadata
    Page {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Show a single project
    Show {
        /// Project id
        id: i32,
    },
}

#[derive(Subcommand)]
enum EmployeesAction {
    /// Set or clear an employee's manager
    SetManager {
        /// Employee id
        #[arg(long)]
        employee: i32,
        /// Manager id (omit to clear)
        #[arg(long)]
        manager: Option<i32>,
    },
    /// Print the chain of managers above an employee
    Chain {
        /// Employee id
        id: i32,
    },
    /// Print the yearly leave balance of an employee
    Balance {
        /// Employee id
        id: i32,
        /// Calendar year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for log shipping, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Migrate { action } => cli::run_migrate(&cli, action),
        Commands::Schema { action } => cli::run_schema(&cli, action),
        Commands::Projects { action } => cli::run_projects(&cli, action),
        Commands::Employees { action } => cli::run_employees(&cli, action),
    }
}
