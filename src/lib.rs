pub mod client;
pub mod config;
pub mod db;
pub mod migrate;
pub mod model;
pub mod schema;
pub mod seed;

pub use client::{ProjectClient, ProjectFilters};
pub use config::Settings;
pub use db::Database;
pub use migrate::Migrator;
