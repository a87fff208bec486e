//! CSV employee roster and the per-employee random profile.
//!
//! The roster carries only `id,first_name,last_name`. Everything else about a
//! seeded employee is drawn from the catalogs with the caller's RNG, so a
//! fixed seed gives a reproducible dataset and an entropy seed a fresh one.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::catalog;
use crate::model::EnglishLevel;

/// Roster shipped with the binary.
pub const DEFAULT_ROSTER: &str = include_str!("../../seeds/employees.csv");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    pub id: u32,
    pub first_name: String,
    pub last_name: String,
}

/// Parse roster CSV text. Row ids must be unique: they disambiguate the
/// synthetic emails of employees who share a name.
pub fn parse_roster(data: &str) -> Result<Vec<RosterEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    for (line, record) in reader.deserialize::<RosterEntry>().enumerate() {
        let entry = record.with_context(|| format!("invalid roster row {}", line + 2))?;
        if !seen.insert(entry.id) {
            anyhow::bail!("duplicate roster id {}", entry.id);
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Load the roster from `path`, or the embedded default when `None`.
pub fn load_roster(path: Option<&Path>) -> Result<Vec<RosterEntry>> {
    match path {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read roster {}", path.display()))?;
            parse_roster(&data)
        }
        None => parse_roster(DEFAULT_ROSTER),
    }
}

/// Lowercase a name part and drop all whitespace.
fn normalize_name(part: &str) -> String {
    part.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// `first.last` with each part lowercased and whitespace-stripped.
pub fn email_local_part(first_name: &str, last_name: &str) -> String {
    format!("{}.{}", normalize_name(first_name), normalize_name(last_name))
}

/// Synthetic work email `first.last.<id>@domain`. The numeric id keeps two
/// employees with the same name apart.
pub fn synthetic_email(first_name: &str, last_name: &str, id: u32, domain: &str) -> String {
    format!("{}.{}@{}", email_local_part(first_name, last_name), id, domain)
}

/// A department and the ids of its teams.
#[derive(Debug, Clone)]
pub struct DepartmentTeams {
    pub department_id: i32,
    pub team_ids: Vec<i32>,
}

/// Randomly drawn attributes of one seeded employee.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProfile {
    pub position: &'static str,
    pub english_level: EnglishLevel,
    pub hire_date: NaiveDate,
    pub department_id: Option<i32>,
    pub team_id: Option<i32>,
}

/// Uniform date in `[from, to]`, both inclusive.
pub fn random_date<R: Rng>(rng: &mut R, from: NaiveDate, to: NaiveDate) -> NaiveDate {
    let span = (to - from).num_days().max(0);
    from + Duration::days(rng.gen_range(0..=span))
}

/// Draw a profile: position, English level and hire date uniformly from the
/// catalogs; a random department, then a random team of that department or
/// none when it has no teams.
pub fn draw_profile<R: Rng>(
    rng: &mut R,
    departments: &[DepartmentTeams],
    hire_from: NaiveDate,
    hire_to: NaiveDate,
) -> EmployeeProfile {
    let position = catalog::POSITIONS
        .choose(rng)
        .copied()
        .unwrap_or("Employee");
    let english_level = EnglishLevel::ALL
        .choose(rng)
        .copied()
        .unwrap_or(EnglishLevel::B1);
    let hire_date = random_date(rng, hire_from, hire_to);
    let department = departments.choose(rng);
    let team_id = department.and_then(|d| d.team_ids.choose(rng).copied());

    EmployeeProfile {
        position,
        english_level,
        hire_date,
        department_id: department.map(|d| d.department_id),
        team_id,
    }
}
