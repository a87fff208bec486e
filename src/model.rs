//! # Model — Domain Types Shared by the Repository Layer and the API Client
//!
//! Row structs map 1:1 onto the tables created by `migrations/`. Enumerations
//! map onto the named PostgreSQL `ENUM` types; their value sets must stay in
//! sync with the `CREATE TYPE` statements or existing rows stop decoding.
//!
//! Rows serialize with camelCase keys, matching the REST payloads the web
//! client consumes (`b2bClient`, `totalPages`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Declare a Rust enum backed by a PostgreSQL `ENUM` type.
///
/// Each variant names its exact database label, which is also its JSON form
/// and the string accepted by `FromStr`.
macro_rules! pg_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $pg_type:literal {
            $($variant:ident = $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[sqlx(type_name = $pg_type)]
        pub enum $name {
            $(
                #[sqlx(rename = $label)]
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in the declaration order of the database type.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name of the PostgreSQL type backing this enum.
            pub const PG_TYPE: &'static str = $pg_type;

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> anyhow::Result<Self> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(anyhow::anyhow!("invalid {} value: {:?}", $pg_type, other)),
                }
            }
        }
    };
}

// ── Enumerations ────────────────────────────────────────────────

pg_enum! {
    /// Application role of a login account.
    UserRole => "user_role" {
        Admin = "admin",
        Manager = "manager",
        Employee = "employee",
    }
}

pg_enum! {
    /// CEFR English proficiency level.
    EnglishLevel => "english_level" {
        A1 = "A1",
        A2 = "A2",
        B1 = "B1",
        B2 = "B2",
        C1 = "C1",
        C2 = "C2",
    }
}

pg_enum! {
    EmployeeStatus => "employee_status" {
        Active = "active",
        Vacation = "vacation",
        Inactive = "inactive",
    }
}

pg_enum! {
    EmploymentType => "employment_type" {
        FullTime = "full_time",
        PartTime = "part_time",
        Contractor = "contractor",
        Intern = "intern",
    }
}

pg_enum! {
    WorkLocation => "work_location" {
        Remote = "remote",
        Office = "office",
        Hybrid = "hybrid",
    }
}

pg_enum! {
    SkillCategory => "skill_category" {
        Frontend = "frontend",
        Backend = "backend",
        Devops = "devops",
        Design = "design",
        Management = "management",
        Other = "other",
    }
}

pg_enum! {
    /// Proficiency on a 1–5 scale. Stored as the string labels `'1'..'5'`.
    SkillLevel => "skill_level" {
        One = "1",
        Two = "2",
        Three = "3",
        Four = "4",
        Five = "5",
    }
}

pg_enum! {
    VacationType => "vacation_type" {
        Vacation = "vacation",
        SickLeave = "sick_leave",
        DayOff = "day_off",
        Remote = "remote",
    }
}

pg_enum! {
    VacationStatus => "vacation_status" {
        Pending = "pending",
        Approved = "approved",
        Rejected = "rejected",
        Cancelled = "cancelled",
    }
}

pg_enum! {
    ProjectStatus => "project_status" {
        Planning = "planning",
        Active = "active",
        OnHold = "on_hold",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

pg_enum! {
    ProjectPriority => "project_priority" {
        Low = "low",
        Medium = "medium",
        High = "high",
    }
}

impl VacationStatus {
    /// Whether a request in this status may move to `next`.
    ///
    /// Pending requests are decided (approved/rejected) or withdrawn; an
    /// approved request can still be cancelled. Rejected and cancelled are
    /// terminal.
    pub fn can_transition_to(self, next: VacationStatus) -> bool {
        use VacationStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Cancelled)
        )
    }
}

// ── Organisation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub head_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub department_id: i32,
    pub lead_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Employees ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department_id: Option<i32>,
    pub team_id: Option<i32>,
    pub manager_id: Option<i32>,
    pub english_level: Option<EnglishLevel>,
    pub hire_date: Option<NaiveDate>,
    pub status: EmployeeStatus,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub personal_email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub employment_type: EmploymentType,
    pub work_location: WorkLocation,
    pub timezone: Option<String>,
    pub termination_date: Option<NaiveDate>,
    pub annual_vacation_days: i32,
    pub bonus_vacation_days: i32,
    pub annual_sick_leave_days: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields accepted when creating an employee. Columns not listed here take
/// their schema defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department_id: Option<i32>,
    pub team_id: Option<i32>,
    pub manager_id: Option<i32>,
    pub english_level: Option<EnglishLevel>,
    pub hire_date: Option<NaiveDate>,
    pub employment_type: Option<EmploymentType>,
    pub work_location: Option<WorkLocation>,
}

// ── Skills ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: i32,
    pub name: String,
    pub category: SkillCategory,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSkill {
    pub id: i32,
    pub employee_id: i32,
    pub skill_id: i32,
    pub level: SkillLevel,
    pub years_of_experience: i32,
}

// ── Vacations ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vacation {
    pub id: i32,
    pub employee_id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: VacationType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: VacationStatus,
    pub reason: Option<String>,
    pub approved_by_id: Option<i32>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vacation {
    /// Calendar days covered, both ends inclusive.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Remaining leave for one employee in one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    pub employee_id: i32,
    pub year: i32,
    pub vacation_allowance: i64,
    pub vacation_used: i64,
    pub sick_leave_allowance: i64,
    pub sick_leave_used: i64,
}

impl LeaveBalance {
    pub fn vacation_remaining(&self) -> i64 {
        self.vacation_allowance - self.vacation_used
    }

    pub fn sick_leave_remaining(&self) -> i64 {
        self.sick_leave_allowance - self.sick_leave_used
    }
}

// ── Projects ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub b2b_client: Option<String>,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub b2b_client: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAssignment {
    pub id: i32,
    pub project_id: i32,
    pub employee_id: i32,
    pub role: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

// ── Users ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub employee_id: Option<i32>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// ── Pagination ──────────────────────────────────────────────────

/// Paginated envelope: `{data, total, page, limit, totalPages}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Page {
            data,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

/// Number of pages needed for `total` rows at `limit` per page.
/// A non-positive limit yields zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 || total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_labels_match_database_values() {
        assert_eq!(EnglishLevel::B2.as_str(), "B2");
        assert_eq!(SkillLevel::Three.as_str(), "3");
        assert_eq!(ProjectStatus::OnHold.as_str(), "on_hold");
        assert_eq!(VacationType::SickLeave.as_str(), "sick_leave");
        assert_eq!(EmploymentType::FullTime.to_string(), "full_time");
    }

    #[test]
    fn enum_value_sets_have_expected_sizes() {
        assert_eq!(UserRole::ALL.len(), 3);
        assert_eq!(EnglishLevel::ALL.len(), 6);
        assert_eq!(EmployeeStatus::ALL.len(), 3);
        assert_eq!(EmploymentType::ALL.len(), 4);
        assert_eq!(WorkLocation::ALL.len(), 3);
        assert_eq!(SkillCategory::ALL.len(), 6);
        assert_eq!(SkillLevel::ALL.len(), 5);
        assert_eq!(VacationType::ALL.len(), 4);
        assert_eq!(VacationStatus::ALL.len(), 4);
        assert_eq!(ProjectStatus::ALL.len(), 5);
        assert_eq!(ProjectPriority::ALL.len(), 3);
    }

    #[test]
    fn from_str_accepts_labels_and_rejects_others() {
        assert_eq!("C1".parse::<EnglishLevel>().unwrap(), EnglishLevel::C1);
        assert_eq!("on_hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
        assert!("c1".parse::<EnglishLevel>().is_err());
        assert!("OnHold".parse::<ProjectStatus>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn enums_serialize_as_database_labels() {
        let json = serde_json::to_string(&ProjectStatus::OnHold).unwrap();
        assert_eq!(json, "\"on_hold\"");
        let level: SkillLevel = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(level, SkillLevel::Five);
    }

    #[test]
    fn vacation_transitions() {
        use VacationStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Approved.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn page_serializes_total_pages_in_camel_case() {
        let page = Page::new(vec![1, 2], 12, 2, 10);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["page"], 2);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }

    #[test]
    fn project_deserializes_from_camel_case_payload() {
        let json = serde_json::json!({
            "id": 7,
            "name": "Atlas",
            "b2bClient": "Globex",
            "status": "active",
            "priority": "high",
            "startDate": "2024-02-01",
            "progress": 40
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert_eq!(project.b2b_client.as_deref(), Some("Globex"));
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.start_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert!(project.end_date.is_none());
    }
}
