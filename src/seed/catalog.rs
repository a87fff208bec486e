//! Fixed reference catalogs used by the seed migrations.

use crate::model::{ProjectPriority, ProjectStatus, SkillCategory};

/// `(name, description)`
pub const DEPARTMENTS: &[(&str, &str)] = &[
    ("Engineering", "Product development and platform engineering"),
    ("Design", "Product, interaction and brand design"),
    ("Product", "Product management and business analysis"),
    ("Quality Assurance", "Manual and automated testing"),
    ("Human Resources", "Recruiting, onboarding and people operations"),
    ("Sales", "Account management and business development"),
];

/// `(department, team, description)`. Departments absent from this list have
/// no teams.
pub const TEAMS: &[(&str, &str, &str)] = &[
    ("Engineering", "Frontend", "Web client and design system"),
    ("Engineering", "Backend", "REST API and data services"),
    ("Engineering", "DevOps", "Infrastructure, CI/CD and observability"),
    ("Design", "UX", "Research and interaction design"),
    ("Design", "Brand", "Visual identity and marketing assets"),
    ("Product", "Product Management", "Roadmaps and delivery"),
    ("Quality Assurance", "Automation", "Test frameworks and regression suites"),
    ("Sales", "Enterprise Accounts", "Key B2B clients"),
];

/// `(name, category, description)`
pub const SKILLS: &[(&str, SkillCategory, &str)] = &[
    ("React", SkillCategory::Frontend, "Component-based UI library"),
    ("TypeScript", SkillCategory::Frontend, "Typed superset of JavaScript"),
    ("Vue.js", SkillCategory::Frontend, "Progressive UI framework"),
    ("CSS", SkillCategory::Frontend, "Layout and styling"),
    ("Node.js", SkillCategory::Backend, "JavaScript server runtime"),
    ("Rust", SkillCategory::Backend, "Systems programming language"),
    ("Go", SkillCategory::Backend, "Compiled language for network services"),
    ("Python", SkillCategory::Backend, "General-purpose scripting language"),
    ("PostgreSQL", SkillCategory::Backend, "Relational database"),
    ("Docker", SkillCategory::Devops, "Container tooling"),
    ("Kubernetes", SkillCategory::Devops, "Container orchestration"),
    ("Terraform", SkillCategory::Devops, "Infrastructure as code"),
    ("Figma", SkillCategory::Design, "Interface design tool"),
    ("UX Research", SkillCategory::Design, "User interviews and usability testing"),
    ("Scrum", SkillCategory::Management, "Agile delivery framework"),
    ("Team Leadership", SkillCategory::Management, "Mentoring and people management"),
    ("Technical Writing", SkillCategory::Other, "Documentation and specifications"),
];

pub const POSITIONS: &[&str] = &[
    "Junior Developer",
    "Middle Developer",
    "Senior Developer",
    "Tech Lead",
    "QA Engineer",
    "DevOps Engineer",
    "UI/UX Designer",
    "Product Manager",
    "Project Manager",
    "Business Analyst",
    "HR Specialist",
    "Account Manager",
];

/// Hire dates are drawn uniformly from this inclusive four-year window.
pub const HIRE_DATE_FROM: &str = "2020-01-01";
pub const HIRE_DATE_TO: &str = "2023-12-31";

pub struct SampleProject {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub b2b_client: Option<&'static str>,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    pub start_date: &'static str,
    pub end_date: Option<&'static str>,
    pub progress: i32,
}

pub const PROJECTS: &[SampleProject] = &[
    SampleProject {
        name: "Atlas CRM",
        description: "Customer relationship platform for the sales team",
        category: "Web Application",
        b2b_client: Some("Globex Corporation"),
        status: ProjectStatus::Active,
        priority: ProjectPriority::High,
        start_date: "2024-01-08",
        end_date: Some("2024-12-20"),
        progress: 45,
    },
    SampleProject {
        name: "Harbor Mobile",
        description: "Field-service mobile application",
        category: "Mobile Application",
        b2b_client: Some("Initech"),
        status: ProjectStatus::Planning,
        priority: ProjectPriority::Medium,
        start_date: "2024-04-01",
        end_date: None,
        progress: 0,
    },
    SampleProject {
        name: "Beacon Analytics",
        description: "Reporting dashboards over the data warehouse",
        category: "Data Platform",
        b2b_client: Some("Umbrella Health"),
        status: ProjectStatus::Active,
        priority: ProjectPriority::Medium,
        start_date: "2023-09-11",
        end_date: Some("2024-06-28"),
        progress: 80,
    },
    SampleProject {
        name: "Internal HR Portal",
        description: "Employee directory, vacations and skills matrix",
        category: "Internal Tool",
        b2b_client: None,
        status: ProjectStatus::Active,
        priority: ProjectPriority::Low,
        start_date: "2023-05-02",
        end_date: None,
        progress: 60,
    },
    SampleProject {
        name: "Legacy Billing Migration",
        description: "Move invoicing off the mainframe",
        category: "Migration",
        b2b_client: Some("Stark Logistics"),
        status: ProjectStatus::OnHold,
        priority: ProjectPriority::High,
        start_date: "2023-02-13",
        end_date: None,
        progress: 30,
    },
    SampleProject {
        name: "Nimbus Website",
        description: "Marketing site relaunch",
        category: "Website",
        b2b_client: Some("Nimbus Travel"),
        status: ProjectStatus::Completed,
        priority: ProjectPriority::Low,
        start_date: "2022-10-03",
        end_date: Some("2023-03-31"),
        progress: 100,
    },
];

pub const ASSIGNMENT_ROLES: &[&str] = &[
    "Developer",
    "Tech Lead",
    "QA Engineer",
    "Designer",
    "Project Manager",
    "Business Analyst",
];

/// Skills drawn per seeded employee, inclusive.
pub const SKILLS_PER_EMPLOYEE: (usize, usize) = (2, 4);

/// Employees drawn per seeded project, inclusive.
pub const MEMBERS_PER_PROJECT: (usize, usize) = (2, 5);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    #[test]
    fn teams_reference_known_departments() {
        let departments: HashSet<&str> = DEPARTMENTS.iter().map(|(n, _)| *n).collect();
        for (department, team, _) in TEAMS {
            assert!(
                departments.contains(department),
                "team {} references unknown department {}",
                team,
                department
            );
        }
    }

    #[test]
    fn some_department_has_no_teams() {
        let with_teams: HashSet<&str> = TEAMS.iter().map(|(d, _, _)| *d).collect();
        assert!(DEPARTMENTS.iter().any(|(n, _)| !with_teams.contains(n)));
    }

    #[test]
    fn catalog_names_are_unique() {
        let skills: HashSet<&str> = SKILLS.iter().map(|(n, _, _)| *n).collect();
        assert_eq!(skills.len(), SKILLS.len());
        let projects: HashSet<&str> = PROJECTS.iter().map(|p| p.name).collect();
        assert_eq!(projects.len(), PROJECTS.len());
        let departments: HashSet<&str> = DEPARTMENTS.iter().map(|(n, _)| *n).collect();
        assert_eq!(departments.len(), DEPARTMENTS.len());
    }

    #[test]
    fn sample_project_dates_parse_and_progress_in_range() {
        for p in PROJECTS {
            let start: NaiveDate = p.start_date.parse().unwrap();
            if let Some(end) = p.end_date {
                let end: NaiveDate = end.parse().unwrap();
                assert!(end >= start, "{} ends before it starts", p.name);
            }
            assert!((0..=100).contains(&p.progress));
        }
    }

    #[test]
    fn hire_window_spans_four_years() {
        let from: NaiveDate = HIRE_DATE_FROM.parse().unwrap();
        let to: NaiveDate = HIRE_DATE_TO.parse().unwrap();
        assert_eq!((to - from).num_days() + 1, 366 + 365 + 365 + 365);
    }

    #[test]
    fn skills_per_employee_fits_catalog() {
        assert!(SKILLS_PER_EMPLOYEE.0 <= SKILLS_PER_EMPLOYEE.1);
        assert!(SKILLS_PER_EMPLOYEE.1 <= SKILLS.len());
    }
}
