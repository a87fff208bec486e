//! Skill catalog and employee proficiency records.
//!
//! An employee holds at most one `employee_skills` row per skill; adding a
//! second one for the same pair fails on the
//! `employee_skills_employee_skill_unique` constraint.

use anyhow::Result;

use super::Database;
use crate::model::{EmployeeSkill, Skill, SkillCategory, SkillLevel};

impl Database {
    pub async fn create_skill(
        &self,
        name: &str,
        category: SkillCategory,
        description: Option<&str>,
    ) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO skills (name, category, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(category)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// List skills, optionally restricted to one category.
    pub async fn get_skills(&self, category: Option<SkillCategory>) -> Result<Vec<Skill>> {
        let rows = if let Some(category) = category {
            sqlx::query_as::<_, Skill>(
                "SELECT id, name, category, description FROM skills
                 WHERE category = $1 ORDER BY name",
            )
            .bind(category)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Skill>(
                "SELECT id, name, category, description FROM skills ORDER BY category, name",
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    /// Record an employee's proficiency in a skill.
    pub async fn add_employee_skill(
        &self,
        employee_id: i32,
        skill_id: i32,
        level: SkillLevel,
        years_of_experience: i32,
    ) -> Result<i32> {
        if years_of_experience < 0 {
            anyhow::bail!("years of experience cannot be negative");
        }
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO employee_skills (employee_id, skill_id, level, years_of_experience)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(employee_id)
        .bind(skill_id)
        .bind(level)
        .bind(years_of_experience)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Change the level of an existing proficiency record.
    pub async fn update_employee_skill_level(
        &self,
        employee_id: i32,
        skill_id: i32,
        level: SkillLevel,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE employee_skills SET level = $3, updated_at = NOW()
             WHERE employee_id = $1 AND skill_id = $2",
        )
        .bind(employee_id)
        .bind(skill_id)
        .bind(level)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_employee_skills(&self, employee_id: i32) -> Result<Vec<EmployeeSkill>> {
        let rows = sqlx::query_as::<_, EmployeeSkill>(
            "SELECT id, employee_id, skill_id, level, years_of_experience
             FROM employee_skills WHERE employee_id = $1 ORDER BY skill_id",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
