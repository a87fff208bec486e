//! Department operations.
//!
//! Departments are looked up by their unique name as well as by id; seed data
//! and the CLI never assume fixed ids. Deleting a department cascades to its
//! teams and clears `employees.department_id`.

use anyhow::Result;

use super::Database;
use crate::model::Department;

const DEPARTMENT_COLUMNS: &str = "id, name, description, head_id, created_at, updated_at";

impl Database {
    /// Create a department and return its id.
    pub async fn create_department(&self, name: &str, description: Option<&str>) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO departments (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// List all departments ordered by name.
    pub async fn get_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments ORDER BY name",
            DEPARTMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_department(&self, id: i32) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments WHERE id = $1",
            DEPARTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Look up a department by its unique name.
    pub async fn get_department_by_name(&self, name: &str) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments WHERE name = $1",
            DEPARTMENT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Set or clear the head of a department.
    pub async fn set_department_head(&self, department_id: i32, head_id: Option<i32>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE departments SET head_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(department_id)
        .bind(head_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("department {} not found", department_id);
        }
        Ok(())
    }

    /// Delete a department. Returns `false` if it did not exist.
    pub async fn delete_department(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
