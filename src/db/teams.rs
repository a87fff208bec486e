//! Team operations. Every team belongs to exactly one department.

use anyhow::Result;

use super::Database;
use crate::model::Team;

const TEAM_COLUMNS: &str = "id, name, description, department_id, lead_id, created_at, updated_at";

impl Database {
    pub async fn create_team(
        &self,
        department_id: i32,
        name: &str,
        description: Option<&str>,
    ) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO teams (department_id, name, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(department_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_team(&self, id: i32) -> Result<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(&format!(
            "SELECT {} FROM teams WHERE id = $1",
            TEAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Teams of one department, ordered by name.
    pub async fn get_department_teams(&self, department_id: i32) -> Result<Vec<Team>> {
        let rows = sqlx::query_as::<_, Team>(&format!(
            "SELECT {} FROM teams WHERE department_id = $1 ORDER BY name",
            TEAM_COLUMNS
        ))
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn set_team_lead(&self, team_id: i32, lead_id: Option<i32>) -> Result<()> {
        let result = sqlx::query("UPDATE teams SET lead_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(team_id)
            .bind(lead_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("team {} not found", team_id);
        }
        Ok(())
    }

    pub async fn delete_team(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
