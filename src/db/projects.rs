//! Project operations — CRUD, filtered and paginated listing, assignments.
//!
//! `get_projects_page` produces the `{data, total, page, limit, totalPages}`
//! envelope served by `GET /projects?page=`. An employee holds at most one
//! assignment per project; a second `assign_employee` for the same pair fails
//! on `project_assignments_project_employee_unique`.

use anyhow::Result;
use chrono::NaiveDate;

use super::{like_pattern, page_offset, Database, ProjectFilter};
use crate::model::{
    NewProject, Page, Project, ProjectAssignment, ProjectPriority, ProjectStatus,
};

const PROJECT_COLUMNS: &str =
    "id, name, description, category, b2b_client, status, priority, start_date, end_date, progress";

const ASSIGNMENT_COLUMNS: &str = "id, project_id, employee_id, role, start_date, end_date, is_active";

impl ProjectFilter {
    fn where_clause(&self) -> (String, u32) {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if self.search.is_some() {
            conditions.push(format!(
                "(name ILIKE ${0} OR description ILIKE ${0} OR b2b_client ILIKE ${0})",
                param_idx
            ));
            param_idx += 1;
        }
        if self.status.is_some() {
            conditions.push(format!("status = ${}", param_idx));
            param_idx += 1;
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (clause, param_idx)
    }
}

macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        if let Some(ref search) = $filter.search {
            q = q.bind(like_pattern(search));
        }
        if let Some(status) = $filter.status {
            q = q.bind(status);
        }
        q
    }};
}

impl Database {
    pub async fn create_project(&self, new: &NewProject) -> Result<i32> {
        let progress = new.progress.unwrap_or(0);
        if !(0..=100).contains(&progress) {
            anyhow::bail!("project progress must be within 0..=100, got {}", progress);
        }
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO projects
                (name, description, category, b2b_client, status, priority,
                 start_date, end_date, progress)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.b2b_client)
        .bind(new.status.unwrap_or(ProjectStatus::Planning))
        .bind(new.priority.unwrap_or(ProjectPriority::Medium))
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(progress)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_project(&self, id: i32) -> Result<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Flat listing, newest first, capped at `limit` rows when given.
    pub async fn get_projects(
        &self,
        filter: &ProjectFilter,
        limit: Option<i64>,
    ) -> Result<Vec<Project>> {
        let (where_clause, param_idx) = filter.where_clause();
        let sql = match limit {
            Some(_) => format!(
                "SELECT {} FROM projects{} ORDER BY id DESC LIMIT ${}",
                PROJECT_COLUMNS, where_clause, param_idx
            ),
            None => format!(
                "SELECT {} FROM projects{} ORDER BY id DESC",
                PROJECT_COLUMNS, where_clause
            ),
        };
        let mut query = bind_filter!(sqlx::query_as::<_, Project>(&sql), filter);
        if let Some(limit) = limit {
            query = query.bind(limit.max(0));
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// One page of projects plus pagination metadata. `page` is 1-based.
    pub async fn get_projects_page(
        &self,
        filter: &ProjectFilter,
        page: i64,
        limit: i64,
    ) -> Result<Page<Project>> {
        let page = page.max(1);
        let limit = limit.clamp(1, 500);
        let offset = page_offset(page, limit)?;
        let (where_clause, param_idx) = filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM projects{}", where_clause);
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM projects{} ORDER BY id DESC LIMIT ${} OFFSET ${}",
            PROJECT_COLUMNS,
            where_clause,
            param_idx,
            param_idx + 1
        );
        let rows = bind_filter!(sqlx::query_as::<_, Project>(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, page, limit))
    }

    /// Update status and progress together.
    pub async fn update_project_progress(
        &self,
        id: i32,
        status: ProjectStatus,
        progress: i32,
    ) -> Result<()> {
        if !(0..=100).contains(&progress) {
            anyhow::bail!("project progress must be within 0..=100, got {}", progress);
        }
        let result = sqlx::query(
            "UPDATE projects SET status = $2, progress = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(progress)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("project {} not found", id);
        }
        Ok(())
    }

    pub async fn delete_project(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Assignments ───────────────────────────────────────────────

    /// Assign an employee to a project.
    pub async fn assign_employee(
        &self,
        project_id: i32,
        employee_id: i32,
        role: Option<&str>,
        start_date: Option<NaiveDate>,
    ) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO project_assignments (project_id, employee_id, role, start_date)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(project_id)
        .bind(employee_id)
        .bind(role)
        .bind(start_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_project_assignments(&self, project_id: i32) -> Result<Vec<ProjectAssignment>> {
        let rows = sqlx::query_as::<_, ProjectAssignment>(&format!(
            "SELECT {} FROM project_assignments WHERE project_id = $1 ORDER BY id",
            ASSIGNMENT_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_employee_assignments(
        &self,
        employee_id: i32,
    ) -> Result<Vec<ProjectAssignment>> {
        let rows = sqlx::query_as::<_, ProjectAssignment>(&format!(
            "SELECT {} FROM project_assignments WHERE employee_id = $1 ORDER BY id",
            ASSIGNMENT_COLUMNS
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Close an assignment: mark inactive and stamp the end date.
    pub async fn end_assignment(
        &self,
        project_id: i32,
        employee_id: i32,
        end_date: NaiveDate,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE project_assignments
             SET is_active = FALSE, end_date = $3, updated_at = NOW()
             WHERE project_id = $1 AND employee_id = $2 AND is_active",
        )
        .bind(project_id)
        .bind(employee_id)
        .bind(end_date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (clause, next) = ProjectFilter::default().where_clause();
        assert!(clause.is_empty());
        assert_eq!(next, 1);
    }

    #[test]
    fn status_follows_search_in_bind_order() {
        let filter = ProjectFilter {
            search: Some("crm".into()),
            status: Some(ProjectStatus::Active),
        };
        let (clause, next) = filter.where_clause();
        assert!(clause.starts_with(" WHERE (name ILIKE $1"));
        assert!(clause.ends_with("status = $2"));
        assert_eq!(next, 3);
    }

    #[test]
    fn status_alone_binds_first() {
        let filter = ProjectFilter {
            search: None,
            status: Some(ProjectStatus::OnHold),
        };
        let (clause, _) = filter.where_clause();
        assert_eq!(clause, " WHERE status = $1");
    }
}
