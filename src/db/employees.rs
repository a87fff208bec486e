//! Employee operations — CRUD, filtered listing, soft delete, reporting lines.
//!
//! ## Reporting lines
//!
//! `employees.manager_id` is a self-reference and the schema alone cannot stop
//! a manager cycle. [`Database::set_manager`] walks the proposed manager's
//! chain upwards with a recursive CTE and refuses the write if the employee
//! already appears in it. Writes to reporting lines serialize on a
//! transaction-scoped advisory lock so two concurrent reassignments cannot
//! each pass the check and close a loop together.
//!
//! ## Soft delete
//!
//! `soft_delete_employee` stamps `deleted_at` and marks the employee inactive;
//! soft-deleted rows are hidden from `get_employee` and `get_employees_page`.
//! `delete_employee` physically removes the row, cascading to skills,
//! vacations and assignments and nulling every reference to the employee.

use anyhow::Result;

use super::{like_pattern, page_offset, Database, EmployeeFilter};
use crate::model::{Employee, EmploymentType, NewEmployee, Page, WorkLocation};

pub(crate) const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, phone, position,
    department_id, team_id, manager_id, english_level, hire_date, status, avatar_url, bio,
    personal_email, birth_date, employment_type, work_location, timezone, termination_date,
    annual_vacation_days, bonus_vacation_days, annual_sick_leave_days, deleted_at,
    created_at, updated_at";

/// Advisory lock key guarding reporting-line writes.
const ORG_CHART_LOCK_KEY: i64 = 0x6f72_675f_6368_6172;

/// Upper bound on chain walks; deeper chains only exist if data was written
/// around `set_manager`.
const MAX_CHAIN_DEPTH: i32 = 1000;

impl EmployeeFilter {
    /// Build the WHERE clause for this filter. Returns the clause and the next
    /// free bind index. Binds must follow the same order in [`bind_filter`].
    fn where_clause(&self) -> (String, u32) {
        let mut conditions = vec!["deleted_at IS NULL".to_string()];
        let mut param_idx = 1u32;

        if self.search.is_some() {
            conditions.push(format!(
                "(first_name ILIKE ${0} OR last_name ILIKE ${0} OR email ILIKE ${0})",
                param_idx
            ));
            param_idx += 1;
        }
        if self.department_id.is_some() {
            conditions.push(format!("department_id = ${}", param_idx));
            param_idx += 1;
        }
        if self.team_id.is_some() {
            conditions.push(format!("team_id = ${}", param_idx));
            param_idx += 1;
        }
        if self.status.is_some() {
            conditions.push(format!("status = ${}", param_idx));
            param_idx += 1;
        }

        (format!(" WHERE {}", conditions.join(" AND ")), param_idx)
    }
}

macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        if let Some(ref search) = $filter.search {
            q = q.bind(like_pattern(search));
        }
        if let Some(department_id) = $filter.department_id {
            q = q.bind(department_id);
        }
        if let Some(team_id) = $filter.team_id {
            q = q.bind(team_id);
        }
        if let Some(status) = $filter.status {
            q = q.bind(status);
        }
        q
    }};
}

impl Database {
    /// Insert an employee and return the new id.
    pub async fn create_employee(&self, new: &NewEmployee) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO employees
                (first_name, last_name, email, phone, position, department_id, team_id,
                 manager_id, english_level, hire_date, employment_type, work_location)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.position)
        .bind(new.department_id)
        .bind(new.team_id)
        .bind(new.manager_id)
        .bind(new.english_level)
        .bind(new.hire_date)
        .bind(new.employment_type.unwrap_or(EmploymentType::FullTime))
        .bind(new.work_location.unwrap_or(WorkLocation::Office))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Get an employee by id. Soft-deleted employees are not returned.
    pub async fn get_employee(&self, id: i32) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE id = $1 AND deleted_at IS NULL",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Get an employee by email, including soft-deleted rows (the address
    /// stays reserved by the unique constraint either way).
    pub async fn get_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE email = $1",
            EMPLOYEE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Filtered, sorted, paginated employee listing. `page` is 1-based.
    pub async fn get_employees_page(
        &self,
        filter: &EmployeeFilter,
        page: i64,
        limit: i64,
    ) -> Result<Page<Employee>> {
        let page = page.max(1);
        let limit = limit.clamp(1, 500);
        let offset = page_offset(page, limit)?;
        let (where_clause, param_idx) = filter.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM employees{}", where_clause);
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_sql), filter)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM employees{} ORDER BY {} {}, id LIMIT ${} OFFSET ${}",
            EMPLOYEE_COLUMNS,
            where_clause,
            filter.safe_sort_column(),
            filter.safe_sort_dir(),
            param_idx,
            param_idx + 1,
        );
        let rows = bind_filter!(sqlx::query_as::<_, Employee>(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, page, limit))
    }

    /// Mark an employee deleted without removing the row.
    pub async fn soft_delete_employee(&self, id: i32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE employees SET deleted_at = NOW(), status = 'inactive', updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Physically delete an employee.
    pub async fn delete_employee(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Assign (or clear) an employee's manager.
    ///
    /// Rejects self-management and any assignment that would make the
    /// employee an indirect manager of themselves.
    pub async fn set_manager(&self, employee_id: i32, manager_id: Option<i32>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ORG_CHART_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        if let Some(manager_id) = manager_id {
            if manager_id == employee_id {
                anyhow::bail!("employee {} cannot manage themselves", employee_id);
            }
            let manager_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM employees WHERE id = $1 AND deleted_at IS NULL)",
            )
            .bind(manager_id)
            .fetch_one(&mut *tx)
            .await?;
            if !manager_exists {
                anyhow::bail!("manager {} not found", manager_id);
            }

            let creates_cycle: bool = sqlx::query_scalar(
                "WITH RECURSIVE chain AS (
                     SELECT id, manager_id, 1 AS depth FROM employees WHERE id = $1
                     UNION ALL
                     SELECT e.id, e.manager_id, c.depth + 1
                     FROM employees e JOIN chain c ON e.id = c.manager_id
                     WHERE c.depth < $3
                 )
                 SELECT EXISTS (SELECT 1 FROM chain WHERE id = $2)",
            )
            .bind(manager_id)
            .bind(employee_id)
            .bind(MAX_CHAIN_DEPTH)
            .fetch_one(&mut *tx)
            .await?;
            if creates_cycle {
                anyhow::bail!(
                    "assigning manager {} to employee {} would create a reporting cycle",
                    manager_id,
                    employee_id
                );
            }
        }

        let result = sqlx::query(
            "UPDATE employees SET manager_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(employee_id)
        .bind(manager_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("employee {} not found", employee_id);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Managers above an employee, nearest first.
    pub async fn get_reporting_chain(&self, employee_id: i32) -> Result<Vec<Employee>> {
        let sql = format!(
            "WITH RECURSIVE chain AS (
                 SELECT manager_id AS id, 1 AS depth FROM employees WHERE id = $1
                 UNION ALL
                 SELECT e.manager_id, c.depth + 1
                 FROM employees e JOIN chain c ON e.id = c.id
                 WHERE c.depth < $2
             )
             SELECT {} FROM employees e JOIN chain c ON e.id = c.id ORDER BY c.depth",
            EMPLOYEE_COLUMNS
                .split(',')
                .map(|c| format!("e.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let rows = sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .bind(MAX_CHAIN_DEPTH)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Direct reports of a manager, excluding soft-deleted employees.
    pub async fn get_direct_reports(&self, manager_id: i32) -> Result<Vec<Employee>> {
        let rows = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE manager_id = $1 AND deleted_at IS NULL
             ORDER BY last_name, first_name",
            EMPLOYEE_COLUMNS
        ))
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmployeeStatus;

    #[test]
    fn where_clause_always_excludes_soft_deleted() {
        let (clause, next) = EmployeeFilter::default().where_clause();
        assert_eq!(clause, " WHERE deleted_at IS NULL");
        assert_eq!(next, 1);
    }

    #[test]
    fn where_clause_numbers_binds_in_order() {
        let filter = EmployeeFilter {
            search: Some("ann".into()),
            department_id: Some(3),
            status: Some(EmployeeStatus::Active),
            ..Default::default()
        };
        let (clause, next) = filter.where_clause();
        assert!(clause.contains("first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1"));
        assert!(clause.contains("department_id = $2"));
        assert!(clause.contains("status = $3"));
        assert!(!clause.contains("team_id"));
        assert_eq!(next, 4);
    }

    #[test]
    fn employee_columns_qualify_cleanly() {
        let qualified: Vec<String> = EMPLOYEE_COLUMNS
            .split(',')
            .map(|c| format!("e.{}", c.trim()))
            .collect();
        assert_eq!(qualified.len(), 26);
        assert_eq!(qualified[0], "e.id");
        assert!(qualified.iter().all(|c| !c.contains('\n') && !c.contains(' ')));
    }
}
