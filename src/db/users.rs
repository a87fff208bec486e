//! Login accounts — creation, lookup, employee link, soft delete.
//!
//! At most one user may reference a given employee; the partial unique index
//! `users_employee_id_unique` enforces this for non-null values only.

use anyhow::Result;

use super::Database;
use crate::model::{User, UserRole};

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, role, is_active,
    employee_id, last_login_at, password_changed_at, failed_login_attempts, locked_until,
    email_verified_at, deleted_at";

impl Database {
    /// Create a user. `password_hash` must already be hashed by the caller.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        role: UserRole,
    ) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO users (email, password, first_name, last_name, role, password_changed_at)
             VALUES ($1, $2, $3, $4, $5, NOW())
             RETURNING id",
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Look up an active (not soft-deleted) user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Link a user to an employee record, or unlink with `None`.
    pub async fn link_user_to_employee(&self, user_id: i32, employee_id: Option<i32>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET employee_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .bind(employee_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("user {} not found", user_id);
        }
        Ok(())
    }

    /// Soft-delete a user: stamp `deleted_at` and deactivate the account.
    pub async fn soft_delete_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
