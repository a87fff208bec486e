//! Leave requests — submission, review workflow, calendar queries, balances.
//!
//! ## Lifecycle
//!
//! 1. `request_vacation` inserts a `pending` row (`end_date >= start_date`)
//! 2. `approve_vacation` / `reject_vacation` record the reviewer decision
//! 3. `cancel_vacation` withdraws a pending or approved request
//!
//! Rejected and cancelled requests are terminal. Transitions are checked
//! against the current row under `SELECT ... FOR UPDATE`.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use super::Database;
use crate::model::{LeaveBalance, Vacation, VacationStatus, VacationType};

const VACATION_COLUMNS: &str = "id, employee_id, type, start_date, end_date, status, reason,
    approved_by_id, approved_at, rejection_reason, created_at";

/// Days of `[start, end]` falling inside calendar `year`, both ends inclusive.
pub(crate) fn days_in_year(start: NaiveDate, end: NaiveDate, year: i32) -> i64 {
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return 0;
    };
    let from = start.max(year_start);
    let to = end.min(year_end);
    if to < from {
        0
    } else {
        (to - from).num_days() + 1
    }
}

impl Database {
    /// Submit a leave request in `pending` status.
    pub async fn request_vacation(
        &self,
        employee_id: i32,
        kind: VacationType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<i32> {
        if end_date < start_date {
            anyhow::bail!(
                "vacation end date {} is before start date {}",
                end_date,
                start_date
            );
        }
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO vacations (employee_id, type, start_date, end_date, reason)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(employee_id)
        .bind(kind)
        .bind(start_date)
        .bind(end_date)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_vacation(&self, id: i32) -> Result<Option<Vacation>> {
        let row = sqlx::query_as::<_, Vacation>(&format!(
            "SELECT {} FROM vacations WHERE id = $1",
            VACATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn approve_vacation(&self, id: i32, approver_id: i32) -> Result<()> {
        self.transition_vacation(id, VacationStatus::Approved, Some(approver_id), None)
            .await
    }

    pub async fn reject_vacation(&self, id: i32, reviewer_id: i32, reason: &str) -> Result<()> {
        self.transition_vacation(id, VacationStatus::Rejected, Some(reviewer_id), Some(reason))
            .await
    }

    pub async fn cancel_vacation(&self, id: i32) -> Result<()> {
        self.transition_vacation(id, VacationStatus::Cancelled, None, None)
            .await
    }

    async fn transition_vacation(
        &self,
        id: i32,
        next: VacationStatus,
        reviewer_id: Option<i32>,
        rejection_reason: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let current: Option<VacationStatus> =
            sqlx::query_scalar("SELECT status FROM vacations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(current) = current else {
            anyhow::bail!("vacation {} not found", id);
        };
        if !current.can_transition_to(next) {
            anyhow::bail!("vacation {} cannot move from {} to {}", id, current, next);
        }

        match next {
            VacationStatus::Approved | VacationStatus::Rejected => {
                sqlx::query(
                    "UPDATE vacations
                     SET status = $2, approved_by_id = $3, approved_at = NOW(),
                         rejection_reason = $4, updated_at = NOW()
                     WHERE id = $1",
                )
                .bind(id)
                .bind(next)
                .bind(reviewer_id)
                .bind(rejection_reason)
                .execute(&mut *tx)
                .await?;
            }
            _ => {
                sqlx::query("UPDATE vacations SET status = $2, updated_at = NOW() WHERE id = $1")
                    .bind(id)
                    .bind(next)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Requests overlapping `[from, to]`, optionally restricted by status.
    pub async fn get_vacations_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        status: Option<VacationStatus>,
    ) -> Result<Vec<Vacation>> {
        let rows = if let Some(status) = status {
            sqlx::query_as::<_, Vacation>(&format!(
                "SELECT {} FROM vacations
                 WHERE start_date <= $2 AND end_date >= $1 AND status = $3
                 ORDER BY start_date, id",
                VACATION_COLUMNS
            ))
            .bind(from)
            .bind(to)
            .bind(status)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Vacation>(&format!(
                "SELECT {} FROM vacations
                 WHERE start_date <= $2 AND end_date >= $1
                 ORDER BY start_date, id",
                VACATION_COLUMNS
            ))
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    pub async fn get_employee_vacations(&self, employee_id: i32) -> Result<Vec<Vacation>> {
        let rows = sqlx::query_as::<_, Vacation>(&format!(
            "SELECT {} FROM vacations WHERE employee_id = $1 ORDER BY start_date DESC",
            VACATION_COLUMNS
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Leave balance for `year`: allowance is `annual + bonus` vacation days
    /// and `annual_sick_leave_days`; usage counts approved requests only,
    /// clipped to the calendar year.
    pub async fn get_leave_balance(&self, employee_id: i32, year: i32) -> Result<LeaveBalance> {
        let allowance: Option<(i32, i32, i32)> = sqlx::query_as(
            "SELECT annual_vacation_days, bonus_vacation_days, annual_sick_leave_days
             FROM employees WHERE id = $1",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((annual, bonus, sick)) = allowance else {
            anyhow::bail!("employee {} not found", employee_id);
        };

        let approved = self
            .get_employee_vacations(employee_id)
            .await?
            .into_iter()
            .filter(|v| v.status == VacationStatus::Approved)
            .filter(|v| v.start_date.year() <= year && v.end_date.year() >= year);

        let mut vacation_used = 0;
        let mut sick_leave_used = 0;
        for v in approved {
            let days = days_in_year(v.start_date, v.end_date, year);
            match v.kind {
                VacationType::Vacation => vacation_used += days,
                VacationType::SickLeave => sick_leave_used += days,
                VacationType::DayOff | VacationType::Remote => {}
            }
        }

        Ok(LeaveBalance {
            employee_id,
            year,
            vacation_allowance: i64::from(annual) + i64::from(bonus),
            vacation_used,
            sick_leave_allowance: i64::from(sick),
            sick_leave_used,
        })
    }
}
