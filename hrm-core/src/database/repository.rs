//! Repository layer for database operations
//!
//! CRUD for employees, daily cader reports and audit entries.
//! Every failure here propagates to the caller; nothing is swallowed.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Employees =====

    /// Create or overwrite an employee keyed by EPF number. Returns the key.
    pub async fn save_employee(&self, employee: &Employee) -> Result<String> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO employees (
                epf_number, name_with_initials, full_name, dob, police_area,
                transport_route, mobile_1, mobile_2, address, date_of_join,
                date_of_resign, working_status, marital_status, job_role,
                department, designation, allocation, cader, photo_path,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(epf_number) DO UPDATE SET
                name_with_initials = excluded.name_with_initials,
                full_name = excluded.full_name,
                dob = excluded.dob,
                police_area = excluded.police_area,
                transport_route = excluded.transport_route,
                mobile_1 = excluded.mobile_1,
                mobile_2 = excluded.mobile_2,
                address = excluded.address,
                date_of_join = excluded.date_of_join,
                date_of_resign = excluded.date_of_resign,
                working_status = excluded.working_status,
                marital_status = excluded.marital_status,
                job_role = excluded.job_role,
                department = excluded.department,
                designation = excluded.designation,
                allocation = excluded.allocation,
                cader = excluded.cader,
                photo_path = excluded.photo_path,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&employee.epf_number)
        .bind(&employee.name_with_initials)
        .bind(&employee.full_name)
        .bind(&employee.dob)
        .bind(&employee.police_area)
        .bind(&employee.transport_route)
        .bind(&employee.mobile_1)
        .bind(&employee.mobile_2)
        .bind(&employee.address)
        .bind(&employee.date_of_join)
        .bind(&employee.date_of_resign)
        .bind(employee.working_status)
        .bind(&employee.marital_status)
        .bind(&employee.job_role)
        .bind(&employee.department)
        .bind(&employee.designation)
        .bind(&employee.allocation)
        .bind(&employee.cader)
        .bind(&employee.photo_path)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved employee: {}", employee.epf_number);
        Ok(employee.epf_number.clone())
    }

    /// Get an employee by EPF number
    pub async fn get_employee(&self, epf_number: &str) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE epf_number = ?")
            .bind(epf_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// List all employees ordered by EPF number
    pub async fn list_employees(&self) -> Result<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY epf_number")
            .fetch_all(&self.pool)
            .await?;

        Ok(employees)
    }

    /// Permanently delete an employee
    pub async fn delete_employee(&self, epf_number: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM employees WHERE epf_number = ?")
            .bind(epf_number)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::EmployeeNotFound(epf_number.to_string()));
        }

        tracing::debug!("Deleted employee: {}", epf_number);
        Ok(())
    }

    // ===== Daily Cader Reports =====

    /// Create or overwrite the report for `report_date`.
    ///
    /// The header and its training line details are replaced in one
    /// transaction. The returned row id is stable across overwrites.
    pub async fn save_report(&self, req: &SaveCaderReportRequest) -> Result<i64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO daily_cader_reports (
                report_date, budget_cader, actual_cader, present_cader,
                absent_count, absent_percent, training_line_cader,
                training_line_present, training_line_absent_count,
                training_line_absent_percent, lto_up_to_date,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(report_date) DO UPDATE SET
                budget_cader = excluded.budget_cader,
                actual_cader = excluded.actual_cader,
                present_cader = excluded.present_cader,
                absent_count = excluded.absent_count,
                absent_percent = excluded.absent_percent,
                training_line_cader = excluded.training_line_cader,
                training_line_present = excluded.training_line_present,
                training_line_absent_count = excluded.training_line_absent_count,
                training_line_absent_percent = excluded.training_line_absent_percent,
                lto_up_to_date = excluded.lto_up_to_date,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&req.report_date)
        .bind(req.budget_cader)
        .bind(req.actual_cader)
        .bind(req.present_cader)
        .bind(req.absent_count)
        .bind(req.absent_percent)
        .bind(req.training_line_cader)
        .bind(req.training_line_present)
        .bind(req.training_line_absent_count)
        .bind(req.training_line_absent_percent)
        .bind(req.lto_up_to_date)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM training_line_details WHERE report_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (position, detail) in req.training_line_details.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO training_line_details (
                    report_id, position, line_name, actual_cader,
                    present_cader, absent_count, absent_percent
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(position as i64)
            .bind(&detail.line_name)
            .bind(detail.actual_cader)
            .bind(detail.present_cader)
            .bind(detail.absent_count)
            .bind(detail.absent_percent)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Saved cader report {} ({} training lines)",
            req.report_date,
            req.training_line_details.len()
        );
        Ok(id)
    }

    /// Get the report for a date, with its training line details in order
    pub async fn get_report_by_date(&self, report_date: &str) -> Result<Option<DailyCaderReport>> {
        let report = sqlx::query_as::<_, DailyCaderReport>(
            "SELECT * FROM daily_cader_reports WHERE report_date = ?",
        )
        .bind(report_date)
        .fetch_optional(&self.pool)
        .await?;

        match report {
            Some(mut report) => {
                report.training_line_details = self.load_training_lines(report.id).await?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    /// Most recent reports first, at most `limit` of them
    pub async fn get_report_history(&self, limit: u32) -> Result<Vec<DailyCaderReport>> {
        let mut reports = sqlx::query_as::<_, DailyCaderReport>(
            r#"
            SELECT * FROM daily_cader_reports
            ORDER BY report_date DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        for report in &mut reports {
            report.training_line_details = self.load_training_lines(report.id).await?;
        }

        Ok(reports)
    }

    /// Delete the report for a date together with its training lines
    pub async fn delete_report(&self, report_date: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM training_line_details
            WHERE report_id IN (SELECT id FROM daily_cader_reports WHERE report_date = ?)
            "#,
        )
        .bind(report_date)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query("DELETE FROM daily_cader_reports WHERE report_date = ?")
            .bind(report_date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ReportNotFound(report_date.to_string()));
        }

        tx.commit().await?;

        tracing::debug!("Deleted cader report: {}", report_date);
        Ok(())
    }

    async fn load_training_lines(&self, report_id: i64) -> Result<Vec<TrainingLineDetail>> {
        let details = sqlx::query_as::<_, TrainingLineDetail>(
            r#"
            SELECT line_name, actual_cader, present_cader, absent_count, absent_percent
            FROM training_line_details
            WHERE report_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    // ===== Audit Log =====

    /// Append an audit entry
    pub async fn insert_audit_log(&self, entry: &NewAuditEntry) -> Result<AuditLog> {
        let log = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (
                action, entity_type, entity_id, details,
                username, user_role, machine_name, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.details)
        .bind(&entry.username)
        .bind(&entry.user_role)
        .bind(&entry.machine_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Recorded audit entry {}: {}", log.id, log.action);
        Ok(log)
    }

    /// Newest audit entries first
    pub async fn list_audit_logs(&self, limit: u32) -> Result<Vec<AuditLog>> {
        let logs = sqlx::query_as::<_, AuditLog>(
            "SELECT * FROM audit_logs ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    // ===== Dashboard =====

    /// Headcount summary; groupings count active employees only
    pub async fn get_dashboard_stats(&self, recent_days: i64) -> Result<DashboardStats> {
        let cutoff = (Utc::now().date_naive() - Duration::days(recent_days))
            .format("%Y-%m-%d")
            .to_string();

        let total_employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;

        let active_employees: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE working_status = 'active'")
                .fetch_one(&self.pool)
                .await?;

        let recent_joinings: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE date_of_join >= ?")
                .bind(&cutoff)
                .fetch_one(&self.pool)
                .await?;

        let recent_resignations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE date_of_resign >= ?")
                .bind(&cutoff)
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardStats {
            total_employees,
            active_employees,
            resigned_employees: total_employees - active_employees,
            departments: self.count_active_by("department").await?,
            caders: self.count_active_by("cader").await?,
            allocations: self.count_active_by("allocation").await?,
            recent_joinings,
            recent_resignations,
        })
    }

    /// `column` is always one of a fixed set of identifiers, never user input
    async fn count_active_by(&self, column: &'static str) -> Result<Vec<NamedCount>> {
        let query = format!(
            r#"
            SELECT COALESCE({column}, '') AS name, COUNT(*) AS count
            FROM employees
            WHERE working_status = 'active'
            GROUP BY COALESCE({column}, '')
            ORDER BY count DESC, name ASC
            "#
        );

        let counts = sqlx::query_as::<_, NamedCount>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_repo() -> Repository {
        Repository::new(create_memory_pool().await.unwrap())
    }

    fn employee(epf: &str) -> Employee {
        Employee {
            epf_number: epf.to_string(),
            name_with_initials: "K. Perera".to_string(),
            full_name: "Kamal Perera".to_string(),
            department: Some("Sewing".to_string()),
            ..Employee::default()
        }
    }

    fn report(date: &str, actual: i64) -> SaveCaderReportRequest {
        SaveCaderReportRequest {
            report_date: date.to_string(),
            budget_cader: 100,
            actual_cader: actual,
            present_cader: actual - 5,
            absent_count: 5,
            absent_percent: 5.0,
            training_line_details: vec![
                TrainingLineDetail {
                    line_name: "TMO".to_string(),
                    actual_cader: 10,
                    present_cader: 9,
                    absent_count: 1,
                    absent_percent: 10.0,
                },
                TrainingLineDetail {
                    line_name: "QC".to_string(),
                    actual_cader: 4,
                    present_cader: 4,
                    ..TrainingLineDetail::default()
                },
            ],
            ..SaveCaderReportRequest::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_get_employee() {
        let repo = create_test_repo().await;

        let key = repo.save_employee(&employee("EPF001")).await.unwrap();
        assert_eq!(key, "EPF001");

        let fetched = repo.get_employee("EPF001").await.unwrap().unwrap();
        assert_eq!(fetched.full_name, "Kamal Perera");
        assert_eq!(fetched.working_status, WorkingStatus::Active);
        assert!(fetched.created_at.is_some());
    }

    #[tokio::test]
    async fn test_save_employee_upserts() {
        let repo = create_test_repo().await;

        repo.save_employee(&employee("EPF001")).await.unwrap();

        let mut changed = employee("EPF001");
        changed.working_status = WorkingStatus::Resign;
        changed.date_of_resign = Some("2024-05-01".to_string());
        repo.save_employee(&changed).await.unwrap();

        let all = repo.list_employees().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].working_status, WorkingStatus::Resign);
        assert_eq!(all[0].date_of_resign.as_deref(), Some("2024-05-01"));
    }

    #[tokio::test]
    async fn test_save_employee_rejects_blank_key() {
        let repo = create_test_repo().await;

        let result = repo.save_employee(&employee("  ")).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_delete_employee() {
        let repo = create_test_repo().await;

        repo.save_employee(&employee("EPF001")).await.unwrap();
        repo.delete_employee("EPF001").await.unwrap();

        assert!(repo.get_employee("EPF001").await.unwrap().is_none());

        let again = repo.delete_employee("EPF001").await;
        assert!(matches!(again, Err(AppError::EmployeeNotFound(_))));
    }

    #[tokio::test]
    async fn test_save_and_get_report() {
        let repo = create_test_repo().await;

        repo.save_report(&report("2024-06-01", 95)).await.unwrap();

        let fetched = repo.get_report_by_date("2024-06-01").await.unwrap().unwrap();
        assert_eq!(fetched.actual_cader, 95);
        assert_eq!(fetched.training_line_details.len(), 2);
        assert_eq!(fetched.training_line_details[0].line_name, "TMO");
        assert_eq!(fetched.training_line_details[1].line_name, "QC");
    }

    #[tokio::test]
    async fn test_save_report_overwrites_same_date() {
        let repo = create_test_repo().await;

        let first = repo.save_report(&report("2024-05-01", 90)).await.unwrap();

        let mut second = report("2024-05-01", 80);
        second.training_line_details.truncate(1);
        let second_id = repo.save_report(&second).await.unwrap();

        assert_eq!(first, second_id);

        let history = repo.get_report_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actual_cader, 80);
        assert_eq!(history[0].training_line_details.len(), 1);
    }

    #[tokio::test]
    async fn test_report_history_most_recent_first() {
        let repo = create_test_repo().await;

        for date in ["2024-05-02", "2024-05-03", "2024-05-01"] {
            repo.save_report(&report(date, 90)).await.unwrap();
        }

        let history = repo.get_report_history(2).await.unwrap();
        let dates: Vec<&str> = history.iter().map(|r| r.report_date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-03", "2024-05-02"]);
    }

    #[tokio::test]
    async fn test_delete_report_removes_details() {
        let repo = create_test_repo().await;

        repo.save_report(&report("2024-05-01", 90)).await.unwrap();
        repo.delete_report("2024-05-01").await.unwrap();

        assert!(repo.get_report_by_date("2024-05-01").await.unwrap().is_none());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM training_line_details")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        let again = repo.delete_report("2024-05-01").await;
        assert!(matches!(again, Err(AppError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_audit_log() {
        let repo = create_test_repo().await;

        for action in ["CREATE", "UPDATE"] {
            repo.insert_audit_log(&NewAuditEntry {
                action: action.to_string(),
                entity_type: "employee".to_string(),
                entity_id: Some("EPF001".to_string()),
                username: "admin".to_string(),
                ..NewAuditEntry::default()
            })
            .await
            .unwrap();
        }

        let logs = repo.list_audit_logs(10).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, "UPDATE");
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let repo = create_test_repo().await;
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

        let mut recent = employee("EPF001");
        recent.date_of_join = Some(today.clone());
        recent.cader = Some("Direct".to_string());
        repo.save_employee(&recent).await.unwrap();

        let mut old = employee("EPF002");
        old.date_of_join = Some("2001-01-01".to_string());
        old.department = None;
        repo.save_employee(&old).await.unwrap();

        let mut resigned = employee("EPF003");
        resigned.working_status = WorkingStatus::Resign;
        resigned.date_of_resign = Some(today);
        repo.save_employee(&resigned).await.unwrap();

        let stats = repo.get_dashboard_stats(30).await.unwrap();
        assert_eq!(stats.total_employees, 3);
        assert_eq!(stats.active_employees, 2);
        assert_eq!(stats.resigned_employees, 1);
        assert_eq!(stats.recent_joinings, 1);
        assert_eq!(stats.recent_resignations, 1);
        assert_eq!(
            stats.departments,
            vec![
                NamedCount { name: "".to_string(), count: 1 },
                NamedCount { name: "Sewing".to_string(), count: 1 },
            ]
        );
        assert_eq!(stats.caders[0].count, 1);
    }
}
