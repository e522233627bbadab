//! Commands exposed to the frontend
//!
//! All commands follow the pattern:
//! - Take `&AppState` as first parameter
//! - Return `Result<T, AppError>`
//! - Record an audit entry after every successful mutation

use crate::app::AppState;
use crate::database::{
    AuditLog, DailyCaderReport, DashboardStats, Employee, NewAuditEntry, SaveCaderReportRequest,
};
use crate::error::Result;

/// Who is performing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub user_role: Option<String>,
    pub machine_name: Option<String>,
}

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_role: None,
            machine_name: machine_name(),
        }
    }
}

fn machine_name() -> Option<String> {
    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

/// Record an audit entry for a committed mutation.
///
/// Failures are logged; the mutation still reports success.
async fn audit(
    state: &AppState,
    actor: &Actor,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    details: Option<String>,
) {
    let entry = NewAuditEntry {
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: Some(entity_id.to_string()),
        details,
        username: actor.username.clone(),
        user_role: actor.user_role.clone(),
        machine_name: actor.machine_name.clone(),
    };

    if let Err(e) = state.audit.record(entry).await {
        tracing::error!("Failed to record audit entry {} {}: {}", action, entity_id, e);
    }
}

// ===== Employee Commands =====

pub async fn save_employee(state: &AppState, actor: &Actor, employee: Employee) -> Result<String> {
    let existed = state.employees.get(&employee.epf_number).await?.is_some();

    let epf_number = state.employees.save(&employee).await?;

    let action = if existed { "UPDATE" } else { "CREATE" };
    let details = Some(format!("{} ({})", employee.full_name, employee.name_with_initials));
    audit(state, actor, action, "employee", &epf_number, details).await;

    Ok(epf_number)
}

pub async fn get_employee(state: &AppState, epf_number: &str) -> Result<Option<Employee>> {
    state.employees.get(epf_number).await
}

pub async fn list_employees(state: &AppState) -> Result<Vec<Employee>> {
    state.employees.list().await
}

pub async fn delete_employee(state: &AppState, actor: &Actor, epf_number: &str) -> Result<()> {
    state.employees.delete(epf_number).await?;
    audit(state, actor, "DELETE", "employee", epf_number, None).await;
    Ok(())
}

// ===== Daily Cader Report Commands =====

pub async fn save_daily_cader_report(
    state: &AppState,
    actor: &Actor,
    report: SaveCaderReportRequest,
) -> Result<i64> {
    let existed = state.reports.get_by_date(&report.report_date).await?.is_some();

    let id = state.reports.save(&report).await?;

    let action = if existed { "UPDATE" } else { "CREATE" };
    let details = Some(format!(
        "present {}/{} ({}% absent)",
        report.present_cader, report.actual_cader, report.absent_percent
    ));
    audit(state, actor, action, "daily_cader_report", &report.report_date, details).await;

    Ok(id)
}

pub async fn get_daily_cader_report(
    state: &AppState,
    report_date: &str,
) -> Result<Option<DailyCaderReport>> {
    state.reports.get_by_date(report_date).await
}

pub async fn get_cader_report_history(
    state: &AppState,
    limit: Option<u32>,
) -> Result<Vec<DailyCaderReport>> {
    state.reports.history(limit).await
}

pub async fn delete_daily_cader_report(
    state: &AppState,
    actor: &Actor,
    report_date: &str,
) -> Result<()> {
    state.reports.delete(report_date).await?;
    audit(state, actor, "DELETE", "daily_cader_report", report_date, None).await;
    Ok(())
}

// ===== Audit & Dashboard Commands =====

pub async fn list_audit_logs(state: &AppState, limit: u32) -> Result<Vec<AuditLog>> {
    state.audit.recent(limit).await
}

pub async fn get_dashboard_stats(state: &AppState) -> Result<DashboardStats> {
    state.dashboard.stats().await
}
