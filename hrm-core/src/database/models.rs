//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to the frontend and the cloud mirror.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Employment state of an employee
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum WorkingStatus {
    #[default]
    Active,
    Resign,
}

/// An employee record keyed by EPF number.
///
/// Optional attributes stay `None` when the form leaves them blank;
/// `working_status` defaults to `active`. The timestamps are filled by the
/// local store and ignored on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub epf_number: String,
    pub name_with_initials: String,
    pub full_name: String,
    pub dob: Option<String>,
    pub police_area: Option<String>,
    pub transport_route: Option<String>,
    pub mobile_1: Option<String>,
    pub mobile_2: Option<String>,
    pub address: Option<String>,
    pub date_of_join: Option<String>,
    pub date_of_resign: Option<String>,
    #[serde(default)]
    pub working_status: WorkingStatus,
    pub marital_status: Option<String>,
    pub job_role: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub allocation: Option<String>,
    pub cader: Option<String>,
    /// Opaque path to an externally stored photo
    pub photo_path: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-line breakdown embedded in a daily cader report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TrainingLineDetail {
    pub line_name: String,
    #[serde(default)]
    pub actual_cader: i64,
    #[serde(default)]
    pub present_cader: i64,
    #[serde(default)]
    pub absent_count: i64,
    #[serde(default)]
    pub absent_percent: f64,
}

/// A stored daily attendance ("cader") report, one per calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailyCaderReport {
    pub id: i64,
    /// ISO `YYYY-MM-DD`
    pub report_date: String,
    pub budget_cader: i64,
    pub actual_cader: i64,
    pub present_cader: i64,
    pub absent_count: i64,
    pub absent_percent: f64,
    pub training_line_cader: i64,
    pub training_line_present: i64,
    pub training_line_absent_count: i64,
    pub training_line_absent_percent: f64,
    pub lto_up_to_date: i64,
    #[sqlx(skip)]
    pub training_line_details: Vec<TrainingLineDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Save (create or overwrite) cader report request.
///
/// Counters the form omits default to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveCaderReportRequest {
    pub report_date: String,
    #[serde(default)]
    pub budget_cader: i64,
    #[serde(default)]
    pub actual_cader: i64,
    #[serde(default)]
    pub present_cader: i64,
    #[serde(default)]
    pub absent_count: i64,
    #[serde(default)]
    pub absent_percent: f64,
    #[serde(default)]
    pub training_line_cader: i64,
    #[serde(default)]
    pub training_line_present: i64,
    #[serde(default)]
    pub training_line_absent_count: i64,
    #[serde(default)]
    pub training_line_absent_percent: f64,
    #[serde(default)]
    pub lto_up_to_date: i64,
    #[serde(default)]
    pub training_line_details: Vec<TrainingLineDetail>,
}

/// New audit event, as recorded by the acting user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub username: String,
    pub user_role: Option<String>,
    pub machine_name: Option<String>,
}

/// Locally persisted audit event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub username: String,
    pub user_role: Option<String>,
    pub machine_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Headcount grouped by a single attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

/// Summary numbers shown on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_employees: i64,
    pub active_employees: i64,
    pub resigned_employees: i64,
    pub departments: Vec<NamedCount>,
    pub caders: Vec<NamedCount>,
    pub allocations: Vec<NamedCount>,
    pub recent_joinings: i64,
    pub recent_resignations: i64,
}
