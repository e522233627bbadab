//! Daily cader report service
//!
//! One report per calendar date. Saving an existing date overwrites it in
//! place, locally and in the mirror.

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::database::{DailyCaderReport, Repository, SaveCaderReportRequest, TrainingLineDetail};
use crate::error::{AppError, Result};
use crate::sync::{SyncDispatcher, SyncEvent};
use chrono::{Local, NaiveDate};

/// Service for daily cader reports
#[derive(Clone)]
pub struct CaderService {
    repo: Repository,
    dispatcher: SyncDispatcher,
}

impl CaderService {
    pub fn new(repo: Repository, dispatcher: SyncDispatcher) -> Self {
        Self { repo, dispatcher }
    }

    /// Save (create or update) the report for its date. Returns the row id.
    ///
    /// The mirror re-reads the committed row rather than trusting `req`.
    pub async fn save(&self, req: &SaveCaderReportRequest) -> Result<i64> {
        validate(req)?;

        tracing::info!("Saving cader report for {}", req.report_date);

        let id = self.repo.save_report(req).await?;

        self.dispatcher.dispatch(SyncEvent::ReportSaved {
            report_date: req.report_date.clone(),
        });

        Ok(id)
    }

    /// Report for a `YYYY-MM-DD` date, if one was saved
    pub async fn get_by_date(&self, report_date: &str) -> Result<Option<DailyCaderReport>> {
        self.repo.get_report_by_date(report_date).await
    }

    /// Most recent reports first
    pub async fn history(&self, limit: Option<u32>) -> Result<Vec<DailyCaderReport>> {
        self.repo
            .get_report_history(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
    }

    pub async fn delete(&self, report_date: &str) -> Result<()> {
        tracing::info!("Deleting cader report for {}", report_date);

        self.repo.delete_report(report_date).await?;

        self.dispatcher.dispatch(SyncEvent::ReportDeleted {
            report_date: report_date.to_string(),
        });

        Ok(())
    }

    /// Today's date as `YYYY-MM-DD`
    pub fn today() -> String {
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    }
}

/// Strict ISO calendar date: zero-padded and a real day
pub fn is_iso_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string() == value)
        .unwrap_or(false)
}

fn validate(req: &SaveCaderReportRequest) -> Result<()> {
    if !is_iso_date(&req.report_date) {
        return Err(AppError::Validation(format!(
            "Report date must be YYYY-MM-DD, got '{}'",
            req.report_date
        )));
    }

    let counters = [
        ("budget_cader", req.budget_cader),
        ("actual_cader", req.actual_cader),
        ("present_cader", req.present_cader),
        ("absent_count", req.absent_count),
        ("training_line_cader", req.training_line_cader),
        ("training_line_present", req.training_line_present),
        ("training_line_absent_count", req.training_line_absent_count),
        ("lto_up_to_date", req.lto_up_to_date),
    ];
    for (name, value) in counters {
        check_count(name, value)?;
    }

    check_percent("absent_percent", req.absent_percent)?;
    check_percent("training_line_absent_percent", req.training_line_absent_percent)?;

    for detail in &req.training_line_details {
        validate_line(detail)?;
    }

    Ok(())
}

fn validate_line(detail: &TrainingLineDetail) -> Result<()> {
    check_count("actual_cader", detail.actual_cader)?;
    check_count("present_cader", detail.present_cader)?;
    check_count("absent_count", detail.absent_count)?;
    check_percent("absent_percent", detail.absent_percent)
}

fn check_count(name: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(AppError::Validation(format!("{name} must not be negative")));
    }
    Ok(())
}

fn check_percent(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{name} must be a non-negative number"
        )));
    }
    Ok(())
}
