//! Fire-and-forget dispatch of mirror operations
//!
//! Services hand a [`SyncEvent`] to the dispatcher only after the local
//! write has committed. The dispatcher spawns one detached task per event
//! and returns immediately; the task owns its own error boundary.

use super::identity::EntityKind;
use super::mirror::{RemoteMirror, SyncOutcome};
use crate::database::{NewAuditEntry, Repository};
use tokio_util::task::TaskTracker;
use tracing::Instrument;

/// A completed, successful local mutation
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    EmployeeSaved { epf_number: String },
    EmployeeDeleted { epf_number: String },
    ReportSaved { report_date: String },
    ReportDeleted { report_date: String },
    AuditEvent(NewAuditEntry),
}

impl SyncEvent {
    pub fn operation(&self) -> &'static str {
        match self {
            SyncEvent::EmployeeSaved { .. } => "employee-saved",
            SyncEvent::EmployeeDeleted { .. } => "employee-deleted",
            SyncEvent::ReportSaved { .. } => "report-saved",
            SyncEvent::ReportDeleted { .. } => "report-deleted",
            SyncEvent::AuditEvent(_) => "audit-event",
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SyncEvent::EmployeeSaved { epf_number } | SyncEvent::EmployeeDeleted { epf_number } => {
                epf_number
            }
            SyncEvent::ReportSaved { report_date } | SyncEvent::ReportDeleted { report_date } => {
                report_date
            }
            SyncEvent::AuditEvent(entry) => &entry.action,
        }
    }
}

#[derive(Clone)]
pub struct SyncDispatcher {
    mirror: RemoteMirror,
    repo: Repository,
    tracker: TaskTracker,
}

impl SyncDispatcher {
    pub fn new(mirror: RemoteMirror, repo: Repository) -> Self {
        Self {
            mirror,
            repo,
            tracker: TaskTracker::new(),
        }
    }

    /// Schedule exactly one mirror call for `event` without waiting for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, event: SyncEvent) {
        let span = tracing::info_span!("mirror", op = event.operation(), key = %event.key());
        let mirror = self.mirror.clone();
        let repo = self.repo.clone();

        self.tracker.spawn(
            async move {
                let outcome = run(&mirror, &repo, event).await;
                tracing::debug!(?outcome, "mirror task finished");
            }
            .instrument(span),
        );
    }

    /// Number of mirror tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task dispatched so far has finished.
    ///
    /// Used at shutdown and by tests; dispatching stays possible afterwards.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

/// Body of one mirror task. Every failure ends here as an outcome.
async fn run(mirror: &RemoteMirror, repo: &Repository, event: SyncEvent) -> SyncOutcome {
    if !mirror.is_enabled() {
        return SyncOutcome::Skipped;
    }

    match event {
        SyncEvent::EmployeeSaved { epf_number } => match repo.get_employee(&epf_number).await {
            Ok(Some(employee)) => mirror.mirror_upsert(&employee).await,
            Ok(None) => {
                tracing::debug!("Employee {} gone before mirroring", epf_number);
                SyncOutcome::Skipped
            }
            Err(e) => {
                tracing::warn!("Could not re-read employee {} for mirroring: {}", epf_number, e);
                SyncOutcome::Failed
            }
        },
        SyncEvent::EmployeeDeleted { epf_number } => {
            mirror.mirror_delete(EntityKind::Employee, &epf_number).await
        }
        SyncEvent::ReportSaved { report_date } => {
            match repo.get_report_by_date(&report_date).await {
                Ok(Some(report)) => mirror.mirror_upsert(&report).await,
                Ok(None) => {
                    tracing::debug!("Report {} gone before mirroring", report_date);
                    SyncOutcome::Skipped
                }
                Err(e) => {
                    tracing::warn!("Could not re-read report {} for mirroring: {}", report_date, e);
                    SyncOutcome::Failed
                }
            }
        }
        SyncEvent::ReportDeleted { report_date } => {
            mirror
                .mirror_delete(EntityKind::DailyCaderReport, &report_date)
                .await
        }
        SyncEvent::AuditEvent(entry) => mirror.append_audit_entry(&entry).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, Employee, SaveCaderReportRequest};
    use crate::sync::{AvailabilityGate, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup(gate: AvailabilityGate) -> (SyncDispatcher, Repository, MemoryStore) {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        let store = MemoryStore::new();
        let mirror = RemoteMirror::new(gate, Arc::new(store.clone()), "newlanka");
        (SyncDispatcher::new(mirror, repo.clone()), repo, store)
    }

    #[tokio::test]
    async fn test_dispatch_returns_before_mirror_completes() {
        let (dispatcher, repo, store) = setup(AvailabilityGate::open()).await;
        store.set_latency(Duration::from_millis(200));

        let employee = Employee {
            epf_number: "EPF9".to_string(),
            name_with_initials: "A. B".to_string(),
            full_name: "A B".to_string(),
            ..Employee::default()
        };
        repo.save_employee(&employee).await.unwrap();

        dispatcher.dispatch(SyncEvent::EmployeeSaved {
            epf_number: "EPF9".to_string(),
        });

        assert_eq!(dispatcher.in_flight(), 1);
        assert!(store.document("companies/newlanka/employees/EPF9").await.is_none());

        dispatcher.settle().await;

        assert_eq!(dispatcher.in_flight(), 0);
        assert!(store.document("companies/newlanka/employees/EPF9").await.is_some());
    }

    #[tokio::test]
    async fn test_report_saved_mirrors_local_row() {
        let (dispatcher, repo, store) = setup(AvailabilityGate::open()).await;

        repo.save_report(&SaveCaderReportRequest {
            report_date: "2024-05-01".to_string(),
            actual_cader: 77,
            ..SaveCaderReportRequest::default()
        })
        .await
        .unwrap();

        dispatcher.dispatch(SyncEvent::ReportSaved {
            report_date: "2024-05-01".to_string(),
        });
        dispatcher.settle().await;

        let doc = store
            .document("companies/newlanka/daily_cader_reports/2024-05-01")
            .await
            .unwrap();
        assert_eq!(doc.get("actual_cader"), Some(&json!(77)));
        assert_eq!(doc.get("training_line_details"), Some(&json!([])));
        assert!(doc.contains_key("id"));
    }

    #[tokio::test]
    async fn test_missing_local_row_is_not_mirrored() {
        let (dispatcher, _repo, store) = setup(AvailabilityGate::open()).await;

        dispatcher.dispatch(SyncEvent::ReportSaved {
            report_date: "2024-05-01".to_string(),
        });
        dispatcher.settle().await;

        assert_eq!(store.calls().await.total(), 0);
    }

    #[tokio::test]
    async fn test_closed_gate_skips_everything() {
        let (dispatcher, _repo, store) = setup(AvailabilityGate::closed()).await;

        dispatcher.dispatch(SyncEvent::EmployeeDeleted {
            epf_number: "EPF1".to_string(),
        });
        dispatcher.dispatch(SyncEvent::AuditEvent(NewAuditEntry::default()));
        dispatcher.settle().await;

        assert_eq!(store.calls().await.total(), 0);
    }

    #[tokio::test]
    async fn test_settle_allows_further_dispatch() {
        let (dispatcher, _repo, store) = setup(AvailabilityGate::open()).await;

        dispatcher.dispatch(SyncEvent::ReportDeleted {
            report_date: "2024-05-01".to_string(),
        });
        dispatcher.settle().await;

        dispatcher.dispatch(SyncEvent::ReportDeleted {
            report_date: "2024-05-02".to_string(),
        });
        dispatcher.settle().await;

        assert_eq!(store.calls().await.delete, 2);
    }
}
