//! Dashboard service
//!
//! Read-only headcount summary from the local store.

use crate::config::RECENT_WINDOW_DAYS;
use crate::database::{DashboardStats, Repository};
use crate::error::Result;

#[derive(Clone)]
pub struct DashboardService {
    repo: Repository,
}

impl DashboardService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        self.repo.get_dashboard_stats(RECENT_WINDOW_DAYS).await
    }
}
