//! Application state and initialization
//!
//! All services are wired here: one repository, one remote mirror gated by
//! configuration, and one dispatcher shared by every service.

use crate::config::AppConfig;
use crate::database::{self, Repository};
use crate::error::{AppError, Result};
use crate::services::{AuditService, CaderService, DashboardService, EmployeeService};
use crate::sync::{AvailabilityGate, FirestoreStore, RemoteMirror, RemoteStore, SyncDispatcher};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dispatcher: SyncDispatcher,
    pub employees: EmployeeService,
    pub reports: CaderService,
    pub audit: AuditService,
    pub dashboard: DashboardService,
}

impl AppState {
    /// Wire services over an open pool and a remote store.
    ///
    /// The availability gate is evaluated here, once, from `config.remote`.
    pub fn new(config: AppConfig, pool: SqlitePool, store: Arc<dyn RemoteStore>) -> Self {
        let repo = Repository::new(pool);
        let gate = AvailabilityGate::from_config(&config.remote);
        let mirror = RemoteMirror::new(gate, store, &config.remote.company_id);
        let dispatcher = SyncDispatcher::new(mirror, repo.clone());

        Self {
            employees: EmployeeService::new(repo.clone(), dispatcher.clone()),
            reports: CaderService::new(repo.clone(), dispatcher.clone()),
            audit: AuditService::new(repo.clone(), dispatcher.clone()),
            dashboard: DashboardService::new(repo),
            dispatcher,
            config,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;

    let pool = database::create_pool(&config.database_path()).await?;

    let store = FirestoreStore::from_config(&config.remote)
        .map_err(|e| AppError::Config(format!("Failed to build remote client: {}", e)))?;

    let state = AppState::new(config, pool, Arc::new(store));

    tracing::info!("Application initialized successfully");

    Ok(state)
}
