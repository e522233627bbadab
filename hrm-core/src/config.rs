//! Application configuration
//!
//! Constants shared across the crate plus the environment-driven
//! configuration read once at startup.

use std::path::PathBuf;

// ===== Remote Mirror =====

/// Tenant root used when `HRM_COMPANY_ID` is not set
pub const DEFAULT_COMPANY_ID: &str = "newlanka";

/// Field the remote server fills with its own time on every mirrored entity
pub const SYNCED_AT_FIELD: &str = "_synced_at";

/// Field the remote server fills with its own time on audit entries
pub const AUDIT_TIMESTAMP_FIELD: &str = "timestamp";

pub const EMPLOYEES_COLLECTION: &str = "employees";
pub const REPORTS_COLLECTION: &str = "daily_cader_reports";
pub const AUDIT_LOGS_COLLECTION: &str = "audit_logs";

/// Upper bound on how long the binary waits for in-flight mirrors at exit
pub const MIRROR_DRAIN_TIMEOUT_SECS: u64 = 10;

// ===== Local Store =====

pub const DATABASE_FILE_NAME: &str = "hrm_system.db";

/// Default data directory when `HRM_DATA_DIR` is not set
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Number of reports returned by a history query when no limit is given
pub const DEFAULT_HISTORY_LIMIT: u32 = 30;

/// Window, in days, counted as "recent" for joinings and resignations
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Credentials and addressing for the cloud document store.
///
/// Loaded once per process. Empty environment values count as unset.
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    /// Bearer token for projects whose security rules require a signed-in user
    pub id_token: Option<String>,
    pub company_id: String,
}

impl RemoteConfig {
    /// Load remote configuration from `HRM_FIREBASE_*` environment variables
    pub fn from_env() -> Self {
        Self {
            api_key: env_opt("HRM_FIREBASE_API_KEY"),
            project_id: env_opt("HRM_FIREBASE_PROJECT_ID"),
            id_token: env_opt("HRM_FIREBASE_ID_TOKEN"),
            company_id: env_opt("HRM_COMPANY_ID").unwrap_or_else(|| DEFAULT_COMPANY_ID.to_string()),
        }
    }

    /// A configuration with only the minimal credential set filled in
    pub fn with_credentials(api_key: &str, project_id: &str) -> Self {
        Self {
            api_key: non_empty(api_key),
            project_id: non_empty(project_id),
            company_id: DEFAULT_COMPANY_ID.to_string(),
            ..Self::default()
        }
    }

    /// Remote mirroring is usable only when both an API key and a project id exist
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.project_id.is_some()
    }
}

/// Process-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub remote: RemoteConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: env_opt("HRM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            remote: RemoteConfig::from_env(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(&v))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_requires_key_and_project() {
        assert!(RemoteConfig::with_credentials("key", "project").is_configured());
        assert!(!RemoteConfig::with_credentials("key", "").is_configured());
        assert!(!RemoteConfig::with_credentials("  ", "project").is_configured());
        assert!(!RemoteConfig::default().is_configured());
    }

    #[test]
    fn test_company_id_defaults() {
        let config = RemoteConfig::with_credentials("key", "project");
        assert_eq!(config.company_id, DEFAULT_COMPANY_ID);
    }

    #[test]
    fn test_database_path() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/hrm"),
            remote: RemoteConfig::default(),
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/hrm/hrm_system.db"));
    }
}
