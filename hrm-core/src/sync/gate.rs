//! Availability gate for the remote mirror

use crate::config::RemoteConfig;

/// Whether the remote store may be used at all during this process.
///
/// Evaluated once from configuration and constant afterwards; a closed
/// gate turns every mirror operation into a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityGate {
    configured: bool,
}

impl AvailabilityGate {
    pub fn from_config(config: &RemoteConfig) -> Self {
        let configured = config.is_configured();

        if configured {
            tracing::info!("Remote mirror enabled for company {}", config.company_id);
        } else {
            tracing::info!("Remote mirror not configured; running local-only");
        }

        Self { configured }
    }

    pub fn open() -> Self {
        Self { configured: true }
    }

    pub fn closed() -> Self {
        Self { configured: false }
    }

    pub fn is_remote_configured(&self) -> bool {
        self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_follows_credentials() {
        let open = AvailabilityGate::from_config(&RemoteConfig::with_credentials("key", "proj"));
        assert!(open.is_remote_configured());

        let closed = AvailabilityGate::from_config(&RemoteConfig::default());
        assert!(!closed.is_remote_configured());
    }
}
