//! Shared application state handed to every handler.

use std::fmt::Debug;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{Store, StoreError};
use crate::routes::ApiError;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Log an unclassified failure and wrap it for the client. The internal
    /// detail is only attached outside production.
    pub fn internal_error(&self, message: &str, err: impl Debug) -> ApiError {
        tracing::error!(error = ?err, "{}", message);
        ApiError::Internal {
            message: message.to_string(),
            detail: (!self.config.is_production()).then(|| format!("{:?}", err)),
        }
    }

    /// Duplicate-key conflicts surface as-is; everything else is internal.
    pub fn store_error(&self, message: &str, err: StoreError) -> ApiError {
        match err {
            StoreError::Duplicate { field } => ApiError::Duplicate { field },
            other => self.internal_error(message, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_hides_detail_in_production() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..Default::default()
        };
        let state = AppState::new(config, Store::memory());
        match state.internal_error("boom", "disk full") {
            ApiError::Internal { detail, .. } => assert!(detail.is_none()),
            other => panic!("unexpected {:?}", other),
        }

        let dev = AppState::new(AppConfig::default(), Store::memory());
        match dev.internal_error("boom", "disk full") {
            ApiError::Internal { detail, .. } => assert_eq!(detail.as_deref(), Some("\"disk full\"")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_store_error_keeps_field() {
        let state = AppState::new(AppConfig::default(), Store::memory());
        let err = state.store_error("Failed", StoreError::duplicate("email"));
        assert!(matches!(err, ApiError::Duplicate { ref field } if field == "email"));
    }
}
