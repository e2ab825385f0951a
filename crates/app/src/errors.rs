use thiserror::Error;

use splitbook_core::DomainError;
use splitbook_infra::StoreError;

use crate::config::ConfigError;

pub type AppResult<T> = Result<T, AppError>;

/// Failure surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Rejected user input; the form should stay open.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_validation())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Domain(DomainError::NotFound(_)) | Self::Store(StoreError::NotFound { .. })
        )
    }
}
