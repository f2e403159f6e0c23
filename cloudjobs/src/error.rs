//! Structured failures returned by collaborators and by the `try_*` forms of
//! each lifecycle component.
//!
//! The plain forms (`list_jobs`, `launch`, `cancel`) log these and collapse
//! them into an empty listing or `false`.

use crate::job::{ExecutionName, JobName, OperationHandle};

/// Failure reported by a remote collaborator for a single call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("resource not found: {resource}")]
    NotFound { resource: String },

    #[error("permission denied on {resource}")]
    PermissionDenied { resource: String },

    #[error("quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("operation {operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },
}

impl ServiceError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::Unavailable { .. } => "unavailable",
            Self::Transport { .. } => "transport",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("listing {listing} failed on page {page}")]
    Page {
        listing: String,
        page: u32,
        #[source]
        source: ServiceError,
    },

    #[error("listing {listing} exceeded {max_pages} pages")]
    PageLimit { listing: String, max_pages: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("start request for {job} was rejected")]
    Submit {
        job: JobName,
        #[source]
        source: ServiceError,
    },

    #[error("polling operation {operation} for {job} failed")]
    Poll {
        job: JobName,
        operation: OperationHandle,
        #[source]
        source: ServiceError,
    },

    #[error("operation {operation} for {job} finished with failure: {reason}")]
    OperationFailed {
        job: JobName,
        operation: OperationHandle,
        reason: String,
    },

    #[error("operation {operation} for {job} still pending after {polls} polls")]
    PollLimit {
        job: JobName,
        operation: OperationHandle,
        polls: u32,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("cancel request for {execution} failed")]
pub struct CancelError {
    pub execution: ExecutionName,
    #[source]
    pub source: ServiceError,
}
