//! Error types for the Storage Cluster Operator
//!
//! Provides structured error types for the external-cluster bootstrap
//! pipeline: bundle retrieval, payload decoding, resource creation, and
//! the capability-flag update.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the operator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Object is missing required metadata: {0}")]
    MissingMetadata(String),

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Resource already exists: {kind}/{name}")]
    ResourceExists { kind: String, name: String },

    // =========================================================================
    // External Bundle Errors
    // =========================================================================
    #[error("External cluster bundle secret not found: {namespace}/{name}")]
    BundleUnavailable { name: String, namespace: String },

    #[error("External cluster bundle secret {secret} has no payload under key {key}")]
    BundleKeyMissing { secret: String, key: String },

    #[error("External cluster bundle payload is malformed: {0}")]
    BundleMalformed(#[from] serde_json::Error),
}

/// Action to take on error during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Requeue after specific duration
    RequeueAfter(Duration),
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Transient backend errors - retry with backoff
            Error::Kube(_) | Error::Internal(_) => ErrorAction::RequeueWithBackoff,

            // Bundle not published yet, or the shared operator config is not
            // deployed - both resolve out-of-band, poll at a slow cadence
            Error::BundleUnavailable { .. } | Error::ResourceNotFound { .. } => {
                ErrorAction::RequeueAfter(Duration::from_secs(30))
            }

            // Keeps failing until the upstream bundle is fixed; stays visible
            // as a persistent error without hammering the API server
            Error::BundleKeyMissing { .. } | Error::BundleMalformed(_) => {
                ErrorAction::RequeueAfter(Duration::from_secs(60))
            }

            // A new reconcile only helps once the owning object itself changes
            Error::MissingMetadata(_) => ErrorAction::NoRequeue,

            // The idempotent-create success path; callers filter this before
            // surfacing, a stray one is harmless
            Error::ResourceExists { .. } => ErrorAction::NoRequeue,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error means the object was already present.
    ///
    /// Covers both the in-process store variant and a Kubernetes 409
    /// AlreadyExists response; idempotent creation treats either as success.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Error::ResourceExists { .. } => true,
            Error::Kube(kube::Error::Api(ae)) => ae.code == 409,
            _ => false,
        }
    }
}

/// Result type alias for the operator
pub type Result<T> = std::result::Result<T, Error>;
