//! Payment provider abstraction.
//!
//! The checkout flow only needs to register a preference document and get
//! back its id and hosted checkout URL, so that is the whole seam. Tests
//! swap in a fake implementation.

use crate::models::{CreatedPreference, PreferenceDocument};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The provider answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Register a checkout preference with the provider.
    async fn create_preference(
        &self,
        document: &PreferenceDocument,
    ) -> Result<CreatedPreference, ProviderError>;

    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;
}
