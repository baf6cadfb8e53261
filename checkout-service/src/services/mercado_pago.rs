//! Mercado Pago checkout preferences client.
//!
//! Implements `POST /checkout/preferences` of the Mercado Pago REST API.

use crate::config::MercadoPagoConfig;
use crate::models::{CreatedPreference, PreferenceDocument};
use crate::services::provider::{PaymentProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;

const INTEGRATOR_ID_HEADER: &str = "x-integrator-id";

/// Mercado Pago client for registering checkout preferences.
#[derive(Clone)]
pub struct MercadoPagoClient {
    client: Client,
    config: MercadoPagoConfig,
}

/// Successful preference creation response (only the fields we relay).
#[derive(Debug, Deserialize)]
pub struct PreferenceResponse {
    pub id: String,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
}

/// Mercado Pago API error body.
#[derive(Debug, Deserialize)]
pub struct MercadoPagoError {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl MercadoPagoClient {
    /// Create a new client. The configured timeout bounds the whole request.
    pub fn new(config: MercadoPagoConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { client, config })
    }

    /// Check if an access token is set.
    pub fn is_configured(&self) -> bool {
        !self.config.access_token.expose_secret().is_empty()
    }

    fn preferences_url(&self) -> String {
        format!("{}/checkout/preferences", self.config.api_base_url)
    }

    fn checkout_url(&self, response: PreferenceResponse) -> Result<CreatedPreference, ProviderError> {
        let (preferred, fallback) = if self.config.use_sandbox {
            (response.sandbox_init_point, response.init_point)
        } else {
            (response.init_point, response.sandbox_init_point)
        };

        let checkout_url = preferred.or(fallback).ok_or_else(|| {
            ProviderError::InvalidResponse(format!(
                "preference {} has no checkout URL",
                response.id
            ))
        })?;

        Ok(CreatedPreference {
            id: response.id,
            checkout_url,
        })
    }
}

#[async_trait]
impl PaymentProvider for MercadoPagoClient {
    async fn create_preference(
        &self,
        document: &PreferenceDocument,
    ) -> Result<CreatedPreference, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(
                "Mercado Pago access token is not set".to_string(),
            ));
        }

        let mut request = self
            .client
            .post(self.preferences_url())
            .bearer_auth(self.config.access_token.expose_secret())
            .json(document);

        if let Some(integrator_id) = &self.config.integrator_id {
            request = request.header(INTEGRATOR_ID_HEADER, integrator_id);
        }

        let response = request.send().await.map_err(ProviderError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ProviderError::Network)?;

        tracing::debug!(status = %status, body = %body, "Mercado Pago create_preference response");

        if status.is_success() {
            let created: PreferenceResponse = serde_json::from_str(&body)
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
            self.checkout_url(created)
        } else {
            let message = serde_json::from_str::<MercadoPagoError>(&body)
                .ok()
                .and_then(|error| error.message.or(error.error))
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("unknown error")
                            .to_string()
                    } else {
                        body.clone()
                    }
                });

            tracing::error!(
                status = status.as_u16(),
                message = %message,
                "Mercado Pago preference creation failed"
            );

            Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn name(&self) -> &'static str {
        "mercado_pago"
    }
}
