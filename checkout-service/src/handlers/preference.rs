//! Checkout preference creation.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{CreatePreferenceRequest, CreatePreferenceResponse},
    services::{metrics, PreferenceBuilder, ProviderError},
    AppState,
};

const PROVIDER_FAILURE_MESSAGE: &str = "error creating preference";

/// Decode the body as JSON or as a urlencoded form. Anything undecodable is
/// treated as an empty request so that defaults apply.
pub fn decode_request(headers: &HeaderMap, body: &[u8]) -> CreatePreferenceRequest {
    if body.iter().all(u8::is_ascii_whitespace) {
        return CreatePreferenceRequest::default();
    }

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    let decoded = if is_form {
        serde_urlencoded::from_bytes(body).map_err(|e| e.to_string())
    } else {
        // Only a JSON object carries fields; arrays and scalars count as empty.
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value(value).map_err(|e| e.to_string())
            }
            Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
            Err(e) => Err(e.to_string()),
        }
    };

    decoded.unwrap_or_else(|error| {
        tracing::warn!(error = %error, "Undecodable create-preference body, using defaults");
        CreatePreferenceRequest::default()
    })
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn failure_reason(error: &ProviderError) -> &'static str {
    match error {
        ProviderError::NotConfigured(_) => "not_configured",
        ProviderError::Api { .. } => "api",
        ProviderError::Network(_) => "network",
        ProviderError::InvalidResponse(_) => "invalid_response",
    }
}

/// Create a checkout preference with the payment provider.
///
/// Returns the provider's preference id and hosted checkout URL. Provider
/// failures are relayed as 500 without retrying.
pub async fn create_preference(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreatePreferenceResponse>, AppError> {
    let request = decode_request(&headers, &body);
    let document = PreferenceBuilder::new(&state.config).build(&request);

    let item = &document.items[0];
    let product_id = item.id.clone();
    let provider = state.provider.name();

    tracing::info!(
        product_id = %product_id,
        unit_price = item.unit_price,
        quantity = item.quantity,
        external_reference = %document.external_reference,
        provider,
        "Creating preference"
    );

    match state.provider.create_preference(&document).await {
        Ok(created) => {
            tracing::info!(
                preference_id = %created.id,
                product_id = %product_id,
                "Preference created"
            );
            metrics::record_preference_created(&product_id, provider);

            Ok(Json(CreatePreferenceResponse {
                preference_id: created.id,
                preference_url: created.checkout_url,
            }))
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                product_id = %product_id,
                "Error creating preference"
            );
            metrics::record_preference_failure(&product_id, provider, failure_reason(&e));

            let details = e.to_string();
            let trace = (!state.config.is_production())
                .then(|| format!("{:?}", anyhow::Error::new(e)));

            Err(AppError::Provider {
                message: PROVIDER_FAILURE_MESSAGE.to_string(),
                details,
                trace,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn test_decode_json_body() {
        let request = decode_request(
            &headers("application/json"),
            br#"{"product_id":"plan_9","quantity":2}"#,
        );
        assert_eq!(
            request.product_id.and_then(|v| v.as_text()).as_deref(),
            Some("plan_9")
        );
        assert_eq!(request.quantity.and_then(|v| v.as_number()), Some(2.0));
    }

    #[test]
    fn test_decode_form_body() {
        let request = decode_request(
            &headers("application/x-www-form-urlencoded; charset=UTF-8"),
            b"product_id=plan_2&title=Plano+Trimestral",
        );
        assert_eq!(
            request.title.and_then(|v| v.as_text()).as_deref(),
            Some("Plano Trimestral")
        );
    }

    #[test]
    fn test_malformed_bodies_fall_back_to_defaults() {
        let bodies: [&[u8]; 4] = [b"{not json", b"null", b"[1,2,3]", b"   "];
        for body in bodies {
            let request = decode_request(&headers("application/json"), body);
            assert!(request.product_id.is_none());
            assert!(request.unit_price.is_none());
        }
    }

    #[test]
    fn test_missing_content_type_is_treated_as_json() {
        let request = decode_request(&HeaderMap::new(), br#"{"title":"Plano"}"#);
        assert!(request.title.is_some());
    }
}
