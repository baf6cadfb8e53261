//! Mercado Pago notification receiver.
//!
//! Notifications are logged and acknowledged. The `x-signature` header sent
//! by Mercado Pago is not verified yet, so nothing here may change state.

use axum::{body::Bytes, extract::Query, http::StatusCode};
use serde::Deserialize;
use serde_json::Value;

/// Query parameters Mercado Pago appends to notification URLs.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub topic: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
}

/// Parse a notification body. An empty body is an empty object.
pub fn parse_notification(body: &[u8]) -> Result<Value, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body)
}

fn field(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(|field| match field {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Log the notification and acknowledge it with `OK`.
pub async fn webhook(
    query: Option<Query<NotificationQuery>>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let query = query.map(|Query(query)| query).unwrap_or_default();

    match parse_notification(&body) {
        Ok(notification) => {
            let kind = field(&notification, "/type")
                .or(query.kind)
                .or(query.topic);
            let resource_id = field(&notification, "/data/id")
                .or(query.data_id)
                .or(query.id);

            tracing::info!(
                kind = ?kind,
                action = ?field(&notification, "/action"),
                resource_id = ?resource_id,
                notification = %notification,
                "Received Mercado Pago notification"
            );

            (StatusCode::OK, "OK")
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                body = %String::from_utf8_lossy(&body),
                "Error processing webhook"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "ERROR")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(parse_notification(b"").unwrap(), serde_json::json!({}));
        assert_eq!(parse_notification(b" \n").unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_any_json_shape_is_accepted() {
        assert!(parse_notification(br#"{"type":"payment","data":{"id":"123"}}"#).is_ok());
        assert!(parse_notification(b"[1,2]").is_ok());
        assert!(parse_notification(b"\"text\"").is_ok());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(parse_notification(b"{oops").is_err());
    }

    #[test]
    fn test_field_extraction() {
        let value = serde_json::json!({ "type": "payment", "data": { "id": 987 } });
        assert_eq!(field(&value, "/type").as_deref(), Some("payment"));
        assert_eq!(field(&value, "/data/id").as_deref(), Some("987"));
        assert_eq!(field(&value, "/action"), None);
    }
}
