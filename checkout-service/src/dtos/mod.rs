use serde::{Deserialize, Serialize};

/// A loosely typed inbound field. Browsers and form posts send numbers as
/// strings and vice versa, so every field accepts either and anything else
/// is treated as absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Non-empty text. Numbers are rendered without a trailing `.0` when
    /// integral; zero counts as absent.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) if !text.trim().is_empty() => Some(text.clone()),
            FieldValue::Number(n) if n.is_finite() && *n != 0.0 => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            _ => None,
        }
    }

    /// Finite, non-zero number, parsing numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(text) => text.trim().parse::<f64>().ok()?,
            FieldValue::Other(_) => return None,
        };
        (n.is_finite() && n != 0.0).then_some(n)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePreferenceRequest {
    pub product_id: Option<FieldValue>,
    pub title: Option<FieldValue>,
    pub description: Option<FieldValue>,
    pub picture_url: Option<FieldValue>,
    pub quantity: Option<FieldValue>,
    pub unit_price: Option<FieldValue>,
    pub max_installments: Option<FieldValue>,
    /// Comma separated payment method ids, e.g. `"visa,amex"`.
    pub excluded_payment_methods: Option<FieldValue>,
    /// Comma separated payment type ids, e.g. `"ticket,atm"`.
    pub excluded_payment_types: Option<FieldValue>,
    pub external_reference: Option<FieldValue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePreferenceResponse {
    pub preference_id: String,
    pub preference_url: String,
}
