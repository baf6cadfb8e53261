//! Outbound checkout preference document, shaped the way the Mercado Pago
//! preferences API expects it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PreferenceDocument {
    pub items: Vec<PreferenceItem>,
    pub external_reference: String,
    pub payment_methods: PaymentMethods,
    pub back_urls: BackUrls,
    pub notification_url: String,
    pub auto_return: AutoReturn,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_descriptor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentMethods {
    /// Maximum number of installments offered to the payer.
    pub installments: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_payment_methods: Vec<ExcludedId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_payment_types: Vec<ExcludedId>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExcludedId {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutoReturn {
    Approved,
}

/// A preference the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPreference {
    pub id: String,
    /// Hosted checkout URL the payer is redirected to.
    pub checkout_url: String,
}
