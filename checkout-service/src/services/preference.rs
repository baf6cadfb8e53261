//! Checkout preference construction.
//!
//! Every field resolves by the precedence request value, then configured
//! default, then literal default. A request value that is absent, empty, zero
//! or not coercible falls through to the next source. Plan prices always come
//! from the catalog.

use crate::config::Config;
use crate::dtos::{CreatePreferenceRequest, FieldValue};
use crate::models::{
    AutoReturn, BackUrls, ExcludedId, PaymentMethods, PreferenceDocument, PreferenceItem,
};
use crate::services::catalog;
use chrono::{DateTime, Utc};
use reqwest::Url;

pub const MIN_INSTALLMENTS: u32 = 1;
pub const MAX_INSTALLMENTS: u32 = 6;

/// Builds the outbound preference document from an inbound request and the
/// process configuration.
pub struct PreferenceBuilder<'a> {
    config: &'a Config,
}

impl<'a> PreferenceBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn build(&self, request: &CreatePreferenceRequest) -> PreferenceDocument {
        self.build_at(request, Utc::now())
    }

    /// Same as [`build`](Self::build) with an explicit clock for the
    /// generated external reference.
    pub fn build_at(&self, request: &CreatePreferenceRequest, now: DateTime<Utc>) -> PreferenceDocument {
        let product = &self.config.product;
        let checkout = &self.config.checkout;

        let product_id = text(&request.product_id).unwrap_or_else(|| product.id.clone());
        let title = text(&request.title).unwrap_or_else(|| product.title.clone());
        let description = text(&request.description).unwrap_or_else(|| product.description.clone());
        let unit_price =
            resolve_unit_price(&product_id, request.unit_price.as_ref(), product.price);
        let quantity = resolve_quantity(request.quantity.as_ref());
        let picture_url = resolve_picture_url(text(&request.picture_url), &product.image_url);
        let installments =
            resolve_installments(request.max_installments.as_ref(), checkout.max_installments);

        let excluded_payment_methods = parse_exclusions(
            text(&request.excluded_payment_methods)
                .or_else(|| checkout.excluded_payment_methods.clone())
                .as_deref()
                .unwrap_or_default(),
        );
        let excluded_payment_types = parse_exclusions(
            text(&request.excluded_payment_types)
                .or_else(|| checkout.excluded_payment_types.clone())
                .as_deref()
                .unwrap_or_default(),
        );

        let external_reference = text(&request.external_reference)
            .or_else(|| checkout.external_reference.clone())
            .unwrap_or_else(|| generate_reference(&checkout.reference_prefix, &product_id, now));

        tracing::debug!(
            product_id = %product_id,
            unit_price,
            quantity,
            installments,
            external_reference = %external_reference,
            "Resolved preference fields"
        );

        PreferenceDocument {
            items: vec![PreferenceItem {
                id: product_id,
                title,
                description,
                picture_url,
                quantity,
                unit_price,
            }],
            external_reference,
            payment_methods: PaymentMethods {
                installments,
                excluded_payment_methods,
                excluded_payment_types,
            },
            back_urls: BackUrls {
                success: checkout.back_url_success.clone(),
                failure: checkout.back_url_failure.clone(),
                pending: checkout.back_url_pending.clone(),
            },
            notification_url: checkout.notification_url.clone(),
            auto_return: AutoReturn::Approved,
            statement_descriptor: checkout.statement_descriptor.clone(),
        }
    }
}

fn text(field: &Option<FieldValue>) -> Option<String> {
    field.as_ref().and_then(FieldValue::as_text)
}

/// Catalog price when `product_id` is a plan, otherwise the requested price,
/// otherwise `default`.
pub fn resolve_unit_price(product_id: &str, requested: Option<&FieldValue>, default: f64) -> f64 {
    catalog::plan_price(product_id)
        .unwrap_or_else(|| requested.and_then(FieldValue::as_number).unwrap_or(default))
}

/// Whole units, at least one.
pub fn resolve_quantity(requested: Option<&FieldValue>) -> u32 {
    requested
        .and_then(FieldValue::as_number)
        .map(f64::floor)
        .filter(|quantity| *quantity >= 1.0)
        .map(|quantity| quantity.min(u32::MAX as f64) as u32)
        .unwrap_or(1)
}

/// Floor, then clamp to `[MIN_INSTALLMENTS, MAX_INSTALLMENTS]`.
pub fn clamp_installments(value: f64) -> u32 {
    if value.is_nan() {
        return MIN_INSTALLMENTS;
    }
    value
        .floor()
        .clamp(MIN_INSTALLMENTS as f64, MAX_INSTALLMENTS as f64) as u32
}

pub fn resolve_installments(requested: Option<&FieldValue>, default: f64) -> u32 {
    clamp_installments(requested.and_then(FieldValue::as_number).unwrap_or(default))
}

/// `"visa, amex,,"` becomes `[{id: "visa"}, {id: "amex"}]`.
pub fn parse_exclusions(raw: &str) -> Vec<ExcludedId> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| ExcludedId { id: id.to_string() })
        .collect()
}

pub fn is_valid_picture_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Never fails the request: an invalid URL is replaced by the placeholder,
/// and an invalid placeholder drops the picture entirely.
fn resolve_picture_url(requested: Option<String>, placeholder: &str) -> Option<String> {
    if let Some(url) = requested {
        if is_valid_picture_url(&url) {
            return Some(url);
        }
        tracing::warn!(
            picture_url = %url,
            placeholder = %placeholder,
            "Product picture URL is not valid, falling back to placeholder"
        );
    }

    if is_valid_picture_url(placeholder) {
        Some(placeholder.to_string())
    } else {
        tracing::warn!(
            placeholder = %placeholder,
            "Placeholder picture URL is not valid, sending item without picture"
        );
        None
    }
}

/// Best-effort unique reference: `{prefix}-{product_id}-{unix_millis}`.
pub fn generate_reference(prefix: &str, product_id: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}-{}", prefix, product_id, now.timestamp_millis())
}
