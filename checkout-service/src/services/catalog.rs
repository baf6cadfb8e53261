//! Membership plan price table.
//!
//! The server, not the caller, is the source of truth for plan prices: the
//! front-end only sends a plan id.

static PLAN_PRICES: &[(&str, f64)] = &[
    ("plan_1", 129.00),
    ("plan_2", 159.00),
    ("plan_3", 179.00),
    ("plan_4", 714.00),
    ("plan_5", 858.00),
    ("plan_6", 978.00),
    ("plan_7", 1308.00),
    ("plan_8", 1428.00),
    ("plan_9", 1788.00),
    ("plan_10", 250.00),
    ("plan_11", 185.00),
];

/// Authoritative unit price for a plan id, if it is a known plan.
pub fn plan_price(product_id: &str) -> Option<f64> {
    PLAN_PRICES
        .iter()
        .find(|(id, _)| *id == product_id)
        .map(|(_, price)| *price)
}

pub fn is_plan(product_id: &str) -> bool {
    plan_price(product_id).is_some()
}

pub fn plans() -> impl Iterator<Item = (&'static str, f64)> {
    PLAN_PRICES.iter().copied()
}
