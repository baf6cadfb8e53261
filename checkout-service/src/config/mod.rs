//! Process configuration for the checkout service.
//!
//! Everything is read once at startup into an immutable [`Config`] that is
//! shared through the application state. Every key is optional and falls back
//! to a literal default.

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_PRODUCT_ID: &str = "prod_site_gym_001";
const DEFAULT_PRODUCT_TITLE: &str = "Plano Academia - Mensal";
const DEFAULT_PRODUCT_DESCRIPTION: &str = "Acesso mensal completo à academia";
const DEFAULT_PRODUCT_IMAGE_URL: &str = "https://site-gym-weld.vercel.app/logo512.png";
const DEFAULT_PRODUCT_PRICE: f64 = 2000.0;
const DEFAULT_MAX_INSTALLMENTS: f64 = 1.0;
const DEFAULT_REFERENCE_PREFIX: &str = "site-gym";
const DEFAULT_SITE_URL: &str = "https://site-gym-weld.vercel.app";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
const DEFAULT_MP_API_BASE_URL: &str = "https://api.mercadopago.com";
const DEFAULT_MP_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Debug)]
pub struct Config {
    pub server: core_config::Config,
    pub mercado_pago: MercadoPagoConfig,
    pub product: ProductDefaults,
    pub checkout: CheckoutDefaults,
    pub cors_allowed_origins: Vec<String>,
    /// Set when running on a serverless platform (e.g. `VERCEL=1`).
    pub deployment_platform: Option<String>,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct MercadoPagoConfig {
    pub access_token: Secret<String>,
    pub integrator_id: Option<String>,
    pub api_base_url: String,
    pub timeout: Duration,
    /// Relay `sandbox_init_point` instead of `init_point`.
    pub use_sandbox: bool,
}

/// Line-item values used when the caller omits them.
#[derive(Clone, Debug)]
pub struct ProductDefaults {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Also the placeholder substituted for an invalid `picture_url`.
    pub image_url: String,
    pub price: f64,
}

#[derive(Clone, Debug)]
pub struct CheckoutDefaults {
    pub max_installments: f64,
    pub excluded_payment_methods: Option<String>,
    pub excluded_payment_types: Option<String>,
    pub external_reference: Option<String>,
    pub reference_prefix: String,
    pub statement_descriptor: Option<String>,
    pub back_url_success: String,
    pub back_url_failure: String,
    pub back_url_pending: String,
    pub notification_url: String,
}

impl Config {
    /// Load from `.env`, the optional `configuration` file and the process
    /// environment.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let server = core_config::Config::load()?;
        Ok(Self::from_lookup(server, |key| env::var(key).ok()))
    }

    /// Build the configuration from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn from_lookup<F>(server: core_config::Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let get_number = |key: &str, default: f64| {
            get(key)
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value != 0.0)
                .unwrap_or(default)
        };

        let site_url = get_or("SITE_URL", DEFAULT_SITE_URL);
        let site_url = site_url.trim_end_matches('/');
        let backend_url = get_or("BACKEND_URL", DEFAULT_BACKEND_URL);
        let notification_url = get("MP_NOTIFICATION_URL")
            .unwrap_or_else(|| format!("{}/webhook", backend_url.trim_end_matches('/')));

        let timeout_ms = get("MP_TIMEOUT_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MP_TIMEOUT_MS);

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let deployment_platform = match get("VERCEL").as_deref() {
            Some("1") => Some("vercel".to_string()),
            _ => None,
        };

        Self {
            server,
            mercado_pago: MercadoPagoConfig {
                access_token: Secret::new(get("MP_ACCESS_TOKEN").unwrap_or_default()),
                integrator_id: get("MP_INTEGRATOR_ID"),
                api_base_url: get_or("MP_API_BASE_URL", DEFAULT_MP_API_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_millis(timeout_ms),
                use_sandbox: get("MP_USE_SANDBOX")
                    .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes"))
                    .unwrap_or(false),
            },
            product: ProductDefaults {
                id: get_or("PRODUCT_ID", DEFAULT_PRODUCT_ID),
                title: get_or("PRODUCT_TITLE", DEFAULT_PRODUCT_TITLE),
                description: get_or("PRODUCT_DESCRIPTION", DEFAULT_PRODUCT_DESCRIPTION),
                image_url: get_or("PRODUCT_IMAGE_URL", DEFAULT_PRODUCT_IMAGE_URL),
                price: get_number("PRODUCT_PRICE", DEFAULT_PRODUCT_PRICE),
            },
            checkout: CheckoutDefaults {
                max_installments: get_number("MP_MAX_INSTALLMENTS", DEFAULT_MAX_INSTALLMENTS),
                excluded_payment_methods: get("MP_EXCLUDED_PAYMENT_METHODS"),
                excluded_payment_types: get("MP_EXCLUDED_PAYMENT_TYPES"),
                external_reference: get("MP_EXTERNAL_REFERENCE"),
                reference_prefix: get_or("EXTERNAL_REFERENCE_PREFIX", DEFAULT_REFERENCE_PREFIX),
                statement_descriptor: get("MP_STATEMENT_DESCRIPTOR"),
                back_url_success: get("MP_BACK_URL_SUCCESS")
                    .unwrap_or_else(|| format!("{}/success", site_url)),
                back_url_failure: get("MP_BACK_URL_FAILURE")
                    .unwrap_or_else(|| format!("{}/failure", site_url)),
                back_url_pending: get("MP_BACK_URL_PENDING")
                    .unwrap_or_else(|| format!("{}/pending", site_url)),
                notification_url,
            },
            cors_allowed_origins,
            deployment_platform,
            service_name: "checkout-service".to_string(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(core_config::Config::default(), |key| vars.get(key).cloned())
    }

    #[test]
    fn test_literal_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.product.id, "prod_site_gym_001");
        assert_eq!(config.product.title, "Plano Academia - Mensal");
        assert_eq!(config.product.price, 2000.0);
        assert_eq!(config.checkout.max_installments, 1.0);
        assert_eq!(config.checkout.reference_prefix, "site-gym");
        assert_eq!(
            config.checkout.back_url_success,
            "https://site-gym-weld.vercel.app/success"
        );
        assert_eq!(
            config.checkout.notification_url,
            "http://localhost:8080/webhook"
        );
        assert_eq!(config.mercado_pago.timeout, Duration::from_millis(5000));
        assert!(config.mercado_pago.access_token.expose_secret().is_empty());
        assert!(config.cors_allowed_origins.is_empty());
        assert!(config.deployment_platform.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = config_from(&[
            ("MP_ACCESS_TOKEN", "APP_USR-123"),
            ("PRODUCT_PRICE", "99.9"),
            ("MP_MAX_INSTALLMENTS", "3"),
            ("BACKEND_URL", "https://api.example.com/"),
            ("MP_BACK_URL_PENDING", "https://example.com/wait"),
            ("CORS_ALLOWED_ORIGINS", "https://a.com, https://b.com,"),
            ("VERCEL", "1"),
        ]);

        assert_eq!(config.mercado_pago.access_token.expose_secret(), "APP_USR-123");
        assert_eq!(config.product.price, 99.9);
        assert_eq!(config.checkout.max_installments, 3.0);
        assert_eq!(
            config.checkout.notification_url,
            "https://api.example.com/webhook"
        );
        assert_eq!(config.checkout.back_url_pending, "https://example.com/wait");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.com".to_string(), "https://b.com".to_string()]
        );
        assert_eq!(config.deployment_platform.as_deref(), Some("vercel"));
    }

    #[test]
    fn test_notification_url_override_wins_over_backend_url() {
        let config = config_from(&[
            ("BACKEND_URL", "https://api.example.com"),
            ("MP_NOTIFICATION_URL", "https://hooks.example.com/mp"),
        ]);
        assert_eq!(
            config.checkout.notification_url,
            "https://hooks.example.com/mp"
        );
    }

    #[test]
    fn test_unparseable_and_empty_values_fall_back() {
        let config = config_from(&[
            ("PRODUCT_PRICE", "abc"),
            ("MP_MAX_INSTALLMENTS", "0"),
            ("PRODUCT_TITLE", "   "),
            ("MP_TIMEOUT_MS", "soon"),
        ]);

        assert_eq!(config.product.price, 2000.0);
        assert_eq!(config.checkout.max_installments, 1.0);
        assert_eq!(config.product.title, "Plano Academia - Mensal");
        assert_eq!(config.mercado_pago.timeout, Duration::from_millis(5000));
    }
}
