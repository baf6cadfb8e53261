#![allow(dead_code)]

use async_trait::async_trait;
use checkout_service::config::Config;
use checkout_service::models::{CreatedPreference, PreferenceDocument};
use checkout_service::services::{PaymentProvider, ProviderError};
use checkout_service::Application;
use service_core::config as core_config;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How the fake provider answers.
#[derive(Clone)]
pub enum FakeOutcome {
    Succeed,
    Reject { status: u16, message: String },
    Panic(String),
}

/// In-process payment provider that records every document it receives.
pub struct FakeProvider {
    outcome: FakeOutcome,
    received: Mutex<Vec<PreferenceDocument>>,
}

impl FakeProvider {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<PreferenceDocument> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_preference(
        &self,
        document: &PreferenceDocument,
    ) -> Result<CreatedPreference, ProviderError> {
        let count = {
            let mut received = self.received.lock().unwrap();
            received.push(document.clone());
            received.len()
        };

        match &self.outcome {
            FakeOutcome::Succeed => Ok(CreatedPreference {
                id: format!("pref-{}", count),
                checkout_url: format!(
                    "https://www.mercadopago.com.br/checkout/v1/redirect?pref_id=pref-{}",
                    count
                ),
            }),
            FakeOutcome::Reject { status, message } => Err(ProviderError::Api {
                status: *status,
                message: message.clone(),
            }),
            FakeOutcome::Panic(message) => panic!("{}", message),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn test_config(environment: &str, vars: &[(&str, &str)]) -> Config {
    let server = core_config::Config {
        port: 0, // Random port
        environment: environment.to_string(),
        ..core_config::Config::default()
    };
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(server, |key| vars.get(key).cloned())
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<FakeProvider>,
    client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeOutcome::Succeed, test_config("development", &[])).await
    }

    pub async fn spawn_with(outcome: FakeOutcome, config: Config) -> Self {
        let provider = Arc::new(FakeProvider::new(outcome));

        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the liveness endpoint
        let client = reqwest::Client::new();
        let ping_url = format!("{}/ping", address);
        for _ in 0..50 {
            if client.get(&ping_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            provider,
            client,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
