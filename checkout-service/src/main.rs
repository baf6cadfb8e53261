use checkout_service::{config::Config, Application};
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    init_tracing(
        &config.service_name,
        &format!("{},checkout_service=debug", config.server.log_level),
        config.server.otel_exporter_otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        environment = %config.server.environment,
        production = config.is_production(),
        "Starting checkout service"
    );

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
