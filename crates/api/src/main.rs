use std::sync::Arc;

use anyhow::Context;

use repairdesk_api::{app, config::ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    repairdesk_observability::init(&config.log);

    if config.demo_data {
        tracing::warn!("seeding demo data; not for production use");
    }
    let services = app::services::build_services(config.demo_data).context("failed to seed demo data")?;
    let app = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
