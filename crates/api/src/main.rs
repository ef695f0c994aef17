use anyhow::Context;
use axum::http::HeaderValue;

use sweetshop_api::app::{AppServices, build_app};
use sweetshop_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sweetshop_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let cors_origin = HeaderValue::from_str(&config.cors_origin).context("CORS_ORIGIN is not a valid header value")?;

    let services = AppServices::from_config(&config).await?;
    let app = build_app(services, Some(cors_origin));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
