use client_priority_engine::{
    api::start_server,
    config::EngineConfig,
    coordinator::RankingCoordinator,
    sources::{CrmApiClient, SignalSources},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::from_env()?;

    let crm_base_url = config
        .crm_api_base_url
        .clone()
        .ok_or("CRM_API_BASE_URL must be set")?;

    info!("Client Priority Engine - API Server");
    info!(
        port = config.port,
        crm = %crm_base_url,
        ai_enabled = config.ai.is_some(),
        "Configuration loaded"
    );

    let crm = Arc::new(CrmApiClient::new(&crm_base_url)?);
    let coordinator = Arc::new(RankingCoordinator::from_config(
        &config,
        SignalSources::from_backend(crm),
    )?);

    start_server(coordinator, config.port).await?;

    Ok(())
}
