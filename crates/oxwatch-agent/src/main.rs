use anyhow::Result;
use oxwatch_agent::config::AgentConfig;
use oxwatch_collector::registry::SourceRegistry;
use oxwatch_init::registry::InitRegistry;
use oxwatch_notify::plugin::ActionRegistry;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("oxwatch=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/oxwatch.toml".to_string());

    let config = AgentConfig::load(&config_path)?;
    tracing::info!(path = %config_path, cycle_secs = config.cycle_secs, "oxwatch-agent starting");

    let inits = InitRegistry::detect();
    if inits.is_empty() {
        tracing::warn!("No init system detected, service status will be unknown");
    }

    let mut scheduler =
        config.build_scheduler(&SourceRegistry::default(), &ActionRegistry::default(), inits);
    scheduler.prepare().await;

    scheduler
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
