use anyhow::Result;
use cc_devnode::{DevNode, DevNodeConfig};
use cc_telemetry::{init_logging, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::for_service("cc-devnode"))?;

    let config = DevNodeConfig::from_env()?;
    info!(addr = %config.listen_addr, "Starting dev node. Press Ctrl+C to stop.");

    DevNode::new(config)
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
