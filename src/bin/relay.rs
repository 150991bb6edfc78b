use anyhow::Context;
use tracing::info;

use lumina_calc::config::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lumina_calc::init_tracing();

    let config = RelayConfig::load().context("Failed to load relay configuration")?;
    info!(
        "Starting relay on port {} (static dir: {:?}, mail: {})",
        config.port,
        config.static_dir,
        if config.mail.is_some() { "enabled" } else { "disabled" }
    );

    lumina_calc::relay::serve(config).await
}
