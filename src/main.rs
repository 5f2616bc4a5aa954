use anyhow::Result;
use gridpilot::config::Config;
use gridpilot::driver::ChargeDriver;
use gridpilot::homeassistant::HaClient;
use gridpilot::tibber::TibberPriceSource;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    gridpilot::logging::init_logging(&config.logging)?;
    info!("Gridpilot charge controller starting up");

    let price_source = TibberPriceSource::new(&config.tibber)?;
    let ha = HaClient::new(&config.home_assistant)?;

    let mut driver = ChargeDriver::new(
        config,
        Box::new(price_source),
        Box::new(ha.clone()),
        Box::new(ha.clone()),
        Box::new(ha),
    );

    // Ctrl-C requests a graceful stop; an in-flight cycle finishes first
    let shutdown = driver.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.request_shutdown();
        }
    });

    driver
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Driver error: {}", e))?;

    info!("Driver shutdown complete");
    Ok(())
}
