use anyhow::{Context, Result};
use serre::channels::ChannelMap;
use serre::config::Config;
use serre::logging::{get_logger, init_logging};
use serre::modbus::ModbusTransport;
use serre::simulator::{DeviceSimulator, RegisterBank, SimulatedReadings};
use serre::web::{AppState, serve};
use std::sync::Arc;

fn simulate_requested() -> bool {
    std::env::var("SERRE_SIMULATE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    let logger = get_logger("main");
    logger.info(&format!("Serre {} starting up", env!("APP_VERSION")));

    // Keep the simulator alive for the lifetime of the server
    let _simulator = if simulate_requested() {
        let bank = RegisterBank::with_readings(
            &ChannelMap::from(&config.registers),
            SimulatedReadings::default(),
        );
        let simulator = DeviceSimulator::start(([127, 0, 0, 1], 0).into(), bank).await?;
        let addr = simulator.local_addr();
        config.device.host = addr.ip().to_string();
        config.device.port = addr.port();
        logger.warn(&format!("Using simulated TCW241 at {}", addr));
        Some(simulator)
    } else {
        None
    };

    config.validate().context("Invalid configuration")?;

    let transport = Arc::new(ModbusTransport::new(&config.device));
    let state = AppState::new(config, transport)
        .await
        .context("Failed to open data stores")?;

    if let Err(e) = serve(state).await {
        logger.error(&format!("Web server error: {}", e));
        return Err(e);
    }
    Ok(())
}
