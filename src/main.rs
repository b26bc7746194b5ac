use anyhow::{Result, anyhow, bail};
use leafbridge::capability::MemoryCapabilityStore;
use leafbridge::config::Config;
use leafbridge::device::LeafDevice;
use leafbridge::pairing::{PairingForm, create_pairing_session};
use leafbridge::vehicle::ReplayConnector;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path),
        None => Config::load(),
    }
    .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    leafbridge::logging::init_logging(&config.logging)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    info!("LeafBridge {} starting", leafbridge::APP_VERSION);

    let connector = Arc::new(ReplayConnector::new(&config.replay_dir));

    // Run the same pairing steps the host would before creating the device
    let pairing = create_pairing_session(connector.clone());
    let form = PairingForm::from_settings(&config.device.settings);
    if !pairing.validate(&form).await? {
        bail!("Vehicle API rejected the account");
    }
    let descriptor = pairing
        .list_devices()
        .await
        .into_iter()
        .find(|d| config.device.vin.is_empty() || d.data.id == config.device.vin)
        .ok_or_else(|| anyhow!("Vehicle '{}' not found on account", config.device.vin))?;

    let store = Arc::new(MemoryCapabilityStore::with_capabilities(
        descriptor.capabilities.iter().copied(),
    ));
    let device = Arc::new(
        LeafDevice::from_descriptor(&descriptor, connector, store)
            .with_publish_non_finite(config.publish_non_finite),
    );

    let mut snapshots = device.subscribe_snapshot();
    let handle = device.start();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    match serde_json::to_string(&*snapshot) {
                        Ok(json) => info!("Published {}", json),
                        Err(e) => error!("Snapshot serialization failed: {}", e),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if !handle.stop().await {
        error!("Polling had already stopped before shutdown");
    }
    info!("LeafBridge shutdown complete");
    Ok(())
}
