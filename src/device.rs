//! Device session for one paired vehicle
//!
//! A [`LeafDevice`] owns the settings captured at pairing, polls the vehicle
//! API on a fixed interval, reconciles the battery and climate documents into
//! a [`CapabilitySnapshot`], publishes it to the host store, and turns
//! capability writes into remote commands.
//!
//! - `reconcile`: pure status-to-capability derivation
//! - `poll`: activation, the repeating cycle, publishing
//! - `commands`: capability writes to remote commands

use crate::capability::{CapabilitySnapshot, CapabilityStore};
use crate::config::DeviceSettings;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::pairing::DeviceDescriptor;
use crate::vehicle::VehicleConnector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

mod commands;
mod poll;
pub mod reconcile;

pub use commands::DeviceCommand;
pub use poll::PollHandle;
pub use reconcile::reconcile;

/// Display name and stable identity of a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub name: String,
    /// Vehicle identification number
    pub id: String,
}

/// Last published state of a device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub timestamp: String,
    pub capabilities: CapabilitySnapshot,
    pub total_polls: u64,
    pub failed_polls: u64,
}

#[derive(Debug, Default)]
struct PollCounters {
    total: AtomicU64,
    failed: AtomicU64,
}

/// Device session for one vehicle
pub struct LeafDevice {
    identity: DeviceIdentity,
    settings: DeviceSettings,
    connector: Arc<dyn VehicleConnector>,
    store: Arc<dyn CapabilityStore>,
    /// Publish NaN/infinite values instead of skipping those writes
    publish_non_finite: bool,
    counters: PollCounters,
    snapshot_tx: watch::Sender<Option<Arc<DeviceSnapshot>>>,
    logger: StructuredLogger,
}

impl LeafDevice {
    pub fn new(
        identity: DeviceIdentity,
        settings: DeviceSettings,
        connector: Arc<dyn VehicleConnector>,
        store: Arc<dyn CapabilityStore>,
    ) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("device")
                .with_device_id(&identity.id)
                .with_field("region", settings.region_code.clone()),
        );
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            identity,
            settings,
            connector,
            store,
            publish_non_finite: true,
            counters: PollCounters::default(),
            snapshot_tx,
            logger,
        }
    }

    /// Build a device from a pairing descriptor
    pub fn from_descriptor(
        descriptor: &DeviceDescriptor,
        connector: Arc<dyn VehicleConnector>,
        store: Arc<dyn CapabilityStore>,
    ) -> Self {
        let identity = DeviceIdentity {
            name: descriptor.name.clone(),
            id: descriptor.data.id.clone(),
        };
        Self::new(identity, descriptor.settings.clone(), connector, store)
    }

    pub fn with_publish_non_finite(mut self, publish: bool) -> Self {
        self.publish_non_finite = publish;
        self
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// Watch the last successfully published snapshot (`None` until the first)
    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<Arc<DeviceSnapshot>>> {
        self.snapshot_tx.subscribe()
    }

    /// Number of poll cycles run and how many of them failed
    pub fn poll_counts(&self) -> (u64, u64) {
        (
            self.counters.total.load(Ordering::Relaxed),
            self.counters.failed.load(Ordering::Relaxed),
        )
    }

    fn record_snapshot(&self, capabilities: CapabilitySnapshot) {
        let (total_polls, failed_polls) = self.poll_counts();
        let snapshot = DeviceSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            capabilities,
            total_polls,
            failed_polls,
        };
        self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
    }
}

/// Create a device session and hand it to the host
pub fn create_device(
    identity: DeviceIdentity,
    settings: DeviceSettings,
    connector: Arc<dyn VehicleConnector>,
    store: Arc<dyn CapabilityStore>,
) -> Arc<LeafDevice> {
    Arc::new(LeafDevice::new(identity, settings, connector, store))
}
