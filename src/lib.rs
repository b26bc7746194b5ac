//! # LeafBridge - Nissan Leaf integration for home automation
//!
//! Exposes one vehicle as a set of observable and controllable capabilities
//! (battery level, charging state, connectivity, cabin climate, cruising
//! range) on top of the remote telematics API.
//!
//! ## Architecture
//!
//! - `vehicle`: the remote vehicle API seam, typed payloads, replay client
//! - `capability`: capability names, values, snapshots and the host store seam
//! - `device`: per-vehicle polling, reconciliation and command dispatch
//! - `pairing`: credential validation and vehicle discovery
//! - `config`: YAML configuration and per-device settings
//! - `logging`: structured logging and tracing
//! - `error`: error types
//!
//! Data flows from pairing (once) into device settings, then repeatedly from
//! the vehicle API through the reconciler into the host capability store.
//! Capability writes flow the other way as remote commands.

pub mod capability;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod pairing;
pub mod vehicle;

// Re-export commonly used types
pub use capability::{Capability, CapabilitySnapshot, CapabilityStore, CapabilityValue};
pub use config::{Config, DeviceSettings};
pub use device::{DeviceCommand, LeafDevice, create_device};
pub use error::{LeafBridgeError, Result};
pub use pairing::{DeviceDescriptor, PairingForm, PairingSession, create_pairing_session};
pub use vehicle::{Credentials, VehicleConnector, VehicleSession};

/// Crate version reported at startup
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
