//! Capabilities exposed to the home-automation host
//!
//! A capability is a named, typed device attribute. The host owns the store;
//! this module names the capabilities, carries their values, and defines the
//! store interface the device writes through.

use crate::error::{LeafBridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Capability names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ButtonClimate,
    ButtonCharging,
    IsCharging,
    IsConnected,
    MeasureBattery,
    SetTemperature,
    MeasureTemperatureActual,
    CruisingRangeAcOff,
    CruisingRangeAcOn,
}

/// Capabilities every vehicle is created with at pairing time.
///
/// `measure_temperature_actual` is added by the device itself on activation.
pub const PAIRING_CAPABILITIES: [Capability; 8] = [
    Capability::MeasureBattery,
    Capability::ButtonClimate,
    Capability::ButtonCharging,
    Capability::IsCharging,
    Capability::IsConnected,
    Capability::CruisingRangeAcOff,
    Capability::CruisingRangeAcOn,
    Capability::SetTemperature,
];

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ButtonClimate => "button_climate",
            Self::ButtonCharging => "button_charging",
            Self::IsCharging => "is_charging",
            Self::IsConnected => "is_connected",
            Self::MeasureBattery => "measure_battery",
            Self::SetTemperature => "set_temperature",
            Self::MeasureTemperatureActual => "measure_temperature_actual",
            Self::CruisingRangeAcOff => "cruising_range_ac_off",
            Self::CruisingRangeAcOn => "cruising_range_ac_on",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "button_climate" => Some(Self::ButtonClimate),
            "button_charging" => Some(Self::ButtonCharging),
            "is_charging" => Some(Self::IsCharging),
            "is_connected" => Some(Self::IsConnected),
            "measure_battery" => Some(Self::MeasureBattery),
            "set_temperature" => Some(Self::SetTemperature),
            "measure_temperature_actual" => Some(Self::MeasureTemperatureActual),
            "cruising_range_ac_off" => Some(Self::CruisingRangeAcOff),
            "cruising_range_ac_on" => Some(Self::CruisingRangeAcOn),
            _ => None,
        }
    }

    /// Whether the host may write this capability (controls vs sensors)
    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            Self::ButtonClimate | Self::ButtonCharging | Self::SetTemperature
        )
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed capability value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Bool(bool),
    Number(f64),
}

impl CapabilityValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(_) => None,
        }
    }

    /// False only for NaN and infinite numbers
    pub fn is_finite(&self) -> bool {
        self.as_f64().is_none_or(f64::is_finite)
    }
}

impl From<bool> for CapabilityValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for CapabilityValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Capability values derived from one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub button_climate: bool,
    pub button_charging: bool,
    pub is_charging: bool,
    pub is_connected: bool,
    /// State of charge, percent
    pub measure_battery: f64,
    /// Last requested cabin temperature
    pub set_temperature: f64,
    /// Measured cabin temperature
    pub measure_temperature_actual: f64,
    /// Kilometers
    pub cruising_range_ac_off: f64,
    /// Kilometers
    pub cruising_range_ac_on: f64,
}

impl CapabilitySnapshot {
    /// Individual writes in publishing order
    pub fn entries(&self) -> [(Capability, CapabilityValue); 9] {
        [
            (Capability::ButtonClimate, self.button_climate.into()),
            (Capability::ButtonCharging, self.button_charging.into()),
            (Capability::MeasureBattery, self.measure_battery.into()),
            (Capability::IsCharging, self.is_charging.into()),
            (Capability::IsConnected, self.is_connected.into()),
            (Capability::SetTemperature, self.set_temperature.into()),
            (
                Capability::MeasureTemperatureActual,
                self.measure_temperature_actual.into(),
            ),
            (
                Capability::CruisingRangeAcOff,
                self.cruising_range_ac_off.into(),
            ),
            (
                Capability::CruisingRangeAcOn,
                self.cruising_range_ac_on.into(),
            ),
        ]
    }
}

/// Host-side capability storage.
///
/// Writes are independent: a failed write is reported for that capability
/// only.
#[async_trait::async_trait]
pub trait CapabilityStore: Send + Sync {
    async fn set_capability_value(
        &self,
        capability: Capability,
        value: CapabilityValue,
    ) -> Result<()>;

    /// Ensure the device carries a capability; a no-op when it already does
    async fn add_capability(&self, capability: Capability) -> Result<()> {
        let _ = capability;
        Ok(())
    }
}

/// In-memory capability store
pub struct MemoryCapabilityStore {
    values: Mutex<HashMap<Capability, CapabilityValue>>,
    capabilities: Mutex<HashSet<Capability>>,
    refused: HashSet<Capability>,
    logger: StructuredLogger,
}

impl MemoryCapabilityStore {
    /// A store for a device created with the given capability list
    pub fn with_capabilities(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            capabilities: Mutex::new(capabilities.into_iter().collect()),
            refused: HashSet::new(),
            logger: get_logger("store"),
        }
    }

    /// Fail every write to `capability`
    pub fn refusing(mut self, capability: Capability) -> Self {
        self.refused.insert(capability);
        self
    }

    pub fn get(&self, capability: Capability) -> Option<CapabilityValue> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(&capability).copied())
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities
            .lock()
            .map(|caps| caps.contains(&capability))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.lock().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CapabilityStore for MemoryCapabilityStore {
    async fn set_capability_value(
        &self,
        capability: Capability,
        value: CapabilityValue,
    ) -> Result<()> {
        if self.refused.contains(&capability) {
            return Err(LeafBridgeError::capability(format!(
                "write to {} refused",
                capability
            )));
        }
        if !self.has_capability(capability) {
            return Err(LeafBridgeError::capability(format!(
                "device has no capability {}",
                capability
            )));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|_| LeafBridgeError::capability("capability store poisoned"))?;
        values.insert(capability, value);
        self.logger
            .trace(&format!("{} = {}", capability, render(&value)));
        Ok(())
    }

    async fn add_capability(&self, capability: Capability) -> Result<()> {
        let mut caps = self
            .capabilities
            .lock()
            .map_err(|_| LeafBridgeError::capability("capability store poisoned"))?;
        if caps.insert(capability) {
            self.logger.info(&format!("Added capability {}", capability));
        }
        Ok(())
    }
}

fn render(value: &CapabilityValue) -> String {
    match value {
        CapabilityValue::Bool(b) => b.to_string(),
        CapabilityValue::Number(n) => n.to_string(),
    }
}
