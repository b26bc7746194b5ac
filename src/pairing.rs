//! Pairing and discovery
//!
//! Pairing is one interactive session with two steps the host invokes in
//! order: `validate` checks the account form and opens a session, then
//! `list_devices` enumerates the account's vehicles as device descriptors.
//! Nothing is persisted between process restarts.

use crate::capability::{Capability, PAIRING_CAPABILITIES};
use crate::config::DeviceSettings;
use crate::error::{LeafBridgeError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::vehicle::payload::{present_number, status_code_of};
use crate::vehicle::{LooseNumber, SessionInfo, VehicleConnector, VehicleSession};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Account form submitted by the pairing UI; any field may be missing
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingForm {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    /// Seconds, as a number or a numeric string
    #[serde(default, deserialize_with = "present_number")]
    pub poll_interval: Option<LooseNumber>,
}

impl PairingForm {
    pub fn from_settings(settings: &DeviceSettings) -> Self {
        Self {
            username: Some(settings.username.clone()),
            password: Some(settings.password.clone()),
            region_code: Some(settings.region_code.clone()),
            poll_interval: Some(LooseNumber(settings.poll_interval.into())),
        }
    }

    /// Check every field is present and build the settings bundle
    pub fn to_settings(&self) -> Result<DeviceSettings> {
        let username = required(&self.username, "username", "Enter username")?;
        let password = required(&self.password, "password", "Enter password")?;
        let region_code = required(&self.region_code, "regionCode", "Select region code")?;

        let raw_interval = self
            .poll_interval
            .as_ref()
            .filter(|n| !is_blank(&n.0))
            .ok_or_else(|| LeafBridgeError::validation("pollInterval", "Enter poll interval"))?;
        let seconds = raw_interval.coerce();
        if !seconds.is_finite() || seconds < 1.0 || seconds.fract() != 0.0 {
            return Err(LeafBridgeError::validation(
                "pollInterval",
                "Poll interval must be a whole number of seconds",
            ));
        }

        Ok(DeviceSettings {
            username,
            password,
            poll_interval: seconds as u64,
            region_code,
        })
    }
}

fn required(field: &Option<String>, name: &str, message: &str) -> Result<String> {
    match field {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(LeafBridgeError::validation(name, message)),
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Device payload handed to the host for one discovered vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Vehicle nickname
    pub name: String,
    pub data: DeviceData,
    pub capabilities: Vec<Capability>,
    pub settings: DeviceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceData {
    /// Vehicle identification number
    pub id: String,
}

struct ValidatedAccount {
    settings: DeviceSettings,
    session: Box<dyn VehicleSession>,
}

/// Transient state of one pairing flow
pub struct PairingSession {
    connector: Arc<dyn VehicleConnector>,
    account: Mutex<Option<ValidatedAccount>>,
    logger: StructuredLogger,
}

impl PairingSession {
    pub fn new(connector: Arc<dyn VehicleConnector>) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("pairing").with_session_id(uuid::Uuid::new_v4().to_string()),
        );
        Self {
            connector,
            account: Mutex::new(None),
            logger,
        }
    }

    /// Validate the form and log in.
    ///
    /// Returns whether the login reported status 200. Missing fields fail with
    /// a validation error naming the field; connection errors propagate.
    pub async fn validate(&self, form: &PairingForm) -> Result<bool> {
        let settings = form.to_settings()?;
        let session = self.connector.connect(&settings.credentials()).await?;

        let status = status_code_of(&session.session_info());
        let accepted = status == 200.0;
        self.logger.info(&format!(
            "Login for {} in region {} returned status {}",
            settings.username, settings.region_code, status
        ));

        let mut account = self
            .account
            .lock()
            .map_err(|_| LeafBridgeError::session("pairing state poisoned"))?;
        *account = Some(ValidatedAccount { settings, session });
        Ok(accepted)
    }

    /// Vehicles on the validated account; empty on any error
    pub async fn list_devices(&self) -> Vec<DeviceDescriptor> {
        match self.discover() {
            Ok(devices) => {
                self.logger
                    .info(&format!("Discovered {} vehicle(s)", devices.len()));
                devices
            }
            Err(e) => {
                self.logger.error(&format!("Listing vehicles failed: {}", e));
                Vec::new()
            }
        }
    }

    fn discover(&self) -> Result<Vec<DeviceDescriptor>> {
        let account = self
            .account
            .lock()
            .map_err(|_| LeafBridgeError::session("pairing state poisoned"))?;
        let account = account
            .as_ref()
            .ok_or_else(|| LeafBridgeError::session("no validated session; run validate first"))?;

        let info = SessionInfo::from_value(account.session.session_info())?;
        let devices = info
            .vehicles()?
            .iter()
            .map(|vehicle| DeviceDescriptor {
                name: vehicle
                    .nickname
                    .clone()
                    .unwrap_or_else(|| vehicle.vin.clone()),
                data: DeviceData {
                    id: vehicle.vin.clone(),
                },
                capabilities: PAIRING_CAPABILITIES.to_vec(),
                settings: account.settings.clone(),
            })
            .collect();
        Ok(devices)
    }
}

/// Create a pairing session and hand it to the host
pub fn create_pairing_session(connector: Arc<dyn VehicleConnector>) -> PairingSession {
    PairingSession::new(connector)
}
