//! File-backed vehicle client
//!
//! Serves captured API documents from a directory so the device can run
//! without network access:
//!
//! - `session.json` (optional, defaults to `{"status": 200}`)
//! - `battery_status.json`
//! - `climate_status.json`
//!
//! Files are re-read on every call, so editing them changes what the next
//! poll cycle sees. Issued commands are recorded instead of sent.

use super::{Credentials, VehicleConnector, VehicleSession};
use crate::error::{LeafBridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A command the replay client was asked to perform
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayCommand {
    ClimateOn,
    ClimateOff,
    ChargingStart,
    SetTargetTemperature(f64),
}

#[derive(Default)]
struct ReplayState {
    commands: Vec<ReplayCommand>,
    reject_logins: bool,
    commands_fail: bool,
}

/// Connector handing out sessions over a payload directory
#[derive(Clone)]
pub struct ReplayConnector {
    dir: PathBuf,
    state: Arc<Mutex<ReplayState>>,
    logger: StructuredLogger,
}

impl ReplayConnector {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            state: Arc::new(Mutex::new(ReplayState::default())),
            logger: get_logger("replay"),
        }
    }

    /// Refuse every subsequent login
    pub fn set_reject_logins(&self, reject: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.reject_logins = reject;
        }
    }

    /// Make every subsequent command fail as if the vehicle were unreachable
    pub fn set_commands_fail(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.commands_fail = fail;
        }
    }

    /// Commands issued so far, oldest first
    pub fn commands(&self) -> Vec<ReplayCommand> {
        self.state
            .lock()
            .map(|state| state.commands.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl VehicleConnector for ReplayConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn VehicleSession>> {
        let reject = self
            .state
            .lock()
            .map(|state| state.reject_logins)
            .unwrap_or(false);
        if reject {
            return Err(LeafBridgeError::session(format!(
                "login rejected for {} in region {}",
                credentials.username, credentials.region_code
            )));
        }

        let session_path = self.dir.join("session.json");
        let session_info = if tokio::fs::try_exists(&session_path).await? {
            read_json(&session_path).await?
        } else {
            serde_json::json!({ "status": 200 })
        };

        self.logger.debug(&format!(
            "Replay session opened for {} from {}",
            credentials.username,
            self.dir.display()
        ));

        Ok(Box::new(ReplaySession {
            dir: self.dir.clone(),
            session_info,
            state: Arc::clone(&self.state),
        }))
    }
}

struct ReplaySession {
    dir: PathBuf,
    session_info: serde_json::Value,
    state: Arc<Mutex<ReplayState>>,
}

impl ReplaySession {
    fn record(&self, command: ReplayCommand) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LeafBridgeError::api("replay state poisoned"))?;
        if state.commands_fail {
            return Err(LeafBridgeError::api(format!(
                "vehicle unreachable, {:?} not delivered",
                command
            )));
        }
        state.commands.push(command);
        Ok(())
    }
}

async fn read_json(path: &Path) -> Result<serde_json::Value> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LeafBridgeError::io(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&contents)?)
}

#[async_trait::async_trait]
impl VehicleSession for ReplaySession {
    fn session_info(&self) -> serde_json::Value {
        self.session_info.clone()
    }

    async fn cached_status(&self) -> Result<serde_json::Value> {
        read_json(&self.dir.join("battery_status.json")).await
    }

    async fn climate_control_status(&self) -> Result<serde_json::Value> {
        read_json(&self.dir.join("climate_status.json")).await
    }

    async fn climate_control_turn_on(&self) -> Result<()> {
        self.record(ReplayCommand::ClimateOn)
    }

    async fn climate_control_turn_off(&self) -> Result<()> {
        self.record(ReplayCommand::ClimateOff)
    }

    async fn charging_start(&self) -> Result<()> {
        self.record(ReplayCommand::ChargingStart)
    }

    async fn set_target_temperature(&self, celsius: f64) -> Result<()> {
        self.record(ReplayCommand::SetTargetTemperature(celsius))
    }
}
