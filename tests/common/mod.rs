#![allow(dead_code)]

use leafbridge::config::DeviceSettings;
use leafbridge::error::{LeafBridgeError, Result};
use leafbridge::vehicle::{Credentials, VehicleConnector, VehicleSession};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Scripted vehicle API shared between the connector and its sessions
#[derive(Debug)]
pub struct FakeState {
    pub session_info: Value,
    pub battery: Value,
    pub climate: Value,
    pub fail_connect: bool,
    pub fail_climate: bool,
    pub fail_commands: bool,
    pub connects: usize,
    pub calls: Vec<String>,
}

#[derive(Clone)]
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                session_info: json!({
                    "status": 200,
                    "vehicleInfo": [{"nickname": "MyLeaf", "vin": "VIN123"}]
                }),
                battery: battery_doc("NOT_CHARGING", "CONNECTED", "76"),
                climate: json!({
                    "RemoteACRecords": {
                        "OperationResult": "START_BATTERY",
                        "RemoteACOperation": "START",
                        "PreAC_temp": "21",
                        "Inc_temp": "14"
                    }
                }),
                fail_connect: false,
                fail_climate: false,
                fail_commands: false,
                connects: 0,
                calls: Vec::new(),
            })),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

pub fn battery_doc(charging: &str, plugin: &str, soc: &str) -> Value {
    json!({
        "BatteryStatusRecords": {
            "BatteryStatus": {
                "BatteryChargingStatus": charging,
                "SOC": {"Value": soc}
            },
            "PluginState": plugin,
            "CruisingRangeAcOn": "150000",
            "CruisingRangeAcOff": "170000"
        }
    })
}

pub fn settings() -> DeviceSettings {
    DeviceSettings {
        username: "driver@example.com".to_string(),
        password: "hunter2".to_string(),
        poll_interval: 60,
        region_code: "NE".to_string(),
    }
}

struct FakeSession {
    state: Arc<Mutex<FakeState>>,
    session_info: Value,
}

impl FakeSession {
    fn command(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commands {
            return Err(LeafBridgeError::api("vehicle asleep"));
        }
        state.calls.push(name.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleConnector for FakeConnector {
    async fn connect(&self, _credentials: &Credentials) -> Result<Box<dyn VehicleSession>> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        if state.fail_connect {
            return Err(LeafBridgeError::session("invalid credentials"));
        }
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
            session_info: state.session_info.clone(),
        }))
    }
}

#[async_trait::async_trait]
impl VehicleSession for FakeSession {
    fn session_info(&self) -> Value {
        self.session_info.clone()
    }

    async fn cached_status(&self) -> Result<Value> {
        Ok(self.state.lock().unwrap().battery.clone())
    }

    async fn climate_control_status(&self) -> Result<Value> {
        let state = self.state.lock().unwrap();
        if state.fail_climate {
            return Err(LeafBridgeError::network("timed out"));
        }
        Ok(state.climate.clone())
    }

    async fn climate_control_turn_on(&self) -> Result<()> {
        self.command("climate_on")
    }

    async fn climate_control_turn_off(&self) -> Result<()> {
        self.command("climate_off")
    }

    async fn charging_start(&self) -> Result<()> {
        self.command("charging_start")
    }

    async fn set_target_temperature(&self, celsius: f64) -> Result<()> {
        self.command(&format!("set_temperature:{}", celsius))
    }
}
