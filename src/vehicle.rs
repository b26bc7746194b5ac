//! Remote vehicle API seam for LeafBridge
//!
//! The vehicle API client (authentication, HTTP transport, session caching)
//! lives outside this crate. This module defines the interface the core
//! consumes, the typed view of the loosely-shaped documents it returns, and a
//! file-backed replay client for offline runs.

use crate::error::Result;
use serde::{Deserialize, Serialize};

pub mod payload;
pub mod replay;

pub use payload::{
    AcRecord, AcRecords, BatteryStatusResponse, ClimateStatusResponse, LooseNumber, SessionInfo,
    VehicleInfo, coerce_number,
};
pub use replay::{ReplayCommand, ReplayConnector};

/// Account credentials passed through to the vehicle API on every connect
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub region_code: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("region_code", &self.region_code)
            .finish()
    }
}

/// Produces authenticated sessions against the vehicle API.
///
/// The core never reuses a session across operations: every poll cycle and
/// every command dispatch connects afresh. Implementations may cache
/// internally.
#[async_trait::async_trait]
pub trait VehicleConnector: Send + Sync {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn VehicleSession>>;
}

/// A live session handle returned by [`VehicleConnector::connect`].
///
/// Status documents are returned raw; decode them with [`payload`].
#[async_trait::async_trait]
pub trait VehicleSession: Send + Sync {
    /// Login response: `{status, vehicleInfo?, VehicleInfoList?: {vehicleInfo}}`
    fn session_info(&self) -> serde_json::Value;

    /// Last battery status the telematics unit reported
    async fn cached_status(&self) -> Result<serde_json::Value>;

    /// Remote climate-control history
    async fn climate_control_status(&self) -> Result<serde_json::Value>;

    async fn climate_control_turn_on(&self) -> Result<()>;

    async fn climate_control_turn_off(&self) -> Result<()>;

    /// There is no remote charge-stop operation.
    async fn charging_start(&self) -> Result<()>;

    async fn set_target_temperature(&self, celsius: f64) -> Result<()>;
}
