//! Typed view of the vehicle API documents.
//!
//! Numbers arrive as strings (sometimes as numbers) and are coerced on read.
//! Only the nesting the core cannot do without is required; every leaf is
//! optional and checked where it is used.

use crate::error::{LeafBridgeError, Result};
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decode a raw document, naming the failing path on error
pub fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        LeafBridgeError::malformed(format!("{} at '{}': {}", what, e.path(), e.inner()))
    })
}

/// Plain numeric coercion of a loosely-typed value.
///
/// Never fails: anything that is not a number yields `NaN`.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => coerce_str(s),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn coerce_str(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return u128::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
        }
    }
    // Rust's float parser also takes "inf"/"nan"; keep to plain decimal literals
    if text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        text.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// A numeric field that may arrive as a string or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LooseNumber(pub Value);

impl LooseNumber {
    pub fn coerce(&self) -> f64 {
        coerce_number(&self.0)
    }

    /// Coerce an optional field; only an absent field is `NaN`
    pub fn coerce_opt(field: Option<&Self>) -> f64 {
        field.map_or(f64::NAN, Self::coerce)
    }
}

/// Field deserializer that keeps an explicit `null` as a present value.
///
/// Pair with `#[serde(default)]` so only a missing key yields `None`.
pub fn present_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<LooseNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| Some(LooseNumber(value)))
}

impl From<&str> for LooseNumber {
    fn from(s: &str) -> Self {
        Self(Value::String(s.to_string()))
    }
}

/// Root of the `cachedStatus()` document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatteryStatusResponse {
    #[serde(rename = "BatteryStatusRecords")]
    pub records: BatteryStatusRecords,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatteryStatusRecords {
    #[serde(rename = "BatteryStatus")]
    pub battery_status: BatteryStatus,
    #[serde(rename = "PluginState", default)]
    pub plugin_state: Option<String>,
    /// Meters
    #[serde(rename = "CruisingRangeAcOn", default, deserialize_with = "present_number")]
    pub cruising_range_ac_on: Option<LooseNumber>,
    /// Meters
    #[serde(rename = "CruisingRangeAcOff", default, deserialize_with = "present_number")]
    pub cruising_range_ac_off: Option<LooseNumber>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatteryStatus {
    #[serde(rename = "BatteryChargingStatus", default)]
    pub charging_status: Option<String>,
    #[serde(rename = "SOC")]
    pub soc: StateOfCharge,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateOfCharge {
    /// Percent
    #[serde(rename = "Value", default, deserialize_with = "present_number")]
    pub value: Option<LooseNumber>,
}

impl BatteryStatusResponse {
    pub fn from_value(value: Value) -> Result<Self> {
        decode("battery status", value)
    }
}

/// Root of the `climateControlStatus()` document
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClimateStatusResponse {
    #[serde(rename = "RemoteACRecords", default)]
    pub remote_ac_records: Option<AcRecords>,
}

impl ClimateStatusResponse {
    pub fn from_value(value: Value) -> Result<Self> {
        decode("climate status", value)
    }

    /// Records normalized to a sequence; absent is empty
    pub fn records(&self) -> &[AcRecord] {
        self.remote_ac_records
            .as_ref()
            .map(AcRecords::as_slice)
            .unwrap_or_default()
    }

    /// Field access on `RemoteACRecords` itself, before normalization.
    ///
    /// Only a bare record carries fields at this level; a sequence does not.
    pub fn raw_record(&self) -> Option<&AcRecord> {
        match self.remote_ac_records.as_ref()? {
            AcRecords::Single(record) => Some(record),
            AcRecords::Many(_) => None,
        }
    }
}

/// `RemoteACRecords` arrives either as one record or as a sequence
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AcRecords {
    Many(Vec<AcRecord>),
    Single(AcRecord),
}

// Records are only ever read from objects; a derived struct would also fill
// its fields positionally from an array.
impl<'de> Deserialize<'de> for AcRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(record_from_object::<D::Error>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(AcRecords::Many),
            record @ Value::Object(_) => record_from_object(record).map(AcRecords::Single),
            other => Err(D::Error::custom(format!(
                "expected a record or a sequence of records, found {}",
                other
            ))),
        }
    }
}

fn record_from_object<E: serde::de::Error>(value: Value) -> std::result::Result<AcRecord, E> {
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(E::custom),
        other => Err(E::custom(format!("expected a record object, found {}", other))),
    }
}

impl AcRecords {
    pub fn as_slice(&self) -> &[AcRecord] {
        match self {
            AcRecords::Many(records) => records,
            AcRecords::Single(record) => std::slice::from_ref(record),
        }
    }
}

/// One logged climate-control operation
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AcRecord {
    #[serde(rename = "OperationResult", default)]
    pub operation_result: Option<Value>,
    #[serde(rename = "RemoteACOperation", default)]
    pub remote_ac_operation: Option<Value>,
    /// Requested cabin temperature
    #[serde(rename = "PreAC_temp", default, deserialize_with = "present_number")]
    pub pre_ac_temp: Option<LooseNumber>,
    /// Measured cabin temperature
    #[serde(rename = "Inc_temp", default, deserialize_with = "present_number")]
    pub inc_temp: Option<LooseNumber>,
}

impl AcRecord {
    /// `OperationResult` stringified; `None` when absent or falsy
    pub fn operation_result_text(&self) -> Option<String> {
        match self.operation_result.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_start_operation(&self) -> bool {
        matches!(&self.remote_ac_operation, Some(Value::String(op)) if op == "START")
    }
}

/// `status` of a raw login response without decoding the vehicle lists
pub fn status_code_of(session_info: &Value) -> f64 {
    session_info.get("status").map_or(f64::NAN, coerce_number)
}

/// Login response carrying status and the account's vehicles
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionInfo {
    #[serde(default, deserialize_with = "present_number")]
    pub status: Option<LooseNumber>,
    /// First-generation accounts list vehicles here
    #[serde(rename = "vehicleInfo", default)]
    pub vehicle_info: Option<Vec<VehicleInfo>>,
    /// Second-generation accounts nest the list
    #[serde(rename = "VehicleInfoList", default)]
    pub vehicle_info_list: Option<VehicleInfoList>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VehicleInfoList {
    #[serde(rename = "vehicleInfo", default)]
    pub vehicle_info: Option<Vec<VehicleInfo>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VehicleInfo {
    #[serde(default)]
    pub nickname: Option<String>,
    pub vin: String,
}

impl SessionInfo {
    pub fn from_value(value: Value) -> Result<Self> {
        decode("session info", value)
    }

    pub fn status_code(&self) -> f64 {
        LooseNumber::coerce_opt(self.status.as_ref())
    }

    pub fn is_ok(&self) -> bool {
        self.status_code() == 200.0
    }

    /// Vehicles from whichever of the two list shapes is present
    pub fn vehicles(&self) -> Result<&[VehicleInfo]> {
        if let Some(list) = &self.vehicle_info {
            return Ok(list);
        }
        self.vehicle_info_list
            .as_ref()
            .and_then(|nested| nested.vehicle_info.as_deref())
            .ok_or_else(|| {
                LeafBridgeError::malformed(
                    "session info has neither vehicleInfo nor VehicleInfoList.vehicleInfo",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_number_follows_loose_rules() {
        assert_eq!(coerce_number(&json!("150000")), 150000.0);
        assert_eq!(coerce_number(&json!(" 21.5 ")), 21.5);
        assert_eq!(coerce_number(&json!("")), 0.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!(true)), 1.0);
        assert_eq!(coerce_number(&json!(42)), 42.0);
        assert_eq!(coerce_number(&json!("0x1A")), 26.0);
        assert_eq!(coerce_number(&json!("1e3")), 1000.0);
        assert_eq!(coerce_number(&json!("-Infinity")), f64::NEG_INFINITY);
        assert!(coerce_number(&json!("abc")).is_nan());
        assert!(coerce_number(&json!("inf")).is_nan());
        assert!(coerce_number(&json!("12km")).is_nan());
        assert!(coerce_number(&json!("0x")).is_nan());
        assert!(coerce_number(&json!({"a": 1})).is_nan());
    }

    #[test]
    fn absent_numeric_field_is_nan() {
        assert!(LooseNumber::coerce_opt(None).is_nan());
        assert_eq!(LooseNumber::coerce_opt(Some(&LooseNumber::from("80"))), 80.0);
    }

    #[test]
    fn battery_status_requires_nesting() {
        let err = BatteryStatusResponse::from_value(json!({"BatteryStatusRecords": {}}))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Malformed payload"));
        assert!(err.contains("BatteryStatus"));

        let ok = BatteryStatusResponse::from_value(json!({
            "BatteryStatusRecords": {
                "BatteryStatus": {"SOC": {"Value": "64"}},
                "PluginState": "CONNECTED"
            }
        }))
        .unwrap();
        assert_eq!(ok.records.battery_status.charging_status, None);
        assert!(ok.records.cruising_range_ac_on.is_none());
    }

    #[test]
    fn remote_ac_records_accepts_every_shape() {
        let absent = ClimateStatusResponse::from_value(json!({})).unwrap();
        assert!(absent.records().is_empty());
        assert!(absent.raw_record().is_none());

        let null = ClimateStatusResponse::from_value(json!({"RemoteACRecords": null})).unwrap();
        assert!(null.records().is_empty());

        let empty = ClimateStatusResponse::from_value(json!({"RemoteACRecords": []})).unwrap();
        assert!(empty.records().is_empty());

        let single = ClimateStatusResponse::from_value(json!({
            "RemoteACRecords": {"OperationResult": "START_BATTERY", "RemoteACOperation": "START"}
        }))
        .unwrap();
        assert_eq!(single.records().len(), 1);
        assert!(single.raw_record().is_some());

        let many = ClimateStatusResponse::from_value(json!({
            "RemoteACRecords": [{"RemoteACOperation": "STOP"}, {"RemoteACOperation": "START"}]
        }))
        .unwrap();
        assert_eq!(many.records().len(), 2);
        assert!(many.raw_record().is_none());
    }

    #[test]
    fn remote_ac_records_only_reads_objects() {
        let err = ClimateStatusResponse::from_value(json!({
            "RemoteACRecords": ["START", "START", "21", "14"]
        }))
        .unwrap_err()
        .to_string();
        assert!(err.contains("Malformed payload"));
        assert!(err.contains("RemoteACRecords"));

        let mixed = ClimateStatusResponse::from_value(json!({
            "RemoteACRecords": [{"RemoteACOperation": "STOP"}, "x"]
        }));
        assert!(mixed.is_err());

        assert!(ClimateStatusResponse::from_value(json!({"RemoteACRecords": "START"})).is_err());
    }

    #[test]
    fn null_numeric_field_is_present_and_coerces_to_zero() {
        let doc = BatteryStatusResponse::from_value(json!({
            "BatteryStatusRecords": {
                "BatteryStatus": {"SOC": {"Value": null}},
                "CruisingRangeAcOn": null
            }
        }))
        .unwrap();
        let records = &doc.records;
        let soc = records.battery_status.soc.value.as_ref();
        assert_eq!(LooseNumber::coerce_opt(soc), 0.0);
        assert_eq!(LooseNumber::coerce_opt(records.cruising_range_ac_on.as_ref()), 0.0);
        assert!(LooseNumber::coerce_opt(records.cruising_range_ac_off.as_ref()).is_nan());
    }

    #[test]
    fn operation_result_is_stringified() {
        let record = AcRecord {
            operation_result: Some(json!(17)),
            ..Default::default()
        };
        assert_eq!(record.operation_result_text().as_deref(), Some("17"));

        let blank = AcRecord {
            operation_result: Some(json!("")),
            ..Default::default()
        };
        assert_eq!(blank.operation_result_text(), None);
    }

    #[test]
    fn session_info_reads_both_vehicle_shapes() {
        let flat = SessionInfo::from_value(json!({
            "status": 200,
            "vehicleInfo": [{"nickname": "MyLeaf", "vin": "VIN123"}]
        }))
        .unwrap();
        assert!(flat.is_ok());
        assert_eq!(flat.vehicles().unwrap()[0].vin, "VIN123");

        let nested = SessionInfo::from_value(json!({
            "status": "200",
            "VehicleInfoList": {"vehicleInfo": [{"nickname": "Second", "vin": "VIN456"}]}
        }))
        .unwrap();
        assert!(nested.is_ok());
        assert_eq!(nested.vehicles().unwrap()[0].nickname.as_deref(), Some("Second"));

        let neither = SessionInfo::from_value(json!({"status": 401})).unwrap();
        assert!(!neither.is_ok());
        assert!(neither.vehicles().is_err());
    }
}
