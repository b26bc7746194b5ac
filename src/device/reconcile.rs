//! Battery and climate status to capability values.

use crate::capability::CapabilitySnapshot;
use crate::vehicle::{BatteryStatusResponse, ClimateStatusResponse, LooseNumber};

const METERS_PER_KILOMETER: f64 = 1000.0;

/// Derive a capability snapshot from one battery and one climate document.
///
/// Total: absent or non-numeric numbers come out as `NaN`.
pub fn reconcile(
    battery: &BatteryStatusResponse,
    climate: &ClimateStatusResponse,
) -> CapabilitySnapshot {
    let records = &battery.records;
    let status = &records.battery_status;

    let is_charging = status.charging_status.as_deref() != Some("NOT_CHARGING");
    let is_connected = records.plugin_state.as_deref() != Some("NOT_CONNECTED");

    let raw = climate.raw_record();

    CapabilitySnapshot {
        button_climate: ac_is_running(climate),
        button_charging: is_connected && !is_charging,
        is_charging,
        is_connected,
        measure_battery: LooseNumber::coerce_opt(status.soc.value.as_ref()),
        set_temperature: LooseNumber::coerce_opt(raw.and_then(|r| r.pre_ac_temp.as_ref())),
        measure_temperature_actual: LooseNumber::coerce_opt(raw.and_then(|r| r.inc_temp.as_ref())),
        cruising_range_ac_off: LooseNumber::coerce_opt(records.cruising_range_ac_off.as_ref())
            / METERS_PER_KILOMETER,
        cruising_range_ac_on: LooseNumber::coerce_opt(records.cruising_range_ac_on.as_ref())
            / METERS_PER_KILOMETER,
    }
}

/// Climate control counts as running when there is at least one record and
/// `RemoteACRecords` itself reports a START result for a START operation.
///
/// The operation fields are read off `RemoteACRecords` as delivered, not off
/// an element of the normalized sequence, so a multi-record sequence never
/// reads as running.
pub fn ac_is_running(climate: &ClimateStatusResponse) -> bool {
    if climate.records().is_empty() {
        return false;
    }
    climate.raw_record().is_some_and(|record| {
        record
            .operation_result_text()
            .is_some_and(|result| result.starts_with("START"))
            && record.is_start_operation()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn battery(charging: &str, plugin: &str) -> BatteryStatusResponse {
        BatteryStatusResponse::from_value(json!({
            "BatteryStatusRecords": {
                "BatteryStatus": {
                    "BatteryChargingStatus": charging,
                    "SOC": {"Value": "76"}
                },
                "PluginState": plugin,
                "CruisingRangeAcOn": "150000",
                "CruisingRangeAcOff": "163500"
            }
        }))
        .unwrap()
    }

    fn climate(records: Value) -> ClimateStatusResponse {
        ClimateStatusResponse::from_value(json!({ "RemoteACRecords": records })).unwrap()
    }

    #[test]
    fn derived_booleans_cover_all_combinations() {
        let cases = [
            ("NOT_CHARGING", "NOT_CONNECTED", false, false, false),
            ("NOT_CHARGING", "CONNECTED", false, true, true),
            ("NORMAL_CHARGING", "CONNECTED", true, true, false),
            ("NORMAL_CHARGING", "NOT_CONNECTED", true, false, false),
        ];
        for (charging, plugin, is_charging, is_connected, ready) in cases {
            let snap = reconcile(&battery(charging, plugin), &climate(json!([])));
            assert_eq!(snap.is_charging, is_charging, "{charging}/{plugin}");
            assert_eq!(snap.is_connected, is_connected, "{charging}/{plugin}");
            assert_eq!(snap.button_charging, ready, "{charging}/{plugin}");
        }
    }

    #[test]
    fn missing_status_strings_read_as_not_the_negative_state() {
        let doc = BatteryStatusResponse::from_value(json!({
            "BatteryStatusRecords": {"BatteryStatus": {"SOC": {}}}
        }))
        .unwrap();
        let snap = reconcile(&doc, &ClimateStatusResponse::default());
        assert!(snap.is_charging);
        assert!(snap.is_connected);
        assert!(!snap.button_charging);
        assert!(snap.measure_battery.is_nan());
        assert!(snap.cruising_range_ac_on.is_nan());
    }

    #[test]
    fn ranges_convert_meters_to_kilometers() {
        let snap = reconcile(&battery("NOT_CHARGING", "CONNECTED"), &climate(json!([])));
        assert_eq!(snap.cruising_range_ac_on, 150.0);
        assert_eq!(snap.cruising_range_ac_off, 163.5);
        assert_eq!(snap.measure_battery, 76.0);
    }

    #[test]
    fn null_numbers_read_as_zero_not_nan() {
        let doc = BatteryStatusResponse::from_value(json!({
            "BatteryStatusRecords": {
                "BatteryStatus": {"SOC": {"Value": null}},
                "CruisingRangeAcOn": null,
                "CruisingRangeAcOff": "50000"
            }
        }))
        .unwrap();
        let nulls = climate(json!({"PreAC_temp": null, "Inc_temp": null}));
        let snap = reconcile(&doc, &nulls);
        assert_eq!(snap.measure_battery, 0.0);
        assert_eq!(snap.cruising_range_ac_on, 0.0);
        assert_eq!(snap.cruising_range_ac_off, 50.0);
        assert_eq!(snap.set_temperature, 0.0);
        assert_eq!(snap.measure_temperature_actual, 0.0);
    }

    #[test]
    fn ac_running_needs_start_result_and_start_operation() {
        let running = climate(json!({
            "OperationResult": "START_BATTERY",
            "RemoteACOperation": "START",
            "PreAC_temp": "21",
            "Inc_temp": "14"
        }));
        assert!(ac_is_running(&running));

        let stopped_result = climate(json!({
            "OperationResult": "STOP_OK",
            "RemoteACOperation": "START"
        }));
        assert!(!ac_is_running(&stopped_result));

        let stop_operation = climate(json!({
            "OperationResult": "START",
            "RemoteACOperation": "STOP"
        }));
        assert!(!ac_is_running(&stop_operation));

        assert!(!ac_is_running(&climate(json!([]))));
        assert!(!ac_is_running(&ClimateStatusResponse::default()));
    }

    #[test]
    fn sequence_records_do_not_expose_record_fields() {
        let many = climate(json!([
            {"OperationResult": "START", "RemoteACOperation": "START", "PreAC_temp": "22"}
        ]));
        let snap = reconcile(&battery("NOT_CHARGING", "CONNECTED"), &many);
        assert!(!snap.button_climate);
        assert!(snap.set_temperature.is_nan());
        assert!(snap.measure_temperature_actual.is_nan());

        // A sequence of bare values is not a record and never reads as running
        let values = ClimateStatusResponse::from_value(json!({
            "RemoteACRecords": ["START", "START", "21", "14"]
        }));
        assert!(values.is_err());
    }

    #[test]
    fn single_record_temperatures_are_coerced() {
        let single = climate(json!({
            "OperationResult": "START",
            "RemoteACOperation": "START",
            "PreAC_temp": "21",
            "Inc_temp": "abc"
        }));
        let snap = reconcile(&battery("NOT_CHARGING", "CONNECTED"), &single);
        assert!(snap.button_climate);
        assert_eq!(snap.set_temperature, 21.0);
        assert!(snap.measure_temperature_actual.is_nan());
    }
}
