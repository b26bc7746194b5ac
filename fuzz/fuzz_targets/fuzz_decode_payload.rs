#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    // Coercion never fails, whatever shape the leaf has
    let _ = leafbridge::vehicle::coerce_number(&value);

    let battery = leafbridge::vehicle::BatteryStatusResponse::from_value(value.clone());
    let climate = leafbridge::vehicle::ClimateStatusResponse::from_value(value.clone());
    if let (Ok(battery), Ok(climate)) = (battery, climate) {
        let _ = leafbridge::device::reconcile(&battery, &climate);
    }

    if let Ok(info) = leafbridge::vehicle::SessionInfo::from_value(value) {
        let _ = info.is_ok();
        let _ = info.vehicles();
    }
});
