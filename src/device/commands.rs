use crate::capability::{Capability, CapabilityValue};
use crate::error::{LeafBridgeError, Result};

use super::LeafDevice;

/// A capability write translated into a vehicle command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    SetClimate(bool),
    SetCharging(bool),
    SetTargetTemperature(f64),
}

impl DeviceCommand {
    /// Map a host write onto a command; rejects sensors and mistyped values
    pub fn from_write(capability: Capability, value: CapabilityValue) -> Result<Self> {
        match (capability, value) {
            (Capability::ButtonClimate, CapabilityValue::Bool(on)) => Ok(Self::SetClimate(on)),
            (Capability::ButtonCharging, CapabilityValue::Bool(on)) => Ok(Self::SetCharging(on)),
            (Capability::SetTemperature, CapabilityValue::Number(celsius)) => {
                Ok(Self::SetTargetTemperature(celsius))
            }
            (cap, _) if cap.is_writable() => Err(LeafBridgeError::validation(
                cap.as_str(),
                "unexpected value type",
            )),
            (cap, _) => Err(LeafBridgeError::validation(
                cap.as_str(),
                "capability is not writable",
            )),
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::SetClimate(_) => Capability::ButtonClimate,
            Self::SetCharging(_) => Capability::ButtonCharging,
            Self::SetTargetTemperature(_) => Capability::SetTemperature,
        }
    }

    /// The value the write intended, committed regardless of the remote outcome
    pub fn value(&self) -> CapabilityValue {
        match *self {
            Self::SetClimate(on) | Self::SetCharging(on) => CapabilityValue::Bool(on),
            Self::SetTargetTemperature(celsius) => CapabilityValue::Number(celsius),
        }
    }
}

impl LeafDevice {
    /// Capability listener entry point for the host
    pub async fn on_capability_write(
        &self,
        capability: Capability,
        value: CapabilityValue,
    ) -> Result<CapabilityValue> {
        let command = DeviceCommand::from_write(capability, value)?;
        Ok(self.dispatch(command).await)
    }

    /// Send a command and return the optimistic value.
    ///
    /// Remote failures are logged only; the next poll cycle corrects the
    /// published state.
    pub async fn dispatch(&self, command: DeviceCommand) -> CapabilityValue {
        if let Err(e) = self.send_command(command).await {
            self.logger.error(&format!(
                "{} command failed: {}",
                command.capability(),
                e
            ));
        }
        command.value()
    }

    async fn send_command(&self, command: DeviceCommand) -> Result<()> {
        match command {
            DeviceCommand::SetCharging(false) => {
                self.logger
                    .debug("Charging off requested; the vehicle API has no charge-stop");
                Ok(())
            }
            _ => {
                let session = self.connector.connect(&self.settings.credentials()).await?;
                match command {
                    DeviceCommand::SetClimate(true) => {
                        self.logger.info("Turning climate control on");
                        session.climate_control_turn_on().await
                    }
                    DeviceCommand::SetClimate(false) => {
                        self.logger.info("Turning climate control off");
                        session.climate_control_turn_off().await
                    }
                    DeviceCommand::SetCharging(_) => {
                        self.logger.info("Starting charging");
                        session.charging_start().await
                    }
                    DeviceCommand::SetTargetTemperature(celsius) => {
                        self.logger
                            .info(&format!("Setting target temperature to {}", celsius));
                        session.set_target_temperature(celsius).await
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_map_to_commands() {
        assert_eq!(
            DeviceCommand::from_write(Capability::ButtonClimate, true.into()).unwrap(),
            DeviceCommand::SetClimate(true)
        );
        assert_eq!(
            DeviceCommand::from_write(Capability::ButtonCharging, false.into()).unwrap(),
            DeviceCommand::SetCharging(false)
        );
        assert_eq!(
            DeviceCommand::from_write(Capability::SetTemperature, 21.0.into()).unwrap(),
            DeviceCommand::SetTargetTemperature(21.0)
        );
    }

    #[test]
    fn sensors_and_mistyped_values_are_rejected() {
        let err = DeviceCommand::from_write(Capability::MeasureBattery, 50.0.into()).unwrap_err();
        assert_eq!(err.field(), Some("measure_battery"));
        assert!(DeviceCommand::from_write(Capability::SetTemperature, true.into()).is_err());
        assert!(DeviceCommand::from_write(Capability::ButtonClimate, 1.0.into()).is_err());
    }

    #[test]
    fn value_is_the_intent() {
        assert_eq!(
            DeviceCommand::SetClimate(false).value(),
            CapabilityValue::Bool(false)
        );
        assert_eq!(
            DeviceCommand::SetTargetTemperature(19.5).value(),
            CapabilityValue::Number(19.5)
        );
        assert_eq!(
            DeviceCommand::SetCharging(true).capability(),
            Capability::ButtonCharging
        );
    }
}
