use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};

use crate::capability::{Capability, CapabilitySnapshot};
use crate::error::Result;
use crate::logging::StructuredLogger;
use crate::vehicle::{BatteryStatusResponse, ClimateStatusResponse};

use super::LeafDevice;
use super::reconcile::reconcile;

const MIN_POLL_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running poll schedule.
///
/// Dropping the handle also ends the schedule after the cycle in flight.
pub struct PollHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
    logger: StructuredLogger,
}

impl PollHandle {
    /// Stop polling and wait for the task to finish its current cycle.
    ///
    /// Returns `false` when the task had already died (panicked or aborted).
    pub async fn stop(self) -> bool {
        let _ = self.shutdown_tx.send(());
        match self.task.await {
            Ok(()) => true,
            Err(e) => {
                self.logger
                    .error(&format!("Poll task ended abnormally: {}", e));
                false
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl LeafDevice {
    /// Activate the device: one immediate cycle, then one every poll interval
    pub fn start(self: &Arc<Self>) -> PollHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let device = Arc::clone(self);
        let logger = self.logger.clone();

        let task = tokio::spawn(async move {
            device.activate().await;

            let mut period = device.settings.poll_period();
            if period < MIN_POLL_PERIOD {
                device.logger.warn(&format!(
                    "Poll interval {}s too short, using {}s",
                    device.settings.poll_interval,
                    MIN_POLL_PERIOD.as_secs()
                ));
                period = MIN_POLL_PERIOD;
            }
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        device.run_cycle().await;
                    }
                    _ = &mut shutdown_rx => {
                        device.logger.info("Device teardown, polling stopped");
                        break;
                    }
                }
            }
        });

        PollHandle {
            shutdown_tx,
            task,
            logger,
        }
    }

    async fn activate(&self) {
        self.logger.info(&format!(
            "Device '{}' initialized, polling every {}s",
            self.identity.name, self.settings.poll_interval
        ));
        // Devices paired before this capability existed do not carry it
        if let Err(e) = self
            .store
            .add_capability(Capability::MeasureTemperatureActual)
            .await
        {
            self.logger
                .error(&format!("Failed to add measure_temperature_actual: {}", e));
        }
    }

    /// One scheduled cycle; failures are logged and the cycle skipped
    async fn run_cycle(&self) {
        let started = Instant::now();
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        match self.poll_cycle().await {
            Ok(_) => self.logger.debug(&format!(
                "Poll cycle completed in {} ms",
                started.elapsed().as_millis()
            )),
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                self.logger.error(&format!("Poll cycle failed: {}", e));
            }
        }
    }

    /// Fetch both status documents on a fresh session, reconcile, publish.
    ///
    /// Nothing is written unless both documents were fetched and decoded.
    pub async fn poll_cycle(&self) -> Result<CapabilitySnapshot> {
        let session = self.connector.connect(&self.settings.credentials()).await?;

        let status = session.cached_status().await?;
        self.logger.debug(&format!("cachedStatus: {}", status));

        let climate_status = session.climate_control_status().await?;
        self.logger
            .debug(&format!("climateControlStatus: {}", climate_status));

        let battery = BatteryStatusResponse::from_value(status)?;
        let climate = ClimateStatusResponse::from_value(climate_status)?;

        let snapshot = reconcile(&battery, &climate);
        self.logger.debug(&format!(
            "Cabin temperature (Inc_temp): {}",
            snapshot.measure_temperature_actual
        ));

        self.publish(&snapshot).await;
        self.record_snapshot(snapshot);
        Ok(snapshot)
    }

    /// Write every capability independently; returns how many writes failed
    pub(crate) async fn publish(&self, snapshot: &CapabilitySnapshot) -> usize {
        let mut failures = 0;
        for (capability, value) in snapshot.entries() {
            if !self.publish_non_finite && !value.is_finite() {
                self.logger.warn(&format!(
                    "Skipping {}: value is not a finite number",
                    capability
                ));
                continue;
            }
            if let Err(e) = self.store.set_capability_value(capability, value).await {
                failures += 1;
                self.logger
                    .error(&format!("Failed to set {}: {}", capability, e));
            }
        }
        failures
    }
}
