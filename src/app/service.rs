//! Sensor facade: the public API of the temperature core.
//!
//! [`TempSensors`] starts the acquisition task, owns the key-value store
//! and the history timer, and answers reader queries from the published
//! generation.  Every query is a short copy-out; none of them touch the
//! bus.
//!
//! ```text
//!  OneWireBus ──┐                       ┌──▶ FileStore
//!  DelayNs ─────┤   AcquisitionLoop     ├──▶ EventSink
//!  Clock ───────┘   (own thread)        │
//!                        │ publish      │
//!                        ▼              │
//!  caller ◀──────── TempSensors ◀── LogTimer
//!                        │
//!                        ▼
//!                  KeyValueStore (names, logging flag)
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::acquisition::{AcquisitionLoop, Generation, SharedState};
use crate::config::SensorConfig;
use crate::drivers::hw_timer::LogTimer;
use crate::drivers::task_pin::{self, Core};
use crate::error::{Error, Result};
use crate::registry::{SensorName, SensorRegistry, UNKNOWN_SENSOR};
use crate::sensors::device::SensorId;
use crate::sensors::reading::Reading;

use super::ports::{Clock, EventSink, FileStore, KeyValueStore, OneWireBus};

/// Only one acquisition task may own the bus at a time.
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Task name handed to FreeRTOS.
const TASK_NAME: &str = "tempchain\0";

/// Everything the acquisition task takes ownership of at start.
pub struct LoopResources<B, D, F, C, S> {
    pub bus: B,
    pub delay: D,
    pub files: F,
    pub clock: C,
    pub sink: S,
}

pub struct TempSensors<K: KeyValueStore> {
    shared: Arc<SharedState>,
    registry: SensorRegistry<K>,
    timer: LogTimer,
    task: Option<JoinHandle<()>>,
    log_interval: Duration,
}

impl<K: KeyValueStore> TempSensors<K> {
    /// Validate `config`, spawn the acquisition task and, if the persisted
    /// flag says so, arm the history timer.
    ///
    /// On any error no task is left running.
    pub fn start<B, D, F, C, S>(
        config: &SensorConfig,
        kv: K,
        resources: LoopResources<B, D, F, C, S>,
    ) -> Result<Self>
    where
        B: OneWireBus + Send + 'static,
        D: DelayNs + Send + 'static,
        F: FileStore + Send + 'static,
        C: Clock + Send + 'static,
        S: EventSink + Send + 'static,
    {
        config.validate()?;
        if ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("TempSensors: start refused, already running");
            return Err(Error::AlreadyRunning);
        }

        let shared = Arc::new(SharedState::new());
        let timer = match LogTimer::new(shared.clone()) {
            Ok(t) => t,
            Err(e) => {
                ACTIVE.store(false, Ordering::Release);
                return Err(e);
            }
        };

        let LoopResources {
            bus,
            delay,
            files,
            clock,
            sink,
        } = resources;
        let acquisition = AcquisitionLoop::new(bus, delay, config, shared.clone());
        let task = task_pin::spawn_on_core(
            Core::from_index(config.task_core),
            config.task_priority,
            usize::from(config.task_stack_kb),
            TASK_NAME,
            move || acquisition.run(files, clock, sink),
        );
        let task = match task {
            Ok(handle) => handle,
            Err(e) => {
                error!("TempSensors: task spawn failed: {}", e);
                ACTIVE.store(false, Ordering::Release);
                return Err(Error::Init("acquisition task spawn failed"));
            }
        };

        let mut sensors = Self {
            shared,
            registry: SensorRegistry::new(kv),
            timer,
            task: Some(task),
            log_interval: Duration::from_secs(u64::from(config.log_interval_secs)),
        };

        if sensors.registry.logging_enabled() {
            info!("TempSensors: temperature logging was enabled, resuming");
            if let Err(e) = sensors.timer.arm(sensors.log_interval) {
                sensors.stop();
                return Err(e);
            }
        }
        Ok(sensors)
    }

    // ── Readings ─────────────────────────────────────────────

    /// Devices in the current generation.
    pub fn count(&self) -> usize {
        self.shared.readings.count()
    }

    /// Celsius at `index`; NaN for faulted or missing slots.
    pub fn temperature(&self, index: usize) -> f32 {
        self.reading(index).map_or(f32::NAN, |r| r.celsius())
    }

    /// `true` for faulted readings and for indices past the table.
    pub fn is_error(&self, index: usize) -> bool {
        self.reading(index).is_none_or(|r| r.is_error())
    }

    pub fn reading(&self, index: usize) -> Option<Reading> {
        self.shared.readings.get(index)
    }

    /// Copy of the whole current generation.
    pub fn snapshot(&self) -> Generation {
        self.shared.readings.snapshot()
    }

    /// Request a bus scan at the start of the next cycle.
    pub fn rescan(&self) {
        self.shared.request_rescan();
    }

    // ── Identities and names ─────────────────────────────────

    /// Identity of the device at `index`.
    pub fn id(&self, index: usize) -> Option<SensorId> {
        self.reading(index).map(|r| r.address().id())
    }

    /// Display name of the device at `index`.
    pub fn name(&self, index: usize) -> SensorName {
        match self.id(index) {
            Some(id) => self.registry.name_of(&id),
            None => {
                let mut n = SensorName::new();
                let _ = n.push_str(UNKNOWN_SENSOR);
                n
            }
        }
    }

    pub fn name_of(&self, id: &str) -> SensorName {
        self.registry.name_of(id)
    }

    /// Bind a display name; empty clears it.  See
    /// [`SensorRegistry::set_name`].
    pub fn set_name(&mut self, id: &str, name: &str) -> Result<()> {
        self.registry.set_name(id, name)
    }

    // ── Temperature logging ──────────────────────────────────

    pub fn is_temp_logging(&self) -> bool {
        self.timer.is_armed()
    }

    /// Default history interval from the configuration.
    pub fn log_interval(&self) -> Duration {
        self.log_interval
    }

    /// Arm the history timer and persist the choice.  `Ok(false)` if it
    /// was already running.
    ///
    /// If the flag cannot be stored the timer is disarmed again, so an
    /// `Err` always leaves logging off.
    pub fn start_temp_logging(&mut self, interval: Duration) -> Result<bool> {
        if !self.timer.arm(interval)? {
            return Ok(false);
        }
        if let Err(e) = self.registry.set_logging_enabled(true) {
            warn!("TempSensors: logging flag not stored ({}), disarming", e);
            self.timer.disarm();
            return Err(e);
        }
        Ok(true)
    }

    /// [`start_temp_logging`](Self::start_temp_logging) at the configured
    /// [`log_interval`](Self::log_interval).
    pub fn start_temp_logging_default(&mut self) -> Result<bool> {
        self.start_temp_logging(self.log_interval)
    }

    /// Disarm the history timer and persist the choice.  `Ok(false)` if it
    /// was not running.
    ///
    /// If the flag cannot be stored the timer is re-armed at its previous
    /// period, so an `Err` always leaves logging on.
    pub fn stop_temp_logging(&mut self) -> Result<bool> {
        let Some(period) = self.timer.period() else {
            return Ok(false);
        };
        self.timer.disarm();
        if let Err(e) = self.registry.set_logging_enabled(false) {
            warn!("TempSensors: logging flag not stored ({}), re-arming", e);
            self.timer.arm(period)?;
            return Err(e);
        }
        Ok(true)
    }

    // ── Error logging (not persisted) ────────────────────────

    pub fn is_error_logging(&self) -> bool {
        self.shared.error_logging()
    }

    pub fn start_error_logging(&self) -> bool {
        if self.shared.error_logging() {
            return false;
        }
        self.shared.set_error_logging(true);
        info!("TempSensors: error logging on");
        true
    }

    pub fn stop_error_logging(&self) -> bool {
        if !self.shared.error_logging() {
            return false;
        }
        self.shared.set_error_logging(false);
        info!("TempSensors: error logging off");
        true
    }

    // ── Shutdown ─────────────────────────────────────────────

    /// Stop the timer and the acquisition task, wait for it, then close the
    /// key-value store.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.timer.disarm();
        self.shared.request_stop();
        if task.join().is_err() {
            error!("TempSensors: acquisition task panicked");
        }
        ACTIVE.store(false, Ordering::Release);
        info!("TempSensors: stopped");
    }
}

impl<K: KeyValueStore> Drop for TempSensors<K> {
    fn drop(&mut self) {
        self.stop();
    }
}
