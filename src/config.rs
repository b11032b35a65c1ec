//! Sensor core configuration.
//!
//! All tunable parameters for acquisition, history logging and task
//! placement.  Defaults match the shipped panel firmware; a stored copy
//! in NVS (key [`CONFIG_KEY`]) overrides them.

use serde::{Deserialize, Serialize};

use crate::app::ports::{KeyValueStore, StorageError};
use crate::error::{Error, Result};
use crate::sensors::scratchpad::Family;

/// Compile-time capacity of the device table and reading buffers.
pub const MAX_SENSORS: usize = 8;

/// Conversion time of a DS18B20 at 12-bit resolution.
pub const MIN_CONVERSION_WAIT_MS: u32 = 750;

/// Key-value key holding the postcard-encoded config.
pub const CONFIG_KEY: &str = "config";

/// Paths are short and `/`-rooted.
pub type ConfigPath = heapless::String<32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    // --- Bus ---
    /// Devices kept per scan; further devices are ignored.
    pub max_sensors: u8,
    /// Family code the search is positioned at.
    pub search_family: u8,
    /// Wait after CONVERT T before reading scratchpads.
    pub conversion_wait_ms: u32,

    // --- History ---
    /// Date-named log files kept by rotation.
    pub saved_logfiles: u16,
    /// Default period of the history timer.
    pub log_interval_secs: u32,
    /// Directory holding `YYYY-MM-DD.log` files.
    pub log_dir: ConfigPath,
    /// Single, never rotated error log.
    pub error_log_path: ConfigPath,

    // --- Task ---
    pub task_priority: u8,
    pub task_core: u8,
    pub task_stack_kb: u16,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_sensors: 3,
            search_family: Family::DS18B20_CODE,
            conversion_wait_ms: MIN_CONVERSION_WAIT_MS,

            saved_logfiles: 30,
            log_interval_secs: 180,
            log_dir: path("/"),
            error_log_path: path("/sensor_error.txt"),

            task_priority: 0,
            task_core: 1,
            task_stack_kb: 8,
        }
    }
}

fn path(s: &str) -> ConfigPath {
    let mut p = ConfigPath::new();
    let _ = p.push_str(s);
    p
}

impl SensorConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_sensors == 0 || usize::from(self.max_sensors) > MAX_SENSORS {
            return Err(Error::Config("max_sensors must be 1–8"));
        }
        if self.conversion_wait_ms < MIN_CONVERSION_WAIT_MS {
            return Err(Error::Config("conversion_wait_ms must be at least 750"));
        }
        if self.saved_logfiles == 0 {
            return Err(Error::Config("saved_logfiles must be at least 1"));
        }
        if self.log_interval_secs == 0 {
            return Err(Error::Config("log_interval_secs must be at least 1"));
        }
        if !self.log_dir.starts_with('/') || !self.error_log_path.starts_with('/') {
            return Err(Error::Config("log paths must be absolute"));
        }
        if self.error_log_path.ends_with(".log") {
            return Err(Error::Config("error_log_path must not look like a history file"));
        }
        if self.task_core > 1 {
            return Err(Error::Config("task_core must be 0 or 1"));
        }
        if self.task_stack_kb < 2 {
            return Err(Error::Config("task_stack_kb must be at least 2"));
        }
        Ok(())
    }

    /// Load the stored configuration, or defaults if none was saved.
    pub fn load(store: &impl KeyValueStore) -> Result<Self> {
        let mut buf = [0u8; 128];
        match store.read(CONFIG_KEY, &mut buf) {
            Ok(len) => {
                let cfg: Self =
                    postcard::from_bytes(&buf[..len]).map_err(|_| Error::Config("corrupted"))?;
                cfg.validate()?;
                log::info!("SensorConfig: loaded from store");
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                log::info!("SensorConfig: no stored config, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and persist.
    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<()> {
        self.validate()?;
        let bytes = postcard::to_allocvec(self).map_err(|_| Error::Config("encode failed"))?;
        store.write(CONFIG_KEY, &bytes)?;
        Ok(())
    }
}
