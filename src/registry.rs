//! Display names keyed by sensor identity.
//!
//! Names live in the key-value store under the sensor's 14-character
//! identity, so a binding follows the physical device across rescans even
//! though its position in the table may change.  The same namespace holds
//! the persisted temperature-logging flag.

use log::{debug, info};

use crate::app::ports::KeyValueStore;
use crate::error::{NameError, Result};

/// Returned for identities without a binding.
pub const UNKNOWN_SENSOR: &str = "unknown sensor";

/// Longest accepted display name, in bytes.
pub const MAX_NAME_LEN: usize = 14;

/// Key of the persisted "temperature logging enabled" flag.
pub const LOGGING_KEY: &str = "logging";

pub type SensorName = heapless::String<MAX_NAME_LEN>;

pub struct SensorRegistry<K> {
    store: K,
}

impl<K: KeyValueStore> SensorRegistry<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Bound name, or [`UNKNOWN_SENSOR`].
    pub fn name_of(&self, id: &str) -> SensorName {
        self.store.get_string(id, UNKNOWN_SENSOR)
    }

    /// Bind `name` to `id`.  An empty name removes the binding; an
    /// over-long one is rejected and nothing is written.
    pub fn set_name(&mut self, id: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            debug!("Registry: clearing name of {}", id);
            self.store.remove(id)?;
            return Ok(());
        }
        if name.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong {
                len: name.len(),
                max: MAX_NAME_LEN,
            }
            .into());
        }
        self.store.put_string(id, name)?;
        info!("Registry: {} is now '{}'", id, name);
        Ok(())
    }

    pub fn logging_enabled(&self) -> bool {
        self.store.get_bool(LOGGING_KEY, false)
    }

    pub fn set_logging_enabled(&mut self, enabled: bool) -> Result<()> {
        self.store.put_bool(LOGGING_KEY, enabled)?;
        Ok(())
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }

    /// Give the store back, closing nothing.
    pub fn into_inner(self) -> K {
        self.store
    }
}
