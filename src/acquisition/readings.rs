//! Double-buffered reading store.
//!
//! ```text
//!   AcquisitionLoop                         readers (any thread)
//!  ┌─────────────────┐   publish(): swap   ┌──────────────────┐
//!  │ publish buffer  │◀═══════════════════▶│  visible buffer  │
//!  │ (loop-owned)    │  one critical sect. │  (copy-out only) │
//!  └─────────────────┘                     └──────────────────┘
//! ```
//!
//! The loop fills its own [`Generation`] without any lock, then exchanges
//! it with the visible one inside a single short critical section.  The
//! device count is the generation's length, so it can never disagree with
//! the readings it describes.  Readers copy out under the same critical
//! section and never observe a partially written generation.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::MAX_SENSORS;
use crate::sensors::reading::Reading;

/// One complete, internally consistent set of readings.
pub type Generation = heapless::Vec<Reading, MAX_SENSORS>;

pub struct ReadingStore {
    visible: Mutex<CriticalSectionRawMutex, RefCell<Generation>>,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore {
    pub const fn new() -> Self {
        Self {
            visible: Mutex::new(RefCell::new(Generation::new())),
        }
    }

    /// Make `back` visible.  On return `back` holds the previous visible
    /// generation, ready to be refilled.
    pub fn publish(&self, back: &mut Generation) {
        self.visible
            .lock(|visible| core::mem::swap(&mut *visible.borrow_mut(), back));
    }

    /// Number of devices in the visible generation.
    pub fn count(&self) -> usize {
        self.visible.lock(|visible| visible.borrow().len())
    }

    pub fn get(&self, index: usize) -> Option<Reading> {
        self.visible
            .lock(|visible| visible.borrow().get(index).copied())
    }

    /// Copy of the whole visible generation.
    pub fn snapshot(&self) -> Generation {
        self.visible.lock(|visible| visible.borrow().clone())
    }
}
