//! State shared between the acquisition task, the log timer and callers.
//!
//! ```text
//!  ┌──────────────┐ rescan()        ┌────────────────┐
//!  │  TempSensors │────────────────▶│                │
//!  │  (any thread)│◀── readings ────│  SharedState   │◀── log_due ── LogTimer
//!  └──────────────┘                 │                │               callback
//!                                   └───────┬────────┘
//!                                           ▼
//!                                   AcquisitionLoop
//! ```
//!
//! Every flag here has exactly one consumer: the acquisition loop.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use super::readings::ReadingStore;

pub struct SharedState {
    pub readings: ReadingStore,
    rescan: AtomicBool,
    log_due: Signal<CriticalSectionRawMutex, ()>,
    error_logging: AtomicBool,
    running: AtomicBool,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    /// The first cycle always scans the bus.
    pub const fn new() -> Self {
        Self {
            readings: ReadingStore::new(),
            rescan: AtomicBool::new(true),
            log_due: Signal::new(),
            error_logging: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    // ── Rescan request ───────────────────────────────────────

    /// Ask for a bus scan at the top of the next cycle.
    pub fn request_rescan(&self) {
        self.rescan.store(true, Ordering::Release);
    }

    /// Consume a pending rescan request.
    pub fn take_rescan(&self) -> bool {
        self.rescan.swap(false, Ordering::AcqRel)
    }

    pub fn rescan_pending(&self) -> bool {
        self.rescan.load(Ordering::Acquire)
    }

    // ── History timer ────────────────────────────────────────

    /// Mark a history line as due.  Safe from timer callbacks; repeated
    /// calls before the loop consumes it collapse into one.
    pub fn signal_log_due(&self) {
        self.log_due.signal(());
    }

    pub fn take_log_due(&self) -> bool {
        self.log_due.try_take().is_some()
    }

    pub fn log_due_pending(&self) -> bool {
        self.log_due.signaled()
    }

    // ── Error logging toggle ─────────────────────────────────

    pub fn set_error_logging(&self, enabled: bool) {
        self.error_logging.store(enabled, Ordering::Relaxed);
    }

    pub fn error_logging(&self) -> bool {
        self.error_logging.load(Ordering::Relaxed)
    }

    // ── Task lifetime ────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the loop to exit after its current cycle.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}
