//! Periodic history timer.
//!
//! Wraps ESP-IDF's `esp_timer` API.  The callback runs in the esp_timer
//! task (not an ISR) and does nothing but raise the single-slot
//! `log_due` signal in [`SharedState`]; the acquisition loop does the
//! actual file work.  On simulation targets a helper thread stands in for
//! the timer service.
//!
//! Arming fires once immediately, so the next acquisition cycle writes a
//! history line without waiting a full interval.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::acquisition::SharedState;
use crate::error::{Error, Result};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct LogTimer {
    shared: Arc<SharedState>,
    period: Option<Duration>,
    #[cfg(target_os = "espidf")]
    handle: esp_timer_handle_t,
    #[cfg(not(target_os = "espidf"))]
    sim: Option<SimTicker>,
}

// SAFETY: the esp_timer handle is only touched through `&mut self`, and the
// timer service itself is thread-safe.
#[cfg(target_os = "espidf")]
unsafe impl Send for LogTimer {}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn log_due_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `SharedState` kept alive by the owning
    // `LogTimer`, which deletes the timer before releasing it.
    let shared = unsafe { &*(arg as *const SharedState) };
    shared.signal_log_due();
}

impl LogTimer {
    /// Create the timer, disarmed.
    #[cfg(target_os = "espidf")]
    pub fn new(shared: Arc<SharedState>) -> Result<Self> {
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        let args = esp_timer_create_args_t {
            callback: Some(log_due_cb),
            arg: Arc::as_ptr(&shared) as *mut core::ffi::c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"templog\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        // SAFETY: `args` outlives the call; `handle` receives a valid timer.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK {
            log::error!("hw_timer: log timer create failed (rc={})", ret);
            return Err(Error::Init("log timer create failed"));
        }
        Ok(Self {
            shared,
            period: None,
            handle,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(shared: Arc<SharedState>) -> Result<Self> {
        Ok(Self {
            shared,
            period: None,
            sim: None,
        })
    }

    pub fn is_armed(&self) -> bool {
        self.period.is_some()
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Start periodic firing.  Returns `Ok(false)` if already armed.
    pub fn arm(&mut self, period: Duration) -> Result<bool> {
        if self.is_armed() {
            return Ok(false);
        }
        if period.is_zero() {
            return Err(Error::Config("log interval must be non-zero"));
        }
        self.start(period)?;
        self.period = Some(period);
        self.shared.signal_log_due();
        info!("hw_timer: history every {}s", period.as_secs());
        Ok(true)
    }

    /// Stop periodic firing.  Returns `false` if not armed.
    pub fn disarm(&mut self) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.stop();
        self.period = None;
        info!("hw_timer: history timer stopped");
        true
    }

    #[cfg(target_os = "espidf")]
    fn start(&mut self, period: Duration) -> Result<()> {
        let us = u64::try_from(period.as_micros()).unwrap_or(u64::MAX);
        // SAFETY: `handle` is a live timer created in `new`.
        let ret = unsafe { esp_timer_start_periodic(self.handle, us) };
        if ret != ESP_OK {
            log::error!("hw_timer: log timer start failed (rc={})", ret);
            return Err(Error::Init("log timer start failed"));
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn stop(&mut self) {
        // SAFETY: as in `start`.  Stopping an idle timer only returns an
        // error code.
        unsafe {
            esp_timer_stop(self.handle);
        }
    }

    #[cfg(target_os = "espidf")]
    fn delete(&mut self) {
        // SAFETY: the timer is stopped; no callback can run after delete,
        // so the `SharedState` pointer is never used again.
        unsafe {
            esp_timer_delete(self.handle);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn start(&mut self, period: Duration) -> Result<()> {
        self.sim = Some(SimTicker::spawn(self.shared.clone(), period)?);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn stop(&mut self) {
        if let Some(ticker) = self.sim.take() {
            ticker.stop();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn delete(&mut self) {}
}

impl Drop for LogTimer {
    fn drop(&mut self) {
        self.disarm();
        self.delete();
    }
}

// ── Simulation ──────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
struct SimTicker {
    stop: std::sync::mpsc::Sender<()>,
    thread: std::thread::JoinHandle<()>,
}

#[cfg(not(target_os = "espidf"))]
impl SimTicker {
    fn spawn(shared: Arc<SharedState>, period: Duration) -> Result<Self> {
        use std::sync::mpsc::{self, RecvTimeoutError};

        let (stop, rx) = mpsc::channel::<()>();
        let thread = std::thread::Builder::new()
            .name("log-timer".into())
            .spawn(move || {
                while let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(period) {
                    shared.signal_log_due();
                }
            })
            .map_err(|_| Error::Init("log timer thread spawn failed"))?;
        Ok(Self { stop, thread })
    }

    fn stop(self) {
        let _ = self.stop.send(());
        if self.thread.join().is_err() {
            log::error!("hw_timer(sim): ticker thread panicked");
        }
    }
}
