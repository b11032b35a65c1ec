//! Wall clock and blocking delay adapters.
//!
//! - **`target_os = "espidf"`**: wall time from `gettimeofday()` and local
//!   time from newlib's `localtime_r()`, so the `TZ` set at boot applies.
//! - **`not(target_os = "espidf")`**: `chrono::Local` for host-side testing
//!   and simulation.
//!
//! [`StdDelay`] implements the `embedded-hal` delay trait with
//! `std::thread::sleep`, which on ESP-IDF yields to FreeRTOS instead of
//! busy-waiting.

use std::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::app::ports::{Clock, WallTime};

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "espidf")]
impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        use chrono::{DateTime, NaiveDate};

        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: `tv` is a valid out-pointer; the timezone argument may be null.
        unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) };
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        // SAFETY: all-zero is a valid `tm`.
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        // SAFETY: both pointers are valid for the duration of the call.
        let ok = !unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null();

        let unix = tv.tv_sec as i64;
        let broken_down = if ok {
            NaiveDate::from_ymd_opt(tm.tm_year + 1900, (tm.tm_mon + 1) as u32, tm.tm_mday as u32)
                .and_then(|d| {
                    d.and_hms_opt(tm.tm_hour as u32, tm.tm_min as u32, tm.tm_sec.min(59) as u32)
                })
        } else {
            None
        };
        // Fall back to UTC if newlib could not convert.
        let local = broken_down
            .or_else(|| DateTime::from_timestamp(unix, 0).map(|t| t.naive_utc()))
            .unwrap_or_default();

        WallTime { unix, local }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        let now = chrono::Local::now();
        WallTime {
            unix: now.timestamp(),
            local: now.naive_local(),
        }
    }
}

/// Blocking delay backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
