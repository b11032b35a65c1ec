//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing acquisition events to the ESP-IDF
//! logger (UART / USB-CDC in production).  A display or telemetry adapter
//! would implement the same trait.

use log::{debug, error, info, warn};

use crate::app::events::SensorEvent;
use crate::app::ports::EventSink;
use crate::sensors::scratchpad;

/// Adapter that logs every [`SensorEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SensorEvent) {
        match event {
            SensorEvent::Scanned { count, ignored } => {
                info!("SCAN  | {} sensor(s), {} ignored", count, ignored);
            }
            SensorEvent::NoPresence => {
                warn!("BUS   | no presence pulse");
            }
            SensorEvent::FrameFault {
                index,
                fault,
                frame,
            } => {
                warn!(
                    "FRAME | sensor {} {} [{}]",
                    index,
                    fault,
                    scratchpad::hex(frame)
                );
            }
            SensorEvent::UnknownFamily { index, address } => {
                warn!(
                    "FRAME | sensor {} has unknown family 0x{:02X} ({})",
                    index,
                    address.family_code(),
                    address
                );
            }
            SensorEvent::Published { count, errors } => {
                debug!("READ  | {} reading(s), {} faulted", count, errors);
            }
            SensorEvent::HistoryLogged { path, sensors } => {
                info!("LOG   | {} <- {} value(s)", path, sensors);
            }
            SensorEvent::HistoryWriteFailed { path, error: e } => {
                error!("LOG   | write to {} failed: {}", path, e);
            }
            SensorEvent::RotationFailed(e) => {
                error!("LOG   | rotation failed: {}", e);
            }
            SensorEvent::LogFilePruned { path } => {
                info!("LOG   | pruned {}", path);
            }
            SensorEvent::ErrorLogWriteFailed(e) => {
                error!("ERR   | error log write failed: {}", e);
            }
        }
    }
}
