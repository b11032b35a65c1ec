//! Outbound diagnostics from the acquisition loop.
//!
//! The [`AcquisitionLoop`](crate::acquisition::AcquisitionLoop) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them, usually logging to serial.

use crate::sensors::device::DeviceAddress;
use crate::sensors::scratchpad::{FrameFault, Scratchpad};

use super::ports::StorageError;

/// Path of a file touched by the loggers (`/2024-01-31.log` and friends).
pub type FilePath = heapless::String<48>;

/// Structured events emitted by the sensor core.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A bus scan finished.  `ignored` counts devices beyond the table
    /// capacity or of a non-temperature family.
    Scanned { count: usize, ignored: usize },

    /// No device answered the reset pulse.
    NoPresence,

    /// A frame could not be turned into a temperature.
    FrameFault {
        index: usize,
        fault: FrameFault,
        frame: Scratchpad,
    },

    /// A device with an unrecognised family code was decoded with the
    /// standard rules.
    UnknownFamily { index: usize, address: DeviceAddress },

    /// A new generation of readings became visible.
    Published { count: usize, errors: usize },

    /// One history line was appended.
    HistoryLogged { path: FilePath, sensors: usize },

    /// The history line could not be written.
    HistoryWriteFailed { path: FilePath, error: StorageError },

    /// Rotation could not list or delete log files.
    RotationFailed(StorageError),

    /// Rotation deleted an old log file.
    LogFilePruned { path: FilePath },

    /// The error log could not be written.
    ErrorLogWriteFailed(StorageError),
}
