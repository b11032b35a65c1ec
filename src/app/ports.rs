//! Port traits: the boundary between the sensor core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AcquisitionLoop / TempSensors
//! ```
//!
//! Driven adapters (one-wire transceiver, FAT file store, NVS, wall clock,
//! event sinks) implement these traits.  The core consumes them via
//! generics, so none of it touches hardware directly and all of it runs on
//! the host against mocks.

use core::fmt;

use crate::sensors::crc;
use crate::sensors::device::DeviceAddress;

// ───────────────────────────────────────────────────────────────
// One-wire bus (driven adapter: domain ↔ transceiver)
// ───────────────────────────────────────────────────────────────

/// Byte-level access to a one-wire bus.
///
/// The electrical protocol (reset pulses, slot timing) is the adapter's
/// business.  Calls must not be interleaved from several threads; the
/// acquisition loop owns its bus exclusively.
pub trait OneWireBus {
    /// Issue a reset pulse.  Returns `true` if any device answered with a
    /// presence pulse.
    fn reset(&mut self) -> bool;

    /// Address a single device (MATCH ROM followed by its 8 address bytes).
    fn select(&mut self, address: &DeviceAddress);

    /// Write one byte.  `power` keeps the line driven high afterwards for
    /// parasite-powered devices.
    fn write_byte(&mut self, byte: u8, power: bool);

    /// Read one byte.
    fn read_byte(&mut self) -> u8;

    /// Restart device search, positioned at the given family code.
    fn begin_search(&mut self, family: u8);

    /// Next address found by the search, or `None` once exhausted.
    fn search_next(&mut self) -> Option<DeviceAddress>;

    /// Dallas/Maxim CRC-8 as used on the wire.
    fn crc8(&self, data: &[u8]) -> u8 {
        crc::crc8(data)
    }
}

// ───────────────────────────────────────────────────────────────
// File store (driven adapter: domain → FAT partition)
// ───────────────────────────────────────────────────────────────

/// One directory entry returned by [`FileStore::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Durable file storage with absolute, `/`-rooted paths.
pub trait FileStore {
    /// Open `path` in append mode (creating it), write `line` plus a
    /// newline, and close it again.
    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError>;

    /// List the entries directly under the directory `path`.
    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StorageError>;

    /// Delete the file at `path`.
    fn remove(&mut self, path: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Key-value store (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage scoped to one namespace.
///
/// Implementations own their namespace handle; keys are at most 15 bytes.
/// Write operations MUST be atomic, with no partial writes on power loss.
pub trait KeyValueStore {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, key: &str) -> bool;

    /// Read a UTF-8 string of at most `N` bytes, or `default` when the key
    /// is missing or unreadable.
    fn get_string<const N: usize>(&self, key: &str, default: &str) -> heapless::String<N> {
        let mut buf = [0u8; N];
        let stored = self
            .read(key, &mut buf)
            .ok()
            .and_then(|len| core::str::from_utf8(&buf[..len]).ok());
        let mut out = heapless::String::new();
        let _ = out.push_str(truncate(stored.unwrap_or(default), N));
        out
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, value.as_bytes())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        let mut buf = [0u8; 1];
        match self.read(key, &mut buf) {
            Ok(1) => buf[0] != 0,
            _ => default,
        }
    }

    fn put_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        self.write(key, &[u8::from(value)])
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.delete(key)
    }
}

/// Longest prefix of `s` that fits `max` bytes without splitting a char.
fn truncate(s: &str, max: usize) -> &str {
    let mut end = s.len().min(max);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ───────────────────────────────────────────────────────────────
// Wall clock (driven adapter: domain ← RTC / SNTP)
// ───────────────────────────────────────────────────────────────

/// A point in wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    /// Seconds since the Unix epoch.
    pub unix: i64,
    /// The same instant in local time.
    pub local: chrono::NaiveDateTime,
}

/// Source of wall-clock time for log file names and timestamps.
pub trait Clock {
    fn now(&self) -> WallTime;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The acquisition loop emits structured
/// [`SensorEvent`](super::events::SensorEvent)s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::SensorEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`FileStore`] and [`KeyValueStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key or file does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// The file system is not mounted.
    NotMounted,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Full => write!(f, "storage full"),
            Self::NotMounted => write!(f, "not mounted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for StorageError {}
