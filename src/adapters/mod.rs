//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements     | Connects to                   |
//! |----------------|----------------|-------------------------------|
//! | `fat_store`    | FileStore      | FAT partition via VFS / dir   |
//! | `log_sink`     | EventSink      | Serial log output             |
//! | `nvs`          | KeyValueStore  | NVS namespace / in-memory map |
//! | `onewire_rmt`  | OneWireBus     | ESP32 RMT one-wire driver     |
//! | `time`         | Clock, DelayNs | System clock, thread sleep    |

pub mod fat_store;
pub mod log_sink;
pub mod nvs;
#[cfg(target_os = "espidf")]
pub mod onewire_rmt;
pub mod time;
