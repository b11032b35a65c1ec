//! DS18x20 sensor model: addresses, CRC, scratchpad decoding and readings.
//!
//! Everything here is pure data manipulation; bus access lives behind the
//! [`OneWireBus`](crate::app::ports::OneWireBus) port.

pub mod crc;
pub mod device;
pub mod reading;
pub mod scratchpad;

pub use device::{DeviceAddress, SensorId};
pub use reading::Reading;
pub use scratchpad::{Family, FrameFault, Scratchpad};

/// One-wire ROM and function commands used by the acquisition loop.
pub mod command {
    /// Address every device at once.
    pub const SKIP_ROM: u8 = 0xCC;
    /// Address one device by ROM code.
    pub const MATCH_ROM: u8 = 0x55;
    /// Start a temperature conversion.
    pub const CONVERT_T: u8 = 0x44;
    /// Read the 9-byte scratchpad.
    pub const READ_SCRATCHPAD: u8 = 0xBE;
}
