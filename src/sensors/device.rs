//! One-wire device addresses and the identity strings derived from them.
//!
//! A ROM address is 8 bytes on the wire: family code, 48-bit serial, CRC.
//! The identity string renders bytes 1..=7 as 14 lowercase hex characters
//! (e.g. `ff641e0f000012`).  It is stable across rescans and short enough to
//! be used directly as a key-value store key.

use core::fmt::{self, Write};

use super::scratchpad::Family;

/// Length of an identity string (7 bytes, two hex digits each).
pub const SENSOR_ID_LEN: usize = 14;

/// Stable, storage-friendly identity of one device.
pub type SensorId = heapless::String<SENSOR_ID_LEN>;

/// 8-byte one-wire ROM address as returned by a bus search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceAddress(pub [u8; 8]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Raw family code (address byte 0).
    pub const fn family_code(&self) -> u8 {
        self.0[0]
    }

    /// Decode variant selected by the family code.
    pub fn family(&self) -> Family {
        Family::from_code(self.family_code())
    }

    /// Identity string used as the display-name key.
    pub fn id(&self) -> SensorId {
        let mut id = SensorId::new();
        for byte in &self.0[1..] {
            // 7 bytes * 2 digits fits SENSOR_ID_LEN exactly.
            let _ = write!(id, "{byte:02x}");
        }
        id
    }

    /// Little-endian `u64` view, as used by most one-wire drivers.
    pub const fn to_u64(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    pub const fn from_u64(raw: u64) -> Self {
        Self(raw.to_le_bytes())
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(':')?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
