//! DS18x20 scratchpad decoding.
//!
//! A scratchpad read returns 9 bytes:
//!
//! ```text
//!  0      1      2    3    4       5     6          7         8
//! ┌──────┬──────┬────┬────┬───────┬─────┬──────────┬─────────┬─────┐
//! │ T lsb│ T msb│ TH │ TL │ config│ res │ count rem│ count/°C│ CRC │
//! └──────┴──────┴────┴────┴───────┴─────┴──────────┴─────────┴─────┘
//! ```
//!
//! [`decode`] is pure: the same frame and family always produce the same
//! result, and no bus access is needed to exercise it.

use core::fmt;

use super::crc::crc8;

/// Bytes in one scratchpad frame, CRC included.
pub const SCRATCHPAD_LEN: usize = 9;

/// One raw scratchpad frame.
pub type Scratchpad = [u8; SCRATCHPAD_LEN];

/// Lowest temperature accepted as valid (exclusive).
pub const MIN_VALID_C: f32 = -55.0;
/// Highest temperature accepted as valid (exclusive).
pub const MAX_VALID_C: f32 = 85.0;

/// `count per °C` value that marks a usable count-remaining field on
/// legacy parts.
const LEGACY_COUNT_PER_C: u8 = 0x10;

/// Resolution bits in the configuration register (byte 4).
const RESOLUTION_MASK: u8 = 0x60;

// ---------------------------------------------------------------------------
// Device family
// ---------------------------------------------------------------------------

/// Temperature-sensor families, keyed by the ROM family code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// DS18S20 / DS1820: fixed 9-bit reading plus count-remaining.
    Ds18s20,
    /// DS18B20: programmable 9–12 bit resolution.
    Ds18b20,
    /// DS1822: programmable resolution, reduced accuracy.
    Ds1822,
    /// Anything else found on the bus.
    Unknown(u8),
}

impl Family {
    pub const DS18S20_CODE: u8 = 0x10;
    pub const DS18B20_CODE: u8 = 0x28;
    pub const DS1822_CODE: u8 = 0x22;

    pub const fn from_code(code: u8) -> Self {
        match code {
            Self::DS18S20_CODE => Self::Ds18s20,
            Self::DS18B20_CODE => Self::Ds18b20,
            Self::DS1822_CODE => Self::Ds1822,
            other => Self::Unknown(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Ds18s20 => Self::DS18S20_CODE,
            Self::Ds18b20 => Self::DS18B20_CODE,
            Self::Ds1822 => Self::DS1822_CODE,
            Self::Unknown(code) => code,
        }
    }

    /// Older chip generation that reports in half degrees.
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::Ds18s20)
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ds18s20 => "DS18S20",
            Self::Ds18b20 => "DS18B20",
            Self::Ds1822 => "DS1822",
            Self::Unknown(_) => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Frame faults
// ---------------------------------------------------------------------------

/// Reasons a frame does not yield a usable temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    /// Byte 8 does not match the CRC of bytes 0..8.
    BadCrc,
    /// CRC passed but the decoded value is outside the sensor's range.
    OutOfRange,
}

impl FrameFault {
    /// Tag written to the error log.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::BadCrc => "BAD_CRC",
            Self::OutOfRange => "BAD_TMP",
        }
    }
}

impl fmt::Display for FrameFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadCrc => write!(f, "checksum mismatch"),
            Self::OutOfRange => write!(f, "temperature out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Extract the raw reading in 1/16 °C units, normalised for `family`.
///
/// Does not check the CRC.
pub fn raw_sixteenths(frame: &Scratchpad, family: Family) -> i16 {
    let mut raw = i16::from_le_bytes([frame[0], frame[1]]);
    if family.is_legacy() {
        raw <<= 3;
        if frame[7] == LEGACY_COUNT_PER_C {
            raw = (raw & !0x0F)
                .wrapping_add(12)
                .wrapping_sub(i16::from(frame[6]));
        }
    } else {
        // At lower resolutions the low bits are undefined.
        raw &= match frame[4] & RESOLUTION_MASK {
            0x00 => !0b111, // 9 bit
            0x20 => !0b011, // 10 bit
            0x40 => !0b001, // 11 bit
            _ => !0,        // 12 bit
        };
    }
    raw
}

/// Validate and decode a scratchpad frame into degrees Celsius.
pub fn decode(frame: &Scratchpad, family: Family) -> Result<f32, FrameFault> {
    if crc8(&frame[..SCRATCHPAD_LEN - 1]) != frame[SCRATCHPAD_LEN - 1] {
        return Err(FrameFault::BadCrc);
    }
    let celsius = f32::from(raw_sixteenths(frame, family)) / 16.0;
    if celsius > MIN_VALID_C && celsius < MAX_VALID_C {
        Ok(celsius)
    } else {
        Err(FrameFault::OutOfRange)
    }
}

/// Build a frame with a correct CRC byte.  Handy for simulation and tests.
pub fn with_crc(data: [u8; SCRATCHPAD_LEN - 1]) -> Scratchpad {
    let mut frame = [0u8; SCRATCHPAD_LEN];
    frame[..SCRATCHPAD_LEN - 1].copy_from_slice(&data);
    frame[SCRATCHPAD_LEN - 1] = crc8(&data);
    frame
}

/// Render a frame as `XX:XX:...` for diagnostics.
pub fn hex(frame: &Scratchpad) -> heapless::String<26> {
    use core::fmt::Write;
    let mut out = heapless::String::new();
    for (i, byte) in frame.iter().enumerate() {
        let sep = if i == 0 { "" } else { ":" };
        // 9 * 2 digits + 8 separators = 26.
        let _ = write!(out, "{sep}{byte:02X}");
    }
    out
}
