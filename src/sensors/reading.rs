//! Per-device reading as published to consumers.

use super::device::DeviceAddress;
use super::scratchpad::FrameFault;

/// Latest result for one device.
///
/// Constructed only through [`Reading::valid`] / [`Reading::faulted`] so
/// that an erroneous reading always carries NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    address: DeviceAddress,
    celsius: f32,
    error: bool,
}

impl Reading {
    pub const fn valid(address: DeviceAddress, celsius: f32) -> Self {
        Self {
            address,
            celsius,
            error: false,
        }
    }

    pub const fn faulted(address: DeviceAddress) -> Self {
        Self {
            address,
            celsius: f32::NAN,
            error: true,
        }
    }

    pub fn from_decoded(address: DeviceAddress, decoded: Result<f32, FrameFault>) -> Self {
        match decoded {
            Ok(celsius) => Self::valid(address, celsius),
            Err(_) => Self::faulted(address),
        }
    }

    pub const fn address(&self) -> DeviceAddress {
        self.address
    }

    /// Temperature in °C, NaN when [`is_error`](Self::is_error).
    pub const fn celsius(&self) -> f32 {
        self.celsius
    }

    pub const fn is_error(&self) -> bool {
        self.error
    }
}
