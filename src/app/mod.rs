//! Application layer: the public sensor API and its port boundary.
//!
//! [`service::TempSensors`] is what a UI or control application talks to.
//! All interaction with hardware and storage happens through the
//! **port traits** in [`ports`], keeping the core testable without real
//! peripherals.

pub mod events;
pub mod ports;
pub mod service;
