//! One-wire bus over the ESP32 RMT peripheral.
//!
//! Wraps `esp_idf_hal::onewire::OWDriver` (backed by the IDF
//! `onewire_bus` component) behind the [`OneWireBus`] port.  The driver's
//! search borrows it for the whole enumeration, so [`begin_search`]
//! collects every address up front and [`search_next`] hands them out.
//!
//! Bus errors are flattened: a failed reset reports no presence and a
//! failed read yields `0xFF`, which the scratchpad CRC then rejects.
//!
//! [`begin_search`]: OneWireBus::begin_search
//! [`search_next`]: OneWireBus::search_next

use std::collections::VecDeque;

use esp_idf_hal::gpio::{InputPin, OutputPin};
use esp_idf_hal::onewire::OWDriver;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::RmtChannel;
use esp_idf_svc::sys::EspError;
use log::{debug, warn};

use crate::app::ports::OneWireBus;
use crate::sensors::command::MATCH_ROM;
use crate::sensors::device::DeviceAddress;

pub struct OneWireRmt<'d> {
    driver: OWDriver<'d>,
    found: VecDeque<DeviceAddress>,
}

impl<'d> OneWireRmt<'d> {
    pub fn new(
        pin: impl Peripheral<P = impl InputPin + OutputPin> + 'd,
        channel: impl Peripheral<P = impl RmtChannel> + 'd,
    ) -> Result<Self, EspError> {
        let driver = OWDriver::new(pin, channel)?;
        Ok(Self {
            driver,
            found: VecDeque::new(),
        })
    }
}

impl OneWireBus for OneWireRmt<'_> {
    fn reset(&mut self) -> bool {
        self.driver.reset().is_ok()
    }

    fn select(&mut self, address: &DeviceAddress) {
        let mut frame = [0u8; 9];
        frame[0] = MATCH_ROM;
        frame[1..].copy_from_slice(address.bytes());
        if let Err(e) = self.driver.write(&frame) {
            debug!("OneWire: MATCH ROM to {} failed: {}", address, e);
        }
    }

    fn write_byte(&mut self, byte: u8, _power: bool) {
        // The RMT driver releases the line high between slots.
        if let Err(e) = self.driver.write(&[byte]) {
            debug!("OneWire: write 0x{:02X} failed: {}", byte, e);
        }
    }

    fn read_byte(&mut self) -> u8 {
        let mut buf = [0xFF];
        if let Err(e) = self.driver.read(&mut buf) {
            debug!("OneWire: read failed: {}", e);
            return 0xFF;
        }
        buf[0]
    }

    fn begin_search(&mut self, family: u8) {
        self.found.clear();
        let search = match self.driver.search() {
            Ok(s) => s,
            Err(e) => {
                warn!("OneWire: search failed to start: {}", e);
                return;
            }
        };
        let mut others = Vec::new();
        for result in search {
            match result {
                Ok(addr) => {
                    let address = DeviceAddress::from_u64(addr.address());
                    // The requested family first, in search order.
                    if address.family_code() == family {
                        self.found.push_back(address);
                    } else {
                        others.push(address);
                    }
                }
                Err(e) => {
                    warn!("OneWire: search aborted: {}", e);
                    break;
                }
            }
        }
        self.found.extend(others);
    }

    fn search_next(&mut self) -> Option<DeviceAddress> {
        self.found.pop_front()
    }
}
