//! Background acquisition: discover, convert, read, publish, log.
//!
//! ```text
//!        ┌──────────── rescan requested ────────────┐
//!        ▼                                          │
//!   DISCOVER ──▶ CONVERT ──▶ READ_EACH(i) ──▶ PUBLISH ──▶ log if due ──┐
//!                   ▲                                                  │
//!                   └──────────────────────────────────────────────────┘
//! ```
//!
//! [`AcquisitionLoop`] exclusively owns the bus and the delay source.  The
//! file store, clock and event sink are passed in at call sites, so one
//! cycle can be driven directly from tests.  The loop only ever talks to
//! other threads through [`SharedState`].

pub mod readings;
pub mod shared;

use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use log::{debug, info, trace};

use crate::app::events::SensorEvent;
use crate::app::ports::{Clock, EventSink, FileStore, OneWireBus};
use crate::config::{MAX_SENSORS, SensorConfig};
use crate::drivers::task_pin;
use crate::logging::{ErrorLogger, HistoryLogger};
use crate::sensors::command::{CONVERT_T, READ_SCRATCHPAD, SKIP_ROM};
use crate::sensors::device::DeviceAddress;
use crate::sensors::reading::Reading;
use crate::sensors::scratchpad::{self, SCRATCHPAD_LEN, Scratchpad};

pub use readings::{Generation, ReadingStore};
pub use shared::SharedState;

/// Upper bound on search results examined per scan.  A healthy bus
/// terminates the search long before this.
const SEARCH_LIMIT: usize = 64;

pub struct AcquisitionLoop<B, D> {
    bus: B,
    delay: D,
    shared: Arc<SharedState>,
    max_sensors: usize,
    search_family: u8,
    conversion_wait_ms: u32,
    devices: heapless::Vec<DeviceAddress, MAX_SENSORS>,
    /// Loop-owned half of the double buffer.
    back: Generation,
    history: HistoryLogger,
    errors: ErrorLogger,
    cycles: u64,
}

impl<B: OneWireBus, D: DelayNs> AcquisitionLoop<B, D> {
    pub fn new(bus: B, delay: D, config: &SensorConfig, shared: Arc<SharedState>) -> Self {
        Self {
            bus,
            delay,
            shared,
            max_sensors: usize::from(config.max_sensors).min(MAX_SENSORS),
            search_family: config.search_family,
            conversion_wait_ms: config.conversion_wait_ms,
            devices: heapless::Vec::new(),
            back: Generation::new(),
            history: HistoryLogger::new(&config.log_dir, usize::from(config.saved_logfiles)),
            errors: ErrorLogger::new(&config.error_log_path),
            cycles: 0,
        }
    }

    /// Devices found by the last scan, in search order.
    pub fn devices(&self) -> &[DeviceAddress] {
        &self.devices
    }

    /// Completed cycles since construction.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Cycle until [`SharedState::request_stop`] is called.
    pub fn run<F, C, S>(mut self, mut files: F, clock: C, mut sink: S)
    where
        F: FileStore,
        C: Clock,
        S: EventSink,
    {
        info!(
            "Acquisition: loop started (max {} sensors, {} ms conversion)",
            self.max_sensors, self.conversion_wait_ms
        );
        while self.shared.is_running() {
            self.run_cycle(&mut files, &clock, &mut sink);
            if let Some(words) = task_pin::stack_high_water_mark() {
                trace!("Acquisition: stack high-water mark {} words", words);
            }
        }
        info!("Acquisition: loop stopped after {} cycles", self.cycles);
    }

    /// One full pass through the state machine.
    ///
    /// A rescan requested while this runs is only honoured at the top of
    /// the next call, so the published generation always matches the
    /// device table it was read from.
    pub fn run_cycle(
        &mut self,
        files: &mut impl FileStore,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        if self.shared.take_rescan() {
            self.discover(sink);
        }

        self.convert(sink);

        self.back.clear();
        for index in 0..self.devices.len() {
            let reading = self.read_device(index, files, clock, sink);
            // Capacity matches the device table.
            let _ = self.back.push(reading);
        }

        let count = self.back.len();
        let errors = self.back.iter().filter(|r| r.is_error()).count();
        self.shared.readings.publish(&mut self.back);
        sink.emit(&SensorEvent::Published { count, errors });

        if self.shared.take_log_due() {
            let visible = self.shared.readings.snapshot();
            self.history.log(files, clock.now(), &visible, sink);
        }

        self.cycles += 1;
    }

    // ── DISCOVER ─────────────────────────────────────────────

    fn discover(&mut self, sink: &mut impl EventSink) {
        self.devices.clear();
        let mut ignored = 0;

        self.bus.begin_search(self.search_family);
        for _ in 0..SEARCH_LIMIT {
            let Some(address) = self.bus.search_next() else {
                break;
            };
            let rom = address.bytes();
            if self.bus.crc8(&rom[..7]) != rom[7] {
                debug!("Acquisition: ROM {} failed CRC, skipped", address);
                ignored += 1;
                continue;
            }
            // Unrecognised codes are only kept when explicitly searched for.
            if !address.family().is_known() && address.family_code() != self.search_family {
                debug!("Acquisition: {} is not a temperature sensor", address);
                ignored += 1;
                continue;
            }
            if self.devices.len() >= self.max_sensors || self.devices.push(address).is_err() {
                ignored += 1;
                continue;
            }
            info!(
                "Acquisition: sensor {} at {} ({})",
                self.devices.len() - 1,
                address,
                address.family().name()
            );
        }

        sink.emit(&SensorEvent::Scanned {
            count: self.devices.len(),
            ignored,
        });
    }

    // ── CONVERT ──────────────────────────────────────────────

    fn convert(&mut self, sink: &mut impl EventSink) {
        if self.bus.reset() {
            self.bus.write_byte(SKIP_ROM, false);
            // Parasite-powered parts draw their conversion current from the
            // data line, so keep it driven.
            self.bus.write_byte(CONVERT_T, true);
        } else {
            sink.emit(&SensorEvent::NoPresence);
        }
        // Also paces the loop when the bus is empty.
        self.delay.delay_ms(self.conversion_wait_ms);
    }

    // ── READ_EACH ────────────────────────────────────────────

    fn read_device(
        &mut self,
        index: usize,
        files: &mut impl FileStore,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Reading {
        let address = self.devices[index];
        let family = address.family();

        self.bus.reset();
        self.bus.select(&address);
        self.bus.write_byte(READ_SCRATCHPAD, false);
        let mut frame: Scratchpad = [0; SCRATCHPAD_LEN];
        for byte in frame.iter_mut() {
            *byte = self.bus.read_byte();
        }
        debug!(
            "Sensor {} ({}) frame {}",
            index,
            family.name(),
            scratchpad::hex(&frame)
        );

        if !family.is_known() {
            sink.emit(&SensorEvent::UnknownFamily { index, address });
        }

        let decoded = scratchpad::decode(&frame, family);
        if let Err(fault) = decoded {
            sink.emit(&SensorEvent::FrameFault {
                index,
                fault,
                frame,
            });
            if self.shared.error_logging() {
                if let Err(e) = self.errors.record(files, clock.now(), index, fault, &frame) {
                    sink.emit(&SensorEvent::ErrorLogWriteFailed(e));
                }
            }
        }
        Reading::from_decoded(address, decoded)
    }
}
