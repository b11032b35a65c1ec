//! tempchain firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  OneWireRmt    FatStore     NvsAdapter   SystemClock         │
//! │  (OneWireBus)  (FileStore)  (KeyValue)   (Clock) + StdDelay  │
//! │  LogEventSink (EventSink)                                    │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ────────────────        │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │ TempSensors ── AcquisitionLoop (core 1) ── LogTimer│      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use tempchain::adapters::fat_store::FatStore;
use tempchain::adapters::log_sink::LogEventSink;
use tempchain::adapters::nvs::{NAMESPACE, NvsAdapter};
use tempchain::adapters::onewire_rmt::OneWireRmt;
use tempchain::adapters::time::{StdDelay, SystemClock};
use tempchain::{LoopResources, SensorConfig, TempSensors};

/// VFS mount point and partition label of the FAT data partition.
const FAT_BASE: &str = "/ffat";
const FAT_LABEL: &str = "ffat";

/// How often the console summary is printed.
const REPORT_INTERVAL: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("tempchain v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Storage ────────────────────────────────────────────
    let nvs = NvsAdapter::open(NAMESPACE)?;
    let config = SensorConfig::load(&nvs).unwrap_or_else(|e| {
        warn!("Stored config unusable ({}), using defaults", e);
        SensorConfig::default()
    });
    let files = FatStore::mount(FAT_BASE, FAT_LABEL)?;

    // ── 3. One-wire bus on GPIO4 / RMT channel 0 ──────────────
    let peripherals = Peripherals::take()?;
    let bus = OneWireRmt::new(peripherals.pins.gpio4, peripherals.rmt.channel0)?;

    // ── 4. Start acquisition ──────────────────────────────────
    let sensors = TempSensors::start(
        &config,
        nvs,
        LoopResources {
            bus,
            delay: StdDelay,
            files,
            clock: SystemClock::new(),
            sink: LogEventSink::new(),
        },
    )?;
    info!(
        "Sensors running; history logging {}",
        if sensors.is_temp_logging() { "on" } else { "off" }
    );

    // ── 5. Console report ─────────────────────────────────────
    loop {
        std::thread::sleep(REPORT_INTERVAL);
        for i in 0..sensors.count() {
            if sensors.is_error(i) {
                warn!("{:>2} {:<14} ----", i, sensors.name(i));
            } else {
                info!("{:>2} {:<14} {:6.2} °C", i, sensors.name(i), sensors.temperature(i));
            }
        }
    }
}
