//! Mock adapters for integration tests.
//!
//! Every mock keeps its state behind an `Arc<Mutex<_>>` and is `Clone`, so
//! a test can hand one copy to the acquisition task and keep another to
//! inspect or reshape the "hardware" while it runs.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use embedded_hal::delay::DelayNs;
use tempchain::app::events::SensorEvent;
use tempchain::app::ports::{
    Clock, DirEntry, EventSink, FileStore, KeyValueStore, OneWireBus, StorageError, WallTime,
};
use tempchain::sensors::command::{MATCH_ROM, READ_SCRATCHPAD};
use tempchain::sensors::crc::crc8;
use tempchain::sensors::device::DeviceAddress;
use tempchain::sensors::scratchpad::{Scratchpad, with_crc};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Frames and addresses ──────────────────────────────────────

/// ROM code with a valid CRC byte.
pub fn rom(family: u8, serial: u8) -> DeviceAddress {
    let mut b = [family, serial, 0xA0, 0x00, 0x00, 0x00, 0x00, 0x00];
    b[7] = crc8(&b[..7]);
    DeviceAddress::new(b)
}

/// 12-bit DS18B20/DS1822 frame holding `sixteenths` of a degree.
pub fn standard_frame(sixteenths: i16) -> Scratchpad {
    let [lo, hi] = sixteenths.to_le_bytes();
    with_crc([lo, hi, 0x4B, 0x46, 0x7F, 0xFF, 0x01, 0x10])
}

/// DS18S20 frame: half-degree reading plus count-remaining.
pub fn legacy_frame(half_degrees: i16, count_remain: u8) -> Scratchpad {
    let [lo, hi] = half_degrees.to_le_bytes();
    with_crc([lo, hi, 0x4B, 0x46, 0xFF, 0xFF, count_remain, 0x10])
}

/// `frame` with its CRC byte corrupted.
pub fn corrupt(mut frame: Scratchpad) -> Scratchpad {
    frame[8] ^= 0x5A;
    frame
}

// ── One-wire bus ──────────────────────────────────────────────

pub struct MockDevice {
    pub address: DeviceAddress,
    pub frame: Scratchpad,
}

type ReadHook = Box<dyn FnMut() + Send>;

#[derive(Default)]
pub struct BusState {
    pub devices: Vec<MockDevice>,
    pub searches: usize,
    pub searched_family: Option<u8>,
    pub commands: Vec<u8>,
    pub scratchpad_reads: usize,
    /// `(commands.len(), ms)` for every delay taken through [`BusDelay`].
    pub waits: Vec<(usize, u32)>,
    search_pos: usize,
    selected: Option<usize>,
    cursor: usize,
    on_read: Option<ReadHook>,
}

#[derive(Clone, Default)]
pub struct MockBus(Arc<Mutex<BusState>>);

impl MockBus {
    pub fn with_devices(devices: &[(DeviceAddress, Scratchpad)]) -> Self {
        let bus = Self::default();
        for &(address, frame) in devices {
            bus.add_device(address, frame);
        }
        bus
    }

    pub fn state(&self) -> MutexGuard<'_, BusState> {
        lock(&self.0)
    }

    pub fn add_device(&self, address: DeviceAddress, frame: Scratchpad) {
        self.state().devices.push(MockDevice { address, frame });
    }

    pub fn set_frame(&self, address: DeviceAddress, frame: Scratchpad) {
        let mut s = self.state();
        if let Some(d) = s.devices.iter_mut().find(|d| d.address == address) {
            d.frame = frame;
        }
    }

    pub fn reverse_devices(&self) {
        self.state().devices.reverse();
    }

    pub fn searches(&self) -> usize {
        self.state().searches
    }

    /// Run `hook` once, on the first scratchpad byte read after this call.
    pub fn on_next_read(&self, hook: impl FnMut() + Send + 'static) {
        self.state().on_read = Some(Box::new(hook));
    }
}

impl OneWireBus for MockBus {
    fn reset(&mut self) -> bool {
        let mut s = self.state();
        s.cursor = 0;
        s.selected = None;
        !s.devices.is_empty()
    }

    fn select(&mut self, address: &DeviceAddress) {
        let mut s = self.state();
        s.commands.push(MATCH_ROM);
        s.selected = s.devices.iter().position(|d| d.address == *address);
    }

    fn write_byte(&mut self, byte: u8, _power: bool) {
        let mut s = self.state();
        if byte == READ_SCRATCHPAD {
            s.scratchpad_reads += 1;
        }
        s.commands.push(byte);
    }

    fn read_byte(&mut self) -> u8 {
        // The hook may call back into the mock, so run it unlocked.
        let hook = self.state().on_read.take();
        if let Some(mut hook) = hook {
            hook();
        }
        let mut s = self.state();
        let byte = s
            .selected
            .and_then(|i| s.devices.get(i))
            .map_or(0xFF, |d| d.frame[s.cursor.min(8)]);
        s.cursor += 1;
        byte
    }

    fn begin_search(&mut self, family: u8) {
        let mut s = self.state();
        s.searches += 1;
        s.searched_family = Some(family);
        s.search_pos = 0;
    }

    fn search_next(&mut self) -> Option<DeviceAddress> {
        let mut s = self.state();
        let next = s.devices.get(s.search_pos).map(|d| d.address);
        s.search_pos += 1;
        next
    }
}

// ── File store ────────────────────────────────────────────────

#[derive(Default)]
pub struct FileState {
    pub files: BTreeMap<String, String>,
    pub fail_appends: bool,
}

#[derive(Clone, Default)]
pub struct MemFiles(Arc<Mutex<FileState>>);

impl MemFiles {
    pub fn state(&self) -> MutexGuard<'_, FileState> {
        lock(&self.0)
    }

    pub fn touch(&self, path: &str) {
        self.state().files.entry(path.to_owned()).or_default();
    }

    pub fn paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.state().files.get(path).cloned()
    }

    pub fn lines(&self, path: &str) -> Vec<String> {
        self.read(path)
            .map(|c| c.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.state().fail_appends = fail;
    }
}

impl FileStore for MemFiles {
    fn append_line(&mut self, path: &str, line: &str) -> Result<(), StorageError> {
        let mut s = self.state();
        if s.fail_appends {
            return Err(StorageError::Full);
        }
        let f = s.files.entry(path.to_owned()).or_default();
        f.push_str(line);
        f.push('\n');
        Ok(())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<DirEntry>, StorageError> {
        let prefix = if path.ends_with('/') {
            path.to_owned()
        } else {
            format!("{path}/")
        };
        let s = self.state();
        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for key in s.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_owned());
                }
                None => entries.push(DirEntry {
                    name: rest.to_owned(),
                    is_dir: false,
                }),
            }
        }
        entries.extend(dirs.into_iter().map(|name| DirEntry { name, is_dir: true }));
        Ok(entries)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        self.state()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

// ── Key-value store ───────────────────────────────────────────

#[derive(Default)]
pub struct KvState {
    pub map: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

#[derive(Clone, Default)]
pub struct MemKv(Arc<Mutex<KvState>>);

impl MemKv {
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.0).map.get(key).cloned()
    }

    /// Make every later `write` and `delete` fail with `Full`.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.0).fail_writes = fail;
    }
}

impl KeyValueStore for MemKv {
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let s = lock(&self.0);
        let data = s.map.get(key).ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut s = lock(&self.0);
        if s.fail_writes {
            return Err(StorageError::Full);
        }
        s.map.insert(key.to_owned(), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        let mut s = lock(&self.0);
        if s.fail_writes {
            return Err(StorageError::Full);
        }
        s.map.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        lock(&self.0).map.contains_key(key)
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FixedClock(Arc<Mutex<WallTime>>);

impl FixedClock {
    /// Noon on the given date, local time equal to UTC.
    pub fn at(y: i32, m: u32, d: u32) -> Self {
        Self(Arc::new(Mutex::new(noon(y, m, d))))
    }

    pub fn set(&self, y: i32, m: u32, d: u32) {
        *lock(&self.0) = noon(y, m, d);
    }
}

fn noon(y: i32, m: u32, d: u32) -> WallTime {
    let local = NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid test date");
    WallTime {
        unix: local.and_utc().timestamp(),
        local,
    }
}

impl Clock for FixedClock {
    fn now(&self) -> WallTime {
        *lock(&self.0)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<SensorEvent>>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<SensorEvent> {
        lock(&self.0).clone()
    }

    pub fn count(&self, pred: impl Fn(&SensorEvent) -> bool) -> usize {
        lock(&self.0).iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        lock(&self.0).clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SensorEvent) {
        lock(&self.0).push(event.clone());
    }
}

// ── Delays ────────────────────────────────────────────────────

/// Returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Sleeps a fixed short time per call, whatever is asked, so a threaded
/// loop neither spins nor waits the real conversion time.
pub struct ShortDelay(pub Duration);

impl DelayNs for ShortDelay {
    fn delay_ns(&mut self, _ns: u32) {
        std::thread::sleep(self.0);
    }

    fn delay_ms(&mut self, _ms: u32) {
        std::thread::sleep(self.0);
    }
}

/// Records each requested wait on the bus it paces, together with how
/// many bus commands preceded it.  Returns immediately.
pub struct BusDelay(pub MockBus);

impl BusDelay {
    fn record(&mut self, ms: u32) {
        let mut s = self.0.state();
        let at = s.commands.len();
        s.waits.push((at, ms));
    }
}

impl DelayNs for BusDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.record(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(ms);
    }
}

// ── Polling ───────────────────────────────────────────────────

/// Poll `cond` until it holds or five seconds pass.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
