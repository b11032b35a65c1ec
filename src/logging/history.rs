//! Temperature history: one CSV line per timer interval, one file per day.
//!
//! ```text
//!   /2024-05-01.log   1714521600,21.50,19.75,nan
//!   /2024-05-02.log   1714608000,21.44,19.81,20.06
//!   ...
//! ```
//!
//! File names sort lexicographically in date order, so rotation simply
//! drops the first names of the sorted list.  Rotation runs on the first
//! append of each calendar day (and the first after boot) rather than on
//! every append, keeping directory scans off the common path.

use core::fmt::Write;

use chrono::NaiveDate;
use log::{debug, info};

use crate::app::events::{FilePath, SensorEvent};
use crate::app::ports::{EventSink, FileStore, StorageError, WallTime};
use crate::sensors::reading::Reading;

const LOG_SUFFIX: &str = ".log";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_LEN: usize = 10;

pub struct HistoryLogger {
    dir: FilePath,
    retention: usize,
    /// File of the last rotation check; a different name means a new day.
    current: Option<FilePath>,
}

impl HistoryLogger {
    pub fn new(dir: &str, retention: usize) -> Self {
        let mut d = FilePath::new();
        let _ = d.push_str(dir);
        Self {
            dir: d,
            retention,
            current: None,
        }
    }

    /// `<dir>/<YYYY-MM-DD>.log`.
    pub fn file_path(&self, date: NaiveDate) -> FilePath {
        let mut name = heapless::String::<16>::new();
        let _ = write!(name, "{}{LOG_SUFFIX}", date.format(DATE_FORMAT));
        join(&self.dir, &name)
    }

    /// Append the line for this cycle, rotating first on a new day.
    ///
    /// Nothing is written when no devices are present.  Storage faults are
    /// reported to `sink` and retried on the next due interval.
    pub fn log(
        &mut self,
        files: &mut impl FileStore,
        now: WallTime,
        readings: &[Reading],
        sink: &mut impl EventSink,
    ) {
        let path = self.file_path(now.local.date());

        if self.current.as_ref() != Some(&path) {
            match self.rotate(files, sink) {
                Ok(_) => self.current = Some(path.clone()),
                Err(e) => sink.emit(&SensorEvent::RotationFailed(e)),
            }
        }

        if readings.is_empty() {
            debug!("History: no sensors, nothing logged");
            return;
        }

        let line = format_line(now.unix, readings);
        match files.append_line(&path, &line) {
            Ok(()) => sink.emit(&SensorEvent::HistoryLogged {
                path,
                sensors: readings.len(),
            }),
            Err(error) => sink.emit(&SensorEvent::HistoryWriteFailed { path, error }),
        }
    }

    /// Delete the oldest history files until at most `retention` remain.
    ///
    /// Returns how many files were deleted.  A failed delete is reported
    /// and skipped; the next rotation will try it again.
    pub fn rotate(
        &self,
        files: &mut impl FileStore,
        sink: &mut impl EventSink,
    ) -> Result<usize, StorageError> {
        let mut names: Vec<String> = files
            .list_dir(&self.dir)?
            .into_iter()
            .filter(|e| !e.is_dir && is_log_file(&e.name))
            .map(|e| e.name)
            .collect();

        if names.len() <= self.retention {
            return Ok(0);
        }
        names.sort_unstable();

        let excess = names.len() - self.retention;
        let mut removed = 0;
        for name in &names[..excess] {
            let path = join(&self.dir, name);
            info!("History: deleting oldest log file {}", path);
            match files.remove(&path) {
                Ok(()) => {
                    removed += 1;
                    sink.emit(&SensorEvent::LogFilePruned { path });
                }
                Err(e) => sink.emit(&SensorEvent::RotationFailed(e)),
            }
        }
        Ok(removed)
    }
}

/// `YYYY-MM-DD.log` with a real calendar date.
pub fn is_log_file(name: &str) -> bool {
    name.strip_suffix(LOG_SUFFIX).is_some_and(|stem| {
        stem.len() == DATE_LEN && NaiveDate::parse_from_str(stem, DATE_FORMAT).is_ok()
    })
}

/// `timestamp,t0,t1,...` with two decimals; faulted slots read `nan`.
pub fn format_line(unix: i64, readings: &[Reading]) -> String {
    let mut line = String::with_capacity(12 + readings.len() * 8);
    let _ = write!(line, "{unix}");
    for r in readings {
        if r.is_error() {
            line.push_str(",nan");
        } else {
            let _ = write!(line, ",{:.2}", r.celsius());
        }
    }
    line
}

fn join(dir: &str, name: &str) -> FilePath {
    let mut p = FilePath::new();
    let _ = p.push_str(dir);
    if !dir.ends_with('/') {
        let _ = p.push('/');
    }
    let _ = p.push_str(name);
    p
}
