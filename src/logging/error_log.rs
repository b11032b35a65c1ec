//! Frame fault log: one human-readable line per bad scratchpad.
//!
//! ```text
//! 05/01/24 13:07:42 - sensor:2 BAD_CRC 50:05:4B:46:7F:FF:0C:10:1C
//! ```
//!
//! The file is a single append-only record and is never rotated.

use core::fmt::Write;

use chrono::NaiveDateTime;

use crate::app::events::FilePath;
use crate::app::ports::{FileStore, StorageError, WallTime};
use crate::sensors::scratchpad::{self, FrameFault, Scratchpad};

pub struct ErrorLogger {
    path: FilePath,
}

impl ErrorLogger {
    pub fn new(path: &str) -> Self {
        let mut p = FilePath::new();
        let _ = p.push_str(path);
        Self { path: p }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn record(
        &self,
        files: &mut impl FileStore,
        now: WallTime,
        index: usize,
        fault: FrameFault,
        frame: &Scratchpad,
    ) -> Result<(), StorageError> {
        let line = format_record(now.local, index, fault, frame);
        files.append_line(&self.path, &line)
    }
}

/// `<date> <time> - sensor:<index> <TAG> <frame hex>`.
pub fn format_record(
    local: NaiveDateTime,
    index: usize,
    fault: FrameFault,
    frame: &Scratchpad,
) -> String {
    let mut line = String::with_capacity(64);
    let _ = write!(
        line,
        "{} - sensor:{index} {} {}",
        local.format("%x %X"),
        fault.tag(),
        scratchpad::hex(frame)
    );
    line
}
