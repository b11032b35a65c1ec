//! Fuzz target: `history::is_log_file`
//!
//! Rotation deletes whatever this predicate accepts, so it must only ever
//! accept `YYYY-MM-DD.log` names with a real calendar date.
//!
//! cargo fuzz run fuzz_log_file_name

#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use tempchain::logging::history::is_log_file;

fuzz_target!(|name: &str| {
    if is_log_file(name) {
        let stem = &name[..name.len() - 4];
        assert_eq!(stem.len(), 10);
        assert!(NaiveDate::parse_from_str(stem, "%Y-%m-%d").is_ok());
    }
});
