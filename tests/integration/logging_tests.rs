//! History and error-log files against the in-memory file store.

use tempchain::app::events::{FilePath, SensorEvent};
use tempchain::app::ports::{Clock, StorageError};
use tempchain::logging::{ErrorLogger, HistoryLogger};
use tempchain::sensors::reading::Reading;
use tempchain::sensors::scratchpad::FrameFault;

use super::mock_hw::{FixedClock, MemFiles, RecordingSink, corrupt, rom, standard_frame};

fn readings() -> Vec<Reading> {
    vec![
        Reading::valid(rom(0x28, 1), 21.5),
        Reading::faulted(rom(0x28, 2)),
        Reading::valid(rom(0x28, 3), -3.25),
    ]
}

// ── History ───────────────────────────────────────────────────

#[test]
fn lines_accumulate_in_the_day_file() {
    let mut files = MemFiles::default();
    let clock = FixedClock::at(2024, 5, 1);
    let mut sink = RecordingSink::default();
    let mut history = HistoryLogger::new("/", 30);

    history.log(&mut files, clock.now(), &readings(), &mut sink);
    history.log(&mut files, clock.now(), &readings(), &mut sink);

    assert_eq!(
        files.lines("/2024-05-01.log"),
        vec!["1714564800,21.50,nan,-3.25"; 2]
    );
    assert_eq!(
        sink.count(|e| matches!(e, SensorEvent::HistoryLogged { sensors: 3, .. })),
        2
    );
}

#[test]
fn history_in_subdirectory() {
    let mut files = MemFiles::default();
    files.touch("/2024-01-01.log");
    let mut history = HistoryLogger::new("/logs", 1);
    let clock = FixedClock::at(2024, 5, 1);

    history.log(&mut files, clock.now(), &readings(), &mut RecordingSink::default());

    // Rotation only looks inside its own directory.
    assert_eq!(files.paths(), vec!["/2024-01-01.log", "/logs/2024-05-01.log"]);
}

#[test]
fn rotation_ignores_foreign_names_and_directories() {
    let mut files = MemFiles::default();
    for p in [
        "/2024-04-01.log",
        "/2024-04-02.log",
        "/notes.log",
        "/2024-13-45.log",
        "/sensor_error.txt",
        "/2024-01-01.log/inner.txt",
    ] {
        files.touch(p);
    }
    let mut sink = RecordingSink::default();
    let history = HistoryLogger::new("/", 1);

    assert_eq!(history.rotate(&mut files, &mut sink), Ok(1));
    assert_eq!(
        files.paths(),
        vec![
            "/2024-01-01.log/inner.txt",
            "/2024-04-02.log",
            "/2024-13-45.log",
            "/notes.log",
            "/sensor_error.txt",
        ]
    );
    assert_eq!(
        sink.events(),
        vec![SensorEvent::LogFilePruned {
            path: FilePath::try_from("/2024-04-01.log").unwrap()
        }]
    );
}

#[test]
fn rotation_runs_once_per_day() {
    let mut files = MemFiles::default();
    let clock = FixedClock::at(2024, 5, 1);
    let mut sink = RecordingSink::default();
    let mut history = HistoryLogger::new("/", 1);

    history.log(&mut files, clock.now(), &readings(), &mut sink);
    // An old file appearing mid-day survives until the date changes.
    files.touch("/2024-04-30.log");
    history.log(&mut files, clock.now(), &readings(), &mut sink);
    assert_eq!(files.paths(), vec!["/2024-04-30.log", "/2024-05-01.log"]);

    clock.set(2024, 5, 2);
    history.log(&mut files, clock.now(), &readings(), &mut sink);
    assert_eq!(files.paths(), vec!["/2024-05-01.log", "/2024-05-02.log"]);
}

#[test]
fn write_failure_is_reported_and_retried() {
    let mut files = MemFiles::default();
    let clock = FixedClock::at(2024, 5, 1);
    let mut sink = RecordingSink::default();
    let mut history = HistoryLogger::new("/", 30);

    files.set_fail_appends(true);
    history.log(&mut files, clock.now(), &readings(), &mut sink);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            SensorEvent::HistoryWriteFailed {
                error: StorageError::Full,
                ..
            }
        )),
        1
    );

    files.set_fail_appends(false);
    history.log(&mut files, clock.now(), &readings(), &mut sink);
    assert_eq!(files.lines("/2024-05-01.log").len(), 1);
}

#[test]
fn no_readings_no_line() {
    let mut files = MemFiles::default();
    let clock = FixedClock::at(2024, 5, 1);
    let mut sink = RecordingSink::default();
    let mut history = HistoryLogger::new("/", 30);

    history.log(&mut files, clock.now(), &[], &mut sink);
    assert!(files.paths().is_empty());
    assert_eq!(sink.count(|e| matches!(e, SensorEvent::HistoryLogged { .. })), 0);
}

// ── Error log ─────────────────────────────────────────────────

#[test]
fn error_records_append_to_one_file() {
    let mut files = MemFiles::default();
    let clock = FixedClock::at(2024, 5, 1);
    let log = ErrorLogger::new("/sensor_error.txt");
    let frame = corrupt(standard_frame(0x0190));

    log.record(&mut files, clock.now(), 0, FrameFault::BadCrc, &frame)
        .unwrap();
    clock.set(2024, 5, 2);
    log.record(&mut files, clock.now(), 2, FrameFault::OutOfRange, &standard_frame(0x0550))
        .unwrap();

    let lines = files.lines("/sensor_error.txt");
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("05/01/24 12:00:00 - sensor:0 BAD_CRC 90:01:"));
    assert!(lines[1].starts_with("05/02/24 12:00:00 - sensor:2 BAD_TMP 50:05:"));
}

#[test]
fn error_record_surfaces_storage_failure() {
    let mut files = MemFiles::default();
    files.set_fail_appends(true);
    let log = ErrorLogger::new("/sensor_error.txt");
    let frame = standard_frame(0x0190);
    assert_eq!(
        log.record(
            &mut files,
            FixedClock::at(2024, 5, 1).now(),
            0,
            FrameFault::BadCrc,
            &frame
        ),
        Err(StorageError::Full)
    );
}
