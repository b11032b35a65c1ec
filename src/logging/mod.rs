//! Durable logs written by the acquisition loop.
//!
//! - [`history`]: dated CSV files, pruned to a retention cap.
//! - [`error_log`]: a single append-only record of frame faults.

pub mod error_log;
pub mod history;

pub use error_log::ErrorLogger;
pub use history::HistoryLogger;
