//! Timer and task-placement helpers for the acquisition core.

pub mod hw_timer;
pub mod task_pin;
