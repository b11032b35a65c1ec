//! Fuzz target: `scratchpad::decode`
//!
//! Byte 0 selects the family code, the next nine bytes are the frame.
//! Decoding must never panic, and anything it accepts must lie inside the
//! sensor range.
//!
//! cargo fuzz run fuzz_scratchpad_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use tempchain::sensors::scratchpad::{
    self, Family, FrameFault, MAX_VALID_C, MIN_VALID_C, SCRATCHPAD_LEN, Scratchpad,
};

fuzz_target!(|data: &[u8]| {
    let Some((&code, rest)) = data.split_first() else {
        return;
    };
    let Some(bytes) = rest.get(..SCRATCHPAD_LEN) else {
        return;
    };
    let mut frame: Scratchpad = [0; SCRATCHPAD_LEN];
    frame.copy_from_slice(bytes);
    let family = Family::from_code(code);

    match scratchpad::decode(&frame, family) {
        Ok(c) => assert!(c > MIN_VALID_C && c < MAX_VALID_C, "{c} accepted"),
        Err(FrameFault::BadCrc | FrameFault::OutOfRange) => {}
    }
    assert_eq!(scratchpad::hex(&frame).len(), 26);
});
