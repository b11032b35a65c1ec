//! Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected 0x8C).
//!
//! Used for both ROM addresses and scratchpad frames.  A buffer whose last
//! byte is the CRC of the preceding bytes checksums to zero.

/// Compute the CRC-8 of `data`, starting from an initial `crc`.
pub fn crc8_update(crc: u8, data: &[u8]) -> u8 {
    let mut crc = crc;
    for &byte in data {
        let mut byte = byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

/// Compute the CRC-8 of `data`.
pub fn crc8(data: &[u8]) -> u8 {
    crc8_update(0, data)
}
