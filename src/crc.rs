//! CRC16 engine for image integrity checks.
//!
//! The OpenBlink firmware validates a transferred image against a reflected
//! (LSB-first) CRC-16 with seed 0xFFFF and polynomial 0xD175. This is not one
//! of the standard registry parameter sets, so it is implemented directly.

/// CRC seed value.
const CRC_SEED: u16 = 0xFFFF;

/// Reflected polynomial expected by the device firmware.
const CRC_POLY: u16 = 0xD175;

/// Calculate the CRC16 of a byte sequence.
///
/// Deterministic and pure: the same bytes always yield the same checksum.
/// The checksum of an empty sequence is the seed itself.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC_SEED;

    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC_POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
