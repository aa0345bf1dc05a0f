//! Configuration constants for the OpenBlink link protocol.

use std::time::Duration;

// ============================================================================
// GATT Identifiers
// ============================================================================

/// OpenBlink primary service UUID.
pub const SERVICE_UUID: &str = "227da52c-e13a-412b-befb-ba2256bb7fbe";

/// Console characteristic (notify): device program output.
pub const CONSOLE_CHARACTERISTIC_UUID: &str = "a015b3de-185a-4252-aa04-7a87d38ce148";

/// Program characteristic (write): accepts all four frame kinds.
pub const PROGRAM_CHARACTERISTIC_UUID: &str = "ad9fdd56-1135-4a84-923c-ce5a244385e7";

/// MTU characteristic (read): device-reported MTU, u16 little-endian.
pub const MTU_CHARACTERISTIC_UUID: &str = "ca141151-3113-448b-b21a-6a6203d253ff";

/// Substring an advertised device name must contain to be considered.
pub const DEVICE_NAME_FRAGMENT: &str = "Blink";

// ============================================================================
// MTU Negotiation
// ============================================================================

/// Fallback MTU when negotiation fails; safe for any BLE link.
pub const DEFAULT_MTU: u16 = 20;

/// MTU requested when the transport exposes a native MTU exchange.
pub const REQUESTED_MTU: u16 = 512;

/// ATT framing overhead subtracted from any link-reported MTU.
pub const ATT_HEADER_SIZE: u16 = 3;

// ============================================================================
// Frame Layout
// ============================================================================

/// Size of the Data frame header (version, command, offset, length).
pub const DATA_HEADER_SIZE: u16 = 6;

/// Size of a complete ProgramHeader frame.
pub const PROGRAM_HEADER_SIZE: usize = 8;

/// Protocol version byte carried by every frame.
pub const FRAME_VERSION: u8 = 0x01;

/// Device-side program slot written by every transfer.
pub const PROGRAM_SLOT: u8 = 2;

/// Largest image the 16-bit length fields can describe.
pub const MAX_IMAGE_SIZE: usize = u16::MAX as usize;

// ============================================================================
// Timeouts
// ============================================================================

/// Deadline for each discovery/negotiation/write step.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for one advertisement scan pass.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Helper Functions
// ============================================================================

/// Check whether an advertised name identifies an OpenBlink device.
pub fn is_blink_device_name(name: &str) -> bool {
    name.contains(DEVICE_NAME_FRAGMENT)
}

/// Usable Data frame payload bytes for a negotiated MTU.
///
/// Returns zero if the MTU cannot even fit the Data header.
pub fn payload_budget(mtu: u16) -> usize {
    mtu.saturating_sub(DATA_HEADER_SIZE) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blink_device_name() {
        assert!(is_blink_device_name("Blink-ESP32"));
        assert!(is_blink_device_name("OpenBlink v2"));
        assert!(!is_blink_device_name("HeartRate Monitor"));
        assert!(!is_blink_device_name(""));
        // Match is case-sensitive, as in the original name-prefix filter
        assert!(!is_blink_device_name("blink"));
    }

    #[test]
    fn test_payload_budget() {
        assert_eq!(payload_budget(DEFAULT_MTU), 14);
        assert_eq!(payload_budget(509), 503);
        assert_eq!(payload_budget(DATA_HEADER_SIZE), 0);
        assert_eq!(payload_budget(3), 0);
    }
}
