//! MTU negotiation.
//!
//! Tried in order, each step bounded by the 5-second step deadline:
//!
//! 1. Native MTU exchange, requesting 512; use the transport-reported value
//!    minus the 3-byte ATT framing overhead.
//! 2. Read the MTU characteristic; first two bytes are the device-reported
//!    MTU as u16 little-endian, minus the same overhead.
//! 3. Fall back to the default of 20.
//!
//! Negotiation never fails the session: every failure path resolves to the
//! default instead of propagating.

use crate::config::{ATT_HEADER_SIZE, DEFAULT_MTU, REQUESTED_MTU, STEP_TIMEOUT};
use crate::transport::BlinkTransport;

/// Negotiate the usable payload size for the current link.
///
/// `mtu_characteristic` is `None` when no readable MTU endpoint exists,
/// which skips straight to the fallback if the native exchange is absent.
pub fn negotiate<T: BlinkTransport>(transport: &mut T, mtu_characteristic: Option<&str>) -> u16 {
    match transport.request_mtu(REQUESTED_MTU, STEP_TIMEOUT) {
        Ok(Some(reported)) => usable_or_default(reported),
        Ok(None) => match mtu_characteristic {
            Some(uuid) => read_device_mtu(transport, uuid),
            None => DEFAULT_MTU,
        },
        Err(_) => DEFAULT_MTU,
    }
}

/// Read the device-reported MTU from its characteristic.
fn read_device_mtu<T: BlinkTransport>(transport: &mut T, uuid: &str) -> u16 {
    match transport.read(uuid, STEP_TIMEOUT) {
        Ok(value) if value.len() >= 2 => {
            let reported = u16::from_le_bytes([value[0], value[1]]);
            usable_or_default(reported)
        }
        // Unrecognized shape or read failure: not fatal for the session.
        _ => DEFAULT_MTU,
    }
}

/// Subtract link overhead, rejecting values too small to be real.
fn usable_or_default(reported: u16) -> u16 {
    let usable = reported.saturating_sub(ATT_HEADER_SIZE);
    if usable >= DEFAULT_MTU {
        usable
    } else {
        DEFAULT_MTU
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MTU_CHARACTERISTIC_UUID;
    use crate::error::LinkError;
    use crate::transport::MockBlinkTransport;

    #[test]
    fn test_native_exchange_wins() {
        let mut transport = MockBlinkTransport::new();
        transport
            .expect_request_mtu()
            .withf(|preferred, _| *preferred == REQUESTED_MTU)
            .returning(|_, _| Ok(Some(247)));
        // The characteristic must not be read when the native path succeeds.
        transport.expect_read().never();

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), 244);
    }

    #[test]
    fn test_characteristic_read_when_native_absent() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| Ok(None));
        transport
            .expect_read()
            .withf(|uuid, _| uuid == MTU_CHARACTERISTIC_UUID)
            .returning(|_, _| Ok(vec![0x00, 0x02])); // 512 LE

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), 509);
    }

    #[test]
    fn test_trailing_bytes_after_u16_are_ignored() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| Ok(None));
        transport
            .expect_read()
            .returning(|_, _| Ok(vec![0xF7, 0x00, 0xAA, 0xBB]));

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), 244);
    }

    #[test]
    fn test_native_failure_falls_back_to_default() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| {
            Err(LinkError::Timeout {
                operation: "mtu exchange",
                timeout_ms: 5000,
            })
        });

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), DEFAULT_MTU);
    }

    #[test]
    fn test_short_read_falls_back_to_default() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| Ok(None));
        transport.expect_read().returning(|_, _| Ok(vec![0x20]));

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), DEFAULT_MTU);
    }

    #[test]
    fn test_read_failure_falls_back_to_default() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| Ok(None));
        transport.expect_read().returning(|_, _| {
            Err(LinkError::Transport {
                message: "read rejected".into(),
            })
        });

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), DEFAULT_MTU);
    }

    #[test]
    fn test_no_characteristic_and_no_native_capability() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| Ok(None));

        assert_eq!(negotiate(&mut transport, None), DEFAULT_MTU);
    }

    #[test]
    fn test_implausibly_small_report_falls_back() {
        let mut transport = MockBlinkTransport::new();
        transport.expect_request_mtu().returning(|_, _| Ok(Some(2)));

        assert_eq!(negotiate(&mut transport, Some(MTU_CHARACTERISTIC_UUID)), DEFAULT_MTU);
    }
}
