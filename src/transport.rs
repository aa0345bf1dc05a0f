//! Transport capability interface for the wireless link.
//!
//! The engine consumes scan/connect/discover/subscribe/read/write as a
//! capability trait rather than binding to a concrete BLE stack. Every
//! blocking primitive takes an explicit deadline and resolves to a single
//! value or a typed error; implementations surface an expired deadline as
//! [`LinkError::Timeout`](crate::error::LinkError::Timeout).

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use serde::{Deserialize, Serialize};

use crate::error::LinkResult;

/// Callback invoked for each inbound notification payload.
pub type NotificationHandler = Box<dyn Fn(&[u8]) + Send + 'static>;

/// One advertisement observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Transport-specific device identity (address or platform id).
    pub id: String,
    /// Advertised device name, if present.
    pub name: Option<String>,
    /// Signal strength at scan time, if reported.
    pub rssi: Option<i16>,
}

impl Advertisement {
    /// Get a display label for this device.
    pub fn display_label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Unknown ({})", self.id),
        }
    }
}

/// Trait for the underlying wireless transport.
///
/// This abstraction allows mocking in tests and alternative BLE stacks.
/// No two operations are ever issued concurrently against the same
/// characteristic; only subscribed notification delivery is asynchronous.
#[cfg_attr(test, automock)]
pub trait BlinkTransport: Send {
    /// Scan for advertisements until the deadline expires.
    fn scan(&mut self, timeout: Duration) -> LinkResult<Vec<Advertisement>>;

    /// Open a link to the device with the given identity.
    fn connect(&mut self, device_id: &str, timeout: Duration) -> LinkResult<()>;

    /// Discover the connected device's service UUIDs.
    fn discover_services(&mut self, timeout: Duration) -> LinkResult<Vec<String>>;

    /// Discover the characteristic UUIDs of one service.
    fn discover_characteristics(
        &mut self,
        service_uuid: &str,
        timeout: Duration,
    ) -> LinkResult<Vec<String>>;

    /// Subscribe to notifications on a characteristic.
    ///
    /// The handler may be invoked from another thread at any time until
    /// disconnect, interleaved with in-flight operations.
    fn subscribe(
        &mut self,
        characteristic_uuid: &str,
        handler: NotificationHandler,
        timeout: Duration,
    ) -> LinkResult<()>;

    /// Read a characteristic's current value.
    fn read(&mut self, characteristic_uuid: &str, timeout: Duration) -> LinkResult<Vec<u8>>;

    /// Write data to a characteristic, awaiting completion.
    fn write(
        &mut self,
        characteristic_uuid: &str,
        data: &[u8],
        timeout: Duration,
    ) -> LinkResult<()>;

    /// Request a link MTU, if the transport exposes a native MTU exchange.
    ///
    /// Returns `Ok(None)` when the capability is absent; `Ok(Some(mtu))` is
    /// the transport-reported value including its own framing overhead.
    fn request_mtu(&mut self, preferred: u16, timeout: Duration) -> LinkResult<Option<u16>>;

    /// Tear down the link.
    fn disconnect(&mut self) -> LinkResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_with_name() {
        let ad = Advertisement {
            id: "AA:BB:CC:DD:EE:FF".to_string(),
            name: Some("Blink-ESP32".to_string()),
            rssi: Some(-52),
        };
        assert_eq!(ad.display_label(), "Blink-ESP32");
    }

    #[test]
    fn test_display_label_without_name() {
        let ad = Advertisement {
            id: "AA:BB:CC:DD:EE:FF".to_string(),
            name: None,
            rssi: None,
        };
        assert_eq!(ad.display_label(), "Unknown (AA:BB:CC:DD:EE:FF)");
    }

    #[test]
    fn test_advertisement_serializes() {
        let ad = Advertisement {
            id: "id-1".to_string(),
            name: Some("Blink".to_string()),
            rssi: Some(-40),
        };
        let json = serde_json::to_string(&ad).unwrap();
        let back: Advertisement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ad);
    }
}
