//! Session state for one device connection.

use serde::{Deserialize, Serialize};

use crate::config::{
    CONSOLE_CHARACTERISTIC_UUID, MTU_CHARACTERISTIC_UUID, PROGRAM_CHARACTERISTIC_UUID,
};
use crate::error::{LinkError, LinkResult};

/// Connection lifecycle states.
///
/// `Disconnected` and `Failed` are reachable from every state except `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Idle,
    Scanning,
    CandidateFound,
    Connecting,
    DiscoveringServices,
    DiscoveringCharacteristics,
    Subscribing,
    NegotiatingMtu,
    Ready,
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// True once a session exists and operations may be issued against it.
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }
}

/// Identity of the device selected during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHandle {
    /// Transport-specific identity used to open the link.
    pub id: String,
    /// Advertised name, if the device sent one.
    pub name: Option<String>,
}

/// The three endpoints resolved once per connection.
///
/// Constructed only when all three are found; there is no partially-resolved
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicSet {
    /// Console characteristic (notify).
    pub console: String,
    /// Program characteristic (write).
    pub program: String,
    /// MTU characteristic (read).
    pub mtu: String,
}

impl CharacteristicSet {
    /// Resolve the set from the UUIDs a service discovery returned.
    ///
    /// Fails with `CharacteristicsNotFound` naming every missing role.
    pub fn resolve(discovered: &[String]) -> LinkResult<Self> {
        let find = |uuid: &str| {
            discovered
                .iter()
                .find(|c| c.eq_ignore_ascii_case(uuid))
                .cloned()
        };

        let console = find(CONSOLE_CHARACTERISTIC_UUID);
        let program = find(PROGRAM_CHARACTERISTIC_UUID);
        let mtu = find(MTU_CHARACTERISTIC_UUID);

        match (console, program, mtu) {
            (Some(console), Some(program), Some(mtu)) => Ok(Self {
                console,
                program,
                mtu,
            }),
            (console, program, mtu) => {
                let mut missing = Vec::new();
                if console.is_none() {
                    missing.push("console");
                }
                if program.is_none() {
                    missing.push("program");
                }
                if mtu.is_none() {
                    missing.push("mtu");
                }
                Err(LinkError::CharacteristicsNotFound {
                    missing: missing.join(", "),
                })
            }
        }
    }
}

/// Resolved state for one connected device.
///
/// Created on successful characteristic resolution, destroyed on disconnect
/// or fatal error. Exactly one session is active at a time, and its MTU is
/// fixed for the session's lifetime.
#[derive(Debug, Clone)]
pub struct Session {
    /// The connected device.
    pub device: DeviceHandle,
    /// Resolved console/program/mtu endpoints.
    pub characteristics: CharacteristicSet,
    /// Negotiated payload budget for one link-layer write.
    pub mtu: u16,
}
