//! Connection state machine for one OpenBlink device session.
//!
//! Drives discovery of the device, its service, and its three
//! characteristics, subscribes to console notifications, negotiates the MTU,
//! and then owns the resulting [`Session`] until disconnect. Each step is a
//! bounded blocking primitive; a failure at any step performs best-effort
//! cleanup and lands in `Disconnected`. Re-connecting always starts a fresh
//! session: there is no resume.

use serde::{Deserialize, Serialize};

use crate::config::{is_blink_device_name, SCAN_TIMEOUT, SERVICE_UUID, STEP_TIMEOUT};
use crate::console::ConsoleStream;
use crate::error::{LinkError, LinkResult};
use crate::frame::Frame;
use crate::image::BinaryImage;
use crate::mtu;
use crate::session::{CharacteristicSet, ConnectionState, DeviceHandle, Session};
use crate::transfer::{self, TransferReport, TransferStage};
use crate::transport::{Advertisement, BlinkTransport};

/// Connection lifecycle events for UI feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum LinkEvent {
    /// Scanning for advertisements.
    Scanning,
    /// Matching devices found, awaiting selection.
    CandidatesFound { count: usize },
    /// Opening the link to the chosen device.
    Connecting { device: String },
    /// Requesting service discovery.
    DiscoveringServices,
    /// Looking up the console/program/mtu characteristics.
    DiscoveringCharacteristics,
    /// Subscribing to console notifications.
    Subscribing,
    /// Negotiating the link MTU.
    NegotiatingMtu,
    /// Session established.
    Ready { mtu: u16 },
    /// Session torn down.
    Disconnected,
    /// Best-effort cleanup after a failure itself failed.
    CleanupFailed { message: String },
}

impl LinkEvent {
    /// Get a human-readable message for this event.
    pub fn message(&self) -> String {
        match self {
            LinkEvent::Scanning => "Scanning for Blink devices...".into(),
            LinkEvent::CandidatesFound { count } => {
                format!("Found {} Blink device(s)", count)
            }
            LinkEvent::Connecting { device } => format!("Connecting to {}...", device),
            LinkEvent::DiscoveringServices => "Discovering services...".into(),
            LinkEvent::DiscoveringCharacteristics => "Discovering characteristics...".into(),
            LinkEvent::Subscribing => "Subscribing to console output...".into(),
            LinkEvent::NegotiatingMtu => "Negotiating MTU...".into(),
            LinkEvent::Ready { mtu } => format!("Connected (MTU {})", mtu),
            LinkEvent::Disconnected => "Device disconnected".into(),
            LinkEvent::CleanupFailed { message } => {
                format!("Cleanup after failure did not complete: {}", message)
            }
        }
    }
}

/// The OpenBlink link engine: one transport, at most one active session.
pub struct BlinkLink<T: BlinkTransport> {
    transport: T,
    state: ConnectionState,
    session: Option<Session>,
    console: ConsoleStream,
    on_event: Box<dyn Fn(LinkEvent) + Send>,
}

impl<T: BlinkTransport> BlinkLink<T> {
    /// Create an engine over the given transport.
    ///
    /// `on_console` receives decoded device console output for the lifetime
    /// of each session; `on_event` receives connection lifecycle events.
    pub fn new<C, E>(transport: T, on_console: C, on_event: E) -> Self
    where
        C: Fn(&str) + Send + Sync + 'static,
        E: Fn(LinkEvent) + Send + 'static,
    {
        Self {
            transport,
            state: ConnectionState::Idle,
            session: None,
            console: ConsoleStream::new(on_console),
            on_event: Box::new(on_event),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The active session, if one exists.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn emit(&self, event: LinkEvent) {
        (self.on_event)(event);
    }

    /// Record a fatal connection-phase failure: best-effort disconnect,
    /// clear the session, land in `Disconnected`. Cleanup failures are
    /// reported as events, never escalated over the original error.
    fn fail(&mut self, error: LinkError) -> LinkError {
        self.state = ConnectionState::Failed;
        if let Err(cleanup) = self.transport.disconnect() {
            self.emit(LinkEvent::CleanupFailed {
                message: cleanup.to_string(),
            });
        }
        self.session = None;
        self.state = ConnectionState::Disconnected;
        self.emit(LinkEvent::Disconnected);
        error
    }

    /// Connect to a Blink device and bring the session to `Ready`.
    ///
    /// `picker` chooses among the name-filtered, deduplicated candidates
    /// (interactively or programmatically); returning `None` cancels the
    /// attempt. An existing session is torn down first.
    pub fn connect<P>(&mut self, picker: P) -> LinkResult<()>
    where
        P: Fn(&[Advertisement]) -> Option<usize>,
    {
        if self.session.is_some() {
            self.disconnect().ok();
        }

        self.state = ConnectionState::Scanning;
        self.emit(LinkEvent::Scanning);
        let advertisements = match self.transport.scan(SCAN_TIMEOUT) {
            Ok(ads) => ads,
            Err(e) => return Err(self.fail(e)),
        };

        let mut candidates: Vec<Advertisement> = Vec::new();
        for ad in advertisements {
            let matches = ad
                .name
                .as_deref()
                .map(is_blink_device_name)
                .unwrap_or(false);
            if matches && !candidates.iter().any(|c| c.id == ad.id) {
                candidates.push(ad);
            }
        }
        if candidates.is_empty() {
            return Err(self.fail(LinkError::DeviceNotFound));
        }

        self.state = ConnectionState::CandidateFound;
        self.emit(LinkEvent::CandidatesFound {
            count: candidates.len(),
        });
        let chosen = match picker(&candidates) {
            Some(index) if index < candidates.len() => candidates.swap_remove(index),
            _ => return Err(self.fail(LinkError::Cancelled)),
        };

        self.state = ConnectionState::Connecting;
        self.emit(LinkEvent::Connecting {
            device: chosen.display_label(),
        });
        if let Err(e) = self.transport.connect(&chosen.id, STEP_TIMEOUT) {
            return Err(self.fail(e));
        }

        self.state = ConnectionState::DiscoveringServices;
        self.emit(LinkEvent::DiscoveringServices);
        let services = match self.transport.discover_services(STEP_TIMEOUT) {
            Ok(services) => services,
            Err(e) => return Err(self.fail(e)),
        };
        let service = match services
            .iter()
            .find(|s| s.eq_ignore_ascii_case(SERVICE_UUID))
        {
            Some(service) => service.clone(),
            None => return Err(self.fail(LinkError::ServiceNotFound)),
        };

        self.state = ConnectionState::DiscoveringCharacteristics;
        self.emit(LinkEvent::DiscoveringCharacteristics);
        let discovered = match self.transport.discover_characteristics(&service, STEP_TIMEOUT) {
            Ok(chars) => chars,
            Err(e) => return Err(self.fail(e)),
        };
        let characteristics = match CharacteristicSet::resolve(&discovered) {
            Ok(set) => set,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = ConnectionState::Subscribing;
        self.emit(LinkEvent::Subscribing);
        let handler = self.console.notification_handler();
        if let Err(e) = self
            .transport
            .subscribe(&characteristics.console, handler, STEP_TIMEOUT)
        {
            return Err(self.fail(e));
        }

        self.state = ConnectionState::NegotiatingMtu;
        self.emit(LinkEvent::NegotiatingMtu);
        let mtu = mtu::negotiate(&mut self.transport, Some(&characteristics.mtu));

        self.session = Some(Session {
            device: DeviceHandle {
                id: chosen.id,
                name: chosen.name,
            },
            characteristics,
            mtu,
        });
        self.state = ConnectionState::Ready;
        self.emit(LinkEvent::Ready { mtu });
        Ok(())
    }

    /// Transfer a compiled image to the connected device.
    ///
    /// Requires a `Ready` session. A failed transfer leaves the session
    /// `Ready` (still connected), though the device's program slot stays
    /// indeterminate until a later transfer succeeds.
    pub fn transfer<F>(&mut self, image: &BinaryImage, on_progress: F) -> LinkResult<TransferReport>
    where
        F: Fn(TransferStage),
    {
        let session = match (&self.state, &self.session) {
            (ConnectionState::Ready, Some(session)) => session.clone(),
            _ => return Err(LinkError::NotConnected),
        };

        transfer::run(&mut self.transport, &session, image, on_progress)
    }

    /// Soft-reset the running device program.
    ///
    /// Independent of any transfer; requires only a resolved program
    /// characteristic.
    pub fn soft_reset(&mut self) -> LinkResult<()> {
        let program = match &self.session {
            Some(session) => session.characteristics.program.clone(),
            None => return Err(LinkError::NotConnected),
        };

        self.transport
            .write(&program, &Frame::Reset.encode(), STEP_TIMEOUT)
    }

    /// Tear down the session and disconnect the link.
    ///
    /// Any in-flight operation is abandoned; a later connect starts from
    /// scratch.
    pub fn disconnect(&mut self) -> LinkResult<()> {
        if matches!(
            self.state,
            ConnectionState::Idle | ConnectionState::Disconnected
        ) {
            return Ok(());
        }

        let result = self.transport.disconnect();
        self.session = None;
        self.state = ConnectionState::Disconnected;
        self.emit(LinkEvent::Disconnected);
        result
    }

    /// Record a link-level disconnect reported by the transport.
    ///
    /// The session is cleared without issuing another disconnect request.
    pub fn handle_link_loss(&mut self) {
        if self.session.is_some() || !matches!(self.state, ConnectionState::Idle) {
            self.session = None;
            self.state = ConnectionState::Disconnected;
            self.emit(LinkEvent::Disconnected);
        }
    }
}
