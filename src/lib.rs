//! OpenBlink BLE link engine.
//!
//! Delivers a compiled binary image to an OpenBlink device over a BLE link
//! whose usable payload size is negotiated at connect time (and can be as
//! small as 20 bytes), and exchanges control commands and console output
//! with it.
//!
//! # Protocol Overview
//!
//! One session runs through these steps:
//! 1. **Scan** - Find devices advertising a "Blink" name
//! 2. **Connect & Discover** - Resolve the OpenBlink service and its
//!    console (notify), program (write), and mtu (read) characteristics
//! 3. **Subscribe** - Forward console notifications to an observer
//! 4. **Negotiate MTU** - Native exchange, characteristic read, or the
//!    default of 20
//! 5. **Transfer** - Send the image as sequential Data frames, then one
//!    ProgramHeader (length, CRC16, slot) and one Reload frame
//!
//! A transfer either completes as a coherent unit or fails cleanly; there
//! are no retries and no resume after disconnect.
//!
//! # Example
//!
//! ```ignore
//! use openblink_link::{BinaryImage, BlinkLink};
//!
//! let mut link = BlinkLink::new(
//!     transport,
//!     |line| print!("{}", line),
//!     |event| println!("{}", event.message()),
//! );
//! link.connect(|candidates| Some(0))?;
//!
//! let image = BinaryImage::from_file("app.blink.bin")?;
//! let report = link.transfer(&image, |stage| println!("{}", stage.message()))?;
//! println!("sent {} bytes in {:?}", report.bytes_sent, report.duration);
//! ```

pub mod compiler;
pub mod config;
mod connection;
mod console;
mod crc;
mod error;
mod frame;
mod image;
mod mtu;
mod session;
mod transfer;
mod transport;

// Checksum and wire format
pub use crc::crc16;
pub use frame::Frame;

// MTU negotiation
pub use mtu::negotiate;

// Image handling
pub use image::BinaryImage;

// Transport capability interface
pub use transport::{Advertisement, BlinkTransport, NotificationHandler};

// Session and connection state machine
pub use connection::{BlinkLink, LinkEvent};
pub use session::{CharacteristicSet, ConnectionState, DeviceHandle, Session};

// Transfer
pub use transfer::{TransferReport, TransferStage};

// Console stream
pub use console::ConsoleStream;

// Errors
pub use error::{LinkError, LinkResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Verify key types are accessible
        let _ = std::any::type_name::<Frame>();
        let _ = std::any::type_name::<BinaryImage>();
        let _ = std::any::type_name::<ConnectionState>();
        let _ = std::any::type_name::<LinkError>();
    }
}
