//! Binary frame codec for the OpenBlink program characteristic.
//!
//! Every frame starts with a version byte (0x01) and an ASCII command byte.
//! Multi-byte fields are little-endian. Layouts:
//!
//! - `Data`:          `[version, 'D', offset_lo, offset_hi, len_lo, len_hi, payload...]`
//! - `ProgramHeader`: `[version, 'P', len_lo, len_hi, crc_lo, crc_hi, slot, 0x00]`
//! - `Reload`:        `[version, 'L']`
//! - `Reset`:         `[version, 'R']`

use crate::config::{DATA_HEADER_SIZE, FRAME_VERSION, PROGRAM_HEADER_SIZE};
use crate::error::{LinkError, LinkResult};

/// Command byte for a Data frame.
const CMD_DATA: u8 = b'D';

/// Command byte for a ProgramHeader frame.
const CMD_PROGRAM_HEADER: u8 = b'P';

/// Command byte for a Reload frame.
const CMD_RELOAD: u8 = b'L';

/// Command byte for a Reset frame.
const CMD_RESET: u8 = b'R';

/// A frame exchanged with the device over the program characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One chunk of the binary image at the given offset.
    Data { offset: u16, payload: Vec<u8> },
    /// Image metadata sent after all chunks: total length, CRC16, slot.
    ProgramHeader { length: u16, crc16: u16, slot: u8 },
    /// Instruct the device to apply the just-transferred image.
    Reload,
    /// Soft-reset the running program.
    Reset,
}

impl Frame {
    /// Encode this frame into its on-wire byte layout.
    ///
    /// Encoding never fails for well-formed frames; a Data payload longer
    /// than 65535 bytes cannot be built through the transfer path, which
    /// chunks against a 16-bit budget.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Data { offset, payload } => {
                let mut bytes = Vec::with_capacity(DATA_HEADER_SIZE as usize + payload.len());
                bytes.push(FRAME_VERSION);
                bytes.push(CMD_DATA);
                bytes.extend_from_slice(&offset.to_le_bytes());
                bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
                bytes.extend_from_slice(payload);
                bytes
            }
            Frame::ProgramHeader { length, crc16, slot } => {
                let mut bytes = Vec::with_capacity(PROGRAM_HEADER_SIZE);
                bytes.push(FRAME_VERSION);
                bytes.push(CMD_PROGRAM_HEADER);
                bytes.extend_from_slice(&length.to_le_bytes());
                bytes.extend_from_slice(&crc16.to_le_bytes());
                bytes.push(*slot);
                bytes.push(0x00); // reserved
                bytes
            }
            Frame::Reload => vec![FRAME_VERSION, CMD_RELOAD],
            Frame::Reset => vec![FRAME_VERSION, CMD_RESET],
        }
    }

    /// Decode a frame from raw bytes.
    pub fn decode(bytes: &[u8]) -> LinkResult<Frame> {
        if bytes.len() < 2 {
            return Err(LinkError::MalformedFrame {
                reason: format!("buffer too short: {} bytes", bytes.len()),
            });
        }
        if bytes[0] != FRAME_VERSION {
            return Err(LinkError::MalformedFrame {
                reason: format!("unsupported version 0x{:02X}", bytes[0]),
            });
        }

        match bytes[1] {
            CMD_DATA => {
                if bytes.len() < DATA_HEADER_SIZE as usize {
                    return Err(LinkError::MalformedFrame {
                        reason: format!("Data frame header truncated: {} bytes", bytes.len()),
                    });
                }
                let offset = u16::from_le_bytes([bytes[2], bytes[3]]);
                let length = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;
                let payload = &bytes[DATA_HEADER_SIZE as usize..];
                if payload.len() != length {
                    return Err(LinkError::MalformedFrame {
                        reason: format!(
                            "Data length field {} does not match payload of {} bytes",
                            length,
                            payload.len()
                        ),
                    });
                }
                Ok(Frame::Data {
                    offset,
                    payload: payload.to_vec(),
                })
            }
            CMD_PROGRAM_HEADER => {
                if bytes.len() < PROGRAM_HEADER_SIZE {
                    return Err(LinkError::MalformedFrame {
                        reason: format!("ProgramHeader truncated: {} bytes", bytes.len()),
                    });
                }
                Ok(Frame::ProgramHeader {
                    length: u16::from_le_bytes([bytes[2], bytes[3]]),
                    crc16: u16::from_le_bytes([bytes[4], bytes[5]]),
                    slot: bytes[6],
                })
            }
            CMD_RELOAD => Ok(Frame::Reload),
            CMD_RESET => Ok(Frame::Reset),
            cmd => Err(LinkError::MalformedFrame {
                reason: format!("unknown command byte 0x{:02X}", cmd),
            }),
        }
    }
}
