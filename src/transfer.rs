//! Transfer orchestration: chunked image upload over the program
//! characteristic.
//!
//! A transfer is a single attempt with no retries: the image CRC is computed
//! up front, Data chunks go out strictly sequentially (chunk N+1 never
//! starts before chunk N's write completed), then one ProgramHeader and one
//! Reload frame. The first failed or timed-out step aborts the whole
//! transfer before any later frame is sent.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::{payload_budget, PROGRAM_SLOT, STEP_TIMEOUT};
use crate::error::{LinkError, LinkResult};
use crate::frame::Frame;
use crate::image::BinaryImage;
use crate::session::Session;
use crate::transport::BlinkTransport;

/// Transfer progress stages for UI feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", content = "data")]
pub enum TransferStage {
    /// Computing the image checksum and chunk plan.
    Preparing,
    /// Uploading image data.
    Sending { sent: usize, total: usize },
    /// Sending the program header (length, CRC, slot).
    SendingHeader,
    /// Instructing the device to apply the image.
    SendingReload,
    /// Transfer complete.
    Complete { duration_ms: u64 },
}

impl TransferStage {
    /// Get a percentage estimate for this stage.
    pub fn percent(&self) -> f32 {
        match self {
            TransferStage::Preparing => 0.0,
            TransferStage::Sending { sent, total } => {
                if *total == 0 {
                    2.0
                } else {
                    2.0 + (*sent as f32 / *total as f32) * 90.0
                }
            }
            TransferStage::SendingHeader => 94.0,
            TransferStage::SendingReload => 97.0,
            TransferStage::Complete { .. } => 100.0,
        }
    }

    /// Get a human-readable message for this stage.
    pub fn message(&self) -> String {
        match self {
            TransferStage::Preparing => "Preparing program image...".into(),
            TransferStage::Sending { sent, total } => {
                let percent = if *total == 0 { 100 } else { (sent * 100) / total };
                format!("Uploading program... {}%", percent)
            }
            TransferStage::SendingHeader => "Sending program header...".into(),
            TransferStage::SendingReload => "Reloading device program...".into(),
            TransferStage::Complete { duration_ms } => {
                format!("Transfer complete in {}ms", duration_ms)
            }
        }
    }
}

/// Summary of one completed transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReport {
    /// Image bytes sent.
    pub bytes_sent: usize,
    /// Number of Data chunks sent.
    pub chunks: usize,
    /// Wall-clock duration; advisory only, never part of protocol
    /// correctness.
    pub duration: Duration,
}

/// Split an image into Data frames for the given payload budget.
///
/// Offsets advance in exact budget-sized steps; concatenating the payloads
/// in order reproduces the image with no gaps or overlaps.
pub(crate) fn data_frames(image: &BinaryImage, budget: usize) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut offset = 0usize;
    for chunk in image.as_bytes().chunks(budget) {
        frames.push(Frame::Data {
            offset: offset as u16,
            payload: chunk.to_vec(),
        });
        offset += chunk.len();
    }
    frames
}

/// Run one transfer attempt against a Ready session.
///
/// Borrows the session read-only; connection state is never mutated here.
/// On failure the caller's session stays connected, but the device's program
/// slot is indeterminate until a later transfer succeeds.
pub(crate) fn run<T, F>(
    transport: &mut T,
    session: &Session,
    image: &BinaryImage,
    on_progress: F,
) -> LinkResult<TransferReport>
where
    T: BlinkTransport,
    F: Fn(TransferStage),
{
    let started = Instant::now();
    on_progress(TransferStage::Preparing);

    let budget = payload_budget(session.mtu);
    if budget == 0 {
        return Err(LinkError::TransferAborted {
            reason: format!("negotiated MTU {} leaves no payload room", session.mtu),
        });
    }

    let crc = image.crc16();
    let total = image.len();
    let program = session.characteristics.program.as_str();

    let frames = data_frames(image, budget);
    let chunks = frames.len();
    let mut sent = 0usize;

    for frame in frames {
        let offset = match &frame {
            Frame::Data { offset, payload } => {
                sent += payload.len();
                *offset
            }
            _ => unreachable!(),
        };

        transport
            .write(program, &frame.encode(), STEP_TIMEOUT)
            .map_err(|e| LinkError::TransferAborted {
                reason: format!("chunk at offset {} failed: {}", offset, e),
            })?;

        on_progress(TransferStage::Sending { sent, total });
    }

    on_progress(TransferStage::SendingHeader);
    let header = Frame::ProgramHeader {
        length: total as u16,
        crc16: crc,
        slot: PROGRAM_SLOT,
    };
    transport
        .write(program, &header.encode(), STEP_TIMEOUT)
        .map_err(|e| LinkError::TransferAborted {
            reason: format!("program header failed: {}", e),
        })?;

    on_progress(TransferStage::SendingReload);
    transport
        .write(program, &Frame::Reload.encode(), STEP_TIMEOUT)
        .map_err(|e| LinkError::TransferAborted {
            reason: format!("reload failed: {}", e),
        })?;

    let duration = started.elapsed();
    on_progress(TransferStage::Complete {
        duration_ms: duration.as_millis() as u64,
    });

    Ok(TransferReport {
        bytes_sent: sent,
        chunks,
        duration,
    })
}
