//! Error types for the OpenBlink link engine.

use thiserror::Error;

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors that can occur while talking to an OpenBlink device.
///
/// Every variant's display text is suitable for showing to the user as-is;
/// callers that need a stable discriminator use [`LinkError::error_code`].
#[derive(Debug, Error)]
pub enum LinkError {
    /// Link-level failure reported by the underlying transport.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Standard I/O error (compiled image file access).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A protocol step exceeded its deadline.
    #[error("Timed out after {timeout_ms}ms during {operation}")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// No advertisement matched the OpenBlink name filter.
    #[error("No OpenBlink device found")]
    DeviceNotFound,

    /// The connected device does not expose the OpenBlink service.
    #[error("OpenBlink service not found on device")]
    ServiceNotFound,

    /// One or more required characteristics are missing from the service.
    #[error("Missing characteristic(s): {missing}")]
    CharacteristicsNotFound { missing: String },

    /// Operation attempted without a Ready session.
    #[error("Device is not connected")]
    NotConnected,

    /// A characteristic read returned data in an unrecognized shape.
    #[error("Malformed response from device: {reason}")]
    MalformedResponse { reason: String },

    /// A frame buffer could not be decoded.
    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// A chunk, header, or reload send failed mid-sequence.
    #[error("Transfer aborted: {reason}")]
    TransferAborted { reason: String },

    /// Compiled image exceeds what 16-bit length fields can describe.
    #[error("Image size {size} exceeds maximum {max_size} bytes")]
    ImageTooLarge { size: usize, max_size: usize },

    /// The external compiler exited with a failure status.
    #[error("Compilation failed: {detail}")]
    CompilerFailed { detail: String },

    /// Operation was cancelled by the caller.
    #[error("Operation cancelled by user")]
    Cancelled,
}

impl LinkError {
    /// Get a stable error code for support purposes.
    pub fn error_code(&self) -> &'static str {
        match self {
            LinkError::Transport { .. } => "LINK-001",
            LinkError::Io(_) => "LINK-002",
            LinkError::Timeout { .. } => "LINK-010",
            LinkError::DeviceNotFound => "LINK-020",
            LinkError::ServiceNotFound => "LINK-021",
            LinkError::CharacteristicsNotFound { .. } => "LINK-022",
            LinkError::NotConnected => "LINK-023",
            LinkError::MalformedResponse { .. } => "LINK-030",
            LinkError::MalformedFrame { .. } => "LINK-031",
            LinkError::TransferAborted { .. } => "LINK-040",
            LinkError::ImageTooLarge { .. } => "LINK-041",
            LinkError::CompilerFailed { .. } => "LINK-050",
            LinkError::Cancelled => "LINK-099",
        }
    }

    /// True for failures raised during connection bring-up, which trigger
    /// best-effort cleanup before being reported.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            LinkError::Timeout { .. }
                | LinkError::ServiceNotFound
                | LinkError::CharacteristicsNotFound { .. }
                | LinkError::Transport { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LinkError::NotConnected.error_code(), "LINK-023");
        assert_eq!(LinkError::Cancelled.error_code(), "LINK-099");
        assert_eq!(
            LinkError::Timeout {
                operation: "service discovery",
                timeout_ms: 5000
            }
            .error_code(),
            "LINK-010"
        );
    }

    #[test]
    fn test_display_is_user_presentable() {
        let err = LinkError::Timeout {
            operation: "chunk write",
            timeout_ms: 5000,
        };
        assert_eq!(err.to_string(), "Timed out after 5000ms during chunk write");

        let err = LinkError::CharacteristicsNotFound {
            missing: "console, mtu".into(),
        };
        assert!(err.to_string().contains("console, mtu"));
    }

    #[test]
    fn test_is_connection_failure() {
        assert!(LinkError::ServiceNotFound.is_connection_failure());
        assert!(!LinkError::NotConnected.is_connection_failure());
        assert!(!LinkError::Cancelled.is_connection_failure());
    }
}
