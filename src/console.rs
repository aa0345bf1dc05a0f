//! Console output stream from the device.
//!
//! Notification payloads on the console characteristic are decoded as UTF-8
//! text (best-effort, invalid sequences replaced) and forwarded to a
//! registered observer. Delivery is push-only and carries no acknowledgement
//! semantics; output may interleave with an in-progress transfer.

use std::sync::Arc;

use crate::transport::NotificationHandler;

/// Observer invoked with each decoded console line.
pub type ConsoleObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Decodes inbound console notifications and forwards them to an observer.
#[derive(Clone)]
pub struct ConsoleStream {
    observer: ConsoleObserver,
}

impl ConsoleStream {
    /// Create a stream forwarding decoded output to the given observer.
    pub fn new<F>(observer: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            observer: Arc::new(observer),
        }
    }

    /// Decode one notification payload and forward it.
    ///
    /// Never fails: invalid UTF-8 sequences are replaced, not rejected.
    pub fn handle_notification(&self, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        (self.observer)(&text);
    }

    /// Build the transport notification callback for this stream.
    pub fn notification_handler(&self) -> NotificationHandler {
        let stream = self.clone();
        Box::new(move |payload| stream.handle_notification(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting_stream() -> (ConsoleStream, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let stream = ConsoleStream::new(move |line: &str| {
            sink.lock().unwrap().push(line.to_string());
        });
        (stream, lines)
    }

    #[test]
    fn test_forwards_valid_utf8() {
        let (stream, lines) = collecting_stream();
        stream.handle_notification(b"blink v1.2 ready\n");

        assert_eq!(lines.lock().unwrap().as_slice(), ["blink v1.2 ready\n"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_dropped() {
        let (stream, lines) = collecting_stream();
        stream.handle_notification(&[0x6F, 0x6B, 0xFF, 0xFE, 0x21]);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ok"));
        assert!(lines[0].contains('\u{FFFD}'));
        assert!(lines[0].ends_with('!'));
    }

    #[test]
    fn test_handler_delivers_through_boxed_callback() {
        let (stream, lines) = collecting_stream();
        let handler = stream.notification_handler();
        handler(b"first");
        handler(b"second");

        assert_eq!(lines.lock().unwrap().as_slice(), ["first", "second"]);
    }
}
