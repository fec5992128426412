//! Single-line status bar sink for recoverable conditions.

/// Receives short, human-readable messages about recoverable conditions
/// (rejected input, empty history).
pub trait StatusSink {
    /// Show a message, replacing the previous one.
    fn show(&mut self, message: &str);
}

/// In-memory status line that keeps the most recent message.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    message: Option<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Clear the status line.
    pub fn clear(&mut self) {
        self.message = None;
    }
}

impl StatusSink for StatusLine {
    fn show(&mut self, message: &str) {
        log::info!("{}", message);
        self.message = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_message_wins() {
        let mut status = StatusLine::new();
        assert!(status.message().is_none());

        status.show("first");
        status.show("second");
        assert_eq!(status.message(), Some("second"));

        status.clear();
        assert!(status.message().is_none());
    }
}
