/// Category of a delivery error. The producer loop treats every kind the
/// same way; the kind only enriches log lines and lets sinks report what
/// went wrong on their side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid sink configuration - permanent, fail at startup.
    Config,
    /// Network / transport failure - transient.
    Io,
    /// The stream refused the write because of its throughput limits.
    Throttled,
    /// The stream rejected the write (missing stream, access denied, ...).
    Rejected,
    /// Payload could not be encoded or was refused as malformed.
    Format,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Throttled => f.write_str("throttled"),
            ErrorKind::Rejected => f.write_str("rejected"),
            ErrorKind::Format => f.write_str("format"),
        }
    }
}

/// Error returned by [`StreamSink::deliver`](crate::StreamSink::deliver).
///
/// Carries an `ErrorKind` and a human-readable message. `From` impls pick
/// the kind automatically so sink implementations can use `?`.
#[derive(Clone, PartialEq, Eq)]
pub struct DeliveryError {
    kind: ErrorKind,
    message: String,
}

impl DeliveryError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, msg)
    }

    pub fn throttled(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttled, msg)
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rejected, msg)
    }

    pub fn format_err(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DeliveryError {}

impl From<String> for DeliveryError {
    fn from(s: String) -> Self { Self { kind: ErrorKind::Rejected, message: s } }
}

impl From<&str> for DeliveryError {
    fn from(s: &str) -> Self { Self { kind: ErrorKind::Rejected, message: s.to_string() } }
}

impl From<std::io::Error> for DeliveryError {
    fn from(e: std::io::Error) -> Self { Self { kind: ErrorKind::Io, message: e.to_string() } }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(e: serde_json::Error) -> Self { Self { kind: ErrorKind::Format, message: e.to_string() } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_bare_message_debug_carries_kind() {
        let e = DeliveryError::throttled("rate exceeded for shard");
        assert_eq!(e.to_string(), "rate exceeded for shard");
        assert_eq!(format!("{e:?}"), "[throttled] rate exceeded for shard");
    }

    #[test]
    fn conversions_pick_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(DeliveryError::from(io).kind(), ErrorKind::Io);
        assert_eq!(DeliveryError::from("nope").kind(), ErrorKind::Rejected);

        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(DeliveryError::from(bad).kind(), ErrorKind::Format);
    }
}
