//! Connection error codes and the messages shown for them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable reason a connection attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ServerUnreachable,
    AuthFailed,
    ConnectionTimeout,
    ConnectionFailed,
    ConnectionCancelled,
    /// Any code this build does not know about
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ServerUnreachable => "SERVER_UNREACHABLE",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::ConnectionCancelled => "CONNECTION_CANCELLED",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Parse a wire code; unrecognized strings map to `Unknown`
    pub fn from_code(code: &str) -> Self {
        match code {
            "SERVER_UNREACHABLE" => ErrorCode::ServerUnreachable,
            "AUTH_FAILED" => ErrorCode::AuthFailed,
            "CONNECTION_TIMEOUT" => ErrorCode::ConnectionTimeout,
            "CONNECTION_FAILED" => ErrorCode::ConnectionFailed,
            "CONNECTION_CANCELLED" => ErrorCode::ConnectionCancelled,
            _ => ErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shown for any code without its own entry
pub const GENERIC_FAILURE_MESSAGE: &str = "Connection failed. Check your settings.";

const USER_MESSAGES: &[(ErrorCode, &str)] = &[
    (
        ErrorCode::ServerUnreachable,
        "Could not reach server. Check host and port.",
    ),
    (
        ErrorCode::AuthFailed,
        "Authentication failed. Check username and password.",
    ),
    (
        ErrorCode::ConnectionTimeout,
        "Connection timed out. Check host and port.",
    ),
    (ErrorCode::ConnectionCancelled, "Connection test was cancelled."),
];

/// User-facing message for a failure code
///
/// Total: a missing or unlisted code gets [`GENERIC_FAILURE_MESSAGE`].
pub fn user_message(code: Option<ErrorCode>) -> &'static str {
    code.and_then(|code| {
        USER_MESSAGES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, message)| *message)
    })
    .unwrap_or(GENERIC_FAILURE_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_messages() {
        assert_eq!(
            user_message(Some(ErrorCode::ServerUnreachable)),
            "Could not reach server. Check host and port."
        );
        assert_eq!(
            user_message(Some(ErrorCode::AuthFailed)),
            "Authentication failed. Check username and password."
        );
        assert_eq!(
            user_message(Some(ErrorCode::ConnectionTimeout)),
            "Connection timed out. Check host and port."
        );
        assert_eq!(
            user_message(Some(ErrorCode::ConnectionCancelled)),
            "Connection test was cancelled."
        );
    }

    #[test]
    fn test_fallback_message() {
        assert_eq!(user_message(None), GENERIC_FAILURE_MESSAGE);
        assert_eq!(user_message(Some(ErrorCode::Unknown)), GENERIC_FAILURE_MESSAGE);
        assert_eq!(
            user_message(Some(ErrorCode::ConnectionFailed)),
            GENERIC_FAILURE_MESSAGE
        );
    }

    #[test]
    fn test_code_strings_roundtrip() {
        for code in [
            ErrorCode::ServerUnreachable,
            ErrorCode::AuthFailed,
            ErrorCode::ConnectionTimeout,
            ErrorCode::ConnectionFailed,
            ErrorCode::ConnectionCancelled,
        ] {
            assert_eq!(ErrorCode::from_code(code.as_str()), code);
        }
        assert_eq!(ErrorCode::from_code("ECONNRESET"), ErrorCode::Unknown);
    }

    #[test]
    fn test_serde_unknown_code() {
        let code: ErrorCode = serde_json::from_str("\"AUTH_FAILED\"").unwrap();
        assert_eq!(code, ErrorCode::AuthFailed);
        let code: ErrorCode = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(code, ErrorCode::Unknown);
    }
}
