//! Connection tester abstraction
//!
//! The lifecycle does not speak any wire protocol itself. It hands the
//! resolved connection parameters to a [`ConnectionTester`] and only looks
//! at whether the attempt succeeded and, if not, at its [`ErrorCode`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use sd_core::ServerSpec;

use crate::error_code::ErrorCode;

/// Everything a tester needs for one attempt
#[derive(Debug, Clone)]
pub struct TestRequest {
    pub server: ServerSpec,
    pub username: String,
    pub password: String,
    /// Budget for the whole attempt
    pub timeout: Duration,
}

/// Structured failure reported by a tester
///
/// `message` is diagnostic text for logs; it is never shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ConnectionFailure {
    pub message: String,
    #[serde(default)]
    pub code: Option<ErrorCode>,
    #[serde(default)]
    pub recoverable: bool,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ConnectionFailure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
            recoverable: true,
            context: HashMap::new(),
        }
    }

    /// Failure without a code
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            recoverable: false,
            context: HashMap::new(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCode::ConnectionCancelled, "connection test cancelled")
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }
}

/// Checks that a server accepts the given credentials
///
/// Implementations should watch `cancel` and give up promptly once it
/// fires; the lifecycle stops listening for the result either way.
#[async_trait]
pub trait ConnectionTester: Send + Sync {
    async fn test_connection(
        &self,
        request: TestRequest,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionFailure>;
}
