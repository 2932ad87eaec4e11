//! Notifications published by the lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lifecycle notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Connecting,
    Connected,
    Error,
    Cancelled,
    Disconnected,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Connecting => write!(f, "connecting"),
            EventStatus::Connected => write!(f, "connected"),
            EventStatus::Error => write!(f, "error"),
            EventStatus::Cancelled => write!(f, "cancelled"),
            EventStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// One lifecycle transition, as seen by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    pub status: EventStatus,
    pub server_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConnectionEvent {
    pub fn new(status: EventStatus, server_name: impl Into<String>) -> Self {
        Self {
            status,
            server_name: server_name.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
