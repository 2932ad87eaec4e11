//! Lifecycle state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the single server connection currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Nothing attempted yet
    #[default]
    Idle,
    /// A connection test is in flight
    Connecting,
    /// The last test succeeded and the server is active
    Connected,
    /// Cancelled or explicitly disconnected
    Disconnected,
    /// The last attempt failed
    Error,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::Connecting => write!(f, "connecting"),
            LifecycleState::Connected => write!(f, "connected"),
            LifecycleState::Disconnected => write!(f, "disconnected"),
            LifecycleState::Error => write!(f, "error"),
        }
    }
}
