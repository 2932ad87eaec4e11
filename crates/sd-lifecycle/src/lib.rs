//! sd-lifecycle: Connection lifecycle for serverdeck
//!
//! Drives the single active server connection: connect, cancel,
//! disconnect and switch, against a pluggable [`ConnectionTester`].
//! Progress is published as [`ConnectionEvent`]s for the UI layer.

pub mod error_code;
pub mod events;
pub mod http_tester;
pub mod lifecycle;
pub mod state;
pub mod tester;

pub use error_code::{user_message, ErrorCode};
pub use events::{ConnectionEvent, EventStatus};
pub use http_tester::HttpConnectionTester;
pub use lifecycle::{ConnectionLifecycle, LifecycleOptions};
pub use state::LifecycleState;
pub use tester::{ConnectionFailure, ConnectionTester, TestRequest};
