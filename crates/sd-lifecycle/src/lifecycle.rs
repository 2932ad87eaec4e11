//! Connection lifecycle state machine
//!
//! Exactly one server can be active at a time. Every `connect` first ends
//! whatever came before it (cancelling an in-flight attempt or dropping an
//! established session), so at most one tester call is ever outstanding.
//!
//! # Stale results
//!
//! Each attempt is stamped with a generation number. The tester future is
//! awaited without holding any lock; when it resolves, its result is applied
//! only if that attempt is still the current one. A result that arrives
//! after the attempt was cancelled or superseded is dropped without touching
//! state or emitting events.
//!
//! Dropping a `connect` future while it awaits the tester (an aborted task,
//! a losing `select!` branch, a caller-side timeout) cancels that attempt
//! the same way `cancel_connection` would.
//!
//! # Events
//!
//! State changes and their [`ConnectionEvent`]s happen together under the
//! same lock, so subscribers see events in transition order and never
//! observe a state whose event has not been sent yet.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use sd_core::config::DEFAULT_CONNECT_TIMEOUT;
use sd_core::ProfileStore;

use crate::error_code::user_message;
use crate::events::{ConnectionEvent, EventStatus};
use crate::state::LifecycleState;
use crate::tester::{ConnectionTester, TestRequest};

/// Tunables for [`ConnectionLifecycle`]
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Budget handed to the tester for each attempt
    pub timeout: Duration,
    /// Events buffered per subscriber before the slowest one lags
    pub event_capacity: usize,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONNECT_TIMEOUT,
            event_capacity: 64,
        }
    }
}

/// The attempt currently in flight
struct Attempt {
    generation: u64,
    server_name: String,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    state: LifecycleState,
    /// Set only while `state` is `Connected`
    connected: Option<String>,
    /// Set only while `state` is `Connecting`
    attempt: Option<Attempt>,
    generation: u64,
}

impl Inner {
    /// Whether `name` is already connected or being connected
    fn is_current(&self, name: &str) -> bool {
        match self.state {
            LifecycleState::Connected => self.connected.as_deref() == Some(name),
            LifecycleState::Connecting => self
                .attempt
                .as_ref()
                .is_some_and(|a| a.server_name == name),
            _ => false,
        }
    }
}

/// Owns the single active connection and its state
pub struct ConnectionLifecycle {
    store: Arc<RwLock<ProfileStore>>,
    tester: Arc<dyn ConnectionTester>,
    options: LifecycleOptions,
    inner: Mutex<Inner>,
    event_tx: broadcast::Sender<ConnectionEvent>,
}

impl ConnectionLifecycle {
    /// Create a lifecycle with default options
    pub fn new(store: Arc<RwLock<ProfileStore>>, tester: Arc<dyn ConnectionTester>) -> Self {
        Self::with_options(store, tester, LifecycleOptions::default())
    }

    pub fn with_options(
        store: Arc<RwLock<ProfileStore>>,
        tester: Arc<dyn ConnectionTester>,
        options: LifecycleOptions,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            store,
            tester,
            options,
            inner: Mutex::new(Inner::default()),
            event_tx,
        }
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.event_tx.subscribe()
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Name of the connected server, if any
    pub fn connected_server(&self) -> Option<String> {
        self.inner.lock().connected.clone()
    }

    /// Whether an attempt is in flight
    pub fn is_connecting(&self) -> bool {
        self.inner.lock().state == LifecycleState::Connecting
    }

    /// Name of the server being attempted, if any
    pub fn connecting_server(&self) -> Option<String> {
        self.inner
            .lock()
            .attempt
            .as_ref()
            .map(|a| a.server_name.clone())
    }

    /// Connect to the server profile called `name`
    ///
    /// Never fails: problems end in [`LifecycleState::Error`] with an
    /// `error` event carrying a user-facing message. Returns the state once
    /// this call is done with it (which, for a superseded attempt, is
    /// whatever the newer call left behind).
    pub async fn connect(&self, name: &str) -> LifecycleState {
        let (profile, password) = {
            let store = self.store.read();
            (store.get_profile(name), store.get_decrypted_secret(name))
        };

        let (generation, cancel, request) = {
            let mut inner = self.inner.lock();

            if inner.is_current(name) {
                tracing::debug!("Already {} '{}', ignoring connect", inner.state, name);
                return inner.state;
            }

            self.end_current(&mut inner);

            let Some(profile) = profile else {
                self.fail(&mut inner, name, format!("Server '{}' not found", name));
                return inner.state;
            };

            if password.is_empty() {
                self.fail(
                    &mut inner,
                    name,
                    format!("Password not found for server '{}'", name),
                );
                return inner.state;
            }

            inner.generation += 1;
            let generation = inner.generation;
            let cancel = CancellationToken::new();
            inner.attempt = Some(Attempt {
                generation,
                server_name: name.to_string(),
                cancel: cancel.clone(),
            });
            inner.state = LifecycleState::Connecting;
            self.emit(
                ConnectionEvent::new(EventStatus::Connecting, name)
                    .with_message(format!("Connecting to {}...", name)),
            );

            let request = TestRequest {
                server: profile.server_spec(),
                username: profile.username,
                password,
                timeout: self.options.timeout,
            };
            (generation, cancel, request)
        };

        tracing::info!(
            "Testing connection to '{}' ({}://{}:{})",
            name,
            request.server.scheme,
            request.server.host,
            request.server.port
        );

        let mut guard = AttemptGuard {
            lifecycle: self,
            generation,
            armed: true,
        };
        let result = self.tester.test_connection(request, cancel).await;
        guard.armed = false;

        let mut inner = self.inner.lock();
        if inner.attempt.as_ref().map(|a| a.generation) != Some(generation) {
            tracing::debug!("Discarding stale connection result for '{}'", name);
            return inner.state;
        }
        inner.attempt = None;

        match result {
            Ok(()) => {
                inner.state = LifecycleState::Connected;
                inner.connected = Some(name.to_string());
                tracing::info!("Connected to '{}'", name);
                self.emit(
                    ConnectionEvent::new(EventStatus::Connected, name)
                        .with_message(format!("Connected to {}", name)),
                );
            }
            Err(failure) => {
                tracing::warn!(
                    "Connection to '{}' failed ({}): {}",
                    name,
                    failure.code.map(|c| c.as_str()).unwrap_or("no code"),
                    failure.message
                );
                self.fail(&mut inner, name, user_message(failure.code).to_string());
            }
        }

        inner.state
    }

    /// Abort the in-flight attempt
    ///
    /// Returns `false` (and does nothing) unless an attempt is in flight.
    pub fn cancel_connection(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != LifecycleState::Connecting {
            return false;
        }
        self.end_current(&mut inner);
        true
    }

    /// Drop the established connection
    ///
    /// Returns `false` (and does nothing) unless connected.
    pub fn disconnect(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != LifecycleState::Connected {
            return false;
        }
        self.end_current(&mut inner);
        true
    }

    /// Cancel the attempt in flight or drop the active connection
    fn end_current(&self, inner: &mut Inner) {
        match inner.state {
            LifecycleState::Connecting => {
                if let Some(attempt) = inner.attempt.take() {
                    attempt.cancel.cancel();
                    inner.state = LifecycleState::Disconnected;
                    tracing::info!("Cancelled connection to '{}'", attempt.server_name);
                    self.emit(
                        ConnectionEvent::new(EventStatus::Cancelled, &attempt.server_name)
                            .with_message(format!(
                                "Connection to {} was cancelled",
                                attempt.server_name
                            )),
                    );
                }
            }
            LifecycleState::Connected => {
                inner.state = LifecycleState::Disconnected;
                if let Some(previous) = inner.connected.take() {
                    tracing::info!("Disconnected from '{}'", previous);
                    self.emit(
                        ConnectionEvent::new(EventStatus::Disconnected, &previous)
                            .with_message(format!("Disconnected from {}", previous)),
                    );
                }
            }
            _ => {}
        }
    }

    /// End the attempt stamped `generation` if it is still the current one
    fn abandon(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if inner.attempt.as_ref().map(|a| a.generation) == Some(generation) {
            tracing::debug!("Connect future dropped mid-attempt, cancelling");
            self.end_current(&mut inner);
        }
    }

    fn fail(&self, inner: &mut Inner, name: &str, message: String) {
        inner.state = LifecycleState::Error;
        inner.connected = None;
        self.emit(ConnectionEvent::new(EventStatus::Error, name).with_message(message));
    }

    fn emit(&self, event: ConnectionEvent) {
        tracing::debug!("Lifecycle event: {} '{}'", event.status, event.server_name);
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

/// Cancels the attempt if its `connect` future is dropped before the
/// tester answers
struct AttemptGuard<'a> {
    lifecycle: &'a ConnectionLifecycle,
    generation: u64,
    armed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.lifecycle.abandon(self.generation);
        }
    }
}

impl Drop for ConnectionLifecycle {
    fn drop(&mut self) {
        if let Some(attempt) = self.inner.get_mut().attempt.take() {
            attempt.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LifecycleOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(options.event_capacity > 0);
    }

    #[test]
    fn test_is_current() {
        let mut inner = Inner::default();
        assert!(!inner.is_current("db1"));

        inner.state = LifecycleState::Connected;
        inner.connected = Some("db1".into());
        assert!(inner.is_current("db1"));
        assert!(!inner.is_current("db2"));

        inner.state = LifecycleState::Connecting;
        inner.connected = None;
        inner.attempt = Some(Attempt {
            generation: 1,
            server_name: "db2".into(),
            cancel: CancellationToken::new(),
        });
        assert!(inner.is_current("db2"));
        assert!(!inner.is_current("db1"));
    }
}
