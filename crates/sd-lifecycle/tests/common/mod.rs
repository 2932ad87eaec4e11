//! Shared fixtures for lifecycle tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tempfile::TempDir;
use tokio::sync::{broadcast, Notify};
use tokio_util::sync::CancellationToken;

use sd_core::{ProfileStore, ServerProfile};
use sd_lifecycle::{ConnectionEvent, ConnectionFailure, ConnectionTester, TestRequest};

/// How the fake answers for a given host
#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(ConnectionFailure),
    /// Hang until the attempt is cancelled, then report the cancellation
    WaitForCancel,
    /// Hang until `release` is called, ignoring cancellation, then succeed
    WaitForRelease,
}

/// Scripted connection tester keyed by host name
#[derive(Default)]
pub struct FakeTester {
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<Vec<TestRequest>>,
    started: Notify,
    released: Notify,
}

impl FakeTester {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, host: &str, behavior: Behavior) {
        self.behaviors.lock().insert(host.to_string(), behavior);
    }

    pub fn calls(&self) -> Vec<TestRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Wait until an attempt has reached the tester
    pub async fn wait_started(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.started.notified())
            .await
            .expect("tester was never called");
    }

    /// Let one `WaitForRelease` attempt finish
    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl ConnectionTester for FakeTester {
    async fn test_connection(
        &self,
        request: TestRequest,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionFailure> {
        let behavior = self
            .behaviors
            .lock()
            .get(&request.server.host)
            .cloned()
            .unwrap_or(Behavior::Succeed);
        self.calls.lock().push(request);
        self.started.notify_one();

        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(failure) => Err(failure),
            Behavior::WaitForCancel => {
                cancel.cancelled().await;
                Err(ConnectionFailure::cancelled())
            }
            Behavior::WaitForRelease => {
                self.released.notified().await;
                Ok(())
            }
        }
    }
}

/// Profile whose host name is `<name>.example`
pub fn profile(name: &str) -> ServerProfile {
    ServerProfile::new(name, host(name), 52773, "sys").with_password("Sys1")
}

pub fn host(name: &str) -> String {
    format!("{}.example", name)
}

/// Plaintext store in a temp dir holding `profiles`
pub fn store_with(profiles: Vec<ServerProfile>) -> (TempDir, Arc<RwLock<ProfileStore>>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = ProfileStore::open_plaintext(dir.path().join("servers.json"));
    for p in profiles {
        store.save_profile(p).expect("Failed to save profile");
    }
    (dir, Arc::new(RwLock::new(store)))
}

/// Everything currently queued on `rx`
pub fn drain(rx: &mut broadcast::Receiver<ConnectionEvent>) -> Vec<ConnectionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
