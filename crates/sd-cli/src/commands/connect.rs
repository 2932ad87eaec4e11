//! Connect command implementation

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;

use sd_lifecycle::{ConnectionLifecycle, HttpConnectionTester, LifecycleOptions, LifecycleState};

use crate::context::AppContext;
use crate::output::print_event;

/// Test the connection to a stored server, printing lifecycle events
///
/// Ctrl-C cancels the attempt. Fails unless the server ends up connected.
pub async fn connect_command(ctx: &AppContext, name: &str) -> Result<()> {
    let options = LifecycleOptions {
        timeout: ctx.config.connect_timeout,
        ..Default::default()
    };
    let lifecycle = Arc::new(ConnectionLifecycle::with_options(
        ctx.store.clone(),
        Arc::new(HttpConnectionTester::new()),
        options,
    ));

    let mut events = lifecycle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(n)) => {
                    tracing::debug!("Event printer lagged by {} events", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = {
        let connect = lifecycle.connect(name);
        tokio::pin!(connect);

        tokio::select! {
            state = &mut connect => state,
            _ = tokio::signal::ctrl_c() => {
                lifecycle.cancel_connection();
                // Let the cancelled attempt settle
                connect.await
            }
        }
    };

    // Dropping the last handle closes the event channel and ends the printer
    drop(lifecycle);
    if let Err(e) = printer.await {
        tracing::debug!("Event printer task failed: {}", e);
    }

    match state {
        LifecycleState::Connected => Ok(()),
        LifecycleState::Disconnected => anyhow::bail!("Connection to '{}' was cancelled", name),
        other => anyhow::bail!("Connection to '{}' ended in state {}", name, other),
    }
}
