//! Backend worker: owns a tokio runtime and runs each queued command as its own
//! task, so requests overlap the way user actions do.

use std::{sync::Arc, thread};

use client_core::GroupApi;
use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::backend_bridge::commands::{BackendCommand, MutationOp};
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Starts the worker and returns it with the receiving end of its event queue.
///
/// The event queue is unbounded: every dispatched command is answered by
/// exactly one event, and runtime workers must never wait on the console.
pub fn launch(
    api: Arc<dyn GroupApi>,
    cmd_rx: Receiver<BackendCommand>,
) -> (thread::JoinHandle<()>, Receiver<UiEvent>) {
    let (ui_tx, ui_rx) = unbounded::<UiEvent>();
    let handle = thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let _ = ui_tx.try_send(UiEvent::Info("backend worker ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let api = Arc::clone(&api);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let event = execute(api.as_ref(), cmd).await;
                report(&ui_tx, event);
            });
        }

        // Let in-flight requests report before the runtime is dropped.
        runtime.shutdown_timeout(std::time::Duration::from_secs(2));
        debug!("backend worker stopped");
    });
    (handle, ui_rx)
}

fn report(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!("ui event queue full; dropping {event:?}");
        }
        Err(TrySendError::Disconnected(_)) => {
            debug!("controller gone; dropping backend result");
        }
    }
}

/// Runs one command against the remote and reports how it settled.
pub async fn execute(api: &dyn GroupApi, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::FetchPage {
            generation,
            descriptor,
        } => match api.list(&descriptor).await {
            Ok(page) => UiEvent::PageLoaded { generation, page },
            Err(err) => {
                if !err.is_rejection() {
                    warn!(generation, "group page fetch failed: {err}");
                }
                UiEvent::PageFailed {
                    generation,
                    error: UiError::from_client_error(UiErrorContext::FetchPage, &err),
                }
            }
        },
        BackendCommand::Mutate { op, refresh } => {
            let result = match &op {
                MutationOp::Save(draft) => api.save(draft).await,
                MutationOp::Remove { group_id } => api.remove(group_id).await,
                MutationOp::UnbindOne {
                    group_id,
                    device_id,
                } => {
                    api.unbind(group_id, std::slice::from_ref(device_id))
                        .await
                }
                MutationOp::UnbindAll { group_id } => api.unbind_all(group_id).await,
            };
            let result = result.map_err(|err| {
                if !err.is_rejection() {
                    warn!(op = op.name(), "group mutation failed: {err}");
                }
                UiError::from_client_error(UiErrorContext::Mutation, &err)
            });
            UiEvent::MutationSettled {
                op,
                refresh,
                result,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
