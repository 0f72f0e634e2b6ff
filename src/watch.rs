//! Watch/reload coordination.
//!
//! Observes both discovery roots with debouncing, classifies each change by
//! the asset-kind subtree it falls under, and re-runs exactly the affected
//! converter. Reloads are serialized; change notifications arriving while a
//! reload is in flight are coalesced into at most one follow-up run per
//! kind. An in-flight reload always runs to completion; cancellation only
//! stops the coordinator between reloads.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
    notify::{EventKind, RecursiveMode},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::discovery::AssetKind;

/// Debounce window for filesystem notifications.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Re-runs the conversion pipeline for one asset kind. Implementations must
/// swap state only on success so a failed reload leaves the previous, still
/// valid state in place.
#[async_trait]
pub trait KindReloader: Send + Sync + 'static {
    async fn reload(&self, kind: AssetKind);
}

/// Watches the discovery roots and drives coalesced, serialized reloads.
///
/// The coordinator must be kept alive (not dropped) for reloads to continue.
pub struct ReloadCoordinator {
    _debouncer: Debouncer<notify_debouncer_full::notify::RecommendedWatcher, RecommendedCache>,
    cancel: CancellationToken,
}

impl ReloadCoordinator {
    /// Start watching `roots` and dispatching reloads to `reloader`.
    pub fn start(roots: Vec<PathBuf>, reloader: Arc<dyn KindReloader>) -> crate::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<AssetKind>();

        let classify_roots = roots.clone();
        let mut debouncer = new_debouncer(
            DEBOUNCE_WINDOW,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        if !matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) {
                            continue;
                        }
                        for path in &event.paths {
                            if let Some(kind) = AssetKind::classify(&classify_roots, path) {
                                tracing::debug!(path = %path.display(), %kind, "asset change");
                                let _ = tx.send(kind);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        tracing::warn!(error = %e, "asset watcher error");
                    }
                }
            },
        )
        .map_err(|e| crate::Error::Watch(e.to_string()))?;

        for root in &roots {
            if root.exists() {
                debouncer
                    .watch(root, RecursiveMode::Recursive)
                    .map_err(|e| crate::Error::Watch(e.to_string()))?;
                tracing::info!(root = %root.display(), "watching asset root");
            }
        }

        let cancel = CancellationToken::new();
        tokio::spawn(run_loop(rx, reloader, cancel.clone()));

        Ok(Self {
            _debouncer: debouncer,
            cancel,
        })
    }

    /// Stop dispatching reloads. An in-flight reload runs to completion.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReloadCoordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Single consumer task: drains bursts of change notifications into a dirty
/// set and reloads each dirty kind once, serially.
async fn run_loop(
    mut rx: mpsc::UnboundedReceiver<AssetKind>,
    reloader: Arc<dyn KindReloader>,
    cancel: CancellationToken,
) {
    loop {
        let first = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Some(kind) => kind,
                None => break,
            },
        };

        for kind in drain_dirty(&mut rx, first) {
            tracing::info!(%kind, "reloading asset kind");
            reloader.reload(kind).await;
        }
    }
}

/// Collect every notification already queued behind `first` into a dirty
/// set, coalescing repeated changes to the same kind.
fn drain_dirty(rx: &mut mpsc::UnboundedReceiver<AssetKind>, first: AssetKind) -> BTreeSet<AssetKind> {
    let mut dirty = BTreeSet::from([first]);
    while let Ok(kind) = rx.try_recv() {
        dirty.insert(kind);
    }
    dirty
}
