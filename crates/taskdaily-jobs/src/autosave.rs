//! Debounced autosave worker.
//!
//! Edits are stamped with a monotonically increasing revision and held per
//! owner until the debounce window passes without a newer edit. The commit is
//! then dispatched to its own task: once dispatched it is never cancelled, and
//! the content store drops it if a newer revision has already landed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use taskdaily_core::{
    defaults, AutosaveConfig, ContentStore, Error, OwnerRef, Result, SaveOutcome, UserContext,
};
use taskdaily_db::TagLinker;

/// Event emitted by the autosaver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveEvent {
    /// An edit was accepted and is waiting for the debounce window.
    Scheduled { owner: OwnerRef, revision: u64 },
    /// The content store applied the edit.
    Committed { owner: OwnerRef, revision: u64 },
    /// A newer revision was already stored; the edit was dropped.
    Stale {
        owner: OwnerRef,
        revision: u64,
        current: u64,
    },
    /// The content store rejected the edit.
    Failed {
        owner: OwnerRef,
        revision: u64,
        error: String,
    },
    /// Hashtags in committed content were linked.
    Tagged {
        owner: OwnerRef,
        revision: u64,
        linked: usize,
        warnings: Vec<String>,
    },
    /// The autosaver flushed its queue and stopped accepting edits.
    Stopped,
}

struct PendingEdit {
    revision: u64,
    content: String,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    pending: HashMap<OwnerRef, PendingEdit>,
    in_flight: Vec<(OwnerRef, JoinHandle<()>)>,
    closed: bool,
}

impl State {
    /// Track a dispatched commit, dropping handles of commits that finished.
    fn track(&mut self, owner: OwnerRef, handle: JoinHandle<()>) {
        self.in_flight.retain(|(_, h)| !h.is_finished());
        self.in_flight.push((owner, handle));
    }
}

struct Inner {
    config: AutosaveConfig,
    ctx: UserContext,
    content: Arc<dyn ContentStore>,
    linker: TagLinker,
    revision: AtomicU64,
    state: Mutex<State>,
    event_tx: broadcast::Sender<AutosaveEvent>,
}

/// Debounced, revision-ordered autosave for task titles and daily entries.
///
/// Cloning yields another handle to the same worker.
#[derive(Clone)]
pub struct Autosaver {
    inner: Arc<Inner>,
}

impl Autosaver {
    pub fn new(
        config: AutosaveConfig,
        ctx: UserContext,
        content: Arc<dyn ContentStore>,
        linker: TagLinker,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::AUTOSAVE_EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                ctx,
                content,
                linker,
                revision: AtomicU64::new(0),
                state: Mutex::new(State::default()),
                event_tx,
            }),
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.inner.config
    }

    /// Get a receiver for autosave events.
    pub fn events(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Record an edit for `owner` and return its revision.
    ///
    /// A newer edit for the same owner inside the debounce window replaces
    /// this one and restarts the window.
    pub async fn edit(&self, owner: OwnerRef, content: impl Into<String>) -> Result<u64> {
        let content = content.into();
        let delay = self.inner.config.delay();
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(Error::InvalidInput("autosaver is shut down".to_string()));
        }

        let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(previous) = state.pending.remove(&owner) {
            previous.timer.abort();
            debug!(%owner, superseded = previous.revision, revision, "Debounce restarted");
        }

        let _ = self
            .inner
            .event_tx
            .send(AutosaveEvent::Scheduled { owner, revision });

        if delay.is_zero() {
            let handle = self.inner.dispatch(owner, content, revision);
            state.track(owner, handle);
            return Ok(revision);
        }

        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            sleep(delay).await;
            inner.fire(owner, revision).await;
        });
        state.pending.insert(
            owner,
            PendingEdit {
                revision,
                content,
                timer,
            },
        );
        Ok(revision)
    }

    /// Commit the pending edit for `owner` now and wait for it, and any
    /// commit already dispatched for `owner`, to finish.
    ///
    /// Called when an input loses focus or is closed.
    pub async fn close(&self, owner: OwnerRef) {
        let handles = {
            let mut state = self.inner.state.lock().await;
            if let Some(edit) = state.pending.remove(&owner) {
                edit.timer.abort();
                let handle = self.inner.dispatch(owner, edit.content, edit.revision);
                state.in_flight.push((owner, handle));
            }
            let (mine, others): (Vec<_>, Vec<_>) = std::mem::take(&mut state.in_flight)
                .into_iter()
                .partition(|(o, _)| *o == owner);
            state.in_flight = others;
            mine
        };
        for (_, handle) in handles {
            if let Err(e) = handle.await {
                error!(error = ?e, %owner, "Autosave task panicked");
            }
        }
    }

    /// Commit every pending edit now and wait for all dispatched commits.
    pub async fn flush(&self) {
        let handles = {
            let mut state = self.inner.state.lock().await;
            let pending: Vec<(OwnerRef, PendingEdit)> = state.pending.drain().collect();
            for (owner, edit) in pending {
                edit.timer.abort();
                let handle = self.inner.dispatch(owner, edit.content, edit.revision);
                state.in_flight.push((owner, handle));
            }
            std::mem::take(&mut state.in_flight)
        };

        debug!(count = handles.len(), "Flushing autosave commits");
        for (owner, handle) in handles {
            if let Err(e) = handle.await {
                error!(error = ?e, %owner, "Autosave task panicked");
            }
        }
    }

    /// Flush pending edits and stop accepting new ones.
    pub async fn shutdown(&self) {
        self.inner.state.lock().await.closed = true;
        self.flush().await;
        let _ = self.inner.event_tx.send(AutosaveEvent::Stopped);
        info!("Autosaver stopped");
    }

    /// Number of edits waiting for their debounce window.
    pub async fn pending_count(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    /// Latest revision handed out.
    pub fn current_revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }
}

impl Inner {
    /// Debounce timer expiry. Dispatches only if `revision` is still the
    /// pending edit for `owner`.
    async fn fire(self: &Arc<Self>, owner: OwnerRef, revision: u64) {
        let mut state = self.state.lock().await;
        let current = state.pending.get(&owner).map(|p| p.revision);
        if current != Some(revision) {
            return;
        }
        if let Some(edit) = state.pending.remove(&owner) {
            let handle = self.dispatch(owner, edit.content, edit.revision);
            state.track(owner, handle);
        }
    }

    fn dispatch(self: &Arc<Self>, owner: OwnerRef, content: String, revision: u64) -> JoinHandle<()> {
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.commit(owner, content, revision).await })
    }

    #[instrument(
        skip(self, owner, content),
        fields(
            subsystem = "jobs",
            component = "autosave",
            op = "commit",
            owner = %owner,
            content_len = content.len(),
        )
    )]
    async fn commit(&self, owner: OwnerRef, content: String, revision: u64) {
        let start = Instant::now();

        match self.content.save(owner, &content, revision).await {
            Ok(SaveOutcome::Applied) => {
                info!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Content saved"
                );
                let _ = self
                    .event_tx
                    .send(AutosaveEvent::Committed { owner, revision });
            }
            Ok(SaveOutcome::Stale { current }) => {
                debug!(current, "Newer revision already stored");
                let _ = self.event_tx.send(AutosaveEvent::Stale {
                    owner,
                    revision,
                    current,
                });
                return;
            }
            Err(e) => {
                warn!(error = %e, "Content save failed");
                let _ = self.event_tx.send(AutosaveEvent::Failed {
                    owner,
                    revision,
                    error: e.to_string(),
                });
                return;
            }
        }

        let outcome = self.linker.tag_content(&self.ctx, owner, &content).await;
        let _ = self.event_tx.send(AutosaveEvent::Tagged {
            owner,
            revision,
            linked: outcome.newly_linked.len(),
            warnings: outcome.warnings,
        });
    }
}
