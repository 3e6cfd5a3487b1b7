//! Debounced search input.
//!
//! Every edit replaces the single pending timer. When a timer survives the
//! quiet period its text is emitted, unless it equals the last emitted value.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::observability::{QUERIES_SETTLED_TOTAL, QUERIES_SUPPRESSED_TOTAL};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Receiver of settled queries.
pub trait QuerySink: Send + Sync + 'static {
    fn on_settled(&self, query: String);
}

impl<F> QuerySink for F
where
    F: Fn(String) + Send + Sync + 'static,
{
    fn on_settled(&self, query: String) {
        self(query)
    }
}

#[derive(Default)]
struct DebounceState {
    /// Bumped on every input; a timer only fires if its generation is still current.
    generation: u64,
    pending: Option<JoinHandle<()>>,
    last_emitted: Option<String>,
}

pub struct SearchDebouncer {
    quiet: Duration,
    state: Arc<Mutex<DebounceState>>,
    sink: Arc<dyn QuerySink>,
}

fn lock(state: &Mutex<DebounceState>) -> MutexGuard<'_, DebounceState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SearchDebouncer {
    pub fn new(quiet: Duration, sink: impl QuerySink) -> Self {
        Self {
            quiet,
            state: Arc::new(Mutex::new(DebounceState::default())),
            sink: Arc::new(sink),
        }
    }

    pub fn with_default_quiet(sink: impl QuerySink) -> Self {
        Self::new(DEFAULT_QUIET_PERIOD, sink)
    }

    /// Record the latest full input value. Never blocks.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_input_changed(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = lock(&self.state);
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }
        trace!(generation, len = text.len(), "input changed; timer reset");

        let quiet = self.quiet;
        let shared = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            fire(&shared, sink.as_ref(), generation, text);
        }));
    }

    /// Most recently emitted query, if any.
    pub fn last_settled(&self) -> Option<String> {
        lock(&self.state).last_emitted.clone()
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Drop the pending timer, if any, without emitting.
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        state.generation = state.generation.wrapping_add(1);
        if let Some(pending) = state.pending.take() {
            pending.abort();
            debug!("pending search timer cancelled");
        }
    }
}

fn fire(state: &Mutex<DebounceState>, sink: &dyn QuerySink, generation: u64, text: String) {
    {
        let mut state = lock(state);
        if state.generation != generation {
            return;
        }
        state.pending = None;
        if state.last_emitted.as_deref() == Some(text.as_str()) {
            QUERIES_SUPPRESSED_TOTAL.inc();
            trace!("settled query unchanged; not emitted");
            return;
        }
        state.last_emitted = Some(text.clone());
    }
    QUERIES_SETTLED_TOTAL.inc();
    debug!(query = %text, "query settled");
    sink.on_settled(text);
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
