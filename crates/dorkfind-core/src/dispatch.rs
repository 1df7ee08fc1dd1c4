//! Debounced, race-safe query dispatch for search-as-you-type front ends.
//!
//! `DispatchState` is a plain state machine with the clock passed in, so it
//! can be driven by any event loop and tested without one:
//!
//! ```text
//!   Idle ──input──▶ Pending ──quiet interval, text──▶ InFlight ──response──▶ Settled
//!    ▲                 │  ▲                               │                    │
//!    └─quiet, empty────┘  └────────────input──────────────┴────────────────────┘
//! ```
//!
//! Every input change re-arms a single deadline. When it expires the current
//! text is dispatched under a new sequence number. A response is applied only
//! if it carries the highest sequence number issued and that request is still
//! the one being awaited; anything else is dropped. There is no cancellation
//! of the underlying call.
//!
//! `QueryDispatcher` pairs the state with a `SearchTransport`, running each
//! call on a worker thread and handing completions back over a channel.

use crate::error::{DorkError, Result};
use crate::transport::SearchTransport;
use crate::types::DorkRecord;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default quiet interval between the last keystroke and a dispatch.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(500);

/// Where the dispatcher is in its input/request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No text, nothing shown
    Idle,
    /// Input changed, waiting for it to settle
    Pending,
    /// A request for the current text is outstanding
    InFlight,
    /// Results or an error for the last dispatched text are shown
    Settled,
}

/// A search the caller must send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub seq: u64,
    pub query: String,
}

/// Client-side search state for one input field.
#[derive(Debug, Clone)]
pub struct DispatchState {
    input: String,
    last_dispatched: Option<String>,
    latest_seq: u64,
    accepted_seq: u64,
    results: Vec<DorkRecord>,
    loading: bool,
    error: Option<String>,
    phase: Phase,
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Default for DispatchState {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

impl DispatchState {
    pub fn new(quiet: Duration) -> Self {
        DispatchState {
            input: String::new(),
            last_dispatched: None,
            latest_seq: 0,
            accepted_seq: 0,
            results: Vec::new(),
            loading: false,
            error: None,
            phase: Phase::Idle,
            quiet,
            deadline: None,
        }
    }

    /// Record new input text and restart the quiet timer.
    ///
    /// Returns false if the text did not change.
    pub fn set_input(&mut self, text: impl Into<String>, now: Instant) -> bool {
        let text = text.into();
        if text == self.input {
            return false;
        }
        self.input = text;
        self.deadline = Some(now + self.quiet);
        self.phase = Phase::Pending;
        true
    }

    /// Fire the quiet timer if it has expired.
    ///
    /// Returns the request to send, if any. Expiry with empty text clears
    /// results and error and returns to `Idle` without a request.
    pub fn poll_timer(&mut self, now: Instant) -> Option<Dispatch> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        if self.input.is_empty() {
            self.results.clear();
            self.error = None;
            self.loading = false;
            self.phase = Phase::Idle;
            return None;
        }

        self.latest_seq += 1;
        self.loading = true;
        self.error = None;
        self.phase = Phase::InFlight;
        self.last_dispatched = Some(self.input.clone());

        Some(Dispatch {
            seq: self.latest_seq,
            query: self.input.clone(),
        })
    }

    /// Apply the outcome of request `seq`.
    ///
    /// Returns false, leaving the state untouched, when `seq` is not the
    /// latest request or the input has moved on since it was sent.
    pub fn apply_response(&mut self, seq: u64, outcome: Result<Vec<DorkRecord>>) -> bool {
        if seq != self.latest_seq || self.phase != Phase::InFlight {
            debug!(seq, latest = self.latest_seq, phase = ?self.phase, "Discarding stale response");
            return false;
        }

        match outcome {
            Ok(records) => {
                self.results = records;
                self.error = None;
            }
            Err(e) => {
                self.results.clear();
                self.error = Some(e.user_message());
            }
        }
        self.loading = false;
        self.accepted_seq = seq;
        self.phase = Phase::Settled;
        true
    }

    /// Time left before the pending dispatch fires.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn last_dispatched(&self) -> Option<&str> {
        self.last_dispatched.as_deref()
    }

    pub fn results(&self) -> &[DorkRecord] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Highest sequence number issued so far
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Sequence number of the last response applied
    pub fn accepted_seq(&self) -> u64 {
        self.accepted_seq
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }
}

struct Completed {
    seq: u64,
    outcome: Result<Vec<DorkRecord>>,
    took: Duration,
}

/// Drives a `DispatchState` against a transport.
///
/// Owned by a single event loop: call `on_input` on keystrokes and `tick`
/// on every loop iteration. Each dispatch runs on its own worker thread.
pub struct QueryDispatcher {
    state: DispatchState,
    transport: Arc<dyn SearchTransport>,
    done_tx: Sender<Completed>,
    done_rx: Receiver<Completed>,
    last_search_time: Duration,
}

impl QueryDispatcher {
    pub fn new(transport: Arc<dyn SearchTransport>, quiet: Duration) -> Self {
        let (done_tx, done_rx) = unbounded();
        QueryDispatcher {
            state: DispatchState::new(quiet),
            transport,
            done_tx,
            done_rx,
            last_search_time: Duration::ZERO,
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Round-trip time of the last applied response.
    pub fn last_search_time(&self) -> Duration {
        self.last_search_time
    }

    pub fn on_input(&mut self, text: impl Into<String>) -> bool {
        self.on_input_at(text, Instant::now())
    }

    pub fn on_input_at(&mut self, text: impl Into<String>, now: Instant) -> bool {
        self.state.set_input(text, now)
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Fire a due dispatch and apply any completed responses.
    ///
    /// Returns true if the visible state changed.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        let before = self.state.phase();
        if let Some(dispatch) = self.state.poll_timer(now) {
            self.spawn(dispatch);
        }
        let mut changed = self.state.phase() != before;

        while let Ok(done) = self.done_rx.try_recv() {
            changed |= self.apply(done);
        }
        changed
    }

    /// Block until one response arrives (or `timeout` passes) and apply it.
    ///
    /// Returns true if a response was received, applied or not.
    pub fn wait_for_response(&mut self, timeout: Duration) -> bool {
        match self.done_rx.recv_timeout(timeout) {
            Ok(done) => {
                self.apply(done);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn apply(&mut self, done: Completed) -> bool {
        let applied = self.state.apply_response(done.seq, done.outcome);
        if applied {
            self.last_search_time = done.took;
        }
        applied
    }

    fn spawn(&mut self, dispatch: Dispatch) {
        debug!(seq = dispatch.seq, query_len = dispatch.query.len(), "Dispatching search");

        let seq = dispatch.seq;
        let transport = Arc::clone(&self.transport);
        let done_tx = self.done_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("dorkfind-search-{}", seq))
            .spawn(move || {
                let start = Instant::now();
                let outcome = transport.search(&dispatch.query);
                let _ = done_tx.send(Completed {
                    seq: dispatch.seq,
                    outcome,
                    took: start.elapsed(),
                });
            });

        if let Err(e) = spawned {
            warn!(seq, error = %e, "Failed to start search worker");
            self.state
                .apply_response(seq, Err(DorkError::transport(e.to_string())));
        }
    }
}
