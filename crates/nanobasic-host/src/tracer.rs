//! Session tracing infrastructure.
//!
//! The [`SessionTracer`] trait defines hook points at the host-call boundary: every
//! dispatch into the engine, every state handed back, continuations that do not match
//! the current suspension, rejected input and snapshot restores.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`LogTracer`] | Forwards events to the `tracing` ecosystem |
//! | [`RecordingTracer`] | Keeps every event for tests and post-mortem inspection |
//!
//! The session carries the tracer as a type parameter, so `Session<_, _, _, NoopTracer>`
//! compiles every hook away.

use std::fmt;

use crate::engine::ExecutionState;

/// Host entry point that caused a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EntryPoint {
    /// `exec`: a line of REPL source.
    Exec,
    /// `continue_run`: resume after a RUN-mode yield.
    Continue,
    /// `resume_input` / `continue_with_input`: resume an INPUT statement.
    Input,
}

impl EntryPoint {
    /// The state a continuation from this entry point is meant to resume.
    #[must_use]
    pub const fn resumes(self) -> Option<ExecutionState> {
        match self {
            Self::Exec => None,
            Self::Continue => Some(ExecutionState::Running),
            Self::Input => Some(ExecutionState::AwaitingInput),
        }
    }
}

/// Trace event recorded by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// The engine was entered.
    Dispatch {
        entry: EntryPoint,
        /// State tag passed to the engine.
        state: ExecutionState,
        /// Length of the submitted source (0 for continuations).
        input_len: usize,
    },
    /// The engine returned.
    Return {
        entry: EntryPoint,
        /// State tag the engine returned.
        state: ExecutionState,
        /// Bytes of output buffered during the call.
        output_len: usize,
        /// Bytes of output dropped because the buffer was full.
        dropped: usize,
    },
    /// A continuation was issued while the session was not in the state it resumes.
    Mismatch {
        entry: EntryPoint,
        expected: ExecutionState,
        current: ExecutionState,
    },
    /// REPL input was rejected for length before reaching the engine.
    InputRejected { len: usize, capacity: usize },
    /// A snapshot was restored.
    Restored { state: ExecutionState },
}

/// Hooks called by the session around each host call.
///
/// All methods default to no-ops; implementations override only what they need.
pub trait SessionTracer: fmt::Debug {
    /// Called right before the engine is entered.
    #[inline(always)]
    fn on_dispatch(&mut self, _entry: EntryPoint, _state: ExecutionState, _input_len: usize) {}

    /// Called after the engine returned and the sink was flushed.
    #[inline(always)]
    fn on_return(&mut self, _entry: EntryPoint, _state: ExecutionState, _output_len: usize, _dropped: usize) {}

    /// Called when a continuation does not match the current state.
    ///
    /// The continuation is still forwarded; how the engine reacts is up to it.
    #[inline(always)]
    fn on_mismatch(&mut self, _entry: EntryPoint, _expected: ExecutionState, _current: ExecutionState) {}

    /// Called when REPL input is rejected for length.
    #[inline(always)]
    fn on_input_rejected(&mut self, _len: usize, _capacity: usize) {}

    /// Called after a snapshot was restored.
    #[inline(always)]
    fn on_restore(&mut self, _state: ExecutionState) {}
}

// ============================================================================
// NoopTracer
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl SessionTracer for NoopTracer {}

// ============================================================================
// LogTracer
// ============================================================================

/// Tracer that reports session events through `tracing`.
///
/// Dispatches and returns are logged at `debug`, mismatched continuations and
/// rejected input at `warn`. Install any `tracing` subscriber to see them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl SessionTracer for LogTracer {
    fn on_dispatch(&mut self, entry: EntryPoint, state: ExecutionState, input_len: usize) {
        tracing::debug!(%entry, %state, input_len, "entering engine");
    }

    fn on_return(&mut self, entry: EntryPoint, state: ExecutionState, output_len: usize, dropped: usize) {
        tracing::debug!(%entry, %state, output_len, dropped, "engine returned");
    }

    fn on_mismatch(&mut self, entry: EntryPoint, expected: ExecutionState, current: ExecutionState) {
        tracing::warn!(%entry, %expected, %current, "continuation does not match session state");
    }

    fn on_input_rejected(&mut self, len: usize, capacity: usize) {
        tracing::warn!(len, capacity, "input rejected, too long");
    }

    fn on_restore(&mut self, state: ExecutionState) {
        tracing::debug!(%state, "session restored from snapshot");
    }
}

// ============================================================================
// RecordingTracer
// ============================================================================

/// Tracer that records every event in order.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl SessionTracer for RecordingTracer {
    fn on_dispatch(&mut self, entry: EntryPoint, state: ExecutionState, input_len: usize) {
        self.record(TraceEvent::Dispatch {
            entry,
            state,
            input_len,
        });
    }

    fn on_return(&mut self, entry: EntryPoint, state: ExecutionState, output_len: usize, dropped: usize) {
        self.record(TraceEvent::Return {
            entry,
            state,
            output_len,
            dropped,
        });
    }

    fn on_mismatch(&mut self, entry: EntryPoint, expected: ExecutionState, current: ExecutionState) {
        self.record(TraceEvent::Mismatch {
            entry,
            expected,
            current,
        });
    }

    fn on_input_rejected(&mut self, len: usize, capacity: usize) {
        self.record(TraceEvent::InputRejected { len, capacity });
    }

    fn on_restore(&mut self, state: ExecutionState) {
        self.record(TraceEvent::Restored { state });
    }
}
