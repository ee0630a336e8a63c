//! Integer-coded host boundary.
//!
//! A WebAssembly host can only pass numbers and strings across the boundary, so
//! [`HostSession`] flattens the [`Session`] API into the shape of the exported
//! functions: every call returns an [`ExecutionState`](crate::ExecutionState) code, or [`INPUT_TOO_LONG`]
//! when `exec` rejected its input.

use crate::{
    config::SessionConfig,
    engine::{Engine, Value},
    platform::{DoublingBridge, NumericBridge},
    session::{Session, SessionError},
    store::KeyValueStore,
    tracer::{NoopTracer, SessionTracer},
};

/// Code returned by [`HostSession::exec`] when the input does not fit the input buffer.
pub const INPUT_TOO_LONG: i32 = -1;

/// Host-facing wrapper that speaks integer state codes.
#[derive(Debug)]
pub struct HostSession<E, S, B = DoublingBridge, Tr = NoopTracer> {
    session: Session<E, S, B, Tr>,
}

impl<E: Engine, S: KeyValueStore> HostSession<E, S> {
    /// Creates the session the host will drive.
    pub fn init_session(engine: E, store: S, config: SessionConfig) -> Result<Self, SessionError> {
        Session::new(engine, store, config).map(Self::from)
    }
}

impl<E: Engine, S: KeyValueStore, B: NumericBridge, Tr: SessionTracer> HostSession<E, S, B, Tr> {
    /// Runs one line of source. Returns a state code or [`INPUT_TOO_LONG`].
    pub fn exec(&mut self, input: &str) -> i32 {
        match self.session.exec(input) {
            Ok(state) => state.code(),
            Err(_) => INPUT_TOO_LONG,
        }
    }

    /// Resumes a RUN-mode yield. Returns a state code.
    pub fn continue_run(&mut self) -> i32 {
        self.session.continue_run().code()
    }

    /// Answers a pending INPUT statement and resumes. Returns a state code.
    pub fn continue_with_input(&mut self, value: Value) -> i32 {
        self.session.continue_with_input(value).code()
    }

    /// Stores a value for the next INPUT statement.
    pub fn set_pending_input(&mut self, value: Value) {
        self.session.set_pending_input(value);
    }

    /// Resumes a pending INPUT statement with the value stored by
    /// [`HostSession::set_pending_input`]. Returns a state code.
    pub fn resume_input(&mut self) -> i32 {
        self.session.resume_input().code()
    }

    /// Copy of the output produced by the last call.
    #[must_use]
    pub fn read_output(&self) -> String {
        self.session.output_str().into_owned()
    }

    pub fn clear_output(&mut self) {
        self.session.clear_output();
    }

    /// Code of the state returned by the last call.
    #[must_use]
    pub fn state(&self) -> i32 {
        self.session.state().code()
    }

    #[must_use]
    pub fn session(&self) -> &Session<E, S, B, Tr> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<E, S, B, Tr> {
        &mut self.session
    }

    #[must_use]
    pub fn into_session(self) -> Session<E, S, B, Tr> {
        self.session
    }
}

impl<E, S, B, Tr> From<Session<E, S, B, Tr>> for HostSession<E, S, B, Tr> {
    fn from(session: Session<E, S, B, Tr>) -> Self {
        Self { session }
    }
}

