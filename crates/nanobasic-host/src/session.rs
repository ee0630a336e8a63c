//! The session state machine.
//!
//! A [`Session`] turns a series of short, independent host calls into one logical
//! program execution. Each call resets the output sink, enters the engine with the
//! state tag that matches the call (`Repl` for source, `Running` or `AwaitingInput`
//! for continuations), flushes the sink, and records the state the engine returned.
//!
//! Nothing survives between calls except what the session owns: the arena (where the
//! engine keeps its program counter, stacks and variables), the state tag, the
//! pending-input slot, and an open virtual file if the engine left one open.
//!
//! The session is a plain owned value. There is exactly one per interpreter, it is
//! passed by `&mut` to every entry point, and it performs no locking: host calls are
//! sequential by construction.

use std::{borrow::Cow, fmt};

use crate::{
    arena::{Arena, ArenaLayout},
    command::CommandTable,
    config::{ConfigError, SessionConfig},
    engine::{Engine, ExecutionState, Machine, Value},
    platform::{DoublingBridge, HostPlatform, NumericBridge},
    store::KeyValueStore,
    tracer::{EntryPoint, NoopTracer, SessionTracer},
};

/// Errors reported by [`Session`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session config was unusable.
    Config(ConfigError),
    /// REPL input did not fit the input buffer; the engine was not entered.
    InputTooLong { len: usize, capacity: usize },
    /// A snapshot was taken from a session with a different arena layout.
    LayoutMismatch { expected: ArenaLayout, found: ArenaLayout },
    /// A snapshot could not be encoded or decoded.
    Snapshot(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid config: {e}"),
            Self::InputTooLong { len, capacity } => {
                write!(f, "input too long: {len} bytes, must be under {capacity}")
            }
            Self::LayoutMismatch { expected, found } => {
                write!(f, "snapshot arena layout {found:?} does not match {expected:?}")
            }
            Self::Snapshot(msg) => write!(f, "snapshot error: {msg}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ConfigError> for SessionError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<postcard::Error> for SessionError {
    fn from(error: postcard::Error) -> Self {
        Self::Snapshot(error.to_string())
    }
}

/// Serializable copy of everything a session needs to resume.
///
/// Captures the arena bytes, state tag and pending input. The open virtual file,
/// output buffer and command table are host-side and not included.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionSnapshot {
    layout: ArenaLayout,
    arena: Vec<u8>,
    state: ExecutionState,
    pending_input: Option<Value>,
}

impl SessionSnapshot {
    /// State tag at the time of the snapshot.
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    #[must_use]
    pub fn layout(&self) -> ArenaLayout {
        self.layout
    }

    /// Encodes the snapshot with postcard.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decodes a snapshot produced by [`SessionSnapshot::dump`].
    pub fn load(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

/// The single live interpreter session.
///
/// # Type Parameters
/// * `E` - The interpreter engine
/// * `S` - Key-value store backing the virtual file subsystem
/// * `B` - Numeric bridge behind IMPORT/EXPORT
/// * `Tr` - Tracer receiving session events
#[derive(Debug)]
pub struct Session<E, S, B = DoublingBridge, Tr = NoopTracer> {
    engine: E,
    arena: Arena,
    state: ExecutionState,
    pending_input: Option<Value>,
    /// Source of the current REPL submission; empty for continuations.
    input: Vec<u8>,
    platform: HostPlatform<S, B>,
    commands: CommandTable,
    config: SessionConfig,
    tracer: Tr,
}

impl<E: Engine, S: KeyValueStore> Session<E, S> {
    /// Creates a session with the reference numeric bridge and no tracing.
    pub fn new(engine: E, store: S, config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_bridge(engine, store, config, DoublingBridge)
    }
}

impl<E: Engine, S: KeyValueStore, B: NumericBridge> Session<E, S, B> {
    /// Creates a session with a custom numeric bridge.
    ///
    /// Validates `config`, allocates the arena, initializes the engine on it and
    /// registers the IMPORT and EXPORT statements. The session starts in
    /// [`ExecutionState::Repl`].
    pub fn with_bridge(mut engine: E, store: S, config: SessionConfig, bridge: B) -> Result<Self, SessionError> {
        config.validate()?;
        let mut arena = Arena::new(config.layout());
        engine.init(&mut arena);
        Ok(Self {
            engine,
            arena,
            state: ExecutionState::Repl,
            pending_input: None,
            input: Vec::with_capacity(config.input_capacity),
            platform: HostPlatform::with_bridge(store, &config, bridge),
            commands: CommandTable::with_defaults(),
            config,
            tracer: NoopTracer,
        })
    }
}

impl<E: Engine, S: KeyValueStore, B: NumericBridge, Tr: SessionTracer> Session<E, S, B, Tr> {
    /// Replaces the tracer, changing the session's tracer type.
    #[must_use]
    pub fn with_tracer<T: SessionTracer>(self, tracer: T) -> Session<E, S, B, T> {
        Session {
            engine: self.engine,
            arena: self.arena,
            state: self.state,
            pending_input: self.pending_input,
            input: self.input,
            platform: self.platform,
            commands: self.commands,
            config: self.config,
            tracer,
        }
    }

    /// Submits one line of source to the REPL.
    ///
    /// Input of `input_capacity` bytes or more is rejected before the engine sees
    /// it; in that case nothing about the session changes, output included.
    pub fn exec(&mut self, input: &str) -> Result<ExecutionState, SessionError> {
        self.exec_bytes(input.as_bytes())
    }

    /// Byte-oriented form of [`Session::exec`].
    pub fn exec_bytes(&mut self, input: &[u8]) -> Result<ExecutionState, SessionError> {
        let capacity = self.config.input_capacity;
        if input.len() >= capacity {
            self.tracer.on_input_rejected(input.len(), capacity);
            return Err(SessionError::InputTooLong {
                len: input.len(),
                capacity,
            });
        }
        self.input.clear();
        self.input.extend_from_slice(input);
        Ok(self.dispatch(EntryPoint::Exec, ExecutionState::Repl))
    }

    /// Resumes a program that yielded in RUN mode.
    ///
    /// The call is forwarded even if the session is not suspended in `Running`;
    /// the engine decides what that means.
    pub fn continue_run(&mut self) -> ExecutionState {
        self.input.clear();
        self.dispatch(EntryPoint::Continue, ExecutionState::Running)
    }

    /// Stores a value for a pending INPUT statement.
    ///
    /// The value is offered to the engine on the next dispatch and discarded after it.
    pub fn set_pending_input(&mut self, value: Value) {
        self.pending_input = Some(value);
    }

    /// Resumes a pending INPUT statement with whatever [`Session::set_pending_input`]
    /// stored. With no stored value the engine sees `None` and decides.
    pub fn resume_input(&mut self) -> ExecutionState {
        self.input.clear();
        self.dispatch(EntryPoint::Input, ExecutionState::AwaitingInput)
    }

    /// Supplies `value` to the pending INPUT statement and resumes.
    pub fn continue_with_input(&mut self, value: Value) -> ExecutionState {
        self.set_pending_input(value);
        self.resume_input()
    }

    fn dispatch(&mut self, entry: EntryPoint, tag: ExecutionState) -> ExecutionState {
        if let Some(expected) = entry.resumes()
            && self.state != expected
        {
            self.tracer.on_mismatch(entry, expected, self.state);
        }

        self.platform.sink_mut().reset();
        self.tracer.on_dispatch(entry, tag, self.input.len());

        let next = self.engine.process(Machine {
            state: tag,
            input: &self.input,
            arena: &mut self.arena,
            platform: &mut self.platform,
            commands: &self.commands,
            pending_input: &mut self.pending_input,
        });

        self.platform.sink_mut().flush();
        self.pending_input = None;
        self.state = next;

        let sink = self.platform.sink();
        self.tracer.on_return(entry, next, sink.len(), sink.dropped());
        next
    }

    /// Re-initializes the interpreter: zeroes the arena, runs `Engine::init` again,
    /// and returns to `Repl` with empty output and no pending input.
    ///
    /// Registered commands and the store are kept. An open virtual file is closed
    /// first, so a half-written file is persisted rather than lost.
    pub fn reinit(&mut self) {
        self.platform.files_mut().close();
        self.arena.clear();
        self.engine.init(&mut self.arena);
        self.state = ExecutionState::Repl;
        self.pending_input = None;
        self.input.clear();
        self.platform.sink_mut().reset();
    }

    /// Captures the resumable state of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            layout: self.arena.layout(),
            arena: self.arena.as_bytes().to_vec(),
            state: self.state,
            pending_input: self.pending_input,
        }
    }

    /// Restores a snapshot taken from a session with the same arena layout.
    ///
    /// On error the session is left untouched.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let expected = self.arena.layout();
        if snapshot.layout != expected {
            return Err(SessionError::LayoutMismatch {
                expected,
                found: snapshot.layout,
            });
        }
        if !self.arena.load(&snapshot.arena) {
            return Err(SessionError::Snapshot(format!(
                "arena is {} bytes, layout needs {}",
                snapshot.arena.len(),
                expected.total()
            )));
        }
        self.state = snapshot.state;
        self.pending_input = snapshot.pending_input;
        self.tracer.on_restore(self.state);
        Ok(())
    }

    /// Encodes [`Session::snapshot`] to bytes.
    pub fn save(&self) -> Result<Vec<u8>, SessionError> {
        Ok(self.snapshot().dump()?)
    }

    /// Decodes and restores bytes produced by [`Session::save`].
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let snapshot = SessionSnapshot::load(bytes)?;
        self.restore(&snapshot)
    }

    /// Output produced by the last host call.
    #[must_use]
    pub fn read_output(&self) -> &[u8] {
        self.platform.sink().as_bytes()
    }

    /// Output produced by the last host call, as text.
    #[must_use]
    pub fn output_str(&self) -> Cow<'_, str> {
        self.platform.sink().as_str_lossy()
    }

    /// Empties the output buffer.
    pub fn clear_output(&mut self) {
        self.platform.sink_mut().reset();
    }

    /// State returned by the last host call.
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Value waiting to be consumed by an INPUT statement, if any.
    #[must_use]
    pub fn pending_input(&self) -> Option<Value> {
        self.pending_input
    }

    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn platform(&self) -> &HostPlatform<S, B> {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut HostPlatform<S, B> {
        &mut self.platform
    }

    #[must_use]
    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Registry for additional extension statements.
    pub fn commands_mut(&mut self) -> &mut CommandTable {
        &mut self.commands
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut Tr {
        &mut self.tracer
    }
}
