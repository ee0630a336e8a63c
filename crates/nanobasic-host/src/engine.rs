//! The contract between the adapter and the interpreter engine.
//!
//! The engine (tokenizer, parser, evaluator, built-in statements) lives outside this
//! crate. It is driven exclusively through [`Engine::process`], one call per host turn,
//! and must keep every bit of resumable progress inside the [`Arena`] it is handed.

use crate::{arena::Arena, command::CommandTable, platform::Platform};

/// Numeric value type of the interpreter.
pub type Value = i32;

/// Program line number.
pub type LineNumber = u16;

/// Where the engine stands between two host calls.
///
/// The discriminants are the codes exchanged with the host (see [`crate::HostSession`]).
/// `Running` and `AwaitingInput` are suspensions: each can only be resumed with its
/// matching continuation (empty input for `Running`, a numeric value for
/// `AwaitingInput`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::FromRepr,
    strum::IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(i32)]
pub enum ExecutionState {
    /// Idle at the prompt, ready for a line of source.
    #[default]
    Repl = 0,
    /// A program is mid-run and yielded control after a scheduling quantum.
    Running = 1,
    /// A program is blocked on an INPUT statement and needs a numeric value.
    AwaitingInput = 2,
    /// The program ended or was stopped. Only a fresh REPL submission is valid.
    Halted = 3,
}

impl ExecutionState {
    /// Host-facing integer code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Decodes a host-facing integer code.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }

    /// Whether this state is a suspension that expects a continuation call.
    #[must_use]
    pub const fn is_suspended(self) -> bool {
        matches!(self, Self::Running | Self::AwaitingInput)
    }
}

/// Everything the engine may touch during one `process` call.
///
/// Built fresh by the session for every host call; nothing here outlives it.
pub struct Machine<'a> {
    /// The state tag the engine is entered with.
    pub state: ExecutionState,
    /// Source text for a REPL submission; empty for continuations.
    pub input: &'a [u8],
    /// Interpreter memory: code, values, call stack and resumption state.
    pub arena: &'a mut Arena,
    /// Host capabilities: character output, virtual files, numeric bridge.
    pub platform: &'a mut dyn Platform,
    /// Extension statements the engine should dispatch to.
    pub commands: &'a CommandTable,
    /// Value supplied for a pending INPUT statement. The engine takes it when it
    /// resumes from `AwaitingInput`.
    pub pending_input: &'a mut Option<Value>,
}

/// A line-numbered BASIC interpreter engine.
///
/// Implementations must not keep a suspended native call frame between calls:
/// a suspension is a return from `process`, and resumption is re-entry with the
/// state recovered from the arena.
pub trait Engine {
    /// Prepares a freshly allocated arena. Called once per session.
    fn init(&mut self, arena: &mut Arena);

    /// Runs one step: parses and executes REPL input, or resumes a suspension.
    ///
    /// Returns the state to hand back to the host.
    fn process(&mut self, machine: Machine<'_>) -> ExecutionState;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn init(&mut self, arena: &mut Arena) {
        (**self).init(arena);
    }

    fn process(&mut self, machine: Machine<'_>) -> ExecutionState {
        (**self).process(machine)
    }
}
