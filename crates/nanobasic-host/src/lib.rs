//! Host runtime adapter for an embedded, line-numbered BASIC interpreter.
//!
//! The interpreter engine runs inside a single-threaded host that can only make
//! short, discrete calls into it. This crate owns everything around the engine:
//!
//! - [`Session`]: the state machine that lets a program pause at an INPUT prompt or
//!   between RUN steps and resume on a later, independent host call;
//! - [`OutputSink`]: the bounded character buffer the engine prints into;
//! - [`VirtualFs`]: open/read-line/write-line/close over a whole-value [`KeyValueStore`];
//! - [`CommandTable`]: extension statements, with the IMPORT/EXPORT bridge commands;
//! - [`HostSession`]: the integer-coded surface a WebAssembly host calls.
//!
//! The engine itself is reached only through the [`Engine`] and [`Interpreter`] traits.

mod arena;
pub mod command;
mod config;
mod engine;
mod host;
mod io;
mod platform;
mod session;
mod store;
pub mod tracer;
mod vfs;

pub use crate::{
    arena::{Arena, ArenaLayout, Region},
    command::{
        CommandContext, CommandError, CommandHandler, CommandTable, Interpreter, PARAMETER_SEPARATOR, StatementError,
        StatementResult,
    },
    config::{
        ConfigError, DEFAULT_CODE_CAPACITY, DEFAULT_FILE_CAPACITY, DEFAULT_INPUT_CAPACITY, DEFAULT_MAX_FILE_NAME,
        DEFAULT_OUTPUT_CAPACITY, DEFAULT_STACK_CAPACITY, DEFAULT_VALUE_CAPACITY, SessionConfig,
    },
    engine::{Engine, ExecutionState, LineNumber, Machine, Value},
    host::{HostSession, INPUT_TOO_LONG},
    io::{NoListener, OutputListener, OutputSink},
    platform::{DoublingBridge, HostPlatform, NumericBridge, Platform},
    session::{Session, SessionError, SessionSnapshot},
    store::{KeyValueStore, MemoryStore},
    tracer::{EntryPoint, LogTracer, NoopTracer, RecordingTracer, SessionTracer, TraceEvent},
    vfs::{FileError, FileMode, MAX_LINE_LEN, VirtualFs},
};
