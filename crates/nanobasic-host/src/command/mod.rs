//! Extension statements.
//!
//! The engine consults a [`CommandTable`] while parsing a statement. When the text at
//! the scan cursor starts with a registered name, the engine calls the matching
//! [`CommandHandler`] with a [`CommandContext`]: the raw statement text, the cursor,
//! the interpreter state, the engine's own parsing surface ([`Interpreter`]) and the
//! host [`Platform`].
//!
//! Handlers report failure the same way built-in statements do: by returning a
//! [`StatementError`], which aborts the statement. Inside a handler that is just `?`.

mod export;
mod import;

use std::fmt;

pub use self::{export::export, import::import};
use crate::{
    engine::{ExecutionState, LineNumber, Value},
    platform::Platform,
};

/// Byte separating the parameters of a statement.
pub const PARAMETER_SEPARATOR: u8 = b',';

/// Longest accepted command name.
pub const MAX_COMMAND_NAME: usize = 8;

/// Name the IMPORT statement is registered under.
pub const IMPORT_NAME: &str = "IMP";

/// Name the EXPORT statement is registered under.
pub const EXPORT_NAME: &str = "EXP";

/// Reason a statement was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// The text at `pos` could not be parsed.
    Syntax { pos: usize },
    /// A parameter separator was expected at `pos`.
    Separator { pos: usize, found: Option<u8> },
    /// No variable exists at `index`.
    Variable { index: usize },
    /// Any other failure reported by the engine.
    Engine(String),
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { pos } => write!(f, "syntax error at {pos}"),
            Self::Separator { pos, found: Some(b) } => {
                write!(f, "expected ',' at {pos}, found {:?}", char::from(*b))
            }
            Self::Separator { pos, found: None } => write!(f, "expected ',' at {pos}, found end of statement"),
            Self::Variable { index } => write!(f, "no variable at index {index}"),
            Self::Engine(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StatementError {}

/// Result of parsing or executing a statement.
pub type StatementResult<T = ()> = Result<T, StatementError>;

/// The engine's parsing and variable surface, as seen by extension handlers.
pub trait Interpreter {
    /// Parses and evaluates an expression starting at `pos`, advancing past it.
    fn eval(&mut self, code: &[u8], pos: &mut usize) -> StatementResult<Value>;

    /// Parses a variable reference starting at `pos`, advancing past it, and
    /// returns its slot index.
    fn variable_slot(&mut self, code: &[u8], pos: &mut usize) -> StatementResult<usize>;

    /// Reads the variable at `index`.
    fn variable(&self, index: usize) -> StatementResult<Value>;

    /// Writes the variable at `index`.
    fn set_variable(&mut self, index: usize, value: Value) -> StatementResult;
}

/// Everything a handler receives for one statement.
pub struct CommandContext<'a> {
    /// Line number of the statement; handlers that jump may change it.
    pub line: &'a mut LineNumber,
    /// Raw statement text.
    pub code: &'a [u8],
    /// Scan cursor into `code`, positioned just after the command name.
    pub pos: &'a mut usize,
    /// Interpreter state; handlers that suspend or halt may change it.
    pub state: &'a mut ExecutionState,
    pub interpreter: &'a mut dyn Interpreter,
    pub platform: &'a mut dyn Platform,
}

impl CommandContext<'_> {
    /// Evaluates the expression at the cursor.
    pub fn eval(&mut self) -> StatementResult<Value> {
        self.interpreter.eval(self.code, self.pos)
    }

    /// Parses the variable reference at the cursor.
    pub fn variable_slot(&mut self) -> StatementResult<usize> {
        self.interpreter.variable_slot(self.code, self.pos)
    }

    /// Consumes a [`PARAMETER_SEPARATOR`] at the cursor.
    pub fn expect_separator(&mut self) -> StatementResult {
        match self.code.get(*self.pos) {
            Some(&PARAMETER_SEPARATOR) => {
                *self.pos += 1;
                Ok(())
            }
            found => Err(StatementError::Separator {
                pos: *self.pos,
                found: found.copied(),
            }),
        }
    }
}

/// Handler for an extension statement.
pub type CommandHandler = fn(&mut CommandContext<'_>) -> StatementResult;

/// Error returned when registering a command fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Names must be 1 to [`MAX_COMMAND_NAME`] ASCII letters.
    InvalidName(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid command name '{name}'"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Registry of extension statements.
///
/// Names are stored upper-case. Registering a name that is already present
/// replaces its handler in place: the last registration wins.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Vec<(String, CommandHandler)>,
}

impl CommandTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with IMPORT and EXPORT registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register_defaults();
        table
    }

    /// Registers IMPORT as `IMP` and EXPORT as `EXP`.
    pub fn register_defaults(&mut self) {
        self.insert(IMPORT_NAME.to_owned(), import);
        self.insert(EXPORT_NAME.to_owned(), export);
    }

    /// Registers `handler` under `name`, returning the handler it replaced.
    pub fn register(&mut self, name: &str, handler: CommandHandler) -> Result<Option<CommandHandler>, CommandError> {
        if name.is_empty() || name.len() > MAX_COMMAND_NAME || !name.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CommandError::InvalidName(name.to_owned()));
        }
        Ok(self.insert(name.to_ascii_uppercase(), handler))
    }

    fn insert(&mut self, name: String, handler: CommandHandler) -> Option<CommandHandler> {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            tracing::debug!(command = %name, "replacing extension command");
            return Some(std::mem::replace(slot, handler));
        }
        self.entries.push((name, handler));
        None
    }

    /// Looks up a handler by name, ignoring case.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<CommandHandler> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|&(_, handler)| handler)
    }

    /// Matches a command name at `code[*pos..]`, ignoring case.
    ///
    /// On a match the cursor is advanced past the name and the handler returned.
    /// When several names match, the longest wins.
    pub fn match_keyword(&self, code: &[u8], pos: &mut usize) -> Option<CommandHandler> {
        let rest = code.get(*pos..)?;
        let (name, handler) = self
            .entries
            .iter()
            .filter(|(name, _)| rest.len() >= name.len() && rest[..name.len()].eq_ignore_ascii_case(name.as_bytes()))
            .max_by_key(|(name, _)| name.len())?;
        *pos += name.len();
        Some(*handler)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
