//! Engine doubles shared by the integration tests.
//!
//! `TinyBasic` is a deliberately small line-oriented interpreter that keeps all of its
//! resumable progress in the arena, the way a real engine must: the stored listing in
//! the code region, variables in the value region, and the INPUT/RUN bookkeeping in the
//! stack region. `EchoEngine` just prints its input back.
#![expect(dead_code, reason = "each test binary uses a different subset of the doubles")]

use nanobasic_host::{
    Arena, CommandContext, Engine, ExecutionState, FileMode, Interpreter, LineNumber, Machine, NumericBridge,
    Platform, Region, StatementError, StatementResult, Value,
};

/// Byte offset in the stack region of the INPUT marker (0 = none, n = variable n - 1).
const INPUT_MARKER: usize = 0;
/// Byte offset in the stack region of the RUN countdown.
const RUN_COUNTER: usize = 4;

fn emit_str(platform: &mut dyn Platform, text: &str) {
    for b in text.bytes() {
        platform.emit(b);
    }
}

fn skip_spaces(code: &[u8], pos: &mut usize) {
    while code.get(*pos) == Some(&b' ') {
        *pos += 1;
    }
}

/// Variables A, B, C, ... stored as little-endian `i32` in the value region.
pub struct Vars<'a> {
    values: &'a mut [u8],
}

impl<'a> Vars<'a> {
    pub fn new(arena: &'a mut Arena) -> Self {
        Self {
            values: arena.region_mut(Region::Value),
        }
    }

    pub fn count(&self) -> usize {
        self.values.len() / 4
    }

    fn term(&mut self, code: &[u8], pos: &mut usize) -> StatementResult<Value> {
        skip_spaces(code, pos);
        let start = *pos;
        match code.get(*pos) {
            Some(b) if b.is_ascii_uppercase() => {
                let index = self.variable_slot(code, pos)?;
                self.variable(index)
            }
            Some(b'-' | b'0'..=b'9') => {
                *pos += 1;
                while code.get(*pos).is_some_and(u8::is_ascii_digit) {
                    *pos += 1;
                }
                std::str::from_utf8(&code[start..*pos])
                    .ok()
                    .and_then(|text| text.parse().ok())
                    .ok_or(StatementError::Syntax { pos: start })
            }
            _ => Err(StatementError::Syntax { pos: start }),
        }
    }
}

impl Interpreter for Vars<'_> {
    fn eval(&mut self, code: &[u8], pos: &mut usize) -> StatementResult<Value> {
        let mut value = self.term(code, pos)?;
        while code.get(*pos) == Some(&b'+') {
            *pos += 1;
            value = value.wrapping_add(self.term(code, pos)?);
        }
        Ok(value)
    }

    fn variable_slot(&mut self, code: &[u8], pos: &mut usize) -> StatementResult<usize> {
        skip_spaces(code, pos);
        match code.get(*pos) {
            Some(b) if b.is_ascii_uppercase() => {
                let index = usize::from(b - b'A');
                if index >= self.count() {
                    return Err(StatementError::Variable { index });
                }
                *pos += 1;
                Ok(index)
            }
            _ => Err(StatementError::Syntax { pos: *pos }),
        }
    }

    fn variable(&self, index: usize) -> StatementResult<Value> {
        let bytes = self
            .values
            .get(index * 4..index * 4 + 4)
            .ok_or(StatementError::Variable { index })?;
        Ok(Value::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn set_variable(&mut self, index: usize, value: Value) -> StatementResult {
        let slot = self
            .values
            .get_mut(index * 4..index * 4 + 4)
            .ok_or(StatementError::Variable { index })?;
        slot.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

/// Reads variable `name` (a single upper-case letter) straight out of an arena.
pub fn read_var(arena: &Arena, name: char) -> Value {
    let index = (name as usize) - ('A' as usize);
    let bytes = &arena.region(Region::Value)[index * 4..index * 4 + 4];
    Value::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_counter(arena: &Arena) -> Value {
    let bytes = &arena.region(Region::Stack)[RUN_COUNTER..RUN_COUNTER + 4];
    Value::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn write_counter(arena: &mut Arena, value: Value) {
    arena.region_mut(Region::Stack)[RUN_COUNTER..RUN_COUNTER + 4].copy_from_slice(&value.to_le_bytes());
}

/// The stored listing: `"<line> <text>\n"` records, zero-padded.
fn listing(arena: &Arena) -> &[u8] {
    let code = arena.region(Region::Code);
    let end = code.iter().position(|&b| b == 0).unwrap_or(code.len());
    &code[..end]
}

/// Appends a record to the listing. Returns `false` if the code region is full.
fn append_line(arena: &mut Arena, record: &[u8]) -> bool {
    let end = listing(arena).len();
    let code = arena.region_mut(Region::Code);
    if end + record.len() > code.len() {
        return false;
    }
    code[end..end + record.len()].copy_from_slice(record);
    true
}

/// Small interpreter used to drive sessions end to end.
///
/// Statements: `<n> <text>` (store line), `LIST`, `NEW`, `PRINT <expr>`, `LET X=<expr>`,
/// `INPUT X`, `RUN <n>` (count down one step per quantum), `SAVE <name>`, `LOAD <name>`,
/// `STOP`, and any extension command in the table.
#[derive(Debug, Default)]
pub struct TinyBasic {
    /// Number of `init` calls.
    pub inits: usize,
    /// State tags `process` was entered with.
    pub entered: Vec<ExecutionState>,
}

impl TinyBasic {
    pub fn new() -> Self {
        Self::default()
    }

    fn quantum(arena: &mut Arena, platform: &mut dyn Platform) -> ExecutionState {
        let counter = read_counter(arena);
        if counter <= 0 {
            return ExecutionState::Halted;
        }
        emit_str(platform, &format!("{counter}\n"));
        write_counter(arena, counter - 1);
        if counter == 1 {
            ExecutionState::Halted
        } else {
            ExecutionState::Running
        }
    }

    fn resume_input(arena: &mut Arena, pending: &mut Option<Value>) -> ExecutionState {
        let marker = arena.region(Region::Stack)[INPUT_MARKER];
        if marker == 0 {
            return ExecutionState::Repl;
        }
        let Some(value) = pending.take() else {
            return ExecutionState::AwaitingInput;
        };
        let mut vars = Vars::new(arena);
        if vars.set_variable(usize::from(marker - 1), value).is_err() {
            return ExecutionState::Halted;
        }
        arena.region_mut(Region::Stack)[INPUT_MARKER] = 0;
        ExecutionState::Repl
    }

    fn statement(machine: &mut Machine<'_>, code: &[u8]) -> StatementResult<ExecutionState> {
        let mut pos = 0;
        skip_spaces(code, &mut pos);
        let rest = &code[pos..];

        if rest.is_empty() {
            return Ok(ExecutionState::Repl);
        }
        if rest[0].is_ascii_digit() {
            let mut record = rest.to_vec();
            record.push(b'\n');
            if !append_line(machine.arena, &record) {
                emit_str(machine.platform, "?MEMORY\n");
            }
            return Ok(ExecutionState::Repl);
        }

        if let Some(handler) = machine.commands.match_keyword(code, &mut pos) {
            let mut line: LineNumber = 0;
            let mut state = ExecutionState::Repl;
            let mut vars = Vars::new(machine.arena);
            let mut cx = CommandContext {
                line: &mut line,
                code,
                pos: &mut pos,
                state: &mut state,
                interpreter: &mut vars,
                platform: &mut *machine.platform,
            };
            handler(&mut cx)?;
            return Ok(state);
        }

        let word_end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
        let (word, mut pos) = (&rest[..word_end], pos + word_end);
        match word {
            b"LIST" => {
                let text = String::from_utf8_lossy(listing(machine.arena)).into_owned();
                emit_str(machine.platform, &text);
                Ok(ExecutionState::Repl)
            }
            b"NEW" => {
                machine.arena.region_mut(Region::Code).fill(0);
                Ok(ExecutionState::Repl)
            }
            b"STOP" => Ok(ExecutionState::Halted),
            b"PRINT" => {
                let value = Vars::new(machine.arena).eval(code, &mut pos)?;
                emit_str(machine.platform, &format!("{value}\n"));
                Ok(ExecutionState::Repl)
            }
            b"LET" => {
                let mut vars = Vars::new(machine.arena);
                let index = vars.variable_slot(code, &mut pos)?;
                if code.get(pos) != Some(&b'=') {
                    return Err(StatementError::Syntax { pos });
                }
                pos += 1;
                let value = vars.eval(code, &mut pos)?;
                vars.set_variable(index, value)?;
                Ok(ExecutionState::Repl)
            }
            b"INPUT" => {
                let index = Vars::new(machine.arena).variable_slot(code, &mut pos)?;
                machine.arena.region_mut(Region::Stack)[INPUT_MARKER] = u8::try_from(index + 1).unwrap_or(0);
                emit_str(machine.platform, "? ");
                Ok(ExecutionState::AwaitingInput)
            }
            b"RUN" => {
                let count = Vars::new(machine.arena).eval(code, &mut pos)?;
                write_counter(machine.arena, count);
                Ok(Self::quantum(machine.arena, machine.platform))
            }
            b"SAVE" => {
                let name = String::from_utf8_lossy(&code[pos..]).trim().to_owned();
                if machine.platform.open(&name, FileMode::Write).is_err() {
                    return Err(StatementError::Engine("?FILE".into()));
                }
                let text = listing(machine.arena).to_vec();
                let mut failed = false;
                for record in text.split(|&b| b == b'\n').filter(|r| !r.is_empty()) {
                    let space = record.iter().position(|&b| b == b' ').unwrap_or(record.len());
                    let number: LineNumber = std::str::from_utf8(&record[..space])
                        .ok()
                        .and_then(|n| n.parse().ok())
                        .unwrap_or(0);
                    let body = record.get(space + 1..).unwrap_or_default();
                    if machine.platform.write_line(number, body).is_err() {
                        failed = true;
                        break;
                    }
                }
                machine.platform.close();
                if failed {
                    return Err(StatementError::Engine("?FULL".into()));
                }
                Ok(ExecutionState::Repl)
            }
            b"LOAD" => {
                let name = String::from_utf8_lossy(&code[pos..]).trim().to_owned();
                if machine.platform.open(&name, FileMode::Read).is_err() {
                    return Err(StatementError::Engine("?FILE".into()));
                }
                machine.arena.region_mut(Region::Code).fill(0);
                while let Some(line) = machine.platform.read_line() {
                    let mut record = line.to_vec();
                    record.push(b'\n');
                    if !append_line(machine.arena, &record) {
                        break;
                    }
                }
                machine.platform.close();
                Ok(ExecutionState::Repl)
            }
            _ => Err(StatementError::Syntax { pos: 0 }),
        }
    }
}

impl Engine for TinyBasic {
    fn init(&mut self, arena: &mut Arena) {
        self.inits += 1;
        arena.clear();
    }

    fn process(&mut self, mut machine: Machine<'_>) -> ExecutionState {
        self.entered.push(machine.state);
        match machine.state {
            ExecutionState::Running => {
                if read_counter(machine.arena) <= 0 {
                    return ExecutionState::Repl;
                }
                Self::quantum(machine.arena, machine.platform)
            }
            ExecutionState::AwaitingInput => Self::resume_input(machine.arena, machine.pending_input),
            ExecutionState::Repl | ExecutionState::Halted => {
                let code = machine.input.to_ascii_uppercase();
                match Self::statement(&mut machine, &code) {
                    Ok(state) => state,
                    Err(StatementError::Engine(msg)) => {
                        emit_str(machine.platform, &format!("{msg}\n"));
                        ExecutionState::Halted
                    }
                    Err(err) => {
                        emit_str(machine.platform, &format!("?{err}\n"));
                        ExecutionState::Halted
                    }
                }
            }
        }
    }
}

/// Prints its input back and stays at the prompt.
#[derive(Debug, Default)]
pub struct EchoEngine {
    pub calls: usize,
}

impl Engine for EchoEngine {
    fn init(&mut self, _arena: &mut Arena) {}

    fn process(&mut self, machine: Machine<'_>) -> ExecutionState {
        self.calls += 1;
        for &b in machine.input {
            machine.platform.emit(b);
        }
        ExecutionState::Repl
    }
}

/// Records the tag of every call and the pending value it took.
///
/// Stays at `AwaitingInput` until a value arrives with the `AwaitingInput` tag.
#[derive(Debug, Default)]
pub struct InputLog {
    pub seen: Vec<(ExecutionState, Option<Value>)>,
}

impl Engine for InputLog {
    fn init(&mut self, _arena: &mut Arena) {}

    fn process(&mut self, machine: Machine<'_>) -> ExecutionState {
        let taken = machine.pending_input.take();
        self.seen.push((machine.state, taken));
        match (machine.state, taken) {
            (ExecutionState::AwaitingInput, None) => ExecutionState::AwaitingInput,
            (ExecutionState::AwaitingInput, Some(_)) => ExecutionState::Repl,
            _ if machine.input == b"INPUT" => ExecutionState::AwaitingInput,
            _ => ExecutionState::Repl,
        }
    }
}

/// Bridge that records every call. IMPORT returns `channel * channel + 1`.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    pub imports: Vec<Value>,
    pub exports: Vec<(Value, Value)>,
}

impl RecordingBridge {
    pub fn transform(channel: Value) -> Value {
        channel * channel + 1
    }
}

impl NumericBridge for RecordingBridge {
    fn import(&mut self, channel: Value) -> Value {
        self.imports.push(channel);
        Self::transform(channel)
    }

    fn export(&mut self, channel: Value, value: Value) {
        self.exports.push((channel, value));
    }
}
