//! Virtual file subsystem.
//!
//! The engine's SAVE/LOAD commands expect sequential, line-at-a-time file access, but
//! the host only offers a [`KeyValueStore`] with whole-value get/set. This module
//! bridges the two with buffer-at-a-time I/O:
//!
//! - opening for read materializes the entire stored value, and `read_line` walks a
//!   cursor over it;
//! - opening for write starts an empty bounded buffer, `write_line` appends
//!   `"<line> <text>\n"` records to it, and `close` stores the whole buffer under the
//!   file name in one `set`.
//!
//! Storage is memory-bounded, not streaming: a listing that does not fit the write
//! buffer cannot be saved, and that surfaces as a [`FileError::Overflow`] from
//! `write_line` rather than as silently truncated text.

use std::fmt;

use crate::{engine::LineNumber, store::KeyValueStore};

/// Longest line `read_line` returns. Longer lines are truncated, not split.
pub const MAX_LINE_LEN: usize = 255;

/// Access mode of an open virtual file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum FileMode {
    Read,
    Write,
}

/// Failure of a virtual file operation.
///
/// None of these leave the subsystem in a changed state: a failed `open` keeps any
/// already-open file as it was, and a failed `write_line` leaves the write buffer
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    /// Another file is open. Only one file may be open at a time.
    AlreadyOpen { name: String },
    /// The operation needs an open file.
    NotOpen,
    /// The open file was opened in the other mode.
    WrongMode { expected: FileMode, actual: FileMode },
    /// The file name was empty.
    EmptyName,
    /// The file name exceeds the configured maximum.
    NameTooLong { len: usize, max: usize },
    /// Appending the record would exceed the write buffer.
    Overflow { needed: usize, capacity: usize },
    /// The text would span more than one record.
    LineBreak { line: LineNumber },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyOpen { name } => write!(f, "file '{name}' is already open"),
            Self::NotOpen => f.write_str("no file is open"),
            Self::WrongMode { expected, actual } => {
                write!(f, "file is open for {actual}, operation needs {expected}")
            }
            Self::EmptyName => f.write_str("file name is empty"),
            Self::NameTooLong { len, max } => write!(f, "file name is {len} bytes, maximum is {max}"),
            Self::Overflow { needed, capacity } => {
                write!(f, "file buffer overflow: {needed} bytes > {capacity} bytes")
            }
            Self::LineBreak { line } => write!(f, "text of line {line} contains a line break"),
        }
    }
}

impl std::error::Error for FileError {}

/// The single open-file slot.
#[derive(Debug)]
enum OpenFile {
    Read { name: String, data: Vec<u8>, cursor: usize },
    Write { name: String, buffer: Vec<u8> },
}

impl OpenFile {
    fn name(&self) -> &str {
        match self {
            Self::Read { name, .. } | Self::Write { name, .. } => name,
        }
    }

    fn mode(&self) -> FileMode {
        match self {
            Self::Read { .. } => FileMode::Read,
            Self::Write { .. } => FileMode::Write,
        }
    }
}

/// Sequential file emulation over a whole-value [`KeyValueStore`].
#[derive(Debug)]
pub struct VirtualFs<S> {
    store: S,
    open: Option<OpenFile>,
    /// Shared buffer `read_line` copies each line into.
    scratch: Vec<u8>,
    /// Write buffer capacity in bytes.
    capacity: usize,
    max_name: usize,
}

impl<S: KeyValueStore> VirtualFs<S> {
    /// Creates a subsystem over `store` with the given write capacity and name limit.
    #[must_use]
    pub fn new(store: S, capacity: usize, max_name: usize) -> Self {
        Self {
            store,
            open: None,
            scratch: Vec::with_capacity(MAX_LINE_LEN),
            capacity,
            max_name,
        }
    }

    /// Opens `name` for reading or writing.
    ///
    /// A missing key opens as an empty file: at this layer "not found" and "empty"
    /// are the same thing.
    pub fn open(&mut self, name: &str, mode: FileMode) -> Result<(), FileError> {
        if let Some(file) = &self.open {
            return Err(FileError::AlreadyOpen {
                name: file.name().to_owned(),
            });
        }
        if name.is_empty() {
            return Err(FileError::EmptyName);
        }
        if name.len() > self.max_name {
            return Err(FileError::NameTooLong {
                len: name.len(),
                max: self.max_name,
            });
        }

        let name = name.to_owned();
        self.open = Some(match mode {
            FileMode::Read => {
                let data = self.store.get(&name).unwrap_or_default();
                tracing::debug!(file = %name, bytes = data.len(), "opened virtual file for read");
                OpenFile::Read { name, data, cursor: 0 }
            }
            FileMode::Write => {
                tracing::debug!(file = %name, "opened virtual file for write");
                OpenFile::Write {
                    name,
                    buffer: Vec::with_capacity(self.capacity),
                }
            }
        });
        Ok(())
    }

    /// Reads the next line, without its newline.
    ///
    /// Returns `None` at end of file, and also when no file is open or the open file
    /// is in write mode. Lines longer than [`MAX_LINE_LEN`] are truncated to that
    /// length and the rest of the line is skipped.
    ///
    /// The returned slice borrows a scratch buffer that the next call overwrites.
    pub fn read_line(&mut self) -> Option<&[u8]> {
        let Some(OpenFile::Read { data, cursor, .. }) = &mut self.open else {
            return None;
        };
        if *cursor >= data.len() {
            return None;
        }

        let rest = &data[*cursor..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(newline) => (&rest[..newline], newline + 1),
            None => (rest, rest.len()),
        };
        let kept = &line[..line.len().min(MAX_LINE_LEN)];

        self.scratch.clear();
        self.scratch.extend_from_slice(kept);
        *cursor += consumed;
        Some(self.scratch.as_slice())
    }

    /// Appends the record `"<line> <text>\n"` to the open write-mode file.
    ///
    /// Records are appended in call order; line numbers are neither sorted nor
    /// de-duplicated. `text` must not contain `\n`, so that every call adds
    /// exactly one record.
    pub fn write_line(&mut self, line: LineNumber, text: &[u8]) -> Result<(), FileError> {
        let capacity = self.capacity;
        let buffer = match &mut self.open {
            None => return Err(FileError::NotOpen),
            Some(OpenFile::Read { .. }) => {
                return Err(FileError::WrongMode {
                    expected: FileMode::Write,
                    actual: FileMode::Read,
                });
            }
            Some(OpenFile::Write { buffer, .. }) => buffer,
        };
        if text.contains(&b'\n') {
            return Err(FileError::LineBreak { line });
        }

        let prefix = format!("{line} ");
        let needed = buffer.len() + prefix.len() + text.len() + 1;
        if needed > capacity {
            tracing::warn!(line, needed, capacity, "virtual file write rejected, buffer full");
            return Err(FileError::Overflow { needed, capacity });
        }

        buffer.extend_from_slice(prefix.as_bytes());
        buffer.extend_from_slice(text);
        buffer.push(b'\n');
        Ok(())
    }

    /// Closes the open file.
    ///
    /// A write-mode file is stored under its name, replacing any previous value.
    /// A read-mode file is discarded. Closing with nothing open does nothing.
    /// Returns the name of the file that was closed.
    pub fn close(&mut self) -> Option<String> {
        match self.open.take()? {
            OpenFile::Read { name, .. } => {
                tracing::debug!(file = %name, "closed virtual file");
                Some(name)
            }
            OpenFile::Write { name, buffer } => {
                tracing::debug!(file = %name, bytes = buffer.len(), "persisting virtual file");
                self.store.set(&name, buffer);
                Some(name)
            }
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Name of the open file.
    #[must_use]
    pub fn open_name(&self) -> Option<&str> {
        self.open.as_ref().map(OpenFile::name)
    }

    /// Mode of the open file.
    #[must_use]
    pub fn mode(&self) -> Option<FileMode> {
        self.open.as_ref().map(OpenFile::mode)
    }

    /// Contents written so far to the open write-mode file.
    #[must_use]
    pub fn write_buffer(&self) -> Option<&[u8]> {
        match &self.open {
            Some(OpenFile::Write { buffer, .. }) => Some(buffer.as_slice()),
            _ => None,
        }
    }

    /// Write buffer capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consumes the subsystem, discarding any open file, and returns the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}
