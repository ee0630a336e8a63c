use crate::{
    config::SessionConfig,
    engine::{LineNumber, Value},
    io::OutputSink,
    store::KeyValueStore,
    vfs::{FileError, FileMode, VirtualFs},
};

/// Host capabilities available to the engine while it runs.
///
/// This is the single seam through which the engine reaches the outside world:
/// printing, program files, and the numeric bridge used by IMPORT/EXPORT. The
/// session injects a [`HostPlatform`]; engine unit tests can substitute any other
/// implementation.
pub trait Platform {
    /// Prints one character.
    fn emit(&mut self, ch: u8);

    /// Marks the end of an output unit.
    fn flush(&mut self);

    /// Opens a program file. Fails if a file is already open.
    fn open(&mut self, name: &str, mode: FileMode) -> Result<(), FileError>;

    /// Reads the next line of the open file, or `None` at end of file.
    fn read_line(&mut self) -> Option<&[u8]>;

    /// Appends one program line to the open file.
    fn write_line(&mut self, line: LineNumber, text: &[u8]) -> Result<(), FileError>;

    /// Closes the open file, persisting it if it was opened for write.
    fn close(&mut self);

    /// Fetches a value from the host on `channel`.
    fn import(&mut self, channel: Value) -> Value;

    /// Sends `value` to the host on `channel`.
    fn export(&mut self, channel: Value, value: Value);
}

/// Host-side numeric transforms behind the IMPORT and EXPORT statements.
pub trait NumericBridge {
    /// Returns the value for `channel`.
    fn import(&mut self, channel: Value) -> Value;

    /// Receives `value` on `channel`.
    fn export(&mut self, channel: Value, value: Value);
}

/// Reference bridge: IMPORT returns twice the channel number, EXPORT discards.
#[derive(Debug, Default, Clone, Copy)]
pub struct DoublingBridge;

impl NumericBridge for DoublingBridge {
    fn import(&mut self, channel: Value) -> Value {
        channel.wrapping_mul(2)
    }

    fn export(&mut self, _channel: Value, _value: Value) {}
}

/// The platform a session hands to its engine.
///
/// Bundles the [`OutputSink`], the [`VirtualFs`] over the host's store, and the
/// [`NumericBridge`].
#[derive(Debug)]
pub struct HostPlatform<S, B = DoublingBridge> {
    sink: OutputSink,
    files: VirtualFs<S>,
    bridge: B,
}

impl<S: KeyValueStore> HostPlatform<S> {
    /// Creates a platform over `store` with buffers sized by `config`.
    #[must_use]
    pub fn new(store: S, config: &SessionConfig) -> Self {
        Self::with_bridge(store, config, DoublingBridge)
    }
}

impl<S: KeyValueStore, B: NumericBridge> HostPlatform<S, B> {
    /// Creates a platform with a custom numeric bridge.
    #[must_use]
    pub fn with_bridge(store: S, config: &SessionConfig, bridge: B) -> Self {
        Self {
            sink: OutputSink::new(config.output_capacity),
            files: VirtualFs::new(store, config.file_capacity, config.max_file_name),
            bridge,
        }
    }

    #[must_use]
    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut OutputSink {
        &mut self.sink
    }

    #[must_use]
    pub fn files(&self) -> &VirtualFs<S> {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut VirtualFs<S> {
        &mut self.files
    }

    #[must_use]
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Shorthand for the underlying key-value store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.files.store()
    }
}

impl<S: KeyValueStore, B: NumericBridge> Platform for HostPlatform<S, B> {
    fn emit(&mut self, ch: u8) {
        self.sink.emit(ch);
    }

    fn flush(&mut self) {
        self.sink.flush();
    }

    fn open(&mut self, name: &str, mode: FileMode) -> Result<(), FileError> {
        self.files.open(name, mode)
    }

    fn read_line(&mut self) -> Option<&[u8]> {
        self.files.read_line()
    }

    fn write_line(&mut self, line: LineNumber, text: &[u8]) -> Result<(), FileError> {
        self.files.write_line(line, text)
    }

    fn close(&mut self) {
        self.files.close();
    }

    fn import(&mut self, channel: Value) -> Value {
        self.bridge.import(channel)
    }

    fn export(&mut self, channel: Value, value: Value) {
        self.bridge.export(channel, value);
    }
}
