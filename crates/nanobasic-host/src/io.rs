use std::{borrow::Cow, fmt};

/// Host-side observer of the output sink.
///
/// Implement this trait to mirror output into the host as it happens, e.g. to
/// forward each character to a terminal widget. Both hooks default to no-ops.
pub trait OutputListener: fmt::Debug {
    /// Called for every byte the engine emits, including bytes dropped because
    /// the buffer is full.
    fn on_char(&mut self, _ch: u8) {}

    /// Called when a complete output unit is ready to be read.
    ///
    /// # Arguments
    /// * `output` - The buffered output accumulated since the last reset.
    fn on_flush(&mut self, _output: &[u8]) {}
}

/// `OutputListener` that ignores everything. The host polls the buffer instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoListener;

impl OutputListener for NoListener {}

/// Bounded buffer collecting the characters printed by the engine.
///
/// The buffer holds at most `capacity` bytes. Anything emitted past that point is
/// silently dropped: running out of room degrades output, it never fails the
/// statement that printed it. The buffer is cleared at the start of every host
/// call, so the host always reads exactly what the last call produced.
#[derive(Debug)]
pub struct OutputSink {
    buffer: Vec<u8>,
    capacity: usize,
    /// Bytes dropped since the last reset.
    dropped: usize,
    /// Flush notifications sent since construction.
    flushes: usize,
    listener: Box<dyn OutputListener>,
}

impl OutputSink {
    /// Creates an empty sink that keeps at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_listener(capacity, NoListener)
    }

    /// Creates an empty sink that reports to `listener`.
    #[must_use]
    pub fn with_listener(capacity: usize, listener: impl OutputListener + 'static) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
            flushes: 0,
            listener: Box::new(listener),
        }
    }

    /// Replaces the listener.
    pub fn set_listener(&mut self, listener: impl OutputListener + 'static) {
        self.listener = Box::new(listener);
    }

    /// Appends one byte, or drops it if the buffer is full.
    pub fn emit(&mut self, ch: u8) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(ch);
        } else {
            if self.dropped == 0 {
                tracing::debug!(capacity = self.capacity, "output buffer full, truncating");
            }
            self.dropped += 1;
        }
        self.listener.on_char(ch);
    }

    /// Appends every byte of `text`.
    pub fn emit_str(&mut self, text: &str) {
        for &ch in text.as_bytes() {
            self.emit(ch);
        }
    }

    /// Signals the listener that the current output unit is complete.
    ///
    /// The buffer itself is left as is.
    pub fn flush(&mut self) {
        self.flushes += 1;
        self.listener.on_flush(&self.buffer);
    }

    /// Clears the buffer and the dropped-byte counter.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.dropped = 0;
    }

    /// The buffered output.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// The buffered output as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes dropped since the last reset.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of flush notifications sent so far.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl fmt::Write for OutputSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.emit_str(s);
        Ok(())
    }
}
