//! Fixed-capacity interpreter memory.
//!
//! The engine keeps everything it needs to resume a suspended program (stored code,
//! variables, GOSUB/FOR stack, program counter) inside this arena. Because the arena
//! is plain bytes owned by the session, resumption never depends on a native call
//! frame surviving between host calls.

use std::ops::Range;

/// One of the three partitions of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Region {
    /// Tokenized program text.
    Code,
    /// Variables and other numeric values.
    Value,
    /// Call stack for GOSUB/FOR frames.
    Stack,
}

/// Sizes of the three arena partitions, in bytes.
///
/// Regions are laid out back to back in the order code, value, stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArenaLayout {
    pub code: usize,
    pub value: usize,
    pub stack: usize,
}

impl ArenaLayout {
    #[must_use]
    pub const fn new(code: usize, value: usize, stack: usize) -> Self {
        Self { code, value, stack }
    }

    /// Total arena size in bytes.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.code + self.value + self.stack
    }

    /// Byte range of `region` within the arena.
    #[must_use]
    pub const fn range(&self, region: Region) -> Range<usize> {
        match region {
            Region::Code => 0..self.code,
            Region::Value => self.code..self.code + self.value,
            Region::Stack => self.code + self.value..self.total(),
        }
    }
}

/// The interpreter memory arena.
///
/// Allocated once with the size given by its [`ArenaLayout`] and never resized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    layout: ArenaLayout,
    bytes: Vec<u8>,
}

impl Arena {
    /// Allocates a zero-filled arena.
    #[must_use]
    pub fn new(layout: ArenaLayout) -> Self {
        Self {
            layout,
            bytes: vec![0; layout.total()],
        }
    }

    #[must_use]
    pub fn layout(&self) -> ArenaLayout {
        self.layout
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole arena, all regions included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Read access to one region.
    #[must_use]
    pub fn region(&self, region: Region) -> &[u8] {
        &self.bytes[self.layout.range(region)]
    }

    /// Write access to one region.
    pub fn region_mut(&mut self, region: Region) -> &mut [u8] {
        let range = self.layout.range(region);
        &mut self.bytes[range]
    }

    /// Zero-fills every region.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Overwrites the arena contents with `bytes`.
    ///
    /// Returns `false` and leaves the arena untouched if the length differs.
    pub(crate) fn load(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() != self.bytes.len() {
            return false;
        }
        self.bytes.copy_from_slice(bytes);
        true
    }
}
