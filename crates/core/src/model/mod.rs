//! Core data model for sections, symbols, and decoded instructions.
//!
//! These types are thin: the object loader fills them in, the
//! symbol table indexes them, and the diagnostics layer only reads them
//! (apart from the per-symbol warning counter).

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

pub mod symtab;

pub use symtab::{ObjectLookup, SymbolLookup, SymbolTable};

/// ELF `SHF_EXECINSTR` section flag.
pub const SHF_EXECINSTR: u64 = 0x4;

/// Index of a section inside its owning [`crate::elf::ObjectFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub usize);

/// Index of a symbol inside its owning [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub usize);

/// A named, flagged region of an object file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    /// Raw `sh_flags`.
    pub flags: u64,
    pub size: u64,
}

impl Section {
    pub fn new(id: SectionId, name: impl Into<String>, flags: u64, size: u64) -> Self {
        Self { id, name: name.into(), flags, size }
    }

    pub fn is_executable(&self) -> bool {
        self.flags & SHF_EXECINSTR != 0
    }
}

/// Symbol classification, collapsed from the ELF `STT_*` values we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    NoType,
    Object,
    Func,
    Section,
    File,
}

/// A named location within a section.
///
/// `warnings` is the only field mutated after loading; see
/// [`Symbol::try_bump_warnings`].
#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    pub section: SectionId,
    /// Offset of the symbol's first byte within its section.
    pub offset: u64,
    pub len: u64,
    pub kind: SymbolKind,
    warnings: AtomicU32,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        section: SectionId,
        offset: u64,
        len: u64,
        kind: SymbolKind,
    ) -> Self {
        Self { name: name.into(), section, offset, len, kind, warnings: AtomicU32::new(0) }
    }

    /// Shorthand for a function symbol.
    pub fn func(name: impl Into<String>, section: SectionId, offset: u64, len: u64) -> Self {
        Self::new(name, section, offset, len, SymbolKind::Func)
    }

    pub fn is_func(&self) -> bool {
        self.kind == SymbolKind::Func
    }

    /// Whether `offset` (section-relative) falls inside `[offset, offset + len)`.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.offset && offset - self.offset < self.len
    }

    /// Number of warnings recorded against this symbol so far.
    pub fn warnings(&self) -> u32 {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Atomically increments the counter if it is `<= ceiling`.
    ///
    /// Returns the value observed before the increment, or `None` once the
    /// counter has passed `ceiling` (it is left untouched in that case).
    pub fn try_bump_warnings(&self, ceiling: u32) -> Option<u32> {
        self.warnings
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n <= ceiling).then_some(n + 1)
            })
            .ok()
    }
}

/// A decoded instruction, as handed to the diagnostics layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub section: SectionId,
    pub offset: u64,
    /// Symbol the instruction is attributed to, if any.
    pub symbol: Option<SymbolId>,
}

impl Instruction {
    pub fn new(section: SectionId, offset: u64, symbol: Option<SymbolId>) -> Self {
        Self { section, offset, symbol }
    }
}
