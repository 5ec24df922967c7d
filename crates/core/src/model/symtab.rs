use std::collections::{BTreeMap, HashMap};

use super::{Section, SectionId, Symbol, SymbolId, SymbolKind};

/// Containment queries the diagnostics layer needs from a symbol table.
pub trait SymbolLookup {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// Innermost function symbol in `sec` whose range covers `offset`.
    fn find_func_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol>;

    /// Innermost symbol of any kind (except section and file symbols)
    /// whose range covers `offset`.
    fn find_symbol_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol>;
}

/// A symbol lookup that can also resolve the sections its instructions
/// refer to; what the per-instruction diagnostics need.
pub trait ObjectLookup: SymbolLookup {
    fn section(&self, id: SectionId) -> Option<&Section>;
}

/// Owns every symbol of an object and indexes them per section by start offset.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_section: HashMap<SectionId, BTreeMap<u64, Vec<SymbolId>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.by_section
            .entry(symbol.section)
            .or_default()
            .entry(symbol.offset)
            .or_default()
            .push(id);
        self.symbols.push(symbol);
        id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(idx, sym)| (SymbolId(idx), sym))
    }

    pub fn find_by_name(&self, name: &str) -> Option<(SymbolId, &Symbol)> {
        self.iter().find(|(_, sym)| sym.name == name)
    }

    /// Id of the function symbol covering `offset`, used to attribute
    /// instructions to their function.
    pub fn func_id_containing(&self, sec: SectionId, offset: u64) -> Option<SymbolId> {
        self.find_containing(sec, offset, Symbol::is_func).map(|(id, _)| id)
    }

    /// Walks start offsets downward from `offset` so the nearest preceding
    /// candidate is tried first. Same-offset ties keep insertion order.
    fn find_containing(
        &self,
        sec: SectionId,
        offset: u64,
        accept: impl Fn(&Symbol) -> bool,
    ) -> Option<(SymbolId, &Symbol)> {
        let index = self.by_section.get(&sec)?;
        index
            .range(..=offset)
            .rev()
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.symbols.get(id.0).map(|sym| (*id, sym)))
            .find(|(_, sym)| accept(sym) && sym.contains(offset))
    }
}

impl SymbolLookup for SymbolTable {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0)
    }

    fn find_func_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol> {
        self.find_containing(sec.id, offset, Symbol::is_func).map(|(_, sym)| sym)
    }

    fn find_symbol_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol> {
        self.find_containing(sec.id, offset, |sym| {
            !matches!(sym.kind, SymbolKind::Section | SymbolKind::File)
        })
        .map(|(_, sym)| sym)
    }
}
