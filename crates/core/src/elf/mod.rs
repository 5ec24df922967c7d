//! ELF object loading.
//!
//! Produces the section list and symbol table the diagnostics layer resolves
//! against. Parsing is done by goblin; we only keep what location rendering
//! needs (names, flags, section-relative offsets and sizes).

use std::fs;
use std::path::{Path, PathBuf};

use goblin::elf::{header, section_header, sym, Elf};
use goblin::Object;
use thiserror::Error;

use crate::model::{
    Instruction, ObjectLookup, Section, SectionId, Symbol, SymbolId, SymbolKind, SymbolLookup,
    SymbolTable,
};

#[derive(Debug, Error)]
pub enum ElfError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Parser failure; the message is what gets appended to ELF warnings.
    #[error("{0}")]
    Parse(#[from] goblin::error::Error),
    #[error("{0}: not an ELF object")]
    NotElf(String),
}

/// Sections and symbols of one object under analysis.
#[derive(Debug, Default)]
pub struct ObjectFile {
    name: String,
    sections: Vec<Section>,
    symbols: SymbolTable,
}

impl ObjectFile {
    /// Empty object, for building models by hand.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), sections: Vec::new(), symbols: SymbolTable::new() }
    }

    /// Read and parse an ELF file. The object's name is the path as given.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ElfError> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|source| ElfError::Io { path: path.to_path_buf(), source })?;
        Self::parse(path.display().to_string(), &bytes)
    }

    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self, ElfError> {
        let name = name.into();
        match Object::parse(bytes)? {
            Object::Elf(elf) => Ok(Self::from_elf(name, &elf)),
            _ => Err(ElfError::NotElf(name)),
        }
    }

    fn from_elf(name: String, elf: &Elf) -> Self {
        let mut obj = Self::new(name);

        // Section ids mirror ELF section indices, including the null section.
        for shdr in &elf.section_headers {
            let sec_name = elf.shdr_strtab.get_at(shdr.sh_name).unwrap_or("");
            obj.add_section(sec_name, shdr.sh_flags, shdr.sh_size);
        }

        let relocatable = elf.header.e_type == header::ET_REL;
        for s in elf.syms.iter() {
            let shndx = s.st_shndx;
            if shndx == section_header::SHN_UNDEF as usize
                || shndx >= section_header::SHN_LORESERVE as usize
            {
                continue;
            }
            let Some(shdr) = elf.section_headers.get(shndx) else { continue };

            let kind = match s.st_type() {
                sym::STT_FUNC => SymbolKind::Func,
                sym::STT_OBJECT => SymbolKind::Object,
                sym::STT_SECTION => SymbolKind::Section,
                sym::STT_FILE => SymbolKind::File,
                _ => SymbolKind::NoType,
            };
            let sym_name = if kind == SymbolKind::Section {
                obj.sections[shndx].name.clone()
            } else {
                elf.strtab.get_at(s.st_name).unwrap_or("").to_string()
            };
            // Linked images carry virtual addresses; make them section-relative.
            let offset =
                if relocatable { s.st_value } else { s.st_value.saturating_sub(shdr.sh_addr) };

            obj.add_symbol(Symbol::new(sym_name, SectionId(shndx), offset, s.st_size, kind));
        }

        log::debug!(
            "loaded {}: {} sections, {} symbols",
            obj.name,
            obj.sections.len(),
            obj.symbols.len()
        );
        obj
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_section(&mut self, name: impl Into<String>, flags: u64, size: u64) -> SectionId {
        let id = SectionId(self.sections.len());
        self.sections.push(Section::new(id, name, flags, size));
        id
    }

    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        self.symbols.insert(symbol)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|sec| sec.name == name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Instruction record at `offset`, attributed to its containing function
    /// the same way the decoder does.
    pub fn instruction_at(&self, section: SectionId, offset: u64) -> Instruction {
        Instruction::new(section, offset, self.symbols.func_id_containing(section, offset))
    }
}

impl SymbolLookup for ObjectFile {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.symbol(id)
    }

    fn find_func_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol> {
        self.symbols.find_func_containing(sec, offset)
    }

    fn find_symbol_containing(&self, sec: &Section, offset: u64) -> Option<&Symbol> {
        self.symbols.find_symbol_containing(sec, offset)
    }
}

impl ObjectLookup for ObjectFile {
    fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }
}
