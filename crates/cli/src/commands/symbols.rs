use std::path::Path;

use anyhow::{Context, Result};
use objtool_core::elf::ObjectFile;
use objtool_core::model::SymbolKind;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SectionRow {
    pub name: String,
    pub flags: u64,
    pub size: u64,
    pub executable: bool,
}

#[derive(Debug, Serialize)]
pub struct SymbolRow {
    pub name: String,
    pub kind: SymbolKind,
    pub section: String,
    pub offset: u64,
    pub len: u64,
}

#[derive(Debug, Serialize)]
pub struct SymbolListing {
    pub object: String,
    pub sections: Vec<SectionRow>,
    pub symbols: Vec<SymbolRow>,
}

/// Collect the sections and symbols the location resolver will see.
pub fn collect_symbols(obj: &ObjectFile) -> SymbolListing {
    let sections = obj
        .sections()
        .iter()
        .filter(|sec| !sec.name.is_empty())
        .map(|sec| SectionRow {
            name: sec.name.clone(),
            flags: sec.flags,
            size: sec.size,
            executable: sec.is_executable(),
        })
        .collect();

    let mut symbols: Vec<SymbolRow> = obj
        .symbols()
        .iter()
        .map(|(_, sym)| SymbolRow {
            name: sym.name.clone(),
            kind: sym.kind,
            section: obj.section(sym.section).map(|sec| sec.name.clone()).unwrap_or_default(),
            offset: sym.offset,
            len: sym.len,
        })
        .collect();
    symbols.sort_by(|a, b| (&a.section, a.offset, &a.name).cmp(&(&b.section, b.offset, &b.name)));

    SymbolListing { object: obj.name().to_string(), sections, symbols }
}

/// List sections and symbols of an object.
pub fn symbols_command(object: &Path, json: bool) -> Result<()> {
    let obj = ObjectFile::load(object)
        .with_context(|| format!("Failed to load object {}", object.display()))?;
    let listing = collect_symbols(&obj);

    if json {
        let serialized = serde_json::to_string_pretty(&listing)
            .context("Failed to serialize symbols to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Sections ({}):", listing.sections.len());
    for sec in &listing.sections {
        let exec = if sec.executable { " [exec]" } else { "" };
        println!("  - {} size=0x{:x} flags=0x{:x}{}", sec.name, sec.size, sec.flags, exec);
    }

    println!("Symbols ({}):", listing.symbols.len());
    if listing.symbols.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for sym in &listing.symbols {
        println!(
            "  - {} [{:?}] {}+0x{:x} len=0x{:x}",
            sym.name, sym.kind, sym.section, sym.offset, sym.len
        );
    }

    Ok(())
}
