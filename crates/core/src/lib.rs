//! objtool-core
//!
//! Core library for reporting control-flow validation findings on object
//! files.
//!
//! This crate defines the object model (sections, symbols, instructions), a
//! symbol table with containment lookups, a goblin-backed ELF loader, and the
//! diagnostics layer that renders `symbol+0xoffset` locations and throttles
//! repeated warnings per symbol.
//!
//! Deciding *what* is worth a warning is left to the analysis passes that
//! call in here.

pub mod model;
pub mod elf;
pub mod diag;
pub mod report;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
