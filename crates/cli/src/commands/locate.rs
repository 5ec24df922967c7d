use std::path::Path;

use anyhow::{anyhow, Context, Result};
use objtool_core::diag::offstr;
use objtool_core::elf::ObjectFile;

/// Resolve `section`+`offset` in the object at `object` to its display form.
pub fn resolve_location(
    object: &Path,
    section: &str,
    offset: u64,
    sec_address: bool,
) -> Result<String> {
    let obj = ObjectFile::load(object)
        .with_context(|| format!("Failed to load object {}", object.display()))?;
    let sec = obj
        .section_by_name(section)
        .ok_or_else(|| anyhow!("Section '{}' not found in {}", section, object.display()))?;

    Ok(offstr(&obj, sec, offset, sec_address).into_string())
}

/// Print the resolved location on stdout.
pub fn locate_command(object: &Path, section: &str, offset: u64, sec_address: bool) -> Result<()> {
    println!("{}", resolve_location(object, section, offset, sec_address)?);
    Ok(())
}
