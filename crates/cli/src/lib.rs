use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use objtool_core::diag::DiagOptions;
use objtool_core::report::FindingSet;

pub mod commands;

/// Read a findings document, picking YAML or JSON from the file extension.
///
/// Anything that isn't `.yaml`/`.yml` is treated as JSON.
pub fn load_findings(path: &Path) -> Result<FindingSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read findings file: {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse findings YAML: {}", path.display()))
    } else {
        FindingSet::from_json_str(&text)
            .with_context(|| format!("Failed to parse findings JSON: {}", path.display()))
    }
}

/// Combine an optional JSON config file with command-line switches.
///
/// A switch set on either side is set in the result.
pub fn load_diag_options(config: Option<&Path>, flags: DiagOptions) -> Result<DiagOptions> {
    let Some(path) = config else { return Ok(flags) };

    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let file: DiagOptions =
        serde_json::from_str(&json).context("Failed to parse diagnostics config JSON")?;

    Ok(DiagOptions {
        werror: file.werror || flags.werror,
        verbose: file.verbose || flags.verbose,
        backtrace: file.backtrace || flags.backtrace,
        sec_address: file.sec_address || flags.sec_address,
    })
}
