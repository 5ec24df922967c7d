//! Replaying externally detected findings through the emitter.
//!
//! A findings document lists what an analysis pass flagged; each entry is
//! routed to the matching emitter operation so the usual rendering and
//! per-symbol throttling apply.

use std::io::Write;
use std::num::ParseIntError;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::diag::Emitter;
use crate::elf::ObjectFile;
use crate::model::SectionId;

/// Which emitter operation a finding goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Unlocated line.
    Warn,
    /// Located line, never throttled.
    Func,
    /// Per-instruction line, throttled per containing function.
    Insn,
    /// Backtrace line, only shown in verbose/backtrace mode.
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Section-relative byte offset; accepts `272` or `"0x110"`.
    #[serde(default, deserialize_with = "deserialize_offset")]
    pub offset: u64,
    pub message: String,
}

/// Top-level findings document (JSON or YAML).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSet {
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl FindingSet {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("finding {index}: unknown section '{name}'")]
    UnknownSection { index: usize, name: String },
    #[error("finding {index}: {kind:?} finding requires a section")]
    MissingSection { index: usize, kind: FindingKind },
}

/// Counts returned by [`replay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub findings: usize,
    /// Diagnostic lines actually written (after throttling).
    pub lines: usize,
    /// Of those, lines that report a finding rather than backtrace context.
    pub reported: usize,
}

/// Parse `0x`-prefixed hex or plain decimal.
pub fn parse_offset(text: &str) -> Result<u64, ParseIntError> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    }
}

fn deserialize_offset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawOffset {
        Number(u64),
        Text(String),
    }

    match RawOffset::deserialize(deserializer)? {
        RawOffset::Number(n) => Ok(n),
        RawOffset::Text(s) => parse_offset(&s).map_err(serde::de::Error::custom),
    }
}

/// Emit every finding in order.
///
/// Section names are checked up front so a bad document produces no
/// partial output.
pub fn replay<W: Write>(
    emitter: &mut Emitter<W>,
    obj: &ObjectFile,
    findings: &[Finding],
) -> Result<ReplaySummary, ReportError> {
    let mut resolved: Vec<Option<SectionId>> = Vec::with_capacity(findings.len());
    for (index, finding) in findings.iter().enumerate() {
        let section = match (&finding.section, finding.kind) {
            (Some(name), _) => Some(
                obj.section_by_name(name)
                    .map(|sec| sec.id)
                    .ok_or_else(|| ReportError::UnknownSection { index, name: name.clone() })?,
            ),
            (None, FindingKind::Warn) => None,
            (None, kind) => return Err(ReportError::MissingSection { index, kind }),
        };
        resolved.push(section);
    }

    let (lines_before, reported_before) = (emitter.emitted(), emitter.reported());
    for (finding, section) in findings.iter().zip(resolved) {
        let msg = finding.message.as_str();
        match (finding.kind, section) {
            (FindingKind::Warn, _) => crate::objwarn!(emitter, "{msg}"),
            (FindingKind::Func, Some(id)) => {
                if let Some(sec) = obj.section(id) {
                    crate::warn_func!(emitter, obj, sec, finding.offset, "{msg}");
                }
            }
            (FindingKind::Insn, Some(id)) => {
                let insn = obj.instruction_at(id, finding.offset);
                crate::warn_insn!(emitter, obj, &insn, "{msg}");
            }
            (FindingKind::Trace, Some(id)) => {
                let insn = obj.instruction_at(id, finding.offset);
                crate::bt_insn!(emitter, obj, &insn, "{msg}");
            }
            // Rejected during resolution above.
            (_, None) => {}
        }
    }

    let summary = ReplaySummary {
        findings: findings.len(),
        lines: emitter.emitted() - lines_before,
        reported: emitter.reported() - reported_before,
    };
    log::debug!(
        "replayed {} findings into {} lines ({} reported)",
        summary.findings,
        summary.lines,
        summary.reported
    );
    Ok(summary)
}
