use crate::model::Symbol;

/// Normal warnings allowed per symbol before the duplicate notice.
pub const WARN_LIMIT: u32 = 2;

const _: () = assert!(WARN_LIMIT <= 2, "WARN_LIMIT must not exceed 2");

/// What the per-instruction warning path should do for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Write the caller's message.
    Emit,
    /// Write the one-off "skipping duplicate warning(s)" line instead.
    SkipNotice,
    /// Write nothing.
    Silent,
}

/// Consult and advance the symbol's warning counter.
///
/// Instructions without a symbol are never throttled. For a symbol the
/// sequence is `WARN_LIMIT` x `Emit`, one `SkipNotice`, then `Silent`; the
/// counter check and increment happen as a single atomic step.
pub fn gate(sym: Option<&Symbol>) -> Gate {
    let Some(sym) = sym else { return Gate::Emit };

    match sym.try_bump_warnings(WARN_LIMIT) {
        Some(seen) if seen < WARN_LIMIT => Gate::Emit,
        Some(_) => {
            log::debug!("{}: warning limit reached, suppressing duplicates", sym.name);
            Gate::SkipNotice
        }
        None => Gate::Silent,
    }
}
