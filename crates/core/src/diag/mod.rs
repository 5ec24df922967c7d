//! Diagnostic rendering and throttling.
//!
//! Every line has the shape `<objname>: <severity>: objtool: <message>`.
//! Located variants prefix the message with a [`Location`]; the
//! per-instruction variant is rate limited per symbol (see [`limit`]); the
//! backtrace variant only fires in verbose/backtrace mode.
//!
//! The emitter writes to any [`Write`] sink so tests can capture output;
//! the CLI uses standard error.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::model::{Instruction, ObjectLookup, Section, SymbolLookup};

pub mod limit;
pub mod location;

pub use limit::{gate, Gate, WARN_LIMIT};
pub use location::{offstr, Location};

/// Switches that change how diagnostics are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagOptions {
    /// Report findings as errors instead of warnings.
    pub werror: bool,
    pub verbose: bool,
    pub backtrace: bool,
    /// Append the raw `section+0xoffset` to symbolic locations.
    pub sec_address: bool,
}

impl DiagOptions {
    /// Whether backtrace lines are written at all.
    pub fn tracing(&self) -> bool {
        self.verbose || self.backtrace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn from_options(opts: &DiagOptions) -> Self {
        if opts.werror {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line-oriented diagnostic writer for one object.
pub struct Emitter<W: Write> {
    objname: String,
    opts: DiagOptions,
    out: W,
    emitted: usize,
    reported: usize,
}

impl Emitter<io::Stderr> {
    pub fn stderr(objname: impl Into<String>, opts: DiagOptions) -> Self {
        Self::new(io::stderr(), objname, opts)
    }
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W, objname: impl Into<String>, opts: DiagOptions) -> Self {
        Self { objname: objname.into(), opts, out, emitted: 0, reported: 0 }
    }

    pub fn options(&self) -> &DiagOptions {
        &self.opts
    }

    pub fn severity(&self) -> Severity {
        Severity::from_options(&self.opts)
    }

    /// Lines successfully written so far, backtrace lines included.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Finding lines written so far; backtrace lines are context and
    /// don't count.
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Plain, unlocated diagnostic.
    pub fn warn(&mut self, args: fmt::Arguments<'_>) {
        if self.write_line(args) {
            self.reported += 1;
        }
    }

    fn write_line(&mut self, args: fmt::Arguments<'_>) -> bool {
        let severity = self.severity();
        match writeln!(self.out, "{}: {}: objtool: {}", self.objname, severity, args) {
            Ok(()) => {
                self.emitted += 1;
                true
            }
            // Nowhere left to report it; keep analysing.
            Err(err) => {
                log::debug!("dropped diagnostic line: {err}");
                false
            }
        }
    }

    /// Diagnostic with the ELF parser's error text appended.
    pub fn warn_elf(&mut self, err: &dyn fmt::Display, args: fmt::Arguments<'_>) {
        self.warn(format_args!("{args}: {err}"));
    }

    /// Diagnostic prefixed with the resolved location of `sec`+`offset`.
    pub fn warn_func(
        &mut self,
        lookup: &dyn SymbolLookup,
        sec: &Section,
        offset: u64,
        args: fmt::Arguments<'_>,
    ) {
        let loc = offstr(lookup, sec, offset, self.opts.sec_address);
        self.warn(format_args!("{loc}: {args}"));
    }

    /// Per-instruction diagnostic, throttled per symbol.
    ///
    /// An instruction pointing at a section the object doesn't have is
    /// reported without a location rather than dropped.
    pub fn warn_insn<L: ObjectLookup>(
        &mut self,
        obj: &L,
        insn: &Instruction,
        args: fmt::Arguments<'_>,
    ) {
        let sym = insn.symbol.and_then(|id| obj.symbol(id));

        match (gate(sym), obj.section(insn.section)) {
            (Gate::Silent, _) => {}
            (Gate::Emit, Some(sec)) => self.warn_func(obj, sec, insn.offset, args),
            (Gate::SkipNotice, Some(sec)) => {
                self.warn_func(obj, sec, insn.offset, format_args!("skipping duplicate warning(s)"))
            }
            (Gate::Emit, None) => self.warn(args),
            (Gate::SkipNotice, None) => self.warn(format_args!("skipping duplicate warning(s)")),
        }
    }

    /// Indented backtrace line; does nothing unless verbose or backtrace
    /// mode is on, and resolves no location in that case.
    pub fn bt_insn<L: ObjectLookup>(
        &mut self,
        obj: &L,
        insn: &Instruction,
        args: fmt::Arguments<'_>,
    ) {
        if !self.opts.tracing() {
            return;
        }
        match obj.section(insn.section) {
            Some(sec) => {
                let loc = offstr(obj, sec, insn.offset, self.opts.sec_address);
                self.write_line(format_args!("  {loc}: {args}"));
            }
            None => {
                self.write_line(format_args!("  {args}"));
            }
        }
    }
}

/// `objwarn!(emitter, "fmt", args...)` — plain diagnostic.
#[macro_export]
macro_rules! objwarn {
    ($emitter:expr, $($arg:tt)+) => {
        $emitter.warn(::std::format_args!($($arg)+))
    };
}

/// `warn_func!(emitter, lookup, section, offset, "fmt", args...)`.
#[macro_export]
macro_rules! warn_func {
    ($emitter:expr, $lookup:expr, $sec:expr, $offset:expr, $($arg:tt)+) => {
        $emitter.warn_func($lookup, $sec, $offset, ::std::format_args!($($arg)+))
    };
}

/// `warn_insn!(emitter, object, insn, "fmt", args...)`.
#[macro_export]
macro_rules! warn_insn {
    ($emitter:expr, $obj:expr, $insn:expr, $($arg:tt)+) => {
        $emitter.warn_insn($obj, $insn, ::std::format_args!($($arg)+))
    };
}

/// `bt_insn!(emitter, object, insn, "fmt", args...)`.
#[macro_export]
macro_rules! bt_insn {
    ($emitter:expr, $obj:expr, $insn:expr, $($arg:tt)+) => {
        $emitter.bt_insn($obj, $insn, ::std::format_args!($($arg)+))
    };
}

/// `warn_elf!(emitter, err, "fmt", args...)`.
#[macro_export]
macro_rules! warn_elf {
    ($emitter:expr, $err:expr, $($arg:tt)+) => {
        $emitter.warn_elf(&$err, ::std::format_args!($($arg)+))
    };
}
