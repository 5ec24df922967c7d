use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use objtool_core::diag::{DiagOptions, Emitter};
use objtool_core::elf::ObjectFile;
use objtool_core::report::{replay, ReplaySummary};
use objtool_core::warn_elf;

use crate::{load_diag_options, load_findings};

/// Inputs for `objtool report`.
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub object: PathBuf,
    pub findings: PathBuf,
    pub config: Option<PathBuf>,
    /// Switches given on the command line.
    pub flags: DiagOptions,
}

/// Replay findings against an object, writing diagnostics to stderr.
pub fn report_command(args: &ReportArgs) -> Result<ReplaySummary> {
    report_to(args, io::stderr())
}

/// Same as [`report_command`], writing diagnostics to `out`.
///
/// With `werror`, any reported finding turns into a failure once all
/// findings have been written. Backtrace lines alone never fail the run.
pub fn report_to<W: Write>(args: &ReportArgs, out: W) -> Result<ReplaySummary> {
    let opts = load_diag_options(args.config.as_deref(), args.flags)?;
    let objname = args.object.display().to_string();
    let mut emitter = Emitter::new(out, objname, opts);

    let obj = match ObjectFile::load(&args.object) {
        Ok(obj) => obj,
        Err(err) => {
            warn_elf!(emitter, err, "can't load {}", args.object.display());
            return Err(err).context("Failed to load object for report");
        }
    };

    let set = load_findings(&args.findings)?;
    let summary = replay(&mut emitter, &obj, &set.findings)
        .with_context(|| format!("Invalid findings in {}", args.findings.display()))?;

    if opts.werror && summary.reported > 0 {
        bail!("{} diagnostic(s) reported as errors", summary.reported);
    }
    Ok(summary)
}
