use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use objtool::commands::{locate_command, report_command, symbols_command, ReportArgs};
use objtool_core::diag::DiagOptions;
use objtool_core::report::parse_offset;

/// Object-file diagnostics CLI.
///
/// This CLI is a thin wrapper around `objtool-core` (exposed in code as
/// `objtool_core`). Location rendering, warning throttling and the ELF
/// loader all live in the library.
#[derive(Parser, Debug)]
#[command(
    name = "objtool",
    version,
    about = "Render and throttle control-flow validation diagnostics",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the symbolic location of a section offset (e.g. `foo+0x10`).
    Locate {
        /// Object file to inspect.
        object: PathBuf,

        /// Section name, e.g. `.text`.
        #[arg(long)]
        section: String,

        /// Section-relative offset, decimal or `0x`-prefixed hex.
        #[arg(long, value_parser = parse_offset_arg)]
        offset: u64,

        /// Also print the raw `section+0xoffset` form.
        #[arg(long, default_value_t = false)]
        sec_address: bool,
    },

    /// List the sections and symbols used for location lookups.
    Symbols {
        /// Object file to inspect.
        object: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Replay a findings file (JSON or YAML) as diagnostics on stderr.
    ///
    /// Per-instruction findings are limited to two warnings per function,
    /// followed by a single "skipping duplicate warning(s)" line.
    Report {
        /// Object file the findings refer to.
        object: PathBuf,

        /// Findings document (`.json`, `.yaml` or `.yml`).
        #[arg(long)]
        findings: PathBuf,

        /// Optional JSON file with diagnostic switches.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report findings as errors and exit non-zero if any were printed.
        #[arg(long, default_value_t = false)]
        werror: bool,

        /// Verbose output; includes backtrace lines.
        #[arg(long, default_value_t = false)]
        verbose: bool,

        /// Print backtrace lines.
        #[arg(long, default_value_t = false)]
        backtrace: bool,

        /// Append the raw `section+0xoffset` to symbolic locations.
        #[arg(long, default_value_t = false)]
        sec_address: bool,
    },
}

fn parse_offset_arg(text: &str) -> Result<u64, String> {
    parse_offset(text).map_err(|e| format!("invalid offset '{text}': {e}"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Locate { object, section, offset, sec_address } => {
            locate_command(&object, &section, offset, sec_address)?
        }
        Command::Symbols { object, json } => symbols_command(&object, json)?,
        Command::Report {
            object,
            findings,
            config,
            werror,
            verbose,
            backtrace,
            sec_address,
        } => {
            let args = ReportArgs {
                object,
                findings,
                config,
                flags: DiagOptions { werror, verbose, backtrace, sec_address },
            };
            let summary = report_command(&args)?;
            log::info!("{} findings, {} diagnostic lines", summary.findings, summary.lines);
        }
    }

    Ok(())
}
