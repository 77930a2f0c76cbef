//! Command-line argument parsing and the assemble-to-file driver.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use y86_asm::assembler::render_lines;
use y86_asm::{Assembler, AssemblyResult, LabelPolicy, ResourceLimits};

/// Extension of the default output file.
pub const OUTPUT_EXTENSION: &str = "bin";

#[derive(Parser, Debug)]
#[command(
    name = "y86asm",
    version,
    about = "Assemble Y86-64 source into a hex image"
)]
pub struct Cli {
    /// Assembly source file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        long_help = "Write the image to FILE. Defaults to the input path with a .bin extension."
    )]
    pub output: Option<PathBuf>,
    #[arg(
        short = 'l',
        long = "listing",
        action = ArgAction::SetTrue,
        long_help = "Print an address listing (address, hex word, statement) to stdout."
    )]
    pub listing: bool,
    #[arg(
        long = "no-compact",
        action = ArgAction::SetTrue,
        long_help = "Write one hex word per line instead of grouping nop runs."
    )]
    pub no_compact: bool,
    #[arg(
        long = "best-effort",
        action = ArgAction::SetTrue,
        long_help = "Encode undefined labels as address 0 and report them as warnings."
    )]
    pub best_effort: bool,
    #[arg(
        long = "max-image-bytes",
        value_name = "N",
        long_help = "Reject programs whose image would exceed N bytes."
    )]
    pub max_image_bytes: Option<usize>,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        long_help = "Raise log verbosity (-v debug, -vv trace). RUST_LOG overrides."
    )]
    pub verbose: u8,
}

impl Cli {
    /// Where the image is written.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }

    /// Log filter implied by `-v`.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    fn limits(&self) -> ResourceLimits {
        let mut limits = ResourceLimits::default();
        if let Some(max) = self.max_image_bytes {
            limits.max_image_bytes = max;
        }
        limits
    }

    fn label_policy(&self) -> LabelPolicy {
        if self.best_effort {
            LabelPolicy::BestEffort
        } else {
            LabelPolicy::Strict
        }
    }
}

/// `prog.ys` becomes `prog.bin`, next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// Assemble source text according to the command-line options.
pub fn assemble_source(cli: &Cli, source: &str) -> Result<AssemblyResult> {
    let mut asm = Assembler::new();
    asm.limits(cli.limits()).label_policy(cli.label_policy());
    asm.emit(source)?;
    Ok(asm.finish()?)
}

/// Image text for the chosen output mode.
pub fn image_text(cli: &Cli, result: &AssemblyResult) -> String {
    if cli.no_compact {
        render_lines(result.words())
    } else {
        result.image_text()
    }
}

/// Read, assemble, and write. Returns the path written.
///
/// Nothing is written when assembly fails.
pub fn run(cli: &Cli) -> Result<PathBuf> {
    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let result = assemble_source(cli, &source)
        .with_context(|| format!("assembling {}", cli.input.display()))?;

    for diag in result.diagnostics() {
        log::warn!("{}: {}", cli.input.display(), diag);
    }
    if cli.listing {
        print!("{}", result.listing());
    }

    let path = cli.output_path();
    fs::write(&path, image_text(cli, &result))
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("{} bytes, {} labels", result.image_len(), result.labels().len());
    Ok(path)
}
