//! Compile Banyan DSL sources into a DAR archive.
//!
//! Usage: `banyan-compile <sources> --root-kind KIND --root-id ID [--root-version N] [--out-dir DIR]`

use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn};

use banyan_compiler::{CompilationRoot, CompilerConfig, Orchestrator};
use banyan_foundation::ArtifactKind;

#[derive(Parser, Debug)]
#[command(name = "banyan-compile")]
#[command(about = "Compile Banyan DSL sources into a DAR archive")]
struct Args {
    /// Directory of JSON sources, or a .zip of them
    sources: PathBuf,

    /// Kind of the root artifact
    #[arg(long = "root-kind", default_value = "Challenge")]
    root_kind: ArtifactKind,

    /// Id of the root artifact
    #[arg(long = "root-id")]
    root_id: String,

    /// Version of the root artifact
    #[arg(long = "root-version", default_value_t = 1)]
    root_version: u32,

    /// Directory the archive is written to
    #[arg(long = "out-dir", default_value = "target")]
    out_dir: PathBuf,
}

fn main() {
    banyan_tools::init_logging();

    let args = Args::parse();

    let library = match banyan_tools::load_sources(&args.sources) {
        Ok(library) => library,
        Err(e) => {
            error!("Failed to read sources from {}: {}", args.sources.display(), e);
            process::exit(1);
        }
    };

    let root = CompilationRoot::new(args.root_kind, args.root_id, args.root_version);
    let config = CompilerConfig::with_output_dir(args.out_dir);
    let report = Orchestrator::run(&library, root, &config);

    if !report.is_success() {
        error!("{}", report.format_diagnostics().trim_end());
        process::exit(1);
    }

    if !report.diagnostics.is_empty() {
        warn!("{}", report.format_diagnostics().trim_end());
    }

    info!(
        "Compiled {} artifacts, {} reachable from {} in {:?}",
        report.compiled_total(),
        report.reachable_count,
        report.root,
        report.timings.total()
    );
    if let Some(archive) = &report.archive {
        info!("Wrote DAR to {}", archive.display());
    }
}
