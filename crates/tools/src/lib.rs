//! Banyan Tools
//!
//! CLI tools for compiling DSL sources into DAR archives and evaluating them.

use std::path::Path;

use banyan_compiler::{SourceError, SourceLibrary};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info` for banyan crates and `debug` for the tools themselves.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,banyan_tools=debug,banyan_compiler=info,banyan_runtime=info")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Read DSL sources from a directory or a `.zip` archive.
pub fn load_sources(path: &Path) -> Result<SourceLibrary, SourceError> {
    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if is_zip {
        SourceLibrary::from_zip(path)
    } else {
        SourceLibrary::from_dir(path)
    }
}
