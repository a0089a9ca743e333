//! DAR emission
//!
//! Writes the reachable closure of a successful outcome as a DAR: one
//! pretty-printed envelope per artifact at `<Kind>/<version>/<id>.json`,
//! a `manifests.json` at the root, all zipped into
//! `<output_dir>/compilation_package.dar`.
//!
//! Files are staged in a scratch [`TempDir`] that is removed when it goes
//! out of scope, on success and on every error path. The archive itself is
//! written to a temporary file next to its destination and renamed into
//! place once complete, so a failed emit never leaves a partial `.dar`.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use banyan_foundation::dar::{self, ARCHIVE_FILE, DarManifest, MANIFEST_FILE, ManifestHeader};
use banyan_foundation::{ArtifactKind, CompiledArtifact};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::outcome::CompilationOutcome;

/// Why an archive was not produced.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("outcome has {errors} error(s), refusing to emit")]
    UnsuccessfulOutcome { errors: usize },

    #[error("no reachable artifacts, nothing to emit")]
    NothingToEmit,

    #[error("root {0} is not among the reachable artifacts")]
    RootNotReachable(String),

    #[error("archive root {0} is not a challenge")]
    RootNotChallenge(String),

    #[error("artifact path {0} escapes the archive")]
    UnsafeEntryPath(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("scratch directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> EmitError + '_ {
    move |source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Packages compilation outcomes into DAR files.
#[derive(Debug, Clone)]
pub struct DarEmitter {
    output_dir: PathBuf,
}

impl DarEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path the archive is written to.
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(ARCHIVE_FILE)
    }

    /// Emit the outcome's closure. Returns the archive path.
    pub fn emit(&self, outcome: &CompilationOutcome<'_>) -> Result<PathBuf, EmitError> {
        if !outcome.is_success() {
            return Err(EmitError::UnsuccessfulOutcome {
                errors: outcome.errors().len(),
            });
        }
        if outcome.reachable_count() == 0 {
            return Err(EmitError::NothingToEmit);
        }

        let root_ref = outcome.root().reference();
        let root = outcome
            .get(&root_ref)
            .ok_or_else(|| EmitError::RootNotReachable(root_ref.to_string()))?;
        if root.kind() != ArtifactKind::Challenge {
            return Err(EmitError::RootNotChallenge(root_ref.to_string()));
        }

        let scratch = tempfile::Builder::new()
            .prefix("banyan-dar-")
            .tempdir()
            .map_err(io_error(Path::new("<tempdir>")))?;

        let mut files = Vec::with_capacity(outcome.reachable_count());
        for artifact in outcome.reachable_artifacts() {
            files.push(write_envelope(scratch.path(), artifact)?);
        }
        files.sort();

        let manifest = DarManifest {
            header: ManifestHeader {
                root_id: root.id().to_string(),
                root_version: root.version(),
                compiled_at_epoch_millis: root.metadata().compiled_at_epoch_millis,
                compiler_version: root.metadata().compiler_version.clone(),
            },
            files,
        };
        write_json(&scratch.path().join(MANIFEST_FILE), &manifest, MANIFEST_FILE)?;

        fs::create_dir_all(&self.output_dir).map_err(io_error(&self.output_dir))?;
        let archive_path = self.archive_path();
        zip_directory(&scratch, &self.output_dir, &archive_path)?;

        info!(
            archive = %archive_path.display(),
            artifacts = manifest.files.len(),
            root = %root_ref,
            "DAR written"
        );
        Ok(archive_path)
    }
}

fn write_envelope(scratch: &Path, artifact: &CompiledArtifact) -> Result<String, EmitError> {
    let relative = dar::entry_path(artifact.kind(), artifact.version(), artifact.id());
    let contained = dar::parse_entry_path(&relative).is_ok()
        && Path::new(&relative)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !contained {
        return Err(EmitError::UnsafeEntryPath(relative));
    }
    let path = scratch.join(&relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    write_json(&path, artifact, &relative)?;
    debug!(entry = %relative, "staged artifact");
    Ok(relative)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, what: &str) -> Result<(), EmitError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| EmitError::Serialize {
        what: what.to_string(),
        source,
    })?;
    fs::write(path, bytes).map_err(io_error(path))
}

fn zip_directory(
    scratch: &TempDir,
    output_dir: &Path,
    archive_path: &Path,
) -> Result<(), EmitError> {
    let mut staged = tempfile::Builder::new()
        .prefix(".banyan-dar-")
        .suffix(".partial")
        .tempfile_in(output_dir)
        .map_err(io_error(output_dir))?;
    let mut writer = ZipWriter::new(staged.as_file_mut());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(scratch.path()).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(scratch.path()) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{name}/"), options)?;
        } else {
            writer.start_file(name, options)?;
            let mut source = File::open(entry.path()).map_err(io_error(entry.path()))?;
            io::copy(&mut source, &mut writer).map_err(io_error(entry.path()))?;
        }
    }

    writer.finish()?;
    staged.persist(archive_path).map_err(|err| EmitError::Io {
        path: archive_path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}
