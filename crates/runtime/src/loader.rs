//! DAR loading
//!
//! Reads every entry of an archive in one pass. Artifact entries are routed
//! by their `<Kind>/<version>/<id>.json` path to the mapping of that kind;
//! the envelope inside must agree with the path. Entries that fit neither
//! the artifact layout nor the manifest name fail the load. The manifest
//! and the artifact entries must list exactly the same files, and the root
//! challenge named in the manifest header must be among them.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use banyan_foundation::dar::{self, DarManifest, MANIFEST_FILE};
use banyan_foundation::CompiledArtifact;
use tracing::{debug, info, trace};

use crate::context::DarRuntimeContext;
use crate::error::{Error, Result};

/// Loads DAR archives into runtime contexts.
pub struct DarLoader;

impl DarLoader {
    /// Load the archive at `path`.
    pub fn load(path: &Path) -> Result<DarRuntimeContext> {
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let context = Self::load_from_reader(file)?;
        info!(
            archive = %path.display(),
            root = %context.root_key(),
            artifacts = context.len(),
            "DAR loaded"
        );
        Ok(context)
    }

    /// Load an archive from any seekable reader.
    pub fn load_from_reader<R: Read + Seek>(reader: R) -> Result<DarRuntimeContext> {
        let mut archive = zip::ZipArchive::new(reader)?;

        let mut manifest: Option<DarManifest> = None;
        let mut artifacts = Vec::with_capacity(archive.len());
        let mut seen = BTreeSet::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut text = String::new();
            entry.read_to_string(&mut text).map_err(|source| Error::Io {
                path: name.clone().into(),
                source,
            })?;

            if name == MANIFEST_FILE {
                manifest = Some(parse(&name, &text)?);
                continue;
            }

            let expected =
                dar::parse_entry_path(&name).map_err(|_| Error::UnroutableEntry(name.clone()))?;
            let artifact: CompiledArtifact = parse(&name, &text)?;
            if artifact.reference() != expected {
                return Err(Error::EntryMismatch {
                    path: name,
                    found: artifact.reference().to_string(),
                });
            }
            trace!(entry = %name, "artifact entry read");
            seen.insert(name);
            artifacts.push(artifact);
        }

        let manifest = manifest.ok_or(Error::MissingManifest)?;
        if let Some(missing) = manifest.files.iter().find(|f| !seen.contains(*f)) {
            return Err(Error::MissingEntry(missing.clone()));
        }
        let listed: BTreeSet<&String> = manifest.files.iter().collect();
        if let Some(unlisted) = seen.iter().find(|name| !listed.contains(name)) {
            return Err(Error::UnlistedEntry(unlisted.clone()));
        }

        let mut builder = DarRuntimeContext::builder(manifest.header);
        for artifact in artifacts {
            builder.insert(artifact);
        }
        let context = builder.build();
        let root = context.root_key();
        if context.challenge(&root).is_err() {
            return Err(Error::MissingRoot(root.to_string()));
        }
        debug!(artifacts = context.len(), "runtime context built");
        Ok(context)
    }
}

fn parse<T: serde::de::DeserializeOwned>(path: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| Error::InvalidEntry {
        path: path.to_string(),
        source,
    })
}
