//! DAR archive layout
//!
//! A DAR is a ZIP container holding one JSON envelope per artifact at
//! `<Kind>/<version>/<id>.json` plus a `manifests.json` at the root. This
//! module owns the path conventions and the manifest shape; the compiler
//! writes them and the runtime reads them.

use serde::{Deserialize, Serialize};

use crate::error::FoundationError;
use crate::ids::{ArtifactKind, ArtifactReference, validate_id};

/// File name of the manifest at the archive root.
pub const MANIFEST_FILE: &str = "manifests.json";

/// File name of the emitted archive.
pub const ARCHIVE_FILE: &str = "compilation_package.dar";

const ENTRY_EXTENSION: &str = ".json";

/// Relative archive path for an artifact.
pub fn entry_path(kind: ArtifactKind, version: u32, id: &str) -> String {
    format!("{kind}/{version}/{id}{ENTRY_EXTENSION}")
}

/// Relative archive path for a reference.
pub fn reference_path(reference: &ArtifactReference) -> String {
    entry_path(reference.kind, reference.version, &reference.id)
}

/// Inverse of [`entry_path`].
///
/// Exactly three segments; the id in the last one must pass
/// [`validate_id`].
pub fn parse_entry_path(path: &str) -> Result<ArtifactReference, FoundationError> {
    let malformed = || FoundationError::MalformedEntryPath(path.to_string());

    let mut segments = path.split('/');
    let (Some(kind), Some(version), Some(file), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(malformed());
    };

    let kind: ArtifactKind = kind.parse().map_err(|_| malformed())?;
    let version: u32 = version.parse().map_err(|_| malformed())?;
    let id = file.strip_suffix(ENTRY_EXTENSION).ok_or_else(malformed)?;
    validate_id(id).map_err(|_| malformed())?;

    Ok(ArtifactReference::new(kind, id, version))
}

/// Identity and provenance of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestHeader {
    pub root_id: String,
    pub root_version: u32,
    pub compiled_at_epoch_millis: u64,
    pub compiler_version: String,
}

/// Contents of `manifests.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarManifest {
    pub header: ManifestHeader,
    /// Relative paths of every artifact file, sorted.
    pub files: Vec<String>,
}
