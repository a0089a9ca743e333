//! Source documents
//!
//! A source document is a JSON object with top-level `kind`, `id`,
//! `version` and `spec`. [`SourceLibrary`] collects documents from memory,
//! a directory tree or a ZIP file and groups them by kind. Files are read in
//! sorted path order so registration order is deterministic.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use banyan_foundation::ArtifactKind;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Errors raised while collecting source documents.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}: invalid JSON: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}: missing or invalid `{field}`")]
    MissingField { origin: String, field: &'static str },

    #[error("{origin}: unknown kind `{kind}`")]
    UnknownKind { origin: String, kind: String },

    #[error("directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One parsed source document.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub kind: ArtifactKind,
    pub id: String,
    pub version: u32,
    /// The whole document, passed unchanged to the backend compiler.
    pub content: Value,
    /// File path or label the document came from.
    pub origin: String,
}

impl SourceUnit {
    /// Parse a document, reading its identity fields.
    pub fn parse(origin: impl Into<String>, text: &str) -> Result<Self, SourceError> {
        let origin = origin.into();
        let content: Value = serde_json::from_str(text).map_err(|source| SourceError::Json {
            origin: origin.clone(),
            source,
        })?;
        Self::from_value(origin, content)
    }

    pub fn from_value(origin: impl Into<String>, content: Value) -> Result<Self, SourceError> {
        let origin = origin.into();
        let missing = |field| SourceError::MissingField {
            origin: origin.clone(),
            field,
        };

        let kind_name = content.get("kind").and_then(Value::as_str).ok_or_else(|| missing("kind"))?;
        let kind = kind_name.parse().map_err(|_| SourceError::UnknownKind {
            origin: origin.clone(),
            kind: kind_name.to_string(),
        })?;
        let id = content
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing("id"))?
            .to_string();
        let version = content
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v >= 1)
            .ok_or_else(|| missing("version"))?;

        Ok(Self {
            kind,
            id,
            version,
            content,
            origin,
        })
    }
}

/// Source documents grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct SourceLibrary {
    units: BTreeMap<ArtifactKind, Vec<SourceUnit>>,
}

impl SourceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: SourceUnit) {
        self.units.entry(unit.kind).or_default().push(unit);
    }

    /// Build from `(origin, text)` pairs.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut library = Self::new();
        for (origin, text) in sources {
            library.push(SourceUnit::parse(origin, text)?);
        }
        Ok(library)
    }

    /// Load every `*.json` file below `root`, in sorted path order.
    pub fn from_dir(root: &Path) -> Result<Self, SourceError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
            {
                files.push(entry.into_path());
            }
        }
        files.sort();

        let mut library = Self::new();
        for path in files {
            let text = std::fs::read_to_string(&path).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
            library.push(SourceUnit::parse(path.display().to_string(), &text)?);
        }
        info!(root = %root.display(), sources = library.len(), "loaded source directory");
        Ok(library)
    }

    /// Load every `*.json` entry of a ZIP file, in sorted entry-name order.
    pub fn from_zip(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = zip::ZipArchive::new(file)?;

        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() || !entry.name().ends_with(".json") {
                continue;
            }
            let name = entry.name().to_string();
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(|source| SourceError::Io {
                    path: path.join(&name),
                    source,
                })?;
            entries.push((name, text));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut library = Self::new();
        for (name, text) in entries {
            debug!(entry = %name, "read source entry");
            library.push(SourceUnit::parse(format!("{}!{name}", path.display()), &text)?);
        }
        info!(archive = %path.display(), sources = library.len(), "loaded source archive");
        Ok(library)
    }

    /// Units of one kind, in load order.
    pub fn of_kind(&self, kind: ArtifactKind) -> &[SourceUnit] {
        self.units.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// All units, grouped in compilation order.
    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        ArtifactKind::COMPILATION_ORDER
            .into_iter()
            .flat_map(|kind| self.of_kind(kind))
    }

    /// Number of units per kind, in compilation order.
    pub fn counts(&self) -> BTreeMap<ArtifactKind, usize> {
        self.units
            .iter()
            .map(|(kind, units)| (*kind, units.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.units.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
