//! Compiler configuration.

use std::path::PathBuf;

use crate::error::CompilationError;

/// Settings for one compilation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Directory the DAR archive is written to. Created if missing.
    pub output_dir: PathBuf,
}

impl CompilerConfig {
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), CompilationError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CompilationError::InvalidConfig(
                "output_dir must not be empty".to_string(),
            ));
        }
        if self.output_dir.is_file() {
            return Err(CompilationError::InvalidConfig(format!(
                "output_dir {} is a file",
                self.output_dir.display()
            )));
        }
        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("target"),
        }
    }
}
