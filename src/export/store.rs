//! Model artifact persistence
//!
//! The bundle is written as bincode of a versioned envelope. Writes go to a
//! temporary file in the target directory which is then renamed over the
//! artifact, so readers never observe a partial file.

use crate::error::{LoanError, Result};
use crate::inference::TrainedBundle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Artifact layout version
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    bundle: &'a TrainedBundle,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    bundle: TrainedBundle,
}

/// Single-file store for the trained bundle
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Atomically replace the artifact with `bundle`
    pub fn save(&self, bundle: &TrainedBundle) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let bytes = bincode::serialize(&ArtifactRef {
            format_version: FORMAT_VERSION,
            bundle,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Saved model artifact");
        Ok(())
    }

    /// Load the artifact. A missing file is a cold start, not an error.
    pub fn load(&self) -> Result<Option<TrainedBundle>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let artifact: Artifact = bincode::deserialize(&bytes)?;
        if artifact.format_version != FORMAT_VERSION {
            return Err(LoanError::SerializationError(format!(
                "Unsupported artifact version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }
        Ok(Some(artifact.bundle))
    }
}
