//! Artifact persistence
//!
//! One file per resolved job, named from the sanitized detail title, under a
//! per-page directory. Writes overwrite, so re-running a page converges to
//! the same tree. The output root is wiped wholesale before a run and never
//! cleaned mid-run.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while persisting an artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("detail response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Replace space and path-separator characters with underscores.
///
/// No further escaping is done; other filesystem-hostile characters pass
/// through unchanged.
pub fn sanitize_title(title: &str) -> String {
    title.replace([' ', '/'], "_")
}

/// Writes job artifacts under a per-page directory tree.
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer rooted at the given output directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding artifacts for one listing page.
    pub fn page_dir(&self, page: u32) -> PathBuf {
        self.root.join(format!("page_{}", page))
    }

    /// Create the page directory if it does not exist yet.
    pub fn ensure_page_dir(&self, page: u32) -> Result<PathBuf, ArtifactError> {
        let dir = self.page_dir(page);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Pretty-print the raw detail response and write it to
    /// `<root>/page_<N>/<filename>`, overwriting any existing file.
    pub fn write_detail(
        &self,
        page: u32,
        filename: &str,
        raw: &[u8],
    ) -> Result<PathBuf, ArtifactError> {
        let dir = self.ensure_page_dir(page)?;
        let pretty = pretty_print(raw)?;

        let path = dir.join(filename);
        std::fs::write(&path, pretty)?;
        Ok(path)
    }
}

/// Re-indent a JSON document with tabs.
fn pretty_print(raw: &[u8]) -> Result<Vec<u8>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(raw)?;

    let mut buf = Vec::with_capacity(raw.len() * 2);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Wipe and recreate the output root so a run starts from an empty tree.
pub fn reset_output_root(root: &Path) -> std::io::Result<()> {
    if root.exists() {
        std::fs::remove_dir_all(root)?;
    }
    std::fs::create_dir_all(root)
}
