//! Payload file source.

use std::path::{Path, PathBuf};

use super::{JobSource, SourceError, parse_payload};
use crate::models::FetchPayload;

/// Reads a saved payload from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JobSource for FileSource {
    async fn fetch(&self) -> Result<FetchPayload, SourceError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
        parse_payload(&body)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
