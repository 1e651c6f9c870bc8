use std::path::{Path, PathBuf};

use tokio::fs;

use crate::core::bibs::{BatchReport, BibError};

/// Writes the outcome of a run to a JSON file for later inspection.
pub struct JsonReportWriter {
    path: PathBuf,
}

impl JsonReportWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub async fn write(&self, report: &BatchReport) -> Result<(), BibError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BibError::Report(e.to_string()))?;
        }

        let text =
            serde_json::to_string_pretty(report).map_err(|e| BibError::Report(e.to_string()))?;
        fs::write(&self.path, text)
            .await
            .map_err(|e| BibError::Report(e.to_string()))?;

        tracing::info!("Run report written to {}", self.path.display());
        Ok(())
    }
}
