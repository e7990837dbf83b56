//! Best-effort diagnostic snapshots of the live page.
//!
//! Nothing in here returns an error. A capture that cannot be written is
//! logged and skipped so that the failure being diagnosed stays the one the
//! caller reports.

use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::session::FormSession;

/// Paths of the artifacts a capture actually wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureResult {
    pub saved_artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct FailureCapture {
    artifact_dir: PathBuf,
}

impl FailureCapture {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }

    #[must_use]
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    /// Screenshot and markup dump, each attempted independently
    pub async fn capture<S: FormSession>(&self, session: &S, label: &str) -> CaptureResult {
        let stem = artifact_stem(label);
        let mut saved_artifacts = Vec::with_capacity(2);

        match session.screenshot().await {
            Ok(png) => {
                if let Some(path) = self.write(&stem, "png", &png).await {
                    saved_artifacts.push(path);
                }
            }
            Err(e) => warn!("Screenshot capture for '{label}' failed: {e}"),
        }

        match session.content().await {
            Ok(html) => {
                if let Some(path) = self.write(&stem, "html", html.as_bytes()).await {
                    saved_artifacts.push(path);
                }
            }
            Err(e) => warn!("Markup capture for '{label}' failed: {e}"),
        }

        if !saved_artifacts.is_empty() {
            info!(
                "Captured {} artifact(s) for '{label}' in {}",
                saved_artifacts.len(),
                self.artifact_dir.display()
            );
        }
        CaptureResult { saved_artifacts }
    }

    /// Save markup that was already read, e.g. the results page
    pub async fn save_markup(&self, html: &str, label: &str) -> Option<PathBuf> {
        self.write(&artifact_stem(label), "html", html.as_bytes())
            .await
    }

    async fn write(&self, stem: &str, extension: &str, bytes: &[u8]) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.artifact_dir).await {
            warn!(
                "Cannot create artifact directory {}: {e}",
                self.artifact_dir.display()
            );
            return None;
        }
        let path = self.artifact_dir.join(format!("{stem}.{extension}"));
        match tokio::fs::write(&path, bytes).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write artifact {}: {e}", path.display());
                None
            }
        }
    }
}

/// `<UTC timestamp>_<sanitised label>`
fn artifact_stem(label: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let cleaned = sanitize_filename::sanitize(label).replace(char::is_whitespace, "_");
    let cleaned = if cleaned.is_empty() {
        "capture".to_string()
    } else {
        cleaned
    };
    format!("{timestamp}_{cleaned}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_is_timestamped_and_sanitised() {
        let stem = artifact_stem("step 2/fuel: failed");
        let (timestamp, label) = stem.split_once('_').expect("timestamp prefix");

        assert!(timestamp.ends_with('Z'));
        assert!(timestamp.contains('T'));
        assert!(!label.contains('/'));
        assert!(!label.contains(' '));
        assert!(label.contains("fuel"));
    }

    #[test]
    fn empty_label_still_names_a_file() {
        assert!(artifact_stem("").ends_with("_capture"));
    }
}
