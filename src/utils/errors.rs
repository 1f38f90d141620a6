use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage at which a browser session failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStage {
    Launch,
    Connect,
    Navigate,
    Ready,
    Capture,
    Close,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStage::Launch => "launch",
            SessionStage::Connect => "connect",
            SessionStage::Navigate => "navigate",
            SessionStage::Ready => "ready",
            SessionStage::Capture => "capture",
            SessionStage::Close => "close",
        };
        f.write_str(name)
    }
}

/// Artifact a persistence failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    OutputDir,
    Html,
    Screenshot,
    Pdf,
    Json,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::OutputDir => "output directory",
            ArtifactKind::Html => "html",
            ArtifactKind::Screenshot => "screenshot",
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Json => "json record",
        };
        f.write_str(name)
    }
}

/// One failed artifact write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    pub artifact: ArtifactKind,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.artifact,
            self.path.display(),
            self.message
        )
    }
}

/// Tag carried in the result envelope next to the flattened message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    SessionFailure,
    ExtractionFailure,
    PersistenceFailure,
}

/// Errors that can occur while scraping a posting
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Browser session failed during {stage}: {message}")]
    Session { stage: SessionStage, message: String },

    #[error("Extraction failed for field '{field}' (selector '{selector}'): {message}")]
    Extraction {
        field: &'static str,
        selector: String,
        message: String,
    },

    #[error("Failed to persist {}", join_failures(.failures))]
    Persistence { failures: Vec<ArtifactFailure> },
}

impl ScrapeError {
    pub fn session(stage: SessionStage, err: impl fmt::Display) -> Self {
        ScrapeError::Session {
            stage,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::InvalidInput(_) => ErrorKind::InvalidInput,
            ScrapeError::Session { .. } => ErrorKind::SessionFailure,
            ScrapeError::Extraction { .. } => ErrorKind::ExtractionFailure,
            ScrapeError::Persistence { .. } => ErrorKind::PersistenceFailure,
        }
    }
}

fn join_failures(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_message_lists_every_artifact() {
        let err = ScrapeError::Persistence {
            failures: vec![
                ArtifactFailure {
                    artifact: ArtifactKind::Html,
                    path: PathBuf::from("out/a.html"),
                    message: "disk full".into(),
                },
                ArtifactFailure {
                    artifact: ArtifactKind::Pdf,
                    path: PathBuf::from("out/a.pdf"),
                    message: "printing failed".into(),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("html (out/a.html): disk full"));
        assert!(msg.contains("pdf (out/a.pdf): printing failed"));
        assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    }

    #[test]
    fn session_message_names_stage() {
        let err = ScrapeError::session(SessionStage::Navigate, "net::ERR_NAME_NOT_RESOLVED");
        assert_eq!(
            err.to_string(),
            "Browser session failed during navigate: net::ERR_NAME_NOT_RESOLVED"
        );
        assert_eq!(err.kind(), ErrorKind::SessionFailure);
    }
}
