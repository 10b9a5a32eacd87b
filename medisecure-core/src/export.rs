//! Credential export
//!
//! Serializes the issued smartcard to a downloadable JSON artifact. Purely
//! derived from the session context; never mutates auth state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::protocol::SmartCard;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export file: {0}")]
    WriteError(#[from] std::io::Error),
}

/// The exported document: capture timestamp plus the raw card material
#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    timestamp: String,
    user_credentials: &'a SmartCard,
}

/// A rendered export, ready to be written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub contents: String,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, returning the full path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        Ok(path)
    }
}

/// Render the export for the given card; `None` card means nothing to export
pub fn export_card(card: Option<&SmartCard>, now: DateTime<Utc>) -> Option<ExportArtifact> {
    let card = card?;

    let document = ExportDocument {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        user_credentials: card,
    };

    // Serialization of a string-only struct cannot fail
    let contents = serde_json::to_string_pretty(&document)
        .unwrap_or_else(|_| String::from("{}"));

    Some(ExportArtifact {
        file_name: format!("smartcard-credentials-{}.json", now.timestamp_millis()),
        contents,
    })
}
