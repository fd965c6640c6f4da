//! File encoding — turns local files into base64 payloads ready for a turn.
//!
//! The encoder does not care what the file is; the front end restricts
//! selection to PDFs, the encoder only needs readable bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::AttachmentError;

/// A file selected for the next message, already encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
    pub name: String,
    /// Declared media type, inferred from the file name
    pub media_type: String,
    /// Standard base64, no data-URL prefix
    pub data: String,
}

impl PendingFile {
    /// Decode the payload back into the original bytes.
    pub fn decoded(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64_STANDARD.decode(&self.data)
    }

    /// Size of the original content in bytes.
    pub fn size_bytes(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.data.len() / 4) * 3).saturating_sub(padding)
    }

    /// Build from an already-encoded payload, such as a browser data URL.
    pub fn from_encoded(name: impl Into<String>, media_type: impl Into<String>, payload: &str) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data: strip_data_url_prefix(payload).to_string(),
        }
    }
}

/// Encode in-memory bytes.
pub fn encode_bytes(name: impl Into<String>, media_type: impl Into<String>, bytes: &[u8]) -> PendingFile {
    PendingFile {
        name: name.into(),
        media_type: media_type.into(),
        data: BASE64_STANDARD.encode(bytes),
    }
}

/// Read and encode a file from disk.
///
/// A file that cannot be read is an error, never an empty payload.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<PendingFile, AttachmentError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| AttachmentError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = infer_media_type(&name);

    debug!(file = %name, media_type = %media_type, bytes = bytes.len(), "Encoded attachment");
    Ok(encode_bytes(name, media_type, &bytes))
}

/// Encode several files concurrently. Every file is returned, or the first
/// read failure in input order.
pub async fn encode_files(paths: &[PathBuf]) -> Result<Vec<PendingFile>, AttachmentError> {
    join_all(paths.iter().map(encode_file))
        .await
        .into_iter()
        .collect()
}

/// Remove a `data:<type>;base64,` prefix if the payload carries one.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(',') {
            return data;
        }
    }
    payload
}

/// Infers the media type from a filename extension using `mime_guess`.
fn infer_media_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}
