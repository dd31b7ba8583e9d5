use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// On-disk form of the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub collection: String,
    /// Embedding model the stored vectors came from; queries must use the same one
    pub embedding_model: String,
    pub dimension: Option<usize>,
    pub updated_at: DateTime<Utc>,
    pub records: Vec<StoredVector>,
}

/// A record together with the embedding of its overview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredVector {
    #[serde(flatten)]
    pub record: MovieRecord,
    pub embedding: Vec<f32>,
}

impl IndexSnapshot {
    pub fn empty(collection: &str, embedding_model: &str) -> Self {
        Self {
            collection: collection.to_string(),
            embedding_model: embedding_model.to_string(),
            dimension: None,
            updated_at: Utc::now(),
            records: Vec::new(),
        }
    }
}

/// Reads a snapshot, returning `None` when the file does not exist
pub async fn load(path: &Path) -> AppResult<Option<IndexSnapshot>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Index(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    let snapshot = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::Index(format!("Corrupt index snapshot {}: {}", path.display(), e))
    })?;

    Ok(Some(snapshot))
}

/// Writes a snapshot next to its destination and renames it into place
pub async fn save(path: &Path, snapshot: &IndexSnapshot) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Index(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| AppError::Internal(format!("Snapshot serialization error: {}", e)))?;

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| AppError::Index(format!("Failed to write {}: {}", tmp_path.display(), e)))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::Index(format!("Failed to replace {}: {}", path.display(), e)))?;

    tracing::debug!(
        path = %path.display(),
        records = snapshot.records.len(),
        "Index snapshot written"
    );

    Ok(())
}
