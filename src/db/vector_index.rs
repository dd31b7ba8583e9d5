use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::{
        similarity::cosine_similarity,
        snapshot::{self, IndexSnapshot, StoredVector},
    },
    error::{AppError, AppResult},
    models::{Candidate, MovieRecord},
    services::providers::EmbeddingProvider,
};

/// Similarity-search capability over stored movies
///
/// Embedding is the index's own concern: callers hand over plain records and query text.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieIndex: Send + Sync {
    /// Insert or replace records by id, returning how many were written
    async fn upsert(&self, records: Vec<MovieRecord>) -> AppResult<usize>;

    /// Return up to `k` records ordered by non-increasing similarity to `query`
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Candidate>>;

    /// Number of stored records
    async fn count(&self) -> AppResult<usize>;
}

/// In-process vector index with optional JSON persistence
///
/// Vectors live in memory behind a read-write lock so concurrent searches never block each
/// other. When a snapshot path is set, every upsert rewrites the snapshot before returning.
pub struct EmbeddedIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    path: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, StoredVector>>,
}

impl EmbeddedIndex {
    /// Creates an empty index that is never written to disk
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            collection: collection.into(),
            path: None,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Opens an existing snapshot, failing if it has not been created yet
    pub async fn open(
        path: &Path,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: &str,
    ) -> AppResult<Self> {
        let snapshot = snapshot::load(path).await?.ok_or_else(|| {
            AppError::Index(format!(
                "No index found at {}; run `vibecheck ingest` first",
                path.display()
            ))
        })?;

        Self::from_snapshot(path, embedder, collection, snapshot)
    }

    /// Opens a snapshot, starting from an empty collection if the file is missing
    pub async fn open_or_create(
        path: &Path,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: &str,
    ) -> AppResult<Self> {
        let snapshot = match snapshot::load(path).await? {
            Some(snapshot) => snapshot,
            None => {
                tracing::info!(path = %path.display(), "Creating new index");
                IndexSnapshot::empty(collection, &embedder.model_id())
            }
        };

        Self::from_snapshot(path, embedder, collection, snapshot)
    }

    fn from_snapshot(
        path: &Path,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: &str,
        snapshot: IndexSnapshot,
    ) -> AppResult<Self> {
        if snapshot.collection != collection {
            return Err(AppError::Index(format!(
                "Snapshot {} holds collection '{}', expected '{}'",
                path.display(),
                snapshot.collection,
                collection
            )));
        }

        let model = embedder.model_id();
        if snapshot.embedding_model != model {
            return Err(AppError::Index(format!(
                "Snapshot {} was built with embedding model '{}', configured model is '{}'",
                path.display(),
                snapshot.embedding_model,
                model
            )));
        }

        let entries: BTreeMap<String, StoredVector> = snapshot
            .records
            .into_iter()
            .map(|stored| (stored.record.id.clone(), stored))
            .collect();

        tracing::info!(
            path = %path.display(),
            collection = %collection,
            records = entries.len(),
            "Index loaded"
        );

        Ok(Self {
            embedder,
            collection: collection.to_string(),
            path: Some(path.to_path_buf()),
            entries: RwLock::new(entries),
        })
    }

    /// Rejects records that could never be shown as a candidate
    fn validate_record(record: &MovieRecord) -> AppResult<()> {
        let blank = [
            ("id", &record.id),
            ("title", &record.title),
            ("overview", &record.overview),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match blank {
            Some((field, _)) => Err(AppError::InvalidInput(format!(
                "Movie record '{}' has an empty {}",
                record.id, field
            ))),
            None => Ok(()),
        }
    }

    fn dimension(entries: &BTreeMap<String, StoredVector>) -> Option<usize> {
        entries.values().next().map(|stored| stored.embedding.len())
    }

    async fn persist(&self, entries: &BTreeMap<String, StoredVector>) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot = IndexSnapshot {
            collection: self.collection.clone(),
            embedding_model: self.embedder.model_id(),
            dimension: Self::dimension(entries),
            updated_at: Utc::now(),
            records: entries.values().cloned().collect(),
        };

        snapshot::save(path, &snapshot).await
    }
}

/// Orders by descending score, then ascending id so equal scores stay stable
fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait::async_trait]
impl MovieIndex for EmbeddedIndex {
    async fn upsert(&self, records: Vec<MovieRecord>) -> AppResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        for record in &records {
            Self::validate_record(record)?;
        }

        let overviews: Vec<String> = records.iter().map(|r| r.overview.clone()).collect();
        let embeddings = self.embedder.embed(&overviews).await?;

        if embeddings.len() != records.len() {
            return Err(AppError::Upstream(format!(
                "Embedding provider returned {} vectors for {} records",
                embeddings.len(),
                records.len()
            )));
        }

        let mut entries = self.entries.write().await;
        let expected_dimension =
            Self::dimension(&entries).or_else(|| embeddings.first().map(Vec::len));

        for embedding in &embeddings {
            if Some(embedding.len()) != expected_dimension || embedding.is_empty() {
                return Err(AppError::Index(format!(
                    "Embedding dimension {} does not match index dimension {:?}",
                    embedding.len(),
                    expected_dimension
                )));
            }
        }

        let written = records
            .iter()
            .map(|r| r.id.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        for (record, embedding) in records.into_iter().zip(embeddings) {
            entries.insert(record.id.clone(), StoredVector { record, embedding });
        }

        self.persist(&entries).await?;

        tracing::info!(
            collection = %self.collection,
            written,
            total = entries.len(),
            "Records upserted"
        );

        Ok(written)
    }

    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Candidate>> {
        if k == 0 || self.entries.read().await.is_empty() {
            return Ok(Vec::new());
        }

        // The lock is not held across the embedding call
        let query_embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("No embedding returned for query".to_string()))?;

        let entries = self.entries.read().await;
        let mut candidates = Vec::with_capacity(entries.len());
        for stored in entries.values() {
            if stored.embedding.len() != query_embedding.len() {
                return Err(AppError::Index(format!(
                    "Query embedding dimension {} does not match stored dimension {}",
                    query_embedding.len(),
                    stored.embedding.len()
                )));
            }
            let score = cosine_similarity(&query_embedding, &stored.embedding);
            candidates.push(Candidate::from_record(&stored.record, score));
        }

        candidates.sort_by(rank);
        candidates.truncate(k);

        tracing::debug!(
            collection = %self.collection,
            k,
            returned = candidates.len(),
            top_score = candidates.first().map(|c| c.score),
            "Similarity search completed"
        );

        Ok(candidates)
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
