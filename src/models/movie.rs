use serde::{Deserialize, Serialize};

/// A movie as stored in the index
///
/// Records are keyed by `id`; writing a record with an existing id replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    pub overview: String,
}

impl MovieRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        overview: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            overview: overview.into(),
        }
    }
}

/// A record returned by similarity search, with the score it was ranked by
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub overview: String,
    /// Cosine similarity to the query; candidates arrive in non-increasing order
    pub score: f32,
}

impl Candidate {
    pub fn from_record(record: &MovieRecord, score: f32) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            overview: record.overview.clone(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_from_record() {
        let record = MovieRecord::new("7", "Her", "A lonely writer falls for an OS.");
        let candidate = Candidate::from_record(&record, 0.42);
        assert_eq!(candidate.id, "7");
        assert_eq!(candidate.title, "Her");
        assert_eq!(candidate.overview, record.overview);
        assert_eq!(candidate.score, 0.42);
    }
}
