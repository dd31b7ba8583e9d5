pub mod movie;
pub mod recommendation;

pub use movie::{Candidate, MovieRecord};
pub use recommendation::{
    Recommendation, RecommendationOutcome, RecommendRequest, RecommendResponse,
};
