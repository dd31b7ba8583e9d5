use std::fmt::Write;

use crate::models::Candidate;

/// Builds the reranking prompt for `query` over `candidates`
///
/// The output depends only on its inputs, in order.
pub fn build_rerank_prompt(query: &str, candidates: &[Candidate]) -> String {
    let mut listing = String::new();
    for candidate in candidates {
        // Writing into a String cannot fail
        let _ = write!(
            listing,
            "- Title: {}\n  Overview: {}\n\n",
            candidate.title, candidate.overview
        );
    }

    format!(
        "You are a movie recommendation engine.\n\
         User Query: \"{query}\"\n\
         \n\
         Candidates found:\n\
         {listing}\
         Analyze the candidates. Pick the SINGLE best match for the user's specific \"vibe\" or request.\n\
         Choose only from the titles listed above and copy the title exactly.\n\
         \n\
         Return ONLY JSON:\n\
         {{\n  \"selected_movie\": \"Title of movie\",\n  \"reason\": \"One short sentence explaining why.\"\n}}\n"
    )
}
