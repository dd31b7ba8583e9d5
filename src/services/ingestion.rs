use crate::{db::MovieIndex, error::AppResult, models::MovieRecord};

/// The fixed demo catalogue loaded by `vibecheck ingest`
pub fn seed_movies() -> Vec<MovieRecord> {
    vec![
        MovieRecord::new(
            "1",
            "Lost in Translation",
            "Two strangers form an unlikely bond in Tokyo while suffering from insomnia and culture shock.",
        ),
        MovieRecord::new(
            "2",
            "The Grand Budapest Hotel",
            "A famous concierge at a famous European hotel between the wars and his friendship with a young employee.",
        ),
        MovieRecord::new(
            "3",
            "Blade Runner 2049",
            "A young blade runner's discovery of a long-buried secret leads him to track down former blade runner Rick Deckard.",
        ),
        MovieRecord::new(
            "4",
            "Amélie",
            "Amélie is an innocent and naive girl in Paris with her own sense of justice. She decides to help those around her.",
        ),
        MovieRecord::new(
            "5",
            "Arrival",
            "A linguist works with the military to communicate with alien lifeforms after twelve spacecraft appear around the world.",
        ),
        MovieRecord::new(
            "6",
            "Whiplash",
            "A promising young drummer enrolls at a cut-throat music conservatory where his dreams of greatness are mentored by an instructor who will stop at nothing to realize a student's potential.",
        ),
        MovieRecord::new(
            "7",
            "Her",
            "In a near future, a lonely writer develops an unlikely relationship with an operating system designed to meet his every need.",
        ),
    ]
}

/// Upserts `records` into `index` and returns the resulting collection size
pub async fn ingest(index: &dyn MovieIndex, records: Vec<MovieRecord>) -> AppResult<usize> {
    let written = index.upsert(records).await?;
    let total = index.count().await?;

    tracing::info!(written, total, "Ingestion finished");

    Ok(total)
}
