use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::services::RecommendationPipeline;

const PROMPT: &str = "\nDescribe the movie vibe you want (or 'q' to quit): ";
const QUIT: &str = "q";
const RULE: &str = "----------------------------------------";

/// Interactive loop: read a vibe, print the pick, repeat until `q` or end of input
///
/// Pipeline failures are printed and the loop continues.
pub async fn run_repl<R, W>(
    pipeline: &RecommendationPipeline,
    k: usize,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();

        if query.eq_ignore_ascii_case(QUIT) {
            break;
        }
        if query.is_empty() {
            continue;
        }

        let rendered = match pipeline.recommend_with_k(query, k).await {
            Ok(outcome) => format!(
                "   (Found {} candidates via vector search)\n{RULE}\nBEST PICK: {}\nREASON:    {}\n{RULE}\n",
                outcome.candidates.len(),
                outcome.recommendation.selected_title,
                outcome.recommendation.reason,
            ),
            Err(e) => {
                tracing::debug!(kind = e.kind(), error = %e, "Interactive query failed");
                format!("Error: {}\n", e)
            }
        };

        output.write_all(rendered.as_bytes()).await?;
    }

    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::vector_index::MockMovieIndex,
        models::Candidate,
        services::{
            providers::MockCompletionProvider, Reranker, RerankerOptions, Retriever,
        },
    };
    use mockall::predicate::{always, eq};
    use std::sync::Arc;

    fn pipeline_returning(search_results: Vec<Candidate>, reply: &'static str) -> RecommendationPipeline {
        let mut index = MockMovieIndex::new();
        index
            .expect_search()
            .with(always(), eq(3))
            .returning(move |_, _| Ok(search_results.clone()));

        let mut completion = MockCompletionProvider::new();
        completion
            .expect_complete()
            .returning(move |_, _| Ok(reply.to_string()));

        RecommendationPipeline::new(
            Retriever::new(Arc::new(index)),
            Reranker::new(Arc::new(completion), RerankerOptions::default()),
            5,
        )
    }

    fn her() -> Candidate {
        Candidate {
            id: "7".to_string(),
            title: "Her".to_string(),
            overview: "A lonely writer and an operating system.".to_string(),
            score: 0.7,
        }
    }

    #[tokio::test]
    async fn test_prints_pick_and_stops_on_quit() {
        let pipeline = pipeline_returning(
            vec![her()],
            r#"{"selected_movie": "Her", "reason": "Soft, lonely near-future romance."}"#,
        );
        let mut output = Vec::new();

        run_repl(&pipeline, 3, &b"lonely future love\nQ\nnever reached\n"[..], &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("BEST PICK: Her"));
        assert!(text.contains("REASON:    Soft, lonely near-future romance."));
        assert!(text.contains("(Found 1 candidates via vector search)"));
        assert_eq!(text.matches("BEST PICK").count(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_printed_and_loop_continues() {
        let pipeline = pipeline_returning(vec![], "{}");
        let mut output = Vec::new();

        run_repl(&pipeline, 3, &b"anything\n\nsomething else\n"[..], &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Error: No relevant movies found.").count(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_exits_cleanly() {
        let pipeline = pipeline_returning(vec![her()], "{}");
        let mut output = Vec::new();

        run_repl(&pipeline, 3, &b""[..], &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, PROMPT);
    }
}
