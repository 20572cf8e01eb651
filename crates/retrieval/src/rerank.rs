//! Second-stage reranking of one corpus's first-stage results.

use contextkit_config::RankingConfig;
use contextkit_core::chunk::{Chunk, sort_by_score_desc};

/// Adds fixed bonuses for chunks the query names explicitly.
///
/// A query that mentions `parser.rs` or `src/parser.rs:40` is asking about
/// that file; term overlap alone cannot tell, since file names rarely
/// tokenize into useful terms.
#[derive(Debug, Clone, Copy)]
pub struct Reranker {
    source_bonus: f32,
    location_bonus: f32,
}

impl Default for Reranker {
    fn default() -> Self {
        Self::from_config(&RankingConfig::default())
    }
}

impl Reranker {
    pub fn new(source_bonus: f32, location_bonus: f32) -> Self {
        Self {
            source_bonus,
            location_bonus,
        }
    }

    pub fn from_config(ranking: &RankingConfig) -> Self {
        Self::new(ranking.rerank_source_bonus, ranking.rerank_location_bonus)
    }

    /// Apply the bonuses and re-sort. Ties keep their input order.
    pub fn rerank(&self, query: &str, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let lowered = query.to_lowercase();
        let mut reranked: Vec<Chunk> = chunks
            .into_iter()
            .map(|chunk| {
                let bonus = self.bonus(query, &lowered, &chunk);
                if bonus > 0.0 {
                    let score = chunk.score() + bonus;
                    chunk.with_score(score)
                } else {
                    chunk
                }
            })
            .collect();
        sort_by_score_desc(&mut reranked);
        reranked
    }

    fn bonus(&self, query: &str, lowered: &str, chunk: &Chunk) -> f32 {
        let mut bonus = 0.0;
        let source = chunk.source().to_lowercase();
        let basename = source.rsplit('/').next().unwrap_or(&source);
        if !source.is_empty() && (lowered.contains(&source) || lowered.contains(basename)) {
            bonus += self.source_bonus;
        }
        if !chunk.location().is_empty() && query.contains(chunk.location()) {
            bonus += self.location_bonus;
        }
        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextkit_core::chunk::CorpusKind;

    fn chunk(source: &str, location: &str, score: f32) -> Chunk {
        Chunk::new(CorpusKind::Source, source, location, "fn body() {}")
            .with_metadata("lines", "1-1")
            .with_score(score)
    }

    #[test]
    fn named_file_moves_up() {
        let chunks = vec![
            chunk("src/render.rs", "src/render.rs:1", 0.8),
            chunk("src/parser.rs", "src/parser.rs:10", 0.5),
        ];
        let reranked = Reranker::default().rerank("why does Parser.rs fail", chunks);
        assert_eq!(reranked[0].source(), "src/parser.rs");
        assert_eq!(reranked[0].score(), 1.0);
    }

    #[test]
    fn exact_location_adds_smaller_bonus() {
        let chunks = vec![
            chunk("src/parser.rs", "src/parser.rs:10", 0.5),
            chunk("src/parser.rs", "src/parser.rs:40", 0.5),
        ];
        let reranked = Reranker::default().rerank("look at src/parser.rs:40", chunks);
        assert_eq!(reranked[0].location(), "src/parser.rs:40");
        assert_eq!(reranked[0].score(), 1.25);
        assert_eq!(reranked[1].score(), 1.0);
    }

    #[test]
    fn scores_never_drop_and_fields_are_untouched() {
        let input = vec![
            chunk("a.py", "a.py:1", 0.3),
            chunk("b.py", "b.py:5", 0.9),
            chunk("c.py", "c.py:2", 0.6),
        ];
        let reranked = Reranker::default().rerank("change b.py and c.py", input.clone());
        assert_eq!(reranked.len(), input.len());
        for original in &input {
            let after = reranked
                .iter()
                .find(|c| c.same_identity(original))
                .unwrap();
            assert!(after.score() >= original.score());
            assert_eq!(after.content(), original.content());
            assert_eq!(after.kind(), original.kind());
            assert_eq!(after.metadata(), original.metadata());
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let input = vec![chunk("x.rs", "x.rs:1", 0.5), chunk("y.rs", "y.rs:1", 0.5)];
        let reranked = Reranker::new(0.0, 0.0).rerank("nothing named", input);
        assert_eq!(reranked[0].source(), "x.rs");
    }
}
