//! Property tests for corpus ranking.

use proptest::prelude::*;
use recall_core::Record;
use recall_vector::Corpus;

const DIM: usize = 16;

/// Non-zero vector of the given dimension.
fn arb_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
        .prop_filter("non-zero vector", |v| v.iter().map(|x| x * x).sum::<f32>() > 1e-6)
}

fn corpus_of(vectors: &[Vec<f32>]) -> Corpus {
    let mut corpus = Corpus::new();
    for (i, v) in vectors.iter().enumerate() {
        corpus
            .push(Record { title: format!("r{i}"), text: format!("record {i}"), vector: v.clone() })
            .unwrap();
    }
    corpus
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn ranking_is_descending_and_bounded(
        vectors in proptest::collection::vec(arb_vector(DIM), 0..20),
        query in arb_vector(DIM),
        top_k in proptest::option::of(0usize..25),
    ) {
        let corpus = corpus_of(&vectors);
        let results = corpus.rank(&query, top_k).unwrap();

        let expected_len = top_k.map_or(vectors.len(), |k| k.min(vectors.len()));
        prop_assert_eq!(results.len(), expected_len);
        for w in results.windows(2) {
            prop_assert!(w[0].score >= w[1].score, "not descending: {} < {}", w[0].score, w[1].score);
        }
        for r in &results {
            prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&r.score));
        }
    }

    #[test]
    fn ranking_is_deterministic(
        vectors in proptest::collection::vec(arb_vector(DIM), 1..20),
        query in arb_vector(DIM),
    ) {
        let corpus = corpus_of(&vectors);
        let a = corpus.rank(&query, None).unwrap();
        let b = corpus.rank(&query, None).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn query_vector_in_corpus_ranks_at_top(
        vectors in proptest::collection::vec(arb_vector(DIM), 0..20),
        query in arb_vector(DIM),
        slot in 0usize..20,
    ) {
        let mut vectors = vectors;
        let slot = slot.min(vectors.len());
        vectors.insert(slot, query.clone());
        let corpus = corpus_of(&vectors);
        let results = corpus.rank(&query, None).unwrap();

        let me = format!("r{slot}");
        let own = results.iter().find(|r| r.title == me).unwrap();
        prop_assert!((own.score - 1.0).abs() < 1e-6, "self similarity {}", own.score);
        prop_assert!(results.iter().all(|r| r.score <= own.score + 1e-9));
    }
}
