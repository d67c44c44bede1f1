use std::cmp::Ordering;

use crate::corpus::CorpusChunk;

/// Number of chunks handed to the prompt unless a caller asks otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Similarity assigned to a zero-magnitude operand. Ranking needs a value,
/// not a division fault, and the floor keeps degenerate vectors last.
const ZERO_MAGNITUDE_SIMILARITY: f32 = -1.0;

/// Cosine similarity of two vectors, bounded in [-1, 1] for non-degenerate
/// inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return ZERO_MAGNITUDE_SIMILARITY;
    }

    dot / (magnitude_a * magnitude_b)
}

/// Ranks every corpus vector against the query and returns the text of the
/// `min(top_k, len(chunks))` most similar chunks, most similar first. Ties
/// keep original corpus order. A chunk/vector length mismatch ranks over the
/// shorter list.
pub fn retrieve<'a>(
    query_vector: &[f32],
    chunks: &'a [CorpusChunk],
    vectors: &[Vec<f32>],
    top_k: usize,
) -> Vec<&'a str> {
    let candidates = chunks.len().min(vectors.len());

    let mut ranked: Vec<(usize, f32)> = (0..candidates)
        .map(|index| (index, cosine_similarity(query_vector, &vectors[index])))
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(top_k.min(candidates));

    ranked
        .into_iter()
        .map(|(index, _)| chunks[index].text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks_from(texts: &[&str]) -> Vec<CorpusChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| CorpusChunk {
                index,
                text: (*text).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_vectors() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((similarity + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = [0.3, -1.2, 4.0];
        let b = [2.0, 0.5, -0.7];
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_bounded() {
        let a = [13.0, -7.5, 0.25, 100.0];
        let b = [-2.0, 42.0, 9.0, 0.001];
        let similarity = cosine_similarity(&a, &b);
        assert!((-1.0..=1.0).contains(&similarity));
    }

    #[test]
    fn test_cosine_zero_vector_never_faults() {
        let similarity = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]);
        assert_eq!(similarity, -1.0);

        let both_zero = cosine_similarity(&[0.0], &[0.0]);
        assert_eq!(both_zero, -1.0);
    }

    #[test]
    fn test_retrieve_orders_by_descending_similarity() {
        let chunks = chunks_from(&["far", "near", "middle"]);
        let vectors = vec![vec![-1.0, 0.0], vec![1.0, 0.0], vec![0.5, 0.5]];

        let result = retrieve(&[1.0, 0.0], &chunks, &vectors, 3);
        assert_eq!(result, vec!["near", "middle", "far"]);
    }

    #[test]
    fn test_retrieve_breaks_ties_by_corpus_order() {
        let chunks = chunks_from(&["first", "second", "third"]);
        // Two identical vectors tie exactly; the earlier chunk must win.
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]];

        let result = retrieve(&[1.0, 0.0], &chunks, &vectors, 2);
        assert_eq!(result, vec!["second", "third"]);
    }

    #[test]
    fn test_retrieve_caps_at_corpus_size() {
        let chunks = chunks_from(&["one", "two"]);
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let result = retrieve(&[1.0, 1.0], &chunks, &vectors, 3);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_retrieve_empty_corpus() {
        let result = retrieve(&[1.0, 0.0], &[], &[], 3);
        assert!(result.is_empty());
    }

    #[test]
    fn test_retrieve_ranks_over_shorter_list_on_mismatch() {
        let chunks = chunks_from(&["one", "two", "three"]);
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let result = retrieve(&[0.0, 1.0], &chunks, &vectors, 5);
        assert_eq!(result, vec!["two", "one"]);
    }

    #[test]
    fn test_retrieve_zero_query_vector_is_safe() {
        let chunks = chunks_from(&["one", "two"]);
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let result = retrieve(&[0.0, 0.0], &chunks, &vectors, 2);
        // Every similarity collapses to the floor; corpus order decides.
        assert_eq!(result, vec!["one", "two"]);
    }
}
