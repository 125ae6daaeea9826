//! Integration tests for nearest-neighbor search.
//!
//! Results are checked against a brute-force reference computed in the test.

use novaindex::vector::squared_l2;
use novaindex::{
    similarity_from_distance, Config, DocumentIndex, EmbeddingDimension, Metadata, Position,
};
use serde_json::json;

const DIM: usize = 16;

/// Generates a deterministic embedding from a seed.
fn make_embedding(seed: u64) -> Vec<f32> {
    (0..DIM)
        .map(|i| (seed as f32 * 0.1 + i as f32 * 0.01).sin())
        .collect()
}

fn open_index(dim: usize) -> DocumentIndex {
    DocumentIndex::in_memory(Config::with_dimension(EmbeddingDimension::Custom(dim))).unwrap()
}

fn populated(n: u64) -> DocumentIndex {
    let index = open_index(DIM);
    for i in 0..n {
        let mut metadata = Metadata::new();
        metadata.insert("seed".into(), json!(i));
        index
            .insert(&format!("doc-{i}"), &make_embedding(i), metadata)
            .unwrap();
    }
    index
}

// ============================================================================
// Ordering and Bounds
// ============================================================================

#[test]
fn test_search_returns_nearest_first() {
    let index = populated(50);

    let hits = index.search(&make_embedding(20), 5).unwrap();

    assert_eq!(hits.len(), 5);
    assert_eq!(hits[0].id, "doc-20");
    assert_eq!(hits[0].distance, 0.0);
    assert_eq!(hits[0].metadata["seed"], 20);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn test_search_matches_brute_force() {
    let index = populated(40);
    let query: Vec<f32> = make_embedding(7).iter().map(|x| x * 0.5 + 0.1).collect();

    let mut expected: Vec<(usize, f32)> = (0..40)
        .map(|i| (i as usize, squared_l2(&query, &make_embedding(i))))
        .collect();
    expected.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let hits = index.search(&query, 10).unwrap();
    let got: Vec<usize> = hits.iter().map(|h| h.position.get()).collect();
    let want: Vec<usize> = expected.iter().take(10).map(|(p, _)| *p).collect();
    assert_eq!(got, want);

    for hit in &hits {
        assert_eq!(hit.id, format!("doc-{}", hit.position));
        assert_eq!(hit.similarity, similarity_from_distance(hit.distance));
    }
}

#[test]
fn test_k_larger_than_index() {
    let index = populated(3);
    assert_eq!(index.search(&make_embedding(0), 100).unwrap().len(), 3);
}

#[test]
fn test_k_zero_and_empty_index() {
    let index = populated(3);
    assert!(index.search(&make_embedding(0), 0).unwrap().is_empty());

    let empty = open_index(DIM);
    assert!(empty.search(&make_embedding(0), 5).unwrap().is_empty());
}

#[test]
fn test_query_dimension_mismatch() {
    let index = populated(3);
    let err = index.search(&[0.0; DIM - 1], 1).unwrap_err();
    assert!(err.is_dimension_mismatch());
}

// ============================================================================
// Concrete Scenario
// ============================================================================

#[test]
fn test_two_document_scenario() {
    let index = open_index(3);
    let mut a = Metadata::new();
    a.insert("title".into(), json!("A"));
    let mut b = Metadata::new();
    b.insert("title".into(), json!("B"));

    index.insert("a", &[1.0, 0.0, 0.0], a).unwrap();
    index.insert("b", &[0.0, 1.0, 0.0], b).unwrap();

    let hits = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
    assert_eq!(hits[0].id, "a");
    assert_eq!(hits[0].distance, 0.0);
    assert_eq!(hits[0].similarity, 1.0);
    assert_eq!(hits[0].metadata["title"], "A");
    assert_eq!(hits[1].id, "b");
    assert_eq!(hits[1].distance, 2.0);
    assert_eq!(hits[1].metadata["title"], "B");

    let stats = index.statistics().unwrap();
    assert_eq!((stats.document_count, stats.total_vectors, stats.dimension), (2, 2, 3));
}

#[test]
fn test_equal_distances_ordered_by_position() {
    let index = open_index(2);
    index.insert("x", &[1.0, 0.0], Metadata::new()).unwrap();
    index.insert("y", &[0.0, 1.0], Metadata::new()).unwrap();
    index.insert("z", &[-1.0, 0.0], Metadata::new()).unwrap();

    let hits = index.search(&[0.0, 0.0], 3).unwrap();
    let positions: Vec<Position> = hits.iter().map(|h| h.position).collect();
    assert_eq!(positions, vec![Position(0), Position(1), Position(2)]);
}

// ============================================================================
// Removed Documents
// ============================================================================

#[test]
fn test_removed_document_still_matches_without_metadata() {
    let index = populated(10);
    index.remove("doc-4").unwrap();

    let hits = index.search(&make_embedding(4), 1).unwrap();
    assert_eq!(hits[0].id, "doc-4");
    assert_eq!(hits[0].position, Position(4));
    assert!(hits[0].metadata.is_empty());
}

#[test]
fn test_search_hit_serializes_to_json() {
    let index = populated(2);
    let hits = index.search(&make_embedding(1), 1).unwrap();

    let value = serde_json::to_value(&hits[0]).unwrap();
    assert_eq!(value["id"], "doc-1");
    assert_eq!(value["position"], 1);
    assert_eq!(value["metadata"]["seed"], 1);
}
