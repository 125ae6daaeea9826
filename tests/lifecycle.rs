//! Integration tests for index lifecycle operations.
//!
//! These tests verify the end-to-end behavior of:
//! - Opening new and existing index directories
//! - Configuration validation
//! - Directory locking
//! - Final checkpoint on close

use novaindex::{
    Config, DocumentIndex, EmbeddingDimension, IndexError, Metadata, Position, Recovery,
    SyncMode,
};
use tempfile::tempdir;

fn config(dim: usize) -> Config {
    Config::with_dimension(EmbeddingDimension::Custom(dim))
}

// ============================================================================
// Open Tests
// ============================================================================

#[test]
fn test_open_creates_new_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index");

    assert!(!path.exists(), "Directory should not exist before open");

    let index = DocumentIndex::open(&path, Config::default()).unwrap();

    assert!(path.is_dir(), "Directory should exist after open");
    assert_eq!(index.recovery(), &Recovery::Fresh);

    index.close().unwrap();
}

#[test]
fn test_open_with_default_config() {
    let dir = tempdir().unwrap();
    let index = DocumentIndex::open(dir.path(), Config::default()).unwrap();

    assert_eq!(index.dimension(), 384);
    assert_eq!(index.config().checkpoint_interval, 10);
    assert_eq!(index.config().sync_mode, SyncMode::Normal);

    let stats = index.statistics().unwrap();
    assert_eq!(stats.document_count, 0);
    assert_eq!(stats.total_vectors, 0);
    assert_eq!(stats.dimension, 384);

    index.close().unwrap();
}

#[test]
fn test_open_with_d768() {
    let dir = tempdir().unwrap();
    let index = DocumentIndex::open(
        dir.path(),
        Config::with_dimension(EmbeddingDimension::D768),
    )
    .unwrap();

    assert_eq!(index.dimension(), 768);
    index.close().unwrap();
}

// ============================================================================
// Configuration Validation Tests
// ============================================================================

#[test]
fn test_invalid_dimension_zero() {
    let dir = tempdir().unwrap();
    let result = DocumentIndex::open(dir.path(), config(0));

    assert!(matches!(result, Err(IndexError::Config { .. })));
}

#[test]
fn test_invalid_dimension_too_large() {
    let dir = tempdir().unwrap();
    let result = DocumentIndex::open(dir.path(), config(10_000));

    let err = result.unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("4096"));
}

#[test]
fn test_invalid_checkpoint_interval() {
    let config = Config {
        checkpoint_interval: 0,
        ..config(3)
    };
    assert!(DocumentIndex::in_memory(config).unwrap_err().is_config());
}

// ============================================================================
// Reopen Tests
// ============================================================================

#[test]
fn test_close_then_reopen_restores_everything() {
    let dir = tempdir().unwrap();

    {
        let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
        index.insert("a", &[1.0, 0.0, 0.0], Metadata::new()).unwrap();
        index.insert("b", &[0.0, 1.0, 0.0], Metadata::new()).unwrap();
        index.close().unwrap();
    }

    let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
    assert_eq!(index.recovery(), &Recovery::Restored);

    let stats = index.statistics().unwrap();
    assert_eq!(stats.document_count, 2);
    assert_eq!(stats.total_vectors, 2);
    assert!(index.contains("a").unwrap());
    assert!(index.contains("b").unwrap());

    index.close().unwrap();
}

#[test]
fn test_reopen_with_other_dimension_starts_empty() {
    let dir = tempdir().unwrap();

    let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
    index.insert("a", &[1.0, 0.0, 0.0], Metadata::new()).unwrap();
    index.close().unwrap();

    let index = DocumentIndex::open(dir.path(), config(4)).unwrap();
    assert!(matches!(index.recovery(), Recovery::Degraded(_)));
    assert_eq!(index.statistics().unwrap().total_vectors, 0);
    index.close().unwrap();
}

#[test]
fn test_drop_without_close_loses_pending_inserts() {
    let dir = tempdir().unwrap();

    {
        let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
        index.insert("a", &[1.0, 0.0, 0.0], Metadata::new()).unwrap();
        // Dropped: below the cadence, never checkpointed
    }

    let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
    assert_eq!(index.recovery(), &Recovery::Fresh);
    assert_eq!(index.statistics().unwrap().total_vectors, 0);
    index.close().unwrap();
}

// ============================================================================
// Locking Tests
// ============================================================================

#[test]
fn test_concurrent_open_rejected() {
    let dir = tempdir().unwrap();
    let first = DocumentIndex::open(dir.path(), config(3)).unwrap();

    let err = DocumentIndex::open(dir.path(), config(3)).unwrap_err();
    assert!(err.is_persistence(), "Expected lock error, got {err}");

    first.close().unwrap();
}

#[test]
fn test_lock_released_on_close() {
    let dir = tempdir().unwrap();

    let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
    index.close().unwrap();

    let index = DocumentIndex::open(dir.path(), config(3)).unwrap();
    index.close().unwrap();
}

// ============================================================================
// Thread Safety Tests
// ============================================================================

#[test]
fn test_shared_across_threads() {
    use std::sync::Arc;
    use std::thread;

    let dir = tempdir().unwrap();
    let index = Arc::new(DocumentIndex::open(dir.path(), config(3)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for i in 0..25 {
                    let id = format!("doc-{t}-{i}");
                    let v = [t as f32, i as f32, 1.0];
                    index.insert(&id, &v, Metadata::new()).unwrap();
                    index.search(&v, 3).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = index.statistics().unwrap();
    assert_eq!(stats.document_count, 100);
    assert_eq!(stats.total_vectors, 100);

    // Every position resolves to an id that resolves back to it
    for p in 0..100 {
        let id = index.resolve(Position(p)).unwrap().unwrap();
        assert!(index.contains(&id).unwrap());
    }

    let index = Arc::try_unwrap(index).unwrap();
    index.close().unwrap();
}
