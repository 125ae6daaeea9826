//! `DocumentIndex` struct and lifecycle operations.
//!
//! The [`DocumentIndex`] struct is the primary interface of the crate. It
//! composes the vector store, the identity map, and snapshot persistence,
//! and provides methods for:
//!
//! - Opening (construct-or-restore) and closing (final checkpoint)
//! - Inserting documents one at a time or in batches
//! - Nearest-neighbor search with metadata
//! - Logical removal and statistics
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use novaindex::{Config, DocumentIndex, EmbeddingDimension, Metadata};
//!
//! let index = DocumentIndex::open(
//!     "./data/index",
//!     Config::with_dimension(EmbeddingDimension::Custom(3)),
//! )?;
//!
//! index.insert("a", &[1.0, 0.0, 0.0], Metadata::new())?;
//! let hits = index.search(&[1.0, 0.0, 0.0], 5)?;
//! assert_eq!(hits[0].id, "a");
//!
//! index.close()?;
//! ```
//!
//! # Thread Safety
//!
//! `DocumentIndex` is `Send + Sync` and can be shared across threads using
//! `Arc`. Searches run concurrently under a shared lock; an insert holds
//! the exclusive lock for both its append and its bind, so readers never
//! observe half an insert. Checkpoints serialize the state under the shared
//! lock and do their disk I/O after releasing it.
//!
//! # Durability
//!
//! A checkpoint runs after every `checkpoint_interval` successful inserts,
//! after every batch, and on [`DocumentIndex::close`]. Up to
//! `checkpoint_interval - 1` recent inserts are lost if the process dies
//! without closing. Dropping the index without `close` does not checkpoint.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::document::{text_metadata, validate_document_id, Paper};
use crate::embedding::EmbeddingService;
use crate::error::{IndexError, NotFoundError, Result, ValidationError};
use crate::identity::{BindError, IdentityMap};
use crate::persistence::{self, DirLock, Recovery, Snapshot};
use crate::types::{
    similarity_from_distance, BatchReport, Embedding, IndexStats, InsertOutcome, Metadata,
    Position, SearchHit,
};
use crate::vector::{validate_embedding, FlatIndex, VectorIndex};

/// The main document index handle.
///
/// Create an instance with [`DocumentIndex::open()`] (persistent) or
/// [`DocumentIndex::in_memory()`], and close it with
/// [`DocumentIndex::close()`].
///
/// # Ownership
///
/// The index is an explicitly owned value: there is no global instance.
/// Hand it to request handlers by reference or `Arc`. `close()` consumes
/// it, so it cannot be used after the final checkpoint.
pub struct DocumentIndex {
    /// Vector store and identity map, guarded together.
    state: RwLock<IndexState>,

    /// Snapshot directory, if persistent.
    persistence: Option<PersistenceHandle>,

    /// Successful inserts since the last checkpoint snapshot.
    pending: AtomicUsize,

    /// How the state was obtained at open.
    recovery: Recovery,

    /// Configuration used to open this index.
    config: Config,
}

/// State mutated by inserts. Both halves change under one write lock.
#[derive(Debug)]
struct IndexState {
    store: FlatIndex,
    identity: IdentityMap,
}

/// Everything a persistent index needs to checkpoint.
#[derive(Debug)]
struct PersistenceHandle {
    dir: PathBuf,

    /// Held for the lifetime of the index.
    _lock: DirLock,

    /// Serializes checkpoints; holds the last committed generation.
    writer: Mutex<u64>,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("config", &self.config)
            .field("path", &self.path())
            .field("recovery", &self.recovery)
            .finish_non_exhaustive()
    }
}

impl DocumentIndex {
    /// Opens or creates a persistent index in the directory `path`.
    ///
    /// If a snapshot exists it is restored; otherwise the index starts
    /// empty. An unreadable snapshot is logged and the index starts empty
    /// (see [`DocumentIndex::recovery`]) rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid (see [`Config::validate`])
    /// - The directory cannot be created
    /// - Another open index holds the directory lock
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;

        info!("Opening document index");

        let dir = path.as_ref().to_path_buf();
        let lock = DirLock::acquire(&dir)?;
        let (snapshot, recovery) = persistence::restore(&dir, config.dimension())?;
        let generation = snapshot.generation;

        let index = Self::from_snapshot(
            snapshot,
            Some(PersistenceHandle {
                dir,
                _lock: lock,
                writer: Mutex::new(generation),
            }),
            recovery,
            config,
        );

        let stats = index.statistics()?;
        info!(
            dimension = stats.dimension,
            documents = stats.document_count,
            vectors = stats.total_vectors,
            recovery = ?index.recovery,
            "Document index opened"
        );

        Ok(index)
    }

    /// Creates an empty index with no snapshot directory.
    ///
    /// Checkpoints are no-ops; everything is lost on drop.
    pub fn in_memory(config: Config) -> Result<Self> {
        config.validate()?;
        let snapshot = Snapshot::empty(config.dimension())?;
        Ok(Self::from_snapshot(snapshot, None, Recovery::Fresh, config))
    }

    fn from_snapshot(
        snapshot: Snapshot,
        persistence: Option<PersistenceHandle>,
        recovery: Recovery,
        config: Config,
    ) -> Self {
        Self {
            state: RwLock::new(IndexState {
                store: snapshot.store,
                identity: snapshot.identity,
            }),
            persistence,
            pending: AtomicUsize::new(0),
            recovery,
            config,
        }
    }

    /// Writes a final checkpoint and releases the directory lock.
    ///
    /// This method consumes the index, ensuring it cannot be used after
    /// closing.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Persistence` if the final checkpoint fails.
    /// The lock is released either way.
    #[instrument(skip(self))]
    pub fn close(self) -> Result<()> {
        info!("Closing document index");

        self.checkpoint()?;

        info!("Document index closed");
        Ok(())
    }

    /// Returns a reference to the index configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the embedding dimension of this index.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.config.dimension()
    }

    /// Returns the snapshot directory, or `None` for an in-memory index.
    pub fn path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|p| p.dir.as_path())
    }

    /// Returns how the index state was obtained when it was opened.
    pub fn recovery(&self) -> &Recovery {
        &self.recovery
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a document.
    ///
    /// Appends `vector` to the store and binds `id` to the new position as
    /// one atomic step. If `id` already has a live binding nothing changes
    /// and [`InsertOutcome::Duplicate`] is returned.
    ///
    /// Every `checkpoint_interval`-th successful insert triggers a
    /// checkpoint. A failing cadence checkpoint is logged, not returned:
    /// the insert itself succeeded.
    ///
    /// # Errors
    ///
    /// - `ValidationError::DimensionMismatch` if `vector.len()` is wrong
    /// - `ValidationError::NonFiniteComponent` for NaN/infinite values
    /// - `ValidationError::ComponentOutOfRange` for components large enough
    ///   to overflow a distance
    /// - `ValidationError::InvalidField` for an empty `id`
    pub fn insert(&self, id: &str, vector: &[f32], metadata: Metadata) -> Result<InsertOutcome> {
        validate_document_id(id)?;
        validate_embedding(self.dimension(), vector)?;

        let outcome = {
            let mut state = self.write()?;
            state.insert(id, vector, metadata)?
        };

        if let InsertOutcome::Inserted(position) = outcome {
            let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(id, %position, pending, "Inserted document");

            if pending >= self.config.checkpoint_interval {
                if let Err(e) = self.checkpoint() {
                    error!(error = %e, "Cadence checkpoint failed, continuing in memory");
                }
            }
        }

        Ok(outcome)
    }

    /// Inserts documents element-wise, in input order.
    ///
    /// Duplicates (including repeats within the batch) are skipped
    /// individually and listed in [`BatchReport::skipped`]. Exactly one
    /// checkpoint runs after the batch, regardless of cadence; its failure
    /// is logged and reported as `persisted == false`.
    ///
    /// # Errors
    ///
    /// All inputs are validated before the first insert, so an error means
    /// nothing was inserted:
    /// - `ValidationError::BatchLengthMismatch` if the slices differ in length
    /// - any per-document validation error from [`DocumentIndex::insert`]
    pub fn insert_batch<S: AsRef<str>>(
        &self,
        ids: &[S],
        vectors: &[Embedding],
        metadata: Vec<Metadata>,
    ) -> Result<BatchReport> {
        if ids.len() != vectors.len() || ids.len() != metadata.len() {
            return Err(ValidationError::BatchLengthMismatch {
                ids: ids.len(),
                vectors: vectors.len(),
                metadata: metadata.len(),
            }
            .into());
        }
        for (id, vector) in ids.iter().zip(vectors) {
            validate_document_id(id.as_ref())?;
            validate_embedding(self.dimension(), vector)?;
        }

        let mut report = BatchReport::default();
        {
            let mut state = self.write()?;
            for ((id, vector), record) in ids.iter().zip(vectors).zip(metadata) {
                let id = id.as_ref();
                match state.insert(id, vector, record)? {
                    InsertOutcome::Inserted(position) => report.inserted.push(position),
                    InsertOutcome::Duplicate => report.skipped.push(id.to_string()),
                }
            }
            self.pending
                .fetch_add(report.inserted.len(), Ordering::SeqCst);
        }

        report.persisted = match self.checkpoint() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Batch checkpoint failed, continuing in memory");
                false
            }
        };

        info!(
            inserted = report.inserted.len(),
            skipped = report.skipped.len(),
            persisted = report.persisted,
            "Inserted document batch"
        );
        Ok(report)
    }

    /// Logically removes a document.
    ///
    /// The identifier's metadata and forward binding are dropped, so it no
    /// longer counts as a document and may be inserted again. Its vector
    /// stays in the store and keeps showing up in search results, carrying
    /// the old identifier and an empty metadata record. Space is never
    /// reclaimed.
    ///
    /// Returns `false` if `id` had no live binding. Removal is persisted by
    /// the next checkpoint; it does not trigger one.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let detached = self.write()?.identity.detach(id);
        match detached {
            Some(position) => {
                info!(id, %position, "Removed document metadata, vector remains indexed");
                Ok(true)
            }
            None => {
                warn!(id, "Remove requested for unknown document");
                Ok(false)
            }
        }
    }

    /// Writes a snapshot of the current state to the index directory.
    ///
    /// A no-op for an in-memory index. The snapshot reflects a state between
    /// two inserts, never partway through one.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Persistence` if the snapshot could not be
    /// written. In-memory state is unaffected and the previous snapshot
    /// stays intact; callers may retry.
    #[instrument(skip(self))]
    pub fn checkpoint(&self) -> Result<()> {
        let Some(handle) = &self.persistence else {
            return Ok(());
        };

        let mut last_generation = handle
            .writer
            .lock()
            .map_err(|_| IndexError::internal("Checkpoint writer lock poisoned"))?;
        let generation = *last_generation + 1;

        let (encoded, drained) = {
            let state = self.read()?;
            let drained = self.pending.swap(0, Ordering::SeqCst);
            (
                persistence::encode(&state.store, &state.identity, generation),
                drained,
            )
        };

        let written = encoded
            .and_then(|encoded| persistence::write(&handle.dir, &encoded, self.config.sync_mode));
        if let Err(e) = written {
            // Still not durable; count them toward the next cadence trigger
            self.pending.fetch_add(drained, Ordering::SeqCst);
            error!(generation, error = %e, "Checkpoint failed");
            return Err(e.into());
        }

        *last_generation = generation;
        info!(generation, "Checkpoint written");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the `k` nearest documents to `query`.
    ///
    /// Results are ordered by ascending squared L2 distance (ties by
    /// ascending position) and number `min(k, total_vectors)`. Removed
    /// documents still match, with empty metadata.
    ///
    /// # Errors
    ///
    /// `ValidationError::DimensionMismatch` if `query.len()` is wrong.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        validate_embedding(self.dimension(), query)?;

        let state = self.read()?;
        let neighbors = state.store.search(query, k)?;

        let hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter_map(|(position, distance)| {
                let id = state.identity.resolve(position)?;
                Some(SearchHit {
                    id: id.to_string(),
                    position,
                    distance,
                    similarity: similarity_from_distance(distance),
                    metadata: state
                        .identity
                        .live_metadata_at(position)
                        .cloned()
                        .unwrap_or_default(),
                })
            })
            .collect();

        debug!(k, results = hits.len(), "Search completed");
        Ok(hits)
    }

    /// Returns the metadata record of a live document.
    pub fn get(&self, id: &str) -> Result<Option<Metadata>> {
        Ok(self.read()?.identity.metadata_for(id).cloned())
    }

    /// Returns true if `id` has a live binding.
    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.read()?.identity.is_bound(id))
    }

    /// Returns the identifier stored at `position`, including removed ones.
    pub fn resolve(&self, position: Position) -> Result<Option<String>> {
        Ok(self.read()?.identity.resolve(position).map(str::to_string))
    }

    /// Returns the stored vector of a live document.
    ///
    /// # Errors
    ///
    /// `NotFoundError::Document` if `id` has no live binding.
    pub fn vector_for(&self, id: &str) -> Result<Embedding> {
        let state = self.read()?;
        let position = state
            .identity
            .position_of(id)
            .ok_or_else(|| NotFoundError::document(id))?;
        state
            .store
            .vector(position)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| NotFoundError::Position(position).into())
    }

    /// Returns the vector stored at `position`, tombstones included.
    ///
    /// # Errors
    ///
    /// `NotFoundError::Position` if `position` was never assigned.
    pub fn vector_at(&self, position: Position) -> Result<Embedding> {
        self.read()?
            .store
            .vector(position)
            .map(<[f32]>::to_vec)
            .ok_or_else(|| NotFoundError::Position(position).into())
    }

    /// Returns document count, total stored vectors, and dimension.
    pub fn statistics(&self) -> Result<IndexStats> {
        let state = self.read()?;
        Ok(IndexStats {
            document_count: state.identity.live_count(),
            total_vectors: state.store.len(),
            dimension: state.store.dimension(),
        })
    }

    // =========================================================================
    // Text ingestion through an embedding service
    // =========================================================================

    /// Embeds `text` and inserts it with a `{ id, text }` metadata record.
    ///
    /// The stored `text` is the first `text_excerpt_chars` characters.
    /// Already-indexed identifiers are skipped without calling the service.
    pub fn index_text(
        &self,
        service: &dyn EmbeddingService,
        id: &str,
        text: &str,
    ) -> Result<InsertOutcome> {
        validate_document_id(id)?;
        if self.contains(id)? {
            warn!(id, "Document already indexed, skipping embedding");
            return Ok(InsertOutcome::Duplicate);
        }

        let vector = service.embed(text)?;
        let metadata = text_metadata(id, text, self.config.text_excerpt_chars);
        self.insert(id, &vector, metadata)
    }

    /// Embeds and inserts `(id, text)` pairs as one batch.
    ///
    /// Uses a single `embed_batch` call and [`DocumentIndex::insert_batch`],
    /// so exactly one checkpoint runs.
    pub fn index_texts(
        &self,
        service: &dyn EmbeddingService,
        documents: &[(&str, &str)],
    ) -> Result<BatchReport> {
        let texts: Vec<&str> = documents.iter().map(|(_, text)| *text).collect();
        let vectors = service.embed_batch(&texts)?;
        if vectors.len() != documents.len() {
            return Err(IndexError::embedding(format!(
                "embedding service returned {} vectors for {} texts",
                vectors.len(),
                documents.len()
            )));
        }

        let ids: Vec<&str> = documents.iter().map(|(id, _)| *id).collect();
        let metadata = documents
            .iter()
            .map(|(id, text)| text_metadata(id, text, self.config.text_excerpt_chars))
            .collect();

        self.insert_batch(&ids, &vectors, metadata)
    }

    /// Embeds a paper's `"{title}. {abstract}"` and inserts it with its
    /// bibliographic fields as metadata.
    pub fn add_paper(
        &self,
        service: &dyn EmbeddingService,
        id: &str,
        paper: &Paper,
    ) -> Result<InsertOutcome> {
        validate_document_id(id)?;
        if self.contains(id)? {
            warn!(id, "Paper already indexed, skipping embedding");
            return Ok(InsertOutcome::Duplicate);
        }

        let vector = service.embed(&paper.embedding_text())?;
        self.insert(id, &vector, paper.to_metadata(id))
    }

    /// Embeds `query` and returns its `k` nearest documents.
    pub fn search_text(
        &self,
        service: &dyn EmbeddingService,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        let vector = service.embed(query)?;
        self.search(&vector, k)
    }

    // =========================================================================
    // Internal Accessors
    // =========================================================================

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexState>> {
        self.state
            .read()
            .map_err(|_| IndexError::internal("Index state lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexState>> {
        self.state
            .write()
            .map_err(|_| IndexError::internal("Index state lock poisoned"))
    }
}

impl IndexState {
    /// Append + bind as one step. The caller holds the write lock and has
    /// already validated `vector`.
    fn insert(&mut self, id: &str, vector: &[f32], metadata: Metadata) -> Result<InsertOutcome> {
        if self.identity.is_bound(id) {
            warn!(id, "Document already indexed, skipping");
            return Ok(InsertOutcome::Duplicate);
        }

        // Both tables grow in lockstep, so the next position is known before
        // the append and the bind below cannot be refused.
        let next = Position(self.store.len());
        if self.identity.total_positions() != next.get() {
            return Err(IndexError::internal(format!(
                "identity map has {} positions but store has {} vectors",
                self.identity.total_positions(),
                next
            )));
        }

        let position = self.store.append(vector)?;
        self.identity
            .bind(id, position, metadata)
            .map_err(|e: BindError| IndexError::internal(e.to_string()))?;

        Ok(InsertOutcome::Inserted(position))
    }
}

// DocumentIndex is auto Send + Sync: RwLock<IndexState>, Mutex<u64>,
// AtomicUsize, DirLock (a File), and Config are all Send + Sync.
