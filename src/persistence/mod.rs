//! Snapshot persistence: checkpoint and restore.
//!
//! A checkpoint overwrites the whole snapshot; there is no incremental
//! format. Writes are crash-safe:
//!
//! 1. encode the vector table and the manifest from a consistent view,
//! 2. write `vectors-<generation>.bin` via temp file + rename,
//! 3. write `manifest.json` via temp file + rename (the commit point),
//! 4. delete vector tables older than the previous generation.
//!
//! A reader that opens the manifest always finds the vector table it names,
//! and never sees a half-written file because in-flight files carry a
//! `.tmp` suffix until renamed.
//!
//! Restore is deliberately forgiving: an absent snapshot is the normal
//! first-run path, and an unreadable one is logged and replaced by an empty
//! index rather than refusing to start.
//!
//! # Durability window
//!
//! The engine checkpoints every N successful inserts (and at close). Up to
//! N−1 of the most recent inserts are lost if the process dies uncleanly.

pub mod format;

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::config::SyncMode;
use crate::error::{PersistenceError, Result};
use crate::identity::IdentityMap;
use crate::types::Position;
use crate::vector::{FlatIndex, VectorIndex};

use format::{
    parse_vectors_file_name, vectors_file_name, Manifest, ManifestRef, VectorTable,
    VectorTableRef, LOCK_FILE, MANIFEST_FILE, SNAPSHOT_FORMAT_VERSION, TEMP_SUFFIX,
};

/// Index state reconstructed from (or destined for) a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Vector store.
    pub store: FlatIndex,
    /// Identity map.
    pub identity: IdentityMap,
    /// Generation the next checkpoint builds on: the loaded checkpoint's,
    /// or the highest vector table left in the directory (0 = none).
    pub generation: u64,
}

impl Snapshot {
    /// Creates an empty snapshot of the given dimension.
    pub fn empty(dimension: usize) -> Result<Self> {
        Ok(Self {
            store: FlatIndex::new(dimension)?,
            identity: IdentityMap::new(),
            generation: 0,
        })
    }
}

/// How [`restore`] obtained its state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// No snapshot existed; started empty.
    Fresh,
    /// Snapshot loaded successfully.
    Restored,
    /// Snapshot existed but was unusable; started empty.
    Degraded(String),
}

/// Both snapshot files, serialized and ready to write.
///
/// Produced under the engine's read lock; written after releasing it so
/// disk I/O never blocks inserts.
#[derive(Debug)]
pub struct EncodedSnapshot {
    generation: u64,
    vectors: Vec<u8>,
    manifest: Vec<u8>,
}

/// Serializes the store and identity map as checkpoint `generation`.
pub fn encode(
    store: &FlatIndex,
    identity: &IdentityMap,
    generation: u64,
) -> std::result::Result<EncodedSnapshot, PersistenceError> {
    let vectors_file = vectors_file_name(generation);

    let vectors = bincode::serialize(&VectorTableRef {
        dimension: store.dimension(),
        count: store.len(),
        data: store.as_slice(),
    })?;

    let manifest = ManifestRef {
        format_version: SNAPSHOT_FORMAT_VERSION,
        dimension: store.dimension(),
        generation,
        vectors_file: &vectors_file,
        metadata: identity.records().collect(),
        id_to_index: identity.bindings().map(|(id, p)| (id, p.get())).collect(),
        index_to_id: identity.positions().map(|(p, id)| (p.get(), id)).collect(),
        current_index: store.len(),
    };
    let manifest = serde_json::to_vec_pretty(&manifest)?;

    Ok(EncodedSnapshot {
        generation,
        vectors,
        manifest,
    })
}

/// Writes an encoded snapshot into `dir`, replacing the previous one.
pub fn write(
    dir: &Path,
    snapshot: &EncodedSnapshot,
    sync_mode: SyncMode,
) -> std::result::Result<(), PersistenceError> {
    fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;

    let vectors_path = dir.join(vectors_file_name(snapshot.generation));
    write_atomically(&vectors_path, &snapshot.vectors, sync_mode)?;
    write_atomically(&dir.join(MANIFEST_FILE), &snapshot.manifest, sync_mode)?;

    remove_stale_files(dir, snapshot.generation);
    Ok(())
}

/// Encodes and writes a checkpoint in one step.
pub fn checkpoint(
    dir: &Path,
    store: &FlatIndex,
    identity: &IdentityMap,
    generation: u64,
    sync_mode: SyncMode,
) -> std::result::Result<(), PersistenceError> {
    let encoded = encode(store, identity, generation)?;
    write(dir, &encoded, sync_mode)
}

/// Loads the snapshot in `dir`, strictly.
///
/// Returns `Ok(None)` if no manifest exists. Any structural problem is an
/// error; see [`restore`] for the forgiving variant.
pub fn load(
    dir: &Path,
    dimension: usize,
) -> std::result::Result<Option<Snapshot>, PersistenceError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest_bytes = match fs::read(&manifest_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(manifest_path, e)),
    };
    let manifest: Manifest = serde_json::from_slice(&manifest_bytes)?;

    if manifest.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(PersistenceError::FormatVersionMismatch {
            expected: SNAPSHOT_FORMAT_VERSION,
            found: manifest.format_version,
        });
    }
    if manifest.dimension != dimension {
        return Err(PersistenceError::DimensionMismatch {
            expected: dimension,
            found: manifest.dimension,
        });
    }
    if parse_vectors_file_name(&manifest.vectors_file).is_none() {
        return Err(PersistenceError::corrupted(format!(
            "manifest names an invalid vector table '{}'",
            manifest.vectors_file
        )));
    }

    let vectors_path = dir.join(&manifest.vectors_file);
    let vector_bytes =
        fs::read(&vectors_path).map_err(|e| PersistenceError::io(&vectors_path, e))?;
    let table: VectorTable = bincode::deserialize(&vector_bytes)?;

    let store = decode_store(&manifest, table)?;
    let identity = decode_identity(
        manifest.id_to_index,
        manifest.index_to_id,
        manifest.metadata,
        store.len(),
    )?;

    Ok(Some(Snapshot {
        store,
        identity,
        generation: manifest.generation,
    }))
}

/// Restores index state from `dir`, never failing on bad data.
///
/// - no snapshot → empty state, [`Recovery::Fresh`]
/// - valid snapshot → loaded state, [`Recovery::Restored`]
/// - unreadable or invalid snapshot → logged, empty state,
///   [`Recovery::Degraded`]
///
/// # Errors
///
/// Only `IndexError::Config` when `dimension` is 0.
pub fn restore(dir: &Path, dimension: usize) -> Result<(Snapshot, Recovery)> {
    let mut empty = Snapshot::empty(dimension)?;
    empty.generation = latest_table_generation(dir).unwrap_or(0);

    match load(dir, dimension) {
        Ok(None) => {
            info!(dir = %dir.display(), "No snapshot found, starting empty index");
            Ok((empty, Recovery::Fresh))
        }
        Ok(Some(snapshot)) => {
            info!(
                dir = %dir.display(),
                generation = snapshot.generation,
                vectors = snapshot.store.len(),
                documents = snapshot.identity.live_count(),
                "Restored index snapshot"
            );
            Ok((snapshot, Recovery::Restored))
        }
        Err(e) => {
            warn!(
                dir = %dir.display(),
                error = %e,
                "Snapshot unreadable, starting empty index"
            );
            Ok((empty, Recovery::Degraded(e.to_string())))
        }
    }
}

/// Exclusive advisory lock on a snapshot directory.
///
/// Held by an open engine so a second process cannot checkpoint into the
/// same directory. Released on drop.
#[derive(Debug)]
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Acquires the lock without blocking.
    ///
    /// # Errors
    ///
    /// `PersistenceError::Locked` if another writer holds it.
    pub fn acquire(dir: &Path) -> std::result::Result<Self, PersistenceError> {
        fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;

        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| PersistenceError::io(&path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| PersistenceError::Locked(dir.to_path_buf()))?;

        debug!(path = %path.display(), "Acquired snapshot directory lock");
        Ok(Self { file, path })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "Failed to release snapshot lock");
        }
    }
}

// ============================================================================
// Internals
// ============================================================================

fn decode_store(
    manifest: &Manifest,
    table: VectorTable,
) -> std::result::Result<FlatIndex, PersistenceError> {
    if table.dimension != manifest.dimension {
        return Err(PersistenceError::corrupted(format!(
            "vector table dimension {} disagrees with manifest dimension {}",
            table.dimension, manifest.dimension
        )));
    }
    if table.count != manifest.current_index {
        return Err(PersistenceError::corrupted(format!(
            "vector table holds {} vectors, manifest expects {}",
            table.count, manifest.current_index
        )));
    }
    if table.count.checked_mul(table.dimension) != Some(table.data.len()) {
        return Err(PersistenceError::corrupted(format!(
            "vector table has {} values, expected {} × {}",
            table.data.len(),
            table.count,
            table.dimension
        )));
    }

    FlatIndex::from_raw(table.dimension, table.data)
        .ok_or_else(|| PersistenceError::corrupted("vector table is not a whole number of vectors"))
}

fn decode_identity(
    id_to_index: HashMap<String, usize>,
    index_to_id: BTreeMap<usize, String>,
    metadata: HashMap<String, crate::types::Metadata>,
    current_size: usize,
) -> std::result::Result<IdentityMap, PersistenceError> {
    if index_to_id.len() != current_size {
        return Err(PersistenceError::corrupted(format!(
            "{} bound positions for {} stored vectors",
            index_to_id.len(),
            current_size
        )));
    }

    // BTreeMap iterates in key order; dense keys must be exactly 0..current_size
    let mut position_to_id = Vec::with_capacity(current_size);
    for (expected, (position, id)) in index_to_id.into_iter().enumerate() {
        if position != expected {
            return Err(PersistenceError::corrupted(format!(
                "position {} is unbound",
                expected
            )));
        }
        position_to_id.push(id);
    }

    let id_to_position = id_to_index
        .into_iter()
        .map(|(id, p)| (id, Position(p)))
        .collect();

    IdentityMap::from_parts(id_to_position, position_to_id, metadata)
        .map_err(PersistenceError::corrupted)
}

/// Writes `bytes` to `path` through a sibling temp file and a rename.
fn write_atomically(
    path: &Path,
    bytes: &[u8],
    sync_mode: SyncMode,
) -> std::result::Result<(), PersistenceError> {
    let tmp_path = temp_path(path);

    let mut file = File::create(&tmp_path).map_err(|e| PersistenceError::io(&tmp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| PersistenceError::io(&tmp_path, e))?;
    if sync_mode.syncs_files() {
        file.sync_all()
            .map_err(|e| PersistenceError::io(&tmp_path, e))?;
    }
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| PersistenceError::io(path, e))?;

    if sync_mode.syncs_directory() {
        sync_parent_dir(path)?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn sync_parent_dir(path: &Path) -> std::result::Result<(), PersistenceError> {
    #[cfg(unix)]
    {
        if let Some(parent) = path.parent() {
            File::open(parent)
                .and_then(|dir| dir.sync_all())
                .map_err(|e| PersistenceError::io(parent, e))?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Highest generation among the vector tables in `dir`, if any.
///
/// Seeds the writer after a fresh or degraded start so new tables sort after
/// whatever an unreadable snapshot left behind.
fn latest_table_generation(dir: &Path) -> Option<u64> {
    fs::read_dir(dir)
        .ok()?
        .flatten()
        .filter_map(|entry| parse_vectors_file_name(&entry.file_name().to_string_lossy()))
        .max()
}

/// Removes every vector table except the committed one and its predecessor,
/// plus stray temp files. Keeping one prior table lets a reader that opened
/// the previous manifest still find its vectors.
fn remove_stale_files(dir: &Path, committed: u64) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        let stale = match parse_vectors_file_name(&name) {
            Some(generation) => generation != committed && generation + 1 != committed,
            None => name.ends_with(TEMP_SUFFIX),
        };

        if stale {
            if let Err(e) = fs::remove_file(entry.path()) {
                debug!(file = %name, error = %e, "Failed to remove stale snapshot file");
            }
        }
    }
}
