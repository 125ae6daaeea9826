//! On-disk snapshot format and versioning.
//!
//! A snapshot directory holds two kinds of files:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ manifest.json                                                │
//! │   format_version, dimension, generation, vectors_file        │
//! │   metadata       : { id → record }         (live only)       │
//! │   id_to_index    : { id → position }       (live only)       │
//! │   index_to_id    : { "position" → id }     (every position)  │
//! │   current_index  : number of stored vectors                  │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ vectors-<generation>.bin                                     │
//! │   bincode VectorTable { dimension, count, data: [f32] }      │
//! │   data = count × dimension values, position order            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The manifest names the vector table it belongs to, so the pair is always
//! loaded together. Key names in the manifest match the JSON written by the
//! earlier paper service, so its consumers can keep reading it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::Metadata;

/// Current snapshot format version.
///
/// Increment this when making breaking changes to either file.
/// Restore treats any other version as an unreadable snapshot.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Name of the manifest file (the commit point of a checkpoint).
pub const MANIFEST_FILE: &str = "manifest.json";

/// Advisory lock file guarding the directory against a second writer.
pub const LOCK_FILE: &str = "index.lock";

/// Suffix of in-flight files; never read by restore.
pub const TEMP_SUFFIX: &str = ".tmp";

const VECTORS_PREFIX: &str = "vectors-";
const VECTORS_EXTENSION: &str = ".bin";

/// File name of the vector table written at `generation`.
pub fn vectors_file_name(generation: u64) -> String {
    format!("{}{}{}", VECTORS_PREFIX, generation, VECTORS_EXTENSION)
}

/// Parses the generation out of a vector table file name.
pub fn parse_vectors_file_name(name: &str) -> Option<u64> {
    name.strip_prefix(VECTORS_PREFIX)?
        .strip_suffix(VECTORS_EXTENSION)?
        .parse()
        .ok()
}

/// Companion structured document, as written.
///
/// Borrows from live state so encoding does not copy records.
#[derive(Serialize)]
pub(crate) struct ManifestRef<'a> {
    pub(crate) format_version: u32,
    pub(crate) dimension: usize,
    pub(crate) generation: u64,
    pub(crate) vectors_file: &'a str,
    pub(crate) metadata: BTreeMap<&'a str, &'a Metadata>,
    pub(crate) id_to_index: BTreeMap<&'a str, usize>,
    /// Integer keys; serde_json stringifies them.
    pub(crate) index_to_id: BTreeMap<usize, &'a str>,
    pub(crate) current_index: usize,
}

/// Companion structured document, as read back.
#[derive(Debug, Deserialize)]
pub(crate) struct Manifest {
    pub(crate) format_version: u32,
    pub(crate) dimension: usize,
    pub(crate) generation: u64,
    pub(crate) vectors_file: String,
    #[serde(default)]
    pub(crate) metadata: HashMap<String, Metadata>,
    #[serde(default)]
    pub(crate) id_to_index: HashMap<String, usize>,
    #[serde(default)]
    pub(crate) index_to_id: BTreeMap<usize, String>,
    pub(crate) current_index: usize,
}

/// Raw vector table, as written.
#[derive(Serialize)]
pub(crate) struct VectorTableRef<'a> {
    pub(crate) dimension: usize,
    pub(crate) count: usize,
    pub(crate) data: &'a [f32],
}

/// Raw vector table, as read back.
///
/// Encodes identically to [`VectorTableRef`]: bincode writes a slice and a
/// `Vec` the same way.
#[derive(Debug, Deserialize)]
pub(crate) struct VectorTable {
    pub(crate) dimension: usize,
    pub(crate) count: usize,
    pub(crate) data: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_file_name_roundtrip() {
        let name = vectors_file_name(42);
        assert_eq!(name, "vectors-42.bin");
        assert_eq!(parse_vectors_file_name(&name), Some(42));
    }

    #[test]
    fn test_parse_rejects_foreign_names() {
        assert_eq!(parse_vectors_file_name("manifest.json"), None);
        assert_eq!(parse_vectors_file_name("vectors-x.bin"), None);
        assert_eq!(parse_vectors_file_name("vectors-3.bin.tmp"), None);
    }

    #[test]
    fn test_vector_table_ref_decodes_as_owned() {
        let data = [1.0f32, 2.0, 3.0, 4.0];
        let bytes = bincode::serialize(&VectorTableRef {
            dimension: 2,
            count: 2,
            data: &data,
        })
        .unwrap();

        let table: VectorTable = bincode::deserialize(&bytes).unwrap();
        assert_eq!(table.dimension, 2);
        assert_eq!(table.count, 2);
        assert_eq!(table.data, data.to_vec());
    }

    #[test]
    fn test_index_to_id_keys_are_stringified() {
        let meta = Metadata::new();
        let manifest = ManifestRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            dimension: 3,
            generation: 1,
            vectors_file: "vectors-1.bin",
            metadata: BTreeMap::from([("a", &meta)]),
            id_to_index: BTreeMap::from([("a", 0)]),
            index_to_id: BTreeMap::from([(0, "a")]),
            current_index: 1,
        };
        let text = serde_json::to_string(&manifest).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["index_to_id"]["0"], "a");

        let parsed: Manifest = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.index_to_id.get(&0).map(String::as_str), Some("a"));
        assert_eq!(parsed.id_to_index["a"], 0);
    }
}
