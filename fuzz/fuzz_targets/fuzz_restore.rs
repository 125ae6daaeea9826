#![no_main]

use libfuzzer_sys::fuzz_target;
use novaindex::persistence::{self, format};
use novaindex::vector::VectorIndex;

// Restore must never panic on arbitrary snapshot bytes: it either loads a
// consistent snapshot or degrades to an empty index.
fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };

    // First byte picks the split between manifest and vector table
    let (split, rest) = match data.split_first() {
        Some((&s, rest)) => (usize::from(s).min(rest.len()), rest),
        None => return,
    };
    let (manifest, vectors) = rest.split_at(split);

    let _ = std::fs::write(dir.path().join(format::MANIFEST_FILE), manifest);
    let _ = std::fs::write(dir.path().join(format::vectors_file_name(1)), vectors);

    if let Ok((snapshot, _)) = persistence::restore(dir.path(), 3) {
        let store = &snapshot.store;
        assert_eq!(store.dimension() * store.len(), store.as_slice().len());
        assert_eq!(snapshot.identity.total_positions(), snapshot.store.len());
    }
});
