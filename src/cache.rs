//! Blob cache : versioned render/altitude artifacts on
//! disk, keyed by [`UpdateTuple::cache_key`] so a re-run of the same
//! update never collides with a stale one. Publishes are atomic
//! (write-to-tmp, then rename) so a reader never observes a half-written
//! file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::McpError;
use crate::model::UpdateTuple;

/// Bumped whenever [`LevelRenderData`](crate::model::LevelRenderData) or
/// any other cached artifact's on-disk shape changes, so an old worker
/// reading a cache built by a newer one (or vice versa) fails loudly
/// instead of deserializing garbage.
pub const SCHEMA_VERSION: u32 = 1;

/// Filesystem-backed blob cache rooted at `$CACHE_ROOT`.
/// Directory layout: `<root>/<update_tuple_key>/<key>.bin`.
pub struct BlobCache {
    root: PathBuf,
}

impl BlobCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BlobCache { root: root.into() }
    }

    fn dir_for(&self, update: UpdateTuple) -> PathBuf {
        self.root.join(update.cache_key())
    }

    fn path_for(&self, update: UpdateTuple, key: &str) -> PathBuf {
        self.dir_for(update).join(format!("{key}.bin"))
    }

    /// Serializes `value` with a schema-version-and-hash header and
    /// publishes it atomically: write to a sibling temp file, then
    /// `rename` over the final path (atomic on the same filesystem).
    pub fn put<T: Serialize>(&self, update: UpdateTuple, key: &str, value: &T) -> anyhow::Result<()> {
        let dir = self.dir_for(update);
        fs::create_dir_all(&dir)?;

        let payload = bincode::serialize(value)?;
        let schema_hash = schema_hash_of(&payload);

        let mut framed = Vec::with_capacity(payload.len() + 40);
        framed.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
        framed.extend_from_slice(schema_hash.as_bytes());
        framed.extend_from_slice(&payload);

        let final_path = self.path_for(update, key);
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&framed)?;
        tmp.persist(&final_path)?;
        Ok(())
    }

    /// Reads and validates a previously-[`put`](Self::put) artifact.
    /// [`McpError::CacheMiss`] if the file doesn't exist yet,
    /// [`McpError::SchemaMismatch`] if its header doesn't match what this
    /// build expects.
    pub fn get<T: DeserializeOwned>(&self, update: UpdateTuple, key: &str) -> Result<T, McpError> {
        let path = self.path_for(update, key);
        let bytes = fs::read(&path).map_err(|_| McpError::CacheMiss { update: update.id, key: key.to_string() })?;

        if bytes.len() < 4 + 64 {
            return Err(McpError::SchemaMismatch {
                    path: path.clone(),
                    found: "<truncated>".to_string(),
                    expected: expected_header(),
            });
        }
        let version = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let found_hash = String::from_utf8_lossy(&bytes[4..68]).to_string();
        let payload = &bytes[68..];
        let expected_hash = schema_hash_of(payload);

        if version != SCHEMA_VERSION || found_hash != expected_hash {
            return Err(McpError::SchemaMismatch {
                    path,
                    found: format!("v{version}:{found_hash}"),
                    expected: expected_header(),
            });
        }

        bincode::deserialize(payload).map_err(|_| McpError::SchemaMismatch {
                path,
                found: "<undecodable payload>".to_string(),
                expected: expected_header(),
        })
    }

    pub fn exists(&self, update: UpdateTuple, key: &str) -> bool {
        self.path_for(update, key).is_file()
    }

    /// Removes every cached update directory except `keep`, the way the
    /// source prunes old cache tuples once a new one is published.
    pub fn prune_all_but(&self, keep: UpdateTuple) -> anyhow::Result<()> {
        let keep_name = keep.cache_key();
        if !self.root.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy() != keep_name {
                remove_entry(&entry.path())?;
            }
        }
        Ok(())
    }
}

fn remove_entry(path: &Path) -> anyhow::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

fn expected_header() -> String {
    format!("v{SCHEMA_VERSION}")
}

fn schema_hash_of(payload: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(SCHEMA_VERSION.to_le_bytes());
    hasher.update(payload.len().to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MapUpdateId;

    #[test]
    fn round_trips_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        let update = UpdateTuple::new(MapUpdateId(1), 1_700_000_000);

        cache.put(update, "levels", &vec![1u32, 2, 3]).unwrap();
        let result: Vec<u32> = cache.get(update, "levels").unwrap();
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn missing_key_is_a_cache_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        let update = UpdateTuple::new(MapUpdateId(1), 1_700_000_000);
        let result: Result<Vec<u32>, McpError> = cache.get(update, "nope");
        assert!(matches!(result, Err(McpError::CacheMiss {.. })));
    }

    #[test]
    fn prune_all_but_keeps_only_the_named_tuple() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BlobCache::new(dir.path());
        let old = UpdateTuple::new(MapUpdateId(1), 1_700_000_000);
        let current = UpdateTuple::new(MapUpdateId(2), 1_700_000_100);

        cache.put(old, "levels", &1u32).unwrap();
        cache.put(current, "levels", &2u32).unwrap();
        cache.prune_all_but(current).unwrap();

        assert!(!cache.exists(old, "levels"));
        assert!(cache.exists(current, "levels"));
    }
}
