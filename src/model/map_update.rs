use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapUpdateId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapUpdateKind {
    /// Editor-authored change committed directly (no review needed).
    Direct,
    /// A changeset got applied.
    Changeset,
    /// Triggered by `loadmap`/`loadmappkgs`, not by an editor edit.
    Management,
}

/// One row in the append-only map-update log. Every
/// processing job is keyed off "process everything up to this id".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapUpdate {
    pub id: MapUpdateId,
    pub kind: MapUpdateKind,
    /// Unix timestamp the update was recorded at, used in [`UpdateTuple`]'s
    /// cache-busting suffix.
    pub created_at: i64,
}

/// `(last_mapupdate_id, created_at)`, rendered as a base36 pair for cache
/// directory names : stable across re-processing of the same
/// update, and distinct from any earlier tuple even if ids are reused
/// after a history rewrite, because the timestamp is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateTuple {
    pub id: MapUpdateId,
    pub created_at: i64,
}

impl UpdateTuple {
    pub fn new(id: MapUpdateId, created_at: i64) -> Self {
        UpdateTuple { id, created_at }
    }

    /// Cache-directory component: `<id base36>_<created_at base36>`.
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}",
            to_base36(self.id.0),
            to_base36(self.created_at.max(0) as u64)
        )
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap()
}
