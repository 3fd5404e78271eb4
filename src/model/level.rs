use serde::{Deserialize, Serialize};

/// Stable primary key for a [`Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub u32);

/// A floor plate, ordered by `base_altitude`.
///
/// Invariants (checked by whoever constructs a [`crate::store`] snapshot,
/// not by this type itself — it is a plain data record):
/// - an intermediate level (`on_top_of.is_some()`) must reference a
/// non-intermediate parent level;
/// - `base_altitude` is monotone within a render group (the level and the
/// levels it sits `on_top_of`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    pub base_altitude: f64,
    pub default_height: f64,
    pub door_height: f64,
    /// `Some(parent)` if this level is drawn layered above `parent` instead
    /// of being its own render group (e.g. a mezzanine).
    pub on_top_of: Option<LevelId>,
    pub short_label: String,
}

impl Level {
    #[inline]
    pub fn is_intermediate(&self) -> bool {
        self.on_top_of.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_intermediate_level_has_no_parent() {
        let level = Level {
            id: LevelId(1),
            base_altitude: 0.0,
            default_height: 3.0,
            door_height: 2.0,
            on_top_of: None,
            short_label: "0".into(),
        };
        assert!(!level.is_intermediate());
    }

    #[test]
    fn intermediate_level_has_parent() {
        let level = Level {
            id: LevelId(2),
            base_altitude: 0.0,
            default_height: 3.0,
            door_height: 2.0,
            on_top_of: Some(LevelId(1)),
            short_label: "0m".into(),
        };
        assert!(level.is_intermediate());
        assert_eq!(level.on_top_of, Some(LevelId(1)));
    }
}
