use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AccessRestrictionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelSettingsId(pub u32);

/// Theme id `0` is the reserved "unthemed"/default slot, distinct from any
/// real theme's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThemeId(pub u32);

/// Fill and border color for one theme (or the default slot, `ThemeId(0)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillAndBorderColor {
    pub fill: String,
    pub border: Option<String>,
}

/// A tag in the location hierarchy: a POI, a group of POIs, a building
/// wing, anything the editor can set parents/children on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationTag {
    pub id: LocationId,
    /// Own title per language; the effective title inherits the nearest
    /// ancestor's when a language is unset here.
    pub titles: BTreeMap<String, String>,
    pub priority: i32,
    pub access_restriction: Option<AccessRestrictionId>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub label_settings: Option<LabelSettingsId>,
    /// Own external-URL label, per language; inherited whole (not merged
    /// per-language) from the nearest ancestor that set one.
    #[serde(default)]
    pub external_url_label: BTreeMap<String, String>,
    /// Own color, folded into `theme_colors[ThemeId(0)]` when computing
    /// effective colors, mirroring the original's `color`/theme-0 split.
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub theme_colors: BTreeMap<ThemeId, FillAndBorderColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParentageId(pub u32);

/// A single editor-authored parent/child edge. The source of truth the
/// ancestry engine's closure is derived from; distinct from [`Ancestry`],
/// which is the derived transitive-closure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parentage {
    pub id: ParentageId,
    pub parent: LocationId,
    pub child: LocationId,
}

/// A derived transitive-closure edge: `child` can be reached from `parent`
/// by following one or more [`Parentage`] edges downward. `parent == child`
/// is never stored — see `CircularHierarchy` in [`crate::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ancestry {
    pub parent: LocationId,
    pub child: LocationId,
}

/// One concrete path realizing an [`Ancestry`] edge, as a sequence of
/// [`Parentage`] hops. The ancestry engine keeps every path, not just the
/// edge, because removing a single parentage must only drop the ancestry
/// once no path justifies it anymore (conceptually `DELETE ... WHERE
/// path_count = 0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestryPath {
    pub parent: LocationId,
    pub child: LocationId,
    pub through: Vec<ParentageId>,
}

impl AncestryPath {
    pub fn ancestry(&self) -> Ancestry {
        Ancestry {
            parent: self.parent,
            child: self.child,
        }
    }
}
