//! Effective-value computation: a tag's displayed titles and restrictions
//! are inherited from its ancestors, closest and highest-priority first,
//! reduced to a priority-ordered walk and a redundant-entry drop.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::model::{AccessRestrictionId, FillAndBorderColor, LabelSettingsId, LocationId, LocationTag, ThemeId};

/// A title together with the access restriction a viewer must satisfy to
/// see it. `None` means unrestricted.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribingTitle {
    pub language: String,
    pub title: String,
    pub access_restriction: Option<AccessRestrictionId>,
}

/// Ancestors of `location` ordered highest-priority first, `location`
/// itself included first if `include_self`. Ties broken by id for
/// determinism.
fn priority_ordered_ancestors(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
    include_self: bool,
) -> Vec<LocationId> {
    let mut ancestors: Vec<LocationId> = ancestries
        .iter()
        .filter(|(_, child)| *child == location)
        .map(|(parent, _)| *parent)
        .collect();
    if include_self {
        ancestors.push(location);
    }
    ancestors.sort_by(|a, b| {
            let pa = tags.get(a).map(|t| t.priority).unwrap_or(0);
            let pb = tags.get(b).map(|t| t.priority).unwrap_or(0);
            pb.cmp(&pa).then_with(|| a.0.cmp(&b.0))
    });
    ancestors.dedup();
    ancestors
}

/// First-wins per-language title, walking ancestors in priority order. A
/// language already set by a higher-priority ancestor is never overwritten.
pub fn effective_titles(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    for ancestor in priority_ordered_ancestors(location, tags, ancestries, true) {
        let Some(tag) = tags.get(&ancestor) else { continue };
        for (language, title) in &tag.titles {
            result.entry(language.clone()).or_insert_with(|| title.clone());
        }
    }
    result
}

/// Every title reachable from `location`'s ancestors, tagged with the
/// restriction that guards it, with redundant entries dropped: if the same
/// `(language, title)` pair is reachable both with and without a
/// restriction (or through a strictly weaker one), only the least
/// restrictive entry is kept, since it strictly dominates the others.
pub fn describing_titles(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
) -> Vec<DescribingTitle> {
    let mut best: BTreeMap<(String, String), Option<AccessRestrictionId>> = BTreeMap::new();

    for ancestor in priority_ordered_ancestors(location, tags, ancestries, true) {
        let Some(tag) = tags.get(&ancestor) else { continue };
        for (language, title) in &tag.titles {
            let key = (language.clone(), title.clone());
            match best.get(&key) {
                None => {
                    best.insert(key, tag.access_restriction);
                }
                Some(None) => {
                    // Already unrestricted: nothing stronger can improve on it.
                }
                Some(Some(_)) => {
                    if tag.access_restriction.is_none() {
                        best.insert(key, None);
                    }
                }
            }
        }
    }

    best.into_iter()
        .map(|((language, title), access_restriction)| DescribingTitle { language, title, access_restriction })
        .collect()
}

/// Own value if set, else the nearest ancestor's, else `None`.
fn first_present<T: Clone>(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
    pick: impl Fn(&LocationTag) -> Option<T>,
) -> Option<T> {
    priority_ordered_ancestors(location, tags, ancestries, true)
        .into_iter()
        .find_map(|ancestor| tags.get(&ancestor).and_then(&pick))
}

pub fn effective_icon(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
) -> Option<String> {
    first_present(location, tags, ancestries, |tag| tag.icon.clone())
}

pub fn effective_label_settings(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
) -> Option<LabelSettingsId> {
    first_present(location, tags, ancestries, |tag| tag.label_settings)
}

/// The whole per-language map is inherited as a unit from the nearest
/// ancestor that set one — languages are never merged across ancestors the
/// way `effective_titles` merges them.
pub fn effective_external_url_label(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
) -> BTreeMap<String, String> {
    first_present(location, tags, ancestries, |tag| {
        (!tag.external_url_label.is_empty()).then(|| tag.external_url_label.clone())
    })
        .unwrap_or_default()
}

/// Per-theme color, first-wins walking ancestors in priority order. A
/// tag's own `color` (legacy single-color field) fills theme id `0` ahead
/// of any ancestor's explicit `theme_colors` entry for that slot.
pub fn effective_colors(
    location: LocationId,
    tags: &AHashMap<LocationId, LocationTag>,
    ancestries: &[(LocationId, LocationId)],
) -> BTreeMap<ThemeId, FillAndBorderColor> {
    let mut result: BTreeMap<ThemeId, FillAndBorderColor> = BTreeMap::new();

    for ancestor in priority_ordered_ancestors(location, tags, ancestries, true) {
        let Some(tag) = tags.get(&ancestor) else { continue };

        if let Some(color) = &tag.color {
            result
                .entry(ThemeId(0))
                .or_insert_with(|| FillAndBorderColor { fill: color.clone(), border: None });
        }
        for (theme, color) in &tag.theme_colors {
            result.entry(*theme).or_insert_with(|| color.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccessRestrictionId;

    fn tag(id: u32, priority: i32, titles: &[(&str, &str)], restriction: Option<u32>) -> (LocationId, LocationTag) {
        (
            LocationId(id),
            LocationTag {
                id: LocationId(id),
                titles: titles.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                priority,
                access_restriction: restriction.map(AccessRestrictionId),
                icon: None,
                label_settings: None,
                external_url_label: BTreeMap::new(),
                color: None,
                theme_colors: BTreeMap::new(),
            },
        )
    }

    fn with_icon(mut entry: (LocationId, LocationTag), icon: &str) -> (LocationId, LocationTag) {
        entry.1.icon = Some(icon.to_string());
        entry
    }

    #[test]
    fn higher_priority_ancestor_wins_for_same_language() {
        let tags: AHashMap<LocationId, LocationTag> = [
            tag(1, 0, &[("en", "Child")], None),
            tag(2, 10, &[("en", "Parent")], None),
        ]
            .into_iter()
            .collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        let titles = effective_titles(LocationId(1), &tags, &ancestries);
        assert_eq!(titles.get("en"), Some(&"Parent".to_string()));
    }

    #[test]
    fn unrestricted_entry_dominates_a_restricted_duplicate() {
        let tags: AHashMap<LocationId, LocationTag> = [
            tag(1, 10, &[("en", "Room")], Some(5)),
            tag(2, 0, &[("en", "Room")], None),
        ]
            .into_iter()
            .collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        let titles = describing_titles(LocationId(1), &tags, &ancestries);
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].access_restriction, None);
    }

    #[test]
    fn distinct_languages_are_independent() {
        let tags: AHashMap<LocationId, LocationTag> = [tag(1, 0, &[("en", "Room"), ("de", "Raum")], None)].into_iter().collect();
        let titles = effective_titles(LocationId(1), &tags, &[]);
        assert_eq!(titles.get("en"), Some(&"Room".to_string()));
        assert_eq!(titles.get("de"), Some(&"Raum".to_string()));
    }

    #[test]
    fn own_icon_wins_over_an_ancestors() {
        let tags: AHashMap<LocationId, LocationTag> = [
            with_icon(tag(1, 0, &[], None), "child-icon"),
            with_icon(tag(2, 10, &[], None), "parent-icon"),
        ]
            .into_iter()
            .collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        assert_eq!(effective_icon(LocationId(1), &tags, &ancestries), Some("child-icon".to_string()));
    }

    #[test]
    fn unset_icon_falls_back_to_nearest_ancestors() {
        let tags: AHashMap<LocationId, LocationTag> = [
            tag(1, 0, &[], None),
            with_icon(tag(2, 10, &[], None), "parent-icon"),
        ]
            .into_iter()
            .collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        assert_eq!(effective_icon(LocationId(1), &tags, &ancestries), Some("parent-icon".to_string()));
    }

    #[test]
    fn theme_zero_color_comes_from_the_legacy_color_field() {
        let mut parent = tag(2, 10, &[], None);
        parent.1.color = Some("#ff0000".to_string());
        let tags: AHashMap<LocationId, LocationTag> = [tag(1, 0, &[], None), parent].into_iter().collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        let colors = effective_colors(LocationId(1), &tags, &ancestries);
        assert_eq!(colors.get(&ThemeId(0)).map(|c| c.fill.as_str()), Some("#ff0000"));
    }

    #[test]
    fn closer_ancestors_theme_color_wins_over_a_farther_ones() {
        let mut child = tag(1, 0, &[], None);
        child.1.theme_colors.insert(ThemeId(1), FillAndBorderColor { fill: "#111".into(), border: None });
        let mut parent = tag(2, 10, &[], None);
        parent.1.theme_colors.insert(ThemeId(1), FillAndBorderColor { fill: "#222".into(), border: None });
        let tags: AHashMap<LocationId, LocationTag> = [child, parent].into_iter().collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        let colors = effective_colors(LocationId(1), &tags, &ancestries);
        assert_eq!(colors.get(&ThemeId(1)).map(|c| c.fill.as_str()), Some("#111"));
    }

    #[test]
    fn external_url_label_is_inherited_as_a_whole_map_not_merged() {
        let mut parent = tag(2, 10, &[], None);
        parent.1.external_url_label.insert("en".into(), "Book now".into());
        parent.1.external_url_label.insert("de".into(), "Jetzt buchen".into());
        let tags: AHashMap<LocationId, LocationTag> = [tag(1, 0, &[], None), parent].into_iter().collect();
        let ancestries = vec![(LocationId(2), LocationId(1))];
        let label = effective_external_url_label(LocationId(1), &tags, &ancestries);
        assert_eq!(label.get("en"), Some(&"Book now".to_string()));
        assert_eq!(label.get("de"), Some(&"Jetzt buchen".to_string()));
    }
}
