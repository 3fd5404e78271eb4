//! Tag ancestry engine: maintains the transitive closure of
//! `Parentage` edges as `AncestryPath`s, incrementally, and derives
//! `Ancestry` pairs from it rather than storing them separately — an
//! ancestry exists exactly as long as at least one path witnesses it.

mod effective;
mod engine;

pub use effective::{
    describing_titles, effective_colors, effective_external_url_label, effective_icon, effective_label_settings,
    effective_titles, DescribingTitle,
};
pub use engine::AncestryEngine;
