//! Persisted layout schema.
//!
//! A [`LayoutSnapshot`] carries the grid options and the ordered item list.
//! Loaders call [`LayoutSnapshot::validate`] (or [`LayoutSnapshot::from_json`],
//! which validates) before building a store, so a malformed layout never
//! reaches live state.
//!
//! # Schema versioning
//!
//! - Additive fields go in `extensions` without a version bump.
//! - Breaking changes increment [`LAYOUT_SCHEMA_VERSION`].
//! - Unknown versions are rejected.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::item::GridItem;
use crate::options::GridOptions;
use crate::store::LayoutStore;

/// Current layout schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

fn default_layout_version() -> u16 {
    LAYOUT_SCHEMA_VERSION
}

/// Persisted grid state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    #[serde(default = "default_layout_version")]
    pub schema_version: u16,
    #[serde(default)]
    pub options: GridOptions,
    pub items: Vec<GridItem>,
    /// Forward-compatible extension bag.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,
}

impl LayoutSnapshot {
    #[must_use]
    pub fn new(options: GridOptions, items: Vec<GridItem>) -> Self {
        Self {
            schema_version: LAYOUT_SCHEMA_VERSION,
            options,
            items,
            extensions: BTreeMap::new(),
        }
    }

    /// Capture a store's options and items.
    #[must_use]
    pub fn from_store(store: &LayoutStore) -> Self {
        Self::new(store.options().clone(), store.serialize())
    }

    /// Check version, options, ids and per-item constraints.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.schema_version != LAYOUT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                expected: LAYOUT_SCHEMA_VERSION,
                actual: self.schema_version,
            });
        }
        self.options
            .validate()
            .map_err(SnapshotError::InvalidOptions)?;

        let mut seen = FxHashSet::default();
        for item in &self.items {
            if !seen.insert(&item.id) {
                return Err(SnapshotError::DuplicateId {
                    id: item.id.clone(),
                });
            }
            item.validate(&self.options)
                .map_err(SnapshotError::InvalidItem)?;
        }
        Ok(())
    }

    /// Validate and build a fresh store.
    pub fn to_store(&self) -> Result<LayoutStore, SnapshotError> {
        self.validate()?;
        LayoutStore::from_items(self.options.clone(), self.items.iter().cloned())
            .map_err(SnapshotError::InvalidItem)
    }

    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use cardgrid_core::GridRect;

    fn sample_store() -> LayoutStore {
        let mut store = LayoutStore::default();
        store
            .add_item(GridItem::new("a", 4, 2).at(0, 0).with_content("chart"), false)
            .expect("add a");
        store
            .add_item(GridItem::new("b", 2, 1).at(4, 0).with_static(true), false)
            .expect("add b");
        store
    }

    #[test]
    fn json_round_trip_preserves_layout() {
        let snapshot = LayoutSnapshot::from_store(&sample_store());
        let json = snapshot.to_json().expect("serialize");
        let parsed = LayoutSnapshot::from_json(&json).expect("parse");
        assert_eq!(parsed, snapshot);
        let store = parsed.to_store().expect("build");
        assert_eq!(store.item("b").map(GridItem::rect), Some(GridRect::new(4, 0, 2, 1)));
        assert!(store.item("b").is_some_and(|b| b.is_static));
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let json = LayoutSnapshot::from_store(&sample_store())
            .to_json()
            .expect("serialize");
        assert!(json.contains("\"schemaVersion\":1"));
        assert!(json.contains("\"static\":true"));
        assert!(json.contains("\"cellHeight\""));
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let snapshot =
            LayoutSnapshot::from_json(r#"{"items":[{"id":"a","x":0,"y":0,"w":1,"h":1}]}"#)
                .expect("parse");
        assert_eq!(snapshot.schema_version, LAYOUT_SCHEMA_VERSION);
        assert_eq!(snapshot.options, GridOptions::default());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = LayoutSnapshot::from_json(r#"{"schemaVersion":9,"items":[]}"#)
            .expect_err("must fail");
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion { actual: 9, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let snapshot = LayoutSnapshot::new(
            GridOptions::default(),
            vec![GridItem::new("a", 1, 1), GridItem::new("a", 1, 1)],
        );
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_invalid_item_and_options() {
        let bad_item = LayoutSnapshot::new(
            GridOptions::default().with_column(2),
            vec![GridItem::new("wide", 3, 1).with_min(3, 1)],
        );
        assert!(matches!(
            bad_item.validate(),
            Err(SnapshotError::InvalidItem(LayoutError::InvalidSize { .. }))
        ));

        let bad_options = LayoutSnapshot::new(GridOptions::default().with_gap(f64::NAN), vec![]);
        assert!(matches!(
            bad_options.validate(),
            Err(SnapshotError::InvalidOptions(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(
            LayoutSnapshot::from_json("{\"items\": [}"),
            Err(SnapshotError::Json(_))
        ));
    }
}
