//! Grid items, identifiers and partial updates.

use std::borrow::Borrow;
use std::fmt;

use cardgrid_core::{GridPosition, GridRect, GridSize};
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::options::GridOptions;

/// Stable, caller-chosen item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

const fn one() -> u16 {
    1
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One card on the grid.
///
/// Geometry is in grid units. The persisted JSON shape uses camelCase keys and
/// `static` for [`GridItem::is_static`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub id: ItemId,
    #[serde(default)]
    pub x: u16,
    #[serde(default)]
    pub y: u16,
    #[serde(default = "one")]
    pub w: u16,
    #[serde(default = "one")]
    pub h: u16,
    #[serde(default = "one")]
    pub min_w: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u16>,
    #[serde(default = "one")]
    pub min_h: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u16>,
    /// Static items never move and are ignored by overlap checks between
    /// non-static items.
    #[serde(rename = "static", default, skip_serializing_if = "is_false")]
    pub is_static: bool,
    /// Locked items keep their position against pushes and compaction.
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    /// Per-item override of [`GridOptions::draggable`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draggable: Option<bool>,
    /// Per-item override of [`GridOptions::resizable`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    /// Ask the store to search for a free spot instead of using `x`/`y`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_position: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl GridItem {
    /// New auto-positioned item of the given span.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, w: u16, h: u16) -> Self {
        Self {
            id: id.into(),
            x: 0,
            y: 0,
            w,
            h,
            min_w: 1,
            max_w: None,
            min_h: 1,
            max_h: None,
            is_static: false,
            locked: false,
            draggable: None,
            resizable: None,
            auto_position: true,
            content: None,
        }
    }

    /// Pin the item to an explicit cell, clearing the auto-position request.
    #[must_use]
    pub fn at(mut self, x: u16, y: u16) -> Self {
        self.x = x;
        self.y = y;
        self.auto_position = false;
        self
    }

    #[must_use]
    pub fn with_min(mut self, min_w: u16, min_h: u16) -> Self {
        self.min_w = min_w;
        self.min_h = min_h;
        self
    }

    #[must_use]
    pub fn with_max(mut self, max_w: Option<u16>, max_h: Option<u16>) -> Self {
        self.max_w = max_w;
        self.max_h = max_h;
        self
    }

    #[must_use]
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    #[must_use]
    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = Some(draggable);
        self
    }

    #[must_use]
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = Some(resizable);
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Canonical rectangle.
    #[inline]
    #[must_use]
    pub const fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }

    #[inline]
    #[must_use]
    pub const fn position(&self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> GridSize {
        GridSize::new(self.w, self.h)
    }

    #[inline]
    pub fn set_rect(&mut self, rect: GridRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    /// Static or locked: never displaced by the resolver or the compactor.
    #[inline]
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.is_static || self.locked
    }

    /// Whether a drag may start on this item under `options`.
    #[must_use]
    pub fn can_drag(&self, options: &GridOptions) -> bool {
        !self.is_fixed() && self.draggable.unwrap_or(options.draggable)
    }

    /// Whether a resize may start on this item under `options`.
    #[must_use]
    pub fn can_resize(&self, options: &GridOptions) -> bool {
        !self.is_fixed() && self.resizable.unwrap_or(options.resizable)
    }

    /// Check min/max consistency and that the item can fit the grid at all.
    pub fn validate(&self, options: &GridOptions) -> Result<(), LayoutError> {
        if self.min_w == 0 || self.min_h == 0 {
            return Err(LayoutError::InvalidConstraints {
                id: self.id.clone(),
                reason: "minimum span must be at least 1",
            });
        }
        if self.max_w.is_some_and(|max| max < self.min_w)
            || self.max_h.is_some_and(|max| max < self.min_h)
        {
            return Err(LayoutError::InvalidConstraints {
                id: self.id.clone(),
                reason: "maximum span is below minimum span",
            });
        }
        let too_tall = options.is_bounded() && self.min_h > options.max_row;
        if self.min_w > options.column || too_tall {
            return Err(LayoutError::InvalidSize {
                id: self.id.clone(),
                min_w: self.min_w,
                min_h: self.min_h,
                column: options.column,
                max_row: options.max_row,
            });
        }
        Ok(())
    }

    /// Clamp a requested span to this item's constraints and to the space
    /// remaining right of / below `origin`.
    #[must_use]
    pub fn clamp_size(&self, size: GridSize, origin: GridPosition, options: &GridOptions) -> GridSize {
        let max_w = self
            .max_w
            .unwrap_or(options.column)
            .min(options.column.saturating_sub(origin.x));
        let w = size.w.min(max_w).max(self.min_w);

        let mut max_h = self.max_h.unwrap_or(u16::MAX);
        if options.is_bounded() {
            max_h = max_h.min(options.max_row.saturating_sub(origin.y));
        }
        let h = size.h.min(max_h).max(self.min_h);
        GridSize::new(w, h)
    }

    /// Clamp a requested top-left cell so a `size` span stays in bounds.
    #[must_use]
    pub fn clamp_position(position: GridPosition, size: GridSize, options: &GridOptions) -> GridPosition {
        let x = position.x.min(options.column.saturating_sub(size.w));
        let y = if options.is_bounded() {
            position.y.min(options.max_row.saturating_sub(size.h))
        } else {
            position.y
        };
        GridPosition::new(x, y)
    }

    /// Clamp a whole rectangle into bounds, keeping its span where possible.
    ///
    /// The span is limited by the full grid rather than the space right of
    /// `rect.x`, so an item past the right edge slides left instead of
    /// shrinking.
    #[must_use]
    pub fn clamp_rect(&self, rect: GridRect, options: &GridOptions) -> GridRect {
        let size = self.clamp_size(rect.size(), GridPosition::new(0, 0), options);
        let position = Self::clamp_position(rect.position(), size, options);
        GridRect::from_parts(position, size)
    }
}

/// Partial update merged by [`crate::LayoutStore::update_item`].
///
/// `None` leaves a field untouched. Double options clear the field when the
/// inner value is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemPatch {
    pub x: Option<u16>,
    pub y: Option<u16>,
    pub w: Option<u16>,
    pub h: Option<u16>,
    pub min_w: Option<u16>,
    pub max_w: Option<Option<u16>>,
    pub min_h: Option<u16>,
    pub max_h: Option<Option<u16>>,
    #[serde(rename = "static")]
    pub is_static: Option<bool>,
    pub locked: Option<bool>,
    pub draggable: Option<Option<bool>>,
    pub resizable: Option<Option<bool>>,
    pub content: Option<Option<String>>,
}

impl ItemPatch {
    #[must_use]
    pub fn position(mut self, x: u16, y: u16) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    #[must_use]
    pub fn size(mut self, w: u16, h: u16) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }

    #[must_use]
    pub fn min(mut self, min_w: u16, min_h: u16) -> Self {
        self.min_w = Some(min_w);
        self.min_h = Some(min_h);
        self
    }

    #[must_use]
    pub fn max(mut self, max_w: Option<u16>, max_h: Option<u16>) -> Self {
        self.max_w = Some(max_w);
        self.max_h = Some(max_h);
        self
    }

    #[must_use]
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    #[must_use]
    pub fn static_item(mut self, is_static: bool) -> Self {
        self.is_static = Some(is_static);
        self
    }

    #[must_use]
    pub fn content(mut self, content: Option<String>) -> Self {
        self.content = Some(content);
        self
    }

    /// Whether applying the patch can change the item's rectangle or what it
    /// may overlap. Clearing `static` makes an item collide again.
    #[must_use]
    pub fn touches_geometry(&self) -> bool {
        self.is_static.is_some()
            || self.x.is_some()
            || self.y.is_some()
            || self.w.is_some()
            || self.h.is_some()
            || self.min_w.is_some()
            || self.max_w.is_some()
            || self.min_h.is_some()
            || self.max_h.is_some()
    }

    /// Merge into `item`. The id is never patched.
    pub fn apply_to(&self, item: &mut GridItem) {
        if let Some(x) = self.x {
            item.x = x;
        }
        if let Some(y) = self.y {
            item.y = y;
        }
        if let Some(w) = self.w {
            item.w = w;
        }
        if let Some(h) = self.h {
            item.h = h;
        }
        if let Some(min_w) = self.min_w {
            item.min_w = min_w;
        }
        if let Some(max_w) = self.max_w {
            item.max_w = max_w;
        }
        if let Some(min_h) = self.min_h {
            item.min_h = min_h;
        }
        if let Some(max_h) = self.max_h {
            item.max_h = max_h;
        }
        if let Some(is_static) = self.is_static {
            item.is_static = is_static;
        }
        if let Some(locked) = self.locked {
            item.locked = locked;
        }
        if let Some(draggable) = self.draggable {
            item.draggable = draggable;
        }
        if let Some(resizable) = self.resizable {
            item.resizable = resizable;
        }
        if let Some(content) = &self.content {
            item.content.clone_from(content);
        }
        if self.x.is_some() || self.y.is_some() {
            item.auto_position = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GridOptions;

    #[test]
    fn new_item_requests_auto_position() {
        let item = GridItem::new("a", 4, 2);
        assert!(item.auto_position);
        let placed = item.at(3, 1);
        assert!(!placed.auto_position);
        assert_eq!(placed.rect(), GridRect::new(3, 1, 4, 2));
    }

    #[test]
    fn clamp_size_respects_remaining_columns() {
        let options = GridOptions::default();
        let item = GridItem::new("a", 2, 2).at(10, 0);
        let size = item.clamp_size(GridSize::new(4, 2), item.position(), &options);
        assert_eq!(size, GridSize::new(2, 2));
    }

    #[test]
    fn clamp_size_applies_min_and_max() {
        let options = GridOptions::default();
        let item = GridItem::new("a", 3, 3)
            .with_min(2, 2)
            .with_max(Some(5), Some(4));
        let origin = GridPosition::new(0, 0);
        assert_eq!(
            item.clamp_size(GridSize::new(1, 1), origin, &options),
            GridSize::new(2, 2)
        );
        assert_eq!(
            item.clamp_size(GridSize::new(9, 9), origin, &options),
            GridSize::new(5, 4)
        );
    }

    #[test]
    fn clamp_size_bounded_by_max_row() {
        let options = GridOptions::default().with_max_row(6);
        let item = GridItem::new("a", 1, 1);
        let size = item.clamp_size(GridSize::new(1, 10), GridPosition::new(0, 4), &options);
        assert_eq!(size.h, 2);
    }

    #[test]
    fn clamp_position_keeps_item_inside() {
        let options = GridOptions::default().with_max_row(5);
        let pos = GridItem::clamp_position(GridPosition::new(11, 9), GridSize::new(4, 2), &options);
        assert_eq!(pos, GridPosition::new(8, 3));
    }

    #[test]
    fn validate_rejects_inverted_constraints() {
        let options = GridOptions::default();
        let item = GridItem::new("a", 2, 2).with_min(3, 1).with_max(Some(2), None);
        assert!(matches!(
            item.validate(&options),
            Err(LayoutError::InvalidConstraints { .. })
        ));
    }

    #[test]
    fn validate_rejects_item_wider_than_grid() {
        let options = GridOptions::default().with_column(4);
        let item = GridItem::new("a", 5, 1).with_min(5, 1);
        assert!(matches!(
            item.validate(&options),
            Err(LayoutError::InvalidSize { .. })
        ));
    }

    #[test]
    fn fixed_items_cannot_be_dragged() {
        let options = GridOptions::default();
        assert!(!GridItem::new("a", 1, 1).with_static(true).can_drag(&options));
        assert!(!GridItem::new("a", 1, 1).with_locked(true).can_resize(&options));
        assert!(!GridItem::new("a", 1, 1).with_draggable(false).can_drag(&options));
        assert!(GridItem::new("a", 1, 1).can_drag(&options));
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut item = GridItem::new("a", 2, 2).at(1, 1).with_content("x");
        let patch = ItemPatch::default().size(3, 1).content(None);
        assert!(patch.touches_geometry());
        patch.apply_to(&mut item);
        assert_eq!(item.rect(), GridRect::new(1, 1, 3, 1));
        assert_eq!(item.content, None);
        assert!(!ItemPatch::default().locked(true).touches_geometry());
        assert!(ItemPatch::default().static_item(false).touches_geometry());
    }

    #[test]
    fn serde_uses_persisted_field_names() {
        let item = GridItem::new("card", 2, 3).at(1, 0).with_static(true).with_max(Some(4), None);
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["id"], "card");
        assert_eq!(json["static"], true);
        assert_eq!(json["maxW"], 4);
        assert!(json.get("maxH").is_none());
        assert!(json.get("locked").is_none());

        let parsed: GridItem =
            serde_json::from_str(r#"{"id":"b","x":2,"y":1,"w":3,"h":1,"minW":2}"#).expect("parse");
        assert_eq!(parsed.rect(), GridRect::new(2, 1, 3, 1));
        assert_eq!(parsed.min_w, 2);
        assert_eq!(parsed.min_h, 1);
        assert!(!parsed.is_static);
    }
}
