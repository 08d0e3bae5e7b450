//! Derives the single active item from the list's viewability reports.

use reelix_model::ItemId;

/// One entry of a viewability batch reported by the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewableToken {
    pub item_id: ItemId,
    pub index: usize,
    /// Fraction of the item's area inside the viewport, 0.0..=1.0.
    pub visible_fraction: f32,
}

impl ViewableToken {
    pub fn new(item_id: impl Into<ItemId>, index: usize, visible_fraction: f32) -> Self {
        Self {
            item_id: item_id.into(),
            index,
            visible_fraction,
        }
    }
}

/// Picks the lowest-index item meeting the threshold and reports a change only
/// when that selection differs from the previous one.
#[derive(Debug, Clone)]
pub struct ViewabilityTracker {
    threshold: f32,
    current: Option<ItemId>,
}

impl ViewabilityTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(f32::EPSILON, 1.0),
            current: None,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn current(&self) -> Option<&ItemId> {
        self.current.as_ref()
    }

    /// Returns the newly selected id, or `None` if the selection is unchanged
    /// or no token meets the threshold.
    pub fn on_viewable_items_changed(&mut self, tokens: &[ViewableToken]) -> Option<ItemId> {
        let selected = tokens
            .iter()
            .filter(|token| token.visible_fraction >= self.threshold)
            .min_by_key(|token| token.index)?;

        if self.current.as_ref() == Some(&selected.item_id) {
            return None;
        }

        tracing::trace!(
            item_id = %selected.item_id,
            index = selected.index,
            fraction = selected.visible_fraction,
            "viewable selection changed"
        );
        self.current = Some(selected.item_id.clone());
        self.current.clone()
    }

    /// Align with an activation made outside of scrolling (refresh fallback).
    pub fn sync(&mut self, active: Option<ItemId>) {
        self.current = active;
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
