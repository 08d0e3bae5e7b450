use reelix_model::{FeedItem, ItemId};

use crate::error::FeedError;

/// Snapshot of the paginated collection.
///
/// `items` only grows on load-more and is replaced wholesale by a first-page
/// load or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub items: Vec<FeedItem>,
    /// Last page successfully loaded; 0 before the first load.
    pub page: u32,
    pub has_more: bool,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<FeedError>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            has_more: true,
            is_loading: false,
            is_refreshing: false,
            error: None,
        }
    }
}

impl PageState {
    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
