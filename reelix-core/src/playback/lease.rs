use std::time::Duration;

use reelix_contracts::media::{MediaFault, MediaResource, MediaTag};
use url::Url;

/// Scoped ownership of one media resource.
///
/// Dropping the lease pauses and unloads the resource, so every path that
/// removes it from the registry releases decoder and audio resources.
#[derive(Debug)]
pub struct MediaLease {
    tag: MediaTag,
    resource: Box<dyn MediaResource>,
}

impl MediaLease {
    pub fn new(tag: MediaTag, resource: Box<dyn MediaResource>) -> Self {
        Self { tag, resource }
    }

    pub fn tag(&self) -> &MediaTag {
        &self.tag
    }

    pub fn load(&mut self, source: &Url) -> Result<(), MediaFault> {
        self.resource.load(source)
    }

    pub fn play(&mut self) -> Result<(), MediaFault> {
        self.resource.play()
    }

    pub fn pause(&mut self) {
        self.resource.pause();
    }

    pub fn seek(&mut self, position: Duration) -> Result<(), MediaFault> {
        self.resource.seek(position)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.resource.set_muted(muted);
    }
}

impl Drop for MediaLease {
    fn drop(&mut self) {
        tracing::trace!(item_id = %self.tag.item_id, epoch = self.tag.epoch, "releasing media");
        self.resource.pause();
        self.resource.unload();
    }
}
