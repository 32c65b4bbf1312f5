use std::sync::Arc;

use transport::Mailbox;
use xr_abi::HandAnchors;

/// Whether a post replaced anchors nobody had taken yet.
pub use transport::MailboxSend as PostOutcome;

/// Latest-value hand anchor hand-off from the tracking thread to the frame loop.
///
/// Hand tracking reports far more often than frames are composed; only the
/// newest pair matters, so older samples are overwritten.
#[derive(Debug, Default)]
pub struct HandAnchorMailbox {
    inner: Mailbox<HandAnchors>,
}

impl HandAnchorMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, anchors: HandAnchors) -> PostOutcome {
        self.inner.send(anchors)
    }

    /// Takes the newest pair; `None` when nothing arrived since the last take.
    pub fn take_latest(&self) -> Option<HandAnchors> {
        self.inner.take_latest().map(|anchors| *anchors)
    }

    /// Newest untaken pair, left in place.
    pub fn latest(&self) -> Option<Arc<HandAnchors>> {
        self.inner.peek()
    }

    pub fn coalesced(&self) -> u64 {
        self.inner.coalesced()
    }
}
