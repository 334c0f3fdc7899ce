//! Live response state: inline-thinking segmentation and the event reducer
//! that turns transport events into immutable snapshots.

mod feed;
mod live;
mod segments;

pub use feed::{LiveFeed, LiveFeedSender, live_feed};
pub use live::{LiveEvent, LivePhase, LiveState, reduce};
pub use segments::{
    MarkerError, MarkerPair, MarkerSet, SegmentInput, Segments, extract_segments, strip_markers,
};
