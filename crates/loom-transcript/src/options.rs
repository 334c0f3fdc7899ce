use loom_stream::MarkerSet;

#[derive(Clone, Debug)]
pub struct TranscriptOptions {
    pub show_thinking: bool,
    /// Standalone url-status rows under user messages without a search result.
    pub show_url_statuses: bool,
    pub markers: MarkerSet,
}

impl Default for TranscriptOptions {
    fn default() -> Self {
        Self {
            show_thinking: true,
            show_url_statuses: true,
            markers: MarkerSet::default(),
        }
    }
}
