//! Turns persisted messages plus the live response snapshot into an ordered,
//! renderable transcript.

pub mod config;
mod entry;
mod history;
pub mod logging;
pub mod options;
mod streaming;

use loom_model::{Message, ResourceMap, UrlStatusTable};
use loom_stream::LiveState;
use tracing::trace;

pub use config::{LogConfig, LoomConfig, LoomConfigError, MarkerEntry, TranscriptSection};
pub use entry::{RenderMode, ToolCallBlock, TranscriptBlock, TranscriptEntry, UrlStatusLine};
pub use history::{assemble_history, link_previous_users};
pub use logging::init_tracing;
pub use options::TranscriptOptions;
pub use streaming::assemble_streaming;

/// Persisted entries followed by at most one live entry at the tail.
pub fn assemble_transcript(
    messages: &[Message],
    resources: &ResourceMap,
    url_statuses: &UrlStatusTable,
    live: Option<&LiveState>,
    options: &TranscriptOptions,
) -> Vec<TranscriptEntry> {
    let mut entries = assemble_history(messages, resources, url_statuses, options);

    let Some(live_entry) = live.and_then(|live| assemble_streaming(live, resources, options))
    else {
        return entries;
    };
    if !live_entry.message_id.is_empty()
        && messages.iter().any(|message| message.id == live_entry.message_id)
    {
        trace!(
            message_id = %live_entry.message_id,
            "live response already persisted; skipping live entry"
        );
        return entries;
    }

    entries.push(live_entry);
    entries
}
