use loom_model::{DisplayRole, ResourceMap, StreamingToolCall, resources_for};
use loom_stream::{LivePhase, LiveState, SegmentInput, extract_segments};
use tracing::debug;

use crate::entry::{RenderMode, ToolCallBlock, TranscriptBlock, TranscriptEntry, search_header};
use crate::options::TranscriptOptions;

/// Builds the live assistant entry from the current snapshot, or `None` when
/// no response is in flight.
pub fn assemble_streaming(
    live: &LiveState,
    resources: &ResourceMap,
    options: &TranscriptOptions,
) -> Option<TranscriptEntry> {
    if live.phase == LivePhase::Idle {
        return None;
    }

    let mut entry = TranscriptEntry::new(
        live.message_id.clone().unwrap_or_default(),
        DisplayRole::Assistant,
    );
    entry.header = live_header(live, resources);
    entry.is_streaming = live.is_stream_active();
    entry.error = live.error.clone();

    let decision_resolved = !live.pending_search_decision
        || entry
            .header
            .iter()
            .any(|block| matches!(block, TranscriptBlock::SearchDecision(_)));
    // Once the response has ended, whatever partial output exists is shown.
    let gated = live.is_stream_active() && (live.is_waiting_for_ai() || !decision_resolved);
    entry.is_loading = gated;
    if gated {
        return Some(entry);
    }

    if live.tool_calls.iter().any(StreamingToolCall::has_before_segments) {
        entry.mode = RenderMode::Interleaved;
        entry.body = interleaved_body(live, options);
    } else {
        simple_blocks(live, options, &mut entry);
    }
    Some(entry)
}

fn live_header(live: &LiveState, resources: &ResourceMap) -> Vec<TranscriptBlock> {
    let persisted = live
        .user_message_id
        .as_deref()
        .map(|user_id| resources_for(resources, user_id));

    let decisions = persisted
        .into_iter()
        .flat_map(|turn| turn.search_decisions())
        .chain(live.search_decisions.iter());
    let results = persisted
        .into_iter()
        .flat_map(|turn| turn.search_results())
        .chain(live.search_results.iter());
    search_header(decisions, results)
}

fn simple_blocks(live: &LiveState, options: &TranscriptOptions, entry: &mut TranscriptEntry) {
    let stream_active = live.is_stream_active();
    let segments = extract_segments(
        &SegmentInput {
            raw_text: &live.streaming_content,
            native_reasoning: &live.streaming_reasoning,
            stream_active,
        },
        &options.markers,
    );

    if options.show_thinking {
        match segments.thinking_content {
            Some(content) => entry.header.push(TranscriptBlock::Thinking {
                content,
                in_progress: segments.is_thinking_in_progress,
            }),
            None if stream_active && segments.visible_content.is_empty() => {
                entry.header.push(TranscriptBlock::Thinking {
                    content: String::new(),
                    in_progress: true,
                });
            }
            None => {}
        }
    }

    let mut calls = live.tool_calls.iter().collect::<Vec<_>>();
    calls.sort_by_key(|call| call.order);
    entry.header.extend(
        calls
            .into_iter()
            .map(|call| TranscriptBlock::ToolCall(ToolCallBlock::from_live(call))),
    );
    entry.content = segments.visible_content;
}

/// Splits the accumulated text at each tool call's recorded prefixes so the
/// answer reads in the order it was produced.
fn interleaved_body(live: &LiveState, options: &TranscriptOptions) -> Vec<TranscriptBlock> {
    let mut calls = live.tool_calls.iter().collect::<Vec<_>>();
    calls.sort_by_key(|call| call.order);

    let mut body = Vec::new();
    let mut content_seen = 0;
    let mut reasoning_seen = 0;
    for call in calls {
        push_segment(
            &mut body,
            SegmentInput {
                raw_text: slice_from(&call.content_before, content_seen),
                native_reasoning: slice_from(&call.reasoning_before, reasoning_seen),
                stream_active: false,
            },
            false,
            options,
        );
        body.push(TranscriptBlock::ToolCall(ToolCallBlock::from_live(call)));
        content_seen = content_seen.max(call.content_before.len());
        reasoning_seen = reasoning_seen.max(call.reasoning_before.len());
    }

    let stream_active = live.is_stream_active();
    push_segment(
        &mut body,
        SegmentInput {
            raw_text: slice_from(&live.streaming_content, content_seen),
            native_reasoning: slice_from(&live.streaming_reasoning, reasoning_seen),
            stream_active,
        },
        stream_active,
        options,
    );
    body
}

fn push_segment(
    body: &mut Vec<TranscriptBlock>,
    input: SegmentInput<'_>,
    streaming: bool,
    options: &TranscriptOptions,
) {
    let segments = extract_segments(&input, &options.markers);
    if options.show_thinking {
        if let Some(content) = segments.thinking_content {
            if !content.is_empty() || segments.is_thinking_in_progress {
                body.push(TranscriptBlock::Thinking {
                    content,
                    in_progress: segments.is_thinking_in_progress,
                });
            }
        }
    }
    if !segments.visible_content.is_empty() {
        body.push(TranscriptBlock::Content {
            text: segments.visible_content,
            streaming,
        });
    }
}

/// `text[start..]`, clamped to the end and moved forward to a char boundary.
pub(crate) fn slice_from(text: &str, start: usize) -> &str {
    if start > text.len() {
        debug!(
            start,
            len = text.len(),
            "recorded prefix shorter than text already rendered; using empty delta"
        );
        return "";
    }
    let mut start = start;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
#[path = "../tests/unit/streaming_unit.rs"]
mod tests;
