use super::*;

#[test]
fn slice_from_returns_suffix_after_prefix() {
    assert_eq!(slice_from("Let me check. Found it.", 13), " Found it.");
    assert_eq!(slice_from("abc", 0), "abc");
    assert_eq!(slice_from("abc", 3), "");
}

#[test]
fn slice_from_clamps_start_past_the_end() {
    assert_eq!(slice_from("short", 40), "");
}

#[test]
fn slice_from_moves_forward_to_a_char_boundary() {
    // 'é' is two bytes; byte 2 falls inside it.
    assert_eq!(slice_from("héllo", 2), "llo");
}

#[test]
fn shrinking_prefix_yields_empty_delta() {
    let mut live = LiveState::idle("conv-1");
    live.phase = LivePhase::Streaming;
    live.streaming_content = "abcdefgh".to_string();
    live.tool_calls = vec![
        call("tc-1", 0, "abcdef"),
        // Recorded prefix went backwards; nothing is rendered twice.
        call("tc-2", 1, "abc"),
    ];

    let body = interleaved_body(&live, &TranscriptOptions::default());
    let kinds = body.iter().map(TranscriptBlock::kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec!["content", "tool_call", "tool_call", "content"]);
    assert_eq!(
        body.last(),
        Some(&TranscriptBlock::Content {
            text: "gh".to_string(),
            streaming: true,
        })
    );
}

fn call(id: &str, order: u32, content_before: &str) -> StreamingToolCall {
    StreamingToolCall {
        id: id.to_string(),
        name: "web_search".to_string(),
        order,
        status: loom_model::ToolCallStatus::Done,
        content_before: content_before.to_string(),
        reasoning_before: String::new(),
        arguments: serde_json::Value::Null,
        result: None,
        error: None,
    }
}
