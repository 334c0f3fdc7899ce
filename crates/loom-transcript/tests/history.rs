use loom_model::{Message, MessageResources, ResourceMap, SenderType, UrlStatus, UrlStatusTable};
use loom_transcript::{
    RenderMode, TranscriptBlock, TranscriptOptions, assemble_history, link_previous_users,
};
use serde_json::json;

fn message(id: &str, sender_type: SenderType, content: &str) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: "conv-1".to_string(),
        sender_type,
        sender_id: "sender".to_string(),
        content: content.to_string(),
        created_at: 0,
        previous_user_message_id: None,
    }
}

fn resources(value: serde_json::Value) -> MessageResources {
    serde_json::from_value(value).expect("resources fixture should deserialize")
}

fn search_turn(decision_id: &str, result_id: &str) -> MessageResources {
    resources(json!({
        "contexts": [
            { "kind": "search_result", "id": result_id, "query": "rust async", "hits": [] },
            {
                "kind": "fetch_result",
                "id": format!("{result_id}-fetch"),
                "url": "https://example.com",
                "status": { "state": "success" },
                "source_type": "search"
            }
        ],
        "steps": [
            { "kind": "search_decision", "id": decision_id, "should_search": true }
        ]
    }))
}

fn header_ids(blocks: &[TranscriptBlock]) -> Vec<String> {
    blocks
        .iter()
        .map(|block| match block {
            TranscriptBlock::SearchDecision(step) => step.id.clone(),
            TranscriptBlock::SearchResult(context) => context.id.clone(),
            other => other.kind().to_string(),
        })
        .collect()
}

#[test]
fn assistant_inherits_only_its_own_user_turn_header() {
    let messages = vec![
        message("u1", SenderType::User, "first"),
        message("a1", SenderType::Assistant, "answer one"),
        message("u2", SenderType::User, "second"),
        message("a2", SenderType::Model, "answer two"),
    ];
    let mut map = ResourceMap::new();
    map.insert("u1".to_string(), search_turn("sd-1", "sr-1"));

    let entries = assemble_history(
        &messages,
        &map,
        &UrlStatusTable::new(),
        &TranscriptOptions::default(),
    );

    assert_eq!(entries.len(), 4);
    assert_eq!(header_ids(&entries[1].header), vec!["sd-1", "sr-1"]);
    assert_eq!(entries[1].content, "answer one");
    assert!(entries[3].header.is_empty());
    assert!(entries[0].header.is_empty());
}

#[test]
fn content_blocks_switch_to_interleaved_order() {
    let messages = vec![
        message("u1", SenderType::User, "q"),
        message("a1", SenderType::Assistant, "ignored in interleaved mode"),
    ];
    let mut map = ResourceMap::new();
    map.insert(
        "a1".to_string(),
        resources(json!({
            "steps": [
                { "kind": "content_block", "id": "c2", "content": "After the tool.", "display_order": 2 },
                { "kind": "tool_call", "id": "t1", "name": "web_fetch", "status": "done", "display_order": 1 },
                { "kind": "thinking", "id": "th", "content": "plan" },
                { "kind": "content_block", "id": "c0", "content": "Before. ", "display_order": 0 }
            ]
        })),
    );

    let entries = assemble_history(
        &messages,
        &map,
        &UrlStatusTable::new(),
        &TranscriptOptions::default(),
    );
    let answer = &entries[1];

    assert_eq!(answer.mode, RenderMode::Interleaved);
    assert!(answer.content.is_empty());
    assert_eq!(
        answer.block_kinds(),
        vec!["thinking", "content", "tool_call", "content"]
    );
    assert_eq!(answer.rendered_text(), "Before. After the tool.");
}

#[test]
fn equal_display_orders_keep_arrival_order() {
    let messages = vec![message("a1", SenderType::Assistant, "")];
    let mut map = ResourceMap::new();
    map.insert(
        "a1".to_string(),
        resources(json!({
            "steps": [
                { "kind": "content_block", "id": "x", "content": "first", "display_order": 1 },
                { "kind": "content_block", "id": "y", "content": "second", "display_order": 1 }
            ]
        })),
    );

    let entries = assemble_history(
        &messages,
        &map,
        &UrlStatusTable::new(),
        &TranscriptOptions::default(),
    );
    assert_eq!(entries[0].rendered_text(), "firstsecond");
}

#[test]
fn simple_mode_lists_thinking_then_tool_calls_after_search_header() {
    let messages = vec![
        message("u1", SenderType::User, "q"),
        message("a1", SenderType::Assistant, "done"),
    ];
    let mut map = ResourceMap::new();
    map.insert("u1".to_string(), search_turn("sd-1", "sr-1"));
    map.insert(
        "a1".to_string(),
        resources(json!({
            "steps": [
                { "kind": "tool_call", "id": "t1", "name": "web_fetch", "status": "done", "display_order": 0 },
                { "kind": "thinking", "id": "th", "content": "plan" }
            ]
        })),
    );

    let entries = assemble_history(
        &messages,
        &map,
        &UrlStatusTable::new(),
        &TranscriptOptions::default(),
    );
    let answer = &entries[1];
    assert_eq!(answer.mode, RenderMode::Simple);
    assert_eq!(
        answer.block_kinds(),
        vec!["search_decision", "search_result", "thinking", "tool_call"]
    );
    assert_eq!(answer.content, "done");

    let hidden = TranscriptOptions {
        show_thinking: false,
        ..TranscriptOptions::default()
    };
    let entries = assemble_history(&messages, &map, &UrlStatusTable::new(), &hidden);
    assert_eq!(
        entries[1].block_kinds(),
        vec!["search_decision", "search_result", "tool_call"]
    );
}

#[test]
fn user_trailer_lists_attachments_standalone_fetches_then_url_statuses() {
    let messages = vec![message("u1", SenderType::User, "read https://example.com/a")];
    let mut map = ResourceMap::new();
    map.insert(
        "u1".to_string(),
        resources(json!({
            "attachments": [{ "type": "webpage", "url": "https://example.com/a" }],
            "contexts": [
                {
                    "kind": "fetch_result",
                    "id": "f-user",
                    "url": "https://example.com/a",
                    "status": { "state": "success" },
                    "source_type": "user"
                },
                {
                    "kind": "fetch_result",
                    "id": "f-search",
                    "url": "https://example.com/b",
                    "status": { "state": "success" },
                    "source_type": "search"
                }
            ]
        })),
    );
    let mut statuses = UrlStatusTable::new();
    statuses
        .entry("u1".to_string())
        .or_default()
        .insert("https://example.com/a".to_string(), UrlStatus::Fetching);

    let entries = assemble_history(&messages, &map, &statuses, &TranscriptOptions::default());
    let trailer = &entries[0].trailer;

    let kinds = trailer.iter().map(TranscriptBlock::kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec!["attachment", "fetch_result", "url_statuses"]);
    assert!(matches!(&trailer[1], TranscriptBlock::FetchResult(fetch) if fetch.id == "f-user"));
}

#[test]
fn url_statuses_are_suppressed_when_a_search_result_exists() {
    let messages = vec![message("u1", SenderType::User, "q")];
    let mut map = ResourceMap::new();
    map.insert("u1".to_string(), search_turn("sd-1", "sr-1"));
    let mut statuses = UrlStatusTable::new();
    statuses
        .entry("u1".to_string())
        .or_default()
        .insert("https://example.com".to_string(), UrlStatus::Success);

    let entries = assemble_history(&messages, &map, &statuses, &TranscriptOptions::default());
    assert!(entries[0].trailer.is_empty());

    let mut empty = UrlStatusTable::new();
    empty.insert("u1".to_string(), Default::default());
    let plain = vec![message("u1", SenderType::User, "q")];
    let entries = assemble_history(
        &plain,
        &ResourceMap::new(),
        &empty,
        &TranscriptOptions::default(),
    );
    assert!(entries[0].trailer.is_empty());
}

#[test]
fn leading_assistant_message_has_no_inherited_header() {
    let messages = vec![message("a0", SenderType::Assistant, "welcome")];
    let entries = assemble_history(
        &messages,
        &ResourceMap::new(),
        &UrlStatusTable::new(),
        &TranscriptOptions::default(),
    );
    assert!(entries[0].header.is_empty());
    assert_eq!(entries[0].content, "welcome");
}

#[test]
fn tool_call_without_content_blocks_still_renders() {
    let messages = vec![message("a1", SenderType::Assistant, "")];
    let mut map = ResourceMap::new();
    map.insert(
        "a1".to_string(),
        resources(json!({
            "steps": [
                { "kind": "tool_call", "id": "t1", "name": "web_search", "status": "error", "display_order": 0 }
            ]
        })),
    );
    let entries = assemble_history(
        &messages,
        &map,
        &UrlStatusTable::new(),
        &TranscriptOptions::default(),
    );
    assert_eq!(entries[0].mode, RenderMode::Simple);
    assert_eq!(entries[0].block_kinds(), vec!["tool_call"]);
}

#[test]
fn persisted_back_reference_beats_position() {
    let mut answer = message("a1", SenderType::Assistant, "");
    answer.previous_user_message_id = Some("u-older".to_string());
    let mut misdirected = message("a2", SenderType::Assistant, "");
    misdirected.previous_user_message_id = Some("a1".to_string());

    let messages = vec![
        message("u1", SenderType::User, "q"),
        answer,
        message("u2", SenderType::User, "q2"),
        misdirected,
        message("a3", SenderType::Assistant, ""),
    ];

    assert_eq!(
        link_previous_users(&messages),
        vec![None, Some("u-older"), None, Some("u2"), None]
    );
}
