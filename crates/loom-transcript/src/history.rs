use loom_model::{DisplayRole, Message, ProcessStep, ResourceMap, UrlStatusTable, resources_for};
use tracing::debug;

use crate::entry::{RenderMode, ToolCallBlock, TranscriptBlock, TranscriptEntry, inherited_header};
use crate::options::TranscriptOptions;

/// For each message, the id of the user message it answers. User messages
/// link to nothing. A persisted `previous_user_message_id` wins over
/// position, which only links an immediately preceding user message.
pub fn link_previous_users(messages: &[Message]) -> Vec<Option<&str>> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            if message.is_user() {
                return None;
            }

            if let Some(linked) = message.previous_user_message_id.as_deref() {
                match messages.iter().find(|candidate| candidate.id == linked) {
                    Some(candidate) if !candidate.is_user() => {
                        debug!(
                            message_id = %message.id,
                            linked,
                            "persisted back-reference points at a non-user message; using position"
                        );
                    }
                    // Absent from the list is fine: the page may not include it.
                    _ => return Some(linked),
                }
            }

            index
                .checked_sub(1)
                .and_then(|previous| messages.get(previous))
                .filter(|previous| previous.is_user())
                .map(|previous| previous.id.as_str())
        })
        .collect()
}

pub fn assemble_history(
    messages: &[Message],
    resources: &ResourceMap,
    url_statuses: &UrlStatusTable,
    options: &TranscriptOptions,
) -> Vec<TranscriptEntry> {
    let links = link_previous_users(messages);
    messages
        .iter()
        .zip(links)
        .map(|(message, link)| match message.display_role() {
            DisplayRole::User => user_entry(message, resources, url_statuses, options),
            DisplayRole::Assistant => assistant_entry(message, link, resources, options),
        })
        .collect()
}

fn user_entry(
    message: &Message,
    resources: &ResourceMap,
    url_statuses: &UrlStatusTable,
    options: &TranscriptOptions,
) -> TranscriptEntry {
    let own = resources_for(resources, &message.id);
    let mut entry = TranscriptEntry::new(message.id.clone(), DisplayRole::User);
    entry.content = message.content.clone();

    entry.trailer.extend(
        own.attachments
            .iter()
            .cloned()
            .map(|attachment| TranscriptBlock::Attachment { attachment }),
    );
    entry.trailer.extend(
        own.standalone_fetch_results()
            .cloned()
            .map(TranscriptBlock::FetchResult),
    );

    // The search-result preview already owns url display.
    if options.show_url_statuses && !own.has_search_result() {
        if let Some(statuses) = url_statuses.get(&message.id).filter(|map| !map.is_empty()) {
            entry.trailer.push(TranscriptBlock::url_statuses(statuses));
        }
    }

    entry
}

fn assistant_entry(
    message: &Message,
    previous_user: Option<&str>,
    resources: &ResourceMap,
    options: &TranscriptOptions,
) -> TranscriptEntry {
    let own = resources_for(resources, &message.id);
    let mut entry = TranscriptEntry::new(message.id.clone(), DisplayRole::Assistant);
    if let Some(user_id) = previous_user {
        entry.header = inherited_header(resources_for(resources, user_id));
    }

    if own.has_content_blocks() {
        let mut ordered = own
            .steps
            .iter()
            .filter(|step| !matches!(step, ProcessStep::SearchDecision(_)))
            .collect::<Vec<_>>();
        // Stable: equal orders keep their arrival order, unordered thinking leads.
        ordered.sort_by_key(|step| step.display_order());

        entry.mode = RenderMode::Interleaved;
        entry.body = ordered
            .into_iter()
            .filter_map(|step| settled_step_block(step, options))
            .collect();
        return entry;
    }

    entry.header.extend(
        own.steps
            .iter()
            .filter(|step| matches!(step, ProcessStep::Thinking(_)))
            .filter_map(|step| settled_step_block(step, options)),
    );
    entry.header.extend(
        own.steps
            .iter()
            .filter(|step| matches!(step, ProcessStep::ToolCall(_)))
            .filter_map(|step| settled_step_block(step, options)),
    );
    entry.content = message.content.clone();
    entry
}

fn settled_step_block(step: &ProcessStep, options: &TranscriptOptions) -> Option<TranscriptBlock> {
    match step {
        ProcessStep::Thinking(thinking) => {
            options.show_thinking.then(|| TranscriptBlock::Thinking {
                content: thinking.content.clone(),
                in_progress: false,
            })
        }
        ProcessStep::ToolCall(call) => {
            Some(TranscriptBlock::ToolCall(ToolCallBlock::from_step(call)))
        }
        ProcessStep::ContentBlock(block) => Some(TranscriptBlock::Content {
            text: block.content.clone(),
            streaming: false,
        }),
        ProcessStep::SearchDecision(_) => None,
    }
}
