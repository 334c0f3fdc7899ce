use loom_model::{
    Attachment, DisplayRole, FetchResultContext, MessageResources, SearchDecisionStep,
    SearchResultContext, StreamingToolCall, ToolCallStatus, ToolCallStep, UrlStatus, UrlStatusMap,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Header blocks followed by the message content as one unit.
    #[serde(rename = "simple")]
    Simple,
    /// Content is reconstructed from ordered blocks in `body`.
    #[serde(rename = "interleaved")]
    Interleaved,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallBlock {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub status: ToolCallStatus,
    pub running: bool,
}

impl ToolCallBlock {
    pub(crate) fn from_step(step: &ToolCallStep) -> Self {
        Self {
            id: step.id.clone(),
            name: step.name.clone(),
            arguments: step.arguments.clone(),
            result: step.result.clone(),
            status: step.status,
            running: false,
        }
    }

    pub(crate) fn from_live(call: &StreamingToolCall) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            // A failed call shows its error where the output would go.
            result: call.result.clone().or_else(|| call.error.clone()),
            status: call.status,
            running: call.status.is_active(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStatusLine {
    pub url: String,
    pub status: UrlStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block")]
pub enum TranscriptBlock {
    #[serde(rename = "search_decision")]
    SearchDecision(SearchDecisionStep),
    #[serde(rename = "search_result")]
    SearchResult(SearchResultContext),
    #[serde(rename = "thinking")]
    Thinking { content: String, in_progress: bool },
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallBlock),
    #[serde(rename = "content")]
    Content { text: String, streaming: bool },
    #[serde(rename = "attachment")]
    Attachment { attachment: Attachment },
    #[serde(rename = "fetch_result")]
    FetchResult(FetchResultContext),
    #[serde(rename = "url_statuses")]
    UrlStatuses { lines: Vec<UrlStatusLine> },
}

impl TranscriptBlock {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SearchDecision(_) => "search_decision",
            Self::SearchResult(_) => "search_result",
            Self::Thinking { .. } => "thinking",
            Self::ToolCall(_) => "tool_call",
            Self::Content { .. } => "content",
            Self::Attachment { .. } => "attachment",
            Self::FetchResult(_) => "fetch_result",
            Self::UrlStatuses { .. } => "url_statuses",
        }
    }

    pub(crate) fn url_statuses(statuses: &UrlStatusMap) -> Self {
        Self::UrlStatuses {
            lines: statuses
                .iter()
                .map(|(url, status)| UrlStatusLine {
                    url: url.clone(),
                    status: status.clone(),
                })
                .collect(),
        }
    }
}

/// One renderable row of the transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub message_id: String,
    pub role: DisplayRole,
    pub mode: RenderMode,
    /// Shown above the answer: search decision, search results and, in
    /// simple mode, thinking and tool calls.
    pub header: Vec<TranscriptBlock>,
    /// Ordered thinking/tool-call/content blocks in interleaved mode.
    pub body: Vec<TranscriptBlock>,
    /// Empty in interleaved mode.
    pub content: String,
    /// Shown after a user message: attachments, fetch results, url statuses.
    pub trailer: Vec<TranscriptBlock>,
    pub is_streaming: bool,
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptEntry {
    pub(crate) fn new(message_id: String, role: DisplayRole) -> Self {
        Self {
            message_id,
            role,
            mode: RenderMode::Simple,
            header: vec![],
            body: vec![],
            content: String::new(),
            trailer: vec![],
            is_streaming: false,
            is_loading: false,
            error: None,
        }
    }

    /// Answer text in display order: body content blocks, then `content`.
    pub fn rendered_text(&self) -> String {
        let mut text = self
            .body
            .iter()
            .filter_map(|block| match block {
                TranscriptBlock::Content { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<String>();
        text.push_str(&self.content);
        text
    }

    pub fn block_kinds(&self) -> Vec<&'static str> {
        self.header
            .iter()
            .chain(self.body.iter())
            .map(TranscriptBlock::kind)
            .collect()
    }
}

/// Search decisions first, then search results, each deduplicated by id.
pub(crate) fn search_header<'a>(
    decisions: impl IntoIterator<Item = &'a SearchDecisionStep>,
    results: impl IntoIterator<Item = &'a SearchResultContext>,
) -> Vec<TranscriptBlock> {
    let mut header = Vec::new();
    let mut seen_decisions: Vec<&str> = Vec::new();
    for decision in decisions {
        if seen_decisions.contains(&decision.id.as_str()) {
            continue;
        }
        seen_decisions.push(&decision.id);
        header.push(TranscriptBlock::SearchDecision(decision.clone()));
    }

    let mut seen_results: Vec<&str> = Vec::new();
    for result in results {
        if seen_results.contains(&result.id.as_str()) {
            continue;
        }
        seen_results.push(&result.id);
        header.push(TranscriptBlock::SearchResult(result.clone()));
    }
    header
}

pub(crate) fn inherited_header(user_turn: &MessageResources) -> Vec<TranscriptBlock> {
    search_header(user_turn.search_decisions(), user_turn.search_results())
}
