use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type MessageId = String;
pub type ConversationId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SenderType {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
    #[serde(rename = "assistant")]
    Assistant,
}

impl SenderType {
    /// Both `model` and `assistant` senders render on the assistant side.
    pub fn display_role(self) -> DisplayRole {
        match self {
            Self::User => DisplayRole::User,
            Self::Model | Self::Assistant => DisplayRole::Assistant,
        }
    }

    pub fn is_user(self) -> bool {
        matches!(self, Self::User)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_type: SenderType,
    pub sender_id: String,
    pub content: String,
    pub created_at: i64,
    /// Persisted link from an assistant reply to the user turn it answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_user_message_id: Option<MessageId>,
}

impl Message {
    pub fn display_role(&self) -> DisplayRole {
        self.sender_type.display_role()
    }

    pub fn is_user(&self) -> bool {
        self.sender_type.is_user()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingStep {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallStep {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub status: ToolCallStatus,
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlockStep {
    pub id: String,
    pub content: String,
    pub display_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDecisionStep {
    pub id: String,
    pub should_search: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Side-channel event attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ProcessStep {
    #[serde(rename = "thinking")]
    Thinking(ThinkingStep),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallStep),
    #[serde(rename = "content_block")]
    ContentBlock(ContentBlockStep),
    #[serde(rename = "search_decision")]
    SearchDecision(SearchDecisionStep),
}

impl ProcessStep {
    pub fn id(&self) -> &str {
        match self {
            Self::Thinking(step) => &step.id,
            Self::ToolCall(step) => &step.id,
            Self::ContentBlock(step) => &step.id,
            Self::SearchDecision(step) => &step.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Thinking(_) => "thinking",
            Self::ToolCall(_) => "tool_call",
            Self::ContentBlock(_) => "content_block",
            Self::SearchDecision(_) => "search_decision",
        }
    }

    /// Search decisions carry no position of their own.
    pub fn display_order(&self) -> Option<i64> {
        match self {
            Self::Thinking(step) => step.display_order,
            Self::ToolCall(step) => Some(step.display_order),
            Self::ContentBlock(step) => Some(step.display_order),
            Self::SearchDecision(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultContext {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchSource {
    /// Fetched as part of a search, shown inside the search-result preview.
    #[serde(rename = "search")]
    Search,
    #[serde(rename = "user")]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResultContext {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: UrlStatus,
    pub source_type: FetchSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ContextEnrichment {
    #[serde(rename = "search_result")]
    SearchResult(SearchResultContext),
    #[serde(rename = "fetch_result")]
    FetchResult(FetchResultContext),
}

impl ContextEnrichment {
    pub fn id(&self) -> &str {
        match self {
            Self::SearchResult(context) => &context.id,
            Self::FetchResult(context) => &context.id,
        }
    }

    pub fn is_search_result(&self) -> bool {
        matches!(self, Self::SearchResult(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Attachment {
    #[serde(rename = "file")]
    File {
        name: String,
        path: String,
        #[serde(default)]
        size_bytes: u64,
    },
    #[serde(rename = "image")]
    Image {
        name: String,
        path: String,
        mime_type: String,
    },
    #[serde(rename = "webpage")]
    Webpage {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum UrlStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "fetching")]
    Fetching,
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "failed")]
    Failed { reason: String },
}

/// Per-message url → fetch status. Ordered so rendering is stable.
pub type UrlStatusMap = BTreeMap<String, UrlStatus>;
pub type UrlStatusTable = HashMap<MessageId, UrlStatusMap>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolCallStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "error")]
    Error,
}

impl ToolCallStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

/// A tool call observed while a response is still in flight.
///
/// `content_before` and `reasoning_before` are cumulative snapshots of the
/// answer and reasoning text at the moment the call started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingToolCall {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub order: u32,
    pub status: ToolCallStatus,
    #[serde(default)]
    pub content_before: String,
    #[serde(default)]
    pub reasoning_before: String,
    #[serde(default)]
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamingToolCall {
    pub fn has_before_segments(&self) -> bool {
        !self.content_before.is_empty() || !self.reasoning_before.is_empty()
    }
}
