//! Data model shared by the segment extractor and the transcript assembler.

mod resources;
mod types;

pub use resources::{MessageResources, ResourceMap, resources_for};
pub use types::{
    Attachment, ContentBlockStep, ContextEnrichment, ConversationId, DisplayRole,
    FetchResultContext, FetchSource, Message, MessageId, ProcessStep, SearchDecisionStep,
    SearchHit, SearchResultContext, SenderType, StreamingToolCall, ThinkingStep, ToolCallStatus,
    ToolCallStep, UrlStatus, UrlStatusMap, UrlStatusTable,
};
