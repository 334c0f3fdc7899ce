use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    Attachment, ContentBlockStep, ContextEnrichment, FetchResultContext, FetchSource,
    ProcessStep, SearchDecisionStep, SearchResultContext,
};

/// Everything loaded alongside a persisted message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResources {
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub contexts: Vec<ContextEnrichment>,
    #[serde(default)]
    pub steps: Vec<ProcessStep>,
}

pub type ResourceMap = HashMap<String, MessageResources>;

static EMPTY_RESOURCES: MessageResources = MessageResources {
    attachments: Vec::new(),
    contexts: Vec::new(),
    steps: Vec::new(),
};

/// Looks up a message's resources, treating a missing entry as empty.
pub fn resources_for<'a>(resources: &'a ResourceMap, message_id: &str) -> &'a MessageResources {
    resources.get(message_id).unwrap_or(&EMPTY_RESOURCES)
}

impl MessageResources {
    pub fn search_results(&self) -> impl Iterator<Item = &SearchResultContext> {
        self.contexts.iter().filter_map(|context| match context {
            ContextEnrichment::SearchResult(result) => Some(result),
            ContextEnrichment::FetchResult(_) => None,
        })
    }

    pub fn has_search_result(&self) -> bool {
        self.contexts.iter().any(ContextEnrichment::is_search_result)
    }

    /// Fetch results not already nested inside a search-result preview.
    pub fn standalone_fetch_results(&self) -> impl Iterator<Item = &FetchResultContext> {
        self.contexts.iter().filter_map(|context| match context {
            ContextEnrichment::FetchResult(fetch) if fetch.source_type != FetchSource::Search => {
                Some(fetch)
            }
            _ => None,
        })
    }

    pub fn search_decisions(&self) -> impl Iterator<Item = &SearchDecisionStep> {
        self.steps.iter().filter_map(|step| match step {
            ProcessStep::SearchDecision(decision) => Some(decision),
            _ => None,
        })
    }

    pub fn content_blocks(&self) -> impl Iterator<Item = &ContentBlockStep> {
        self.steps.iter().filter_map(|step| match step {
            ProcessStep::ContentBlock(block) => Some(block),
            _ => None,
        })
    }

    pub fn has_content_blocks(&self) -> bool {
        self.content_blocks().next().is_some()
    }
}
