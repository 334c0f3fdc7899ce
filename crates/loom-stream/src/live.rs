use loom_model::{SearchDecisionStep, SearchResultContext, StreamingToolCall, ToolCallStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// Inbound event from the response transport, scoped to one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LiveEvent {
    #[serde(rename = "started")]
    Started {
        conversation_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_message_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        #[serde(default)]
        pending_search_decision: bool,
    },
    #[serde(rename = "content_chunk")]
    ContentChunk {
        conversation_id: String,
        delta: String,
    },
    #[serde(rename = "reasoning_chunk")]
    ReasoningChunk {
        conversation_id: String,
        delta: String,
    },
    #[serde(rename = "tool_call_started")]
    ToolCallStarted {
        conversation_id: String,
        id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order: Option<u32>,
    },
    #[serde(rename = "tool_call_updated")]
    ToolCallUpdated {
        conversation_id: String,
        id: String,
        status: ToolCallStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Value>,
    },
    #[serde(rename = "tool_call_finished")]
    ToolCallFinished {
        conversation_id: String,
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "search_decision")]
    SearchDecision {
        conversation_id: String,
        step: SearchDecisionStep,
    },
    #[serde(rename = "search_result")]
    SearchResult {
        conversation_id: String,
        context: SearchResultContext,
    },
    #[serde(rename = "completed")]
    Completed {
        conversation_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },
    #[serde(rename = "failed")]
    Failed {
        conversation_id: String,
        error: String,
    },
    #[serde(rename = "stopped")]
    Stopped { conversation_id: String },
    #[serde(rename = "reset")]
    Reset { conversation_id: String },
}

impl LiveEvent {
    pub fn conversation_id(&self) -> &str {
        match self {
            Self::Started { conversation_id, .. }
            | Self::ContentChunk { conversation_id, .. }
            | Self::ReasoningChunk { conversation_id, .. }
            | Self::ToolCallStarted { conversation_id, .. }
            | Self::ToolCallUpdated { conversation_id, .. }
            | Self::ToolCallFinished { conversation_id, .. }
            | Self::SearchDecision { conversation_id, .. }
            | Self::SearchResult { conversation_id, .. }
            | Self::Completed { conversation_id, .. }
            | Self::Failed { conversation_id, .. }
            | Self::Stopped { conversation_id }
            | Self::Reset { conversation_id } => conversation_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::ContentChunk { .. } => "content_chunk",
            Self::ReasoningChunk { .. } => "reasoning_chunk",
            Self::ToolCallStarted { .. } => "tool_call_started",
            Self::ToolCallUpdated { .. } => "tool_call_updated",
            Self::ToolCallFinished { .. } => "tool_call_finished",
            Self::SearchDecision { .. } => "search_decision",
            Self::SearchResult { .. } => "search_result",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Stopped { .. } => "stopped",
            Self::Reset { .. } => "reset",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LivePhase {
    #[default]
    #[serde(rename = "idle")]
    Idle,
    /// Started, but no content, reasoning or tool call has arrived yet.
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "streaming")]
    Streaming,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "stopped")]
    Stopped,
    #[serde(rename = "failed")]
    Failed,
}

impl LivePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

/// Immutable snapshot of the in-flight response for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveState {
    pub conversation_id: String,
    pub phase: LivePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub streaming_content: String,
    #[serde(default)]
    pub streaming_reasoning: String,
    #[serde(default)]
    pub tool_calls: Vec<StreamingToolCall>,
    #[serde(default)]
    pub pending_search_decision: bool,
    #[serde(default)]
    pub search_decisions: Vec<SearchDecisionStep>,
    #[serde(default)]
    pub search_results: Vec<SearchResultContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LiveState {
    pub fn idle(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            ..Self::default()
        }
    }

    pub fn is_waiting_for_ai(&self) -> bool {
        self.phase == LivePhase::Waiting
    }

    pub fn is_stream_active(&self) -> bool {
        matches!(self.phase, LivePhase::Waiting | LivePhase::Streaming)
    }

    pub fn has_live_message(&self) -> bool {
        self.phase != LivePhase::Idle
    }

    pub fn apply(&self, event: &LiveEvent) -> LiveState {
        reduce(self, event)
    }

    fn accepts(&self, conversation_id: &str) -> bool {
        self.conversation_id.is_empty() || self.conversation_id == conversation_id
    }

    fn ensure_started(&mut self) {
        if self.phase == LivePhase::Idle {
            self.phase = LivePhase::Waiting;
        }
    }

    fn mark_streaming(&mut self) {
        if matches!(self.phase, LivePhase::Idle | LivePhase::Waiting) {
            self.phase = LivePhase::Streaming;
        }
    }

    fn tool_call_mut(&mut self, id: &str) -> &mut StreamingToolCall {
        if let Some(index) = self.tool_calls.iter().position(|call| call.id == id) {
            return &mut self.tool_calls[index];
        }

        debug!(
            conversation_id = %self.conversation_id,
            tool_call_id = id,
            "tool call update arrived before its start; capturing prefixes now"
        );
        let call = self.capture_tool_call(id, String::new(), Value::Null, None);
        self.tool_calls.push(call);
        let last = self.tool_calls.len() - 1;
        &mut self.tool_calls[last]
    }

    fn capture_tool_call(
        &self,
        id: &str,
        name: String,
        arguments: Value,
        order: Option<u32>,
    ) -> StreamingToolCall {
        let next_order = u32::try_from(self.tool_calls.len()).unwrap_or(u32::MAX);
        StreamingToolCall {
            id: id.to_string(),
            name,
            order: order.unwrap_or(next_order),
            status: ToolCallStatus::Pending,
            content_before: self.streaming_content.clone(),
            reasoning_before: self.streaming_reasoning.clone(),
            arguments,
            result: None,
            error: None,
        }
    }

    fn settle_active_tool_calls(&mut self, status: ToolCallStatus) {
        for call in self.tool_calls.iter_mut().filter(|call| call.status.is_active()) {
            call.status = status;
        }
    }
}

/// Produces the next snapshot; `state` itself is never modified.
pub fn reduce(state: &LiveState, event: &LiveEvent) -> LiveState {
    let conversation_id = event.conversation_id();
    if !state.accepts(conversation_id) {
        trace!(
            expected = %state.conversation_id,
            received = conversation_id,
            kind = event.kind(),
            "ignoring live event for another conversation"
        );
        return state.clone();
    }

    match event {
        LiveEvent::Started {
            user_message_id,
            message_id,
            pending_search_decision,
            ..
        } => {
            return LiveState {
                conversation_id: conversation_id.to_string(),
                phase: LivePhase::Waiting,
                user_message_id: user_message_id.clone(),
                message_id: message_id.clone(),
                pending_search_decision: *pending_search_decision,
                ..LiveState::default()
            };
        }
        LiveEvent::Reset { .. } => return LiveState::idle(conversation_id),
        LiveEvent::Completed { .. } | LiveEvent::Stopped { .. }
            if state.phase == LivePhase::Idle =>
        {
            return state.clone();
        }
        _ if state.phase.is_terminal() => {
            trace!(
                conversation_id,
                kind = event.kind(),
                phase = ?state.phase,
                "ignoring live event after the response settled"
            );
            return state.clone();
        }
        _ => {}
    }

    let mut next = state.clone();
    next.conversation_id = conversation_id.to_string();

    match event {
        LiveEvent::ContentChunk { delta, .. } => {
            next.ensure_started();
            if !delta.is_empty() {
                next.mark_streaming();
                next.streaming_content.push_str(delta);
            }
        }
        LiveEvent::ReasoningChunk { delta, .. } => {
            next.ensure_started();
            if !delta.is_empty() {
                next.mark_streaming();
                next.streaming_reasoning.push_str(delta);
            }
        }
        LiveEvent::ToolCallStarted {
            id,
            name,
            arguments,
            order,
            ..
        } => {
            next.mark_streaming();
            if let Some(existing) = next.tool_calls.iter_mut().find(|call| call.id == *id) {
                existing.name = name.clone();
                if !arguments.is_null() {
                    existing.arguments = arguments.clone();
                }
            } else {
                let call = next.capture_tool_call(id, name.clone(), arguments.clone(), *order);
                next.tool_calls.push(call);
            }
        }
        LiveEvent::ToolCallUpdated {
            id,
            status,
            arguments,
            ..
        } => {
            next.mark_streaming();
            let call = next.tool_call_mut(id);
            call.status = *status;
            if let Some(arguments) = arguments {
                call.arguments = arguments.clone();
            }
        }
        LiveEvent::ToolCallFinished {
            id, result, error, ..
        } => {
            next.mark_streaming();
            let call = next.tool_call_mut(id);
            call.status = if error.is_some() {
                ToolCallStatus::Error
            } else {
                ToolCallStatus::Done
            };
            call.result = result.clone();
            call.error = error.clone();
        }
        LiveEvent::SearchDecision { step, .. } => {
            next.ensure_started();
            match next.search_decisions.iter_mut().find(|known| known.id == step.id) {
                Some(known) => *known = step.clone(),
                None => next.search_decisions.push(step.clone()),
            }
        }
        LiveEvent::SearchResult { context, .. } => {
            next.ensure_started();
            match next
                .search_results
                .iter_mut()
                .find(|known| known.id == context.id)
            {
                Some(known) => *known = context.clone(),
                None => next.search_results.push(context.clone()),
            }
        }
        LiveEvent::Completed { message_id, .. } => {
            if message_id.is_some() {
                next.message_id = message_id.clone();
            }
            next.phase = LivePhase::Completed;
            next.settle_active_tool_calls(ToolCallStatus::Done);
        }
        LiveEvent::Failed { error, .. } => {
            next.phase = LivePhase::Failed;
            next.error = Some(error.clone());
            next.settle_active_tool_calls(ToolCallStatus::Error);
        }
        LiveEvent::Stopped { .. } => {
            next.phase = LivePhase::Stopped;
            next.settle_active_tool_calls(ToolCallStatus::Error);
        }
        LiveEvent::Started { .. } | LiveEvent::Reset { .. } => {}
    }

    next
}
