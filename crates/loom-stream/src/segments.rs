//! Splits accumulated model output into visible answer text and thinking text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    EmptyOpen,
    EmptyClose,
    IdenticalPair,
}

impl MarkerError {
    pub fn message(&self) -> &'static str {
        match self {
            MarkerError::EmptyOpen => "opening marker must not be empty",
            MarkerError::EmptyClose => "closing marker must not be empty",
            MarkerError::IdenticalPair => "opening and closing markers must differ",
        }
    }
}

impl std::fmt::Display for MarkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for MarkerError {}

/// An inline opening/closing tag pair such as `<think>` / `</think>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPair {
    open: String,
    close: String,
}

impl MarkerPair {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self, MarkerError> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() {
            return Err(MarkerError::EmptyOpen);
        }
        if close.is_empty() {
            return Err(MarkerError::EmptyClose);
        }
        if open == close {
            return Err(MarkerError::IdenticalPair);
        }
        Ok(Self { open, close })
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    fn builtin(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    pairs: Vec<MarkerPair>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            pairs: vec![
                MarkerPair::builtin("<think>", "</think>"),
                MarkerPair::builtin("<thinking>", "</thinking>"),
                MarkerPair::builtin("<thought>", "</thought>"),
            ],
        }
    }
}

impl MarkerSet {
    /// Falls back to the default set when `pairs` is empty.
    pub fn new(pairs: Vec<MarkerPair>) -> Self {
        if pairs.is_empty() {
            return Self::default();
        }
        Self { pairs }
    }

    pub fn pairs(&self) -> &[MarkerPair] {
        &self.pairs
    }

    /// Earliest opening marker in `text`; the longest marker wins a tie.
    fn find_open(&self, text: &str) -> Option<(usize, &MarkerPair)> {
        self.pairs
            .iter()
            .filter_map(|pair| text.find(pair.open.as_str()).map(|idx| (idx, pair)))
            .min_by(|(left_idx, left), (right_idx, right)| {
                left_idx
                    .cmp(right_idx)
                    .then_with(|| right.open.len().cmp(&left.open.len()))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInput<'a> {
    pub raw_text: &'a str,
    pub native_reasoning: &'a str,
    /// Whether the response producing `raw_text` is still in flight.
    pub stream_active: bool,
}

impl<'a> SegmentInput<'a> {
    pub fn finished(raw_text: &'a str) -> Self {
        Self {
            raw_text,
            native_reasoning: "",
            stream_active: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segments {
    pub visible_content: String,
    pub thinking_content: Option<String>,
    pub is_thinking_in_progress: bool,
}

impl Segments {
    pub fn has_thinking(&self) -> bool {
        self.thinking_content
            .as_deref()
            .is_some_and(|thinking| !thinking.is_empty())
    }
}

/// Native reasoning, when present, is authoritative over inline markup; its
/// progress follows the stream rather than marker closure.
pub fn extract_segments(input: &SegmentInput<'_>, markers: &MarkerSet) -> Segments {
    let parsed = parse_inline(input.raw_text, markers, input.stream_active);

    if !input.native_reasoning.is_empty() {
        return Segments {
            visible_content: parsed.visible,
            thinking_content: Some(input.native_reasoning.to_string()),
            is_thinking_in_progress: input.stream_active,
        };
    }

    if !parsed.saw_marker {
        return Segments {
            visible_content: parsed.visible,
            thinking_content: None,
            is_thinking_in_progress: false,
        };
    }

    Segments {
        visible_content: parsed.visible,
        thinking_content: Some(parsed.blocks.join("\n\n")),
        is_thinking_in_progress: parsed.unclosed,
    }
}

/// Visible text of a completed fragment with every marker block removed.
pub fn strip_markers(text: &str, markers: &MarkerSet) -> String {
    parse_inline(text, markers, false).visible
}

struct InlineParse {
    visible: String,
    blocks: Vec<String>,
    saw_marker: bool,
    unclosed: bool,
}

fn parse_inline(raw: &str, markers: &MarkerSet, stream_active: bool) -> InlineParse {
    let mut visible = String::with_capacity(raw.len());
    let mut blocks = Vec::new();
    let mut saw_marker = false;
    let mut unclosed = false;
    let mut rest = raw;

    loop {
        let Some((start, pair)) = markers.find_open(rest) else {
            let tail = if stream_active {
                hold_back_partial(rest, markers.pairs().iter().map(MarkerPair::open))
            } else {
                rest
            };
            visible.push_str(tail);
            break;
        };

        saw_marker = true;
        visible.push_str(&rest[..start]);
        let after_open = &rest[start + pair.open.len()..];

        match after_open.find(pair.close.as_str()) {
            Some(end) => {
                let block = after_open[..end].trim();
                if !block.is_empty() {
                    blocks.push(block.to_string());
                }
                rest = &after_open[end + pair.close.len()..];
            }
            None => {
                let partial = if stream_active {
                    hold_back_partial(after_open, std::iter::once(pair.close()))
                } else {
                    after_open
                };
                let partial = partial.trim();
                if !partial.is_empty() {
                    blocks.push(partial.to_string());
                }
                unclosed = true;
                break;
            }
        }
    }

    if saw_marker {
        let leading = visible.len() - visible.trim_start().len();
        visible.drain(..leading);
    }

    InlineParse {
        visible,
        blocks,
        saw_marker,
        unclosed,
    }
}

/// Drops a trailing fragment that could still grow into one of `markers`.
fn hold_back_partial<'a, 'm>(text: &'a str, markers: impl Iterator<Item = &'m str>) -> &'a str {
    let mut held = 0usize;
    for marker in markers {
        for prefix_len in (1..marker.len()).rev() {
            if prefix_len <= held {
                break;
            }
            let Some(prefix) = marker.get(..prefix_len) else {
                continue;
            };
            if text.ends_with(prefix) {
                held = prefix_len;
                break;
            }
        }
    }
    &text[..text.len() - held]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(raw: &str) -> Segments {
        extract_segments(
            &SegmentInput {
                raw_text: raw,
                native_reasoning: "",
                stream_active: true,
            },
            &MarkerSet::default(),
        )
    }

    #[test]
    fn hold_back_keeps_text_without_marker_prefix() {
        assert_eq!(hold_back_partial("hello", ["<think>"].into_iter()), "hello");
        assert_eq!(hold_back_partial("hello <th", ["<think>"].into_iter()), "hello ");
        assert_eq!(hold_back_partial("a <", ["<think>"].into_iter()), "a ");
    }

    #[test]
    fn complete_marker_is_not_held_back() {
        assert_eq!(
            hold_back_partial("x<think>", ["<think>"].into_iter()),
            "x<think>"
        );
    }

    #[test]
    fn partial_opening_marker_is_hidden_while_streaming_only() {
        assert_eq!(live("Answer <thin").visible_content, "Answer ");
        let finished = extract_segments(
            &SegmentInput::finished("Answer <thin"),
            &MarkerSet::default(),
        );
        assert_eq!(finished.visible_content, "Answer <thin");
        assert_eq!(finished.thinking_content, None);
    }

    #[test]
    fn partial_closing_marker_is_hidden_from_thinking() {
        let segments = live("<think>weighing options</thi");
        assert_eq!(segments.thinking_content.as_deref(), Some("weighing options"));
        assert!(segments.is_thinking_in_progress);
    }

    #[test]
    fn longest_marker_wins_at_same_position() {
        let markers = MarkerSet::new(vec![
            MarkerPair::new("<t>", "</t>").expect("valid pair"),
            MarkerPair::new("<t>>", "</t>>").expect("valid pair"),
        ]);
        let found = markers.find_open("ab<t>>c").map(|(idx, pair)| (idx, pair.open()));
        assert_eq!(found, Some((2, "<t>>")));
    }

    #[test]
    fn marker_pair_validation_rejects_degenerate_pairs() {
        assert_eq!(MarkerPair::new("", "</x>"), Err(MarkerError::EmptyOpen));
        assert_eq!(MarkerPair::new("<x>", ""), Err(MarkerError::EmptyClose));
        assert_eq!(MarkerPair::new("|", "|"), Err(MarkerError::IdenticalPair));
        assert_eq!(
            MarkerError::EmptyOpen.to_string(),
            "opening marker must not be empty"
        );
    }

    #[test]
    fn empty_marker_list_falls_back_to_defaults() {
        assert_eq!(MarkerSet::new(vec![]), MarkerSet::default());
        assert_eq!(MarkerSet::default().pairs().len(), 3);
    }
}
