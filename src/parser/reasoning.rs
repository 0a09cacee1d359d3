// ABOUTME: Reasoning block splitting for thinking-style model output
// ABOUTME: Separates <think> reasoning from final content, both whole and streamed

use serde::Serialize;
use std::collections::HashMap;

use super::error::{ParseError, Result};

pub const THINK_START: &str = "<think>";
pub const THINK_END: &str = "</think>";

/// Newlines the model emits between the reasoning block and the answer
const SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeltaMessage {
    pub reasoning_content: Option<String>,
    pub content: Option<String>,
}

/// One streaming step: text and token ids before and after the new delta
#[derive(Debug, Clone, Copy)]
pub struct StreamDelta<'a> {
    pub previous_text: &'a str,
    pub current_text: &'a str,
    pub delta_text: &'a str,
    pub previous_token_ids: &'a [u32],
    pub current_token_ids: &'a [u32],
    pub delta_token_ids: &'a [u32],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningParser {
    start_token_id: u32,
    end_token_id: u32,
}

impl ReasoningParser {
    pub fn new(start_token_id: u32, end_token_id: u32) -> Self {
        Self {
            start_token_id,
            end_token_id,
        }
    }

    /// Look up the think markers in a tokenizer vocabulary
    pub fn from_vocab(vocab: &HashMap<String, u32>) -> Result<Self> {
        let lookup = |token: &str| {
            vocab
                .get(token)
                .copied()
                .ok_or_else(|| ParseError::MissingToken(token.to_string()))
        };

        Ok(Self::new(lookup(THINK_START)?, lookup(THINK_END)?))
    }

    /// Whether the reasoning block has been closed in these token ids
    pub fn is_reasoning_end(&self, token_ids: &[u32]) -> bool {
        token_ids.contains(&self.end_token_id)
    }

    /// Split a complete output into (reasoning, content)
    pub fn extract_reasoning(&self, output: &str) -> (Option<String>, Option<String>) {
        split_reasoning(output)
    }

    /// Classify one streamed delta as reasoning, content, or both
    pub fn extract_reasoning_streaming(&self, delta: &StreamDelta<'_>) -> Option<DeltaMessage> {
        if delta.delta_token_ids == [self.start_token_id] {
            return None;
        }

        if self.is_reasoning_end(delta.previous_token_ids) {
            let content = match (
                after_end(delta.previous_text),
                after_end(delta.current_text),
            ) {
                (Some(previous), Some(current)) => visible_content(current)
                    .strip_prefix(visible_content(previous))
                    .unwrap_or(delta.delta_text),
                _ => delta.delta_text,
            };
            return Some(DeltaMessage {
                reasoning_content: None,
                content: non_empty(content),
            });
        }

        if self.is_reasoning_end(delta.delta_token_ids) {
            let (reasoning, content) = delta
                .delta_text
                .split_once(THINK_END)
                .unwrap_or((delta.delta_text, ""));
            return Some(DeltaMessage {
                reasoning_content: Some(without_start(reasoning).to_string()),
                content: non_empty(visible_content(content)),
            });
        }

        Some(DeltaMessage {
            reasoning_content: Some(without_start(delta.delta_text).to_string()),
            content: None,
        })
    }

    /// Token ids after the closing marker
    pub fn extract_content_ids(&self, token_ids: &[u32]) -> Vec<u32> {
        match token_ids.iter().position(|&id| id == self.end_token_id) {
            Some(index) => token_ids[index + 1..].to_vec(),
            None => Vec::new(),
        }
    }
}

/// Split a complete output into (reasoning, content)
///
/// Output without a closing marker is still reasoning; the opening
/// marker is optional because chat templates often emit it themselves.
pub fn split_reasoning(output: &str) -> (Option<String>, Option<String>) {
    let output = match output.split_once(THINK_START) {
        Some((_, rest)) => rest,
        None => output,
    };

    match output.split_once(THINK_END) {
        Some((reasoning, content)) => (non_empty(reasoning), non_empty(content.trim_start())),
        None => (non_empty(output), None),
    }
}

/// Text after the closing marker
fn after_end(text: &str) -> Option<&str> {
    text.split_once(THINK_END).map(|(_, rest)| rest)
}

/// Content as seen so far: the separator is dropped, and a partial
/// separator is held back until the next delta settles it
fn visible_content(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix(SEPARATOR) {
        rest
    } else if SEPARATOR.starts_with(text) {
        ""
    } else {
        text
    }
}

fn without_start(text: &str) -> &str {
    match text.split_once(THINK_START) {
        Some((_, rest)) => rest,
        None => text,
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
