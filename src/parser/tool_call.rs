// ABOUTME: Tool call extraction from raw model output
// ABOUTME: Handles special tokens, fenced JSON blocks, inline JSON objects, and sloppy JSON

use regex::Regex;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value as JsonValue;
use std::io;
use tracing::debug;
use uuid::Uuid;

use super::error::Result;
use crate::template::ToolCall;

pub const TOOL_CALL_START: &str = "<|tool_call|>";
pub const TOOL_CALL_END: &str = "<|tool_call_end|>";

/// Result of scanning one model output for a tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedToolCalls {
    pub tools_called: bool,
    pub tool_calls: Vec<ToolCall>,
    pub content: Option<String>,
}

impl ExtractedToolCalls {
    fn none(output: &str) -> Self {
        Self {
            tools_called: false,
            tool_calls: Vec::new(),
            content: Some(output.to_string()),
        }
    }

    fn found(tool_call: ToolCall, preceding: &str) -> Self {
        Self {
            tools_called: true,
            tool_calls: vec![tool_call],
            content: non_empty(preceding.trim()),
        }
    }
}

/// A span of the output that may hold a tool call object
struct Candidate<'a> {
    start: usize,
    body: &'a str,
}

pub struct ToolCallParser {
    fenced_block: Regex,
    fence_open: Regex,
    fence_close: Regex,
    quoted_key: Regex,
    quoted_value: Regex,
    quoted_item: Regex,
    line_comment: Regex,
    trailing_comma: Regex,
}

impl ToolCallParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fenced_block: Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n(.*?)\r?\n\s*```")?,
            fence_open: Regex::new(r"(?i)^\s*```(?:json)?")?,
            fence_close: Regex::new(r"```\s*$")?,
            quoted_key: Regex::new(r#"'([^'"]*)'\s*:"#)?,
            quoted_value: Regex::new(r#":\s*'([^'"]*)'"#)?,
            quoted_item: Regex::new(r#"\[\s*'([^'"]*)'\s*\]"#)?,
            line_comment: Regex::new(r"(?m)(^|[\s,{\[])//.*$")?,
            trailing_comma: Regex::new(r",\s*([}\]])")?,
        })
    }

    /// Extract the first valid tool call from the model output
    pub fn extract(&self, output: &str) -> ExtractedToolCalls {
        if let Some(extracted) = self.extract_between_tokens(output) {
            return extracted;
        }

        let mut candidates = Vec::new();
        let mut fenced_spans = Vec::new();

        for captures in self.fenced_block.captures_iter(output) {
            if let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) {
                fenced_spans.push((whole.start(), whole.end()));
                candidates.push(Candidate {
                    start: whole.start(),
                    body: body.as_str().trim(),
                });
            }
        }

        for (start, end) in balanced_objects(output) {
            let inside_fence = fenced_spans
                .iter()
                .any(|&(fence_start, fence_end)| start >= fence_start && end <= fence_end);
            if !inside_fence {
                candidates.push(Candidate {
                    start,
                    body: &output[start..end],
                });
            }
        }

        candidates.sort_by_key(|candidate| candidate.start);

        for candidate in candidates {
            if let Some(tool_call) = self.parse_tool_call(candidate.body) {
                debug!(
                    "Extracted tool call '{}' at offset {}",
                    tool_call.function.name, candidate.start
                );
                return ExtractedToolCalls::found(tool_call, &output[..candidate.start]);
            }
        }

        debug!("No tool call found in model output");
        ExtractedToolCalls::none(output)
    }

    /// Special token form: `<|tool_call|>{...}<|tool_call_end|>`
    ///
    /// Once both markers are present they decide the result; an unparsable
    /// body means no tool call, with the text before the opening marker as content.
    fn extract_between_tokens(&self, output: &str) -> Option<ExtractedToolCalls> {
        let start = output.find(TOOL_CALL_START)?;
        let end = output.find(TOOL_CALL_END)?;
        let body = output
            .get(start + TOOL_CALL_START.len()..end)
            .unwrap_or_default()
            .trim();
        let preceding = &output[..start];

        match self.parse_tool_call(body) {
            Some(tool_call) => Some(ExtractedToolCalls::found(tool_call, preceding)),
            None => {
                debug!("Tool call markers present but the body did not parse");
                Some(ExtractedToolCalls {
                    tools_called: false,
                    tool_calls: Vec::new(),
                    content: non_empty(preceding.trim()),
                })
            }
        }
    }

    /// Parse one candidate, retrying with cleanup when strict JSON fails
    fn parse_tool_call(&self, body: &str) -> Option<ToolCall> {
        let value = serde_json::from_str::<JsonValue>(body)
            .ok()
            .or_else(|| serde_json::from_str::<JsonValue>(&self.clean_json(body)).ok())?;

        let object = value.as_object()?;
        let name = object
            .get("name")?
            .as_str()
            .filter(|name| !name.is_empty())?;
        let arguments = match object.get("arguments")? {
            JsonValue::String(encoded) => encoded.clone(),
            arguments @ JsonValue::Object(_) => encode_arguments(arguments)?,
            _ => return None,
        };

        Some(ToolCall::function(
            format!("call_{}", Uuid::new_v4().simple()),
            name,
            arguments,
        ))
    }

    /// Repair the usual model mistakes: fences, single quotes, comments, trailing commas
    fn clean_json(&self, body: &str) -> String {
        let cleaned = self.fence_open.replace(body.trim(), "");
        let mut cleaned = self.fence_close.replace(&cleaned, "").into_owned();

        if cleaned.contains('\'') {
            cleaned = self.quoted_key.replace_all(&cleaned, "\"$1\":").into_owned();
            cleaned = self.quoted_value.replace_all(&cleaned, ": \"$1\"").into_owned();
            cleaned = self.quoted_item.replace_all(&cleaned, "[\"$1\"]").into_owned();
        }

        let cleaned = self.line_comment.replace_all(&cleaned, "$1");
        self.trailing_comma.replace_all(&cleaned, "$1").into_owned()
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Byte spans of top-level `{...}` objects, ignoring braces inside strings
///
/// Single forward pass. Objects left open at the end of the text never close,
/// so closed objects nested inside them count as top-level.
fn balanced_objects(text: &str) -> Vec<(usize, usize)> {
    let mut open = Vec::new();
    let mut closed = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(index),
            b'}' => {
                if let Some(start) = open.pop() {
                    closed.push((start, index + 1));
                }
            }
            _ => {}
        }
    }

    closed.sort_unstable();

    let mut spans: Vec<(usize, usize)> = Vec::new();
    for (start, end) in closed {
        if spans.last().map_or(true, |&(_, last_end)| start >= last_end) {
            spans.push((start, end));
        }
    }
    spans
}

/// Encode an arguments object with `, ` and `: ` separators and ASCII-only output
fn encode_arguments(arguments: &JsonValue) -> Option<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    arguments.serialize(&mut serializer).ok()?;
    String::from_utf8(buffer).ok()
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units).iter() {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ToolCallParser {
        ToolCallParser::new().unwrap()
    }

    #[test]
    fn test_balanced_objects_skips_nested_and_strings() {
        let text = r#"a {"x": {"y": 1}} b {"s": "}{"} c {"#;
        let spans = balanced_objects(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].0..spans[0].1], r#"{"x": {"y": 1}}"#);
        assert_eq!(&text[spans[1].0..spans[1].1], r#"{"s": "}{"}"#);
    }

    #[test]
    fn test_clean_json_repairs_common_mistakes() {
        let cleaned = parser().clean_json(
            "```json\n{\n    // pick a tool\n    'name': 'lookup',\n    'arguments': {'tags': ['a']},\n}\n```",
        );
        let value: JsonValue = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["name"], "lookup");
        assert_eq!(value["arguments"]["tags"][0], "a");
    }

    #[test]
    fn test_string_arguments_are_kept_verbatim() {
        let extracted =
            parser().extract(r#"{"name": "echo", "arguments": "{\"text\": \"hi\"}"}"#);
        assert!(extracted.tools_called);
        assert_eq!(extracted.tool_calls[0].function.arguments, r#"{"text": "hi"}"#);
    }

    #[test]
    fn test_tool_call_ids_are_unique() {
        let parser = parser();
        let output = r#"{"name": "a", "arguments": {}}"#;
        let first = parser.extract(output);
        let second = parser.extract(output);

        let first_id = first.tool_calls[0].id.clone().unwrap();
        let second_id = second.tool_calls[0].id.clone().unwrap();
        assert!(first_id.starts_with("call_"));
        assert_ne!(first_id, second_id);
    }

    #[test]
    fn test_unicode_before_object() {
        let extracted = parser().extract("Voilà → {\"name\": \"meteo\", \"arguments\": {}}");
        assert!(extracted.tools_called);
        assert_eq!(extracted.content.as_deref(), Some("Voilà →"));
    }

    #[test]
    fn test_reversed_special_tokens_yield_no_call() {
        let extracted = parser().extract("<|tool_call_end|> text <|tool_call|>");
        assert!(!extracted.tools_called);
        assert_eq!(extracted.content.as_deref(), Some("<|tool_call_end|> text"));
    }

    #[test]
    fn test_unparsable_token_body_keeps_preceding_text() {
        let output = r#"Before <|tool_call|>{not json}<|tool_call_end|> after {"name": "x", "arguments": {}}"#;
        let extracted = parser().extract(output);
        assert!(!extracted.tools_called);
        assert!(extracted.tool_calls.is_empty());
        assert_eq!(extracted.content.as_deref(), Some("Before"));
    }

    #[test]
    fn test_unclosed_outer_brace_exposes_inner_object() {
        let text = r#"{ note {"name": "x", "arguments": {}}"#;
        let spans = balanced_objects(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].0..spans[0].1], r#"{"name": "x", "arguments": {}}"#);
    }

    #[test]
    fn test_unbalanced_input_scans_in_linear_time() {
        let output = "{\"".repeat(20_000);
        let started = std::time::Instant::now();

        let extracted = parser().extract(&output);

        assert!(!extracted.tools_called);
        assert!(balanced_objects(&"{".repeat(50_000)).is_empty());
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_object_arguments_use_spaced_separators() {
        let extracted = parser().extract(
            r#"{"name": "weather", "arguments": {"city": "Zürich", "days": [1, 2], "unit": "celsius"}}"#,
        );
        assert_eq!(
            extracted.tool_calls[0].function.arguments,
            r#"{"city": "Z\u00fcrich", "days": [1, 2], "unit": "celsius"}"#
        );
    }
}
