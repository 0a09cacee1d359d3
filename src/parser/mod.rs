// ABOUTME: Model output parsing module for chatplate
// ABOUTME: Extracts tool calls and splits reasoning blocks out of generated text

pub mod error;
pub mod reasoning;
pub mod tool_call;

pub use error::{ParseError, Result};
pub use reasoning::{
    split_reasoning, DeltaMessage, ReasoningParser, StreamDelta, THINK_END, THINK_START,
};
pub use tool_call::{ExtractedToolCalls, ToolCallParser, TOOL_CALL_END, TOOL_CALL_START};
