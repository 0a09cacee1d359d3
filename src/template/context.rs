// ABOUTME: Render context and chat message types for template rendering
// ABOUTME: Resolves loosely-typed message JSON into tagged content at construction time

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use super::error::{Result, TemplateError};

pub const DEFAULT_BOS_TOKEN: &str = "<|begin_of_text|>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(TemplateError::InvalidContext(format!(
                "unknown role '{}'",
                other
            ))),
        }
    }
}

/// Message content, either plain text or an ordered list of parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentPart {
    Text { text: String },
    Image { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        ContentPart::Image {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// JSON-encoded arguments object
    #[serde(deserialize_with = "arguments_as_string")]
    pub arguments: String,
}

fn default_call_type() -> String {
    "function".to_string()
}

/// Accept arguments either pre-encoded as a string or as a raw JSON object
fn arguments_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: Content) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Content::Text(text.into()))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Content::Text(text.into()))
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::new(Role::User, Content::Parts(parts))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, Content::Text(text.into()))
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, name: impl Into<String>, content: Content) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }

    /// Build a message from loosely-typed JSON, rejecting content that is
    /// neither a string nor a list of content parts
    pub fn from_json(value: &JsonValue, index: usize) -> Result<Self> {
        let invalid = |reason: String| TemplateError::InvalidMessage { index, reason };

        let object = value
            .as_object()
            .ok_or_else(|| invalid("message must be an object".to_string()))?;

        match object.get("content") {
            None | Some(JsonValue::Null) | Some(JsonValue::String(_)) => {}
            Some(JsonValue::Array(parts)) => {
                for (part_index, part) in parts.iter().enumerate() {
                    serde_json::from_value::<ContentPart>(part.clone()).map_err(|e| {
                        invalid(format!("content part {} is malformed: {}", part_index, e))
                    })?;
                }
            }
            Some(_) => {
                return Err(invalid(
                    "content must be a string or a list of content parts".to_string(),
                ))
            }
        }

        let message: Message =
            serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;
        message.validate(index)?;
        Ok(message)
    }

    /// Check the role-dependent shape rules
    pub fn validate(&self, index: usize) -> Result<()> {
        let invalid = |reason: &str| TemplateError::InvalidMessage {
            index,
            reason: reason.to_string(),
        };

        if !self.tool_calls.is_empty() && self.role != Role::Assistant {
            return Err(invalid("only assistant messages may carry tool calls"));
        }

        if self.content.is_none() && self.tool_calls.is_empty() {
            return Err(invalid("message has neither content nor tool calls"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    pub bos_token: String,
    pub add_generation_prompt: bool,
    pub messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<JsonValue>>,

    pub tools_in_user_message: bool,
}

impl RenderContext {
    /// Create a context with the default BOS token and a generation prompt
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            bos_token: DEFAULT_BOS_TOKEN.to_string(),
            add_generation_prompt: true,
            messages,
            tools: None,
            tools_in_user_message: true,
        }
    }

    pub fn with_bos_token(mut self, bos_token: impl Into<String>) -> Self {
        self.bos_token = bos_token.into();
        self
    }

    pub fn with_generation_prompt(mut self, add_generation_prompt: bool) -> Self {
        self.add_generation_prompt = add_generation_prompt;
        self
    }

    pub fn with_tools(mut self, tools: Vec<JsonValue>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tools_in_user_message(mut self, tools_in_user_message: bool) -> Self {
        self.tools_in_user_message = tools_in_user_message;
        self
    }

    /// Build a context from a JSON object shaped like the template variables
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            TemplateError::InvalidContext("render context must be an object".to_string())
        })?;

        let messages = object
            .get("messages")
            .ok_or_else(|| TemplateError::MissingVariable("messages".to_string()))?
            .as_array()
            .ok_or_else(|| TemplateError::InvalidContext("messages must be a list".to_string()))?
            .iter()
            .enumerate()
            .map(|(index, message)| Message::from_json(message, index))
            .collect::<Result<Vec<_>>>()?;

        let mut context = Self::new(messages);

        if let Some(bos_token) = object.get("bos_token") {
            context.bos_token = bos_token
                .as_str()
                .ok_or_else(|| {
                    TemplateError::InvalidContext("bos_token must be a string".to_string())
                })?
                .to_string();
        }

        if let Some(flag) = object.get("add_generation_prompt") {
            context.add_generation_prompt = flag.as_bool().ok_or_else(|| {
                TemplateError::InvalidContext("add_generation_prompt must be a boolean".to_string())
            })?;
        }

        match object.get("tools") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Array(tools)) => context.tools = Some(tools.clone()),
            Some(_) => {
                return Err(TemplateError::InvalidContext(
                    "tools must be a list".to_string(),
                ))
            }
        }

        if let Some(flag) = object.get("tools_in_user_message") {
            context.tools_in_user_message = flag.as_bool().ok_or_else(|| {
                TemplateError::InvalidContext("tools_in_user_message must be a boolean".to_string())
            })?;
        }

        Ok(context)
    }

    /// Validate every message in order
    pub fn validate(&self) -> Result<()> {
        self.messages
            .iter()
            .enumerate()
            .try_for_each(|(index, message)| message.validate(index))
    }

    /// Convert context to JSON, the shape templates see
    pub fn to_json(&self) -> Result<JsonValue> {
        serde_json::to_value(self).map_err(TemplateError::JsonError)
    }
}
