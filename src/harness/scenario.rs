// ABOUTME: Built-in example conversations used to exercise chat templates
// ABOUTME: Covers plain, multi-part, system, assistant, and tool-calling turns

use serde_json::json;

use super::error::{HarnessError, Result};
use crate::template::{Content, ContentPart, Message, RenderContext, ToolCall};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub context: RenderContext,
}

impl Scenario {
    fn new(name: &'static str, description: &'static str, messages: Vec<Message>) -> Self {
        Self {
            name,
            description,
            context: RenderContext::new(messages),
        }
    }
}

/// The four conversations the harness always renders
pub fn core_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "simple-user",
            "Single user question with a generation prompt",
            vec![Message::user("What is the capital of France?")],
        ),
        Scenario::new(
            "multi-content",
            "User message mixing a text part and an image part",
            vec![Message::user_parts(vec![
                ContentPart::text("What is the capital of France?"),
                ContentPart::image("https://example.com/france.png"),
            ])],
        ),
        Scenario::new(
            "system-first",
            "System prompt followed by a user question",
            vec![
                Message::system("You are a geography expert"),
                Message::user("What is the capital of France?"),
            ],
        ),
        Scenario::new(
            "assistant-reply",
            "Completed exchange ending in an assistant turn",
            vec![
                Message::user("What is the capital of France?"),
                Message::assistant("The capital of France is Paris."),
            ],
        ),
    ]
}

/// Conversations exercising the tool-calling parts of a template
pub fn tool_scenarios() -> Vec<Scenario> {
    let weather_call = ToolCall::function(
        "call_abc123",
        "get_weather",
        r#"{"location": "Paris", "unit": "celsius"}"#,
    );

    let weather_tool = json!({
        "name": "get_weather",
        "description": "Get the current weather",
        "parameters": {
            "type": "object",
            "properties": {
                "location": {"type": "string", "description": "The city name"}
            },
            "required": ["location"]
        }
    });

    let mut tools_in_user_message = Scenario::new(
        "tools-in-user-message",
        "Function definitions placed in the first user turn",
        vec![Message::user("What is the weather in Paris?")],
    );
    tools_in_user_message.context = tools_in_user_message
        .context
        .with_tools(vec![weather_tool])
        .with_tools_in_user_message(true);

    vec![
        Scenario::new(
            "non-user-roles",
            "System, assistant, and tool turns before a user turn",
            vec![
                Message::system("System message"),
                Message::assistant("Assistant message"),
                Message::tool("call_0", "noop", Content::Text("Tool message".to_string())),
                Message::user("User message"),
            ],
        ),
        Scenario::new(
            "tool-call",
            "Assistant turn carrying a single tool call",
            vec![Message::assistant_tool_calls(vec![weather_call])],
        ),
        Scenario::new(
            "tool-response",
            "Tool result with plain text content",
            vec![Message::tool(
                "call_abc123",
                "get_weather",
                Content::Text("Sunny, 22°C".to_string()),
            )],
        ),
        Scenario::new(
            "multi-tool-response",
            "Tool result with text and image parts",
            vec![Message::tool(
                "call_abc123",
                "get_weather",
                Content::Parts(vec![
                    ContentPart::text("Sunny, 22°C"),
                    ContentPart::image("https://example.com/weather.png"),
                ]),
            )],
        ),
        Scenario::new(
            "tool-conversation",
            "Question, tool call, tool result, and final answer",
            vec![
                Message::user("What is the weather in Paris?"),
                Message::assistant_tool_calls(vec![ToolCall::function(
                    "call_abc123",
                    "get_weather",
                    r#"{"location": "Paris"}"#,
                )]),
                Message::tool(
                    "call_abc123",
                    "get_weather",
                    Content::Text("Sunny, 22°C".to_string()),
                ),
                Message::assistant("The weather in Paris is sunny and 22°C."),
            ],
        ),
        tools_in_user_message,
    ]
}

pub fn all_scenarios() -> Vec<Scenario> {
    let mut scenarios = core_scenarios();
    scenarios.extend(tool_scenarios());
    scenarios
}

/// Pick scenarios by name, keeping the requested order
pub fn select_scenarios(available: Vec<Scenario>, names: &[String]) -> Result<Vec<Scenario>> {
    if names.is_empty() {
        return Ok(available);
    }

    names
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|scenario| scenario.name == name.as_str())
                .cloned()
                .ok_or_else(|| HarnessError::UnknownScenario {
                    name: name.clone(),
                    available: available.iter().map(|s| s.name.to_string()).collect(),
                })
        })
        .collect()
}
