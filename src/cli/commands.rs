// ABOUTME: Command implementations for the chatplate CLI
// ABOUTME: Handles execution of render, scenarios, parse-tools, and parse-reasoning commands

use anyhow::{Context, Result};
use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use super::args::Args;
use super::config::Config;
use crate::harness::{self, SEPARATOR};
use crate::parser::{reasoning, ToolCallParser};
use crate::template::TemplateEngine;

/// Options for rendering a single conversation
#[derive(Debug, Default)]
pub struct RenderOptions {
    pub template: Option<PathBuf>,
    pub messages_file: Option<PathBuf>,
    pub messages: Vec<String>,
    pub tools_file: Option<PathBuf>,
    pub tools_in_system: bool,
    pub no_generation_prompt: bool,
    pub bos_token: Option<String>,
}

/// Render one conversation and print it
pub async fn render_conversation(options: RenderOptions, config: &Config) -> Result<()> {
    let engine = load_engine(options.template.as_deref(), config).await?;
    let context = build_render_context(&options, config).await?;

    let rendered = engine
        .render_json(&context)
        .map_err(|e| anyhow::anyhow!("Failed to render chat template: {}", e))?;

    write_stdout(&rendered).await?;
    info!("Rendered conversation ({} chars)", rendered.len());
    Ok(())
}

/// Render the built-in scenarios as blocks separated by `---` lines
pub async fn run_scenarios(
    template: Option<PathBuf>,
    only: Vec<String>,
    all: bool,
    list: bool,
    config: &Config,
) -> Result<()> {
    let available = if all || !only.is_empty() {
        harness::all_scenarios()
    } else {
        harness::core_scenarios()
    };
    let mut scenarios = harness::select_scenarios(available, &only)?;

    if list {
        let listing = scenarios
            .iter()
            .map(|scenario| format!("{:<24}{}", scenario.name, scenario.description))
            .collect::<Vec<_>>()
            .join("\n");
        return write_stdout(&listing).await;
    }

    for scenario in &mut scenarios {
        scenario.context.bos_token = config.bos_token.clone();
        scenario.context.add_generation_prompt = config.add_generation_prompt;
    }

    let engine = load_engine(template.as_deref(), config).await?;
    let blocks = harness::render_scenarios(&engine, &scenarios)?;

    write_stdout(&harness::join_blocks(&blocks)).await?;
    info!("Rendered {} scenario block(s) separated by '{}'", blocks.len(), SEPARATOR);
    Ok(())
}

/// Extract a tool call from model output and print it as JSON
pub async fn parse_tool_calls(input: Option<PathBuf>) -> Result<()> {
    let output = read_input(input.as_deref()).await?;
    let parser = ToolCallParser::new()?;

    let extracted = parser.extract(&output);
    debug!("Tool call extraction found {} call(s)", extracted.tool_calls.len());

    write_stdout(&serde_json::to_string_pretty(&extracted)?).await
}

/// Split reasoning from content and print both as JSON
pub async fn parse_reasoning(input: Option<PathBuf>) -> Result<()> {
    let output = read_input(input.as_deref()).await?;
    let (reasoning, content) = reasoning::split_reasoning(&output);

    let result = json!({
        "reasoning_content": reasoning,
        "content": content,
    });
    write_stdout(&serde_json::to_string_pretty(&result)?).await
}

/// Load the chat template from the CLI path, the configured path, or the bundled copy
async fn load_engine(template: Option<&Path>, config: &Config) -> Result<TemplateEngine> {
    let path = template.or(config.template_path.as_deref());

    let engine = match path {
        Some(path) => {
            info!("Loading chat template: {}", path.display());
            let source = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read chat template '{}'", path.display()))?;
            TemplateEngine::from_source(source)
        }
        None => {
            debug!("Using bundled chat template");
            TemplateEngine::bundled()
        }
    };

    engine.map_err(|e| anyhow::anyhow!("Failed to load chat template: {}", e))
}

/// Assemble the JSON render context: file or CLI messages, then config defaults, then flags
async fn build_render_context(options: &RenderOptions, config: &Config) -> Result<JsonValue> {
    let mut context = match &options.messages_file {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read messages file '{}'", path.display()))?;
            match serde_json::from_str::<JsonValue>(&contents)? {
                JsonValue::Array(messages) => json!({ "messages": messages }),
                object @ JsonValue::Object(_) => object,
                _ => anyhow::bail!(
                    "Messages file '{}' must hold a list or an object",
                    path.display()
                ),
            }
        }
        None => {
            if options.messages.is_empty() {
                anyhow::bail!("No messages given. Use --message role=text or --messages FILE");
            }
            let messages = Args::parse_messages(&options.messages)?;
            json!({ "messages": serde_json::to_value(messages)? })
        }
    };

    let object = context
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Render context must be an object"))?;

    object
        .entry("bos_token")
        .or_insert_with(|| JsonValue::String(config.bos_token.clone()));
    object
        .entry("add_generation_prompt")
        .or_insert(JsonValue::Bool(config.add_generation_prompt));

    if let Some(bos_token) = &options.bos_token {
        object.insert("bos_token".to_string(), JsonValue::String(bos_token.clone()));
    }
    if options.no_generation_prompt {
        object.insert("add_generation_prompt".to_string(), JsonValue::Bool(false));
    }
    if let Some(path) = &options.tools_file {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read tools file '{}'", path.display()))?;
        object.insert("tools".to_string(), serde_json::from_str(&contents)?);
    }
    if options.tools_in_system {
        object.insert("tools_in_user_message".to_string(), JsonValue::Bool(false));
    }

    Ok(context)
}

async fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input '{}'", path.display())),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            Ok(buffer)
        }
    }
}

async fn write_stdout(content: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(content.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
