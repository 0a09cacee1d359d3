// ABOUTME: Main chat template engine implementation using minijinja
// ABOUTME: Loads a template once and renders it deterministically against render contexts

use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

use super::context::RenderContext;
use super::error::{Result, TemplateError};
use super::helpers;

/// Chat template shipped with the crate
pub const BUNDLED_TEMPLATE: &str = include_str!("../../templates/llama3_thinking.jinja");

const CHAT_TEMPLATE: &str = "chat";

#[derive(Clone)]
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with all built-in functions and no chat template
    pub fn new() -> Self {
        let mut env = Environment::new();

        // Undefined lookups are errors, not empty strings
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        // Output is a model prompt, never HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);

        // Same block handling the Hugging Face chat template runtime uses
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        helpers::register_helpers(&mut env);

        Self { env }
    }

    /// Create an engine around the bundled chat template
    pub fn bundled() -> Result<Self> {
        Self::from_source(BUNDLED_TEMPLATE)
    }

    /// Create an engine around a chat template source
    pub fn from_source(source: impl Into<String>) -> Result<Self> {
        let mut engine = Self::new();
        engine.load(source)?;
        Ok(engine)
    }

    /// Create an engine around a chat template read from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading chat template from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_source(source)
    }

    /// Replace the chat template, validating its syntax
    pub fn load(&mut self, source: impl Into<String>) -> Result<()> {
        let source = source.into();
        debug!("Compiling chat template ({} bytes)", source.len());
        self.env
            .add_template_owned(CHAT_TEMPLATE, source)
            .map_err(TemplateError::from)
    }

    /// Render the loaded chat template with the given context
    pub fn render(&self, context: &RenderContext) -> Result<String> {
        context.validate()?;

        let template = self.env.get_template(CHAT_TEMPLATE).map_err(|_| {
            TemplateError::RenderError("no chat template has been loaded".to_string())
        })?;

        debug!(
            "Rendering chat template with {} message(s)",
            context.messages.len()
        );
        template
            .render(Value::from_serialize(context))
            .map_err(TemplateError::from)
    }

    /// Render the loaded chat template with a loosely-typed JSON context
    pub fn render_json(&self, context: &JsonValue) -> Result<String> {
        let context = RenderContext::from_json(context)?;
        self.render(&context)
    }

    /// Render a one-off template string with the given context
    pub fn render_template(&self, template: &str, context: &RenderContext) -> Result<String> {
        context.validate()?;
        self.env
            .render_str(template, Value::from_serialize(context))
            .map_err(TemplateError::from)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
