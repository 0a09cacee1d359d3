// ABOUTME: Chat template module for the chatplate harness
// ABOUTME: Provides render contexts, message types, and the minijinja-backed renderer

pub mod context;
pub mod engine;
pub mod error;
pub mod helpers;

pub use context::{
    Content, ContentPart, FunctionCall, ImageUrl, Message, RenderContext, Role, ToolCall,
    DEFAULT_BOS_TOKEN,
};
pub use engine::{TemplateEngine, BUNDLED_TEMPLATE};
pub use error::{Result, TemplateError};
