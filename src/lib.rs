// ABOUTME: Main library module for the chatplate template harness
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod harness;
pub mod parser;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use harness::{render_scenarios, Scenario};
pub use parser::{ReasoningParser, ToolCallParser};
pub use template::{Message, RenderContext, TemplateEngine, TemplateError};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
