// ABOUTME: Scenario harness for exercising chat templates
// ABOUTME: Holds literal example conversations and renders them as separated blocks

pub mod error;
pub mod runner;
pub mod scenario;

pub use error::{HarnessError, Result};
pub use runner::{join_blocks, render_scenarios, RenderedBlock, SEPARATOR};
pub use scenario::{all_scenarios, core_scenarios, select_scenarios, tool_scenarios, Scenario};
