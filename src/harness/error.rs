// ABOUTME: Error types for the scenario harness
// ABOUTME: Wraps template failures and unknown scenario selections

use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Unknown scenario '{name}'. Available scenarios: {available:?}")]
    UnknownScenario {
        name: String,
        available: Vec<String>,
    },

    #[error("Scenario '{scenario}' failed to render: {source}")]
    RenderFailed {
        scenario: String,
        #[source]
        source: TemplateError,
    },
}

pub type Result<T> = std::result::Result<T, HarnessError>;
