// ABOUTME: Renders scenarios through a template engine
// ABOUTME: Produces one output block per scenario, joined by separator lines

use serde::Serialize;
use tracing::{debug, info};

use super::error::{HarnessError, Result};
use super::scenario::Scenario;
use crate::template::TemplateEngine;

/// Line printed between rendered blocks
pub const SEPARATOR: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedBlock {
    pub scenario: String,
    pub output: String,
}

/// Render every scenario in order, stopping at the first failure
pub fn render_scenarios(engine: &TemplateEngine, scenarios: &[Scenario]) -> Result<Vec<RenderedBlock>> {
    info!("Rendering {} scenario(s)", scenarios.len());

    scenarios
        .iter()
        .map(|scenario| {
            debug!("Rendering scenario '{}': {}", scenario.name, scenario.description);
            engine
                .render(&scenario.context)
                .map(|output| RenderedBlock {
                    scenario: scenario.name.to_string(),
                    output,
                })
                .map_err(|source| HarnessError::RenderFailed {
                    scenario: scenario.name.to_string(),
                    source,
                })
        })
        .collect()
}

pub fn join_blocks(blocks: &[RenderedBlock]) -> String {
    blocks
        .iter()
        .map(|block| block.output.as_str())
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::scenario::core_scenarios;

    #[test]
    fn test_join_blocks() {
        let blocks = vec![
            RenderedBlock {
                scenario: "a".to_string(),
                output: "first".to_string(),
            },
            RenderedBlock {
                scenario: "b".to_string(),
                output: "second".to_string(),
            },
        ];
        assert_eq!(join_blocks(&blocks), "first\n---\nsecond");
        assert_eq!(join_blocks(&blocks[..1]), "first");
    }

    #[test]
    fn test_render_scenarios_with_simple_template() {
        let engine = TemplateEngine::from_source(
            "{% for m in messages %}{{ m.role }}:{% endfor %}{% if add_generation_prompt %}>{% endif %}",
        )
        .unwrap();
        let blocks = render_scenarios(&engine, &core_scenarios()).unwrap();
        let outputs: Vec<_> = blocks.iter().map(|b| b.output.as_str()).collect();
        assert_eq!(
            outputs,
            vec!["user:>", "user:>", "system:user:>", "user:assistant:>"]
        );
    }

    #[test]
    fn test_render_failure_names_the_scenario() {
        let engine = TemplateEngine::from_source("{{ missing }}").unwrap();
        let err = render_scenarios(&engine, &core_scenarios()).unwrap_err();
        match err {
            HarnessError::RenderFailed { scenario, .. } => assert_eq!(scenario, "simple-user"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
