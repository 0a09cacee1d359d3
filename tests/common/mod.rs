// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides turn-section extraction and temporary file fixtures

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;
use tokio::fs;

use chatplate::template::{RenderContext, TemplateEngine};

pub const EOT: &str = "<|eot_id|>";
pub const GENERATION_PROMPT: &str = "<|start_header_id|>assistant<|end_header_id|>\n\n";
pub const THINKING_PREFIX: &str = "detailed thinking on";

/// Body of the nth turn rendered under the given header role
pub fn section(rendered: &str, header_role: &str, nth: usize) -> String {
    let header = format!("<|start_header_id|>{}<|end_header_id|>", header_role);
    let after = rendered
        .split(header.as_str())
        .nth(nth + 1)
        .unwrap_or_else(|| panic!("no {} turn #{} in:\n{}", header_role, nth, rendered));
    after.split(EOT).next().unwrap_or_default().to_string()
}

pub fn render_bundled(context: &RenderContext) -> String {
    TemplateEngine::bundled()
        .expect("bundled template should compile")
        .render(context)
        .expect("bundled template should render")
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    pub async fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents)
            .await
            .expect("Failed to write fixture file");
        path
    }
}
