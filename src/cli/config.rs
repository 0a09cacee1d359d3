// ABOUTME: Configuration management for chatplate application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::template::DEFAULT_BOS_TOKEN;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    #[serde(default = "default_bos_token")]
    pub bos_token: String,

    #[serde(default = "default_add_generation_prompt")]
    pub add_generation_prompt: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_bos_token() -> String {
    DEFAULT_BOS_TOKEN.to_string()
}

fn default_add_generation_prompt() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_path: None,
            bos_token: default_bos_token(),
            add_generation_prompt: default_add_generation_prompt(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)?
        } else {
            Config::default()
        };

        config.merge_env();
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = vec![
            PathBuf::from("chatplate.yaml"),
            PathBuf::from("chatplate.yml"),
            PathBuf::from(".chatplate.yaml"),
            PathBuf::from(".chatplate.yml"),
        ];

        // Check current directory
        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".chatplate").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Return default path (may not exist)
        PathBuf::from("chatplate.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(template) = lookup("CHATPLATE_TEMPLATE") {
            self.template_path = Some(PathBuf::from(template));
        }
        if let Some(bos_token) = lookup("CHATPLATE_BOS_TOKEN") {
            self.bos_token = bos_token;
        }

        // Logging configuration
        if let Some(level) = lookup("CHATPLATE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CHATPLATE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}
