// ABOUTME: Main application orchestration for chatplate CLI
// ABOUTME: Coordinates between CLI arguments, configuration, and command execution

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands::{self, RenderOptions};
use super::{Args, Commands, Config};

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        // Logs go to stderr so rendered prompts on stdout stay clean
        match self.config.logging.format.as_str() {
            "compact" => {
                tracing_subscriber::fmt()
                    .compact()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(!no_color)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting chatplate v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        match args.command {
            Commands::Render {
                template,
                messages,
                message,
                tools,
                tools_in_system,
                no_generation_prompt,
                bos_token,
            } => {
                let options = RenderOptions {
                    template,
                    messages_file: messages,
                    messages: message,
                    tools_file: tools,
                    tools_in_system,
                    no_generation_prompt,
                    bos_token,
                };
                commands::render_conversation(options, &self.config).await
            }

            Commands::Scenarios {
                template,
                only,
                all,
                list,
            } => commands::run_scenarios(template, only, all, list, &self.config).await,

            Commands::ParseTools { input } => commands::parse_tool_calls(input).await,

            Commands::ParseReasoning { input } => commands::parse_reasoning(input).await,
        }
    }

    /// Create application from parsed command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_app_creation() {
        let config = Config::default();
        let app = App::new(config);
        assert_eq!(app.config.bos_token, "<|begin_of_text|>");
    }

    #[test]
    fn test_app_from_args_with_config_file() {
        use clap::Parser;

        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("chatplate.yaml");

        let config_content = r#"
bos_token: "<s>"
add_generation_prompt: false
logging:
  level: debug
  format: compact
"#;

        fs::write(&config_path, config_content).unwrap();

        let args = Args::try_parse_from([
            "chatplate",
            "--config",
            config_path.to_str().unwrap(),
            "scenarios",
        ])
        .unwrap();
        let app = App::from_args(&args).unwrap();

        assert_eq!(app.config.bos_token, "<s>");
        assert!(!app.config.add_generation_prompt);
        assert_eq!(app.config.logging.level, "debug");
        assert_eq!(app.config.logging.format, "compact");
    }
}
