// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for chatplate

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::template::{Message, Role};

#[derive(Parser)]
#[command(name = "chatplate")]
#[command(about = "Render chat prompt templates against example conversations")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render one conversation through a chat template
    Render {
        #[arg(short, long, help = "Path to chat template (defaults to the bundled template)")]
        template: Option<PathBuf>,

        #[arg(
            long,
            help = "JSON file holding a messages list or a full render context",
            conflicts_with = "message"
        )]
        messages: Option<PathBuf>,

        #[arg(short = 'm', long = "message", help = "Message as role=text (repeatable)")]
        message: Vec<String>,

        #[arg(long, help = "JSON file holding a list of tool definitions")]
        tools: Option<PathBuf>,

        #[arg(long, help = "Place tool definitions in the system turn")]
        tools_in_system: bool,

        #[arg(long, help = "Do not append the assistant generation prompt")]
        no_generation_prompt: bool,

        #[arg(long, help = "Beginning-of-sequence token")]
        bos_token: Option<String>,
    },

    /// Render the built-in example conversations, separated by --- lines
    Scenarios {
        #[arg(short, long, help = "Path to chat template (defaults to the bundled template)")]
        template: Option<PathBuf>,

        #[arg(long = "only", help = "Render only the named scenario (repeatable)")]
        only: Vec<String>,

        #[arg(long, help = "Include the tool-calling scenarios")]
        all: bool,

        #[arg(long, help = "List scenario names instead of rendering")]
        list: bool,
    },

    /// Extract a tool call from model output
    ParseTools {
        #[arg(help = "File holding model output (reads stdin when omitted)")]
        input: Option<PathBuf>,
    },

    /// Split reasoning from content in model output
    ParseReasoning {
        #[arg(help = "File holding model output (reads stdin when omitted)")]
        input: Option<PathBuf>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse messages from role=text format
    pub fn parse_messages(messages: &[String]) -> anyhow::Result<Vec<Message>> {
        messages
            .iter()
            .map(|message| {
                let (role, text) = message.split_once('=').ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid message format '{}'. Expected 'role=text'",
                        message
                    )
                })?;

                match role.parse::<Role>()? {
                    Role::System => Ok(Message::system(text)),
                    Role::User => Ok(Message::user(text)),
                    Role::Assistant => Ok(Message::assistant(text)),
                    Role::Tool => Err(anyhow::anyhow!(
                        "Tool messages need a call id; pass them through --messages"
                    )),
                }
            })
            .collect()
    }
}
