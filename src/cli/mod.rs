//! CLI module for Glimt.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Glimt - video understanding tools for AI assistants
///
/// Serves a video platform's description, extraction, segmentation and search
/// APIs as Model Context Protocol tools. The name "Glimt" is Norwegian for
/// "glimpse."
#[derive(Parser, Debug)]
#[command(name = "glimt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "GLIMT_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start MCP server for AI assistant integration (Claude, etc.)
    Mcp,

    /// List the available tools
    Tools,

    /// Run a single tool and print its result
    Call {
        /// Tool name (see `glimt tools`)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Check API key, configuration and connectivity
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call() {
        let cli = Cli::parse_from([
            "glimt",
            "-vv",
            "call",
            "describe_video",
            "--args",
            r#"{"url":"cloudglue://files/f1"}"#,
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Call { tool, args } => {
                assert_eq!(tool, "describe_video");
                assert!(args.contains("cloudglue"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_call_args_default_to_empty_object() {
        let cli = Cli::parse_from(["glimt", "call", "list_collections"]);
        let Commands::Call { args, .. } = cli.command else {
            panic!("expected call");
        };
        assert_eq!(args, "{}");
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["glimt", "--config", "/tmp/g.toml", "config", "path"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/g.toml"));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
