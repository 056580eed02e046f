//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for hacrud
#[derive(Parser, Debug)]
#[command(name = "hacrud")]
#[command(author, version, about = "Uniform CRUD surface for home-automation helpers")]
#[command(long_about = r#"
hacrud exposes the helper entities of a home-automation host (toggles, numbers,
text fields, selects, date/time inputs, counters and timers) as plain
create/read/update/delete operations over REST or a tool-call interface.

Configuration files are loaded from (in priority order):
1. HACRUD_* environment variables   e.g. HACRUD_HOST__ADDRESS=10.0.0.5:8123
2. --config <path>                  Explicit config file
3. ./hacrud.toml                    Project-level config
4. ~/.config/hacrud/config.toml     Global config

Example:
  hacrud serve
  hacrud tools
  hacrud call list_helpers '{"domain":"counter"}'
  hacrud call create_helper '{"domain":"input_boolean","name":"Guest mode"}' --admin
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long, global = true)]
    pub show_config: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the REST surface
    Serve {
        /// Override the configured bind address
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Print the tool definitions as JSON
    Tools,
    /// Invoke a single tool and print its JSON result
    Call {
        /// Tool name, e.g. list_helpers
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,

        /// Call as an admin (write tools require it)
        #[arg(long)]
        admin: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_call_with_global_flags() {
        let cli = Cli::parse_from([
            "hacrud",
            "call",
            "get_helper",
            r#"{"helper_id":"counter.cups"}"#,
            "--admin",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Call { tool, args, admin } => {
                assert_eq!(tool, "get_helper");
                assert!(args.contains("counter.cups"));
                assert!(admin);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn call_args_default_to_empty_object() {
        let cli = Cli::parse_from(["hacrud", "call", "list_helpers"]);
        assert!(matches!(cli.command, Command::Call { ref args, admin: false, .. } if args == "{}"));
    }

    #[test]
    fn serve_accepts_bind_override() {
        let cli = Cli::parse_from(["hacrud", "--no-config", "serve", "--bind", "0.0.0.0:9000"]);
        assert!(cli.no_config);
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"));
    }
}
