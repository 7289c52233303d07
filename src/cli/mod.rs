//! CLI module for storeshot
//!
//! Every command except `config` and `demo-key` goes through the same tool
//! handlers the stdio server uses, so the CLI and tool clients see identical
//! behavior and messages.
//!
//! ## Usage
//!
//! ```bash
//! # One screenshot with the default device and gradient
//! storeshot generate --headline "Plan your day" --screenshot app.png -o shot.png
//!
//! # JSON output for scripting
//! storeshot status --format json | jq -r '.content[0].text'
//!
//! # Serve tool calls on stdio
//! storeshot serve
//!
//! # Configuration management
//! storeshot config --list
//! storeshot config --set render.default_preset=dark
//! ```

pub mod commands;
pub mod config;
pub mod output;

pub use commands::{Cli, CliOutputFormat, Commands, StyleArgs};
pub use config::{ConfigError, StoreshotConfig};
pub use output::{create_formatter, OutputFormat, OutputFormatter};
