//! CLI command definitions for storeshot
//!
//! Defines all CLI commands and arguments using clap derive macros.
//!
//! ## Commands
//!
//! - `serve` - Answer tool calls on stdin/stdout
//! - `generate` / `batch` - Render mockups
//! - `status` / `activate` / `deactivate` / `refresh` - Subscription management
//! - `presets` / `devices` - Catalog listings for the current plan
//! - `demo-key` - Print a well-formed test key
//! - `config` - Show or modify configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// =============================================================================
// Main CLI
// =============================================================================

/// storeshot - App Store screenshot mockups with headline text
#[derive(Parser, Debug)]
#[command(name = "storeshot")]
#[command(about = "App Store screenshot mockups with headline text", long_about = None)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding subscription and usage state
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (defaults to output.default_format from the config)
    #[arg(long, value_enum, global = true)]
    pub format: Option<CliOutputFormat>,
}

// =============================================================================
// Commands
// =============================================================================

/// Device, preset and colors shared by `generate` and `batch`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StyleArgs {
    /// Device mockup id (see `storeshot devices`)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Color preset id (see `storeshot presets`)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// First gradient color (Pro)
    #[arg(long)]
    pub color1: Option<String>,

    /// Second gradient color (Pro)
    #[arg(long)]
    pub color2: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve tool calls as JSON lines on stdin/stdout
    Serve,

    /// Render one screenshot
    Generate {
        /// Main headline text
        #[arg(long, default_value = "")]
        headline: String,

        /// Second line of text
        #[arg(long, default_value = "")]
        subheadline: String,

        /// App screenshot placed on the device screen
        #[arg(short, long)]
        screenshot: Option<PathBuf>,

        /// Where to save the image (extension picks png, jpg or webp)
        #[arg(short, long, default_value = "screenshot.png")]
        output: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Render several screenshots from a JSON slide file (Pro)
    ///
    /// The file holds an array of `{headline, subheadline, screenshotPath}`
    /// objects.
    Batch {
        /// JSON file with the slides
        slides: PathBuf,

        /// Directory for screenshot_01.png, screenshot_02.png, ...
        #[arg(short, long)]
        out_dir: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Show subscription status and today's usage
    Status,

    /// Activate a Pro license key
    Activate {
        /// License key (XXXX-XXXX-XXXX-XXXX)
        key: String,

        /// Purchase email stored with the subscription
        #[arg(long)]
        email: Option<String>,
    },

    /// Remove the stored subscription
    Deactivate,

    /// Re-check the stored license key
    Refresh,

    /// List color presets for the current plan
    Presets,

    /// List device mockups for the current plan
    Devices,

    /// Print a random well-formed license key for local testing
    DemoKey,

    /// Show or modify configuration
    Config {
        /// Get a configuration value (e.g., output.default_format)
        #[arg(long)]
        get: Option<String>,

        /// Set a configuration value (e.g., render.default_preset=dark)
        #[arg(long)]
        set: Option<String>,

        /// List all configuration values
        #[arg(long)]
        list: bool,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,

        /// Show configuration file path
        #[arg(long)]
        path: bool,
    },
}

// =============================================================================
// Output Format
// =============================================================================

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum CliOutputFormat {
    /// Readable text
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

impl From<CliOutputFormat> for super::output::OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Human => super::output::OutputFormat::Human,
            CliOutputFormat::Json => super::output::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["storeshot", "generate", "--headline", "Hello"]).unwrap();
        match cli.command {
            Commands::Generate {
                headline,
                subheadline,
                screenshot,
                output,
                style,
            } => {
                assert_eq!(headline, "Hello");
                assert_eq!(subheadline, "");
                assert_eq!(screenshot, None);
                assert_eq!(output, PathBuf::from("screenshot.png"));
                assert_eq!(style.device, None);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_style() {
        let cli = Cli::try_parse_from([
            "storeshot",
            "generate",
            "-d",
            "ipad-air",
            "-p",
            "green",
            "--color1",
            "#000000",
            "-o",
            "out.jpg",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { output, style, .. } => {
                assert_eq!(output, PathBuf::from("out.jpg"));
                assert_eq!(style.device.as_deref(), Some("ipad-air"));
                assert_eq!(style.preset.as_deref(), Some("green"));
                assert_eq!(style.color1.as_deref(), Some("#000000"));
                assert_eq!(style.color2, None);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_batch_requires_out_dir() {
        assert!(Cli::try_parse_from(["storeshot", "batch", "slides.json"]).is_err());
        let cli =
            Cli::try_parse_from(["storeshot", "batch", "slides.json", "--out-dir", "shots"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Batch { .. }));
    }

    #[test]
    fn test_activate_command() {
        let cli = Cli::try_parse_from([
            "storeshot",
            "activate",
            "ABCD-1234-EFGH-5678",
            "--email",
            "me@example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Activate { key, email } => {
                assert_eq!(key, "ABCD-1234-EFGH-5678");
                assert_eq!(email.as_deref(), Some("me@example.com"));
            }
            _ => panic!("Expected Activate command"),
        }
    }

    #[test]
    fn test_config_command() {
        let cli = Cli::try_parse_from(["storeshot", "config", "--list"]).unwrap();
        match cli.command {
            Commands::Config { list, .. } => assert!(list),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "storeshot",
            "status",
            "--verbose",
            "--format",
            "json",
            "--data-dir",
            "/tmp/state",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, Some(CliOutputFormat::Json)));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/state")));
    }
}
