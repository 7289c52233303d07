//! storeshot CLI - App Store screenshot mockups
//!
//! Renders device mockups with headline text and manages the local Pro
//! subscription. `storeshot serve` exposes the same operations as tools over
//! line-delimited JSON on stdin/stdout.

use std::io::{stdout, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storeshot::cli::config::DATA_DIR_ENV;
use storeshot::cli::{
    create_formatter, Cli, Commands, OutputFormat, OutputFormatter, StoreshotConfig, StyleArgs,
};
use storeshot::entitlements::license::generate_demo_key;
use storeshot::entitlements::EntitlementStore;
use storeshot::mockup::Renderer;
use storeshot::tools::handlers::{
    ACTIVATE_SUBSCRIPTION, DEACTIVATE_SUBSCRIPTION, GENERATE_BATCH, GENERATE_SCREENSHOT,
    LIST_DEVICES, LIST_PRESETS, REFRESH_SUBSCRIPTION, SUBSCRIPTION_STATUS,
};
use storeshot::tools::{serve_stdio, ToolServer};

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries tool output, so logs go to stderr and stay quiet by default
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config_path = cli.config.clone().unwrap_or_else(StoreshotConfig::default_path);
    let config = StoreshotConfig::load_from(config_path.clone());

    let format = match cli.format {
        Some(format) => format.into(),
        None => config
            .output
            .default_format
            .parse::<OutputFormat>()
            .unwrap_or_default(),
    };
    let formatter = create_formatter(format, stdout().is_terminal());
    let data_dir_override = cli.data_dir.clone();

    match cli.command {
        Commands::Config {
            get,
            set,
            list,
            reset,
            path,
        } => handle_config(get, set, list, reset, path, config_path, formatter.as_ref()),

        Commands::DemoKey => {
            formatter.format_message(&generate_demo_key(), &mut stdout())?;
            Ok(())
        }

        Commands::Serve => {
            let server = open_server(&config, data_dir_override.as_deref())?;
            serve_stdio(&server).await?;
            Ok(())
        }

        command => {
            let (tool, arguments) = tool_call(command, &config)?;
            let server = open_server(&config, data_dir_override.as_deref())?;
            handle_tool(&server, tool, arguments, formatter.as_ref())
        }
    }
}

fn open_server(config: &StoreshotConfig, data_dir: Option<&Path>) -> anyhow::Result<ToolServer> {
    let data_dir = config.resolve_data_dir(data_dir, std::env::var_os(DATA_DIR_ENV));
    let store = EntitlementStore::open(&data_dir)
        .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?
        .with_links(config.license.links());
    Ok(ToolServer::new(store, Renderer::new()))
}

// =============================================================================
// Tool-backed Commands
// =============================================================================

/// Map a CLI command onto a tool name and its argument object.
fn tool_call(command: Commands, config: &StoreshotConfig) -> anyhow::Result<(&'static str, Value)> {
    let call = match command {
        Commands::Generate {
            headline,
            subheadline,
            screenshot,
            output,
            style,
        } => {
            let mut arguments = style_arguments(style, config);
            arguments.insert("headline".into(), json!(headline));
            arguments.insert("subheadline".into(), json!(subheadline));
            arguments.insert("outputPath".into(), json!(output));
            if let Some(screenshot) = screenshot {
                arguments.insert("screenshotPath".into(), json!(screenshot));
            }
            (GENERATE_SCREENSHOT, Value::Object(arguments))
        }

        Commands::Batch {
            slides,
            out_dir,
            style,
        } => {
            let mut arguments = style_arguments(style, config);
            arguments.insert("slides".into(), read_slides(&slides)?);
            arguments.insert("outputDirectory".into(), json!(out_dir));
            (GENERATE_BATCH, Value::Object(arguments))
        }

        Commands::Status => (SUBSCRIPTION_STATUS, Value::Null),
        Commands::Activate { key, email } => {
            (ACTIVATE_SUBSCRIPTION, json!({"key": key, "email": email}))
        }
        Commands::Deactivate => (DEACTIVATE_SUBSCRIPTION, Value::Null),
        Commands::Refresh => (REFRESH_SUBSCRIPTION, Value::Null),
        Commands::Presets => (LIST_PRESETS, Value::Null),
        Commands::Devices => (LIST_DEVICES, Value::Null),

        Commands::Serve | Commands::DemoKey | Commands::Config { .. } => {
            anyhow::bail!("command does not map to a tool call")
        }
    };
    Ok(call)
}

/// Device, preset and colors, falling back to the configured defaults. The
/// default preset only applies when no explicit colors were given.
fn style_arguments(style: StyleArgs, config: &StoreshotConfig) -> Map<String, Value> {
    let has_colors = style.color1.is_some() || style.color2.is_some();
    let device = style.device.or_else(|| config.render.default_device.clone());
    let preset = style.preset.or_else(|| {
        (!has_colors)
            .then(|| config.render.default_preset.clone())
            .flatten()
    });

    let mut arguments = Map::new();
    for (key, value) in [
        ("device", device),
        ("preset", preset),
        ("bgColor1", style.color1),
        ("bgColor2", style.color2),
    ] {
        if let Some(value) = value {
            arguments.insert(key.into(), Value::String(value));
        }
    }
    arguments
}

fn read_slides(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read slide file {}", path.display()))?;
    let slides: Value = serde_json::from_str(&content)
        .with_context(|| format!("Slide file {} is not valid JSON", path.display()))?;
    if !slides.is_array() {
        anyhow::bail!("Slide file {} must contain a JSON array", path.display());
    }
    Ok(slides)
}

fn handle_tool(
    server: &ToolServer,
    tool: &str,
    arguments: Value,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<()> {
    let response = server.handle(tool, arguments);
    formatter.format_response(&response, &mut stdout())?;
    if response.is_error {
        std::process::exit(1);
    }
    Ok(())
}

// =============================================================================
// Config Handler
// =============================================================================

fn handle_config(
    get: Option<String>,
    set: Option<String>,
    list: bool,
    reset: bool,
    path: bool,
    config_path: PathBuf,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<()> {
    let mut out = stdout();

    if path {
        formatter.format_message(&config_path.display().to_string(), &mut out)?;
        return Ok(());
    }

    if reset {
        StoreshotConfig::default().save_to(config_path.clone())?;
        formatter.format_message(
            &format!("Configuration reset to defaults in {}", config_path.display()),
            &mut out,
        )?;
        return Ok(());
    }

    let mut config = StoreshotConfig::load_from(config_path.clone());

    if let Some(key) = get {
        match config.get(&key) {
            Some(value) => formatter.format_config(&[(key, value)], &mut out)?,
            None => {
                formatter.format_error(&format!("Unknown configuration key: {}", key), &mut out)?;
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if let Some(kv) = set {
        let Some((key, value)) = kv.split_once('=') else {
            formatter.format_error("Invalid format. Use: --set key=value", &mut out)?;
            std::process::exit(1);
        };

        match config.set(key, value) {
            Ok(()) => {
                config.save_to(config_path.clone())?;
                formatter.format_config(&[(key.to_string(), value.to_string())], &mut out)?;
            }
            Err(e) => {
                formatter.format_error(&e.to_string(), &mut out)?;
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if list {
        formatter.format_config(&config.list(), &mut out)?;
        return Ok(());
    }

    formatter.format_message(
        "Configuration commands:\n  \
         storeshot config --list            Show all settings\n  \
         storeshot config --get <key>       Get a setting\n  \
         storeshot config --set <key>=<val> Set a setting\n  \
         storeshot config --reset           Reset to defaults\n  \
         storeshot config --path            Show config file path",
        &mut out,
    )?;
    Ok(())
}
