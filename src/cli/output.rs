//! Output formatters for the storeshot CLI
//!
//! - **Human**: the tool response text as-is, for terminal use
//! - **JSON**: one JSON object per call, for scripting and jq
//!
//! ## Example
//!
//! ```rust,no_run
//! use storeshot::cli::output::{create_formatter, OutputFormat};
//! use storeshot::tools::ToolResponse;
//!
//! let formatter = create_formatter(OutputFormat::Json, false);
//! let mut stdout = std::io::stdout();
//! formatter
//!     .format_response(&ToolResponse::text("ok"), &mut stdout)
//!     .unwrap();
//! ```

use std::io::{self, Write};

use crate::tools::ToolResponse;

// =============================================================================
// Output Format Enum
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

// =============================================================================
// Formatter Trait
// =============================================================================

pub trait OutputFormatter: Send + Sync {
    /// Format the response of one tool call
    fn format_response(&self, response: &ToolResponse, writer: &mut dyn Write) -> io::Result<()>;

    /// Format `key = value` configuration pairs
    fn format_config(&self, entries: &[(String, String)], writer: &mut dyn Write) -> io::Result<()>;

    /// Format a plain informational line
    fn format_message(&self, message: &str, writer: &mut dyn Write) -> io::Result<()>;

    /// Format an error message
    fn format_error(&self, error: &str, writer: &mut dyn Write) -> io::Result<()>;
}

// =============================================================================
// Human Formatter
// =============================================================================

pub struct HumanFormatter {
    use_color: bool,
}

impl HumanFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_response(
        &self,
        response: &ToolResponse,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let text = response.text_content();
        if response.is_error {
            writeln!(writer, "{}", self.colorize(&text, "31"))?;
        } else {
            writeln!(writer, "{}", text)?;
        }
        for image in response.images() {
            let note = format!("[inline image/png, {} base64 chars]", image.len());
            writeln!(writer, "{}", self.colorize(&note, "90"))?;
        }
        Ok(())
    }

    fn format_config(
        &self,
        entries: &[(String, String)],
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in entries {
            writeln!(writer, "{:<width$} = {}", key, value, width = width)?;
        }
        Ok(())
    }

    fn format_message(&self, message: &str, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", message)
    }

    fn format_error(&self, error: &str, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}: {}", self.colorize("Error", "1;31"), error)
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

#[derive(Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    fn write_json(&self, value: &serde_json::Value, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", serde_json::to_string(value)?)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_response(
        &self,
        response: &ToolResponse,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        writeln!(writer, "{}", serde_json::to_string(response)?)
    }

    fn format_config(
        &self,
        entries: &[(String, String)],
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        self.write_json(&serde_json::Value::Object(map), writer)
    }

    fn format_message(&self, message: &str, writer: &mut dyn Write) -> io::Result<()> {
        self.write_json(
            &serde_json::json!({"type": "message", "message": message}),
            writer,
        )
    }

    fn format_error(&self, error: &str, writer: &mut dyn Write) -> io::Result<()> {
        self.write_json(
            &serde_json::json!({"type": "error", "message": error}),
            writer,
        )
    }
}

// =============================================================================
// Factory Function
// =============================================================================

pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human => Box::new(HumanFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
