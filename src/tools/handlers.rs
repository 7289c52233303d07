//! Tool dispatch: argument parsing, calls into the store and generator, and
//! the human-readable text of every response.

use std::path::PathBuf;

use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::protocol::{ToolDefinition, ToolRequest, ToolResponse};
use crate::catalog::{DEVICES, PRESETS};
use crate::entitlements::messages::{self, PRO_MONTHLY_PRICE, SEPARATOR};
use crate::entitlements::{EntitlementError, EntitlementStore, Plan};
use crate::mockup::{
    BatchRequest, BatchSlide, GenerateError, GeneratedOutput, GenerationRequest, MockupGenerator,
    Renderer, SourceImage,
};

pub const GENERATE_SCREENSHOT: &str = "generate_screenshot";
pub const GENERATE_BATCH: &str = "generate_batch_screenshots";
pub const SUBSCRIPTION_STATUS: &str = "subscription_status";
pub const ACTIVATE_SUBSCRIPTION: &str = "activate_subscription";
pub const DEACTIVATE_SUBSCRIPTION: &str = "deactivate_subscription";
pub const REFRESH_SUBSCRIPTION: &str = "refresh_subscription";
pub const LIST_PRESETS: &str = "list_presets";
pub const LIST_DEVICES: &str = "list_devices";
pub const LIST_TOOLS: &str = "list_tools";

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid base64 screenshot: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateArgs {
    headline: String,
    subheadline: String,
    screenshot_path: Option<PathBuf>,
    screenshot_base64: Option<String>,
    output_path: Option<PathBuf>,
    device: Option<String>,
    preset: Option<String>,
    bg_color1: Option<String>,
    bg_color2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SlideArgs {
    headline: String,
    subheadline: String,
    screenshot_path: Option<PathBuf>,
    screenshot_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchArgs {
    slides: Vec<SlideArgs>,
    output_directory: PathBuf,
    device: Option<String>,
    preset: Option<String>,
    bg_color1: Option<String>,
    bg_color2: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivateArgs {
    key: String,
    email: Option<String>,
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}

/// A path wins over inline data. Inline data may carry a `data:` URL prefix.
fn source_image(
    path: Option<PathBuf>,
    inline: Option<String>,
) -> Result<Option<SourceImage>, ToolError> {
    if let Some(path) = path {
        return Ok(Some(SourceImage::Path(path)));
    }
    let Some(inline) = inline else {
        return Ok(None);
    };
    let payload = match inline.split_once("base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => inline.as_str(),
    };
    let bytes = BASE64_STANDARD.decode(payload.trim())?;
    Ok(Some(SourceImage::Bytes(bytes)))
}

// =============================================================================
// Server
// =============================================================================

/// Owns the entitlement store and renderer for the lifetime of the process
/// and answers tool calls against them.
#[derive(Debug)]
pub struct ToolServer {
    store: EntitlementStore,
    renderer: Renderer,
}

impl ToolServer {
    pub fn new(store: EntitlementStore, renderer: Renderer) -> Self {
        Self { store, renderer }
    }

    pub fn store(&self) -> &EntitlementStore {
        &self.store
    }

    /// Answer `request`, echoing its id.
    pub fn handle_request(&self, request: ToolRequest) -> ToolResponse {
        self.handle(&request.tool, request.arguments)
            .with_id(request.id)
    }

    /// Run one tool. Failures become `isError` responses.
    pub fn handle(&self, tool: &str, arguments: Value) -> ToolResponse {
        tracing::debug!(tool, "Handling tool call");
        match self.dispatch(tool, arguments) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(tool, "Tool call failed: {}", e);
                ToolResponse::error(e)
            }
        }
    }

    fn dispatch(&self, tool: &str, arguments: Value) -> Result<ToolResponse, ToolError> {
        match tool {
            GENERATE_SCREENSHOT => self.generate(parse(tool, arguments)?),
            GENERATE_BATCH => self.generate_batch(parse(tool, arguments)?),
            SUBSCRIPTION_STATUS => Ok(self.subscription_status()),
            ACTIVATE_SUBSCRIPTION => self.activate(parse(tool, arguments)?),
            DEACTIVATE_SUBSCRIPTION => {
                self.store.deactivate()?;
                Ok(ToolResponse::text(messages::deactivated(self.store.links())))
            }
            REFRESH_SUBSCRIPTION => Ok(ToolResponse::text(self.store.refresh()?.message)),
            LIST_PRESETS => Ok(ToolResponse::text(self.list_presets())),
            LIST_DEVICES => Ok(ToolResponse::text(self.list_devices())),
            LIST_TOOLS => Ok(ToolResponse::text(serde_json::to_string_pretty(
                &definitions(),
            )?)),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    fn generate(&self, args: GenerateArgs) -> Result<ToolResponse, ToolError> {
        let request = GenerationRequest {
            headline: args.headline,
            subheadline: args.subheadline,
            source: source_image(args.screenshot_path, args.screenshot_base64)?,
            output_path: args.output_path,
            device: args.device,
            preset: args.preset,
            color_a: args.bg_color1,
            color_b: args.bg_color2,
        };
        let result = MockupGenerator::new(&self.store, &self.renderer).generate(&request)?;

        let mut text = String::from("✅ Screenshot generated!\n\n");
        if let Some(path) = result.path() {
            text.push_str(&format!("📁 Saved: {}\n", path.display()));
        }
        text.push_str(&format!(
            "📐 Size: {}x{}\n{}",
            result.width, result.height, result.usage_info
        ));
        if result.watermarked {
            text.push_str(&messages::watermark_note(self.store.links()));
        }

        let response = ToolResponse::text(text);
        Ok(match result.output {
            GeneratedOutput::Png(bytes) => response.with_image(BASE64_STANDARD.encode(bytes)),
            GeneratedOutput::File(_) => response,
        })
    }

    fn generate_batch(&self, args: BatchArgs) -> Result<ToolResponse, ToolError> {
        let slides = args
            .slides
            .into_iter()
            .map(|slide| {
                Ok(BatchSlide {
                    headline: slide.headline,
                    subheadline: slide.subheadline,
                    source: source_image(slide.screenshot_path, slide.screenshot_base64)?,
                })
            })
            .collect::<Result<Vec<_>, ToolError>>()?;

        let batch = BatchRequest {
            slides,
            output_dir: args.output_directory,
            device: args.device,
            preset: args.preset,
            color_a: args.bg_color1,
            color_b: args.bg_color2,
        };
        let results = MockupGenerator::new(&self.store, &self.renderer).generate_batch(&batch)?;

        let lines: Vec<String> = results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.path().map(|p| format!("{}. {}", i + 1, p.display())))
            .collect();
        Ok(ToolResponse::text(format!(
            "✅ Generated {} screenshots!\n\n{}",
            results.len(),
            lines.join("\n")
        )))
    }

    fn subscription_status(&self) -> ToolResponse {
        let status = self.store.status();
        let usage = self.store.check_usage();
        ToolResponse::text(format!(
            "{}\n\n{SEPARATOR}\n\n📊 Today's Usage:\n{}",
            status.message, usage.message
        ))
    }

    fn activate(&self, args: ActivateArgs) -> Result<ToolResponse, ToolError> {
        let report = self.store.activate(&args.key, args.email)?;
        Ok(ToolResponse::text(report.message))
    }

    fn list_presets(&self) -> String {
        let available = self.store.features().allowed_presets;
        let mut list = String::from("🎨 Available Presets:\n\n");
        for preset in PRESETS {
            let unlocked = available.contains(preset.id);
            list.push_str(&format!(
                "{} {}: {} → {}{}\n",
                if unlocked { "✅" } else { "🔒" },
                preset.id,
                preset.color_a,
                preset.color_b,
                if unlocked { "" } else { " (Pro)" }
            ));
        }
        self.append_unlock_footer(&mut list, "presets");
        list
    }

    fn list_devices(&self) -> String {
        let available = self.store.features().allowed_devices;
        let mut list = String::from("📱 Available Devices:\n\n");
        for device in DEVICES {
            let unlocked = available.contains(device.id);
            list.push_str(&format!(
                "{} {}: {} ({}x{}){}\n",
                if unlocked { "✅" } else { "🔒" },
                device.id,
                device.display_name,
                device.pixel_width,
                device.pixel_height,
                if unlocked { "" } else { " (Pro)" }
            ));
        }
        self.append_unlock_footer(&mut list, "devices");
        list
    }

    fn append_unlock_footer(&self, list: &mut String, what: &str) {
        if self.store.plan() == Plan::Free {
            list.push_str(&messages::unlock_footer(self.store.links(), what));
        }
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// Every tool this server answers, with its argument schema.
pub fn definitions() -> Vec<ToolDefinition> {
    let device_ids: Vec<&str> = DEVICES.iter().map(|d| d.id).collect();
    let preset_ids: Vec<&str> = PRESETS.iter().map(|p| p.id).collect();
    let no_arguments = json!({"type": "object", "properties": {}, "required": []});

    vec![
        ToolDefinition {
            name: GENERATE_SCREENSHOT,
            description: format!(
                "Generate a store screenshot with text overlay and device mockup.\n\n\
                 FREE PLAN: 3 screenshots/day, watermark, limited presets (purple, dark), iPhone 15 Pro Max only\n\
                 PRO PLAN ({PRO_MONTHLY_PRICE}/mo): Unlimited, no watermark, all presets & devices, batch generation, custom colors"
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "headline": {"type": "string", "description": "Main headline text (first line)"},
                    "subheadline": {"type": "string", "description": "Sub-headline text (second line)"},
                    "screenshotPath": {"type": "string", "description": "Path to the app screenshot image file"},
                    "screenshotBase64": {"type": "string", "description": "Base64 encoded app screenshot (alternative to path)"},
                    "outputPath": {"type": "string", "description": "Path to save the generated screenshot"},
                    "device": {"type": "string", "enum": device_ids, "description": "Device type (Free: iPhone 15 Pro Max only)"},
                    "preset": {"type": "string", "enum": preset_ids, "description": "Color preset (Free: purple, dark only)"},
                    "bgColor1": {"type": "string", "description": "Custom gradient color 1 (Pro only)"},
                    "bgColor2": {"type": "string", "description": "Custom gradient color 2 (Pro only)"}
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: GENERATE_BATCH,
            description: format!(
                "Generate multiple screenshots at once (PRO feature - {PRO_MONTHLY_PRICE}/mo)"
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slides": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "headline": {"type": "string"},
                                "subheadline": {"type": "string"},
                                "screenshotPath": {"type": "string"},
                                "screenshotBase64": {"type": "string"}
                            }
                        },
                        "description": "Array of slide configurations"
                    },
                    "outputDirectory": {"type": "string", "description": "Directory to save all generated screenshots"},
                    "device": {"type": "string", "enum": device_ids},
                    "preset": {"type": "string", "enum": preset_ids},
                    "bgColor1": {"type": "string"},
                    "bgColor2": {"type": "string"}
                },
                "required": ["slides", "outputDirectory"]
            }),
        },
        ToolDefinition {
            name: SUBSCRIPTION_STATUS,
            description: "Check your current subscription status and usage".to_string(),
            input_schema: no_arguments.clone(),
        },
        ToolDefinition {
            name: ACTIVATE_SUBSCRIPTION,
            description: "Activate a Pro subscription with your license key".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "License key (XXXX-XXXX-XXXX-XXXX)"},
                    "email": {"type": "string", "description": "Email used for the purchase"}
                },
                "required": ["key"]
            }),
        },
        ToolDefinition {
            name: DEACTIVATE_SUBSCRIPTION,
            description: "Deactivate your current subscription on this device".to_string(),
            input_schema: no_arguments.clone(),
        },
        ToolDefinition {
            name: REFRESH_SUBSCRIPTION,
            description: "Re-check the stored license key and update the subscription".to_string(),
            input_schema: no_arguments.clone(),
        },
        ToolDefinition {
            name: LIST_PRESETS,
            description: "List available color presets for your plan".to_string(),
            input_schema: no_arguments.clone(),
        },
        ToolDefinition {
            name: LIST_DEVICES,
            description: "List available device mockups for your plan".to_string(),
            input_schema: no_arguments,
        },
    ]
}
