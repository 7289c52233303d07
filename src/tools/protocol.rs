//! JSON shapes exchanged with tool clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tool call. `arguments` may be omitted for tools that take none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Content {
    Text {
        text: String,
    },
    /// Base64 image payload.
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub content: Vec<Content>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            id: None,
            content: vec![Content::Text {
                text: format!("❌ Error: {message}"),
            }],
            is_error: true,
        }
    }

    pub fn with_image(mut self, png_base64: String) -> Self {
        self.content.push(Content::Image {
            data: png_base64,
            mime_type: "image/png".to_string(),
        });
        self
    }

    pub fn with_id(mut self, id: Option<Value>) -> Self {
        self.id = id;
        self
    }

    /// All text parts joined by blank lines.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text { text } => Some(text.as_str()),
                Content::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|c| match c {
            Content::Image { data, .. } => Some(data.as_str()),
            Content::Text { .. } => None,
        })
    }
}

/// Name, description and JSON schema of a tool, as advertised by `list_tools`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: String,
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_arguments() {
        let req: ToolRequest = serde_json::from_str(r#"{"tool":"list_presets"}"#).unwrap();
        assert_eq!(req.tool, "list_presets");
        assert_eq!(req.id, None);
        assert!(req.arguments.is_null());
    }

    #[test]
    fn test_response_wire_shape() {
        let resp = ToolResponse::text("done")
            .with_image("AAAA".to_string())
            .with_id(Some(json!(7)));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "content": [
                    {"type": "text", "text": "done"},
                    {"type": "image", "data": "AAAA", "mimeType": "image/png"}
                ],
                "isError": false
            })
        );
    }

    #[test]
    fn test_error_response() {
        let resp = ToolResponse::error("Unknown tool: nope");
        assert!(resp.is_error);
        assert_eq!(resp.text_content(), "❌ Error: Unknown tool: nope");
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["isError"], true);
    }
}
