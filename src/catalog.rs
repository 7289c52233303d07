//! Static device and color preset tables.
//!
//! Both tables are ordered the way they are listed to callers.

use serde::Serialize;

/// Device used when a request does not name one. Always part of the free plan.
pub const DEFAULT_DEVICE: &str = "iphone-15-pro-max";

/// Gradient used when a request names neither a preset nor colors.
pub const DEFAULT_COLORS: (&str, &str) = ("#667eea", "#764ba2");

/// A target canvas size and form factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub id: &'static str,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub display_name: &'static str,
    pub is_tablet: bool,
}

/// A named pair of gradient colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPreset {
    pub id: &'static str,
    pub color_a: &'static str,
    pub color_b: &'static str,
    pub description: &'static str,
}

const fn device(
    id: &'static str,
    pixel_width: u32,
    pixel_height: u32,
    display_name: &'static str,
) -> DeviceProfile {
    DeviceProfile {
        id,
        pixel_width,
        pixel_height,
        display_name,
        is_tablet: is_tablet_id(id),
    }
}

const fn is_tablet_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() >= 5
        && bytes[0] == b'i'
        && bytes[1] == b'p'
        && bytes[2] == b'a'
        && bytes[3] == b'd'
        && bytes[4] == b'-'
}

pub const DEVICES: &[DeviceProfile] = &[
    device("iphone-15-pro-max", 1290, 2796, "iPhone 15 Pro Max (6.7\")"),
    device("iphone-15-pro", 1179, 2556, "iPhone 15 Pro (6.1\")"),
    device("iphone-se", 750, 1334, "iPhone SE (4.7\")"),
    device("ipad-pro", 2048, 2732, "iPad Pro 12.9\""),
    device("ipad-pro-11", 1668, 2388, "iPad Pro 11\""),
    device("ipad-air", 1640, 2360, "iPad Air"),
    device("ipad-mini", 1488, 2266, "iPad Mini"),
];

pub const PRESETS: &[ColorPreset] = &[
    ColorPreset {
        id: "purple",
        color_a: "#667eea",
        color_b: "#764ba2",
        description: "Purple gradient",
    },
    ColorPreset {
        id: "pink",
        color_a: "#f093fb",
        color_b: "#f5576c",
        description: "Pink gradient",
    },
    ColorPreset {
        id: "blue",
        color_a: "#4facfe",
        color_b: "#00f2fe",
        description: "Blue/Cyan gradient",
    },
    ColorPreset {
        id: "green",
        color_a: "#43e97b",
        color_b: "#38f9d7",
        description: "Green gradient",
    },
    ColorPreset {
        id: "orange",
        color_a: "#fa709a",
        color_b: "#fee140",
        description: "Orange/Yellow gradient",
    },
    ColorPreset {
        id: "dark",
        color_a: "#232526",
        color_b: "#414345",
        description: "Dark gradient",
    },
    ColorPreset {
        id: "light",
        color_a: "#e0e5ec",
        color_b: "#f5f7fa",
        description: "Light gradient",
    },
];

pub fn find_device(id: &str) -> Option<&'static DeviceProfile> {
    DEVICES.iter().find(|d| d.id == id)
}

pub fn find_preset(id: &str) -> Option<&'static ColorPreset> {
    PRESETS.iter().find(|p| p.id == id)
}
