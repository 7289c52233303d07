//! SVG description of the mockup: background, headline text and device frame.

use std::fmt::Write;

use super::layout::{MockupLayout, Rect, TextLine};

const FONT_FAMILY: &str = "SF Pro Display, Helvetica Neue, Arial, sans-serif";
const BUTTON_FILL: &str = "#3a3a3c";

pub const WATERMARK_CAPTION: &str = "Made with AppStore Screenshot Generator - Upgrade to remove";
pub const WATERMARK_LABEL: &str = "FREE VERSION - $4.9/mo to remove watermark";

/// Everything the SVG template needs besides geometry.
#[derive(Debug, Clone, Copy)]
pub struct SceneText<'a> {
    pub headline: &'a str,
    pub subheadline: &'a str,
    pub color_a: &'a str,
    pub color_b: &'a str,
    pub watermark: bool,
}

/// Escape `& < > " '` for use in SVG text and attribute values.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn rounded_rect(svg: &mut String, rect: Rect, radius: f64, fill: &str, extra: &str) {
    let _ = writeln!(
        svg,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="{radius}" ry="{radius}" fill="{fill}"{extra}/>"#,
        rect.x, rect.y, rect.width, rect.height
    );
}

fn centered_text(
    svg: &mut String,
    x: f64,
    line: TextLine,
    weight: u32,
    fill: &str,
    extra: &str,
    text: &str,
) {
    let TextLine {
        baseline: y,
        font_size: size,
    } = line;
    let _ = writeln!(
        svg,
        r#"  <text x="{x}" y="{y}" text-anchor="middle" font-family="{FONT_FAMILY}" font-size="{size}" font-weight="{weight}" fill="{fill}"{extra}>{}</text>"#,
        escape_xml(text)
    );
}

/// Render the mockup scene for `layout` as an SVG document.
pub fn build_svg(layout: &MockupLayout, text: &SceneText<'_>) -> String {
    let width = layout.canvas_width;
    let height = layout.canvas_height;
    let center_x = f64::from(width) / 2.0;
    let color_a = escape_xml(text.color_a);
    let color_b = escape_xml(text.color_b);

    let mut svg = String::with_capacity(4096);
    let _ = writeln!(
        svg,
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
    );
    let _ = writeln!(
        svg,
        r#"<defs>
  <linearGradient id="bgGradient" x1="0%" y1="0%" x2="100%" y2="100%">
    <stop offset="0%" style="stop-color:{color_a};stop-opacity:1"/>
    <stop offset="100%" style="stop-color:{color_b};stop-opacity:1"/>
  </linearGradient>
  <linearGradient id="frameGradient" x1="0%" y1="0%" x2="100%" y2="0%">
    <stop offset="0%" style="stop-color:#1c1c1e"/>
    <stop offset="30%" style="stop-color:#2c2c2e"/>
    <stop offset="50%" style="stop-color:#3a3a3c"/>
    <stop offset="70%" style="stop-color:#2c2c2e"/>
    <stop offset="100%" style="stop-color:#1c1c1e"/>
  </linearGradient>
  <linearGradient id="highlightGradient" x1="0%" y1="0%" x2="0%" y2="100%">
    <stop offset="0%" style="stop-color:#ffffff;stop-opacity:0.1"/>
    <stop offset="100%" style="stop-color:#ffffff;stop-opacity:0"/>
  </linearGradient>
  <filter id="shadow" x="-20%" y="-20%" width="140%" height="140%">
    <feDropShadow dx="0" dy="20" stdDeviation="30" flood-opacity="0.4"/>
  </filter>
  <filter id="textShadow" x="-20%" y="-20%" width="140%" height="140%">
    <feDropShadow dx="0" dy="4" stdDeviation="5" flood-opacity="0.3"/>
  </filter>
</defs>"#
    );

    let _ = writeln!(
        svg,
        r#"  <rect width="{width}" height="{height}" fill="url(#bgGradient)"/>"#
    );

    let text_shadow = r#" filter="url(#textShadow)""#;
    centered_text(
        &mut svg,
        center_x,
        layout.headline,
        700,
        "white",
        text_shadow,
        text.headline,
    );
    centered_text(
        &mut svg,
        center_x,
        layout.subheadline,
        600,
        "white",
        text_shadow,
        text.subheadline,
    );

    let frame_radius = f64::from(layout.frame_radius);
    rounded_rect(
        &mut svg,
        layout.frame,
        frame_radius,
        "url(#frameGradient)",
        r#" filter="url(#shadow)""#,
    );
    rounded_rect(
        &mut svg,
        layout.screen,
        f64::from(layout.screen_radius),
        "#000",
        "",
    );

    if let Some(island) = layout.island {
        rounded_rect(&mut svg, island, f64::from(island.height) / 2.0, "#000", "");
    }

    let indicator = layout.home_indicator;
    rounded_rect(
        &mut svg,
        indicator,
        f64::from(indicator.height) / 2.0,
        "#ffffff",
        r#" fill-opacity="0.5""#,
    );

    for button in &layout.buttons {
        rounded_rect(
            &mut svg,
            button.rect,
            f64::from(button.rect.width) / 2.0,
            BUTTON_FILL,
            "",
        );
    }

    let _ = writeln!(
        svg,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="{frame_radius}" ry="{frame_radius}" fill="url(#highlightGradient)"/>"#,
        layout.frame.x, layout.frame.y, layout.frame.width, layout.highlight_height
    );

    if text.watermark {
        let mark = &layout.watermark;
        centered_text(
            &mut svg,
            center_x,
            mark.caption,
            500,
            "#ffffff",
            r#" fill-opacity="0.6""#,
            WATERMARK_CAPTION,
        );
        let _ = writeln!(
            svg,
            r##"  <rect x="{}" y="{}" width="{}" height="{}" rx="10" ry="10" fill="#000000" fill-opacity="0.4"/>"##,
            mark.band_x, mark.band_y, mark.band_width, mark.band_height
        );
        centered_text(
            &mut svg,
            center_x,
            mark.label,
            600,
            "white",
            "",
            WATERMARK_LABEL,
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// A white rounded rectangle on a transparent canvas, used as the screen clip.
pub fn screen_mask_svg(width: u32, height: u32, radius: u32) -> String {
    format!(
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="{width}" height="{height}" rx="{radius}" ry="{radius}" fill="white"/></svg>"#
    )
}
