//! Device frame geometry.
//!
//! Every measurement is a proportion of the canvas (or of the frame width once
//! that is known) floored to a whole pixel. Phones get a fixed 2.16 frame
//! aspect with a camera island and side buttons; tablets keep the canvas
//! aspect ratio and have neither.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    VolumeUp,
    VolumeDown,
    Action,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideButton {
    pub kind: ButtonKind,
    pub rect: Rect,
}

/// Baseline and size of one centered text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLine {
    pub baseline: u32,
    pub font_size: u32,
}

/// The free-plan notice: a caption at the very bottom and a dark band with
/// an upgrade line near the lower edge of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkLayout {
    pub caption: TextLine,
    pub band_x: f64,
    pub band_y: f64,
    pub band_width: f64,
    pub band_height: u32,
    pub label: TextLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockupLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub is_tablet: bool,
    pub frame: Rect,
    pub frame_radius: u32,
    pub border: u32,
    pub screen: Rect,
    pub screen_radius: u32,
    pub island: Option<Rect>,
    pub home_indicator: Rect,
    pub buttons: Vec<SideButton>,
    /// Height of the translucent band over the top of the frame.
    pub highlight_height: f64,
    pub headline: TextLine,
    pub subheadline: TextLine,
    pub watermark: WatermarkLayout,
}

fn px(value: f64) -> u32 {
    value.floor().max(0.0) as u32
}

/// Compute the mockup geometry for a `width` x `height` canvas.
pub fn compute(width: u32, height: u32, is_tablet: bool) -> MockupLayout {
    let w = f64::from(width);
    let h = f64::from(height);

    let (frame_width, frame_height, frame_top, frame_radius, border, screen_radius) = if is_tablet
    {
        let fw = px(w * 0.85);
        let fwf = f64::from(fw);
        (
            fw,
            px(fwf * (h / w)),
            px(h * 0.18),
            px(fwf * 0.03),
            px(fwf * 0.015),
            px(fwf * 0.025),
        )
    } else {
        let fw = px(w * 0.75);
        let fwf = f64::from(fw);
        (
            fw,
            px(fwf * 2.16),
            px(h * 0.24),
            px(fwf * 0.12),
            px(fwf * 0.025),
            px(fwf * 0.1),
        )
    };

    let fw = f64::from(frame_width);
    let fh = f64::from(frame_height);
    let frame_x = (width.saturating_sub(frame_width)) / 2;

    let frame = Rect {
        x: frame_x,
        y: frame_top,
        width: frame_width,
        height: frame_height,
    };

    let screen = Rect {
        x: frame_x + border,
        y: frame_top + border,
        width: frame_width.saturating_sub(border * 2),
        height: frame_height.saturating_sub(border * 2),
    };

    let island = (!is_tablet).then(|| {
        let island_width = px(fw * 0.35);
        Rect {
            x: frame_x + (frame_width - island_width) / 2,
            y: frame_top + border + px(fw * 0.03),
            width: island_width,
            height: px(fw * 0.085),
        }
    });

    let (indicator_width, indicator_height, indicator_inset) = if is_tablet {
        (px(fw * 0.15), px(fw * 0.005), px(fw * 0.02))
    } else {
        (px(fw * 0.35), px(fw * 0.015), px(fw * 0.05))
    };
    let home_indicator = Rect {
        x: frame_x + (frame_width - indicator_width) / 2,
        y: (frame_top + frame_height).saturating_sub(border + indicator_inset),
        width: indicator_width,
        height: indicator_height,
    };

    let buttons = if is_tablet {
        Vec::new()
    } else {
        side_buttons(frame, fw, fh)
    };

    let headline = TextLine {
        baseline: px(h * 0.1),
        font_size: px(w * 0.075),
    };
    let subheadline = TextLine {
        baseline: headline.baseline + px(f64::from(headline.font_size) * 1.3),
        font_size: px(w * 0.06),
    };

    let band_y = h * 0.85;
    let watermark = WatermarkLayout {
        caption: TextLine {
            baseline: height - px(h * 0.02),
            font_size: px(w * 0.025),
        },
        band_x: w * 0.1,
        band_y,
        band_width: w * 0.8,
        band_height: px(w * 0.08),
        label: TextLine {
            baseline: px(band_y + f64::from(px(w * 0.05))),
            font_size: px(w * 0.028),
        },
    };

    MockupLayout {
        canvas_width: width,
        canvas_height: height,
        is_tablet,
        frame,
        frame_radius,
        border,
        screen,
        screen_radius,
        island,
        home_indicator,
        buttons,
        highlight_height: fh * 0.3,
        headline,
        subheadline,
        watermark,
    }
}

fn side_buttons(frame: Rect, fw: f64, fh: f64) -> Vec<SideButton> {
    let button_width = px(fw * 0.008);
    let left_x = frame.x.saturating_sub(button_width);
    let volume_height = px(fw * 0.08);

    let mark = |kind, x, offset: f64, height| SideButton {
        kind,
        rect: Rect {
            x,
            y: frame.y + px(fh * offset),
            width: button_width,
            height,
        },
    };

    vec![
        mark(ButtonKind::VolumeUp, left_x, 0.18, volume_height),
        mark(ButtonKind::VolumeDown, left_x, 0.26, volume_height),
        mark(ButtonKind::Action, left_x, 0.12, px(fw * 0.06)),
        mark(ButtonKind::Power, frame.right(), 0.2, px(fw * 0.12)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_layout_for_pro_max() {
        let layout = compute(1290, 2796, false);

        assert_eq!(
            layout.frame,
            Rect {
                x: 161,
                y: 671,
                width: 967,
                height: 2088
            }
        );
        assert_eq!(layout.frame_radius, 116);
        assert_eq!(layout.border, 24);
        assert_eq!(
            layout.screen,
            Rect {
                x: 185,
                y: 695,
                width: 919,
                height: 2040
            }
        );
        assert_eq!(layout.screen_radius, 96);
        assert_eq!(
            layout.island,
            Some(Rect {
                x: 475,
                y: 724,
                width: 338,
                height: 82
            })
        );
        assert_eq!(
            layout.home_indicator,
            Rect {
                x: 475,
                y: 2687,
                width: 338,
                height: 14
            }
        );
        assert_eq!(layout.headline, TextLine { baseline: 279, font_size: 96 });
        assert_eq!(layout.subheadline, TextLine { baseline: 403, font_size: 77 });
    }

    fn button(kind: ButtonKind, x: u32, y: u32, height: u32) -> (ButtonKind, Rect) {
        let rect = Rect {
            x,
            y,
            width: 7,
            height,
        };
        (kind, rect)
    }

    #[test]
    fn test_phone_side_buttons() {
        let layout = compute(1290, 2796, false);
        let rects: Vec<(ButtonKind, Rect)> =
            layout.buttons.iter().map(|b| (b.kind, b.rect)).collect();
        assert_eq!(
            rects,
            vec![
                button(ButtonKind::VolumeUp, 154, 1046, 77),
                button(ButtonKind::VolumeDown, 154, 1213, 77),
                button(ButtonKind::Action, 154, 921, 58),
                button(ButtonKind::Power, 1128, 1088, 116),
            ]
        );
    }

    #[test]
    fn test_tablet_layout_keeps_canvas_aspect() {
        let layout = compute(2048, 2732, true);

        assert_eq!(
            layout.frame,
            Rect {
                x: 154,
                y: 491,
                width: 1740,
                height: 2321
            }
        );
        assert_eq!(layout.border, 26);
        assert_eq!(layout.frame_radius, 52);
        assert_eq!(layout.screen_radius, 43);
        assert_eq!(layout.island, None);
        assert!(layout.buttons.is_empty());
        assert_eq!(layout.home_indicator.width, 261);
        assert_eq!(layout.home_indicator.height, 8);
        assert_eq!(layout.home_indicator.y, 491 + 2321 - 26 - 34);
    }

    #[test]
    fn test_frame_is_centered() {
        for (w, h, tablet) in [(1290, 2796, false), (750, 1334, false), (1668, 2388, true)] {
            let layout = compute(w, h, tablet);
            let left = layout.frame.x;
            let right = w - layout.frame.right();
            assert!(left.abs_diff(right) <= 1, "{w}x{h}: {left} vs {right}");
        }
    }

    #[test]
    fn test_screen_sits_inside_frame_border() {
        let layout = compute(1179, 2556, false);
        assert_eq!(layout.screen.x, layout.frame.x + layout.border);
        assert_eq!(layout.screen.y, layout.frame.y + layout.border);
        assert_eq!(layout.screen.right() + layout.border, layout.frame.right());
        assert_eq!(layout.screen.bottom() + layout.border, layout.frame.bottom());
    }

    #[test]
    fn test_watermark_geometry() {
        let layout = compute(1290, 2796, false);
        assert_eq!(layout.watermark.caption.baseline, 2796 - 55);
        assert_eq!(layout.watermark.caption.font_size, 32);
        assert_eq!(layout.watermark.band_height, 103);
        assert_eq!(layout.watermark.label.font_size, 36);
    }
}
