//! Rasterization and compositing.
//!
//! SVG scenes go through `resvg`; source screenshots are decoded and resized
//! with `image`, clipped with a rendered rounded-rect mask and drawn onto the
//! scene pixmap.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use resvg::tiny_skia::{self, IntSize, Mask, MaskType, Pixmap, PixmapPaint, Transform};
use resvg::usvg;

use super::layout::Rect;
use super::scene;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to parse scene: {0}")]
    Scene(#[from] usvg::Error),

    #[error("Invalid canvas size {width}x{height}")]
    CanvasSize { width: u32, height: u32 },

    #[error("Source image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Holds the font database so it is only scanned once per process.
pub struct Renderer {
    options: usvg::Options<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("fonts", &self.options.fontdb.len())
            .finish()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        tracing::debug!("Loaded {} font faces", options.fontdb.len());
        Self { options }
    }

    /// Rasterize `svg` onto a transparent `width` x `height` pixmap.
    pub fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Pixmap, RenderError> {
        let tree = usvg::Tree::from_str(svg, &self.options)?;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::CanvasSize { width, height })?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        Ok(pixmap)
    }

    /// Fill `screen` on `base` with `source`, cropped to cover and clipped to
    /// a rounded rectangle of `radius`.
    pub fn composite_screen(
        &self,
        base: &mut Pixmap,
        source: &[u8],
        screen: Rect,
        radius: u32,
    ) -> Result<(), RenderError> {
        let decoded = image::load_from_memory(source).map_err(RenderError::Decode)?;
        let fitted = cover_top(&decoded, screen.width, screen.height);
        let mut layer = to_pixmap(&fitted)?;

        let mask_svg = scene::screen_mask_svg(screen.width, screen.height, radius);
        let mask_pixmap = self.rasterize(&mask_svg, screen.width, screen.height)?;
        let mask = Mask::from_pixmap(mask_pixmap.as_ref(), MaskType::Alpha);
        layer.apply_mask(&mask);

        base.draw_pixmap(
            screen.x as i32,
            screen.y as i32,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(())
    }
}

/// Scale `image` to cover `width` x `height`, keeping the top edge and
/// trimming the overflow from the bottom and evenly from the sides.
pub fn cover_top(image: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = (image.width().max(1), image.height().max(1));
    let scale = f64::max(
        f64::from(width) / f64::from(src_w),
        f64::from(height) / f64::from(src_h),
    );
    let scaled_w = ((f64::from(src_w) * scale).round() as u32).max(width);
    let scaled_h = ((f64::from(src_h) * scale).round() as u32).max(height);

    let resized = image.resize_exact(scaled_w, scaled_h, FilterType::Lanczos3);
    let left = (scaled_w - width) / 2;
    resized.crop_imm(left, 0, width, height).to_rgba8()
}

fn to_pixmap(image: &RgbaImage) -> Result<Pixmap, RenderError> {
    let size = IntSize::from_wh(image.width(), image.height()).ok_or(RenderError::CanvasSize {
        width: image.width(),
        height: image.height(),
    })?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let color = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    Pixmap::from_vec(data, size).ok_or(RenderError::CanvasSize {
        width: image.width(),
        height: image.height(),
    })
}

fn to_rgba_image(pixmap: &Pixmap) -> Result<RgbaImage, RenderError> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .ok_or_else(|| RenderError::Encode("pixel buffer size mismatch".to_string()))
}

/// Encode `pixmap` as PNG bytes.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

/// Save `pixmap` to `path`. The format follows the extension and falls back
/// to PNG; formats without alpha get the image flattened to RGB.
pub fn save(pixmap: &Pixmap, path: &Path) -> Result<(), RenderError> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let image = DynamicImage::ImageRgba8(to_rgba_image(pixmap)?);
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    let format = match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => format,
        _ => ImageFormat::Png,
    };
    image
        .save_with_format(path, format)
        .map_err(|source| RenderError::Write {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    fn striped(width: u32, height: u32) -> DynamicImage {
        // Red top row, blue everywhere else.
        let img = RgbaImage::from_fn(width, height, |_, y| {
            if y == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn test_cover_top_exact_size() {
        let fitted = cover_top(&striped(100, 400), 50, 50);
        assert_eq!(fitted.dimensions(), (50, 50));
        let wide = cover_top(&striped(400, 100), 50, 50);
        assert_eq!(wide.dimensions(), (50, 50));
    }

    #[test]
    fn test_cover_top_keeps_top_edge() {
        // Tall source: scale 1.0 to width, excess height trimmed from the bottom.
        let fitted = cover_top(&striped(40, 400), 40, 40);
        let [r, _, b, _] = fitted.get_pixel(20, 0).0;
        assert!(r > 200 && b < 60, "top row should stay red");
        let [r, _, b, _] = fitted.get_pixel(20, 39).0;
        assert!(r < 20 && b > 230, "bottom row should be blue");
    }

    #[test]
    fn test_rasterize_matches_requested_size() {
        let renderer = Renderer::new();
        let svg = scene::screen_mask_svg(30, 20, 4);
        let pixmap = renderer.rasterize(&svg, 30, 20).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (30, 20));
        // Corner clipped, center filled.
        assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 0);
        assert_eq!(pixmap.pixel(15, 10).unwrap().alpha(), 255);
    }

    #[test]
    fn test_composite_clips_rounded_corners() {
        let renderer = Renderer::new();
        let mut base = Pixmap::new(60, 60).unwrap();
        base.fill(tiny_skia::Color::BLACK);

        let mut source = Vec::new();
        striped(20, 20)
            .write_to(&mut std::io::Cursor::new(&mut source), ImageFormat::Png)
            .unwrap();

        let screen = Rect {
            x: 10,
            y: 10,
            width: 40,
            height: 40,
        };
        renderer
            .composite_screen(&mut base, &source, screen, 10)
            .unwrap();

        let image = to_rgba_image(&base).unwrap();
        // Rounded corner keeps the black base.
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 0, 255]);
        // Middle of the screen shows the source.
        let [r, _, b, a] = image.get_pixel(30, 40).0;
        assert!(r < 20 && b > 230 && a == 255);
        // Outside the screen untouched.
        assert_eq!(image.get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_undecodable_source_is_an_error() {
        let renderer = Renderer::new();
        let mut base = Pixmap::new(10, 10).unwrap();
        let screen = Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        let err = renderer
            .composite_screen(&mut base, b"not an image", screen, 2)
            .unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn test_save_follows_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut pixmap = Pixmap::new(8, 6).unwrap();
        pixmap.fill(tiny_skia::Color::WHITE);

        let png = dir.path().join("out.png");
        save(&pixmap, &png).unwrap();
        assert_eq!(image::image_dimensions(&png).unwrap(), (8, 6));

        let jpg = dir.path().join("out.jpg");
        save(&pixmap, &jpg).unwrap();
        assert_eq!(
            image::ImageFormat::from_path(&jpg).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert_eq!(image::open(&jpg).unwrap().dimensions(), (8, 6));
    }
}
