//! Screenshot generation gated by the entitlement store.

use std::path::{Path, PathBuf};

use super::layout;
use super::render::{self, RenderError, Renderer};
use super::scene::{self, SceneText};
use crate::catalog::{self, ColorPreset, DeviceProfile, DEFAULT_COLORS, DEFAULT_DEVICE};
use crate::entitlements::{EntitlementStore, PlanFeatures};

/// Screenshot to place on the device screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceImage {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub headline: String,
    pub subheadline: String,
    pub source: Option<SourceImage>,
    /// Where to save the image. `None` returns PNG bytes instead.
    pub output_path: Option<PathBuf>,
    pub device: Option<String>,
    pub preset: Option<String>,
    pub color_a: Option<String>,
    pub color_b: Option<String>,
}

/// One slide of a batch. Device and colors are shared across the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSlide {
    pub headline: String,
    pub subheadline: String,
    pub source: Option<SourceImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    pub slides: Vec<BatchSlide>,
    pub output_dir: PathBuf,
    pub device: Option<String>,
    pub preset: Option<String>,
    pub color_a: Option<String>,
    pub color_b: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedOutput {
    File(PathBuf),
    Png(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub width: u32,
    pub height: u32,
    pub watermarked: bool,
    pub output: GeneratedOutput,
    /// Usage line captured before the generation was counted.
    pub usage_info: String,
}

impl GenerationResult {
    pub fn path(&self) -> Option<&Path> {
        match &self.output {
            GeneratedOutput::File(path) => Some(path),
            GeneratedOutput::Png(_) => None,
        }
    }
}

/// Colors picked for the background gradient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColors {
    pub color_a: String,
    pub color_b: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{0}")]
    QuotaExceeded(String),

    #[error("Device \"{device}\" is not available in your plan.\n\nAvailable devices: {available}\n\n🚀 Upgrade to Pro for all devices: {purchase_url}")]
    DeviceNotEntitled {
        device: String,
        available: String,
        purchase_url: String,
    },

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Preset \"{preset}\" is not available in your plan.\n\nAvailable presets: {available}\n\n🚀 Upgrade to Pro for all presets: {purchase_url}")]
    PresetNotEntitled {
        preset: String,
        available: String,
        purchase_url: String,
    },

    #[error("Custom colors are not available in the Free plan.\n\nUse a preset instead: {available}\n\n🚀 Upgrade to Pro for custom colors: {purchase_url}")]
    CustomColorsNotEntitled {
        available: String,
        purchase_url: String,
    },

    #[error("Batch generation is not available in the Free plan.\n\n🚀 Upgrade to Pro for batch generation: {purchase_url}")]
    BatchNotEntitled { purchase_url: String },

    #[error("Cannot read source image {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders mockups for one installation, checking its entitlements first.
pub struct MockupGenerator<'a> {
    store: &'a EntitlementStore,
    renderer: &'a Renderer,
}

impl<'a> MockupGenerator<'a> {
    pub fn new(store: &'a EntitlementStore, renderer: &'a Renderer) -> Self {
        Self { store, renderer }
    }

    /// Render one screenshot and count it against today's usage.
    ///
    /// Entitlement checks run before any rendering. Usage is recorded only
    /// after the image is emitted; a failed usage write is logged and the
    /// generation still succeeds, so an unwritable state directory lifts the
    /// daily limit rather than blocking output.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerateError> {
        let usage = self.store.check_usage();
        if !usage.allowed {
            return Err(GenerateError::QuotaExceeded(usage.message));
        }

        let features = self.store.features();
        let device = self.resolve_device(request.device.as_deref(), &features)?;
        let colors = self.resolve_colors(
            request.preset.as_deref(),
            request.color_a.as_deref(),
            request.color_b.as_deref(),
            &features,
        )?;
        let source = request.source.as_ref().map(load_source).transpose()?;
        let watermarked = features.watermark_required;

        let geometry = layout::compute(device.pixel_width, device.pixel_height, device.is_tablet);
        let svg = scene::build_svg(
            &geometry,
            &SceneText {
                headline: &request.headline,
                subheadline: &request.subheadline,
                color_a: &colors.color_a,
                color_b: &colors.color_b,
                watermark: watermarked,
            },
        );

        let mut pixmap = self
            .renderer
            .rasterize(&svg, device.pixel_width, device.pixel_height)?;
        if let Some(bytes) = source {
            self.renderer.composite_screen(
                &mut pixmap,
                &bytes,
                geometry.screen,
                geometry.screen_radius,
            )?;
        }

        let output = match &request.output_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    create_dir(parent)?;
                }
                render::save(&pixmap, path)?;
                GeneratedOutput::File(path.clone())
            }
            None => GeneratedOutput::Png(render::encode_png(&pixmap)?),
        };

        if let Err(e) = self.store.increment_usage() {
            tracing::warn!("Failed to record usage: {}", e);
        }
        tracing::info!(
            device = device.id,
            watermarked,
            "Generated {}x{} screenshot",
            device.pixel_width,
            device.pixel_height
        );

        Ok(GenerationResult {
            width: device.pixel_width,
            height: device.pixel_height,
            watermarked,
            output,
            usage_info: usage.message,
        })
    }

    /// Generate every slide into `output_dir` as `screenshot_NN.png`, stopping
    /// at the first failure.
    pub fn generate_batch(
        &self,
        batch: &BatchRequest,
    ) -> Result<Vec<GenerationResult>, GenerateError> {
        if !self.store.batch_allowed() {
            return Err(GenerateError::BatchNotEntitled {
                purchase_url: self.store.links().purchase_url.clone(),
            });
        }

        create_dir(&batch.output_dir)?;

        let mut results = Vec::with_capacity(batch.slides.len());
        for (index, slide) in batch.slides.iter().enumerate() {
            let request = GenerationRequest {
                headline: slide.headline.clone(),
                subheadline: slide.subheadline.clone(),
                source: slide.source.clone(),
                output_path: Some(batch.output_dir.join(batch_file_name(index))),
                device: batch.device.clone(),
                preset: batch.preset.clone(),
                color_a: batch.color_a.clone(),
                color_b: batch.color_b.clone(),
            };
            results.push(self.generate(&request)?);
        }

        tracing::info!("Generated batch of {} screenshots", results.len());
        Ok(results)
    }

    fn resolve_device(
        &self,
        requested: Option<&str>,
        features: &PlanFeatures,
    ) -> Result<&'static DeviceProfile, GenerateError> {
        let id = requested.unwrap_or(DEFAULT_DEVICE);
        if !features.allowed_devices.contains(id) {
            return Err(GenerateError::DeviceNotEntitled {
                device: id.to_string(),
                available: self.store.available_devices().join(", "),
                purchase_url: self.store.links().purchase_url.clone(),
            });
        }
        catalog::find_device(id).ok_or_else(|| GenerateError::UnknownDevice(id.to_string()))
    }

    /// Pick the gradient: an entitled preset wins over explicit colors,
    /// explicit colors need the custom colors feature, otherwise the default.
    pub fn resolve_colors(
        &self,
        preset: Option<&str>,
        color_a: Option<&str>,
        color_b: Option<&str>,
        features: &PlanFeatures,
    ) -> Result<ResolvedColors, GenerateError> {
        if let Some(id) = preset {
            // An id missing from the catalog is not in any plan either
            let preset: &ColorPreset = catalog::find_preset(id)
                .filter(|_| features.allowed_presets.contains(id))
                .ok_or_else(|| GenerateError::PresetNotEntitled {
                    preset: id.to_string(),
                    available: self.store.available_presets().join(", "),
                    purchase_url: self.store.links().purchase_url.clone(),
                })?;
            return Ok(ResolvedColors {
                color_a: preset.color_a.to_string(),
                color_b: preset.color_b.to_string(),
            });
        }

        if (color_a.is_some() || color_b.is_some()) && !features.custom_colors_allowed {
            return Err(GenerateError::CustomColorsNotEntitled {
                available: self.store.available_presets().join(", "),
                purchase_url: self.store.links().purchase_url.clone(),
            });
        }

        Ok(ResolvedColors {
            color_a: color_a.unwrap_or(DEFAULT_COLORS.0).to_string(),
            color_b: color_b.unwrap_or(DEFAULT_COLORS.1).to_string(),
        })
    }
}

/// `screenshot_01.png`, `screenshot_02.png`, ... for zero-based `index`.
pub fn batch_file_name(index: usize) -> String {
    format!("screenshot_{:02}.png", index + 1)
}

fn load_source(source: &SourceImage) -> Result<Vec<u8>, GenerateError> {
    match source {
        SourceImage::Path(path) => {
            std::fs::read(path).map_err(|source| GenerateError::SourceUnreadable {
                path: path.clone(),
                source,
            })
        }
        SourceImage::Bytes(bytes) => Ok(bytes.clone()),
    }
}

fn create_dir(path: &Path) -> Result<(), GenerateError> {
    std::fs::create_dir_all(path).map_err(|source| GenerateError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlements::{Plan, UsageCounter};
    use chrono::Utc;
    use image::{GenericImageView, Rgba, RgbaImage};
    use tempfile::TempDir;

    const KEY: &str = "ABCD-1234-EFGH-5678";

    fn free_store() -> (TempDir, EntitlementStore) {
        let dir = TempDir::new().unwrap();
        let store = EntitlementStore::open(dir.path().join("state")).unwrap();
        (dir, store)
    }

    fn pro_store() -> (TempDir, EntitlementStore) {
        let (dir, store) = free_store();
        store.activate(KEY, None).unwrap();
        assert_eq!(store.plan(), Plan::Pro);
        (dir, store)
    }

    fn used_today(store: &EntitlementStore) -> u32 {
        std::fs::read_to_string(store.usage_path())
            .ok()
            .and_then(|s| serde_json::from_str::<UsageCounter>(&s).ok())
            .map(|c| c.count_on(Utc::now().date_naive()))
            .unwrap_or(0)
    }

    fn seed_usage(store: &EntitlementStore, count: u32) {
        let counter = UsageCounter {
            date: Utc::now().date_naive(),
            count,
        };
        std::fs::write(store.usage_path(), serde_json::to_string(&counter).unwrap()).unwrap();
    }

    fn png_of(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    fn close(actual: [u8; 4], expected: [u8; 3]) -> bool {
        actual[..3]
            .iter()
            .zip(expected)
            .all(|(a, e)| a.abs_diff(e) <= 3)
    }

    #[test]
    fn test_free_generation_saves_file_at_device_size() {
        let (dir, store) = free_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let path = dir.path().join("nested/out/shot.png");

        let result = generator
            .generate(&GenerationRequest {
                headline: "Plan your day".into(),
                subheadline: "in seconds".into(),
                output_path: Some(path.clone()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(result.path(), Some(path.as_path()));
        assert_eq!((result.width, result.height), (1290, 2796));
        assert!(result.watermarked);
        assert_eq!(image::image_dimensions(&path).unwrap(), (1290, 2796));
        assert_eq!(used_today(&store), 1);
        assert!(result.usage_info.contains("0/3"));
    }

    #[test]
    fn test_unwritable_usage_still_generates() {
        let (_dir, store) = free_store();
        std::fs::create_dir_all(store.usage_path()).unwrap();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);

        for _ in 0..4 {
            let result = generator.generate(&GenerationRequest::default()).unwrap();
            assert!(matches!(result.output, GeneratedOutput::Png(_)));
        }
        assert!(store.usage_path().is_dir());
        assert!(store.check_usage().allowed);
    }

    #[test]
    fn test_fourth_free_generation_is_denied() {
        let (_dir, store) = free_store();
        seed_usage(&store, 3);
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);

        let err = generator.generate(&GenerationRequest::default()).unwrap_err();
        assert!(matches!(err, GenerateError::QuotaExceeded(ref m) if m.contains("3/3")));
        assert_eq!(used_today(&store), 3);
    }

    #[test]
    fn test_free_plan_cannot_use_ipad() {
        let (_dir, store) = free_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);

        let err = generator
            .generate(&GenerationRequest {
                device: Some("ipad-pro".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::DeviceNotEntitled { ref device, .. } if device == "ipad-pro"
        ));
        assert!(err.to_string().contains("iphone-15-pro-max"));
        assert_eq!(used_today(&store), 0);
    }

    #[test]
    fn test_unknown_device() {
        let (_dir, store) = pro_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let err = generator
            .generate(&GenerationRequest {
                device: Some("pixel-8".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnknownDevice(ref id) if id == "pixel-8"));
        assert_eq!(used_today(&store), 0);
    }

    #[test]
    fn test_free_plan_unknown_device_is_not_entitled() {
        let (_dir, store) = free_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let err = generator
            .generate(&GenerationRequest {
                device: Some("pixel-8".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::DeviceNotEntitled { ref device, .. } if device == "pixel-8"
        ));
        assert_eq!(used_today(&store), 0);
    }

    #[test]
    fn test_free_preset_and_color_gates() {
        let (_dir, store) = free_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let features = store.features();

        let err = generator
            .resolve_colors(Some("pink"), None, None, &features)
            .unwrap_err();
        assert!(matches!(err, GenerateError::PresetNotEntitled { .. }));

        let err = generator
            .resolve_colors(None, Some("#ff0000"), None, &features)
            .unwrap_err();
        assert!(matches!(err, GenerateError::CustomColorsNotEntitled { .. }));

        let colors = generator
            .resolve_colors(Some("dark"), Some("#ff0000"), Some("#00ff00"), &features)
            .unwrap();
        assert_eq!(colors.color_a, "#232526");
        assert_eq!(colors.color_b, "#414345");

        let colors = generator.resolve_colors(None, None, None, &features).unwrap();
        assert_eq!(colors.color_a, DEFAULT_COLORS.0);
    }

    #[test]
    fn test_pro_custom_colors_and_unknown_preset() {
        let (_dir, store) = pro_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let features = store.features();

        let colors = generator
            .resolve_colors(None, Some("#101010"), None, &features)
            .unwrap();
        assert_eq!(colors.color_a, "#101010");
        assert_eq!(colors.color_b, DEFAULT_COLORS.1);

        let err = generator
            .resolve_colors(Some("teal"), None, None, &features)
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::PresetNotEntitled { ref preset, ref available, .. }
                if preset == "teal" && available.contains("orange")
        ));
    }

    #[test]
    fn test_preset_colors_win_in_rendered_gradient() {
        let (_dir, store) = pro_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);

        let result = generator
            .generate(&GenerationRequest {
                device: Some("iphone-se".into()),
                preset: Some("green".into()),
                color_a: Some("#ff0000".into()),
                color_b: Some("#0000ff".into()),
                ..Default::default()
            })
            .unwrap();

        let GeneratedOutput::Png(bytes) = result.output else {
            panic!("expected inline bytes");
        };
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.dimensions(), (750, 1334));
        assert!(!result.watermarked);
        let top_left = image.get_pixel(0, 0).0;
        assert!(close(top_left, [0x43, 0xe9, 0x7b]), "got {top_left:?}");
        let bottom_right = image.get_pixel(749, 1333).0;
        assert!(close(bottom_right, [0x38, 0xf9, 0xd7]), "got {bottom_right:?}");
    }

    #[test]
    fn test_source_image_fills_screen() {
        let (_dir, store) = pro_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let geometry = layout::compute(750, 1334, false);

        let result = generator
            .generate(&GenerationRequest {
                device: Some("iphone-se".into()),
                source: Some(SourceImage::Bytes(png_of(100, 200, [255, 0, 0, 255]))),
                ..Default::default()
            })
            .unwrap();
        let GeneratedOutput::Png(bytes) = result.output else {
            panic!("expected inline bytes");
        };
        let image = image::load_from_memory(&bytes).unwrap();

        let cx = geometry.screen.x + geometry.screen.width / 2;
        let cy = geometry.screen.y + 40;
        assert!(close(image.get_pixel(cx, cy).0, [255, 0, 0]));
    }

    #[test]
    fn test_missing_source_is_fatal_and_free() {
        let (dir, store) = free_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);

        let err = generator
            .generate(&GenerationRequest {
                source: Some(SourceImage::Path(dir.path().join("missing.png"))),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GenerateError::SourceUnreadable { .. }));
        assert_eq!(used_today(&store), 0);
    }

    #[test]
    fn test_batch_requires_pro() {
        let (dir, store) = free_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let out = dir.path().join("batch");

        let err = generator
            .generate_batch(&BatchRequest {
                slides: vec![BatchSlide::default()],
                output_dir: out.clone(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GenerateError::BatchNotEntitled { .. }));
        assert!(!out.exists());
        assert_eq!(used_today(&store), 0);
    }

    #[test]
    fn test_batch_writes_numbered_files_in_order() {
        let (dir, store) = pro_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let out = dir.path().join("batch");

        let slides = (1..=3)
            .map(|i| BatchSlide {
                headline: format!("Slide {i}"),
                ..Default::default()
            })
            .collect();
        let results = generator
            .generate_batch(&BatchRequest {
                slides,
                output_dir: out.clone(),
                device: Some("iphone-se".into()),
                preset: Some("blue".into()),
                ..Default::default()
            })
            .unwrap();

        let paths: Vec<PathBuf> = results
            .iter()
            .filter_map(|r| r.path().map(Path::to_path_buf))
            .collect();
        assert_eq!(
            paths,
            vec![
                out.join("screenshot_01.png"),
                out.join("screenshot_02.png"),
                out.join("screenshot_03.png"),
            ]
        );
        for path in &paths {
            assert_eq!(image::image_dimensions(path).unwrap(), (750, 1334));
        }
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 3);
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let (dir, store) = pro_store();
        let renderer = Renderer::new();
        let generator = MockupGenerator::new(&store, &renderer);
        let out = dir.path().join("batch");

        let slides = vec![
            BatchSlide::default(),
            BatchSlide {
                source: Some(SourceImage::Path(dir.path().join("nope.png"))),
                ..Default::default()
            },
            BatchSlide::default(),
        ];
        let err = generator
            .generate_batch(&BatchRequest {
                slides,
                output_dir: out.clone(),
                device: Some("iphone-se".into()),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(err, GenerateError::SourceUnreadable { .. }));
        assert!(out.join("screenshot_01.png").exists());
        assert!(!out.join("screenshot_02.png").exists());
        assert!(!out.join("screenshot_03.png").exists());
    }

    #[test]
    fn test_batch_file_names_pad_to_two_digits() {
        assert_eq!(batch_file_name(0), "screenshot_01.png");
        assert_eq!(batch_file_name(9), "screenshot_10.png");
        assert_eq!(batch_file_name(99), "screenshot_100.png");
    }
}
