//! Device mockup rendering: geometry, SVG scene, rasterization and the
//! entitlement-aware generator on top of them.

pub mod generator;
pub mod layout;
pub mod render;
pub mod scene;

pub use generator::{
    BatchRequest, BatchSlide, GenerateError, GeneratedOutput, GenerationRequest,
    GenerationResult, MockupGenerator, ResolvedColors, SourceImage,
};
pub use layout::MockupLayout;
pub use render::{RenderError, Renderer};
