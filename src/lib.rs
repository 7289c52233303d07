//! storeshot - App Store screenshot mockups behind a local subscription gate
//!
//! This library renders marketing screenshots: a gradient background, headline
//! text and a device frame with the app screenshot on its screen. What a user
//! may render (devices, presets, custom colors, batches, watermark-free
//! output, daily volume) depends on a subscription record stored on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storeshot::entitlements::EntitlementStore;
//! use storeshot::mockup::{GenerationRequest, MockupGenerator, Renderer};
//!
//! let store = EntitlementStore::open("/tmp/storeshot").unwrap();
//! let renderer = Renderer::new();
//! let generator = MockupGenerator::new(&store, &renderer);
//!
//! let result = generator
//!     .generate(&GenerationRequest {
//!         headline: "Plan your day".into(),
//!         output_path: Some("shot.png".into()),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! println!("{}x{}", result.width, result.height);
//! ```

pub mod catalog;
pub mod cli;
pub mod entitlements;
pub mod mockup;
pub mod tools;

// Re-exports for convenience
pub use catalog::{ColorPreset, DeviceProfile, DEVICES, PRESETS};
pub use entitlements::{
    EntitlementError, EntitlementStore, LicenseVerifier, OfflineVerifier, Plan, PlanFeatures,
    Verification,
};
pub use mockup::{
    GenerateError, GenerationRequest, GenerationResult, MockupGenerator, RenderError, Renderer,
};
pub use tools::{ToolError, ToolRequest, ToolResponse, ToolServer};
