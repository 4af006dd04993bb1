//! Sharemark Watermark Compositor
//!
//! An off-screen compositor that turns a source photo and caption text into a
//! shareable branded image: the photo is sized against a device viewport,
//! clamped to a bounded aspect-ratio envelope, framed with a caption line and
//! a "Powered By" footer, and rasterized into a single artifact.
//!
//! # Features
//!
//! - **Explicit state machine**: `Empty → Sizing → Sized → Capturing →
//!   Captured | Failed`, with generation-guarded completions so stale results
//!   are discarded instead of applied
//! - **Tagged artifact events**: callers observe `Invalidated`, `Ready(uri)`
//!   and `Failed(reason)` rather than sentinel strings
//! - **Deterministic rendering**: the composite is laid out and rasterized in
//!   process, with no window or GPU required
//!
//! # Example
//!
//! ```no_run
//! use sharemark::{ComposerConfig, CompositeRequest, WatermarkComposer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut composer = WatermarkComposer::new(ComposerConfig::default())?;
//! composer.on_artifact(|event| println!("artifact: {:?}", event));
//!
//! composer.set_request(CompositeRequest::new(
//!     "photos/sunset.jpg",
//!     "Golden hour at the pier",
//!     "Photo",
//! ));
//! composer.compose()?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod source;

pub mod composer;
pub use composer::{ComposeOutcome, ComposerState, WatermarkComposer};

pub mod rendering;
pub use rendering::Artifact;

// Async-friendly facade (worker-thread handle)
pub mod async_api;
pub use async_api::ComposerHandle;

/// Widest composite the layout tolerates before the photo is letterboxed
pub const MAX_ASPECT_RATIO: f32 = 1.33;
/// Tallest composite the layout tolerates
pub const MIN_ASPECT_RATIO: f32 = 0.75;

/// Configuration for the watermark compositor
///
/// The defaults are chosen to match a phone-sized share card: a portrait
/// viewport and maximum-quality JPEG output delivered as a `data:` URI.
///
/// # Examples
///
/// ```
/// let cfg = sharemark::ComposerConfig::default();
/// assert_eq!(cfg.viewport.width, 390);
/// ```
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Logical viewport the composite is sized against
    pub viewport: Viewport,
    /// Encoding of the rendered artifact
    pub format: ArtifactFormat,
    /// How the artifact is handed back to the caller
    pub mode: ArtifactMode,
    /// Timeout for remote source fetches in milliseconds
    pub fetch_timeout_ms: u64,
    /// User agent sent with remote source fetches
    pub user_agent: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            format: ArtifactFormat::default(),
            mode: ArtifactMode::DataUri,
            fetch_timeout_ms: 30000,
            user_agent: "Sharemark/0.1".to_string(),
        }
    }
}

/// Viewport dimensions in logical pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        // Common phone portrait metrics
        Self {
            width: 390,
            height: 844,
        }
    }
}

/// Encoding of the rendered artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// JPEG with quality 0..=100
    Jpeg { quality: u8 },
    /// Lossless PNG
    Png,
}

impl Default for ArtifactFormat {
    fn default() -> Self {
        ArtifactFormat::Jpeg { quality: 100 }
    }
}

impl ArtifactFormat {
    /// MIME type of the encoded bytes
    pub fn mime(&self) -> &'static str {
        match self {
            ArtifactFormat::Jpeg { .. } => "image/jpeg",
            ArtifactFormat::Png => "image/png",
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Jpeg { .. } => "jpg",
            ArtifactFormat::Png => "png",
        }
    }
}

/// How a finished artifact is delivered through the event callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactMode {
    /// Embed the encoded bytes in a self-contained `data:` URI
    DataUri,
    /// Write a content-addressed file into the directory and report a
    /// `file://` URI
    File(PathBuf),
}

/// A compose request, owned by the caller and immutable per pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeRequest {
    /// Source photo reference: a path, `file://`, `data:`, or `http(s)://` URI
    pub source: String,
    /// Bold highlighted text in the caption line
    pub caption: String,
    /// Plain prefix text in the caption line
    pub category_label: String,
    /// Gates whether any composite work happens at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CompositeRequest {
    pub fn new(
        source: impl Into<String>,
        caption: impl Into<String>,
        category_label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            caption: caption.into(),
            category_label: category_label.into(),
            enabled: true,
        }
    }
}

/// Display metrics derived from a source photo's natural dimensions
///
/// `width` and `height` are the unclamped display dimensions; `aspect_ratio`
/// is the width/height ratio after clamping to
/// [`MIN_ASPECT_RATIO`]..=[`MAX_ASPECT_RATIO`]. The rendered photo uses
/// `width` and the clamped ratio, so extreme panoramas and portraits cannot
/// distort the composite layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageMetrics {
    pub width: f32,
    pub height: f32,
    pub aspect_ratio: f32,
}

impl ImageMetrics {
    /// Derive metrics from the photo's natural pixel dimensions and the
    /// viewport width.
    ///
    /// The photo is scaled to fill the viewport width and the resulting
    /// aspect ratio is clamped to the layout envelope.
    pub fn resolve(natural_width: u32, natural_height: u32, viewport_width: u32) -> Result<Self> {
        if viewport_width == 0 {
            return Err(Error::ConfigError("viewport width is zero".into()));
        }
        if natural_width == 0 || natural_height == 0 {
            return Err(Error::SourceError(format!(
                "source photo has degenerate dimensions {}x{}",
                natural_width, natural_height
            )));
        }

        let scale_factor = natural_width as f32 / viewport_width as f32;
        let width = viewport_width as f32;
        let height = natural_height as f32 / scale_factor;
        let raw = width / height;
        let aspect_ratio = raw.clamp(MIN_ASPECT_RATIO, MAX_ASPECT_RATIO);

        Ok(Self {
            width,
            height,
            aspect_ratio,
        })
    }

    /// Height of the photo as rendered, after clamping
    pub fn display_height(&self) -> f32 {
        self.width / self.aspect_ratio
    }
}

/// Artifact lifecycle events delivered to the registered callback
///
/// A successful capture emits `Invalidated` (the previous artifact is stale)
/// followed by `Ready`. A failed capture emits `Invalidated` followed by
/// `Failed`, so callers can distinguish "still working" from "broke".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactEvent {
    /// Any previously delivered artifact must no longer be used
    Invalidated,
    /// A new artifact is available at the given URI
    Ready(String),
    /// The capture failed; no artifact will be delivered for this pass
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComposerConfig::default();
        assert_eq!(config.viewport.width, 390);
        assert_eq!(config.viewport.height, 844);
        assert_eq!(config.format, ArtifactFormat::Jpeg { quality: 100 });
        assert_eq!(config.mode, ArtifactMode::DataUri);
    }

    #[test]
    fn metrics_wide_panorama_clamps_high() {
        // 2000x1000 against a 500-wide viewport: scale 4, display 500x250
        let m = ImageMetrics::resolve(2000, 1000, 500).unwrap();
        assert_eq!(m.width, 500.0);
        assert_eq!(m.height, 250.0);
        assert_eq!(m.aspect_ratio, MAX_ASPECT_RATIO);
    }

    #[test]
    fn metrics_tall_portrait_clamps_low() {
        let m = ImageMetrics::resolve(500, 1500, 500).unwrap();
        assert!((500.0 / m.height - 1.0 / 3.0).abs() < 1e-4);
        assert_eq!(m.aspect_ratio, MIN_ASPECT_RATIO);
    }

    #[test]
    fn metrics_square_passes_through() {
        let m = ImageMetrics::resolve(800, 800, 400).unwrap();
        assert_eq!(m.width, 400.0);
        assert_eq!(m.height, 400.0);
        assert_eq!(m.aspect_ratio, 1.0);
    }

    #[test]
    fn metrics_always_within_envelope() {
        for (nw, nh) in [
            (1, 10000),
            (10000, 1),
            (640, 480),
            (480, 640),
            (3000, 2000),
            (333, 777),
        ] {
            let m = ImageMetrics::resolve(nw, nh, 390).unwrap();
            assert!(
                (MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&m.aspect_ratio),
                "{}x{} escaped the envelope: {}",
                nw,
                nh,
                m.aspect_ratio
            );
        }
    }

    #[test]
    fn metrics_rejects_degenerate_inputs() {
        assert!(ImageMetrics::resolve(0, 100, 390).is_err());
        assert!(ImageMetrics::resolve(100, 0, 390).is_err());
        assert!(ImageMetrics::resolve(100, 100, 0).is_err());
    }

    #[test]
    fn request_json_round_trip() {
        let req = CompositeRequest::new("a.jpg", "caption", "Photo");
        let json = serde_json::to_string(&req).unwrap();
        let back: CompositeRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }

    #[test]
    fn request_enabled_defaults_to_true() {
        let req: CompositeRequest =
            serde_json::from_str(r#"{"source":"a.jpg","caption":"c","category_label":"l"}"#)
                .unwrap();
        assert!(req.enabled);
    }
}
