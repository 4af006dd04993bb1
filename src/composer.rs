//! The watermark composer: state machine, capture orchestration, delivery
//!
//! `WatermarkComposer` owns the compose lifecycle for one request at a time:
//!
//! ```text
//! Empty -> Sizing -> Sized -> Capturing -> Captured
//!             \________\_________\______-> Failed
//! ```
//!
//! Every async-shaped completion (`apply_metrics`, `photo_loaded`) carries
//! the generation token handed out by `begin_sizing`; `set_request` bumps
//! the generation so completions for a superseded source are rejected
//! instead of applied.

use std::fs;
use std::sync::Arc;

use base64::Engine as _;
use image::DynamicImage;
use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::rendering::{layout, paint, raster, Artifact};
use crate::{
    source, ArtifactEvent, ArtifactMode, ComposerConfig, CompositeRequest, Error, ImageMetrics,
    Result,
};

type ArtifactHandler = Arc<dyn Fn(&ArtifactEvent) + Send + Sync>;

/// Lifecycle state of the current compose pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    /// No request, or the request was gated out / just replaced
    Empty,
    /// Natural-dimension query in progress
    Sizing,
    /// Metrics resolved; waiting for the photo to load
    Sized,
    /// Rasterizing the composite
    Capturing,
    /// An artifact was delivered for the current generation
    Captured,
    /// The current generation failed; see the emitted `Failed` event
    Failed,
}

/// Result of a full compose pass
#[derive(Debug)]
pub enum ComposeOutcome {
    /// Gating kept the composer idle: disabled request or empty source
    Skipped,
    /// A new artifact was rendered and delivered
    Captured(Artifact),
}

/// Renders an off-screen composite of a photo, caption, and branding footer,
/// and delivers the rasterized artifact through the registered callback.
pub struct WatermarkComposer {
    config: ComposerConfig,
    request: Option<CompositeRequest>,
    state: ComposerState,
    metrics: Option<ImageMetrics>,
    generation: u64,
    on_artifact: Option<ArtifactHandler>,
}

impl WatermarkComposer {
    pub fn new(config: ComposerConfig) -> Result<Self> {
        if config.viewport.width == 0 {
            return Err(Error::ConfigError("viewport width must be non-zero".into()));
        }
        Ok(Self {
            config,
            request: None,
            state: ComposerState::Empty,
            metrics: None,
            generation: 0,
            on_artifact: None,
        })
    }

    /// Register the artifact event callback.
    pub fn on_artifact<F>(&mut self, cb: F)
    where
        F: Fn(&ArtifactEvent) + Send + Sync + 'static,
    {
        self.on_artifact = Some(Arc::new(cb));
    }

    /// Remove a previously registered callback if any.
    pub fn clear_on_artifact(&mut self) {
        self.on_artifact = None;
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    pub fn metrics(&self) -> Option<ImageMetrics> {
        self.metrics
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the current request. Bumps the generation so in-flight
    /// completions for the previous source are discarded, and resets the
    /// state machine.
    pub fn set_request(&mut self, request: CompositeRequest) {
        self.generation += 1;
        self.state = ComposerState::Empty;
        self.metrics = None;
        debug!(
            "request replaced (generation {}): source={}",
            self.generation, request.source
        );
        self.request = Some(request);
    }

    /// Run the full pipeline: gate, resolve size, load the photo, capture.
    ///
    /// Returns `ComposeOutcome::Skipped` without doing any work when the
    /// request is disabled or has no source. Failures transition to
    /// `Failed`, emit a `Failed` event, and propagate the typed error.
    pub fn compose(&mut self) -> Result<ComposeOutcome> {
        let request = match &self.request {
            Some(r) => r.clone(),
            None => return Ok(ComposeOutcome::Skipped),
        };
        if !request.enabled || request.source.is_empty() {
            debug!("compose gated out (enabled={})", request.enabled);
            return Ok(ComposeOutcome::Skipped);
        }

        let token = self.begin_sizing()?;

        let bytes = match source::fetch_bytes(&request.source, &self.config) {
            Ok(b) => b,
            Err(e) => return Err(self.fail(e)),
        };
        let (natural_w, natural_h) = match source::probe_dimensions(&bytes) {
            Ok(dims) => dims,
            Err(e) => return Err(self.fail(e)),
        };
        self.apply_metrics(token, natural_w, natural_h)?;

        // Decoding completes the "photo loaded" step and triggers capture
        let photo = match source::decode(&bytes) {
            Ok(p) => p,
            Err(e) => return Err(self.fail(e)),
        };
        let artifact = self.photo_loaded(token, &photo)?;
        Ok(ComposeOutcome::Captured(artifact))
    }

    /// Start a size-resolution pass and hand out its generation token.
    pub fn begin_sizing(&mut self) -> Result<u64> {
        if self.request.is_none() {
            return Err(Error::ConfigError("no composite request set".into()));
        }
        self.state = ComposerState::Sizing;
        Ok(self.generation)
    }

    /// Apply a resolved natural size for the given generation.
    ///
    /// Stale tokens are rejected with `Error::StaleGeneration` and leave all
    /// state untouched.
    pub fn apply_metrics(&mut self, token: u64, natural_w: u32, natural_h: u32) -> Result<()> {
        self.check_generation(token)?;
        match ImageMetrics::resolve(natural_w, natural_h, self.config.viewport.width) {
            Ok(m) => {
                debug!(
                    "metrics resolved: {}x{} ratio {}",
                    m.width, m.height, m.aspect_ratio
                );
                self.metrics = Some(m);
                self.state = ComposerState::Sized;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Photo load completion: captures the composite exactly once.
    ///
    /// Emits `Invalidated` before rasterization starts, then `Ready(uri)` on
    /// success or `Failed(reason)` on error.
    pub fn photo_loaded(&mut self, token: u64, photo: &DynamicImage) -> Result<Artifact> {
        self.check_generation(token)?;
        if self.state != ComposerState::Sized {
            return Err(Error::RenderError(format!(
                "capture requires resolved metrics, state is {:?}",
                self.state
            )));
        }
        let request = match &self.request {
            Some(r) => r.clone(),
            None => return Err(Error::ConfigError("no composite request set".into())),
        };
        let metrics = match self.metrics {
            Some(m) => m,
            None => return Err(Error::RenderError("metrics lost before capture".into())),
        };

        self.state = ComposerState::Capturing;
        self.emit(&ArtifactEvent::Invalidated);

        let composite_layout = layout::layout_composite(&metrics, &request);
        let commands = paint::display_list(&composite_layout);
        let artifact = match raster::rasterize(
            composite_layout.canvas.width,
            composite_layout.canvas.height,
            photo,
            &commands,
            self.config.format,
        ) {
            Ok(a) => a,
            Err(e) => return Err(self.fail(e)),
        };

        let uri = match self.deliver(&artifact) {
            Ok(uri) => uri,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = ComposerState::Captured;
        self.emit(&ArtifactEvent::Ready(uri));
        Ok(artifact)
    }

    fn deliver(&self, artifact: &Artifact) -> Result<String> {
        match &self.config.mode {
            ArtifactMode::DataUri => Ok(format!(
                "data:{};base64,{}",
                artifact.mime,
                base64::engine::general_purpose::STANDARD.encode(&artifact.data)
            )),
            ArtifactMode::File(dir) => {
                let digest = hex::encode(Sha256::digest(&artifact.data));
                let name = format!("{}.{}", &digest[..16], self.config.format.extension());
                let path = dir.join(name);
                fs::write(&path, &artifact.data)?;
                Ok(format!("file://{}", path.display()))
            }
        }
    }

    fn check_generation(&self, token: u64) -> Result<()> {
        if token != self.generation {
            warn!(
                "discarding completion for generation {} (current {})",
                token, self.generation
            );
            return Err(Error::StaleGeneration {
                got: token,
                current: self.generation,
            });
        }
        Ok(())
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = ComposerState::Failed;
        self.emit(&ArtifactEvent::Failed(err.to_string()));
        err
    }

    fn emit(&self, event: &ArtifactEvent) {
        if let Some(cb) = &self.on_artifact {
            cb(event);
        }
    }
}
