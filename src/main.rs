use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use sharemark::{
    ArtifactEvent, ArtifactFormat, ArtifactMode, ComposeOutcome, ComposerConfig,
    CompositeRequest, Viewport, WatermarkComposer,
};

/// Compose a shareable watermarked card from a photo and caption.
#[derive(Parser, Debug)]
#[command(name = "sharemark", version, about)]
struct Args {
    /// Source photo: path, file://, data:, or http(s):// URI
    #[arg(long, conflicts_with = "request")]
    source: Option<String>,

    /// Bold caption text
    #[arg(long, default_value = "")]
    caption: String,

    /// Plain category label shown before the caption
    #[arg(long, default_value = "Photo")]
    label: String,

    /// Load the whole request from a JSON file instead of flags
    #[arg(long)]
    request: Option<PathBuf>,

    /// Logical viewport width the composite is sized against
    #[arg(long, default_value_t = 390)]
    viewport_width: u32,

    /// JPEG quality (ignored with --png)
    #[arg(long, default_value_t = 100)]
    quality: u8,

    /// Encode a lossless PNG instead of JPEG
    #[arg(long)]
    png: bool,

    /// Directory the artifact is written into
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let request = match (&args.request, &args.source) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading request file {}", path.display()))?;
            serde_json::from_str::<CompositeRequest>(&json)
                .with_context(|| format!("parsing request file {}", path.display()))?
        }
        (None, Some(source)) => {
            CompositeRequest::new(source.clone(), args.caption.clone(), args.label.clone())
        }
        (None, None) => bail!("either --source or --request is required"),
    };

    let format = if args.png {
        ArtifactFormat::Png
    } else {
        ArtifactFormat::Jpeg {
            quality: args.quality,
        }
    };
    let config = ComposerConfig {
        viewport: Viewport {
            width: args.viewport_width,
            ..Default::default()
        },
        format,
        mode: ArtifactMode::File(args.out.clone()),
        ..Default::default()
    };

    let mut composer = WatermarkComposer::new(config)?;
    composer.on_artifact(|event| match event {
        ArtifactEvent::Invalidated => {}
        ArtifactEvent::Ready(uri) => println!("{}", uri),
        ArtifactEvent::Failed(reason) => eprintln!("compose failed: {}", reason),
    });
    composer.set_request(request);

    match composer.compose()? {
        ComposeOutcome::Captured(artifact) => {
            eprintln!(
                "rendered {}x{} {} ({} bytes)",
                artifact.width,
                artifact.height,
                artifact.mime,
                artifact.data.len()
            );
            Ok(())
        }
        ComposeOutcome::Skipped => bail!("nothing to compose: request is disabled or has no source"),
    }
}
