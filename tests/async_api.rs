//! Round trip through the worker-thread async handle.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use base64::Engine as _;

use sharemark::{
    ArtifactEvent, ComposeOutcome, ComposerConfig, ComposerHandle, ComposerState,
    CompositeRequest,
};

fn png_data_uri(w: u32, h: u32) -> String {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([120, 60, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(out.into_inner())
    )
}

#[tokio::test]
async fn handle_composes_and_reports_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handle = ComposerHandle::new(ComposerConfig::default(), move |e: &ArtifactEvent| {
        sink.lock().unwrap().push(e.clone());
    })
    .await
    .expect("failed to start composer worker");

    handle
        .set_request(CompositeRequest::new(png_data_uri(48, 48), "Async", "Photo"))
        .await
        .unwrap();

    let outcome = handle.compose().await.expect("compose failed");
    assert!(matches!(outcome, ComposeOutcome::Captured(_)));
    assert_eq!(handle.state().await.unwrap(), ComposerState::Captured);

    let events = events.lock().unwrap();
    assert_eq!(events[0], ArtifactEvent::Invalidated);
    assert!(matches!(events[1], ArtifactEvent::Ready(_)));
}

#[tokio::test]
async fn closed_handle_errors_on_use() {
    let handle = ComposerHandle::new(ComposerConfig::default(), |_e: &ArtifactEvent| {})
        .await
        .expect("failed to start composer worker");
    handle.close().await.unwrap();

    // Worker loop has exited; any clone sees the channel as gone
    let res = handle
        .set_request(CompositeRequest::new("a.png", "c", "l"))
        .await;
    assert!(res.is_err());
}
