//! Source photo resolution
//!
//! Turns a source reference (bare path, `file://`, `data:`, or `http(s)://`
//! URI) into raw image bytes and probes the photo's natural dimensions from
//! the header without decoding the full image. Remote fetching requires the
//! default-on `remote` feature.

use std::io::Cursor;

use base64::Engine as _;

use crate::{ComposerConfig, Error, Result};

/// Fetch the raw bytes of a source photo.
pub fn fetch_bytes(source: &str, config: &ComposerConfig) -> Result<Vec<u8>> {
    if source.is_empty() {
        return Err(Error::SourceError("empty source reference".into()));
    }

    if let Some(rest) = source.strip_prefix("data:") {
        return decode_data_uri(rest);
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        return fetch_remote(source, config);
    }

    let path = source.strip_prefix("file://").unwrap_or(source);
    std::fs::read(path).map_err(|e| Error::SourceError(format!("read {}: {}", path, e)))
}

/// Probe the natural pixel dimensions from the image header.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::SourceError(format!("unrecognized image data: {}", e)))?;
    let (w, h) = reader
        .into_dimensions()
        .map_err(|e| Error::SourceError(format!("failed to read image header: {}", e)))?;
    if w == 0 || h == 0 {
        return Err(Error::SourceError(format!(
            "source photo has degenerate dimensions {}x{}",
            w, h
        )));
    }
    Ok((w, h))
}

/// Fully decode the source photo for compositing.
pub fn decode(bytes: &[u8]) -> Result<image::DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::SourceError(format!("decode failed: {}", e)))
}

fn decode_data_uri(rest: &str) -> Result<Vec<u8>> {
    // data:[mediatype][;base64],<payload>
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::SourceError("malformed data URI: missing comma".into()))?;
    if !meta.ends_with(";base64") {
        return Err(Error::SourceError(
            "unsupported data URI: only base64 payloads are accepted".into(),
        ));
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::SourceError(format!("invalid base64 payload: {}", e)))
}

#[cfg(feature = "remote")]
fn fetch_remote(source: &str, config: &ComposerConfig) -> Result<Vec<u8>> {
    use std::time::Duration;

    // Reject anything the URL parser cannot make sense of before dialing out
    let parsed = url::Url::parse(source)
        .map_err(|e| Error::SourceError(format!("invalid source URL {}: {}", source, e)))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(config.fetch_timeout_ms))
        .build()
        .map_err(|e| Error::SourceError(format!("failed to build HTTP client: {}", e)))?;

    let res = client
        .get(parsed)
        .header("User-Agent", config.user_agent.clone())
        .send()
        .map_err(|e| Error::SourceError(format!("HTTP GET failed: {}", e)))?;

    if !res.status().is_success() {
        return Err(Error::SourceError(format!(
            "HTTP GET {} returned {}",
            source,
            res.status()
        )));
    }

    let body = res
        .bytes()
        .map_err(|e| Error::SourceError(format!("failed to read response body: {}", e)))?;
    Ok(body.to_vec())
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(source: &str, _config: &ComposerConfig) -> Result<Vec<u8>> {
    Err(Error::SourceError(format!(
        "remote source {} requires the `remote` feature",
        source
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_fixture(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn probe_reads_header_dimensions() {
        let bytes = png_fixture(64, 48);
        assert_eq!(probe_dimensions(&bytes).unwrap(), (64, 48));
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!(probe_dimensions(b"not an image").is_err());
    }

    #[test]
    fn data_uri_round_trip() {
        let bytes = png_fixture(8, 8);
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );
        let fetched = fetch_bytes(&uri, &ComposerConfig::default()).unwrap();
        assert_eq!(fetched, bytes);
    }

    #[test]
    fn data_uri_without_base64_marker_is_rejected() {
        let res = fetch_bytes("data:text/plain,hello", &ComposerConfig::default());
        assert!(res.is_err());
    }

    #[test]
    fn empty_source_is_an_error() {
        assert!(fetch_bytes("", &ComposerConfig::default()).is_err());
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let res = fetch_bytes("/does/not/exist.png", &ComposerConfig::default());
        match res {
            Err(Error::SourceError(_)) => {}
            other => panic!("expected SourceError, got {:?}", other),
        }
    }
}
