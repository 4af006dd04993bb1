//! Rasterizer: executes a display list into pixels and encodes the artifact

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

use crate::rendering::paint::PaintCommand;
use crate::rendering::{font, Artifact};
use crate::{ArtifactFormat, Error, Result};

/// Rasterize a display list onto a fresh canvas and encode it.
///
/// `photo` is the fully decoded source image; it is resized to the rect of
/// the `Photo` command with a triangle filter and composited with rounded
/// corners.
pub fn rasterize(
    canvas_width: u32,
    canvas_height: u32,
    photo: &DynamicImage,
    commands: &[PaintCommand],
    format: ArtifactFormat,
) -> Result<Artifact> {
    if canvas_width == 0 || canvas_height == 0 {
        return Err(Error::RenderError(format!(
            "degenerate canvas {}x{}",
            canvas_width, canvas_height
        )));
    }

    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([0, 0, 0, 0]));

    for command in commands {
        match command {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => {
                fill_rect(&mut canvas, *x, *y, *width, *height, *rgba);
            }
            PaintCommand::Photo {
                x,
                y,
                width,
                height,
                corner_radius,
            } => {
                blit_photo(&mut canvas, photo, *x, *y, *width, *height, *corner_radius);
            }
            PaintCommand::Text {
                x,
                y,
                text,
                scale,
                bold,
                italic,
                rgba,
            } => {
                font::draw(&mut canvas, *x, *y, text, *scale, *bold, *italic, *rgba);
            }
        }
    }

    let data = encode(canvas, format)?;
    Ok(Artifact {
        width: canvas_width,
        height: canvas_height,
        data,
        mime: format.mime(),
    })
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, rgba: (u8, u8, u8, u8)) {
    let color = Rgba([rgba.0, rgba.1, rgba.2, rgba.3]);
    for py in y.max(0)..(y + height as i32).min(canvas.height() as i32) {
        for px in x.max(0)..(x + width as i32).min(canvas.width() as i32) {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

fn blit_photo(
    canvas: &mut RgbaImage,
    photo: &DynamicImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    corner_radius: u32,
) {
    if width == 0 || height == 0 {
        return;
    }
    let resized = image::imageops::resize(&photo.to_rgba8(), width, height, FilterType::Triangle);
    for sy in 0..height {
        for sx in 0..width {
            if !inside_rounded_rect(sx, sy, width, height, corner_radius) {
                continue;
            }
            let (px, py) = (x + sx as i32, y + sy as i32);
            if px < 0 || py < 0 || px as u32 >= canvas.width() || py as u32 >= canvas.height() {
                continue;
            }
            canvas.put_pixel(px as u32, py as u32, *resized.get_pixel(sx, sy));
        }
    }
}

/// Rounded-rect hit test against the corner circles of radius `r`
fn inside_rounded_rect(x: u32, y: u32, width: u32, height: u32, r: u32) -> bool {
    if r == 0 {
        return true;
    }
    let r = r.min(width / 2).min(height / 2);
    let (cx, cy) = (
        if x < r {
            Some(r - 1)
        } else if x >= width - r {
            Some(width - r)
        } else {
            None
        },
        if y < r {
            Some(r - 1)
        } else if y >= height - r {
            Some(height - r)
        } else {
            None
        },
    );
    match (cx, cy) {
        (Some(cx), Some(cy)) => {
            let dx = cx as i64 - x as i64;
            let dy = cy as i64 - y as i64;
            dx * dx + dy * dy <= (r as i64) * (r as i64)
        }
        _ => true,
    }
}

fn encode(canvas: RgbaImage, format: ArtifactFormat) -> Result<Vec<u8>> {
    let (w, h) = (canvas.width(), canvas.height());
    let mut out = Vec::new();
    match format {
        ArtifactFormat::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut out), quality)
                .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                .map_err(|e| Error::RenderError(format!("JPEG encode failed: {}", e)))?;
        }
        ArtifactFormat::Png => {
            PngEncoder::new(Cursor::new(&mut out))
                .write_image(canvas.as_raw(), w, h, ExtendedColorType::Rgba8)
                .map_err(|e| Error::RenderError(format!("PNG encode failed: {}", e)))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::layout_composite;
    use crate::rendering::paint::display_list;
    use crate::{CompositeRequest, ImageMetrics};

    fn test_photo(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255])))
    }

    fn compose_commands() -> (u32, u32, Vec<PaintCommand>) {
        let metrics = ImageMetrics::resolve(400, 400, 200).unwrap();
        let req = CompositeRequest::new("a.jpg", "Sunset", "Photo");
        let layout = layout_composite(&metrics, &req);
        let cmds = display_list(&layout);
        (layout.canvas.width, layout.canvas.height, cmds)
    }

    #[test]
    fn rasterize_produces_jpeg_bytes() {
        let (w, h, cmds) = compose_commands();
        let artifact = rasterize(
            w,
            h,
            &test_photo(400, 400),
            &cmds,
            ArtifactFormat::Jpeg { quality: 90 },
        )
        .unwrap();
        assert_eq!(artifact.width, w);
        assert_eq!(artifact.height, h);
        assert_eq!(artifact.mime, "image/jpeg");
        // JPEG SOI marker
        assert_eq!(&artifact.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn rasterize_produces_png_bytes() {
        let (w, h, cmds) = compose_commands();
        let artifact = rasterize(w, h, &test_photo(400, 400), &cmds, ArtifactFormat::Png).unwrap();
        assert_eq!(&artifact.data[1..4], b"PNG");
        // Decodes back to the same dimensions
        let decoded = image::load_from_memory(&artifact.data).unwrap();
        assert_eq!(decoded.width(), w);
        assert_eq!(decoded.height(), h);
    }

    #[test]
    fn photo_corners_stay_background_white() {
        let (w, h, cmds) = compose_commands();
        let artifact = rasterize(w, h, &test_photo(400, 400), &cmds, ArtifactFormat::Png).unwrap();
        let decoded = image::load_from_memory(&artifact.data).unwrap().to_rgba8();
        // The photo rect starts at (6, 6); its very corner pixel is masked out
        assert_eq!(decoded.get_pixel(6, 6).0, [255, 255, 255, 255]);
        // While the photo center is the photo color
        assert_eq!(decoded.get_pixel(w / 2, 40).0[0], 200);
    }

    #[test]
    fn rounded_rect_mask_geometry() {
        // Center and edge midpoints are inside
        assert!(inside_rounded_rect(10, 10, 20, 20, 4));
        assert!(inside_rounded_rect(10, 0, 20, 20, 4));
        // Extreme corners are outside
        assert!(!inside_rounded_rect(0, 0, 20, 20, 4));
        assert!(!inside_rounded_rect(19, 19, 20, 20, 4));
        // Radius zero disables masking
        assert!(inside_rounded_rect(0, 0, 20, 20, 0));
    }

    #[test]
    fn degenerate_canvas_is_rejected() {
        assert!(rasterize(
            0,
            10,
            &test_photo(4, 4),
            &[],
            ArtifactFormat::Png
        )
        .is_err());
    }
}
