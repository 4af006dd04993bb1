//! Layout primitives for the share-card composite

use crate::rendering::font;
use crate::{CompositeRequest, ImageMetrics};

/// Horizontal and top padding between the card edge and the photo
pub const FRAME_PADDING: u32 = 6;
/// Uniform padding inside the caption block
pub const CAPTION_PADDING: u32 = 12;
/// Vertical gap between the caption line and the footer line
pub const LINE_GAP: u32 = 6;
/// Corner radius applied to the photo
pub const PHOTO_RADIUS: u32 = 4;

/// Glyph scale of the caption line
pub const CAPTION_SCALE: u32 = 2;
/// Glyph scale of the footer line
pub const FOOTER_SCALE: u32 = 1;

pub const COLOR_WHITE: (u8, u8, u8, u8) = (255, 255, 255, 255);
pub const COLOR_BLACK: (u8, u8, u8, u8) = (0, 0, 0, 255);
pub const COLOR_GRAY: (u8, u8, u8, u8) = (128, 128, 128, 255);

/// Branding footer, always rendered below the caption
pub const BRAND_PREFIX: &str = "Powered By ";
pub const BRAND_NAME: &str = "DrivnBye";

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// A positioned piece of styled text
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub scale: u32,
    pub bold: bool,
    pub italic: bool,
    pub rgba: (u8, u8, u8, u8),
}

/// The fully positioned composite: card, photo, caption block, text runs
#[derive(Debug, Clone)]
pub struct CompositeLayout {
    /// Full canvas, origin at (0, 0)
    pub canvas: Rect,
    pub photo: Rect,
    pub caption_block: Rect,
    pub runs: Vec<TextRun>,
}

/// Position the composite for the given display metrics and caption text.
///
/// The card stacks vertically: padded photo on top, white caption block
/// below with its two centered lines. Text runs wider than the block keep
/// their centering and are clipped at raster time.
pub fn layout_composite(metrics: &ImageMetrics, request: &CompositeRequest) -> CompositeLayout {
    let photo_w = metrics.width.round() as u32;
    let photo_h = metrics.display_height().round().max(1.0) as u32;

    let photo = Rect {
        x: FRAME_PADDING as i32,
        y: FRAME_PADDING as i32,
        width: photo_w,
        height: photo_h,
    };

    let caption_h = font::line_height(CAPTION_SCALE);
    let footer_h = font::line_height(FOOTER_SCALE);
    let block_h = CAPTION_PADDING * 2 + caption_h + LINE_GAP + footer_h;

    let caption_block = Rect {
        x: FRAME_PADDING as i32,
        y: photo.bottom(),
        width: photo_w,
        height: block_h,
    };

    let canvas = Rect {
        x: 0,
        y: 0,
        width: photo_w + FRAME_PADDING * 2,
        height: FRAME_PADDING + photo_h + block_h,
    };

    let mut runs = Vec::new();

    // Caption line: "{label} | " plain, caption bold, centered as one unit
    let prefix = format!("{} | ", request.category_label);
    let prefix_w = font::measure(&prefix, CAPTION_SCALE);
    let caption_w = font::measure(&request.caption, CAPTION_SCALE);
    let line_w = prefix_w + caption_w;
    let line_x = caption_block.x + (caption_block.width as i32 - line_w as i32) / 2;
    let line_y = caption_block.y + CAPTION_PADDING as i32;
    runs.push(TextRun {
        text: prefix,
        x: line_x,
        y: line_y,
        scale: CAPTION_SCALE,
        bold: false,
        italic: false,
        rgba: COLOR_BLACK,
    });
    runs.push(TextRun {
        text: request.caption.clone(),
        x: line_x + prefix_w as i32,
        y: line_y,
        scale: CAPTION_SCALE,
        bold: true,
        italic: false,
        rgba: COLOR_BLACK,
    });

    // Footer line: "Powered By " italic, brand name bold italic
    let brand_prefix_w = font::measure(BRAND_PREFIX, FOOTER_SCALE);
    let footer_w = brand_prefix_w + font::measure(BRAND_NAME, FOOTER_SCALE);
    let footer_x = caption_block.x + (caption_block.width as i32 - footer_w as i32) / 2;
    let footer_y = line_y + caption_h as i32 + LINE_GAP as i32;
    runs.push(TextRun {
        text: BRAND_PREFIX.to_string(),
        x: footer_x,
        y: footer_y,
        scale: FOOTER_SCALE,
        bold: false,
        italic: true,
        rgba: COLOR_GRAY,
    });
    runs.push(TextRun {
        text: BRAND_NAME.to_string(),
        x: footer_x + brand_prefix_w as i32,
        y: footer_y,
        scale: FOOTER_SCALE,
        bold: true,
        italic: true,
        rgba: COLOR_GRAY,
    });

    CompositeLayout {
        canvas,
        photo,
        caption_block,
        runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageMetrics;

    fn square_metrics() -> ImageMetrics {
        ImageMetrics::resolve(800, 800, 400).unwrap()
    }

    #[test]
    fn layout_stacks_photo_then_caption_block() {
        let req = CompositeRequest::new("a.jpg", "caption", "Photo");
        let l = layout_composite(&square_metrics(), &req);
        assert_eq!(l.photo.x, FRAME_PADDING as i32);
        assert_eq!(l.photo.y, FRAME_PADDING as i32);
        assert_eq!(l.photo.width, 400);
        assert_eq!(l.photo.height, 400);
        assert_eq!(l.caption_block.y, l.photo.bottom());
        assert_eq!(l.canvas.width, 400 + FRAME_PADDING * 2);
        assert_eq!(l.canvas.height as i32, l.caption_block.bottom());
    }

    #[test]
    fn layout_emits_four_text_runs() {
        let req = CompositeRequest::new("a.jpg", "Sunset", "Photo");
        let l = layout_composite(&square_metrics(), &req);
        assert_eq!(l.runs.len(), 4);
        assert!(!l.runs[0].bold && l.runs[1].bold);
        assert!(l.runs[2].italic && l.runs[3].italic && l.runs[3].bold);
        assert_eq!(l.runs[3].text, BRAND_NAME);
    }

    #[test]
    fn caption_runs_share_a_baseline_and_are_centered() {
        let req = CompositeRequest::new("a.jpg", "Sunset", "Photo");
        let l = layout_composite(&square_metrics(), &req);
        assert_eq!(l.runs[0].y, l.runs[1].y);
        let line_w = font::measure("Photo | ", CAPTION_SCALE) + font::measure("Sunset", CAPTION_SCALE);
        let expected_x =
            l.caption_block.x + (l.caption_block.width as i32 - line_w as i32) / 2;
        assert_eq!(l.runs[0].x, expected_x);
    }

    #[test]
    fn clamped_panorama_uses_clamped_photo_height() {
        let m = ImageMetrics::resolve(2000, 1000, 500).unwrap();
        let req = CompositeRequest::new("a.jpg", "c", "l");
        let l = layout_composite(&m, &req);
        // width / 1.33, not the unclamped 250
        assert_eq!(l.photo.height, (500.0f32 / 1.33).round() as u32);
    }

    #[test]
    fn oversized_caption_keeps_centering_and_goes_negative() {
        let m = ImageMetrics::resolve(100, 100, 100).unwrap();
        let req = CompositeRequest::new(
            "a.jpg",
            "an extremely long caption that cannot possibly fit",
            "Photo",
        );
        let l = layout_composite(&m, &req);
        assert!(l.runs[0].x < l.caption_block.x);
    }
}
