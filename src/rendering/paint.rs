//! Display-list flattening for the composite

use crate::rendering::layout::{CompositeLayout, COLOR_WHITE, PHOTO_RADIUS};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    /// Blit the (resized) source photo with rounded corners
    Photo {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        corner_radius: u32,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        scale: u32,
        bold: bool,
        italic: bool,
        rgba: (u8, u8, u8, u8),
    },
}

/// Flatten a positioned layout into back-to-front paint commands.
pub fn display_list(layout: &CompositeLayout) -> Vec<PaintCommand> {
    let mut commands = Vec::with_capacity(3 + layout.runs.len());

    // Card background, edge to edge
    commands.push(PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width: layout.canvas.width,
        height: layout.canvas.height,
        rgba: COLOR_WHITE,
    });

    commands.push(PaintCommand::Photo {
        x: layout.photo.x,
        y: layout.photo.y,
        width: layout.photo.width,
        height: layout.photo.height,
        corner_radius: PHOTO_RADIUS,
    });

    for run in &layout.runs {
        commands.push(PaintCommand::Text {
            x: run.x,
            y: run.y,
            text: run.text.clone(),
            scale: run.scale,
            bold: run.bold,
            italic: run.italic,
            rgba: run.rgba,
        });
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::layout_composite;
    use crate::{CompositeRequest, ImageMetrics};

    #[test]
    fn list_is_background_photo_then_text() {
        let metrics = ImageMetrics::resolve(800, 800, 400).unwrap();
        let req = CompositeRequest::new("a.jpg", "caption", "Photo");
        let layout = layout_composite(&metrics, &req);
        let cmds = display_list(&layout);

        assert!(matches!(cmds[0], PaintCommand::SolidRect { x: 0, y: 0, .. }));
        assert!(matches!(cmds[1], PaintCommand::Photo { corner_radius: PHOTO_RADIUS, .. }));
        assert_eq!(
            cmds.iter()
                .filter(|c| matches!(c, PaintCommand::Text { .. }))
                .count(),
            4
        );
    }
}
