//! Rendering pipeline for the composite
//!
//! Split the same way a larger renderer would be: `layout` positions the
//! photo, caption block, and text runs; `paint` flattens the layout into a
//! display list; `raster` executes the list into pixels and encodes the
//! configured format; `font` provides deterministic bitmap text.

pub mod font;
pub mod layout;
pub mod paint;
pub mod raster;

/// A rendered, encoded composite ready to be delivered
#[derive(Debug, Clone)]
pub struct Artifact {
    pub width: u32,
    pub height: u32,
    /// Encoded image bytes (JPEG or PNG per the composer config)
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub mime: &'static str,
}

impl Artifact {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
