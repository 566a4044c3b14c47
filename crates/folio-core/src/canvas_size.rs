//! Canvas sizing for fixed-size pages.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Diameter of the erase drop zone, in canvas units.
pub const ERASE_CIRCLE_SIZE: f64 = 80.0;

/// File id of the erase drop-zone image.
pub const ERASE_CIRCLE_FILE_ID: &str = "erase_circle";

/// Whether the canvas grows with its content or has fixed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasMode {
    #[default]
    Auto,
    Fixed,
}

/// Default canvas size of an editor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSize {
    #[serde(default)]
    pub mode: CanvasMode,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Zoom and center fixed pages to fit the viewport.
    #[serde(default)]
    pub auto_zoom: bool,
}

impl CanvasSize {
    /// A fixed canvas of the given size.
    pub fn fixed(width: f64, height: f64) -> Self {
        Self {
            mode: CanvasMode::Fixed,
            width,
            height,
            auto_zoom: false,
        }
    }

    pub fn with_auto_zoom(mut self, auto_zoom: bool) -> Self {
        self.auto_zoom = auto_zoom;
        self
    }

    pub fn is_fixed(&self) -> bool {
        self.mode == CanvasMode::Fixed
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Size of `page`: its own when fixed, otherwise this default.
    pub fn page_size(&self, page: &Element) -> Size {
        if page.is_fixed_size_page() {
            Size::new(page.width, page.height)
        } else {
            self.size()
        }
    }
}

/// Locked image at the bottom center of a fixed canvas. Elements dropped on it
/// get erased. Auto-sized canvases have no drop zone.
pub fn new_erase_dropzone_element(canvas_size: &CanvasSize) -> Option<Element> {
    if !canvas_size.is_fixed() {
        return None;
    }
    let origin = Point::new(
        canvas_size.width / 2.0 - ERASE_CIRCLE_SIZE / 2.0,
        canvas_size.height - ERASE_CIRCLE_SIZE * 1.1,
    );
    let mut element = Element::image(origin, ERASE_CIRCLE_SIZE, ERASE_CIRCLE_SIZE, ERASE_CIRCLE_FILE_ID);
    element.locked = true;
    element.stroke_color = "red".to_string();
    element.background_color = "rgba(255,0,0,0.01)".to_string();
    Some(element)
}

/// The drop zone to show after the canvas size changed from `old` to `new`.
/// `None` when the size did not change and the current drop zone stays.
pub fn updated_erase_dropzone(old: &CanvasSize, new: &CanvasSize) -> Option<Option<Element>> {
    if old == new {
        return None;
    }
    Some(new_erase_dropzone_element(new))
}
