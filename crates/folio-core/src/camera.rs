//! Viewport scroll and zoom, and fitting fixed-size pages into the viewport.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::canvas_size::CanvasSize;
use crate::element::Element;

/// Smallest zoom the viewport allows.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom the viewport allows.
pub const MAX_ZOOM: f64 = 30.0;

/// Scroll offset (in canvas units) and zoom of the viewport.
///
/// A canvas point `p` lands on screen at `(p + scroll) * zoom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub scroll: Vec2,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scroll: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Clamp a zoom value to the supported range.
pub fn normalized_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas to screen transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.scroll)
    }

    pub fn canvas_to_screen(&self, point: Point) -> Point {
        self.transform() * point
    }

    pub fn screen_to_canvas(&self, point: Point) -> Point {
        self.transform().inverse() * point
    }

    /// Fit a fixed page into `viewport`.
    ///
    /// Does nothing without a page or a default canvas size, or when the
    /// canvas is not set to auto zoom. The page is scaled to the largest size
    /// that fits and centered along the axis with room to spare. Returns
    /// whether the camera changed.
    pub fn autozoom_fixed_page(
        &mut self,
        page: Option<&Element>,
        default_size: Option<&CanvasSize>,
        viewport: Size,
    ) -> bool {
        let (Some(page), Some(default_size)) = (page, default_size) else {
            return false;
        };
        if !default_size.auto_zoom {
            return false;
        }
        let source = default_size.page_size(page);
        if source.width <= 0.0 || source.height <= 0.0 {
            log::warn!("page {} has no size to fit", page.id);
            return false;
        }

        let scale = (viewport.width / source.width).min(viewport.height / source.height);
        let scaled = source * scale;
        let scroll = Vec2::new(
            if viewport.width > scaled.width {
                (viewport.width - scaled.width) / 2.0 / scale
            } else {
                0.0
            },
            if viewport.height > scaled.height {
                (viewport.height - scaled.height) / 2.0 / scale
            } else {
                0.0
            },
        );
        let zoom = normalized_zoom(scale);

        if scroll == self.scroll && zoom == self.zoom {
            return false;
        }
        self.scroll = scroll;
        self.zoom = zoom;
        true
    }
}
