//! Element records and the predicates the page model is built on.
//!
//! Elements are plain values. A document is an ordered `Vec<Element>` in which
//! page sentinels (`ElementKind::Page`) delimit pages; everything after a
//! sentinel, up to the next one, belongs to that page.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements. Unique across the whole document.
pub type ElementId = String;

/// The kind of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Page sentinel. Delimits a page; never drawn.
    Page,
    Rectangle,
    Diamond,
    Ellipse,
    Line,
    Arrow,
    Freedraw,
    Text,
    Image,
}

impl ElementKind {
    /// Whether this kind is a page sentinel.
    pub fn is_page(self) -> bool {
        self == ElementKind::Page
    }

    /// Whether this kind is drawn from a list of points with an editable end.
    pub fn is_linear(self) -> bool {
        matches!(self, ElementKind::Line | ElementKind::Arrow)
    }
}

/// A single record of the document sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// For pages, 0 means auto-fit (infinite canvas).
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub is_deleted: bool,
    /// Bumped on every mutation. Used for change detection.
    #[serde(default = "initial_version")]
    pub version: u32,
    #[serde(default)]
    pub version_nonce: u32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    /// Transient state of the linear editor; cleared before export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_committed_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

fn initial_version() -> u32 {
    1
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_background_color() -> String {
    "transparent".to_string()
}

/// Random nonce for a new element version.
/// Counter mixed through a splitmix32-style hash, so it works without a clock.
fn random_nonce() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static NONCE_COUNTER: AtomicU32 = AtomicU32::new(1);

    let mut x = NONCE_COUNTER
        .fetch_add(1, Ordering::Relaxed)
        .wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

impl Element {
    /// Create a new element with a fresh id.
    pub fn new(kind: ElementKind, origin: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            x: origin.x,
            y: origin.y,
            width,
            height,
            is_deleted: false,
            version: initial_version(),
            version_nonce: random_nonce(),
            locked: false,
            stroke_color: default_stroke_color(),
            background_color: default_background_color(),
            points: Vec::new(),
            last_committed_point: None,
            text: None,
            file_id: None,
        }
    }

    /// Create an auto-fit page sentinel.
    pub fn page() -> Self {
        Self::new(ElementKind::Page, Point::ZERO, 0.0, 0.0)
    }

    /// Create a fixed-size page sentinel.
    pub fn fixed_page(width: f64, height: f64) -> Self {
        Self::new(ElementKind::Page, Point::ZERO, width, height)
    }

    /// Create a line or arrow through the given points (relative to the first).
    pub fn linear(kind: ElementKind, points: Vec<Point>) -> Self {
        let origin = points.first().copied().unwrap_or(Point::ZERO);
        let bounds = points
            .iter()
            .fold(kurbo::Rect::from_points(origin, origin), |acc, p| {
                acc.union_pt(*p)
            });
        let mut element = Self::new(kind, origin, bounds.width(), bounds.height());
        element.points = points
            .into_iter()
            .map(|p| Point::new(p.x - origin.x, p.y - origin.y))
            .collect();
        element
    }

    /// Create a text element.
    pub fn text(origin: Point, content: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Text, origin, 0.0, 0.0);
        element.text = Some(content.into());
        element
    }

    /// Create an image element that references a binary file.
    pub fn image(origin: Point, width: f64, height: f64, file_id: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Image, origin, width, height);
        element.file_id = Some(file_id.into());
        element
    }

    /// Replace the generated id. Mostly useful for fixtures and imports.
    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_page(&self) -> bool {
        self.kind.is_page()
    }

    pub fn is_linear(&self) -> bool {
        self.kind.is_linear()
    }

    pub fn is_non_deleted(&self) -> bool {
        !self.is_deleted
    }

    /// A page with a positive width or height has a fixed canvas size.
    pub fn is_fixed_size_page(&self) -> bool {
        self.is_page() && self.width + self.height > 0.0
    }

    /// Whether the element would render as nothing.
    pub fn is_invisibly_small(&self) -> bool {
        if self.is_linear() || self.kind == ElementKind::Freedraw {
            self.points.len() < 2
        } else {
            self.width == 0.0 || self.height == 0.0
        }
    }

    /// Return a new version of this element with `update` applied.
    ///
    /// The version is incremented and the nonce regenerated.
    pub fn mutated(&self, update: impl FnOnce(&mut Element)) -> Element {
        let mut next = self.clone();
        update(&mut next);
        next.version = self.version.wrapping_add(1);
        next.version_nonce = random_nonce();
        next
    }

    /// Return this element marked deleted. Already deleted elements are
    /// returned as they are, without a version bump.
    pub fn soft_deleted(&self) -> Element {
        if self.is_deleted {
            return self.clone();
        }
        self.mutated(|el| el.is_deleted = true)
    }
}

/// Sum of all element versions. Changes whenever any element changes.
pub fn get_scene_version(elements: &[Element]) -> u64 {
    elements.iter().map(|el| u64::from(el.version)).sum()
}

/// Elements not marked deleted, in order.
pub fn get_non_deleted_elements(elements: &[Element]) -> Vec<Element> {
    elements
        .iter()
        .filter(|el| el.is_non_deleted())
        .cloned()
        .collect()
}

/// Elements that render: not deleted, not page sentinels, not invisibly small.
pub fn get_visible_elements(elements: &[Element]) -> Vec<Element> {
    elements
        .iter()
        .filter(|el| el.is_non_deleted() && !el.is_page() && !el.is_invisibly_small())
        .cloned()
        .collect()
}

fn clear_elements(elements: &[Element]) -> Vec<Element> {
    elements
        .iter()
        .filter(|el| el.is_non_deleted())
        .map(|el| {
            if el.is_linear() {
                Element {
                    last_committed_point: None,
                    ..el.clone()
                }
            } else {
                el.clone()
            }
        })
        .collect()
}

/// Prepare elements for a database write.
pub fn clear_elements_for_database(elements: &[Element]) -> Vec<Element> {
    clear_elements(elements)
}

/// Prepare elements for export to a file.
pub fn clear_elements_for_export(elements: &[Element]) -> Vec<Element> {
    clear_elements(elements)
}

/// Prepare elements for local storage.
pub fn clear_elements_for_local_storage(elements: &[Element]) -> Vec<Element> {
    clear_elements(elements)
}
