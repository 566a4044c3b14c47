//! Folio Core Library
//!
//! Multi-page scene model for the Folio whiteboard: a flat element sequence
//! split into pages by page sentinels, the scene that owns it, and the
//! page-level actions, history and persistence built on top.

pub mod actions;
pub mod camera;
pub mod canvas_size;
pub mod config;
pub mod document;
pub mod element;
pub mod history;
pub mod pages;
pub mod scene;
pub mod storage;

pub use actions::{ActionName, ActionResult, AppState, DocumentMode};
pub use camera::Camera;
pub use canvas_size::{CanvasMode, CanvasSize};
pub use config::{ConfigError, Settings};
pub use document::Document;
pub use element::{Element, ElementId, ElementKind};
pub use history::{History, Snapshot};
pub use pages::{PageIndex, PageRange};
pub use scene::{CallbackRemover, ElementKey, ElementsView, Scene, SceneError, SceneId, SceneRegistry};
