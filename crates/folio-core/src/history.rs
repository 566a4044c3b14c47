//! Undo/redo of whole-document snapshots.
//!
//! Snapshots are raw element sequences, not scene handles, so history can be
//! replayed into any scene.

use crate::config::Settings;
use crate::element::{Element, ElementId};
use crate::scene::{Scene, SceneError};

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Document state at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Every element of every page.
    pub elements: Vec<Element>,
    /// Page shown when the snapshot was taken.
    pub current_page_id: Option<ElementId>,
}

impl Snapshot {
    /// Capture the whole document of `scene`.
    pub fn capture(scene: &Scene, current_page_id: Option<ElementId>) -> Self {
        Self {
            elements: scene.get_document_elements_including_deleted().to_vec(),
            current_page_id,
        }
    }
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(MAX_UNDO_HISTORY)
    }

    /// History that keeps at most `limit` undo states.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// History sized by `settings.max_undo_history`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_limit(settings.max_undo_history)
    }

    /// Record the state before a change. Clears the redo stack.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Step back. `current` is kept for redo; the restored state is returned.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(snapshot)
    }

    /// Undo on a scene. Returns the page to show, or `None` when there was
    /// nothing to undo.
    pub fn undo_scene(
        &mut self,
        scene: &Scene,
        current_page_id: Option<ElementId>,
    ) -> Result<Option<Option<ElementId>>, SceneError> {
        let current = Snapshot::capture(scene, current_page_id);
        match self.undo(current) {
            Some(snapshot) => {
                scene.replace_all_document_elements(snapshot.elements)?;
                Ok(Some(snapshot.current_page_id))
            }
            None => Ok(None),
        }
    }

    /// Redo on a scene. See [`History::undo_scene`].
    pub fn redo_scene(
        &mut self,
        scene: &Scene,
        current_page_id: Option<ElementId>,
    ) -> Result<Option<Option<ElementId>>, SceneError> {
        let current = Snapshot::capture(scene, current_page_id);
        match self.redo(current) {
            Some(snapshot) => {
                scene.replace_all_document_elements(snapshot.elements)?;
                Ok(Some(snapshot.current_page_id))
            }
            None => Ok(None),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(page_ids: &[&str]) -> Snapshot {
        Snapshot {
            elements: page_ids.iter().map(|id| Element::page().with_id(*id)).collect(),
            current_page_id: page_ids.first().map(|id| id.to_string()),
        }
    }

    fn ids(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.elements.iter().map(|el| el.id.as_str()).collect()
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new();
        history.push(snapshot(&["A"]));

        let restored = history.undo(snapshot(&["A", "B"])).unwrap();
        assert_eq!(ids(&restored), vec!["A"]);
        assert_eq!(restored.current_page_id.as_deref(), Some("A"));
        assert!(history.can_redo());

        let again = history.redo(restored).unwrap();
        assert_eq!(again.elements.len(), 2);
        assert!(history.can_undo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new();
        history.push(snapshot(&["A"]));
        history.undo(snapshot(&["A", "B"]));
        assert!(history.can_redo());

        history.push(snapshot(&["A", "C"]));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_stacks() {
        let mut history = History::new();
        assert!(!history.can_undo());
        assert!(history.undo(snapshot(&["A"])).is_none());
        assert!(!history.can_redo());
        assert!(history.redo(snapshot(&["A"])).is_none());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(2);
        history.push(snapshot(&["1"]));
        history.push(snapshot(&["2"]));
        history.push(snapshot(&["3"]));

        let current = snapshot(&["now"]);
        assert_eq!(ids(&history.undo(current.clone()).unwrap()), vec!["3"]);
        assert_eq!(ids(&history.undo(current.clone()).unwrap()), vec!["2"]);
        assert!(history.undo(current).is_none());
    }

    #[test]
    fn test_limit_from_settings() {
        let settings = Settings::from_json(r#"{"maxUndoHistory": 1}"#).unwrap();
        let mut history = History::from_settings(&settings);
        history.push(snapshot(&["1"]));
        history.push(snapshot(&["2"]));

        let current = snapshot(&["now"]);
        assert_eq!(ids(&history.undo(current.clone()).unwrap()), vec!["2"]);
        assert!(history.undo(current).is_none());
    }

    #[test]
    fn test_undo_scene_restores_document() {
        let scene = Scene::with_elements(vec![Element::page().with_id("A")]);
        let mut history = History::new();
        history.push(Snapshot::capture(&scene, Some("A".to_string())));

        scene
            .replace_all_document_elements(vec![
                Element::page().with_id("A"),
                Element::page().with_id("B"),
            ])
            .unwrap();

        let page = history.undo_scene(&scene, Some("B".to_string())).unwrap();
        assert_eq!(page, Some(Some("A".to_string())));
        assert_eq!(scene.page_ids(), vec!["A".to_string()]);

        let page = history.redo_scene(&scene, Some("A".to_string())).unwrap();
        assert_eq!(page, Some(Some("B".to_string())));
        assert_eq!(scene.page_ids().len(), 2);
    }
}
