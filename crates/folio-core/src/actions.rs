//! Page commands: add, delete and move between pages.
//!
//! Every page action works on the whole document sequence rather than on the
//! current page's slice, because it moves page boundaries.

use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId};
use crate::history::{History, Snapshot};
use crate::pages;
use crate::scene::{Scene, SceneError};

/// Whether the editor shows pages at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentMode {
    #[default]
    SinglePage,
    MultiPage,
}

/// The slice of editor state page actions read and write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub current_page_id: Option<ElementId>,
    pub document_mode: DocumentMode,
}

impl AppState {
    fn is_multi_page(&self) -> bool {
        self.document_mode == DocumentMode::MultiPage
    }

    fn with_page(&self, page_id: Option<ElementId>) -> Self {
        Self {
            current_page_id: page_id,
            ..self.clone()
        }
    }
}

/// Outcome of performing an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionResult {
    /// Record the prior document state for undo.
    pub commit_to_history: bool,
    /// New editor state, if it changed.
    pub app_state: Option<AppState>,
    /// New document sequence, if it changed.
    pub elements: Option<Vec<Element>>,
}

/// The page actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionName {
    AddPage,
    DeletePage,
    PrevPage,
    NextPage,
}

impl ActionName {
    pub const ALL: [ActionName; 4] = [
        ActionName::AddPage,
        ActionName::DeletePage,
        ActionName::PrevPage,
        ActionName::NextPage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionName::AddPage => "addPage",
            ActionName::DeletePage => "deletePage",
            ActionName::PrevPage => "prevPage",
            ActionName::NextPage => "nextPage",
        }
    }

    /// Run the action against the document sequence.
    pub fn perform(self, elements: &[Element], app_state: &AppState, scene: &Scene) -> ActionResult {
        match self {
            ActionName::AddPage => add_page(elements, app_state),
            ActionName::DeletePage => delete_page(elements, app_state, scene),
            ActionName::PrevPage => prev_page(app_state, scene),
            ActionName::NextPage => next_page(app_state, scene),
        }
    }

    /// Whether the toolbar should offer the action.
    pub fn is_visible(self, elements: &[Element], app_state: &AppState) -> bool {
        if !app_state.is_multi_page() {
            return false;
        }
        match self {
            ActionName::AddPage => true,
            ActionName::DeletePage => !pages::has_single_empty_page(elements),
            ActionName::PrevPage => app_state
                .current_page_id
                .as_deref()
                .is_some_and(|id| pages::has_page_before(id, elements)),
            ActionName::NextPage => app_state
                .current_page_id
                .as_deref()
                .is_some_and(|id| pages::has_page_after(id, elements)),
        }
    }
}

/// Insert a new page after the current one and switch to it.
pub fn add_page(elements: &[Element], app_state: &AppState) -> ActionResult {
    let Some(current_page_id) = app_state.current_page_id.as_deref() else {
        log::error!("can't add a page when there is no current page");
        return ActionResult::default();
    };
    let new_page = Element::page();
    let new_page_id = new_page.id.clone();
    ActionResult {
        commit_to_history: true,
        app_state: Some(app_state.with_page(Some(new_page_id))),
        elements: Some(pages::add_page(new_page, current_page_id, elements)),
    }
}

/// Delete the current page and switch to a neighbour.
///
/// The last remaining page is only cleared, so the document keeps one page.
pub fn delete_page(elements: &[Element], app_state: &AppState, scene: &Scene) -> ActionResult {
    let Some(current_page_id) = app_state.current_page_id.as_deref() else {
        log::error!("can't delete a page when there is no current page");
        return ActionResult::default();
    };
    let adjacent = if scene.get_prev_page_id().as_deref() == Some(current_page_id) {
        scene.get_next_page_id()
    } else {
        scene.get_prev_page_id()
    };
    let only_clear = adjacent
        .as_deref()
        .is_none_or(|adjacent| adjacent == current_page_id);
    ActionResult {
        commit_to_history: true,
        app_state: Some(app_state.with_page(adjacent)),
        elements: Some(pages::delete_page(current_page_id, elements, only_clear)),
    }
}

/// Switch to the previous page.
pub fn prev_page(app_state: &AppState, scene: &Scene) -> ActionResult {
    ActionResult {
        commit_to_history: false,
        app_state: Some(app_state.with_page(scene.get_prev_page_id())),
        elements: None,
    }
}

/// Switch to the next page.
pub fn next_page(app_state: &AppState, scene: &Scene) -> ActionResult {
    ActionResult {
        commit_to_history: false,
        app_state: Some(app_state.with_page(scene.get_next_page_id())),
        elements: None,
    }
}

/// Perform `action` on `scene` and apply its result.
///
/// The scene's current-page getter must agree with `app_state`. Returns the
/// editor state to use afterwards.
pub fn dispatch(
    action: ActionName,
    scene: &Scene,
    app_state: &AppState,
    history: &mut History,
) -> Result<AppState, SceneError> {
    let document = scene.get_document_elements_including_deleted();
    let result = action.perform(&document, app_state, scene);
    log::debug!(
        "{} performed, commit_to_history={}",
        action.as_str(),
        result.commit_to_history
    );

    if let Some(elements) = result.elements {
        if result.commit_to_history {
            history.push(Snapshot {
                elements: document.to_vec(),
                current_page_id: app_state.current_page_id.clone(),
            });
        }
        scene.replace_all_document_elements(elements)?;
    }
    Ok(result.app_state.unwrap_or_else(|| app_state.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use kurbo::Point;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn page(id: &str) -> Element {
        Element::page().with_id(id)
    }

    fn shape(id: &str) -> Element {
        Element::new(ElementKind::Rectangle, Point::ZERO, 10.0, 10.0).with_id(id)
    }

    fn multi_page(current: &str) -> AppState {
        AppState {
            current_page_id: Some(current.to_string()),
            document_mode: DocumentMode::MultiPage,
        }
    }

    /// Scene whose current page follows a shared app state.
    fn editor(elements: Vec<Element>, current: &str) -> (Scene, Rc<RefCell<AppState>>) {
        let scene = Scene::with_elements(elements);
        let state = Rc::new(RefCell::new(multi_page(current)));
        let getter = Rc::clone(&state);
        scene.set_current_page_id_getter(move || getter.borrow().current_page_id.clone());
        (scene, state)
    }

    #[test]
    fn test_add_page_switches_to_new_page() {
        let (scene, state) = editor(vec![page("A"), shape("s1"), page("B")], "A");
        let result = ActionName::AddPage.perform(
            &scene.get_document_elements_including_deleted(),
            &state.borrow(),
            &scene,
        );

        assert!(result.commit_to_history);
        let elements = result.elements.unwrap();
        let new_id = result.app_state.unwrap().current_page_id.unwrap();
        assert_eq!(elements[2].id, new_id);
        assert_eq!(elements[3].id, "B");
    }

    #[test]
    fn test_add_page_without_current_page_is_noop() {
        let result = add_page(&[page("A")], &AppState::default());
        assert_eq!(result, ActionResult::default());
    }

    #[test]
    fn test_delete_page_moves_to_previous() {
        let (scene, state) = editor(vec![page("A"), page("B"), shape("s1"), page("C")], "B");
        let result = ActionName::DeletePage.perform(
            &scene.get_document_elements_including_deleted(),
            &state.borrow(),
            &scene,
        );

        assert_eq!(result.app_state.unwrap().current_page_id.as_deref(), Some("A"));
        let elements = result.elements.unwrap();
        assert!(elements[1].is_deleted && elements[2].is_deleted);
        assert!(!elements[0].is_deleted && !elements[3].is_deleted);
    }

    #[test]
    fn test_delete_first_page_moves_to_next() {
        let (scene, state) = editor(vec![page("A"), shape("s1"), page("B")], "A");
        let result = delete_page(
            &scene.get_document_elements_including_deleted(),
            &state.borrow(),
            &scene,
        );
        assert_eq!(result.app_state.unwrap().current_page_id.as_deref(), Some("B"));
        assert!(result.elements.unwrap()[0].is_deleted);
    }

    #[test]
    fn test_delete_last_remaining_page_only_clears() {
        let (scene, state) = editor(vec![page("A"), shape("s1")], "A");
        let result = delete_page(
            &scene.get_document_elements_including_deleted(),
            &state.borrow(),
            &scene,
        );
        assert_eq!(result.app_state.unwrap().current_page_id.as_deref(), Some("A"));
        let elements = result.elements.unwrap();
        assert!(!elements[0].is_deleted);
        assert!(elements[1].is_deleted);
        assert!(pages::has_single_empty_page(&elements));
    }

    #[test]
    fn test_prev_and_next_do_not_commit() {
        let (scene, state) = editor(vec![page("A"), page("B")], "A");
        let next = next_page(&state.borrow(), &scene);
        assert!(!next.commit_to_history);
        assert!(next.elements.is_none());
        assert_eq!(next.app_state.unwrap().current_page_id.as_deref(), Some("B"));

        let prev = prev_page(&state.borrow(), &scene);
        assert_eq!(prev.app_state.unwrap().current_page_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_visibility() {
        let elements = vec![page("A"), shape("s1"), page("B")];
        let state = multi_page("A");
        assert!(ActionName::AddPage.is_visible(&elements, &state));
        assert!(ActionName::DeletePage.is_visible(&elements, &state));
        assert!(!ActionName::PrevPage.is_visible(&elements, &state));
        assert!(ActionName::NextPage.is_visible(&elements, &state));

        let single = AppState {
            document_mode: DocumentMode::SinglePage,
            ..state
        };
        assert!(ActionName::ALL
            .iter()
            .all(|action| !action.is_visible(&elements, &single)));

        let empty = vec![page("A")];
        assert!(!ActionName::DeletePage.is_visible(&empty, &multi_page("A")));
    }

    #[test]
    fn test_dispatch_add_delete_and_undo() {
        let (scene, state) = editor(vec![page("A"), shape("s1")], "A");
        let mut history = History::new();

        let next_state = dispatch(ActionName::AddPage, &scene, &state.borrow(), &mut history).unwrap();
        *state.borrow_mut() = next_state;
        assert_eq!(scene.page_ids().len(), 2);
        assert!(history.can_undo());

        let next_state =
            dispatch(ActionName::DeletePage, &scene, &state.borrow(), &mut history).unwrap();
        *state.borrow_mut() = next_state;
        assert_eq!(scene.page_ids(), vec!["A".to_string()]);
        assert_eq!(state.borrow().current_page_id.as_deref(), Some("A"));

        let current = state.borrow().current_page_id.clone();
        let restored = history.undo_scene(&scene, current).unwrap();
        assert!(restored.is_some());
        assert_eq!(scene.page_ids().len(), 2);
    }

    #[test]
    fn test_dispatch_navigation_leaves_history_alone() {
        let (scene, state) = editor(vec![page("A"), page("B")], "A");
        let mut history = History::new();
        let next_state =
            dispatch(ActionName::NextPage, &scene, &state.borrow(), &mut history).unwrap();
        assert_eq!(next_state.current_page_id.as_deref(), Some("B"));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_action_names() {
        assert_eq!(ActionName::AddPage.as_str(), "addPage");
        let json = serde_json::to_string(&ActionName::NextPage).unwrap();
        assert_eq!(json, "\"nextPage\"");
    }
}
