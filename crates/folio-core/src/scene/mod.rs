//! The scene: canonical element sequence of one open document.
//!
//! A scene offers two views over the same backing sequence. The document view
//! covers every page; the page view is scoped to whatever page the injected
//! current-page getter returns. All derived state (non-deleted cache, page
//! list, id map, page index) is rebuilt on every replace, and subscribers are
//! notified synchronously before the replace returns.

mod registry;

pub use registry::{ElementKey, SceneRegistry};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, Range};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::document::Document;
use crate::element::{self, Element, ElementId};
use crate::pages::{self, PageIndex};

/// Scene errors. All of them point at a bug in the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("callback is already registered on this scene")]
    CallbackAlreadyRegistered,
    #[error("callback is not registered on this scene")]
    CallbackNotRegistered,
    #[error("scene has been destroyed")]
    Destroyed,
}

/// Subscriber notified after every mutation.
pub type SceneCallback = Rc<dyn Fn()>;

type PageIdGetter = Rc<dyn Fn() -> Option<ElementId>>;

/// Identity of a scene, stable for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);
        SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Read-only view into a scene's elements.
///
/// Holds a shared snapshot, so it stays valid after the scene changes.
#[derive(Clone)]
pub struct ElementsView {
    elements: Rc<[Element]>,
    range: Range<usize>,
}

impl ElementsView {
    fn new(elements: Rc<[Element]>, range: Range<usize>) -> Self {
        Self { elements, range }
    }

    fn whole(elements: Rc<[Element]>) -> Self {
        let range = 0..elements.len();
        Self { elements, range }
    }
}

impl Deref for ElementsView {
    type Target = [Element];

    fn deref(&self) -> &[Element] {
        &self.elements[self.range.clone()]
    }
}

impl fmt::Debug for ElementsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Everything derived from the element sequence.
struct SceneState {
    elements: Rc<[Element]>,
    non_deleted: Rc<[Element]>,
    /// Position in `elements` for each id. Later duplicates win.
    elements_map: HashMap<ElementId, usize>,
    /// Live page ids in order.
    pages: Vec<ElementId>,
    page_index: PageIndex,
    duplicate_ids: Vec<ElementId>,
}

impl SceneState {
    fn empty() -> Self {
        Self::derive(Vec::new())
    }

    fn derive(elements: Vec<Element>) -> Self {
        let mut elements_map = HashMap::with_capacity(elements.len());
        let mut duplicate_ids = Vec::new();
        for (position, el) in elements.iter().enumerate() {
            if elements_map.insert(el.id.clone(), position).is_some() {
                duplicate_ids.push(el.id.clone());
            }
        }
        let page_index = PageIndex::build(&elements);
        let pages = page_index.live_ids();
        let non_deleted: Rc<[Element]> = element::get_non_deleted_elements(&elements).into();
        Self {
            elements: elements.into(),
            non_deleted,
            elements_map,
            pages,
            page_index,
            duplicate_ids,
        }
    }
}

pub(crate) struct SceneInner {
    id: SceneId,
    state: RefCell<SceneState>,
    callbacks: RefCell<Vec<SceneCallback>>,
    current_page_id: RefCell<PageIdGetter>,
    destroyed: Cell<bool>,
}

impl Drop for SceneInner {
    fn drop(&mut self) {
        registry::purge_global(self.id);
    }
}

/// Handle to a scene. Clones share the same scene.
#[derive(Clone)]
pub struct Scene {
    inner: Rc<SceneInner>,
}

impl PartialEq for Scene {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Scene {}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Scene")
            .field("id", &self.inner.id)
            .field("elements", &state.elements.len())
            .field("pages", &state.pages)
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with no current page.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SceneInner {
                id: SceneId::next(),
                state: RefCell::new(SceneState::empty()),
                callbacks: RefCell::new(Vec::new()),
                current_page_id: RefCell::new(Rc::new(|| None)),
                destroyed: Cell::new(false),
            }),
        }
    }

    /// Create a scene holding the given document sequence.
    pub fn with_elements(elements: Vec<Element>) -> Self {
        let scene = Self::new();
        scene.commit(elements);
        scene
    }

    /// Create a scene from a stored document.
    pub fn from_document(document: Document) -> Self {
        Self::with_elements(document.elements)
    }

    /// Snapshot the scene as a document record.
    pub fn to_document(&self, id: impl Into<String>, name: impl Into<String>) -> Document {
        Document {
            id: id.into(),
            name: name.into(),
            elements: self.inner.state.borrow().elements.to_vec(),
        }
    }

    /// The scene that currently owns the given element or id.
    pub fn get_scene<'a>(key: impl Into<ElementKey<'a>>) -> Option<Scene> {
        let key = key.into();
        SceneRegistry::with_global(|registry| registry.resolve(key))
    }

    pub fn id(&self) -> SceneId {
        self.inner.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    pub(crate) fn downgrade(&self) -> Weak<SceneInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(handle: &Weak<SceneInner>) -> Option<Scene> {
        handle.upgrade().map(|inner| Scene { inner })
    }

    /// Inject the resolver for the page the editor is showing.
    pub fn set_current_page_id_getter(&self, getter: impl Fn() -> Option<ElementId> + 'static) {
        *self.inner.current_page_id.borrow_mut() = Rc::new(getter);
    }

    /// The page the editor is showing, as reported by the injected getter.
    pub fn current_page_id(&self) -> Option<ElementId> {
        let getter = Rc::clone(&self.inner.current_page_id.borrow());
        getter()
    }

    /// Sentinel element of the current page.
    pub fn current_page(&self) -> Option<Element> {
        let page_id = self.current_page_id();
        let state = self.inner.state.borrow();
        pages::find_page_element(page_id.as_deref(), &state.elements).cloned()
    }

    // --- Reads ---

    /// Elements of the current page, deleted ones included.
    pub fn get_elements_including_deleted(&self) -> ElementsView {
        let page_id = self.current_page_id();
        let state = self.inner.state.borrow();
        let range = pages::page_run_range(page_id.as_deref(), &state.elements, false);
        ElementsView::new(Rc::clone(&state.elements), range)
    }

    /// Live elements of the current page.
    pub fn get_non_deleted_elements(&self) -> ElementsView {
        let page_id = self.current_page_id();
        let state = self.inner.state.borrow();
        let range = pages::page_run_range(page_id.as_deref(), &state.non_deleted, false);
        ElementsView::new(Rc::clone(&state.non_deleted), range)
    }

    /// Every element of every page, deleted ones included.
    pub fn get_document_elements_including_deleted(&self) -> ElementsView {
        ElementsView::whole(Rc::clone(&self.inner.state.borrow().elements))
    }

    /// Every live element of every page.
    pub fn get_non_deleted_document_elements(&self) -> ElementsView {
        ElementsView::whole(Rc::clone(&self.inner.state.borrow().non_deleted))
    }

    pub fn get_element(&self, id: &str) -> Option<Element> {
        let state = self.inner.state.borrow();
        state
            .elements_map
            .get(id)
            .map(|&position| state.elements[position].clone())
    }

    pub fn get_non_deleted_element(&self, id: &str) -> Option<Element> {
        self.get_element(id).filter(Element::is_non_deleted)
    }

    /// Live page ids in document order.
    pub fn page_ids(&self) -> Vec<ElementId> {
        self.inner.state.borrow().pages.clone()
    }

    /// Page boundaries of the current sequence.
    pub fn page_index(&self) -> PageIndex {
        self.inner.state.borrow().page_index.clone()
    }

    /// Ids that occurred more than once in the last replace.
    pub fn duplicate_element_ids(&self) -> Vec<ElementId> {
        self.inner.state.borrow().duplicate_ids.clone()
    }

    /// Sum of element versions across the document.
    pub fn scene_version(&self) -> u64 {
        element::get_scene_version(&self.inner.state.borrow().elements)
    }

    // --- Navigation ---

    /// The page after the current one; the current page when it is the last.
    pub fn get_next_page_id(&self) -> Option<ElementId> {
        let current = self.current_page_id();
        let current_id = current.as_deref()?;
        let state = self.inner.state.borrow();
        match state.pages.iter().position(|id| id == current_id) {
            Some(position) => state.pages.get(position + 1).cloned().or(current),
            None => current,
        }
    }

    /// The page before the current one; the current page when it is the first.
    pub fn get_prev_page_id(&self) -> Option<ElementId> {
        let current = self.current_page_id();
        let current_id = current.as_deref()?;
        let state = self.inner.state.borrow();
        match state.pages.iter().position(|id| id == current_id) {
            Some(position) => position
                .checked_sub(1)
                .and_then(|prev| state.pages.get(prev))
                .cloned()
                .or(current),
            None => current,
        }
    }

    // --- Mutation ---

    /// Replace the elements of the current page.
    ///
    /// Without a current page this replaces the whole document.
    pub fn replace_all_elements(&self, next: Vec<Element>) -> Result<(), SceneError> {
        self.replace(next, false)
    }

    /// Replace the whole document sequence.
    pub fn replace_all_document_elements(&self, next: Vec<Element>) -> Result<(), SceneError> {
        self.replace(next, true)
    }

    fn replace(&self, next: Vec<Element>, all_pages: bool) -> Result<(), SceneError> {
        if self.is_destroyed() {
            return Err(SceneError::Destroyed);
        }

        let page_id = self.current_page_id();
        let elements = match page_id {
            Some(page_id) if !all_pages => {
                let state = self.inner.state.borrow();
                if pages::find_page_element(Some(page_id.as_str()), &state.elements).is_none() {
                    log::warn!(
                        "Scene {:?}: current page {} does not exist, dropping {} elements",
                        self.inner.id,
                        page_id,
                        next.len()
                    );
                } else {
                    log::debug!("Replacing {} elements on page {}", next.len(), page_id);
                }
                pages::replace_elements_on_page(&page_id, &next, &state.elements)
            }
            _ => {
                log::debug!("Replacing all {} elements", next.len());
                next
            }
        };

        self.commit(elements);
        Ok(())
    }

    fn commit(&self, elements: Vec<Element>) {
        let state = SceneState::derive(elements);
        let registered = Rc::clone(&state.elements);
        let duplicates = state.duplicate_ids.len();
        *self.inner.state.borrow_mut() = state;

        SceneRegistry::with_global(|registry| {
            registry.purge(self.inner.id);
            for el in registered.iter() {
                registry.register(el, self);
            }
        });

        self.inform_mutation();

        if duplicates > 0 {
            log::warn!(
                "Scene {:?} got {} duplicated element ids: {:?}",
                self.inner.id,
                duplicates,
                self.inner.state.borrow().duplicate_ids
            );
        }
    }

    /// Call every subscriber in registration order.
    ///
    /// Subscribers may read the scene. A subscriber that replaces elements on
    /// the same scene re-enters this notification.
    pub fn inform_mutation(&self) {
        let callbacks: Vec<SceneCallback> = self.inner.callbacks.borrow().clone();
        for callback in callbacks {
            callback();
        }
    }

    /// Subscribe to mutations. Registering the same callback twice is an error.
    pub fn add_callback(&self, callback: SceneCallback) -> Result<CallbackRemover, SceneError> {
        let mut callbacks = self.inner.callbacks.borrow_mut();
        if callbacks.iter().any(|cb| Rc::ptr_eq(cb, &callback)) {
            return Err(SceneError::CallbackAlreadyRegistered);
        }
        callbacks.push(Rc::clone(&callback));
        Ok(CallbackRemover {
            scene: self.downgrade(),
            callback,
        })
    }

    /// Release the scene: purge its registry entries and drop all callbacks.
    ///
    /// Later replace calls fail with [`SceneError::Destroyed`].
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            log::warn!("Scene {:?} destroyed twice", self.inner.id);
            return;
        }
        let purged = SceneRegistry::with_global(|registry| registry.purge(self.inner.id));
        log::debug!("Scene {:?} destroyed, {} registry entries purged", self.inner.id, purged);
        self.inner.callbacks.borrow_mut().clear();
    }
}

/// Unsubscribes a callback from the scene it was added to.
pub struct CallbackRemover {
    scene: Weak<SceneInner>,
    callback: SceneCallback,
}

impl fmt::Debug for CallbackRemover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRemover")
            .field("scene_alive", &(self.scene.strong_count() > 0))
            .finish()
    }
}

impl CallbackRemover {
    /// Remove the callback. Removing it a second time is an error.
    pub fn remove(&self) -> Result<(), SceneError> {
        let inner = self.scene.upgrade().ok_or(SceneError::CallbackNotRegistered)?;
        let mut callbacks = inner.callbacks.borrow_mut();
        let position = callbacks
            .iter()
            .position(|cb| Rc::ptr_eq(cb, &self.callback))
            .ok_or(SceneError::CallbackNotRegistered)?;
        callbacks.remove(position);
        Ok(())
    }
}
