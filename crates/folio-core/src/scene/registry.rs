//! Lookup from elements and element ids back to the scene that owns them.
//!
//! Some consumers, such as an inline text editor, only keep an element id
//! around after the element value has been replaced by a newer version. They
//! resolve the owning scene here instead of holding on to a scene handle.
//!
//! Entries hold weak references, so the registry never keeps a scene alive.
//! A scene purges its entries on `destroy` and again when its last handle is
//! dropped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use crate::element::{Element, ElementId};

use super::{Scene, SceneId, SceneInner};

/// Key used to look up a scene: an element, or a bare id.
#[derive(Debug, Clone, Copy)]
pub enum ElementKey<'a> {
    Element(&'a Element),
    Id(&'a str),
}

impl ElementKey<'_> {
    /// The id this key resolves by.
    pub fn id(&self) -> &str {
        match self {
            ElementKey::Element(element) => &element.id,
            ElementKey::Id(id) => id,
        }
    }
}

impl<'a> From<&'a Element> for ElementKey<'a> {
    fn from(element: &'a Element) -> Self {
        ElementKey::Element(element)
    }
}

impl<'a> From<&'a str> for ElementKey<'a> {
    fn from(id: &'a str) -> Self {
        ElementKey::Id(id)
    }
}

impl<'a> From<&'a ElementId> for ElementKey<'a> {
    fn from(id: &'a ElementId) -> Self {
        ElementKey::Id(id.as_str())
    }
}

#[derive(Debug)]
struct Entry {
    scene: SceneId,
    handle: Weak<SceneInner>,
}

/// Maps element ids to the scene that currently owns them.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    by_id: HashMap<ElementId, Entry>,
}

thread_local! {
    static GLOBAL_REGISTRY: RefCell<SceneRegistry> = RefCell::new(SceneRegistry::new());
}

impl SceneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the registry shared by every scene on this thread.
    pub fn with_global<R>(f: impl FnOnce(&mut SceneRegistry) -> R) -> R {
        GLOBAL_REGISTRY.with(|registry| f(&mut registry.borrow_mut()))
    }

    /// Record that `scene` owns the keyed element. Replaces any previous owner.
    pub fn register<'a>(&mut self, key: impl Into<ElementKey<'a>>, scene: &Scene) {
        self.by_id.insert(
            key.into().id().to_string(),
            Entry {
                scene: scene.id(),
                handle: scene.downgrade(),
            },
        );
    }

    /// The live scene that owns the keyed element, if any.
    pub fn resolve<'a>(&self, key: impl Into<ElementKey<'a>>) -> Option<Scene> {
        let entry = self.by_id.get(key.into().id())?;
        Scene::upgrade(&entry.handle).filter(|scene| !scene.is_destroyed())
    }

    /// Drop every entry that points at `scene`. Returns how many were removed.
    pub fn purge(&mut self, scene: SceneId) -> usize {
        let before = self.by_id.len();
        self.by_id.retain(|_, entry| entry.scene != scene);
        before - self.by_id.len()
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Purge from the thread's registry without panicking during thread teardown
/// or while the registry is already borrowed.
pub(super) fn purge_global(scene: SceneId) {
    let _ = GLOBAL_REGISTRY.try_with(|registry| {
        if let Ok(mut registry) = registry.try_borrow_mut() {
            registry.purge(scene);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    #[test]
    fn test_register_and_resolve_by_id_and_element() {
        let scene = Scene::new();
        let element = Element::page().with_id("p");
        let mut registry = SceneRegistry::new();

        registry.register(&element, &scene);
        assert_eq!(registry.resolve("p"), Some(scene.clone()));
        assert_eq!(registry.resolve(&element), Some(scene));
        assert!(registry.resolve("other").is_none());
    }

    #[test]
    fn test_latest_registration_wins() {
        let first = Scene::new();
        let second = Scene::new();
        let mut registry = SceneRegistry::new();

        registry.register("el", &first);
        registry.register("el", &second);
        assert_eq!(registry.resolve("el"), Some(second));
    }

    #[test]
    fn test_purge_removes_only_that_scene() {
        let keep = Scene::new();
        let gone = Scene::new();
        let mut registry = SceneRegistry::new();

        registry.register("a", &keep);
        registry.register("b", &gone);
        registry.register("c", &gone);

        assert_eq!(registry.purge(gone.id()), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("b").is_none());
        assert_eq!(registry.resolve("a"), Some(keep));
    }

    #[test]
    fn test_dropped_scene_does_not_resolve() {
        let mut registry = SceneRegistry::new();
        {
            let scene = Scene::new();
            registry.register("a", &scene);
        }
        assert!(registry.resolve("a").is_none());
    }
}
