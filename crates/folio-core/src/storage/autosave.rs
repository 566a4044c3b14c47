//! Periodic saving of the open document.

use crate::config::Settings;
use crate::document::Document;
use crate::scene::{CallbackRemover, Scene, SceneCallback, SceneError};
use crate::storage::{Storage, StorageResult};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key the most recently saved document is mirrored under.
pub const LAST_DOCUMENT_KEY: &str = "__last_document__";

/// Saves the open document once it has changed and the interval has passed.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Shared with the scene subscription.
    dirty: Rc<Cell<bool>>,
    current_doc_id: Option<String>,
    watching: Option<CallbackRemover>,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: Rc::new(Cell::new(false)),
            current_doc_id: None,
            watching: None,
        }
    }

    /// Manager saving at most every `settings.autosave_interval_secs`.
    pub fn with_settings(storage: Arc<S>, settings: &Settings) -> Self {
        Self::new(storage).with_interval(Duration::from_secs(settings.autosave_interval_secs))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the document dirty on every mutation of `scene`. Replaces any
    /// scene watched before.
    pub fn watch(&mut self, scene: &Scene) -> Result<(), SceneError> {
        self.unwatch();
        let dirty = Rc::clone(&self.dirty);
        let callback: SceneCallback = Rc::new(move || dirty.set(true));
        self.watching = Some(scene.add_callback(callback)?);
        Ok(())
    }

    /// Stop watching. A no-op when nothing is watched or the scene is gone.
    pub fn unwatch(&mut self) {
        if let Some(remover) = self.watching.take() {
            if let Err(e) = remover.remove() {
                log::debug!("Auto-save subscription already gone: {}", e);
            }
        }
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn set_document_id(&mut self, id: Option<String>) {
        self.current_doc_id = id;
    }

    pub fn document_id(&self) -> Option<&str> {
        self.current_doc_id.as_deref()
    }

    /// Dirty, and never saved or saved at least one interval ago.
    pub fn should_save(&self) -> bool {
        self.is_dirty() && self.last_save.is_none_or(|last| last.elapsed() >= self.interval)
    }

    /// Save if [`should_save`](Self::should_save). Returns whether it saved.
    pub async fn maybe_save(&mut self, document: &Document) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(document).await?;
        Ok(true)
    }

    /// Save under the current document id (or the document's own), and
    /// mirror it under [`LAST_DOCUMENT_KEY`].
    pub async fn save(&mut self, document: &Document) -> StorageResult<()> {
        let doc_id = self
            .current_doc_id
            .clone()
            .unwrap_or_else(|| document.id.clone());

        self.storage.save(&doc_id, document).await?;
        self.storage.save(LAST_DOCUMENT_KEY, document).await?;

        log::debug!("Auto-saved document {}", doc_id);
        self.current_doc_id = Some(doc_id);
        self.last_save = Some(Instant::now());
        self.dirty.set(false);
        Ok(())
    }

    /// Save the whole document held by `scene`.
    pub async fn save_scene(&mut self, scene: &Scene, name: &str) -> StorageResult<()> {
        let id = self
            .current_doc_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let document = scene.to_document(id, name);
        self.save(&document).await
    }

    pub async fn load(&mut self, id: &str) -> StorageResult<Document> {
        let doc = self.storage.load(id).await?;
        self.opened(id.to_string());
        Ok(doc)
    }

    /// The last saved document, if any.
    pub async fn load_last(&mut self) -> Option<Document> {
        match self.storage.load(LAST_DOCUMENT_KEY).await {
            Ok(doc) => {
                self.opened(doc.id.clone());
                Some(doc)
            }
            Err(e) => {
                log::debug!("No last document: {}", e);
                None
            }
        }
    }

    fn opened(&mut self, id: String) {
        self.current_doc_id = Some(id);
        self.dirty.set(false);
        self.last_save = Some(Instant::now());
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// Saved document ids, without [`LAST_DOCUMENT_KEY`].
    pub async fn list_documents(&self) -> StorageResult<Vec<String>> {
        let mut docs = self.storage.list().await?;
        docs.retain(|id| id != LAST_DOCUMENT_KEY);
        Ok(docs)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        self.storage.exists(id).await
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

impl<S: Storage> Drop for AutoSaveManager<S> {
    fn drop(&mut self) {
        self.unwatch();
    }
}
