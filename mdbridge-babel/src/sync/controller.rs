//! Debounced Markdown export bound to one document engine.

use super::clock::{Clock, SystemClock};
use super::engine::{DocumentEngine, Subscription};
use crate::extensions::ExtensionRegistry;
use crate::flavor::Flavor;
use crate::formats::markdown::{parse_markdown, serialize_markdown};
use crate::model::DocumentNode;
use crate::transforms::transform_diagrams;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Sync behaviour knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Quiet period after the last edit before exporting. Zero exports on every edit.
    pub debounce_ms: u64,

    /// Rewrite diagram-language code fences into `diagram` nodes on import.
    pub transform_diagrams_on_import: bool,

    /// Output flavor for exports.
    pub flavor: Flavor,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            transform_diagrams_on_import: true,
            flavor: Flavor::Gfm,
        }
    }
}

#[derive(Debug, Default)]
struct SyncState {
    pending: bool,
    last_text: String,
    deadline: Option<Instant>,
    /// Tree written by the last import; a change event that still sees it is our own echo.
    imported: Option<DocumentNode>,
    destroyed: bool,
}

type ExportListener = Box<dyn FnMut(&str)>;

/// Keeps a Markdown rendering of a live document loosely up to date.
///
/// Edits arm a debounce deadline through [`handle_update`](Self::handle_update);
/// the host drives time by calling [`poll`](Self::poll). Imports through
/// [`set_markdown`](Self::set_markdown) are synchronous and never echo back as
/// an export.
pub struct SyncController<E: DocumentEngine, C: Clock = SystemClock> {
    engine: E,
    registry: Arc<ExtensionRegistry>,
    options: SyncOptions,
    clock: C,
    state: SyncState,
    listeners: Vec<ExportListener>,
    export_count: u64,
}

impl<E: DocumentEngine> SyncController<E, SystemClock> {
    pub fn new(engine: E, registry: Arc<ExtensionRegistry>, options: SyncOptions) -> Self {
        Self::with_clock(engine, registry, options, SystemClock)
    }
}

impl<E: DocumentEngine, C: Clock> SyncController<E, C> {
    pub fn with_clock(
        engine: E,
        registry: Arc<ExtensionRegistry>,
        options: SyncOptions,
        clock: C,
    ) -> Self {
        let last_text = serialize_markdown(&engine.tree(), &registry, options.flavor.config());
        SyncController {
            engine,
            registry,
            options,
            clock,
            state: SyncState {
                last_text,
                ..SyncState::default()
            },
            listeners: Vec::new(),
            export_count: 0,
        }
    }

    /// Note that the document changed.
    pub fn handle_update(&mut self) {
        if self.state.destroyed {
            return;
        }
        if let Some(imported) = self.state.imported.take() {
            if self.engine.tree() == imported {
                trace!("ignoring change event raised by import");
                return;
            }
        }
        if self.options.debounce_ms == 0 {
            self.export();
            return;
        }
        let deadline = self.clock.now() + Duration::from_millis(self.options.debounce_ms);
        if self.state.pending {
            trace!(debounce_ms = self.options.debounce_ms, "re-arming export deadline");
        }
        self.state.pending = true;
        self.state.deadline = Some(deadline);
    }

    /// Export if the deadline has passed. Returns whether an export ran.
    pub fn poll(&mut self) -> bool {
        if self.state.destroyed || !self.state.pending {
            return false;
        }
        match self.state.deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                self.export();
                true
            }
            _ => false,
        }
    }

    /// Time left before the armed export, `None` when idle.
    pub fn time_until_export(&self) -> Option<Duration> {
        if !self.state.pending {
            return None;
        }
        self.state
            .deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Export now, whether or not anything is pending.
    pub fn flush(&mut self) -> &str {
        if !self.state.destroyed {
            self.export();
        }
        &self.state.last_text
    }

    /// The most recently exported or imported Markdown.
    pub fn get_markdown(&self) -> &str {
        &self.state.last_text
    }

    /// Replace the document with parsed Markdown.
    ///
    /// Cancels any armed export; the cached text becomes `text` as given.
    pub fn set_markdown(&mut self, text: &str) {
        if self.state.destroyed {
            return;
        }
        let mut tree = parse_markdown(text, &self.registry);
        if self.options.transform_diagrams_on_import {
            tree = transform_diagrams(tree);
        }
        self.state.pending = false;
        self.state.deadline = None;
        self.state.last_text = text.to_string();
        if self.engine.tree() != tree {
            self.state.imported = Some(tree.clone());
            self.engine.replace_tree(tree);
        }
        debug!(bytes = text.len(), "imported markdown");
    }

    /// Cancel any armed export and stop reacting to anything.
    pub fn destroy(&mut self) {
        if self.state.destroyed {
            return;
        }
        self.state.destroyed = true;
        self.state.pending = false;
        self.state.deadline = None;
        self.state.imported = None;
        self.listeners.clear();
        debug!("sync controller destroyed");
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.destroyed
    }

    /// Call `listener` with the Markdown after every export.
    pub fn subscribe(&mut self, listener: impl FnMut(&str) + 'static) {
        if !self.state.destroyed {
            self.listeners.push(Box::new(listener));
        }
    }

    /// Flavor used by later exports.
    pub fn set_flavor(&mut self, flavor: Flavor) {
        self.options.flavor = flavor;
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn export_count(&self) -> u64 {
        self.export_count
    }

    fn export(&mut self) {
        let text = serialize_markdown(
            &self.engine.tree(),
            &self.registry,
            self.options.flavor.config(),
        );
        self.state.pending = false;
        self.state.deadline = None;
        self.state.last_text = text;
        self.export_count += 1;
        debug!(
            bytes = self.state.last_text.len(),
            flavor = %self.options.flavor,
            "exported markdown"
        );
        for listener in self.listeners.iter_mut() {
            listener(&self.state.last_text);
        }
    }
}

impl<E: DocumentEngine + 'static, C: Clock + 'static> SyncController<E, C> {
    /// Subscribe to the engine's change events and hand the controller over
    /// to a shared handle.
    pub fn attach(self) -> SharedSync<E, C> {
        SharedSync::new(self)
    }
}

/// A controller wired to its engine's change events.
///
/// Events that arrive while the controller is borrowed (an import replacing
/// the tree, an edit made through [`SharedSync::with`]) are queued and
/// delivered once the borrow ends.
pub struct SharedSync<E: DocumentEngine, C: Clock = SystemClock> {
    inner: Rc<RefCell<SyncController<E, C>>>,
    queued: Rc<Cell<bool>>,
    subscription: Option<Subscription>,
}

impl<E: DocumentEngine + 'static, C: Clock + 'static> SharedSync<E, C> {
    pub fn new(controller: SyncController<E, C>) -> Self {
        let inner = Rc::new(RefCell::new(controller));
        let queued = Rc::new(Cell::new(false));

        let weak = Rc::downgrade(&inner);
        let flag = queued.clone();
        let subscription = inner
            .borrow_mut()
            .engine_mut()
            .on_change(Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                match inner.try_borrow_mut() {
                    Ok(mut controller) => controller.handle_update(),
                    Err(_) => flag.set(true),
                };
            }));

        SharedSync {
            inner,
            queued,
            subscription: Some(subscription),
        }
    }

    /// Run `f` against the controller, then deliver any change event it caused.
    pub fn with<R>(&self, f: impl FnOnce(&mut SyncController<E, C>) -> R) -> R {
        let result = f(&mut *self.inner.borrow_mut());
        self.deliver_queued();
        result
    }

    pub fn set_markdown(&self, text: &str) {
        self.with(|controller| controller.set_markdown(text));
    }

    pub fn get_markdown(&self) -> String {
        self.inner.borrow().get_markdown().to_string()
    }

    pub fn flush(&self) -> String {
        self.with(|controller| controller.flush().to_string())
    }

    pub fn poll(&self) -> bool {
        self.with(SyncController::poll)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.borrow().is_pending()
    }

    /// Destroy the controller and stop listening to the engine.
    pub fn destroy(&mut self) {
        self.with(SyncController::destroy);
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    fn deliver_queued(&self) {
        if self.queued.replace(false) {
            if let Ok(mut controller) = self.inner.try_borrow_mut() {
                controller.handle_update();
            }
        }
    }
}
