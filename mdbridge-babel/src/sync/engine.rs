//! The document engine seam.
//!
//! The host editor owns the live tree and its transaction machinery. The sync
//! controller only needs to read the tree, replace it wholesale on import and
//! hear about changes; [`DocumentEngine`] is that contract. [`MemoryEngine`] is
//! a plain in-memory implementation used by the CLI and the tests.

use crate::model::DocumentNode;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type ChangeListener = Box<dyn FnMut()>;

pub trait DocumentEngine {
    /// Snapshot of the current tree.
    fn tree(&self) -> DocumentNode;

    /// Replace the whole tree. Fires change listeners.
    fn replace_tree(&mut self, tree: DocumentNode);

    /// Register a listener called after every change.
    fn on_change(&mut self, listener: ChangeListener) -> Subscription;
}

/// Handle to a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn detached() -> Self {
        Subscription { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, ChangeListener)>,
    notifying: bool,
    removed_while_notifying: Vec<u64>,
}

impl Listeners {
    fn remove(&mut self, id: u64) {
        if self.notifying {
            self.removed_while_notifying.push(id);
        }
        self.entries.retain(|(entry, _)| *entry != id);
    }
}

/// In-memory [`DocumentEngine`].
///
/// Clones are handles to the same document, so a host can keep one to make
/// edits while the controller owns another.
#[derive(Clone)]
pub struct MemoryEngine {
    tree: Rc<RefCell<DocumentNode>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl MemoryEngine {
    pub fn new(tree: DocumentNode) -> Self {
        MemoryEngine {
            tree: Rc::new(RefCell::new(tree)),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// Mutate the tree in place, then notify listeners.
    pub fn apply(&self, edit: impl FnOnce(&mut DocumentNode)) {
        edit(&mut self.tree.borrow_mut());
        self.notify();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    fn notify(&self) {
        // Listeners run with the list taken out so they may subscribe,
        // unsubscribe or read the tree.
        let mut running = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.notifying = true;
            std::mem::take(&mut listeners.entries)
        };
        for (_, listener) in running.iter_mut() {
            listener();
        }
        let mut listeners = self.listeners.borrow_mut();
        let removed = std::mem::take(&mut listeners.removed_while_notifying);
        running.retain(|(id, _)| !removed.contains(id));
        let added = std::mem::take(&mut listeners.entries);
        running.extend(added);
        listeners.entries = running;
        listeners.notifying = false;
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(DocumentNode::doc(Vec::new()))
    }
}

impl DocumentEngine for MemoryEngine {
    fn tree(&self) -> DocumentNode {
        self.tree.borrow().clone()
    }

    fn replace_tree(&mut self, tree: DocumentNode) {
        *self.tree.borrow_mut() = tree;
        self.notify();
    }

    fn on_change(&mut self, listener: ChangeListener) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, listener));
            id
        };
        let weak: Weak<RefCell<Listeners>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.borrow_mut().remove(id);
            }
        })
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("tree", &self.tree.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter(engine: &mut MemoryEngine) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();
        let subscription = engine.on_change(Box::new(move || seen.set(seen.get() + 1)));
        (hits, subscription)
    }

    #[test]
    fn edits_and_replacements_notify() {
        let mut engine = MemoryEngine::default();
        let (hits, _subscription) = counter(&mut engine);
        engine.apply(|tree| tree.content.push(DocumentNode::paragraph(Vec::new())));
        engine.replace_tree(DocumentNode::doc(Vec::new()));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn dropping_the_subscription_unsubscribes() {
        let mut engine = MemoryEngine::default();
        let (hits, subscription) = counter(&mut engine);
        drop(subscription);
        engine.apply(|_| {});
        assert_eq!(hits.get(), 0);
        assert_eq!(engine.listener_count(), 0);
    }

    #[test]
    fn clones_share_the_document() {
        let engine = MemoryEngine::default();
        let host = engine.clone();
        host.apply(|tree| tree.content.push(DocumentNode::paragraph(Vec::new())));
        assert_eq!(engine.tree().content.len(), 1);
    }

    #[test]
    fn listener_may_unsubscribe_during_notify() {
        let mut engine = MemoryEngine::default();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));
        let (inner_slot, inner_hits) = (slot.clone(), hits.clone());
        let subscription = engine.on_change(Box::new(move || {
            inner_hits.set(inner_hits.get() + 1);
            inner_slot.borrow_mut().take();
        }));
        *slot.borrow_mut() = Some(subscription);
        engine.apply(|_| {});
        engine.apply(|_| {});
        assert_eq!(hits.get(), 1);
        assert_eq!(engine.listener_count(), 0);
    }
}
