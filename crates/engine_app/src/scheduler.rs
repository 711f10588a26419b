//! Component scheduler: family buckets and the deferred lifecycle queues.
//!
//! Components are updated family by family. Additions, removals and entity
//! destructions requested during a tick are queued and only applied at the
//! head of the next tick, so the bucket set never changes under an update
//! pass.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use engine_component::Entity;

use crate::world::Slot;

/// Live components grouped by family, plus pending lifecycle changes.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Admitted components. Families iterate in sorted order, components in
    /// admission order.
    buckets: BTreeMap<String, Vec<Rc<Slot>>>,
    /// Registered since the last admission.
    pending: Vec<Rc<Slot>>,
    /// Queued for removal.
    removed: Vec<Rc<Slot>>,
    /// Entities queued for destruction.
    destroyed: Vec<Entity>,
}

impl Scheduler {
    /// Create a new empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a freshly attached component for admission at the next tick.
    pub fn register(&mut self, slot: Rc<Slot>) {
        trace!(component = %slot.id(), selector = %slot.selector(), "component registered");
        self.pending.push(slot);
    }

    /// Releases a component and queues it for removal.
    pub fn remove(&mut self, slot: Rc<Slot>) {
        slot.release();
        self.removed.push(slot);
    }

    /// Queues an entity for destruction at the next tick.
    pub fn queue_destroy(&mut self, entity: Entity) {
        if !self.destroyed.contains(&entity) {
            self.destroyed.push(entity);
        }
    }

    /// Takes the entities queued for destruction.
    pub fn take_destroyed(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.destroyed)
    }

    /// Erases queued components from their buckets and from the pending
    /// queue. The erased components are handed back so the caller can drop
    /// them outside any borrow.
    pub fn flush_removed(&mut self) -> Vec<Rc<Slot>> {
        let removed = std::mem::take(&mut self.removed);
        if removed.is_empty() {
            return removed;
        }
        let gone = |slot: &Rc<Slot>| removed.iter().any(|r| Rc::ptr_eq(r, slot));
        for bucket in self.buckets.values_mut() {
            bucket.retain(|slot| !gone(slot));
        }
        self.pending.retain(|slot| !gone(slot));
        self.buckets.retain(|family, bucket| {
            if bucket.is_empty() {
                debug!(family, "family emptied");
            }
            !bucket.is_empty()
        });
        removed
    }

    /// Moves pending components into their family buckets. Components
    /// released before admission are dropped.
    pub fn admit(&mut self) -> usize {
        let mut admitted = 0;
        for slot in std::mem::take(&mut self.pending) {
            if slot.is_released() {
                continue;
            }
            self.buckets
                .entry(slot.family().to_string())
                .or_default()
                .push(slot);
            admitted += 1;
        }
        admitted
    }

    /// Every admitted component in update order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rc<Slot>> {
        self.buckets.values().flatten().cloned().collect()
    }

    /// Returns `true` when no component is admitted or waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.buckets.is_empty() && self.pending.is_empty()
    }

    /// Returns the number of families with admitted components.
    #[must_use]
    pub fn family_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of admitted components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns the number of components waiting for admission.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
