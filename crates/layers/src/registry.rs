//! Depth-ordered set of mounted layers.
//!
//! The registry never owns a layer: entries are weak references keyed by the
//! layer's allocation, so a layer lives exactly as long as its owner keeps
//! it. The sorted order is derived lazily and memoised on a version counter
//! that every mutation bumps.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use foundation::{Arena, Handle};
use tracing::debug;

use crate::layer::{LayerId, MapLayer};

struct Entry {
    layer: Weak<dyn MapLayer>,
    key: usize,
    id: LayerId,
    z_index: i32,
    seq: u64,
    hit_test: bool,
}

#[derive(Default)]
pub struct LayerRegistry {
    entries: Arena<Entry>,
    next_seq: u64,
    version: u64,
    order: RefCell<Option<(u64, Vec<Handle>)>>,
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("len", &self.entries.len())
            .field("version", &self.version)
            .finish()
    }
}

fn identity(layer: &Rc<dyn MapLayer>) -> usize {
    Rc::as_ptr(layer) as *const () as usize
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped on every effective register / unregister.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, layer: &Rc<dyn MapLayer>) -> bool {
        self.find(identity(layer)).is_some()
    }

    /// Adds `layer`. Registering the same layer twice is a no-op; returns
    /// whether the layer was added.
    pub fn register(&mut self, layer: &Rc<dyn MapLayer>) -> bool {
        self.prune();
        let key = identity(layer);
        if self.find(key).is_some() {
            return false;
        }
        let entry = Entry {
            layer: Rc::downgrade(layer),
            key,
            id: layer.id(),
            z_index: layer.z_index(),
            seq: self.next_seq,
            hit_test: layer.capabilities().hit_test,
        };
        self.next_seq += 1;
        self.entries.insert(entry);
        self.version += 1;
        debug!(
            layer = layer.id().0,
            z_index = layer.z_index(),
            version = self.version,
            "layer registered"
        );
        true
    }

    /// Removes `layer`; returns false when it was not registered.
    pub fn unregister(&mut self, layer: &Rc<dyn MapLayer>) -> bool {
        self.prune();
        let Some(handle) = self.find(identity(layer)) else {
            return false;
        };
        let removed = self.entries.remove(handle);
        self.version += 1;
        if let Some(entry) = removed {
            debug!(
                layer = entry.id.0,
                z_index = entry.z_index,
                version = self.version,
                "layer unregistered"
            );
        }
        true
    }

    /// Live layers, top first: descending z-index, ties in registration order.
    pub fn ordered_layers(&self) -> Vec<Rc<dyn MapLayer>> {
        self.sorted()
            .into_iter()
            .filter_map(|h| self.entries.get(h)?.layer.upgrade())
            .collect()
    }

    /// Live layers that opted into hit-testing, top first.
    pub fn hit_test_layers(&self) -> Vec<Rc<dyn MapLayer>> {
        self.sorted()
            .into_iter()
            .filter_map(|h| {
                let entry = self.entries.get(h)?;
                if entry.hit_test {
                    entry.layer.upgrade()
                } else {
                    None
                }
            })
            .collect()
    }

    /// Live layers, bottom first; the reverse of `ordered_layers`.
    pub fn draw_order(&self) -> Vec<Rc<dyn MapLayer>> {
        let mut layers = self.ordered_layers();
        layers.reverse();
        layers
    }

    fn find(&self, key: usize) -> Option<Handle> {
        self.entries
            .iter()
            .find(|(_, e)| e.key == key)
            .map(|(h, _)| h)
    }

    fn sorted(&self) -> Vec<Handle> {
        if let Some((version, order)) = self.order.borrow().as_ref()
            && *version == self.version
        {
            return order.clone();
        }
        let mut keyed: Vec<(i32, u64, Handle)> = self
            .entries
            .iter()
            .map(|(h, e)| (e.z_index, e.seq, h))
            .collect();
        keyed.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let order: Vec<Handle> = keyed.into_iter().map(|(_, _, h)| h).collect();
        debug!(version = self.version, layers = order.len(), "layer order rebuilt");
        *self.order.borrow_mut() = Some((self.version, order.clone()));
        order
    }

    /// Drops entries whose layer has been dropped by its owner.
    fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|e| e.layer.strong_count() > 0);
        if self.entries.len() != before {
            self.version += 1;
            debug!(
                pruned = before - self.entries.len(),
                version = self.version,
                "dropped layers pruned"
            );
        }
    }
}
