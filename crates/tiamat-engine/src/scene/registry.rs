use std::sync::{Arc, Weak};

use super::Shape;

/// Ordered collection of live shape references.
///
/// Invariants:
/// - a shape appears at most once (pointer identity)
/// - each entry carries its registration index, so equal-priority shapes
///   keep registration order through the stable rebuild sort
///
/// The registry never owns a shape. Entries whose host dropped the entity
/// are pruned on the next [`collect_live`](Self::collect_live) pass and
/// count as a topology change.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    entries: Vec<Entry>,
    next_order: u32,
    generation: u64,
}

#[derive(Debug)]
struct Entry {
    shape: Weak<Shape>,
    order: u32,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape if not already present. Returns whether it was added.
    pub fn register(&mut self, shape: &Arc<Shape>) -> bool {
        if self.contains(shape) {
            return false;
        }

        self.entries.push(Entry {
            shape: Arc::downgrade(shape),
            order: self.next_order,
        });
        self.next_order = self.next_order.wrapping_add(1);
        self.bump();
        true
    }

    /// Removes a shape if present. Returns whether anything was removed.
    ///
    /// A miss is a plain no-op: the topology generation is untouched, so no
    /// rebuild is triggered.
    pub fn deregister(&mut self, shape: &Arc<Shape>) -> bool {
        let target = Arc::downgrade(shape);
        let before = self.entries.len();
        self.entries.retain(|e| !e.shape.ptr_eq(&target));

        if self.entries.len() != before {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Marks the topology dirty without an add/remove.
    ///
    /// Callers mutating a registered shape's `priority`, `operation` or
    /// other static record fields must invoke this for the change to reach
    /// the GPU records.
    pub fn notify_topology_changed(&mut self) {
        self.bump();
    }

    pub fn contains(&self, shape: &Arc<Shape>) -> bool {
        let target = Arc::downgrade(shape);
        self.entries.iter().any(|e| e.shape.ptr_eq(&target))
    }

    /// Current topology generation. Bumped by every register/deregister/
    /// notify and by dead-entry pruning.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of entries, dead or alive. The post-rebuild record count uses
    /// the live count from [`collect_live`](Self::collect_live).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upgrades all entries in registration order, pruning the dead ones.
    ///
    /// Pruning bumps the generation: a shape dropped without deregistering
    /// is a topology change like any other.
    pub fn collect_live(&mut self) -> Vec<(Arc<Shape>, u32)> {
        let mut live = Vec::with_capacity(self.entries.len());
        let before = self.entries.len();

        self.entries.retain(|e| match e.shape.upgrade() {
            Some(shape) => {
                live.push((shape, e.order));
                true
            }
            None => false,
        });

        if self.entries.len() != before {
            self.bump();
        }

        live
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ShapeDesc, ShapeKind};

    fn shape(priority: i32) -> Arc<Shape> {
        Arc::new(Shape::new(
            ShapeKind::Sphere,
            ShapeDesc { priority, ..Default::default() },
        ))
    }

    // ── register / deregister ─────────────────────────────────────────────

    #[test]
    fn register_rejects_duplicates() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);

        assert!(reg.register(&a));
        assert!(!reg.register(&a));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn deregister_missing_is_a_no_op() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);
        let b = shape(1);
        reg.register(&a);

        let generation = reg.generation();
        assert!(!reg.deregister(&b));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.generation(), generation);
    }

    #[test]
    fn deregister_removes_and_bumps_generation() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);
        reg.register(&a);

        let generation = reg.generation();
        assert!(reg.deregister(&a));
        assert!(reg.is_empty());
        assert_ne!(reg.generation(), generation);
    }

    // ── topology generation ───────────────────────────────────────────────

    #[test]
    fn notify_bumps_generation_without_membership_change() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);
        reg.register(&a);

        let generation = reg.generation();
        reg.notify_topology_changed();
        assert_ne!(reg.generation(), generation);
        assert_eq!(reg.len(), 1);
    }

    // ── collect_live ──────────────────────────────────────────────────────

    #[test]
    fn collect_live_preserves_registration_order() {
        let mut reg = ShapeRegistry::new();
        let a = shape(5);
        let b = shape(1);
        reg.register(&a);
        reg.register(&b);

        let live = reg.collect_live();
        assert_eq!(live.len(), 2);
        assert!(Arc::ptr_eq(&live[0].0, &a));
        assert!(Arc::ptr_eq(&live[1].0, &b));
        assert!(live[0].1 < live[1].1);
    }

    #[test]
    fn collect_live_prunes_dropped_shapes_as_topology_change() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);
        let b = shape(1);
        reg.register(&a);
        reg.register(&b);
        drop(b);

        let generation = reg.generation();
        let live = reg.collect_live();
        assert_eq!(live.len(), 1);
        assert_eq!(reg.len(), 1);
        assert_ne!(reg.generation(), generation);
    }
}
