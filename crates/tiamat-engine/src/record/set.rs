use std::sync::Weak;

use crate::scene::{Priority, Shape, ShapeRegistry, SortKey};

use super::ShapeRecord;

/// The record array mirrored to the GPU, plus the sorted shape handles the
/// per-frame refresh walks.
///
/// Invariants after `rebuild`:
/// - `records.len()` equals the registry's live entry count
/// - records are sorted by ascending priority, registration order breaking
///   ties (stable)
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<ShapeRecord>,
    /// Sorted parallel to `records`. Weak so the set never extends a shape's
    /// lifetime past its host.
    handles: Vec<Weak<Shape>>,
    built_generation: Option<u64>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the registry's topology moved past what this set was built
    /// from. A never-built set always needs a rebuild.
    pub fn needs_rebuild(&self, registry: &ShapeRegistry) -> bool {
        self.built_generation != Some(registry.generation())
    }

    /// Full rebuild: prune dead entries, stable-sort by priority, repack
    /// every record. O(n log n); runs only on topology changes.
    pub fn rebuild(&mut self, registry: &mut ShapeRegistry) {
        let mut live = registry.collect_live();
        live.sort_by_key(|(shape, order)| SortKey::new(Priority::new(shape.desc().priority), *order));

        self.records.clear();
        self.handles.clear();
        self.records.reserve(live.len());
        self.handles.reserve(live.len());

        for (shape, _) in &live {
            self.records.push(ShapeRecord::from_shape(shape));
            self.handles.push(std::sync::Arc::downgrade(shape));
        }

        // Read after collect_live: pruning may have bumped the generation.
        self.built_generation = Some(registry.generation());
    }

    /// Per-frame transform refresh. No sort, no allocation.
    ///
    /// A shape dropped since the last rebuild keeps its stale transform for
    /// the frame; the next rebuild removes its record entirely.
    pub fn refresh(&mut self) {
        for (record, handle) in self.records.iter_mut().zip(&self.handles) {
            if let Some(shape) = handle.upgrade() {
                record.refresh_transform(&shape);
            }
        }
    }

    #[inline]
    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coords::Vec3;
    use crate::scene::{CsgOp, ShapeDesc, ShapeKind, Transform};

    fn shape(priority: i32) -> Arc<Shape> {
        Arc::new(Shape::new(
            ShapeKind::Sphere,
            ShapeDesc { priority, ..Default::default() },
        ))
    }

    fn tags(set: &RecordSet) -> Vec<i32> {
        // Tests tag each shape's position.x with its priority so record
        // order is observable from the packed output.
        set.records().iter().map(|r| r.position[0] as i32).collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn rebuild_sorts_by_priority_with_stable_ties() {
        // Registration order: A(5), B(1), C(5). Expected record order:
        // B, A, C: ascending priority, ties keep registration order.
        let mut reg = ShapeRegistry::new();
        let a = shape(5);
        let b = shape(1);
        let c = shape(5);

        // Tag positions so the records are distinguishable.
        a.set_position(Vec3::new(5.0, 0.0, 0.0));
        b.set_position(Vec3::new(1.0, 0.0, 0.0));
        c.set_position(Vec3::new(5.0, 0.0, 1.0));

        reg.register(&a);
        reg.register(&b);
        reg.register(&c);

        let mut set = RecordSet::new();
        set.rebuild(&mut reg);

        assert_eq!(tags(&set), vec![1, 5, 5]);
        assert_eq!(set.records()[1].position[2], 0.0); // A before C
        assert_eq!(set.records()[2].position[2], 1.0);
    }

    #[test]
    fn rebuild_count_matches_live_registry() {
        let mut reg = ShapeRegistry::new();
        let shapes: Vec<_> = (0..4).map(shape).collect();
        for s in &shapes {
            reg.register(s);
        }

        let mut set = RecordSet::new();
        set.rebuild(&mut reg);
        assert_eq!(set.len(), 4);

        reg.deregister(&shapes[2]);
        set.rebuild(&mut reg);
        assert_eq!(set.len(), 3);
    }

    // ── rebuild triggering ────────────────────────────────────────────────

    #[test]
    fn needs_rebuild_follows_topology_generation() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);
        reg.register(&a);

        let mut set = RecordSet::new();
        assert!(set.needs_rebuild(&reg));

        set.rebuild(&mut reg);
        assert!(!set.needs_rebuild(&reg));

        reg.notify_topology_changed();
        assert!(set.needs_rebuild(&reg));
    }

    #[test]
    fn rebuild_after_prune_settles_the_generation() {
        let mut reg = ShapeRegistry::new();
        let a = shape(0);
        let b = shape(1);
        reg.register(&a);
        reg.register(&b);
        drop(b);

        let mut set = RecordSet::new();
        set.rebuild(&mut reg);

        // collect_live pruned mid-rebuild and bumped the generation; the
        // set must have recorded the post-prune value.
        assert_eq!(set.len(), 1);
        assert!(!set.needs_rebuild(&reg));
    }

    // ── refresh ───────────────────────────────────────────────────────────

    #[test]
    fn refresh_updates_transforms_in_place_without_resort() {
        let mut reg = ShapeRegistry::new();
        let a = shape(5);
        let b = shape(1);
        reg.register(&a);
        reg.register(&b);

        let mut set = RecordSet::new();
        set.rebuild(&mut reg);

        a.set_transform(Transform {
            position: Vec3::new(0.0, 9.0, 0.0),
            rotation: Vec3::new(0.0, 1.5, 0.0),
        });
        set.refresh();

        // b (priority 1) still first; a's record picked up the new transform.
        assert_eq!(set.records()[0].position[1], 0.0);
        assert_eq!(set.records()[1].position[1], 9.0);
        assert_eq!(set.records()[1].rotation[1], 1.5);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn refresh_leaves_static_fields_untouched() {
        let mut reg = ShapeRegistry::new();
        let a = shape(3);
        a.set_operation(CsgOp::Subtraction);
        reg.register(&a);

        let mut set = RecordSet::new();
        set.rebuild(&mut reg);

        // Static-field change without notify: refresh must not pick it up.
        a.set_operation(CsgOp::Intersection);
        set.refresh();
        assert_eq!(set.records()[0].operation, CsgOp::Subtraction.encode());

        // After notify + rebuild it lands.
        reg.notify_topology_changed();
        assert!(set.needs_rebuild(&reg));
        set.rebuild(&mut reg);
        assert_eq!(set.records()[0].operation, CsgOp::Intersection.encode());
    }
}
