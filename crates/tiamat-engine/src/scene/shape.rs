use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::coords::Vec3;
use crate::paint::Color;

/// Primitive geometry of a shape. Fixed at creation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    Sphere,
    Cuboid,
    Plane,
}

impl ShapeKind {
    /// Raw kernel-side discriminant.
    #[inline]
    pub const fn encode(self) -> i32 {
        match self {
            ShapeKind::Sphere => 0,
            ShapeKind::Cuboid => 1,
            ShapeKind::Plane => 2,
        }
    }

    /// Validates a raw discriminant coming back across the GPU boundary.
    #[inline]
    pub const fn decode(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(ShapeKind::Sphere),
            1 => Some(ShapeKind::Cuboid),
            2 => Some(ShapeKind::Plane),
            _ => None,
        }
    }
}

/// How a shape composites with the shapes preceding it in priority order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum CsgOp {
    #[default]
    Union,
    Subtraction,
    Intersection,
}

impl CsgOp {
    #[inline]
    pub const fn encode(self) -> i32 {
        match self {
            CsgOp::Union => 0,
            CsgOp::Subtraction => 1,
            CsgOp::Intersection => 2,
        }
    }

    #[inline]
    pub const fn decode(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(CsgOp::Union),
            1 => Some(CsgOp::Subtraction),
            2 => Some(CsgOp::Intersection),
            _ => None,
        }
    }
}

/// World transform of a shape.
///
/// Owned by the scene-graph host; the renderer reads it every frame and
/// never writes it.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X, then Y, then Z.
    pub rotation: Vec3,
}

/// Mutable portion of a shape, snapshot-copyable for record building.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapeDesc {
    pub operation: CsgOp,
    /// Ascending composite evaluation order.
    pub priority: i32,
    /// Radius (`Sphere`, x only), half-extents (`Cuboid`) or plane normal
    /// (`Plane`) depending on the shape's kind.
    pub dimensions: Vec3,
    /// Smooth-blend radius at composite boundaries. Non-negative.
    pub blend: f32,
    pub colour: Color,
    pub transform: Transform,
}

impl Default for ShapeDesc {
    fn default() -> Self {
        Self {
            operation: CsgOp::Union,
            priority: 0,
            dimensions: Vec3::splat(1.0),
            blend: 1.0,
            colour: Color::WHITE,
            transform: Transform::default(),
        }
    }
}

/// One implicit primitive in the scene.
///
/// The host owns the entity (`Arc<Shape>`); the registry keeps a `Weak`
/// reference only. Mutable fields sit behind a mutex so a host-held handle
/// can update the transform while the renderer snapshots it; the frame
/// loop is single-threaded, so the lock is uncontended by design.
///
/// Changing `priority` or `operation` does not trigger a rebuild by itself;
/// the mutating caller must follow up with
/// [`notify_topology_changed`](super::notify_topology_changed).
#[derive(Debug)]
pub struct Shape {
    kind: ShapeKind,
    desc: Mutex<ShapeDesc>,
}

impl Shape {
    pub fn new(kind: ShapeKind, desc: ShapeDesc) -> Self {
        let desc = ShapeDesc {
            blend: desc.blend.max(0.0),
            ..desc
        };
        Self {
            kind,
            desc: Mutex::new(desc),
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Copies the current mutable state.
    pub fn desc(&self) -> ShapeDesc {
        *self.lock()
    }

    pub fn transform(&self) -> Transform {
        self.lock().transform
    }

    pub fn set_transform(&self, transform: Transform) {
        self.lock().transform = transform;
    }

    pub fn set_position(&self, position: Vec3) {
        self.lock().transform.position = position;
    }

    pub fn set_rotation(&self, rotation: Vec3) {
        self.lock().transform.rotation = rotation;
    }

    pub fn set_priority(&self, priority: i32) {
        self.lock().priority = priority;
    }

    pub fn set_operation(&self, operation: CsgOp) {
        self.lock().operation = operation;
    }

    pub fn set_dimensions(&self, dimensions: Vec3) {
        self.lock().dimensions = dimensions;
    }

    pub fn set_blend(&self, blend: f32) {
        self.lock().blend = blend.max(0.0);
    }

    pub fn set_colour(&self, colour: Color) {
        self.lock().colour = colour;
    }

    fn lock(&self) -> MutexGuard<'_, ShapeDesc> {
        // A poisoning panic cannot leave ShapeDesc half-updated (all writes
        // are single-field), so recovering the guard is sound.
        self.desc.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_clamped_non_negative() {
        let s = Shape::new(
            ShapeKind::Sphere,
            ShapeDesc { blend: -2.0, ..Default::default() },
        );
        assert_eq!(s.desc().blend, 0.0);

        s.set_blend(-1.0);
        assert_eq!(s.desc().blend, 0.0);
    }

    #[test]
    fn kind_is_fixed_and_encodes_round_trip() {
        for kind in [ShapeKind::Sphere, ShapeKind::Cuboid, ShapeKind::Plane] {
            assert_eq!(ShapeKind::decode(kind.encode()), Some(kind));
        }
        assert_eq!(ShapeKind::decode(3), None);
        assert_eq!(ShapeKind::decode(-1), None);
    }

    #[test]
    fn op_encodes_round_trip() {
        for op in [CsgOp::Union, CsgOp::Subtraction, CsgOp::Intersection] {
            assert_eq!(CsgOp::decode(op.encode()), Some(op));
        }
        assert_eq!(CsgOp::decode(17), None);
    }

    #[test]
    fn transform_writes_are_visible() {
        let s = Shape::new(ShapeKind::Cuboid, ShapeDesc::default());
        s.set_position(crate::coords::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.transform().position, crate::coords::Vec3::new(1.0, 2.0, 3.0));
    }
}
