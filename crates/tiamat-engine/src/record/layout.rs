use bytemuck::{Pod, Zeroable};

use crate::scene::Shape;

/// Per-element byte stride of the record buffer. Host and kernel agree on
/// this number instead of sharing a schema.
pub const RECORD_STRIDE: usize = 64;

/// Packed GPU representation of one shape (64 bytes):
///
///  offset  0  colour      [f32; 4]
///  offset 16  position    [f32; 3]
///  offset 28  rotation    [f32; 3]   radians
///  offset 40  dimensions  [f32; 3]
///  offset 52  blend       f32
///  offset 56  kind        i32
///  offset 60  operation   i32
///
/// All fields are 4-byte scalars on the kernel side as well, so the packed
/// stride holds there too (a WGSL `vec3` would pad to 16).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShapeRecord {
    pub colour: [f32; 4],
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub dimensions: [f32; 3],
    pub blend: f32,
    pub kind: i32,
    pub operation: i32,
}

impl ShapeRecord {
    /// Packs a full record from the shape's current state.
    pub fn from_shape(shape: &Shape) -> Self {
        let desc = shape.desc();
        Self {
            colour: desc.colour.to_array(),
            position: desc.transform.position.to_array(),
            rotation: desc.transform.rotation.to_array(),
            dimensions: desc.dimensions.to_array(),
            blend: desc.blend,
            kind: shape.kind().encode(),
            operation: desc.operation.encode(),
        }
    }

    /// Updates only the transform-derived fields in place.
    pub fn refresh_transform(&mut self, shape: &Shape) {
        let transform = shape.transform();
        self.position = transform.position.to_array();
        self.rotation = transform.rotation.to_array();
    }
}
