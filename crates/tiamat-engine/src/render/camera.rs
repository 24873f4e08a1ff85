use crate::coords::Vec3;

/// Camera state read when filling the kernel's globals uniform.
///
/// Owned and mutated by the host; this system never writes it. Rotation is
/// pitch + yaw only (radians); roll is not part of the kernel contract.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
}

impl Camera {
    #[inline]
    pub const fn new(position: Vec3, pitch: f32, yaw: f32) -> Self {
        Self { position, pitch, yaw }
    }
}
