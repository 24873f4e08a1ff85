//! Pins the record byte layout the compute kernel depends on.
//!
//! Host and kernel agree on a fixed 64-byte stride instead of a shared
//! schema; these tests are the contract's tripwire.

use std::mem::{align_of, offset_of, size_of};

use tiamat_engine::record::{ShapeRecord, RECORD_STRIDE};
use tiamat_engine::scene::{CsgOp, Shape, ShapeDesc, ShapeKind};

#[test]
fn record_stride_is_64_bytes() {
    assert_eq!(size_of::<ShapeRecord>(), RECORD_STRIDE);
    assert_eq!(size_of::<ShapeRecord>(), 64);

    // All fields are 4-byte scalars; repr(C) must not introduce padding.
    assert_eq!(align_of::<ShapeRecord>(), 4);
}

#[test]
fn record_field_offsets_match_the_kernel_contract() {
    assert_eq!(offset_of!(ShapeRecord, colour), 0);
    assert_eq!(offset_of!(ShapeRecord, position), 16);
    assert_eq!(offset_of!(ShapeRecord, rotation), 28);
    assert_eq!(offset_of!(ShapeRecord, dimensions), 40);
    assert_eq!(offset_of!(ShapeRecord, blend), 52);
    assert_eq!(offset_of!(ShapeRecord, kind), 56);
    assert_eq!(offset_of!(ShapeRecord, operation), 60);
}

#[test]
fn record_array_casts_to_tightly_packed_bytes() {
    let shape = Shape::new(
        ShapeKind::Cuboid,
        ShapeDesc {
            operation: CsgOp::Subtraction,
            priority: 3,
            ..Default::default()
        },
    );

    let records = [ShapeRecord::from_shape(&shape), ShapeRecord::from_shape(&shape)];
    let bytes: &[u8] = bytemuck::cast_slice(&records);
    assert_eq!(bytes.len(), 2 * RECORD_STRIDE);

    // The second element starts exactly one stride in.
    let second = &bytes[RECORD_STRIDE..];
    assert_eq!(&second[..RECORD_STRIDE], bytemuck::bytes_of(&records[1]));
}

#[test]
fn raw_discriminants_survive_the_gpu_boundary() {
    let shape = Shape::new(
        ShapeKind::Plane,
        ShapeDesc {
            operation: CsgOp::Intersection,
            ..Default::default()
        },
    );
    let record = ShapeRecord::from_shape(&shape);

    assert_eq!(ShapeKind::decode(record.kind), Some(ShapeKind::Plane));
    assert_eq!(CsgOp::decode(record.operation), Some(CsgOp::Intersection));

    // A malformed raw value must be rejected, not mapped to some shape.
    assert_eq!(ShapeKind::decode(99), None);
    assert_eq!(CsgOp::decode(-1), None);
}
