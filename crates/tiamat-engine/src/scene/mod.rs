//! Shape entities and the live-scene registry.
//!
//! Responsibilities:
//! - model one implicit primitive per `Shape` (host-owned, registry holds a
//!   non-owning reference)
//! - provide deterministic composite ordering (priority + insertion order)
//! - track topology changes so the record pipeline knows when a full
//!   rebuild is due
//! - expose the process-wide registry service the scene-graph host talks to

mod key;
mod priority;
mod registry;
mod service;
mod shape;

pub use key::SortKey;
pub use priority::Priority;
pub use registry::ShapeRegistry;
pub use service::{
    deregister, notify_topology_changed, pump_pending, register, RegistryHandle, RegistryService,
};
pub use shape::{CsgOp, Shape, ShapeDesc, ShapeKind, Transform};
