use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::{Shape, ShapeRegistry};

/// Shared handle to a shape registry.
///
/// Cheap to clone. The renderer holds one to read the scene; the host-facing
/// free functions below route to whichever handle is currently installed.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    inner: Arc<Mutex<ShapeRegistry>>,
}

impl RegistryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, shape: &Arc<Shape>) -> bool {
        self.lock().register(shape)
    }

    pub fn deregister(&self, shape: &Arc<Shape>) -> bool {
        self.lock().deregister(shape)
    }

    pub fn notify_topology_changed(&self) {
        self.lock().notify_topology_changed();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Locks the underlying registry for a compound operation (rebuild).
    pub fn lock(&self) -> MutexGuard<'_, ShapeRegistry> {
        // Single-threaded frame loop; poison recovery keeps a panicking
        // frame from wedging every later one.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn same_registry(&self, other: &RegistryHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

static INSTALLED: Mutex<Option<RegistryHandle>> = Mutex::new(None);
static PENDING: Mutex<Vec<Weak<Shape>>> = Mutex::new(Vec::new());

/// Process-wide registry lifecycle.
///
/// One renderer per process: exactly one handle is installed at a time.
/// Entities reach it through the free functions in this module; tests
/// bypass it by using [`RegistryHandle`]s directly.
pub struct RegistryService;

impl RegistryService {
    /// Installs a fresh registry and returns its handle.
    ///
    /// Replaces any previously installed registry (logged; a second
    /// renderer in one process is almost always a bug).
    pub fn install() -> RegistryHandle {
        let handle = RegistryHandle::new();
        let mut slot = lock_installed();
        if slot.is_some() {
            log::warn!("registry service installed twice; replacing the previous registry");
        }
        *slot = Some(handle.clone());
        handle
    }

    /// Clears the installed registry.
    ///
    /// Registrations attempted after this queue up again until the next
    /// `install`.
    pub fn uninstall() {
        *lock_installed() = None;
    }

    /// The currently installed handle, if any.
    pub fn current() -> Option<RegistryHandle> {
        lock_installed().clone()
    }
}

/// Registers a shape with the installed registry.
///
/// If no registry is installed yet the attempt is not lost: it is queued and
/// retried once per scheduling tick (see [`pump_pending`]) until an install
/// happens. Entity activation and renderer startup have no ordering
/// guarantee, so this path is expected during scene load.
pub fn register(shape: &Arc<Shape>) {
    match RegistryService::current() {
        Some(handle) => {
            handle.register(shape);
        }
        None => {
            let weak = Arc::downgrade(shape);
            let mut pending = lock_pending();
            if !pending.iter().any(|w| w.ptr_eq(&weak)) {
                log::debug!("registry not installed yet; queueing shape registration");
                pending.push(weak);
            }
        }
    }
}

/// Deregisters a shape from the installed registry (no-op if absent).
///
/// Also purges the shape from the pending queue, so a registration queued
/// before install cannot resurrect an already-deregistered shape.
pub fn deregister(shape: &Arc<Shape>) {
    let weak = Arc::downgrade(shape);
    lock_pending().retain(|w| !w.ptr_eq(&weak));

    if let Some(handle) = RegistryService::current() {
        handle.deregister(shape);
    }
}

/// Marks the installed registry's topology dirty.
///
/// Mutators of a registered shape's static fields (priority, operation,
/// dimensions, blend, colour) call this so the change reaches the records.
pub fn notify_topology_changed() {
    if let Some(handle) = RegistryService::current() {
        handle.notify_topology_changed();
    }
}

/// Retries queued registrations against the installed registry.
///
/// Called once per frame tick by the dispatch controller; does nothing when
/// no registry is installed (the queue just waits) or when the queue is
/// empty. Never blocks beyond the two short locks.
pub fn pump_pending() {
    let Some(handle) = RegistryService::current() else {
        return;
    };

    let drained: Vec<Weak<Shape>> = {
        let mut pending = lock_pending();
        if pending.is_empty() {
            return;
        }
        std::mem::take(&mut *pending)
    };

    for weak in drained {
        // Shapes dropped while queued simply vanish.
        if let Some(shape) = weak.upgrade() {
            handle.register(&shape);
        }
    }
}

fn lock_installed() -> MutexGuard<'static, Option<RegistryHandle>> {
    INSTALLED.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_pending() -> MutexGuard<'static, Vec<Weak<Shape>>> {
    PENDING.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ShapeDesc, ShapeKind};

    // The installed slot and pending queue are process-wide; tests touching
    // them serialize on this lock so the harness can run them in parallel.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn shape() -> Arc<Shape> {
        Arc::new(Shape::new(ShapeKind::Sphere, ShapeDesc::default()))
    }

    #[test]
    fn registration_before_install_is_retried_until_it_lands() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        RegistryService::uninstall();

        let a = shape();
        register(&a);

        // No registry yet: nothing to land in, nothing lost.
        pump_pending();
        assert!(RegistryService::current().is_none());

        let handle = RegistryService::install();
        assert!(handle.is_empty());

        // Next scheduling tick after install picks the queued shape up.
        pump_pending();
        assert_eq!(handle.len(), 1);

        // Re-pumping must not duplicate it.
        pump_pending();
        assert_eq!(handle.len(), 1);

        RegistryService::uninstall();
    }

    #[test]
    fn deregister_purges_a_queued_registration() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        RegistryService::uninstall();

        let a = shape();
        register(&a);
        deregister(&a);

        let handle = RegistryService::install();
        pump_pending();
        assert!(handle.is_empty());

        RegistryService::uninstall();
    }

    #[test]
    fn install_routes_registrations_directly() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        RegistryService::uninstall();

        let handle = RegistryService::install();
        let a = shape();
        register(&a);
        assert_eq!(handle.len(), 1);

        deregister(&a);
        assert!(handle.is_empty());

        RegistryService::uninstall();
    }
}
