/// Per-frame dispatch guard.
///
/// The host environment can deliver multiple end-of-frame signals for one
/// logical frame (multi-pass setups); the gate collapses them to at most
/// one dispatch. An empty scene is skipped, not an error; the surface
/// simply keeps whatever earlier passes put there.
#[derive(Debug, Default, Copy, Clone)]
pub struct FrameGate {
    dispatched: bool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin-frame reset.
    #[inline]
    pub fn begin(&mut self) {
        self.dispatched = false;
    }

    /// Claims the frame's single dispatch. Returns `false` when the frame
    /// already dispatched or there is nothing to draw.
    #[inline]
    pub fn try_dispatch(&mut self, record_count: usize) -> bool {
        if self.dispatched || record_count == 0 {
            return false;
        }
        self.dispatched = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_begin_two_ends_dispatches_once() {
        let mut gate = FrameGate::new();
        gate.begin();
        assert!(gate.try_dispatch(3));
        assert!(!gate.try_dispatch(3));
    }

    #[test]
    fn empty_scene_never_dispatches() {
        let mut gate = FrameGate::new();
        gate.begin();
        assert!(!gate.try_dispatch(0));
        // An empty skip leaves the flag unset; only a real dispatch
        // consumes the frame.
        assert!(gate.try_dispatch(1));
    }

    #[test]
    fn next_begin_rearms_the_gate() {
        let mut gate = FrameGate::new();
        gate.begin();
        assert!(gate.try_dispatch(1));
        gate.begin();
        assert!(gate.try_dispatch(1));
    }
}
