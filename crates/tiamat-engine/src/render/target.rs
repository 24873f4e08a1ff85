use crate::coords::Viewport;

/// Compute dispatch granularity: the kernel runs 8×8 thread groups, so the
/// target's dimensions are always rounded up to multiples of this.
pub const GROUP_SIZE: u32 = 8;

/// Smallest multiple of 8 that is ≥ `s`. Zero rounds to 8 so a collapsed
/// window still yields a dispatchable target.
#[inline]
pub(crate) fn align_to_group(s: u32) -> u32 {
    s.max(1).div_ceil(GROUP_SIZE) * GROUP_SIZE
}

/// Rounded target dimensions derived from a viewport.
///
/// Pure value type so sizing decisions are testable without a device.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
}

impl TargetSpec {
    pub fn from_viewport(viewport: Viewport) -> Self {
        Self {
            width: align_to_group(viewport.width),
            height: align_to_group(viewport.height),
        }
    }

    /// Thread-group counts for the compute dispatch. Exact by construction
    /// since both dimensions are multiples of the group size.
    #[inline]
    pub fn workgroups(self) -> (u32, u32) {
        (self.width / GROUP_SIZE, self.height / GROUP_SIZE)
    }

    #[inline]
    pub fn resolution(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Offscreen storage target the kernel writes into.
///
/// Reallocated only when the rounded viewport size changes; `ensure_sized`
/// is a per-frame no-op otherwise.
#[derive(Debug, Default)]
pub struct SceneTarget {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    spec: Option<TargetSpec>,
}

impl SceneTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the target against the current viewport, reallocating when
    /// the rounded dimensions differ. Returns whether a reallocation
    /// happened (callers must then rebuild bind groups referencing the
    /// view).
    pub fn ensure_sized(&mut self, device: &wgpu::Device, viewport: Viewport) -> bool {
        let spec = TargetSpec::from_viewport(viewport);
        if self.spec == Some(spec) && self.texture.is_some() {
            return false;
        }

        log::info!(
            "scene target resized to {}x{} (viewport {}x{})",
            spec.width,
            spec.height,
            viewport.width,
            viewport.height,
        );

        // Drop the old texture before allocating the replacement.
        self.texture = None;
        self.view = None;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tiamat scene target"),
            size: wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            // STORAGE_BINDING: the kernel writes pixels directly.
            // TEXTURE_BINDING: the blit pass samples the result.
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.spec = Some(spec);
        true
    }

    #[inline]
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    #[inline]
    pub fn spec(&self) -> Option<TargetSpec> {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── rounding law ──────────────────────────────────────────────────────

    #[test]
    fn align_is_smallest_multiple_of_eight_not_below_input() {
        assert_eq!(align_to_group(1), 8);
        assert_eq!(align_to_group(7), 8);
        assert_eq!(align_to_group(8), 8);
        assert_eq!(align_to_group(9), 16);
        assert_eq!(align_to_group(1023), 1024);
        assert_eq!(align_to_group(1024), 1024);
    }

    #[test]
    fn zero_rounds_to_one_group() {
        assert_eq!(align_to_group(0), 8);
    }

    #[test]
    fn resize_801_wide_rounds_to_808() {
        let spec = TargetSpec::from_viewport(Viewport::new(801, 600));
        assert_eq!((spec.width, spec.height), (808, 600));
    }

    // ── sizing decision ───────────────────────────────────────────────────

    #[test]
    fn spec_is_stable_for_equal_viewports() {
        // The idempotence of ensure_sized reduces to spec equality: a
        // second call with the same viewport computes the same spec and
        // takes the early-out.
        let a = TargetSpec::from_viewport(Viewport::new(800, 600));
        let b = TargetSpec::from_viewport(Viewport::new(800, 600));
        assert_eq!(a, b);
    }

    #[test]
    fn workgroups_cover_the_target_exactly() {
        let spec = TargetSpec::from_viewport(Viewport::new(801, 600));
        assert_eq!(spec.workgroups(), (101, 75));
    }
}
