use crate::record::{ShapeRecord, RECORD_STRIDE};

/// Storage buffer backing the shape record array.
///
/// Sized to exactly `count × RECORD_STRIDE` and reallocated whenever the
/// count changes (shrinking or growing, never partially resized). Slack
/// capacity is not an option: the kernel iterates `arrayLength` of the
/// binding, so the buffer length must equal the record count.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buffer: Option<wgpu::Buffer>,
    count: usize,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the buffer to `count` records. Returns whether a
    /// reallocation happened (callers must then rebuild bind groups).
    ///
    /// `count == 0` drops the buffer entirely; an empty frame never
    /// dispatches, so nothing binds it.
    pub fn ensure_count(&mut self, device: &wgpu::Device, count: usize) -> bool {
        if self.count == count && (self.buffer.is_some() || count == 0) {
            return false;
        }

        log::info!(
            "record buffer resized: {} -> {} records ({} bytes)",
            self.count,
            count,
            count * RECORD_STRIDE,
        );

        // Release the old buffer before its replacement exists.
        self.buffer = None;
        self.count = count;

        if count > 0 {
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tiamat shape records"),
                size: (count * RECORD_STRIDE) as u64,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }

        true
    }

    /// Pushes the packed records into the buffer.
    ///
    /// Callers guarantee `records.len()` equals the ensured count; the
    /// dispatch controller uploads right after its rebuild/ensure step.
    pub fn upload(&self, queue: &wgpu::Queue, records: &[ShapeRecord]) {
        debug_assert_eq!(records.len(), self.count);
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(records));
        }
    }

    #[inline]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}
