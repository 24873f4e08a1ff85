use bytemuck::{Pod, Zeroable};

use crate::coords::Viewport;
use crate::record::{RecordSet, RECORD_STRIDE};
use crate::scene::{self, RegistryHandle};
use crate::time::FrameTime;

use super::{Camera, FrameGate, RecordBuffer, RenderCtx, RenderTarget, SceneTarget};

/// Kernel globals (48 bytes):
///
///  offset  0  resolution  [f32; 2]   rounded target dimensions
///  offset  8  time        f32        seconds since startup
///  offset 16  camera_pos  [f32; 3]
///  offset 32  camera_rot  [f32; 2]   pitch, yaw (radians)
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],
    time: f32,
    _pad0: f32,
    camera_pos: [f32; 3],
    _pad1: f32,
    camera_rot: [f32; 2],
    _pad2: [f32; 2],
}

/// Frame dispatch controller.
///
/// Orchestrates one compute dispatch per frame: sizes resources, refreshes
/// per-shape transform data, binds, dispatches, and blits the result onto
/// the surface. Driven by the window runtime's begin/end callback pair:
/// two well-ordered events per frame, non-reentrant, single-threaded.
pub struct Raymarcher {
    registry: RegistryHandle,
    records: RecordSet,
    record_buffer: RecordBuffer,
    target: SceneTarget,
    gate: FrameGate,
    elapsed: f32,

    compute_pipeline: Option<wgpu::ComputePipeline>,
    compute_bgl: Option<wgpu::BindGroupLayout>,
    compute_bind_group: Option<wgpu::BindGroup>,
    globals_ubo: Option<wgpu::Buffer>,

    blit_format: Option<wgpu::TextureFormat>,
    blit_pipeline: Option<wgpu::RenderPipeline>,
    blit_bgl: Option<wgpu::BindGroupLayout>,
    blit_bind_group: Option<wgpu::BindGroup>,
    blit_sampler: Option<wgpu::Sampler>,
}

impl Raymarcher {
    /// The handle is injected rather than looked up so tests (and any
    /// future second renderer) can run against an isolated registry.
    pub fn new(registry: RegistryHandle) -> Self {
        Self {
            registry,
            records: RecordSet::new(),
            record_buffer: RecordBuffer::new(),
            target: SceneTarget::new(),
            gate: FrameGate::new(),
            elapsed: 0.0,
            compute_pipeline: None,
            compute_bgl: None,
            compute_bind_group: None,
            globals_ubo: None,
            blit_format: None,
            blit_pipeline: None,
            blit_bgl: None,
            blit_bind_group: None,
            blit_sampler: None,
        }
    }

    /// Begin-frame step: re-arm the dispatch gate, pump queued
    /// registrations, bring records and sized resources up to date.
    ///
    /// Topology changes since the last frame trigger the full rebuild
    /// (stable sort + repack + exact-fit buffer); otherwise only the
    /// transform fields are refreshed in place.
    pub fn begin_frame(&mut self, device: &wgpu::Device, viewport: Viewport, time: FrameTime) {
        self.gate.begin();
        self.elapsed = time.elapsed;

        scene::pump_pending();

        {
            let mut registry = self.registry.lock();
            if self.records.needs_rebuild(&registry) {
                self.records.rebuild(&mut registry);
                if self.record_buffer.ensure_count(device, self.records.len()) {
                    self.compute_bind_group = None;
                }
            } else {
                self.records.refresh();
            }
        }

        if self.target.ensure_sized(device, viewport) {
            self.compute_bind_group = None;
            self.blit_bind_group = None;
        }
    }

    /// End-frame step: at most one dispatch per frame, skipped entirely for
    /// an empty scene (no dispatch, no buffer push; earlier surface
    /// content persists).
    pub fn end_frame(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, camera: &Camera) {
        if !self.gate.try_dispatch(self.records.len()) {
            return;
        }

        let Some(spec) = self.target.spec() else {
            // end_frame without a begin_frame; the external callback
            // contract was violated, nothing is sized yet.
            return;
        };

        self.ensure_compute_pipeline(ctx.device);
        self.ensure_blit_pipeline(ctx.device, ctx.surface_format);
        self.ensure_bind_groups(ctx.device);

        self.record_buffer.upload(ctx.queue, self.records.records());

        if let Some(ubo) = &self.globals_ubo {
            let globals = Globals {
                resolution: spec.resolution(),
                time: self.elapsed,
                _pad0: 0.0,
                camera_pos: camera.position.to_array(),
                _pad1: 0.0,
                camera_rot: [camera.pitch, camera.yaw],
                _pad2: [0.0; 2],
            };
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&globals));
        }

        let (Some(pipeline), Some(bind_group)) =
            (self.compute_pipeline.as_ref(), self.compute_bind_group.as_ref())
        else {
            return;
        };

        {
            let mut pass = target.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tiamat raymarch pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);

            let (gx, gy) = spec.workgroups();
            pass.dispatch_workgroups(gx, gy, 1);
        }

        // Blit is encoded after the compute pass; the command stream orders
        // it behind the dispatch, no explicit fence needed.
        let (Some(blit_pipeline), Some(blit_bind_group)) =
            (self.blit_pipeline.as_ref(), self.blit_bind_group.as_ref())
        else {
            return;
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tiamat blit pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(blit_pipeline);
        rpass.set_bind_group(0, blit_bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_compute_pipeline(&mut self, device: &wgpu::Device) {
        if self.compute_pipeline.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tiamat raymarch shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/raymarch.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tiamat raymarch bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(RECORD_STRIDE as u64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(
                            std::mem::size_of::<Globals>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tiamat raymarch pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("tiamat raymarch pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        self.compute_pipeline = Some(pipeline);
        self.compute_bgl = Some(bgl);
        self.compute_bind_group = None;
    }

    fn ensure_blit_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.blit_format == Some(format) && self.blit_pipeline.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tiamat blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tiamat blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tiamat blit pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tiamat blit pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.blit_format = Some(format);
        self.blit_pipeline = Some(pipeline);
        self.blit_bgl = Some(bgl);
        self.blit_bind_group = None;
    }

    fn ensure_bind_groups(&mut self, device: &wgpu::Device) {
        if self.globals_ubo.is_none() {
            self.globals_ubo = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tiamat globals ubo"),
                size: std::mem::size_of::<Globals>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.compute_bind_group = None;
        }

        if self.compute_bind_group.is_none() {
            let (Some(bgl), Some(view), Some(records), Some(ubo)) = (
                self.compute_bgl.as_ref(),
                self.target.view(),
                self.record_buffer.buffer(),
                self.globals_ubo.as_ref(),
            ) else {
                return;
            };

            self.compute_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tiamat raymarch bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: records.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: ubo.as_entire_binding(),
                    },
                ],
            }));
        }

        if self.blit_sampler.is_none() {
            self.blit_sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("tiamat blit sampler"),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }));
            self.blit_bind_group = None;
        }

        if self.blit_bind_group.is_none() {
            let (Some(bgl), Some(view), Some(sampler)) = (
                self.blit_bgl.as_ref(),
                self.target.view(),
                self.blit_sampler.as_ref(),
            ) else {
                return;
            };

            self.blit_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tiamat blit bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }));
        }
    }
}
