//! Render orchestrator.
//!
//! Owns the wgpu state, the uniform table, the [`ShaderContext`] and the
//! [`SpecializationCache`], and drives the two render paths:
//!
//! - direct: one raymarch pass straight to the surface
//! - composite: raymarch into an offscreen target, then the WGSL post pass
//!   blits it to the surface with the vignette applied
//!
//! Everything runs synchronously on the caller's thread. A snippet selection
//! fully completes sanitize -> assemble -> invalidate before the next
//! `render` call can observe the cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use crate::config::Config;
use crate::shader_gen::{FractalKind, ShaderContext, chunks};

use super::init::{GpuContext, OffscreenTarget};
use super::specialization::SpecializationCache;
use super::uniforms::Globals;

/// A shader variant with its fractal type baked in as a compile-time define.
pub struct SpecializedMaterial {
    pub kind: FractalKind,
    pub pipeline: wgpu::RenderPipeline,
}

pub struct Renderer {
    gpu: GpuContext,
    ctx: ShaderContext,
    cache: SpecializationCache<SpecializedMaterial>,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    pipeline_layout: wgpu::PipelineLayout,
    vert_module: wgpu::ShaderModule,

    offscreen: OffscreenTarget,
    post_pipeline: wgpu::RenderPipeline,
    post_layout: wgpu::BindGroupLayout,
    post_sampler: wgpu::Sampler,
    post_bind_group: wgpu::BindGroup,
    post_enabled: bool,

    active_kind: FractalKind,
    active: Option<Arc<SpecializedMaterial>>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let gpu = GpuContext::new(window, config.video.vsync)?;
        Self::setup_shader(gpu, config)
    }

    /// One-time initialization: assemble the base shader, create the uniform
    /// table and the fixed pipelines (fullscreen vertex stage, post pass).
    fn setup_shader(gpu: GpuContext, config: &Config) -> Result<Self> {
        let ctx = ShaderContext::new();
        let device = &gpu.device;

        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: Globals::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Raymarch Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fullscreen Vertex Shader"),
            source: wgpu::ShaderSource::Glsl {
                shader: ctx.vert_source().into(),
                stage: wgpu::naga::ShaderStage::Vertex,
                defines: Default::default(),
            },
        });

        // Post composite pass (WGSL, fixed for the session)
        let post_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(chunks::POST_SHADER.into()),
        });

        let post_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
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

        let post_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&post_layout],
            push_constant_ranges: &[],
        });

        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Post Pipeline"),
            layout: Some(&post_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &post_module,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_module,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let post_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let offscreen = OffscreenTarget::new(
            device,
            gpu.config.format,
            gpu.config.width,
            gpu.config.height,
        );
        let post_bind_group =
            create_post_bind_group(device, &post_layout, &offscreen.view, &post_sampler);

        Ok(Self {
            gpu,
            ctx,
            cache: SpecializationCache::new(),
            globals_buffer,
            globals_bind_group,
            pipeline_layout,
            vert_module,
            offscreen,
            post_pipeline,
            post_layout,
            post_sampler,
            post_bind_group,
            post_enabled: config.video.post_fx,
            active_kind: FractalKind::Menger,
            active: None,
        })
    }

    pub fn context(&self) -> &ShaderContext {
        &self.ctx
    }

    pub fn active_kind(&self) -> FractalKind {
        self.active_kind
    }

    /// Material for the given kind, used by the per-frame bind. Compiles on
    /// first use for a given base source; returns the cached instance after.
    pub fn specialized_material_for(&mut self, kind: FractalKind) -> Arc<SpecializedMaterial> {
        let generation = self.ctx.generation();
        let device = &self.gpu.device;
        let format = self.gpu.config.format;
        let ctx = &self.ctx;
        let layout = &self.pipeline_layout;
        let vert = &self.vert_module;
        let cache = &mut self.cache;
        cache.get_or_compile(kind, generation, || {
            create_material(device, layout, vert, format, ctx, kind)
        })
    }

    /// Bind the correct specialized material for the active fractal kind.
    /// Idempotent; does nothing when the bound material is already current.
    pub fn apply_specialization_if_needed(&mut self, force: bool) {
        let current = match (&self.active, force) {
            (_, true) | (None, _) => false,
            (Some(material), false) => {
                material.kind == self.active_kind && self.cache.contains(self.active_kind)
            }
        };
        if !current {
            let material = self.specialized_material_for(self.active_kind);
            self.active = Some(material);
        }
    }

    pub fn set_fractal_kind(&mut self, kind: FractalKind) {
        if self.active_kind != kind {
            tracing::info!("fractal kind -> {}", kind.name());
        }
        self.active_kind = kind;
        self.apply_specialization_if_needed(false);
    }

    /// Re-resolve the current snippet selection, sanitize, reassemble, and
    /// invalidate every cached specialization. Completes before returning;
    /// the next frame renders against the rebuilt source.
    pub fn apply_dec_mapping_and_rebuild(&mut self) {
        self.ctx.apply_dec_mapping();
        self.cache.invalidate_all();
        self.apply_specialization_if_needed(true);
    }

    pub fn set_preview_enabled(&mut self, enabled: bool) {
        self.ctx.set_preview_enabled(enabled);
        self.apply_dec_mapping_and_rebuild();
    }

    pub fn select_snippet(&mut self, spec: Option<String>) {
        self.ctx.select_snippet(spec);
        if self.ctx.preview().enabled {
            self.apply_dec_mapping_and_rebuild();
        }
    }

    /// Step the snippet selection forward or backward through the registry.
    pub fn cycle_snippet(&mut self, forward: bool) {
        let current = self
            .ctx
            .preview()
            .selected_key
            .as_deref()
            .and_then(|spec| self.ctx.resolve_dec_key(spec))
            .unwrap_or(crate::shader_gen::DEFAULT_KEY);
        let next = if forward {
            self.ctx.registry().next_key(current)
        } else {
            self.ctx.registry().prev_key(current)
        };
        if let Some(key) = next {
            let key = key.to_string();
            tracing::info!("DEC snippet -> {}", key);
            self.select_snippet(Some(key));
        }
    }

    /// Diagnostic pass-through used by CLI tooling.
    pub fn resolve_dec_key(&self, spec: &str) -> Option<&str> {
        self.ctx.resolve_dec_key(spec)
    }

    /// Compile materials for all given kinds up front. The currently bound
    /// material is left untouched, so prewarming has no observable effect on
    /// render state.
    pub fn prewarm(&mut self, kinds: &[FractalKind]) {
        let generation = self.ctx.generation();
        let device = &self.gpu.device;
        let format = self.gpu.config.format;
        let ctx = &self.ctx;
        let layout = &self.pipeline_layout;
        let vert = &self.vert_module;
        let cache = &mut self.cache;
        cache.prewarm(kinds, generation, |kind| {
            create_material(device, layout, vert, format, ctx, kind)
        });
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.offscreen = OffscreenTarget::new(
            &self.gpu.device,
            self.gpu.config.format,
            self.gpu.config.width,
            self.gpu.config.height,
        );
        self.post_bind_group = create_post_bind_group(
            &self.gpu.device,
            &self.post_layout,
            &self.offscreen.view,
            &self.post_sampler,
        );
    }

    pub fn render(&mut self, globals: &Globals) -> Result<()> {
        self.apply_specialization_if_needed(false);
        let Some(material) = self.active.clone() else {
            return Ok(());
        };

        self.gpu
            .queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(globals));

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (self.gpu.config.width, self.gpu.config.height);
                self.resize(width, height);
                return Ok(());
            }
            Err(e) => return Err(e).context("Failed to acquire surface frame"),
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if self.post_enabled {
            self.raymarch_pass(&mut encoder, &self.offscreen.view, &material);
            self.post_pass(&mut encoder, &surface_view);
        } else {
            self.raymarch_pass(&mut encoder, &surface_view, &material);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn raymarch_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        material: &SpecializedMaterial,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Raymarch Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&material.pipeline);
        pass.set_bind_group(0, &self.globals_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn post_pass(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Post Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.post_pipeline);
        pass.set_bind_group(0, &self.post_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_post_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Post Bind Group"),
        layout,
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
    })
}

/// Compile one shader variant: the base source with the kind's define baked
/// in, as a complete render pipeline.
fn create_material(
    device: &wgpu::Device,
    pipeline_layout: &wgpu::PipelineLayout,
    vert_module: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
    ctx: &ShaderContext,
    kind: FractalKind,
) -> SpecializedMaterial {
    let source = ctx.specialized_source(kind);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("Raymarch Shader ({})", kind.name())),
        source: wgpu::ShaderSource::Glsl {
            shader: source.into(),
            stage: wgpu::naga::ShaderStage::Fragment,
            defines: Default::default(),
        },
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("Raymarch Pipeline ({})", kind.name())),
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module: vert_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });

    SpecializedMaterial { kind, pipeline }
}
