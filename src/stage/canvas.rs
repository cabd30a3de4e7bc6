//! The wgpu-backed stage: per-layer offscreen targets composited to the
//! window surface with per-layer opacity.

use std::collections::HashMap;
use std::path::Path;

use super::{LayerId, SpriteSource, Stage};
use crate::assets::{AssetError, Assets, SpriteTexture};
use crate::draw2d::{Canvas, Color, Draw2d};
use crate::gpu::GpuContext;

/// An off-screen target one layer renders into.
///
/// Created at the surface size and recreated when the window resizes;
/// both a render attachment (the layer's draw list renders into it) and
/// a sampled texture (the compositor reads it back).
struct LayerTarget {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl LayerTarget {
    fn new(gpu: &GpuContext, label: &str) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: gpu.width().max(1),
                height: gpu.height().max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            width: gpu.width().max(1),
            height: gpu.height().max(1),
        }
    }

    fn ensure_size(&mut self, gpu: &GpuContext, label: &str) {
        if self.width != gpu.width() || self.height != gpu.height() {
            *self = Self::new(gpu, label);
        }
    }
}

struct WindowLayer {
    label: String,
    opacity: f32,
    canvas: Canvas,
    target: LayerTarget,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniforms {
    opacity: f32,
    _pad: [f32; 3],
}

/// The windowed render host.
///
/// Owns the GPU context, the loaded assets, and every layer. Each frame
/// the attached layers are rendered into their offscreen targets and
/// composited back-to-front onto the surface, each modulated by its
/// opacity — which is how a transition's fade reaches the screen.
pub struct CanvasStage {
    gpu: GpuContext,
    assets: Assets,
    draw2d: Draw2d,
    background: Color,

    composite_pipeline: wgpu::RenderPipeline,
    composite_bind_group_layout: wgpu::BindGroupLayout,
    composite_uniforms: wgpu::Buffer,
    composite_sampler: wgpu::Sampler,

    next_id: u64,
    layers: HashMap<LayerId, WindowLayer>,
    attached: Vec<LayerId>,
}

impl CanvasStage {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Layer Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER.into()),
        });

        let composite_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Composite Uniforms"),
            size: std::mem::size_of::<CompositeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let composite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Composite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let composite_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Composite Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&composite_bind_group_layout],
            push_constant_ranges: &[],
        });

        let composite_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Composite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let draw2d = Draw2d::new(&gpu);

        Self {
            gpu,
            assets: Assets::new(),
            draw2d,
            background: Color::BLACK,
            composite_pipeline,
            composite_bind_group_layout,
            composite_uniforms,
            composite_sampler,
            next_id: 0,
            layers: HashMap::new(),
            attached: Vec::new(),
        }
    }

    /// Access the GPU context (for asset loading at startup).
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Color the surface is cleared to behind all layers.
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// Load the default UI font from a file path.
    pub fn load_font(&mut self, path: &Path, size: f32) -> Result<(), AssetError> {
        self.assets.load_font(&self.gpu, path, size)?;
        Ok(())
    }

    /// Propagate a window resize to the surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// Render one frame: each attached layer into its target, then the
    /// targets composited onto the surface in attach order.
    pub fn render(&mut self) {
        self.draw2d.prepare(&self.gpu, &self.assets);

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(err) => {
                log::warn!("failed to acquire surface texture: {err}");
                return;
            }
        };
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Clear the surface behind all layers.
        {
            let mut encoder =
                self.gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Stage Clear Encoder"),
                    });
            {
                let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Stage Clear Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &screen_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: self.background.r as f64,
                                g: self.background.g as f64,
                                b: self.background.b as f64,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            }
            self.gpu.queue.submit(std::iter::once(encoder.finish()));
        }

        // One submit per layer: the shared vertex and uniform buffers are
        // rewritten for each layer, so its draws must be on the queue
        // before the next layer's writes land.
        for &id in &self.attached {
            let Some(layer) = self.layers.get_mut(&id) else {
                continue;
            };
            layer.target.ensure_size(&self.gpu, &layer.label);
            self.draw2d.replay(&layer.canvas, &self.assets);

            let clear = layer.canvas.background().unwrap_or(Color::TRANSPARENT);
            let uniforms = CompositeUniforms {
                opacity: layer.opacity,
                _pad: [0.0; 3],
            };
            self.gpu.queue.write_buffer(
                &self.composite_uniforms,
                0,
                bytemuck::cast_slice(&[uniforms]),
            );

            let bind_group = self
                .gpu
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Composite Bind Group"),
                    layout: &self.composite_bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: self.composite_uniforms.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&layer.target.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&self.composite_sampler),
                        },
                    ],
                });

            let mut encoder =
                self.gpu
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("Layer Encoder"),
                    });

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Layer Draw Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &layer.target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: clear.r as f64,
                                g: clear.g as f64,
                                b: clear.b as f64,
                                a: clear.a as f64,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.draw2d.render(&self.gpu, &mut pass);
            }

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Layer Composite Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &screen_view,
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
                });
                pass.set_pipeline(&self.composite_pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            self.gpu.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();
    }
}

impl Stage for CanvasStage {
    fn size(&self) -> (u32, u32) {
        (self.gpu.width(), self.gpu.height())
    }

    fn create_layer(&mut self, label: &str) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;
        let target = LayerTarget::new(&self.gpu, label);
        self.layers.insert(
            id,
            WindowLayer {
                label: label.to_string(),
                opacity: 1.0,
                canvas: Canvas::new(),
                target,
            },
        );
        id
    }

    fn dispose_layer(&mut self, layer: LayerId) {
        if self.layers.remove(&layer).is_some() {
            self.attached.retain(|&l| l != layer);
        }
    }

    fn attach(&mut self, layer: LayerId) {
        if self.layers.contains_key(&layer) && !self.attached.contains(&layer) {
            self.attached.push(layer);
        }
    }

    fn detach(&mut self, layer: LayerId) {
        self.attached.retain(|&l| l != layer);
    }

    fn set_opacity(&mut self, layer: LayerId, opacity: f32) {
        if let Some(l) = self.layers.get_mut(&layer) {
            l.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn opacity(&self, layer: LayerId) -> f32 {
        self.layers.get(&layer).map(|l| l.opacity).unwrap_or(1.0)
    }

    fn canvas(&mut self, layer: LayerId) -> Option<&mut Canvas> {
        self.layers.get_mut(&layer).map(|l| &mut l.canvas)
    }

    fn load_sprite(&mut self, name: &str, source: SpriteSource<'_>) -> Result<(), AssetError> {
        let texture = match source {
            SpriteSource::File(path) => SpriteTexture::from_file(&self.gpu, path)?,
            SpriteSource::Bytes(bytes) => SpriteTexture::from_bytes(&self.gpu, bytes, name)?,
            SpriteSource::Rgba {
                width,
                height,
                pixels,
            } => SpriteTexture::from_rgba(&self.gpu, pixels, width, height, name),
        };
        self.assets.insert_sprite(name, texture);
        Ok(())
    }

    fn has_sprite(&self, name: &str) -> bool {
        self.assets.has_sprite(name)
    }
}

/// Fullscreen-triangle pass drawing one layer's target onto the surface,
/// modulated by the layer's opacity.
const COMPOSITE_SHADER: &str = r#"
struct Uniforms {
    opacity: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var layer_texture: texture_2d<f32>;
@group(0) @binding(2) var layer_sampler: sampler;

struct VsOut {
    @builtin(position) clip: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
    // Fullscreen triangle
    var out: VsOut;
    let x = f32(i32(vi & 1u) * 4 - 1);
    let y = f32(i32(vi & 2u) * 2 - 1);
    out.clip = vec4f(x, y, 0.0, 1.0);
    out.uv = vec2f((x + 1.0) * 0.5, (1.0 - y) * 0.5);
    return out;
}

@fragment
fn fs(in: VsOut) -> @location(0) vec4f {
    let sample = textureSample(layer_texture, layer_sampler, in.uv);
    return vec4f(sample.rgb, sample.a * u.opacity);
}
"#;
