//! 2D drawing: retained per-layer draw lists and the GPU batcher that
//! renders them.
//!
//! Scenes paint into a [`Canvas`] — a retained list of rect, text, and
//! sprite commands that survives across frames so the compositor can
//! keep re-blending a layer while a fade is in flight. The windowed
//! stage replays canvases through [`Draw2d`], which batches everything
//! into a handful of alpha-blended draw calls.

use std::collections::HashMap;

use glam::Vec2;

use crate::assets::{Assets, FontId};
use crate::gpu::GpuContext;

/// A rectangle in screen-space pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether a point (window coordinates) lies inside this rect.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Straight-alpha RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    /// Semi-transparent dark background for panels.
    pub const PANEL_BG: Color = Color::rgba(0.08, 0.09, 0.12, 0.92);
    /// Accent color for panel borders.
    pub const PANEL_BORDER: Color = Color::rgba(0.45, 0.42, 0.35, 1.0);
}

/// A single retained draw command.
#[derive(Clone, Debug)]
pub enum DrawCmd {
    Rect {
        rect: Rect,
        color: Color,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Color,
    },
    Sprite {
        name: String,
        rect: Rect,
        tint: Color,
    },
}

/// Retained draw list for one stage layer.
///
/// Scenes typically `clear()` and repaint on every `update`; the list
/// itself persists so the layer stays renderable between updates (e.g.
/// while the director no-ops update dispatch during a fade).
#[derive(Default)]
pub struct Canvas {
    cmds: Vec<DrawCmd>,
    background: Option<Color>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all commands. The background color is kept.
    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Color the layer is cleared to before the commands are drawn.
    pub fn set_background(&mut self, color: Color) {
        self.background = Some(color);
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Draw a filled rectangle.
    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.cmds.push(DrawCmd::Rect { rect, color });
    }

    /// Draw text with its top-left corner at (x, y) in the default font.
    pub fn text(&mut self, x: f32, y: f32, text: impl Into<String>, color: Color) {
        self.cmds.push(DrawCmd::Text {
            x,
            y,
            text: text.into(),
            color,
        });
    }

    /// Draw a named sprite stretched over `rect`, tinted by `tint`
    /// (use [`Color::WHITE`] for no tint).
    pub fn sprite(&mut self, name: impl Into<String>, rect: Rect, tint: Color) {
        self.cmds.push(DrawCmd::Sprite {
            name: name.into(),
            rect,
            tint,
        });
    }

    /// Draw a panel: filled background plus a one-pixel border.
    pub fn panel(&mut self, rect: Rect, background: Color, border: Color) {
        self.rect(rect, background);
        let b = 1.0;
        self.rect(Rect::new(rect.x, rect.y, rect.width, b), border);
        self.rect(
            Rect::new(rect.x, rect.y + rect.height - b, rect.width, b),
            border,
        );
        self.rect(Rect::new(rect.x, rect.y, b, rect.height), border);
        self.rect(
            Rect::new(rect.x + rect.width - b, rect.y, b, rect.height),
            border,
        );
    }

    pub fn cmds(&self) -> &[DrawCmd] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }
}

/// Vertex for 2D quads.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct Vertex2d {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl Vertex2d {
    const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex2d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Draw2dUniforms {
    resolution: [f32; 2],
    _padding: [f32; 2],
}

const MAX_VERTICES: usize = 16384;

/// GPU batcher replaying canvases into alpha-blended draw calls.
///
/// One pipeline per command family: flat-colored quads, glyph quads
/// sampling the font atlas's coverage channel, and sprite quads sampling
/// an RGBA texture. All batches share a single vertex buffer written
/// segment by segment.
pub struct Draw2d {
    colored_pipeline: wgpu::RenderPipeline,
    text_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,

    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,

    font_bind_group: Option<(FontId, wgpu::BindGroup)>,
    sprite_bind_groups: HashMap<String, wgpu::BindGroup>,

    colored: Vec<Vertex2d>,
    text: Vec<Vertex2d>,
    sprites: Vec<(String, Vec<Vertex2d>)>,
}

impl Draw2d {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Draw2d Shader"),
            source: wgpu::ShaderSource::Wgsl(DRAW2D_SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Uniforms"),
            size: std::mem::size_of::<Draw2dUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Uniform Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw2d Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Draw2d Texture Layout"),
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

        let colored_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Colored Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Draw2d Textured Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blend_state = wgpu::BlendState {
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
        };

        let make_pipeline =
            |label: &str, layout: &wgpu::PipelineLayout, fs_entry: &str| -> wgpu::RenderPipeline {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs"),
                        buffers: &[Vertex2d::LAYOUT],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some(fs_entry),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: gpu.config.format,
                            blend: Some(blend_state),
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
                })
            };

        let colored_pipeline =
            make_pipeline("Draw2d Colored Pipeline", &colored_layout, "fs_colored");
        let text_pipeline = make_pipeline("Draw2d Text Pipeline", &textured_layout, "fs_text");
        let sprite_pipeline =
            make_pipeline("Draw2d Sprite Pipeline", &textured_layout, "fs_sprite");

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw2d Vertex Buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex2d>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            colored_pipeline,
            text_pipeline,
            sprite_pipeline,
            vertex_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_bind_group_layout,
            font_bind_group: None,
            sprite_bind_groups: HashMap::new(),
            colored: Vec::with_capacity(1024),
            text: Vec::with_capacity(1024),
            sprites: Vec::new(),
        }
    }

    /// Rebuild the vertex batches from a canvas.
    pub fn replay(&mut self, canvas: &Canvas, assets: &Assets) {
        self.colored.clear();
        self.text.clear();
        self.sprites.clear();

        for cmd in canvas.cmds() {
            match cmd {
                DrawCmd::Rect { rect, color } => {
                    push_quad(&mut self.colored, rect, [0.0, 0.0, 1.0, 1.0], color);
                }
                DrawCmd::Text { x, y, text, color } => {
                    self.push_text(assets, *x, *y, text, *color);
                }
                DrawCmd::Sprite { name, rect, tint } => {
                    if !assets.has_sprite(name) {
                        log::debug!("sprite {name:?} not loaded, skipping");
                        continue;
                    }
                    let batch = match self.sprites.iter_mut().position(|(n, _)| n == name) {
                        Some(i) => &mut self.sprites[i].1,
                        None => {
                            self.sprites.push((name.clone(), Vec::new()));
                            &mut self.sprites.last_mut().unwrap().1
                        }
                    };
                    push_quad(batch, rect, [0.0, 0.0, 1.0, 1.0], tint);
                }
            }
        }
    }

    fn push_text(&mut self, assets: &Assets, x: f32, y: f32, text: &str, color: Color) {
        let Some(font) = assets.default_font() else {
            return;
        };

        let c = [color.r, color.g, color.b, color.a];
        let mut cursor_x = x;
        let baseline_y = y + font.size();

        for ch in text.chars() {
            let Some(glyph) = font.glyph(ch) else {
                cursor_x += font.size() * 0.5;
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let gx = cursor_x + glyph.offset_x;
                // fontdue's ymin is the distance from the baseline to the
                // bottom of the glyph box.
                let gy = baseline_y - glyph.offset_y - glyph.height as f32;
                let gw = glyph.width as f32;
                let gh = glyph.height as f32;

                let u0 = glyph.uv[0];
                let v0 = glyph.uv[1];
                let u1 = u0 + glyph.uv[2];
                let v1 = v0 + glyph.uv[3];

                self.text.extend_from_slice(&[
                    Vertex2d {
                        position: [gx, gy],
                        uv: [u0, v0],
                        color: c,
                    },
                    Vertex2d {
                        position: [gx + gw, gy],
                        uv: [u1, v0],
                        color: c,
                    },
                    Vertex2d {
                        position: [gx, gy + gh],
                        uv: [u0, v1],
                        color: c,
                    },
                    Vertex2d {
                        position: [gx + gw, gy],
                        uv: [u1, v0],
                        color: c,
                    },
                    Vertex2d {
                        position: [gx + gw, gy + gh],
                        uv: [u1, v1],
                        color: c,
                    },
                    Vertex2d {
                        position: [gx, gy + gh],
                        uv: [u0, v1],
                        color: c,
                    },
                ]);
            }

            cursor_x += glyph.advance;
        }
    }

    /// Refresh cached bind groups for the current font and sprites.
    pub fn prepare(&mut self, gpu: &GpuContext, assets: &Assets) {
        if let Some((id, atlas)) = assets.default_font_entry() {
            let stale = self.font_bind_group.as_ref().map(|(cached, _)| *cached) != Some(id);
            if stale {
                let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Font Bind Group"),
                    layout: &self.texture_bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&atlas.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&atlas.sampler),
                        },
                    ],
                });
                self.font_bind_group = Some((id, bind_group));
            }
        }

        for (name, texture) in assets.sprites() {
            if !self.sprite_bind_groups.contains_key(name) {
                let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Sprite Bind Group"),
                    layout: &self.texture_bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&texture.sampler),
                        },
                    ],
                });
                self.sprite_bind_groups.insert(name.clone(), bind_group);
            }
        }
    }

    /// Render the current batches into an open pass.
    pub fn render(&self, gpu: &GpuContext, render_pass: &mut wgpu::RenderPass) {
        let total = self.colored.len()
            + self.text.len()
            + self.sprites.iter().map(|(_, v)| v.len()).sum::<usize>();
        if total == 0 {
            return;
        }
        if total > MAX_VERTICES {
            log::warn!("draw list exceeds {MAX_VERTICES} vertices, truncating");
        }

        let uniforms = Draw2dUniforms {
            resolution: [gpu.width() as f32, gpu.height() as f32],
            _padding: [0.0, 0.0],
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut offset = 0usize;
        let mut write = |offset: &mut usize, vertices: &[Vertex2d]| -> Option<(u32, u32)> {
            if vertices.is_empty() || *offset + vertices.len() > MAX_VERTICES {
                return None;
            }
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                (*offset * std::mem::size_of::<Vertex2d>()) as u64,
                bytemuck::cast_slice(vertices),
            );
            let range = (*offset as u32, (*offset + vertices.len()) as u32);
            *offset += vertices.len();
            Some(range)
        };

        if let Some((start, end)) = write(&mut offset, &self.colored) {
            render_pass.set_pipeline(&self.colored_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.draw(start..end, 0..1);
        }

        if let Some((_, bind_group)) = &self.font_bind_group {
            if let Some((start, end)) = write(&mut offset, &self.text) {
                render_pass.set_pipeline(&self.text_pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_bind_group(1, bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(start..end, 0..1);
            }
        }

        for (name, vertices) in &self.sprites {
            let Some(bind_group) = self.sprite_bind_groups.get(name) else {
                continue;
            };
            if let Some((start, end)) = write(&mut offset, vertices) {
                render_pass.set_pipeline(&self.sprite_pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_bind_group(1, bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(start..end, 0..1);
            }
        }
    }
}

fn push_quad(out: &mut Vec<Vertex2d>, rect: &Rect, uv: [f32; 4], color: &Color) {
    let x0 = rect.x;
    let y0 = rect.y;
    let x1 = rect.x + rect.width;
    let y1 = rect.y + rect.height;
    let c = [color.r, color.g, color.b, color.a];
    let [u0, v0, u1, v1] = uv;

    out.extend_from_slice(&[
        Vertex2d {
            position: [x0, y0],
            uv: [u0, v0],
            color: c,
        },
        Vertex2d {
            position: [x1, y0],
            uv: [u1, v0],
            color: c,
        },
        Vertex2d {
            position: [x0, y1],
            uv: [u0, v1],
            color: c,
        },
        Vertex2d {
            position: [x1, y0],
            uv: [u1, v0],
            color: c,
        },
        Vertex2d {
            position: [x1, y1],
            uv: [u1, v1],
            color: c,
        },
        Vertex2d {
            position: [x0, y1],
            uv: [u0, v1],
            color: c,
        },
    ]);
}

const DRAW2D_SHADER: &str = r#"
struct Uniforms {
    resolution: vec2f,
    _pad: vec2f,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VsIn {
    @location(0) position: vec2f,
    @location(1) uv: vec2f,
    @location(2) color: vec4f,
}

struct VsOut {
    @builtin(position) clip: vec4f,
    @location(0) uv: vec2f,
    @location(1) color: vec4f,
}

@vertex
fn vs(in: VsIn) -> VsOut {
    var out: VsOut;
    let ndc = vec2f(
        in.position.x / u.resolution.x * 2.0 - 1.0,
        1.0 - in.position.y / u.resolution.y * 2.0,
    );
    out.clip = vec4f(ndc, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_colored(in: VsOut) -> @location(0) vec4f {
    return in.color;
}

@group(1) @binding(0) var tex: texture_2d<f32>;
@group(1) @binding(1) var tex_sampler: sampler;

@fragment
fn fs_text(in: VsOut) -> @location(0) vec4f {
    let coverage = textureSample(tex, tex_sampler, in.uv).r;
    return vec4f(in.color.rgb, in.color.a * coverage);
}

@fragment
fn fs_sprite(in: VsOut) -> @location(0) vec4f {
    return textureSample(tex, tex_sampler, in.uv) * in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Vec2::new(10.0, 10.0)));
        assert!(r.contains(Vec2::new(29.9, 29.9)));
        assert!(!r.contains(Vec2::new(30.0, 30.0)));
        assert!(!r.contains(Vec2::new(9.9, 15.0)));
    }

    #[test]
    fn canvas_clear_keeps_background() {
        let mut canvas = Canvas::new();
        canvas.set_background(Color::BLACK);
        canvas.rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        canvas.text(0.0, 0.0, "hi", Color::WHITE);
        assert_eq!(canvas.cmds().len(), 2);

        canvas.clear();
        assert!(canvas.is_empty());
        assert_eq!(canvas.background(), Some(Color::BLACK));
    }

    #[test]
    fn panel_emits_background_and_four_border_strips() {
        let mut canvas = Canvas::new();
        canvas.panel(
            Rect::new(0.0, 0.0, 100.0, 50.0),
            Color::PANEL_BG,
            Color::PANEL_BORDER,
        );
        assert_eq!(canvas.cmds().len(), 5);
    }
}
