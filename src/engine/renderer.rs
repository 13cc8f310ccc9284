use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use wgpu::util::DeviceExt;
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, window::Window};

use super::fonts::FontManager;
use super::resources::ResourceManager;
use crate::gui::canvas::{Color, Cube, DrawCommand, DrawList, FontId, Rect, TextAnchor, TextureId};

/// Frames a rasterised string may go unused before its texture is dropped.
const TEXT_CACHE_FRAMES: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Binding {
    White,
    Texture(TextureId),
    Text(usize),
}

struct GpuTexture {
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct TextKey {
    font: FontId,
    text: String,
    color: [u8; 4],
}

struct CachedText {
    slot: usize,
    last_used: u64,
}

struct Batch {
    binding: Binding,
    start: u32,
    end: u32,
}

pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    clear_color: wgpu::Color,
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    textures: HashMap<TextureId, GpuTexture>,
    text_slots: Vec<Option<GpuTexture>>,
    text_cache: HashMap<TextKey, CachedText>,
    frame: u64,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, clear: [f64; 3]) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|err| anyhow!("failed to create surface: {err}"))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No suitable GPU adapters found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("arcadia-renderer-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Mailbox)
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| surface_caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("arcadia-ui-shader"),
            source: wgpu::ShaderSource::Wgsl(UI_SHADER.into()),
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("arcadia-texture-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("arcadia-ui-pipeline-layout"),
            bind_group_layouts: &[&texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("arcadia-ui-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[UiVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("arcadia-ui-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white_image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let white = upload(&device, &queue, &texture_layout, &sampler, &white_image, "arcadia-white");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            clear_color: wgpu::Color {
                r: clear[0],
                g: clear[1],
                b: clear[2],
                a: 1.0,
            },
            pipeline,
            texture_layout,
            sampler,
            white,
            textures: HashMap::new(),
            text_slots: Vec::new(),
            text_cache: HashMap::new(),
            frame: 0,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Drops the GPU copy of `texture` so the next draw re-uploads it.
    pub fn invalidate_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    pub fn render(
        &mut self,
        list: &DrawList,
        resources: &ResourceManager,
        fonts: &FontManager,
    ) -> Result<(), SurfaceError> {
        self.frame += 1;
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let screen = (self.size.width as f32, self.size.height as f32);
        let mut builder = BatchBuilder::new(screen);
        for (corners, color) in project_cubes(list.cubes(), screen) {
            builder.push_polygon(&corners, color.to_array());
        }
        for command in list.commands() {
            self.push_command(&mut builder, command, resources, fonts);
        }
        self.evict_stale_text();

        let vertex_buffer = if builder.vertices.is_empty() {
            None
        } else {
            Some(
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("arcadia-ui-vertex-buffer"),
                        contents: bytemuck::cast_slice(&builder.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
            )
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("arcadia-render-encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("arcadia-render-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(buffer) = vertex_buffer.as_ref() {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                for batch in &builder.batches {
                    let Some(texture) = self.binding(batch.binding) else {
                        continue;
                    };
                    render_pass.set_bind_group(0, &texture.bind_group, &[]);
                    render_pass.draw(batch.start..batch.end, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn binding(&self, binding: Binding) -> Option<&GpuTexture> {
        match binding {
            Binding::White => Some(&self.white),
            Binding::Texture(id) => self.textures.get(&id),
            Binding::Text(slot) => self.text_slots.get(slot).and_then(Option::as_ref),
        }
    }

    fn push_command(
        &mut self,
        builder: &mut BatchBuilder,
        command: &DrawCommand,
        resources: &ResourceManager,
        fonts: &FontManager,
    ) {
        match command {
            DrawCommand::Texture {
                texture,
                src,
                dst,
                tint,
            } => {
                let Some(size) = self.ensure_texture(*texture, resources) else {
                    return;
                };
                let uv = src.map_or([0.0, 0.0, 1.0, 1.0], |src| texel_uv(src, size));
                builder.push_quad(Binding::Texture(*texture), *dst, uv, tint.to_array());
            }
            DrawCommand::Fill { rect, color } => {
                builder.push_quad(Binding::White, *rect, FULL_UV, color.to_array());
            }
            DrawCommand::Stroke { rect, color, width } => {
                for edge in stroke_edges(*rect, *width) {
                    builder.push_quad(Binding::White, edge, FULL_UV, color.to_array());
                }
            }
            DrawCommand::Text {
                font,
                text,
                anchor,
                color,
            } => {
                let Some((slot, size)) = self.ensure_text(*font, text, *color, fonts) else {
                    return;
                };
                let (w, h) = (size.0 as i32, size.1 as i32);
                let dst = match *anchor {
                    TextAnchor::TopLeft { x, y } => Rect::new(x, y, w, h),
                    TextAnchor::Centered(area) => {
                        let (cx, cy) = area.center();
                        Rect::new(cx - w / 2, cy - h / 2, w, h)
                    }
                };
                builder.push_quad(Binding::Text(slot), dst, FULL_UV, [1.0; 4]);
            }
        }
    }

    fn ensure_texture(&mut self, id: TextureId, resources: &ResourceManager) -> Option<(u32, u32)> {
        if let Some(texture) = self.textures.get(&id) {
            return Some(texture.size);
        }
        let Some(image) = resources.texture(id) else {
            tracing::warn!(target: "engine", texture = id.0, "draw references unknown texture");
            return None;
        };
        let label = resources.key(id).unwrap_or("arcadia-texture");
        let texture = upload(&self.device, &self.queue, &self.texture_layout, &self.sampler, image, label);
        let size = texture.size;
        self.textures.insert(id, texture);
        Some(size)
    }

    fn ensure_text(
        &mut self,
        font: FontId,
        text: &str,
        color: Color,
        fonts: &FontManager,
    ) -> Option<(usize, (u32, u32))> {
        let key = TextKey {
            font,
            text: text.to_owned(),
            color: color.to_rgba8(),
        };
        if let Some(cached) = self.text_cache.get_mut(&key) {
            cached.last_used = self.frame;
            let size = self.text_slots.get(cached.slot)?.as_ref()?.size;
            return Some((cached.slot, size));
        }

        let image = fonts.rasterize(font, text, color)?;
        let texture = upload(&self.device, &self.queue, &self.texture_layout, &self.sampler, &image, "arcadia-text");
        let size = texture.size;
        let slot = match self.text_slots.iter().position(Option::is_none) {
            Some(free) => {
                self.text_slots[free] = Some(texture);
                free
            }
            None => {
                self.text_slots.push(Some(texture));
                self.text_slots.len() - 1
            }
        };
        self.text_cache.insert(
            key,
            CachedText {
                slot,
                last_used: self.frame,
            },
        );
        Some((slot, size))
    }

    fn evict_stale_text(&mut self) {
        let frame = self.frame;
        let slots = &mut self.text_slots;
        self.text_cache.retain(|_, cached| {
            let keep = frame - cached.last_used <= TEXT_CACHE_FRAMES;
            if !keep {
                if let Some(slot) = slots.get_mut(cached.slot) {
                    *slot = None;
                }
            }
            keep
        });
    }
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &RgbaImage,
    label: &str,
) -> GpuTexture {
    let (width, height) = image.dimensions();
    let extent = wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        extent,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        bind_group,
        size: (width, height),
    }
}

const FULL_UV: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// `src` in texture pixels to `[u0, v0, u1, v1]`.
fn texel_uv(src: Rect, (width, height): (u32, u32)) -> [f32; 4] {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    [
        src.x as f32 / w,
        src.y as f32 / h,
        (src.x + src.width) as f32 / w,
        (src.y + src.height) as f32 / h,
    ]
}

/// Four filled strips that outline `rect` from the inside.
fn stroke_edges(rect: Rect, width: i32) -> [Rect; 4] {
    let w = width.max(1).min(rect.width / 2).min(rect.height / 2).max(1);
    [
        Rect::new(rect.x, rect.y, rect.width, w),
        Rect::new(rect.x, rect.y + rect.height - w, rect.width, w),
        Rect::new(rect.x, rect.y + w, w, rect.height - 2 * w),
        Rect::new(rect.x + rect.width - w, rect.y + w, w, rect.height - 2 * w),
    ]
}

/// Accumulates vertices and splits them into runs that share a texture.
struct BatchBuilder {
    screen: (f32, f32),
    vertices: Vec<UiVertex>,
    batches: Vec<Batch>,
}

impl BatchBuilder {
    fn new(screen: (f32, f32)) -> Self {
        Self {
            screen,
            vertices: Vec::new(),
            batches: Vec::new(),
        }
    }

    fn to_ndc(&self, x: f32, y: f32) -> [f32; 2] {
        let (width, height) = self.screen;
        [(x / width) * 2.0 - 1.0, 1.0 - (y / height) * 2.0]
    }

    fn push_quad(&mut self, binding: Binding, rect: Rect, uv: [f32; 4], color: [f32; 4]) {
        if rect.is_empty() || self.screen.0 <= 0.0 || self.screen.1 <= 0.0 {
            return;
        }
        let left = rect.x as f32;
        let right = (rect.x + rect.width) as f32;
        let top = rect.y as f32;
        let bottom = (rect.y + rect.height) as f32;
        let [u0, v0, u1, v1] = uv;

        let v0_ = UiVertex::new(self.to_ndc(left, top), [u0, v0], color);
        let v1_ = UiVertex::new(self.to_ndc(right, top), [u1, v0], color);
        let v2_ = UiVertex::new(self.to_ndc(right, bottom), [u1, v1], color);
        let v3_ = UiVertex::new(self.to_ndc(left, bottom), [u0, v1], color);
        self.extend(binding, &[v0_, v2_, v1_, v0_, v3_, v2_]);
    }

    /// Convex polygon in screen pixels, fanned from its first corner.
    fn push_polygon(&mut self, corners: &[[f32; 2]], color: [f32; 4]) {
        if corners.len() < 3 || self.screen.0 <= 0.0 || self.screen.1 <= 0.0 {
            return;
        }
        let first = UiVertex::new(self.to_ndc(corners[0][0], corners[0][1]), [0.0, 0.0], color);
        let mut triangles = Vec::with_capacity((corners.len() - 2) * 3);
        for pair in corners[1..].windows(2) {
            triangles.push(first);
            triangles.push(UiVertex::new(self.to_ndc(pair[0][0], pair[0][1]), [0.0, 0.0], color));
            triangles.push(UiVertex::new(self.to_ndc(pair[1][0], pair[1][1]), [0.0, 0.0], color));
        }
        self.extend(Binding::White, &triangles);
    }

    fn extend(&mut self, binding: Binding, vertices: &[UiVertex]) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        let end = self.vertices.len() as u32;
        match self.batches.last_mut() {
            Some(batch) if batch.binding == binding && batch.end == start => batch.end = end,
            _ => self.batches.push(Batch { binding, start, end }),
        }
    }
}

/// Distance from the eye to the projection plane, in units of screen height.
const FOCAL: f32 = 1.2;

const CUBE_FACES: [([usize; 4], [f32; 3]); 6] = [
    ([0, 1, 2, 3], [0.0, 0.0, -1.0]),
    ([5, 4, 7, 6], [0.0, 0.0, 1.0]),
    ([4, 0, 3, 7], [-1.0, 0.0, 0.0]),
    ([1, 5, 6, 2], [1.0, 0.0, 0.0]),
    ([4, 5, 1, 0], [0.0, 1.0, 0.0]),
    ([3, 2, 6, 7], [0.0, -1.0, 0.0]),
];

fn rotate(v: [f32; 3], [rx, ry, rz]: [f32; 3]) -> [f32; 3] {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();
    let [x, y, z] = v;
    let (y, z) = (y * cx - z * sx, y * sx + z * cx);
    let (x, z) = (x * cy + z * sy, -x * sy + z * cy);
    let (x, y) = (x * cz - y * sz, x * sz + y * cz);
    [x, y, z]
}

/// Projects cubes with a fixed camera at the origin looking down +z and
/// returns their visible faces back to front with simple directional shading.
fn project_cubes(cubes: &[Cube], (width, height): (f32, f32)) -> Vec<([[f32; 2]; 4], Color)> {
    const LIGHT: [f32; 3] = [0.3, 0.5, -0.8];
    let focal = height * FOCAL;
    let mut faces = Vec::new();

    for cube in cubes {
        let half = cube.size / 2.0;
        let corners: Vec<[f32; 3]> = [
            [-1.0, 1.0, -1.0],
            [1.0, 1.0, -1.0],
            [1.0, -1.0, -1.0],
            [-1.0, -1.0, -1.0],
            [-1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, -1.0, 1.0],
            [-1.0, -1.0, 1.0],
        ]
        .iter()
        .map(|&[x, y, z]| {
            let [x, y, z] = rotate([x * half, y * half, z * half], cube.rotation);
            [x + cube.center[0], y + cube.center[1], z + cube.center[2]]
        })
        .collect();
        if corners.iter().any(|corner| corner[2] <= 0.01) {
            continue;
        }

        for (indices, normal) in CUBE_FACES {
            let normal = rotate(normal, cube.rotation);
            let first = corners[indices[0]];
            // Back faces point the same way as the ray from the eye.
            if dot(normal, first) >= 0.0 {
                continue;
            }
            let depth = indices.iter().map(|&i| corners[i][2]).sum::<f32>() / 4.0;
            let light = 0.35 + 0.65 * (-dot(normal, LIGHT)).max(0.0);
            let shade = Color::rgba(
                cube.color.r * light,
                cube.color.g * light,
                cube.color.b * light,
                cube.color.a,
            );
            let screen = indices.map(|i| {
                let [x, y, z] = corners[i];
                [width / 2.0 + x * focal / z, height / 2.0 - y * focal / z]
            });
            faces.push((depth, screen, shade));
        }
    }

    faces.sort_by(|a, b| b.0.total_cmp(&a.0));
    faces.into_iter().map(|(_, screen, shade)| (screen, shade)).collect()
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct UiVertex {
    position: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl UiVertex {
    fn new(position: [f32; 2], uv: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, uv, color }
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<UiVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as u64,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: (2 * std::mem::size_of::<[f32; 2]>()) as u64,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

const UI_SHADER: &str = r#"
struct VsIn {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
};

struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@group(0) @binding(0) var t_diffuse: texture_2d<f32>;
@group(0) @binding(1) var s_diffuse: sampler;

@vertex
fn vs_main(in: VsIn) -> VsOut {
    var out: VsOut;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(t_diffuse, s_diffuse, in.uv) * in.color;
}
"#;
