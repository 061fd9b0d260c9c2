use std::mem;
use std::sync::Arc;

use anyhow::Context;
use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::ad_texture::TexturePool;
use crate::camera::{OrbitCamera, Projection};
use crate::hud::UiVertex;
use crate::lighting::SceneLighting;
use crate::scene::{grid_lines, FrameScene, LineVertex, GRID_EXTENT, GRID_STEP};
use crate::texture::AdTextureArray;
use crate::tube::{PanelDraw, PanelPass, PanelVertex, TubeMesh};

const PANEL_SHADER_SOURCE: &str = include_str!("panel.wgsl");
const GRID_SHADER_SOURCE: &str = include_str!("grid.wgsl");
const UI_SHADER_SOURCE: &str = include_str!("ui_shader.wgsl");

const INITIAL_PANEL_VERTEX_CAPACITY: usize = 8192;
const INITIAL_PANEL_INDEX_CAPACITY: usize = 12288;
const INITIAL_UI_VERTEX_CAPACITY: usize = 4096;
const INITIAL_UI_INDEX_CAPACITY: usize = 6144;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    fn identity() -> Self {
        Self {
            view_proj: Matrix4::<f32>::identity().into(),
        }
    }

    fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self {
            view_proj: matrix.into(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LightingUniform {
    ambient: [f32; 4],
    light_color: [f32; 4],
    direction: [f32; 4],
}

impl LightingUniform {
    fn from_lighting(lighting: &SceneLighting) -> Self {
        let [ar, ag, ab] = lighting.ambient;
        let [lr, lg, lb] = lighting.light_color;
        let d = lighting.direction;
        Self {
            ambient: [ar, ag, ab, 1.0],
            light_color: [lr, lg, lb, 1.0],
            direction: [d.x, d.y, d.z, 0.0],
        }
    }
}

struct DepthTexture {
    view: wgpu::TextureView,
}

impl DepthTexture {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    fn create(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view }
    }
}

pub struct Renderer<'window> {
    size: PhysicalSize<u32>,
    surface: wgpu::Surface<'window>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    ad_textures: AdTextureArray,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    _camera_bind_group_layout: wgpu::BindGroupLayout,
    lighting_buffer: wgpu::Buffer,
    lighting_bind_group: wgpu::BindGroup,
    _lighting_bind_group_layout: wgpu::BindGroupLayout,
    panel_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    ui_pipeline: wgpu::RenderPipeline,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    show_grid: bool,
    panel_vertex_buffer: wgpu::Buffer,
    panel_index_buffer: wgpu::Buffer,
    panel_vertex_capacity: usize,
    panel_index_capacity: usize,
    panel_draws: Vec<PanelDraw>,
    ui_vertex_buffer: wgpu::Buffer,
    ui_index_buffer: wgpu::Buffer,
    ui_vertex_capacity: usize,
    ui_index_capacity: usize,
    ui_index_count: u32,
    clear_color: wgpu::Color,
}

impl<'window> Renderer<'window> {
    pub fn new(
        window: &'window Window,
        texture_layers: u32,
        texture_size: u32,
    ) -> anyhow::Result<Self> {
        pollster::block_on(Self::new_async(window, texture_layers, texture_size))
    }

    async fn new_async(
        window: &'window Window,
        texture_layers: u32,
        texture_size: u32,
    ) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            dx12_shader_compiler: Default::default(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create a rendering surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("renderer_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("failed to open the GPU device")?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| {
                matches!(
                    mode,
                    wgpu::PresentMode::Mailbox | wgpu::PresentMode::AutoVsync
                )
            })
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
        surface.configure(device.as_ref(), &config);

        let ad_textures = AdTextureArray::new(device.as_ref(), texture_layers, texture_size);

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("camera_bind_group_layout"),
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

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::identity()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let lighting_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("lighting_bind_group_layout"),
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

        let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lighting_buffer"),
            contents: bytemuck::bytes_of(&LightingUniform::from_lighting(&SceneLighting::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let lighting_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lighting_bind_group"),
            layout: &lighting_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lighting_buffer.as_entire_binding(),
            }],
        });

        let panel_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("panel_shader"),
            source: wgpu::ShaderSource::Wgsl(PANEL_SHADER_SOURCE.into()),
        });
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(GRID_SHADER_SOURCE.into()),
        });
        let ui_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ui_shader"),
            source: wgpu::ShaderSource::Wgsl(UI_SHADER_SOURCE.into()),
        });

        let panel_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("panel_pipeline_layout"),
                bind_group_layouts: &[
                    &camera_bind_group_layout,
                    &ad_textures.bind_group_layout,
                    &lighting_bind_group_layout,
                ],
                push_constant_ranges: &[],
            });

        // Panels are flat quads seen from both sides of the tube.
        let panel_primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        };

        let panel_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("panel_pipeline"),
            layout: Some(&panel_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &panel_shader,
                entry_point: "vs_main",
                buffers: &[panel_vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &panel_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: panel_primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let glow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("glow_pipeline"),
            layout: Some(&panel_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &panel_shader,
                entry_point: "vs_main",
                buffers: &[panel_vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &panel_shader,
                entry_point: "fs_glow",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: panel_primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let grid_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid_pipeline_layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&grid_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: "vs_main",
                buffers: &[line_vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let ui_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ui_pipeline_layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let ui_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ui_pipeline"),
            layout: Some(&ui_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ui_shader,
                entry_point: "vs_main",
                buffers: &[ui_vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &ui_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let grid = grid_lines(GRID_EXTENT, GRID_STEP);
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let panel_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panel_vertex_buffer"),
            size: (INITIAL_PANEL_VERTEX_CAPACITY * mem::size_of::<PanelVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let panel_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("panel_index_buffer"),
            size: (INITIAL_PANEL_INDEX_CAPACITY * mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ui_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ui_vertex_buffer"),
            size: (INITIAL_UI_VERTEX_CAPACITY * mem::size_of::<UiVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let ui_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ui_index_buffer"),
            size: (INITIAL_UI_INDEX_CAPACITY * mem::size_of::<u16>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = DepthTexture::create(device.as_ref(), &config);

        Ok(Self {
            size,
            surface,
            device,
            queue,
            config,
            depth_texture,
            ad_textures,
            camera_buffer,
            camera_bind_group,
            _camera_bind_group_layout: camera_bind_group_layout,
            lighting_buffer,
            lighting_bind_group,
            _lighting_bind_group_layout: lighting_bind_group_layout,
            panel_pipeline,
            glow_pipeline,
            grid_pipeline,
            ui_pipeline,
            grid_vertex_buffer,
            grid_vertex_count: grid.len() as u32,
            show_grid: true,
            panel_vertex_buffer,
            panel_index_buffer,
            panel_vertex_capacity: INITIAL_PANEL_VERTEX_CAPACITY,
            panel_index_capacity: INITIAL_PANEL_INDEX_CAPACITY,
            panel_draws: Vec::new(),
            ui_vertex_buffer,
            ui_index_buffer,
            ui_vertex_capacity: INITIAL_UI_VERTEX_CAPACITY,
            ui_index_capacity: INITIAL_UI_INDEX_CAPACITY,
            ui_index_count: 0,
            clear_color: wgpu::Color::BLACK,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>, projection: &mut Projection) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        projection.resize(new_size.width, new_size.height);
        self.surface.configure(self.device.as_ref(), &self.config);
        self.depth_texture = DepthTexture::create(self.device.as_ref(), &self.config);
    }

    fn reconfigure_surface(&mut self) {
        self.surface.configure(self.device.as_ref(), &self.config);
        self.depth_texture = DepthTexture::create(self.device.as_ref(), &self.config);
    }

    pub fn update_camera(&mut self, camera: &OrbitCamera, projection: &Projection) {
        let uniform = CameraUniform::from_matrix(camera.calc_matrix(projection));
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn update_lighting(&mut self, lighting: &SceneLighting) {
        let uniform = LightingUniform::from_lighting(lighting);
        self.queue
            .write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn upload_textures(&mut self, pool: &TexturePool) {
        self.ad_textures.upload(self.queue.as_ref(), pool);
    }

    /// Hands one composed frame to the GPU. The pool must be the one the
    /// scene's tiles index into.
    pub fn prepare(&mut self, scene: &FrameScene, pool: &TexturePool) {
        debug_assert_eq!(pool.len() as u32, self.ad_textures.layers());
        self.clear_color = scene.clear_color;
        self.show_grid = scene.show_grid;
        self.update_lighting(&scene.lighting);
        self.upload_textures(pool);
        self.update_tube(&scene.tube);
        self.update_ui(&scene.hud.vertices, &scene.hud.indices);
    }

    pub fn update_tube(&mut self, mesh: &TubeMesh) {
        self.ensure_panel_capacity(mesh.vertices.len(), mesh.indices.len());

        if !mesh.vertices.is_empty() {
            self.queue.write_buffer(
                &self.panel_vertex_buffer,
                0,
                bytemuck::cast_slice(&mesh.vertices),
            );
        }
        if !mesh.indices.is_empty() {
            self.queue.write_buffer(
                &self.panel_index_buffer,
                0,
                bytemuck::cast_slice(&mesh.indices),
            );
        }
        self.panel_draws.clear();
        self.panel_draws.extend(mesh.draws.iter().cloned());
    }

    pub fn update_ui(&mut self, vertices: &[UiVertex], indices: &[u16]) {
        self.ensure_ui_capacity(vertices.len(), indices.len());

        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.ui_vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }
        if !indices.is_empty() {
            self.queue
                .write_buffer(&self.ui_index_buffer, 0, bytemuck::cast_slice(indices));
        }
        self.ui_index_count = indices.len() as u32;
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                return match err {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        self.reconfigure_surface();
                        Ok(())
                    }
                    wgpu::SurfaceError::Timeout => Ok(()),
                    wgpu::SurfaceError::OutOfMemory => Err(err),
                };
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if self.show_grid && self.grid_vertex_count > 0 {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_bind_group(0, &self.camera_bind_group, &[]);
                pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
                pass.draw(0..self.grid_vertex_count, 0..1);
            }

            if !self.panel_draws.is_empty() {
                pass.set_bind_group(0, &self.camera_bind_group, &[]);
                pass.set_bind_group(1, &self.ad_textures.bind_group, &[]);
                pass.set_bind_group(2, &self.lighting_bind_group, &[]);
                pass.set_vertex_buffer(0, self.panel_vertex_buffer.slice(..));
                pass.set_index_buffer(self.panel_index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                let mut bound = None;
                for draw in &self.panel_draws {
                    if bound != Some(draw.pass) {
                        pass.set_pipeline(match draw.pass {
                            PanelPass::Glow => &self.glow_pipeline,
                            PanelPass::Main => &self.panel_pipeline,
                        });
                        bound = Some(draw.pass);
                    }
                    pass.draw_indexed(draw.indices.clone(), 0, 0..1);
                }
            }
        }

        if self.ui_index_count > 0 {
            let mut ui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            ui_pass.set_pipeline(&self.ui_pipeline);
            ui_pass.set_vertex_buffer(0, self.ui_vertex_buffer.slice(..));
            ui_pass.set_index_buffer(self.ui_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            ui_pass.draw_indexed(0..self.ui_index_count, 0, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn ensure_panel_capacity(&mut self, vertices: usize, indices: usize) {
        let vertices = vertices.max(1);
        if vertices > self.panel_vertex_capacity {
            self.panel_vertex_capacity = vertices.next_power_of_two();
            self.panel_vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("panel_vertex_buffer"),
                size: (self.panel_vertex_capacity * mem::size_of::<PanelVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }

        let indices = indices.max(1);
        if indices > self.panel_index_capacity {
            self.panel_index_capacity = indices.next_power_of_two();
            self.panel_index_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("panel_index_buffer"),
                size: (self.panel_index_capacity * mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }
    }

    fn ensure_ui_capacity(&mut self, vertices: usize, indices: usize) {
        let vertices = vertices.max(1);
        if vertices > self.ui_vertex_capacity {
            self.ui_vertex_capacity = vertices.next_power_of_two();
            self.ui_vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("ui_vertex_buffer"),
                size: (self.ui_vertex_capacity * mem::size_of::<UiVertex>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }

        let indices = indices.max(1);
        if indices > self.ui_index_capacity {
            self.ui_index_capacity = indices.next_power_of_two();
            self.ui_index_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("ui_index_buffer"),
                size: (self.ui_index_capacity * mem::size_of::<u16>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }
    }
}

fn panel_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<PanelVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 12,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 24,
                shader_location: 2,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 32,
                shader_location: 3,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Uint32,
                offset: 48,
                shader_location: 4,
            },
        ],
    }
}

fn line_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 12,
                shader_location: 1,
            },
        ],
    }
}

fn ui_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<UiVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 8,
                shader_location: 1,
            },
        ],
    }
}
