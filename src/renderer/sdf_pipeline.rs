//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in fragment shader using signed distance fields.
//! Only uniform buffers are used so the pipeline also runs under WebGL2 limits.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::GAME_OVER_COOLDOWN_FRAMES;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState};

/// Maximum number of pipe pairs drawn
pub const MAX_PIPES: usize = 16;

/// Idle bob on the start screen
const BOB_AMPLITUDE: f32 = 6.0;
const BOB_SPEED: f32 = 3.0;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Globals {
    resolution: [f32; 2], // offset 0
    world_size: [f32; 2], // offset 8
    time: f32,            // offset 16
    pipe_count: u32,      // offset 20
    phase: u32,           // offset 24
    flash: f32,           // offset 28
    bird: [f32; 4],       // offset 32 - x, y, width, height
    bird_velocity: f32,   // offset 48
    ground_height: f32,   // offset 52
    scroll: f32,          // offset 56
    bob: f32,             // offset 60
    skin: u32,            // offset 64
    _pad: [u32; 3],       // offset 68
}

/// One pair per vec4: x, gap_start, gap_end, width
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct PipesUniform {
    data: [[f32; 4]; MAX_PIPES],
}

fn phase_code(phase: GamePhase) -> u32 {
    match phase {
        GamePhase::Ready => 0,
        GamePhase::Playing => 1,
        GamePhase::Paused => 2,
        GamePhase::GameOver => 3,
    }
}

/// Pack the session into shader uniforms. `time` is in seconds.
pub(crate) fn pack_scene(
    state: &GameState,
    settings: &Settings,
    resolution: (u32, u32),
    time: f32,
) -> (Globals, PipesUniform) {
    let config = &state.config;

    let mut pipes = PipesUniform::zeroed();
    let mut pipe_count = 0;
    for (slot, pair) in pipes.data.iter_mut().zip(state.stream.iter()) {
        *slot = [pair.x, pair.gap_start, pair.gap_end(), pair.width];
        pipe_count += 1;
    }

    // Render-only: the simulated y stays put on the start screen
    let bob = if state.phase == GamePhase::Ready && !settings.reduced_motion {
        (time * BOB_SPEED).sin() * BOB_AMPLITUDE
    } else {
        0.0
    };

    let flash = if state.phase == GamePhase::GameOver {
        state.cooldown as f32 / GAME_OVER_COOLDOWN_FRAMES.max(1) as f32 * settings.flash_strength()
    } else {
        0.0
    };

    let bird = &state.bird;
    let globals = Globals {
        resolution: [resolution.0 as f32, resolution.1 as f32],
        world_size: [config.world_width, config.world_height],
        time,
        pipe_count,
        phase: phase_code(state.phase),
        flash,
        bird: [bird.x, bird.y, bird.width, bird.height],
        bird_velocity: if state.phase == GamePhase::Ready {
            0.0
        } else {
            bird.velocity
        },
        ground_height: config.ground_height,
        scroll: state.frame as f32 * config.pipe_speed,
        bob,
        skin: settings.skin() as u32,
        _pad: [0; 3],
    };

    (globals, pipes)
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    // Uniform buffers
    globals_buffer: wgpu::Buffer,
    pipes_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let pipes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pipes"),
            contents: bytemuck::bytes_of(&PipesUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pipes_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
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
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            pipes_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from game state and render. `time` is the
    /// requestAnimationFrame timestamp in milliseconds.
    pub fn render(
        &mut self,
        state: &GameState,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        let elapsed = ((time - self.start_time) / 1000.0) as f32;
        let (globals, pipes) = pack_scene(state, settings, self.size, elapsed);
        if state.stream.len() > MAX_PIPES {
            log::warn!(
                "{} pairs in flight, drawing the first {}",
                state.stream.len(),
                MAX_PIPES
            );
        }

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue
            .write_buffer(&self.pipes_buffer, 0, bytemuck::bytes_of(&pipes));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
