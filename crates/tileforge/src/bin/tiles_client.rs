//! # TILEFORGE Demo Client
//!
//! Seven tinted tiles, three mesh kinds, one batch: the whole scene
//! renders with a single buffer bind and three indexed instanced
//! draws. A and D orbit the camera a quarter turn at a time, ESC
//! exits.

use std::sync::Arc;

use tileforge::camera::{multiply_matrices, perspective, rotate_y, translate, ViewCycle};
use tileforge::meshes::{big_tile, dented_tile, spike_tile, TileVertex};
use tileforge_rendering::{AttributeFormat, InstanceSchema, MeshPacker, UniformArray};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt as _;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

/// One per-instance record: tint then model matrix, matching the
/// schema `[Float32x3, Mat4]` at locations 2..6.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TileInstance {
    tint: [f32; 3],
    model: [[f32; 4]; 4],
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().compact())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // =========================================================================
    // SCENE ASSEMBLY
    // =========================================================================
    let mut packer: MeshPacker<TileVertex, u16> = MeshPacker::new();
    for mesh in [dented_tile(), spike_tile(), big_tile()] {
        packer
            .add_mesh(&mesh.vertices, &mesh.indices)
            .expect("tile meshes fit in memory");
    }
    tracing::info!(
        meshes = packer.mesh_count(),
        vertices = packer.vertex_count(),
        indices = packer.index_count(),
        "packed tile meshes"
    );

    let schema = InstanceSchema::new(&[AttributeFormat::Float32x3, AttributeFormat::Mat4])
        .expect("schema has fields");
    let mut batch = packer.into_batch(schema);
    batch
        .set_attrib_locations(&[2, 3])
        .expect("one location per schema field");

    // Dented tiles.
    let scene = [
        (0, [1.0, 0.0, 0.0], translate([-3.0, 0.0, 1.0])),
        (0, [1.0, 0.0, 1.0], translate([1.0, 0.0, -3.0])),
        (
            0,
            [1.0, 0.0, 1.0],
            multiply_matrices(translate([1.0, 0.0, 3.0]), rotate_y(90.0f32.to_radians())),
        ),
        // Spike tiles.
        (1, [0.0, 0.0, 1.0], translate([3.0, 0.0, 1.0])),
        (1, [1.0, 1.0, 0.0], translate([-1.0, 0.0, -3.0])),
        (1, [0.0, 0.0, 1.0], translate([-3.0, 0.0, -1.0])),
        // The big tile under everything.
        (2, [1.0, 0.5, 0.5], translate([0.0, 0.0, 0.0])),
    ];
    for (mesh, tint, model) in scene {
        batch
            .push_instance(mesh, &TileInstance { tint, model })
            .expect("scene instances are well formed");
    }

    let mut view_cycle = ViewCycle::new();

    // =========================================================================
    // WINDOW + GPU SETUP
    // =========================================================================
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let window = WindowBuilder::new()
        .with_title("3D Tiles")
        .with_inner_size(PhysicalSize::new(640, 480))
        .build(&event_loop)
        .expect("Failed to create window");
    let window = Arc::new(window);

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let surface = instance
        .create_surface(window.clone())
        .expect("Failed to create surface");
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))
    .expect("No GPU adapter found");
    tracing::info!(adapter = %adapter.get_info().name, "adapter selected");

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("TILEFORGE"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        },
        None,
    ))
    .expect("Failed to create device");

    let size = window.inner_size();
    let caps = surface.get_capabilities(&adapter);
    let format = caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .copied()
        .unwrap_or(caps.formats[0]);
    let mut config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &config);
    let mut depth_view = create_depth_texture(&device, config.width, config.height);

    // =========================================================================
    // CAMERA UNIFORMS - slot 0 view, slot 1 projection
    // =========================================================================
    let mut viewing: UniformArray<[[f32; 4]; 4]> = UniformArray::new(2);
    {
        let mut mapping = viewing.map_write();
        *mapping.slot_mut(0) = view_cycle.view_matrix();
        *mapping.slot_mut(1) = perspective(
            75.0f32.to_radians(),
            config.width as f32 / config.height as f32,
            1.0,
            100.0,
        );
    }
    viewing.ensure_gpu(&device);

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Viewing Layout"),
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
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Viewing Bind Group"),
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: viewing.binding(),
        }],
    });

    // =========================================================================
    // PIPELINE
    // =========================================================================
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Tile Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../../shaders/tiles.wgsl").into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Tile Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[TileVertex::desc(), batch.instance_vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    tracing::info!("scene ready; A/D orbit the camera, ESC exits");

    // =========================================================================
    // EVENT LOOP
    // =========================================================================
    let _ = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),

                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(key),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => {
                    match key {
                        KeyCode::KeyD => view_cycle.next(),
                        KeyCode::KeyA => view_cycle.prev(),
                        KeyCode::Escape => elwt.exit(),
                        _ => return,
                    }
                    if key != KeyCode::Escape {
                        let mut mapping = viewing.map_write();
                        *mapping.slot_mut(0) = view_cycle.view_matrix();
                        tracing::debug!(eye = ?view_cycle.eye(), "camera moved");
                    }
                }

                WindowEvent::Resized(new_size) if new_size.width > 0 && new_size.height > 0 => {
                    config.width = new_size.width;
                    config.height = new_size.height;
                    surface.configure(&device, &config);
                    depth_view = create_depth_texture(&device, config.width, config.height);

                    let mut mapping = viewing.map_write();
                    *mapping.slot_mut(1) = perspective(
                        75.0f32.to_radians(),
                        config.width as f32 / config.height as f32,
                        1.0,
                        100.0,
                    );
                }

                WindowEvent::RedrawRequested => {
                    viewing.flush(&queue);
                    batch.flush(&device, &queue);

                    let output = match surface.get_current_texture() {
                        Ok(t) => t,
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            surface.configure(&device, &config);
                            return;
                        }
                        Err(e) => {
                            tracing::error!(error = ?e, "surface acquire failed");
                            return;
                        }
                    };

                    let target = output.texture.create_view(&Default::default());
                    let mut encoder = device.create_command_encoder(&Default::default());
                    {
                        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("Tile Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &target,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Clear(wgpu::Color {
                                        r: 0.1,
                                        g: 0.1,
                                        b: 0.12,
                                        a: 1.0,
                                    }),
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: Some(
                                wgpu::RenderPassDepthStencilAttachment {
                                    view: &depth_view,
                                    depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(1.0),
                                        store: wgpu::StoreOp::Store,
                                    }),
                                    stencil_ops: None,
                                },
                            ),
                            ..Default::default()
                        });

                        pass.set_pipeline(&pipeline);
                        pass.set_bind_group(0, &bind_group, &[]);
                        batch.record(&mut pass);
                    }

                    queue.submit(std::iter::once(encoder.finish()));
                    output.present();
                }

                _ => {}
            },

            Event::AboutToWait => window.request_redraw(),

            _ => {}
        }
    });
}
