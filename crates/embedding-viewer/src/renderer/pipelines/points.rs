use crate::camera::Camera;
use crate::data::types::{CameraUniformStd140, PointInstance};
use wgpu::util::DeviceExt;

/// Hover plus selection.
pub const MAX_MARKERS: usize = 2;

/// Instanced billboard sprites for points and markers.
pub struct PointsPipeline {
    points: wgpu::RenderPipeline,
    markers: wgpu::RenderPipeline,
    camera_buf: wgpu::Buffer,
    camera_bind: wgpu::BindGroup,
    quad_vb: wgpu::Buffer,
    marker_vb: wgpu::Buffer,
    marker_count: u32,
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<CameraUniformStd140>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let camera_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera UBO"),
            size: std::mem::size_of::<CameraUniformStd140>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/points.wgsl").into()),
        });

        // Two triangles spanning the unit sprite.
        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let marker_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Marker Instances"),
            size: (MAX_MARKERS * std::mem::size_of::<PointInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points PipelineLayout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let build = |label: &str, depth_write_enabled: bool| {
            let vbuf_layouts = [
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        shader_location: 0,
                        offset: 0,
                        format: wgpu::VertexFormat::Float32x2,
                    }],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[
                        // center
                        wgpu::VertexAttribute {
                            shader_location: 1,
                            offset: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        // radius
                        wgpu::VertexAttribute {
                            shader_location: 2,
                            offset: 12,
                            format: wgpu::VertexFormat::Float32,
                        },
                        // color
                        wgpu::VertexAttribute {
                            shader_location: 3,
                            offset: 16,
                            format: wgpu::VertexFormat::Float32x4,
                        },
                    ],
                },
            ];

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &vbuf_layouts,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_fmt,
                    depth_write_enabled,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_fmt,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };

        Self {
            points: build("Points Pipeline", true),
            // Markers are translucent shells around a point; they must not hide it.
            markers: build("Markers Pipeline", false),
            camera_buf,
            camera_bind,
            quad_vb,
            marker_vb,
            marker_count: 0,
        }
    }

    pub fn write_camera(&self, queue: &wgpu::Queue, camera: &Camera, linearize: bool) {
        let (right, up) = camera.billboard_axes();
        let ubo = CameraUniformStd140 {
            view_proj: camera.view_proj().to_cols_array_2d(),
            right: right.extend(if linearize { 1.0 } else { 0.0 }).to_array(),
            up: up.extend(0.0).to_array(),
        };
        queue.write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&ubo));
    }

    /// Uploads up to [`MAX_MARKERS`] marker sprites; extra ones are ignored.
    pub fn write_markers(&mut self, queue: &wgpu::Queue, markers: &[PointInstance]) {
        let markers = &markers[..markers.len().min(MAX_MARKERS)];
        if !markers.is_empty() {
            queue.write_buffer(&self.marker_vb, 0, bytemuck::cast_slice(markers));
        }
        self.marker_count = markers.len() as u32;
    }

    pub fn draw_points<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        instances: &'a wgpu::Buffer,
        count: u32,
    ) {
        if count == 0 {
            return;
        }
        rpass.set_pipeline(&self.points);
        rpass.set_bind_group(0, &self.camera_bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, instances.slice(..));
        rpass.draw(0..6, 0..count);
    }

    pub fn draw_markers<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        if self.marker_count == 0 {
            return;
        }
        rpass.set_pipeline(&self.markers);
        rpass.set_bind_group(0, &self.camera_bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, self.marker_vb.slice(..));
        rpass.draw(0..6, 0..self.marker_count);
    }
}
