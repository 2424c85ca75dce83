//! wgpu renderer: owns the GPU context, the depth target, the point pipeline
//! and the egui renderer, and mounts scenes as GPU instance buffers.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{context::GfxContext, pipelines::points::PointsPipeline, targets::Targets};
use crate::{
    camera::Camera,
    data::types::PointInstance,
    scene::{palette::rgb_hex, Scene, SceneBackend},
};
use std::sync::Arc;
use winit::window::Window;

pub const BACKGROUND_HEX: u32 = 0x0a0a0a;

/// Tessellated egui output for one frame.
pub struct UiFrame<'a> {
    pub primitives: &'a [egui::ClippedPrimitive],
    pub textures: &'a egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// GPU copy of the mounted scene's points.
struct MountedPoints {
    buffer: wgpu::Buffer,
    count: u32,
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: PointsPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
    mounted: Option<MountedPoints>,
    staging: Vec<PointInstance>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let targets = Targets::new(&gfx.device, gfx.size);
        let points = PointsPipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            egui_renderer,
            mounted: None,
            staging: Vec::new(),
        })
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.gfx.size
    }

    fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = rgb_hex(BACKGROUND_HEX);
        let enc = |c: f32| {
            let c = c as f64;
            if !self.gfx.is_srgb() {
                c
            } else if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        wgpu::Color {
            r: enc(r),
            g: enc(g),
            b: enc(b),
            a: 1.0,
        }
    }

    /// Uploads the frame's point colors and markers, draws the scene and then
    /// the egui overlay, and presents.
    pub fn render(
        &mut self,
        scene: Option<&Scene>,
        camera: &Camera,
        ui: Option<UiFrame<'_>>,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.points
            .write_camera(&self.gfx.queue, camera, self.gfx.is_srgb());

        let live_scene = scene.filter(|s| !s.is_disposed());
        match (live_scene, &self.mounted) {
            (Some(scene), Some(mounted)) => {
                scene.write_point_instances(&mut self.staging);
                if self.staging.len() == mounted.count as usize {
                    self.gfx.queue.write_buffer(
                        &mounted.buffer,
                        0,
                        bytemuck::cast_slice(&self.staging),
                    );
                } else {
                    log::debug!(
                        "Scene has {} points but {} are mounted; skipping upload",
                        self.staging.len(),
                        mounted.count
                    );
                }
                self.points
                    .write_markers(&self.gfx.queue, &scene.marker_instances());
            }
            _ => self.points.write_markers(&self.gfx.queue, &[]),
        }

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(_), Some(mounted)) = (live_scene, &self.mounted) {
                self.points.draw_points(&mut pass, &mounted.buffer, mounted.count);
            }
            self.points.draw_markers(&mut pass);
        }

        let mut ui_cmds = Vec::new();
        if let Some(ui) = ui {
            ui_cmds = self.draw_ui(&mut encoder, &swap_view, ui);
        }

        self.gfx
            .queue
            .submit(ui_cmds.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        Ok(())
    }

    fn draw_ui(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        ui: UiFrame<'_>,
    ) -> Vec<wgpu::CommandBuffer> {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.config.width, self.gfx.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        for (id, delta) in &ui.textures.set {
            self.egui_renderer
                .update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }
        let cmds = self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            encoder,
            ui.primitives,
            &screen,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer.render(&mut pass, ui.primitives, &screen);
        }

        for id in &ui.textures.free {
            self.egui_renderer.free_texture(id);
        }
        cmds
    }
}

impl SceneBackend for Renderer {
    fn mount(&mut self, scene: &Scene) {
        scene.write_point_instances(&mut self.staging);
        let count = self.staging.len() as u32;
        let size = (self.staging.len().max(1) * std::mem::size_of::<PointInstance>()) as u64;
        let buffer = self.gfx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Instances"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        if count > 0 {
            self.gfx
                .queue
                .write_buffer(&buffer, 0, bytemuck::cast_slice(&self.staging));
        }
        if let Some(old) = self.mounted.replace(MountedPoints { buffer, count }) {
            old.buffer.destroy();
        }
        log::info!("Mounted {count} point sprites");
    }

    fn unmount(&mut self) {
        if let Some(old) = self.mounted.take() {
            old.buffer.destroy();
            log::info!("Released {} point sprites", old.count);
        }
        self.points.write_markers(&self.gfx.queue, &[]);
    }

    fn resize(&mut self, width: u32, height: u32) {
        let size = winit::dpi::PhysicalSize::new(width, height);
        self.gfx.resize(size);
        self.targets.resize(&self.gfx.device, size);
    }
}
