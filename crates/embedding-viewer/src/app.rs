use crate::{
    config::Config,
    data::loader::{available_params, DatasetLoader, LoadResponse},
    interaction::{Engine, HoverEvent, SelectionConsumer, SelectionEvent},
    renderer::{Renderer, UiFrame},
    scene::SyncOutcome,
    ui::{self, LoadStatus, UiEvent, UiState, ViewModel},
};
use anyhow::Result;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// Receives engine events on behalf of the details panel.
#[derive(Debug, Default)]
struct DetailsSink {
    selections: u64,
}

impl SelectionConsumer for DetailsSink {
    fn on_select(&mut self, event: &SelectionEvent) -> Result<()> {
        self.selections += 1;
        log::debug!(
            "Details panel now shows {} at {:?} (selection #{})",
            event.id,
            event.point,
            self.selections
        );
        Ok(())
    }

    fn on_hover(&mut self, event: Option<&HoverEvent>) {
        match event {
            Some(h) => log::trace!("Hovering {} (cluster {})", h.id, h.cluster),
            None => log::trace!("Hover cleared"),
        }
    }
}

pub struct App {
    pub renderer: Renderer,
    pub engine: Engine,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    ui: UiState,
    loader: DatasetLoader,
    sink: DetailsSink,
    data_dir: PathBuf,
    cursor_px: Option<Vec2>,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.size();
        let engine = Engine::new(config.engine_config(), size.width, size.height);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let mut app = Self {
            renderer,
            engine,
            egui_ctx,
            egui_state,
            ui: UiState::default(),
            loader: DatasetLoader::spawn()?,
            sink: DetailsSink::default(),
            data_dir: config.data_dir.clone(),
            cursor_px: None,
        };

        app.ui.available = available_params(&config.data_dir);
        log::info!(
            "{} dataset(s) in {}",
            app.ui.available.len(),
            config.data_dir.display()
        );

        if let Some(path) = &config.dataset {
            app.request_load(path.clone());
        }
        Ok(app)
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.engine
            .resize(new_size.width, new_size.height, &mut self.renderer);
    }

    /// Returns true when the event was consumed by the UI.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        if let WindowEvent::Resized(size) = event {
            self.resize(*size);
        }

        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            // A press that started on the canvas must still end its cycle.
            if let WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } = event
            {
                self.engine.pointer_cancel();
            }
            return true;
        }

        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.engine.clear_selection();
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_px = Some(Vec2::new(position.x as f32, position.y as f32));
                if self.egui_ctx.is_pointer_over_area() {
                    self.engine.controller_mut().handle_event(event);
                    self.engine.pointer_left(&mut self.sink);
                    return false;
                }
                self.engine.handle_window_event(event, &mut self.sink);
                false
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_px = None;
                self.engine.handle_window_event(event, &mut self.sink);
                false
            }
            _ => {
                self.engine.handle_window_event(event, &mut self.sink);
                false
            }
        }
    }

    pub fn request_load(&mut self, path: PathBuf) {
        let name = display_name(&path);
        self.ui.status = LoadStatus::Loading(name);
        self.loader.request(path);
    }

    fn poll_loader(&mut self) {
        if let Some(resp) = self.loader.poll() {
            self.finish_load(resp);
        }
    }

    fn finish_load(&mut self, resp: LoadResponse) {
        let name = display_name(&resp.path);
        let records = match resp.result {
            Ok(records) => records,
            Err(err) => {
                log::error!("Failed to load {name}: {err:#}");
                self.ui.status = LoadStatus::Failed(format!("{err:#}"));
                return;
            }
        };

        match self.engine.load(&records, &mut self.renderer) {
            Ok(outcome) => {
                self.engine.clear_selection();
                let (points, invalid) = match outcome {
                    SyncOutcome::Rebuilt { points, invalid } => (points, invalid),
                    SyncOutcome::Reused => {
                        (self.engine.scene().map_or(0, |s| s.buffer.len()), 0)
                    }
                };
                log::info!("Showing {name}: {points} points ({invalid} invalid)");
                self.ui.status = LoadStatus::Loaded {
                    name,
                    points,
                    invalid,
                };
            }
            Err(err) => {
                log::error!("Dataset {name} rejected: {err}");
                self.ui.status = LoadStatus::Failed(err.to_string());
            }
        }
    }

    fn apply_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::LoadRequested(params) => match params.path_in(&self.data_dir) {
                Some(path) => self.request_load(path),
                None => log::warn!("Load requested with incomplete parameters {params:?}"),
            },
            UiEvent::ClearSelection => self.engine.clear_selection(),
        }
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.poll_loader();
        self.engine.frame();

        let ppp = self.egui_ctx.pixels_per_point();
        let raw_input = self.egui_state.take_egui_input(window);
        let mut events = Vec::new();
        let view = ViewModel {
            point_count: self.engine.scene().map(|s| s.buffer.len()),
            selected: self.engine.selected(),
            hovered: self.engine.hovered(),
            cursor: self.cursor_px.map(|p| egui::pos2(p.x / ppp, p.y / ppp)),
            loading: self.loader.is_loading(),
        };
        let output = self
            .egui_ctx
            .run(raw_input, |ctx| ui::draw(ctx, &mut self.ui, &view, &mut events));
        self.egui_state
            .handle_platform_output(window, output.platform_output);

        for event in events {
            self.apply_ui_event(event);
        }

        let primitives = self
            .egui_ctx
            .tessellate(output.shapes, output.pixels_per_point);
        self.renderer.render(
            self.engine.scene(),
            self.engine.camera(),
            Some(UiFrame {
                primitives: &primitives,
                textures: &output.textures_delta,
                pixels_per_point: output.pixels_per_point,
            }),
        )
    }

    /// Releases GPU resources of the mounted scene.
    pub fn shutdown(&mut self) {
        self.engine.unmount(&mut self.renderer);
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
