//! The interaction engine: single owner of camera, pointer and highlight state.
//!
//! Event handlers and the per-frame update all take `&mut Engine`, so every
//! handler observes the current state; nothing is captured across frames.

use super::highlight::HighlightEngine;
use super::picking::{MoveOutcome, PickingController, PointerPhase, ReleaseOutcome, Viewport};
use super::stabilizer::CameraStabilizer;
use super::{HoverEvent, InteractionState, SelectionConsumer, SelectionEvent};
use crate::camera::{Camera, CameraController};
use crate::data::records::PointRecord;
use crate::error::PointCloudError;
use crate::scene::{Palette, Scene, SceneBackend, SceneComposer, SceneLifecycle, SceneStyle, SyncOutcome};
use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, WindowEvent};

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub drag_threshold_px: f32,
    pub pick_radius: f32,
    pub palette: Palette,
    pub style: SceneStyle,
    /// Initial camera distance from the origin.
    pub camera_distance: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: super::picking::DRAG_THRESHOLD_PX,
            pick_radius: super::picking::PICK_RADIUS,
            palette: Palette::default(),
            style: SceneStyle::default(),
            camera_distance: 4.0,
        }
    }
}

pub struct Engine {
    camera: Camera,
    controller: CameraController,
    picking: PickingController,
    highlight: HighlightEngine,
    stabilizer: CameraStabilizer,
    lifecycle: SceneLifecycle,
    state: InteractionState,
    viewport: Viewport,
    cursor: Option<Vec2>,
}

impl Engine {
    pub fn new(config: EngineConfig, width: u32, height: u32) -> Self {
        let viewport = Viewport {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        };
        Self {
            camera: Camera::new(Vec3::ZERO, config.camera_distance, viewport.width / viewport.height),
            controller: CameraController::new(),
            picking: PickingController::new(config.drag_threshold_px, config.pick_radius),
            highlight: HighlightEngine::new(config.palette.clone()),
            stabilizer: CameraStabilizer::new(),
            lifecycle: SceneLifecycle::new(SceneComposer::new(config.palette, config.style)),
            state: InteractionState::default(),
            viewport,
            cursor: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn controller_mut(&mut self) -> &mut CameraController {
        &mut self.controller
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.lifecycle.scene()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn hovered(&self) -> Option<&HoverEvent> {
        self.state.hovered.as_ref()
    }

    pub fn selected(&self) -> Option<&SelectionEvent> {
        self.state.selected.as_ref()
    }

    pub fn pointer_phase(&self) -> PointerPhase {
        self.picking.phase()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    // --- Scene lifecycle ---

    /// Mounts `records`, reusing the current scene when the dataset is unchanged.
    ///
    /// On failure the previous scene stays mounted. A rebuild resets hover and
    /// the pointer cycle; the selection is kept and re-projected if needed.
    pub fn load<B: SceneBackend>(
        &mut self,
        records: &[PointRecord],
        backend: &mut B,
    ) -> Result<SyncOutcome, PointCloudError> {
        let outcome = self.lifecycle.sync(records, backend)?;
        if let SyncOutcome::Rebuilt { .. } = outcome {
            self.picking.reset();
            self.state.hovered = None;
        }
        Ok(outcome)
    }

    /// Tears the scene down; the engine keeps running with nothing to draw.
    pub fn unmount<B: SceneBackend>(&mut self, backend: &mut B) {
        self.lifecycle.teardown(backend);
        self.picking.reset();
        self.state.hovered = None;
    }

    /// Updates projection and output size; the scene is left as is.
    pub fn resize<B: SceneBackend>(&mut self, width: u32, height: u32, backend: &mut B) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Viewport {
            width: width as f32,
            height: height as f32,
        };
        self.camera.set_viewport(width, height);
        backend.resize(width, height);
    }

    // --- Selection (external) ---

    /// Replaces the selection from outside the engine.
    pub fn set_selection(&mut self, selection: Option<SelectionEvent>) {
        if selection.is_none() {
            if let Some(scene) = self.lifecycle.scene_mut() {
                scene.selection_marker.hide();
            }
        }
        self.state.selected = selection;
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
    }

    // --- Pointer input ---

    pub fn pointer_down(&mut self, px: Vec2) {
        self.cursor = Some(px);
        self.picking.pointer_down(px);
    }

    pub fn pointer_move<C: SelectionConsumer>(&mut self, px: Vec2, consumer: &mut C) {
        self.cursor = Some(px);
        let Some(scene) = self.lifecycle.scene_mut() else {
            return;
        };

        let hover = match self.picking.pointer_move(px, &self.camera, self.viewport, &scene.buffer) {
            MoveOutcome::Hover(hit) => hit.map(|h| h.index),
            MoveOutcome::DragStarted => None,
            MoveOutcome::Suppressed => return,
        };
        apply_hover(&self.highlight, scene, &mut self.state, hover, consumer);
    }

    /// Finishes a pointer cycle; returns the selection made by a genuine click.
    pub fn pointer_up<C: SelectionConsumer>(
        &mut self,
        px: Vec2,
        consumer: &mut C,
    ) -> Option<SelectionEvent> {
        self.cursor = Some(px);
        let Some(scene) = self.lifecycle.scene() else {
            self.picking.reset();
            return None;
        };

        let hit = match self.picking.pointer_up(px, &self.camera, self.viewport, &scene.buffer) {
            ReleaseOutcome::Click(hit) => hit,
            other => {
                log::debug!("Pointer release without selection: {other:?}");
                return None;
            }
        };

        let point = &scene.buffer.points()[hit.index];
        let event = SelectionEvent {
            id: point.id.clone(),
            cluster: point.cluster,
            point: scene.buffer.raw(hit.index),
        };
        log::info!("Selected point {} (cluster {})", event.id, event.cluster);

        self.state.selected = Some(event.clone());
        let result = self
            .stabilizer
            .around(&mut self.camera, &mut self.controller, || consumer.on_select(&event));
        if let Err(err) = result {
            log::error!("Selection consumer failed for {}: {err:#}", event.id);
        }
        Some(event)
    }

    /// Ends a press whose release position is unknown (released outside the
    /// window or over UI). Nothing is selected.
    pub fn pointer_cancel(&mut self) {
        if self.picking.phase() != PointerPhase::Idle {
            log::debug!("Pointer cycle cancelled from {:?}", self.picking.phase());
        }
        self.picking.reset();
        self.controller.on_button(false);
    }

    /// The pointer left the render surface.
    pub fn pointer_left<C: SelectionConsumer>(&mut self, consumer: &mut C) {
        self.cursor = None;
        if let Some(scene) = self.lifecycle.scene_mut() {
            apply_hover(&self.highlight, scene, &mut self.state, None, consumer);
        }
    }

    /// Routes a window event to the orbit controller and the picking state machine.
    pub fn handle_window_event<C: SelectionConsumer>(&mut self, event: &WindowEvent, consumer: &mut C) {
        self.controller.handle_event(event);

        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_move(Vec2::new(position.x as f32, position.y as f32), consumer);
            }
            WindowEvent::CursorLeft { .. } => self.pointer_left(consumer),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                match (state, self.cursor) {
                    (ElementState::Pressed, Some(px)) => self.pointer_down(px),
                    (ElementState::Pressed, None) => {}
                    (ElementState::Released, Some(px)) => {
                        self.pointer_up(px, consumer);
                    }
                    (ElementState::Released, None) => self.pointer_cancel(),
                }
            }
            _ => {}
        }
    }

    // --- Frame ---

    /// Per-frame update; call once before drawing.
    pub fn frame(&mut self) {
        self.stabilizer.on_frame(&mut self.camera, &mut self.controller);
        self.controller.update(&mut self.camera);

        if let Some(scene) = self.lifecycle.scene_mut() {
            self.highlight.apply(scene, self.state.selected.as_ref());
        }
    }
}

fn apply_hover<C: SelectionConsumer>(
    highlight: &HighlightEngine,
    scene: &mut Scene,
    state: &mut InteractionState,
    index: Option<usize>,
    consumer: &mut C,
) {
    highlight.set_hover(scene, index);

    let hovered = index.and_then(|i| scene.buffer.point(i)).map(|p| HoverEvent {
        id: p.id.clone(),
        cluster: p.cluster,
    });
    if hovered != state.hovered {
        consumer.on_hover(hovered.as_ref());
        state.hovered = hovered;
    }
}
