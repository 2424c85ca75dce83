//! Click-versus-drag classification and ray hit tests against the point buffer.

use crate::camera::{pixel_to_ndc, Camera, Ray};
use crate::data::types::PointBuffer;
use glam::{Vec2, Vec3};
use rayon::prelude::*;

/// Pointer travel (device pixels, per axis) beyond which a press becomes a drag.
pub const DRAG_THRESHOLD_PX: f32 = 5.0;

/// World-space picking radius; larger than the drawn point so small points are easy to hit.
pub const PICK_RADIUS: f32 = 0.1;

/// Phase of the current press/move/release cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerPhase {
    Idle,
    PressedNoDrag { press: Vec2 },
    /// Sticky until release.
    Dragging,
}

/// A point intersected by a picking ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub index: usize,
    /// Distance from the ray origin to the point's projection onto the ray.
    pub distance: f32,
}

/// Result of a pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Hover hit test ran; `None` means nothing under the cursor.
    Hover(Option<Hit>),
    /// This move crossed the drag threshold.
    DragStarted,
    /// Already dragging; hover is suppressed.
    Suppressed,
}

/// Result of a pointer release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReleaseOutcome {
    Click(Hit),
    Missed,
    Dragged,
    OutsideCanvas,
    /// Release without a matching press on the canvas.
    Unpressed,
}

/// Viewport size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn to_ndc(&self, px: Vec2) -> Vec2 {
        pixel_to_ndc(px, self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct PickingController {
    phase: PointerPhase,
    pub drag_threshold_px: f32,
    pub pick_radius: f32,
}

impl Default for PickingController {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD_PX, PICK_RADIUS)
    }
}

impl PickingController {
    pub fn new(drag_threshold_px: f32, pick_radius: f32) -> Self {
        Self {
            phase: PointerPhase::Idle,
            drag_threshold_px,
            pick_radius,
        }
    }

    #[inline]
    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = PointerPhase::Idle;
    }

    pub fn pointer_down(&mut self, px: Vec2) {
        self.phase = PointerPhase::PressedNoDrag { press: px };
    }

    pub fn pointer_move(
        &mut self,
        px: Vec2,
        camera: &Camera,
        viewport: Viewport,
        buffer: &PointBuffer,
    ) -> MoveOutcome {
        match self.phase {
            PointerPhase::Dragging => MoveOutcome::Suppressed,
            PointerPhase::PressedNoDrag { press } if self.exceeds_threshold(press, px) => {
                log::debug!("Pointer drag started at {px:?} (pressed at {press:?})");
                self.phase = PointerPhase::Dragging;
                MoveOutcome::DragStarted
            }
            _ => MoveOutcome::Hover(self.hit_test(px, camera, viewport, buffer)),
        }
    }

    /// Classifies the release and resets to [`PointerPhase::Idle`].
    pub fn pointer_up(
        &mut self,
        px: Vec2,
        camera: &Camera,
        viewport: Viewport,
        buffer: &PointBuffer,
    ) -> ReleaseOutcome {
        let phase = std::mem::replace(&mut self.phase, PointerPhase::Idle);
        let press = match phase {
            PointerPhase::Idle => return ReleaseOutcome::Unpressed,
            PointerPhase::Dragging => return ReleaseOutcome::Dragged,
            PointerPhase::PressedNoDrag { press } => press,
        };

        // No intermediate move event may have been delivered.
        if self.exceeds_threshold(press, px) {
            return ReleaseOutcome::Dragged;
        }

        let ndc = viewport.to_ndc(px);
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return ReleaseOutcome::OutsideCanvas;
        }

        match pick(&camera.ray_from_ndc(ndc), camera.near, buffer, self.pick_radius) {
            Some(hit) => ReleaseOutcome::Click(hit),
            None => ReleaseOutcome::Missed,
        }
    }

    /// Nearest point under a pixel position, if any.
    pub fn hit_test(
        &self,
        px: Vec2,
        camera: &Camera,
        viewport: Viewport,
        buffer: &PointBuffer,
    ) -> Option<Hit> {
        let ndc = viewport.to_ndc(px);
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return None;
        }
        pick(&camera.ray_from_ndc(ndc), camera.near, buffer, self.pick_radius)
    }

    fn exceeds_threshold(&self, press: Vec2, px: Vec2) -> bool {
        let d = (px - press).abs();
        d.x > self.drag_threshold_px || d.y > self.drag_threshold_px
    }
}

/// Tests every point against a ray, treating points as spheres of `radius`.
///
/// Points behind `near` are ignored. Among intersected points the one nearest
/// along the ray wins; ties go to the lower index.
pub fn pick(ray: &Ray, near: f32, buffer: &PointBuffer, radius: f32) -> Option<Hit> {
    let r2 = radius * radius;
    buffer
        .positions()
        .par_chunks_exact(3)
        .enumerate()
        .filter_map(|(index, p)| {
            let to_point = Vec3::new(p[0], p[1], p[2]) - ray.origin;
            let t = to_point.dot(ray.dir);
            if t < near {
                return None;
            }
            let d2 = to_point.length_squared() - t * t;
            (d2 <= r2).then_some(Hit { index, distance: t })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::NormalizedPoint;

    const VIEW: Viewport = Viewport { width: 800.0, height: 600.0 };
    const CENTER: Vec2 = Vec2::new(400.0, 300.0);

    fn buffer(points: &[(&str, [f32; 3])]) -> PointBuffer {
        let pts = points
            .iter()
            .map(|(id, p)| NormalizedPoint { id: id.to_string(), position: *p, cluster: 0 })
            .collect();
        PointBuffer::new(pts, points.iter().map(|(_, p)| *p).collect())
    }

    fn camera() -> Camera {
        Camera::new(Vec3::ZERO, 4.0, VIEW.width / VIEW.height)
    }

    #[test]
    fn nearest_point_along_ray_wins() {
        let buf = buffer(&[("far", [0.0, 0.0, -1.0]), ("near", [0.0, 0.0, 1.0]), ("off", [1.5, 0.0, 0.0])]);
        let hit = PickingController::default().hit_test(CENTER, &camera(), VIEW, &buf).unwrap();
        assert_eq!(hit.index, 1);
        assert!((hit.distance - 3.0).abs() < 1e-4);
    }

    #[test]
    fn empty_space_is_a_miss() {
        let buf = buffer(&[("a", [1.5, 1.5, 0.0])]);
        assert!(PickingController::default().hit_test(CENTER, &camera(), VIEW, &buf).is_none());
    }

    #[test]
    fn points_behind_camera_are_ignored() {
        let buf = buffer(&[("behind", [0.0, 0.0, 6.0])]);
        assert!(PickingController::default().hit_test(CENTER, &camera(), VIEW, &buf).is_none());
    }

    #[test]
    fn inflated_radius_catches_near_misses() {
        // 0.05 off-axis at the target plane: outside the drawn sprite, inside the pick radius.
        let buf = buffer(&[("a", [0.05, 0.0, 0.0])]);
        assert!(PickingController::default().hit_test(CENTER, &camera(), VIEW, &buf).is_some());
        let strict = PickingController::new(DRAG_THRESHOLD_PX, 0.01);
        assert!(strict.hit_test(CENTER, &camera(), VIEW, &buf).is_none());
    }

    #[test]
    fn still_press_release_is_a_click() {
        let buf = buffer(&[("a", [0.0, 0.0, 0.0])]);
        let cam = camera();
        let mut pc = PickingController::default();

        pc.pointer_down(CENTER);
        assert!(matches!(
            pc.pointer_move(CENTER + Vec2::new(3.0, -5.0), &cam, VIEW, &buf),
            MoveOutcome::Hover(Some(Hit { index: 0, .. }))
        ));
        assert!(matches!(pc.pointer_up(CENTER, &cam, VIEW, &buf), ReleaseOutcome::Click(Hit { index: 0, .. })));
        assert_eq!(pc.phase(), PointerPhase::Idle);
    }

    #[test]
    fn drag_is_sticky_and_suppresses_click() {
        let buf = buffer(&[("a", [0.0, 0.0, 0.0])]);
        let cam = camera();
        let mut pc = PickingController::default();

        pc.pointer_down(CENTER);
        assert_eq!(pc.pointer_move(CENTER + Vec2::new(8.0, 0.0), &cam, VIEW, &buf), MoveOutcome::DragStarted);
        assert_eq!(pc.pointer_move(CENTER, &cam, VIEW, &buf), MoveOutcome::Suppressed);
        assert_eq!(pc.phase(), PointerPhase::Dragging);
        assert_eq!(pc.pointer_up(CENTER, &cam, VIEW, &buf), ReleaseOutcome::Dragged);
        assert_eq!(pc.phase(), PointerPhase::Idle);
    }

    #[test]
    fn far_release_without_moves_is_a_drag() {
        let buf = buffer(&[("a", [0.0, 0.0, 0.0])]);
        let mut pc = PickingController::default();
        pc.pointer_down(CENTER + Vec2::new(0.0, 6.0));
        assert_eq!(pc.pointer_up(CENTER, &camera(), VIEW, &buf), ReleaseOutcome::Dragged);
    }

    #[test]
    fn release_outside_canvas_is_ignored() {
        let buf = buffer(&[("a", [0.0, 0.0, 0.0])]);
        let mut pc = PickingController::default();
        let edge = Vec2::new(VIEW.width + 2.0, 10.0);
        pc.pointer_down(edge - Vec2::new(3.0, 0.0));
        assert_eq!(pc.pointer_up(edge, &camera(), VIEW, &buf), ReleaseOutcome::OutsideCanvas);
    }

    #[test]
    fn release_without_press_does_nothing() {
        let buf = buffer(&[("a", [0.0, 0.0, 0.0])]);
        let mut pc = PickingController::default();
        assert_eq!(pc.pointer_up(CENTER, &camera(), VIEW, &buf), ReleaseOutcome::Unpressed);
    }
}
