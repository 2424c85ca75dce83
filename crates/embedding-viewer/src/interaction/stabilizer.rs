//! Keeps the camera still across a point selection.

use crate::camera::{Camera, CameraController, CameraPose};

/// Snapshots the camera around the selection callback and puts it back,
/// immediately and once more on the following frame.
///
/// The second restoration covers damped controller motion that would
/// otherwise re-assert itself after the callback returns.
#[derive(Debug, Clone, Default)]
pub struct CameraStabilizer {
    pending: Option<CameraPose>,
}

impl CameraStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with controls disabled and restores the camera pose afterwards.
    ///
    /// Restoration happens in a drop guard, so it also runs when `f` returns
    /// an error or unwinds.
    pub fn around<R>(
        &mut self,
        camera: &mut Camera,
        controller: &mut CameraController,
        f: impl FnOnce() -> R,
    ) -> R {
        let pose = camera.pose();
        let result = {
            let _guard = RestoreGuard::new(camera, controller, pose);
            f()
        };
        self.pending = Some(pose);
        result
    }

    /// Re-applies the last snapshot once. Call at the start of a frame,
    /// before the controller update.
    pub fn on_frame(&mut self, camera: &mut Camera, controller: &mut CameraController) {
        if let Some(pose) = self.pending.take() {
            log::debug!("Re-applying camera pose after selection: {pose:?}");
            camera.set_pose(&pose);
            controller.halt();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

struct RestoreGuard<'a> {
    camera: &'a mut Camera,
    controller: &'a mut CameraController,
    pose: CameraPose,
    was_enabled: bool,
}

impl<'a> RestoreGuard<'a> {
    fn new(camera: &'a mut Camera, controller: &'a mut CameraController, pose: CameraPose) -> Self {
        let was_enabled = controller.is_enabled();
        controller.set_enabled(false);
        Self {
            camera,
            controller,
            pose,
            was_enabled,
        }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        self.camera.set_pose(&self.pose);
        self.controller.halt();
        self.controller.set_enabled(self.was_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn rig() -> (Camera, CameraController) {
        let mut camera = Camera::new(Vec3::ZERO, 4.0, 1.0);
        camera.azimuth_rad = 0.3;
        camera.update();
        (camera, CameraController::new())
    }

    fn spin(ctl: &mut CameraController) {
        ctl.on_cursor((0.0, 0.0));
        ctl.on_button(true);
        ctl.on_cursor((60.0, 20.0));
        ctl.on_button(false);
    }

    #[test]
    fn callback_result_passes_through_and_pose_is_kept() {
        let (mut cam, mut ctl) = rig();
        let mut stab = CameraStabilizer::new();
        let before = cam.pose();

        assert_eq!(stab.around(&mut cam, &mut ctl, || 7), 7);
        assert!(ctl.is_enabled());
        assert_eq!(cam.pose(), before);
        assert!(stab.has_pending());
    }

    #[test]
    fn pending_damping_cannot_move_camera_after_click() {
        let (mut cam, mut ctl) = rig();
        let mut stab = CameraStabilizer::new();
        spin(&mut ctl);
        let before = cam.pose();

        stab.around(&mut cam, &mut ctl, || ());
        stab.on_frame(&mut cam, &mut ctl);
        ctl.update(&mut cam);

        assert!(!stab.has_pending());
        assert!((cam.position() - before.position).length() < 1e-4);
        assert_eq!(cam.target, before.target);
        assert_eq!(cam.zoom, before.zoom);
    }

    #[test]
    fn disabled_controls_stay_disabled() {
        let (mut cam, mut ctl) = rig();
        ctl.set_enabled(false);
        CameraStabilizer::new().around(&mut cam, &mut ctl, || ());
        assert!(!ctl.is_enabled());
    }

    #[test]
    fn next_frame_undoes_late_interference() {
        let (mut cam, mut ctl) = rig();
        let mut stab = CameraStabilizer::new();
        let before = cam.pose();

        stab.around(&mut cam, &mut ctl, || ());
        // Something re-targets the camera after the callback returned.
        cam.target = Vec3::new(1.0, 1.0, 1.0);
        cam.zoom = 3.0;
        stab.on_frame(&mut cam, &mut ctl);
        assert_eq!(cam.pose(), before);
    }

    #[test]
    fn failing_callback_still_restores() {
        let (mut cam, mut ctl) = rig();
        let mut stab = CameraStabilizer::new();
        let before = cam.pose();

        let res: anyhow::Result<()> = stab.around(&mut cam, &mut ctl, || anyhow::bail!("consumer failed"));
        assert!(res.is_err());
        assert_eq!(cam.pose(), before);
        assert!(ctl.is_enabled());
    }

    #[test]
    fn panicking_callback_still_restores() {
        let (mut cam, mut ctl) = rig();
        let mut stab = CameraStabilizer::new();
        let before = cam.pose();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            stab.around(&mut cam, &mut ctl, || panic!("consumer panicked"))
        }));
        assert!(outcome.is_err());
        assert_eq!(cam.pose(), before);
        assert!(ctl.is_enabled());
    }
}
