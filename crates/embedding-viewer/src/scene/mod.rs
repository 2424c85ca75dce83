//! Renderable scene: the colored point buffer plus the hover and selection markers.

pub mod composer;
pub mod lifecycle;
pub mod palette;

use crate::data::normalize::Normalization;
use crate::data::types::{PointBuffer, PointInstance, Rgb};
use glam::Vec3;

pub use self::composer::{SceneComposer, SceneStyle};
pub use self::lifecycle::{DatasetFingerprint, SceneBackend, SceneLifecycle, SyncOutcome};
pub use self::palette::Palette;

/// A sphere drawn on top of one point; hidden until positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub radius: f32,
    pub color: Rgb,
    pub opacity: f32,
    position: Vec3,
    visible: bool,
}

impl Marker {
    pub fn new(radius: f32, color: Rgb, opacity: f32) -> Self {
        Self {
            radius,
            color,
            opacity,
            position: Vec3::ZERO,
            visible: false,
        }
    }

    pub fn show_at(&mut self, position: Vec3) {
        self.position = position;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// GPU instance for this marker, `None` while hidden.
    pub fn instance(&self) -> Option<PointInstance> {
        self.visible.then(|| PointInstance {
            position: self.position.to_array(),
            radius: self.radius,
            color: [self.color[0], self.color[1], self.color[2], self.opacity],
        })
    }
}

/// Everything the renderer needs for one dataset.
#[derive(Debug)]
pub struct Scene {
    pub buffer: PointBuffer,
    /// Transform used to build `buffer`; re-projects selections that are not in it.
    pub transform: Normalization,
    pub hover_marker: Marker,
    pub selection_marker: Marker,
    pub point_radius: f32,
    pub point_opacity: f32,
    disposed: bool,
}

impl Scene {
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Releases CPU-side storage and hides the markers.
    ///
    /// Returns `false` if the scene was already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.buffer.clear();
        self.hover_marker.hide();
        self.selection_marker.hide();
        self.disposed = true;
        true
    }

    /// Writes one sprite per point into `out`, reusing its allocation.
    pub fn write_point_instances(&self, out: &mut Vec<PointInstance>) {
        out.clear();
        out.extend(
            self.buffer
                .positions()
                .chunks_exact(3)
                .zip(self.buffer.colors().chunks_exact(3))
                .map(|(p, c)| PointInstance {
                    position: [p[0], p[1], p[2]],
                    radius: self.point_radius,
                    color: [c[0], c[1], c[2], self.point_opacity],
                }),
        );
    }

    /// Visible markers, selection first so the hover marker draws on top.
    pub fn marker_instances(&self) -> Vec<PointInstance> {
        [&self.selection_marker, &self.hover_marker]
            .into_iter()
            .filter_map(Marker::instance)
            .collect()
    }
}
