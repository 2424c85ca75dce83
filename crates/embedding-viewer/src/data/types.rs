//! Core data types: the CPU-side point buffer and the POD structs uploaded to the GPU.

use glam::Vec3;
use rayon::prelude::*;
use std::collections::HashMap;

/// Linear RGB triple in `[0, 1]`.
pub type Rgb = [f32; 3];

/// A point after centering and scaling into the display cube.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    pub id: String,
    pub position: [f32; 3],
    pub cluster: i32,
}

/// Ordered points plus flattened render arrays.
///
/// Index `i` addresses the same logical point in every array:
/// `positions[3i..3i+3]`, `colors[3i..3i+3]`, `raw[i]` and `points[i]`.
#[derive(Debug, Clone, Default)]
pub struct PointBuffer {
    points: Vec<NormalizedPoint>,
    /// Pre-normalization coordinates, reported back on selection.
    raw: Vec<[f32; 3]>,
    positions: Vec<f32>,
    colors: Vec<f32>,
    by_id: HashMap<String, usize>,
}

impl PointBuffer {
    /// Builds a buffer with all colors black; the scene composer paints them.
    pub fn new(points: Vec<NormalizedPoint>, raw: Vec<[f32; 3]>) -> Self {
        debug_assert_eq!(points.len(), raw.len());

        let positions: Vec<f32> = points.iter().flat_map(|p| p.position).collect();
        let colors = vec![0.0; positions.len()];

        let mut by_id = HashMap::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            // First occurrence wins for duplicated ids.
            by_id.entry(p.id.clone()).or_insert(i);
        }

        Self {
            points,
            raw,
            positions,
            colors,
            by_id,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&NormalizedPoint> {
        self.points.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn cluster(&self, index: usize) -> i32 {
        self.points[index].cluster
    }

    pub fn raw(&self, index: usize) -> [f32; 3] {
        self.raw[index]
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[index * 3..index * 3 + 3])
    }

    /// Flattened `[x0, y0, z0, x1, ...]` render positions.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flattened `[r0, g0, b0, r1, ...]` render colors.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    #[inline]
    pub fn color(&self, index: usize) -> Rgb {
        let c = &self.colors[index * 3..index * 3 + 3];
        [c[0], c[1], c[2]]
    }

    #[inline]
    pub fn set_color(&mut self, index: usize, rgb: Rgb) {
        self.colors[index * 3..index * 3 + 3].copy_from_slice(&rgb);
    }

    /// Rewrites every color from its point's cluster.
    pub fn recolor<F>(&mut self, color_of: F)
    where
        F: Fn(i32) -> Rgb + Sync,
    {
        self.colors
            .par_chunks_exact_mut(3)
            .zip(self.points.par_iter())
            .for_each(|(c, p)| c.copy_from_slice(&color_of(p.cluster)));
    }

    /// Releases all storage. Safe to call more than once.
    pub fn clear(&mut self) {
        self.points = Vec::new();
        self.raw = Vec::new();
        self.positions = Vec::new();
        self.colors = Vec::new();
        self.by_id = HashMap::new();
    }
}

/// Per-instance sprite data uploaded to the GPU vertex buffer.
/// Must match the instance inputs in `points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, Default)]
pub struct PointInstance {
    /// Sprite center in normalized world units.
    pub position: [f32; 3],
    /// Sprite radius in world units.
    pub radius: f32,
    /// sRGB-encoded color, alpha is opacity.
    pub color: [f32; 4],
}

/// Per-frame camera uniform, std140 compatible.
/// Must match `CameraUniform` in `points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniformStd140 {
    pub view_proj: [[f32; 4]; 4],
    /// Camera right vector in world space; `w` is 1.0 when the shader must
    /// linearize sRGB colors for an sRGB output target.
    pub right: [f32; 4],
    /// Camera up vector in world space (w unused).
    pub up: [f32; 4],
}
