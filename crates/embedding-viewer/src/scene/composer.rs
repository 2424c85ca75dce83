//! Builds a [`Scene`] from a normalized point buffer.

use super::{palette::rgb_hex, Marker, Palette, Scene};
use crate::data::normalize::Normalized;
use crate::data::types::PointBuffer;

/// Visual constants for points and markers.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStyle {
    pub point_radius: f32,
    pub point_opacity: f32,
    pub hover_radius: f32,
    pub hover_hex: u32,
    pub hover_opacity: f32,
    pub selection_radius: f32,
    pub selection_hex: u32,
    pub selection_opacity: f32,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            point_radius: 0.015,
            point_opacity: 0.8,
            hover_radius: 0.08,
            hover_hex: 0xFFFFFF,
            hover_opacity: 0.9,
            selection_radius: 0.1,
            selection_hex: 0xFFC627,
            selection_opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneComposer {
    palette: Palette,
    style: SceneStyle,
}

impl SceneComposer {
    pub fn new(palette: Palette, style: SceneStyle) -> Self {
        Self { palette, style }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    /// Paints base colors and creates both markers (hidden).
    pub fn compose(&self, normalized: Normalized) -> Scene {
        let Normalized {
            mut buffer,
            transform,
            ..
        } = normalized;

        paint_palette(&mut buffer, &self.palette);

        let s = &self.style;
        Scene {
            buffer,
            transform,
            hover_marker: Marker::new(s.hover_radius, rgb_hex(s.hover_hex), s.hover_opacity),
            selection_marker: Marker::new(
                s.selection_radius,
                rgb_hex(s.selection_hex),
                s.selection_opacity,
            ),
            point_radius: s.point_radius,
            point_opacity: s.point_opacity,
            disposed: false,
        }
    }
}

/// Sets every point to its cluster's palette color.
pub fn paint_palette(buffer: &mut PointBuffer, palette: &Palette) {
    buffer.recolor(|cluster| palette.color_for(cluster));
}
