//! Cluster → color mapping.

use crate::data::types::Rgb;

/// Converts a `0xRRGGBB` literal into an RGB triple.
pub fn rgb_hex(hex: u32) -> Rgb {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

pub const DEFAULT_CLUSTER_HEX: [u32; 4] = [
    0x8C1D40, // maroon
    0xFFC627, // gold
    0xB8860B, // dark goldenrod
    0xCD5C5C, // indian red
];
pub const NOISE_HEX: u32 = 0x5A5A5A;
pub const DIMMED_HEX: u32 = 0x262626;

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    clusters: Vec<Rgb>,
    noise: Rgb,
    dimmed: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_CLUSTER_HEX.iter().map(|&h| rgb_hex(h)).collect(),
            noise: rgb_hex(NOISE_HEX),
            dimmed: rgb_hex(DIMMED_HEX),
        }
    }
}

impl Palette {
    /// Returns `None` for an empty color list or when `noise` collides with a
    /// cluster color.
    pub fn new(clusters: Vec<Rgb>, noise: Rgb, dimmed: Rgb) -> Option<Self> {
        if clusters.is_empty() || clusters.contains(&noise) {
            return None;
        }
        Some(Self {
            clusters,
            noise,
            dimmed,
        })
    }

    /// `c >= 0` cycles through the palette; negative clusters are noise.
    #[inline]
    pub fn color_for(&self, cluster: i32) -> Rgb {
        if cluster < 0 {
            self.noise
        } else {
            self.clusters[cluster as usize % self.clusters.len()]
        }
    }

    #[inline]
    pub fn dimmed(&self) -> Rgb {
        self.dimmed
    }

    #[inline]
    pub fn noise(&self) -> Rgb {
        self.noise
    }
}
