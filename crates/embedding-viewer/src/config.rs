use crate::interaction::EngineConfig;
use clap::Parser;
use std::path::PathBuf;

/// `embedding-viewer` - interactive 3D explorer for clustered embeddings.
///
/// Loads a JSON point dataset, fits it into the view and lets you orbit,
/// hover and select individual points.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Directory holding `<technique>_<embedding>_<clustering>.json` files.
    #[arg(long, env = "EMBEDDING_DATA_DIR", default_value = "public/data")]
    pub data_dir: PathBuf,

    /// Dataset file loaded at start-up.
    #[arg(long, env = "EMBEDDING_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Rendered point diameter in display units.
    #[arg(long, default_value_t = 0.03, allow_negative_numbers = true)]
    pub point_size: f32,

    /// Maximum ray-to-point distance accepted as a hit.
    #[arg(
        long,
        default_value_t = crate::interaction::picking::PICK_RADIUS,
        allow_negative_numbers = true
    )]
    pub pick_radius: f32,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if self.pick_radius.is_finite() && self.pick_radius > 0.0 {
            config.pick_radius = self.pick_radius;
        } else {
            log::warn!("Ignoring pick radius {}", self.pick_radius);
        }
        if self.point_size.is_finite() && self.point_size > 0.0 {
            config.style.point_radius = self.point_size * 0.5;
        } else {
            log::warn!("Ignoring point size {}", self.point_size);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["embedding-viewer"]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("public/data"));
        assert_eq!((config.width, config.height), (1280, 720));

        let engine = config.engine_config();
        assert_eq!(engine.pick_radius, 0.1);
        assert!((engine.style.point_radius - 0.015).abs() < 1e-6);
        assert_eq!(engine.drag_threshold_px, 5.0);
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = Config::try_parse_from([
            "embedding-viewer",
            "--dataset",
            "x.json",
            "--point-size",
            "0.1",
            "--pick-radius",
            "-1",
        ])
        .unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("x.json")));

        assert_eq!(config.pick_radius, -1.0);

        let engine = config.engine_config();
        assert!((engine.style.point_radius - 0.05).abs() < 1e-6);
        assert_eq!(engine.pick_radius, 0.1);
    }

    #[test]
    fn negative_point_size_falls_back() {
        let config =
            Config::try_parse_from(["embedding-viewer", "--point-size", "-0.2", "--pick-radius", "0.25"])
                .unwrap();
        let engine = config.engine_config();
        assert!((engine.style.point_radius - 0.015).abs() < 1e-6);
        assert_eq!(engine.pick_radius, 0.25);
    }
}
