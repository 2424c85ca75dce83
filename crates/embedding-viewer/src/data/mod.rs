// src/data/mod.rs
//! Dataset handling for the viewer.
//!
//! - `records`: decoding raw JSON datasets into point records.
//! - `normalize`: fitting a dataset into the display cube.
//! - `types`: the point buffer and the data structures shared with the GPU.
//! - `loader`: dataset naming and background file loading.

pub mod loader;
pub mod normalize;
pub mod records;
pub mod types;

pub use self::loader::{DatasetLoader, DatasetParams, LoadResponse};
pub use self::normalize::{normalize, Normalization, Normalized};
pub use self::records::{parse_dataset, PointRecord};
pub use self::types::{CameraUniformStd140, NormalizedPoint, PointBuffer, PointInstance};
