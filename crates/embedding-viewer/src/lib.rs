// src/lib.rs
//! Interactive 3D viewer for clustered embedding point clouds.
//!
//! The library holds the interaction engine (normalization, picking,
//! highlighting, camera stabilization, scene lifecycle) independently of the
//! GPU renderer and the egui front end that drive it.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod error;
pub mod interaction;
pub mod renderer;
pub mod scene;
pub mod ui;

pub use error::PointCloudError;
