//! Render pipelines.

pub mod points;
