//! Error types for dataset normalization and scene construction.

use thiserror::Error;

/// Failures raised while turning raw point records into a renderable buffer.
///
/// `InvalidPointGeometry` is recoverable: it is reported as a diagnostic next
/// to a successful normalization result and the offending point is placed at
/// the origin. The remaining variants abort scene construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PointCloudError {
    #[error("point #{index} ({id}) has invalid geometry: {reason}")]
    InvalidPointGeometry {
        index: usize,
        id: String,
        reason: String,
    },

    #[error("dataset contains no valid points")]
    NoValidPoints,

    #[error("bounding box is not finite: min={min:?} max={max:?}")]
    DegenerateBounds { min: [f32; 3], max: [f32; 3] },

    #[error("dataset must be a JSON array or object, found {0}")]
    UnsupportedDataset(&'static str),
}
