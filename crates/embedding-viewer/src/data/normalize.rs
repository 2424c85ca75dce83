//! Centering and uniform scaling of raw points into the display cube.

use crate::data::records::PointRecord;
use crate::data::types::{NormalizedPoint, PointBuffer};
use crate::error::PointCloudError;
use glam::Vec3;
use rayon::prelude::*;

/// Side length of the cube (centered at the origin) that normalized points occupy.
pub const DISPLAY_CUBE_SIDE: f32 = 4.0;

/// Number of invalid-geometry warnings logged individually before summarising.
const MAX_LOGGED_DIAGNOSTICS: usize = 16;

/// The similarity transform applied to every raw coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub center: Vec3,
    pub scale: f32,
}

impl Normalization {
    /// Maps a raw coordinate into display space.
    #[inline]
    pub fn apply(&self, raw: Vec3) -> Vec3 {
        (raw - self.center) * self.scale
    }

    /// Derives the transform from an axis-aligned bounding box.
    ///
    /// The extent is floored at 1 so coincident or planar data never yields a
    /// zero or exploding scale.
    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        let range = max - min;
        Self {
            center: (min + max) * 0.5,
            scale: DISPLAY_CUBE_SIDE / range.max_element().max(1.0),
        }
    }
}

/// Result of a successful normalization pass.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub buffer: PointBuffer,
    pub transform: Normalization,
    /// Non-fatal [`PointCloudError::InvalidPointGeometry`] entries.
    pub diagnostics: Vec<PointCloudError>,
}

/// Converts decoded records into a centered, unit-scaled [`PointBuffer`].
///
/// Records with unusable geometry are placed at the raw origin and reported in
/// [`Normalized::diagnostics`]. Fails when no record has valid geometry or the
/// bounding box is not finite.
pub fn normalize(records: &[PointRecord]) -> Result<Normalized, PointCloudError> {
    let mut diagnostics = Vec::new();
    let raw: Vec<[f32; 3]> = records
        .iter()
        .enumerate()
        .map(|(index, record)| match &record.geometry {
            Ok(p) => *p,
            Err(fault) => {
                diagnostics.push(PointCloudError::InvalidPointGeometry {
                    index,
                    id: record.id.clone(),
                    reason: match record.source.field() {
                        Some(field) => format!("{field}: {fault}"),
                        None => fault.to_string(),
                    },
                });
                [0.0; 3]
            }
        })
        .collect();

    for diag in diagnostics.iter().take(MAX_LOGGED_DIAGNOSTICS) {
        log::warn!("{diag}; substituting the origin");
    }
    if diagnostics.len() > MAX_LOGGED_DIAGNOSTICS {
        log::warn!(
            "{} further points with invalid geometry were substituted",
            diagnostics.len() - MAX_LOGGED_DIAGNOSTICS
        );
    }

    if diagnostics.len() == records.len() {
        return Err(PointCloudError::NoValidPoints);
    }

    let (min, max) = raw
        .par_iter()
        .map(|p| (Vec3::from(*p), Vec3::from(*p)))
        .reduce(
            || (Vec3::INFINITY, Vec3::NEG_INFINITY),
            |(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)),
        );

    if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
        return Err(PointCloudError::DegenerateBounds {
            min: min.to_array(),
            max: max.to_array(),
        });
    }

    let transform = Normalization::from_bounds(min, max);

    let points: Vec<NormalizedPoint> = records
        .par_iter()
        .zip(raw.par_iter())
        .map(|(record, p)| NormalizedPoint {
            id: record.id.clone(),
            position: transform.apply(Vec3::from(*p)).to_array(),
            cluster: record.cluster,
        })
        .collect();

    log::debug!(
        "Normalized {} points: min={:?} max={:?} center={:?} scale={:.4}",
        points.len(),
        min,
        max,
        transform.center,
        transform.scale
    );

    Ok(Normalized {
        buffer: PointBuffer::new(points, raw),
        transform,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::{GeometryFault, GeometrySource};
    use proptest::prelude::*;

    fn rec(id: &str, p: [f32; 3], cluster: i32) -> PointRecord {
        PointRecord::new(id, p, cluster)
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn two_points_on_x_axis() {
        let out = normalize(&[rec("a", [0.0, 0.0, 0.0], 0), rec("b", [2.0, 0.0, 0.0], 1)]).unwrap();

        assert_eq!(out.transform.center, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(out.transform.scale, 2.0);
        assert!(close(out.buffer.position(0), Vec3::new(-2.0, 0.0, 0.0)));
        assert!(close(out.buffer.position(1), Vec3::new(2.0, 0.0, 0.0)));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn single_point_uses_unit_floor() {
        let out = normalize(&[rec("x", [5.0, 5.0, 5.0], 0)]).unwrap();

        assert_eq!(out.transform.scale, 4.0);
        assert_eq!(out.buffer.position(0), Vec3::ZERO);
        assert_eq!(out.buffer.raw(0), [5.0, 5.0, 5.0]);
    }

    #[test]
    fn invalid_geometry_becomes_origin_with_diagnostic() {
        let bad = PointRecord {
            id: "bad".into(),
            source: GeometrySource::Point,
            geometry: Err(GeometryFault::WrongArity(2)),
            cluster: 1,
        };
        let out = normalize(&[rec("a", [4.0, 0.0, 0.0], 0), bad]).unwrap();

        assert_eq!(out.buffer.len(), 2);
        assert_eq!(out.buffer.raw(1), [0.0; 3]);
        assert_eq!(out.diagnostics.len(), 1);
        assert!(matches!(
            &out.diagnostics[0],
            PointCloudError::InvalidPointGeometry { index: 1, id, reason }
                if id == "bad" && reason == "point: expected 3 components, found 2"
        ));
    }

    #[test]
    fn empty_or_all_invalid_fails() {
        assert_eq!(normalize(&[]).unwrap_err(), PointCloudError::NoValidPoints);

        let bad = PointRecord {
            id: "0".into(),
            source: GeometrySource::Missing,
            geometry: Err(GeometryFault::Missing),
            cluster: 0,
        };
        assert_eq!(normalize(&[bad]).unwrap_err(), PointCloudError::NoValidPoints);
    }

    #[test]
    fn overflowing_extent_is_degenerate() {
        let err = normalize(&[rec("lo", [-3.0e38, 0.0, 0.0], 0), rec("hi", [3.0e38, 0.0, 0.0], 0)])
            .unwrap_err();
        assert!(matches!(err, PointCloudError::DegenerateBounds { .. }));
    }

    fn coord() -> impl Strategy<Value = f32> {
        -1.0e3f32..1.0e3f32
    }

    fn cloud() -> impl Strategy<Value = Vec<[f32; 3]>> {
        prop::collection::vec(prop::array::uniform3(coord()), 1..64)
    }

    proptest! {
        #[test]
        fn positions_stay_inside_display_cube(raw in cloud()) {
            let records: Vec<_> = raw.iter().enumerate().map(|(i, p)| rec(&i.to_string(), *p, 0)).collect();
            let out = normalize(&records).unwrap();
            let half = DISPLAY_CUBE_SIDE / 2.0;
            for v in out.buffer.positions() {
                prop_assert!(v.abs() <= half * (1.0 + 1e-5), "{} escaped the cube", v);
            }
        }

        #[test]
        fn normalization_is_a_similarity(raw in cloud(), i in any::<prop::sample::Index>(), j in any::<prop::sample::Index>()) {
            let records: Vec<_> = raw.iter().enumerate().map(|(k, p)| rec(&k.to_string(), *p, 0)).collect();
            let out = normalize(&records).unwrap();
            let (i, j) = (i.index(raw.len()), j.index(raw.len()));

            let raw_dist = Vec3::from(raw[i]).distance(Vec3::from(raw[j]));
            let norm_dist = out.buffer.position(i).distance(out.buffer.position(j));
            let expected = out.transform.scale * raw_dist;
            prop_assert!((expected - norm_dist).abs() <= 2e-3 * expected.max(1.0));
        }
    }
}
