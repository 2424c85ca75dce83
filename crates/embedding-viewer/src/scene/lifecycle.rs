//! Decides when a dataset needs a new scene and owns scene teardown.

use super::{Scene, SceneComposer};
use crate::data::normalize::normalize;
use crate::data::records::PointRecord;
use crate::error::PointCloudError;

/// Leading and trailing records sampled into a fingerprint.
const FINGERPRINT_SAMPLE: usize = 5;

/// Cheap structural identity of a dataset: record count plus the ids,
/// clusters and coordinate bits of a few leading and trailing records.
///
/// Equal fingerprints mean the current scene is reused. The value is opaque;
/// compare it, do not inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetFingerprint {
    count: usize,
    sample: Vec<(String, i32, Option<[u32; 3]>)>,
}

impl DatasetFingerprint {
    pub fn of(records: &[PointRecord]) -> Self {
        let n = records.len();
        let head = n.min(FINGERPRINT_SAMPLE);
        let tail_start = n.saturating_sub(FINGERPRINT_SAMPLE).max(head);

        let sample = records[..head]
            .iter()
            .chain(&records[tail_start..])
            .map(|r| {
                let bits = r.geometry.as_ref().ok().copied().map(|p| p.map(f32::to_bits));
                (r.id.clone(), r.cluster, bits)
            })
            .collect();

        Self { count: n, sample }
    }
}

/// GPU-side counterpart of a [`Scene`].
pub trait SceneBackend {
    /// Allocates resources for a freshly composed scene.
    fn mount(&mut self, scene: &Scene);

    /// Releases everything allocated by `mount`. Must tolerate repeated calls.
    fn unmount(&mut self);

    /// Updates the output size without touching scene resources.
    fn resize(&mut self, width: u32, height: u32);
}

/// What [`SceneLifecycle::sync`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Reused,
    Rebuilt { points: usize, invalid: usize },
}

#[derive(Debug, Default)]
pub struct SceneLifecycle {
    composer: SceneComposer,
    scene: Option<Scene>,
    fingerprint: Option<DatasetFingerprint>,
}

impl SceneLifecycle {
    pub fn new(composer: SceneComposer) -> Self {
        Self {
            composer,
            scene: None,
            fingerprint: None,
        }
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn fingerprint(&self) -> Option<&DatasetFingerprint> {
        self.fingerprint.as_ref()
    }

    /// Makes the mounted scene match `records`.
    ///
    /// An unchanged fingerprint reuses the current scene. Otherwise the data is
    /// normalized first; only on success is the old scene torn down and the new
    /// one mounted, so a failing dataset leaves the previous scene in place.
    pub fn sync<B: SceneBackend>(
        &mut self,
        records: &[PointRecord],
        backend: &mut B,
    ) -> Result<SyncOutcome, PointCloudError> {
        let fingerprint = DatasetFingerprint::of(records);
        if self.scene.is_some() && self.fingerprint.as_ref() == Some(&fingerprint) {
            log::debug!("Dataset fingerprint unchanged ({} points); reusing scene", records.len());
            return Ok(SyncOutcome::Reused);
        }

        let normalized = normalize(records)?;
        let invalid = normalized.diagnostics.len();
        let scene = self.composer.compose(normalized);

        self.teardown(backend);
        backend.mount(&scene);

        let points = scene.buffer.len();
        log::info!(
            "Mounted scene: {} points ({} invalid), center={:?}, scale={:.4}",
            points,
            invalid,
            scene.transform.center,
            scene.transform.scale
        );

        self.scene = Some(scene);
        self.fingerprint = Some(fingerprint);
        Ok(SyncOutcome::Rebuilt { points, invalid })
    }

    /// Releases GPU and CPU resources of the current scene, if any.
    pub fn teardown<B: SceneBackend>(&mut self, backend: &mut B) {
        backend.unmount();
        if let Some(mut scene) = self.scene.take() {
            if scene.dispose() {
                log::info!("Scene torn down");
            }
        }
        self.fingerprint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        mounts: Vec<usize>,
        unmounts: usize,
    }

    impl SceneBackend for Recorder {
        fn mount(&mut self, scene: &Scene) {
            self.mounts.push(scene.buffer.len());
        }
        fn unmount(&mut self) {
            self.unmounts += 1;
        }
        fn resize(&mut self, _width: u32, _height: u32) {}
    }

    fn dataset(n: usize, offset: f32) -> Vec<PointRecord> {
        (0..n)
            .map(|i| PointRecord::new(format!("id{i}"), [i as f32 + offset, 0.0, 0.0], (i % 3) as i32))
            .collect()
    }

    #[test]
    fn fingerprint_tracks_count_and_samples() {
        let a = dataset(20, 0.0);
        assert_eq!(DatasetFingerprint::of(&a), DatasetFingerprint::of(&a.clone()));
        assert_ne!(DatasetFingerprint::of(&a), DatasetFingerprint::of(&dataset(21, 0.0)));
        // Same ids, different coordinates.
        assert_ne!(DatasetFingerprint::of(&a), DatasetFingerprint::of(&dataset(20, 1.0)));
    }

    #[test]
    fn fingerprint_of_tiny_dataset_does_not_double_count() {
        let fp = DatasetFingerprint::of(&dataset(3, 0.0));
        assert_eq!(fp.sample.len(), 3);
        assert_eq!(DatasetFingerprint::of(&[]).sample.len(), 0);
    }

    #[test]
    fn same_dataset_is_reused() {
        let mut life = SceneLifecycle::default();
        let mut be = Recorder::default();
        let data = dataset(10, 0.0);

        assert_eq!(life.sync(&data, &mut be).unwrap(), SyncOutcome::Rebuilt { points: 10, invalid: 0 });
        assert_eq!(life.sync(&data, &mut be).unwrap(), SyncOutcome::Reused);
        assert_eq!(be.mounts, vec![10]);
    }

    #[test]
    fn changed_dataset_tears_down_then_rebuilds() {
        let mut life = SceneLifecycle::default();
        let mut be = Recorder::default();

        life.sync(&dataset(10, 0.0), &mut be).unwrap();
        let unmounts_before = be.unmounts;
        life.sync(&dataset(12, 0.0), &mut be).unwrap();

        assert_eq!(be.mounts, vec![10, 12]);
        assert_eq!(be.unmounts, unmounts_before + 1);
        assert_eq!(life.scene().unwrap().buffer.len(), 12);
    }

    #[test]
    fn failed_dataset_preserves_previous_scene() {
        let mut life = SceneLifecycle::default();
        let mut be = Recorder::default();
        life.sync(&dataset(4, 0.0), &mut be).unwrap();
        let fp = life.fingerprint().cloned();

        assert_eq!(life.sync(&[], &mut be).unwrap_err(), PointCloudError::NoValidPoints);
        assert_eq!(life.scene().unwrap().buffer.len(), 4);
        assert_eq!(life.fingerprint().cloned(), fp);
        assert_eq!(be.mounts, vec![4]);
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut life = SceneLifecycle::default();
        let mut be = Recorder::default();
        life.sync(&dataset(4, 0.0), &mut be).unwrap();

        life.teardown(&mut be);
        life.teardown(&mut be);
        assert!(life.scene().is_none());
        assert!(life.fingerprint().is_none());

        // A torn-down dataset is rebuilt even with the same fingerprint.
        assert!(matches!(life.sync(&dataset(4, 0.0), &mut be).unwrap(), SyncOutcome::Rebuilt { .. }));
    }
}
