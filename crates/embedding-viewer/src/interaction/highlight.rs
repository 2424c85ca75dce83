//! Per-frame hover/selection visual state.

use super::SelectionEvent;
use crate::data::types::PointBuffer;
use crate::scene::{Palette, Scene};
use glam::Vec3;

/// Applies selection dimming and positions the markers.
///
/// Colors are recomputed from the cluster array on every frame rather than
/// patched incrementally, so a missed transition can never leave stale colors.
#[derive(Debug, Clone, Default)]
pub struct HighlightEngine {
    palette: Palette,
}

impl HighlightEngine {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Runs the recolor pass for one frame. Must run before the draw call.
    pub fn apply(&self, scene: &mut Scene, selection: Option<&SelectionEvent>) {
        match selection {
            Some(sel) => {
                let position = selection_position(scene, sel);
                scene.selection_marker.show_at(position);

                let palette = &self.palette;
                let dimmed = palette.dimmed();
                scene.buffer.recolor(|cluster| {
                    if cluster == sel.cluster {
                        palette.color_for(cluster)
                    } else {
                        dimmed
                    }
                });
            }
            None => {
                scene.selection_marker.hide();
                let palette = &self.palette;
                scene.buffer.recolor(|cluster| palette.color_for(cluster));
            }
        }
    }

    /// Shows the hover marker on point `index`, or hides it.
    pub fn set_hover(&self, scene: &mut Scene, index: Option<usize>) {
        match index.filter(|&i| i < scene.buffer.len()) {
            Some(i) => {
                let p = scene.buffer.position(i);
                scene.hover_marker.show_at(p);
            }
            None => scene.hover_marker.hide(),
        }
    }
}

/// Render position of a selection: looked up in the buffer by id, otherwise
/// re-projected from its raw coordinate with the scene's transform.
pub fn selection_position(scene: &Scene, sel: &SelectionEvent) -> Vec3 {
    lookup(&scene.buffer, &sel.id)
        .unwrap_or_else(|| scene.transform.apply(Vec3::from(sel.point)))
}

fn lookup(buffer: &PointBuffer, id: &str) -> Option<Vec3> {
    buffer.index_of(id).map(|i| buffer.position(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::normalize;
    use crate::data::records::PointRecord;
    use crate::scene::SceneComposer;

    fn scene() -> Scene {
        let records = vec![
            PointRecord::new("a", [0.0, 0.0, 0.0], 0),
            PointRecord::new("b", [2.0, 0.0, 0.0], 1),
            PointRecord::new("c", [1.0, 1.0, 0.0], 0),
            PointRecord::new("n", [1.0, 0.0, 1.0], -1),
        ];
        SceneComposer::default().compose(normalize(&records).unwrap())
    }

    fn select(id: &str, cluster: i32, point: [f32; 3]) -> SelectionEvent {
        SelectionEvent { id: id.into(), cluster, point }
    }

    #[test]
    fn selection_dims_other_clusters() {
        let mut s = scene();
        let hl = HighlightEngine::default();
        let p = hl.palette().clone();

        hl.apply(&mut s, Some(&select("a", 0, [0.0, 0.0, 0.0])));

        assert_eq!(s.buffer.color(0), p.color_for(0));
        assert_eq!(s.buffer.color(2), p.color_for(0));
        assert_eq!(s.buffer.color(1), p.dimmed());
        assert_eq!(s.buffer.color(3), p.dimmed());
        assert!(s.selection_marker.is_visible());
        assert_eq!(s.selection_marker.position(), s.buffer.position(0));
    }

    #[test]
    fn clearing_selection_restores_palette() {
        let mut s = scene();
        let hl = HighlightEngine::default();
        let original: Vec<f32> = s.buffer.colors().to_vec();

        hl.apply(&mut s, Some(&select("b", 1, [2.0, 0.0, 0.0])));
        assert_ne!(s.buffer.colors(), &original[..]);

        hl.apply(&mut s, None);
        assert_eq!(s.buffer.colors(), &original[..]);
        assert!(!s.selection_marker.is_visible());
    }

    #[test]
    fn unknown_selection_is_reprojected() {
        let mut s = scene();
        let hl = HighlightEngine::default();

        // Not in the buffer: raw (2, 0, 0) maps through the stored transform.
        hl.apply(&mut s, Some(&select("elsewhere", 7, [2.0, 0.0, 0.0])));
        let expected = s.transform.apply(Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(s.selection_marker.position(), expected);
        // No point shares cluster 7.
        assert!((0..s.buffer.len()).all(|i| s.buffer.color(i) == hl.palette().dimmed()));
    }

    #[test]
    fn hover_marker_is_independent_of_selection() {
        let mut s = scene();
        let hl = HighlightEngine::default();

        hl.set_hover(&mut s, Some(1));
        hl.apply(&mut s, Some(&select("a", 0, [0.0, 0.0, 0.0])));
        assert!(s.hover_marker.is_visible());
        assert_eq!(s.hover_marker.position(), s.buffer.position(1));

        hl.apply(&mut s, None);
        assert!(s.hover_marker.is_visible());

        hl.set_hover(&mut s, None);
        assert!(!s.hover_marker.is_visible());
    }
}
