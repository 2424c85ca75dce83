//! Pointer interaction: picking, hover/selection highlighting and camera
//! stabilization around clicks.

pub mod engine;
pub mod highlight;
pub mod picking;
pub mod stabilizer;

pub use self::engine::{Engine, EngineConfig};
pub use self::highlight::HighlightEngine;
pub use self::picking::{Hit, PickingController, PointerPhase};
pub use self::stabilizer::CameraStabilizer;

/// Published while the pointer rests over a point (tooltip content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverEvent {
    pub id: String,
    pub cluster: i32,
}

/// Emitted on a genuine click; `point` is the original, pre-normalization coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    pub id: String,
    pub cluster: i32,
    pub point: [f32; 3],
}

/// Hover and selection as seen by the engine.
///
/// When a selection exists it drives the per-point colors; hover only moves
/// the hover marker and the tooltip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub hovered: Option<HoverEvent>,
    pub selected: Option<SelectionEvent>,
}

/// Receives hover and selection events from the engine.
pub trait SelectionConsumer {
    /// Called once per genuine click on a point. Errors are logged by the
    /// engine; the camera is restored either way.
    fn on_select(&mut self, event: &SelectionEvent) -> anyhow::Result<()>;

    /// Called whenever the hovered point changes, `None` when it is cleared.
    fn on_hover(&mut self, _event: Option<&HoverEvent>) {}
}

/// Consumer that ignores everything.
impl SelectionConsumer for () {
    fn on_select(&mut self, _event: &SelectionEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
