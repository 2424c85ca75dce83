//! Stateless egui helpers for the viewer panels and the hover tooltip.
//!
//! Drawing never mutates the engine; user intent comes back as [`UiEvent`]s
//! that the app applies after the frame.

use crate::data::loader::{DatasetParams, CLUSTERINGS, EMBEDDINGS, TECHNIQUES};
use crate::interaction::{HoverEvent, SelectionEvent};
use egui::{self, Context};

pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(0xFF, 0xC6, 0x27);

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    LoadRequested(DatasetParams),
    ClearSelection,
}

/// Result of the most recent dataset load, shown under the Load button.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading(String),
    Loaded { name: String, points: usize, invalid: usize },
    Failed(String),
}

/// Widget state that persists across frames.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub params: DatasetParams,
    pub status: LoadStatus,
    /// Datasets found on disk; empty means unknown and nothing is greyed out.
    pub available: Vec<DatasetParams>,
}

/// What the panels display this frame.
pub struct ViewModel<'a> {
    pub point_count: Option<usize>,
    pub selected: Option<&'a SelectionEvent>,
    pub hovered: Option<&'a HoverEvent>,
    /// Cursor position in egui points.
    pub cursor: Option<egui::Pos2>,
    pub loading: bool,
}

pub fn draw(ctx: &Context, state: &mut UiState, view: &ViewModel<'_>, events: &mut Vec<UiEvent>) {
    draw_header(ctx, view.point_count);
    draw_details_panel(ctx, view.selected, events);
    draw_config_panel(ctx, state, view.loading, events);
    draw_tooltip(ctx, view.hovered, view.cursor);
}

pub fn header_text(point_count: usize) -> String {
    format!("Points: {point_count} | Dimension: 3")
}

/// `X: …`, `Y: …`, `Z: …` with three decimals.
pub fn coordinate_lines(point: [f32; 3]) -> [String; 3] {
    let [x, y, z] = point;
    [format!("X: {x:.3}"), format!("Y: {y:.3}"), format!("Z: {z:.3}")]
}

/// True when some dataset on disk agrees with every choice in `candidate`.
pub fn is_offered(available: &[DatasetParams], candidate: &DatasetParams) -> bool {
    available.is_empty() || available.iter().any(|a| a.matches(candidate))
}

pub fn tooltip_lines(hover: &HoverEvent) -> [String; 2] {
    [format!("ID: {}", hover.id), format!("Cluster: {}", hover.cluster)]
}

fn draw_header(ctx: &Context, point_count: Option<usize>) {
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Embedding Visualization");
            if let Some(n) = point_count {
                ui.separator();
                ui.label(header_text(n));
            }
        });
    });
}

fn draw_details_panel(ctx: &Context, selected: Option<&SelectionEvent>, events: &mut Vec<UiEvent>) {
    egui::SidePanel::left("point_details")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("POINT DETAILS");
            ui.separator();
            match selected {
                None => {
                    ui.label("Click a point to inspect it.");
                }
                Some(sel) => {
                    ui.label(format!("ID: {}", sel.id));
                    ui.label(format!("Cluster: {}", sel.cluster));
                    ui.add_space(6.0);
                    ui.label("Position");
                    for line in coordinate_lines(sel.point) {
                        ui.monospace(line);
                    }
                    ui.add_space(12.0);
                    if ui.button("Clear selection").clicked() {
                        events.push(UiEvent::ClearSelection);
                    }
                }
            }
        });
}

fn combo(
    ui: &mut egui::Ui,
    label: &str,
    options: &[&'static str],
    value: &mut Option<&'static str>,
    offered: impl Fn(&'static str) -> bool,
) {
    ui.label(label);
    egui::ComboBox::from_id_source(label)
        .selected_text(value.unwrap_or("Select..."))
        .width(180.0)
        .show_ui(ui, |ui| {
            for option in options {
                ui.add_enabled_ui(offered(*option), |ui| {
                    ui.selectable_value(value, Some(*option), *option);
                });
            }
        });
    ui.add_space(6.0);
}

fn draw_config_panel(ctx: &Context, state: &mut UiState, loading: bool, events: &mut Vec<UiEvent>) {
    egui::SidePanel::right("configuration")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("CONFIGURATION");
            ui.separator();
            let current = state.params.clone();
            let available = &state.available;
            combo(ui, "Dimensionality reduction", &TECHNIQUES, &mut state.params.technique, |o| {
                is_offered(available, &DatasetParams { technique: Some(o), ..current.clone() })
            });
            combo(ui, "Embedding model", &EMBEDDINGS, &mut state.params.embedding, |o| {
                is_offered(available, &DatasetParams { embedding: Some(o), ..current.clone() })
            });
            combo(ui, "Clustering", &CLUSTERINGS, &mut state.params.clustering, |o| {
                is_offered(available, &DatasetParams { clustering: Some(o), ..current.clone() })
            });

            let enabled = state.params.is_complete()
                && is_offered(&state.available, &state.params)
                && !loading;
            let label = if loading { "Loading..." } else { "Load" };
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                events.push(UiEvent::LoadRequested(state.params.clone()));
            }

            ui.add_space(8.0);
            match &state.status {
                LoadStatus::Idle => {}
                LoadStatus::Loading(name) => {
                    ui.label(format!("Loading {name}"));
                }
                LoadStatus::Loaded { name, points, invalid } => {
                    ui.label(format!("{name}: {points} points"));
                    if *invalid > 0 {
                        ui.colored_label(ACCENT, format!("{invalid} points had invalid geometry"));
                    }
                }
                LoadStatus::Failed(msg) => {
                    ui.colored_label(egui::Color32::LIGHT_RED, msg);
                }
            }
        });
}

fn draw_tooltip(ctx: &Context, hovered: Option<&HoverEvent>, cursor: Option<egui::Pos2>) {
    let (Some(hover), Some(cursor)) = (hovered, cursor) else {
        return;
    };
    ctx.set_cursor_icon(egui::CursorIcon::PointingHand);

    egui::Area::new(egui::Id::new("hover_tooltip"))
        .fixed_pos(cursor + egui::vec2(12.0, 12.0))
        .order(egui::Order::Tooltip)
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                for line in tooltip_lines(hover) {
                    ui.label(line);
                }
            });
        });
}
