//! Engine configuration.
//!
//! One flat struct of tuning knobs, serde-backed so hosts can ship it as
//! part of their own settings. Defaults match the interactive-editor
//! behavior described in the component docs.

use crate::geometry::Size;
use serde::{Deserialize, Serialize};

/// Stacking-order settings used by the z-index middleware.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZIndexConfig {
    /// Raise selected nodes to `selected_z_index`.
    pub elevate_on_select: bool,
    pub selected_z_index: i32,
    /// Stack edges one above the higher of their endpoint nodes.
    pub edges_above_connected: bool,
}

impl Default for ZIndexConfig {
    fn default() -> Self {
        Self { elevate_on_select: true, selected_z_index: 1000, edges_above_connected: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub z_index: ZIndexConfig,

    /// Resize clamps node sizes to this minimum on both axes.
    pub min_node_size: Size,

    /// Grid step for drag/resize/keyboard snapping. `None` disables it.
    pub snap_step: Option<f64>,

    /// Explicit rotation snap in degrees. When unset, rotation micro-snaps
    /// to the nearest cardinal within `rotation_cardinal_tolerance`.
    pub rotation_snap: Option<f64>,
    /// Pointer distance from the pivot below which rotation input is
    /// ignored (angle is numerically unstable near the center).
    pub rotation_dead_zone: f64,
    pub rotation_cardinal_tolerance: f64,

    /// Standoff distance for orthogonal connector endpoints.
    pub routing_offset: f64,

    /// Edge-of-viewport panning while linking or keyboard-moving.
    pub edge_pan_threshold: f64,
    pub edge_pan_force: f64,

    /// Arrow-key move step when no snap grid is configured.
    pub keyboard_move_step: f64,

    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_to_fit_padding: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            z_index: ZIndexConfig::default(),
            min_node_size: Size::new(10.0, 10.0),
            snap_step: None,
            rotation_snap: None,
            rotation_dead_zone: 8.0,
            rotation_cardinal_tolerance: 5.0,
            routing_offset: 20.0,
            edge_pan_threshold: 40.0,
            edge_pan_force: 15.0,
            keyboard_move_step: 10.0,
            zoom_min: 0.25,
            zoom_max: 4.0,
            zoom_to_fit_padding: 40.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = FlowConfig::default();
        assert!(c.zoom_min < c.zoom_max);
        assert!(c.z_index.elevate_on_select);
        assert!(c.snap_step.is_none());
    }
}
