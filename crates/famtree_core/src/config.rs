//! Engine configuration.
//!
//! # Responsibility
//! - Hold node geometry, spacing and editor limits in one place.
//! - Allow the UI shell to override defaults through serde.
//!
//! # Invariants
//! - Defaults reproduce the classic 80x80 node layout.
//! - Sizes are canvas units; positions in `Person` are node centers.

use serde::{Deserialize, Serialize};

/// Node geometry and connector spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between neighbouring nodes placed by the editor.
    pub sibling_spacing: f64,
    /// Vertical distance between generations placed by the editor.
    pub level_spacing: f64,
    /// Drop from a node's bottom edge to its marriage line.
    pub marriage_drop: f64,
    /// Gap between the sibling bar and the children's top edges.
    pub sibling_bar_gap: f64,
    /// Extra margin around nodes for export rectangles.
    pub export_padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 80.0,
            node_height: 80.0,
            sibling_spacing: 30.0,
            level_spacing: 140.0,
            marriage_drop: 20.0,
            sibling_bar_gap: 45.0,
            export_padding: 20.0,
        }
    }
}

impl LayoutConfig {
    pub fn half_width(&self) -> f64 {
        self.node_width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.node_height / 2.0
    }

    /// Horizontal step between a node and its right-hand neighbour.
    pub fn horizontal_step(&self) -> f64 {
        self.node_width + self.sibling_spacing
    }
}

/// Editor limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of retained undo snapshots.
    pub history_depth: usize,
    /// Pointer travel before a drag picks its axis.
    pub drag_deadzone: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 20,
            drag_deadzone: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorConfig, LayoutConfig};

    #[test]
    fn defaults_match_classic_layout() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.horizontal_step(), 110.0);
        assert_eq!(layout.half_height(), 40.0);
        assert_eq!(EditorConfig::default().history_depth, 20);
    }
}
