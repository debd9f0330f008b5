//! Tunable constants for the canvas core.
//!
//! Every distance below is in **screen units** unless stated otherwise, so hit
//! targets keep the same physical size regardless of zoom.

use crate::transform::Size;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Port hit radius. 22 gives a 44-unit touch target.
    pub port_radius: f32,
    /// Edge hit distance for cursor (mouse) input.
    pub edge_tolerance: f32,
    /// Edge hit distance for touch input.
    pub touch_edge_tolerance: f32,
    /// Number of bezier samples used by edge hit tests.
    pub edge_hit_samples: usize,
    /// Minimum horizontal distance between an edge endpoint and its control point.
    pub bezier_min_offset: f32,
    /// Dot grid spacing in world units.
    pub grid_spacing: f32,
    /// Below this on-screen spacing no dots are generated at all.
    pub min_grid_pixel_spacing: f32,
    pub grid_dot_radius: f32,
    pub port_drag_threshold: f32,
    pub node_drag_threshold: f32,
    pub pan_threshold: f32,
    /// Node size (world units) used before a node has been measured.
    pub default_node_size: Size,
    /// Fallback port layout (world units): first port row starts below the header.
    pub port_header_height: f32,
    pub port_row_height: f32,
    pub edge_line_width: f32,
    pub selected_edge_line_width: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.25,
            max_scale: 2.0,
            port_radius: 22.0,
            edge_tolerance: 8.0,
            touch_edge_tolerance: 22.0,
            edge_hit_samples: 20,
            bezier_min_offset: 50.0,
            grid_spacing: 24.0,
            min_grid_pixel_spacing: 8.0,
            grid_dot_radius: 1.0,
            port_drag_threshold: 0.0,
            node_drag_threshold: 10.0,
            pan_threshold: 4.0,
            default_node_size: Size::new(200.0, 120.0),
            port_header_height: 44.0,
            port_row_height: 28.0,
            edge_line_width: 2.0,
            selected_edge_line_width: 4.0,
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp a requested zoom scale into `[min_scale, max_scale]`.
    ///
    /// Inverted bounds are swapped rather than trusted.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        let (lo, hi) = if self.min_scale <= self.max_scale {
            (self.min_scale, self.max_scale)
        } else {
            (self.max_scale, self.min_scale)
        };
        if scale.is_nan() {
            return lo;
        }
        // f32::max/min ignore a NaN bound instead of panicking
        scale.max(lo).min(hi)
    }
}
