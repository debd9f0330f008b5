//! Edge render paths for the canvas.
//!
//! [`EdgePathManager`] turns the graph's edges into rows of
//! `(edge id, SVG path, color, line width)` that a Slint `Path` repeater can
//! draw directly. Paths go through [`CanvasState::edge_path`], the same
//! geometry the hit tester samples, so the clickable region matches the
//! drawn curve.
//!
//! # Example
//!
//! ```ignore
//! let mut edges = EdgePathManager::new();
//! let model = Rc::new(VecModel::<EdgePath>::default());
//! edges.bind_model(model.clone(), |id, path, color, width| EdgePath { id, path, color, width });
//! window.set_edge_paths(ModelRc::from(model));
//!
//! // after any layout, transform or selection change
//! edges.update_paths(graph.nodes(), graph.edges(), &state);
//! ```

use crate::graph::{Edge, EdgeId, Node};
use crate::path::generate_partial_bezier_path;
use crate::state::CanvasState;
use slint::{Color, Model, SharedString, VecModel};
use std::collections::HashMap;
use std::rc::Rc;

/// One drawable edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePathRow {
    pub id: EdgeId,
    pub path: String,
    pub color: Color,
    pub line_width: f32,
}

/// Internal trait for auto-syncing to Slint models.
trait ModelSyncer {
    fn sync(&self, rows: &[EdgePathRow]);
}

struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(SharedString, SharedString, Color, f32) -> P,
{
    fn sync(&self, rows: &[EdgePathRow]) {
        for (i, row) in rows.iter().enumerate() {
            let item = (self.constructor)(
                SharedString::from(row.id.to_string()),
                SharedString::from(row.path.as_str()),
                row.color,
                row.line_width,
            );
            if i < self.model.row_count() {
                self.model.set_row_data(i, item);
            } else {
                self.model.push(item);
            }
        }
        while self.model.row_count() > rows.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

#[derive(Default)]
pub struct EdgePathManager {
    rows: Vec<EdgePathRow>,
    /// Per-edge draw progress in `[0, 1]` while data flows along it.
    progress: HashMap<EdgeId, f32>,
    syncer: Option<Box<dyn ModelSyncer>>,
}

impl EdgePathManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a Slint model; every [`update_paths`](Self::update_paths)
    /// call syncs it. The constructor receives `(id, path, color, width)`.
    pub fn bind_model<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, Color, f32) -> P + 'static,
    {
        self.syncer = Some(Box::new(ConcreteModelSyncer { model, constructor }));
    }

    /// Draw only the first `progress` fraction of an edge. `1.0` or more
    /// removes the override.
    pub fn set_progress(&mut self, id: EdgeId, progress: f32) {
        if progress >= 1.0 {
            self.progress.remove(&id);
        } else {
            self.progress.insert(id, progress.max(0.0));
        }
    }

    pub fn clear_progress(&mut self) {
        self.progress.clear();
    }

    /// Recompute every row. Edges whose nodes are gone are skipped.
    pub fn update_paths(&mut self, nodes: &[Node], edges: &[Edge], state: &CanvasState) {
        let config = state.config();
        self.rows.clear();

        for edge in edges {
            let Some((start, end)) = state.edge_endpoints(nodes, edge) else {
                continue;
            };
            let path = match self.progress.get(&edge.id) {
                Some(&p) => {
                    generate_partial_bezier_path(start, end, state.scaled_bezier_offset(), p)
                }
                None => match state.edge_path(nodes, edge) {
                    Some(path) => path,
                    None => continue,
                },
            };
            let line_width = if state.is_edge_selected(edge.id) {
                config.selected_edge_line_width
            } else {
                config.edge_line_width
            };
            self.rows.push(EdgePathRow {
                id: edge.id,
                path,
                color: edge.data_type.color(),
                line_width,
            });
        }
        self.progress.retain(|id, _| edges.iter().any(|e| e.id == *id));

        if let Some(syncer) = &self.syncer {
            syncer.sync(&self.rows);
        }
    }

    pub fn rows(&self) -> &[EdgePathRow] {
        &self.rows
    }

    pub fn path_for(&self, id: EdgeId) -> Option<&str> {
        self.rows.iter().find(|r| r.id == id).map(|r| r.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
