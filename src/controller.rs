//! High-level controller wiring the canvas core to a Slint window.
//!
//! [`CanvasController`] owns the shared [`CanvasState`], the gesture
//! arbitrator and the edge path manager, and holds the graph collaborator.
//! Clone it into every Slint callback that needs it.
//!
//! # Example
//!
//! ```ignore
//! let ctrl = CanvasController::new(NodeGraph::new(), CanvasConfig::default());
//! let tracker = ctrl.tracker();
//!
//! window.on_port_frame_changed(tracker.port_frame_callback());
//! window.on_node_size_changed(tracker.node_size_callback());
//! window.on_compute_edge_path(ctrl.compute_edge_path_callback());
//!
//! window.on_pointer_down({
//!     let ctrl = ctrl.clone();
//!     move |x, y, shift| { ctrl.pointer_down(x, y, PointerKind::Mouse, shift); }
//! });
//! window.on_delete_pressed({
//!     let ctrl = ctrl.clone();
//!     move || { ctrl.delete_selection(); }
//! });
//! ```

use crate::config::CanvasConfig;
use crate::gesture::{
    delete_selection, GestureArbitrator, GestureOutcome, PointerEvent, PointerKind,
};
use crate::graph::{GraphDelegate, NodeId};
use crate::grid::generate_grid_commands;
use crate::hit_test::{hit_test, HitResult};
use crate::links::EdgePathManager;
use crate::path::connection_preview_path;
use crate::state::CanvasState;
use crate::tracking::LayoutTracker;
use crate::transform::{Point, Size};
use slint::{Color, LogicalPosition, SharedString, VecModel};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Shared handle over the canvas core and its graph collaborator.
pub struct CanvasController<G> {
    state: Rc<RefCell<CanvasState>>,
    gestures: Rc<RefCell<GestureArbitrator>>,
    edges: Rc<RefCell<EdgePathManager>>,
    graph: Rc<RefCell<G>>,
}

impl<G> Clone for CanvasController<G> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            gestures: self.gestures.clone(),
            edges: self.edges.clone(),
            graph: self.graph.clone(),
        }
    }
}

impl<G: GraphDelegate + 'static> CanvasController<G> {
    pub fn new(graph: G, config: CanvasConfig) -> Self {
        Self::with_shared(
            Rc::new(RefCell::new(graph)),
            Rc::new(RefCell::new(CanvasState::new(config))),
        )
    }

    /// Use a graph and state the host already shares elsewhere.
    pub fn with_shared(graph: Rc<RefCell<G>>, state: Rc<RefCell<CanvasState>>) -> Self {
        Self {
            state,
            gestures: Rc::new(RefCell::new(GestureArbitrator::new())),
            edges: Rc::new(RefCell::new(EdgePathManager::new())),
            graph,
        }
    }

    pub fn state(&self) -> Rc<RefCell<CanvasState>> {
        self.state.clone()
    }

    pub fn graph(&self) -> Rc<RefCell<G>> {
        self.graph.clone()
    }

    /// Layout callbacks writing into this controller's state.
    pub fn tracker(&self) -> LayoutTracker {
        LayoutTracker::with_state(self.state.clone())
    }

    pub fn set_bezier_offset(&self, offset: f32) {
        self.state.borrow_mut().config_mut().bezier_min_offset = offset;
    }

    pub fn set_grid_spacing(&self, spacing: f32) {
        self.state.borrow_mut().config_mut().grid_spacing = spacing;
    }

    pub fn set_editing_node(&self, editing: bool) {
        self.state.borrow_mut().set_editing_node(editing);
    }

    // === Pointer input ===

    pub fn handle_pointer(&self, event: PointerEvent) -> GestureOutcome {
        let mut state = self.state.borrow_mut();
        let mut graph = self.graph.borrow_mut();
        let outcome = self.gestures.borrow_mut().handle_pointer(event, &mut state, &mut *graph);
        if outcome != GestureOutcome::None {
            log::debug!("gesture outcome {:?}", outcome);
        }
        outcome
    }

    pub fn pointer_down(&self, x: f32, y: f32, kind: PointerKind, toggle: bool) -> GestureOutcome {
        self.handle_pointer(PointerEvent::Down {
            position: Point::new(x, y),
            kind,
            toggle,
        })
    }

    pub fn pointer_move(&self, x: f32, y: f32) -> GestureOutcome {
        self.handle_pointer(PointerEvent::moved(x, y))
    }

    pub fn pointer_up(&self, x: f32, y: f32) -> GestureOutcome {
        self.handle_pointer(PointerEvent::up(x, y))
    }

    pub fn pointer_cancel(&self) -> GestureOutcome {
        self.handle_pointer(PointerEvent::Cancel)
    }

    /// Escape key: abandon any drag in flight.
    pub fn escape(&self) -> GestureOutcome {
        self.gestures.borrow_mut().cancel(&mut self.state.borrow_mut())
    }

    pub fn scroll(&self, dx: f32, dy: f32) -> GestureOutcome {
        self.gestures
            .borrow_mut()
            .scroll(&mut self.state.borrow_mut(), Point::new(dx, dy))
    }

    pub fn pinch(&self, factor: f32, anchor_x: f32, anchor_y: f32) -> GestureOutcome {
        self.gestures
            .borrow_mut()
            .pinch(&mut self.state.borrow_mut(), factor, Point::new(anchor_x, anchor_y))
    }

    /// Start a connection drag from a port's own gesture recognizer.
    pub fn begin_port_drag(
        &self,
        node_id: NodeId,
        port_id: &str,
        is_output: bool,
    ) -> GestureOutcome {
        let graph = self.graph.borrow();
        self.gestures
            .borrow_mut()
            .begin_port_drag(&mut self.state.borrow_mut(), &*graph, node_id, port_id, is_output)
    }

    /// Delete the selection unless a node is being edited.
    pub fn delete_selection(&self) -> bool {
        delete_selection(&mut self.state.borrow_mut(), &mut *self.graph.borrow_mut())
    }

    pub fn can_delete_selection(&self) -> bool {
        self.state.borrow().can_delete_selection()
    }

    pub fn hit_test(&self, x: f32, y: f32) -> HitResult {
        let state = self.state.borrow();
        let graph = self.graph.borrow();
        let tolerance = state.config().edge_tolerance;
        hit_test(Point::new(x, y), graph.nodes(), graph.edges(), &state, tolerance)
    }

    // === Rendering ===

    /// Returns a callback for `compute-edge-path`: edge id string to SVG path.
    ///
    /// Unknown ids produce an empty path.
    pub fn compute_edge_path_callback(&self) -> impl Fn(SharedString) -> SharedString {
        let state = self.state.clone();
        let graph = self.graph.clone();
        move |edge_id| {
            let Ok(id) = Uuid::parse_str(&edge_id) else {
                return SharedString::new();
            };
            let graph = graph.borrow();
            graph
                .edge(id)
                .and_then(|edge| state.borrow().edge_path(graph.nodes(), edge))
                .unwrap_or_default()
                .into()
        }
    }

    /// Returns a callback resolving a port's current canvas position.
    pub fn port_position_callback(
        &self,
    ) -> impl Fn(SharedString, SharedString, bool) -> LogicalPosition {
        let state = self.state.clone();
        let graph = self.graph.clone();
        move |node_id, port_id, is_output| {
            let graph = graph.borrow();
            let position = Uuid::parse_str(&node_id)
                .ok()
                .and_then(|id| graph.node(id))
                .map(|node| state.borrow().port_screen_position(node, &port_id, is_output))
                .unwrap_or(Point::ZERO);
            LogicalPosition::new(position.x, position.y)
        }
    }

    /// Bind the edge rows to a Slint model. The constructor receives
    /// `(id, path, color, width)`.
    pub fn bind_edge_model<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(SharedString, SharedString, Color, f32) -> P + 'static,
    {
        self.edges.borrow_mut().bind_model(model, constructor);
    }

    /// Recompute all edge paths (and sync the bound model).
    pub fn update_edge_paths(&self) {
        let state = self.state.borrow();
        let graph = self.graph.borrow();
        self.edges
            .borrow_mut()
            .update_paths(graph.nodes(), graph.edges(), &state);
    }

    pub fn edge_paths(&self) -> Rc<RefCell<EdgePathManager>> {
        self.edges.clone()
    }

    /// Dot grid for a canvas of the given screen size.
    pub fn generate_grid(&self, width: f32, height: f32) -> SharedString {
        let state = self.state.borrow();
        let config = state.config();
        generate_grid_commands(
            Size::new(width, height),
            &state.transform(),
            config.grid_spacing,
            config.min_grid_pixel_spacing,
            config.grid_dot_radius,
        )
        .into()
    }

    /// Path of the in-progress connection, empty when none is active.
    pub fn connection_preview(&self) -> SharedString {
        let state = self.state.borrow();
        let (Some(active), Some(cursor)) =
            (state.active_connection(), state.connection_end_position())
        else {
            return SharedString::new();
        };
        let anchor = state.world_to_canvas(active.position);
        let offset = state.scaled_bezier_offset();
        connection_preview_path(anchor, cursor, active.is_output, offset).into()
    }
}
