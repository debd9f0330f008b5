//! Pointer gesture arbitration.
//!
//! A pointer sequence (down, moves, up or cancel) is claimed by at most one
//! recognizer, in priority order:
//!
//! 1. text editing inside a node (disables pan and zoom outright)
//! 2. port drag: fires on touch-down and creates connections
//! 3. node drag: needs [`CanvasConfig::node_drag_threshold`] of movement
//! 4. canvas pan and zoom
//! 5. tap: select a node or edge, or clear the selection
//!
//! Every end path, including cancellation, clears the active connection and
//! the transient drag positions before it returns.
//!
//! [`CanvasConfig::node_drag_threshold`]: crate::config::CanvasConfig::node_drag_threshold

use crate::error::{CanvasError, CanvasErrorKind};
use crate::graph::{ConnectionPoint, EdgeId, GraphDelegate, NodeId};
use crate::hit_test::{find_port_at, hit_test, port_targets, HitResult};
use crate::state::CanvasState;
use crate::transform::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

/// A normalized pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        position: Point,
        kind: PointerKind,
        /// Shift (or platform equivalent) held: taps toggle node selection.
        toggle: bool,
    },
    Move { position: Point },
    Up { position: Point },
    /// Platform cancellation (system interruption, pointer lost).
    Cancel,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self::Down {
            position: Point::new(x, y),
            kind: PointerKind::Mouse,
            toggle: false,
        }
    }

    pub fn touch_down(x: f32, y: f32) -> Self {
        Self::Down {
            position: Point::new(x, y),
            kind: PointerKind::Touch,
            toggle: false,
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::Move { position: Point::new(x, y) }
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::Up { position: Point::new(x, y) }
    }

    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Down { position, .. } | Self::Move { position } | Self::Up { position } => {
                Some(*position)
            }
            Self::Cancel => None,
        }
    }
}

/// What a handled event did, for UI feedback.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    None,
    Selected(HitResult),
    SelectionCleared,
    ConnectionStarted,
    ConnectionCreated(EdgeId),
    ConnectionRejected(CanvasErrorKind),
    /// Dropped on nothing.
    ConnectionCancelled,
    NodesMoved(Vec<NodeId>),
    Panned,
    Zoomed,
    Cancelled,
}

/// Which recognizer currently owns the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Pending,
    PortDrag,
    NodeDrag,
    Pan,
}

#[derive(Debug, Clone)]
struct NodeDrag {
    start: Point,
    last: Point,
    /// World positions at drag start.
    origins: Vec<(NodeId, Point)>,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Pending {
        start: Point,
        kind: PointerKind,
        toggle: bool,
        hit: HitResult,
    },
    PortDrag,
    NodeDrag(NodeDrag),
    Pan { last: Point },
}

fn rejected(err: CanvasError) -> GestureOutcome {
    log::warn!("connection rejected: {}", err);
    GestureOutcome::ConnectionRejected(err.kind())
}

fn pan_allowed(state: &CanvasState) -> bool {
    !state.is_editing_node() && !state.is_dragging_node() && state.active_connection().is_none()
}

#[derive(Debug, Clone)]
pub struct GestureArbitrator {
    phase: Phase,
}

impl Default for GestureArbitrator {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureArbitrator {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> GesturePhase {
        match self.phase {
            Phase::Idle => GesturePhase::Idle,
            Phase::Pending { .. } => GesturePhase::Pending,
            Phase::PortDrag => GesturePhase::PortDrag,
            Phase::NodeDrag(_) => GesturePhase::NodeDrag,
            Phase::Pan { .. } => GesturePhase::Pan,
        }
    }

    /// Feed one pointer event through the recognizers.
    pub fn handle_pointer<G>(
        &mut self,
        event: PointerEvent,
        state: &mut CanvasState,
        graph: &mut G,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        match event {
            PointerEvent::Down { position, kind, toggle } => {
                self.pointer_down(position, kind, toggle, state, graph)
            }
            PointerEvent::Move { position } => self.pointer_move(position, state, graph),
            PointerEvent::Up { position } => self.pointer_up(position, state, graph),
            PointerEvent::Cancel => self.cancel(state),
        }
    }

    fn pointer_down<G>(
        &mut self,
        position: Point,
        kind: PointerKind,
        toggle: bool,
        state: &mut CanvasState,
        graph: &mut G,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        if !matches!(self.phase, Phase::Idle) {
            log::warn!("pointer down during {:?}, cancelling it", self.phase());
            self.cancel(state);
        }

        let tolerance = match kind {
            PointerKind::Mouse => state.config().edge_tolerance,
            PointerKind::Touch => state.config().touch_edge_tolerance,
        };
        let hit = hit_test(position, graph.nodes(), graph.edges(), state, tolerance);
        log::trace!("pointer down at ({}, {}) hit {:?}", position.x, position.y, hit);

        if let HitResult::Port { node_id, port_id, is_output } = &hit {
            if state.config().port_drag_threshold <= 0.0 {
                return self.begin_port_drag(state, &*graph, *node_id, port_id, *is_output);
            }
        }

        self.phase = Phase::Pending { start: position, kind, toggle, hit };
        GestureOutcome::None
    }

    fn pointer_move<G>(
        &mut self,
        position: Point,
        state: &mut CanvasState,
        graph: &mut G,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        match &self.phase {
            Phase::Idle => GestureOutcome::None,
            Phase::Pending { start, hit, .. } => {
                let start = *start;
                let moved = start.distance(position);
                let config = state.config();
                let (port_threshold, node_threshold, pan_threshold) =
                    (config.port_drag_threshold, config.node_drag_threshold, config.pan_threshold);
                match hit.clone() {
                    HitResult::Port { node_id, port_id, is_output } if moved >= port_threshold => {
                        let outcome =
                            self.begin_port_drag(state, &*graph, node_id, &port_id, is_output);
                        self.update_port_drag(state, position);
                        outcome
                    }
                    HitResult::Node(id) if moved >= node_threshold => {
                        match self.begin_node_drag(state, &*graph, id, start) {
                            GestureOutcome::None if self.phase() == GesturePhase::NodeDrag => {
                                self.update_node_drag(state, position)
                            }
                            other => other,
                        }
                    }
                    HitResult::Canvas | HitResult::Edge(_) if moved >= pan_threshold => {
                        if !pan_allowed(state) {
                            // The sequence is swallowed; its release is not a tap.
                            log::debug!("pan refused");
                            self.phase = Phase::Idle;
                            return GestureOutcome::None;
                        }
                        log::debug!("pan began");
                        self.phase = Phase::Pan { last: start };
                        self.update_pan(state, position)
                    }
                    _ => GestureOutcome::None,
                }
            }
            Phase::PortDrag => {
                self.update_port_drag(state, position);
                GestureOutcome::None
            }
            Phase::NodeDrag(_) => self.update_node_drag(state, position),
            Phase::Pan { .. } => self.update_pan(state, position),
        }
    }

    fn pointer_up<G>(
        &mut self,
        position: Point,
        state: &mut CanvasState,
        graph: &mut G,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => GestureOutcome::None,
            Phase::Pending { hit, toggle, .. } => Self::tap(hit, toggle, state),
            Phase::PortDrag => {
                self.phase = Phase::PortDrag;
                self.end_port_drag(state, graph, position)
            }
            Phase::NodeDrag(drag) => {
                self.phase = Phase::NodeDrag(drag);
                if let GestureOutcome::Cancelled = self.update_node_drag(state, position) {
                    return GestureOutcome::Cancelled;
                }
                self.end_node_drag(state, graph)
            }
            Phase::Pan { .. } => {
                log::debug!("pan ended");
                GestureOutcome::Panned
            }
        }
    }

    /// Zero-movement gesture: dispatch on what was under the pointer.
    fn tap(hit: HitResult, toggle: bool, state: &mut CanvasState) -> GestureOutcome {
        log::debug!("tap on {:?}", hit);
        match hit {
            HitResult::Node(id) | HitResult::Port { node_id: id, .. } => {
                if toggle {
                    state.toggle_node_selection(id);
                } else {
                    state.select_node(id);
                }
                GestureOutcome::Selected(HitResult::Node(id))
            }
            HitResult::Edge(id) => {
                state.select_edge(id);
                GestureOutcome::Selected(HitResult::Edge(id))
            }
            HitResult::Canvas => {
                state.clear_selection();
                GestureOutcome::SelectionCleared
            }
        }
    }

    /// Abort whatever is in flight and restore a consistent state.
    ///
    /// Safe to call at any time; also the handler for Escape.
    pub fn cancel(&mut self, state: &mut CanvasState) -> GestureOutcome {
        let was = std::mem::replace(&mut self.phase, Phase::Idle);
        if let Phase::NodeDrag(drag) = &was {
            Self::revert_node_drag(state, drag);
        }
        let had_connection = state.clear_active_connection().is_some();
        let had_drag = state.is_dragging_node();
        state.end_node_drag();

        match was {
            Phase::Idle | Phase::Pending { .. } if !had_connection && !had_drag => {
                GestureOutcome::None
            }
            _ => {
                log::warn!("gesture cancelled");
                GestureOutcome::Cancelled
            }
        }
    }

    // ------------------------------------------------------------------------
    // Port drag
    // ------------------------------------------------------------------------

    /// Start a connection from a port. Any node drag in progress is dropped.
    ///
    /// The connection is anchored at the port's registered center, not at
    /// the raw pointer position.
    pub fn begin_port_drag<G>(
        &mut self,
        state: &mut CanvasState,
        graph: &G,
        node_id: NodeId,
        port_id: &str,
        is_output: bool,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        if let Phase::NodeDrag(drag) = &self.phase {
            log::debug!("port drag preempts node drag");
            Self::revert_node_drag(state, drag);
            state.end_node_drag();
        }
        self.phase = Phase::Idle;

        let Some(node) = graph.node(node_id) else {
            return rejected(CanvasError::NodeNotFound(node_id));
        };
        let port_type = state
            .registry()
            .port_data_type(node_id, port_id)
            .or_else(|| node.port(port_id, is_output).map(|p| p.data_type));
        let Some(port_type) = port_type else {
            return rejected(CanvasError::InvalidConnection);
        };

        let screen = state.port_screen_position(node, port_id, is_output);
        let point = ConnectionPoint {
            node_id,
            port_id: port_id.to_string(),
            port_type,
            is_output,
            position: state.canvas_to_world(screen),
        };
        log::debug!("port drag began from {}:{}", node_id, port_id);
        state.set_active_connection(point, screen);
        self.phase = Phase::PortDrag;
        GestureOutcome::ConnectionStarted
    }

    pub fn update_port_drag(&mut self, state: &mut CanvasState, cursor: Point) {
        log::trace!("connection cursor at ({}, {})", cursor.x, cursor.y);
        state.set_connection_end_position(cursor);
    }

    /// Drop the connection at `drop` and try to create an edge.
    pub fn end_port_drag<G>(
        &mut self,
        state: &mut CanvasState,
        graph: &mut G,
        drop: Point,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        self.phase = Phase::Idle;
        let Some(source) = state.clear_active_connection() else {
            return GestureOutcome::None;
        };

        let Some((node_id, port_id, is_output)) =
            Self::resolve_drop_target(state, &*graph, &source, drop)
        else {
            log::debug!("connection dropped on nothing");
            return GestureOutcome::ConnectionCancelled;
        };

        let Some(target_node) = graph.node(node_id) else {
            return rejected(CanvasError::NodeNotFound(node_id));
        };
        let port_type = state
            .registry()
            .port_data_type(node_id, &port_id)
            .or_else(|| target_node.port(&port_id, is_output).map(|p| p.data_type));
        let Some(port_type) = port_type else {
            return rejected(CanvasError::InvalidConnection);
        };
        let target_screen = state.port_screen_position(target_node, &port_id, is_output);
        let target = ConnectionPoint {
            node_id,
            port_id,
            port_type,
            is_output,
            position: state.canvas_to_world(target_screen),
        };

        if source.is_output == target.is_output {
            return rejected(CanvasError::IncompatiblePorts);
        }
        let (from, to) = if source.is_output { (&source, &target) } else { (&target, &source) };
        if !graph.can_connect(from.port_type, to.port_type) {
            return rejected(CanvasError::IncompatiblePorts);
        }

        match graph.create_edge(from, to) {
            Ok(id) => GestureOutcome::ConnectionCreated(id),
            Err(err) => rejected(err),
        }
    }

    /// Registered ports first, then fallback geometry for ports that have not
    /// been laid out yet. Ports on the source node never match.
    fn resolve_drop_target<G>(
        state: &CanvasState,
        graph: &G,
        source: &ConnectionPoint,
        drop: Point,
    ) -> Option<(NodeId, String, bool)>
    where
        G: GraphDelegate + ?Sized,
    {
        let radius = state.config().port_radius;
        if let Some((node_id, port_id)) = state.find_port(drop, Some(source.node_id), radius) {
            let is_output = state.registry().is_output(node_id, &port_id)?;
            return Some((node_id, port_id, is_output));
        }

        let unregistered = port_targets(graph.nodes(), state).filter(|p| {
            p.node_id != source.node_id
                && state.registry().port_position(p.node_id, &p.port_id).is_none()
        });
        find_port_at(drop, unregistered, radius).map(|p| (p.node_id, p.port_id, p.is_output))
    }

    // ------------------------------------------------------------------------
    // Node drag
    // ------------------------------------------------------------------------

    /// Start dragging `node_id` from screen point `start`.
    ///
    /// An unselected node becomes the selection; a selected node drags the
    /// whole node selection along.
    pub fn begin_node_drag<G>(
        &mut self,
        state: &mut CanvasState,
        graph: &G,
        node_id: NodeId,
        start: Point,
    ) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        if state.active_connection().is_some() {
            return GestureOutcome::None;
        }
        if graph.node(node_id).is_none() {
            log::warn!("drag on missing node {}", node_id);
            self.phase = Phase::Idle;
            return GestureOutcome::None;
        }
        if !state.is_node_selected(node_id) {
            state.select_node(node_id);
        }

        let origins: Vec<(NodeId, Point)> = graph
            .nodes()
            .iter()
            .filter(|n| state.is_node_selected(n.id))
            .map(|n| (n.id, state.node_position(n)))
            .collect();

        log::debug!("node drag began with {} node(s)", origins.len());
        state.begin_node_drag();
        self.phase = Phase::NodeDrag(NodeDrag { start, last: start, origins });
        GestureOutcome::None
    }

    /// Move the dragged nodes so they follow `position`.
    ///
    /// A connection that became active mid-drag wins: the drag is reverted.
    pub fn update_node_drag(&mut self, state: &mut CanvasState, position: Point) -> GestureOutcome {
        let Phase::NodeDrag(drag) = &mut self.phase else {
            return GestureOutcome::None;
        };

        if state.active_connection().is_some() {
            log::debug!("node drag yields to active connection");
            Self::revert_node_drag(state, drag);
            state.end_node_drag();
            self.phase = Phase::PortDrag;
            return GestureOutcome::Cancelled;
        }

        let scale = state.scale();
        let world_delta = (position - drag.start) * (1.0 / scale);
        let screen_step = position - drag.last;
        for &(id, origin) in &drag.origins {
            state.set_drag_position(id, origin + world_delta);
            state.registry_mut().translate_node(id, screen_step);
        }
        drag.last = position;
        log::trace!("node drag at ({}, {})", position.x, position.y);
        GestureOutcome::None
    }

    /// Commit the transient positions through the collaborator.
    pub fn end_node_drag<G>(&mut self, state: &mut CanvasState, graph: &mut G) -> GestureOutcome
    where
        G: GraphDelegate + ?Sized,
    {
        let Phase::NodeDrag(drag) = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return GestureOutcome::None;
        };
        let positions = state.end_node_drag();

        let mut moved = Vec::with_capacity(drag.origins.len());
        for (id, _) in &drag.origins {
            let Some(&position) = positions.get(id) else {
                continue;
            };
            match graph.commit_node_position(*id, position) {
                Ok(()) => moved.push(*id),
                Err(err) => log::warn!("could not commit position: {}", err),
            }
        }

        if moved.is_empty() {
            return GestureOutcome::None;
        }
        log::info!("{} node(s) moved", moved.len());
        GestureOutcome::NodesMoved(moved)
    }

    fn revert_node_drag(state: &mut CanvasState, drag: &NodeDrag) {
        let back = drag.start - drag.last;
        for &(id, _) in &drag.origins {
            state.registry_mut().translate_node(id, back);
        }
    }

    // ------------------------------------------------------------------------
    // Pan / zoom
    // ------------------------------------------------------------------------

    fn update_pan(&mut self, state: &mut CanvasState, position: Point) -> GestureOutcome {
        let Phase::Pan { last } = &mut self.phase else {
            return GestureOutcome::None;
        };
        if !pan_allowed(state) {
            log::debug!("pan preempted");
            self.phase = Phase::Idle;
            return GestureOutcome::None;
        }
        let delta = position - *last;
        *last = position;
        state.pan_by(delta);
        GestureOutcome::Panned
    }

    /// Two-finger scroll or wheel pan.
    pub fn scroll(&mut self, state: &mut CanvasState, delta: Point) -> GestureOutcome {
        if !pan_allowed(state) {
            return GestureOutcome::None;
        }
        state.pan_by(delta);
        GestureOutcome::Panned
    }

    /// Pinch or ctrl-wheel zoom by `factor` around `anchor`.
    pub fn pinch(&mut self, state: &mut CanvasState, factor: f32, anchor: Point) -> GestureOutcome {
        if !pan_allowed(state) {
            return GestureOutcome::None;
        }
        if state.zoom_by(factor, anchor) {
            GestureOutcome::Zoomed
        } else {
            GestureOutcome::None
        }
    }
}

/// Delete the current selection through the collaborator.
///
/// Does nothing while a node is being edited. Returns whether anything was
/// deleted.
pub fn delete_selection<G>(state: &mut CanvasState, graph: &mut G) -> bool
where
    G: GraphDelegate + ?Sized,
{
    if !state.can_delete_selection() {
        return false;
    }

    let edges = state.selected_edges().to_vec();
    let nodes = state.selected_nodes().to_vec();
    state.clear_selection();

    if !edges.is_empty() {
        let mut deleted = false;
        for id in edges {
            match graph.delete_edge(id) {
                Ok(()) => deleted = true,
                Err(err) => log::warn!("could not delete edge: {}", err),
            }
        }
        return deleted;
    }

    graph.delete_nodes(&nodes);
    for id in &nodes {
        state.forget_node(*id);
    }
    log::info!("deleted {} node(s)", nodes.len());
    true
}
