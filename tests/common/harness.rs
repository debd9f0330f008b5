//! Test harness for a two-node canvas.
//!
//! Wires a [`CanvasController`] to a recording graph collaborator and
//! provides helpers for simulating layout passes and user interactions.

#![allow(dead_code)]

use super::{init_logging, CallbackTracker};
use flow_canvas::{
    CanvasConfig, CanvasController, CanvasError, ConnectionPoint, DataType, Edge, EdgeId,
    GestureOutcome, GraphDelegate, HitResult, Node, NodeGraph, NodeId, Point, PointerKind,
    PortDefinition, Size,
};

/// [`NodeGraph`] wrapper that records every collaborator call.
pub struct RecordingGraph {
    pub inner: NodeGraph,
    pub tracker: CallbackTracker,
}

impl GraphDelegate for RecordingGraph {
    fn nodes(&self) -> &[Node] {
        self.inner.nodes()
    }

    fn edges(&self) -> &[Edge] {
        self.inner.edges()
    }

    fn create_edge(
        &mut self,
        from: &ConnectionPoint,
        to: &ConnectionPoint,
    ) -> Result<EdgeId, CanvasError> {
        self.tracker.create_edge.borrow_mut().push((
            from.node_id,
            from.port_id.clone(),
            to.node_id,
            to.port_id.clone(),
        ));
        let result = self.inner.create_edge(from, to);
        if result.is_err() {
            *self.tracker.create_edge_failed.borrow_mut() += 1;
        }
        result
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<(), CanvasError> {
        self.tracker.delete_edge.borrow_mut().push(id);
        self.inner.delete_edge(id)
    }

    fn delete_nodes(&mut self, ids: &[NodeId]) {
        self.tracker.delete_nodes.borrow_mut().push(ids.to_vec());
        self.inner.delete_nodes(ids)
    }

    fn commit_node_position(&mut self, id: NodeId, position: Point) -> Result<(), CanvasError> {
        self.tracker.commit_node_position.borrow_mut().push((id, position));
        self.inner.commit_node_position(id, position)
    }

    fn can_connect(&self, source: DataType, target: DataType) -> bool {
        self.inner.can_connect(source, target)
    }
}

/// Canvas with N1 (output "out", string) at (100, 100) and N2 (input "in",
/// string) at (500, 300), laid out once.
pub struct CanvasTestHarness {
    pub ctrl: CanvasController<RecordingGraph>,
    pub tracker: CallbackTracker,
    pub n1: NodeId,
    pub n2: NodeId,
}

impl CanvasTestHarness {
    pub fn new() -> Self {
        let n1 = Node::new("source", Point::new(100.0, 100.0))
            .with_output(PortDefinition::new("out", "Output", DataType::String));
        let n2 = Node::new("sink", Point::new(500.0, 300.0))
            .with_input(PortDefinition::new("in", "Input", DataType::String));
        Self::with_nodes(vec![n1, n2], CanvasConfig::default())
    }

    /// Harness over arbitrary nodes. `n1`/`n2` are the first two node ids
    /// (or nil when fewer nodes are given).
    pub fn with_nodes(nodes: Vec<Node>, config: CanvasConfig) -> Self {
        init_logging();

        let tracker = CallbackTracker::new();
        let mut inner = NodeGraph::new();
        let ids: Vec<NodeId> = nodes.into_iter().map(|n| inner.add_node(n)).collect();
        let graph = RecordingGraph {
            inner,
            tracker: tracker.clone(),
        };

        let harness = Self {
            ctrl: CanvasController::new(graph, config),
            tracker,
            n1: ids.first().copied().unwrap_or_default(),
            n2: ids.get(1).copied().unwrap_or_default(),
        };
        harness.layout();
        harness
    }

    /// Simulate a layout pass: every port reports its frame and every node
    /// its size, through the same callbacks a Slint window would use.
    pub fn layout(&self) {
        let tracker = self.ctrl.tracker();
        let report_port = tracker.port_frame_callback();
        let report_size = tracker.node_size_callback();

        let state = self.ctrl.state();
        let graph = self.ctrl.graph();
        let mut reports = Vec::new();
        {
            let state = state.borrow();
            for node in graph.borrow().nodes() {
                let inputs = node.inputs.iter().map(|p| (p, false));
                let outputs = node.outputs.iter().map(|p| (p, true));
                for (port, is_output) in inputs.chain(outputs) {
                    let world = state.fallback_port_world_position(node, &port.id, is_output);
                    let screen = state.world_to_canvas(world);
                    reports.push((node.id, port.id.clone(), is_output, port.data_type, screen));
                }
            }
        }
        for (node_id, port_id, is_output, data_type, screen) in reports {
            report_port(
                node_id.to_string().into(),
                port_id.into(),
                is_output,
                data_type.index(),
                screen.x,
                screen.y,
            );
        }

        let sizes: Vec<(NodeId, Size)> = {
            let state = state.borrow();
            graph
                .borrow()
                .nodes()
                .iter()
                .map(|n| (n.id, state.node_screen_rect(n).size))
                .collect()
        };
        for (id, size) in sizes {
            report_size(id.to_string().into(), size.width, size.height);
        }
    }

    // === Queries ===

    pub fn registered_port(&self, node_id: NodeId, port_id: &str) -> Point {
        self.ctrl
            .state()
            .borrow()
            .registry()
            .port_position(node_id, port_id)
            .expect("port registered")
    }

    pub fn node_position(&self, node_id: NodeId) -> Point {
        self.ctrl
            .graph()
            .borrow()
            .node(node_id)
            .expect("node exists")
            .position
    }

    /// Screen-space point inside the node body, away from its ports.
    pub fn node_body(&self, node_id: NodeId) -> Point {
        let graph = self.ctrl.graph();
        let graph = graph.borrow();
        let node = graph.node(node_id).expect("node exists");
        let state = self.ctrl.state();
        let rect = state.borrow().node_screen_rect(node);
        Point::new(rect.center().x, rect.min_y() + 10.0)
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.ctrl.graph().borrow().edges().to_vec()
    }

    pub fn node_count(&self) -> usize {
        self.ctrl.graph().borrow().nodes().len()
    }

    pub fn hit(&self, p: Point) -> HitResult {
        self.ctrl.hit_test(p.x, p.y)
    }

    // === Interactions ===

    pub fn tap(&self, p: Point) -> GestureOutcome {
        self.ctrl.pointer_down(p.x, p.y, PointerKind::Mouse, false);
        self.ctrl.pointer_up(p.x, p.y)
    }

    pub fn touch_tap(&self, p: Point) -> GestureOutcome {
        self.ctrl.pointer_down(p.x, p.y, PointerKind::Touch, false);
        self.ctrl.pointer_up(p.x, p.y)
    }

    pub fn shift_tap(&self, p: Point) -> GestureOutcome {
        self.ctrl.pointer_down(p.x, p.y, PointerKind::Mouse, true);
        self.ctrl.pointer_up(p.x, p.y)
    }

    /// Press at `from`, move in `steps` equal increments to `to`, release.
    pub fn drag(&self, from: Point, to: Point, steps: usize) -> GestureOutcome {
        self.ctrl.pointer_down(from.x, from.y, PointerKind::Mouse, false);
        let steps = steps.max(1);
        for i in 1..=steps {
            let p = from.lerp(to, i as f32 / steps as f32);
            self.ctrl.pointer_move(p.x, p.y);
        }
        self.ctrl.pointer_up(to.x, to.y)
    }

    /// Drag from N1's output to N2's input.
    pub fn connect_n1_to_n2(&self) -> GestureOutcome {
        let from = self.registered_port(self.n1, "out");
        let to = self.registered_port(self.n2, "in");
        self.drag(from, to, 4)
    }
}
