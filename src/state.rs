//! Session-scoped canvas state: view transform, selection, in-flight
//! interaction flags and the port registry.
//!
//! One `CanvasState` exists per mounted canvas and is dropped with it. Nothing
//! here is persisted; node positions are only ever changed through the graph
//! collaborator.

use crate::config::CanvasConfig;
use crate::graph::{ConnectionPoint, Edge, EdgeId, Node, NodeId};
use crate::path::{generate_bezier_path, CubicBezier};
use crate::registry::PortRegistry;
use crate::selection::SelectionManager;
use crate::transform::{Point, Rect, Size, Transform};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct CanvasState {
    config: CanvasConfig,
    offset: Point,
    scale: f32,
    selected_nodes: SelectionManager<NodeId>,
    selected_edges: SelectionManager<EdgeId>,
    active_connection: Option<ConnectionPoint>,
    connection_end_position: Option<Point>,
    is_editing_node: bool,
    is_dragging_node: bool,
    /// Transient world positions of nodes being dragged.
    drag_positions: HashMap<NodeId, Point>,
    /// World-space sizes reported by layout.
    measured_sizes: HashMap<NodeId, Size>,
    registry: PortRegistry,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasState {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            offset: Point::ZERO,
            scale: 1.0,
            selected_nodes: SelectionManager::new(),
            selected_edges: SelectionManager::new(),
            active_connection: None,
            connection_end_position: None,
            is_editing_node: false,
            is_dragging_node: false,
            drag_positions: HashMap::new(),
            measured_sizes: HashMap::new(),
            registry: PortRegistry::new(),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Swap the configuration. The current scale is re-clamped to the new range.
    pub fn set_config(&mut self, config: CanvasConfig) {
        self.config = config;
        let clamped = self.config.clamp_scale(self.scale);
        if clamped != self.scale {
            self.set_transform(Transform::new(self.offset, clamped));
        }
    }

    pub fn config_mut(&mut self) -> &mut CanvasConfig {
        &mut self.config
    }

    // ------------------------------------------------------------------------
    // View transform
    // ------------------------------------------------------------------------

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.offset, self.scale)
    }

    /// Apply a new transform and carry the registry's screen positions along.
    fn set_transform(&mut self, to: Transform) {
        let from = self.transform();
        if from == to {
            return;
        }
        self.registry.reproject(&from, &to);
        self.offset = to.offset;
        self.scale = to.scale;
        log::trace!("view offset=({}, {}) scale={}", to.offset.x, to.offset.y, to.scale);
    }

    /// Zoom to `new_scale` keeping the world point under `anchor` in place.
    ///
    /// Returns `false` when the clamped scale equals the current one.
    pub fn zoom(&mut self, new_scale: f32, anchor: Point) -> bool {
        let clamped = self.config.clamp_scale(new_scale);
        if clamped == self.scale {
            return false;
        }
        let ratio = clamped / self.scale;
        let offset = anchor - (anchor - self.offset) * ratio;
        self.set_transform(Transform::new(offset, clamped));
        true
    }

    /// Multiply the current scale by `factor` around `anchor`.
    pub fn zoom_by(&mut self, factor: f32, anchor: Point) -> bool {
        self.zoom(self.scale * factor, anchor)
    }

    pub fn pan_by(&mut self, delta: Point) {
        self.set_transform(Transform::new(self.offset + delta, self.scale));
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.set_transform(Transform::new(offset, self.scale));
    }

    pub fn reset_view(&mut self) {
        self.set_transform(Transform::IDENTITY);
    }

    /// Fit `world_bounds` into `canvas_size` with `padding` screen units on
    /// every side, centering the content. The scale stays within limits.
    pub fn zoom_to_fit(&mut self, world_bounds: Rect, canvas_size: Size, padding: f32) {
        let avail_w = (canvas_size.width - 2.0 * padding).max(1.0);
        let avail_h = (canvas_size.height - 2.0 * padding).max(1.0);
        let fit = |avail: f32, extent: f32| {
            if extent > 0.0 {
                avail / extent
            } else {
                self.config.max_scale
            }
        };
        let fit_w = fit(avail_w, world_bounds.size.width);
        let fit_h = fit(avail_h, world_bounds.size.height);
        let scale = self.config.clamp_scale(fit_w.min(fit_h));

        let canvas_center = Point::new(canvas_size.width * 0.5, canvas_size.height * 0.5);
        let offset = canvas_center - world_bounds.center() * scale;
        self.set_transform(Transform::new(offset, scale));
    }

    pub fn visible_world_rect(&self, canvas_size: Size) -> Rect {
        self.transform().visible_world_rect(canvas_size)
    }

    pub fn canvas_to_world(&self, screen: Point) -> Point {
        self.transform().screen_to_world(screen)
    }

    pub fn world_to_canvas(&self, world: Point) -> Point {
        self.transform().world_to_screen(world)
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn select_node(&mut self, id: NodeId) {
        self.selected_edges.clear();
        self.selected_nodes.select_only(id);
    }

    /// Add or remove `id` from the node selection.
    pub fn toggle_node_selection(&mut self, id: NodeId) {
        if self.selected_nodes.toggle(id) {
            self.selected_edges.clear();
        }
    }

    /// Replace the node selection with `ids` (clears edges if non-empty).
    pub fn select_nodes<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.selected_nodes.replace_selection(ids);
        if !self.selected_nodes.is_empty() {
            self.selected_edges.clear();
        }
    }

    pub fn select_edge(&mut self, id: EdgeId) {
        self.selected_nodes.clear();
        self.selected_edges.select_only(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
    }

    pub fn selected_nodes(&self) -> &SelectionManager<NodeId> {
        &self.selected_nodes
    }

    pub fn selected_edges(&self) -> &SelectionManager<EdgeId> {
        &self.selected_edges
    }

    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.selected_nodes.contains(id)
    }

    pub fn is_edge_selected(&self, id: EdgeId) -> bool {
        self.selected_edges.contains(id)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_nodes.is_empty() || !self.selected_edges.is_empty()
    }

    /// Deletion is only offered while no text field has focus.
    pub fn can_delete_selection(&self) -> bool {
        !self.is_editing_node && self.has_selection()
    }

    // ------------------------------------------------------------------------
    // Interaction flags
    // ------------------------------------------------------------------------

    pub fn is_editing_node(&self) -> bool {
        self.is_editing_node
    }

    pub fn set_editing_node(&mut self, editing: bool) {
        if self.is_editing_node != editing {
            log::debug!("node text editing {}", if editing { "started" } else { "ended" });
        }
        self.is_editing_node = editing;
    }

    pub fn is_dragging_node(&self) -> bool {
        self.is_dragging_node
    }

    pub fn active_connection(&self) -> Option<&ConnectionPoint> {
        self.active_connection.as_ref()
    }

    pub fn connection_end_position(&self) -> Option<Point> {
        self.connection_end_position
    }

    pub fn set_active_connection(&mut self, point: ConnectionPoint, cursor: Point) {
        self.active_connection = Some(point);
        self.connection_end_position = Some(cursor);
    }

    pub fn set_connection_end_position(&mut self, cursor: Point) {
        if self.active_connection.is_some() {
            self.connection_end_position = Some(cursor);
        }
    }

    /// Drop the in-progress connection, returning it.
    pub fn clear_active_connection(&mut self) -> Option<ConnectionPoint> {
        self.connection_end_position = None;
        self.active_connection.take()
    }

    pub fn begin_node_drag(&mut self) {
        self.is_dragging_node = true;
        self.drag_positions.clear();
    }

    pub fn set_drag_position(&mut self, id: NodeId, world: Point) {
        self.drag_positions.insert(id, world);
    }

    pub fn drag_position(&self, id: NodeId) -> Option<Point> {
        self.drag_positions.get(&id).copied()
    }

    pub fn drag_positions(&self) -> &HashMap<NodeId, Point> {
        &self.drag_positions
    }

    /// Clear the drag flag and hand back the transient positions.
    pub fn end_node_drag(&mut self) -> HashMap<NodeId, Point> {
        self.is_dragging_node = false;
        std::mem::take(&mut self.drag_positions)
    }

    // ------------------------------------------------------------------------
    // Port registry
    // ------------------------------------------------------------------------

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PortRegistry {
        &mut self.registry
    }

    pub fn register_port(
        &mut self,
        node_id: NodeId,
        port_id: &str,
        is_output: bool,
        data_type: crate::graph::DataType,
        screen_position: Point,
    ) {
        self.registry
            .register_port(node_id, port_id, is_output, data_type, screen_position);
    }

    pub fn find_port(
        &self,
        near: Point,
        excluding: Option<NodeId>,
        hit_radius: f32,
    ) -> Option<(NodeId, String)> {
        self.registry.find_port(near, excluding, hit_radius)
    }

    /// Forget everything cached about a deleted node.
    pub fn forget_node(&mut self, id: NodeId) {
        self.registry.remove_node(id);
        self.measured_sizes.remove(&id);
        self.drag_positions.remove(&id);
        self.selected_nodes.remove(id);
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    /// Record a node's laid-out size in world units.
    pub fn set_measured_size(&mut self, id: NodeId, size: Size) {
        self.measured_sizes.insert(id, size);
    }

    pub fn node_size(&self, id: NodeId) -> Size {
        self.measured_sizes
            .get(&id)
            .copied()
            .unwrap_or(self.config.default_node_size)
    }

    /// World position, preferring the transient drag position.
    pub fn node_position(&self, node: &Node) -> Point {
        self.drag_position(node.id).unwrap_or(node.position)
    }

    pub fn node_world_rect(&self, node: &Node) -> Rect {
        Rect::from_origin_size(self.node_position(node), self.node_size(node.id))
    }

    pub fn node_screen_rect(&self, node: &Node) -> Rect {
        self.transform().rect_to_screen(self.node_world_rect(node))
    }

    /// Port center derived from the node's geometry: inputs down the left
    /// edge, outputs down the right, one row per port below the header.
    pub fn fallback_port_world_position(
        &self,
        node: &Node,
        port_id: &str,
        is_output: bool,
    ) -> Point {
        let rect = self.node_world_rect(node);
        let row = node.port_index(port_id, is_output).unwrap_or(0) as f32;
        let x = if is_output { rect.max_x() } else { rect.min_x() };
        let y = rect.min_y()
            + self.config.port_header_height
            + (row + 0.5) * self.config.port_row_height;
        Point::new(x, y)
    }

    /// Screen-space port center: the registered position if the port has
    /// been laid out, the fallback geometry otherwise.
    pub fn port_screen_position(&self, node: &Node, port_id: &str, is_output: bool) -> Point {
        self.registry
            .port_position(node.id, port_id)
            .unwrap_or_else(|| {
                let world = self.fallback_port_world_position(node, port_id, is_output);
                self.world_to_canvas(world)
            })
    }

    /// Screen-space endpoints of `edge`, or `None` if either node is missing.
    pub fn edge_endpoints(&self, nodes: &[Node], edge: &Edge) -> Option<(Point, Point)> {
        let source = nodes.iter().find(|n| n.id == edge.source_node)?;
        let target = nodes.iter().find(|n| n.id == edge.target_node)?;
        Some((
            self.port_screen_position(source, &edge.source_handle, true),
            self.port_screen_position(target, &edge.target_handle, false),
        ))
    }

    /// Control-point minimum offset at the current zoom.
    pub fn scaled_bezier_offset(&self) -> f32 {
        self.config.bezier_min_offset * self.scale
    }

    /// The screen-space curve both the renderer and the hit tester use.
    pub fn edge_curve(&self, nodes: &[Node], edge: &Edge) -> Option<CubicBezier> {
        let (start, end) = self.edge_endpoints(nodes, edge)?;
        Some(CubicBezier::from_endpoints(start, end, self.scaled_bezier_offset()))
    }

    pub fn edge_path(&self, nodes: &[Node], edge: &Edge) -> Option<String> {
        let (start, end) = self.edge_endpoints(nodes, edge)?;
        Some(generate_bezier_path(start, end, self.scaled_bezier_offset()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DataType, PortDefinition};
    use uuid::Uuid;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    // ========================================================================
    // Zoom
    // ========================================================================

    #[test]
    fn test_zoom_clamps_scale() {
        let mut state = CanvasState::default();
        for requested in [-5.0, 0.0, 0.1, 0.25, 1.7, 2.0, 50.0, f32::INFINITY] {
            state.zoom(requested, Point::new(10.0, 10.0));
            let scale = state.scale();
            assert!((0.25..=2.0).contains(&scale), "scale {} escaped", scale);
        }
    }

    #[test]
    fn test_zoom_preserves_anchor() {
        let mut state = CanvasState::default();
        state.pan_by(Point::new(40.0, -25.0));

        let steps = [
            (1.5, Point::new(300.0, 200.0)),
            (0.5, Point::new(0.0, 0.0)),
            (2.0, Point::new(-80.0, 410.0)),
        ];
        for (scale, anchor) in steps {
            let before = state.transform();
            let world = before.screen_to_world(anchor);
            state.zoom(scale, anchor);
            assert!(approx(state.world_to_canvas(world), anchor));
        }
    }

    #[test]
    fn test_zoom_to_same_scale_is_noop() {
        let mut state = CanvasState::default();
        state.set_offset(Point::new(5.0, 5.0));
        assert!(!state.zoom(1.0, Point::new(100.0, 100.0)));
        assert!(state.zoom(5.0, Point::ZERO));
        assert!(!state.zoom(9.0, Point::ZERO));
        assert_eq!(state.scale(), 2.0);
    }

    #[test]
    fn test_inverted_scale_limits_do_not_panic() {
        let mut state = CanvasState::default();
        let config = CanvasConfig {
            min_scale: 3.0,
            max_scale: 2.0,
            ..CanvasConfig::default()
        };

        // 1.0 is re-clamped into [2, 3]
        state.set_config(config);
        assert_eq!(state.scale(), 2.0);
        assert!(state.zoom(2.5, Point::ZERO));
        assert_eq!(state.scale(), 2.5);
        state.zoom(0.1, Point::ZERO);
        assert_eq!(state.scale(), 2.0);
    }

    #[test]
    fn test_zoom_reprojects_registered_ports() {
        let mut state = CanvasState::default();
        let node = Uuid::new_v4();
        state.register_port(node, "out", true, DataType::String, Point::new(100.0, 100.0));

        state.zoom(2.0, Point::ZERO);
        assert_eq!(state.registry().port_position(node, "out"), Some(Point::new(200.0, 200.0)));

        state.pan_by(Point::new(10.0, 0.0));
        assert_eq!(state.registry().port_position(node, "out"), Some(Point::new(210.0, 200.0)));
    }

    #[test]
    fn test_zoom_to_fit_centers_content() {
        let mut state = CanvasState::default();
        state.zoom_to_fit(Rect::new(0.0, 0.0, 400.0, 200.0), Size::new(800.0, 600.0), 0.0);
        assert_eq!(state.scale(), 2.0);
        assert!(approx(state.world_to_canvas(Point::new(200.0, 100.0)), Point::new(400.0, 300.0)));

        state.zoom_to_fit(Rect::new(0.0, 0.0, 10_000.0, 100.0), Size::new(800.0, 600.0), 20.0);
        assert_eq!(state.scale(), 0.25);
    }

    #[test]
    fn test_reset_view() {
        let mut state = CanvasState::default();
        state.zoom(1.5, Point::new(30.0, 30.0));
        state.reset_view();
        assert_eq!(state.transform(), Transform::IDENTITY);
    }

    // ========================================================================
    // Selection
    // ========================================================================

    #[test]
    fn test_selection_exclusivity() {
        let mut state = CanvasState::default();
        let (n1, n2, e1) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        state.select_node(n1);
        state.toggle_node_selection(n2);
        assert_eq!(state.selected_nodes().len(), 2);

        state.select_edge(e1);
        assert!(state.selected_nodes().is_empty());
        assert!(state.is_edge_selected(e1));

        state.toggle_node_selection(n1);
        assert!(state.selected_edges().is_empty());
        assert!(state.is_node_selected(n1));
    }

    #[test]
    fn test_toggle_off_keeps_edges_empty() {
        let mut state = CanvasState::default();
        let n = Uuid::new_v4();
        state.toggle_node_selection(n);
        state.toggle_node_selection(n);
        assert!(!state.has_selection());
    }

    #[test]
    fn test_delete_guard() {
        let mut state = CanvasState::default();
        assert!(!state.can_delete_selection());

        state.select_node(Uuid::new_v4());
        state.set_editing_node(true);
        assert!(!state.can_delete_selection());

        state.set_editing_node(false);
        assert!(state.can_delete_selection());

        state.clear_selection();
        assert!(!state.can_delete_selection());
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    #[test]
    fn test_fallback_port_layout() {
        let state = CanvasState::default();
        let node = Node::new("t", Point::new(100.0, 50.0))
            .with_input(PortDefinition::new("a", "A", DataType::String))
            .with_input(PortDefinition::new("b", "B", DataType::Image))
            .with_output(PortDefinition::new("out", "Out", DataType::String));

        assert_eq!(state.fallback_port_world_position(&node, "a", false), Point::new(100.0, 108.0));
        assert_eq!(state.fallback_port_world_position(&node, "b", false), Point::new(100.0, 136.0));
        assert_eq!(
            state.fallback_port_world_position(&node, "out", true),
            Point::new(300.0, 108.0)
        );
    }

    #[test]
    fn test_drag_position_overrides_node_position() {
        let mut state = CanvasState::default();
        let node = Node::new("t", Point::new(0.0, 0.0));
        state.begin_node_drag();
        state.set_drag_position(node.id, Point::new(40.0, 40.0));
        assert_eq!(state.node_position(&node), Point::new(40.0, 40.0));

        let taken = state.end_node_drag();
        assert_eq!(taken.get(&node.id), Some(&Point::new(40.0, 40.0)));
        assert_eq!(state.node_position(&node), Point::ZERO);
        assert!(!state.is_dragging_node());
    }

    #[test]
    fn test_measured_size_used_for_rect() {
        let mut state = CanvasState::default();
        let node = Node::new("t", Point::new(10.0, 10.0));
        assert_eq!(state.node_world_rect(&node).size, Size::new(200.0, 120.0));

        state.set_measured_size(node.id, Size::new(80.0, 40.0));
        state.zoom(2.0, Point::ZERO);
        assert_eq!(state.node_screen_rect(&node), Rect::new(20.0, 20.0, 160.0, 80.0));
    }

    #[test]
    fn test_forget_node_prunes_caches() {
        let mut state = CanvasState::default();
        let id = Uuid::new_v4();
        state.register_port(id, "out", true, DataType::String, Point::ZERO);
        state.set_measured_size(id, Size::new(1.0, 1.0));
        state.select_node(id);

        state.forget_node(id);
        assert!(state.registry().is_empty());
        assert!(!state.has_selection());
        assert_eq!(state.node_size(id), state.config().default_node_size);
    }

    #[test]
    fn test_connection_end_requires_active_connection() {
        let mut state = CanvasState::default();
        state.set_connection_end_position(Point::new(1.0, 1.0));
        assert_eq!(state.connection_end_position(), None);
    }
}
