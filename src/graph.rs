use crate::error::CanvasError;
use crate::node_types::{NodeTypeRegistry, TypeCompatibility};
use crate::transform::Point;
use serde::{Deserialize, Serialize};
use slint::Color;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

pub type NodeId = Uuid;
pub type EdgeId = Uuid;

/// Kind of value flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Image,
    Audio,
    Pulse,
}

impl DataType {
    pub const ALL: [DataType; 4] =
        [DataType::String, DataType::Image, DataType::Audio, DataType::Pulse];

    pub fn display_name(self) -> &'static str {
        match self {
            DataType::String => "Text",
            DataType::Image => "Image",
            DataType::Audio => "Audio",
            DataType::Pulse => "Pulse",
        }
    }

    /// Port and edge color for this type.
    pub fn color(self) -> Color {
        match self {
            DataType::String => Color::from_rgb_u8(255, 183, 77), // Orange
            DataType::Image => Color::from_rgb_u8(79, 195, 247),  // Cyan
            DataType::Audio => Color::from_rgb_u8(186, 104, 200), // Purple
            DataType::Pulse => Color::from_rgb_u8(255, 255, 255), // White
        }
    }

    /// Stable integer encoding used across the Slint callback boundary.
    pub fn index(self) -> i32 {
        match self {
            DataType::String => 0,
            DataType::Image => 1,
            DataType::Audio => 2,
            DataType::Pulse => 3,
        }
    }

    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(DataType::String),
            1 => Some(DataType::Image),
            2 => Some(DataType::Audio),
            3 => Some(DataType::Pulse),
            _ => None,
        }
    }
}

/// A named, typed connection point declared by a node type.
///
/// `id` is what edges reference as their handle; it must never be renamed
/// once edges to it exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDefinition {
    pub id: String,
    pub label: String,
    pub data_type: DataType,
    #[serde(default)]
    pub is_required: bool,
}

impl PortDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type,
            is_required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }
}

/// Execution state reported by the node runner. The canvas only displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// World-space top-left corner.
    pub position: Point,
    pub type_tag: String,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    #[serde(skip)]
    pub status: ExecutionStatus,
}

impl Node {
    pub fn new(type_tag: impl Into<String>, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            type_tag: type_tag.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            status: ExecutionStatus::Idle,
        }
    }

    pub fn with_input(mut self, port: PortDefinition) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: PortDefinition) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn input(&self, port_id: &str) -> Option<&PortDefinition> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output(&self, port_id: &str) -> Option<&PortDefinition> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    pub fn port(&self, port_id: &str, is_output: bool) -> Option<&PortDefinition> {
        if is_output {
            self.output(port_id)
        } else {
            self.input(port_id)
        }
    }

    /// Row index of a port within its side; drives the fallback port layout.
    pub fn port_index(&self, port_id: &str, is_output: bool) -> Option<usize> {
        let ports = if is_output { &self.outputs } else { &self.inputs };
        ports.iter().position(|p| p.id == port_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source_node: NodeId,
    pub source_handle: String,
    pub target_node: NodeId,
    pub target_handle: String,
    /// Copied from the source port when the edge is created.
    pub data_type: DataType,
}

impl Edge {
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }
}

/// One endpoint of an in-progress or candidate connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionPoint {
    pub node_id: NodeId,
    pub port_id: String,
    pub port_type: DataType,
    pub is_output: bool,
    /// World-space port center.
    pub position: Point,
}

/// The graph owner the canvas talks to.
///
/// The canvas never mutates nodes or edges directly: every change is requested
/// through one of these id-keyed calls, so there is no cached object that can
/// go stale under it.
pub trait GraphDelegate {
    fn nodes(&self) -> &[Node];
    fn edges(&self) -> &[Edge];

    /// Create an edge between two endpoints; `from` is the output side.
    fn create_edge(
        &mut self,
        from: &ConnectionPoint,
        to: &ConnectionPoint,
    ) -> Result<EdgeId, CanvasError>;
    fn delete_edge(&mut self, id: EdgeId) -> Result<(), CanvasError>;
    fn delete_nodes(&mut self, ids: &[NodeId]);
    fn commit_node_position(&mut self, id: NodeId, position: Point) -> Result<(), CanvasError>;

    /// Type-compatibility policy. Exact match unless the owner says otherwise.
    fn can_connect(&self, source: DataType, target: DataType) -> bool {
        source == target
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes().iter().find(|n| n.id == id)
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges().iter().find(|e| e.id == id)
    }
}

/// Helper functions for graph topology queries
pub struct GraphLogic;

impl GraphLogic {
    /// Ids of every edge touching `node_id`.
    pub fn find_edges_connected_to_node<'a, I>(node_id: NodeId, edges: I) -> Vec<EdgeId>
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        edges
            .into_iter()
            .filter(|edge| edge.touches(node_id))
            .map(|edge| edge.id)
            .collect()
    }

    /// Order two endpoints as (output, input).
    ///
    /// Same-direction pairs are rejected here, before any other check runs.
    pub fn normalize_direction<'a>(
        a: &'a ConnectionPoint,
        b: &'a ConnectionPoint,
    ) -> Result<(&'a ConnectionPoint, &'a ConnectionPoint), CanvasError> {
        match (a.is_output, b.is_output) {
            (true, false) => Ok((a, b)),
            (false, true) => Ok((b, a)),
            _ => Err(CanvasError::IncompatiblePorts),
        }
    }

    /// Check if an edge between exactly these handles already exists.
    pub fn duplicate_edge_exists<'a, I>(
        source: &ConnectionPoint,
        target: &ConnectionPoint,
        edges: I,
    ) -> bool
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        edges.into_iter().any(|edge| {
            edge.source_node == source.node_id
                && edge.source_handle == source.port_id
                && edge.target_node == target.node_id
                && edge.target_handle == target.port_id
        })
    }

    /// Would adding `source -> target` close a cycle?
    ///
    /// Walks incoming edges upstream from `source` (reverse BFS). If `target`
    /// is found it already feeds `source`, so the new edge would loop back.
    pub fn would_create_cycle(source: NodeId, target: NodeId, edges: &[Edge]) -> bool {
        if source == target {
            return true;
        }

        let mut upstream: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for edge in edges {
            upstream.entry(edge.target_node).or_default().push(edge.source_node);
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        visited.insert(source);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            for &parent in upstream.get(&current).into_iter().flatten() {
                if parent == target {
                    return true;
                }
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        false
    }
}

// ============================================================================
// Connection Validation Framework
// ============================================================================

/// What a validator may look at.
pub struct ConnectionContext<'a> {
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    pub compatibility: &'a dyn TypeCompatibility,
}

impl<'a> ConnectionContext<'a> {
    pub fn node(&self, id: NodeId) -> Option<&'a Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A rule a proposed connection must satisfy.
///
/// Validators receive endpoints already ordered as (output, input).
pub trait ConnectionValidator {
    fn validate(
        &self,
        source: &ConnectionPoint,
        target: &ConnectionPoint,
        ctx: &ConnectionContext<'_>,
    ) -> Result<(), CanvasError>;
}

/// Structural and type checks:
/// 1. Both nodes must exist
/// 2. Each handle must name a port on the correct side of its node
/// 3. The nodes must differ
/// 4. The port types must be compatible
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicConnectionValidator;

impl ConnectionValidator for BasicConnectionValidator {
    fn validate(
        &self,
        source: &ConnectionPoint,
        target: &ConnectionPoint,
        ctx: &ConnectionContext<'_>,
    ) -> Result<(), CanvasError> {
        let source_node = ctx
            .node(source.node_id)
            .ok_or(CanvasError::NodeNotFound(source.node_id))?;
        let target_node = ctx
            .node(target.node_id)
            .ok_or(CanvasError::NodeNotFound(target.node_id))?;

        let source_port = source_node
            .output(&source.port_id)
            .ok_or(CanvasError::InvalidConnection)?;
        let target_port = target_node
            .input(&target.port_id)
            .ok_or(CanvasError::InvalidConnection)?;

        if source_node.id == target_node.id {
            return Err(CanvasError::CircularConnection);
        }

        if !ctx
            .compatibility
            .can_connect(source_port.data_type, target_port.data_type)
        {
            return Err(CanvasError::IncompatiblePorts);
        }

        Ok(())
    }
}

/// Rejects a second edge between the same pair of handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDuplicatesValidator;

impl ConnectionValidator for NoDuplicatesValidator {
    fn validate(
        &self,
        source: &ConnectionPoint,
        target: &ConnectionPoint,
        ctx: &ConnectionContext<'_>,
    ) -> Result<(), CanvasError> {
        if GraphLogic::duplicate_edge_exists(source, target, ctx.edges) {
            Err(CanvasError::InvalidConnection)
        } else {
            Ok(())
        }
    }
}

/// Keeps the node dependency graph a DAG.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcyclicValidator;

impl ConnectionValidator for AcyclicValidator {
    fn validate(
        &self,
        source: &ConnectionPoint,
        target: &ConnectionPoint,
        ctx: &ConnectionContext<'_>,
    ) -> Result<(), CanvasError> {
        if GraphLogic::would_create_cycle(source.node_id, target.node_id, ctx.edges) {
            Err(CanvasError::CircularConnection)
        } else {
            Ok(())
        }
    }
}

/// Runs validators in order; the first failure wins.
///
/// # Example
///
/// ```ignore
/// let validator = CompositeValidator::new()
///     .add(BasicConnectionValidator)
///     .add(NoDuplicatesValidator)
///     .add(AcyclicValidator);
/// ```
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn ConnectionValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<V: ConnectionValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Basic checks, then duplicates, then cycles.
    pub fn standard() -> Self {
        Self::new()
            .add(BasicConnectionValidator)
            .add(NoDuplicatesValidator)
            .add(AcyclicValidator)
    }
}

impl ConnectionValidator for CompositeValidator {
    fn validate(
        &self,
        source: &ConnectionPoint,
        target: &ConnectionPoint,
        ctx: &ConnectionContext<'_>,
    ) -> Result<(), CanvasError> {
        self.validators
            .iter()
            .try_for_each(|v| v.validate(source, target, ctx))
    }
}

/// Normalize direction, then run `validator`.
///
/// Returns the endpoints ordered as (output, input) on success.
pub fn validate_connection<'a, V>(
    a: &'a ConnectionPoint,
    b: &'a ConnectionPoint,
    ctx: &ConnectionContext<'_>,
    validator: &V,
) -> Result<(&'a ConnectionPoint, &'a ConnectionPoint), CanvasError>
where
    V: ConnectionValidator + ?Sized,
{
    let (source, target) = GraphLogic::normalize_direction(a, b)?;
    validator.validate(source, target, ctx)?;
    Ok((source, target))
}

// ============================================================================
// In-memory graph
// ============================================================================

/// Plain in-memory [`GraphDelegate`]: nodes and edges in vectors, validation
/// through [`CompositeValidator::standard`].
pub struct NodeGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    types: NodeTypeRegistry,
    validator: CompositeValidator,
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::with_types(NodeTypeRegistry::new())
    }

    pub fn with_types(types: NodeTypeRegistry) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            types,
            validator: CompositeValidator::standard(),
        }
    }

    pub fn set_validator(&mut self, validator: CompositeValidator) {
        self.validator = validator;
    }

    pub fn types(&self) -> &NodeTypeRegistry {
        &self.types
    }

    /// Append a node; later nodes render on top.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Instantiate a registered node type at `position`.
    pub fn spawn(&mut self, type_tag: &str, position: Point) -> Option<NodeId> {
        let node = self.types.instantiate(type_tag, position)?;
        Some(self.add_node(node))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn set_status(&mut self, id: NodeId, status: ExecutionStatus) -> Result<(), CanvasError> {
        let node = self.node_mut(id).ok_or(CanvasError::NodeNotFound(id))?;
        node.status = status;
        Ok(())
    }

    /// Edges whose target is `node_id`.
    pub fn incoming(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.target_node == node_id)
    }

    pub fn edges_connected_to(&self, node_id: NodeId) -> Vec<EdgeId> {
        GraphLogic::find_edges_connected_to_node(node_id, &self.edges)
    }

    /// Validate a connection without creating it.
    pub fn check_connection(
        &self,
        a: &ConnectionPoint,
        b: &ConnectionPoint,
    ) -> Result<(), CanvasError> {
        let ctx = ConnectionContext {
            nodes: &self.nodes,
            edges: &self.edges,
            compatibility: &self.types,
        };
        validate_connection(a, b, &ctx, &self.validator).map(|_| ())
    }
}

impl GraphDelegate for NodeGraph {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn create_edge(
        &mut self,
        from: &ConnectionPoint,
        to: &ConnectionPoint,
    ) -> Result<EdgeId, CanvasError> {
        let ctx = ConnectionContext {
            nodes: &self.nodes,
            edges: &self.edges,
            compatibility: &self.types,
        };
        let (source, target) = validate_connection(from, to, &ctx, &self.validator)?;

        let data_type = ctx
            .node(source.node_id)
            .and_then(|n| n.output(&source.port_id))
            .map(|p| p.data_type)
            .ok_or(CanvasError::InvalidConnection)?;

        let edge = Edge {
            id: Uuid::new_v4(),
            source_node: source.node_id,
            source_handle: source.port_id.clone(),
            target_node: target.node_id,
            target_handle: target.port_id.clone(),
            data_type,
        };
        let id = edge.id;
        log::info!(
            "edge {} created: {}:{} -> {}:{}",
            id,
            edge.source_node,
            edge.source_handle,
            edge.target_node,
            edge.target_handle
        );
        self.edges.push(edge);
        Ok(id)
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<(), CanvasError> {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        if self.edges.len() == before {
            return Err(CanvasError::EdgeNotFound(id));
        }
        log::info!("edge {} deleted", id);
        Ok(())
    }

    fn delete_nodes(&mut self, ids: &[NodeId]) {
        self.nodes.retain(|n| !ids.contains(&n.id));
        self.edges
            .retain(|e| !ids.contains(&e.source_node) && !ids.contains(&e.target_node));
        log::info!("{} node(s) deleted", ids.len());
    }

    fn commit_node_position(&mut self, id: NodeId, position: Point) -> Result<(), CanvasError> {
        let node = self.node_mut(id).ok_or(CanvasError::NodeNotFound(id))?;
        node.position = position;
        Ok(())
    }

    fn can_connect(&self, source: DataType, target: DataType) -> bool {
        self.types.can_connect(source, target)
    }
}

// ============================================================================
// Tests
// ============================================================================
