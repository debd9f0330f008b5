//! # Flow Canvas
//!
//! The interaction core of a node-graph canvas for building AI workflows:
//! users place nodes, connect typed ports with bezier edges, pan and zoom.
//! The crate owns the parts that need careful invariant management and leaves
//! rendering and persistence to its collaborators.
//!
//! ## Features
//!
//! - **World/screen transforms** - anchor-preserving zoom, clamped scale
//! - **Port registry** - O(1) lookups of laid-out port positions and types
//! - **Prioritized hit testing** - port > node > edge > canvas
//! - **Gesture arbitration** - port drags beat node drags beat panning
//! - **Validated connections** - direction, type, duplicate and cycle checks
//! - **Slint glue** - callback factories, edge path models and a dot grid
//!
//! ## Data flow
//!
//! ```text
//! pointer event -> GestureArbitrator -> hit_test (PortRegistry + nodes/edges)
//!               -> CanvasState mutation / GraphDelegate request
//!               -> render -> layout pass re-registers ports
//! ```
//!
//! ## Rust Helpers
//!
//! - [`CanvasController`] - Shared facade for wiring a Slint window
//! - [`CanvasState`] - Transform, selection and in-flight interaction state
//! - [`GestureArbitrator`] - Pointer sequences to selection, drags and connections
//! - [`PortRegistry`] - Screen-space port positions keyed by node and port id
//! - [`hit_test`] - What lies under a screen point
//! - [`GraphDelegate`] - The graph owner the canvas requests mutations from
//! - [`NodeGraph`] - In-memory graph with the standard connection validators
//! - [`generate_bezier_path`] - SVG path for an edge
//! - [`generate_grid_commands`] - SVG path for the background dot grid

pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod graph;
pub mod grid;
pub mod links;
pub mod node_types;
pub mod path;
pub mod registry;
pub mod selection;
pub mod state;
pub mod tracking;
pub mod transform;

pub use config::CanvasConfig;
pub use controller::CanvasController;
pub use error::{CanvasError, CanvasErrorKind};
pub use gesture::{
    delete_selection, GestureArbitrator, GestureOutcome, GesturePhase, PointerEvent, PointerKind,
};
pub use graph::{
    ConnectionPoint, DataType, Edge, EdgeId, ExecutionStatus, GraphDelegate, GraphLogic, Node,
    NodeGraph, NodeId, PortDefinition,
    // Connection validation framework
    validate_connection, AcyclicValidator, BasicConnectionValidator, CompositeValidator,
    ConnectionContext, ConnectionValidator, NoDuplicatesValidator,
};
pub use grid::{generate_grid_commands, grid_dots};
pub use hit_test::{
    find_edge_at, find_node_at, find_port_at, hit_test, EdgeCurve, EdgeGeometry, HitResult, NodeBox,
    NodeGeometry, PortGeometry, PortTarget,
};
pub use links::{EdgePathManager, EdgePathRow};
pub use node_types::{ExactTypeMatch, NodeTypeDescriptor, NodeTypeRegistry, TypeCompatibility};
pub use path::{
    bezier_point_at, connection_preview_path, distance_to_bezier, generate_bezier_path,
    generate_partial_bezier_path, CubicBezier,
};
pub use registry::{PortKey, PortRegistry, RegisteredPort};
pub use selection::SelectionManager;
pub use state::CanvasState;
pub use tracking::LayoutTracker;
pub use transform::{
    screen_to_world, visible_world_rect, world_to_screen, Point, Rect, Size, Transform,
};
