//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use flow_canvas::{EdgeId, NodeId, Point};
use std::cell::RefCell;
use std::rc::Rc;

/// Install `env_logger` once per test binary. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Tracks collaborator callback invocations for testing.
///
/// Each field records calls to the corresponding `GraphDelegate` method with
/// their arguments, successful or not.
#[derive(Default, Clone)]
pub struct CallbackTracker {
    /// (source node, source port, target node, target port)
    pub create_edge: Rc<RefCell<Vec<(NodeId, String, NodeId, String)>>>,
    /// Count of create_edge calls that returned an error
    pub create_edge_failed: Rc<RefCell<usize>>,
    /// (edge_id,)
    pub delete_edge: Rc<RefCell<Vec<EdgeId>>>,
    /// One entry per delete_nodes call
    pub delete_nodes: Rc<RefCell<Vec<Vec<NodeId>>>>,
    /// (node_id, world position)
    pub commit_node_position: Rc<RefCell<Vec<(NodeId, Point)>>>,
}

impl CallbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all recorded callbacks.
    pub fn clear(&self) {
        self.create_edge.borrow_mut().clear();
        *self.create_edge_failed.borrow_mut() = 0;
        self.delete_edge.borrow_mut().clear();
        self.delete_nodes.borrow_mut().clear();
        self.commit_node_position.borrow_mut().clear();
    }
}
