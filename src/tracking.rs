//! Layout-report callbacks for the port registry.
//!
//! The rendering layer knows where ports and nodes ended up only after a
//! layout pass. [`LayoutTracker`] hands out callbacks with Slint-compatible
//! signatures that write those reports into a shared [`CanvasState`].
//!
//! # Example
//!
//! ```ignore
//! let tracker = LayoutTracker::new(CanvasConfig::default());
//!
//! window.on_port_frame_changed(tracker.port_frame_callback());
//! window.on_node_size_changed(tracker.node_size_callback());
//! window.on_editing_changed(tracker.editing_callback());
//!
//! let state = tracker.state();
//! ```

use crate::config::CanvasConfig;
use crate::graph::DataType;
use crate::state::CanvasState;
use crate::transform::{size_to_world, Point, Size};
use slint::SharedString;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

pub struct LayoutTracker {
    state: Rc<RefCell<CanvasState>>,
}

impl Default for LayoutTracker {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl LayoutTracker {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(CanvasState::new(config))),
        }
    }

    /// Track into an existing shared state.
    pub fn with_state(state: Rc<RefCell<CanvasState>>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> Rc<RefCell<CanvasState>> {
        self.state.clone()
    }

    /// Callback for port frame reports.
    ///
    /// Signature: `(node_id, port_id, is_output, data_type_index, center_x, center_y)`,
    /// with the center in canvas (screen) coordinates. Reports with an
    /// unparsable node id or unknown data type are dropped.
    pub fn port_frame_callback(
        &self,
    ) -> impl Fn(SharedString, SharedString, bool, i32, f32, f32) + Clone {
        let state = self.state.clone();
        move |node_id, port_id, is_output, data_type, x, y| {
            let mut state = state.borrow_mut();
            handle_port_report(&mut state, &node_id, &port_id, is_output, data_type, x, y);
        }
    }

    /// Callback for node size reports in screen units: `(node_id, width, height)`.
    pub fn node_size_callback(&self) -> impl Fn(SharedString, f32, f32) + Clone {
        let state = self.state.clone();
        move |node_id, width, height| {
            handle_node_size_report(&mut state.borrow_mut(), &node_id, width, height);
        }
    }

    /// Callback for text focus changes inside nodes.
    pub fn editing_callback(&self) -> impl Fn(bool) + Clone {
        let state = self.state.clone();
        move |editing| state.borrow_mut().set_editing_node(editing)
    }
}

pub fn handle_port_report(
    state: &mut CanvasState,
    node_id: &str,
    port_id: &str,
    is_output: bool,
    data_type: i32,
    x: f32,
    y: f32,
) {
    let Ok(node_id) = Uuid::parse_str(node_id) else {
        log::warn!("port report with invalid node id {:?}", node_id);
        return;
    };
    let Some(data_type) = DataType::from_index(data_type) else {
        log::warn!("port report with unknown data type {}", data_type);
        return;
    };
    state.register_port(node_id, port_id, is_output, data_type, Point::new(x, y));
}

pub fn handle_node_size_report(state: &mut CanvasState, node_id: &str, width: f32, height: f32) {
    let Ok(node_id) = Uuid::parse_str(node_id) else {
        log::warn!("size report with invalid node id {:?}", node_id);
        return;
    };
    let size = size_to_world(Size::new(width, height), state.scale());
    state.set_measured_size(node_id, size);
}
