//! Screen-space port positions, keyed by `(node id, port id)`.
//!
//! Ports re-register on every layout change (including pan and zoom), so the
//! stored positions always match what is on screen. Lookups by key are O(1);
//! proximity search is a linear scan in registration order, which is plenty
//! for the tens of ports a canvas shows.

use crate::graph::{DataType, NodeId};
use crate::transform::{Point, Transform};
use std::collections::HashMap;
use std::fmt;

/// Registry key. Displays as `"nodeId:portId"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortKey {
    pub node_id: NodeId,
    pub port_id: String,
}

impl PortKey {
    pub fn new(node_id: NodeId, port_id: impl Into<String>) -> Self {
        Self {
            node_id,
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_id, self.port_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredPort {
    pub key: PortKey,
    pub is_output: bool,
    pub data_type: DataType,
    /// Screen-space center.
    pub position: Point,
}

#[derive(Debug, Default, Clone)]
pub struct PortRegistry {
    ports: Vec<RegisteredPort>,
    index: HashMap<PortKey, usize>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a port. Re-registering keeps the original scan order.
    pub fn register_port(
        &mut self,
        node_id: NodeId,
        port_id: &str,
        is_output: bool,
        data_type: DataType,
        screen_position: Point,
    ) {
        let key = PortKey::new(node_id, port_id);
        if let Some(&i) = self.index.get(&key) {
            let entry = &mut self.ports[i];
            entry.is_output = is_output;
            entry.data_type = data_type;
            entry.position = screen_position;
            return;
        }

        log::trace!("registering port {}", key);
        self.index.insert(key.clone(), self.ports.len());
        self.ports.push(RegisteredPort {
            key,
            is_output,
            data_type,
            position: screen_position,
        });
    }

    fn get(&self, node_id: NodeId, port_id: &str) -> Option<&RegisteredPort> {
        let key = PortKey::new(node_id, port_id);
        self.index.get(&key).map(|&i| &self.ports[i])
    }

    pub fn port_data_type(&self, node_id: NodeId, port_id: &str) -> Option<DataType> {
        self.get(node_id, port_id).map(|p| p.data_type)
    }

    pub fn port_position(&self, node_id: NodeId, port_id: &str) -> Option<Point> {
        self.get(node_id, port_id).map(|p| p.position)
    }

    pub fn is_output(&self, node_id: NodeId, port_id: &str) -> Option<bool> {
        self.get(node_id, port_id).map(|p| p.is_output)
    }

    /// First port (in registration order) within `hit_radius` of `near`.
    ///
    /// The boundary is inclusive. Ports on `excluding` are skipped entirely,
    /// which is how a drag avoids connecting a node to itself.
    pub fn find_port(
        &self,
        near: Point,
        excluding: Option<NodeId>,
        hit_radius: f32,
    ) -> Option<(NodeId, String)> {
        let radius_sq = hit_radius * hit_radius;
        self.ports
            .iter()
            .filter(|p| Some(p.key.node_id) != excluding)
            .find(|p| p.position.distance_sq(near) <= radius_sq)
            .map(|p| (p.key.node_id, p.key.port_id.clone()))
    }

    /// Drop every port belonging to `node_id`.
    pub fn remove_node(&mut self, node_id: NodeId) {
        let before = self.ports.len();
        self.ports.retain(|p| p.key.node_id != node_id);
        if self.ports.len() != before {
            self.rebuild_index();
        }
    }

    /// Keep only ports whose node satisfies `keep`.
    pub fn retain_nodes<F>(&mut self, mut keep: F)
    where
        F: FnMut(NodeId) -> bool,
    {
        let before = self.ports.len();
        self.ports.retain(|p| keep(p.key.node_id));
        if self.ports.len() != before {
            self.rebuild_index();
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.key.clone(), i))
            .collect();
    }

    /// Move every stored position from `from` to `to`, as a layout pass would
    /// after a pan or zoom.
    pub fn reproject(&mut self, from: &Transform, to: &Transform) {
        for port in &mut self.ports {
            port.position = from.reproject(port.position, to);
        }
    }

    /// Shift one node's ports by a screen-space delta.
    pub fn translate_node(&mut self, node_id: NodeId, delta: Point) {
        for port in self.ports.iter_mut().filter(|p| p.key.node_id == node_id) {
            port.position = port.position + delta;
        }
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredPort> {
        self.ports.iter()
    }

    pub fn clear(&mut self) {
        self.ports.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_key_display() {
        let id = Uuid::nil();
        assert_eq!(
            PortKey::new(id, "out").to_string(),
            "00000000-0000-0000-0000-000000000000:out"
        );
    }

    #[test]
    fn test_register_then_find() {
        let mut registry = PortRegistry::new();
        let node = Uuid::new_v4();
        registry.register_port(node, "out", true, DataType::String, Point::new(100.0, 50.0));

        assert_eq!(
            registry.find_port(Point::new(100.0, 50.0), None, 22.0),
            Some((node, "out".to_string()))
        );
        assert_eq!(registry.port_data_type(node, "out"), Some(DataType::String));
        assert_eq!(registry.is_output(node, "out"), Some(true));
    }

    #[test]
    fn test_register_is_upsert() {
        let mut registry = PortRegistry::new();
        let node = Uuid::new_v4();
        registry.register_port(node, "in", false, DataType::Image, Point::new(0.0, 0.0));
        registry.register_port(node, "in", false, DataType::Audio, Point::new(5.0, 5.0));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.port_position(node, "in"), Some(Point::new(5.0, 5.0)));
        assert_eq!(registry.port_data_type(node, "in"), Some(DataType::Audio));
    }

    #[test]
    fn test_hit_radius_boundary() {
        let mut registry = PortRegistry::new();
        let node = Uuid::new_v4();
        registry.register_port(node, "p", true, DataType::Pulse, Point::new(0.0, 0.0));

        let at = Point::new(10.0, 0.0);
        assert!(registry.find_port(at, None, 10.0).is_some());
        assert!(registry.find_port(at, None, 10.0 + 1e-3).is_some());
        assert!(registry.find_port(at, None, 10.0 - 1e-3).is_none());
    }

    #[test]
    fn test_excluded_node_never_matches() {
        let mut registry = PortRegistry::new();
        let node = Uuid::new_v4();
        registry.register_port(node, "out", true, DataType::String, Point::new(10.0, 10.0));

        assert!(registry.find_port(Point::new(10.0, 10.0), Some(node), 100.0).is_none());
    }

    #[test]
    fn test_first_registered_wins_on_overlap() {
        let mut registry = PortRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.register_port(a, "x", true, DataType::String, Point::new(0.0, 0.0));
        registry.register_port(b, "y", false, DataType::String, Point::new(1.0, 0.0));

        let hit = registry.find_port(Point::new(0.9, 0.0), None, 22.0);
        assert_eq!(hit, Some((a, "x".to_string())));

        let hit = registry.find_port(Point::new(0.9, 0.0), Some(a), 22.0);
        assert_eq!(hit, Some((b, "y".to_string())));
    }

    #[test]
    fn test_remove_node_rebuilds_index() {
        let mut registry = PortRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.register_port(a, "out", true, DataType::String, Point::new(0.0, 0.0));
        registry.register_port(b, "in", false, DataType::String, Point::new(50.0, 0.0));

        registry.remove_node(a);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.port_position(a, "out"), None);
        assert_eq!(registry.port_position(b, "in"), Some(Point::new(50.0, 0.0)));
    }

    #[test]
    fn test_reproject_follows_zoom() {
        let mut registry = PortRegistry::new();
        let node = Uuid::new_v4();
        registry.register_port(node, "out", true, DataType::String, Point::new(100.0, 100.0));

        let from = Transform::IDENTITY;
        let to = Transform::new(Point::new(10.0, 0.0), 2.0);
        registry.reproject(&from, &to);
        assert_eq!(registry.port_position(node, "out"), Some(Point::new(210.0, 200.0)));
    }

    #[test]
    fn test_translate_node_only_moves_that_node() {
        let mut registry = PortRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        registry.register_port(a, "out", true, DataType::String, Point::new(0.0, 0.0));
        registry.register_port(b, "in", false, DataType::String, Point::new(0.0, 0.0));

        registry.translate_node(a, Point::new(3.0, 4.0));
        assert_eq!(registry.port_position(a, "out"), Some(Point::new(3.0, 4.0)));
        assert_eq!(registry.port_position(b, "in"), Some(Point::ZERO));
    }
}
