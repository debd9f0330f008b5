//! Node type catalogue and data-type compatibility rules.

use crate::graph::{DataType, Node, PortDefinition};
use crate::transform::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Decides whether an output of one data type may feed an input of another.
pub trait TypeCompatibility {
    fn can_connect(&self, source: DataType, target: DataType) -> bool;
}

/// Only identical types connect.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactTypeMatch;

impl TypeCompatibility for ExactTypeMatch {
    fn can_connect(&self, source: DataType, target: DataType) -> bool {
        source == target
    }
}

impl<F> TypeCompatibility for F
where
    F: Fn(DataType, DataType) -> bool,
{
    fn can_connect(&self, source: DataType, target: DataType) -> bool {
        self(source, target)
    }
}

/// Template a node is instantiated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeDescriptor {
    pub tag: String,
    pub display_name: String,
    #[serde(default)]
    pub inputs: Vec<PortDefinition>,
    #[serde(default)]
    pub outputs: Vec<PortDefinition>,
}

impl NodeTypeDescriptor {
    pub fn new(tag: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            display_name: display_name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, port: PortDefinition) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn output(mut self, port: PortDefinition) -> Self {
        self.outputs.push(port);
        self
    }
}

/// Registered node types plus any extra allowed type conversions.
///
/// Exact matches always connect; [`allow`](Self::allow) adds one-way
/// conversions on top.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    descriptors: Vec<NodeTypeDescriptor>,
    conversions: HashSet<(DataType, DataType)>,
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text, image, audio and trigger nodes of a typical generation workflow.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register(
            NodeTypeDescriptor::new("prompt", "Prompt")
                .output(PortDefinition::new("text", "Text", DataType::String)),
        );
        registry.register(
            NodeTypeDescriptor::new("text_to_image", "Text to Image")
                .input(PortDefinition::new("prompt", "Prompt", DataType::String).required())
                .input(PortDefinition::new("trigger", "Run", DataType::Pulse))
                .output(PortDefinition::new("image", "Image", DataType::Image)),
        );
        registry.register(
            NodeTypeDescriptor::new("image_to_text", "Describe Image")
                .input(PortDefinition::new("image", "Image", DataType::Image).required())
                .output(PortDefinition::new("text", "Text", DataType::String)),
        );
        registry.register(
            NodeTypeDescriptor::new("text_to_speech", "Text to Speech")
                .input(PortDefinition::new("text", "Text", DataType::String).required())
                .output(PortDefinition::new("audio", "Audio", DataType::Audio)),
        );
        registry.register(
            NodeTypeDescriptor::new("trigger", "Trigger")
                .output(PortDefinition::new("pulse", "Pulse", DataType::Pulse)),
        );
        registry.register(
            NodeTypeDescriptor::new("preview", "Preview")
                .input(PortDefinition::new("image", "Image", DataType::Image))
                .input(PortDefinition::new("audio", "Audio", DataType::Audio))
                .input(PortDefinition::new("text", "Text", DataType::String)),
        );
        registry
    }

    /// Register (or replace) a descriptor, keyed by tag.
    pub fn register(&mut self, descriptor: NodeTypeDescriptor) {
        if let Some(existing) = self.descriptors.iter_mut().find(|d| d.tag == descriptor.tag) {
            *existing = descriptor;
        } else {
            self.descriptors.push(descriptor);
        }
    }

    pub fn get(&self, tag: &str) -> Option<&NodeTypeDescriptor> {
        self.descriptors.iter().find(|d| d.tag == tag)
    }

    pub fn descriptors(&self) -> &[NodeTypeDescriptor] {
        &self.descriptors
    }

    /// Build a fresh node of type `tag` at a world position.
    pub fn instantiate(&self, tag: &str, position: Point) -> Option<Node> {
        let descriptor = self.get(tag)?;
        let mut node = Node::new(tag, position);
        node.inputs = descriptor.inputs.clone();
        node.outputs = descriptor.outputs.clone();
        Some(node)
    }

    /// Allow `source` outputs to feed `target` inputs.
    pub fn allow(&mut self, source: DataType, target: DataType) {
        self.conversions.insert((source, target));
    }
}

impl TypeCompatibility for NodeTypeRegistry {
    fn can_connect(&self, source: DataType, target: DataType) -> bool {
        source == target || self.conversions.contains(&(source, target))
    }
}
