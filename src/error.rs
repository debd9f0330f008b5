use thiserror::Error;
use uuid::Uuid;

/// Why a requested graph mutation did not happen.
///
/// This is a closed set: the UI only needs to know which kind of failure
/// occurred, never a free-text explanation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanvasError {
    /// Data types do not match, or both ports point the same direction.
    #[error("ports are not compatible")]
    IncompatiblePorts,

    /// The edge would close a cycle, or connects a node to itself.
    #[error("connection would create a cycle")]
    CircularConnection,

    #[error("node {0} not found")]
    NodeNotFound(Uuid),

    #[error("edge {0} not found")]
    EdgeNotFound(Uuid),

    /// Structural violation, e.g. the source is not actually an output port.
    #[error("invalid connection")]
    InvalidConnection,
}

/// Payload-free tag of a [`CanvasError`], convenient for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasErrorKind {
    IncompatiblePorts,
    CircularConnection,
    NodeNotFound,
    EdgeNotFound,
    InvalidConnection,
}

impl CanvasError {
    pub fn kind(&self) -> CanvasErrorKind {
        match self {
            Self::IncompatiblePorts => CanvasErrorKind::IncompatiblePorts,
            Self::CircularConnection => CanvasErrorKind::CircularConnection,
            Self::NodeNotFound(_) => CanvasErrorKind::NodeNotFound,
            Self::EdgeNotFound(_) => CanvasErrorKind::EdgeNotFound,
            Self::InvalidConnection => CanvasErrorKind::InvalidConnection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(CanvasError::IncompatiblePorts.to_string(), "ports are not compatible");
        assert_eq!(
            CanvasError::CircularConnection.to_string(),
            "connection would create a cycle"
        );
        let id = Uuid::nil();
        assert_eq!(
            CanvasError::NodeNotFound(id).to_string(),
            format!("node {} not found", id)
        );
    }

    #[test]
    fn test_kind_drops_payload() {
        let id = Uuid::new_v4();
        assert_eq!(CanvasError::EdgeNotFound(id).kind(), CanvasErrorKind::EdgeNotFound);
        assert_eq!(CanvasError::InvalidConnection.kind(), CanvasErrorKind::InvalidConnection);
    }
}
