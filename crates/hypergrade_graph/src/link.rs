// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use serde::{Deserialize, Serialize};

/// A directed link from an output socket to an input socket.
///
/// The four-part tuple is the link's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Source node name
    pub from_node: String,
    /// Source output socket identifier
    pub from_socket: String,
    /// Target node name
    pub to_node: String,
    /// Target input socket identifier
    pub to_socket: String,
}

impl Link {
    /// Create a new link
    pub fn new(
        from_node: impl Into<String>,
        from_socket: impl Into<String>,
        to_node: impl Into<String>,
        to_socket: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_socket: from_socket.into(),
            to_node: to_node.into(),
            to_socket: to_socket.into(),
        }
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node: &str) -> bool {
        self.from_node == node || self.to_node == node
    }

    /// Check if this link feeds a specific input socket
    pub fn targets(&self, node: &str, socket: &str) -> bool {
        self.to_node == node && self.to_socket == socket
    }
}
