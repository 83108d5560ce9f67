// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph core for `HyperGradeFX`.
//!
//! This crate is the generic layer every compositing recipe is written
//! against:
//! - A graph store of named nodes and socket-to-socket links
//! - A builder that creates nodes from a type catalog and wires sockets
//! - A snapshot serializer for presets, blueprints and sequence captures
//! - A depth-based auto-layout
//!
//! ## Architecture
//!
//! Nodes are identified by a name that is unique within their graph. Node
//! kinds are described by [`NodeType`] entries in a [`NodeRegistry`], which
//! define the sockets and default properties each new node starts with.
//! Properties live in an open, string-keyed bag; only an allow-list of them
//! is written to snapshots.

pub mod property;
pub mod socket;
pub mod node;
pub mod link;
pub mod graph;
pub mod builder;
pub mod snapshot;
pub mod layout;
pub mod graphs;

pub use property::{PropertyBag, PropertyValue};
pub use socket::{Socket, SocketDirection, SocketKind, SocketRef};
pub use node::{Node, NodeCategory, NodeRegistry, NodeType};
pub use link::Link;
pub use graph::{ConnectError, Graph, MissingAnchor, PRIMARY_INPUT_TYPE};
pub use builder::{BuildError, BuildStats, GraphBuilder};
pub use snapshot::{
    apply_json, ApplyIssue, ApplyMode, ApplyReport, LinkDescriptor, NodeDescriptor,
    PortDescriptor, Snapshot, SnapshotError,
};
pub use layout::{depths, layout, node_depth, LayoutParams};
