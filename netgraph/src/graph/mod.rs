// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The typed, hierarchical connectivity graph.
//!
//! A design is a set of [`Node`]s, each anchored into a [`Graph`] through a
//! small star of typed vertices ([`GraphInterface`]s) wired together by typed
//! edges ([`Link`]s). Connecting interfaces of two previously independent
//! designs merges their graphs into one.

use std::rc::Rc;

mod graph_impl;
mod interface;
mod link;
mod node;

pub use graph_impl::*;
pub use interface::*;
pub use link::*;
pub use node::*;

/// Shared handle to a graph interface.
pub type GifRef = Rc<GraphInterface>;
/// Shared handle to a link.
pub type LinkRef = Rc<Link>;
/// Shared handle to a node.
pub type NodeRef = Rc<Node>;

/// The variant of a graph interface.
///
/// Interfaces are modeled as a tag plus variant-specific data rather than as
/// a type hierarchy; everything that needs to branch on the variant matches
/// on this enum.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InterfaceKind {
    /// The vertex standing for the node itself. Paths begin and end here,
    /// and sibling links point at it.
    SelfAnchor,
    /// A hierarchy vertex. The parent-side (`is_parent == true`) carries
    /// named-parent edges down to children; the child-side carries the
    /// single edge up to its parent.
    Hierarchical {
        /// True on the side of the edge that owns children.
        is_parent: bool,
    },
    /// A hierarchy vertex reserved for module specialization edges.
    HierarchicalModuleSpecial {
        /// True on the side of the edge that owns children.
        is_parent: bool,
    },
    /// Points at another node's self anchor through a pointer link.
    Reference,
    /// Carries module-to-module connection edges.
    ModuleConnection,
    /// Catch-all for host-defined attachment points.
    Other,
}

impl InterfaceKind {
    /// Returns true for the node's own vertex.
    pub fn is_self_anchor(self) -> bool {
        matches!(self, InterfaceKind::SelfAnchor)
    }

    /// Returns true for either hierarchy flavor.
    pub fn is_hierarchical(self) -> bool {
        matches!(
            self,
            InterfaceKind::Hierarchical { .. } | InterfaceKind::HierarchicalModuleSpecial { .. }
        )
    }

    /// Returns the parent flag for hierarchy vertices, `None` otherwise.
    pub fn hierarchy_parent_flag(self) -> Option<bool> {
        match self {
            InterfaceKind::Hierarchical { is_parent }
            | InterfaceKind::HierarchicalModuleSpecial { is_parent } => Some(is_parent),
            _ => None,
        }
    }

    /// Short variant name used in type-annotated full names.
    pub fn variant_name(self) -> &'static str {
        match self {
            InterfaceKind::SelfAnchor => "SelfAnchor",
            InterfaceKind::Hierarchical { .. } => "Hierarchical",
            InterfaceKind::HierarchicalModuleSpecial { .. } => "HierarchicalModuleSpecial",
            InterfaceKind::Reference => "Reference",
            InterfaceKind::ModuleConnection => "ModuleConnection",
            InterfaceKind::Other => "Other",
        }
    }
}

/// The coarse category of a node, used for child filtering.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeCategory {
    /// The base category. As a filter this matches every node.
    Node,
    /// A module: owns interfaces, appears in designs.
    Module,
    /// A module interface: a legal path endpoint.
    ModuleInterface,
}

impl NodeCategory {
    /// Returns true if a node of category `other` passes a filter asking for
    /// `self`. The base category matches everything.
    pub fn matches(self, other: NodeCategory) -> bool {
        self == NodeCategory::Node || self == other
    }
}

/// The granular type of a node: its category plus a concrete type name.
///
/// Granular types are compared whole. Two nodes are "the same type" for path
/// termination purposes only when both category and name agree.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NodeType {
    category: NodeCategory,
    name: Rc<str>,
}

impl NodeType {
    /// Creates a new granular type.
    pub fn new(category: NodeCategory, name: impl AsRef<str>) -> Self {
        Self {
            category,
            name: name.as_ref().into(),
        }
    }

    /// Creates a module type with the given name.
    pub fn module(name: impl AsRef<str>) -> Self {
        Self::new(NodeCategory::Module, name)
    }

    /// Creates a module-interface type with the given name.
    pub fn module_interface(name: impl AsRef<str>) -> Self {
        Self::new(NodeCategory::ModuleInterface, name)
    }

    /// Returns the coarse category.
    pub fn category(&self) -> NodeCategory {
        self.category
    }

    /// Returns the concrete type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if this type marks a legal path endpoint.
    pub fn is_module_interface(&self) -> bool {
        self.category == NodeCategory::ModuleInterface
    }
}
