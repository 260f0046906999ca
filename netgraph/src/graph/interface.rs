// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::graph::{GifRef, Graph, InterfaceKind, Link, LinkRef, NodeRef};
use crate::Error;
use once_cell::unsync::OnceCell;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A typed vertex: an attachment point on a node.
///
/// Every interface is born into its own single-vertex [`Graph`]; connecting
/// two interfaces merges their graphs. The owning node is attached exactly
/// once, after construction, and is held weakly: the node owns its
/// interfaces, not the other way around.
pub struct GraphInterface {
    kind: InterfaceKind,
    name: Box<str>,
    node: OnceCell<Weak<crate::graph::Node>>,
    graph: RefCell<Graph>,
    index: Cell<usize>,
}

impl GraphInterface {
    /// Creates an unnamed interface in a fresh graph.
    pub fn new(kind: InterfaceKind) -> GifRef {
        Self::named(kind, "")
    }

    /// Creates a named interface in a fresh graph.
    pub fn named(kind: InterfaceKind, name: impl AsRef<str>) -> GifRef {
        let graph = Graph::new();
        let gif = Rc::new(GraphInterface {
            kind,
            name: name.as_ref().into(),
            node: OnceCell::new(),
            graph: RefCell::new(graph.clone()),
            index: Cell::new(0),
        });
        graph.hold(&gif);
        gif
    }

    /// Returns the variant tag.
    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    /// Returns the short name, `""` if never named.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning node, or `None` if this interface was never
    /// attached (or the node has been dropped).
    pub fn node(&self) -> Option<NodeRef> {
        self.node.get().and_then(Weak::upgrade)
    }

    /// Attaches the owning node. May only happen once.
    pub(super) fn set_node(&self, node: &NodeRef) -> Result<(), Error> {
        self.node
            .set(Rc::downgrade(node))
            .map_err(|_| Error::GraphInternalError("interface already has an owning node".into()))
    }

    /// Returns a handle to the graph this interface currently belongs to.
    pub fn graph(&self) -> Graph {
        self.graph.borrow().clone()
    }

    pub(super) fn set_graph(&self, graph: Graph) {
        *self.graph.borrow_mut() = graph;
    }

    /// Returns the dense vertex index within the current graph.
    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub(super) fn set_index(&self, index: usize) {
        self.index.set(index);
    }

    /// Connects this interface to `other` with a direct link.
    pub fn connect(self: &Rc<Self>, other: &GifRef) -> Result<LinkRef, Error> {
        self.connect_with(other, Link::direct())
    }

    /// Connects this interface to `other` with the supplied link.
    ///
    /// The link must be freshly constructed; wiring an already-bound link
    /// fails with [`Error::LinkAlreadyBound`]. Binding validates the link's
    /// endpoint constraints and, for conditional links, runs the predicate
    /// on the degenerate two-vertex path.
    pub fn connect_with(self: &Rc<Self>, other: &GifRef, link: LinkRef) -> Result<LinkRef, Error> {
        if link.is_setup() {
            return Err(Error::LinkAlreadyBound);
        }
        link.set_connections(self, other)?;
        self.graph().add_edge(link.clone())?;
        Ok(link)
    }

    /// Returns the labeled adjacency slice for this vertex.
    pub fn edges(self: &Rc<Self>) -> Vec<(GifRef, LinkRef)> {
        self.graph().edges_of(self)
    }

    /// Returns the neighbors of this vertex, without link data.
    pub fn gif_edges(self: &Rc<Self>) -> Vec<GifRef> {
        self.graph().gif_edges(self)
    }

    /// Returns the link between this interface and `to`, if any.
    pub fn is_connected(self: &Rc<Self>, to: &GifRef) -> Option<LinkRef> {
        self.graph().is_connected(self, to)
    }

    /// Returns `node_full_name.interface_name`, annotated with the concrete
    /// variant when `types` is requested.
    pub fn full_name(&self, types: bool) -> String {
        let prefix = match self.node() {
            Some(node) => node.full_name(types),
            None => "*".to_string(),
        };
        if types {
            format!("{}.{}|{}|", prefix, self.name, self.kind.variant_name())
        } else {
            format!("{}.{}", prefix, self.name)
        }
    }

    // ---
    // Hierarchy operations
    // ---

    /// Returns the parent flag for hierarchy vertices, `None` otherwise.
    pub fn is_parent(&self) -> Option<bool> {
        self.kind.hierarchy_parent_flag()
    }

    /// Enumerates `(node, name)` for every named-parent edge where this
    /// vertex is the parent side.
    pub fn children(self: &Rc<Self>) -> Vec<(NodeRef, String)> {
        self.edges()
            .into_iter()
            .filter_map(|(_, link)| {
                let name = link.child_name()?;
                let parent = link.parent_role()?;
                if !Rc::ptr_eq(&parent, self) {
                    return None;
                }
                let child = link.child_role()?;
                let node = child.node()?;
                Some((node, name.to_string()))
            })
            .collect()
    }

    /// Returns the unique named-parent edge where this vertex is the child
    /// side, or `None` for roots.
    pub fn parent_link(self: &Rc<Self>) -> Option<LinkRef> {
        self.edges().into_iter().find_map(|(_, link)| {
            let child = link.child_role()?;
            link.child_name()?;
            Rc::ptr_eq(&child, self).then(|| link)
        })
    }

    /// Returns `(node, name)` of the parent, or `None` for roots.
    pub fn parent(self: &Rc<Self>) -> Option<(NodeRef, String)> {
        let link = self.parent_link()?;
        let name = link.child_name()?.to_string();
        let node = link.parent_role()?.node()?;
        Some((node, name))
    }

    /// Removes the edge to the parent, if any.
    pub fn disconnect_parent(self: &Rc<Self>) -> Result<(), Error> {
        match self.parent_link() {
            Some(link) => self.graph().remove_edge(&link),
            None => Ok(()),
        }
    }

    /// Classifies an edge between two hierarchy vertices as pointing up the
    /// hierarchy (child side to parent side).
    pub fn is_uplink(from: &GifRef, to: &GifRef) -> bool {
        matches!(
            (from.is_parent(), to.is_parent()),
            (Some(false), Some(true))
        )
    }

    /// Classifies an edge between two hierarchy vertices as pointing down
    /// the hierarchy (parent side to child side).
    pub fn is_downlink(from: &GifRef, to: &GifRef) -> bool {
        matches!(
            (from.is_parent(), to.is_parent()),
            (Some(true), Some(false))
        )
    }

    // ---
    // Reference operations
    // ---

    /// Resolves the self anchor this reference points at.
    ///
    /// Scans the adjacency slice for a pointer link and returns its pointee.
    /// Sibling links do not count: they wire a node's own star, they do not
    /// bind a reference.
    pub fn referenced_gif(self: &Rc<Self>) -> Result<GifRef, Error> {
        self.edges()
            .into_iter()
            .find_map(|(_, link)| {
                if link.is_sibling() {
                    return None;
                }
                link.pointee()
            })
            .ok_or_else(|| Error::UnboundReference(self.full_name(false)))
    }

    /// Resolves the node this reference points at.
    pub fn referenced_node(self: &Rc<Self>) -> Result<NodeRef, Error> {
        self.referenced_gif()?.node().ok_or_else(|| {
            Error::GraphInternalError("referenced self anchor has no owning node".into())
        })
    }
}

impl fmt::Debug for GraphInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphInterface")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("index", &self.index.get())
            .finish()
    }
}

impl fmt::Display for GraphInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name(true))
    }
}
