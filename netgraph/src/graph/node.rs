// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::graph::{
    GifRef, Graph, GraphInterface, InterfaceKind, Link, LinkRef, NodeCategory, NodeRef, NodeType,
};
use crate::Error;
use indexmap::IndexSet;
use itertools::Itertools;
use once_cell::unsync::OnceCell;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Options for [`Node::children`].
///
/// The default query returns every direct child, unfiltered and unsorted.
#[derive(Default)]
pub struct ChildQuery<'a> {
    /// When false, descends transitively.
    pub direct_only: bool,
    /// Keep only nodes matching one of these categories. A filter containing
    /// the base [`NodeCategory::Node`] degenerates to no filter at all.
    pub categories: Option<&'a [NodeCategory]>,
    /// Include the queried node itself in the result.
    pub include_root: bool,
    /// Host predicate, evaluated last.
    pub filter: Option<&'a dyn Fn(&NodeRef) -> bool>,
    /// Order the result by short name.
    pub sort: bool,
}

impl ChildQuery<'_> {
    fn category_filter(&self) -> Option<&[NodeCategory]> {
        let categories = self.categories?;
        if categories.contains(&NodeCategory::Node) {
            return None;
        }
        Some(categories)
    }
}

/// A hierarchical entity owning three interfaces.
///
/// Construction wires the `children` and `parent` interfaces to the `self`
/// anchor with sibling links, so the three form a single star projecting
/// onto the node. Attaching to a parent adds a named-parent edge between the
/// parent node's `children` interface and this node's `parent` interface;
/// that edge is the source of truth for the node's name.
pub struct Node {
    node_type: NodeType,
    self_gif: GifRef,
    children_gif: GifRef,
    parent_gif: GifRef,
    host_handle: OnceCell<Box<dyn Any>>,
}

impl Node {
    /// Creates a detached node of the given granular type.
    pub fn new(node_type: NodeType) -> Result<NodeRef, Error> {
        let self_gif = GraphInterface::named(InterfaceKind::SelfAnchor, "self");
        let children_gif =
            GraphInterface::named(InterfaceKind::Hierarchical { is_parent: true }, "children");
        let parent_gif =
            GraphInterface::named(InterfaceKind::Hierarchical { is_parent: false }, "parent");

        children_gif.connect_with(&self_gif, Link::sibling())?;
        parent_gif.connect_with(&self_gif, Link::sibling())?;

        let node = Rc::new(Node {
            node_type,
            self_gif,
            children_gif,
            parent_gif,
            host_handle: OnceCell::new(),
        });
        node.self_gif.set_node(&node)?;
        node.children_gif.set_node(&node)?;
        node.parent_gif.set_node(&node)?;
        Ok(node)
    }

    /// Returns the granular type tag.
    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Returns true if this node is a legal path endpoint.
    pub fn is_module_interface(&self) -> bool {
        self.node_type.is_module_interface()
    }

    /// Returns the self anchor.
    pub fn self_gif(&self) -> &GifRef {
        &self.self_gif
    }

    /// Returns the parent-side hierarchy interface (owns children).
    pub fn children_gif(&self) -> &GifRef {
        &self.children_gif
    }

    /// Returns the child-side hierarchy interface (edge up to the parent).
    pub fn parent_gif(&self) -> &GifRef {
        &self.parent_gif
    }

    /// Returns the graph this node is anchored into.
    pub fn graph(&self) -> Graph {
        self.self_gif.graph()
    }

    /// Returns true if both handles refer to the same node.
    pub fn ptr_eq(self: &Rc<Self>, other: &NodeRef) -> bool {
        Rc::ptr_eq(self, other)
    }

    /// Attaches an extra interface to this node: sets its owner and wires it
    /// to the self anchor with a sibling link.
    pub fn attach_interface(self: &Rc<Self>, gif: &GifRef) -> Result<LinkRef, Error> {
        gif.set_node(self)?;
        gif.connect_with(&self.self_gif, Link::sibling())
    }

    /// Attaches this node under `parent` with the given child name.
    pub fn attach_to(self: &Rc<Self>, parent: &NodeRef, name: impl AsRef<str>) -> Result<LinkRef, Error> {
        parent
            .children_gif
            .connect_with(&self.parent_gif, Link::named_parent(name))
    }

    /// Detaches this node from its parent, if any.
    pub fn detach_from_parent(&self) -> Result<(), Error> {
        self.parent_gif.disconnect_parent()
    }

    /// Returns `(parent, name)`, or `None` for roots.
    pub fn parent(&self) -> Option<(NodeRef, String)> {
        self.parent_gif.parent()
    }

    /// Returns `(parent, name)`, failing on roots.
    pub fn parent_force(&self) -> Result<(NodeRef, String), Error> {
        self.parent()
            .ok_or_else(|| Error::NodeNoParent(self.full_name(false)))
    }

    /// Returns the name carried by the parent edge, `"*"` for roots.
    pub fn name(&self) -> String {
        match self.parent() {
            Some((_, name)) => name,
            None => "*".to_string(),
        }
    }

    /// Returns the ordered hierarchy from the root down to this node, as
    /// `(node, name)` pairs.
    pub fn hierarchy(self: &Rc<Self>) -> Vec<(NodeRef, String)> {
        match self.parent() {
            Some((parent, name)) => {
                let mut chain = parent.hierarchy();
                chain.push((self.clone(), name));
                chain
            }
            None => vec![(self.clone(), "*".to_string())],
        }
    }

    /// Returns the dotted hierarchy path. When `types` is requested, each
    /// segment is annotated with its node's granular type name.
    pub fn full_name(&self, types: bool) -> String {
        let base = match self.parent() {
            Some((parent, name)) => format!("{}.{}", parent.full_name(types), name),
            None => "*".to_string(),
        };
        if types {
            format!("{}|{}", base, self.node_type.name())
        } else {
            base
        }
    }

    /// Returns the direct children, in child-edge insertion order.
    pub fn children_direct(&self) -> Vec<NodeRef> {
        self.children_gif
            .children()
            .into_iter()
            .map(|(node, _)| node)
            .collect()
    }

    /// Returns all transitive children, in discovery order.
    pub fn children_all(self: &Rc<Self>, include_root: bool) -> Vec<NodeRef> {
        let mut seen: IndexSet<usize> = IndexSet::new();
        let mut out: Vec<NodeRef> = Vec::new();
        if include_root {
            seen.insert(self.self_gif.index());
            out.push(self.clone());
        }
        let mut stack: Vec<NodeRef> = self.children_direct();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if !seen.insert(node.self_gif.index()) {
                continue;
            }
            let mut grandchildren = node.children_direct();
            grandchildren.reverse();
            stack.extend(grandchildren);
            out.push(node);
        }
        out
    }

    /// Returns children filtered per the query options.
    pub fn children(self: &Rc<Self>, query: ChildQuery<'_>) -> Vec<NodeRef> {
        let candidates = if query.direct_only {
            let mut candidates = Vec::new();
            if query.include_root {
                candidates.push(self.clone());
            }
            candidates.extend(self.children_direct());
            candidates
        } else {
            self.children_all(query.include_root)
        };

        let categories = query.category_filter();
        let filtered = candidates.into_iter().filter(|node| {
            if let Some(categories) = categories {
                let matched = categories
                    .iter()
                    .any(|category| category.matches(node.node_type.category()));
                if !matched {
                    return false;
                }
            }
            match query.filter {
                Some(filter) => filter(node),
                None => true,
            }
        });

        if query.sort {
            filtered.sorted_by_key(|node| node.name()).collect()
        } else {
            filtered.collect()
        }
    }

    /// Attaches an opaque host handle. May only happen once; the core works
    /// without one.
    pub fn set_host_handle(&self, handle: Box<dyn Any>) -> Result<(), Error> {
        self.host_handle
            .set(handle)
            .map_err(|_| Error::GraphInternalError("host handle already set".into()))
    }

    /// Returns the host handle, if one was attached.
    pub fn host_handle(&self) -> Option<&dyn Any> {
        self.host_handle.get().map(|handle| handle.as_ref())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.node_type)
            .field("full_name", &self.full_name(false))
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.full_name(true))
    }
}
