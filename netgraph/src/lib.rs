// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model and query connectivity in hierarchical electronics designs.
//!
//! `netgraph` is the native core of an electronics-design framework. A
//! design is a typed, hierarchical graph: nodes own typed attachment points
//! ([`GraphInterface`]s), typed edges ([`Link`]s) wire them together, and
//! connecting two independent designs merges their graphs. On top of the
//! graph, [`PathFinder`] answers connectivity queries: is this module
//! interface reachable from that one, and through which legal compositions
//! of parent, child and connection edges? Along the way it tracks the
//! split/join obligations that hierarchy crossings induce.
//!
//! # Examples
//!
//! Connect two module interfaces and query the path between them:
//!
//! ```
//! use netgraph::{GraphInterface, InterfaceKind, Link, Node, NodeType, PathFinder};
//!
//! let a = Node::new(NodeType::module_interface("Power")).unwrap();
//! let b = Node::new(NodeType::module_interface("Power")).unwrap();
//!
//! let a_conn = GraphInterface::named(InterfaceKind::ModuleConnection, "connected");
//! let b_conn = GraphInterface::named(InterfaceKind::ModuleConnection, "connected");
//! a.attach_interface(&a_conn).unwrap();
//! b.attach_interface(&b_conn).unwrap();
//! a_conn.connect_with(&b_conn, Link::direct()).unwrap();
//!
//! let (paths, _counters) = PathFinder::new().find_paths(&a, &[b.clone()]).unwrap();
//! assert_eq!(paths.len(), 1);
//! ```
//!
//! The core is single-threaded and synchronous: handles are reference
//! counted without atomics and none of the graph types are `Send`.

#![warn(missing_docs)]

pub mod errors;
pub mod graph;
pub mod pathfinder;

pub use errors::Error;
pub use graph::{
    ChildQuery, ConditionalSpec, FilterResult, GifRef, Graph, GraphInterface, InterfaceKind, Link,
    LinkPredicate, LinkRef, Node, NodeCategory, NodeRef, NodeType,
};
pub use pathfinder::{Counter, Path, PathFinder, PathLimits};

// Graph mutation and path-finding must not interleave across threads; the
// whole core is deliberately single-threaded.
static_assertions::assert_not_impl_any!(Graph: Send, Sync);
static_assertions::assert_not_impl_any!(PathFinder: Send, Sync);
