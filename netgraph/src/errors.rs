// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contains the error type returned by `netgraph` methods.

use std::error;
use std::fmt;

use Error::*;

/// Error type describing the sorts of errors `netgraph` can return.
///
/// Lifecycle misuse and precondition violations propagate to callers through
/// this type. Predicate failures during traversal never do: they are recorded
/// on the affected path instead.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// `parent_force` was called on a node without a parent.
    NodeNoParent(String),
    /// A `Reference` interface had no `Pointer` edge to resolve.
    UnboundReference(String),
    /// A conditional link rejected its own endpoints at construction time.
    LinkFiltered,
    /// A link that already has endpoints was bound or wired a second time.
    LinkAlreadyBound,
    /// An operation needed the endpoints of a link that was never bound.
    LinkNotSetup,
    /// An operation was attempted on a graph that has been merged away.
    GraphInvalidated,
    /// The source node of a path query is not a module interface.
    SrcNotModuleInterface(String),
    /// A destination node of a path query is not a module interface.
    DstNotModuleInterface(String),
    /// An internal invariant was violated.
    GraphInternalError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeNoParent(name) => write!(f, "Node '{}' has no parent", name),
            UnboundReference(name) => write!(f, "Reference '{}' is not bound", name),
            LinkFiltered => write!(f, "Conditional link rejected its endpoints"),
            LinkAlreadyBound => write!(f, "Link endpoints are already set"),
            LinkNotSetup => write!(f, "Link endpoints were never set"),
            GraphInvalidated => write!(f, "Operation on an invalidated graph"),
            SrcNotModuleInterface(name) => {
                write!(f, "Path source '{}' is not a module interface", name)
            }
            DstNotModuleInterface(name) => {
                write!(f, "Path destination '{}' is not a module interface", name)
            }
            GraphInternalError(msg) => write!(f, "Internal error in graph: {}", msg),
        }
    }
}

impl error::Error for Error {}
