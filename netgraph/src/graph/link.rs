// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::graph::{GifRef, NodeType};
use crate::Error;
use debug_ignore::DebugIgnore;
use once_cell::unsync::OnceCell;
use std::fmt;
use std::rc::Rc;

/// The verdict of a conditional link's predicate over a path.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FilterResult {
    /// The path may use this link.
    Pass,
    /// The path may not use this link right now, but a weaker version of it
    /// is kept around: its confidence is attenuated.
    FailRecoverable,
    /// The path may never use this link; it is dropped.
    FailUnrecoverable,
}

/// A predicate evaluated over the ordered vertex list of a path.
pub type LinkPredicate = Rc<dyn Fn(&[GifRef]) -> FilterResult>;

/// The predicate carried by a conditional link.
#[derive(Clone)]
pub struct ConditionalSpec {
    predicate: DebugIgnore<LinkPredicate>,
    first_only: bool,
}

impl ConditionalSpec {
    /// Creates a spec from a raw predicate.
    pub fn new(predicate: LinkPredicate, first_only: bool) -> Self {
        Self {
            predicate: DebugIgnore(predicate),
            first_only,
        }
    }

    /// Runs the predicate over a path.
    pub fn evaluate(&self, path: &[GifRef]) -> FilterResult {
        (self.predicate.0)(path)
    }

    /// When true, the predicate only needs to run while the link sits at the
    /// frontier of the path; its verdict is stable under later extension.
    pub fn first_only(&self) -> bool {
        self.first_only
    }
}

impl fmt::Debug for ConditionalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalSpec")
            .field("first_only", &self.first_only)
            .finish()
    }
}

#[derive(Debug)]
enum LinkKind {
    Direct,
    Parent {
        // None for the unnamed structural variant.
        name: Option<Box<str>>,
        // parent-side and child-side endpoints, resolved at bind time.
        roles: OnceCell<(GifRef, GifRef)>,
    },
    Pointer {
        // Siblings are pointers within a single node's interface star.
        sibling: bool,
        // (pointer, pointee), resolved at bind time.
        roles: OnceCell<(GifRef, GifRef)>,
    },
    Conditional(ConditionalSpec),
}

/// A typed edge connecting exactly two interfaces.
///
/// Links are constructed unbound and receive their endpoints exactly once,
/// when wired through [`GraphInterface::connect_with`]. Structural variants
/// validate their endpoint constraints at bind time; conditional variants
/// additionally run their predicate on the degenerate two-vertex path and
/// refuse to bind with [`Error::LinkFiltered`] when it does not pass.
///
/// [`GraphInterface::connect_with`]: crate::graph::GraphInterface::connect_with
#[derive(Debug)]
pub struct Link {
    endpoints: OnceCell<(GifRef, GifRef)>,
    kind: LinkKind,
}

impl Link {
    /// An unconditional edge.
    pub fn direct() -> Rc<Link> {
        Self::with_kind(LinkKind::Direct)
    }

    /// A hierarchy edge. Endpoints must be hierarchy vertices with opposite
    /// parent flags.
    pub fn parent() -> Rc<Link> {
        Self::with_kind(LinkKind::Parent {
            name: None,
            roles: OnceCell::new(),
        })
    }

    /// A hierarchy edge carrying the child's name; the source of truth for
    /// name resolution. The name must be non-empty.
    pub fn named_parent(name: impl AsRef<str>) -> Rc<Link> {
        Self::with_kind(LinkKind::Parent {
            name: Some(name.as_ref().into()),
            roles: OnceCell::new(),
        })
    }

    /// An edge pointing at a self anchor.
    pub fn pointer() -> Rc<Link> {
        Self::with_kind(LinkKind::Pointer {
            sibling: false,
            roles: OnceCell::new(),
        })
    }

    /// A pointer from an interface to the self anchor of its own node.
    pub fn sibling() -> Rc<Link> {
        Self::with_kind(LinkKind::Pointer {
            sibling: true,
            roles: OnceCell::new(),
        })
    }

    /// A direct edge guarded by a predicate over the traversing path.
    pub fn direct_conditional(predicate: LinkPredicate, first_only: bool) -> Rc<Link> {
        Self::with_kind(LinkKind::Conditional(ConditionalSpec::new(
            predicate, first_only,
        )))
    }

    /// A conditional edge that refuses paths originating from nodes whose
    /// granular type appears in `filtered_types`.
    pub fn direct_shallow(filtered_types: Vec<NodeType>) -> Rc<Link> {
        let predicate: LinkPredicate = Rc::new(move |path: &[GifRef]| {
            let origin_type = path.first().and_then(|gif| gif.node());
            match origin_type {
                Some(node) if filtered_types.contains(node.node_type()) => {
                    FilterResult::FailUnrecoverable
                }
                _ => FilterResult::Pass,
            }
        });
        Self::with_kind(LinkKind::Conditional(ConditionalSpec::new(predicate, true)))
    }

    /// A conditional edge synthesized from an existing path: its predicate
    /// is the conjunction of every conditional predicate found along the
    /// path, and its frontier-only hint is the conjunction of theirs.
    pub fn direct_derived(path: &[GifRef]) -> Result<Rc<Link>, Error> {
        let mut predicates: Vec<LinkPredicate> = Vec::new();
        let mut first_only = true;
        for pair in path.windows(2) {
            let link = pair[0].is_connected(&pair[1]).ok_or_else(|| {
                Error::GraphInternalError(format!(
                    "derived link path has no edge between {} and {}",
                    pair[0].full_name(false),
                    pair[1].full_name(false)
                ))
            })?;
            if let Some(spec) = link.conditional() {
                predicates.push(spec.predicate.0.clone());
                first_only &= spec.first_only;
            }
        }
        let predicate: LinkPredicate = Rc::new(move |path: &[GifRef]| {
            let mut result = FilterResult::Pass;
            for predicate in &predicates {
                match predicate(path) {
                    FilterResult::FailUnrecoverable => return FilterResult::FailUnrecoverable,
                    FilterResult::FailRecoverable => result = FilterResult::FailRecoverable,
                    FilterResult::Pass => {}
                }
            }
            result
        });
        Ok(Self::with_kind(LinkKind::Conditional(ConditionalSpec::new(
            predicate, first_only,
        ))))
    }

    fn with_kind(kind: LinkKind) -> Rc<Link> {
        Rc::new(Link {
            endpoints: OnceCell::new(),
            kind,
        })
    }

    /// Returns true once the endpoints have been set.
    pub fn is_setup(&self) -> bool {
        self.endpoints.get().is_some()
    }

    /// Returns the endpoints as `(from, to)`.
    pub fn endpoints(&self) -> Result<(GifRef, GifRef), Error> {
        self.endpoints
            .get()
            .cloned()
            .ok_or(Error::LinkNotSetup)
    }

    /// Binds the endpoints. May only happen once; structural variants
    /// validate their endpoint constraints here.
    pub fn set_connections(&self, from: &GifRef, to: &GifRef) -> Result<(), Error> {
        if self.is_setup() {
            return Err(Error::LinkAlreadyBound);
        }
        match &self.kind {
            LinkKind::Direct => {}
            LinkKind::Parent { name, roles } => {
                if name.as_deref() == Some("") {
                    return Err(Error::GraphInternalError(
                        "named parent link with an empty name".into(),
                    ));
                }
                let resolved = match (from.is_parent(), to.is_parent()) {
                    (Some(true), Some(false)) => (from.clone(), to.clone()),
                    (Some(false), Some(true)) => (to.clone(), from.clone()),
                    _ => {
                        return Err(Error::GraphInternalError(
                            "parent link endpoints must be hierarchy vertices with opposite \
                             parent flags"
                                .into(),
                        ))
                    }
                };
                roles.set(resolved).expect("roles bind exactly once");
            }
            LinkKind::Pointer { roles, .. } => {
                let resolved = if to.kind().is_self_anchor() {
                    (from.clone(), to.clone())
                } else if from.kind().is_self_anchor() {
                    (to.clone(), from.clone())
                } else {
                    return Err(Error::GraphInternalError(
                        "pointer link needs a self anchor endpoint".into(),
                    ));
                };
                roles.set(resolved).expect("roles bind exactly once");
            }
            LinkKind::Conditional(spec) => {
                let degenerate = [from.clone(), to.clone()];
                if spec.evaluate(&degenerate) != FilterResult::Pass {
                    return Err(Error::LinkFiltered);
                }
            }
        }
        self.endpoints
            .set((from.clone(), to.clone()))
            .map_err(|_| Error::LinkAlreadyBound)
    }

    /// Returns the parent-side endpoint of a hierarchy link.
    pub fn parent_role(&self) -> Option<GifRef> {
        match &self.kind {
            LinkKind::Parent { roles, .. } => roles.get().map(|(parent, _)| parent.clone()),
            _ => None,
        }
    }

    /// Returns the child-side endpoint of a hierarchy link.
    pub fn child_role(&self) -> Option<GifRef> {
        match &self.kind {
            LinkKind::Parent { roles, .. } => roles.get().map(|(_, child)| child.clone()),
            _ => None,
        }
    }

    /// Returns the child name carried by a named hierarchy link.
    pub fn child_name(&self) -> Option<&str> {
        match &self.kind {
            LinkKind::Parent { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Returns the self anchor a pointer link points at.
    pub fn pointee(&self) -> Option<GifRef> {
        match &self.kind {
            LinkKind::Pointer { roles, .. } => roles.get().map(|(_, pointee)| pointee.clone()),
            _ => None,
        }
    }

    /// Returns true for pointer links between a node's own interfaces.
    pub fn is_sibling(&self) -> bool {
        matches!(self.kind, LinkKind::Pointer { sibling: true, .. })
    }

    /// Returns the conditional spec, if this link carries one.
    pub fn conditional(&self) -> Option<&ConditionalSpec> {
        match &self.kind {
            LinkKind::Conditional(spec) => Some(spec),
            _ => None,
        }
    }
}
