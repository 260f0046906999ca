// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The breadth-first traversal engine and its path state.

use crate::graph::{GifRef, LinkRef, NodeType};
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// One hierarchy crossing of a path.
#[derive(Clone)]
pub(crate) struct PathStackElement {
    pub(crate) parent_type: NodeType,
    pub(crate) child_type: NodeType,
    pub(crate) parent_gif: GifRef,
    pub(crate) name: String,
    pub(crate) up: bool,
}

impl PathStackElement {
    /// True for the crossings that opened a split obligation (down into a
    /// multi-child parent). Join records point up.
    pub(crate) fn is_split_event(&self) -> bool {
        !self.up
    }
}

impl fmt::Debug for PathStackElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.up {
            write!(
                f,
                "{}->{}.{}",
                self.child_type.name(),
                self.parent_type.name(),
                self.name
            )
        } else {
            write!(
                f,
                "{}.{}->{}",
                self.parent_type.name(),
                self.name,
                self.child_type.name()
            )
        }
    }
}

/// A hierarchy crossing still waiting for its inverse.
#[derive(Clone, Debug)]
pub(crate) struct UnresolvedStackElement {
    pub(crate) elem: PathStackElement,
    /// Set when the crossing opened a split obligation.
    pub(crate) split: bool,
}

impl UnresolvedStackElement {
    /// True if `other` is the inverse crossing of this element: same types
    /// and name, opposite direction.
    pub(crate) fn matches(&self, other: &PathStackElement) -> bool {
        self.elem.parent_type == other.parent_type
            && self.elem.child_type == other.child_type
            && self.elem.name == other.name
            && self.elem.up != other.up
    }
}

pub(crate) type UnresolvedStack = SmallVec<[UnresolvedStackElement; 4]>;
pub(crate) type SplitStack = SmallVec<[PathStackElement; 4]>;

/// Mutable per-path state, shared copy-on-write between a path and its
/// extensions.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathData {
    pub(crate) unresolved_stack: UnresolvedStack,
    pub(crate) split_stack: SplitStack,
    /// True while any split obligation is outstanding.
    pub(crate) not_complete: bool,
}

/// A path under construction during BFS.
///
/// Extension shares the path data; the first structural write after an
/// extension forks it. Split completion deliberately writes through the
/// shared cell instead, so a whole cohort of registered paths flips to
/// complete at once.
#[derive(Clone, Debug)]
pub(crate) struct BfsPath {
    vertices: Vec<GifRef>,
    data: Rc<RefCell<PathData>>,
    pub(crate) confidence: f64,
    pub(crate) filtered: bool,
    pub(crate) stop: bool,
    pub(crate) hibernated: bool,
    pub(crate) woken: bool,
}

impl BfsPath {
    pub(crate) fn new(root: GifRef) -> Self {
        Self {
            vertices: vec![root],
            data: Rc::new(RefCell::new(PathData::default())),
            confidence: 1.0,
            filtered: false,
            stop: false,
            hibernated: false,
            woken: false,
        }
    }

    /// Returns a new path extended by one vertex, sharing this path's data.
    pub(crate) fn extended(&self, gif: &GifRef) -> Self {
        debug_assert!(!self.filtered);
        let mut vertices = Vec::with_capacity(self.vertices.len() + 1);
        vertices.extend_from_slice(&self.vertices);
        vertices.push(gif.clone());
        Self {
            vertices,
            data: Rc::clone(&self.data),
            confidence: self.confidence,
            filtered: false,
            stop: false,
            hibernated: false,
            woken: false,
        }
    }

    pub(crate) fn vertices(&self) -> &[GifRef] {
        &self.vertices
    }

    pub(crate) fn first(&self) -> &GifRef {
        self.vertices.first().expect("paths are never empty")
    }

    pub(crate) fn last(&self) -> &GifRef {
        self.vertices.last().expect("paths are never empty")
    }

    pub(crate) fn contains(&self, gif: &GifRef) -> bool {
        self.vertices.iter().any(|v| Rc::ptr_eq(v, gif))
    }

    pub(crate) fn index_of(&self, gif: &GifRef) -> Option<usize> {
        self.vertices.iter().position(|v| Rc::ptr_eq(v, gif))
    }

    /// Returns the newest edge, `None` for the root path.
    pub(crate) fn last_edge(&self) -> Option<(&GifRef, &GifRef)> {
        let n = self.vertices.len();
        if n < 2 {
            return None;
        }
        Some((&self.vertices[n - 2], &self.vertices[n - 1]))
    }

    /// Returns the newest three vertices, `None` for shorter paths.
    pub(crate) fn last_tri_edge(&self) -> Option<(&GifRef, &GifRef, &GifRef)> {
        let n = self.vertices.len();
        if n < 3 {
            return None;
        }
        Some((
            &self.vertices[n - 3],
            &self.vertices[n - 2],
            &self.vertices[n - 1],
        ))
    }

    /// Looks up the link behind an edge of this path.
    pub(crate) fn link_of(&self, from: &GifRef, to: &GifRef) -> Option<LinkRef> {
        from.is_connected(to)
    }

    /// Read access to the shared path data.
    pub(crate) fn data(&self) -> Ref<'_, PathData> {
        self.data.borrow()
    }

    /// Write access with copy-on-write: forks the data if any other path
    /// still shares it.
    pub(crate) fn data_mut(&mut self) -> RefMut<'_, PathData> {
        if Rc::strong_count(&self.data) > 1 {
            let forked = self.data.borrow().clone();
            self.data = Rc::new(RefCell::new(forked));
        }
        self.data.borrow_mut()
    }

    /// Write access through the shared cell, for cohort-wide writes.
    pub(crate) fn shared_data_mut(&self) -> RefMut<'_, PathData> {
        self.data.borrow_mut()
    }

    /// A path is strong while it carries no open obligations.
    pub(crate) fn strong(&self) -> bool {
        self.confidence == 1.0
    }
}

fn admit(
    mut path: BfsPath,
    visitor: &mut impl FnMut(&mut BfsPath),
    visited_strong: &mut FixedBitSet,
    visited_weak: &mut FixedBitSet,
    open: &mut VecDeque<BfsPath>,
) -> bool {
    visitor(&mut path);

    if path.stop {
        open.clear();
        return true;
    }
    if path.filtered {
        return false;
    }
    if path.hibernated {
        // Parked with the split registry; it re-enters through the wake
        // queue if its split completes.
        return false;
    }

    let last = path.last().index();
    visited_weak.insert(last);
    if path.strong() {
        visited_strong.insert(last);
    }
    open.push_back(path);
    false
}

/// Emits paths starting at `root`, breadth first.
///
/// The visitor runs for every extension and communicates through the path
/// flags: `filtered` suppresses expansion, `hibernated` parks the path,
/// `stop` ends the traversal. Paths pushed into `wake` re-enter the queue.
///
/// Two visited bitmaps prune the search: a strong path claims its tip for
/// every later path, a weak path only blocks revisits on its own branch.
pub(crate) fn bfs_visit(
    root: &GifRef,
    wake: &Rc<RefCell<VecDeque<BfsPath>>>,
    mut visitor: impl FnMut(&mut BfsPath),
) {
    let capacity = root.graph().vertex_capacity();
    let mut visited_strong = FixedBitSet::with_capacity(capacity);
    let mut visited_weak = FixedBitSet::with_capacity(capacity);
    let mut open: VecDeque<BfsPath> = VecDeque::new();

    let stopped = admit(
        BfsPath::new(root.clone()),
        &mut visitor,
        &mut visited_strong,
        &mut visited_weak,
        &mut open,
    );
    if stopped {
        return;
    }

    loop {
        {
            let mut wake = wake.borrow_mut();
            while let Some(path) = wake.pop_front() {
                open.push_back(path);
            }
        }
        let path = match open.pop_front() {
            Some(path) => path,
            None => break,
        };

        for neighbor in path.last().gif_edges() {
            if visited_strong.contains(neighbor.index()) {
                continue;
            }
            if visited_weak.contains(neighbor.index()) && path.contains(&neighbor) {
                continue;
            }
            let extended = path.extended(&neighbor);
            let stopped = admit(
                extended,
                &mut visitor,
                &mut visited_strong,
                &mut visited_weak,
                &mut open,
            );
            if stopped {
                return;
            }
        }
    }
}
