// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::graph::{GifRef, LinkRef, NodeRef};
use crate::Error;
use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

/// A connectivity graph over typed interfaces.
///
/// `Graph` is a cheap-to-clone handle; clones refer to the same underlying
/// state. Every [`GraphInterface`](crate::graph::GraphInterface) starts out
/// in its own single-vertex graph, and adding an edge that spans two graphs
/// folds one into the other. The folded-away graph is *invalidated*: it
/// rejects further mutation and is only good for teardown.
///
/// The graph owns its interfaces, and interfaces hold a handle back to their
/// graph. This cycle is deliberate and is severed by [`Graph::invalidate`],
/// which clears the vertex set.
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphState>>,
}

/// Internal state of a graph.
pub(super) struct GraphState {
    // Dense vertex index -> interface, in registration order. Indices are
    // monotonic: removal leaves a gap, and merged-in vertices are re-indexed
    // past the current high-water mark.
    vertices: IndexMap<usize, GifRef>,
    next_index: usize,
    // Ordered edge list; every link appears exactly once.
    edges: Vec<(GifRef, GifRef, LinkRef)>,
    // from -> to -> link, both directions. Insertion order of the inner maps
    // is edge insertion order, which is what makes traversal deterministic.
    adjacency: IndexMap<usize, IndexMap<usize, LinkRef>>,
    // from -> set of neighbors, kept alongside the labeled cache so the BFS
    // hot loop never touches link data.
    neighbors: IndexMap<usize, IndexMap<usize, GifRef>>,
    invalidated: bool,
}

impl Graph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(GraphState {
                vertices: IndexMap::new(),
                next_index: 0,
                edges: Vec::new(),
                adjacency: IndexMap::new(),
                neighbors: IndexMap::new(),
                invalidated: false,
            })),
        }
    }

    /// Returns true if both handles refer to the same graph.
    pub fn ptr_eq(&self, other: &Graph) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registers an interface with this graph, assigning its dense index.
    pub(super) fn hold(&self, gif: &GifRef) {
        let mut state = self.inner.borrow_mut();
        let index = state.alloc_index();
        gif.set_index(index);
        state.vertices.insert(index, gif.clone());
    }

    /// Adds a bound link as an edge.
    ///
    /// At least one endpoint must already belong to this graph. If the other
    /// endpoint lives in a different graph, that graph is folded into this
    /// one first. If an edge already exists between the two endpoints, the
    /// prior link is removed: last writer wins at a given endpoint pair.
    pub fn add_edge(&self, link: LinkRef) -> Result<(), Error> {
        if self.invalidated() {
            return Err(Error::GraphInvalidated);
        }
        let (from, to) = link.endpoints()?;

        let from_graph = from.graph();
        let to_graph = to.graph();
        if !self.ptr_eq(&from_graph) || !self.ptr_eq(&to_graph) {
            let source = if self.ptr_eq(&from_graph) {
                to_graph
            } else if self.ptr_eq(&to_graph) {
                from_graph
            } else {
                return Err(Error::GraphInternalError(
                    "neither endpoint of the new edge is in this graph".to_string(),
                ));
            };
            self.merge(&source)?;
        }

        let prior = self.is_connected(&from, &to);
        if let Some(prior) = prior {
            self.remove_edge(&prior)?;
        }

        self.inner.borrow_mut().insert_edge(from, to, link);
        Ok(())
    }

    /// Removes an edge. Removing a link that is not in the graph is a no-op,
    /// but removing a link whose endpoints are connected by a *different*
    /// link is an internal error.
    pub fn remove_edge(&self, link: &LinkRef) -> Result<(), Error> {
        if self.invalidated() {
            return Err(Error::GraphInvalidated);
        }
        let (from, to) = link.endpoints()?;
        let mut state = self.inner.borrow_mut();
        let existing = state
            .adjacency
            .get(&from.index())
            .and_then(|tos| tos.get(&to.index()))
            .cloned();
        let existing = match existing {
            Some(existing) => existing,
            None => return Ok(()),
        };
        if !Rc::ptr_eq(&existing, link) {
            return Err(Error::GraphInternalError(
                "edge between these endpoints belongs to a different link".to_string(),
            ));
        }
        state.remove_edge_entries(from.index(), to.index(), link);
        Ok(())
    }

    /// Removes a vertex and every adjacency entry mentioning it.
    pub fn remove_node(&self, gif: &GifRef) -> Result<(), Error> {
        if self.invalidated() {
            return Err(Error::GraphInvalidated);
        }
        let mut state = self.inner.borrow_mut();
        let ix = gif.index();
        state.vertices.shift_remove(&ix);

        let neighbor_ixs: Vec<usize> = state
            .neighbors
            .get(&ix)
            .map(|tos| tos.keys().copied().collect())
            .unwrap_or_default();
        for nix in neighbor_ixs {
            if let Some(tos) = state.neighbors.get_mut(&nix) {
                tos.shift_remove(&ix);
            }
            if let Some(tos) = state.adjacency.get_mut(&nix) {
                tos.shift_remove(&ix);
            }
        }
        state.neighbors.shift_remove(&ix);
        state.adjacency.shift_remove(&ix);
        state
            .edges
            .retain(|(from, to, _)| from.index() != ix && to.index() != ix);
        Ok(())
    }

    /// Folds `other` into this graph.
    ///
    /// Every vertex of `other` is re-indexed into this graph and has its
    /// graph handle rewritten; all caches and the edge list are unioned.
    /// `other` ends up invalidated.
    pub fn merge(&self, other: &Graph) -> Result<(), Error> {
        if self.ptr_eq(other) {
            return Ok(());
        }
        if self.invalidated() || other.invalidated() {
            return Err(Error::GraphInvalidated);
        }
        tracing::trace!(
            target: "netgraph::graph",
            source_vertices = other.node_count(),
            target_vertices = self.node_count(),
            "merging graphs"
        );

        let moved: Vec<(usize, GifRef)> = {
            let mut source = other.inner.borrow_mut();
            source.vertices.drain(..).collect()
        };
        let mut remap: HashMap<usize, usize> = HashMap::with_capacity(moved.len());
        {
            let mut state = self.inner.borrow_mut();
            for (old_ix, gif) in &moved {
                let new_ix = state.alloc_index();
                remap.insert(*old_ix, new_ix);
                gif.set_index(new_ix);
                state.vertices.insert(new_ix, gif.clone());
            }
        }
        for (_, gif) in &moved {
            gif.set_graph(self.clone());
        }

        let (edges, adjacency, neighbors) = {
            let mut source = other.inner.borrow_mut();
            (
                std::mem::take(&mut source.edges),
                std::mem::take(&mut source.adjacency),
                std::mem::take(&mut source.neighbors),
            )
        };
        {
            let mut state = self.inner.borrow_mut();
            state.edges.extend(edges);
            for (old_from, tos) in adjacency {
                let entry = state.adjacency.entry(remap[&old_from]).or_default();
                for (old_to, link) in tos {
                    entry.insert(remap[&old_to], link);
                }
            }
            for (old_from, tos) in neighbors {
                let entry = state.neighbors.entry(remap[&old_from]).or_default();
                for (old_to, gif) in tos {
                    entry.insert(remap[&old_to], gif);
                }
            }
        }

        other.invalidate();
        Ok(())
    }

    /// Marks this graph invalidated and severs the ownership cycle by
    /// dropping the vertex set. Edge data stays readable for teardown.
    pub fn invalidate(&self) {
        let mut state = self.inner.borrow_mut();
        state.invalidated = true;
        state.vertices.clear();
    }

    /// Returns true once this graph has been merged away or torn down.
    pub fn invalidated(&self) -> bool {
        self.inner.borrow().invalidated
    }

    /// Returns the number of interfaces currently held.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().vertices.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.borrow().edges.len()
    }

    /// Returns the high-water vertex index. Visited bitmaps are sized to
    /// this, not to `node_count`, because indices are monotonic.
    pub fn vertex_capacity(&self) -> usize {
        self.inner.borrow().next_index
    }

    /// Returns the link between two interfaces, if any.
    pub fn is_connected(&self, from: &GifRef, to: &GifRef) -> Option<LinkRef> {
        self.inner
            .borrow()
            .adjacency
            .get(&from.index())
            .and_then(|tos| tos.get(&to.index()))
            .cloned()
    }

    /// Returns the neighbors of an interface in edge insertion order.
    pub fn gif_edges(&self, gif: &GifRef) -> Vec<GifRef> {
        self.inner
            .borrow()
            .neighbors
            .get(&gif.index())
            .map(|tos| tos.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the labeled adjacency slice of an interface.
    pub fn edges_of(&self, gif: &GifRef) -> Vec<(GifRef, LinkRef)> {
        let state = self.inner.borrow();
        let tos = match state.adjacency.get(&gif.index()) {
            Some(tos) => tos,
            None => return Vec::new(),
        };
        let gifs = state
            .neighbors
            .get(&gif.index())
            .expect("neighbor cache mirrors adjacency cache");
        tos.iter()
            .map(|(to_ix, link)| {
                let to = gifs
                    .get(to_ix)
                    .expect("neighbor cache mirrors adjacency cache")
                    .clone();
                (to, link.clone())
            })
            .collect()
    }

    /// Classic BFS over the neighbor cache.
    ///
    /// Starting from the `start` path, every candidate extension is offered
    /// to `filter` together with the link leading to it; accepted extensions
    /// are enqueued. Returns the set of vertices reached, in visit order.
    pub fn bfs_visit(
        &self,
        mut filter: impl FnMut(&[GifRef], &LinkRef) -> bool,
        start: &[GifRef],
    ) -> Vec<GifRef> {
        let mut visited: IndexSet<usize> = IndexSet::new();
        let mut visited_gifs: Vec<GifRef> = Vec::new();
        let mut queue: VecDeque<Vec<GifRef>> = VecDeque::new();
        queue.push_back(start.to_vec());

        while let Some(path) = queue.pop_front() {
            let current = match path.last() {
                Some(current) => current.clone(),
                None => continue,
            };
            for (next, link) in self.edges_of(&current) {
                if visited.contains(&next.index()) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(next.clone());
                if filter(&next_path, &link) {
                    visited.insert(next.index());
                    visited_gifs.push(next);
                    queue.push_back(next_path);
                }
            }
        }

        visited_gifs
    }

    /// Returns every node anchored into this graph, in vertex order.
    pub fn node_projection(&self) -> Vec<NodeRef> {
        let gifs: Vec<GifRef> = self.inner.borrow().vertices.values().cloned().collect();
        gifs.iter()
            .filter(|gif| gif.kind().is_self_anchor())
            .filter_map(|gif| gif.node())
            .collect()
    }

    /// Returns `(node, full_name)` for every node whose resolved full name
    /// is in the given set.
    pub fn nodes_by_names(&self, names: &HashSet<String>) -> Vec<(NodeRef, String)> {
        self.node_projection()
            .into_iter()
            .filter_map(|node| {
                let full_name = node.full_name(false);
                names.contains(&full_name).then(|| (node, full_name))
            })
            .collect()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Graph")
            .field("vertices", &state.vertices.len())
            .field("edges", &state.edges.len())
            .field("invalidated", &state.invalidated)
            .finish()
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Graph[V:{}, E:{}]>", self.node_count(), self.edge_count())
    }
}

impl GraphState {
    fn alloc_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn insert_edge(&mut self, from: GifRef, to: GifRef, link: LinkRef) {
        let (from_ix, to_ix) = (from.index(), to.index());
        self.neighbors
            .entry(from_ix)
            .or_default()
            .insert(to_ix, to.clone());
        self.neighbors
            .entry(to_ix)
            .or_default()
            .insert(from_ix, from.clone());
        self.adjacency
            .entry(from_ix)
            .or_default()
            .insert(to_ix, link.clone());
        self.adjacency
            .entry(to_ix)
            .or_default()
            .insert(from_ix, link.clone());
        self.edges.push((from, to, link));
    }

    fn remove_edge_entries(&mut self, from_ix: usize, to_ix: usize, link: &LinkRef) {
        if let Some(tos) = self.neighbors.get_mut(&from_ix) {
            tos.shift_remove(&to_ix);
        }
        if let Some(tos) = self.neighbors.get_mut(&to_ix) {
            tos.shift_remove(&from_ix);
        }
        if let Some(tos) = self.adjacency.get_mut(&from_ix) {
            tos.shift_remove(&to_ix);
        }
        if let Some(tos) = self.adjacency.get_mut(&to_ix) {
            tos.shift_remove(&from_ix);
        }
        self.edges.retain(|(_, _, l)| !Rc::ptr_eq(l, link));
    }
}
