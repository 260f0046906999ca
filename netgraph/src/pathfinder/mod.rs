// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Constrained path enumeration over the connectivity graph.
//!
//! [`PathFinder::find_paths`] roots a breadth-first traversal at the source
//! node's self anchor and pushes every extension through an ordered filter
//! pipeline. Cheap structural rejections run first, the expensive predicate
//! and hierarchy bookkeeping last. Paths that cross down into multi-child
//! parents pick up split obligations tracked by the split registry; only
//! paths whose obligations all resolved are returned.

use crate::graph::{GifRef, GraphInterface, InterfaceKind, NodeRef};
use crate::Error;
use indexmap::IndexSet;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

mod bfs;
mod counter;
mod split;

pub use counter::Counter;

use bfs::{bfs_visit, BfsPath, PathStackElement, UnresolvedStackElement};
use counter::Filter;
use split::SplitRegistry;

/// Exploration bounds for a query.
///
/// `absolute` caps the number of explored paths outright. The two heuristic
/// thresholds trim split handling once exploration gets expensive: past
/// `no_new_weak` explored paths, extensions that would open a new split are
/// dropped; past `no_weak`, paths already carrying splits are dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PathLimits {
    /// Hard cap on explored paths; reaching it stops the traversal.
    pub absolute: usize,
    /// Past this many explored paths, split-carrying paths are dropped.
    pub no_weak: usize,
    /// Past this many explored paths, no new splits are opened.
    pub no_new_weak: usize,
}

impl PathLimits {
    /// The default bounds.
    pub const DEFAULT: Self = Self {
        absolute: 1 << 31,
        no_weak: 100_000,
        no_new_weak: 10_000,
    };
}

impl Default for PathLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A completed path between two module interfaces.
#[derive(Clone)]
pub struct Path {
    vertices: Vec<GifRef>,
    confidence: f64,
}

impl Path {
    fn from_bfs(path: &BfsPath) -> Self {
        Self {
            vertices: path.vertices().to_vec(),
            confidence: path.confidence,
        }
    }

    /// The ordered vertex list.
    pub fn vertices(&self) -> &[GifRef] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true for zero-length paths (never produced by queries).
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The starting vertex.
    pub fn first(&self) -> &GifRef {
        self.vertices.first().expect("paths are never empty")
    }

    /// The final vertex.
    pub fn last(&self) -> &GifRef {
        self.vertices.last().expect("paths are never empty")
    }

    /// Confidence at the end of the query: 1.0 unless obligations remained.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .vertices
            .iter()
            .map(|gif| gif.full_name(false))
            .collect();
        f.debug_struct("Path")
            .field("vertices", &names)
            .field("confidence", &self.confidence)
            .finish()
    }
}

/// Enumerates valid paths between module interfaces.
pub struct PathFinder {
    limits: PathLimits,
    path_count: usize,
    registry: SplitRegistry,
    wake: Rc<RefCell<VecDeque<BfsPath>>>,
}

impl PathFinder {
    /// Creates a path finder with default limits.
    pub fn new() -> Self {
        Self::with_limits(PathLimits::DEFAULT)
    }

    /// Creates a path finder with the given limits.
    pub fn with_limits(limits: PathLimits) -> Self {
        Self {
            limits,
            path_count: 0,
            registry: SplitRegistry::new(),
            wake: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Enumerates paths from `src` to the given destinations.
    ///
    /// Both ends must be module interfaces. Returns the surviving complete
    /// paths together with the per-filter counters of the query; an empty
    /// destination list yields an empty result. Reaching every destination
    /// ends the traversal early.
    pub fn find_paths(
        &mut self,
        src: &NodeRef,
        dst: &[NodeRef],
    ) -> Result<(Vec<Path>, Vec<Counter>), Error> {
        if !src.is_module_interface() {
            return Err(Error::SrcNotModuleInterface(src.full_name(true)));
        }
        for d in dst {
            if !d.is_module_interface() {
                return Err(Error::DstNotModuleInterface(d.full_name(true)));
            }
        }

        self.path_count = 0;
        self.registry = SplitRegistry::new();
        self.wake = Rc::new(RefCell::new(VecDeque::new()));
        let wake = Rc::clone(&self.wake);

        let mut filters = Self::pipeline();
        let mut total = Counter::new("total");
        let dst_ixs: IndexSet<usize> = dst.iter().map(|d| d.self_gif().index()).collect();
        let mut remaining = dst_ixs.clone();
        let mut direct: Vec<BfsPath> = Vec::new();

        bfs_visit(src.self_gif(), &wake, |path| {
            let passed = total.measure(path, |p| {
                for filter in filters.iter_mut() {
                    if !filter.exec(self, p) {
                        return false;
                    }
                }
                true
            });
            if !passed {
                return;
            }
            // Shortcut once every destination has a path.
            if remaining.shift_remove(&path.last().index()) && remaining.is_empty() {
                path.stop = true;
            }
            direct.push(path.clone());
        });

        let resolved = self.registry.drain_resolved();

        let mut counters: Vec<Counter> = filters
            .iter()
            .filter(|filter| !filter.counter.hide)
            .map(|filter| filter.counter.clone())
            .collect();
        counters.push(self.registry.counter.clone());
        counters.push(total);

        let paths: Vec<Path> = direct
            .into_iter()
            .chain(resolved)
            .filter(|path| !path.data().not_complete)
            .filter(|path| dst_ixs.contains(&path.last().index()))
            .map(|path| Path::from_bfs(&path))
            .collect();

        tracing::debug!(
            target: "netgraph::pathfinder",
            searched = self.path_count,
            found = paths.len(),
            "path query finished"
        );
        Ok((paths, counters))
    }

    fn pipeline() -> Vec<Filter> {
        vec![
            Filter::new(Self::filter_count, true, Counter::hidden("count")),
            Filter::new(Self::filter_path_by_node_type, true, Counter::new("node type")),
            Filter::new(Self::filter_path_gif_type, true, Counter::new("gif type")),
            Filter::new(
                Self::filter_path_by_dead_end_split,
                true,
                Counter::new("dead end split"),
            ),
            Filter::new(
                Self::filter_conditional_link,
                true,
                Counter::new("conditional link"),
            ),
            Filter::new(Self::filter_build_path_stack, false, Counter::new("build stack")),
            Filter::new(
                Self::filter_path_by_end_in_self_gif,
                false,
                Counter::new("end in self gif"),
            ),
            Filter::new(
                Self::filter_path_same_end_type,
                false,
                Counter::new("same end type"),
            ),
            Filter::new(Self::filter_path_by_stack, false, Counter::new("stack resolved")),
            Filter::new(
                Self::filter_valid_split_branch,
                false,
                Counter::new("valid split branch"),
            ),
        ]
    }

    // ---
    // Pipeline filters, in execution order
    // ---

    fn filter_count(&mut self, path: &mut BfsPath) -> bool {
        self.path_count += 1;
        if self.path_count % 50_000 == 0 {
            tracing::debug!(
                target: "netgraph::pathfinder",
                path_count = self.path_count,
                "exploration progress"
            );
        }
        if self.path_count > self.limits.absolute {
            path.stop = true;
        }
        true
    }

    fn filter_path_by_node_type(&mut self, path: &mut BfsPath) -> bool {
        path.last()
            .node()
            .map_or(false, |node| node.is_module_interface())
    }

    fn filter_path_gif_type(&mut self, path: &mut BfsPath) -> bool {
        matches!(
            path.last().kind(),
            InterfaceKind::SelfAnchor
                | InterfaceKind::Hierarchical { .. }
                | InterfaceKind::HierarchicalModuleSpecial { .. }
                | InterfaceKind::ModuleConnection
        )
    }

    /// Rejects the child -> parent -> different-child pattern: such paths
    /// were already explored through the parent's other child and cannot
    /// contribute a join.
    fn filter_path_by_dead_end_split(&mut self, path: &mut BfsPath) -> bool {
        let (one, two, three) = match path.last_tri_edge() {
            Some(tri) => tri,
            None => return true,
        };
        match (one.is_parent(), two.is_parent(), three.is_parent()) {
            (Some(false), Some(true), Some(false)) => false,
            _ => true,
        }
    }

    fn filter_conditional_link(&mut self, path: &mut BfsPath) -> bool {
        let vertices = path.vertices().to_vec();
        let count = vertices.len();
        for (i, pair) in vertices.windows(2).enumerate() {
            let link = match path.link_of(&pair[0], &pair[1]) {
                Some(link) => link,
                None => continue,
            };
            let spec = match link.conditional() {
                Some(spec) => spec,
                None => continue,
            };
            if spec.first_only() && i + 2 != count {
                continue;
            }
            match spec.evaluate(&vertices) {
                crate::graph::FilterResult::Pass => {}
                crate::graph::FilterResult::FailRecoverable => {
                    path.confidence *= 0.5;
                }
                crate::graph::FilterResult::FailUnrecoverable => return false,
            }
        }
        true
    }

    /// Folds the newest hierarchy crossing into the unresolved stack and
    /// opens split obligations. Always passes; it exists for its side
    /// effect, and for the exploration trims past the weak limits.
    fn filter_build_path_stack(&mut self, path: &mut BfsPath) -> bool {
        let elem = match Self::last_hierarchy_crossing(path) {
            Some(elem) => elem,
            None => return true,
        };

        let (carrying_splits, matches_top, popped_split) = {
            let data = path.data();
            let matches_top = data
                .unresolved_stack
                .last()
                .map_or(false, |top| top.matches(&elem));
            let popped_split = matches_top && data.unresolved_stack.last().unwrap().split;
            (!data.split_stack.is_empty(), matches_top, popped_split)
        };

        if self.path_count > self.limits.no_weak && carrying_splits {
            path.filtered = true;
            return false;
        }

        let would_split = !matches_top && elem.is_split_event() && self.multi_child_parent(&elem);
        if would_split && self.path_count > self.limits.no_new_weak {
            path.filtered = true;
            return false;
        }

        {
            let mut data = path.data_mut();
            if matches_top {
                data.unresolved_stack.pop();
                if popped_split {
                    data.split_stack.push(elem);
                }
            } else {
                data.unresolved_stack.push(UnresolvedStackElement {
                    elem: elem.clone(),
                    split: would_split,
                });
                if would_split {
                    data.split_stack.push(elem);
                    data.not_complete = true;
                }
            }
        }
        if would_split {
            path.confidence *= 0.5;
        }
        true
    }

    fn filter_path_by_end_in_self_gif(&mut self, path: &mut BfsPath) -> bool {
        path.last().kind().is_self_anchor()
    }

    fn filter_path_same_end_type(&mut self, path: &mut BfsPath) -> bool {
        let first = path.first().node();
        let last = path.last().node();
        match (first, last) {
            (Some(first), Some(last)) => first.node_type() == last.node_type(),
            _ => false,
        }
    }

    fn filter_path_by_stack(&mut self, path: &mut BfsPath) -> bool {
        path.data().unresolved_stack.is_empty()
    }

    /// Runs split-carrying paths through the registry. Such paths never
    /// become direct results; they surface once their cohort completes.
    fn filter_valid_split_branch(&mut self, path: &mut BfsPath) -> bool {
        if path.data().split_stack.is_empty() {
            return true;
        }
        let wakes = self.registry.process(path);
        if !wakes.is_empty() {
            let mut wake = self.wake.borrow_mut();
            wake.extend(wakes);
        }
        false
    }

    // ---
    // Helper methods
    // ---

    /// Extracts a stack element when the newest edge crosses the hierarchy.
    fn last_hierarchy_crossing(path: &BfsPath) -> Option<PathStackElement> {
        let (from, to) = path.last_edge()?;
        let up = GraphInterface::is_uplink(from, to);
        if !up && !GraphInterface::is_downlink(from, to) {
            return None;
        }
        let (child_gif, parent_gif) = if up { (from, to) } else { (to, from) };
        let link = path.link_of(from, to)?;
        let name = link.child_name()?.to_string();
        let parent_type = parent_gif.node()?.node_type().clone();
        let child_type = child_gif.node()?.node_type().clone();
        Some(PathStackElement {
            parent_type,
            child_type,
            parent_gif: parent_gif.clone(),
            name,
            up,
        })
    }

    /// True if the split parent has more than one module-interface child.
    fn multi_child_parent(&self, elem: &PathStackElement) -> bool {
        let node = match elem.parent_gif.node() {
            Some(node) => node,
            None => return false,
        };
        node.children(crate::graph::ChildQuery {
            direct_only: true,
            categories: Some(&[crate::graph::NodeCategory::ModuleInterface]),
            ..Default::default()
        })
        .len()
            > 1
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}
