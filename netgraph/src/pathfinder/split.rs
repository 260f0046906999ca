// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Split/join obligation tracking.
//!
//! A path that crossed down into a multi-child parent carries a split
//! obligation: the same suffix must be reachable through every sibling
//! branch of that parent before the path counts as complete. The registry
//! tracks those obligations per split point, hibernates branches that arrive
//! early, and flips whole cohorts to complete once the last sibling shows up.

use crate::graph::{ChildQuery, GifRef, NodeCategory, NodeRef};
use crate::pathfinder::bfs::{BfsPath, PathStackElement};
use crate::pathfinder::counter::Counter;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use std::time::Instant;

/// A split point is identified by the path prefix up to and including the
/// parent vertex where the path split.
type SplitKey = Vec<usize>;

/// Obligation state for one split point.
struct SplitState {
    /// Module-interface children of the split parent; all of them must be
    /// covered for an end vertex before the cohort completes.
    children: Vec<NodeRef>,
    /// end vertex -> child self-anchor index -> registered suffix paths.
    branches: IndexMap<usize, IndexMap<usize, Vec<BfsPath>>>,
    /// Hibernated paths, FIFO per child, so the first path to discover a
    /// split is also the first to complete.
    waiting: IndexMap<usize, VecDeque<BfsPath>>,
    /// End vertices whose obligation has already been proven; later arrivals
    /// with these ends complete individually.
    completed_ends: IndexSet<usize>,
}

impl SplitState {
    fn new(parent_gif: &GifRef) -> Option<Self> {
        let parent_node = parent_gif.node()?;
        let children = parent_node.children(ChildQuery {
            direct_only: true,
            categories: Some(&[NodeCategory::ModuleInterface]),
            ..ChildQuery::default()
        });
        Some(Self {
            children,
            branches: IndexMap::new(),
            waiting: IndexMap::new(),
            completed_ends: IndexSet::new(),
        })
    }

    fn register(&mut self, end_ix: usize, child_ix: usize, path: &BfsPath) {
        self.branches
            .entry(end_ix)
            .or_default()
            .entry(child_ix)
            .or_default()
            .push(path.clone());
    }

    /// True once every child has at least one registered path with this end.
    fn complete_for(&self, end_ix: usize) -> bool {
        let group = match self.branches.get(&end_ix) {
            Some(group) => group,
            None => return false,
        };
        self.children.iter().all(|child| {
            group
                .get(&child.self_gif().index())
                .map_or(false, |paths| !paths.is_empty())
        })
    }

    /// Pops the oldest hibernated path waiting under any child other than
    /// `except_child_ix`.
    fn pop_waiting(&mut self, except_child_ix: usize) -> Option<BfsPath> {
        for (child_ix, queue) in self.waiting.iter_mut() {
            if *child_ix == except_child_ix {
                continue;
            }
            if let Some(path) = queue.pop_front() {
                return Some(path);
            }
        }
        None
    }
}

/// Discharges one path: clears its obligations through the shared data and
/// restores its confidence.
fn discharge(path: &mut BfsPath) {
    {
        let mut data = path.shared_data_mut();
        data.not_complete = false;
        data.split_stack.clear();
    }
    path.confidence = 1.0;
    path.hibernated = false;
}

/// Registry of all split states seen during one query.
pub(crate) struct SplitRegistry {
    states: IndexMap<SplitKey, SplitState>,
    resolved: Vec<BfsPath>,
    pub(crate) counter: Counter,
}

impl SplitRegistry {
    pub(crate) fn new() -> Self {
        Self {
            states: IndexMap::new(),
            resolved: Vec::new(),
            counter: Counter::new("split join"),
        }
    }

    /// Handles a structurally balanced path that still carries split
    /// obligations. Registers it at every split point, hibernates it if any
    /// obligation is open, and discharges whole cohorts on completion.
    ///
    /// Returns paths to re-inject into the BFS queue.
    pub(crate) fn process(&mut self, path: &mut BfsPath) -> Vec<BfsPath> {
        let start = Instant::now();
        let split_events: Vec<PathStackElement> = path
            .data()
            .split_stack
            .iter()
            .filter(|elem| elem.is_split_event())
            .cloned()
            .collect();
        let end_ix = path.last().index();
        let mut wakes = Vec::new();
        let mut all_complete = !split_events.is_empty();
        let mut outermost_key = None;

        // Innermost split first; the outermost decides cohort completion.
        for elem in split_events.iter().rev() {
            let (key, child_ix) = match self.locate(path, elem) {
                Some(found) => found,
                None => {
                    all_complete = false;
                    break;
                }
            };
            let state = match self.states.entry(key.clone()) {
                indexmap::map::Entry::Occupied(entry) => entry.into_mut(),
                indexmap::map::Entry::Vacant(entry) => {
                    match SplitState::new(&elem.parent_gif) {
                        Some(state) => entry.insert(state),
                        None => {
                            all_complete = false;
                            break;
                        }
                    }
                }
            };

            self.counter.in_count += 1;
            if state.completed_ends.contains(&end_ix) {
                // The sibling obligation for this end is already proven;
                // this late arrival completes on its own.
                continue;
            }

            state.register(end_ix, child_ix, path);

            if state.complete_for(end_ix) {
                outermost_key = Some(key);
                continue;
            }

            all_complete = false;
            if !path.woken {
                path.hibernated = true;
                state
                    .waiting
                    .entry(child_ix)
                    .or_default()
                    .push_back(path.clone());
                if let Some(mut awoken) = state.pop_waiting(child_ix) {
                    awoken.hibernated = false;
                    awoken.woken = true;
                    wakes.push(awoken);
                }
            }
            break;
        }

        if all_complete {
            if let Some(key) = outermost_key {
                wakes.extend(self.discharge_cohort(&key, end_ix));
            } else {
                // Every split point had this end proven already.
                let mut completed = path.clone();
                discharge(&mut completed);
                self.counter.out_count += 1;
                self.resolved.push(completed);
            }
        }

        self.counter.time_spent += start.elapsed();
        wakes
    }

    /// Returns every path whose obligations resolved during the traversal.
    pub(crate) fn drain_resolved(&mut self) -> Vec<BfsPath> {
        std::mem::take(&mut self.resolved)
    }

    fn locate(&self, path: &BfsPath, elem: &PathStackElement) -> Option<(SplitKey, usize)> {
        let parent_pos = path.index_of(&elem.parent_gif)?;
        let child_gif = path.vertices().get(parent_pos + 1)?;
        let child_ix = child_gif.node()?.self_gif().index();
        let key: SplitKey = path.vertices()[..=parent_pos]
            .iter()
            .map(|gif| gif.index())
            .collect();
        Some((key, child_ix))
    }

    /// Flips every path registered at the topmost split for this end to
    /// complete, and releases its hibernated siblings.
    fn discharge_cohort(&mut self, key: &SplitKey, end_ix: usize) -> Vec<BfsPath> {
        let mut wakes = Vec::new();
        let state = match self.states.get_mut(key) {
            Some(state) => state,
            None => return wakes,
        };
        state.completed_ends.insert(end_ix);

        if let Some(group) = state.branches.shift_remove(&end_ix) {
            for (_, paths) in group {
                for mut path in paths {
                    discharge(&mut path);
                    self.counter.out_count += 1;
                    self.resolved.push(path);
                }
            }
        }
        for (_, queue) in state.waiting.iter_mut() {
            let mut keep = VecDeque::new();
            while let Some(mut waiting) = queue.pop_front() {
                if waiting.last().index() == end_ix {
                    waiting.hibernated = false;
                    waiting.woken = true;
                    // Its registered twin was discharged above; this copy
                    // only resumes expansion.
                    discharge(&mut waiting);
                    wakes.push(waiting);
                } else {
                    keep.push_back(waiting);
                }
            }
            *queue = keep;
        }
        wakes
    }
}
