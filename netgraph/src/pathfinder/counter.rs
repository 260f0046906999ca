// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::pathfinder::bfs::BfsPath;
use crate::pathfinder::PathFinder;
use std::time::{Duration, Instant};

/// Per-filter cost and effect accounting.
///
/// One counter is returned per visible pipeline filter, plus one for the
/// split/join resolution and a total for the whole pipeline, so callers can
/// attribute the cost of a query.
#[derive(Clone, Debug)]
pub struct Counter {
    /// Filter name as it appears in query output.
    pub name: &'static str,
    /// Paths offered to the filter.
    pub in_count: usize,
    /// Offered paths that were already weak (confidence below 1).
    pub weak_in_count: usize,
    /// Paths that passed.
    pub out_count: usize,
    /// Paths whose confidence dropped inside the filter.
    pub out_weaker: usize,
    /// Paths whose confidence rose inside the filter.
    pub out_stronger: usize,
    /// Wall-clock time spent inside the filter.
    pub time_spent: Duration,
    pub(crate) hide: bool,
}

impl Counter {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            in_count: 0,
            weak_in_count: 0,
            out_count: 0,
            out_weaker: 0,
            out_stronger: 0,
            time_spent: Duration::ZERO,
            hide: false,
        }
    }

    pub(crate) fn hidden(name: &'static str) -> Self {
        let mut counter = Self::new(name);
        counter.hide = true;
        counter
    }

    /// Runs `body` over `path`, recording cost and confidence movement.
    pub(crate) fn measure(
        &mut self,
        path: &mut BfsPath,
        body: impl FnOnce(&mut BfsPath) -> bool,
    ) -> bool {
        self.in_count += 1;
        let confidence_pre = path.confidence;
        if confidence_pre < 1.0 {
            self.weak_in_count += 1;
        }

        let start = Instant::now();
        let passed = body(path);
        self.time_spent += start.elapsed();

        if passed {
            self.out_count += 1;
        }
        if path.confidence < confidence_pre {
            self.out_weaker += 1;
        } else if path.confidence > confidence_pre {
            self.out_stronger += 1;
        }
        passed
    }
}

pub(crate) type FilterFn = fn(&mut PathFinder, &mut BfsPath) -> bool;

/// One stage of the filter pipeline.
pub(crate) struct Filter {
    pub(crate) func: FilterFn,
    /// Discovery filters suppress further expansion on failure, not just
    /// result emission.
    pub(crate) discovery: bool,
    pub(crate) counter: Counter,
}

impl Filter {
    pub(crate) fn new(func: FilterFn, discovery: bool, counter: Counter) -> Self {
        Self {
            func,
            discovery,
            counter,
        }
    }

    pub(crate) fn exec(&mut self, pf: &mut PathFinder, path: &mut BfsPath) -> bool {
        let func = self.func;
        let passed = self.counter.measure(path, |p| func(pf, p));
        if !passed && self.discovery {
            path.filtered = true;
        }
        passed
    }
}
