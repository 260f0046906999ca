// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![cfg(feature = "proptest1")]

use netgraph::PathFinder;
use fixtures::{bus, Mif};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;

proptest! {
    // Whatever sequence of connects is applied, the two edge caches stay
    // mirror images of each other, and tearing the edges down restores the
    // pre-edge state.
    #[test]
    fn edge_caches_stay_symmetric(ops in vec((0usize..6, 0usize..6), 1..32)) {
        let mifs: Vec<Mif> = (0..6).map(|_| Mif::new("T")).collect();

        // Later connects between the same endpoints replace earlier links.
        let mut final_links = HashMap::new();
        for (i, j) in ops {
            if i == j {
                continue;
            }
            let link = mifs[i].connect(&mifs[j]);
            let key = (i.min(j), i.max(j));
            final_links.insert(key, link);
        }

        for i in 0..6 {
            for j in 0..6 {
                if i == j {
                    continue;
                }
                let forward = mifs[i].connected.is_connected(&mifs[j].connected);
                let backward = mifs[j].connected.is_connected(&mifs[i].connected);
                prop_assert_eq!(forward.is_some(), backward.is_some());
                if let (Some(forward), Some(backward)) = (forward, backward) {
                    prop_assert!(Rc::ptr_eq(&forward, &backward));
                    let key = (i.min(j), i.max(j));
                    prop_assert!(Rc::ptr_eq(&forward, &final_links[&key]));
                }
            }
        }

        for (key, link) in &final_links {
            mifs[key.0]
                .node
                .graph()
                .remove_edge(link)
                .expect("final link is present");
        }
        for (i, mif) in mifs.iter().enumerate() {
            // Only the three star edges per node survive.
            prop_assert_eq!(mif.node.graph().edge_count() % 3, 0);
            for other in &mifs[i + 1..] {
                prop_assert!(mif.connected.is_connected(&other.connected).is_none());
            }
        }
    }

    // Parent-to-parent queries over fully connected buses return complete,
    // repeat-free, full-confidence paths regardless of the child count.
    #[test]
    fn bus_queries_return_complete_paths(child_count in 1usize..4) {
        let names: Vec<String> = (0..child_count).map(|i| format!("c{}", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(|name| name.as_str()).collect();
        let p1 = bus("Power", "Electric", &name_refs);
        let p2 = bus("Power", "Electric", &name_refs);
        for (c1, c2) in p1.children.iter().zip(p2.children.iter()) {
            c1.connect(c2);
        }

        let (paths, _) = PathFinder::new()
            .find_paths(&p1.parent.node, &[p2.parent.node.clone()])
            .unwrap();

        prop_assert_eq!(paths.len(), child_count);
        for path in &paths {
            prop_assert_eq!(path.confidence(), 1.0);
            let first_type = path.first().node().unwrap().node_type().clone();
            let last_type = path.last().node().unwrap().node_type().clone();
            prop_assert_eq!(first_type, last_type);
            for (i, a) in path.vertices().iter().enumerate() {
                for b in &path.vertices()[i + 1..] {
                    prop_assert!(!Rc::ptr_eq(a, b));
                }
            }
        }
    }
}
