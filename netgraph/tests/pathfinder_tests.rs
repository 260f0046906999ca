// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use netgraph::{Error, FilterResult, Link, Node, NodeType, Path, PathFinder, PathLimits};
use fixtures::{
    bus_pair, bus_pair_half_connected, bus_pair_parent_connected, direct_pair, Mif,
};
use std::rc::Rc;

fn names(path: &Path) -> Vec<String> {
    path.vertices()
        .iter()
        .map(|gif| gif.full_name(false))
        .collect()
}

fn assert_no_repeats(path: &Path) {
    for (i, a) in path.vertices().iter().enumerate() {
        for b in &path.vertices()[i + 1..] {
            assert!(!Rc::ptr_eq(a, b), "path repeats a vertex: {:?}", path);
        }
    }
}

#[test]
fn direct_pair_has_one_path() {
    let pair = direct_pair();
    let (paths, counters) = PathFinder::new()
        .find_paths(&pair.a.node, &[pair.b.node.clone()])
        .unwrap();

    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(path.len(), 4);
    assert_eq!(
        names(path),
        vec!["*.self", "*.connected", "*.connected", "*.self"]
    );
    assert!(Rc::ptr_eq(path.first(), pair.a.node.self_gif()));
    assert!(Rc::ptr_eq(path.last(), pair.b.node.self_gif()));
    assert_eq!(path.confidence(), 1.0);
    assert_no_repeats(path);

    // Counters cover the visible filters plus split join and total.
    assert_eq!(counters.last().unwrap().name, "total");
    assert!(counters.iter().any(|c| c.name == "split join"));
    assert!(counters.iter().all(|c| c.name != "count"));
}

#[test]
fn trivial_query_returns_length_one_path() {
    let pair = direct_pair();
    let (paths, _) = PathFinder::new()
        .find_paths(&pair.a.node, &[pair.a.node.clone()])
        .unwrap();

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 1);
    assert!(Rc::ptr_eq(paths[0].first(), pair.a.node.self_gif()));
}

#[test]
fn child_under_a_parent_still_answers_trivially() {
    let single = fixtures::bus("Power", "Electric", &["hv"]);
    let child = &single.children[0].node;

    let (paths, _) = PathFinder::new()
        .find_paths(child, &[child.clone()])
        .unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 1);
    assert_eq!(paths[0].confidence(), 1.0);
}

#[test]
fn empty_destination_set_yields_nothing() {
    let pair = direct_pair();
    let (paths, counters) = PathFinder::new().find_paths(&pair.a.node, &[]).unwrap();
    assert!(paths.is_empty());
    assert!(!counters.is_empty());
}

#[test]
fn non_module_interface_ends_are_rejected() {
    let pair = direct_pair();
    let module = Node::new(NodeType::module("Board")).unwrap();

    let err = PathFinder::new()
        .find_paths(&module, &[pair.b.node.clone()])
        .unwrap_err();
    assert!(matches!(err, Error::SrcNotModuleInterface(_)));

    let err = PathFinder::new()
        .find_paths(&pair.a.node, &[module.clone()])
        .unwrap_err();
    assert!(matches!(err, Error::DstNotModuleInterface(_)));
}

#[test]
fn children_connect_through_connected_parents() {
    let buses = bus_pair_parent_connected();
    let hv1 = &buses.p1.children[0].node;
    let hv2 = &buses.p2.children[0].node;

    let (paths, _) = PathFinder::new()
        .find_paths(hv1, &[hv2.clone()])
        .unwrap();

    // Up into p1, across, down out of p2. No split is opened: the down edge
    // folds against the matching up edge.
    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(path.len(), 10);
    assert_eq!(path.confidence(), 1.0);
    assert!(Rc::ptr_eq(path.last(), hv2.self_gif()));
    assert_no_repeats(path);
}

#[test]
fn parents_connect_only_when_all_children_join() {
    let buses = bus_pair();
    let p1 = &buses.p1.parent.node;
    let p2 = &buses.p2.parent.node;

    let (paths, counters) = PathFinder::new().find_paths(p1, &[p2.clone()]).unwrap();

    // One completed path per child branch, both ending at p2's self anchor,
    // both restored to full confidence with their obligations discharged.
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert!(Rc::ptr_eq(path.first(), p1.self_gif()));
        assert!(Rc::ptr_eq(path.last(), p2.self_gif()));
        assert_eq!(path.confidence(), 1.0);
        assert_no_repeats(path);
    }
    // Both branches are distinct.
    assert_ne!(names(&paths[0]), names(&paths[1]));

    let split_join = counters
        .iter()
        .find(|c| c.name == "split join")
        .expect("split join counter is always present");
    assert_eq!(split_join.out_count, 2);
}

#[test]
fn half_connected_parents_never_complete() {
    let buses = bus_pair_half_connected();
    let p1 = &buses.p1.parent.node;
    let p2 = &buses.p2.parent.node;

    let (paths, counters) = PathFinder::new().find_paths(p1, &[p2.clone()]).unwrap();
    assert!(paths.is_empty());

    // The hv branch registered but its sibling never arrived.
    let split_join = counters
        .iter()
        .find(|c| c.name == "split join")
        .expect("split join counter is always present");
    assert!(split_join.in_count > 0);
    assert_eq!(split_join.out_count, 0);
}

#[test]
fn dead_end_split_is_pruned() {
    let buses = bus_pair_half_connected();
    let p1 = &buses.p1.parent.node;
    let p2 = &buses.p2.parent.node;

    let (_, counters) = PathFinder::new().find_paths(p1, &[p2.clone()]).unwrap();

    // Arriving at p2 through hv and diving back down into lv is the
    // child -> parent -> different-child shape; it must be cut.
    let dead_end = counters
        .iter()
        .find(|c| c.name == "dead end split")
        .expect("dead end split counter is always present");
    assert!(dead_end.out_count < dead_end.in_count);
}

#[test]
fn shallow_links_filter_by_origin_type() {
    // a1(A) -- b1(P) ~~shallow[A]~~ b2(P) -- a2(A)
    let a1 = Mif::new("A");
    let a2 = Mif::new("A");
    let b1 = Mif::new("P");
    let b2 = Mif::new("P");
    a1.connect(&b1);
    b2.connect(&a2);
    b1.connect_with(&b2, Link::direct_shallow(vec![NodeType::module_interface("A")]))
        .expect("neither endpoint is of a filtered type");

    // Paths originating at the filtered type cannot cross the link.
    let (paths, _) = PathFinder::new()
        .find_paths(&a1.node, &[a2.node.clone()])
        .unwrap();
    assert!(paths.is_empty());

    // Differently-typed origins traverse the same link.
    let (paths, _) = PathFinder::new()
        .find_paths(&b1.node, &[b2.node.clone()])
        .unwrap();
    assert_eq!(paths.len(), 1);
}

#[test]
fn shallow_link_rejects_filtered_endpoints_at_construction() {
    let a = Mif::new("A");
    let b = Mif::new("A");
    let err = a
        .connect_with(&b, Link::direct_shallow(vec![NodeType::module_interface("A")]))
        .unwrap_err();
    assert_eq!(err, Error::LinkFiltered);
}

#[test]
fn unrecoverable_conditional_drops_extensions() {
    // a(T) -- m(T) ~~conditional~~ b(T); the predicate passes the
    // degenerate construction check and fails any longer path.
    let a = Mif::new("T");
    let m = Mif::new("T");
    let b = Mif::new("T");
    a.connect(&m);
    m.connect_with(
        &b,
        Link::direct_conditional(
            Rc::new(|path| {
                if path.len() == 2 {
                    FilterResult::Pass
                } else {
                    FilterResult::FailUnrecoverable
                }
            }),
            false,
        ),
    )
    .expect("degenerate check passes");

    let (paths, counters) = PathFinder::new()
        .find_paths(&a.node, &[b.node.clone()])
        .unwrap();
    assert!(paths.is_empty());

    let conditional = counters
        .iter()
        .find(|c| c.name == "conditional link")
        .expect("conditional link counter is always present");
    // Exactly one extension tried to cross the link and was dropped.
    assert_eq!(conditional.in_count - conditional.out_count, 1);
}

#[test]
fn recoverable_conditional_attenuates_confidence() {
    let a = Mif::new("T");
    let m = Mif::new("T");
    let b = Mif::new("T");
    a.connect(&m);
    m.connect_with(
        &b,
        Link::direct_conditional(
            Rc::new(|path| {
                if path.len() == 2 {
                    FilterResult::Pass
                } else {
                    FilterResult::FailRecoverable
                }
            }),
            true,
        ),
    )
    .expect("degenerate check passes");

    let (paths, _) = PathFinder::new()
        .find_paths(&a.node, &[b.node.clone()])
        .unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].confidence(), 0.5);
}

#[test]
fn absolute_limit_stops_the_traversal() {
    let pair = direct_pair();
    let limits = PathLimits {
        absolute: 1,
        ..PathLimits::DEFAULT
    };
    let (paths, counters) = PathFinder::with_limits(limits)
        .find_paths(&pair.a.node, &[pair.b.node.clone()])
        .unwrap();

    // The traversal stops before reaching b, but counters still come back.
    assert!(paths.is_empty());
    assert!(!counters.is_empty());
    assert!(counters.last().unwrap().in_count <= 2);
}

#[test]
fn mismatched_end_types_are_rejected() {
    let x = Mif::new("A");
    let y = Mif::new("B");
    x.connect(&y);

    let (paths, _) = PathFinder::new()
        .find_paths(&x.node, &[y.node.clone()])
        .unwrap();
    assert!(paths.is_empty());
}

#[test]
fn split_paths_show_up_as_weak_in_counters() {
    let buses = bus_pair();
    let (_, counters) = PathFinder::new()
        .find_paths(&buses.p1.parent.node, &[buses.p2.parent.node.clone()])
        .unwrap();

    // The down edges halved confidence inside the build-stack filter, and
    // the weakened paths flowed through the later stages.
    let build_stack = counters
        .iter()
        .find(|c| c.name == "build stack")
        .expect("build stack counter is always present");
    assert!(build_stack.out_weaker >= 2);
    assert!(counters.iter().any(|c| c.weak_in_count > 0));
}

#[test]
fn a_path_finder_can_be_reused() {
    let buses = bus_pair();
    let mut finder = PathFinder::new();

    let (first, _) = finder
        .find_paths(&buses.p1.parent.node, &[buses.p2.parent.node.clone()])
        .unwrap();
    let (second, _) = finder
        .find_paths(&buses.p1.parent.node, &[buses.p2.parent.node.clone()])
        .unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(names(a), names(b));
    }
}

#[test]
fn derived_links_compose_conditionals() {
    // Derive a link from a found path and use it to wire a second pair.
    let pair = direct_pair();
    let (paths, _) = PathFinder::new()
        .find_paths(&pair.a.node, &[pair.b.node.clone()])
        .unwrap();
    let derived = Link::direct_derived(paths[0].vertices()).expect("path edges all exist");

    let c = Mif::new("Power");
    let d = Mif::new("Power");
    c.connect_with(&d, derived)
        .expect("vacuous conjunction passes");

    let (paths, _) = PathFinder::new()
        .find_paths(&c.node, &[d.node.clone()])
        .unwrap();
    assert_eq!(paths.len(), 1);
}

#[test]
fn derived_links_inherit_unrecoverable_predicates() {
    let a = Mif::new("T");
    let b = Mif::new("T");
    a.connect_with(
        &b,
        Link::direct_conditional(Rc::new(|_| FilterResult::FailUnrecoverable), false),
    )
    .expect_err("predicate rejects its own endpoints");

    // Bind a passing conditional instead, derive from the path across it,
    // and check the derived link also evaluates the inherited predicate.
    let link = a
        .connect_with(
            &b,
            Link::direct_conditional(
                Rc::new(|path| {
                    if path.len() <= 4 {
                        FilterResult::Pass
                    } else {
                        FilterResult::FailUnrecoverable
                    }
                }),
                false,
            ),
        )
        .expect("degenerate check passes");
    assert!(link.conditional().is_some());

    let (paths, _) = PathFinder::new()
        .find_paths(&a.node, &[b.node.clone()])
        .unwrap();
    assert_eq!(paths.len(), 1);

    let derived = Link::direct_derived(paths[0].vertices()).expect("path edges all exist");
    let spec = derived.conditional().expect("derived links are conditional");
    let long_path: Vec<_> = paths[0].vertices().to_vec();
    assert_eq!(spec.evaluate(&long_path), FilterResult::Pass);
    let mut longer = long_path.clone();
    longer.extend(long_path.iter().cloned());
    assert_eq!(spec.evaluate(&longer), FilterResult::FailUnrecoverable);
}
