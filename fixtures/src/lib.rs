// Copyright (c) The netgraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test fixtures for netgraph: canned designs and small builder helpers.

use netgraph::{
    Error, GifRef, GraphInterface, InterfaceKind, LinkRef, Node, NodeRef, NodeType,
};

/// A module-interface node together with its `connected` attachment point.
pub struct Mif {
    /// The node itself.
    pub node: NodeRef,
    /// The module-connection interface carrying direct links to peers.
    pub connected: GifRef,
}

impl Mif {
    /// Creates a detached module interface of the given granular type.
    pub fn new(type_name: &str) -> Self {
        let node = Node::new(NodeType::module_interface(type_name)).expect("node wiring succeeds");
        let connected = GraphInterface::named(InterfaceKind::ModuleConnection, "connected");
        node.attach_interface(&connected)
            .expect("fresh interface attaches");
        Self { node, connected }
    }

    /// Creates a module interface attached under `parent` with `name`.
    pub fn new_child(type_name: &str, parent: &NodeRef, name: &str) -> Self {
        let mif = Self::new(type_name);
        mif.node
            .attach_to(parent, name)
            .expect("fresh child attaches");
        mif
    }

    /// Connects two module interfaces with a direct link.
    pub fn connect(&self, other: &Mif) -> LinkRef {
        self.connected
            .connect(&other.connected)
            .expect("direct connect succeeds")
    }

    /// Connects two module interfaces with the supplied link.
    pub fn connect_with(&self, other: &Mif, link: LinkRef) -> Result<LinkRef, Error> {
        self.connected.connect_with(&other.connected, link)
    }
}

/// A bus: a module-interface node with named module-interface children.
pub struct Bus {
    /// The parent interface.
    pub parent: Mif,
    /// Children, in declaration order.
    pub children: Vec<Mif>,
}

/// Builds a bus of type `bus_type` with one child of type `child_type` per
/// entry in `child_names`.
pub fn bus(bus_type: &str, child_type: &str, child_names: &[&str]) -> Bus {
    let parent = Mif::new(bus_type);
    let children = child_names
        .iter()
        .map(|name| Mif::new_child(child_type, &parent.node, name))
        .collect();
    Bus { parent, children }
}

/// Two same-typed module interfaces connected by a direct link.
pub struct DirectPair {
    /// Source side.
    pub a: Mif,
    /// Destination side.
    pub b: Mif,
    /// The connecting link.
    pub link: LinkRef,
}

/// The smallest connected design: two `Power` interfaces, one direct link.
pub fn direct_pair() -> DirectPair {
    let a = Mif::new("Power");
    let b = Mif::new("Power");
    let link = a.connect(&b);
    DirectPair { a, b, link }
}

/// Two same-typed buses whose children are connected pairwise.
pub struct BusPair {
    /// First bus.
    pub p1: Bus,
    /// Second bus.
    pub p2: Bus,
}

/// Builds two `Power` buses with `hv`/`lv` children and connects the
/// children pairwise. A parent-to-parent query must complete through both
/// child branches.
pub fn bus_pair() -> BusPair {
    let p1 = bus("Power", "Electric", &["hv", "lv"]);
    let p2 = bus("Power", "Electric", &["hv", "lv"]);
    for (c1, c2) in p1.children.iter().zip(p2.children.iter()) {
        c1.connect(c2);
    }
    BusPair { p1, p2 }
}

/// Builds two `Power` buses with `hv`/`lv` children where only the `hv`
/// children are connected; the parent-to-parent obligation can never
/// complete.
pub fn bus_pair_half_connected() -> BusPair {
    let p1 = bus("Power", "Electric", &["hv", "lv"]);
    let p2 = bus("Power", "Electric", &["hv", "lv"]);
    p1.children[0].connect(&p2.children[0]);
    BusPair { p1, p2 }
}

/// Builds two `Power` buses connected only at the parent level. Child-level
/// connectivity is derivable by crossing up into the first parent and back
/// down out of the second, without opening any split.
pub fn bus_pair_parent_connected() -> BusPair {
    let p1 = bus("Power", "Electric", &["hv", "lv"]);
    let p2 = bus("Power", "Electric", &["hv", "lv"]);
    p1.parent.connect(&p2.parent);
    BusPair { p1, p2 }
}
