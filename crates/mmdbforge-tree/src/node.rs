//! The in-memory search tree
//!
//! Nodes live in an arena and link to each other by index. Each node holds
//! exactly two records, selected by the next bit of the address being
//! walked. `Node` and `FixedNode` links own their subtree; an `Alias` link
//! is a non-owning cross-reference into a subtree that some owning path
//! also reaches, which is how the IPv4 space shows up at several places in
//! an IPv6 tree without being stored twice.
//!
//! Insertion walks top-down, splitting terminal records as needed and
//! resolving value collisions through a caller-supplied merge function.
//! Finalization walks bottom-up, collapsing subtrees whose two records
//! became identical and assigning each surviving node its number in the
//! serialization order.

use std::net::{Ipv4Addr, Ipv6Addr};

use mmdbforge_data::DataValue;

use crate::error::TreeError;

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The arena slot this id refers to.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One of the two slots in a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// No data for this subtree
    Empty,
    /// Leaf holding the value for this subtree
    Data(DataValue),
    /// Interior link, descend for refinement
    Node(NodeId),
    /// Interior link that finalize numbers but never collapses into its
    /// parent
    FixedNode(NodeId),
    /// Non-owning cross-link to a subtree owned elsewhere; read-only for
    /// insert and finalize, followed transparently by lookup
    Alias(NodeId),
    /// No user data may be placed here
    Reserved,
}

/// A tree node: two records indexed by the next address bit.
#[derive(Debug, Clone)]
pub struct Node {
    children: [Record; 2],
    node_num: Option<u32>,
}

impl Node {
    fn new() -> Self {
        Node {
            children: [Record::Empty, Record::Empty],
            node_num: None,
        }
    }

    /// The record selected by `bit` (0 = left, 1 = right).
    pub fn record(&self, bit: u8) -> &Record {
        &self.children[usize::from(bit)]
    }

    /// Both records, left first.
    pub fn records(&self) -> &[Record; 2] {
        &self.children
    }

    /// The node's serialization number, assigned by finalize.
    pub fn node_num(&self) -> Option<u32> {
        self.node_num
    }
}

/// Target kind for an insertion.
///
/// `Data` runs the caller's merge function at each terminating leaf. The
/// structural kinds stamp seeding records (fixed subtrees, aliases,
/// reserved ranges) and ignore the merge function.
#[derive(Debug, Clone, Copy)]
pub enum InsertKind {
    /// Insert a data value through the merge function
    Data,
    /// Stamp a fixed interior node that pruning must not collapse
    Fixed(NodeId),
    /// Stamp a non-owning alias to the given node
    Alias(NodeId),
    /// Stamp a reserved record
    Reserved,
}

/// Caller-supplied collision resolver.
///
/// Receives the value currently stored at a terminating leaf (if any) and
/// returns the value to store, or `None` to leave the leaf empty. Called
/// once per terminating leaf; an insertion that is broader than existing
/// structure terminates at every leaf it covers.
pub type MergeFn<'a> = dyn Fn(Option<DataValue>) -> Result<Option<DataValue>, String> + 'a;

/// Bit of a packed address at `depth`, most significant bit first.
#[inline]
pub fn bit_at(ip: &[u8], depth: usize) -> u8 {
    (ip[depth / 8] >> (7 - (depth % 8))) & 1
}

/// Binary search tree over IP address bits, arena-backed.
#[derive(Debug)]
pub struct PrefixTree {
    nodes: Vec<Node>,
    bit_width: u32,
}

impl PrefixTree {
    /// The root node's id.
    pub const ROOT: NodeId = NodeId(0);

    /// Create an empty tree over addresses of `bit_width` bits (32 for an
    /// IPv4 tree, 128 for IPv6).
    pub fn new(bit_width: u32) -> Self {
        PrefixTree {
            nodes: vec![Node::new()],
            bit_width,
        }
    }

    /// The address width this tree was created with.
    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Number of arena slots, live or not. Validation walks this range.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a detached node, used when seeding fixed and aliased
    /// subtrees.
    pub fn alloc_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new());
        id
    }

    /// The node at `id`.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Insert the network `ip`/`prefix_len`.
    ///
    /// `ip` is packed big-endian and must match the tree's bit width. The
    /// merge function is consulted only for [`InsertKind::Data`]. A failed
    /// insert may leave records split along the descent path; callers that
    /// need the previous state discard the tree on error.
    pub fn insert(
        &mut self,
        ip: &[u8],
        prefix_len: u32,
        kind: InsertKind,
        merge: &MergeFn,
    ) -> Result<(), TreeError> {
        debug_assert_eq!(ip.len() * 8, self.bit_width as usize);
        debug_assert!(prefix_len <= self.bit_width);
        self.insert_at(Self::ROOT, ip, prefix_len, kind, merge, 0)
    }

    fn insert_at(
        &mut self,
        id: NodeId,
        ip: &[u8],
        prefix_len: u32,
        kind: InsertKind,
        merge: &MergeFn,
        depth: u32,
    ) -> Result<(), TreeError> {
        let new_depth = depth + 1;

        // Already inside the network: the data applies to every leaf below
        // this node, so descend into both children. Finalize prunes the
        // duplicates this creates.
        if new_depth > prefix_len {
            self.insert_record(id, 0, ip, prefix_len, kind, merge, new_depth)?;
            return self.insert_record(id, 1, ip, prefix_len, kind, merge, new_depth);
        }

        let pos = bit_at(ip, depth as usize);
        self.insert_record(id, pos, ip, prefix_len, kind, merge, new_depth)
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_record(
        &mut self,
        id: NodeId,
        pos: u8,
        ip: &[u8],
        prefix_len: u32,
        kind: InsertKind,
        merge: &MergeFn,
        new_depth: u32,
    ) -> Result<(), TreeError> {
        let child = match &self.nodes[id.index()].children[usize::from(pos)] {
            Record::Node(child) | Record::FixedNode(child) => *child,
            Record::Empty | Record::Data(_) => {
                if new_depth >= prefix_len {
                    return self.terminate_record(id, pos, kind, merge);
                }
                // Split: both branches start out as copies of the current
                // record, then the branch the network covers is refined.
                let split = self.alloc_node();
                let slot = &mut self.nodes[id.index()].children[usize::from(pos)];
                let current = std::mem::replace(slot, Record::Node(split));
                self.nodes[split.index()].children = [current.clone(), current];
                split
            }
            Record::Reserved => {
                if prefix_len >= new_depth {
                    return Err(TreeError::InsertIntoReserved(format_cidr(ip, prefix_len)));
                }
                // A broader network containing the reserved subtree leaves
                // it intact.
                return Ok(());
            }
            Record::Alias(_) => {
                if prefix_len < new_depth {
                    // A broader network containing an aliased subtree.
                    return Ok(());
                }
                return Err(TreeError::InsertIntoAlias(format_cidr(ip, prefix_len)));
            }
        };

        self.insert_at(child, ip, prefix_len, kind, merge, new_depth)
    }

    fn terminate_record(
        &mut self,
        id: NodeId,
        pos: u8,
        kind: InsertKind,
        merge: &MergeFn,
    ) -> Result<(), TreeError> {
        let slot = &mut self.nodes[id.index()].children[usize::from(pos)];
        match kind {
            InsertKind::Data => {
                let existing = match std::mem::replace(slot, Record::Empty) {
                    Record::Data(value) => Some(value),
                    _ => None,
                };
                if let Some(value) = merge(existing).map_err(TreeError::MergeFailed)? {
                    self.nodes[id.index()].children[usize::from(pos)] = Record::Data(value);
                }
            }
            InsertKind::Fixed(node) => *slot = Record::FixedNode(node),
            InsertKind::Alias(node) => *slot = Record::Alias(node),
            InsertKind::Reserved => *slot = Record::Reserved,
        }
        Ok(())
    }

    /// Walk the bits of `ip` from the root until a terminal record is hit.
    ///
    /// Aliases are followed transparently; the returned depth is the bit
    /// depth at which the walk stopped, counted along the query address.
    pub fn get(&self, ip: &[u8]) -> (u32, &Record) {
        debug_assert_eq!(ip.len() * 8, self.bit_width as usize);
        self.get_at(Self::ROOT, ip, 0)
    }

    fn get_at(&self, id: NodeId, ip: &[u8], depth: u32) -> (u32, &Record) {
        let record = &self.nodes[id.index()].children[usize::from(bit_at(ip, depth as usize))];
        let depth = depth + 1;
        match record {
            Record::Node(child) | Record::FixedNode(child) | Record::Alias(child) => {
                self.get_at(*child, ip, depth)
            }
            _ => (depth, record),
        }
    }

    /// Prune redundant subtrees and assign node numbers.
    ///
    /// Numbering starts at `base` and follows a pre-order walk, left child
    /// first. A node whose two records end up identical (both empty, or
    /// both holding structurally equal data) is collapsed into its parent;
    /// fixed subtrees are numbered but never collapsed. Returns the number
    /// of surviving nodes, so the range `base..base + count` is exactly the
    /// numbers handed out.
    pub fn finalize(&mut self, base: u32) -> u32 {
        let (_, counter) = self.finalize_node(Self::ROOT, base);
        counter - base
    }

    fn finalize_node(&mut self, id: NodeId, counter: u32) -> (Option<Record>, u32) {
        self.nodes[id.index()].node_num = Some(counter);
        let mut counter = counter + 1;

        for pos in 0..2 {
            let link = match &self.nodes[id.index()].children[pos] {
                Record::FixedNode(child) => {
                    let child = *child;
                    // Fixed subtrees are never candidates for merging.
                    let (_, next) = self.finalize_node(child, counter);
                    counter = next;
                    continue;
                }
                Record::Node(child) => *child,
                _ => continue,
            };
            let (merged, next) = self.finalize_node(link, counter);
            match merged {
                // The child collapsed; its subtree's numbers are dropped
                // and the counter stays where it was.
                Some(record) => self.nodes[id.index()].children[pos] = record,
                None => counter = next,
            }
        }

        let children = &self.nodes[id.index()].children;
        let mergeable = match (&children[0], &children[1]) {
            (Record::Empty, Record::Empty) => true,
            (Record::Data(a), Record::Data(b)) => a == b,
            _ => false,
        };
        if mergeable {
            // Hoist one record up; the other copy and this node become
            // unreferenced arena slots.
            let record = std::mem::replace(&mut self.nodes[id.index()].children[0], Record::Empty);
            (Some(record), counter)
        } else {
            (None, counter)
        }
    }

    /// Iterate over reachable nodes in numbering order (pre-order, left
    /// child first, owning links only).
    ///
    /// After [`finalize`](Self::finalize) this is exactly ascending node
    /// number, the order a section writer consumes.
    pub fn iter(&self) -> Nodes<'_> {
        Nodes {
            tree: self,
            stack: vec![Self::ROOT],
        }
    }
}

/// Iterator over a tree's reachable nodes in numbering order.
#[derive(Debug)]
pub struct Nodes<'a> {
    tree: &'a PrefixTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        // Right child pushed first so the left subtree drains before it,
        // matching the order finalize assigned numbers.
        for pos in [1, 0] {
            if let Record::Node(child) | Record::FixedNode(child) = &node.children[pos] {
                self.stack.push(*child);
            }
        }
        Some(node)
    }
}

fn format_cidr(ip: &[u8], prefix_len: u32) -> String {
    match <[u8; 4]>::try_from(ip) {
        Ok(v4) => format!("{}/{}", Ipv4Addr::from(v4), prefix_len),
        Err(_) => match <[u8; 16]>::try_from(ip) {
            Ok(v6) => format!("{}/{}", Ipv6Addr::from(v6), prefix_len),
            Err(_) => format!("<{} bytes>/{}", ip.len(), prefix_len),
        },
    }
}
