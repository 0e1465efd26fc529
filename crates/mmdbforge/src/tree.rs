//! Seeded writer trees
//!
//! [`Tree`] wraps the raw prefix tree with the address plumbing a database
//! writer needs: CIDR networks instead of packed byte slices, IPv4
//! placement inside a 128-bit tree, and the seeding pass that stamps
//! aliased and reserved ranges before any user data arrives.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use mmdbforge_data::DataValue;
use mmdbforge_tree::{InsertKind, Nodes, PrefixTree, Record};

use crate::error::{ForgeError, Result};
use crate::merge;
use crate::network::Network;

/// IP version of a tree, fixing its address width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// 32-bit tree, IPv4 networks only
    V4,
    /// 128-bit tree; IPv4 networks live in the zero /96 prefix
    V6,
}

impl IpVersion {
    fn bit_width(self) -> u32 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

/// Construction options for [`Tree`].
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Address width of the tree
    pub ip_version: IpVersion,
    /// Alias the IPv4-mapped (`::ffff:0:0/96`), Teredo (`2001::/32`) and
    /// 6to4 (`2002::/16`) ranges onto the IPv4 subtree at `::/96`, which is
    /// stamped as a fixed node so pruning never drops it. V6 trees only.
    pub ipv4_aliasing: bool,
    /// Networks stamped Reserved before any user insert; inserting into
    /// them fails. See [`reserved_networks`] for the standard set.
    pub reserved_networks: Vec<Network>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        TreeOptions {
            ip_version: IpVersion::V6,
            ipv4_aliasing: true,
            reserved_networks: Vec::new(),
        }
    }
}

/// The special-purpose registry ranges (RFC 6890 family) commonly excluded
/// from user data.
///
/// For [`IpVersion::V6`] the list covers the IPv6-specific ranges plus the
/// IPv4 ranges, which land inside the `::/96` subtree.
pub fn reserved_networks(version: IpVersion) -> Vec<Network> {
    let v4: Vec<Network> = [
        (Ipv4Addr::new(0, 0, 0, 0), 8),
        (Ipv4Addr::new(10, 0, 0, 0), 8),
        (Ipv4Addr::new(100, 64, 0, 0), 10),
        (Ipv4Addr::new(127, 0, 0, 0), 8),
        (Ipv4Addr::new(169, 254, 0, 0), 16),
        (Ipv4Addr::new(172, 16, 0, 0), 12),
        (Ipv4Addr::new(192, 0, 0, 0), 24),
        (Ipv4Addr::new(192, 0, 2, 0), 24),
        (Ipv4Addr::new(192, 88, 99, 0), 24),
        (Ipv4Addr::new(192, 168, 0, 0), 16),
        (Ipv4Addr::new(198, 18, 0, 0), 15),
        (Ipv4Addr::new(198, 51, 100, 0), 24),
        (Ipv4Addr::new(203, 0, 113, 0), 24),
        (Ipv4Addr::new(224, 0, 0, 0), 4),
        (Ipv4Addr::new(240, 0, 0, 0), 4),
    ]
    .into_iter()
    .map(|(ip, len)| Network::from_parts(IpAddr::V4(ip), len))
    .collect();

    match version {
        IpVersion::V4 => v4,
        IpVersion::V6 => {
            let v6 = [
                (Ipv6Addr::new(0x100, 0, 0, 0, 0, 0, 0, 0), 64),
                (Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 0), 32),
                (Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7),
                (Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10),
                (Ipv6Addr::new(0xff00, 0, 0, 0, 0, 0, 0, 0), 8),
            ]
            .into_iter()
            .map(|(ip, len)| Network::from_parts(IpAddr::V6(ip), len));
            v4.into_iter().chain(v6).collect()
        }
    }
}

/// A writer tree: a seeded prefix tree plus network and address
/// conversion.
#[derive(Debug)]
pub struct Tree {
    tree: PrefixTree,
    ip_version: IpVersion,
    node_count: u32,
}

impl Tree {
    /// Create a tree and run the seeding pass described by `options`.
    pub fn new(options: TreeOptions) -> Result<Self> {
        let mut tree = Tree {
            tree: PrefixTree::new(options.ip_version.bit_width()),
            ip_version: options.ip_version,
            node_count: 0,
        };

        if options.ipv4_aliasing {
            if options.ip_version != IpVersion::V6 {
                return Err(ForgeError::InvalidNetwork(
                    "IPv4 aliasing requires a 128-bit tree".to_string(),
                ));
            }
            tree.seed_aliases()?;
        }
        for network in &options.reserved_networks {
            tree.insert_kind(network, InsertKind::Reserved)?;
        }

        Ok(tree)
    }

    // The IPv4 subtree sits at ::/96 as a fixed node; the mapped, Teredo
    // and 6to4 spellings of the IPv4 space all alias to it.
    fn seed_aliases(&mut self) -> Result<()> {
        let ipv4_root = self.tree.alloc_node();
        let ipv4_home = Network::from_parts(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 96);
        self.insert_kind(&ipv4_home, InsertKind::Fixed(ipv4_root))?;

        let aliases = [
            (Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0, 0), 96),
            (Ipv6Addr::new(0x2001, 0, 0, 0, 0, 0, 0, 0), 32),
            (Ipv6Addr::new(0x2002, 0, 0, 0, 0, 0, 0, 0), 16),
        ];
        for (ip, prefix_len) in aliases {
            let network = Network::from_parts(IpAddr::V6(ip), prefix_len);
            self.insert_kind(&network, InsertKind::Alias(ipv4_root))?;
        }
        Ok(())
    }

    fn insert_kind(&mut self, network: &Network, kind: InsertKind) -> Result<()> {
        let (buf, len, prefix_len) = self.network_bits(network)?;
        self.tree
            .insert(&buf[..len], prefix_len, kind, &|existing| Ok(existing))?;
        Ok(())
    }

    /// Insert a network, resolving any collision with existing data through
    /// `merge`. The merge function runs once per leaf the network
    /// terminates at; returning `None` clears the leaf.
    pub fn insert_with<F>(&mut self, network: &Network, merge: F) -> Result<()>
    where
        F: Fn(Option<DataValue>) -> std::result::Result<Option<DataValue>, String>,
    {
        let (buf, len, prefix_len) = self.network_bits(network)?;
        self.tree
            .insert(&buf[..len], prefix_len, InsertKind::Data, &merge)?;
        Ok(())
    }

    /// Insert a network, replacing any existing value.
    pub fn insert(&mut self, network: &Network, value: DataValue) -> Result<()> {
        self.insert_with(network, merge::replace_with(value))
    }

    /// Longest-prefix lookup.
    ///
    /// Returns the record the walk stopped at and the bit depth where it
    /// stopped, counted along this tree's address width (an IPv4 address
    /// in a 128-bit tree starts 96 bits deep).
    pub fn get(&self, addr: IpAddr) -> Result<(u32, &Record)> {
        let (buf, len) = self.addr_bits(addr)?;
        Ok(self.tree.get(&buf[..len]))
    }

    /// Prune redundant subtrees and number the survivors from `base`.
    /// Returns the surviving node count.
    pub fn finalize(&mut self, base: u32) -> u32 {
        self.node_count = self.tree.finalize(base);
        self.node_count
    }

    /// Surviving node count from the last [`finalize`](Self::finalize), or
    /// 0 before the first one.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Iterate over reachable nodes in numbering order.
    pub fn iter(&self) -> Nodes<'_> {
        self.tree.iter()
    }

    /// The underlying prefix tree, for validation and raw traversal.
    pub fn prefix_tree(&self) -> &PrefixTree {
        &self.tree
    }

    fn network_bits(&self, network: &Network) -> Result<([u8; 16], usize, u32)> {
        let (buf, len) = self.addr_bits(network.ip())?;
        let prefix_len = match (self.ip_version, network.ip()) {
            (IpVersion::V6, IpAddr::V4(_)) => u32::from(network.prefix_len()) + 96,
            _ => u32::from(network.prefix_len()),
        };
        Ok((buf, len, prefix_len))
    }

    fn addr_bits(&self, addr: IpAddr) -> Result<([u8; 16], usize)> {
        let mut buf = [0u8; 16];
        match (self.ip_version, addr) {
            (IpVersion::V4, IpAddr::V4(v4)) => {
                buf[..4].copy_from_slice(&v4.octets());
                Ok((buf, 4))
            }
            (IpVersion::V4, IpAddr::V6(v6)) => Err(ForgeError::InvalidNetwork(format!(
                "cannot place IPv6 address {} in an IPv4 tree",
                v6
            ))),
            (IpVersion::V6, IpAddr::V4(v4)) => {
                // IPv4 lives in the 96-bit zero prefix of the IPv6 space.
                buf[12..].copy_from_slice(&v4.octets());
                Ok((buf, 16))
            }
            (IpVersion::V6, IpAddr::V6(v6)) => {
                buf.copy_from_slice(&v6.octets());
                Ok((buf, 16))
            }
        }
    }
}
