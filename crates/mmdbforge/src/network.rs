//! CIDR networks

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::ForgeError;

/// An IP network in CIDR form.
///
/// Host bits are masked off on construction, so two spellings of the same
/// network compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Network {
    ip: IpAddr,
    prefix_len: u8,
}

impl Network {
    /// Create a network from an address and prefix length, masking any host
    /// bits.
    pub fn new(ip: IpAddr, prefix_len: u8) -> Result<Self, ForgeError> {
        let max = match ip {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(ForgeError::InvalidNetwork(format!(
                "prefix length {} out of range for {}",
                prefix_len, ip
            )));
        }
        Ok(Network {
            ip: mask(ip, prefix_len),
            prefix_len,
        })
    }

    // For in-crate tables whose entries are already masked and in range.
    pub(crate) fn from_parts(ip: IpAddr, prefix_len: u8) -> Self {
        debug_assert_eq!(mask(ip, prefix_len), ip);
        Network { ip, prefix_len }
    }

    /// The (masked) network address.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// The prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

fn mask(ip: IpAddr, prefix_len: u8) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let masked = if prefix_len == 0 {
                0
            } else {
                u32::from(v4) & (u32::MAX << (32 - u32::from(prefix_len)))
            };
            IpAddr::V4(Ipv4Addr::from(masked))
        }
        IpAddr::V6(v6) => {
            let masked = if prefix_len == 0 {
                0
            } else {
                u128::from(v6) & (u128::MAX << (128 - u32::from(prefix_len)))
            };
            IpAddr::V6(Ipv6Addr::from(masked))
        }
    }
}

impl FromStr for Network {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, len) = s.split_once('/').ok_or_else(|| {
            ForgeError::InvalidNetwork(format!("missing prefix length in {:?}", s))
        })?;
        let ip: IpAddr = ip
            .parse()
            .map_err(|e| ForgeError::InvalidNetwork(format!("{:?}: {}", s, e)))?;
        let prefix_len: u8 = len
            .parse()
            .map_err(|e| ForgeError::InvalidNetwork(format!("{:?}: {}", s, e)))?;
        Network::new(ip, prefix_len)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_len)
    }
}
