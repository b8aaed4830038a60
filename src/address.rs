//! Lookup addresses
//!
//! The lookup engine never parses textual IP notation. Callers hand it a
//! version-tagged, big-endian byte sequence; conversions from the standard
//! library address types are provided for convenience.

use crate::error::IpdbError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    /// IPv4 (32-bit addresses)
    V4,
    /// IPv6 (128-bit addresses)
    V6,
}

impl IpVersion {
    /// Bit that marks this family in the header's `ip_version` bitmask
    pub const fn mask(self) -> u16 {
        match self {
            IpVersion::V4 => 0x01,
            IpVersion::V6 => 0x02,
        }
    }

    /// Address width in bits
    pub const fn bit_len(self) -> usize {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// A version-tagged address in network byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// 4 big-endian bytes
    V4([u8; 4]),
    /// 16 big-endian bytes
    V6([u8; 16]),
}

impl Address {
    /// Address family of this address
    pub fn version(&self) -> IpVersion {
        match self {
            Address::V4(_) => IpVersion::V4,
            Address::V6(_) => IpVersion::V6,
        }
    }

    /// Raw big-endian bytes
    pub fn octets(&self) -> &[u8] {
        match self {
            Address::V4(b) => b,
            Address::V6(b) => b,
        }
    }

    /// Address width in bits (32 or 128)
    pub fn bit_len(&self) -> usize {
        self.version().bit_len()
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = IpdbError;

    /// The slice length picks the family: 4 bytes is IPv4, 16 bytes is IPv6.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(bytes);
                Ok(Address::V4(octets))
            }
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(bytes);
                Ok(Address::V6(octets))
            }
            n => Err(IpdbError::InvalidAddress(n)),
        }
    }
}

impl From<[u8; 4]> for Address {
    fn from(octets: [u8; 4]) -> Self {
        Address::V4(octets)
    }
}

impl From<[u8; 16]> for Address {
    fn from(octets: [u8; 16]) -> Self {
        Address::V6(octets)
    }
}

impl From<Ipv4Addr> for Address {
    fn from(addr: Ipv4Addr) -> Self {
        Address::V4(addr.octets())
    }
}

impl From<Ipv6Addr> for Address {
    fn from(addr: Ipv6Addr) -> Self {
        Address::V6(addr.octets())
    }
}

impl From<IpAddr> for Address {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Address::V4(b) => Ipv4Addr::from(b).fmt(f),
            Address::V6(b) => Ipv6Addr::from(b).fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_std_types() {
        let addr: Address = "192.168.1.1".parse::<IpAddr>().unwrap().into();
        assert_eq!(addr, Address::V4([192, 168, 1, 1]));
        assert_eq!(addr.bit_len(), 32);

        let addr: Address = "2001:db8::1".parse::<IpAddr>().unwrap().into();
        assert_eq!(addr.version(), IpVersion::V6);
        assert_eq!(addr.octets()[0..4], [0x20, 0x01, 0x0d, 0xb8]);
        assert_eq!(addr.octets()[15], 1);
    }

    #[test]
    fn test_try_from_slice() {
        let v4 = Address::try_from(&[1u8, 2, 3, 4][..]).unwrap();
        assert_eq!(v4.version(), IpVersion::V4);

        let v6 = Address::try_from(&[0u8; 16][..]).unwrap();
        assert_eq!(v6.version(), IpVersion::V6);

        assert!(matches!(
            Address::try_from(&[0u8; 5][..]),
            Err(IpdbError::InvalidAddress(5))
        ));
    }

    #[test]
    fn test_version_masks() {
        assert_eq!(IpVersion::V4.mask() | IpVersion::V6.mask(), 3);
        assert_eq!(Address::V6([0; 16]).to_string(), "::");
        assert_eq!(Address::V4([8, 8, 4, 4]).to_string(), "8.8.4.4");
    }
}
