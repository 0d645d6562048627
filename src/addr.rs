#[cfg(test)]
mod addr_test;

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::attributes::*;
use crate::error::*;
use crate::message::*;

pub(crate) const FAMILY_IPV4: u16 = 0x01;
pub(crate) const FAMILY_IPV6: u16 = 0x02;

pub(crate) const IPV4LEN: usize = 4;
pub(crate) const IPV6LEN: usize = 16;

/// MappedAddress represents the MAPPED-ADDRESS attribute: one family
/// byte, a big-endian port, and a 4- or 16-byte address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for MappedAddress {
    fn default() -> Self {
        MappedAddress {
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl fmt::Display for MappedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SocketAddr::new(self.ip, self.port))
    }
}

impl MappedAddress {
    /// get_from_as decodes the value of attribute t as an address.
    pub fn get_from_as(&mut self, m: &Message, t: AttrType) -> Result<()> {
        let v = m.get(t)?;
        if v.len() <= 4 {
            return Err(Error::ErrUnexpectedEof);
        }
        let family = u16::from_be_bytes([v[0], v[1]]);
        if family != FAMILY_IPV4 && family != FAMILY_IPV6 {
            return Err(Error::ErrBadAddressFamily);
        }
        self.port = u16::from_be_bytes([v[2], v[3]]);
        let addr = &v[4..];
        match family {
            FAMILY_IPV4 => {
                if addr.len() != IPV4LEN {
                    return Err(Error::ErrBadIpLength);
                }
                let mut ip = [0u8; IPV4LEN];
                ip.copy_from_slice(addr);
                self.ip = IpAddr::from(ip);
            }
            _ => {
                if addr.len() != IPV6LEN {
                    return Err(Error::ErrBadIpLength);
                }
                let mut ip = [0u8; IPV6LEN];
                ip.copy_from_slice(addr);
                self.ip = IpAddr::from(ip);
            }
        }
        Ok(())
    }

    /// add_to_as encodes the address as the value of attribute t.
    pub fn add_to_as(&self, m: &mut Message, t: AttrType) -> Result<()> {
        let mut value = [0u8; 4 + IPV6LEN];
        value[2..4].copy_from_slice(&self.port.to_be_bytes());
        let n = match self.ip {
            IpAddr::V4(ip) => {
                value[..2].copy_from_slice(&FAMILY_IPV4.to_be_bytes());
                value[4..4 + IPV4LEN].copy_from_slice(&ip.octets());
                4 + IPV4LEN
            }
            IpAddr::V6(ip) => {
                value[..2].copy_from_slice(&FAMILY_IPV6.to_be_bytes());
                value[4..4 + IPV6LEN].copy_from_slice(&ip.octets());
                4 + IPV6LEN
            }
        };
        m.add(t, &value[..n]);
        Ok(())
    }
}

impl Setter for MappedAddress {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        self.add_to_as(m, ATTR_MAPPED_ADDRESS)
    }
}

impl Getter for MappedAddress {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        self.get_from_as(m, ATTR_MAPPED_ADDRESS)
    }
}

/// AlternateServer represents the ALTERNATE-SERVER attribute. It shares
/// the MAPPED-ADDRESS wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlternateServer {
    pub addr: MappedAddress,
}

impl fmt::Display for AlternateServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

impl Setter for AlternateServer {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        self.addr.add_to_as(m, ATTR_ALTERNATE_SERVER)
    }
}

impl Getter for AlternateServer {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        self.addr.get_from_as(m, ATTR_ALTERNATE_SERVER)
    }
}
