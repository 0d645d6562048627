
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::addr::*;
use crate::attributes::*;
use crate::error::*;
use crate::message::*;

/// safe_xor_bytes sets dst[i] = a[i] ^ b[i] for every index covered by
/// all three slices and returns the number of bytes written. Both the
/// encode and the decode path go through this one routine.
pub fn safe_xor_bytes(dst: &mut [u8], a: &[u8], b: &[u8]) -> usize {
    let mut n = a.len().min(b.len());
    if dst.len() < n {
        n = dst.len();
    }
    for i in 0..n {
        dst[i] = a[i] ^ b[i];
    }
    n
}

/// XorMappedAddress represents the XOR-MAPPED-ADDRESS attribute: the
/// port is XORed with the most significant half of the magic cookie,
/// IPv4 addresses with the cookie, and IPv6 addresses with the cookie
/// concatenated with the transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorMappedAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for XorMappedAddress {
    fn default() -> Self {
        XorMappedAddress {
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl fmt::Display for XorMappedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SocketAddr::new(self.ip, self.port))
    }
}

impl XorMappedAddress {
    /// add_to_as encodes the address as the value of attribute t,
    /// applying the XOR obfuscation.
    pub fn add_to_as(&self, m: &mut Message, t: AttrType) -> Result<()> {
        // xor_value is the keystream: magic cookie then transaction id.
        let mut xor_value = [0u8; 4 + TRANSACTION_ID_SIZE];
        xor_value[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        xor_value[4..].copy_from_slice(&m.transaction_id.0);

        let xor_port = self.port ^ (MAGIC_COOKIE >> 16) as u16;
        let mut value = [0u8; 4 + IPV6LEN];
        value[2..4].copy_from_slice(&xor_port.to_be_bytes());
        let n = match self.ip {
            IpAddr::V4(ip) => {
                value[..2].copy_from_slice(&FAMILY_IPV4.to_be_bytes());
                let octets = ip.octets();
                safe_xor_bytes(&mut value[4..4 + IPV4LEN], &octets, &xor_value);
                4 + IPV4LEN
            }
            IpAddr::V6(ip) => {
                value[..2].copy_from_slice(&FAMILY_IPV6.to_be_bytes());
                let octets = ip.octets();
                safe_xor_bytes(&mut value[4..4 + IPV6LEN], &octets, &xor_value);
                4 + IPV6LEN
            }
        };
        m.add(t, &value[..n]);
        Ok(())
    }

    /// get_from_as decodes the value of attribute t, undoing the XOR
    /// obfuscation with the same routine the encoder uses.
    pub fn get_from_as(&mut self, m: &Message, t: AttrType) -> Result<()> {
        let v = m.get(t)?;
        if v.len() <= 4 {
            return Err(Error::ErrUnexpectedEof);
        }
        let family = u16::from_be_bytes([v[0], v[1]]);
        if family != FAMILY_IPV4 && family != FAMILY_IPV6 {
            return Err(Error::ErrBadAddressFamily);
        }

        let mut xor_value = [0u8; 4 + TRANSACTION_ID_SIZE];
        xor_value[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        xor_value[4..].copy_from_slice(&m.transaction_id.0);

        self.port = u16::from_be_bytes([v[2], v[3]]) ^ (MAGIC_COOKIE >> 16) as u16;
        let addr = &v[4..];
        match family {
            FAMILY_IPV4 => {
                if addr.len() != IPV4LEN {
                    return Err(Error::ErrBadIpLength);
                }
                let mut ip = [0u8; IPV4LEN];
                safe_xor_bytes(&mut ip, addr, &xor_value);
                self.ip = IpAddr::from(ip);
            }
            _ => {
                if addr.len() != IPV6LEN {
                    return Err(Error::ErrBadIpLength);
                }
                let mut ip = [0u8; IPV6LEN];
                safe_xor_bytes(&mut ip, addr, &xor_value);
                self.ip = IpAddr::from(ip);
            }
        }
        Ok(())
    }
}

impl Setter for XorMappedAddress {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        self.add_to_as(m, ATTR_XORMAPPED_ADDRESS)
    }
}

impl Getter for XorMappedAddress {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        self.get_from_as(m, ATTR_XORMAPPED_ADDRESS)
    }
}
