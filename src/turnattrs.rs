
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;
use crate::xoraddr::XorMappedAddress;

/// ChannelNumber represents the CHANNEL-NUMBER attribute: a 16-bit
/// channel number followed by two RFFU bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChannelNumber(pub u16);

impl fmt::Display for ChannelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CN 0x{:x}", self.0)
    }
}

const CHANNEL_NUMBER_SIZE: usize = 4;

impl Setter for ChannelNumber {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let mut v = [0u8; CHANNEL_NUMBER_SIZE];
        v[..2].copy_from_slice(&self.0.to_be_bytes());
        // v[2..4] are RFFU and zero.
        m.add(ATTR_CHANNEL_NUMBER, &v);
        Ok(())
    }
}

impl Getter for ChannelNumber {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_CHANNEL_NUMBER)?;
        check_size(ATTR_CHANNEL_NUMBER, v.len(), CHANNEL_NUMBER_SIZE)?;
        self.0 = u16::from_be_bytes([v[0], v[1]]);
        Ok(())
    }
}

/// Lifetime represents the LIFETIME attribute: the allocation lifetime
/// in seconds, as an unsigned 32-bit integer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime(pub Duration);

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs())
    }
}

const LIFETIME_SIZE: usize = 4;

impl Setter for Lifetime {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let v = (self.0.as_secs() as u32).to_be_bytes();
        m.add(ATTR_LIFETIME, &v);
        Ok(())
    }
}

impl Getter for Lifetime {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_LIFETIME)?;
        check_size(ATTR_LIFETIME, v.len(), LIFETIME_SIZE)?;
        let seconds = u32::from_be_bytes([v[0], v[1], v[2], v[3]]);
        self.0 = Duration::from_secs(seconds as u64);
        Ok(())
    }
}

/// PeerAddress represents the XOR-PEER-ADDRESS attribute: the peer's
/// transport address, in the XOR-MAPPED-ADDRESS encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for PeerAddress {
    fn default() -> Self {
        PeerAddress {
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", std::net::SocketAddr::new(self.ip, self.port))
    }
}

impl Setter for PeerAddress {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        XorMappedAddress {
            ip: self.ip,
            port: self.port,
        }
        .add_to_as(m, ATTR_XOR_PEER_ADDRESS)
    }
}

impl Getter for PeerAddress {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let mut a = XorMappedAddress::default();
        a.get_from_as(m, ATTR_XOR_PEER_ADDRESS)?;
        self.ip = a.ip;
        self.port = a.port;
        Ok(())
    }
}

/// RelayedAddress represents the XOR-RELAYED-ADDRESS attribute: the
/// address the server allocated on behalf of the client, in the
/// XOR-MAPPED-ADDRESS encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayedAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl Default for RelayedAddress {
    fn default() -> Self {
        RelayedAddress {
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }
}

impl fmt::Display for RelayedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", std::net::SocketAddr::new(self.ip, self.port))
    }
}

impl Setter for RelayedAddress {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        XorMappedAddress {
            ip: self.ip,
            port: self.port,
        }
        .add_to_as(m, ATTR_XOR_RELAYED_ADDRESS)
    }
}

impl Getter for RelayedAddress {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let mut a = XorMappedAddress::default();
        a.get_from_as(m, ATTR_XOR_RELAYED_ADDRESS)?;
        self.ip = a.ip;
        self.port = a.port;
        Ok(())
    }
}

/// Data represents the DATA attribute: the raw application payload of
/// a Send or Data indication.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Data(pub Vec<u8>);

impl Setter for Data {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_DATA, &self.0);
        Ok(())
    }
}

impl Getter for Data {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        self.0 = m.get(ATTR_DATA)?.to_vec();
        Ok(())
    }
}

/// EvenPort represents the EVEN-PORT attribute: the R bit requests the
/// reservation of the next higher port.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvenPort {
    pub reserve_additional: bool,
}

impl fmt::Display for EvenPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reserve_additional {
            write!(f, "reserve: true")
        } else {
            write!(f, "reserve: false")
        }
    }
}

const EVEN_PORT_SIZE: usize = 1;
const EVEN_PORT_R_BIT: u8 = 1 << 7;

impl Setter for EvenPort {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let mut v = [0u8; EVEN_PORT_SIZE];
        if self.reserve_additional {
            v[0] |= EVEN_PORT_R_BIT;
        }
        m.add(ATTR_EVEN_PORT, &v);
        Ok(())
    }
}

impl Getter for EvenPort {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_EVEN_PORT)?;
        check_size(ATTR_EVEN_PORT, v.len(), EVEN_PORT_SIZE)?;
        self.reserve_additional = v[0] & EVEN_PORT_R_BIT != 0;
        Ok(())
    }
}

/// Protocol is the transport protocol number of REQUESTED-TRANSPORT.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Protocol(pub u8);

/// PROTO_UDP is the IANA protocol number for UDP, the only transport
/// RFC 5766 allocations support.
pub const PROTO_UDP: Protocol = Protocol(17);

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == PROTO_UDP {
            write!(f, "udp")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// RequestedTransport represents the REQUESTED-TRANSPORT attribute: one
/// protocol byte followed by three RFFU bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestedTransport {
    pub protocol: Protocol,
}

impl fmt::Display for RequestedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol: {}", self.protocol)
    }
}

const REQUESTED_TRANSPORT_SIZE: usize = 4;

impl Setter for RequestedTransport {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let mut v = [0u8; REQUESTED_TRANSPORT_SIZE];
        v[0] = self.protocol.0;
        // v[1..4] are RFFU and zero.
        m.add(ATTR_REQUESTED_TRANSPORT, &v);
        Ok(())
    }
}

impl Getter for RequestedTransport {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_REQUESTED_TRANSPORT)?;
        check_size(
            ATTR_REQUESTED_TRANSPORT,
            v.len(),
            REQUESTED_TRANSPORT_SIZE,
        )?;
        self.protocol = Protocol(v[0]);
        Ok(())
    }
}

/// DontFragment represents the zero-length DONT-FRAGMENT attribute.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DontFragment;

impl Setter for DontFragment {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_DONT_FRAGMENT, &[]);
        Ok(())
    }
}

impl DontFragment {
    /// is_set reports whether the message carries DONT-FRAGMENT.
    pub fn is_set(&self, m: &Message) -> bool {
        m.contains(ATTR_DONT_FRAGMENT)
    }
}

/// ReservationToken represents the 8-byte RESERVATION-TOKEN attribute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReservationToken(pub Vec<u8>);

const RESERVATION_TOKEN_SIZE: usize = 8;

impl Setter for ReservationToken {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        check_size(ATTR_RESERVATION_TOKEN, self.0.len(), RESERVATION_TOKEN_SIZE)?;
        m.add(ATTR_RESERVATION_TOKEN, &self.0);
        Ok(())
    }
}

impl Getter for ReservationToken {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_RESERVATION_TOKEN)?;
        check_size(ATTR_RESERVATION_TOKEN, v.len(), RESERVATION_TOKEN_SIZE)?;
        self.0 = v.to_vec();
        Ok(())
    }
}

/// ConnectionId represents the CONNECTION-ID attribute of RFC 6062,
/// correlating a TCP allocation control connection with a data
/// connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionId(pub u32);

const CONNECTION_ID_SIZE: usize = 4;

impl Setter for ConnectionId {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_CONNECTION_ID, &self.0.to_be_bytes());
        Ok(())
    }
}

impl Getter for ConnectionId {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_CONNECTION_ID)?;
        check_size(ATTR_CONNECTION_ID, v.len(), CONNECTION_ID_SIZE)?;
        self.0 = u32::from_be_bytes([v[0], v[1], v[2], v[3]]);
        Ok(())
    }
}
