
use std::fmt;
use std::io::{Read, Write};

use rand::Rng;

use crate::attributes::*;
use crate::error::*;

pub const MAGIC_COOKIE: u32 = 0x2112A442;
pub const ATTRIBUTE_HEADER_SIZE: usize = 4;
pub const MESSAGE_HEADER_SIZE: usize = 20;
pub const TRANSACTION_ID_SIZE: usize = 12; // 96 bit

const DEFAULT_RAW_CAPACITY: usize = 120;

/// is_message reports whether b looks like a STUN message: at least a
/// full header, the two leading type bits zero, and the magic cookie
/// in place. Used to demultiplex STUN from other protocols sharing a
/// socket.
pub fn is_message(b: &[u8]) -> bool {
    b.len() >= MESSAGE_HEADER_SIZE
        && b[0] & 0xC0 == 0
        && u32::from_be_bytes([b[4], b[5], b[6], b[7]]) == MAGIC_COOKIE
}

/// nearest_padded_value_length rounds l up to the next multiple of 4.
pub(crate) fn nearest_padded_value_length(l: usize) -> usize {
    let mut n = 4 * (l / 4);
    if n < l {
        n += 4;
    }
    n
}

/// Setter sets a Message attribute or header field.
pub trait Setter {
    fn add_to(&self, m: &mut Message) -> Result<()>;
}

/// Getter parses an attribute from a Message.
pub trait Getter {
    fn get_from(&mut self, m: &Message) -> Result<()>;
}

/// Checker checks that a Message attribute is valid, e.g. that an
/// integrity or fingerprint attribute matches the message bytes.
pub trait Checker {
    fn check(&self, m: &mut Message) -> Result<()>;
}

/// TransactionId is a 96-bit identifier correlating a request with its
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub [u8; TRANSACTION_ID_SIZE]);

impl TransactionId {
    /// new returns a new random transaction ID drawn from a
    /// cryptographically secure source.
    pub fn new() -> Self {
        let mut b = TransactionId([0u8; TRANSACTION_ID_SIZE]);
        rand::rng().fill(&mut b.0[..]);
        b
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        TransactionId::new()
    }
}

impl Setter for TransactionId {
    /// add_to sets the message transaction id.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.transaction_id = *self;
        m.write_transaction_id();
        Ok(())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// MessageClass is an 8-bit representation of the 2-bit STUN class.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessageClass(pub u8);

/// CLASS_REQUEST is a request class.
pub const CLASS_REQUEST: MessageClass = MessageClass(0x00);
/// CLASS_INDICATION is an indication (fire-and-forget) class.
pub const CLASS_INDICATION: MessageClass = MessageClass(0x01);
/// CLASS_SUCCESS_RESPONSE is a success response class.
pub const CLASS_SUCCESS_RESPONSE: MessageClass = MessageClass(0x02);
/// CLASS_ERROR_RESPONSE is an error response class.
pub const CLASS_ERROR_RESPONSE: MessageClass = MessageClass(0x03);

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            CLASS_REQUEST => "request",
            CLASS_INDICATION => "indication",
            CLASS_SUCCESS_RESPONSE => "success response",
            CLASS_ERROR_RESPONSE => "error response",
            _ => "unknown message class",
        };
        write!(f, "{s}")
    }
}

/// Method is a STUN method, 12 bits of the message type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Method(pub u16);

pub const METHOD_BINDING: Method = Method(0x001);
// Methods from RFC 5766 (TURN).
pub const METHOD_ALLOCATE: Method = Method(0x003);
pub const METHOD_REFRESH: Method = Method(0x004);
pub const METHOD_SEND: Method = Method(0x006);
pub const METHOD_DATA: Method = Method(0x007);
pub const METHOD_CREATE_PERMISSION: Method = Method(0x008);
pub const METHOD_CHANNEL_BIND: Method = Method(0x009);
// Methods from RFC 6062 (TURN TCP allocations).
pub const METHOD_CONNECT: Method = Method(0x00a);
pub const METHOD_CONNECTION_BIND: Method = Method(0x00b);
pub const METHOD_CONNECTION_ATTEMPT: Method = Method(0x00c);

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            METHOD_BINDING => "binding",
            METHOD_ALLOCATE => "allocate",
            METHOD_REFRESH => "refresh",
            METHOD_SEND => "send",
            METHOD_DATA => "data",
            METHOD_CREATE_PERMISSION => "create permission",
            METHOD_CHANNEL_BIND => "channel bind",
            METHOD_CONNECT => "connect",
            METHOD_CONNECTION_BIND => "connection bind",
            METHOD_CONNECTION_ATTEMPT => "connection attempt",
            _ => return write!(f, "0x{:x}", self.0),
        };
        write!(f, "{s}")
    }
}

/// BINDING_REQUEST is a message type for a binding request.
pub const BINDING_REQUEST: MessageType = MessageType {
    method: METHOD_BINDING,
    class: CLASS_REQUEST,
};
/// BINDING_SUCCESS is a message type for a binding success response.
pub const BINDING_SUCCESS: MessageType = MessageType {
    method: METHOD_BINDING,
    class: CLASS_SUCCESS_RESPONSE,
};
/// BINDING_ERROR is a message type for a binding error response.
pub const BINDING_ERROR: MessageType = MessageType {
    method: METHOD_BINDING,
    class: CLASS_ERROR_RESPONSE,
};

// Bit layout of the 14-bit message type: the 12 method bits are
// scattered as M11..M7 | C1 | M6..M4 | C0 | M3..M0.
const METHOD_ABITS: u16 = 0xf; // 0b0000000000001111
const METHOD_BBITS: u16 = 0x70; // 0b0000000001110000
const METHOD_DBITS: u16 = 0xf80; // 0b0000111110000000

const METHOD_BSHIFT: u16 = 1;
const METHOD_DSHIFT: u16 = 2;

const FIRST_BIT: u16 = 0x1;
const SECOND_BIT: u16 = 0x2;

const C0BIT: u16 = FIRST_BIT;
const C1BIT: u16 = SECOND_BIT;

const CLASS_C0SHIFT: u16 = 4;
const CLASS_C1SHIFT: u16 = 7;

/// MessageType is a 14-bit message type: class and method interleaved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessageType {
    pub method: Method,
    pub class: MessageClass,
}

impl MessageType {
    pub fn new(method: Method, class: MessageClass) -> Self {
        MessageType { method, class }
    }

    /// value returns the type encoded as the 14-bit wire value.
    pub fn value(&self) -> u16 {
        // Shifting the method bits apart to leave room for the class
        // bits at positions 4 and 8.
        let method = self.method.0;
        let a = method & METHOD_ABITS;
        let b = (method & METHOD_BBITS) << METHOD_BSHIFT;
        let d = (method & METHOD_DBITS) << METHOD_DSHIFT;
        let method = a + b + d;

        let class = self.class.0 as u16;
        let c0 = (class & C0BIT) << CLASS_C0SHIFT;
        let c1 = (class & C1BIT) << CLASS_C1SHIFT;
        let class = c0 + c1;

        method + class
    }

    /// read_value decodes the 14-bit wire value into method and class.
    pub fn read_value(&mut self, value: u16) {
        let c0 = (value >> CLASS_C0SHIFT) & C0BIT;
        let c1 = (value >> CLASS_C1SHIFT) & C1BIT;
        self.class = MessageClass((c0 + c1) as u8);

        let a = value & METHOD_ABITS;
        let b = (value >> METHOD_BSHIFT) & METHOD_BBITS;
        let d = (value >> METHOD_DSHIFT) & METHOD_DBITS;
        self.method = Method(a + b + d);
    }
}

impl Setter for MessageType {
    /// add_to sets the message type.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.set_type(*self);
        Ok(())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.class)
    }
}

/// Message is a STUN message: a contiguous encoded byte buffer plus the
/// cached header fields and the parsed attribute index.
///
/// The buffer is either in a valid encoded state (header consistent
/// with the trailing bytes) or has been mutated and awaits a header
/// rewrite. After the initial growth all encode and decode operations
/// reuse the buffer; a Message is not safe for concurrent use.
#[derive(Debug, Clone)]
pub struct Message {
    pub typ: MessageType,
    pub length: u32,
    pub transaction_id: TransactionId,
    pub attributes: Attributes,
    pub raw: Vec<u8>,
}

impl Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        if self.typ != other.typ
            || self.length != other.length
            || self.transaction_id != other.transaction_id
            || self.attributes.0.len() != other.attributes.0.len()
        {
            return false;
        }
        self.attributes.0.iter().zip(other.attributes.0.iter()).all(
            |(a, b)| {
                a.typ == b.typ
                    && a.length == b.length
                    && self.raw[a.pos..a.pos + a.length as usize]
                        == other.raw[b.pos..b.pos + b.length as usize]
            },
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} l={} attrs={} id={}",
            self.typ,
            self.length,
            self.attributes.0.len(),
            self.transaction_id
        )
    }
}

impl Message {
    /// new returns a Message with a pre-allocated raw buffer holding an
    /// all-zero header.
    pub fn new() -> Self {
        let mut raw = Vec::with_capacity(DEFAULT_RAW_CAPACITY);
        raw.resize(MESSAGE_HEADER_SIZE, 0);
        Message {
            typ: MessageType::default(),
            length: 0,
            transaction_id: TransactionId([0u8; TRANSACTION_ID_SIZE]),
            attributes: Attributes::default(),
            raw,
        }
    }

    /// reset resets the message to the empty state, keeping the
    /// allocated buffer and attribute index capacity.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.length = 0;
        self.attributes.0.clear();
    }

    /// grow ensures the raw buffer is at least v bytes long, filling
    /// new bytes with zeroes.
    pub(crate) fn grow(&mut self, v: usize) {
        if self.raw.len() < v {
            self.raw.resize(v, 0);
        }
    }

    /// add appends a new attribute to the message: a 4-byte TLV header,
    /// the value, and zero padding up to the next 4-byte boundary. The
    /// length field is updated; padding bytes count toward it, but not
    /// toward the attribute's own length field.
    pub fn add(&mut self, t: AttrType, v: &[u8]) {
        let alloc_size = ATTRIBUTE_HEADER_SIZE + v.len();
        let first = MESSAGE_HEADER_SIZE + self.length as usize;
        let mut last = first + alloc_size;
        self.grow(last);
        self.length += alloc_size as u32;

        self.raw[first..first + 2].copy_from_slice(&t.value().to_be_bytes());
        self.raw[first + 2..first + 4]
            .copy_from_slice(&(v.len() as u16).to_be_bytes());
        self.raw[first + ATTRIBUTE_HEADER_SIZE..last].copy_from_slice(v);

        let attr = RawAttribute {
            typ: t,
            length: v.len() as u16,
            pos: first + ATTRIBUTE_HEADER_SIZE,
        };

        let padded = nearest_padded_value_length(v.len());
        if padded != v.len() {
            let bytes_to_add = padded - v.len();
            last += bytes_to_add;
            self.grow(last);
            for b in &mut self.raw[last - bytes_to_add..last] {
                *b = 0;
            }
            self.length += bytes_to_add as u32;
        }

        self.attributes.0.push(attr);
        self.write_length();
    }

    /// set_type sets the message type and writes it to the buffer.
    pub fn set_type(&mut self, t: MessageType) {
        self.typ = t;
        self.write_type();
    }

    /// write_type writes the cached type to the first two bytes.
    pub fn write_type(&mut self) {
        self.grow(2);
        self.raw[..2].copy_from_slice(&self.typ.value().to_be_bytes());
    }

    /// write_length writes the cached length to bytes 2..4.
    pub fn write_length(&mut self) {
        self.grow(4);
        self.raw[2..4].copy_from_slice(&(self.length as u16).to_be_bytes());
    }

    /// write_transaction_id writes the cached transaction id to the
    /// buffer.
    pub fn write_transaction_id(&mut self) {
        self.grow(MESSAGE_HEADER_SIZE);
        self.raw[8..MESSAGE_HEADER_SIZE].copy_from_slice(&self.transaction_id.0);
    }

    /// write_header serializes type, length, magic cookie and
    /// transaction id into the first 20 bytes.
    pub fn write_header(&mut self) {
        self.grow(MESSAGE_HEADER_SIZE);
        self.write_type();
        self.write_length();
        self.raw[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        self.write_transaction_id();
    }

    /// decode parses the raw buffer, validating the header and the
    /// attribute framing and rebuilding the attribute index.
    pub fn decode(&mut self) -> Result<()> {
        if self.raw.len() < MESSAGE_HEADER_SIZE {
            return Err(Error::ErrUnexpectedEof);
        }

        let t = u16::from_be_bytes([self.raw[0], self.raw[1]]);
        if t & 0xC000 != 0 {
            return Err(Error::ErrFirstBitsNotZero);
        }
        let size = u16::from_be_bytes([self.raw[2], self.raw[3]]) as usize;
        let cookie = u32::from_be_bytes([
            self.raw[4],
            self.raw[5],
            self.raw[6],
            self.raw[7],
        ]);
        if cookie != MAGIC_COOKIE {
            return Err(Error::ErrBadMagicCookie);
        }

        let full_size = MESSAGE_HEADER_SIZE + size;
        if self.raw.len() < full_size {
            return Err(Error::ErrUnexpectedEof);
        }
        if self.raw.len() > full_size || size % 4 != 0 {
            return Err(Error::ErrBadLength);
        }

        self.typ.read_value(t);
        self.length = size as u32;
        self.transaction_id
            .0
            .copy_from_slice(&self.raw[8..MESSAGE_HEADER_SIZE]);

        self.attributes.0.clear();
        let mut offset = 0;
        while offset < size {
            let pos = MESSAGE_HEADER_SIZE + offset;
            if size - offset < ATTRIBUTE_HEADER_SIZE {
                return Err(Error::ErrAttributeHeaderShort);
            }
            let typ = AttrType(u16::from_be_bytes([
                self.raw[pos],
                self.raw[pos + 1],
            ]));
            let length =
                u16::from_be_bytes([self.raw[pos + 2], self.raw[pos + 3]]);
            let padded = nearest_padded_value_length(length as usize);
            if offset + ATTRIBUTE_HEADER_SIZE + padded > size {
                return Err(Error::ErrUnexpectedEof);
            }
            self.attributes.0.push(RawAttribute {
                typ,
                length,
                pos: pos + ATTRIBUTE_HEADER_SIZE,
            });
            offset += ATTRIBUTE_HEADER_SIZE + padded;
        }
        Ok(())
    }

    /// clone_to copies the message into b, reusing b's buffer when its
    /// capacity suffices.
    pub fn clone_to(&self, b: &mut Message) -> Result<()> {
        b.raw.clear();
        b.raw.extend_from_slice(&self.raw);
        b.decode()
    }

    /// build resets the message, writes the header, and applies setters
    /// in order. It does not return until the first setter error.
    pub fn build(&mut self, setters: &[Box<dyn Setter>]) -> Result<()> {
        self.reset();
        self.write_header();
        for s in setters {
            s.add_to(self)?;
        }
        Ok(())
    }

    /// check applies checkers in order, returning the first error.
    pub fn check(&mut self, checkers: &[Box<dyn Checker>]) -> Result<()> {
        for c in checkers {
            c.check(self)?;
        }
        Ok(())
    }

    /// parse applies getters in order, returning the first error.
    pub fn parse(&self, getters: &mut [Box<dyn Getter>]) -> Result<()> {
        for g in getters {
            g.get_from(self)?;
        }
        Ok(())
    }

    /// write_to writes the encoded bytes to the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(&self.raw)?;
        Ok(self.raw.len())
    }

    /// read_from reads the encoded bytes from the reader and decodes
    /// them, reusing the buffer capacity.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<usize> {
        self.raw.clear();
        let n = reader.read_to_end(&mut self.raw)?;
        self.decode()?;
        Ok(n)
    }
}

/// must_build panics on a setter error; a helper for tests and
/// compile-time-known-good messages.
pub fn must_build(setters: &[Box<dyn Setter>]) -> Message {
    let mut m = Message::new();
    if let Err(err) = m.build(setters) {
        panic!("build failed: {err}");
    }
    m
}
