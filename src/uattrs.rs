#[cfg(test)]
mod uattrs_test;

use std::fmt;

use crate::attributes::*;
use crate::error::*;
use crate::message::*;

/// UnknownAttributes represents the UNKNOWN-ATTRIBUTES attribute: a
/// sequence of 16-bit attribute types a server did not comprehend.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnknownAttributes(pub Vec<AttrType>);

impl fmt::Display for UnknownAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<nil>");
        }
        let s = self
            .0
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{s}")
    }
}

// Each attribute type takes 2 bytes on the wire.
const ATTR_TYPE_SIZE: usize = 2;

impl Setter for UnknownAttributes {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let mut v = Vec::with_capacity(self.0.len() * ATTR_TYPE_SIZE);
        for t in &self.0 {
            v.extend_from_slice(&t.value().to_be_bytes());
        }
        m.add(ATTR_UNKNOWN_ATTRIBUTES, &v);
        Ok(())
    }
}

impl Getter for UnknownAttributes {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_UNKNOWN_ATTRIBUTES)?;
        if v.len() % ATTR_TYPE_SIZE != 0 {
            return Err(Error::ErrBadUnknownAttrsSize);
        }
        self.0.clear();
        for c in v.chunks_exact(ATTR_TYPE_SIZE) {
            self.0.push(AttrType(u16::from_be_bytes([c[0], c[1]])));
        }
        Ok(())
    }
}
