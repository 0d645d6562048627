
use crc::{Crc, CRC_32_ISO_HDLC};

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

/// FINGERPRINT is the FingerprintAttr instance used as a setter.
pub const FINGERPRINT: FingerprintAttr = FingerprintAttr;

pub(crate) const FINGERPRINT_XOR_VALUE: u32 = 0x5354554e;
pub(crate) const FINGERPRINT_SIZE: usize = 4; // 32 bit

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// fingerprint_value returns the CRC-32/IEEE of b XORed with the
/// fingerprint constant, distinguishing STUN from other multiplexed
/// protocols.
pub fn fingerprint_value(b: &[u8]) -> u32 {
    CRC32.checksum(b) ^ FINGERPRINT_XOR_VALUE
}

/// FingerprintAttr represents the FINGERPRINT attribute. When present
/// it must be the last attribute of the message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintAttr;

impl Setter for FingerprintAttr {
    /// add_to appends the FINGERPRINT attribute, computing the checksum
    /// with the header length pre-adjusted to cover the attribute
    /// itself.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let length = m.length;
        m.length += (ATTRIBUTE_HEADER_SIZE + FINGERPRINT_SIZE) as u32;
        m.write_length();
        let value = fingerprint_value(&m.raw);
        m.length = length;
        m.add(ATTR_FINGERPRINT, &value.to_be_bytes());
        Ok(())
    }
}

impl Checker for FingerprintAttr {
    /// check recomputes the checksum over everything preceding the
    /// trailing FINGERPRINT attribute; any attribute appended after it
    /// makes the check fail.
    fn check(&self, m: &mut Message) -> Result<()> {
        let b = m.get(ATTR_FINGERPRINT)?;
        check_size(ATTR_FINGERPRINT, b.len(), FINGERPRINT_SIZE)?;
        let val = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        let attr_start =
            m.raw.len() - (ATTRIBUTE_HEADER_SIZE + FINGERPRINT_SIZE);
        let expected = fingerprint_value(&m.raw[..attr_start]);
        if val == expected {
            Ok(())
        } else {
            Err(Error::ErrFingerprintMismatch)
        }
    }
}
