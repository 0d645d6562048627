#[cfg(test)]
mod integrity_test;

use std::fmt;

use md5::{Digest, Md5};
use ring::hmac;
use subtle::ConstantTimeEq;

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

pub(crate) const MESSAGE_INTEGRITY_SIZE: usize = 20;

const CREDENTIALS_SEP: &str = ":";

fn new_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mac = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    hmac::sign(&mac, message).as_ref().to_vec()
}

/// MessageIntegrity represents the MESSAGE-INTEGRITY attribute: an
/// HMAC-SHA1 over the message with the length field adjusted as if the
/// attribute were already appended. The wrapped value is the HMAC key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MessageIntegrity(pub Vec<u8>);

impl fmt::Display for MessageIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY: 0x{:x?}", self.0)
    }
}

impl MessageIntegrity {
    /// new_long_term_integrity returns a key for the long-term
    /// credential mechanism: MD5 of username, realm and password
    /// joined by colons.
    pub fn new_long_term_integrity(
        username: String,
        realm: String,
        password: String,
    ) -> Self {
        let s = [username, realm, password].join(CREDENTIALS_SEP);
        let mut h = Md5::new();
        h.update(s.as_bytes());
        MessageIntegrity(h.finalize().to_vec())
    }

    /// new_short_term_integrity returns a key for the short-term
    /// credential mechanism, where the key is the password itself.
    pub fn new_short_term_integrity(password: String) -> Self {
        MessageIntegrity(password.into_bytes())
    }
}

impl Setter for MessageIntegrity {
    /// add_to appends the MESSAGE-INTEGRITY attribute, computing the
    /// HMAC with the header length pre-adjusted to cover the attribute
    /// itself. Fails if the message already carries FINGERPRINT, which
    /// must stay last.
    fn add_to(&self, m: &mut Message) -> Result<()> {
        for a in &m.attributes.0 {
            if a.typ == ATTR_FINGERPRINT {
                return Err(Error::ErrFingerprintBeforeIntegrity);
            }
        }
        let length = m.length;
        m.length += (ATTRIBUTE_HEADER_SIZE + MESSAGE_INTEGRITY_SIZE) as u32;
        m.write_length();
        let v = new_hmac(&self.0, &m.raw);
        m.length = length;
        m.add(ATTR_MESSAGE_INTEGRITY, &v);
        Ok(())
    }
}

impl Checker for MessageIntegrity {
    /// check verifies the MESSAGE-INTEGRITY attribute in constant
    /// time. Attributes appended after the integrity attribute (such
    /// as FINGERPRINT) are excluded from the computation.
    fn check(&self, m: &mut Message) -> Result<()> {
        let b = m.get(ATTR_MESSAGE_INTEGRITY)?.to_vec();
        check_size(ATTR_MESSAGE_INTEGRITY, b.len(), MESSAGE_INTEGRITY_SIZE)?;

        // Adjusting the length in the header to what it was when the
        // attribute was computed.
        let mut size_reduced = 0usize;
        let mut after_integrity = false;
        for a in &m.attributes.0 {
            if after_integrity {
                size_reduced += nearest_padded_value_length(a.length as usize);
                size_reduced += ATTRIBUTE_HEADER_SIZE;
            }
            if a.typ == ATTR_MESSAGE_INTEGRITY {
                after_integrity = true;
            }
        }
        let length = m.length;
        m.length -= size_reduced as u32;
        m.write_length();

        let start_of_hmac = MESSAGE_HEADER_SIZE + m.length as usize
            - (ATTRIBUTE_HEADER_SIZE + MESSAGE_INTEGRITY_SIZE);
        let expected = new_hmac(&self.0, &m.raw[..start_of_hmac]);

        m.length = length;
        m.write_length();

        if bool::from(expected.as_slice().ct_eq(&b)) {
            Ok(())
        } else {
            Err(Error::ErrIntegrityMismatch)
        }
    }
}
