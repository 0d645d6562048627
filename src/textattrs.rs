#[cfg(test)]
mod textattrs_test;

use std::fmt;

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

const MAX_USERNAME_B: usize = 513;
const MAX_REALM_B: usize = 763;
const MAX_SOFTWARE_B: usize = 763;
const MAX_NONCE_B: usize = 763;

/// Username represents the USERNAME attribute.
pub type Username = TextAttribute;
/// Realm represents the REALM attribute.
pub type Realm = TextAttribute;
/// Nonce represents the NONCE attribute.
pub type Nonce = TextAttribute;
/// Software represents the SOFTWARE attribute.
pub type Software = TextAttribute;

/// TextAttribute is an opaque UTF-8 attribute value with a length
/// ceiling enforced per attribute type before any message mutation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextAttribute {
    pub attr: AttrType,
    pub text: String,
}

impl fmt::Display for TextAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl TextAttribute {
    pub fn new(attr: AttrType, text: String) -> Self {
        TextAttribute { attr, text }
    }

    /// get_from_as parses the value of attribute t as UTF-8 text.
    pub fn get_from_as(m: &Message, t: AttrType) -> Result<TextAttribute> {
        let v = m.get(t)?;
        let text = String::from_utf8(v.to_vec())
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(TextAttribute { attr: t, text })
    }
}

impl Setter for TextAttribute {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let text = self.text.as_bytes();
        let max_len = match self.attr {
            ATTR_USERNAME => MAX_USERNAME_B,
            ATTR_REALM => MAX_REALM_B,
            ATTR_SOFTWARE => MAX_SOFTWARE_B,
            ATTR_NONCE => MAX_NONCE_B,
            _ => usize::MAX,
        };
        check_overflow(self.attr, text.len(), max_len)?;
        m.add(self.attr, text);
        Ok(())
    }
}

impl Getter for TextAttribute {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let attr = self.attr;
        *self = TextAttribute::get_from_as(m, attr)?;
        Ok(())
    }
}
