#[cfg(test)]
mod iceattrs_test;

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

/// PriorityAttr represents the PRIORITY attribute: the candidate
/// priority a peer would assign to a reflexive candidate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PriorityAttr(pub u32);

const PRIORITY_SIZE: usize = 4;

impl Setter for PriorityAttr {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_PRIORITY, &self.0.to_be_bytes());
        Ok(())
    }
}

impl Getter for PriorityAttr {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_PRIORITY)?;
        check_size(ATTR_PRIORITY, v.len(), PRIORITY_SIZE)?;
        self.0 = u32::from_be_bytes([v[0], v[1], v[2], v[3]]);
        Ok(())
    }
}

/// UseCandidateAttr represents the zero-length USE-CANDIDATE attribute.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UseCandidateAttr;

impl UseCandidateAttr {
    pub fn new() -> Self {
        UseCandidateAttr
    }

    /// is_set reports whether the message carries USE-CANDIDATE.
    pub fn is_set(m: &Message) -> bool {
        m.contains(ATTR_USE_CANDIDATE)
    }
}

impl Setter for UseCandidateAttr {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_USE_CANDIDATE, &[]);
        Ok(())
    }
}

const CONTROL_SIZE: usize = 8;

/// AttrControlling represents the ICE-CONTROLLING attribute: the agent
/// believes it holds the controlling role; the value is the tie-breaker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttrControlling(pub u64);

impl Setter for AttrControlling {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_ICE_CONTROLLING, &self.0.to_be_bytes());
        Ok(())
    }
}

impl Getter for AttrControlling {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_ICE_CONTROLLING)?;
        check_size(ATTR_ICE_CONTROLLING, v.len(), CONTROL_SIZE)?;
        self.0 = u64::from_be_bytes([
            v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7],
        ]);
        Ok(())
    }
}

/// AttrControlled represents the ICE-CONTROLLED attribute: the agent
/// believes it holds the controlled role; the value is the tie-breaker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttrControlled(pub u64);

impl Setter for AttrControlled {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        m.add(ATTR_ICE_CONTROLLED, &self.0.to_be_bytes());
        Ok(())
    }
}

impl Getter for AttrControlled {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_ICE_CONTROLLED)?;
        check_size(ATTR_ICE_CONTROLLED, v.len(), CONTROL_SIZE)?;
        self.0 = u64::from_be_bytes([
            v[0], v[1], v[2], v[3], v[4], v[5], v[6], v[7],
        ]);
        Ok(())
    }
}
