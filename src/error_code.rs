#[cfg(test)]
mod error_code_test;

use std::collections::HashMap;
use std::fmt;

use crate::attributes::*;
use crate::checks::*;
use crate::error::*;
use crate::message::*;

const ERROR_CODE_CLASS_BYTE: usize = 2;
const ERROR_CODE_NUMBER_BYTE: usize = 3;
const ERROR_CODE_REASON_START: usize = 4;
const ERROR_CODE_REASON_MAX_B: usize = 763;
const ERROR_CODE_MODULO: u16 = 100;

/// ErrorCodeAttribute represents the ERROR-CODE attribute: two reserved
/// bytes, the class (hundreds digit), the number (code mod 100), and a
/// UTF-8 reason phrase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorCodeAttribute {
    pub code: ErrorCode,
    pub reason: Vec<u8>,
}

impl fmt::Display for ErrorCodeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = String::from_utf8_lossy(&self.reason);
        write!(f, "{}: {}", self.code.0, reason)
    }
}

impl Setter for ErrorCodeAttribute {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        check_overflow(
            ATTR_ERROR_CODE,
            self.reason.len() + ERROR_CODE_REASON_START,
            ERROR_CODE_REASON_MAX_B + ERROR_CODE_REASON_START,
        )?;
        let mut value =
            Vec::with_capacity(ERROR_CODE_REASON_START + self.reason.len());
        value.extend_from_slice(&[0, 0]); // reserved
        value.push((self.code.0 / ERROR_CODE_MODULO) as u8);
        value.push((self.code.0 % ERROR_CODE_MODULO) as u8);
        value.extend_from_slice(&self.reason);
        m.add(ATTR_ERROR_CODE, &value);
        Ok(())
    }
}

impl Getter for ErrorCodeAttribute {
    fn get_from(&mut self, m: &Message) -> Result<()> {
        let v = m.get(ATTR_ERROR_CODE)?;
        if v.len() < ERROR_CODE_REASON_START {
            return Err(Error::ErrUnexpectedEof);
        }
        let class = v[ERROR_CODE_CLASS_BYTE] as u16;
        let number = v[ERROR_CODE_NUMBER_BYTE] as u16;
        self.code = ErrorCode(class * ERROR_CODE_MODULO + number);
        self.reason.clear();
        self.reason.extend_from_slice(&v[ERROR_CODE_REASON_START..]);
        Ok(())
    }
}

/// ErrorCode is the numeric representation of ERROR-CODE. Adding it to
/// a message fills in the canonical reason phrase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u16);

impl Setter for ErrorCode {
    fn add_to(&self, m: &mut Message) -> Result<()> {
        let reason = ERROR_REASONS
            .get(self)
            .ok_or(Error::ErrNoDefaultReason)?;
        ErrorCodeAttribute {
            code: *self,
            reason: reason.as_bytes().to_vec(),
        }
        .add_to(m)
    }
}

pub const CODE_TRY_ALTERNATE: ErrorCode = ErrorCode(300);
pub const CODE_BAD_REQUEST: ErrorCode = ErrorCode(400);
pub const CODE_UNAUTHORIZED: ErrorCode = ErrorCode(401);
pub const CODE_UNKNOWN_ATTRIBUTE: ErrorCode = ErrorCode(420);
pub const CODE_STALE_NONCE: ErrorCode = ErrorCode(438);
pub const CODE_ROLE_CONFLICT: ErrorCode = ErrorCode(487);
pub const CODE_SERVER_ERROR: ErrorCode = ErrorCode(500);

// Error codes from RFC 5766 (TURN).
pub const CODE_FORBIDDEN: ErrorCode = ErrorCode(403);
pub const CODE_ALLOC_MISMATCH: ErrorCode = ErrorCode(437);
pub const CODE_WRONG_CREDENTIALS: ErrorCode = ErrorCode(441);
pub const CODE_UNSUPPORTED_TRANS_PROTO: ErrorCode = ErrorCode(442);
pub const CODE_ALLOC_QUOTA_REACHED: ErrorCode = ErrorCode(486);
pub const CODE_INSUFFICIENT_CAPACITY: ErrorCode = ErrorCode(508);

lazy_static! {
    static ref ERROR_REASONS: HashMap<ErrorCode, &'static str> = {
        let mut m = HashMap::new();
        m.insert(CODE_TRY_ALTERNATE, "Try Alternate");
        m.insert(CODE_BAD_REQUEST, "Bad Request");
        m.insert(CODE_UNAUTHORIZED, "Unauthorized");
        m.insert(CODE_UNKNOWN_ATTRIBUTE, "Unknown Attribute");
        m.insert(CODE_STALE_NONCE, "Stale Nonce");
        m.insert(CODE_ROLE_CONFLICT, "Role Conflict");
        m.insert(CODE_SERVER_ERROR, "Server Error");
        m.insert(CODE_FORBIDDEN, "Forbidden");
        m.insert(CODE_ALLOC_MISMATCH, "Allocation Mismatch");
        m.insert(CODE_WRONG_CREDENTIALS, "Wrong Credentials");
        m.insert(
            CODE_UNSUPPORTED_TRANS_PROTO,
            "Unsupported Transport Protocol",
        );
        m.insert(CODE_ALLOC_QUOTA_REACHED, "Allocation Quota Reached");
        m.insert(CODE_INSUFFICIENT_CAPACITY, "Insufficient Capacity");
        m
    };
}
