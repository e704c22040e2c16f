//! The question section (RFC1035 §4.1.2): one entry per spec.md, QDCOUNT
//! enforced by the caller (§4.3 step 1: QDCOUNT != 1 is FORMERR).

use crate::enums::{RecordClass, RecordType};
use crate::error::ServerError;
use crate::name::Name;
use crate::wire::{decode_name, encode_name, get_u16};
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub qname: Name,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QNAME={} QTYPE={} QCLASS={}", self.qname, self.qtype, self.qclass)
    }
}

impl Question {
    /// Parses a question starting at `offset`, returning it and the
    /// offset immediately following it.
    pub fn from_wire(buf: &[u8], offset: usize) -> Result<(Self, usize), ServerError> {
        let (qname, after_name) = decode_name(buf, offset)?;
        let qtype = RecordType::from(&get_u16(buf, after_name)?);
        let qclass = RecordClass::from(&get_u16(buf, after_name + 2)?);
        Ok((Question { qname, qtype, qclass }, after_name + 4))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = encode_name(&self.qname, None);
        out.extend((self.qtype as u16).to_be_bytes());
        out.extend((self.qclass as u16).to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let q = Question {
            qname: Name::from_text("example.com"),
            qtype: RecordType::A,
            qclass: RecordClass::Internet,
        };
        let bytes = q.to_bytes();
        let (decoded, end) = Question::from_wire(&bytes, 0).unwrap();
        assert_eq!(decoded, q);
        assert_eq!(end, bytes.len());
    }
}
