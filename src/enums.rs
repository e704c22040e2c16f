use crate::resourcerecord::InternalResourceRecord;
use enum_iterator::Sequence;
use packed_struct::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Display;

#[derive(Debug, Eq, PartialEq, PrimitiveEnum_u8, Copy, Clone)]
/// A four bit field that specifies kind of query in this message.
/// This value is set by the originator of a query and copied into the response.
pub enum OpCode {
    /// A standard query (QUERY)
    Query = 0,
    // IQuery = 1, an inverse query (IQUERY) - obsolete in https://www.rfc-editor.org/rfc/rfc3425
    /// Server status request (STATUS)
    Status = 2,
    /// Zone change notification <https://www.rfc-editor.org/rfc/rfc1996>
    Notify = 4,
    /// Dynamic update <https://www.rfc-editor.org/rfc/rfc2136>
    Update = 5,
    /// 3, 6-15 reserved for future use
    Reserved = 15,
}

impl From<u8> for OpCode {
    fn from(input: u8) -> Self {
        match input {
            0 => Self::Query,
            2 => Self::Status,
            4 => Self::Notify,
            5 => Self::Update,
            _ => Self::Reserved,
        }
    }
}

impl From<OpCode> for i32 {
    fn from(val: OpCode) -> i32 {
        match val {
            OpCode::Query => 0,
            OpCode::Status => 2,
            OpCode::Notify => 4,
            OpCode::Update => 5,
            OpCode::Reserved => 0b1111,
        }
    }
}

#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, Eq, PartialEq)]
/// Response code, things like NOERROR, FORMATERROR, SERVFAIL etc.
pub enum Rcode {
    /// No error condition
    NoError = 0,
    /// Format error - The name server was unable to interpret the query.
    FormatError = 1,
    /// Server failure - The name server was unable to process this query due to a problem with the name server.
    ServFail = 2,
    /// Name Error - the domain name referenced in the query does not exist.
    NameError = 3,
    /// Not Implemented - The name server does not support the requested kind of query.
    NotImplemented = 4,
    /// Refused - The name server refuses to perform the specified operation for policy reasons.
    Refused = 5,
    /// Name exists when it should not (RFC 2136 §2.2)
    YXDomain = 6,
    /// RR set exists when it should not (RFC 2136 §2.2)
    YXRRSet = 7,
    /// RR set that should exist does not (RFC 2136 §2.2)
    NXRRSet = 8,
    /// Server not authoritative for zone / not authorized (RFC 2136 §2.2, RFC 2845)
    NotAuth = 9,
    /// Name not contained in zone (RFC 2136 §2.2)
    NotZone = 10,
    // 11..15 reserved for future use
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Sequence)]
/// RRType, eg A, NS, MX, etc
pub enum RecordType {
    /// A host address
    A = 1,
    /// Authoritative name server
    NS = 2,
    CNAME = 5,  // 5 the canonical name for an alias
    SOA = 6,    // 6 marks the start of a zone of authority
    PTR = 12,   // 12 a domain name pointer
    HINFO = 13, // 13 host information
    MX = 15,    // 15 mail exchange
    /// Text strings
    TXT = 16,
    /// Service location <https://www.rfc-editor.org/rfc/rfc2782>
    SRV = 33,
    /// IPv6 Records <https://www.rfc-editor.org/rfc/rfc3596#section-2.1>
    AAAA = 28,
    /// 252 A request for a transfer of an entire zone
    AXFR = 252,
    /// 255 A request for all records (*), also the RFC2136 delete-RRset wildcard
    ANY = 255,
    /// 41 the EDNS(0) pseudo-RR, RFC6891 §6.1.2. Never a real RRset member;
    /// carried in Additional only, one per message.
    OPT = 41,
    InvalidType = 0,
}

impl From<&u16> for RecordType {
    fn from(input: &u16) -> Self {
        match input {
            1 => Self::A,
            2 => Self::NS,
            5 => Self::CNAME,
            6 => Self::SOA,
            12 => Self::PTR,
            13 => Self::HINFO,
            15 => Self::MX,
            16 => Self::TXT,
            28 => Self::AAAA,
            33 => Self::SRV,
            41 => Self::OPT,
            252 => Self::AXFR,
            255 => Self::ANY,
            _ => Self::InvalidType,
        }
    }
}

impl From<String> for RecordType {
    fn from(input: String) -> Self {
        let input: RecordType = input.as_str().into();
        input
    }
}
impl From<&str> for RecordType {
    fn from(input: &str) -> Self {
        match input {
            "A" => Self::A,
            "AAAA" => Self::AAAA,
            "ANY" => Self::ANY,
            "AXFR" => Self::AXFR,
            "CNAME" => Self::CNAME,
            "HINFO" => Self::HINFO,
            "MX" => Self::MX,
            "NS" => Self::NS,
            "OPT" => Self::OPT,
            "PTR" => Self::PTR,
            "SOA" => Self::SOA,
            "SRV" => Self::SRV,
            "TXT" => Self::TXT,
            _ => Self::InvalidType,
        }
    }
}

impl From<RecordType> for &'static str {
    fn from(input: RecordType) -> &'static str {
        match input {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::ANY => "ANY",
            RecordType::AXFR => "AXFR",
            RecordType::CNAME => "CNAME",
            RecordType::HINFO => "HINFO",
            RecordType::MX => "MX",
            RecordType::NS => "NS",
            RecordType::OPT => "OPT",
            RecordType::PTR => "PTR",
            RecordType::SOA => "SOA",
            RecordType::SRV => "SRV",
            RecordType::TXT => "TXT",
            RecordType::InvalidType => "",
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let res: &'static str = (*self).into();
        f.write_fmt(format_args!("{res}"))
    }
}

impl From<&InternalResourceRecord> for RecordType {
    fn from(input: &InternalResourceRecord) -> RecordType {
        match input {
            InternalResourceRecord::A { .. } => RecordType::A,
            InternalResourceRecord::AAAA { .. } => RecordType::AAAA,
            InternalResourceRecord::CNAME { .. } => RecordType::CNAME,
            InternalResourceRecord::HINFO { .. } => RecordType::HINFO,
            InternalResourceRecord::MX { .. } => RecordType::MX,
            InternalResourceRecord::NS { .. } => RecordType::NS,
            InternalResourceRecord::PTR { .. } => RecordType::PTR,
            InternalResourceRecord::SOA { .. } => RecordType::SOA,
            InternalResourceRecord::SRV { .. } => RecordType::SRV,
            InternalResourceRecord::TXT { .. } => RecordType::TXT,
            InternalResourceRecord::Opt { .. } => RecordType::OPT,
            InternalResourceRecord::Empty { rtype } => *rtype,
        }
    }
}

impl RecordType {
    /// Types the responder and update engine know how to handle on the wire.
    pub fn supported(self) -> bool {
        matches!(
            self,
            RecordType::A
                | RecordType::AAAA
                | RecordType::ANY
                | RecordType::CNAME
                | RecordType::HINFO
                | RecordType::MX
                | RecordType::NS
                | RecordType::PTR
                | RecordType::SOA
                | RecordType::SRV
                | RecordType::TXT
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Sequence)]
/// CLASS fields appear in resource records, most entries should be IN. Ref RFC1035 3.2.4,
/// plus the RFC2136 pseudo-classes ANY and NONE used in the UPDATE and prerequisite sections.
pub enum RecordClass {
    /// IN - Internet
    Internet = 1,
    /// CS - CSNET class (Obsolete)
    CsNet = 2,
    /// CH - Chaos
    Chaos = 3,
    /// Hesiod [Dyer 87]
    Hesiod = 4,
    /// NONE - RFC2136 prerequisite/delete pseudo-class
    None = 254,
    /// ANY - RFC2136 prerequisite/delete pseudo-class
    Any = 255,

    InvalidType = 0,
}

impl Display for RecordClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{}",
            match self {
                RecordClass::Internet => "IN",
                RecordClass::CsNet => "CS",
                RecordClass::Chaos => "CHAOS",
                RecordClass::Hesiod => "HESIOD",
                RecordClass::None => "NONE",
                RecordClass::Any => "ANY",
                RecordClass::InvalidType => "Invalid",
            }
        ))
    }
}

impl From<&str> for RecordClass {
    fn from(value: &str) -> Self {
        match value {
            "IN" => RecordClass::Internet,
            "CS" => RecordClass::CsNet,
            "CHAOS" => RecordClass::Chaos,
            "HESIOD" => RecordClass::Hesiod,
            "NONE" => RecordClass::None,
            "ANY" => RecordClass::Any,
            _ => RecordClass::InvalidType,
        }
    }
}

impl Serialize for RecordClass {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(format!("{self}").as_str())
    }
}

impl From<&u16> for RecordClass {
    fn from(input: &u16) -> Self {
        match input {
            1 => Self::Internet,
            2 => Self::CsNet,
            3 => Self::Chaos,
            4 => Self::Hesiod,
            254 => Self::None,
            255 => Self::Any,
            _ => Self::InvalidType,
        }
    }
}

#[derive(Debug, PrimitiveEnum_u8, Clone, Copy, Eq, PartialEq)]
pub enum PacketType {
    Query = 0,
    Answer = 1,
}

impl From<bool> for PacketType {
    fn from(input: bool) -> Self {
        match input {
            false => Self::Query,
            true => Self::Answer,
        }
    }
}
