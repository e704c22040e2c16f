use crate::enums::{OpCode, PacketType, Rcode};
use crate::error::ServerError;
use crate::question::Question;
use crate::resourcerecord::ResourceRecord;
use packed_struct::prelude::*;

pub mod axfr;
pub mod cli;
pub mod config;
/// The zone store: the single aggregate holding every authoritative zone.
pub mod datastore;
pub mod dispatch;
pub mod enums;
pub mod error;
pub mod logging;
pub mod name;
pub mod notify;
pub mod query;
pub mod question;
pub mod resourcerecord;
pub mod servers;
#[cfg(test)]
mod tests;
pub mod update;
pub mod utils;
pub mod wire;
pub mod zonefile;
pub mod zones;

/// Internal limit of in-flight UDP requests the datagram loop will track.
pub const MAX_IN_FLIGHT: usize = 512;
/// The size of a DNS message header.
pub const HEADER_BYTES: usize = 12;
/// The maximum size of a UDP packet without EDNS <https://dnsflagday.net/2020/#dns-flag-day-2020>.
pub const UDP_BUFFER_SIZE: usize = 1232;
/// CNAME chase depth cap, matching the original server's loop guard.
pub const CNAME_CHASE_LIMIT: usize = 20;

/// The header of a DNS message, either a query or a reply.
/// Ref [RFC1035 §4.1.1](https://www.rfc-editor.org/rfc/rfc1035#section-4.1.1).
#[derive(Debug, PackedStruct, PartialEq, Eq, Clone)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "12")]
pub struct Header {
    #[packed_field(bits = "0..=15", endian = "msb")]
    pub id: u16,
    #[packed_field(bits = "16", ty = "enum")]
    pub qr: PacketType,
    #[packed_field(bits = "17..=20", ty = "enum")]
    pub opcode: OpCode,
    #[packed_field(bits = "21")]
    pub authoritative: bool,
    #[packed_field(bits = "22")]
    pub truncated: bool,
    #[packed_field(bits = "23")]
    pub recursion_desired: bool,
    #[packed_field(bits = "24")]
    pub recursion_available: bool,
    /// reserved, must be 0
    #[packed_field(bits = "25")]
    pub z: bool,
    #[packed_field(bits = "26")]
    pub ad: bool,
    #[packed_field(bits = "27")]
    pub cd: bool,
    #[packed_field(bits = "28..=31", ty = "enum")]
    pub rcode: Rcode,
    #[packed_field(bits = "32..=47", endian = "msb")]
    pub qdcount: u16,
    #[packed_field(bits = "48..=63", endian = "msb")]
    pub ancount: u16,
    #[packed_field(bits = "64..=79", endian = "msb")]
    pub nscount: u16,
    #[packed_field(bits = "80..=95", endian = "msb")]
    pub arcount: u16,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            id: 0,
            qr: PacketType::Query,
            opcode: OpCode::Query,
            authoritative: true,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            z: false,
            ad: false,
            cd: false,
            rcode: Rcode::NoError,
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }
}

impl Header {
    pub fn as_answer(self) -> Header {
        Header {
            qr: PacketType::Answer,
            ..self
        }
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self, ServerError> {
        let mut bytes = [0u8; HEADER_BYTES];
        bytes.copy_from_slice(
            buf.get(0..HEADER_BYTES)
                .ok_or(ServerError::FormatError("message shorter than a header"))?,
        );
        Header::unpack(&bytes).map_err(|e| ServerError::BytePackingError(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ServerError> {
        Ok(self.pack()?.to_vec())
    }
}

/// A full DNS message: header, question and the three RR sections. This
/// is the unit every component (query responder, update engine, AXFR
/// responder) consumes and produces.
#[derive(Clone, Debug)]
pub struct Message {
    pub header: Header,
    /// RFC1035 allows QDCOUNT > 1 in principle; in practice (and per
    /// spec.md §4.3/§4.4) every opcode this server implements requires
    /// exactly one question, so this is always a single element once
    /// validated.
    pub question: Vec<Question>,
    pub answer: Vec<ResourceRecord>,
    /// The UPDATE opcode overloads this as the "Prerequisite" section
    /// and, for the update engine, builds a separate "Update" section
    /// carried out-of-band by `update::apply` rather than through this
    /// field — see `update.rs`.
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    pub fn from_wire(buf: &[u8]) -> Result<Self, ServerError> {
        let header = Header::from_wire(buf)?;
        let mut offset = HEADER_BYTES;
        let mut question = Vec::with_capacity(header.qdcount as usize);
        for _ in 0..header.qdcount {
            let (q, next) = Question::from_wire(buf, offset)?;
            question.push(q);
            offset = next;
        }
        let answer = read_rr_section(buf, &mut offset, header.ancount)?;
        let authority = read_rr_section(buf, &mut offset, header.nscount)?;
        let additional = read_rr_section(buf, &mut offset, header.arcount)?;
        // EDNS-OPT is an Additional-only pseudo-RR (§4.1); anywhere else
        // is a format error.
        let opt_outside_additional = answer
            .iter()
            .chain(authority.iter())
            .any(|rr| rr.record_type() == crate::enums::RecordType::OPT);
        if opt_outside_additional {
            return Err(ServerError::FormatError("EDNS-OPT outside Additional section"));
        }
        Ok(Message {
            header,
            question,
            answer,
            authority,
            additional,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ServerError> {
        let mut out = self.header.to_bytes()?;
        for q in &self.question {
            out.extend(q.to_bytes());
        }
        for rr in &self.answer {
            out.extend(rr.to_bytes(None));
        }
        for rr in &self.authority {
            out.extend(rr.to_bytes(None));
        }
        for rr in &self.additional {
            out.extend(rr.to_bytes(None));
        }
        Ok(out)
    }

    /// Encodes the message, failing with `ServerError::Buffer` if the
    /// result would exceed `limit` — the only circumstance in which
    /// encode is allowed to fail (§4.1). Used by the UDP sender to stay
    /// within the negotiated (or default) payload size; the TCP path
    /// has no such limit beyond the 2-byte length prefix itself.
    pub fn to_bytes_within(&self, limit: usize) -> Result<Vec<u8>, ServerError> {
        let bytes = self.to_bytes()?;
        if bytes.len() > limit {
            return Err(ServerError::Buffer);
        }
        Ok(bytes)
    }

    /// The EDNS OPT pseudo-RR from the Additional section, if present.
    pub fn edns_opt(&self) -> Option<&ResourceRecord> {
        self.additional
            .iter()
            .find(|rr| rr.record_type() == crate::enums::RecordType::OPT)
    }
}

fn read_rr_section(
    buf: &[u8],
    offset: &mut usize,
    count: u16,
) -> Result<Vec<ResourceRecord>, ServerError> {
    use crate::name::Name;
    use crate::resourcerecord::InternalResourceRecord;
    use crate::wire::{decode_name, get_u16, get_u32};

    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (name, after_name): (Name, usize) = decode_name(buf, *offset)?;
        let rtype_num = get_u16(buf, after_name)?;
        let rtype = crate::enums::RecordType::from(&rtype_num);
        let class = crate::enums::RecordClass::from(&get_u16(buf, after_name + 2)?);
        let ttl = get_u32(buf, after_name + 4)?;
        let rdlength = get_u16(buf, after_name + 8)? as usize;
        let rdata_offset = after_name + 10;
        if rtype == crate::enums::RecordType::OPT {
            // RFC6891 §6.1.2: the "class" and "ttl" envelope fields are
            // repurposed, not a real class/TTL.
            let class_u16 = get_u16(buf, after_name + 2)?;
            out.push(ResourceRecord {
                name,
                class: crate::enums::RecordClass::InvalidType,
                ttl,
                rdata: InternalResourceRecord::Opt {
                    udp_payload_size: class_u16,
                    extended_rcode_high: (ttl >> 24) as u8,
                    version: (ttl >> 16) as u8,
                    dnssec_ok: (ttl & 0x8000) != 0,
                },
            });
            *offset = rdata_offset + rdlength;
            continue;
        }
        let rdata = if rtype.supported() {
            InternalResourceRecord::from_wire(rtype, buf, rdata_offset, rdlength)?
        } else {
            return Err(ServerError::FormatError("unsupported record type in message"));
        };
        out.push(ResourceRecord { name, class, ttl, rdata });
        *offset = rdata_offset + rdlength;
    }
    Ok(out)
}

#[cfg(test)]
mod header_tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let mut header = Header {
            id: 0xBEEF,
            qdcount: 1,
            ..Default::default()
        };
        header = header.as_answer();
        let bytes = header.to_bytes().unwrap();
        let decoded = Header::from_wire(&bytes).unwrap();
        assert_eq!(decoded, header);
    }
}
