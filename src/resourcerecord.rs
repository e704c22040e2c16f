//! Resource records as a tagged union (one variant per supported type),
//! each carrying its already-parsed RDATA fields rather than a boxed
//! trait object — §9's redesign flag against virtual dispatch for RDATA.

use crate::enums::{RecordClass, RecordType};
use crate::error::ServerError;
use crate::name::Name;
use crate::wire::{decode_name, encode_name, get_u16, get_u32};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rtype")]
pub enum InternalResourceRecord {
    A { address: Ipv4Addr },
    AAAA { address: Ipv6Addr },
    NS { nsdname: Name },
    CNAME { cname: Name },
    SOA {
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    PTR { ptrdname: Name },
    HINFO { cpu: String, os: String },
    MX { preference: u16, exchange: Name },
    TXT { data: String },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: Name,
    },
    /// A zero-length RDATA placeholder. RFC2136 deletes (class ANY) carry
    /// an empty RDATA regardless of type; this variant holds just the
    /// type tag so the delete still knows which RRset it targets without
    /// pretending to have decoded real type-specific fields.
    Empty { rtype: RecordType },
    /// EDNS(0) OPT pseudo-RR (RFC6891 §6.1.2). The owner name is always
    /// root; the "class" and "ttl" envelope fields are repurposed to
    /// carry the UDP payload size and the extended-RCODE/version/flags
    /// word, so this variant stores them decoded rather than pretending
    /// they're a real class/TTL. Options (RFC6891 §6.1.3) are not
    /// supported on either side; encode always emits an empty option list.
    Opt {
        udp_payload_size: u16,
        extended_rcode_high: u8,
        version: u8,
        dnssec_ok: bool,
    },
}

impl InternalResourceRecord {
    pub fn record_type(&self) -> RecordType {
        if let InternalResourceRecord::Empty { rtype } = self {
            return *rtype;
        }
        RecordType::from(self)
    }

    /// Encodes this record's RDATA only (the owner name, type, class and
    /// TTL live in the RR envelope, encoded by the caller).
    pub fn rdata_to_bytes(&self) -> Vec<u8> {
        match self {
            InternalResourceRecord::Empty { .. } => vec![],
            // OPT's envelope fields are encoded specially by
            // `ResourceRecord::to_bytes`; the RDATA (options list) is
            // always empty here since no EDNS option is supported.
            InternalResourceRecord::Opt { .. } => vec![],
            InternalResourceRecord::A { address } => address.octets().to_vec(),
            InternalResourceRecord::AAAA { address } => address.octets().to_vec(),
            InternalResourceRecord::NS { nsdname } => encode_name(nsdname, None),
            InternalResourceRecord::CNAME { cname } => encode_name(cname, None),
            InternalResourceRecord::PTR { ptrdname } => encode_name(ptrdname, None),
            InternalResourceRecord::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                let mut out = encode_name(mname, None);
                out.extend(encode_name(rname, None));
                out.extend(serial.to_be_bytes());
                out.extend(refresh.to_be_bytes());
                out.extend(retry.to_be_bytes());
                out.extend(expire.to_be_bytes());
                out.extend(minimum.to_be_bytes());
                out
            }
            InternalResourceRecord::HINFO { cpu, os } => {
                let mut out = vec![cpu.len() as u8];
                out.extend(cpu.as_bytes());
                out.push(os.len() as u8);
                out.extend(os.as_bytes());
                out
            }
            InternalResourceRecord::MX { preference, exchange } => {
                let mut out = preference.to_be_bytes().to_vec();
                out.extend(encode_name(exchange, None));
                out
            }
            InternalResourceRecord::TXT { data } => {
                let mut out = vec![data.len() as u8];
                out.extend(data.as_bytes());
                out
            }
            InternalResourceRecord::SRV {
                priority,
                weight,
                port,
                target,
            } => {
                let mut out = priority.to_be_bytes().to_vec();
                out.extend(weight.to_be_bytes());
                out.extend(port.to_be_bytes());
                out.extend(encode_name(target, None));
                out
            }
        }
    }

    /// Decodes RDATA of `rtype` found at `buf[offset..offset+rdlength]`.
    /// `buf`/`offset` (rather than just the slice) are needed because
    /// names inside RDATA may be compressed pointers into the whole message.
    pub fn from_wire(
        rtype: RecordType,
        buf: &[u8],
        offset: usize,
        rdlength: usize,
    ) -> Result<Self, ServerError> {
        if rdlength == 0 {
            // RFC2136 ANY-class prerequisites/deletes carry no RDATA regardless
            // of type; don't try to decode type-specific fields from nothing.
            return Ok(InternalResourceRecord::Empty { rtype });
        }
        let rdata = buf
            .get(offset..offset + rdlength)
            .ok_or(ServerError::FormatError("rdata runs past end of message"))?;
        match rtype {
            RecordType::A => {
                if rdata.len() != 4 {
                    return Err(ServerError::FormatError("A record rdata is not 4 bytes"));
                }
                Ok(InternalResourceRecord::A {
                    address: Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]),
                })
            }
            RecordType::AAAA => {
                if rdata.len() != 16 {
                    return Err(ServerError::FormatError("AAAA record rdata is not 16 bytes"));
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(rdata);
                Ok(InternalResourceRecord::AAAA {
                    address: Ipv6Addr::from(octets),
                })
            }
            RecordType::NS => {
                let (nsdname, _) = decode_name(buf, offset)?;
                Ok(InternalResourceRecord::NS { nsdname })
            }
            RecordType::CNAME => {
                let (cname, _) = decode_name(buf, offset)?;
                Ok(InternalResourceRecord::CNAME { cname })
            }
            RecordType::PTR => {
                let (ptrdname, _) = decode_name(buf, offset)?;
                Ok(InternalResourceRecord::PTR { ptrdname })
            }
            RecordType::SOA => {
                let (mname, after_mname) = decode_name(buf, offset)?;
                let (rname, after_rname) = decode_name(buf, after_mname)?;
                Ok(InternalResourceRecord::SOA {
                    mname,
                    rname,
                    serial: get_u32(buf, after_rname)?,
                    refresh: get_u32(buf, after_rname + 4)?,
                    retry: get_u32(buf, after_rname + 8)?,
                    expire: get_u32(buf, after_rname + 12)?,
                    minimum: get_u32(buf, after_rname + 16)?,
                })
            }
            RecordType::HINFO => {
                let cpu_len = *rdata
                    .first()
                    .ok_or(ServerError::FormatError("truncated HINFO"))? as usize;
                let cpu = String::from_utf8_lossy(
                    rdata
                        .get(1..1 + cpu_len)
                        .ok_or(ServerError::FormatError("truncated HINFO cpu"))?,
                )
                .into_owned();
                let os_start = 1 + cpu_len;
                let os_len = *rdata
                    .get(os_start)
                    .ok_or(ServerError::FormatError("truncated HINFO"))? as usize;
                let os = String::from_utf8_lossy(
                    rdata
                        .get(os_start + 1..os_start + 1 + os_len)
                        .ok_or(ServerError::FormatError("truncated HINFO os"))?,
                )
                .into_owned();
                Ok(InternalResourceRecord::HINFO { cpu, os })
            }
            RecordType::MX => {
                let preference = get_u16(buf, offset)?;
                let (exchange, _) = decode_name(buf, offset + 2)?;
                Ok(InternalResourceRecord::MX { preference, exchange })
            }
            RecordType::TXT => {
                let txt_len = *rdata
                    .first()
                    .ok_or(ServerError::FormatError("truncated TXT"))? as usize;
                let data = String::from_utf8_lossy(
                    rdata
                        .get(1..1 + txt_len)
                        .ok_or(ServerError::FormatError("truncated TXT data"))?,
                )
                .into_owned();
                Ok(InternalResourceRecord::TXT { data })
            }
            RecordType::SRV => {
                let priority = get_u16(buf, offset)?;
                let weight = get_u16(buf, offset + 2)?;
                let port = get_u16(buf, offset + 4)?;
                let (target, _) = decode_name(buf, offset + 6)?;
                Ok(InternalResourceRecord::SRV {
                    priority,
                    weight,
                    port,
                    target,
                })
            }
            _ => Err(ServerError::FormatError("unsupported record type")),
        }
    }
}

/// A single resource record: owner name, class, TTL and typed RDATA.
/// Equality ignores TTL, matching the RFC2136/RFC1035 notion of RR
/// identity used when deduplicating an RRset or matching a delete.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: Name,
    pub class: RecordClass,
    pub ttl: u32,
    pub rdata: InternalResourceRecord,
}

impl ResourceRecord {
    pub fn record_type(&self) -> RecordType {
        self.rdata.record_type()
    }

    /// Builds an EDNS(0) OPT pseudo-RR for the Additional section.
    /// `class`/`ttl` are irrelevant for OPT (see `InternalResourceRecord::Opt`)
    /// and set to harmless placeholders; only `rdata` is actually encoded.
    pub fn edns_opt(udp_payload_size: u16, extended_rcode_high: u8, version: u8, dnssec_ok: bool) -> Self {
        ResourceRecord {
            name: Name::root(),
            class: RecordClass::InvalidType,
            ttl: 0,
            rdata: InternalResourceRecord::Opt {
                udp_payload_size,
                extended_rcode_high,
                version,
                dnssec_ok,
            },
        }
    }

    pub fn to_bytes(&self, compress_target: Option<u16>) -> Vec<u8> {
        if let InternalResourceRecord::Opt {
            udp_payload_size,
            extended_rcode_high,
            version,
            dnssec_ok,
        } = &self.rdata
        {
            // RFC6891 §6.1.2: owner is root, "class" is UDP payload size,
            // "TTL" is extended-RCODE(8)/version(8)/flags(16).
            let mut out = encode_name(&self.name, compress_target);
            out.extend((RecordType::OPT as u16).to_be_bytes());
            out.extend(udp_payload_size.to_be_bytes());
            let flags: u32 = ((*extended_rcode_high as u32) << 24)
                | ((*version as u32) << 16)
                | if *dnssec_ok { 1 << 15 } else { 0 };
            out.extend(flags.to_be_bytes());
            out.extend(0u16.to_be_bytes());
            return out;
        }
        let mut out = encode_name(&self.name, compress_target);
        out.extend((self.record_type() as u16).to_be_bytes());
        out.extend((self.class as u16).to_be_bytes());
        out.extend(self.ttl.to_be_bytes());
        let rdata = self.rdata.rdata_to_bytes();
        out.extend((rdata.len() as u16).to_be_bytes());
        out.extend(rdata);
        out
    }
}

impl PartialEq for ResourceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.class == other.class && self.rdata == other.rdata
    }
}
impl Eq for ResourceRecord {}

/// An RRset: all records sharing an owner name, class and type. Modeled
/// as a plain `Vec` with swap-remove deletion rather than a linked list
/// with interior pointers (§9's redesign flag).
#[derive(Clone, Debug, Default)]
pub struct RRset {
    pub records: Vec<ResourceRecord>,
}

impl RRset {
    pub fn new() -> Self {
        RRset { records: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds `rr`, deduplicating by RR-equality (ignoring TTL) per RFC1035 §5.2.
    pub fn add_dedup(&mut self, rr: ResourceRecord) {
        if !self.records.iter().any(|existing| existing == &rr) {
            self.records.push(rr);
        }
    }

    /// Removes the first record matching `rr` by RR-equality. Returns whether anything was removed.
    pub fn remove_matching(&mut self, rr: &ResourceRecord) -> bool {
        if let Some(pos) = self.records.iter().position(|existing| existing == rr) {
            self.records.swap_remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_record_round_trips() {
        let rr = ResourceRecord {
            name: Name::from_text("host.example.com"),
            class: RecordClass::Internet,
            ttl: 300,
            rdata: InternalResourceRecord::A {
                address: Ipv4Addr::new(192, 0, 2, 1),
            },
        };
        let bytes = rr.to_bytes(None);
        let name_len = encode_name(&rr.name, None).len();
        let rdlen_offset = name_len + 8;
        assert_eq!(
            u16::from_be_bytes([bytes[rdlen_offset], bytes[rdlen_offset + 1]]),
            4
        );
        let decoded = InternalResourceRecord::from_wire(
            RecordType::A,
            &bytes,
            rdlen_offset + 2,
            4,
        )
        .unwrap();
        assert_eq!(decoded, rr.rdata);
    }

    #[test]
    fn rrset_dedups_and_ignores_ttl() {
        let mut set = RRset::new();
        let rr1 = ResourceRecord {
            name: Name::from_text("host.example.com"),
            class: RecordClass::Internet,
            ttl: 300,
            rdata: InternalResourceRecord::A {
                address: Ipv4Addr::new(192, 0, 2, 1),
            },
        };
        let mut rr2 = rr1.clone();
        rr2.ttl = 600;
        set.add_dedup(rr1);
        set.add_dedup(rr2);
        assert_eq!(set.records.len(), 1);
    }

    #[test]
    fn rrset_remove_swap_remove() {
        let mut set = RRset::new();
        let a = ResourceRecord {
            name: Name::from_text("a.example.com"),
            class: RecordClass::Internet,
            ttl: 60,
            rdata: InternalResourceRecord::A {
                address: Ipv4Addr::new(10, 0, 0, 1),
            },
        };
        let b = ResourceRecord {
            name: Name::from_text("b.example.com"),
            class: RecordClass::Internet,
            ttl: 60,
            rdata: InternalResourceRecord::A {
                address: Ipv4Addr::new(10, 0, 0, 2),
            },
        };
        set.add_dedup(a.clone());
        set.add_dedup(b.clone());
        assert!(set.remove_matching(&a));
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0], b);
    }
}
