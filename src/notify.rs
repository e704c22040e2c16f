//! NOTIFY emission (§4.6, RFC 1996). Grounded on `send_notify` in the
//! original `dns_bsd3.c`, the only implementation of it in the source
//! this spec distills: for each NS at the zone apex, resolve its first A
//! record only (IPv6 targets are not notified, and only the first
//! address on multi-A names is used) and send a best-effort NOTIFY
//! datagram, skipping the server's own configured address. Failures to
//! send are not retried or reported — SPEC_FULL.md §2 keeps this
//! behavior as specified rather than "fixing" it, since its intent in
//! the original isn't knowable.

use crate::datastore::ZoneStore;
use crate::enums::{OpCode, PacketType, RecordClass, RecordType, Rcode};
use crate::name::Name;
use crate::question::Question;
use crate::resourcerecord::InternalResourceRecord;
use crate::zones::Zone;
use crate::{Header, Message};
use std::net::{Ipv4Addr, UdpSocket};

/// Sends NOTIFY to every secondary listed in `zone`'s apex NS set. `own_address`
/// is filtered out so the server never notifies itself.
pub fn notify_zone(zone: &Zone, store: &ZoneStore, own_address: Ipv4Addr) {
    let message = build_notify_message(zone);
    let bytes = match message.to_bytes() {
        Ok(bytes) => bytes,
        Err(_) => return,
    };

    let socket = match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => socket,
        Err(_) => return,
    };

    for ns in zone.apex_nameservers() {
        let Some(address) = first_a_record(&ns, store) else {
            continue;
        };
        if address == own_address {
            continue;
        }
        // Best-effort: the original discards sendto's return value too.
        let _ = socket.send_to(&bytes, (address, 53));
    }
}

fn build_notify_message(zone: &Zone) -> Message {
    let mut header = Header {
        id: rand::random(),
        qr: PacketType::Query,
        opcode: OpCode::Notify,
        authoritative: true,
        qdcount: 1,
        rcode: Rcode::NoError,
        ..Default::default()
    };
    header.authoritative = true;
    Message {
        header,
        question: vec![Question {
            qname: zone.apex.clone(),
            qtype: RecordType::SOA,
            qclass: RecordClass::Internet,
        }],
        answer: vec![],
        authority: vec![],
        additional: vec![],
    }
}

/// Looks up the first A record for `name`, following the same
/// suffix-based zone lookup the query path uses, since a nameserver's
/// glue may live in a zone this server also hosts.
fn first_a_record(name: &Name, store: &ZoneStore) -> Option<Ipv4Addr> {
    let zone = store.find_zone(name)?;
    let set = zone.rrset(name, RecordType::A)?;
    set.records.first().and_then(|rr| match &rr.rdata {
        InternalResourceRecord::A { address } => Some(*address),
        _ => None,
    })
}
