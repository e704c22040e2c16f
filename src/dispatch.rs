//! The dispatcher (§4.7): the single entry point every server loop calls
//! after wire-decode. Classifies by OPCODE and routes to the matching
//! component, each of which manages its own locking (§5) — the
//! dispatcher itself never touches `store.lock` or `store.update_lock`
//! directly. Mirrors EDNS on every reply that isn't an AXFR hand-off.
//!
//! Grounded on the opcode `switch` in the original `dns_server.c`'s
//! `handle_dns_request`, flattened per §9's redesign flag against
//! dynamic dispatch by opcode: one match arm per opcode, each calling a
//! free function.

use crate::datastore::ZoneStore;
use crate::enums::{OpCode, PacketType, RecordType, Rcode};
use crate::notify;
use crate::query::{self, QueryOutcome};
use crate::question::Question;
use crate::resourcerecord::{InternalResourceRecord, ResourceRecord};
use crate::update::{self, UpdatePolicy};
use crate::zones::Zone;
use crate::Message;
use std::net::Ipv4Addr;

/// Transport the request arrived over. Only this decides whether an
/// AXFR qtype is serviced or refused (§4.3 step 5).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transport {
    Udp,
    Tcp,
}

/// What the caller (a server loop) must do with the result of dispatch.
pub enum DispatchOutcome {
    /// Send this message back to the requester.
    Reply(Message),
    /// qtype=AXFR arrived over TCP: the caller must stream `zone` via
    /// `axfr::stream_zone` using `query_id`/`question`, and send nothing
    /// else on this connection (§4.3 step 5, §4.5).
    Axfr { query_id: u16, question: Question, zone: Zone },
    /// Decode failed, or a response arrived at this server: drop
    /// silently, no reply (§4.7, §7).
    Drop,
}

/// Everything dispatch needs that isn't carried in the wire message
/// itself. One of these is built once at server startup and shared
/// (by reference) across every request.
pub struct ServerContext<'a> {
    pub store: &'a ZoneStore,
    pub update_policy: &'a UpdatePolicy,
    /// The server's own configured address, used to filter
    /// self-notification out of the NOTIFY emitter (§4.6).
    pub own_address: Ipv4Addr,
    pub notify_enabled: bool,
}

/// The UDP payload size this server advertises when it has EDNS to
/// mirror back (§4.1): 4096, matching modern resolver defaults.
const EDNS_UDP_PAYLOAD_SIZE: u16 = 4096;
/// Classic payload size used when the query carried no EDNS-OPT at all.
const CLASSIC_UDP_PAYLOAD_SIZE: u16 = 512;

/// Decodes and routes one request (§4.7). `transport` decides AXFR
/// eligibility and the payload-size ceiling used for the reply.
pub fn dispatch(raw: &[u8], transport: Transport, ctx: &ServerContext) -> DispatchOutcome {
    let query = match Message::from_wire(raw) {
        Ok(message) => message,
        Err(_) => return DispatchOutcome::Drop,
    };

    if query.header.qr == PacketType::Answer && query.header.opcode != OpCode::Notify {
        // A response arriving at a server (§4.7): drop.
        return DispatchOutcome::Drop;
    }

    let query_edns = query.edns_opt().and_then(|opt| match &opt.rdata {
        InternalResourceRecord::Opt { version, .. } => Some(*version),
        _ => None,
    });

    let mut header = query.header.clone().as_answer();
    header.opcode = query.header.opcode;
    header.rcode = Rcode::NotImplemented;
    header.authoritative = false;

    let mut answer = Message {
        header,
        question: query.question.clone(),
        answer: vec![],
        authority: vec![],
        additional: vec![],
    };

    match query.header.opcode {
        OpCode::Query => {
            if query.question.len() != 1 {
                answer.header.rcode = Rcode::FormatError;
            } else {
                let question = &query.question[0];
                match query::dispatch_query(question, ctx.store, transport == Transport::Tcp) {
                    QueryOutcome::Answer(result) => {
                        answer.header.rcode = result.rcode;
                        answer.header.authoritative = result.authoritative;
                        answer.answer = result.answer;
                        answer.authority = result.authority;
                    }
                    QueryOutcome::Axfr(zone) => {
                        return DispatchOutcome::Axfr {
                            query_id: query.header.id,
                            question: question.clone(),
                            zone,
                        };
                    }
                    QueryOutcome::AxfrOverUdp => {
                        answer.header.rcode = Rcode::ServFail;
                    }
                }
            }
        }
        OpCode::Update => {
            let result = update::apply(&query, ctx.store, ctx.update_policy);
            answer.header.rcode = result.rcode;
            answer.header.authoritative = true;
            if ctx.notify_enabled {
                if let Some(zone) = result.notify {
                    notify::notify_zone(&zone, ctx.store, ctx.own_address);
                }
            }
        }
        OpCode::Notify => {
            // Acknowledged like a query, no locking (§4.6): polling the
            // notified primary is out of scope, this is purely the ACK.
            answer.header.rcode = Rcode::NoError;
            answer.header.authoritative = true;
        }
        OpCode::Status | OpCode::Reserved => {
            // RCODE stays NOTIMPL, set above.
        }
    }

    mirror_edns(&mut answer, query_edns);

    // The header's section counts are part of the wire format, not
    // derived from the vectors at encode time (`Message::to_bytes`
    // trusts them literally) — keep them in sync with what was actually
    // assembled above.
    answer.header.qdcount = answer.question.len() as u16;
    answer.header.ancount = answer.answer.len() as u16;
    answer.header.nscount = answer.authority.len() as u16;
    answer.header.arcount = answer.additional.len() as u16;

    DispatchOutcome::Reply(answer)
}

/// Sets the reply's UDP payload size limit given whatever EDNS it's
/// carrying — 4096 if the query had EDNS-OPT, the classic 512 otherwise.
pub fn udp_payload_limit(outcome_had_edns: bool) -> usize {
    if outcome_had_edns {
        EDNS_UDP_PAYLOAD_SIZE as usize
    } else {
        CLASSIC_UDP_PAYLOAD_SIZE as usize
    }
}

/// Appends an OPT RR to `answer`'s Additional section when the query had
/// one, advertising our payload size and, if the query's EDNS version is
/// unsupported (> 0), the extended-RCODE bits for BADVERS (§4.1).
fn mirror_edns(answer: &mut Message, query_edns_version: Option<u8>) {
    let Some(version) = query_edns_version else {
        return;
    };
    let extended_rcode_high = if version > 0 { 1u8 } else { 0u8 };
    answer.additional.push(ResourceRecord::edns_opt(
        EDNS_UDP_PAYLOAD_SIZE,
        extended_rcode_high,
        0,
        false,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::ZoneStore;
    use crate::enums::RecordClass;
    use crate::name::Name;
    use crate::question::Question;
    use crate::Header;
    use std::net::Ipv4Addr;

    fn soa(apex: &Name) -> ResourceRecord {
        ResourceRecord {
            name: apex.clone(),
            class: RecordClass::Internet,
            ttl: 3600,
            rdata: InternalResourceRecord::SOA {
                mname: Name::from_text("ns1.example.com"),
                rname: Name::from_text("hostmaster.example.com"),
                serial: 1,
                refresh: 3600,
                retry: 600,
                expire: 86400,
                minimum: 300,
            },
        }
    }

    fn query_message(qname: &str, qtype: RecordType) -> Message {
        Message {
            header: Header {
                id: 0x1234,
                qdcount: 1,
                ..Default::default()
            },
            question: vec![Question {
                qname: Name::from_text(qname),
                qtype,
                qclass: RecordClass::Internet,
            }],
            answer: vec![],
            authority: vec![],
            additional: vec![],
        }
    }

    fn ctx<'a>(store: &'a ZoneStore, policy: &'a UpdatePolicy) -> ServerContext<'a> {
        ServerContext {
            store,
            update_policy: policy,
            own_address: Ipv4Addr::new(127, 0, 0, 1),
            notify_enabled: false,
        }
    }

    #[test]
    fn query_for_missing_zone_is_nxdomain() {
        let apex = Name::from_text("example.com");
        let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex))]);
        let policy = UpdatePolicy::default();
        let raw = query_message("other-tld.", RecordType::A).to_bytes().unwrap();
        match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
            DispatchOutcome::Reply(reply) => assert_eq!(reply.header.rcode, Rcode::NameError),
            _ => panic!("expected a Reply"),
        }
    }

    #[test]
    fn axfr_over_udp_is_servfail() {
        let apex = Name::from_text("example.com");
        let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex))]);
        let policy = UpdatePolicy::default();
        let raw = query_message("example.com", RecordType::AXFR).to_bytes().unwrap();
        match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
            DispatchOutcome::Reply(reply) => assert_eq!(reply.header.rcode, Rcode::ServFail),
            _ => panic!("expected a Reply"),
        }
    }

    #[test]
    fn axfr_over_tcp_hands_off() {
        let apex = Name::from_text("example.com");
        let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex))]);
        let policy = UpdatePolicy::default();
        let raw = query_message("example.com", RecordType::AXFR).to_bytes().unwrap();
        match dispatch(&raw, Transport::Tcp, &ctx(&store, &policy)) {
            DispatchOutcome::Axfr { zone, .. } => assert_eq!(zone.apex, apex),
            _ => panic!("expected Axfr hand-off"),
        }
    }

    #[test]
    fn response_arriving_at_server_is_dropped() {
        let apex = Name::from_text("example.com");
        let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex))]);
        let policy = UpdatePolicy::default();
        let mut msg = query_message("example.com", RecordType::A);
        msg.header = msg.header.as_answer();
        let raw = msg.to_bytes().unwrap();
        match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
            DispatchOutcome::Drop => {}
            _ => panic!("expected Drop"),
        }
    }

    #[test]
    fn notify_opcode_is_acknowledged() {
        let apex = Name::from_text("example.com");
        let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex))]);
        let policy = UpdatePolicy::default();
        let mut msg = query_message("example.com", RecordType::SOA);
        msg.header.opcode = OpCode::Notify;
        let raw = msg.to_bytes().unwrap();
        match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
            DispatchOutcome::Reply(reply) => {
                assert_eq!(reply.header.rcode, Rcode::NoError);
                assert!(reply.header.authoritative);
            }
            _ => panic!("expected a Reply"),
        }
    }

    #[test]
    fn edns_is_mirrored_with_payload_4096() {
        let apex = Name::from_text("example.com");
        let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex))]);
        let policy = UpdatePolicy::default();
        let mut msg = query_message("example.com", RecordType::SOA);
        msg.header.arcount = 1;
        msg.additional.push(ResourceRecord::edns_opt(1232, 0, 0, false));
        let raw = msg.to_bytes().unwrap();
        match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
            DispatchOutcome::Reply(reply) => {
                let opt = reply.edns_opt().expect("expected mirrored OPT RR");
                match &opt.rdata {
                    InternalResourceRecord::Opt { udp_payload_size, .. } => {
                        assert_eq!(*udp_payload_size, 4096);
                    }
                    _ => panic!("expected Opt rdata"),
                }
            }
            _ => panic!("expected a Reply"),
        }
    }
}
