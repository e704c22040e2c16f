//! Crate-level integration tests for the concrete end-to-end scenarios
//! in spec.md §8. Per-module unit tests already cover the individual
//! algorithms (`query.rs`, `update.rs`, `axfr.rs`, `dispatch.rs`); these
//! exercise the same literal values spec.md §8 names, through the full
//! wire-encode → dispatch → wire-decode path.

use crate::datastore::ZoneStore;
use crate::dispatch::{dispatch, DispatchOutcome, ServerContext, Transport};
use crate::enums::{RecordClass, RecordType, Rcode};
use crate::name::Name;
use crate::question::Question;
use crate::resourcerecord::{InternalResourceRecord, ResourceRecord};
use crate::update::UpdatePolicy;
use crate::zones::Zone;
use crate::{Header, Message};
use std::net::{Ipv4Addr, TcpListener, TcpStream};

fn soa(apex: &Name, serial: u32) -> ResourceRecord {
    ResourceRecord {
        name: apex.clone(),
        class: RecordClass::Internet,
        ttl: 3600,
        rdata: InternalResourceRecord::SOA {
            mname: Name::from_text("ns1.example.com"),
            rname: Name::from_text("hostmaster.example.com"),
            serial,
            refresh: 3600,
            retry: 600,
            expire: 86400,
            minimum: 300,
        },
    }
}

fn a_record(name: &str, address: Ipv4Addr) -> ResourceRecord {
    ResourceRecord {
        name: Name::from_text(name),
        class: RecordClass::Internet,
        ttl: 60,
        rdata: InternalResourceRecord::A { address },
    }
}

fn query_message(id: u16, qname: &str, qtype: RecordType) -> Message {
    Message {
        header: Header {
            id,
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

/// Scenario 1: A-record query hit.
#[test]
fn scenario_a_record_query_hit() {
    let apex = Name::from_text("example.com");
    let mut zone = Zone::new(apex.clone(), soa(&apex, 10));
    zone.add_record(a_record("www.example.com", Ipv4Addr::new(192, 0, 2, 7)));
    let store = ZoneStore::from_zones(vec![zone]);
    let policy = UpdatePolicy::default();

    let raw = query_message(0x1234, "www.example.com", RecordType::A)
        .to_bytes()
        .unwrap();
    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a Reply"),
    };

    assert_eq!(reply.header.id, 0x1234);
    assert!(reply.header.authoritative);
    assert_eq!(reply.header.rcode, Rcode::NoError);
    assert_eq!(reply.answer.len(), 1);
    assert_eq!(reply.answer[0].record_type(), RecordType::A);
    assert_eq!(reply.authority.len(), 1);
    assert_eq!(reply.authority[0].record_type(), RecordType::SOA);

    let round_tripped = Message::from_wire(&reply.to_bytes().unwrap()).unwrap();
    assert_eq!(round_tripped.header.id, 0x1234);
    assert_eq!(round_tripped.answer.len(), 1);
}

/// Scenario 2: NXDOMAIN for a name under no registered zone.
#[test]
fn scenario_nxdomain() {
    let apex = Name::from_text("example.com");
    let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex, 1))]);
    let policy = UpdatePolicy::default();

    let raw = query_message(1, "missing.other-tld.", RecordType::A)
        .to_bytes()
        .unwrap();
    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a Reply"),
    };
    assert_eq!(reply.header.rcode, Rcode::NameError);
    assert!(!reply.header.authoritative);
    assert!(reply.answer.is_empty());
}

/// Scenario 3: AXFR over UDP is a policy error.
#[test]
fn scenario_axfr_over_udp_is_servfail() {
    let apex = Name::from_text("example.com");
    let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex, 1))]);
    let policy = UpdatePolicy::default();

    let raw = query_message(2, "example.com", RecordType::AXFR)
        .to_bytes()
        .unwrap();
    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a single Reply"),
    };
    assert_eq!(reply.header.rcode, Rcode::ServFail);
}

/// Scenario 4: AXFR over TCP streams SOA, 3 A records, SOA.
#[test]
fn scenario_axfr_over_tcp_streams_soa_first_and_last() {
    let apex = Name::from_text("example.com");
    let mut zone = Zone::new(apex.clone(), soa(&apex, 5));
    zone.add_record(a_record("a1.example.com", Ipv4Addr::new(192, 0, 2, 1)));
    zone.add_record(a_record("a2.example.com", Ipv4Addr::new(192, 0, 2, 2)));
    zone.add_record(a_record("a3.example.com", Ipv4Addr::new(192, 0, 2, 3)));
    let store = ZoneStore::from_zones(vec![zone]);
    let policy = UpdatePolicy::default();

    let raw = query_message(0x77, "example.com", RecordType::AXFR)
        .to_bytes()
        .unwrap();
    let (query_id, question, zone) = match dispatch(&raw, Transport::Tcp, &ctx(&store, &policy)) {
        DispatchOutcome::Axfr { query_id, question, zone } => (query_id, question, zone),
        _ => panic!("expected an Axfr hand-off"),
    };

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        crate::axfr::stream_zone(&mut stream, query_id, &question, &zone).unwrap();
    });

    let mut client = TcpStream::connect(addr).unwrap();
    let mut messages = Vec::new();
    loop {
        use std::io::Read;
        let mut len_buf = [0u8; 2];
        if client.read_exact(&mut len_buf).is_err() {
            break;
        }
        let len = u16::from_be_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        client.read_exact(&mut buf).unwrap();
        messages.push(Message::from_wire(&buf).unwrap());
    }
    server.join().unwrap();

    assert_eq!(messages.len(), 5);
    for message in &messages {
        assert_eq!(message.header.id, 0x77);
        assert!(message.header.authoritative);
        assert_eq!(message.header.rcode, Rcode::NoError);
        assert_eq!(message.answer.len(), 1);
    }
    assert_eq!(messages[0].answer[0].record_type(), RecordType::SOA);
    assert_eq!(messages[4].answer[0].record_type(), RecordType::SOA);
    for middle in &messages[1..4] {
        assert_eq!(middle.answer[0].record_type(), RecordType::A);
    }
}

fn update_message(zname: &str, prereq: Vec<ResourceRecord>, updates: Vec<ResourceRecord>) -> Message {
    Message {
        header: Header {
            qdcount: 1,
            ancount: prereq.len() as u16,
            nscount: updates.len() as u16,
            ..Default::default()
        },
        question: vec![Question {
            qname: Name::from_text(zname),
            qtype: RecordType::SOA,
            qclass: RecordClass::Internet,
        }],
        answer: prereq,
        authority: updates,
        additional: vec![],
    }
}

/// Scenario 5: UPDATE add bumps the serial from 10 to 11.
#[test]
fn scenario_update_add_bumps_serial() {
    let apex = Name::from_text("example.com");
    let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex, 10))]);
    let policy = UpdatePolicy::default();

    let add = ResourceRecord {
        name: Name::from_text("new.example.com"),
        class: RecordClass::Internet,
        ttl: 60,
        rdata: InternalResourceRecord::A {
            address: Ipv4Addr::new(192, 0, 2, 50),
        },
    };
    let raw = update_message("example.com", vec![], vec![add]).to_bytes().unwrap();

    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a Reply"),
    };
    assert_eq!(reply.header.rcode, Rcode::NoError);

    let zone = store.find_zone(&apex).unwrap();
    assert_eq!(zone.serial(), 11);
    assert!(zone.rrset(&Name::from_text("new.example.com"), RecordType::A).is_some());
}

/// Scenario 6: UPDATE delete-RRset removes both A RRs at `dup.example.com`.
#[test]
fn scenario_update_delete_rrset_removes_both_records() {
    let apex = Name::from_text("example.com");
    let mut zone = Zone::new(apex.clone(), soa(&apex, 10));
    zone.add_record(a_record("dup.example.com", Ipv4Addr::new(192, 0, 2, 1)));
    zone.add_record(a_record("dup.example.com", Ipv4Addr::new(192, 0, 2, 2)));
    let store = ZoneStore::from_zones(vec![zone]);
    let policy = UpdatePolicy::default();

    let delete_rrset = ResourceRecord {
        name: Name::from_text("dup.example.com"),
        class: RecordClass::Any,
        ttl: 0,
        rdata: InternalResourceRecord::Empty {
            rtype: RecordType::A,
        },
    };
    let raw = update_message("example.com", vec![], vec![delete_rrset]).to_bytes().unwrap();

    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a Reply"),
    };
    assert_eq!(reply.header.rcode, Rcode::NoError);

    let zone = store.find_zone(&apex).unwrap();
    assert!(zone.rrset(&Name::from_text("dup.example.com"), RecordType::A).is_none());
    assert_eq!(zone.serial(), 11);
}

/// Scenario 7: UPDATE zone-delete removes the zone from the store.
#[test]
fn scenario_update_zone_delete_removes_zone() {
    let apex = Name::from_text("example.com");
    let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex, 10))]);
    let policy = UpdatePolicy::default();

    let delete_zone = ResourceRecord {
        name: apex.clone(),
        class: RecordClass::Any,
        ttl: 0,
        rdata: InternalResourceRecord::Empty {
            rtype: RecordType::SOA,
        },
    };
    let raw = update_message("example.com", vec![], vec![delete_zone]).to_bytes().unwrap();

    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a Reply"),
    };
    assert_eq!(reply.header.rcode, Rcode::NoError);
    assert!(store.find_zone(&apex).is_none());
}

/// Scenario 8: UPDATE prereq `NONE ANY` against an existing name is YXDOMAIN.
#[test]
fn scenario_update_prereq_yxdomain_leaves_zone_unchanged() {
    let apex = Name::from_text("example.com");
    let store = ZoneStore::from_zones(vec![Zone::new(apex.clone(), soa(&apex, 10))]);
    let policy = UpdatePolicy::default();

    let prereq = ResourceRecord {
        name: apex.clone(),
        class: RecordClass::None,
        ttl: 0,
        rdata: InternalResourceRecord::Empty {
            rtype: RecordType::ANY,
        },
    };
    let raw = update_message("example.com", vec![prereq], vec![]).to_bytes().unwrap();

    let reply = match dispatch(&raw, Transport::Udp, &ctx(&store, &policy)) {
        DispatchOutcome::Reply(message) => message,
        _ => panic!("expected a Reply"),
    };
    assert_eq!(reply.header.rcode, Rcode::YXDomain);
    assert_eq!(store.find_zone(&apex).unwrap().serial(), 10);
}
