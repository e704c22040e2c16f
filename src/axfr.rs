//! AXFR streaming (§4.5): one reply message per RR, SOA-first and
//! SOA-last, each length-prefixed on the TCP stream per RFC1035 §4.2.2.
//! The caller (the dispatcher, via `query::dispatch_query`) has already
//! cloned the zone and released the store lock before calling in here —
//! this module never touches `ZoneStore` (§9's explicit-lock-contract
//! redesign flag).

use crate::question::Question;
use crate::resourcerecord::ResourceRecord;
use crate::zones::Zone;
use crate::{Header, Message};
use std::io::Write;
use std::net::TcpStream;

/// Streams `zone` over `stream` in response to `question`/`query_id`.
/// A write failure aborts the transfer immediately (§4.5, §7): the
/// caller must not attempt any further response on this connection.
pub fn stream_zone(
    stream: &mut TcpStream,
    query_id: u16,
    question: &Question,
    zone: &Zone,
) -> std::io::Result<()> {
    let soa = zone.soa().clone();
    send_one(stream, query_id, question, soa.clone())?;
    for rr in zone.all_records() {
        if rr.record_type() == crate::enums::RecordType::SOA && rr.name == zone.apex {
            continue;
        }
        send_one(stream, query_id, question, rr.clone())?;
    }
    send_one(stream, query_id, question, soa)?;
    Ok(())
}

/// Sends one AXFR message carrying exactly `rr` in Answer, length-prefixed.
fn send_one(
    stream: &mut TcpStream,
    query_id: u16,
    question: &Question,
    rr: ResourceRecord,
) -> std::io::Result<()> {
    let header = Header {
        id: query_id,
        qdcount: 1,
        ancount: 1,
        authoritative: true,
        ..Default::default()
    }
    .as_answer();
    let message = Message {
        header,
        question: vec![question.clone()],
        answer: vec![rr],
        authority: vec![],
        additional: vec![],
    };
    let bytes = message
        .to_bytes()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let len = u16::try_from(bytes.len())
        .map_err(|_| std::io::Error::other("AXFR message too large to length-prefix"))?
        .to_be_bytes();
    stream.write_all(&len)?;
    stream.write_all(&bytes)?;
    Ok(())
}
