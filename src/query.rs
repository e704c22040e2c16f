//! The query responder (§4.3): handles OPCODE=QUERY for everything except
//! AXFR, which the dispatcher routes to `axfr` instead. Grounded on
//! `handle_dns_query`/`get_rrset_into` in the original `dns_server.c`:
//! zone lookup by longest suffix, CNAME chase capped at
//! `CNAME_CHASE_LIMIT`, SOA-carrying negative responses.

use crate::datastore::ZoneStore;
use crate::enums::{RecordType, Rcode};
use crate::name::Name;
use crate::question::Question;
use crate::resourcerecord::{InternalResourceRecord, ResourceRecord};
use crate::zones::Zone;
use crate::CNAME_CHASE_LIMIT;

pub struct QueryResult {
    pub rcode: Rcode,
    pub authoritative: bool,
    pub answer: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
}

/// What the dispatcher should do with a QUERY, after §4.3 steps 1-5.
pub enum QueryOutcome {
    /// A complete answer to send back as-is.
    Answer(QueryResult),
    /// qtype=AXFR over TCP: the dispatcher must hand this zone clone to
    /// the AXFR responder (§4.5) and send no other response itself.
    Axfr(Zone),
    /// qtype=AXFR over UDP: policy error, RCODE=SERVFAIL (§4.3 step 5, §7).
    AxfrOverUdp,
}

/// Entry point for OPCODE=QUERY (§4.3 steps 2-6). `over_tcp` decides how
/// an AXFR qtype is handled: only TCP may stream a zone transfer.
/// Validation of QDCOUNT=1 (§4.3 step 1) is the dispatcher's job, since
/// it applies before a single `Question` can even be named here.
pub fn dispatch_query(question: &Question, store: &ZoneStore, over_tcp: bool) -> QueryOutcome {
    if question.qtype == RecordType::AXFR {
        return match store.find_zone(&question.qname) {
            None => QueryOutcome::Answer(QueryResult {
                rcode: Rcode::NameError,
                authoritative: false,
                answer: vec![],
                authority: vec![],
            }),
            Some(zone) => {
                if over_tcp {
                    QueryOutcome::Axfr(zone)
                } else {
                    QueryOutcome::AxfrOverUdp
                }
            }
        };
    }
    QueryOutcome::Answer(respond(question, store))
}

/// Answers a single question. The caller is responsible for QDCOUNT
/// validation (§4.3 step 1) before calling this.
pub fn respond(question: &Question, store: &ZoneStore) -> QueryResult {
    let zone = match store.find_zone(&question.qname) {
        Some(zone) => zone,
        None => {
            return QueryResult {
                rcode: Rcode::NameError,
                authoritative: false,
                answer: vec![],
                authority: vec![],
            }
        }
    };

    let mut answer = Vec::new();
    let mut current_name = question.qname.clone();
    let mut hops = 0usize;

    loop {
        if question.qtype == RecordType::ANY {
            for set in zone.rrsets_at(&current_name) {
                answer.extend(set.records.iter().cloned());
            }
            break;
        }

        if let Some(set) = zone.rrset(&current_name, question.qtype) {
            answer.extend(set.records.iter().cloned());
            break;
        }

        // No direct match: chase a CNAME at this name, if any, up to the hop limit.
        match zone.rrset(&current_name, RecordType::CNAME) {
            Some(set) if hops < CNAME_CHASE_LIMIT => {
                let cname_rr = set.records[0].clone();
                let target = match &cname_rr.rdata {
                    InternalResourceRecord::CNAME { cname } => cname.clone(),
                    _ => unreachable!("CNAME RRset must contain CNAME records"),
                };
                answer.push(cname_rr);
                hops += 1;
                if !target.is_subdomain_of(&zone.apex) {
                    // Chased outside this zone; the original source stops following
                    // here since it has no authority over the target.
                    break;
                }
                current_name = target;
                continue;
            }
            _ => break,
        }
    }

    if answer.is_empty() {
        return negative_response(&zone, &current_name, question);
    }

    QueryResult {
        rcode: Rcode::NoError,
        authoritative: true,
        answer,
        authority: vec![],
    }
}

fn negative_response(zone: &Zone, queried_name: &Name, _question: &Question) -> QueryResult {
    // NODATA (the name exists, just not with this type) is NOERROR;
    // otherwise the name itself doesn't exist under this zone, NXDOMAIN.
    let rcode = if zone.has_any_rrset_at(queried_name) {
        Rcode::NoError
    } else {
        Rcode::NameError
    };
    QueryResult {
        rcode,
        authoritative: true,
        answer: vec![],
        authority: vec![zone.soa().clone()],
    }
}
