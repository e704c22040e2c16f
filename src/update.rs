//! RFC 2136 DYNAMIC UPDATE (§4.4). The message's four sections are
//! reused per RFC2136 §3.1: question/QD is the Zone section, answer/AN is
//! Prerequisite, authority/NS is Update, additional/AR is unused here.
//!
//! Grounded on `handle_dns_update` in the original `dns_server.c`: the
//! zone-then-prerequisite-then-prescan-then-apply pipeline, the CNAME
//! add/other-type exclusivity rule, the apex-ANY-ANY NS-preserving
//! delete, the apex-ANY-SOA immediate zone deletion, and RFC1982 serial
//! arithmetic on commit. The prerequisite RRset-exact-match branch,
//! which the original left unevaluated, is implemented here per RFC2136
//! §3.2.5 (see SPEC_FULL.md §2).

use crate::datastore::ZoneStore;
use crate::enums::{RecordClass, RecordType, Rcode};
use crate::name::Name;
use crate::resourcerecord::{InternalResourceRecord, ResourceRecord};
use crate::zones::Zone;
use crate::Message;

pub struct UpdatePolicy {
    pub allow_zone_create: bool,
    pub allow_zone_delete: bool,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        UpdatePolicy {
            allow_zone_create: true,
            allow_zone_delete: true,
        }
    }
}

/// Outcome of an UPDATE transaction. `notify` carries the zone's new
/// state when the serial was bumped, for the caller to hand to the
/// NOTIFY emitter once this function's lock scope has ended.
pub struct UpdateResult {
    pub rcode: Rcode,
    pub notify: Option<Zone>,
}

fn reject(rcode: Rcode) -> UpdateResult {
    UpdateResult { rcode, notify: None }
}

/// Processes one UPDATE message against `store`, serialized by the
/// caller holding `store.update_lock` for the duration of this call.
pub fn apply(msg: &Message, store: &ZoneStore, policy: &UpdatePolicy) -> UpdateResult {
    if msg.question.len() != 1 {
        return reject(Rcode::FormatError);
    }
    let zone_section = &msg.question[0];
    if zone_section.qtype != RecordType::SOA {
        return reject(Rcode::FormatError);
    }
    let zname = zone_section.qname.clone();

    let existing = store.find_zone(&zname).filter(|z| z.apex == zname);
    let mut working_zone = match existing {
        Some(zone) => zone,
        None => {
            if !policy.allow_zone_create {
                return reject(Rcode::NotAuth);
            }
            match first_soa_add_at(&msg.authority, &zname) {
                Some(soa_rr) => Zone::new(zname.clone(), soa_rr),
                None => return reject(Rcode::NotAuth),
            }
        }
    };

    if let Some(rcode) = check_prerequisites(&msg.answer, &working_zone, &zname) {
        return reject(rcode);
    }

    if let Some(rcode) = prescan(&msg.authority, &zname, policy.allow_zone_delete) {
        return reject(rcode);
    }

    let mut increment_serial = false;
    for rr in &msg.authority {
        match apply_one(rr, &mut working_zone, &zname, policy) {
            ApplyOutcome::Continue => {}
            ApplyOutcome::SerialIncremented => increment_serial = true,
            ApplyOutcome::SoaReplaced => increment_serial = false,
            ApplyOutcome::ZoneDeleted => {
                store.delete_zone(&zname);
                return UpdateResult {
                    rcode: Rcode::NoError,
                    notify: None,
                };
            }
        }
    }

    if increment_serial {
        bump_serial(&mut working_zone);
    }

    store.commit(working_zone.clone());

    UpdateResult {
        rcode: Rcode::NoError,
        notify: if increment_serial { Some(working_zone) } else { None },
    }
}

/// When creating a new zone, RFC2136 requires the first RR of the Update
/// section to be the zone's own SOA, at the zone name.
fn first_soa_add_at(update_section: &[ResourceRecord], zname: &Name) -> Option<ResourceRecord> {
    let first = update_section.first()?;
    if first.name == *zname && first.record_type() == RecordType::SOA && first.class == RecordClass::Internet {
        Some(first.clone())
    } else {
        None
    }
}

fn check_prerequisites(prereqs: &[ResourceRecord], zone: &Zone, zname: &Name) -> Option<Rcode> {
    for rr in prereqs {
        if rr.ttl != 0 {
            return Some(Rcode::FormatError);
        }
        if !rr.name.is_subdomain_of(zname) {
            return Some(Rcode::NotZone);
        }
        match (rr.class, rr.record_type()) {
            (RecordClass::Any, RecordType::ANY) => {
                if !zone.has_any_rrset_at(&rr.name) {
                    return Some(Rcode::NameError);
                }
            }
            (RecordClass::Any, rtype) => {
                if zone.rrset(&rr.name, rtype).is_none() {
                    return Some(Rcode::NXRRSet);
                }
            }
            (RecordClass::None, RecordType::ANY) => {
                if zone.has_any_rrset_at(&rr.name) {
                    return Some(Rcode::YXDomain);
                }
            }
            (RecordClass::None, rtype) => {
                if zone.rrset(&rr.name, rtype).is_some() {
                    return Some(Rcode::YXRRSet);
                }
            }
            (RecordClass::Internet, rtype) => {
                // RFC2136 §3.2.5: the named RRset must exist and match
                // exactly the set of prerequisite RRs given for (name, type).
                let wanted: Vec<&ResourceRecord> = prereqs
                    .iter()
                    .filter(|p| p.name == rr.name && p.record_type() == rtype)
                    .collect();
                let have = zone.rrset(&rr.name, rtype);
                let matches = match have {
                    Some(set) => {
                        set.records.len() == wanted.len()
                            && wanted.iter().all(|w| set.records.iter().any(|h| h == *w))
                    }
                    None => false,
                };
                if !matches {
                    return Some(Rcode::NXRRSet);
                }
            }
            _ => return Some(Rcode::FormatError),
        }
    }
    None
}

fn prescan(update_section: &[ResourceRecord], zname: &Name, allow_zone_delete: bool) -> Option<Rcode> {
    for rr in update_section {
        if !rr.name.is_subdomain_of(zname) {
            return Some(Rcode::NotZone);
        }
        match rr.class {
            RecordClass::Internet => {
                if rr.record_type() == RecordType::ANY {
                    return Some(Rcode::FormatError);
                }
            }
            RecordClass::Any => {
                if rr.ttl != 0 || !matches!(rr.rdata, InternalResourceRecord::Empty { .. }) {
                    return Some(Rcode::FormatError);
                }
                let is_zone_delete =
                    rr.record_type() == RecordType::SOA && rr.name == *zname;
                if allow_zone_delete && is_zone_delete && update_section.len() > 1 {
                    return Some(Rcode::FormatError);
                }
            }
            RecordClass::None => {
                if rr.ttl != 0 {
                    return Some(Rcode::FormatError);
                }
            }
            _ => return Some(Rcode::FormatError),
        }
    }
    None
}

enum ApplyOutcome {
    Continue,
    SerialIncremented,
    SoaReplaced,
    ZoneDeleted,
}

fn apply_one(rr: &ResourceRecord, zone: &mut Zone, zname: &Name, policy: &UpdatePolicy) -> ApplyOutcome {
    match rr.class {
        RecordClass::Internet => {
            if rr.record_type() == RecordType::SOA {
                if rr.name != *zname {
                    return ApplyOutcome::Continue;
                }
                let current_serial = zone.serial();
                let new_serial = match &rr.rdata {
                    InternalResourceRecord::SOA { serial, .. } => *serial,
                    _ => return ApplyOutcome::Continue,
                };
                if serial_is_newer(new_serial, current_serial) {
                    zone.set_soa(rr.clone());
                    return ApplyOutcome::SoaReplaced;
                }
                return ApplyOutcome::Continue;
            }

            let has_cname = zone.rrset(&rr.name, RecordType::CNAME).is_some();
            let has_other = zone
                .rrsets_at(&rr.name)
                .iter()
                .any(|set| !set.records.is_empty() && set.records[0].record_type() != RecordType::CNAME);
            if rr.record_type() != RecordType::CNAME && has_cname {
                return ApplyOutcome::Continue;
            }
            if rr.record_type() == RecordType::CNAME && has_other {
                return ApplyOutcome::Continue;
            }
            let already_present = zone
                .rrset(&rr.name, rr.record_type())
                .is_some_and(|set| set.records.iter().any(|existing| existing == rr));
            if already_present {
                return ApplyOutcome::Continue;
            }
            zone.add_record(rr.clone());
            ApplyOutcome::SerialIncremented
        }
        RecordClass::None => {
            if zone.delete_record(rr) {
                ApplyOutcome::SerialIncremented
            } else {
                ApplyOutcome::Continue
            }
        }
        RecordClass::Any => match rr.record_type() {
            RecordType::SOA if rr.name == zone.apex => {
                if policy.allow_zone_delete {
                    ApplyOutcome::ZoneDeleted
                } else {
                    ApplyOutcome::Continue
                }
            }
            RecordType::NS if rr.name == zone.apex => ApplyOutcome::Continue,
            RecordType::ANY if rr.name == zone.apex => {
                let preserved_ns = zone.rrset(&zone.apex.clone(), RecordType::NS).cloned();
                let had_non_ns_data = zone
                    .rrsets_at(&rr.name)
                    .iter()
                    .any(|set| set.records.first().is_some_and(|r| r.record_type() != RecordType::NS));
                zone.delete_name(&rr.name);
                if let Some(ns_set) = preserved_ns {
                    for ns_rr in ns_set.records {
                        zone.add_record(ns_rr);
                    }
                }
                if had_non_ns_data {
                    ApplyOutcome::SerialIncremented
                } else {
                    ApplyOutcome::Continue
                }
            }
            RecordType::ANY => {
                let existed = zone.has_any_rrset_at(&rr.name);
                zone.delete_name(&rr.name);
                if existed {
                    ApplyOutcome::SerialIncremented
                } else {
                    ApplyOutcome::Continue
                }
            }
            rtype => {
                let existed = zone.rrset(&rr.name, rtype).is_some();
                zone.delete_rrset(&rr.name, rtype);
                if existed {
                    ApplyOutcome::SerialIncremented
                } else {
                    ApplyOutcome::Continue
                }
            }
        },
        RecordClass::InvalidType | RecordClass::CsNet | RecordClass::Chaos | RecordClass::Hesiod => {
            ApplyOutcome::Continue
        }
    }
}

/// RFC1982 serial number arithmetic: `a` is "newer" than `b` if the
/// signed difference `a - b` (mod 2^32) is positive.
fn serial_is_newer(a: u32, b: u32) -> bool {
    let diff = a.wrapping_sub(b) as i32;
    diff > 0
}

fn bump_serial(zone: &mut Zone) {
    let mut soa = zone.soa().clone();
    if let InternalResourceRecord::SOA { serial, .. } = &mut soa.rdata {
        *serial = serial.wrapping_add(1);
        if *serial == 0 {
            *serial = serial.wrapping_add(1);
        }
    }
    zone.set_soa(soa);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::Question;
    use crate::Header;
    use std::net::Ipv4Addr;

    fn base_zone() -> Zone {
        let apex = Name::from_text("example.com");
        let soa = ResourceRecord {
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
        };
        Zone::new(apex, soa)
    }

    fn update_msg(zname: &str, prereq: Vec<ResourceRecord>, updates: Vec<ResourceRecord>) -> Message {
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

    #[test]
    fn adds_a_record_and_bumps_serial() {
        let store = ZoneStore::from_zones(vec![base_zone()]);
        let add = ResourceRecord {
            name: Name::from_text("host.example.com"),
            class: RecordClass::Internet,
            ttl: 60,
            rdata: InternalResourceRecord::A {
                address: Ipv4Addr::new(192, 0, 2, 5),
            },
        };
        let msg = update_msg("example.com", vec![], vec![add]);
        let result = apply(&msg, &store, &UpdatePolicy::default());
        assert_eq!(result.rcode, Rcode::NoError);
        let zone = store.find_zone(&Name::from_text("example.com")).unwrap();
        assert_eq!(zone.serial(), 2);
        assert!(zone
            .rrset(&Name::from_text("host.example.com"), RecordType::A)
            .is_some());
    }

    #[test]
    fn prerequisite_nxrrset_rejects_update() {
        let store = ZoneStore::from_zones(vec![base_zone()]);
        let prereq = ResourceRecord {
            name: Name::from_text("host.example.com"),
            class: RecordClass::Any,
            ttl: 0,
            rdata: InternalResourceRecord::TXT { data: String::new() },
        };
        let mut prereq_any_type = prereq.clone();
        prereq_any_type.rdata = InternalResourceRecord::A {
            address: Ipv4Addr::new(0, 0, 0, 0),
        };
        let msg = update_msg("example.com", vec![prereq_any_type], vec![]);
        let result = apply(&msg, &store, &UpdatePolicy::default());
        assert_eq!(result.rcode, Rcode::NXRRSet);
    }

    #[test]
    fn any_soa_at_apex_deletes_zone() {
        let store = ZoneStore::from_zones(vec![base_zone()]);
        let delete_zone_rr = ResourceRecord {
            name: Name::from_text("example.com"),
            class: RecordClass::Any,
            ttl: 0,
            rdata: InternalResourceRecord::SOA {
                mname: Name::from_text("ns1.example.com"),
                rname: Name::from_text("hostmaster.example.com"),
                serial: 0,
                refresh: 0,
                retry: 0,
                expire: 0,
                minimum: 0,
            },
        };
        let msg = update_msg("example.com", vec![], vec![delete_zone_rr]);
        let result = apply(&msg, &store, &UpdatePolicy::default());
        assert_eq!(result.rcode, Rcode::NoError);
        assert!(!store.zone_exists(&Name::from_text("example.com")));
    }

    #[test]
    fn cname_exclusivity_skips_conflicting_add() {
        let mut zone = base_zone();
        zone.add_record(ResourceRecord {
            name: Name::from_text("alias.example.com"),
            class: RecordClass::Internet,
            ttl: 60,
            rdata: InternalResourceRecord::CNAME {
                cname: Name::from_text("host.example.com"),
            },
        });
        let store = ZoneStore::from_zones(vec![zone]);
        let conflicting = ResourceRecord {
            name: Name::from_text("alias.example.com"),
            class: RecordClass::Internet,
            ttl: 60,
            rdata: InternalResourceRecord::A {
                address: Ipv4Addr::new(192, 0, 2, 9),
            },
        };
        let msg = update_msg("example.com", vec![], vec![conflicting]);
        let result = apply(&msg, &store, &UpdatePolicy::default());
        assert_eq!(result.rcode, Rcode::NoError);
        let zone = store.find_zone(&Name::from_text("example.com")).unwrap();
        assert!(zone
            .rrset(&Name::from_text("alias.example.com"), RecordType::A)
            .is_none());
    }
}
