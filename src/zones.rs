//! The in-memory zone: a value-type aggregate of RRsets keyed by (owner
//! name, type), deep-cloned rather than reference-counted when the
//! update engine needs a working copy to mutate (§9's redesign flag
//! against a manual refcounted `deep_free`/clone dance — `Zone` is plain
//! data and `Clone` does the right thing for free).

use crate::enums::RecordType;
use crate::name::Name;
use crate::resourcerecord::{InternalResourceRecord, RRset, ResourceRecord};

type Key = (Name, RecordType);

#[derive(Clone, Debug)]
pub struct Zone {
    pub apex: Name,
    /// RRsets at this zone, in the order each (owner name, type) pair was
    /// first added. §4.3/§4.5 require answers and AXFR streams to preserve
    /// insertion order, which a `HashMap` cannot give us (§9's redesign
    /// flag against it); a plain indexed `Vec` does, at the cost of linear
    /// lookup, acceptable for the zone sizes this engine serves.
    rrsets: Vec<(Key, RRset)>,
}

impl Zone {
    pub fn new(apex: Name, soa: ResourceRecord) -> Self {
        let mut set = RRset::new();
        set.add_dedup(soa);
        Zone {
            rrsets: vec![((apex.clone(), RecordType::SOA), set)],
            apex,
        }
    }

    fn position(&self, name: &Name, rtype: RecordType) -> Option<usize> {
        self.rrsets.iter().position(|((n, t), _)| n == name && *t == rtype)
    }

    pub fn soa(&self) -> &ResourceRecord {
        &self.rrset(&self.apex, RecordType::SOA)
            .expect("zone always carries an apex SOA RRset")
            .records[0]
    }

    pub fn serial(&self) -> u32 {
        match &self.soa().rdata {
            InternalResourceRecord::SOA { serial, .. } => *serial,
            _ => unreachable!("SOA RRset must contain a SOA record"),
        }
    }

    /// Replaces the zone's SOA record outright (used by the update engine,
    /// which computes the next serial itself rather than going through
    /// `add_record`/`delete_rrset`).
    pub fn set_soa(&mut self, soa: ResourceRecord) {
        let mut set = RRset::new();
        set.add_dedup(soa);
        match self.position(&self.apex.clone(), RecordType::SOA) {
            Some(idx) => self.rrsets[idx].1 = set,
            None => self.rrsets.push(((self.apex.clone(), RecordType::SOA), set)),
        }
    }

    pub fn rrset(&self, name: &Name, rtype: RecordType) -> Option<&RRset> {
        self.position(name, rtype).map(|idx| &self.rrsets[idx].1)
    }

    /// All RRsets at `name`, any type, in insertion order.
    pub fn rrsets_at(&self, name: &Name) -> Vec<&RRset> {
        self.rrsets
            .iter()
            .filter(|((n, _), _)| n == name)
            .map(|(_, set)| set)
            .collect()
    }

    pub fn has_any_rrset_at(&self, name: &Name) -> bool {
        self.rrsets.iter().any(|((n, _), _)| n == name)
    }

    pub fn add_record(&mut self, rr: ResourceRecord) {
        let key = (rr.name.clone(), rr.record_type());
        match self.position(&key.0, key.1) {
            Some(idx) => self.rrsets[idx].1.add_dedup(rr),
            None => {
                let mut set = RRset::new();
                set.add_dedup(rr);
                self.rrsets.push((key, set));
            }
        }
    }

    /// Removes a single RR matching `rr` by RR-equality. Drops the RRset
    /// entirely if it becomes empty. Returns whether anything was removed.
    pub fn delete_record(&mut self, rr: &ResourceRecord) -> bool {
        let key = (rr.name.clone(), rr.record_type());
        match self.position(&key.0, key.1) {
            Some(idx) => {
                let removed = self.rrsets[idx].1.remove_matching(rr);
                if self.rrsets[idx].1.is_empty() {
                    self.rrsets.remove(idx);
                }
                removed
            }
            None => false,
        }
    }

    /// Removes the whole RRset at (name, type).
    pub fn delete_rrset(&mut self, name: &Name, rtype: RecordType) {
        if let Some(idx) = self.position(name, rtype) {
            self.rrsets.remove(idx);
        }
    }

    /// Removes every RRset at `name`, any type.
    pub fn delete_name(&mut self, name: &Name) {
        self.rrsets.retain(|((n, _), _)| n != name);
    }

    /// All NS records at the apex (used by the NOTIFY emitter).
    pub fn apex_nameservers(&self) -> Vec<Name> {
        self.rrset(&self.apex, RecordType::NS)
            .map(|set| {
                set.records
                    .iter()
                    .filter_map(|rr| match &rr.rdata {
                        InternalResourceRecord::NS { nsdname } => Some(nsdname.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All records in the zone, owner-name/type grouping collapsed, in
    /// insertion order — used for AXFR streaming, which sends every RR in
    /// turn (§4.5).
    pub fn all_records(&self) -> Vec<&ResourceRecord> {
        self.rrsets.iter().flat_map(|(_, set)| set.records.iter()).collect()
    }
}
