//! The zone store: every zone the server is authoritative for, guarded by
//! a `RwLock` for readers (queries, AXFR) plus a second `Mutex` that
//! serializes UPDATE writers (§5). The two locks are deliberately
//! distinct: a writer holds `update_lock` for the whole prerequisite/
//! prescan/apply sequence but only takes `store_lock` (briefly, for
//! write) at the final commit, so queries are never blocked behind a
//! slow UPDATE's validation work.
//!
//! This is the single `Server` aggregate called for in §9's redesign
//! flag against global mutable state: every other component takes a
//! `&ZoneStore` rather than reaching for statics.

use crate::name::Name;
use crate::zones::Zone;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

pub struct ZoneStore {
    store: RwLock<HashMap<Name, Zone>>,
    /// Serializes UPDATE transactions. Never held across a read of `store`
    /// that the query or AXFR path performs.
    pub update_lock: Mutex<()>,
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneStore {
    pub fn new() -> Self {
        ZoneStore {
            store: RwLock::new(HashMap::new()),
            update_lock: Mutex::new(()),
        }
    }

    pub fn from_zones(zones: Vec<Zone>) -> Self {
        let store = ZoneStore::new();
        {
            let mut guard = store.store.write().expect("zone store lock poisoned");
            for zone in zones {
                guard.insert(zone.apex.clone(), zone);
            }
        }
        store
    }

    /// Longest-suffix lookup: walks `name` up through its ancestors
    /// looking for a zone whose apex matches, returning the most specific
    /// (longest) match. Mirrors the original `zone_find` recursion, done
    /// iteratively over `Name::suffixes`.
    pub fn find_zone(&self, name: &Name) -> Option<Zone> {
        let guard = self.store.read().expect("zone store lock poisoned");
        for candidate in name.suffixes() {
            if let Some(zone) = guard.get(&candidate) {
                return Some(zone.clone());
            }
        }
        None
    }

    pub fn zone_exists(&self, apex: &Name) -> bool {
        let guard = self.store.read().expect("zone store lock poisoned");
        guard.contains_key(apex)
    }

    /// Atomically swaps in a replacement for the zone at `apex` (or
    /// inserts it if new). Takes a brief exclusive lock; the caller is
    /// expected to have done all validation against a cloned copy first
    /// so this is the only mutation under lock.
    pub fn commit(&self, zone: Zone) {
        let mut guard = self.store.write().expect("zone store lock poisoned");
        guard.insert(zone.apex.clone(), zone);
    }

    pub fn delete_zone(&self, apex: &Name) {
        let mut guard = self.store.write().expect("zone store lock poisoned");
        guard.remove(apex);
    }

    pub fn zone_count(&self) -> usize {
        let guard = self.store.read().expect("zone store lock poisoned");
        guard.len()
    }

    /// Enumerates every zone in the store. Used only for shutdown (§4.2);
    /// nothing in the request path needs a full scan.
    pub fn iterate(&self) -> Vec<Zone> {
        let guard = self.store.read().expect("zone store lock poisoned");
        guard.values().cloned().collect()
    }

    /// SIGINT shutdown (§5): take the exclusive lock and drop every zone.
    /// `Zone` is a plain value type, so dropping the map's entries is all
    /// "freeing" means here — no manual refcounts to walk (§9).
    pub fn shutdown(&self) {
        let mut guard = self.store.write().expect("zone store lock poisoned");
        guard.clear();
    }

    /// Calls `f` with a read-locked snapshot reference, for callers (AXFR)
    /// that need to clone a zone and then release the lock *before* doing
    /// slow I/O — the contract is explicit in this signature rather than
    /// left to convention (§9): the lock is held only for the duration of
    /// `f`, which must not itself perform I/O.
    pub fn with_zone_locked<T>(&self, apex: &Name, f: impl FnOnce(Option<&Zone>) -> T) -> T {
        let guard = self.store.read().expect("zone store lock poisoned");
        f(guard.get(apex))
    }
}
