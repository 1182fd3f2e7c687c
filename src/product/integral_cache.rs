//! Cache of partial-integral lists.
//!
//! Every stored entry gets a slot; the slot index is the entry's code and is never handed
//! to a different key. Sterilizing a slot drops the entry (and with it the synthesized
//! sub-products and integrals it owns) but keeps the key and the persisted variable-set
//! descriptor, so the same slot can be refilled later. When more than `max_live` entries
//! are alive the least recently stored one is sterilized.

use crate::product::partial_integrals::CacheEntry;
use crate::product::range_names::RangeName;
use crate::product::variables::VarSet;
use log::debug;

/// (integration variables, dependent variables, range), variable sets in sorted form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    iset: Vec<String>,
    nset: Vec<String>,
    range: Option<RangeName>,
}

impl CacheKey {
    pub fn new(iset: &VarSet, nset: &VarSet, range: Option<RangeName>) -> Self {
        Self {
            iset: iset.normalized(),
            nset: nset.normalized(),
            range,
        }
    }

    pub fn range(&self) -> Option<RangeName> {
        self.range
    }
}

#[derive(Debug)]
struct Slot {
    key: CacheKey,
    descriptor: VarSet,
    entry: Option<CacheEntry>,
    stored_at: u64,
}

#[derive(Debug)]
pub struct IntegralCache {
    slots: Vec<Slot>,
    max_live: usize,
    clock: u64,
}

impl IntegralCache {
    pub fn new(max_live: usize) -> Self {
        Self {
            slots: Vec::new(),
            max_live: max_live.max(1),
            clock: 0,
        }
    }

    /// Slot of the live entry stored under `key`.
    pub fn lookup(&self, key: &CacheKey) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.entry.is_some() && &slot.key == key)
    }

    /// Stores `entry` and returns its slot. A sterilized slot with the same key is refilled
    /// in place, so a revived entry keeps its code. A live slot with the same key keeps its
    /// entry and `entry` is dropped.
    pub fn store(&mut self, key: CacheKey, descriptor: VarSet, entry: CacheEntry) -> usize {
        let index = match self.slots.iter().position(|slot| slot.key == key) {
            Some(index) if self.slots[index].entry.is_some() => {
                debug!("cache slot {} already holds this key, keeping it", index);
                return index;
            }
            Some(index) => {
                debug!("reviving sterilized cache slot {}", index);
                self.clock += 1;
                let slot = &mut self.slots[index];
                slot.entry = Some(entry);
                slot.descriptor = descriptor;
                slot.stored_at = self.clock;
                index
            }
            None => {
                self.clock += 1;
                self.slots.push(Slot {
                    key,
                    descriptor,
                    entry: Some(entry),
                    stored_at: self.clock,
                });
                self.slots.len() - 1
            }
        };
        self.enforce_capacity(index);
        index
    }

    fn enforce_capacity(&mut self, keep: usize) {
        while self.live_len() > self.max_live {
            let oldest = self
                .slots
                .iter()
                .enumerate()
                .filter(|(i, slot)| *i != keep && slot.entry.is_some())
                .min_by_key(|(_, slot)| slot.stored_at)
                .map(|(i, _)| i);
            match oldest {
                Some(i) => {
                    debug!("cache full ({} live entries), sterilizing slot {}", self.max_live, i);
                    self.slots[i].entry = None;
                }
                None => break,
            }
        }
    }

    /// Live entry of `slot`; `None` for sterilized or unknown slots.
    pub fn entry(&self, slot: usize) -> Option<&CacheEntry> {
        self.slots.get(slot).and_then(|s| s.entry.as_ref())
    }

    /// Persisted descriptor and key of `slot`, also available after sterilization.
    pub fn descriptor(&self, slot: usize) -> Option<(&VarSet, &CacheKey)> {
        self.slots.get(slot).map(|s| (&s.descriptor, &s.key))
    }

    pub fn contains_slot(&self, slot: usize) -> bool {
        slot < self.slots.len()
    }

    pub fn is_live(&self, slot: usize) -> bool {
        self.entry(slot).is_some()
    }

    /// Drops the entry of `slot`; returns false if there was nothing to drop.
    pub fn sterilize(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => s.entry.take().is_some(),
            None => false,
        }
    }

    pub fn sterilize_all(&mut self) {
        for slot in &mut self.slots {
            slot.entry = None;
        }
    }

    /// Number of slots ever assigned.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn live_len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn max_live(&self) -> usize {
        self.max_live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::terms::FormulaTerm;
    use std::rc::Rc;

    fn key(vars: &[&str], range: Option<&str>) -> (CacheKey, VarSet) {
        let set = VarSet::from_names(vars);
        (CacheKey::new(&set, &set, RangeName::intern_opt(range)), set)
    }

    #[test]
    fn test_store_then_lookup_with_reordered_vars() {
        let mut cache = IntegralCache::new(10);
        let (k1, d1) = key(&["x", "y"], Some("r1"));
        let slot = cache.store(k1, d1, CacheEntry::default());
        let (k2, _) = key(&["y", "x"], Some(&String::from("r1")));
        assert_eq!(cache.lookup(&k2), Some(slot));
        let (k3, _) = key(&["x", "y"], None);
        assert_eq!(cache.lookup(&k3), None);
        let (k4, _) = key(&["x", "y"], Some("r2"));
        assert_eq!(cache.lookup(&k4), None);
    }

    #[test]
    fn test_codes_are_never_reused() {
        let mut cache = IntegralCache::new(10);
        let (ka, da) = key(&["x"], None);
        let (kb, db) = key(&["y"], None);
        let a = cache.store(ka.clone(), da.clone(), CacheEntry::default());
        let b = cache.store(kb, db, CacheEntry::default());
        assert_ne!(a, b);
        assert!(cache.sterilize(a));
        assert!(!cache.sterilize(a));
        assert_eq!(cache.lookup(&ka), None);
        assert!(cache.contains_slot(a));
        assert!(!cache.is_live(a));
        assert_eq!(cache.descriptor(a).unwrap().0, &da);

        let (kc, dc) = key(&["z"], None);
        let c = cache.store(kc, dc, CacheEntry::default());
        assert_ne!(c, a);
        // revival of the sterilized key lands in its old slot
        assert_eq!(cache.store(ka, da, CacheEntry::default()), a);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_live_entry_is_not_replaced() {
        let mut cache = IntegralCache::new(10);
        let (k1, d1) = key(&["x"], None);
        let mut first = CacheEntry::new();
        first.push_borrowed(Rc::new(FormulaTerm::variable("f")));
        let mut second = CacheEntry::new();
        second.push_borrowed(Rc::new(FormulaTerm::variable("g")));

        let slot = cache.store(k1.clone(), d1.clone(), first);
        assert_eq!(cache.store(k1, d1, second), slot);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.live_len(), 1);
        assert_eq!(cache.entry(slot).unwrap().term_names(), vec!["f".to_string()]);
    }

    #[test]
    fn test_capacity_sterilizes_oldest_entry() {
        let mut cache = IntegralCache::new(2);
        let (k1, d1) = key(&["a"], None);
        let (k2, d2) = key(&["b"], None);
        let (k3, d3) = key(&["c"], None);
        let s1 = cache.store(k1, d1, CacheEntry::default());
        let s2 = cache.store(k2, d2, CacheEntry::default());
        let s3 = cache.store(k3, d3, CacheEntry::default());
        assert_eq!(cache.live_len(), 2);
        assert!(!cache.is_live(s1));
        assert!(cache.is_live(s2));
        assert!(cache.is_live(s3));
    }

    #[test]
    fn test_sterilize_all_keeps_descriptors() {
        let mut cache = IntegralCache::new(0);
        assert_eq!(cache.max_live(), 1);
        assert!(cache.is_empty());
        let (k1, d1) = key(&["x", "y"], Some("cut"));
        let slot = cache.store(k1.clone(), d1.clone(), CacheEntry::default());
        cache.sterilize_all();
        assert_eq!(cache.live_len(), 0);
        let (descriptor, stored_key) = cache.descriptor(slot).unwrap();
        assert_eq!(descriptor, &d1);
        assert_eq!(stored_key, &k1);
        assert_eq!(stored_key.range(), Some(RangeName::intern("cut")));
        assert!(cache.entry(slot).is_none());
        assert!(cache.descriptor(slot + 1).is_none());
    }
}
