//! Row-range lookups over a PIT (SPEC_FULL §3.3).
//!
//! The full node/branch tables hold every node and branch in the network.
//! Assembly only ever touches a contiguous family of rows at a time — all of
//! them, or (after `connectivity::reduce_pit`) the active subset for a given
//! phase. `Lookup` just names those two cases so callers don't thread raw
//! `0..len()` ranges around.

use std::ops::Range;

/// A named row range into a node or branch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub range: Range<usize>,
}

impl Lookup {
    pub fn full(len: usize) -> Self {
        Self { range: 0..len }
    }

    pub fn reduced(len: usize) -> Self {
        Self { range: 0..len }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// The three row-range families addressed during a solve: the full table,
/// and the active subset for each phase (populated after
/// `connectivity::reduce_pit`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupSet {
    pub full: Option<Lookup>,
    pub active_hydraulics: Option<Lookup>,
    pub active_heat_transfer: Option<Lookup>,
}

impl LookupSet {
    pub fn for_full_table(len: usize) -> Self {
        Self {
            full: Some(Lookup::full(len)),
            active_hydraulics: None,
            active_heat_transfer: None,
        }
    }

    pub fn set_active_hydraulics(&mut self, len: usize) {
        self.active_hydraulics = Some(Lookup::reduced(len));
    }

    pub fn set_active_heat_transfer(&mut self, len: usize) {
        self.active_heat_transfer = Some(Lookup::reduced(len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lookup_spans_whole_table() {
        let lookup = Lookup::full(5);
        assert_eq!(lookup.range, 0..5);
        assert_eq!(lookup.len(), 5);
    }

    #[test]
    fn lookup_set_starts_with_only_full_populated() {
        let set = LookupSet::for_full_table(3);
        assert!(set.full.is_some());
        assert!(set.active_hydraulics.is_none());
        assert!(set.active_heat_transfer.is_none());
    }

    #[test]
    fn lookup_set_records_active_subsets() {
        let mut set = LookupSet::for_full_table(4);
        set.set_active_hydraulics(2);
        set.set_active_heat_transfer(1);
        assert_eq!(set.active_hydraulics.unwrap().len(), 2);
        assert_eq!(set.active_heat_transfer.unwrap().len(), 1);
    }
}
