use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};

use crate::{
    contact::Contact,
    types::{Band, ContactId, Mode},
};

pub type VecIndex<K> = HashMap<K, Vec<ContactId>>;

/// `(callsign, band, mode)` triple that defines a duplicate contact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DupeKey {
    pub call: String,
    pub band: Band,
    pub mode: Mode,
}

impl DupeKey {
    pub fn new(call: &str, band: Band, mode: Mode) -> Self {
        Self {
            call: call.trim().to_ascii_uppercase(),
            band,
            mode,
        }
    }
}

/// Derived duplicate-membership view over a contact snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DupeIndex {
    keys: HashSet<DupeKey>,
    by_call: HashMap<String, BTreeSet<(Band, Mode)>>,
}

impl DupeIndex {
    pub fn build<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> Self {
        let mut index = Self::default();
        for c in contacts {
            let key = c.dupe_key();
            index
                .by_call
                .entry(key.call.clone())
                .or_default()
                .insert((key.band, key.mode));
            index.keys.insert(key);
        }
        index
    }

    pub fn is_duplicate(&self, call: &str, band: Band, mode: Mode) -> bool {
        self.keys.contains(&DupeKey::new(call, band, mode))
    }

    /// Band/mode pairs already worked by `call`, in band order.
    pub fn worked_on(&self, call: &str) -> Vec<(Band, Mode)> {
        self.by_call
            .get(call.trim().to_ascii_uppercase().as_str())
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Distinct sections present in a contact snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionTracker {
    worked: BTreeSet<String>,
}

impl SectionTracker {
    pub fn build<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> Self {
        Self {
            worked: contacts
                .into_iter()
                .map(|c| c.exchange_section.clone())
                .collect(),
        }
    }

    pub fn worked(&self, section_code: &str) -> bool {
        self.worked.contains(section_code.trim().to_ascii_uppercase().as_str())
    }

    pub fn worked_sections(&self) -> Vec<String> {
        self.worked.iter().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.worked.len()
    }
}

/// Every derived view, rebuilt together from one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derived {
    pub dupes: DupeIndex,
    pub sections: SectionTracker,
}

impl Derived {
    pub fn build<'a, I>(contacts: I) -> Self
    where
        I: IntoIterator<Item = &'a Contact>,
        I::IntoIter: Clone,
    {
        let contacts = contacts.into_iter();
        Self {
            dupes: DupeIndex::build(contacts.clone()),
            sections: SectionTracker::build(contacts),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn contact(id: ContactId, call: &str, band: Band, mode: Mode, section: &str) -> Contact {
        Contact {
            id,
            callsign: call.to_string(),
            exchange_class: "1D".to_string(),
            exchange_section: section.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 22, 18, 0, 0).unwrap(),
            frequency_hz: 0,
            band,
            mode,
            power_watts: 5,
            grid: String::new(),
            operator_name: String::new(),
        }
    }

    #[test]
    fn dupe_index_matches_full_triple_only() {
        let log = vec![
            contact(1, "W1AW", Band::B40, Mode::CW, "CT"),
            contact(2, "W1AW", Band::B20, Mode::PH, "CT"),
        ];
        let idx = DupeIndex::build(&log);
        assert!(idx.is_duplicate("W1AW", Band::B40, Mode::CW));
        assert!(idx.is_duplicate("w1aw", Band::B40, Mode::CW));
        assert!(!idx.is_duplicate("W1AW", Band::B20, Mode::CW));
        assert_eq!(
            idx.worked_on("W1AW"),
            vec![(Band::B40, Mode::CW), (Band::B20, Mode::PH)]
        );
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn section_tracker_reflects_distinct_sections() {
        let log = vec![
            contact(1, "K1ABC", Band::B40, Mode::CW, "EMA"),
            contact(2, "K2ABC", Band::B40, Mode::CW, "ENY"),
            contact(3, "K3ABC", Band::B40, Mode::CW, "EMA"),
        ];
        let tracker = SectionTracker::build(&log);
        assert!(tracker.worked("EMA"));
        assert!(!tracker.worked("WMA"));
        assert_eq!(tracker.worked_sections(), vec!["EMA", "ENY"]);

        let empty = SectionTracker::build(std::iter::empty());
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn derived_views_agree_with_each_other() {
        let log = vec![
            contact(1, "K1ABC", Band::B40, Mode::CW, "EMA"),
            contact(2, "K2ABC", Band::B20, Mode::DI, "ENY"),
        ];
        let derived = Derived::build(&log);
        assert!(derived.dupes.is_duplicate("K2ABC", Band::B20, Mode::DI));
        assert!(derived.sections.worked("ENY"));
        assert_eq!(derived, Derived::build(log.iter()));
    }
}
