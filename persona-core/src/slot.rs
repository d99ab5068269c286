//! Referent slots: an ordered multimap of `(type_name, value)` pairs.
//!
//! Several slots may share a type name; they hold variant forms of the same
//! logical attribute (e.g. two spellings of a surname). Order is significant:
//! the first slot of a type is the "primary" value. Identical pairs are never
//! stored twice; re-adding one bumps its occurrence count instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a referent in a document registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferentId(pub u32);

impl ReferentId {
    /// Index into the registry's storage.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ReferentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Slot value: a primitive string or an edge to another referent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    /// Literal value.
    Text(String),
    /// Graph edge.
    Ref(ReferentId),
}

impl SlotValue {
    /// The literal, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SlotValue::Text(s) => Some(s),
            SlotValue::Ref(_) => None,
        }
    }

    /// The edge target, if this is a reference.
    #[must_use]
    pub fn as_ref_id(&self) -> Option<ReferentId> {
        match self {
            SlotValue::Ref(id) => Some(*id),
            SlotValue::Text(_) => None,
        }
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        SlotValue::Text(s.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        SlotValue::Text(s)
    }
}

impl From<ReferentId> for SlotValue {
    fn from(id: ReferentId) -> Self {
        SlotValue::Ref(id)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Text(s) => f.write_str(s),
            SlotValue::Ref(id) => write!(f, "{id}"),
        }
    }
}

/// One typed attribute of a referent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Attribute name from the fixed vocabulary (`FIRSTNAME`, `REF`, ...).
    pub type_name: String,
    /// Attribute value.
    pub value: SlotValue,
    /// How many times this exact pair was added.
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

/// Ordered multimap of slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotList {
    slots: Vec<Slot>,
}

impl SlotList {
    /// Empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair. Returns `false` (and bumps the count) when the pair exists.
    pub fn add(&mut self, type_name: &str, value: impl Into<SlotValue>) -> bool {
        let value = value.into();
        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.type_name == type_name && s.value == value)
        {
            slot.count += 1;
            return false;
        }
        self.slots.push(Slot {
            type_name: type_name.to_string(),
            value,
            count: 1,
        });
        true
    }

    /// Makes `value` the only slot of its type, keeping the position of the
    /// first existing slot of that type.
    pub fn replace(&mut self, type_name: &str, value: impl Into<SlotValue>) {
        let value = value.into();
        match self.slots.iter().position(|s| s.type_name == type_name) {
            Some(pos) => {
                self.slots[pos].value = value;
                self.slots[pos].count = 1;
                let mut i = 0;
                self.slots.retain(|s| {
                    let keep = i <= pos || s.type_name != type_name;
                    i += 1;
                    keep
                });
            }
            None => {
                self.add(type_name, value);
            }
        }
    }

    /// Replaces one exact value in place, merging with an existing identical pair.
    pub fn update_value(&mut self, type_name: &str, old: &SlotValue, new: impl Into<SlotValue>) {
        let new = new.into();
        if old == &new {
            return;
        }
        let Some(pos) = self
            .slots
            .iter()
            .position(|s| s.type_name == type_name && &s.value == old)
        else {
            return;
        };
        if let Some(dup) = self
            .slots
            .iter()
            .position(|s| s.type_name == type_name && s.value == new)
        {
            let count = self.slots[pos].count;
            self.slots[dup].count += count;
            self.slots.remove(pos);
        } else {
            self.slots[pos].value = new;
        }
    }

    /// Removes one exact pair. Returns whether it was present.
    pub fn remove(&mut self, type_name: &str, value: &SlotValue) -> bool {
        let before = self.slots.len();
        self.slots
            .retain(|s| !(s.type_name == type_name && &s.value == value));
        before != self.slots.len()
    }

    /// Removes every slot of a type.
    pub fn remove_all(&mut self, type_name: &str) {
        self.slots.retain(|s| s.type_name != type_name);
    }

    /// Keeps only the slots for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Slot) -> bool) {
        self.slots.retain(keep);
    }

    /// All slots in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Values of a type, in order.
    pub fn values<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a SlotValue> + 'a {
        self.slots
            .iter()
            .filter(move |s| s.type_name == type_name)
            .map(|s| &s.value)
    }

    /// Text values of a type, in order.
    pub fn texts<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values(type_name).filter_map(SlotValue::as_text)
    }

    /// Reference values of a type, in order.
    pub fn refs<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = ReferentId> + 'a {
        self.values(type_name).filter_map(SlotValue::as_ref_id)
    }

    /// First text value of a type.
    #[must_use]
    pub fn first_text(&self, type_name: &str) -> Option<&str> {
        self.slots
            .iter()
            .filter(|s| s.type_name == type_name)
            .find_map(|s| s.value.as_text())
    }

    /// First reference value of a type.
    #[must_use]
    pub fn first_ref(&self, type_name: &str) -> Option<ReferentId> {
        self.slots
            .iter()
            .filter(|s| s.type_name == type_name)
            .find_map(|s| s.value.as_ref_id())
    }

    /// True when some slot has this type.
    #[must_use]
    pub fn has(&self, type_name: &str) -> bool {
        self.slots.iter().any(|s| s.type_name == type_name)
    }

    /// True when this exact pair is present.
    #[must_use]
    pub fn contains(&self, type_name: &str, value: &SlotValue) -> bool {
        self.slots
            .iter()
            .any(|s| s.type_name == type_name && &s.value == value)
    }

    /// Number of slots of a type.
    #[must_use]
    pub fn count_of(&self, type_name: &str) -> usize {
        self.slots.iter().filter(|s| s.type_name == type_name).count()
    }

    /// Set union: appends every pair of `other` that is not present yet.
    pub fn union_from(&mut self, other: &SlotList) {
        for slot in &other.slots {
            if let Some(existing) = self
                .slots
                .iter_mut()
                .find(|s| s.type_name == slot.type_name && s.value == slot.value)
            {
                existing.count += slot.count;
            } else {
                self.slots.push(slot.clone());
            }
        }
    }

    /// Rewrites every edge to `from` into an edge to `to`, deduplicating.
    pub fn redirect(&mut self, from: ReferentId, to: ReferentId) {
        let types: Vec<String> = self
            .slots
            .iter()
            .filter(|s| s.value == SlotValue::Ref(from))
            .map(|s| s.type_name.clone())
            .collect();
        for t in types {
            self.update_value(&t, &SlotValue::Ref(from), SlotValue::Ref(to));
        }
    }

    /// Set equality of pairs, ignoring order and counts.
    #[must_use]
    pub fn same_pairs(&self, other: &SlotList) -> bool {
        self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .all(|s| other.contains(&s.type_name, &s.value))
    }
}

impl<'a> IntoIterator for &'a SlotList {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_deduplicates_identical_pairs() {
        let mut slots = SlotList::new();
        assert!(slots.add("LASTNAME", "IVANOV"));
        assert!(!slots.add("LASTNAME", "IVANOV"));
        assert!(slots.add("LASTNAME", "IVANOVA"));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.as_slice()[0].count, 2);
    }

    #[test]
    fn replace_keeps_first_position() {
        let mut slots = SlotList::new();
        slots.add("FIRSTNAME", "IVAN");
        slots.add("SEX", "MALE");
        slots.add("LASTNAME", "PETROV");
        slots.add("SEX", "FEMALE");
        slots.replace("SEX", "FEMALE");
        let types: Vec<&str> = slots.as_slice().iter().map(|s| s.type_name.as_str()).collect();
        assert_eq!(types, vec!["FIRSTNAME", "SEX", "LASTNAME"]);
        assert_eq!(slots.first_text("SEX"), Some("FEMALE"));
    }

    #[test]
    fn union_is_idempotent() {
        let mut a = SlotList::new();
        a.add("LASTNAME", "IVANOV");
        a.add("ATTR", ReferentId(3));
        let snapshot = a.clone();
        a.union_from(&snapshot);
        assert!(a.same_pairs(&snapshot));
    }

    #[test]
    fn redirect_merges_duplicate_edges() {
        let mut a = SlotList::new();
        a.add("ATTR", ReferentId(1));
        a.add("ATTR", ReferentId(2));
        a.redirect(ReferentId(1), ReferentId(2));
        assert_eq!(a.refs("ATTR").collect::<Vec<_>>(), vec![ReferentId(2)]);
        assert_eq!(a.as_slice()[0].count, 2);
    }

    #[test]
    fn update_value_in_place() {
        let mut a = SlotList::new();
        a.add("LASTNAME", "IVANOVA");
        a.add("FIRSTNAME", "MARIA");
        a.update_value("LASTNAME", &SlotValue::from("IVANOVA"), "IVANOV");
        assert_eq!(a.first_text("LASTNAME"), Some("IVANOV"));
        assert_eq!(a.as_slice()[0].type_name, "LASTNAME");
    }

    #[test]
    fn first_value_outlives_the_lookup_key() {
        let mut a = SlotList::new();
        a.add("ATTR", ReferentId(7));
        a.add("LASTNAME", "PETROV");
        let (text, edge) = {
            let key = String::from("LASTNAME");
            let attr = "ATTR".to_string();
            (a.first_text(&key), a.first_ref(&attr))
        };
        assert_eq!(text, Some("PETROV"));
        assert_eq!(edge, Some(ReferentId(7)));
        assert_eq!(a.first_text("ATTR"), None);
    }
}
