use persona_core::SlotList;
use serde::Serialize;

/// Organization, location or address produced by a sibling extractor.
///
/// The engine never looks inside beyond structural equality; it only needs
/// a target for `REF` and `STATE` edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignReferent {
    /// Upper-case type name ("ORGANIZATION", "GEO").
    pub type_name: String,
    /// Slots as the extractor filled them.
    pub slots: SlotList,
}

impl ForeignReferent {
    /// Empty referent of a type.
    #[must_use]
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_uppercase(),
            slots: SlotList::new(),
        }
    }

    /// Same type and the same set of slot pairs.
    #[must_use]
    pub fn can_be_equals(&self, other: &ForeignReferent) -> bool {
        self.type_name == other.type_name && self.slots.same_pairs(&other.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referent::slots;

    #[test]
    fn structural_equality() {
        let mut a = ForeignReferent::new("geo");
        a.slots.add(slots::NAME, "RUSSIA");
        let mut b = ForeignReferent::new("GEO");
        b.slots.add(slots::NAME, "RUSSIA");
        assert!(a.can_be_equals(&b));
        b.slots.add(slots::NAME, "RF");
        assert!(!a.can_be_equals(&b));
    }
}
