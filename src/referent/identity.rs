use super::{slots, ReferentGraph};
use persona_core::{SlotList, SlotValue};
use serde::Serialize;
use std::fmt;

/// Identity document: passport, driver's license, birth certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonIdentityReferent {
    /// `TYPE`, `NUMBER`, `STATE`, `ADDRESS`, `ORG`, `DATE`.
    pub slots: SlotList,
}

impl PersonIdentityReferent {
    /// Document of a type with a number.
    #[must_use]
    pub fn new(typ: &str, number: &str) -> Self {
        let mut slots = SlotList::new();
        slots.add(slots::TYPE, typ.to_lowercase());
        slots.add(slots::NUMBER, number.to_uppercase());
        Self { slots }
    }

    /// Document type.
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.slots.first_text(slots::TYPE)
    }

    /// Document number.
    #[must_use]
    pub fn number(&self) -> Option<&str> {
        self.slots.first_text(slots::NUMBER)
    }

    /// Same type and number; issuing states must agree when both are known.
    #[must_use]
    pub fn can_be_equals(&self, other: &PersonIdentityReferent, graph: &dyn ReferentGraph) -> bool {
        if self.typ() != other.typ() || self.number() != other.number() {
            return false;
        }
        match (
            self.slots.values(slots::STATE).next(),
            other.slots.values(slots::STATE).next(),
        ) {
            (Some(SlotValue::Ref(a)), Some(SlotValue::Ref(b))) => graph.same_target(*a, *b),
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Adds every slot of `other`.
    pub fn merge_from(&mut self, other: &PersonIdentityReferent) {
        self.slots.union_from(&other.slots);
    }
}

impl fmt::Display for PersonIdentityReferent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.typ().unwrap_or("?"),
            self.number().unwrap_or("?")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::vocab::Vocabulary;

    #[test]
    fn equality_needs_type_number_and_state() {
        let reg = Registry::new(Vocabulary::builtin().expect("vocab"), Default::default());
        let a = PersonIdentityReferent::new("passport", "4510 123456");
        let mut b = PersonIdentityReferent::new("passport", "4510 123456");
        assert!(a.can_be_equals(&b, &reg));
        assert!(!a.can_be_equals(&PersonIdentityReferent::new("passport", "1"), &reg));
        assert!(!a.can_be_equals(&PersonIdentityReferent::new("driver_license", "4510 123456"), &reg));

        let mut a2 = a.clone();
        a2.slots.add(slots::STATE, "RUSSIA");
        b.slots.add(slots::STATE, "FRANCE");
        assert!(!a2.can_be_equals(&b, &reg));
        assert!(a2.can_be_equals(&a, &reg));
    }
}
