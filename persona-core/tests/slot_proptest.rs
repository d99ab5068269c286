//! Property tests for the slot multimap.

use persona_core::{ReferentId, SlotList, SlotValue};
use proptest::prelude::*;

const TYPES: &[&str] = &["LASTNAME", "FIRSTNAME", "ATTR", "SEX"];

fn value_strategy() -> impl Strategy<Value = SlotValue> {
    prop_oneof![
        prop::sample::select(&["IVANOV", "IVANOVA", "PETR", "MALE"][..]).prop_map(SlotValue::from),
        (0u32..6).prop_map(|i| SlotValue::Ref(ReferentId(i))),
    ]
}

fn slots_strategy() -> impl Strategy<Value = SlotList> {
    prop::collection::vec((prop::sample::select(TYPES), value_strategy()), 0..12).prop_map(|pairs| {
        let mut slots = SlotList::new();
        for (t, v) in pairs {
            slots.add(t, v);
        }
        slots
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn pairs_are_never_duplicated(slots in slots_strategy()) {
        let all = slots.as_slice();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                prop_assert!(!(a.type_name == b.type_name && a.value == b.value));
            }
        }
    }

    #[test]
    fn union_is_idempotent_and_symmetric(a in slots_strategy(), b in slots_strategy()) {
        let mut ab = a.clone();
        ab.union_from(&b);
        let mut ba = b.clone();
        ba.union_from(&a);
        prop_assert!(ab.same_pairs(&ba));

        let mut again = ab.clone();
        again.union_from(&b);
        prop_assert!(again.same_pairs(&ab));
    }

    #[test]
    fn redirect_leaves_no_edge_to_the_source(
        slots in slots_strategy(),
        from in 0u32..6,
        to in 0u32..6,
    ) {
        prop_assume!(from != to);
        let mut slots = slots;
        slots.redirect(ReferentId(from), ReferentId(to));
        prop_assert!(slots.as_slice().iter().all(|s| s.value != SlotValue::Ref(ReferentId(from))));
    }
}
