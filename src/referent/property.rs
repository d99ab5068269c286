use super::{slots, EqualMode, PropertyKind, ReferentGraph};
use persona_core::{ReferentId, SlotList, SlotValue};
use serde::Serialize;
use std::fmt;

/// Longest `HIGHER` chain a property may have.
pub const MAX_HIGHER_DEPTH: usize = 20;

/// Title, position, rank or kinship role ("president of Russia").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonPropertyReferent {
    /// `NAME`, `ATTR`, `REF` and at most one `HIGHER`.
    pub slots: SlotList,
    /// Semantic kind from the vocabulary.
    pub kind: PropertyKind,
}

/// True when making `higher` the superior of `this` keeps the `HIGHER`
/// relation acyclic and within [`MAX_HIGHER_DEPTH`].
///
/// `this` is `None` for a property that is not registered yet, which cannot
/// close a cycle.
#[must_use]
pub fn higher_chain_is_sound(
    graph: &dyn ReferentGraph,
    this: Option<ReferentId>,
    higher: ReferentId,
) -> bool {
    let mut cur = higher;
    for _ in 0..MAX_HIGHER_DEPTH {
        if Some(cur) == this {
            return false;
        }
        match graph.property(cur).and_then(PersonPropertyReferent::higher) {
            Some(next) => cur = next,
            None => return true,
        }
    }
    false
}

fn word_prefix(short: &str, long: &str) -> bool {
    long.len() > short.len()
        && long.starts_with(short)
        && long[short.len()..].starts_with(' ')
}

impl PersonPropertyReferent {
    /// Property with a name.
    #[must_use]
    pub fn new(name: &str, kind: PropertyKind) -> Self {
        let mut slots = SlotList::new();
        slots.add(slots::NAME, name.to_lowercase());
        Self { slots, kind }
    }

    /// Preferred name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.slots.first_text(slots::NAME)
    }

    /// Superior property.
    #[must_use]
    pub fn higher(&self) -> Option<ReferentId> {
        self.slots.first_ref(slots::HIGHER)
    }

    /// Organization and location edges.
    pub fn refs(&self) -> impl Iterator<Item = ReferentId> + '_ {
        self.slots.refs(slots::REF)
    }

    /// Sets the single `HIGHER` edge.
    pub fn set_higher(&mut self, higher: ReferentId) {
        self.slots.replace(slots::HIGHER, higher);
    }

    fn names_equal(&self, other: &PersonPropertyReferent, graph: &dyn ReferentGraph) -> bool {
        let vocab = graph.vocabulary();
        let both_refs = self.refs().next().is_some() && other.refs().next().is_some();
        self.slots.texts(slots::NAME).any(|a| {
            other.slots.texts(slots::NAME).any(|b| {
                let (ca, cb) = (vocab.canonical_name(a), vocab.canonical_name(b));
                if ca == cb {
                    return true;
                }
                // "head of X" and "president of X" denote one post
                both_refs
                    && ((vocab.is_general_boss(ca) && vocab.is_specific_boss(cb))
                        || (vocab.is_specific_boss(ca) && vocab.is_general_boss(cb)))
            })
        })
    }

    fn refs_compatible(&self, other: &PersonPropertyReferent, mode: EqualMode, graph: &dyn ReferentGraph) -> bool {
        let mine: Vec<ReferentId> = self.refs().collect();
        let theirs: Vec<ReferentId> = other.refs().collect();
        if mine.is_empty() || theirs.is_empty() {
            return mode != EqualMode::DifferentTexts || (mine.is_empty() && theirs.is_empty());
        }
        mine.iter()
            .any(|a| theirs.iter().any(|b| graph.same_target(*a, *b)))
    }

    fn equals_at(
        &self,
        other: &PersonPropertyReferent,
        mode: EqualMode,
        graph: &dyn ReferentGraph,
        depth: usize,
    ) -> bool {
        if depth > MAX_HIGHER_DEPTH {
            return false;
        }
        if !self.names_equal(other, graph) || !self.refs_compatible(other, mode, graph) {
            return false;
        }
        match (self.higher(), other.higher()) {
            (Some(a), Some(b)) if a != b => match (graph.property(a), graph.property(b)) {
                (Some(ha), Some(hb)) => ha.equals_at(hb, mode, graph, depth + 1),
                _ => false,
            },
            _ => true,
        }
    }

    /// Same post: equal names (after synonyms), compatible `REF` targets and
    /// compatible `HIGHER` chains.
    #[must_use]
    pub fn can_be_equals(&self, other: &PersonPropertyReferent, mode: EqualMode, graph: &dyn ReferentGraph) -> bool {
        self.equals_at(other, mode, graph, 0)
    }

    /// `self` is a broader description of the post `other` describes: its
    /// name equals or is a word prefix of the other's, its targets are a
    /// subset, and `other` says strictly more.
    #[must_use]
    pub fn can_be_general_for(&self, other: &PersonPropertyReferent, graph: &dyn ReferentGraph) -> bool {
        let vocab = graph.vocabulary();
        let (Some(na), Some(nb)) = (self.name(), other.name()) else {
            return false;
        };
        let (na, nb) = (vocab.canonical_name(na), vocab.canonical_name(nb));
        if na != nb && !word_prefix(na, nb) {
            return false;
        }
        let theirs: Vec<ReferentId> = other.refs().collect();
        if !self
            .refs()
            .all(|a| theirs.iter().any(|b| graph.same_target(a, *b)))
        {
            return false;
        }
        let higher_ok = match (self.higher(), other.higher()) {
            (Some(a), Some(b)) => {
                a == b
                    || matches!((graph.property(a), graph.property(b)), (Some(x), Some(y)) if x.can_be_equals(y, EqualMode::WithinOneText, graph))
            }
            (Some(_), None) => false,
            _ => true,
        };
        if !higher_ok {
            return false;
        }
        nb.len() > na.len()
            || theirs.len() > self.refs().count()
            || (self.higher().is_none() && other.higher().is_some())
    }

    /// Merges another description of the same post. Names are united, with a
    /// name that is a word prefix of a longer one dropped; `HIGHER` is adopted
    /// only when `self` has none and `higher_ok` says the edge is sound.
    pub fn merge_from(&mut self, other: &PersonPropertyReferent, higher_ok: bool) {
        for slot in &other.slots {
            match slot.type_name.as_str() {
                slots::NAME => {
                    let Some(name) = slot.value.as_text() else {
                        continue;
                    };
                    let shorter: Vec<String> = self
                        .slots
                        .texts(slots::NAME)
                        .filter(|n| word_prefix(n, name))
                        .map(str::to_string)
                        .collect();
                    if self.slots.texts(slots::NAME).any(|n| word_prefix(name, n)) {
                        continue;
                    }
                    for s in shorter {
                        self.slots.remove(slots::NAME, &SlotValue::Text(s));
                    }
                    self.slots.add(slots::NAME, name);
                }
                slots::HIGHER => {
                    if self.higher().is_none() && higher_ok {
                        self.slots.add(slots::HIGHER, slot.value.clone());
                    }
                }
                other_type => {
                    self.slots.add(other_type, slot.value.clone());
                }
            }
        }
        if self.kind == PropertyKind::Undefined {
            self.kind = other.kind;
        }
    }
}

impl fmt::Display for PersonPropertyReferent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("?"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referent::{ForeignReferent, Referent};
    use crate::registry::Registry;
    use crate::vocab::Vocabulary;

    fn registry() -> Registry {
        Registry::new(Vocabulary::builtin().expect("vocab"), Default::default())
    }

    fn geo(reg: &mut Registry, name: &str) -> ReferentId {
        let mut f = ForeignReferent::new("GEO");
        f.slots.add(slots::NAME, name);
        reg.register(Referent::Foreign(f))
    }

    #[test]
    fn synonyms_and_boss_words() {
        let mut reg = registry();
        let ru = geo(&mut reg, "RUSSIA");
        let pm = PersonPropertyReferent::new("prime minister", PropertyKind::Boss);
        let premier = PersonPropertyReferent::new("premier", PropertyKind::Boss);
        assert!(pm.can_be_equals(&premier, EqualMode::WithinOneText, &reg));

        let mut head = PersonPropertyReferent::new("head", PropertyKind::Boss);
        let mut president = PersonPropertyReferent::new("president", PropertyKind::Boss);
        assert!(!head.can_be_equals(&president, EqualMode::WithinOneText, &reg));
        head.slots.add(slots::REF, ru);
        president.slots.add(slots::REF, ru);
        assert!(head.can_be_equals(&president, EqualMode::WithinOneText, &reg));
    }

    #[test]
    fn different_targets_are_different_posts() {
        let mut reg = registry();
        let ru = geo(&mut reg, "RUSSIA");
        let fr = geo(&mut reg, "FRANCE");
        let mut a = PersonPropertyReferent::new("president", PropertyKind::Boss);
        a.slots.add(slots::REF, ru);
        let mut b = PersonPropertyReferent::new("president", PropertyKind::Boss);
        b.slots.add(slots::REF, fr);
        assert!(!a.can_be_equals(&b, EqualMode::WithinOneText, &reg));
        let bare = PersonPropertyReferent::new("president", PropertyKind::Boss);
        assert!(bare.can_be_equals(&a, EqualMode::WithinOneText, &reg));
        assert!(!bare.can_be_equals(&a, EqualMode::DifferentTexts, &reg));
    }

    #[test]
    fn generalization_requires_strictly_more_detail() {
        let mut reg = registry();
        let ru = geo(&mut reg, "RUSSIA");
        let general = PersonPropertyReferent::new("president", PropertyKind::Boss);
        let mut specific = PersonPropertyReferent::new("president", PropertyKind::Boss);
        specific.slots.add(slots::REF, ru);
        assert!(general.can_be_general_for(&specific, &reg));
        assert!(!specific.can_be_general_for(&general, &reg));
        assert!(!general.can_be_general_for(&general.clone(), &reg));

        let director = PersonPropertyReferent::new("director", PropertyKind::Boss);
        let finance = PersonPropertyReferent::new("director finance", PropertyKind::Boss);
        assert!(director.can_be_general_for(&finance, &reg));
        let directory = PersonPropertyReferent::new("directorate", PropertyKind::Boss);
        assert!(!director.can_be_general_for(&directory, &reg));
    }

    #[test]
    fn merge_keeps_longer_names_and_sound_higher() {
        let mut a = PersonPropertyReferent::new("director", PropertyKind::Undefined);
        let mut b = PersonPropertyReferent::new("director finance", PropertyKind::Boss);
        b.set_higher(ReferentId(9));
        a.merge_from(&b, false);
        assert_eq!(a.slots.texts(slots::NAME).collect::<Vec<_>>(), vec!["director finance"]);
        assert_eq!(a.higher(), None);
        assert_eq!(a.kind, PropertyKind::Boss);
        a.merge_from(&b, true);
        assert_eq!(a.higher(), Some(ReferentId(9)));
    }

    #[test]
    fn higher_chain_rejects_cycles() {
        let mut reg = registry();
        let a = reg.register(Referent::Property(PersonPropertyReferent::new("a", PropertyKind::Undefined)));
        let b = reg.register(Referent::Property(PersonPropertyReferent::new("b", PropertyKind::Undefined)));
        assert!(reg.set_higher(a, b));
        assert!(!reg.set_higher(b, a));
        assert!(!reg.set_higher(a, a));
        assert!(higher_chain_is_sound(&reg, None, a));
    }
}
