//! Document-scoped referent registry.
//!
//! `register` either stores a new referent or merges it into an equal one
//! and returns the canonical id. Merged-away ids stay resolvable through the
//! alias table, so composite tokens and slot edges created before a merge
//! keep working.

use crate::config::SurnamePolicy;
use crate::referent::{
    higher_chain_is_sound, slots, EqualMode, PersonReferent, Referent, ReferentGraph,
};
use crate::vocab::Vocabulary;
use persona_core::ReferentId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Character span of one mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Occurrence {
    /// First character.
    pub begin_char: usize,
    /// One past the last character.
    pub end_char: usize,
}

/// A narrower attribute folded into a broader one on the same person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generalization {
    /// The person whose attributes were corrected.
    pub person: ReferentId,
    /// The discarded, more specific property.
    pub narrower: ReferentId,
    /// The kept property.
    pub broader: ReferentId,
}

/// Referents of one document.
#[derive(Debug, Clone)]
pub struct Registry {
    vocab: Arc<Vocabulary>,
    policy: SurnamePolicy,
    entries: Vec<Option<Referent>>,
    aliases: HashMap<ReferentId, ReferentId>,
    occurrences: HashMap<ReferentId, Vec<Occurrence>>,
    generalizations: Vec<Generalization>,
}

impl ReferentGraph for Registry {
    fn get(&self, id: ReferentId) -> Option<&Referent> {
        self.entries.get(self.resolve(id).index())?.as_ref()
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }
}

impl Registry {
    /// Empty registry.
    #[must_use]
    pub fn new(vocab: Arc<Vocabulary>, policy: SurnamePolicy) -> Self {
        Self {
            vocab,
            policy,
            entries: Vec::new(),
            aliases: HashMap::new(),
            occurrences: HashMap::new(),
            generalizations: Vec::new(),
        }
    }

    /// Canonical id after merges.
    #[must_use]
    pub fn resolve(&self, id: ReferentId) -> ReferentId {
        let mut cur = id;
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(&cur) {
                Some(&next) => cur = next,
                None => break,
            }
        }
        cur
    }

    /// Alias table: merged-away id → id it was merged into.
    #[must_use]
    pub fn aliases(&self) -> &HashMap<ReferentId, ReferentId> {
        &self.aliases
    }

    /// Mutable referent.
    pub fn get_mut(&mut self, id: ReferentId) -> Option<&mut Referent> {
        let id = self.resolve(id);
        self.entries.get_mut(id.index())?.as_mut()
    }

    /// Live referents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ReferentId, &Referent)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (ReferentId(i as u32), r)))
    }

    /// Live persons.
    pub fn persons(&self) -> impl Iterator<Item = (ReferentId, &PersonReferent)> {
        self.iter()
            .filter_map(|(id, r)| r.as_person().map(|p| (id, p)))
    }

    /// Number of live referents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|r| r.is_some()).count()
    }

    /// No live referents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Surname policy used when persons merge.
    #[must_use]
    pub fn surname_policy(&self) -> SurnamePolicy {
        self.policy
    }

    fn push(&mut self, referent: Referent) -> ReferentId {
        let id = ReferentId(self.entries.len() as u32);
        self.entries.push(Some(referent));
        id
    }

    fn matches(&self, candidate: &Referent) -> Vec<ReferentId> {
        self.iter()
            .filter(|(_, r)| r.can_be_equals(candidate, EqualMode::WithinOneText, self))
            .map(|(id, _)| id)
            .collect()
    }

    /// Stores `candidate`, or merges it into the equal referent already
    /// registered. Returns the canonical id either way.
    ///
    /// A person equal to two or more registered persons ("Ivanov" next to
    /// "Ivan Ivanov" and "Petr Ivanov") stays a separate referent.
    pub fn register(&mut self, candidate: Referent) -> ReferentId {
        let found = self.matches(&candidate);
        let target = match (&candidate, found.as_slice()) {
            (Referent::Person(_), [one]) => Some(*one),
            (Referent::Person(_), _) => None,
            (_, [first, ..]) => Some(*first),
            (_, []) => None,
        };
        match target {
            Some(id) => {
                self.merge_candidate(id, candidate);
                id
            }
            None => {
                let candidate = match candidate {
                    Referent::Person(mut p) => {
                        p.correct_names(self.policy, &self.vocab);
                        Referent::Person(p)
                    }
                    other => other,
                };
                let id = self.push(candidate);
                self.correct_attributes(id);
                id
            }
        }
    }

    fn merge_candidate(&mut self, id: ReferentId, candidate: Referent) {
        let Some(mut existing) = self.entries[id.index()].take() else {
            return;
        };
        match (&mut existing, &candidate) {
            (Referent::Person(a), Referent::Person(b)) => {
                a.merge_from(b);
                a.correct_names(self.policy, &self.vocab);
            }
            (Referent::Property(a), Referent::Property(b)) => {
                let higher_ok = b
                    .higher()
                    .map_or(true, |h| higher_chain_is_sound(self, Some(id), h));
                if !higher_ok {
                    log::warn!("[persons] refused HIGHER {:?} while merging into {id}", b.higher());
                }
                a.merge_from(b, higher_ok);
            }
            (Referent::Identity(a), Referent::Identity(b)) => a.merge_from(b),
            (a, b) => a.slots_mut().union_from(b.slots()),
        }
        log::debug!("[persons] merged {} into {id}", candidate.type_name());
        self.entries[id.index()] = Some(existing);
        self.correct_attributes(id);
    }

    /// Folds referent `from` into `to`: slots are united, edges and
    /// occurrences are redirected and `from` becomes an alias of `to`.
    pub fn merge_into(&mut self, from: ReferentId, to: ReferentId) -> bool {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if from == to {
            return false;
        }
        let Some(Some(referent)) = self.entries.get_mut(from.index()).map(Option::take) else {
            return false;
        };
        if self.get(to).is_none() {
            self.entries[from.index()] = Some(referent);
            return false;
        }
        self.merge_candidate(to, referent);
        self.aliases.insert(from, to);
        for r in self.entries.iter_mut().flatten() {
            r.slots_mut().redirect(from, to);
        }
        if let Some(occ) = self.occurrences.remove(&from) {
            let dst = self.occurrences.entry(to).or_default();
            for o in occ {
                if !dst.contains(&o) {
                    dst.push(o);
                }
            }
            dst.sort();
        }
        true
    }

    /// Sets the `HIGHER` edge of a property. Refused (and logged) when the
    /// edge would close a cycle or exceed the depth cap.
    pub fn set_higher(&mut self, property: ReferentId, higher: ReferentId) -> bool {
        let (property, higher) = (self.resolve(property), self.resolve(higher));
        if property == higher
            || self.property(higher).is_none()
            || !higher_chain_is_sound(self, Some(property), higher)
        {
            log::warn!("[persons] refused HIGHER edge {property} -> {higher}");
            return false;
        }
        match self.get_mut(property) {
            Some(Referent::Property(p)) => {
                p.set_higher(higher);
                true
            }
            _ => false,
        }
    }

    /// Removes a referent and every edge pointing at it.
    pub fn remove(&mut self, id: ReferentId) -> Option<Referent> {
        let id = self.resolve(id);
        let removed = self.entries.get_mut(id.index())?.take()?;
        self.occurrences.remove(&id);
        for r in self.entries.iter_mut().flatten() {
            r.slots_mut().retain(|s| s.value.as_ref_id() != Some(id));
        }
        self.aliases.retain(|_, to| *to != id);
        Some(removed)
    }

    /// Records a mention span.
    pub fn add_occurrence(&mut self, id: ReferentId, begin_char: usize, end_char: usize) {
        let id = self.resolve(id);
        let occ = Occurrence {
            begin_char,
            end_char,
        };
        let list = self.occurrences.entry(id).or_default();
        if !list.contains(&occ) {
            list.push(occ);
            list.sort();
        }
    }

    /// Mention spans of a referent.
    #[must_use]
    pub fn occurrences(&self, id: ReferentId) -> &[Occurrence] {
        self.occurrences
            .get(&self.resolve(id))
            .map_or(&[], Vec::as_slice)
    }

    /// Moves one mention span from `from` to `to`.
    pub fn move_occurrence(&mut self, from: ReferentId, to: ReferentId, occ: Occurrence) {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if let Some(list) = self.occurrences.get_mut(&from) {
            list.retain(|o| *o != occ);
        }
        self.add_occurrence(to, occ.begin_char, occ.end_char);
    }

    /// Generalizations applied so far, in order.
    #[must_use]
    pub fn generalizations(&self) -> &[Generalization] {
        &self.generalizations
    }

    /// Drops attribute edges of a person that a broader attribute of the
    /// same person generalizes. The broader property inherits the narrower
    /// one's `HIGHER` when it has none and the chain stays sound.
    pub fn correct_attributes(&mut self, person: ReferentId) {
        let person = self.resolve(person);
        let pairs = match self.get(person) {
            Some(Referent::Person(p)) => p.attribute_generalizations(self),
            _ => return,
        };
        for (narrower, broader) in pairs {
            let inherited = match (self.property(narrower), self.property(broader)) {
                (Some(n), Some(b)) if b.higher().is_none() => n.higher(),
                _ => None,
            };
            if let Some(h) = inherited {
                if h != broader && higher_chain_is_sound(self, Some(broader), h) {
                    if let Some(Referent::Property(b)) = self.get_mut(broader) {
                        b.set_higher(h);
                    }
                }
            }
            if let Some(Referent::Person(p)) = self.get_mut(person) {
                p.slots
                    .remove(slots::ATTR, &persona_core::SlotValue::Ref(narrower));
                p.add_attribute(broader);
            }
            log::debug!("[persons] attribute {narrower} generalized by {broader} on {person}");
            self.generalizations.push(Generalization {
                person,
                narrower,
                broader,
            });
        }
    }

    /// Number of edges pointing at `id`.
    #[must_use]
    pub fn inbound_edges(&self, id: ReferentId) -> usize {
        let id = self.resolve(id);
        self.iter()
            .map(|(_, r)| r.slots().as_slice().iter().filter(|s| s.value.as_ref_id() == Some(id)).count())
            .sum()
    }
}
