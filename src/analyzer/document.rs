//! Per-document state: the token view, the referent registry and the
//! bookkeeping the scan passes share.

use crate::attr::{PropertyDraft, RefDraft};
use crate::error::Result;
use crate::referent::{slots, ForeignReferent, PersonPropertyReferent, Referent, ReferentGraph};
use crate::registry::{Occurrence, Registry};
use persona_core::{ReferentId, TokenId, TokenView};
use std::collections::{BTreeMap, BTreeSet};

/// A foreign span registered during the scan, embedded by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingEmbed {
    pub begin: TokenId,
    pub end: TokenId,
    pub referent: ReferentId,
}

/// One document under analysis.
///
/// Created by [`PersonAnalyzer::document`](crate::PersonAnalyzer::document);
/// after [`process`](crate::PersonAnalyzer::process) the registry holds the
/// referents and the token view holds one composite token per mention.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) tokens: TokenView,
    pub(crate) registry: Registry,
    /// Char positions where the first scan matched an attribute.
    pub(crate) attr_begins: BTreeSet<usize>,
    pub(crate) needs_second_pass: bool,
    pub(crate) pending_embeds: Vec<PendingEmbed>,
}

impl Document {
    pub(crate) fn new(tokens: TokenView, registry: Registry) -> Self {
        Self {
            tokens,
            registry,
            attr_begins: BTreeSet::new(),
            needs_second_pass: false,
            pending_embeds: Vec::new(),
        }
    }

    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.tokens.text()
    }

    /// Token view, including embedded composites.
    #[must_use]
    pub fn tokens(&self) -> &TokenView {
        &self.tokens
    }

    /// Referent registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry, for sibling extractors that add edges.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Live referents in registration order.
    pub fn referents(&self) -> impl Iterator<Item = (ReferentId, &Referent)> {
        self.registry.iter()
    }

    /// Live persons in registration order.
    pub fn persons(&self) -> impl Iterator<Item = (ReferentId, &crate::referent::PersonReferent)> {
        self.registry.persons()
    }

    /// Mention span → referents mentioned there.
    #[must_use]
    pub fn span_index(&self) -> BTreeMap<Occurrence, Vec<ReferentId>> {
        let mut index: BTreeMap<Occurrence, Vec<ReferentId>> = BTreeMap::new();
        for (id, _) in self.registry.iter() {
            for occ in self.registry.occurrences(id) {
                index.entry(*occ).or_default().push(id);
            }
        }
        index
    }

    /// Registers a sibling extractor's referent over `begin..=end` and embeds
    /// it, so attribute matching can point `REF` edges at it.
    pub fn embed_foreign(
        &mut self,
        begin: TokenId,
        end: TokenId,
        referent: ForeignReferent,
    ) -> Result<TokenId> {
        let id = self.registry.register(Referent::Foreign(referent));
        let tok = self.tokens.embed(begin, end, id)?;
        self.record(tok, id);
        Ok(tok)
    }

    fn record(&mut self, tok: TokenId, id: ReferentId) {
        let t = self.tokens.token(tok);
        let (b, e) = (t.begin_char, t.end_char);
        self.registry.add_occurrence(id, b, e);
    }

    /// Embeds a composite and records the mention. Failures are logged and
    /// leave the view unchanged.
    pub(crate) fn embed(&mut self, begin: TokenId, end: TokenId, id: ReferentId) -> Option<TokenId> {
        match self.tokens.embed(begin, end, id) {
            Ok(tok) => {
                self.record(tok, id);
                Some(tok)
            }
            Err(e) => {
                log::warn!("[persons] cannot embed {id}: {e}");
                None
            }
        }
    }

    pub(crate) fn register_ref(&mut self, draft: &RefDraft) -> ReferentId {
        match draft {
            RefDraft::Existing(id) => self.registry.resolve(*id),
            RefDraft::Pending {
                begin,
                end,
                referent,
            } => {
                let id = self.registry.register(Referent::Foreign(referent.clone()));
                let pending = PendingEmbed {
                    begin: *begin,
                    end: *end,
                    referent: id,
                };
                if !self
                    .pending_embeds
                    .iter()
                    .any(|p| p.begin == pending.begin && p.end == pending.end)
                {
                    self.pending_embeds.push(pending);
                }
                id
            }
        }
    }

    /// Registers a property draft with its targets and its `HIGHER` chain.
    pub(crate) fn register_draft(&mut self, draft: &PropertyDraft) -> ReferentId {
        let mut prop = PersonPropertyReferent::new(&draft.name, draft.kind);
        for r in &draft.refs {
            let rid = self.register_ref(r);
            prop.slots.add(slots::REF, rid);
        }
        let higher = draft.higher.as_deref().map(|h| self.register_draft(h));
        let id = self.registry.register(Referent::Property(prop));
        if let Some(h) = higher {
            if self.registry.property(id).is_some_and(|p| p.higher().is_none()) {
                self.registry.set_higher(id, h);
            }
        }
        id
    }

    /// Property equal to `draft` without registering anything. Pending
    /// targets are looked up among registered foreign referents.
    pub(crate) fn probe_draft(&self, draft: &PropertyDraft) -> PersonPropertyReferent {
        let mut prop = PersonPropertyReferent::new(&draft.name, draft.kind);
        for r in &draft.refs {
            let id = match r {
                RefDraft::Existing(id) => Some(self.registry.resolve(*id)),
                RefDraft::Pending { referent, .. } => self
                    .registry
                    .iter()
                    .find(|(_, f)| matches!(f, Referent::Foreign(f) if f.can_be_equals(referent)))
                    .map(|(id, _)| id),
            };
            if let Some(id) = id {
                prop.slots.add(slots::REF, id);
            }
        }
        prop
    }

    /// Embeds foreign spans registered since the last call.
    pub(crate) fn materialize_pending(&mut self) {
        for p in std::mem::take(&mut self.pending_embeds) {
            self.embed(p.begin, p.end, p.referent);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::referent::ForeignReferent;
    use crate::PersonAnalyzer;

    #[test]
    fn embed_foreign_records_occurrence() {
        let analyzer = PersonAnalyzer::builder().build().expect("analyzer");
        let mut doc = analyzer.document("director of Gazprom");
        let first = doc.tokens().first().expect("token");
        let org = doc
            .tokens()
            .iter()
            .find(|&t| doc.tokens().term(t) == Some("GAZPROM"))
            .expect("org");
        let tok = doc
            .embed_foreign(org, org, ForeignReferent::new("ORGANIZATION"))
            .expect("embed");
        assert_eq!(doc.tokens().referent(tok).map(|r| r.index()), Some(0));
        let index = doc.span_index();
        assert_eq!(index.len(), 1);
        let (occ, ids) = index.iter().next().expect("entry");
        assert_eq!((occ.begin_char, occ.end_char), (12, 19));
        assert_eq!(ids.len(), 1);
        assert_eq!(doc.tokens().first(), Some(first));
    }

    #[test]
    fn bad_span_is_an_error() {
        let analyzer = PersonAnalyzer::builder().build().expect("analyzer");
        let mut doc = analyzer.document("a b");
        let ids: Vec<_> = doc.tokens().iter().collect();
        assert!(doc
            .embed_foreign(ids[1], ids[0], ForeignReferent::new("ORGANIZATION"))
            .is_err());
    }
}
