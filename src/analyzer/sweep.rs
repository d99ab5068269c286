//! Attribute sweep run after the scans: foreign spans are embedded,
//! generalized attributes are retargeted, and attribute runs no person
//! claimed are promoted.

use super::{Ctx, Document};
use crate::attr::{try_attach_attr, AttrType};
use crate::referent::{EqualMode, ReferentGraph};
use crate::registry::Occurrence;
use persona_core::{ReferentId, TokenId};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) fn run(ctx: &Ctx<'_>, doc: &mut Document) {
    doc.materialize_pending();
    retarget_generalized(doc);
    promote_attributes(ctx, doc);
    doc.materialize_pending();
}

/// Points the property tokens inside a person's mentions at the broader
/// property that replaced the narrower one, then drops narrower properties
/// nothing refers to any more.
fn retarget_generalized(doc: &mut Document) {
    let gens = doc.registry.generalizations().to_vec();
    if gens.is_empty() {
        return;
    }
    let composites = doc.tokens.composites();
    for g in gens {
        let person = doc.registry.resolve(g.person);
        let narrower = doc.registry.resolve(g.narrower);
        let broader = doc.registry.resolve(g.broader);
        if narrower == broader {
            continue;
        }
        for &pc in &composites {
            if doc.tokens.referent(pc).map(|r| doc.registry.resolve(r)) != Some(person) {
                continue;
            }
            let Some((b, e)) = doc.tokens.composite_span(pc) else {
                continue;
            };
            let inner: Vec<TokenId> = doc.tokens.span(b, e).collect();
            for tok in inner {
                if doc.tokens.referent(tok).map(|r| doc.registry.resolve(r)) != Some(narrower) {
                    continue;
                }
                let t = doc.tokens.token(tok);
                let occ = Occurrence {
                    begin_char: t.begin_char,
                    end_char: t.end_char,
                };
                if doc.tokens.retarget(tok, broader).is_ok() {
                    doc.registry.move_occurrence(narrower, broader, occ);
                }
            }
        }
        if doc.registry.get(narrower).is_some()
            && doc.registry.occurrences(narrower).is_empty()
            && doc.registry.inbound_edges(narrower) == 0
        {
            doc.registry.remove(narrower);
            log::debug!("[persons] dropped generalized attribute {narrower}");
        }
    }
}

/// Property → persons carrying it.
fn holders(doc: &Document) -> BTreeMap<ReferentId, BTreeSet<ReferentId>> {
    let mut map: BTreeMap<ReferentId, BTreeSet<ReferentId>> = BTreeMap::new();
    for (pid, person) in doc.registry.persons() {
        for a in person.attributes() {
            map.entry(doc.registry.resolve(a)).or_default().insert(pid);
        }
    }
    map
}

/// Final pass over attribute runs left outside any person: a run equal to
/// the attribute of exactly one person becomes a mention of that person;
/// otherwise it is kept as a standalone property when it may stand alone or
/// some person already has it.
fn promote_attributes(ctx: &Ctx<'_>, doc: &mut Document) {
    if doc.attr_begins.is_empty() {
        return;
    }
    let holders = holders(doc);
    let mut cur = doc.tokens.first();
    while let Some(t) = cur {
        cur = doc.tokens.next(t);
        if doc.tokens.referent(t).is_some()
            || !doc.attr_begins.contains(&doc.tokens.token(t).begin_char)
        {
            continue;
        }
        let Some(a) = try_attach_attr(ctx, &doc.registry, &doc.tokens, t) else {
            continue;
        };
        if !matches!(a.typ, AttrType::Position | AttrType::King) {
            continue;
        }
        let Some(draft) = &a.draft else { continue };

        let probe = doc.probe_draft(draft);
        let mut owners: BTreeMap<ReferentId, ReferentId> = BTreeMap::new();
        for (&prop, persons) in &holders {
            let equal = doc
                .registry
                .property(prop)
                .is_some_and(|p| p.can_be_equals(&probe, EqualMode::WithinOneText, &doc.registry));
            if equal {
                for &person in persons {
                    owners.entry(person).or_insert(prop);
                }
            }
        }
        let after = doc.tokens.next(a.end);
        let clean_break = after.map_or(true, |n| {
            !doc.tokens.is_char(n, '_') && !doc.tokens.is_newline_before(n)
        });

        if owners.len() == 1 && clean_break {
            let Some((&person, &prop)) = owners.iter().next() else {
                continue;
            };
            if let Some(tok) = doc.embed(a.begin, a.end, prop) {
                doc.embed(tok, tok, person);
                log::debug!("[persons] attribute at char {} promoted to person {person}", doc.tokens.token(tok).begin_char);
            }
            cur = after;
        } else if a.can_be_independent || !owners.is_empty() {
            let pid = doc.register_draft(draft);
            if doc.embed(a.begin, a.end, pid).is_some() {
                log::debug!("[persons] standalone attribute {pid}");
            }
            cur = after;
        }
    }
}
