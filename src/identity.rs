//! Identity-document matcher.
//!
//! ```text
//! DOCTYPE [of STATE] { SERIES x | NUMBER x | x | ISSUED [by] ORG | DATE
//!                    | DEPARTMENT-CODE x | REGISTRATION address }
//! ```

use crate::analyzer::Ctx;
use crate::attr::{ref_at, RefDraft};
use crate::referent::{slots, PersonIdentityReferent, Referent, ReferentGraph};
use crate::vocab::DocKeyword;
use once_cell::sync::Lazy;
use persona_core::{CharClass, ReferentId, TokenId, TokenView};
use regex::Regex;

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0?[1-9]|[12][0-9]|3[01])[./](0?[1-9]|1[0-2])[./]((?:19|20)\d{2})$")
        .expect("date regex")
});

/// Longest run of words taken as an issuing organization or address.
const MAX_FREE_WORDS: usize = 8;

/// A matched identity document.
#[derive(Debug, Clone)]
pub struct IdentityMatch {
    /// First token.
    pub begin: TokenId,
    /// Last token.
    pub end: TokenId,
    /// The document with its literal slots.
    pub referent: PersonIdentityReferent,
    /// Slots whose values are foreign referents, keyed by slot type.
    pub refs: Vec<(&'static str, RefDraft)>,
}

#[derive(Default)]
struct Parts {
    series: Option<String>,
    number: Option<String>,
    date: Option<String>,
    org: Option<String>,
    address: Option<String>,
    refs: Vec<(&'static str, RefDraft)>,
}

impl Parts {
    fn has_ref(&self, slot: &str) -> bool {
        self.refs.iter().any(|(s, _)| *s == slot)
    }

    fn assembled_number(&self) -> Option<String> {
        match (&self.series, &self.number) {
            (Some(s), Some(n)) => Some(format!("{s} {n}")),
            (None, Some(n)) => Some(n.clone()),
            (Some(s), None) if s.chars().count() > 5 => Some(s.clone()),
            _ => None,
        }
    }
}

fn is_code(view: &TokenView, t: TokenId) -> bool {
    let tok = view.token(t);
    view.term(t).is_some()
        && (tok.chars.contains(CharClass::DIGIT)
            || (tok.chars.contains(CharClass::ALL_UPPER) && tok.end_char - tok.begin_char <= 3))
}

fn skip_colon(view: &TokenView, t: TokenId) -> Option<TokenId> {
    if view.is_char(t, ':') {
        view.next(t)
    } else {
        Some(t)
    }
}

/// `dd.mm.yyyy` starting at `t`, with its last token.
fn date_at(view: &TokenView, t: TokenId) -> Option<(String, TokenId)> {
    let ids: Vec<TokenId> = std::iter::successors(Some(t), |&x| view.next(x))
        .take(5)
        .collect();
    if ids.len() < 5 || ids[1..].iter().any(|&x| view.is_whitespace_before(x)) {
        return None;
    }
    let end = ids[4];
    let text = view.source(t, end);
    DATE.is_match(text).then(|| (text.to_string(), end))
}

/// Digit group: consecutive digit tokens on one line. Returns the joined
/// digits and the last token.
fn number_at(view: &TokenView, t: TokenId) -> Option<(String, TokenId)> {
    view.number(t)?;
    let mut value = view.term(t)?.to_string();
    let mut end = t;
    // "45 10" in a series
    while let Some(n) = view.next(end) {
        if view.newlines_before(n) > 0 || view.number(n).is_none() || value.len() >= 4 {
            break;
        }
        let Some(term) = view.term(n) else { break };
        if value.len() + term.len() > 4 {
            break;
        }
        value.push_str(term);
        end = n;
    }
    Some((value, end))
}

fn keyword_or_stop(ctx: &Ctx<'_>, view: &TokenView, t: TokenId) -> bool {
    view.is_char_of(t, ";.,") || ctx.vocab.doc_keyword_at(view, t).is_some() || date_at(view, t).is_some()
}

/// Free words up to a keyword, date, punctuation or line break.
fn free_words(ctx: &Ctx<'_>, view: &TokenView, t: TokenId) -> Option<(String, TokenId)> {
    let mut end = None;
    let mut cur = Some(t);
    let mut n = 0;
    while let Some(tt) = cur {
        if n >= MAX_FREE_WORDS
            || (n > 0 && view.newlines_before(tt) > 0)
            || view.referent(tt).is_some()
            || keyword_or_stop(ctx, view, tt)
        {
            break;
        }
        end = Some(tt);
        n += 1;
        cur = view.next(tt);
    }
    let end = end?;
    Some((view.source(t, end).to_uppercase(), end))
}

fn free_value(
    ctx: &Ctx<'_>,
    graph: &dyn ReferentGraph,
    view: &TokenView,
    t: TokenId,
) -> Option<(Result<RefDraft, String>, TokenId)> {
    if let Some((r, end)) = ref_at(ctx, graph, view, t) {
        return Some((Ok(r), end));
    }
    free_words(ctx, view, t).map(|(s, end)| (Err(s), end))
}

fn part_at(
    ctx: &Ctx<'_>,
    graph: &dyn ReferentGraph,
    view: &TokenView,
    t: TokenId,
    parts: &mut Parts,
) -> Option<TokenId> {
    if let Some((value, end)) = date_at(view, t) {
        if parts.date.is_some() {
            return None;
        }
        parts.date = Some(value);
        return Some(end);
    }
    if let Some((kw, kend)) = ctx.vocab.doc_keyword_at(view, t) {
        let v = skip_colon(view, view.next(kend)?)?;
        return match kw {
            DocKeyword::Series => {
                if parts.series.is_some() || !is_code(view, v) {
                    return None;
                }
                let (s, end) = number_at(view, v).unwrap_or_else(|| (view.term(v).unwrap_or_default().to_string(), v));
                parts.series = Some(s);
                Some(end)
            }
            DocKeyword::Number => {
                if parts.number.is_some() {
                    return None;
                }
                let (s, end) = number_at(view, v)?;
                parts.number = Some(s);
                Some(end)
            }
            DocKeyword::Issued => {
                if let Some((value, end)) = date_at(view, v) {
                    parts.date.get_or_insert(value);
                    return Some(end);
                }
                if parts.org.is_some() || parts.has_ref(slots::ORG) {
                    return None;
                }
                let (value, end) = free_value(ctx, graph, view, v)?;
                match value {
                    Ok(r) => parts.refs.push((slots::ORG, r)),
                    Err(s) => parts.org = Some(s),
                }
                Some(end)
            }
            DocKeyword::Code => {
                // the department code is consumed but not stored
                let mut end = v;
                for tt in std::iter::successors(Some(v), |&x| view.next(x)).take(3) {
                    if view.number(tt).is_some() || view.is_hyphen(tt) {
                        end = tt;
                    } else {
                        break;
                    }
                }
                Some(end)
            }
            DocKeyword::Address => {
                if parts.address.is_some() || parts.has_ref(slots::ADDRESS) {
                    return None;
                }
                let (value, end) = free_value(ctx, graph, view, v)?;
                match value {
                    Ok(r) => parts.refs.push((slots::ADDRESS, r)),
                    Err(s) => parts.address = Some(s),
                }
                Some(end)
            }
        };
    }
    let (value, end) = number_at(view, t)?;
    if parts.number.is_none() {
        parts.number = Some(value);
    } else if parts.series.is_none() && parts.number.as_ref().is_some_and(|n| n.len() <= 4) {
        // "4510 123456": the first group was the series
        parts.series = parts.number.take();
        parts.number = Some(value);
    } else {
        return None;
    }
    Some(end)
}

/// Matches an identity document at `t`.
#[must_use]
pub fn try_attach_identity(
    ctx: &Ctx<'_>,
    graph: &dyn ReferentGraph,
    view: &TokenView,
    t: TokenId,
) -> Option<IdentityMatch> {
    let (typ, mut end) = ctx.vocab.document_at(view, t)?;
    let mut parts = Parts::default();

    if let Some(link) = view.next(end).filter(|&n| ctx.vocab.is_linking(view, n)) {
        if let Some((r, rend)) = view.next(link).and_then(|s| ref_at(ctx, graph, view, s)) {
            parts.refs.push((slots::STATE, r));
            end = rend;
        }
    }

    let mut cur = view.next(end);
    while let Some(tt) = cur {
        if view.newlines_before(tt) > 1 {
            break;
        }
        let start = if view.is_char_of(tt, ",:") {
            match view.next(tt) {
                Some(n) => n,
                None => break,
            }
        } else {
            tt
        };
        let Some(pend) = part_at(ctx, graph, view, start, &mut parts) else {
            break;
        };
        end = pend;
        cur = view.next(pend);
    }

    let number = parts.assembled_number()?;
    let mut referent = PersonIdentityReferent::new(typ, &number);
    if let Some(d) = parts.date {
        referent.slots.add(slots::DATE, d);
    }
    if let Some(o) = parts.org {
        referent.slots.add(slots::ORG, o);
    }
    if let Some(a) = parts.address {
        referent.slots.add(slots::ADDRESS, a);
    }
    Some(IdentityMatch {
        begin: t,
        end,
        referent,
        refs: parts.refs,
    })
}

/// Person composite right before `t`, optionally across one ':' or ','.
#[must_use]
pub fn preceding_person(graph: &dyn ReferentGraph, view: &TokenView, t: TokenId) -> Option<ReferentId> {
    let mut p = view.prev(t)?;
    if view.is_char_of(p, ":,") {
        p = view.prev(p)?;
    }
    let id = view.referent(p)?;
    matches!(graph.get(id), Some(Referent::Person(_))).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PersonAnalyzer;

    fn identity(text: &str) -> Option<PersonIdentityReferent> {
        let analyzer = PersonAnalyzer::builder().build().expect("analyzer");
        let doc = analyzer.document(text);
        let ctx = analyzer.ctx();
        let t = doc.tokens.first()?;
        try_attach_identity(&ctx, doc.registry(), &doc.tokens, t).map(|m| m.referent)
    }

    #[test]
    fn series_and_number_join_with_space() {
        let id = identity("passport series 4510 number 123456").expect("doc");
        assert_eq!(id.typ(), Some("passport"));
        assert_eq!(id.number(), Some("4510 123456"));
    }

    #[test]
    fn bare_groups_split_into_series_and_number() {
        let id = identity("паспорт 4510 123456").expect("doc");
        assert_eq!(id.number(), Some("4510 123456"));
    }

    #[test]
    fn issued_by_and_date() {
        let id = identity("passport No 123456, issued by Moscow police 12.05.2010").expect("doc");
        assert_eq!(id.number(), Some("123456"));
        assert_eq!(id.slots.first_text(slots::ORG), Some("MOSCOW POLICE"));
        assert_eq!(id.slots.first_text(slots::DATE), Some("12.05.2010"));
    }

    #[test]
    fn short_series_alone_is_not_a_number() {
        assert!(identity("passport series AB").is_none());
        let id = identity("birth certificate series 1234567").expect("doc");
        assert_eq!(id.number(), Some("1234567"));
    }

    #[test]
    fn bare_type_is_not_a_document() {
        assert!(identity("passport office").is_none());
    }
}
