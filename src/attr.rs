//! Attribute matcher: titles, positions, ranks, kinship words and honorifics.
//!
//! A single attribute is one vocabulary term, optionally preceded by a deputy
//! modifier ("vice", "deputy") and followed by an "of ..." qualifier or a
//! reference to an organization. Attributes chain ("Russian writer,
//! journalist") as long as their cases agree.

use crate::analyzer::Ctx;
use crate::referent::{ForeignReferent, PropertyKind, Referent, ReferentGraph};
use crate::vocab::AttrTerm;
use persona_core::{CharClass, MorphCase, MorphGender, ReferentId, TokenId, TokenView};
use serde::{Deserialize, Serialize};

/// Most attributes one chain may hold before it is consumed as noise.
pub const MAX_CHAINED: usize = 5;

/// Kind of attribute term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    /// Anything else ("citizen").
    #[default]
    Other,
    /// Honorific ("Mr", "Dr").
    Prefix,
    /// Letter sign-off ("best regards").
    BestRegards,
    /// Position or occupation.
    Position,
    /// Royal title.
    King,
    /// Kinship term.
    Kin,
}

/// A `REF` target before it is registered.
#[derive(Debug, Clone)]
pub enum RefDraft {
    /// An already embedded foreign referent.
    Existing(ReferentId),
    /// A sibling-extractor hit over `begin..=end`, not embedded yet.
    Pending {
        /// First token.
        begin: TokenId,
        /// Last token.
        end: TokenId,
        /// The referent.
        referent: ForeignReferent,
    },
}

/// A property before it is registered.
#[derive(Debug, Clone)]
pub struct PropertyDraft {
    /// Lower-case name.
    pub name: String,
    /// Kind.
    pub kind: PropertyKind,
    /// Organization and location targets.
    pub refs: Vec<RefDraft>,
    /// Base post of a deputy ("minister" for "deputy minister").
    pub higher: Option<Box<PropertyDraft>>,
}

impl PropertyDraft {
    fn new(name: String, kind: PropertyKind) -> Self {
        Self {
            name,
            kind,
            refs: Vec::new(),
            higher: None,
        }
    }
}

/// One matched attribute.
#[derive(Debug, Clone)]
pub struct AttrMatch {
    /// First token.
    pub begin: TokenId,
    /// Last token.
    pub end: TokenId,
    /// Type.
    pub typ: AttrType,
    /// Property to create, for positions, ranks, royal titles and kin.
    pub draft: Option<PropertyDraft>,
    /// Gender implied by the term.
    pub gender: MorphGender,
    /// Case of the head word.
    pub case: MorphCase,
    /// Age in years, from "(45)" or ", 45,".
    pub age: Option<u32>,
    /// The title alone denotes a person.
    pub can_be_single_person: bool,
    /// The property may stand without a named person.
    pub can_be_independent: bool,
    /// A person name may follow.
    pub can_has_person_after: bool,
}

/// A run of chained attributes.
#[derive(Debug, Clone, Default)]
pub struct AttrChain {
    /// Matched attributes, in text order.
    pub items: Vec<AttrMatch>,
    /// Agreed case (empty when unconstrained).
    pub case: MorphCase,
    /// Agreed gender (empty when unconstrained).
    pub gender: MorphGender,
    /// A royal title is present.
    pub king: bool,
    /// A copula ("is") was crossed.
    pub after_be_predicate: bool,
    /// Too many attributes: the run is consumed without a referent.
    pub overflow: bool,
}

impl AttrChain {
    /// First token.
    #[must_use]
    pub fn begin(&self) -> Option<TokenId> {
        self.items.first().map(|a| a.begin)
    }

    /// Last token.
    #[must_use]
    pub fn end(&self) -> Option<TokenId> {
        self.items.last().map(|a| a.end)
    }

    /// Age from any attribute.
    #[must_use]
    pub fn age(&self) -> Option<u32> {
        self.items.iter().find_map(|a| a.age)
    }

    /// Some attribute lets a person name follow.
    #[must_use]
    pub fn allows_person_after(&self) -> bool {
        self.items.iter().any(|a| a.can_has_person_after)
    }
}

/// "(45)" or ", 45," right after `end`. Returns the age and the last token.
#[must_use]
pub fn try_attach_age(view: &TokenView, end: TokenId) -> Option<(u32, TokenId)> {
    let open = view.next(end)?;
    if !view.is_char_of(open, "(,") {
        return None;
    }
    let num = view.next(open)?;
    let age = u32::try_from(view.number(num)?).ok()?;
    if !(1..=120).contains(&age) {
        return None;
    }
    let close = view.next(num)?;
    let ok = if view.is_char(open, '(') {
        view.is_char(close, ')')
    } else {
        view.is_char_of(close, ",;.")
    };
    if !ok {
        return None;
    }
    // the comma closing ", 45," is left for the next separator
    let last = if view.is_char(close, ')') { close } else { num };
    Some((age, last))
}

fn qualifier_words(ctx: &Ctx<'_>, view: &TokenView, t: TokenId) -> Option<(Vec<String>, TokenId)> {
    let mut words = Vec::new();
    let mut end = t;
    let mut cur = Some(t);
    while let Some(tt) = cur {
        if words.len() >= 3 || view.newlines_before(tt) > 0 {
            break;
        }
        let tok = view.token(tt);
        let plain = view.is_letter(tt) && tok.chars.contains(CharClass::ALL_LOWER);
        if !plain
            || ctx.vocab.is_and(view, tt)
            || ctx.vocab.is_linking(view, tt)
            || ctx.vocab.is_article(view, tt)
            || ctx.vocab.is_copula(view, tt)
            || tok.morph.class().intersects(persona_core::MorphClass::VERB | persona_core::MorphClass::PREPOSITION)
        {
            break;
        }
        words.push(view.term(tt)?.to_lowercase());
        end = tt;
        cur = view.next(tt);
    }
    (!words.is_empty()).then_some((words, end))
}

/// Reference to an organization or location at `t`: an embedded foreign
/// composite, or a sibling-extractor hit.
pub(crate) fn ref_at(
    ctx: &Ctx<'_>,
    graph: &dyn ReferentGraph,
    view: &TokenView,
    t: TokenId,
) -> Option<(RefDraft, TokenId)> {
    if let Some(id) = view.referent(t) {
        return matches!(graph.get(id), Some(Referent::Foreign(_))).then_some((RefDraft::Existing(id), t));
    }
    ctx.caps.foreign.iter().find_map(|r| {
        r.resolve_at(view, t).map(|m| {
            (
                RefDraft::Pending {
                    begin: t,
                    end: m.end,
                    referent: m.referent,
                },
                m.end,
            )
        })
    })
}

fn base_term<'v>(
    ctx: &'v Ctx<'_>,
    view: &TokenView,
    t: TokenId,
) -> Option<(Option<&'v str>, &'v AttrTerm, TokenId)> {
    if let Some((deputy, dend)) = ctx.vocab.deputy_at(view, t) {
        let mut next = view.next(dend)?;
        if view.is_hyphen(next) {
            next = view.next(next)?;
        }
        let (term, end) = ctx.vocab.attribute_at(view, next)?;
        return (term.typ == AttrType::Position).then_some((Some(deputy), term, end));
    }
    let (term, end) = ctx.vocab.attribute_at(view, t)?;
    Some((None, term, end))
}

/// Matches one attribute at `t`.
#[must_use]
pub fn try_attach_attr(
    ctx: &Ctx<'_>,
    graph: &dyn ReferentGraph,
    view: &TokenView,
    t: TokenId,
) -> Option<AttrMatch> {
    if view.referent(t).is_some() {
        return None;
    }
    let (deputy, term, mut end) = base_term(ctx, view, t)?;
    let head = view.token(end);
    let mut case = head.morph.case();
    if ctx.config.nominative_case_always || term.typ == AttrType::BestRegards {
        case = MorphCase::NOMINATIVE;
    }
    let mut gender = term.gender;
    if gender.is_empty() && term.typ != AttrType::Position {
        gender = head.morph.gender().definite().unwrap_or_default();
    }

    if term.typ == AttrType::Prefix {
        if let Some(dot) = view.next(end).filter(|&n| view.is_char(n, '.')) {
            end = dot;
        }
    }

    let mut draft = match term.typ {
        AttrType::Position | AttrType::King | AttrType::Kin => {
            let mut d = PropertyDraft::new(term.canonical.clone(), term.kind);
            if let Some(dep) = deputy {
                d.higher = Some(Box::new(PropertyDraft::new(term.canonical.clone(), term.kind)));
                d.name = format!("{dep} {}", term.canonical);
            }
            Some(d)
        }
        _ => None,
    };

    if let Some(d) = draft.as_mut() {
        if let Some(link) = view.next(end).filter(|&n| {
            view.newlines_before(n) == 0 && ctx.vocab.is_linking(view, n)
        }) {
            let mut after = view.next(link);
            if let Some(a) = after.filter(|&a| ctx.vocab.is_article(view, a)) {
                after = view.next(a);
            }
            if let Some(a) = after {
                if let Some((r, rend)) = ref_at(ctx, graph, view, a) {
                    d.refs.push(r);
                    end = rend;
                } else if let Some((words, wend)) = qualifier_words(ctx, view, a) {
                    let link_word = view.term(link).unwrap_or_default().to_lowercase();
                    d.name = format!("{} {link_word} {}", d.name, words.join(" "));
                    end = wend;
                }
            }
        } else if let Some((r, rend)) = view.next(end).and_then(|n| {
            (view.newlines_before(n) == 0)
                .then(|| ref_at(ctx, graph, view, n))
                .flatten()
        }) {
            d.refs.push(r);
            end = rend;
        }
    }

    let age = try_attach_age(view, end).map(|(age, last)| {
        end = last;
        age
    });

    Some(AttrMatch {
        begin: t,
        end,
        typ: term.typ,
        draft,
        gender,
        case,
        age,
        can_be_single_person: term.single_person,
        can_be_independent: term.independent,
        can_has_person_after: age.is_none(),
    })
}

fn underscore_run(view: &TokenView, t: TokenId) -> bool {
    std::iter::successors(Some(t), |&x| view.next(x))
        .take_while(|&x| view.is_char(x, '_'))
        .count()
        > 2
}

/// Matches a run of chained attributes at `t`.
#[must_use]
pub fn try_attach_attr_chain(
    ctx: &Ctx<'_>,
    graph: &dyn ReferentGraph,
    view: &TokenView,
    t: TokenId,
) -> Option<AttrChain> {
    let mut chain = AttrChain::default();
    if ctx.config.nominative_case_always {
        chain.case = MorphCase::NOMINATIVE;
    }
    let mut cur = t;
    let mut newlines = 0;
    loop {
        let Some(a) = try_attach_attr(ctx, graph, view, cur) else {
            break;
        };
        if !chain.case.is_empty() && !a.case.is_empty() && !chain.case.intersects(a.case) {
            break;
        }
        let gender = chain.gender.agree(a.gender);
        if !chain.gender.is_empty() && !a.gender.is_empty() && gender.is_empty() {
            break;
        }
        chain.case = chain.case.agree(a.case);
        chain.gender = gender;
        chain.king |= a.typ == AttrType::King;
        let end = a.end;
        chain.items.push(a);
        if chain.items.len() > MAX_CHAINED {
            chain.overflow = true;
            break;
        }

        let Some(n) = view.next(end) else {
            break;
        };
        newlines += view.newlines_before(n);
        if newlines > 3 {
            break;
        }
        let next = if view.is_comma(n) {
            view.next(n)
        } else if ctx.vocab.is_and(view, n)
            && view.token(n).chars.contains(CharClass::ALL_LOWER)
            && view.is_whitespace_after(n)
        {
            view.next(n)
        } else if view.is_hyphen(n) && view.is_newline_after(n) {
            view.next(n)
        } else if view.is_char(n, ':') {
            chain.case = MorphCase::NOMINATIVE;
            view.next(n)
        } else if ctx.vocab.is_copula(view, n) {
            chain.after_be_predicate = true;
            view.next(n)
        } else if ctx.vocab.is_comparative(view, n) || underscore_run(view, n) {
            None
        } else {
            Some(n)
        };
        let Some(nt) = next else {
            break;
        };
        if nt != n {
            newlines += view.newlines_before(nt);
            if newlines > 3 {
                break;
            }
        }
        cur = nt;
    }
    (!chain.items.is_empty()).then_some(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::PhraseResolver;
    use crate::PersonAnalyzer;
    use std::sync::Arc;

    fn chain(analyzer: &PersonAnalyzer, text: &str) -> Option<(AttrChain, Vec<String>)> {
        let doc = analyzer.document(text);
        let ctx = analyzer.ctx();
        let t = doc.tokens.first()?;
        let c = try_attach_attr_chain(&ctx, doc.registry(), &doc.tokens, t)?;
        let names = c
            .items
            .iter()
            .filter_map(|a| a.draft.as_ref().map(|d| d.name.clone()))
            .collect();
        Some((c, names))
    }

    fn analyzer() -> PersonAnalyzer {
        PersonAnalyzer::builder().build().expect("analyzer")
    }

    #[test]
    fn single_position() {
        let (c, names) = chain(&analyzer(), "President Ivanov").expect("attr");
        assert_eq!(names, vec!["president"]);
        assert_eq!(c.items[0].typ, AttrType::Position);
        assert!(c.items[0].can_be_independent);
    }

    #[test]
    fn deputy_creates_higher() {
        let (c, names) = chain(&analyzer(), "vice-president Smith").expect("attr");
        assert_eq!(names, vec!["vice president"]);
        let higher = c.items[0].draft.as_ref().and_then(|d| d.higher.as_ref()).expect("higher");
        assert_eq!(higher.name, "president");
    }

    #[test]
    fn of_qualifier_extends_name() {
        let (_, names) = chain(&analyzer(), "director of finance John Smith").expect("attr");
        assert_eq!(names, vec!["director of finance"]);
    }

    #[test]
    fn of_foreign_referent_records_ref() {
        let analyzer = PersonAnalyzer::builder()
            .foreign_resolver(Arc::new(PhraseResolver::new("geo", &["Russia"])))
            .build()
            .expect("analyzer");
        let (c, names) = chain(&analyzer, "President of Russia Putin").expect("attr");
        assert_eq!(names, vec!["president"]);
        let d = c.items[0].draft.as_ref().expect("draft");
        assert!(matches!(d.refs.as_slice(), [RefDraft::Pending { .. }]));
    }

    #[test]
    fn chained_attributes_agree_on_gender() {
        let (c, names) = chain(&analyzer(), "writer and journalist Smith").expect("attr");
        assert_eq!(names, vec!["writer", "journalist"]);
        assert!(c.gender.is_empty());
        let (c, _) = chain(&analyzer(), "Mrs. Smith").expect("attr");
        assert_eq!(c.gender, MorphGender::FEMININE);
        assert_eq!(c.items[0].typ, AttrType::Prefix);
    }

    #[test]
    fn age_after_attribute() {
        let (c, _) = chain(&analyzer(), "journalist (45)").expect("attr");
        assert_eq!(c.age(), Some(45));
        assert!(!c.allows_person_after());
    }

    #[test]
    fn too_many_attributes_overflow() {
        let (c, _) = chain(
            &analyzer(),
            "writer, journalist, actor, singer, lawyer, engineer, coach",
        )
        .expect("attr");
        assert!(c.overflow);
    }

    #[test]
    fn comparative_stops_chain() {
        let (c, _) = chain(&analyzer(), "writer like journalist").expect("attr");
        assert_eq!(c.items.len(), 1);
    }

    #[test]
    fn blank_lines_after_a_separator_stop_the_chain() {
        let a = analyzer();
        let (c, names) = chain(&a, "minister,\n\n\n\n\npresident Smith").expect("attr");
        assert_eq!(names, vec!["minister"]);
        assert_eq!(c.items.len(), 1);
        let (c, _) = chain(&a, "minister\n\n\n\npresident Smith").expect("attr");
        assert_eq!(c.items.len(), 1);
        let (c, _) = chain(&a, "minister,\n\npresident Smith").expect("attr");
        assert_eq!(c.items.len(), 2);
    }

    #[test]
    fn colon_resets_case_to_nominative() {
        let (c, names) = chain(&analyzer(), "writer: journalist Smith").expect("attr");
        assert_eq!(names, vec!["writer", "journalist"]);
        assert_eq!(c.case, MorphCase::NOMINATIVE);
    }

    #[test]
    fn copula_sets_predicate_flag() {
        let (c, names) = chain(&analyzer(), "writer is journalist").expect("attr");
        assert_eq!(names, vec!["writer", "journalist"]);
        assert!(c.after_be_predicate);
        let (c, _) = chain(&analyzer(), "writer and journalist").expect("attr");
        assert!(!c.after_be_predicate);
    }

    #[test]
    fn underscore_filler_stops_chain() {
        let a = analyzer();
        let (c, _) = chain(&a, "writer ___ journalist").expect("attr");
        assert_eq!(c.items.len(), 1);
        let doc = a.document("___ __");
        let first = doc.tokens.first().expect("token");
        assert!(underscore_run(&doc.tokens, first));
        let short = doc.tokens.next(doc.tokens.next(doc.tokens.next(first).expect("2")).expect("3")).expect("4");
        assert!(!underscore_run(&doc.tokens, short));
    }

    #[test]
    fn hyphen_continues_only_at_line_end() {
        let a = analyzer();
        let (c, _) = chain(&a, "writer -\njournalist Smith").expect("attr");
        assert_eq!(c.items.len(), 2);
        let (c, _) = chain(&a, "writer - journalist Smith").expect("attr");
        assert_eq!(c.items.len(), 1);
    }

    #[test]
    fn conjunction_must_be_lowercase() {
        let a = analyzer();
        let (c, _) = chain(&a, "writer and journalist").expect("attr");
        assert_eq!(c.items.len(), 2);
        let (c, _) = chain(&a, "writer AND journalist").expect("attr");
        assert_eq!(c.items.len(), 1);
    }
}
