//! Person matching at one position: attribute chain, name templates,
//! single-name fallbacks, corroboration and sibling lists.

use super::Ctx;
use crate::attr::{try_attach_age, try_attach_attr, try_attach_attr_chain, AttrChain, AttrMatch, AttrType};
use crate::names::{try_attach_list, ItemFlags, NameItem, NameVariants};
use crate::referent::{compare_surnames, slots, PersonReferent, Referent, ReferentGraph};
use crate::registry::Registry;
use crate::services::{KnownPerson, Ontology};
use crate::templates::{candidates, pick_best, FioTemplate, MatchContext, NameCandidate};
use persona_core::{MorphCase, MorphGender, MorphTarget, TokenId, TokenView};

/// A person mention ready to be registered and embedded.
#[derive(Debug, Clone)]
pub(crate) struct PersonMatch {
    pub begin: TokenId,
    pub end: TokenId,
    pub person: PersonReferent,
    pub attrs: Vec<AttrMatch>,
    /// Shares the attributes of the first person of its list.
    pub inherit_attrs: bool,
    /// Matched by the single-name fallback.
    pub single_name: bool,
}

/// Outcome of a match attempt that consumed something.
#[derive(Debug, Clone)]
pub(crate) enum Attach {
    /// One or more persons (a sibling list shares one surname).
    Persons(Vec<PersonMatch>),
    /// An over-long attribute run, consumed without a referent.
    Skip(TokenId),
}

/// Template of a person mentioned right before `t` ("Ivanov I.I., Petrov P.P.").
fn prev_template(ctx: &Ctx<'_>, reg: &Registry, view: &TokenView, t: TokenId) -> Option<FioTemplate> {
    let mut p = view.prev(t)?;
    if view.is_comma(p) || ctx.vocab.is_and(view, p) {
        p = view.prev(p)?;
    }
    match reg.get(view.referent(p)?)? {
        Referent::Person(person) => Some(person.template),
        _ => None,
    }
}

fn agrees(a: MorphCase, b: MorphCase) -> bool {
    a.is_empty() || b.is_empty() || a.intersects(b)
}

/// Exactly one registered person carries a compatible surname.
fn unique_registered_surname(reg: &Registry, value: &str) -> bool {
    reg.persons()
        .filter(|(_, p)| p.lastnames().any(|s| compare_surnames(s, value)))
        .take(2)
        .count()
        == 1
}

/// Fallbacks when no template applies: a bare first name after a royal
/// title, or a single surname after an attribute or matching a person
/// already known in the document.
fn single_name(
    ctx: &Ctx<'_>,
    reg: &Registry,
    items: &[NameItem],
    chain: Option<&AttrChain>,
    case: MorphCase,
) -> Option<NameCandidate> {
    let item = items.first()?;
    let gender = chain.map_or(MorphGender::empty(), |c| c.gender) & MorphGender::PERSON;
    let mut cand = NameCandidate {
        template: FioTemplate::Undefined,
        begin: item.begin,
        end: item.end,
        lastname: None,
        firstname: None,
        middlename: None,
        nickname: None,
        identity: None,
        nametype: None,
        coef: ctx.config.min_coefficient,
        gender,
        case,
    };
    if chain.is_some_and(|c| c.king) && item.is_firstname() {
        let first = item.firstname.as_ref()?.filtered(gender, case)?;
        cand.gender = gender.agree(first.gender() & MorphGender::PERSON);
        cand.firstname = Some(first);
        return Some(cand);
    }
    if !item.is_lastname_like() {
        return None;
    }
    if chain.is_none() && !unique_registered_surname(reg, &item.value) {
        return None;
    }
    let last = item.lastname_variants().filtered(gender, case)?;
    cand.gender = gender.agree(last.gender() & MorphGender::PERSON);
    cand.case = case.agree(last.case());
    cand.lastname = Some(last);
    Some(cand)
}

fn ontology_hit(ctx: &Ctx<'_>, items: &[NameItem], end: TokenId) -> bool {
    let Some(ontology) = ctx.caps.ontology.as_ref() else {
        return false;
    };
    let upto = items.iter().position(|i| i.end == end).map_or(items.len(), |p| p + 1);
    let terms: Vec<&str> = items[..upto].iter().map(|i| i.value.as_str()).collect();
    !ontology.find(&terms).is_empty()
}

/// Attribute right after the name, or after a comma following it.
fn following_attr_agrees(
    ctx: &Ctx<'_>,
    reg: &Registry,
    view: &TokenView,
    end: TokenId,
    case: MorphCase,
) -> bool {
    let Some(mut n) = view.next(end) else {
        return false;
    };
    if view.is_comma(n) {
        match view.next(n) {
            Some(nn) => n = nn,
            None => return false,
        }
    }
    try_attach_attr(ctx, reg, view, n).is_some_and(|a| a.draft.is_some() && agrees(a.case, case))
}

/// Applies the corroboration rules to a candidate. Returns the final
/// coefficient.
fn corroborate(
    ctx: &Ctx<'_>,
    reg: &Registry,
    view: &TokenView,
    cand: &NameCandidate,
    items: &[NameItem],
    chain: Option<&AttrChain>,
) -> i32 {
    let mut coef = cand.coef;
    if following_attr_agrees(ctx, reg, view, cand.end, cand.case) {
        coef += 2;
    }
    if coef >= ctx.config.min_coefficient {
        return coef;
    }
    if let Some(c) = chain {
        coef += if !c.case.is_empty() && !cand.case.is_empty() && c.case.intersects(cand.case) {
            2
        } else {
            1
        };
    }
    if ontology_hit(ctx, items, cand.end) {
        coef += 1;
    }
    if view.is_newline_before(cand.begin) && view.is_newline_after(cand.end) {
        coef += 1;
    }
    coef
}

/// Person referent described by a candidate.
pub(crate) fn person_from(cand: &NameCandidate, chain_gender: MorphGender) -> PersonReferent {
    let mut p = PersonReferent::new();
    p.add_fio_identity(
        cand.lastname.as_ref(),
        cand.firstname.as_ref(),
        cand.middlename.as_ref(),
    );
    if let Some(n) = &cand.nickname {
        p.slots.add(slots::NICKNAME, n.as_str());
    }
    if let Some(i) = &cand.identity {
        p.add_identity(i);
    }
    if let Some(nt) = cand.nametype {
        p.slots.add(slots::NAMETYPE, nt);
    }
    p.template = cand.template;
    if let Some(g) = cand.gender.definite().or_else(|| chain_gender.definite()) {
        p.set_sex(g);
    }
    p
}

/// Person referent for a gazetteer entry.
pub(crate) fn person_from_known(known: &KnownPerson) -> PersonReferent {
    let col = |v: &Option<String>| v.as_ref().map(|s| NameVariants::single(s.to_uppercase(), MorphGender::empty()));
    let mut p = PersonReferent::new();
    p.add_fio_identity(
        col(&known.lastname).as_ref(),
        col(&known.firstname).as_ref(),
        col(&known.middlename).as_ref(),
    );
    p
}

/// ", director of finance" after a name, unless another name follows the
/// attributes (then they belong to that name).
fn apposition(
    ctx: &Ctx<'_>,
    reg: &Registry,
    view: &TokenView,
    end: TokenId,
) -> Option<AttrChain> {
    let comma = view.next(end).filter(|&c| view.is_comma(c))?;
    let start = view.next(comma)?;
    let chain = try_attach_attr_chain(ctx, reg, view, start)?;
    if chain.overflow
        || !chain
            .items
            .iter()
            .all(|a| a.draft.is_some() && a.typ == AttrType::Position)
    {
        return None;
    }
    let after = view.next(chain.end()?);
    let name_follows = after.is_some_and(|a| {
        !try_attach_list(ctx, view, a, ItemFlags::empty(), 2).is_empty()
    });
    (!name_follows).then_some(chain)
}

/// Matches one person at `t`.
pub(crate) fn try_attach_person(
    ctx: &Ctx<'_>,
    reg: &Registry,
    view: &TokenView,
    t: TokenId,
    step: usize,
    depth: usize,
) -> Option<Attach> {
    if depth > ctx.config.max_depth || view.referent(t).is_some() {
        return None;
    }
    let chain = if step == 0 || view.is_memo(t) {
        try_attach_attr_chain(ctx, reg, view, t)
    } else {
        None
    };
    if let Some(c) = &chain {
        if c.overflow {
            return Some(Attach::Skip(c.end()?));
        }
        if !c.allows_person_after() {
            return None;
        }
    }

    let mut case = chain.as_ref().map_or(MorphCase::empty(), |c| c.case);
    if ctx.config.nominative_case_always {
        case = MorphCase::NOMINATIVE;
    }
    let mut n0 = match chain.as_ref().and_then(AttrChain::end) {
        Some(e) => view.next(e)?,
        None => t,
    };
    if chain.is_some() && view.is_char(n0, ':') {
        n0 = view.next(n0)?;
        case = MorphCase::NOMINATIVE;
    }

    if let Some(c) = chain.as_ref().filter(|_| view.is_char(n0, '(')) {
        let inner = view.next(n0)?;
        let Some(Attach::Persons(list)) = try_attach_person(ctx, reg, view, inner, step, depth + 1) else {
            return None;
        };
        let mut m = list.into_iter().next()?;
        let close = view.next(m.end).filter(|&x| view.is_char(x, ')'))?;
        if m.person.sex_gender().is_none() {
            if let Some(g) = c.gender.definite() {
                m.person.set_sex(g);
            }
        }
        let mut attrs = c.items.clone();
        attrs.append(&mut m.attrs);
        m.attrs = attrs;
        m.begin = t;
        m.end = close;
        return Some(Attach::Persons(vec![m]));
    }

    let items = try_attach_list(ctx, view, n0, ItemFlags::empty(), ctx.config.max_name_items);
    if items.is_empty() {
        return None;
    }
    let mctx = MatchContext {
        attr_case: case,
        attr_gender: chain.as_ref().map_or(MorphGender::empty(), |c| c.gender),
        king: chain.as_ref().is_some_and(|c| c.king),
        prev_template: prev_template(ctx, reg, view, t),
        starts_with_sns: ctx.config.text_starts_with_lastname_firstname_middlename,
        max_coefficient: ctx.config.max_coefficient,
    };
    let all = candidates(&items, &mctx);
    let single = all.is_empty();
    let cand = if single {
        single_name(ctx, reg, &items, chain.as_ref(), case)?
    } else {
        pick_best(all)?
    };
    if corroborate(ctx, reg, view, &cand, &items, chain.as_ref()) < ctx.config.min_coefficient {
        return None;
    }

    let chain_gender = chain.as_ref().map_or(MorphGender::empty(), |c| c.gender);
    let mut person = person_from(&cand, chain_gender);
    let mut attrs = chain.map(|c| c.items).unwrap_or_default();
    let mut end = cand.end;

    let age = attrs.iter().find_map(|a| a.age).or_else(|| {
        try_attach_age(view, end).map(|(age, last)| {
            end = last;
            age
        })
    });
    if let Some(age) = age {
        person.slots.add(slots::AGE, age.to_string());
    }
    if let Some(app) = apposition(ctx, reg, view, end) {
        if let Some(e) = app.end() {
            end = e;
        }
        attrs.extend(app.items);
    }

    Some(Attach::Persons(vec![PersonMatch {
        begin: t,
        end,
        person,
        attrs,
        inherit_attrs: false,
        single_name: single,
    }]))
}

/// Matches a person at `t` plus the first names listed after it that share
/// its surname ("Ivan Petrov, Maria and Olga"). Sibling surnames are
/// inflected to the sibling's gender; a sibling whose surname cannot be
/// inflected is dropped.
pub(crate) fn try_attach_persons(
    ctx: &Ctx<'_>,
    reg: &Registry,
    view: &TokenView,
    t: TokenId,
    step: usize,
    depth: usize,
) -> Option<Attach> {
    let attach = try_attach_person(ctx, reg, view, t, step, depth)?;
    let Attach::Persons(mut list) = attach else {
        return Some(attach);
    };
    let surnames: Vec<String> = match list.first() {
        Some(m) => m.person.lastnames().map(str::to_string).collect(),
        None => return None,
    };
    if surnames.is_empty() {
        return Some(Attach::Persons(list));
    }

    let mut tt = list.first().and_then(|m| view.next(m.end));
    while let Some(sep) = tt {
        let is_and = ctx.vocab.is_and(view, sep);
        if !view.is_comma(sep) && !is_and {
            break;
        }
        let Some(n) = view.next(sep) else { break };
        let mut items = try_attach_list(ctx, view, n, ItemFlags::empty(), 10);
        if items.len() != 1 || try_attach_person(ctx, reg, view, n, step, depth + 1).is_some() {
            break;
        }
        let item = items.remove(0);
        let Some(first) = item.firstname.clone() else { break };
        tt = view.next(item.end);

        let gender = first.vars.first().map_or(MorphGender::empty(), |v| v.gender);
        let mut person = PersonReferent::new();
        person.add_fio_identity(None, Some(&first), None);
        let mut inflected = true;
        if let Some(g) = gender.definite() {
            person.set_sex(g);
            for sur in &surnames {
                match ctx.caps.morphology.inflect(sur, &MorphTarget::gender(g)) {
                    Ok(form) => {
                        person.slots.add(slots::LASTNAME, form);
                    }
                    Err(e) => {
                        log::debug!("[persons] sibling {} dropped: {e}", item.value);
                        inflected = false;
                    }
                }
            }
        }
        if inflected {
            for sur in &surnames {
                person.slots.add(slots::LASTNAME, sur.as_str());
            }
            list.push(PersonMatch {
                begin: item.begin,
                end: item.end,
                person,
                attrs: Vec::new(),
                inherit_attrs: true,
                single_name: false,
            });
        }
        if is_and {
            break;
        }
    }
    Some(Attach::Persons(list))
}

/// One entry of a curated list: template match, then gazetteer lookup,
/// then a lone surname.
pub(crate) fn known_entry(
    ctx: &Ctx<'_>,
    view: &TokenView,
    t: TokenId,
    ontology: &dyn Ontology,
) -> Option<(PersonReferent, TokenId)> {
    let items = try_attach_list(
        ctx,
        view,
        t,
        ItemFlags::IGNORE_ATTRS | ItemFlags::ALLOW_LOWERCASE,
        ctx.config.max_name_items,
    );
    let first = items.first()?;
    let mctx = MatchContext {
        attr_case: MorphCase::NOMINATIVE,
        max_coefficient: ctx.config.max_coefficient,
        ..MatchContext::default()
    };
    if let Some(c) = pick_best(candidates(&items, &mctx)) {
        return Some((person_from(&c, MorphGender::empty()), c.end));
    }
    let terms: Vec<&str> = items.iter().map(|i| i.value.as_str()).collect();
    if let Some(hit) = ontology
        .find(&terms)
        .into_iter()
        .filter(|h| h.len > 0 && h.len <= items.len())
        .max_by_key(|h| h.len)
    {
        return Some((person_from_known(&hit.person), items[hit.len - 1].end));
    }
    if items.len() == 1 && first.is_lastname_like() {
        let mut p = PersonReferent::new();
        p.add_fio_identity(Some(&first.lastname_variants()), None, None);
        return Some((p, first.end));
    }
    None
}
