//! Name items: the pieces a person name is built from.
//!
//! A window of tokens is segmented into items (a capitalized word, an
//! initial, a generational suffix, an Arabic connector), each annotated with
//! the first-name / surname / patronymic readings the morphology service
//! offers. Templates then arrange the items into full names.

use crate::analyzer::Ctx;
use bitflags::bitflags;
use once_cell::sync::Lazy;
use persona_core::{
    CharClass, MorphCase, MorphClass, MorphGender, MorphInfo, ReferentId, TokenId, TokenView,
};
use regex::Regex;

static ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:X{0,3})(?:IX|IV|V?I{0,3})$").expect("valid roman numeral regex"));

bitflags! {
    /// Segmentation switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ItemFlags: u8 {
        /// Do not stop at attribute terms.
        const IGNORE_ATTRS = 1;
        /// Accept lower-case words (curated known-entry lists).
        const ALLOW_LOWERCASE = 1 << 1;
    }
}

// =============================================================================
// Variant collections
// =============================================================================

/// One reading of a name: normalized value plus its gender and case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameVariant {
    /// Upper-cased normal form.
    pub value: String,
    /// Gender of the reading (empty when unknown).
    pub gender: MorphGender,
    /// Case of the reading (empty when unknown).
    pub case: MorphCase,
}

/// Alternative readings of one name occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameVariants {
    /// Readings, first is preferred.
    pub vars: Vec<NameVariant>,
    /// The surface word is also a common dictionary word.
    pub in_dictionary: bool,
}

impl NameVariants {
    /// Collection with a single reading.
    #[must_use]
    pub fn single(value: impl Into<String>, gender: MorphGender) -> Self {
        let mut v = Self::default();
        v.push(value, gender, MorphCase::empty());
        v
    }

    /// Adds a reading unless an identical one exists.
    pub fn push(&mut self, value: impl Into<String>, gender: MorphGender, case: MorphCase) {
        let value = value.into();
        if let Some(existing) = self
            .vars
            .iter_mut()
            .find(|v| v.value == value && v.gender == gender)
        {
            existing.case |= case;
            return;
        }
        self.vars.push(NameVariant {
            value,
            gender,
            case,
        });
    }

    /// Union of reading genders.
    #[must_use]
    pub fn gender(&self) -> MorphGender {
        self.vars
            .iter()
            .fold(MorphGender::empty(), |acc, v| acc | v.gender)
    }

    /// Union of reading cases.
    #[must_use]
    pub fn case(&self) -> MorphCase {
        self.vars.iter().fold(MorphCase::empty(), |acc, v| acc | v.case)
    }

    /// Reading values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|v| v.value.as_str())
    }

    /// Preferred value.
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.vars.first().map(|v| v.value.as_str())
    }

    /// Readings compatible with `gender` and `case`; `None` if none are.
    #[must_use]
    pub fn filtered(&self, gender: MorphGender, case: MorphCase) -> Option<NameVariants> {
        let vars: Vec<NameVariant> = self
            .vars
            .iter()
            .filter(|v| {
                (v.gender.is_empty() || gender.is_empty() || v.gender.intersects(gender))
                    && (v.case.is_empty() || case.is_empty() || v.case.intersects(case))
            })
            .cloned()
            .collect();
        if vars.is_empty() {
            None
        } else {
            Some(NameVariants {
                vars,
                in_dictionary: self.in_dictionary,
            })
        }
    }

    /// Keeps only values present in every collection. Returns whether
    /// anything was removed.
    pub fn intersect(list: &mut [NameVariants]) -> bool {
        if list.len() < 2 {
            return false;
        }
        let common: Vec<String> = list[0]
            .values()
            .filter(|v| list[1..].iter().all(|c| c.values().any(|x| x == *v)))
            .map(str::to_string)
            .collect();
        if common.is_empty() {
            return false;
        }
        let mut changed = false;
        for col in list.iter_mut() {
            let before = col.vars.len();
            col.vars.retain(|v| common.contains(&v.value));
            changed |= before != col.vars.len();
        }
        changed
    }

    /// Drops readings of the other gender from every collection that has a
    /// reading of `gender`.
    pub fn set_gender(list: &mut [NameVariants], gender: MorphGender) {
        for col in list.iter_mut() {
            let fits = |v: &NameVariant| v.gender.is_empty() || v.gender.intersects(gender);
            if col.vars.iter().any(fits) {
                col.vars.retain(fits);
            }
        }
    }
}

// =============================================================================
// Items
// =============================================================================

/// What an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A name-like word.
    Value,
    /// A single letter followed by a dot.
    Initial,
    /// An already resolved referent.
    Referent(ReferentId),
    /// "Jr", "Sr".
    Suffix,
}

/// One segmented name piece.
#[derive(Debug, Clone)]
pub struct NameItem {
    /// First token.
    pub begin: TokenId,
    /// Last token (the dot of an initial, the tail of a hyphenated name).
    pub end: TokenId,
    /// Kind.
    pub kind: ItemKind,
    /// Upper-cased surface value.
    pub value: String,
    /// Character classes of the first token.
    pub chars: CharClass,
    /// First-name readings.
    pub firstname: Option<NameVariants>,
    /// Surname readings.
    pub lastname: Option<NameVariants>,
    /// Patronymic readings.
    pub middlename: Option<NameVariants>,
    /// The word is a common dictionary word.
    pub in_dictionary: bool,
    /// Roman numeral value ("XIV").
    pub roman: Option<String>,
    /// Frequent Chinese surname syllable.
    pub asian: bool,
    /// "ibn", "bin", "abu".
    pub connector: bool,
    /// Line break before the item.
    pub newline_before: bool,
}

impl NameItem {
    fn new(view: &TokenView, begin: TokenId, end: TokenId, kind: ItemKind, value: String) -> Self {
        Self {
            begin,
            end,
            kind,
            value,
            chars: view.token(begin).chars,
            firstname: None,
            lastname: None,
            middlename: None,
            in_dictionary: false,
            roman: None,
            asian: false,
            connector: false,
            newline_before: view.newlines_before(begin) > 0,
        }
    }

    /// Capitalized word with a first-name reading.
    #[must_use]
    pub fn is_firstname(&self) -> bool {
        self.kind == ItemKind::Value && self.firstname.is_some() && !self.connector
    }

    /// Patronymic.
    #[must_use]
    pub fn is_middlename(&self) -> bool {
        self.kind == ItemKind::Value && self.middlename.is_some()
    }

    /// Known surname, or an unknown capitalized word that is nothing else.
    #[must_use]
    pub fn is_lastname_like(&self) -> bool {
        if self.kind != ItemKind::Value || self.connector || self.roman.is_some() {
            return false;
        }
        self.lastname.is_some()
            || (self.firstname.is_none() && self.middlename.is_none() && !self.in_dictionary)
    }

    /// Initial.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.kind == ItemKind::Initial
    }

    /// Surname readings, or the bare value for an undifferentiated word.
    #[must_use]
    pub fn lastname_variants(&self) -> NameVariants {
        match &self.lastname {
            Some(v) => v.clone(),
            None => {
                let mut v = NameVariants::single(self.value.clone(), MorphGender::empty());
                v.in_dictionary = self.in_dictionary;
                v
            }
        }
    }
}

fn variants(morph: &MorphInfo, class: MorphClass, in_dictionary: bool) -> Option<NameVariants> {
    let mut out = NameVariants {
        in_dictionary,
        ..NameVariants::default()
    };
    for f in morph.forms_of(class) {
        out.push(f.lemma.clone(), f.gender, f.case);
    }
    if out.vars.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn is_initial_shape(term: &str, chars: CharClass) -> bool {
    chars.contains(CharClass::ALL_UPPER) && (term.chars().count() == 1 || term == "ДЖ")
}

/// Segments one item at `t`.
#[must_use]
pub fn try_attach_item(
    ctx: &Ctx<'_>,
    view: &TokenView,
    t: TokenId,
    flags: ItemFlags,
    first: bool,
) -> Option<NameItem> {
    if view.referent(t).is_some() || !view.is_letter(t) {
        return None;
    }
    let term = view.term(t)?;
    let tok = view.token(t);

    if !first && ctx.vocab.is_arabic_connector(term) {
        let next = view.next(t)?;
        if view.token(next).chars.is_capitalized() {
            let mut item = NameItem::new(view, t, t, ItemKind::Value, term.to_string());
            item.connector = true;
            return Some(item);
        }
        return None;
    }
    if !tok.chars.is_capitalized() && !flags.contains(ItemFlags::ALLOW_LOWERCASE) {
        return None;
    }
    if !flags.contains(ItemFlags::IGNORE_ATTRS) && ctx.vocab.attribute_at(view, t).is_some() {
        return None;
    }
    if !first && ctx.vocab.is_name_suffix(term) {
        let end = match view.next(t) {
            Some(n) if view.is_char(n, '.') => n,
            _ => t,
        };
        return Some(NameItem::new(view, t, end, ItemKind::Suffix, term.to_string()));
    }
    if is_initial_shape(term, tok.chars) {
        if let Some(dot) = view.next(t).filter(|&n| view.is_char(n, '.')) {
            let mut item = NameItem::new(view, t, dot, ItemKind::Initial, term.to_string());
            item.roman = ROMAN.is_match(term).then(|| term.to_string());
            return Some(item);
        }
    }

    // hyphenated double names: "Rimsky-Korsakov"
    let mut end = t;
    let mut value = term.to_string();
    if let Some(h) = view.next(t).filter(|&h| view.is_hyphen(h)) {
        if let Some(t2) = view.next(h) {
            let joined = !view.is_whitespace_before(h)
                && !view.is_whitespace_after(h)
                && view.is_letter(t2)
                && view.token(t2).chars.is_capitalized();
            if joined {
                end = t2;
                value = format!("{value}-{}", view.term(t2).unwrap_or_default());
            }
        }
    }

    let mut item = NameItem::new(view, t, end, ItemKind::Value, value.clone());
    item.in_dictionary = tok.morph.is_common_word();
    if end == t {
        item.firstname = variants(&tok.morph, MorphClass::PROPER_NAME, item.in_dictionary);
        item.middlename = variants(&tok.morph, MorphClass::PROPER_SECNAME, item.in_dictionary);
        item.lastname = variants(&tok.morph, MorphClass::PROPER_SURNAME, item.in_dictionary);
        if tok.chars.contains(CharClass::ALL_UPPER) && ROMAN.is_match(term) {
            item.roman = Some(term.to_string());
        }
    } else {
        let tail = &view.token(end).morph;
        let gender = tail
            .forms_of(MorphClass::PROPER_SURNAME)
            .fold(MorphGender::empty(), |acc, f| acc | f.gender);
        item.lastname = Some(NameVariants::single(value.clone(), gender));
    }
    item.asian = ctx.vocab.is_asian_surname(&value);
    Some(item)
}

/// Segments up to `max` consecutive items starting at `t`.
#[must_use]
pub fn try_attach_list(
    ctx: &Ctx<'_>,
    view: &TokenView,
    t: TokenId,
    flags: ItemFlags,
    max: usize,
) -> Vec<NameItem> {
    let mut items: Vec<NameItem> = Vec::new();
    let mut cur = Some(t);
    while let Some(tt) = cur {
        if items.len() >= max {
            break;
        }
        if !items.is_empty() && view.newlines_before(tt) > 1 {
            break;
        }
        let Some(item) = try_attach_item(ctx, view, tt, flags, items.is_empty()) else {
            break;
        };
        cur = view.next(item.end);
        items.push(item);
    }
    while items.last().is_some_and(|i| i.connector) {
        items.pop();
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PersonAnalyzer;

    fn items(text: &str) -> Vec<NameItem> {
        let analyzer = PersonAnalyzer::builder().build().expect("analyzer");
        let doc = analyzer.document(text);
        let ctx = analyzer.ctx();
        let first = doc.tokens.first().expect("token");
        try_attach_list(&ctx, &doc.tokens, first, ItemFlags::empty(), 15)
    }

    #[test]
    fn segments_surname_and_initials() {
        let it = items("Ivanov A.B. met");
        assert_eq!(it.len(), 3);
        assert!(it[0].is_lastname_like());
        assert!(it[1].is_initial() && it[2].is_initial());
        assert_eq!(it[2].value, "B");
    }

    #[test]
    fn classifies_full_russian_order() {
        let it = items("Ivanov Ivan Ivanovich");
        assert!(it[0].lastname.is_some());
        assert!(it[1].is_firstname());
        assert!(it[2].is_middlename());
        assert!(!it[2].is_lastname_like());
    }

    #[test]
    fn stops_at_attributes_and_lowercase() {
        let it = items("John Smith president of");
        assert_eq!(it.len(), 2);
        let it = items("President Smith");
        assert!(it.is_empty());
    }

    #[test]
    fn joins_hyphenated_surnames() {
        let it = items("Rimsky-Korsakov");
        assert_eq!(it.len(), 1);
        assert_eq!(it[0].value, "RIMSKY-KORSAKOV");
        assert!(it[0].lastname.is_some());
    }

    #[test]
    fn roman_numerals() {
        let it = items("Louis XIV");
        assert_eq!(it[1].roman.as_deref(), Some("XIV"));
        assert!(!it[1].is_lastname_like());
    }

    #[test]
    fn arabic_connectors_inside_names() {
        let it = items("Muhammad ibn Abdullah");
        assert_eq!(it.len(), 3);
        assert!(it[1].connector);
    }

    #[test]
    fn intersect_and_set_gender() {
        let mut a = NameVariants::default();
        a.push("ИВАНОВА", MorphGender::FEMININE, MorphCase::NOMINATIVE);
        a.push("ИВАНОВ", MorphGender::MASCULINE, MorphCase::GENITIVE);
        let mut list = vec![a.clone(), NameVariants::single("ИВАНОВ", MorphGender::MASCULINE)];
        assert!(NameVariants::intersect(&mut list));
        assert_eq!(list[0].values().collect::<Vec<_>>(), vec!["ИВАНОВ"]);

        let mut list = vec![a];
        NameVariants::set_gender(&mut list, MorphGender::FEMININE);
        assert_eq!(list[0].values().collect::<Vec<_>>(), vec!["ИВАНОВА"]);
    }

    #[test]
    fn oblique_surname_normalizes() {
        let it = items("Петровым");
        let last = it[0].lastname.as_ref().expect("surname");
        assert_eq!(last.head(), Some("ПЕТРОВ"));
        assert_eq!(last.gender(), MorphGender::MASCULINE);
        assert_eq!(last.case(), MorphCase::INSTRUMENTAL);
    }
}
