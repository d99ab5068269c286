use super::{slots, EqualMode, PropertyKind, ReferentGraph};
use crate::config::SurnamePolicy;
use crate::names::NameVariants;
use crate::templates::FioTemplate;
use crate::vocab::Vocabulary;
use persona_core::{MorphGender, ReferentId, SlotList, SlotValue};
use serde::Serialize;
use std::fmt;

/// A person.
///
/// Besides the slots, a person remembers every name occurrence it was built
/// from as a variant collection. Those collections drive gender propagation:
/// once a gender is known, readings of the other gender are dropped from all
/// of them and the slots they no longer support are pruned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonReferent {
    /// Name parts, `SEX`, `AGE`, `ATTR` and `IDDOC` edges.
    pub slots: SlotList,
    /// Template of the strongest mention.
    pub template: FioTemplate,
    #[serde(skip)]
    pub(crate) surname_occurs: Vec<NameVariants>,
    #[serde(skip)]
    pub(crate) name_occurs: Vec<NameVariants>,
    #[serde(skip)]
    pub(crate) sec_occurs: Vec<NameVariants>,
    #[serde(skip)]
    pub(crate) ident_occurs: Vec<NameVariants>,
}

/// Strips a case ending so that inflected surnames compare equal:
/// "ИВАНОВА" and "ИВАНОВУ" both become "ИВАНОВ".
#[must_use]
pub fn del_surname_end(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let n = chars.len();
    if n < 3 {
        return s.to_string();
    }
    let last = chars[n - 1];
    if matches!(last, 'А' | 'У' | 'Е' | 'A') {
        return chars[..n - 1].iter().collect();
    }
    if s.ends_with("ОМ") || s.ends_with("ЫМ") {
        return chars[..n - 2].iter().collect();
    }
    if matches!(last, 'Я' | 'Ю') && matches!(chars[n - 2], 'Н' | 'Л') {
        let mut out: String = chars[..n - 1].iter().collect();
        out.push('Ь');
        return out;
    }
    s.to_string()
}

/// Surnames that may denote the same person.
#[must_use]
pub fn compare_surnames(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.chars().count() >= 4 && long.starts_with(short) {
        return true;
    }
    del_surname_end(a) == del_surname_end(b)
}

fn is_initial(s: &str) -> bool {
    s.chars().count() == 1 || s == "ДЖ"
}

/// First or middle names compatible: a common full name, or initials that
/// match on both sides.
fn check_names<'a>(
    a: impl Iterator<Item = &'a str>,
    b: impl Iterator<Item = &'a str>,
) -> bool {
    let (inits1, names1): (Vec<&str>, Vec<&str>) = a.partition(|s| is_initial(s));
    let (inits2, names2): (Vec<&str>, Vec<&str>) = b.partition(|s| is_initial(s));
    if !names1.is_empty() && !names2.is_empty() {
        return names1.iter().any(|n| names2.contains(n));
    }
    let covered = |inits: &[&str], other_inits: &[&str], other_names: &[&str]| {
        inits.is_empty()
            || inits
                .iter()
                .any(|i| other_inits.contains(i) || other_names.iter().any(|n| n.starts_with(i)))
    };
    covered(&inits1, &inits2, &names2) && covered(&inits2, &inits1, &names1)
}

impl PersonReferent {
    /// Empty person.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Surnames.
    pub fn lastnames(&self) -> impl Iterator<Item = &str> {
        self.slots.texts(slots::LASTNAME)
    }

    /// Given names and initials.
    pub fn firstnames(&self) -> impl Iterator<Item = &str> {
        self.slots.texts(slots::FIRSTNAME)
    }

    /// Patronymics and middle initials.
    pub fn middlenames(&self) -> impl Iterator<Item = &str> {
        self.slots.texts(slots::MIDDLENAME)
    }

    /// Ordinal nickname ("II").
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.slots.first_text(slots::NICKNAME)
    }

    /// Age in years.
    #[must_use]
    pub fn age(&self) -> Option<u32> {
        self.slots.first_text(slots::AGE)?.parse().ok()
    }

    /// Property edges.
    pub fn attributes(&self) -> impl Iterator<Item = ReferentId> + '_ {
        self.slots.refs(slots::ATTR)
    }

    /// Known male.
    #[must_use]
    pub fn is_male(&self) -> bool {
        self.slots.first_text(slots::SEX) == Some(slots::MALE)
    }

    /// Known female.
    #[must_use]
    pub fn is_female(&self) -> bool {
        self.slots.first_text(slots::SEX) == Some(slots::FEMALE)
    }

    /// Sex as a gender mask.
    #[must_use]
    pub fn sex_gender(&self) -> Option<MorphGender> {
        if self.is_male() {
            Some(MorphGender::MASCULINE)
        } else if self.is_female() {
            Some(MorphGender::FEMININE)
        } else {
            None
        }
    }

    /// Sets `SEX` from a definite gender; other masks are ignored.
    pub fn set_sex(&mut self, gender: MorphGender) {
        if gender == MorphGender::MASCULINE {
            self.slots.replace(slots::SEX, slots::MALE);
        } else if gender == MorphGender::FEMININE {
            self.slots.replace(slots::SEX, slots::FEMALE);
        }
    }

    /// Records one name occurrence: every reading becomes a slot and the
    /// collections are kept for gender propagation.
    pub fn add_fio_identity(
        &mut self,
        lastname: Option<&NameVariants>,
        firstname: Option<&NameVariants>,
        middlename: Option<&NameVariants>,
    ) {
        if let Some(col) = lastname {
            for v in col.values() {
                self.slots.add(slots::LASTNAME, v);
            }
            self.surname_occurs.push(col.clone());
        }
        if let Some(col) = firstname {
            for v in col.values() {
                self.slots.add(slots::FIRSTNAME, v);
            }
            self.name_occurs.push(col.clone());
        }
        if let Some(col) = middlename {
            for v in col.values() {
                self.slots.add(slots::MIDDLENAME, v);
            }
            self.sec_occurs.push(col.clone());
        }
    }

    /// Records a whole-name identity string (Asian and Arabic names).
    pub fn add_identity(&mut self, identity: &NameVariants) {
        for v in identity.values() {
            self.slots.add(slots::IDENTITY, v);
        }
        self.ident_occurs.push(identity.clone());
    }

    /// Adds an `ATTR` edge.
    pub fn add_attribute(&mut self, property: ReferentId) {
        self.slots.add(slots::ATTR, property);
    }

    /// Shortest royal title among the attributes.
    fn king_title<'g>(&self, graph: &'g dyn ReferentGraph) -> Option<&'g str> {
        self.attributes()
            .filter_map(|id| graph.property(id))
            .filter(|p| p.kind == PropertyKind::King)
            .filter_map(|p| p.name())
            .min_by_key(|n| n.len())
    }

    fn nickname_matches_surname(&self, other: &PersonReferent, vocab: &Vocabulary) -> bool {
        let one_way = |a: &PersonReferent, b: &PersonReferent| {
            a.nickname()
                .is_some_and(|n| b.lastnames().any(|s| vocab.nickname_equals_surname(n, s)))
        };
        one_way(self, other) || one_way(other, self)
    }

    /// Mentions that may denote the same person. Symmetric.
    #[must_use]
    pub fn can_be_equals(&self, other: &PersonReferent, mode: EqualMode, graph: &dyn ReferentGraph) -> bool {
        for a in self.slots.texts(slots::IDENTITY) {
            let a = del_surname_end(a);
            if other
                .slots
                .texts(slots::IDENTITY)
                .any(|b| del_surname_end(b) == a)
            {
                return true;
            }
        }
        let (nick1, nick2) = (self.nickname(), other.nickname());
        if let (Some(a), Some(b)) = (nick1, nick2) {
            if a != b {
                return false;
            }
        }

        let has = |p: &PersonReferent, t: &str| p.slots.has(t);
        if has(self, slots::LASTNAME) && has(other, slots::LASTNAME) {
            if !self
                .lastnames()
                .any(|a| other.lastnames().any(|b| compare_surnames(a, b)))
            {
                return false;
            }
            if has(self, slots::FIRSTNAME) && has(other, slots::FIRSTNAME) {
                if !check_names(self.firstnames(), other.firstnames()) {
                    return false;
                }
                if has(self, slots::MIDDLENAME) && has(other, slots::MIDDLENAME) {
                    return check_names(self.middlenames(), other.middlenames());
                }
                if mode == EqualMode::DifferentTexts {
                    if has(self, slots::MIDDLENAME) || has(other, slots::MIDDLENAME) {
                        return self.to_string() == other.to_string();
                    }
                    let full = |p: &PersonReferent| -> Vec<String> {
                        p.firstnames()
                            .filter(|n| !is_initial(n))
                            .map(str::to_string)
                            .collect()
                    };
                    let (n1, n2) = (full(self), full(other));
                    return (n1.is_empty() && n2.is_empty()) || n1.iter().any(|n| n2.contains(n));
                }
            } else if mode == EqualMode::DifferentTexts
                && (has(self, slots::FIRSTNAME) || has(other, slots::FIRSTNAME))
            {
                return false;
            }
            return true;
        }

        let (tit1, tit2) = (self.king_title(graph), other.king_title(graph));
        if tit1.is_some() || tit2.is_some() || nick1.is_some() || nick2.is_some() {
            match (tit1, tit2) {
                (Some(a), Some(b)) => {
                    if !(a.contains(b) || b.contains(a)) {
                        return false;
                    }
                }
                _ => {
                    let nick_ok = (nick1.is_some() && nick1 == nick2)
                        || self.nickname_matches_surname(other, graph.vocabulary());
                    if !nick_ok {
                        return false;
                    }
                }
            }
            if has(self, slots::FIRSTNAME) && has(other, slots::FIRSTNAME) {
                return check_names(self.firstnames(), other.firstnames());
            }
        }

        if has(self, slots::UNDEFNAME) && has(other, slots::UNDEFNAME) {
            let und1: Vec<&str> = self.slots.texts(slots::UNDEFNAME).collect();
            let und2: Vec<&str> = other.slots.texts(slots::UNDEFNAME).collect();
            let subset = |a: &[&str], b: &[&str]| {
                a.iter().enumerate().all(|(i, u)| {
                    b.contains(u)
                        || (i + 1 == a.len()
                            && b.last().is_some_and(|l| del_surname_end(l) == del_surname_end(u)))
                })
            };
            return match und1.len().cmp(&und2.len()) {
                std::cmp::Ordering::Less => subset(&und1, &und2),
                std::cmp::Ordering::Greater => subset(&und2, &und1),
                std::cmp::Ordering::Equal => subset(&und1, &und2) && subset(&und2, &und1),
            };
        }
        false
    }

    /// `self` is a less detailed mention of `other`: "Ivanov" or
    /// "I. Ivanov" for "Ivan Ivanovich Ivanov".
    #[must_use]
    pub fn can_be_general_for(&self, other: &PersonReferent, graph: &dyn ReferentGraph) -> bool {
        if !self.can_be_equals(other, EqualMode::WithinOneText, graph) {
            return false;
        }
        if !self.slots.has(slots::LASTNAME) || !other.slots.has(slots::LASTNAME) {
            return false;
        }
        if !self.slots.has(slots::FIRSTNAME) {
            return other.slots.has(slots::FIRSTNAME);
        }
        if !other.slots.has(slots::FIRSTNAME) {
            return false;
        }
        let (i1, f1) = count_initials(self.firstnames());
        let (_, f2) = count_initials(other.firstnames());
        let (si1, sf1) = count_initials(self.middlenames());
        let (si2, sf2) = count_initials(other.middlenames());
        if (f1 > 0 && f2 == 0) || (sf1 > 0 && sf2 == 0) || (si1 + sf1 > 0 && si2 + sf2 == 0) {
            return false;
        }
        (i1 > 0 && f1 == 0 && f2 > 0)
            || (si1 + sf1 == 0 && si2 + sf2 > 0)
            || (si1 > 0 && sf1 == 0 && sf2 > 0)
    }

    /// Adds everything `other` knows. Run [`PersonReferent::correct_names`]
    /// afterwards.
    pub fn merge_from(&mut self, other: &PersonReferent) {
        self.slots.union_from(&other.slots);
        self.surname_occurs.extend(other.surname_occurs.iter().cloned());
        self.name_occurs.extend(other.name_occurs.iter().cloned());
        self.sec_occurs.extend(other.sec_occurs.iter().cloned());
        self.ident_occurs.extend(other.ident_occurs.iter().cloned());
        if self.template == FioTemplate::Undefined {
            self.template = other.template;
        }
    }

    /// Normalizes name slots: gender propagation, surname consolidation,
    /// identifier cleanup and initials absorption.
    pub fn correct_names(&mut self, policy: SurnamePolicy, vocab: &Vocabulary) {
        if self.slots.count_of(slots::SEX) > 1 {
            if let Some(first) = self.slots.first_text(slots::SEX).map(str::to_string) {
                self.slots.replace(slots::SEX, first);
            }
        }
        loop {
            let mut changed = NameVariants::intersect(&mut self.surname_occurs);
            changed |= NameVariants::intersect(&mut self.name_occurs);
            changed |= NameVariants::intersect(&mut self.sec_occurs);
            changed |= NameVariants::intersect(&mut self.ident_occurs);
            if !changed {
                break;
            }
        }

        let gender = self.sex_gender().or_else(|| {
            [
                &self.name_occurs,
                &self.sec_occurs,
                &self.surname_occurs,
                &self.ident_occurs,
            ]
            .into_iter()
            .find_map(|occ| occ.iter().find_map(|c| c.gender().definite()))
        });
        if let Some(g) = gender {
            NameVariants::set_gender(&mut self.surname_occurs, g);
            NameVariants::set_gender(&mut self.name_occurs, g);
            NameVariants::set_gender(&mut self.sec_occurs, g);
            NameVariants::set_gender(&mut self.ident_occurs, g);
            if !self.slots.has(slots::SEX) {
                self.set_sex(g);
            }
        }

        self.correct_surnames(policy, vocab);
        self.correct_identifiers();
        let occurs = [
            (slots::LASTNAME, variant_values(&self.surname_occurs)),
            (slots::FIRSTNAME, variant_values(&self.name_occurs)),
            (slots::MIDDLENAME, variant_values(&self.sec_occurs)),
        ];
        for (typ, vars) in occurs {
            self.remove_slots(typ, &vars);
        }
        self.remove_initials(slots::FIRSTNAME);
        self.remove_initials(slots::MIDDLENAME);
    }

    fn correct_surnames(&mut self, policy: SurnamePolicy, vocab: &Vocabulary) {
        let (shortest, longest) = match policy {
            SurnamePolicy::Gendered => (self.is_male(), self.is_female()),
            SurnamePolicy::PreferShortest => (true, false),
            SurnamePolicy::PreferLongest => (false, true),
        };
        if shortest || longest {
            'scan: loop {
                let names: Vec<String> = self.lastnames().map(str::to_string).collect();
                for (i, s) in names.iter().enumerate() {
                    for s1 in &names[i + 1..] {
                        let stem = del_surname_end(s);
                        if stem != del_surname_end(s1) || s.len() == s1.len() {
                            continue;
                        }
                        if shortest {
                            self.slots.remove(slots::LASTNAME, &SlotValue::Text(s1.clone()));
                            self.slots
                                .update_value(slots::LASTNAME, &SlotValue::Text(s.clone()), stem);
                        } else {
                            let drop = if s1.len() < s.len() { s1 } else { s };
                            self.slots.remove(slots::LASTNAME, &SlotValue::Text(drop.clone()));
                        }
                        continue 'scan;
                    }
                }
                break;
            }
        }

        let taken: Vec<String> = self
            .firstnames()
            .chain(self.lastnames())
            .map(str::to_string)
            .collect();
        self.slots.retain(|s| {
            !(s.type_name == slots::UNDEFNAME
                && s.value.as_text().is_some_and(|v| taken.iter().any(|t| t == v)))
        });

        if let Some(nick) = self.nickname().map(str::to_string) {
            self.slots.retain(|s| {
                !(s.type_name == slots::LASTNAME
                    && s
                        .value
                        .as_text()
                        .is_some_and(|v| vocab.nickname_equals_surname(&nick, v)))
            });
        }
    }

    fn correct_identifiers(&mut self) {
        if self.is_female() {
            return;
        }
        let idents: Vec<String> = self.slots.texts(slots::IDENTITY).map(str::to_string).collect();
        for (i, a) in idents.iter().enumerate() {
            for b in &idents[i + 1..] {
                let stem = del_surname_end(a);
                if stem == del_surname_end(b) && a != b {
                    self.slots.remove(slots::IDENTITY, &SlotValue::Text(b.clone()));
                    self.slots
                        .update_value(slots::IDENTITY, &SlotValue::Text(a.clone()), stem);
                    if !self.slots.has(slots::SEX) {
                        self.set_sex(MorphGender::MASCULINE);
                    }
                    return;
                }
            }
        }
    }

    /// Drops slot values no occurrence supports any more, as long as another
    /// value of the type remains.
    fn remove_slots(&mut self, typ: &str, vars: &[String]) {
        if vars.is_empty() {
            return;
        }
        let values: Vec<String> = self.slots.texts(typ).map(str::to_string).collect();
        for v in values.iter().rev() {
            if vars.contains(v) || (v.contains('-') && vars.contains(&v.replace('-', ""))) {
                continue;
            }
            if self.slots.count_of(typ) < 2 {
                continue;
            }
            if typ == slots::LASTNAME && !vars.iter().any(|x| compare_surnames(v, x)) {
                continue;
            }
            self.slots.remove(typ, &SlotValue::Text(v.clone()));
        }
    }

    /// "A" is dropped when "ALEXANDER" is present.
    fn remove_initials(&mut self, typ: &str) {
        let values: Vec<String> = self.slots.texts(typ).map(str::to_string).collect();
        for v in values.iter().filter(|v| is_initial(v)) {
            if values.iter().any(|f| !is_initial(f) && f.starts_with(v.as_str())) {
                self.slots.remove(typ, &SlotValue::Text(v.clone()));
            }
        }
    }

    /// Pairs `(narrower, broader)` of attribute edges where the broader
    /// property generalizes the narrower one.
    #[must_use]
    pub fn attribute_generalizations(&self, graph: &dyn ReferentGraph) -> Vec<(ReferentId, ReferentId)> {
        let attrs: Vec<ReferentId> = self.attributes().collect();
        let mut out = Vec::new();
        for &a in &attrs {
            for &b in &attrs {
                if a == b || out.iter().any(|(n, _)| *n == a || *n == b) {
                    continue;
                }
                if let (Some(pa), Some(pb)) = (graph.property(a), graph.property(b)) {
                    if pb.can_be_general_for(pa, graph) {
                        out.push((a, b));
                    }
                }
            }
        }
        out
    }
}

/// `(initials, full names)`.
fn count_initials<'a>(names: impl Iterator<Item = &'a str>) -> (usize, usize) {
    names.fold((0, 0), |(i, f), s| if is_initial(s) { (i + 1, f) } else { (i, f + 1) })
}

fn variant_values(occurs: &[NameVariants]) -> Vec<String> {
    occurs
        .iter()
        .flat_map(|c| c.values().map(str::to_string))
        .collect()
}

impl fmt::Display for PersonReferent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(l) = self.lastnames().next() {
            parts.push(l);
            parts.extend(self.firstnames().next());
            parts.extend(self.middlenames().next());
        } else if let Some(i) = self.slots.first_text(slots::IDENTITY) {
            parts.push(i);
        } else {
            parts.extend(self.firstnames().next());
            parts.extend(self.middlenames().next());
            parts.extend(self.slots.texts(slots::UNDEFNAME));
        }
        parts.extend(self.nickname());
        if parts.is_empty() {
            return f.write_str("?");
        }
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referent::{PersonPropertyReferent, Referent};
    use crate::registry::Registry;
    use persona_core::MorphCase;

    fn registry() -> Registry {
        Registry::new(Vocabulary::builtin().expect("vocab"), SurnamePolicy::default())
    }

    fn person(last: Option<&str>, first: Option<&str>, middle: Option<&str>) -> PersonReferent {
        let mut p = PersonReferent::new();
        let col = |v: Option<&str>| v.map(|s| NameVariants::single(s, MorphGender::empty()));
        p.add_fio_identity(col(last).as_ref(), col(first).as_ref(), col(middle).as_ref());
        p
    }

    #[test]
    fn surname_endings() {
        assert_eq!(del_surname_end("ИВАНОВА"), "ИВАНОВ");
        assert_eq!(del_surname_end("ИВАНОВЫМ"), "ИВАНОВ");
        assert_eq!(del_surname_end("ГОЛЬЦЯ"), "ГОЛЬЦЯ");
        assert_eq!(del_surname_end("КОНЯ"), "КОНЬ");
        assert_eq!(del_surname_end("LI"), "LI");
        assert!(compare_surnames("PETROV", "PETROVA"));
        assert!(!compare_surnames("LI", "LIU"));
    }

    #[test]
    fn initials_match_full_names() {
        let reg = registry();
        let full = person(Some("IVANOV"), Some("IVAN"), Some("IVANOVICH"));
        let short = person(Some("IVANOV"), Some("I"), Some("I"));
        let other = person(Some("IVANOV"), Some("P"), None);
        assert!(full.can_be_equals(&short, EqualMode::WithinOneText, &reg));
        assert!(short.can_be_equals(&full, EqualMode::WithinOneText, &reg));
        assert!(!full.can_be_equals(&other, EqualMode::WithinOneText, &reg));
        assert!(short.can_be_general_for(&full, &reg));
        assert!(!full.can_be_general_for(&short, &reg));
    }

    #[test]
    fn different_texts_is_stricter() {
        let reg = registry();
        let a = person(Some("SMITH"), Some("JOHN"), None);
        let b = person(Some("SMITH"), None, None);
        assert!(a.can_be_equals(&b, EqualMode::WithinOneText, &reg));
        assert!(!a.can_be_equals(&b, EqualMode::DifferentTexts, &reg));
        assert!(!b.can_be_equals(&a, EqualMode::DifferentTexts, &reg));
    }

    #[test]
    fn gender_propagates_from_first_name() {
        let vocab = Vocabulary::builtin().expect("vocab");
        let mut surname = NameVariants::default();
        surname.push("ИВАНОВА", MorphGender::FEMININE, MorphCase::NOMINATIVE);
        surname.push("ИВАНОВ", MorphGender::MASCULINE, MorphCase::GENITIVE);
        let first = NameVariants::single("МАРИЯ", MorphGender::FEMININE);
        let mut p = PersonReferent::new();
        p.add_fio_identity(Some(&surname), Some(&first), None);
        p.correct_names(SurnamePolicy::Gendered, &vocab);
        assert!(p.is_female());
        assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["ИВАНОВА"]);
        assert!(p
            .surname_occurs
            .iter()
            .all(|c| c.gender() == MorphGender::FEMININE));
    }

    #[test]
    fn surname_policy_orderings() {
        let vocab = Vocabulary::builtin().expect("vocab");
        for order in [["IVANOVA", "IVANOV"], ["IVANOV", "IVANOVA"]] {
            let build = || {
                let mut p = PersonReferent::new();
                for s in order {
                    p.slots.add(slots::LASTNAME, s);
                }
                p
            };
            let mut p = build();
            p.correct_names(SurnamePolicy::PreferShortest, &vocab);
            assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["IVANOV"]);

            let mut p = build();
            p.correct_names(SurnamePolicy::PreferLongest, &vocab);
            assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["IVANOVA"]);

            let mut p = build();
            p.set_sex(MorphGender::MASCULINE);
            p.correct_names(SurnamePolicy::Gendered, &vocab);
            assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["IVANOV"]);

            let mut p = build();
            p.set_sex(MorphGender::FEMININE);
            p.correct_names(SurnamePolicy::Gendered, &vocab);
            assert_eq!(p.lastnames().collect::<Vec<_>>(), vec!["IVANOVA"]);

            let mut p = build();
            p.correct_names(SurnamePolicy::Gendered, &vocab);
            assert_eq!(p.lastnames().count(), 2);
        }
    }

    #[test]
    fn initials_are_absorbed() {
        let vocab = Vocabulary::builtin().expect("vocab");
        let mut p = person(Some("IVANOV"), None, None);
        p.slots.add(slots::FIRSTNAME, "I");
        p.slots.add(slots::FIRSTNAME, "IVAN");
        p.correct_names(SurnamePolicy::Gendered, &vocab);
        assert_eq!(p.firstnames().collect::<Vec<_>>(), vec!["IVAN"]);
    }

    #[test]
    fn nickname_and_ordinal_surname() {
        let mut reg = registry();
        let king = reg.register(Referent::Property(PersonPropertyReferent::new(
            "king",
            PropertyKind::King,
        )));
        let mut a = person(None, Some("PETER"), None);
        a.slots.add(slots::NICKNAME, "I");
        a.add_attribute(king);
        let mut b = person(Some("FIRST"), Some("PETER"), None);
        b.add_attribute(king);
        let mut c = person(None, Some("PETER"), None);
        c.slots.add(slots::NICKNAME, "II");
        assert!(a.can_be_equals(&b, EqualMode::WithinOneText, &reg));
        assert!(b.can_be_equals(&a, EqualMode::WithinOneText, &reg));
        assert!(!a.can_be_equals(&c, EqualMode::WithinOneText, &reg));
        assert!(!c.can_be_equals(&a, EqualMode::WithinOneText, &reg));
    }

    #[test]
    fn feminine_ordinal_surname_matches_nickname() {
        let reg = registry();
        let mut a = person(None, Some("ЕКАТЕРИНА"), None);
        a.slots.add(slots::NICKNAME, "II");
        let b = person(Some("ВТОРАЯ"), Some("ЕКАТЕРИНА"), None);
        let c = person(Some("ПЕРВАЯ"), Some("ЕКАТЕРИНА"), None);
        assert!(a.can_be_equals(&b, EqualMode::WithinOneText, &reg));
        assert!(b.can_be_equals(&a, EqualMode::WithinOneText, &reg));
        assert!(!a.can_be_equals(&c, EqualMode::WithinOneText, &reg));
    }

    #[test]
    fn undifferentiated_names() {
        let reg = registry();
        let mut a = PersonReferent::new();
        a.slots.add(slots::UNDEFNAME, "KIM");
        let mut b = PersonReferent::new();
        b.slots.add(slots::UNDEFNAME, "KIM");
        b.slots.add(slots::UNDEFNAME, "JONG");
        assert!(a.can_be_equals(&b, EqualMode::WithinOneText, &reg));
        assert!(b.can_be_equals(&a, EqualMode::WithinOneText, &reg));
    }

    #[test]
    fn display_orders_surname_first() {
        let p = person(Some("IVANOV"), Some("IVAN"), Some("IVANOVICH"));
        assert_eq!(p.to_string(), "IVANOV IVAN IVANOVICH");
    }
}
