//! Name templates and candidate scoring.
//!
//! Every template is tried against the segmented items. Each produces at
//! most one candidate with an integer coefficient; the caller keeps the best
//! one and rejects the match when two candidates share the top score.

use crate::names::{ItemKind, NameItem, NameVariants};
use persona_core::{MorphCase, MorphGender, TokenId};
use serde::Serialize;

/// Name layouts, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FioTemplate {
    /// Not resolved by a template (single surname, known entry).
    #[default]
    Undefined,
    /// "John Smith".
    NameSurname,
    /// "John F. Kennedy".
    NameISurname,
    /// "Ivan Ivanovich Ivanov".
    NameSecnameSurname,
    /// "Ivanov Ivan".
    SurnameName,
    /// "Ivanov Ivan Ivanovich".
    SurnameNameSecname,
    /// "Ivanov I.I.".
    SurnameII,
    /// "I.I. Ivanov".
    IISurname,
    /// "Wang Wei".
    AsianName,
    /// "Mao Ze Dong".
    AsianSurnameName,
    /// "Ivan Vasilievich", only after a royal title.
    NameSecname,
    /// "Louis XIV".
    King,
    /// "Muhammad ibn Abdullah".
    ArabicLong,
}

impl FioTemplate {
    /// Every template that scores items.
    pub const ALL: [FioTemplate; 12] = [
        FioTemplate::NameSurname,
        FioTemplate::NameISurname,
        FioTemplate::NameSecnameSurname,
        FioTemplate::SurnameName,
        FioTemplate::SurnameNameSecname,
        FioTemplate::SurnameII,
        FioTemplate::IISurname,
        FioTemplate::AsianName,
        FioTemplate::AsianSurnameName,
        FioTemplate::NameSecname,
        FioTemplate::King,
        FioTemplate::ArabicLong,
    ];

    /// Surname comes first.
    #[must_use]
    pub fn is_surname_first(self) -> bool {
        matches!(
            self,
            FioTemplate::SurnameName | FioTemplate::SurnameNameSecname | FioTemplate::SurnameII
        )
    }
}

/// Context a candidate is scored in.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    /// Case required by a preceding attribute (empty when none).
    pub attr_case: MorphCase,
    /// Gender implied by a preceding attribute (empty when none).
    pub attr_gender: MorphGender,
    /// A royal title precedes.
    pub king: bool,
    /// Template of the previous person mention nearby.
    pub prev_template: Option<FioTemplate>,
    /// Text follows the Surname-Name-Patronymic convention.
    pub starts_with_sns: bool,
    /// Upper bound of a coefficient.
    pub max_coefficient: i32,
}

/// One scored reading of a token span as a person name.
#[derive(Debug, Clone)]
pub struct NameCandidate {
    /// Producing template.
    pub template: FioTemplate,
    /// First token.
    pub begin: TokenId,
    /// Last token.
    pub end: TokenId,
    /// Surname readings.
    pub lastname: Option<NameVariants>,
    /// First-name readings.
    pub firstname: Option<NameVariants>,
    /// Patronymic readings.
    pub middlename: Option<NameVariants>,
    /// Ordinal nickname.
    pub nickname: Option<String>,
    /// Whole-name identity string.
    pub identity: Option<NameVariants>,
    /// Naming convention.
    pub nametype: Option<&'static str>,
    /// Score.
    pub coef: i32,
    /// Agreed gender.
    pub gender: MorphGender,
    /// Agreed case.
    pub case: MorphCase,
}

impl NameCandidate {
    fn new(template: FioTemplate, items: &[NameItem], coef: i32) -> Option<Self> {
        Some(Self {
            template,
            begin: items.first()?.begin,
            end: items.last()?.end,
            lastname: None,
            firstname: None,
            middlename: None,
            nickname: None,
            identity: None,
            nametype: None,
            coef,
            gender: MorphGender::empty(),
            case: MorphCase::empty(),
        })
    }

    /// Narrows every part to a common gender and case. Returns `false` when
    /// the parts cannot agree.
    fn agree(&mut self, mctx: &MatchContext) -> bool {
        let mut gender = mctx.attr_gender & MorphGender::PERSON;
        let mut case = mctx.attr_case;
        for col in [&self.lastname, &self.firstname, &self.middlename]
            .into_iter()
            .flatten()
        {
            let g = col.gender() & MorphGender::PERSON;
            if !g.is_empty() {
                let next = gender.agree(g);
                if next.is_empty() {
                    return false;
                }
                gender = next;
            }
            let c = col.case();
            if !c.is_empty() {
                let next = case.agree(c);
                if next.is_empty() {
                    return false;
                }
                case = next;
            }
        }
        for col in [&mut self.lastname, &mut self.firstname, &mut self.middlename] {
            if let Some(v) = col.as_ref() {
                match v.filtered(gender, case) {
                    Some(f) => *col = Some(f),
                    None => return false,
                }
            }
        }
        self.gender = gender;
        self.case = case;
        true
    }
}

fn initial(item: &NameItem) -> NameVariants {
    NameVariants::single(item.value.clone(), MorphGender::empty())
}

fn firstname(item: &NameItem) -> Option<NameVariants> {
    item.firstname.clone()
}

fn known(item: &NameItem) -> i32 {
    i32::from(item.lastname.is_some())
}

fn is_value(item: &NameItem) -> bool {
    item.kind == ItemKind::Value && !item.connector && item.roman.is_none()
}

fn build(template: FioTemplate, items: &[NameItem], mctx: &MatchContext) -> Option<NameCandidate> {
    use FioTemplate as T;
    let it = |i: usize| items.get(i);
    let mut c = match template {
        T::NameSurname => {
            let (f, l) = (it(0)?, it(1)?);
            if !f.is_firstname() || !l.is_lastname_like() || it(2).is_some_and(|x| x.is_lastname_like()) {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..2], 2 + known(l))?;
            c.firstname = firstname(f);
            c.lastname = Some(l.lastname_variants());
            c
        }
        T::NameISurname => {
            let (f, i, l) = (it(0)?, it(1)?, it(2)?);
            if !f.is_firstname() || !i.is_initial() || !l.is_lastname_like() {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..3], 3 + known(l))?;
            c.firstname = firstname(f);
            c.middlename = Some(initial(i));
            c.lastname = Some(l.lastname_variants());
            c
        }
        T::NameSecnameSurname => {
            let (f, m, l) = (it(0)?, it(1)?, it(2)?);
            if !f.is_firstname() || !m.is_middlename() || !l.is_lastname_like() {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..3], 3 + known(l))?;
            c.firstname = firstname(f);
            c.middlename = m.middlename.clone();
            c.lastname = Some(l.lastname_variants());
            c
        }
        T::SurnameName => {
            let (l, f) = (it(0)?, it(1)?);
            if !l.is_lastname_like() || !f.is_firstname() || it(2).is_some_and(NameItem::is_middlename) {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..2], 2 + known(l))?;
            c.lastname = Some(l.lastname_variants());
            c.firstname = firstname(f);
            c
        }
        T::SurnameNameSecname => {
            let (l, f, m) = (it(0)?, it(1)?, it(2)?);
            if !l.is_lastname_like() || !f.is_firstname() || !m.is_middlename() {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..3], 3 + known(l))?;
            c.lastname = Some(l.lastname_variants());
            c.firstname = firstname(f);
            c.middlename = m.middlename.clone();
            c
        }
        T::SurnameII => {
            let (l, i1) = (it(0)?, it(1)?);
            if !l.is_lastname_like() || !i1.is_initial() {
                return None;
            }
            let i2 = it(2).filter(|x| x.is_initial());
            let n = if i2.is_some() { 3 } else { 2 };
            let mut c = NameCandidate::new(template, &items[..n], n as i32 + known(l))?;
            c.lastname = Some(l.lastname_variants());
            c.firstname = Some(initial(i1));
            c.middlename = i2.map(initial);
            c
        }
        T::IISurname => {
            let i1 = it(0)?;
            if !i1.is_initial() {
                return None;
            }
            let (i2, l, n) = match (it(1), it(2)) {
                (Some(i2), Some(l)) if i2.is_initial() => (Some(i2), l, 3),
                (Some(l), _) => (None, l, 2),
                _ => return None,
            };
            if !l.is_lastname_like() {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..n], n as i32 + known(l))?;
            c.firstname = Some(initial(i1));
            c.middlename = i2.map(initial);
            c.lastname = Some(l.lastname_variants());
            c
        }
        T::AsianName | T::AsianSurnameName => {
            let (s, n1) = (it(0)?, it(1)?);
            if !s.asian || !is_value(n1) || n1.asian || n1.in_dictionary {
                return None;
            }
            let n2 = it(2).filter(|x| is_value(x) && !x.in_dictionary && x.lastname.is_none());
            let given = match (template, n2) {
                (T::AsianName, None) => n1.value.clone(),
                (T::AsianSurnameName, Some(n2)) => format!("{} {}", n1.value, n2.value),
                _ => return None,
            };
            let n = if n2.is_some() { 3 } else { 2 };
            let mut c = NameCandidate::new(template, &items[..n], n as i32)?;
            c.lastname = Some(NameVariants::single(s.value.clone(), MorphGender::empty()));
            c.firstname = Some(NameVariants::single(given, MorphGender::empty()));
            c.nametype = Some("china");
            c
        }
        T::NameSecname => {
            let (f, m) = (it(0)?, it(1)?);
            if !mctx.king || !f.is_firstname() || !m.is_middlename() {
                return None;
            }
            let mut c = NameCandidate::new(template, &items[..2], 2)?;
            c.firstname = firstname(f);
            c.middlename = m.middlename.clone();
            c
        }
        T::King => {
            let (f, r) = (it(0)?, it(1)?);
            let roman = r.roman.clone()?;
            if !f.is_firstname() {
                return None;
            }
            let base = if mctx.king { 3 } else { 2 };
            let mut c = NameCandidate::new(template, &items[..2], base)?;
            c.firstname = firstname(f);
            c.nickname = Some(roman);
            c
        }
        T::ArabicLong => {
            if !it(0).is_some_and(is_value) {
                return None;
            }
            let mut n = 1;
            while let (Some(conn), Some(v)) = (it(n), it(n + 1)) {
                if !conn.connector || !is_value(v) {
                    break;
                }
                n += 2;
            }
            if n < 3 {
                return None;
            }
            let words: Vec<&str> = items[..n].iter().map(|i| i.value.as_str()).collect();
            let mut c = NameCandidate::new(template, &items[..n], 3)?;
            c.firstname = firstname(&items[0])
                .or_else(|| Some(NameVariants::single(items[0].value.clone(), MorphGender::empty())));
            c.identity = Some(NameVariants::single(words.join(" "), MorphGender::MASCULINE));
            c.nametype = Some("arabic");
            c
        }
        T::Undefined => return None,
    };

    let span = &items[..items
        .iter()
        .position(|i| i.end == c.end)
        .map_or(items.len(), |p| p + 1)];
    for (idx, item) in span.iter().enumerate() {
        if idx > 0 && item.newline_before {
            c.coef -= 1;
        }
        if item.in_dictionary
            && item.kind == ItemKind::Value
            && item.firstname.is_none()
            && item.roman.is_none()
        {
            c.coef -= 1;
        }
    }
    if mctx.prev_template == Some(template) {
        c.coef += 1;
    }
    if mctx.starts_with_sns
        && matches!(template, T::SurnameName | T::SurnameNameSecname)
    {
        c.coef += 10;
    }
    if mctx.max_coefficient > 0 {
        c.coef = c.coef.min(mctx.max_coefficient);
    }
    c.agree(mctx).then_some(c)
}

/// Every candidate the items support, best first. Ties keep template order.
#[must_use]
pub fn candidates(items: &[NameItem], mctx: &MatchContext) -> Vec<NameCandidate> {
    let mut out: Vec<NameCandidate> = FioTemplate::ALL
        .iter()
        .filter_map(|&t| build(t, items, mctx))
        .collect();
    out.sort_by(|a, b| b.coef.cmp(&a.coef).then(a.template.cmp(&b.template)));
    out
}

/// The single best candidate, or `None` when nothing matched or two
/// candidates share the top coefficient.
#[must_use]
pub fn best_candidate(items: &[NameItem], mctx: &MatchContext) -> Option<NameCandidate> {
    pick_best(candidates(items, mctx))
}

/// Head of a list sorted by [`candidates`], unless the top score is shared.
#[must_use]
pub fn pick_best(mut all: Vec<NameCandidate>) -> Option<NameCandidate> {
    if all.len() > 1 && all[0].coef == all[1].coef {
        log::debug!(
            "[persons] ambiguous name: {:?} and {:?} both score {}",
            all[0].template,
            all[1].template,
            all[0].coef
        );
        return None;
    }
    if all.is_empty() {
        None
    } else {
        Some(all.swap_remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{try_attach_list, ItemFlags};
    use crate::PersonAnalyzer;

    fn best(text: &str, mctx: MatchContext) -> Option<NameCandidate> {
        let analyzer = PersonAnalyzer::builder().build().expect("analyzer");
        let doc = analyzer.document(text);
        let ctx = analyzer.ctx();
        let first = doc.tokens.first().expect("token");
        let items = try_attach_list(&ctx, &doc.tokens, first, ItemFlags::empty(), 15);
        best_candidate(&items, &mctx)
    }

    fn ctx() -> MatchContext {
        MatchContext {
            max_coefficient: 20,
            ..MatchContext::default()
        }
    }

    #[test]
    fn surname_name_patronymic() {
        let c = best("Ivanov Ivan Ivanovich", ctx()).expect("candidate");
        assert_eq!(c.template, FioTemplate::SurnameNameSecname);
        assert_eq!(c.middlename.as_ref().and_then(NameVariants::head), Some("IVANOVICH"));
        assert_eq!(c.gender, MorphGender::MASCULINE);
    }

    #[test]
    fn surname_with_initials() {
        let c = best("Ivanov A.B. met", ctx()).expect("candidate");
        assert_eq!(c.template, FioTemplate::SurnameII);
        assert_eq!(c.firstname.as_ref().and_then(NameVariants::head), Some("A"));
        assert_eq!(c.middlename.as_ref().and_then(NameVariants::head), Some("B"));
    }

    #[test]
    fn initials_then_surname() {
        let c = best("J. R. Smith", ctx()).expect("candidate");
        assert_eq!(c.template, FioTemplate::IISurname);
    }

    #[test]
    fn gender_disagreement_rejects() {
        assert!(best("Maria Ivanovich", ctx()).is_none());
        let c = best("Maria Petrova", ctx()).expect("candidate");
        assert_eq!(c.gender, MorphGender::FEMININE);
    }

    #[test]
    fn equal_top_scores_are_ambiguous() {
        assert_eq!(candidates(&[], &ctx()).len(), 0);
        assert!(best("Morgan Thomas", ctx()).is_none());
    }

    #[test]
    fn king_and_arabic_names() {
        let c = best("Louis XIV", ctx()).expect("candidate");
        assert_eq!(c.template, FioTemplate::King);
        assert_eq!(c.nickname.as_deref(), Some("XIV"));

        let c = best("Muhammad ibn Abdullah", ctx()).expect("candidate");
        assert_eq!(c.template, FioTemplate::ArabicLong);
        assert_eq!(c.nametype, Some("arabic"));
    }

    #[test]
    fn surname_first_convention_bonus() {
        let mctx = MatchContext {
            starts_with_sns: true,
            ..ctx()
        };
        let c = best("Ivanov Ivan", mctx).expect("candidate");
        assert_eq!(c.template, FioTemplate::SurnameName);
        assert!(c.coef >= 12);
    }

    #[test]
    fn roman_ordinal_escapes_dictionary_penalty() {
        let c = best("Peter I arrived", ctx()).expect("candidate");
        assert_eq!(c.template, FioTemplate::King);
        assert_eq!(c.nickname.as_deref(), Some("I"));
        assert!(c.coef >= 2);
    }
}
