//! Lexicon-backed morphology.
//!
//! Not an inflection engine: it knows a list of given names with gender, a
//! list of surnames, the standard surname and patronymic tails, and a small
//! dictionary of common words. That is enough to drive the name matchers on
//! English and Russian text.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use persona_core::{
    CharClass, MorphCase, MorphClass, MorphError, MorphForm, MorphGender, MorphTarget, Morphology,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

static BUILTIN: Lazy<std::result::Result<Arc<LexiconMorphology>, String>> = Lazy::new(|| {
    LexiconMorphology::from_json(include_str!("../../resources/lexicon.json"))
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNames {
    masculine: Vec<String>,
    feminine: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTail {
    masculine: String,
    feminine: String,
}

#[derive(Debug, Deserialize)]
struct RawCaseTail {
    ending: String,
    lemma: String,
    gender: String,
    case: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    word: String,
    #[serde(default)]
    lemma: Option<String>,
    class: String,
    #[serde(default)]
    case: Vec<String>,
    #[serde(default)]
    gender: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLexicon {
    first_names: RawNames,
    #[serde(default)]
    surnames: Vec<String>,
    #[serde(default)]
    surname_tails: Vec<RawTail>,
    #[serde(default)]
    patronymic_tails: Vec<RawTail>,
    #[serde(default)]
    surname_case_tails: Vec<RawCaseTail>,
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Clone)]
struct Tail {
    masculine: String,
    feminine: String,
}

/// Oblique surname ending: "ЫМ" of "ПЕТРОВЫМ" reads as "ПЕТРОВ".
#[derive(Debug, Clone)]
struct CaseTail {
    ending: String,
    lemma: String,
    gender: MorphGender,
    case: MorphCase,
}

/// Reference [`Morphology`] over a name lexicon.
#[derive(Debug, Clone)]
pub struct LexiconMorphology {
    first_names: HashMap<String, MorphGender>,
    surnames: HashSet<String>,
    surname_tails: Vec<Tail>,
    patronymic_tails: Vec<Tail>,
    case_tails: Vec<CaseTail>,
    words: HashMap<String, Vec<MorphForm>>,
}

fn parse_class(s: &str) -> Result<MorphClass> {
    Ok(match s {
        "noun" => MorphClass::NOUN,
        "adjective" => MorphClass::ADJECTIVE,
        "verb" => MorphClass::VERB,
        "adverb" => MorphClass::ADVERB,
        "pronoun" => MorphClass::PRONOUN,
        "preposition" => MorphClass::PREPOSITION,
        "conjunction" => MorphClass::CONJUNCTION,
        "article" => MorphClass::ARTICLE,
        "geo" => MorphClass::PROPER_GEO,
        other => return Err(Error::init(format!("unknown word class {other:?}"))),
    })
}

fn parse_case(s: &str) -> Result<MorphCase> {
    Ok(match s {
        "nominative" => MorphCase::NOMINATIVE,
        "genitive" => MorphCase::GENITIVE,
        "dative" => MorphCase::DATIVE,
        "accusative" => MorphCase::ACCUSATIVE,
        "instrumental" => MorphCase::INSTRUMENTAL,
        "prepositional" => MorphCase::PREPOSITIONAL,
        other => return Err(Error::init(format!("unknown case {other:?}"))),
    })
}

fn parse_gender(s: &str) -> Result<MorphGender> {
    Ok(match s {
        "masculine" => MorphGender::MASCULINE,
        "feminine" => MorphGender::FEMININE,
        "neuter" => MorphGender::NEUTER,
        other => return Err(Error::init(format!("unknown gender {other:?}"))),
    })
}

fn tails(raw: Vec<RawTail>) -> Vec<Tail> {
    let mut out: Vec<Tail> = raw
        .into_iter()
        .map(|t| Tail {
            masculine: t.masculine.to_uppercase(),
            feminine: t.feminine.to_uppercase(),
        })
        .collect();
    out.sort_by_key(|t| std::cmp::Reverse(t.masculine.len().max(t.feminine.len())));
    out
}

/// Finds the tail `word` ends with, preferring the longest. Returns the tail
/// pair, the stem and whether the feminine side matched.
fn find_tail<'a>(tails: &'a [Tail], word: &'a str) -> Option<(&'a Tail, &'a str, bool)> {
    let mut best: Option<(&Tail, &str, bool)> = None;
    for tail in tails {
        for (ending, feminine) in [(&tail.feminine, true), (&tail.masculine, false)] {
            let Some(stem) = word.strip_suffix(ending.as_str()) else {
                continue;
            };
            if stem.chars().count() < 2 {
                continue;
            }
            let better = best.map_or(true, |(_, s, _)| stem.len() < s.len());
            if better {
                best = Some((tail, stem, feminine));
            }
        }
    }
    best
}

impl LexiconMorphology {
    /// The builtin lexicon.
    pub fn builtin() -> Result<Arc<LexiconMorphology>> {
        BUILTIN.clone().map_err(Error::init)
    }

    /// Builds a lexicon from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawLexicon =
            serde_json::from_str(json).map_err(|e| Error::init(format!("lexicon: {e}")))?;
        let mut first_names = HashMap::new();
        for n in raw.first_names.masculine {
            *first_names.entry(n.to_uppercase()).or_insert(MorphGender::empty()) |=
                MorphGender::MASCULINE;
        }
        for n in raw.first_names.feminine {
            *first_names.entry(n.to_uppercase()).or_insert(MorphGender::empty()) |=
                MorphGender::FEMININE;
        }
        if first_names.is_empty() {
            return Err(Error::init("lexicon has no first names"));
        }

        let mut words: HashMap<String, Vec<MorphForm>> = HashMap::new();
        for w in raw.words {
            let word = w.word.to_uppercase();
            let mut case = MorphCase::empty();
            for c in &w.case {
                case |= parse_case(c)?;
            }
            let gender = w
                .gender
                .as_deref()
                .map(parse_gender)
                .transpose()?
                .unwrap_or_default();
            let lemma = w.lemma.map_or_else(|| word.clone(), |l| l.to_uppercase());
            let form = MorphForm::new(lemma, parse_class(&w.class)?)
                .with_case(case)
                .with_gender(gender)
                .in_dictionary();
            words.entry(word).or_default().push(form);
        }

        let mut case_tails = Vec::with_capacity(raw.surname_case_tails.len());
        for t in raw.surname_case_tails {
            let mut case = MorphCase::empty();
            for c in &t.case {
                case |= parse_case(c)?;
            }
            case_tails.push(CaseTail {
                ending: t.ending.to_uppercase(),
                lemma: t.lemma.to_uppercase(),
                gender: parse_gender(&t.gender)?,
                case,
            });
        }
        case_tails.sort_by_key(|t| std::cmp::Reverse(t.ending.chars().count()));

        Ok(Self {
            first_names,
            surnames: raw.surnames.into_iter().map(|s| s.to_uppercase()).collect(),
            surname_tails: tails(raw.surname_tails),
            patronymic_tails: tails(raw.patronymic_tails),
            case_tails,
            words,
        })
    }

    fn tail_forms(&self, up: &str, cyrillic: bool, first_name: bool, forms: &mut Vec<MorphForm>) {
        let nominative = if cyrillic {
            MorphCase::NOMINATIVE
        } else {
            MorphCase::empty()
        };
        if self.surnames.contains(up) {
            forms.push(
                MorphForm::new(up, MorphClass::PROPER_SURNAME)
                    .with_gender(MorphGender::PERSON)
                    .with_case(nominative),
            );
            return;
        }
        if first_name {
            return;
        }
        if let Some((_, _, feminine)) = find_tail(&self.patronymic_tails, up) {
            let gender = if feminine {
                MorphGender::FEMININE
            } else {
                MorphGender::MASCULINE
            };
            forms.push(
                MorphForm::new(up, MorphClass::PROPER_SECNAME)
                    .with_gender(gender)
                    .with_case(nominative),
            );
            return;
        }
        let Some((tail, stem, feminine)) = find_tail(&self.surname_tails, up) else {
            if cyrillic && !self.words.contains_key(up) {
                self.oblique_forms(up, forms);
            }
            return;
        };
        if feminine {
            forms.push(
                MorphForm::new(up, MorphClass::PROPER_SURNAME)
                    .with_gender(MorphGender::FEMININE)
                    .with_case(nominative),
            );
            // "ИВАНОВА" also reads as the genitive/accusative of "ИВАНОВ"
            if cyrillic {
                forms.push(
                    MorphForm::new(format!("{stem}{}", tail.masculine), MorphClass::PROPER_SURNAME)
                        .with_gender(MorphGender::MASCULINE)
                        .with_case(MorphCase::GENITIVE | MorphCase::ACCUSATIVE),
                );
            }
        } else {
            forms.push(
                MorphForm::new(up, MorphClass::PROPER_SURNAME)
                    .with_gender(MorphGender::MASCULINE)
                    .with_case(nominative),
            );
        }
    }
}

impl LexiconMorphology {
    /// Readings of an oblique surname form. All entries sharing the longest
    /// matching ending apply ("ПЕТРОВУ" is dative masculine or accusative
    /// feminine).
    fn oblique_forms(&self, up: &str, forms: &mut Vec<MorphForm>) {
        let mut matched: Option<&str> = None;
        for t in &self.case_tails {
            if matched.is_some_and(|m| m != t.ending) {
                continue;
            }
            let Some(stem) = up.strip_suffix(t.ending.as_str()) else {
                continue;
            };
            if stem.chars().count() < 2 {
                continue;
            }
            matched = Some(&t.ending);
            forms.push(
                MorphForm::new(format!("{stem}{}", t.lemma), MorphClass::PROPER_SURNAME)
                    .with_gender(t.gender)
                    .with_case(t.case),
            );
        }
    }
}

impl Morphology for LexiconMorphology {
    fn analyze(&self, word: &str) -> Vec<MorphForm> {
        let up = word.to_uppercase();
        let cyrillic = CharClass::of(&up).contains(CharClass::CYRILLIC);
        let mut forms = self.words.get(&up).cloned().unwrap_or_default();
        if let Some(&gender) = self.first_names.get(&up) {
            let case = if cyrillic {
                MorphCase::NOMINATIVE
            } else {
                MorphCase::empty()
            };
            forms.push(
                MorphForm::new(up.clone(), MorphClass::PROPER_NAME)
                    .with_gender(gender)
                    .with_case(case),
            );
        }
        if up.chars().count() > 1 {
            let first_name = self.first_names.contains_key(&up);
            self.tail_forms(&up, cyrillic, first_name, &mut forms);
        }
        forms
    }

    fn inflect(&self, word: &str, target: &MorphTarget) -> std::result::Result<String, MorphError> {
        let up = word.to_uppercase();
        if !target.case.is_empty() && target.case != MorphCase::NOMINATIVE {
            return Err(MorphError::NoForm {
                word: up,
                target: *target,
            });
        }
        if self.surnames.contains(&up) {
            return Ok(up);
        }
        if let Some((tail, stem, feminine)) = find_tail(&self.surname_tails, &up) {
            return match (target.gender.definite(), feminine) {
                (None, _) => Ok(up),
                (Some(g), true) if g == MorphGender::FEMININE => Ok(up),
                (Some(_), true) => Ok(format!("{stem}{}", tail.masculine)),
                (Some(g), false) if g == MorphGender::MASCULINE => Ok(up),
                (Some(_), false) => Ok(format!("{stem}{}", tail.feminine)),
            };
        }
        match self.first_names.get(&up) {
            Some(g) if target.gender.is_empty() || g.intersects(target.gender) => Ok(up),
            Some(_) => Err(MorphError::NoForm {
                word: up,
                target: *target,
            }),
            None => Err(MorphError::Unsupported(up)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Arc<LexiconMorphology> {
        LexiconMorphology::builtin().expect("builtin lexicon")
    }

    #[test]
    fn first_names_carry_gender() {
        let forms = lexicon().analyze("Maria");
        let name = forms
            .iter()
            .find(|f| f.class.contains(MorphClass::PROPER_NAME))
            .expect("first name");
        assert_eq!(name.gender, MorphGender::FEMININE);
    }

    #[test]
    fn cyrillic_feminine_surname_is_ambiguous() {
        let forms = lexicon().analyze("Иванова");
        let genders: Vec<MorphGender> = forms
            .iter()
            .filter(|f| f.class.contains(MorphClass::PROPER_SURNAME))
            .map(|f| f.gender)
            .collect();
        assert_eq!(genders, vec![MorphGender::FEMININE, MorphGender::MASCULINE]);
        assert!(forms.iter().any(|f| f.lemma == "ИВАНОВ"));
    }

    #[test]
    fn patronymic_by_tail() {
        let forms = lexicon().analyze("Ivanovich");
        assert!(forms
            .iter()
            .any(|f| f.class.contains(MorphClass::PROPER_SECNAME) && f.gender == MorphGender::MASCULINE));
        assert!(!forms.iter().any(|f| f.class.contains(MorphClass::PROPER_SURNAME)));
    }

    #[test]
    fn inflects_surname_gender() {
        let lex = lexicon();
        let fem = MorphTarget::gender(MorphGender::FEMININE);
        let masc = MorphTarget::gender(MorphGender::MASCULINE);
        assert_eq!(lex.inflect("Petrov", &fem).as_deref(), Ok("PETROVA"));
        assert_eq!(lex.inflect("PETROVA", &masc).as_deref(), Ok("PETROV"));
        assert_eq!(lex.inflect("SMITH", &fem).as_deref(), Ok("SMITH"));
        assert!(matches!(
            lex.inflect("Xyzzy", &fem),
            Err(MorphError::Unsupported(_))
        ));
    }

    #[test]
    fn dictionary_words_are_common() {
        let forms = lexicon().analyze("met");
        assert!(forms.iter().any(|f| f.in_dictionary && f.lemma == "MEET"));
    }

    #[test]
    fn bad_class_is_init_error() {
        let json = r#"{"first_names": {"masculine": ["IVAN"]}, "words": [{"word": "X", "class": "blob"}]}"#;
        assert!(matches!(
            LexiconMorphology::from_json(json),
            Err(Error::Init(_))
        ));
    }

    #[test]
    fn oblique_surnames_read_as_nominative() {
        let lex = lexicon();
        let surname = |word: &str| -> Vec<(String, MorphGender, MorphCase)> {
            lex.analyze(word)
                .into_iter()
                .filter(|f| f.class.contains(MorphClass::PROPER_SURNAME))
                .map(|f| (f.lemma, f.gender, f.case))
                .collect()
        };
        assert_eq!(
            surname("Петровым"),
            vec![("ПЕТРОВ".to_string(), MorphGender::MASCULINE, MorphCase::INSTRUMENTAL)]
        );
        let fem = surname("Петровой");
        assert_eq!(fem.len(), 1);
        assert_eq!(fem[0].0, "ПЕТРОВА");
        assert_eq!(fem[0].1, MorphGender::FEMININE);
        assert!(fem[0].2.contains(MorphCase::GENITIVE));

        let both: Vec<_> = surname("Петрову").into_iter().map(|(l, g, _)| (l, g)).collect();
        assert_eq!(
            both,
            vec![
                ("ПЕТРОВ".to_string(), MorphGender::MASCULINE),
                ("ПЕТРОВА".to_string(), MorphGender::FEMININE),
            ]
        );
        assert_eq!(surname("Достоевского")[0].0, "ДОСТОЕВСКИЙ");
        assert!(surname("Petrovym").is_empty());
    }
}
