//! Static vocabulary: attribute terms, identity-document grammar words,
//! ordinal nicknames and the small closed word classes the matchers consult.
//!
//! The builtin tables live in `resources/vocabulary.json` and are compiled
//! once on first use. A table that fails to parse or validate is the only
//! fatal error of the engine; it surfaces as [`Error::Init`].

use crate::attr::AttrType;
use crate::error::{Error, Result};
use crate::referent::PropertyKind;
use once_cell::sync::Lazy;
use persona_core::{split_terms, MorphGender, TokenId, TokenView};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

static BUILTIN: Lazy<std::result::Result<Arc<Vocabulary>, String>> = Lazy::new(|| {
    Vocabulary::load(
        include_str!("../resources/vocabulary.json"),
        LoadContext::default(),
    )
    .map(Arc::new)
    .map_err(|e| e.to_string())
});

/// Settings that only matter while tables are being compiled.
///
/// The context is consumed by [`Vocabulary::load`]; nothing of it outlives
/// the load except what it decided.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadContext {
    /// Match terms on surface text only, never on morphological lemmas.
    pub literal_terms: bool,
}

// =============================================================================
// Raw JSON shape
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GenderName {
    Masculine,
    Feminine,
}

impl From<GenderName> for MorphGender {
    fn from(g: GenderName) -> Self {
        match g {
            GenderName::Masculine => MorphGender::MASCULINE,
            GenderName::Feminine => MorphGender::FEMININE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    terms: Vec<String>,
    #[serde(rename = "type")]
    typ: AttrType,
    #[serde(default)]
    kind: PropertyKind,
    #[serde(default)]
    gender: Option<GenderName>,
    #[serde(default)]
    independent: Option<bool>,
    #[serde(default)]
    single_person: bool,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    terms: Vec<String>,
    #[serde(rename = "type")]
    typ: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocumentKeywords {
    series: Vec<String>,
    number: Vec<String>,
    issued: Vec<String>,
    code: Vec<String>,
    address: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawOrdinal {
    numeral: String,
    words: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawVocabulary {
    attributes: Vec<RawAttribute>,
    #[serde(default)]
    deputy_modifiers: Vec<String>,
    document_types: Vec<RawDocument>,
    #[serde(default)]
    document_keywords: RawDocumentKeywords,
    #[serde(default)]
    ordinals: Vec<RawOrdinal>,
    #[serde(default)]
    boss_general: Vec<String>,
    #[serde(default)]
    boss_specific: Vec<String>,
    #[serde(default)]
    synonyms: Vec<Vec<String>>,
    #[serde(default)]
    asian_surnames: Vec<String>,
    #[serde(default)]
    arabic_connectors: Vec<String>,
    #[serde(default)]
    copulas: Vec<String>,
    #[serde(default)]
    comparatives: Vec<String>,
    #[serde(default)]
    conjunctions: Vec<String>,
    #[serde(default)]
    linking_prepositions: Vec<String>,
    #[serde(default)]
    articles: Vec<String>,
    #[serde(default)]
    name_suffixes: Vec<String>,
}

// =============================================================================
// Compiled tables
// =============================================================================

/// One attribute term.
#[derive(Debug, Clone)]
pub struct AttrTerm {
    /// Lower-case canonical phrase, used as the property name.
    pub canonical: String,
    /// Attribute type.
    pub typ: AttrType,
    /// Property kind.
    pub kind: PropertyKind,
    /// Gender implied by the term (empty when neutral).
    pub gender: MorphGender,
    /// The title may stand as a property without a named person.
    pub independent: bool,
    /// The title alone denotes a person ("the Pope").
    pub single_person: bool,
}

/// Multi-word phrase table keyed by the first term.
#[derive(Debug, Clone)]
pub struct TermTable<T> {
    entries: Vec<(Vec<String>, T)>,
    index: HashMap<String, Vec<usize>>,
}

impl<T> Default for TermTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> TermTable<T> {
    fn insert(&mut self, phrase: &str, value: T) -> Result<()> {
        let words = split_terms(phrase);
        let Some(first) = words.first().cloned() else {
            return Err(Error::init(format!("empty vocabulary term {phrase:?}")));
        };
        let idx = self.entries.len();
        self.entries.push((words, value));
        let slot = self.index.entry(first).or_default();
        slot.push(idx);
        let entries = &self.entries;
        slot.sort_by(|a, b| entries[*b].0.len().cmp(&entries[*a].0.len()));
        Ok(())
    }

    /// Number of phrases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no phrases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest phrase starting at `t`, with the token it ends on.
    #[must_use]
    pub fn match_at(&self, view: &TokenView, t: TokenId, lemmas: bool) -> Option<(&T, TokenId)> {
        let mut keys: Vec<&str> = Vec::new();
        if let Some(term) = view.term(t) {
            keys.push(term);
        }
        if lemmas {
            keys.extend(view.token(t).morph.forms.iter().map(|f| f.lemma.as_str()));
        }
        let mut best: Option<(usize, &T, TokenId)> = None;
        for key in keys {
            for &idx in self.index.get(key).into_iter().flatten() {
                let (words, value) = &self.entries[idx];
                if best.as_ref().is_some_and(|(len, _, _)| *len >= words.len()) {
                    continue;
                }
                if let Some(end) = match_words(view, t, words, lemmas) {
                    best = Some((words.len(), value, end));
                }
            }
        }
        best.map(|(_, v, end)| (v, end))
    }
}

fn word_matches(view: &TokenView, t: TokenId, word: &str, lemmas: bool) -> bool {
    view.term(t) == Some(word) || (lemmas && view.token(t).morph.has_lemma(word))
}

fn match_words(view: &TokenView, t: TokenId, words: &[String], lemmas: bool) -> Option<TokenId> {
    let mut cur = t;
    for (i, w) in words.iter().enumerate() {
        if i > 0 {
            cur = view.next(cur)?;
            if view.newlines_before(cur) > 0 {
                return None;
            }
        }
        if !word_matches(view, cur, w, lemmas) {
            return None;
        }
    }
    Some(cur)
}

/// Keywords of the identity-document grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKeyword {
    /// "series".
    Series,
    /// "number", "No", "№".
    Number,
    /// "issued".
    Issued,
    /// "department code".
    Code,
    /// "registration".
    Address,
}

/// Compiled vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    attributes: TermTable<AttrTerm>,
    deputies: TermTable<String>,
    documents: TermTable<String>,
    keywords: TermTable<DocKeyword>,
    ordinals: Vec<(String, Vec<String>)>,
    boss_general: HashSet<String>,
    boss_specific: HashSet<String>,
    synonyms: HashMap<String, String>,
    asian_surnames: HashSet<String>,
    arabic_connectors: HashSet<String>,
    copulas: HashSet<String>,
    comparatives: HashSet<String>,
    conjunctions: HashSet<String>,
    linking: HashSet<String>,
    articles: HashSet<String>,
    name_suffixes: HashSet<String>,
    lemmas: bool,
}

fn upper_set(words: Vec<String>) -> HashSet<String> {
    words.into_iter().map(|w| w.to_uppercase()).collect()
}

fn lower_set(words: Vec<String>) -> HashSet<String> {
    words.into_iter().map(|w| w.to_lowercase()).collect()
}

impl Vocabulary {
    /// The builtin tables.
    pub fn builtin() -> Result<Arc<Vocabulary>> {
        BUILTIN.clone().map_err(Error::init)
    }

    /// Compiles tables from JSON.
    pub fn load(json: &str, ctx: LoadContext) -> Result<Vocabulary> {
        let raw: RawVocabulary =
            serde_json::from_str(json).map_err(|e| Error::init(format!("vocabulary: {e}")))?;
        if raw.attributes.is_empty() {
            return Err(Error::init("vocabulary has no attribute terms"));
        }
        if raw.document_types.is_empty() {
            return Err(Error::init("vocabulary has no identity document types"));
        }

        let mut attributes = TermTable::default();
        for a in raw.attributes {
            let gender = a.gender.map_or(MorphGender::empty(), MorphGender::from);
            for term in &a.terms {
                attributes.insert(
                    term,
                    AttrTerm {
                        canonical: term.to_lowercase(),
                        typ: a.typ,
                        kind: a.kind,
                        gender,
                        independent: a.independent.unwrap_or(a.typ == AttrType::Position),
                        single_person: a.single_person,
                    },
                )?;
            }
        }

        let mut deputies = TermTable::default();
        for d in raw.deputy_modifiers {
            deputies.insert(&d, d.to_lowercase())?;
        }

        let mut documents = TermTable::default();
        for d in raw.document_types {
            for term in &d.terms {
                documents.insert(term, d.typ.to_lowercase())?;
            }
        }

        let mut keywords = TermTable::default();
        let kw = raw.document_keywords;
        for (words, keyword) in [
            (kw.series, DocKeyword::Series),
            (kw.number, DocKeyword::Number),
            (kw.issued, DocKeyword::Issued),
            (kw.code, DocKeyword::Code),
            (kw.address, DocKeyword::Address),
        ] {
            for w in words {
                keywords.insert(&w, keyword)?;
            }
        }

        let mut ordinals = Vec::new();
        for o in raw.ordinals {
            if o.numeral.is_empty() || !o.numeral.chars().all(|c| "IVXLC".contains(c)) {
                return Err(Error::init(format!("bad ordinal numeral {:?}", o.numeral)));
            }
            ordinals.push((o.numeral, o.words.into_iter().map(|w| w.to_uppercase()).collect()));
        }

        let mut synonyms = HashMap::new();
        for group in raw.synonyms {
            let Some(head) = group.first().map(|s| s.to_lowercase()) else {
                continue;
            };
            for name in group {
                synonyms.insert(name.to_lowercase(), head.clone());
            }
        }

        log::info!(
            "[vocab] loaded {} attribute terms, {} document types{}",
            attributes.len(),
            documents.len(),
            if ctx.literal_terms { " (literal)" } else { "" }
        );

        Ok(Vocabulary {
            attributes,
            deputies,
            documents,
            keywords,
            ordinals,
            boss_general: lower_set(raw.boss_general),
            boss_specific: lower_set(raw.boss_specific),
            synonyms,
            asian_surnames: upper_set(raw.asian_surnames),
            arabic_connectors: upper_set(raw.arabic_connectors),
            copulas: upper_set(raw.copulas),
            comparatives: upper_set(raw.comparatives),
            conjunctions: upper_set(raw.conjunctions),
            linking: upper_set(raw.linking_prepositions),
            articles: upper_set(raw.articles),
            name_suffixes: upper_set(raw.name_suffixes),
            lemmas: !ctx.literal_terms,
        })
    }

    /// Attribute term at `t`.
    #[must_use]
    pub fn attribute_at(&self, view: &TokenView, t: TokenId) -> Option<(&AttrTerm, TokenId)> {
        self.attributes.match_at(view, t, self.lemmas)
    }

    /// Deputy modifier ("deputy", "vice") at `t`.
    #[must_use]
    pub fn deputy_at(&self, view: &TokenView, t: TokenId) -> Option<(&str, TokenId)> {
        self.deputies
            .match_at(view, t, self.lemmas)
            .map(|(s, end)| (s.as_str(), end))
    }

    /// Identity-document type at `t`.
    #[must_use]
    pub fn document_at(&self, view: &TokenView, t: TokenId) -> Option<(&str, TokenId)> {
        self.documents
            .match_at(view, t, self.lemmas)
            .map(|(s, end)| (s.as_str(), end))
    }

    /// Identity-document keyword at `t`.
    #[must_use]
    pub fn doc_keyword_at(&self, view: &TokenView, t: TokenId) -> Option<(DocKeyword, TokenId)> {
        self.keywords
            .match_at(view, t, self.lemmas)
            .map(|(k, end)| (*k, end))
    }

    /// Ordinal words ("FIRST", "ПЕРВЫЙ") for a roman nickname.
    #[must_use]
    pub fn ordinal_words(&self, numeral: &str) -> &[String] {
        self.ordinals
            .iter()
            .find(|(n, _)| n == numeral)
            .map_or(&[], |(_, w)| w.as_slice())
    }

    /// The nickname numeral and the surname denote the same ordinal.
    #[must_use]
    pub fn nickname_equals_surname(&self, nickname: &str, surname: &str) -> bool {
        self.ordinal_words(nickname).iter().any(|w| w == surname)
    }

    /// Canonical synonym of a property name.
    #[must_use]
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.synonyms.get(name).map_or(name, String::as_str)
    }

    /// "head"/"leader" style boss words.
    #[must_use]
    pub fn is_general_boss(&self, name: &str) -> bool {
        self.boss_general.contains(name)
    }

    /// "president"/"director" style boss words.
    #[must_use]
    pub fn is_specific_boss(&self, name: &str) -> bool {
        self.boss_specific.contains(name)
    }

    /// Frequent Chinese surname syllable.
    #[must_use]
    pub fn is_asian_surname(&self, term: &str) -> bool {
        self.asian_surnames.contains(term)
    }

    /// "ibn", "bin", "abu" and friends.
    #[must_use]
    pub fn is_arabic_connector(&self, term: &str) -> bool {
        self.arabic_connectors.contains(term)
    }

    /// Copula verb ("is").
    #[must_use]
    pub fn is_copula(&self, view: &TokenView, t: TokenId) -> bool {
        self.in_set(&self.copulas, view, t)
    }

    /// Comparison word ("like", "as").
    #[must_use]
    pub fn is_comparative(&self, view: &TokenView, t: TokenId) -> bool {
        self.in_set(&self.comparatives, view, t)
    }

    /// Coordinating "and".
    #[must_use]
    pub fn is_and(&self, view: &TokenView, t: TokenId) -> bool {
        self.in_set(&self.conjunctions, view, t)
    }

    /// "of"/"at" linking a title to its organization.
    #[must_use]
    pub fn is_linking(&self, view: &TokenView, t: TokenId) -> bool {
        self.in_set(&self.linking, view, t)
    }

    /// Article ("the").
    #[must_use]
    pub fn is_article(&self, view: &TokenView, t: TokenId) -> bool {
        self.in_set(&self.articles, view, t)
    }

    /// Generational suffix ("Jr").
    #[must_use]
    pub fn is_name_suffix(&self, term: &str) -> bool {
        self.name_suffixes.contains(term)
    }

    fn in_set(&self, set: &HashSet<String>, view: &TokenView, t: TokenId) -> bool {
        view.term(t).is_some_and(|term| set.contains(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LexiconMorphology;

    fn view(text: &str) -> TokenView {
        let morph = LexiconMorphology::builtin().expect("lexicon");
        TokenView::tokenize(text, morph.as_ref())
    }

    #[test]
    fn builtin_loads() {
        let v = Vocabulary::builtin().expect("builtin vocabulary");
        assert!(!v.attributes.is_empty());
        assert_eq!(v.ordinal_words("II").first().map(String::as_str), Some("SECOND"));
    }

    #[test]
    fn longest_attribute_wins() {
        let v = Vocabulary::builtin().expect("builtin vocabulary");
        let view = view("prime minister Smith");
        let first = view.first().expect("token");
        let (term, end) = v.attribute_at(&view, first).expect("attribute");
        assert_eq!(term.canonical, "prime minister");
        assert_eq!(view.term(end), Some("MINISTER"));
    }

    #[test]
    fn nickname_ordinals() {
        let v = Vocabulary::builtin().expect("builtin vocabulary");
        assert!(v.nickname_equals_surname("I", "ПЕРВЫЙ"));
        assert!(v.nickname_equals_surname("III", "THIRD"));
        assert!(!v.nickname_equals_surname("I", "ВТОРОЙ"));
        assert!(!v.nickname_equals_surname("IV", "FIRST"));
        for (numeral, feminine) in [("I", "ПЕРВАЯ"), ("II", "ВТОРАЯ"), ("III", "ТРЕТЬЯ")] {
            assert!(v.nickname_equals_surname(numeral, feminine));
        }
        assert!(!v.nickname_equals_surname("IV", "FOURTH"));
        assert!(!v.nickname_equals_surname("V", "ПЯТЫЙ"));
    }

    #[test]
    fn malformed_json_is_an_init_error() {
        let err = Vocabulary::load("{\"attributes\": 5}", LoadContext::default()).unwrap_err();
        assert!(matches!(err, Error::Init(_)));
    }

    #[test]
    fn empty_tables_are_rejected() {
        let err = Vocabulary::load(
            r#"{"attributes": [], "document_types": []}"#,
            LoadContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Init(_)));
    }

    #[test]
    fn literal_context_ignores_lemmas() {
        let json = r#"{
            "attributes": [{"terms": ["президент"], "type": "position", "kind": "boss"}],
            "document_types": [{"terms": ["паспорт"], "type": "passport"}]
        }"#;
        let literal = Vocabulary::load(json, LoadContext { literal_terms: true }).expect("load");
        let lemma = Vocabulary::load(json, LoadContext::default()).expect("load");
        let view = view("президента");
        let t = view.first().expect("token");
        assert!(literal.attribute_at(&view, t).is_none());
        assert!(lemma.attribute_at(&view, t).is_some());
    }
}
