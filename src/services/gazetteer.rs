//! In-memory gazetteers: known people and fixed organization/location phrases.

use super::{ForeignMatch, ForeignResolver, Ontology};
use crate::error::{Error, Result};
use crate::referent::{slots, ForeignReferent};
use persona_core::{split_terms, TokenId, TokenView};
use serde::{Deserialize, Serialize};

/// A person known ahead of time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownPerson {
    /// Surname.
    #[serde(default)]
    pub lastname: Option<String>,
    /// Given name.
    #[serde(default)]
    pub firstname: Option<String>,
    /// Patronymic or middle name.
    #[serde(default)]
    pub middlename: Option<String>,
}

impl KnownPerson {
    /// Person with a surname and a given name.
    #[must_use]
    pub fn new(lastname: &str, firstname: &str) -> Self {
        Self {
            lastname: Some(lastname.to_uppercase()),
            firstname: Some(firstname.to_uppercase()),
            middlename: None,
        }
    }

    /// Adds a middle name.
    #[must_use]
    pub fn with_middlename(mut self, middlename: &str) -> Self {
        self.middlename = Some(middlename.to_uppercase());
        self
    }

    /// Word sequences under which the person may be written.
    fn forms(&self) -> Vec<Vec<String>> {
        let initial = |s: &Option<String>| {
            s.as_ref()
                .and_then(|v| v.chars().next())
                .map(|c| c.to_string())
        };
        let (l, f, m) = (&self.lastname, &self.firstname, &self.middlename);
        let (fi, mi) = (initial(f), initial(m));
        let candidates: Vec<Vec<&Option<String>>> = vec![
            vec![f, m, l],
            vec![l, f, m],
            vec![f, l],
            vec![l, f],
            vec![l],
        ];
        let mut out: Vec<Vec<String>> = candidates
            .into_iter()
            .filter(|parts| parts.iter().all(|p| p.is_some()))
            .map(|parts| parts.into_iter().flatten().cloned().collect())
            .collect();
        if let (Some(l), Some(fi)) = (l, fi) {
            match mi {
                Some(mi) => {
                    out.push(vec![l.clone(), fi.clone(), mi.clone()]);
                    out.push(vec![fi, mi, l.clone()]);
                }
                None => {
                    out.push(vec![l.clone(), fi.clone()]);
                    out.push(vec![fi, l.clone()]);
                }
            }
        }
        out.sort_by_key(|f| std::cmp::Reverse(f.len()));
        out.dedup();
        out
    }
}

/// One gazetteer hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyHit {
    /// The known person.
    pub person: KnownPerson,
    /// Number of leading terms the hit covers.
    pub len: usize,
}

/// Reference [`Ontology`] over a list of known people.
#[derive(Debug, Clone, Default)]
pub struct PersonGazetteer {
    entries: Vec<(Vec<Vec<String>>, KnownPerson)>,
}

impl PersonGazetteer {
    /// Builds the gazetteer.
    #[must_use]
    pub fn new(people: Vec<KnownPerson>) -> Self {
        let entries = people
            .into_iter()
            .map(|p| (p.forms(), p))
            .filter(|(forms, _)| !forms.is_empty())
            .collect();
        Self { entries }
    }

    /// Parses a JSON array of people.
    pub fn from_json(json: &str) -> Result<Self> {
        let people: Vec<KnownPerson> = serde_json::from_str(json)?;
        if people.iter().any(|p| p.lastname.is_none() && p.firstname.is_none()) {
            return Err(Error::invalid_input("known person without a name"));
        }
        Ok(Self::new(people))
    }

    /// Number of people.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Ontology for PersonGazetteer {
    fn find(&self, terms: &[&str]) -> Vec<OntologyHit> {
        let mut hits: Vec<OntologyHit> = self
            .entries
            .iter()
            .filter_map(|(forms, person)| {
                forms
                    .iter()
                    .find(|f| f.len() <= terms.len() && f.iter().zip(terms).all(|(a, b)| a.as_str() == *b))
                    .map(|f| OntologyHit {
                        person: person.clone(),
                        len: f.len(),
                    })
            })
            .collect();
        hits.sort_by_key(|h| std::cmp::Reverse(h.len));
        hits
    }
}

/// Reference [`ForeignResolver`]: recognizes fixed phrases as referents of
/// one type, e.g. country names as `GEO`.
#[derive(Debug, Clone)]
pub struct PhraseResolver {
    type_name: String,
    phrases: Vec<(Vec<String>, String)>,
}

impl PhraseResolver {
    /// Resolver producing referents of `type_name` with a `NAME` slot.
    #[must_use]
    pub fn new(type_name: &str, phrases: &[&str]) -> Self {
        let mut phrases: Vec<(Vec<String>, String)> = phrases
            .iter()
            .map(|p| (split_terms(p), p.to_uppercase()))
            .filter(|(words, _)| !words.is_empty())
            .collect();
        phrases.sort_by_key(|(w, _)| std::cmp::Reverse(w.len()));
        Self {
            type_name: type_name.to_uppercase(),
            phrases,
        }
    }
}

impl ForeignResolver for PhraseResolver {
    fn name(&self) -> &'static str {
        "phrase"
    }

    fn resolve_at(&self, view: &TokenView, t: TokenId) -> Option<ForeignMatch> {
        'phrases: for (words, name) in &self.phrases {
            let mut cur = t;
            for (i, w) in words.iter().enumerate() {
                if i > 0 {
                    match view.next(cur) {
                        Some(n) => cur = n,
                        None => continue 'phrases,
                    }
                }
                if view.term(cur) != Some(w.as_str()) {
                    continue 'phrases;
                }
            }
            let mut referent = ForeignReferent::new(&self.type_name);
            referent.slots.add(slots::NAME, name.as_str());
            return Some(ForeignMatch { referent, end: cur });
        }
        None
    }
}
