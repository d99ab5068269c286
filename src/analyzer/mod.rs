//! The person analyzer: two scan passes over a document followed by an
//! attribute sweep.
//!
//! ```text
//! Scan(0) ──► Scan(1) ──► AttributeSweep ──► Done
//!    └── nothing found ─────────────────────► (sweep, then Done)
//! ```
//!
//! The first scan tries attributes everywhere and flags the tokens where one
//! matched; the second scan only tries attributes at flagged tokens, so a
//! surname seen late in the text can still resolve an earlier bare mention.

mod document;
mod person;
mod sweep;

pub use document::Document;

use crate::attr::try_attach_attr;
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::identity::{preceding_person, try_attach_identity, IdentityMatch};
use crate::referent::{slots, Referent};
use crate::services::{Capabilities, ForeignResolver, LexiconMorphology, Ontology};
use crate::vocab::Vocabulary;
use person::{known_entry, try_attach_persons, Attach, PersonMatch};
use persona_core::{Morphology, ReferentId, TokenId, TokenView};
use std::sync::Arc;

/// Shared, read-only inputs of every matcher.
#[derive(Debug, Clone, Copy)]
pub struct Ctx<'a> {
    /// Analyzer settings.
    pub config: &'a AnalyzerConfig,
    /// Term tables.
    pub vocab: &'a Vocabulary,
    /// Collaborators.
    pub caps: &'a Capabilities,
}

/// Progress report passed to the callback of
/// [`PersonAnalyzer::process_with_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Scan pass, 0 or 1.
    pub step: usize,
    /// Char position reached.
    pub position: usize,
    /// Document length in chars.
    pub total: usize,
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// All passes and the sweep ran.
    Completed,
    /// The progress callback asked to stop.
    Cancelled,
}

/// Builder for [`PersonAnalyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    config: Option<AnalyzerConfig>,
    vocabulary: Option<Arc<Vocabulary>>,
    morphology: Option<Arc<dyn Morphology>>,
    ontology: Option<Arc<dyn Ontology>>,
    foreign: Vec<Arc<dyn ForeignResolver>>,
}

impl AnalyzerBuilder {
    /// Analyzer settings.
    #[must_use]
    pub fn config(mut self, config: AnalyzerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Term tables; the builtin vocabulary when unset.
    #[must_use]
    pub fn vocabulary(mut self, vocab: Arc<Vocabulary>) -> Self {
        self.vocabulary = Some(vocab);
        self
    }

    /// Morphology service; the builtin lexicon when unset.
    #[must_use]
    pub fn morphology(mut self, morphology: Arc<dyn Morphology>) -> Self {
        self.morphology = Some(morphology);
        self
    }

    /// Known-person lookup used to corroborate weak matches.
    #[must_use]
    pub fn ontology(mut self, ontology: Arc<dyn Ontology>) -> Self {
        self.ontology = Some(ontology);
        self
    }

    /// Adds a sibling extractor consulted for organization and location
    /// targets.
    #[must_use]
    pub fn foreign_resolver(mut self, resolver: Arc<dyn ForeignResolver>) -> Self {
        self.foreign.push(resolver);
        self
    }

    /// Validates the configuration and resolves the collaborators.
    ///
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) for unusable settings and
    /// [`Error::Init`](crate::Error::Init) when a builtin table fails to load.
    pub fn build(self) -> Result<PersonAnalyzer> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let vocab = match self.vocabulary {
            Some(v) => v,
            None => Vocabulary::builtin()?,
        };
        let morphology = match self.morphology {
            Some(m) => m,
            None => {
                let lexicon: Arc<dyn Morphology> = LexiconMorphology::builtin()?;
                lexicon
            }
        };
        let caps = Capabilities {
            morphology,
            ontology: self.ontology,
            foreign: self.foreign,
        };
        log::info!(
            "[persons] analyzer ready (ontology: {}, foreign resolvers: {})",
            caps.ontology.is_some(),
            caps.foreign.len()
        );
        Ok(PersonAnalyzer {
            config,
            vocab,
            caps,
        })
    }
}

/// Person extractor. Immutable after construction and shareable across
/// threads; all per-document state lives in [`Document`].
#[derive(Debug, Clone)]
pub struct PersonAnalyzer {
    config: AnalyzerConfig,
    vocab: Arc<Vocabulary>,
    caps: Capabilities,
}

impl PersonAnalyzer {
    /// Builder with builtin tables and default settings.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Analyzer with builtin tables and default settings.
    ///
    /// # Errors
    ///
    /// See [`AnalyzerBuilder::build`].
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Settings.
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Term tables.
    #[must_use]
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// Matcher inputs borrowed from this analyzer.
    #[must_use]
    pub fn ctx(&self) -> Ctx<'_> {
        Ctx {
            config: &self.config,
            vocab: &self.vocab,
            caps: &self.caps,
        }
    }

    /// Tokenizes `text` with the configured morphology.
    #[must_use]
    pub fn document(&self, text: &str) -> Document {
        self.document_from_tokens(TokenView::tokenize(text, self.caps.morphology.as_ref()))
    }

    /// Document over a token view built by the host.
    #[must_use]
    pub fn document_from_tokens(&self, tokens: TokenView) -> Document {
        let registry = crate::registry::Registry::new(Arc::clone(&self.vocab), self.config.surname_policy);
        Document::new(tokens, registry)
    }

    /// Runs both scans and the sweep.
    pub fn process(&self, doc: &mut Document) -> ProcessOutcome {
        self.process_with_progress(doc, |_| true)
    }

    /// Runs both scans and the sweep, reporting progress every
    /// `progress_quantum` chars. A `false` return stops the analysis; what
    /// was registered so far stays in the document.
    pub fn process_with_progress<F>(&self, doc: &mut Document, mut progress: F) -> ProcessOutcome
    where
        F: FnMut(Progress) -> bool,
    {
        let ctx = self.ctx();
        let total = doc.tokens.char_len();
        for step in 0..2 {
            let mut next_report = 0;
            let mut cur = doc.tokens.first();
            while let Some(t) = cur {
                let begin_char = doc.tokens.token(t).begin_char;
                if begin_char >= next_report {
                    next_report = begin_char + self.config.progress_quantum;
                    let report = Progress {
                        step,
                        position: begin_char,
                        total,
                    };
                    if !progress(report) {
                        log::warn!("[persons] cancelled at char {begin_char} in pass {step}");
                        return ProcessOutcome::Cancelled;
                    }
                }
                cur = self.scan_at(&ctx, doc, t, step);
            }
            if step == 0 && doc.registry.is_empty() && !doc.needs_second_pass {
                log::debug!("[persons] nothing found, skipping second pass");
                break;
            }
        }
        sweep::run(&ctx, doc);
        ProcessOutcome::Completed
    }

    /// Tries every matcher at `t` and returns where the scan resumes.
    fn scan_at(&self, ctx: &Ctx<'_>, doc: &mut Document, t: TokenId, step: usize) -> Option<TokenId> {
        if step == 0 && try_attach_attr(ctx, &doc.registry, &doc.tokens, t).is_some() {
            doc.tokens.set_memo(t);
            doc.attr_begins.insert(doc.tokens.token(t).begin_char);
        }
        match try_attach_persons(ctx, &doc.registry, &doc.tokens, t, step, 0) {
            Some(Attach::Skip(end)) => return doc.tokens.next(end),
            Some(Attach::Persons(list)) => {
                if step == 0 && list.iter().any(|m| m.single_name && !m.attrs.is_empty()) {
                    doc.needs_second_pass = true;
                }
                let Some(end) = list.last().map(|m| m.end) else {
                    return doc.tokens.next(t);
                };
                let resume = doc.tokens.next(end);
                commit_persons(doc, list);
                return resume;
            }
            None => {}
        }
        if step == 0 {
            if let Some(m) = try_attach_identity(ctx, &doc.registry, &doc.tokens, t) {
                let resume = doc.tokens.next(m.end);
                commit_identity(doc, m);
                return resume;
            }
        }
        doc.tokens.next(t)
    }

    /// Matches a person at `t` and registers it without embedding. Returns
    /// the referent and the last token of the mention.
    pub fn try_resolve_at(&self, doc: &mut Document, t: TokenId) -> Option<(ReferentId, TokenId)> {
        let ctx = self.ctx();
        let Some(Attach::Persons(list)) = try_attach_persons(&ctx, &doc.registry, &doc.tokens, t, 0, 0) else {
            return None;
        };
        let m = list.into_iter().next()?;
        let mut person = m.person;
        for a in &m.attrs {
            if let Some(draft) = &a.draft {
                let pid = doc.register_draft(draft);
                person.add_attribute(pid);
            }
        }
        let id = doc.registry.register(Referent::Person(person));
        Some((id, m.end))
    }

    /// Reads a curated list entry at `t`: nominative names, with
    /// `;`-separated variants folded into one person.
    pub fn resolve_from_known_entries(
        &self,
        doc: &mut Document,
        t: TokenId,
        ontology: &dyn Ontology,
    ) -> Option<(ReferentId, TokenId)> {
        let config = AnalyzerConfig {
            nominative_case_always: true,
            ..self.config.clone()
        };
        let ctx = Ctx {
            config: &config,
            vocab: &self.vocab,
            caps: &self.caps,
        };
        let mut result: Option<(ReferentId, TokenId)> = None;
        let mut cur = Some(t);
        while let Some(tt) = cur {
            let Some((person, end)) = known_entry(&ctx, &doc.tokens, tt, ontology) else {
                break;
            };
            let id = doc.registry.register(Referent::Person(person));
            let canonical = match result {
                Some((first, _)) => {
                    doc.registry.merge_into(id, first);
                    doc.registry.resolve(first)
                }
                None => id,
            };
            result = Some((canonical, end));
            cur = doc
                .tokens
                .next(end)
                .filter(|&n| doc.tokens.is_char(n, ';'))
                .and_then(|n| doc.tokens.next(n));
        }
        result
    }
}

/// Registers and embeds a list of person matches: attribute properties
/// first, then each person over its whole span.
fn commit_persons(doc: &mut Document, list: Vec<PersonMatch>) {
    let mut shared: Vec<ReferentId> = Vec::new();
    for m in list {
        let PersonMatch {
            mut begin,
            mut end,
            mut person,
            attrs,
            inherit_attrs,
            ..
        } = m;
        if inherit_attrs {
            for &pid in &shared {
                person.add_attribute(pid);
            }
        } else {
            shared.clear();
            for a in &attrs {
                let Some(draft) = &a.draft else { continue };
                let pid = doc.register_draft(draft);
                person.add_attribute(pid);
                shared.push(pid);
                if let Some(tok) = doc.embed(a.begin, a.end, pid) {
                    if a.begin == begin {
                        begin = tok;
                    }
                    if a.end == end {
                        end = tok;
                    }
                }
            }
        }
        let id = doc.registry.register(Referent::Person(person));
        log::trace!("[persons] person {id} registered");
        doc.embed(begin, end, id);
    }
}

/// Registers an identity document, links it to the person right before it
/// and embeds it.
fn commit_identity(doc: &mut Document, m: IdentityMatch) {
    let owner = preceding_person(&doc.registry, &doc.tokens, m.begin);
    let mut referent = m.referent;
    for (slot, draft) in &m.refs {
        let rid = doc.register_ref(draft);
        referent.slots.add(slot, rid);
    }
    let id = doc.registry.register(Referent::Identity(referent));
    if let Some(owner) = owner {
        if let Some(Referent::Person(p)) = doc.registry.get_mut(owner) {
            p.slots.add(slots::IDDOC, id);
        }
    }
    doc.embed(m.begin, m.end, id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referent::ReferentGraph;

    fn analyzer() -> PersonAnalyzer {
        PersonAnalyzer::new().expect("analyzer")
    }

    #[test]
    fn analyzer_is_send_and_sync() {
        fn check<T: Send + Sync>() {}
        check::<PersonAnalyzer>();
    }

    #[test]
    fn bad_config_fails_to_build() {
        let config = AnalyzerConfig::default().with_progress_quantum(0);
        assert!(PersonAnalyzer::builder().config(config).build().is_err());
    }

    #[test]
    fn person_replaces_its_span() {
        let a = analyzer();
        let mut doc = a.document("President Ivanov A.B. said");
        assert_eq!(a.process(&mut doc), ProcessOutcome::Completed);
        let first = doc.tokens().first().expect("token");
        assert_eq!(doc.tokens().token(first).begin_char, 0);
        let id = doc.tokens().referent(first).expect("person");
        assert!(doc.registry().get(id).and_then(Referent::as_person).is_some());
    }

    #[test]
    fn identity_attaches_to_preceding_person() {
        let a = analyzer();
        let mut doc = a.document("Ivanov Ivan Ivanovich, passport 4510 123456");
        a.process(&mut doc);
        let (_, person) = doc.persons().next().expect("person");
        let iddoc = person.slots.first_ref(slots::IDDOC).expect("iddoc");
        let id = doc.registry().get(iddoc).and_then(Referent::as_identity).expect("identity");
        assert_eq!(id.number(), Some("4510 123456"));
    }

    #[test]
    fn try_resolve_registers_without_embedding() {
        let a = analyzer();
        let mut doc = a.document("Minister Petrov");
        let t = doc.tokens().first().expect("token");
        let (id, _) = a.try_resolve_at(&mut doc, t).expect("person");
        assert!(doc.registry().get(id).is_some());
        assert!(doc.tokens().iter().all(|t| doc.tokens().referent(t).is_none()));
    }
}
