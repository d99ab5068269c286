//! Collaborator seams: morphology, known-person gazetteer and sibling
//! extractors for organizations and locations.
//!
//! The analyzer resolves these once, at construction, into a
//! [`Capabilities`] registry; matchers only ever see the registry. Reference
//! implementations live next to the traits so the engine runs end to end
//! without a host: [`LexiconMorphology`], [`PersonGazetteer`] and
//! [`PhraseResolver`].

mod gazetteer;
mod lexicon;

pub use gazetteer::{KnownPerson, OntologyHit, PersonGazetteer, PhraseResolver};
pub use lexicon::LexiconMorphology;

use crate::referent::ForeignReferent;
use persona_core::{Morphology, TokenId, TokenView};
use std::fmt;
use std::sync::Arc;

/// Lookup of previously known people.
pub trait Ontology: Send + Sync {
    /// Entries matching a prefix of `terms` (upper-cased name words).
    fn find(&self, terms: &[&str]) -> Vec<OntologyHit>;
}

/// A foreign referent recognized inline by a sibling extractor.
#[derive(Debug, Clone)]
pub struct ForeignMatch {
    /// The organization, location or address.
    pub referent: ForeignReferent,
    /// Last token of the mention.
    pub end: TokenId,
}

/// Sibling extractor able to recognize an organization or location at a token.
pub trait ForeignResolver: Send + Sync {
    /// Name of the extractor, for logs.
    fn name(&self) -> &'static str;

    /// Recognizes a mention starting at `t`.
    fn resolve_at(&self, view: &TokenView, t: TokenId) -> Option<ForeignMatch>;
}

/// Capability providers, resolved once when the analyzer is built.
#[derive(Clone)]
pub struct Capabilities {
    /// Morphological analysis and inflection.
    pub morphology: Arc<dyn Morphology>,
    /// Known-person gazetteer used to corroborate weak matches.
    pub ontology: Option<Arc<dyn Ontology>>,
    /// Sibling extractors consulted for `REF` targets.
    pub foreign: Vec<Arc<dyn ForeignResolver>>,
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("ontology", &self.ontology.is_some())
            .field(
                "foreign",
                &self.foreign.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
