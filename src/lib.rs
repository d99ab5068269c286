//! # persona
//!
//! Person-entity extraction and coreference resolution over token streams.
//!
//! - **Mentions**: names in a dozen orders ("Ivanov Ivan Ivanovich",
//!   "I.I. Ivanov", "John Smith"), titles and positions, kinship words,
//!   identity documents
//! - **Coreference**: repeated mentions of one person merge into a single
//!   referent with normalized names, sex, titles and documents
//! - **Agreement**: case and gender constraints between titles and names,
//!   scored candidates with ambiguous ties rejected
//!
//! ## Quick Start
//!
//! ```rust
//! use persona::PersonAnalyzer;
//!
//! let analyzer = PersonAnalyzer::new()?;
//! let mut doc = analyzer.document("President Ivanov A.B. met with Minister Petrov");
//! analyzer.process(&mut doc);
//!
//! let surnames: Vec<String> = doc
//!     .persons()
//!     .flat_map(|(_, p)| p.lastnames().map(str::to_string).collect::<Vec<_>>())
//!     .collect();
//! assert_eq!(surnames, ["IVANOV", "PETROV"]);
//! # Ok::<(), persona::Error>(())
//! ```
//!
//! ## Collaborators
//!
//! Morphology, the known-person gazetteer and sibling extractors for
//! organizations sit behind traits in [`services`]. The builtin
//! [`LexiconMorphology`](services::LexiconMorphology) lets the analyzer run
//! without a host; replace it through [`AnalyzerBuilder`].
//!
//! ```rust
//! use persona::services::PhraseResolver;
//! use persona::PersonAnalyzer;
//! use std::sync::Arc;
//!
//! let orgs = PhraseResolver::new("ORGANIZATION", &["Gazprom"]);
//! let analyzer = PersonAnalyzer::builder()
//!     .foreign_resolver(Arc::new(orgs))
//!     .build()?;
//! let mut doc = analyzer.document("director of Gazprom Alexey Miller");
//! analyzer.process(&mut doc);
//! assert_eq!(doc.persons().count(), 1);
//! # Ok::<(), persona::Error>(())
//! ```

#![warn(missing_docs)]

pub mod analyzer;
pub mod attr;
pub mod config;
pub mod error;
pub mod identity;
pub mod names;
pub mod referent;
pub mod registry;
pub mod services;
pub mod templates;
pub mod vocab;

pub use analyzer::{AnalyzerBuilder, Document, PersonAnalyzer, ProcessOutcome, Progress};
pub use config::{AnalyzerConfig, SurnamePolicy};
pub use error::{Error, Result};
pub use referent::{
    slots, EqualMode, ForeignReferent, PersonIdentityReferent, PersonPropertyReferent,
    PersonReferent, PropertyKind, Referent, ReferentGraph,
};
pub use registry::{Generalization, Occurrence, Registry};
pub use templates::FioTemplate;
pub use vocab::{LoadContext, Vocabulary};

pub use persona_core::{MorphCase, MorphGender, ReferentId, TokenId, TokenView};
