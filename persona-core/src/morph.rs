//! Morphological descriptors and the morphology service seam.
//!
//! Case, gender and number are multi-valued: a word form such as Russian
//! "ИВАНОВА" is either feminine nominative or masculine genitive, and the
//! matchers narrow these sets by intersection as agreement constraints pile up.
//! An empty set means "undefined" and is compatible with anything.

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Grammatical case set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MorphCase: u16 {
        /// Nominative.
        const NOMINATIVE = 1;
        /// Genitive.
        const GENITIVE = 1 << 1;
        /// Dative.
        const DATIVE = 1 << 2;
        /// Accusative.
        const ACCUSATIVE = 1 << 3;
        /// Instrumental.
        const INSTRUMENTAL = 1 << 4;
        /// Prepositional.
        const PREPOSITIONAL = 1 << 5;
        /// Vocative.
        const VOCATIVE = 1 << 6;
        /// Every case.
        const ALL = Self::NOMINATIVE.bits()
            | Self::GENITIVE.bits()
            | Self::DATIVE.bits()
            | Self::ACCUSATIVE.bits()
            | Self::INSTRUMENTAL.bits()
            | Self::PREPOSITIONAL.bits()
            | Self::VOCATIVE.bits();
    }
}

bitflags! {
    /// Grammatical gender set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MorphGender: u8 {
        /// Masculine.
        const MASCULINE = 1;
        /// Feminine.
        const FEMININE = 1 << 1;
        /// Neuter.
        const NEUTER = 1 << 2;
    }
}

bitflags! {
    /// Grammatical number set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MorphNumber: u8 {
        /// Singular.
        const SINGULAR = 1;
        /// Plural.
        const PLURAL = 1 << 1;
    }
}

bitflags! {
    /// Part-of-speech and proper-name class of a word form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MorphClass: u16 {
        /// Common noun.
        const NOUN = 1;
        /// Adjective.
        const ADJECTIVE = 1 << 1;
        /// Verb.
        const VERB = 1 << 2;
        /// Adverb.
        const ADVERB = 1 << 3;
        /// Pronoun.
        const PRONOUN = 1 << 4;
        /// Preposition.
        const PREPOSITION = 1 << 5;
        /// Conjunction.
        const CONJUNCTION = 1 << 6;
        /// Article or other function word.
        const ARTICLE = 1 << 7;
        /// Personal (first) name.
        const PROPER_NAME = 1 << 8;
        /// Surname.
        const PROPER_SURNAME = 1 << 9;
        /// Patronymic (second name).
        const PROPER_SECNAME = 1 << 10;
        /// Geographic name.
        const PROPER_GEO = 1 << 11;
        /// Any proper-name class.
        const PROPER = Self::PROPER_NAME.bits()
            | Self::PROPER_SURNAME.bits()
            | Self::PROPER_SECNAME.bits()
            | Self::PROPER_GEO.bits();
    }
}

impl MorphCase {
    /// True when no case is known.
    #[must_use]
    pub fn is_undefined(self) -> bool {
        self.is_empty()
    }

    /// Intersection that treats an undefined side as "any".
    #[must_use]
    pub fn agree(self, other: MorphCase) -> MorphCase {
        if self.is_empty() {
            other
        } else if other.is_empty() {
            self
        } else {
            self & other
        }
    }
}

impl MorphGender {
    /// Masculine or feminine: the default mask for a person mention.
    pub const PERSON: MorphGender = MorphGender::MASCULINE.union(MorphGender::FEMININE);

    /// Returns the gender when exactly masculine or exactly feminine.
    #[must_use]
    pub fn definite(self) -> Option<MorphGender> {
        if self == MorphGender::MASCULINE || self == MorphGender::FEMININE {
            Some(self)
        } else {
            None
        }
    }

    /// Intersection that treats an undefined side as "any".
    #[must_use]
    pub fn agree(self, other: MorphGender) -> MorphGender {
        if self.is_empty() {
            other
        } else if other.is_empty() {
            self
        } else {
            self & other
        }
    }
}

/// One morphological reading of a token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MorphForm {
    /// Normal form, upper-cased.
    pub lemma: String,
    /// Word class.
    pub class: MorphClass,
    /// Case set of this reading.
    pub case: MorphCase,
    /// Gender set of this reading.
    pub gender: MorphGender,
    /// Number set of this reading.
    pub number: MorphNumber,
    /// The reading comes from the general dictionary (a common word).
    pub in_dictionary: bool,
}

impl MorphForm {
    /// Creates a reading with the given lemma and class.
    #[must_use]
    pub fn new(lemma: impl Into<String>, class: MorphClass) -> Self {
        Self {
            lemma: lemma.into(),
            class,
            ..Self::default()
        }
    }

    /// Sets the gender.
    #[must_use]
    pub fn with_gender(mut self, gender: MorphGender) -> Self {
        self.gender = gender;
        self
    }

    /// Sets the case.
    #[must_use]
    pub fn with_case(mut self, case: MorphCase) -> Self {
        self.case = case;
        self
    }

    /// Marks the reading as a dictionary word.
    #[must_use]
    pub fn in_dictionary(mut self) -> Self {
        self.in_dictionary = true;
        self
    }
}

/// All readings of a token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MorphInfo {
    /// Readings, in the order the morphology service produced them.
    pub forms: Vec<MorphForm>,
}

impl MorphInfo {
    /// Union of the case sets of all readings.
    #[must_use]
    pub fn case(&self) -> MorphCase {
        self.forms.iter().fold(MorphCase::empty(), |acc, f| acc | f.case)
    }

    /// Union of the gender sets of all readings.
    #[must_use]
    pub fn gender(&self) -> MorphGender {
        self.forms
            .iter()
            .fold(MorphGender::empty(), |acc, f| acc | f.gender)
    }

    /// Union of the classes of all readings.
    #[must_use]
    pub fn class(&self) -> MorphClass {
        self.forms
            .iter()
            .fold(MorphClass::empty(), |acc, f| acc | f.class)
    }

    /// True when some reading has the given lemma.
    #[must_use]
    pub fn has_lemma(&self, lemma: &str) -> bool {
        self.forms.iter().any(|f| f.lemma == lemma)
    }

    /// True when some reading is a dictionary word that is not a proper name.
    #[must_use]
    pub fn is_common_word(&self) -> bool {
        self.forms
            .iter()
            .any(|f| f.in_dictionary && !f.class.intersects(MorphClass::PROPER))
    }

    /// Readings whose class intersects `class`.
    pub fn forms_of(&self, class: MorphClass) -> impl Iterator<Item = &MorphForm> {
        self.forms.iter().filter(move |f| f.class.intersects(class))
    }
}

/// Target grammatical features for an inflection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MorphTarget {
    /// Requested case; empty keeps the case of the source form.
    pub case: MorphCase,
    /// Requested gender.
    pub gender: MorphGender,
    /// Requested number.
    pub number: MorphNumber,
}

impl MorphTarget {
    /// Target with only a gender requirement.
    #[must_use]
    pub fn gender(gender: MorphGender) -> Self {
        Self {
            gender,
            ..Self::default()
        }
    }
}

/// Failure of an inflection request. Callers drop the affected variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MorphError {
    /// The word form is not known to the service.
    #[error("unsupported word form: {0}")]
    Unsupported(String),

    /// The word is known but has no form with the requested features.
    #[error("no form of {word} for {target:?}")]
    NoForm {
        /// Source word.
        word: String,
        /// Requested features.
        target: MorphTarget,
    },
}

/// Morphological analysis service consumed by the tokenizer and matchers.
pub trait Morphology: Send + Sync {
    /// All readings of a single word (any letter case).
    fn analyze(&self, word: &str) -> Vec<MorphForm>;

    /// Produces the form of `word` that carries the target features.
    fn inflect(&self, word: &str, target: &MorphTarget) -> Result<String, MorphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agree_treats_empty_as_any() {
        let nom = MorphCase::NOMINATIVE;
        assert_eq!(MorphCase::empty().agree(nom), nom);
        assert_eq!(nom.agree(MorphCase::empty()), nom);
        assert!(nom.agree(MorphCase::GENITIVE).is_empty());
    }

    #[test]
    fn definite_gender() {
        assert_eq!(
            MorphGender::FEMININE.definite(),
            Some(MorphGender::FEMININE)
        );
        assert_eq!(MorphGender::PERSON.definite(), None);
        assert_eq!(MorphGender::empty().definite(), None);
    }

    #[test]
    fn morph_info_unions() {
        let info = MorphInfo {
            forms: vec![
                MorphForm::new("ИВАНОВА", MorphClass::PROPER_SURNAME)
                    .with_gender(MorphGender::FEMININE)
                    .with_case(MorphCase::NOMINATIVE),
                MorphForm::new("ИВАНОВ", MorphClass::PROPER_SURNAME)
                    .with_gender(MorphGender::MASCULINE)
                    .with_case(MorphCase::GENITIVE | MorphCase::ACCUSATIVE),
            ],
        };
        assert_eq!(info.gender(), MorphGender::PERSON);
        assert!(info.case().contains(MorphCase::GENITIVE));
        assert!(info.has_lemma("ИВАНОВ"));
        assert!(!info.is_common_word());
    }
}
