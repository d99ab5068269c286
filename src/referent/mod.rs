//! Referents: the entities the engine produces.
//!
//! Every referent stores its attributes in a [`SlotList`]; graph edges are
//! slots whose value is a [`ReferentId`]. Comparisons that need to follow an
//! edge go through a [`ReferentGraph`], which the document registry
//! implements.

mod foreign;
mod identity;
mod person;
mod property;

pub use foreign::ForeignReferent;
pub use identity::PersonIdentityReferent;
pub use person::{compare_surnames, del_surname_end, PersonReferent};
pub use property::{higher_chain_is_sound, PersonPropertyReferent, MAX_HIGHER_DEPTH};

use crate::vocab::Vocabulary;
use persona_core::{ReferentId, SlotList};
use serde::{Deserialize, Serialize};

/// Slot type names.
pub mod slots {
    /// Given name.
    pub const FIRSTNAME: &str = "FIRSTNAME";
    /// Surname.
    pub const LASTNAME: &str = "LASTNAME";
    /// Patronymic or middle name.
    pub const MIDDLENAME: &str = "MIDDLENAME";
    /// Ordinal nickname ("II").
    pub const NICKNAME: &str = "NICKNAME";
    /// Name word of unknown role.
    pub const UNDEFNAME: &str = "UNDEFNAME";
    /// Whole-name identity string.
    pub const IDENTITY: &str = "IDENTITY";
    /// Naming convention ("china", "arabic").
    pub const NAMETYPE: &str = "NAMETYPE";
    /// "MALE" or "FEMALE".
    pub const SEX: &str = "SEX";
    /// Age in years.
    pub const AGE: &str = "AGE";
    /// Edge to a property referent.
    pub const ATTR: &str = "ATTR";
    /// Edge to an identity document.
    pub const IDDOC: &str = "IDDOC";
    /// Property or foreign referent name.
    pub const NAME: &str = "NAME";
    /// Edge from a property to an organization or location.
    pub const REF: &str = "REF";
    /// Edge from a property to its superior property.
    pub const HIGHER: &str = "HIGHER";
    /// Identity document type.
    pub const TYPE: &str = "TYPE";
    /// Identity document number.
    pub const NUMBER: &str = "NUMBER";
    /// Issuing state.
    pub const STATE: &str = "STATE";
    /// Registration address.
    pub const ADDRESS: &str = "ADDRESS";
    /// Issuing organization.
    pub const ORG: &str = "ORG";
    /// Date of issue.
    pub const DATE: &str = "DATE";

    /// `SEX` value for men.
    pub const MALE: &str = "MALE";
    /// `SEX` value for women.
    pub const FEMALE: &str = "FEMALE";
}

/// How strict an equality check is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualMode {
    /// Both mentions come from the same document.
    #[default]
    WithinOneText,
    /// Mentions from different documents: missing parts are not assumed.
    DifferentTexts,
    /// Final merging of already resolved referents.
    ForMerging,
}

/// Semantic kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Plain position or occupation.
    #[default]
    Undefined,
    /// Head of an organization.
    Boss,
    /// Monarch or other royal title.
    King,
    /// Kinship term.
    Kin,
    /// Military rank.
    MilitaryRank,
    /// Nationality.
    Nationality,
}

/// Any referent the registry can hold.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Referent {
    /// A person.
    Person(PersonReferent),
    /// A title, position or kinship role.
    Property(PersonPropertyReferent),
    /// An identity document.
    Identity(PersonIdentityReferent),
    /// An organization, location or address from a sibling extractor.
    Foreign(ForeignReferent),
}

impl Referent {
    /// Type name used in logs and exports.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Referent::Person(_) => "PERSON",
            Referent::Property(_) => "PERSONPROPERTY",
            Referent::Identity(_) => "PERSONIDENTITY",
            Referent::Foreign(f) => &f.type_name,
        }
    }

    /// Slots.
    #[must_use]
    pub fn slots(&self) -> &SlotList {
        match self {
            Referent::Person(p) => &p.slots,
            Referent::Property(p) => &p.slots,
            Referent::Identity(p) => &p.slots,
            Referent::Foreign(f) => &f.slots,
        }
    }

    /// Mutable slots.
    pub fn slots_mut(&mut self) -> &mut SlotList {
        match self {
            Referent::Person(p) => &mut p.slots,
            Referent::Property(p) => &mut p.slots,
            Referent::Identity(p) => &mut p.slots,
            Referent::Foreign(f) => &mut f.slots,
        }
    }

    /// The person, if this is one.
    #[must_use]
    pub fn as_person(&self) -> Option<&PersonReferent> {
        match self {
            Referent::Person(p) => Some(p),
            _ => None,
        }
    }

    /// The property, if this is one.
    #[must_use]
    pub fn as_property(&self) -> Option<&PersonPropertyReferent> {
        match self {
            Referent::Property(p) => Some(p),
            _ => None,
        }
    }

    /// The identity document, if this is one.
    #[must_use]
    pub fn as_identity(&self) -> Option<&PersonIdentityReferent> {
        match self {
            Referent::Identity(p) => Some(p),
            _ => None,
        }
    }

    /// Equality dispatch; referents of different kinds are never equal.
    #[must_use]
    pub fn can_be_equals(&self, other: &Referent, mode: EqualMode, graph: &dyn ReferentGraph) -> bool {
        match (self, other) {
            (Referent::Person(a), Referent::Person(b)) => a.can_be_equals(b, mode, graph),
            (Referent::Property(a), Referent::Property(b)) => a.can_be_equals(b, mode, graph),
            (Referent::Identity(a), Referent::Identity(b)) => a.can_be_equals(b, graph),
            (Referent::Foreign(a), Referent::Foreign(b)) => a.can_be_equals(b),
            _ => false,
        }
    }
}

/// Read access to the referent graph.
pub trait ReferentGraph {
    /// Referent by id, following merge aliases.
    fn get(&self, id: ReferentId) -> Option<&Referent>;

    /// Static vocabulary.
    fn vocabulary(&self) -> &Vocabulary;

    /// Property by id.
    fn property(&self, id: ReferentId) -> Option<&PersonPropertyReferent> {
        self.get(id).and_then(Referent::as_property)
    }

    /// Two edges point at equal referents.
    fn same_target(&self, a: ReferentId, b: ReferentId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Some(Referent::Foreign(x)), Some(Referent::Foreign(y))) => x.can_be_equals(y),
            _ => false,
        }
    }
}
