//! # persona-core
//!
//! Core types shared by the persona workspace:
//! - **Token view**: `TokenView`, `Token`, `TokenId`, composite-token splicing
//! - **Morphology**: `MorphCase`, `MorphGender`, `MorphNumber` bitsets and the
//!   `Morphology` service trait
//! - **Slots**: `SlotList`, the ordered multimap every referent stores its
//!   attributes in, and `ReferentId`

#![warn(missing_docs)]

pub mod error;
pub mod morph;
pub mod slot;
pub mod token;

pub use error::{Error, Result};
pub use morph::{
    MorphCase, MorphClass, MorphError, MorphForm, MorphGender, MorphInfo, MorphNumber,
    MorphTarget, Morphology,
};
pub use slot::{ReferentId, Slot, SlotList, SlotValue};
pub use token::{split_terms, CharClass, Token, TokenId, TokenKind, TokenView};
