//! The token view: an arena-backed, doubly-linked token chain.
//!
//! Plain tokens come from a tokenizer and are never rewritten. Resolved
//! mentions are spliced in as *composite* tokens covering `[begin, end]`; the
//! chain then walks over the composite as one unit, while the wrapped tokens
//! stay linked among themselves so a later pass can still embed a sub-span
//! (for instance an organization inside an already embedded title).

use crate::error::{Error, Result};
use crate::morph::{MorphInfo, Morphology};
use crate::slot::ReferentId;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Identifier of a token inside one [`TokenView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(u32);

impl TokenId {
    /// Index into the view's arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Character-class flags of a token's surface text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CharClass: u16 {
        /// Contains letters.
        const LETTER = 1;
        /// Only ASCII digits.
        const DIGIT = 1 << 1;
        /// No letters or digits.
        const PUNCT = 1 << 2;
        /// Every letter is upper case.
        const ALL_UPPER = 1 << 3;
        /// Every letter is lower case.
        const ALL_LOWER = 1 << 4;
        /// First letter upper case, the rest lower case.
        const CAPITAL = 1 << 5;
        /// Latin script letters only.
        const LATIN = 1 << 6;
        /// Cyrillic script letters only.
        const CYRILLIC = 1 << 7;
    }
}

impl CharClass {
    /// Classifies a surface string.
    #[must_use]
    pub fn of(word: &str) -> CharClass {
        let mut class = CharClass::empty();
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
        if !letters.is_empty() {
            class |= CharClass::LETTER;
            if letters.iter().all(|c| !c.is_lowercase()) {
                class |= CharClass::ALL_UPPER;
            }
            if letters.iter().all(|c| !c.is_uppercase()) {
                class |= CharClass::ALL_LOWER;
            }
            if letters[0].is_uppercase() && letters[1..].iter().all(|c| !c.is_uppercase()) {
                class |= CharClass::CAPITAL;
            }
            if letters.iter().all(|c| c.is_ascii_alphabetic()) {
                class |= CharClass::LATIN;
            }
            if letters.iter().all(|c| is_cyrillic(*c)) {
                class |= CharClass::CYRILLIC;
            }
        } else if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
            class |= CharClass::DIGIT;
        } else if !word.chars().any(char::is_alphanumeric) {
            class |= CharClass::PUNCT;
        }
        class
    }

    /// Starts with an upper-case letter.
    #[must_use]
    pub fn is_capitalized(self) -> bool {
        self.intersects(CharClass::CAPITAL | CharClass::ALL_UPPER) && self.contains(CharClass::LETTER)
    }
}

fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// What a token stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Word, number or punctuation; `term` is the upper-cased surface.
    Text {
        /// Upper-cased surface form.
        term: String,
    },
    /// A resolved referent spliced over `[begin, end]`.
    Composite {
        /// The referent this span denotes.
        referent: ReferentId,
        /// First wrapped token.
        begin: TokenId,
        /// Last wrapped token.
        end: TokenId,
    },
}

/// One unit of the chain.
#[derive(Debug, Clone)]
pub struct Token {
    /// Kind and payload.
    pub kind: TokenKind,
    /// Start offset in characters.
    pub begin_char: usize,
    /// End offset in characters (exclusive).
    pub end_char: usize,
    /// Whitespace characters between this token and the previous one.
    pub whitespace_before: u32,
    /// Line breaks between this token and the previous one.
    pub newlines_before: u32,
    /// Character classes of the surface text.
    pub chars: CharClass,
    /// Morphological readings.
    pub morph: MorphInfo,
    bytes: Range<usize>,
    memo: bool,
    prev: Option<TokenId>,
    next: Option<TokenId>,
}

/// Token chain over one document.
#[derive(Debug, Clone, Default)]
pub struct TokenView {
    text: String,
    tokens: Vec<Token>,
    head: Option<TokenId>,
    tail: Option<TokenId>,
    char_len: usize,
}

/// Lexical units of `text` as `(byte range, char range)` pairs.
///
/// Letters (with inner apostrophes) and ASCII digit runs form one unit each;
/// every other non-space character is a unit of its own.
fn lex(text: &str) -> Vec<(Range<usize>, Range<usize>)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();
    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        let c = chars[i].1;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if c.is_alphabetic() {
            i += 1;
            while i < n {
                let ch = chars[i].1;
                let inner_apostrophe =
                    (ch == '\'' || ch == '’') && i + 1 < n && chars[i + 1].1.is_alphabetic();
                if ch.is_alphabetic() || inner_apostrophe {
                    i += 1;
                } else {
                    break;
                }
            }
        } else if c.is_ascii_digit() {
            while i < n && chars[i].1.is_ascii_digit() {
                i += 1;
            }
        } else {
            i += 1;
        }
        let byte_end = if i < n { chars[i].0 } else { text.len() };
        out.push((chars[start].0..byte_end, start..i));
    }
    out
}

/// Splits a phrase into upper-cased terms exactly as the tokenizer would.
#[must_use]
pub fn split_terms(phrase: &str) -> Vec<String> {
    lex(phrase)
        .into_iter()
        .map(|(bytes, _)| phrase[bytes].to_uppercase())
        .collect()
}

impl TokenView {
    /// Empty view over `text`; fill it with [`TokenView::push`].
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self {
            text,
            char_len,
            ..Self::default()
        }
    }

    /// Tokenizes `text`, asking `morph` for the readings of every word.
    #[must_use]
    pub fn tokenize(text: &str, morph: &dyn Morphology) -> Self {
        let mut view = TokenView::new(text);
        for (bytes, chars) in lex(text) {
            let surface = &text[bytes.clone()];
            let info = if surface.chars().any(char::is_alphabetic) {
                MorphInfo {
                    forms: morph.analyze(surface),
                }
            } else {
                MorphInfo::default()
            };
            view.push(bytes, chars, info);
        }
        view
    }

    /// Appends a plain token covering `bytes` / `chars` of the text.
    pub fn push(&mut self, bytes: Range<usize>, chars: Range<usize>, morph: MorphInfo) -> TokenId {
        let gap_start = self
            .tail
            .map_or(0, |t| self.tokens[t.index()].bytes.end);
        let gap = self.text.get(gap_start..bytes.start).unwrap_or("");
        let whitespace_before = gap.chars().filter(|c| c.is_whitespace()).count() as u32;
        let newlines_before = gap.chars().filter(|&c| c == '\n').count() as u32;
        let surface = self.text.get(bytes.clone()).unwrap_or("");
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(Token {
            kind: TokenKind::Text {
                term: surface.to_uppercase(),
            },
            begin_char: chars.start,
            end_char: chars.end,
            whitespace_before,
            newlines_before,
            chars: CharClass::of(surface),
            morph,
            bytes,
            memo: false,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(t) => self.tokens[t.index()].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the source text in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// First token of the top-level chain.
    #[must_use]
    pub fn first(&self) -> Option<TokenId> {
        self.head
    }

    /// Token by id.
    #[must_use]
    pub fn token(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    /// Following token.
    #[must_use]
    pub fn next(&self, id: TokenId) -> Option<TokenId> {
        self.tokens[id.index()].next
    }

    /// Preceding token.
    #[must_use]
    pub fn prev(&self, id: TokenId) -> Option<TokenId> {
        self.tokens[id.index()].prev
    }

    /// Walks the top-level chain.
    pub fn iter(&self) -> impl Iterator<Item = TokenId> + '_ {
        std::iter::successors(self.head, move |&t| self.next(t))
    }

    /// Walks `begin..=end` along the chain.
    pub fn span(&self, begin: TokenId, end: TokenId) -> impl Iterator<Item = TokenId> + '_ {
        let mut cur = Some(begin);
        std::iter::from_fn(move || {
            let t = cur?;
            cur = if t == end { None } else { self.next(t) };
            Some(t)
        })
    }

    /// Upper-cased surface of a plain token.
    #[must_use]
    pub fn term(&self, id: TokenId) -> Option<&str> {
        match &self.tokens[id.index()].kind {
            TokenKind::Text { term } => Some(term),
            TokenKind::Composite { .. } => None,
        }
    }

    /// Surface text of `begin..=end`.
    #[must_use]
    pub fn source(&self, begin: TokenId, end: TokenId) -> &str {
        let b = self.tokens[begin.index()].bytes.start;
        let e = self.tokens[end.index()].bytes.end;
        self.text.get(b..e).unwrap_or("")
    }

    /// Referent of a composite token.
    #[must_use]
    pub fn referent(&self, id: TokenId) -> Option<ReferentId> {
        match self.tokens[id.index()].kind {
            TokenKind::Composite { referent, .. } => Some(referent),
            TokenKind::Text { .. } => None,
        }
    }

    /// Wrapped span of a composite token.
    #[must_use]
    pub fn composite_span(&self, id: TokenId) -> Option<(TokenId, TokenId)> {
        match self.tokens[id.index()].kind {
            TokenKind::Composite { begin, end, .. } => Some((begin, end)),
            TokenKind::Text { .. } => None,
        }
    }

    /// The token is the single character `ch`.
    #[must_use]
    pub fn is_char(&self, id: TokenId, ch: char) -> bool {
        self.term(id).is_some_and(|t| {
            let mut it = t.chars();
            it.next() == Some(ch) && it.next().is_none()
        })
    }

    /// The token is one of the characters in `chars`.
    #[must_use]
    pub fn is_char_of(&self, id: TokenId, chars: &str) -> bool {
        chars.chars().any(|c| self.is_char(id, c))
    }

    /// Comma.
    #[must_use]
    pub fn is_comma(&self, id: TokenId) -> bool {
        self.is_char(id, ',')
    }

    /// Hyphen or dash.
    #[must_use]
    pub fn is_hyphen(&self, id: TokenId) -> bool {
        self.is_char_of(id, "-‐–—")
    }

    /// Plain letter token.
    #[must_use]
    pub fn is_letter(&self, id: TokenId) -> bool {
        self.term(id).is_some() && self.tokens[id.index()].chars.contains(CharClass::LETTER)
    }

    /// Parsed value of a digit token.
    #[must_use]
    pub fn number(&self, id: TokenId) -> Option<u64> {
        let tok = &self.tokens[id.index()];
        if !tok.chars.contains(CharClass::DIGIT) {
            return None;
        }
        self.term(id)?.parse().ok()
    }

    /// Line breaks before the token.
    #[must_use]
    pub fn newlines_before(&self, id: TokenId) -> u32 {
        self.tokens[id.index()].newlines_before
    }

    /// Line breaks after the token (before the next one).
    #[must_use]
    pub fn newlines_after(&self, id: TokenId) -> u32 {
        self.next(id).map_or(0, |n| self.newlines_before(n))
    }

    /// Starts a line (or the text).
    #[must_use]
    pub fn is_newline_before(&self, id: TokenId) -> bool {
        self.prev(id).is_none() || self.newlines_before(id) > 0
    }

    /// Ends a line (or the text).
    #[must_use]
    pub fn is_newline_after(&self, id: TokenId) -> bool {
        self.next(id).map_or(true, |n| self.newlines_before(n) > 0)
    }

    /// Separated from the previous token by whitespace.
    #[must_use]
    pub fn is_whitespace_before(&self, id: TokenId) -> bool {
        self.prev(id).is_none() || self.tokens[id.index()].whitespace_before > 0
    }

    /// Separated from the next token by whitespace.
    #[must_use]
    pub fn is_whitespace_after(&self, id: TokenId) -> bool {
        self.next(id)
            .map_or(true, |n| self.tokens[n.index()].whitespace_before > 0)
    }

    /// Memo flag set by the first scan.
    #[must_use]
    pub fn is_memo(&self, id: TokenId) -> bool {
        self.tokens[id.index()].memo
    }

    /// Sets the memo flag.
    pub fn set_memo(&mut self, id: TokenId) {
        self.tokens[id.index()].memo = true;
    }

    fn reaches(&self, begin: TokenId, end: TokenId) -> bool {
        let mut cur = Some(begin);
        for _ in 0..=self.tokens.len() {
            match cur {
                Some(t) if t == end => return true,
                Some(t) => cur = self.next(t),
                None => return false,
            }
        }
        false
    }

    fn check(&self, id: TokenId) -> Result<()> {
        if id.index() < self.tokens.len() {
            Ok(())
        } else {
            Err(Error::span(format!("unknown token {}", id.index())))
        }
    }

    /// Splices a composite token over `begin..=end` and returns it.
    ///
    /// The span may sit inside an existing composite; the enclosing
    /// composite's bounds are moved to the new token when they coincide.
    pub fn embed(&mut self, begin: TokenId, end: TokenId, referent: ReferentId) -> Result<TokenId> {
        self.check(begin)?;
        self.check(end)?;
        if !self.reaches(begin, end) {
            return Err(Error::span(format!(
                "token {} does not reach token {}",
                begin.index(),
                end.index()
            )));
        }
        let id = TokenId(self.tokens.len() as u32);
        let (b, e) = (&self.tokens[begin.index()], &self.tokens[end.index()]);
        let token = Token {
            kind: TokenKind::Composite {
                referent,
                begin,
                end,
            },
            begin_char: b.begin_char,
            end_char: e.end_char,
            whitespace_before: b.whitespace_before,
            newlines_before: b.newlines_before,
            chars: CharClass::empty(),
            morph: MorphInfo::default(),
            bytes: b.bytes.start..e.bytes.end,
            memo: false,
            prev: b.prev,
            next: e.next,
        };
        let (prev, next) = (token.prev, token.next);
        self.tokens.push(token);

        if let Some(p) = prev {
            if self.tokens[p.index()].next == Some(begin) {
                self.tokens[p.index()].next = Some(id);
            }
        }
        if let Some(n) = next {
            if self.tokens[n.index()].prev == Some(end) {
                self.tokens[n.index()].prev = Some(id);
            }
        }
        if self.head == Some(begin) {
            self.head = Some(id);
        }
        if self.tail == Some(end) {
            self.tail = Some(id);
        }
        for tok in &mut self.tokens[..id.index()] {
            if let TokenKind::Composite {
                begin: cb, end: ce, ..
            } = &mut tok.kind
            {
                if *cb == begin {
                    *cb = id;
                }
                if *ce == end {
                    *ce = id;
                }
            }
        }
        Ok(id)
    }

    /// Points a composite token at another referent.
    pub fn retarget(&mut self, id: TokenId, to: ReferentId) -> Result<()> {
        self.check(id)?;
        match &mut self.tokens[id.index()].kind {
            TokenKind::Composite { referent, .. } => {
                *referent = to;
                Ok(())
            }
            TokenKind::Text { .. } => Err(Error::invalid_input(format!(
                "token {} is not a composite",
                id.index()
            ))),
        }
    }

    /// Composite tokens reachable from the top-level chain, outermost first.
    #[must_use]
    pub fn composites(&self) -> Vec<TokenId> {
        let mut out = Vec::new();
        let mut stack: Vec<TokenId> = self.iter().collect();
        stack.reverse();
        while let Some(t) = stack.pop() {
            if let Some((b, e)) = self.composite_span(t) {
                out.push(t);
                let mut inner: Vec<TokenId> = self.span(b, e).collect();
                inner.reverse();
                stack.extend(inner);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::{MorphError, MorphForm, MorphTarget};

    struct NoMorph;

    impl Morphology for NoMorph {
        fn analyze(&self, _word: &str) -> Vec<MorphForm> {
            Vec::new()
        }

        fn inflect(&self, word: &str, _target: &MorphTarget) -> std::result::Result<String, MorphError> {
            Err(MorphError::Unsupported(word.to_string()))
        }
    }

    fn terms(view: &TokenView) -> Vec<String> {
        view.iter()
            .map(|t| view.term(t).map_or_else(|| "<C>".to_string(), str::to_string))
            .collect()
    }

    #[test]
    fn tokenizes_words_numbers_and_punctuation() {
        let view = TokenView::tokenize("Ivanov A.B., O'Brien 1984", &NoMorph);
        assert_eq!(
            terms(&view),
            vec!["IVANOV", "A", ".", "B", ".", ",", "O'BRIEN", "1984"]
        );
        let last = view.iter().last().expect("tokens");
        assert_eq!(view.number(last), Some(1984));
    }

    #[test]
    fn whitespace_and_newlines() {
        let view = TokenView::tokenize("one\n\ntwo three", &NoMorph);
        let ids: Vec<TokenId> = view.iter().collect();
        assert_eq!(view.newlines_before(ids[1]), 2);
        assert!(view.is_newline_after(ids[0]));
        assert!(view.is_whitespace_after(ids[1]));
        assert!(view.is_newline_after(ids[2]));
    }

    #[test]
    fn embed_replaces_span_and_nests() {
        let mut view = TokenView::tokenize("a b c d", &NoMorph);
        let ids: Vec<TokenId> = view.iter().collect();
        let outer = view.embed(ids[1], ids[2], ReferentId(7)).expect("embed");
        assert_eq!(terms(&view), vec!["A", "<C>", "D"]);
        assert_eq!(view.token(outer).begin_char, 2);

        let inner = view.embed(ids[2], ids[2], ReferentId(8)).expect("nested embed");
        assert_eq!(view.composite_span(outer), Some((ids[1], inner)));
        assert_eq!(view.composites(), vec![outer, inner]);
        assert_eq!(view.source(ids[1], inner), "b c");
    }

    #[test]
    fn embed_rejects_backwards_span() {
        let mut view = TokenView::tokenize("a b", &NoMorph);
        let ids: Vec<TokenId> = view.iter().collect();
        assert!(view.embed(ids[1], ids[0], ReferentId(0)).is_err());
    }

    #[test]
    fn split_terms_matches_tokenizer() {
        assert_eq!(split_terms("vice-president"), vec!["VICE", "-", "PRESIDENT"]);
        assert_eq!(split_terms("driver's license"), vec!["DRIVER'S", "LICENSE"]);
    }
}
