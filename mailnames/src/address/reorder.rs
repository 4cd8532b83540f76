//
// mailnames - address module
//
// Copyright 2024 Emmanouil Pitsidianakis <manos@pitsidianak.is>
//
// This file is part of mailnames.
//
// mailnames is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// mailnames is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with mailnames. If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: EUPL-1.2 OR GPL-3.0-or-later

//! Rebuilding a grammatically contiguous address field.
//!
//! A field such as `jane@example.com (Jane) Doe` or `Jane jane@example.com` has
//! its parts in an order the address grammar does not allow. The field is
//! split into tokens, the address token is moved to the end and the rest is
//! quoted where needed:
//!
//! ```text
//! "Jane Q. Doe" (work) <jane@example.com>
//! ```

use std::ops::Range;

use smallvec::SmallVec;

use super::{
    skin::Skin,
    split::{comment_end, is_blank, quoted_end},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TokenKind {
    Atom,
    Quoted,
    Comment,
    Address,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Token {
    kind: TokenKind,
    /// Location in the input; quotes and parentheses included, angle
    /// brackets excluded.
    span: Range<usize>,
    needs_quote: bool,
}

/// The rebuilt field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reordered {
    /// Everything but the address, serialized. Empty if nothing but the
    /// address was found.
    pub phrase: String,
    /// The skinned address.
    pub address: String,
    /// The free text name, with quoting and comment parentheses removed.
    pub real_name: Option<String>,
}

impl Reordered {
    /// `phrase <address>`, or the bare address without phrase.
    pub fn render(&self, address: &str) -> String {
        if self.phrase.is_empty() {
            address.to_string()
        } else {
            format!("{} <{}>", self.phrase, address)
        }
    }
}

#[inline(always)]
fn atom_needs_quote(atom: &[u8]) -> bool {
    atom.iter().any(|c| {
        matches!(
            c,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b':' | b';' | b'@' | b'\\' | b',' | b'.'
                | b'"'
        )
    })
}

fn tokenize(input: &[u8], angle: Option<&Range<usize>>) -> SmallVec<[Token; 8]> {
    let angle_open = angle.map(|r| r.start - 1);
    let mut tokens = SmallVec::new();
    let mut pos = 0;
    while pos < input.len() {
        if Some(pos) == angle_open {
            if let Some(angle) = angle {
                tokens.push(Token {
                    kind: TokenKind::Address,
                    span: angle.clone(),
                    needs_quote: false,
                });
                pos = (angle.end + 1).min(input.len());
                continue;
            }
        }
        match input[pos] {
            c if is_blank(c) => pos += 1,
            b'(' => {
                let end = comment_end(input, pos + 1);
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    span: pos..end,
                    needs_quote: false,
                });
                pos = end;
            }
            b'"' => {
                let end = quoted_end(input, pos + 1);
                tokens.push(Token {
                    kind: TokenKind::Quoted,
                    span: pos..end,
                    needs_quote: true,
                });
                pos = end;
            }
            _ => {
                let start = pos;
                while pos < input.len()
                    && !is_blank(input[pos])
                    && !matches!(input[pos], b'(' | b'"')
                    && Some(pos) != angle_open
                {
                    pos += if input[pos] == b'\\' { 2 } else { 1 };
                }
                pos = pos.min(input.len());
                tokens.push(Token {
                    kind: TokenKind::Atom,
                    span: start..pos,
                    needs_quote: atom_needs_quote(&input[start..pos]),
                });
            }
        }
    }
    tokens
}

/// Inner text of a quoted string token, escapes resolved.
fn unquote(raw: &[u8]) -> Vec<u8> {
    let inner = raw.strip_prefix(b"\"").unwrap_or(raw);
    let inner = inner.strip_suffix(b"\"").unwrap_or(inner);
    unescape(inner)
}

fn unescape(inner: &[u8]) -> Vec<u8> {
    let mut ret = Vec::with_capacity(inner.len());
    let mut iter = inner.iter();
    while let Some(&c) = iter.next() {
        if c == b'\\' {
            if let Some(&escaped) = iter.next() {
                ret.push(escaped);
            }
        } else {
            ret.push(c);
        }
    }
    ret
}

/// Inner text of a comment token, without the outer parentheses.
fn comment_text(raw: &[u8]) -> &[u8] {
    let inner = raw.strip_prefix(b"(").unwrap_or(raw);
    inner.strip_suffix(b")").unwrap_or(inner)
}

fn trim_blanks(mut s: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = s {
        if !is_blank(*first) {
            break;
        }
        s = rest;
    }
    while let [rest @ .., last] = s {
        if !is_blank(*last) {
            break;
        }
        s = rest;
    }
    s
}

/// Text of a token as it should appear inside a quoted run.
fn plain_text(input: &[u8], token: &Token) -> Vec<u8> {
    let raw = &input[token.span.clone()];
    match token.kind {
        TokenKind::Quoted => unquote(raw),
        TokenKind::Atom => unescape(raw),
        _ => raw.to_vec(),
    }
}

/// Retokenize `skin.input` and rebuild it with the address last.
///
/// Returns `None` if no address token can be found, that is the field has
/// neither angle brackets nor a word containing `@`.
pub fn reorder(skin: &Skin) -> Option<Reordered> {
    let input = skin.input.as_bytes();
    let mut tokens = tokenize(input, skin.angle.as_ref());

    let addr_idx = match tokens.iter().position(|t| t.kind == TokenKind::Address) {
        Some(idx) => idx,
        None => {
            let idx = tokens.iter().position(|t| {
                t.kind == TokenKind::Atom && input[t.span.clone()].contains(&b'@')
            })?;
            tokens[idx].kind = TokenKind::Address;
            tokens[idx].needs_quote = false;
            idx
        }
    };

    // A quoted string glued to the address is its local part.
    let addr_idx = if addr_idx > 0
        && tokens[addr_idx - 1].kind == TokenKind::Quoted
        && tokens[addr_idx - 1].span.end == tokens[addr_idx].span.start
        && skin.angle.is_none()
    {
        let prev = tokens.remove(addr_idx - 1);
        tokens[addr_idx - 1].span.start = prev.span.start;
        addr_idx - 1
    } else {
        addr_idx
    };

    let address_token = tokens.remove(addr_idx);
    let address = if skin.angle.is_some() {
        skin.skinned.clone()
    } else {
        String::from_utf8_lossy(&input[address_token.span.clone()]).into_owned()
    };

    // Runs of atoms and quoted strings between comments are quoted as a whole
    // if any member needs it.
    let mut phrase_parts: Vec<Vec<u8>> = vec![];
    let mut name_parts: Vec<Vec<u8>> = vec![];
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].kind == TokenKind::Comment {
            let mut comments: Vec<Vec<u8>> = vec![];
            while i < tokens.len() && tokens[i].kind == TokenKind::Comment {
                let text = comment_text(&input[tokens[i].span.clone()]);
                let mut rendered = Vec::with_capacity(text.len() + 2);
                rendered.push(b'(');
                rendered.extend_from_slice(text);
                rendered.push(b')');
                comments.push(rendered);
                let text = trim_blanks(text);
                if !text.is_empty() {
                    name_parts.push(text.to_vec());
                }
                i += 1;
            }
            phrase_parts.push(comments.join(&b' '));
            continue;
        }
        let start = i;
        while i < tokens.len() && tokens[i].kind != TokenKind::Comment {
            i += 1;
        }
        let run = &tokens[start..i];
        let words: Vec<Vec<u8>> = run.iter().map(|t| plain_text(input, t)).collect();
        let joined = words.join(&b' ');
        if run.iter().any(|t| t.needs_quote) {
            let mut quoted = Vec::with_capacity(joined.len() + 2);
            quoted.push(b'"');
            for &c in &joined {
                if matches!(c, b'"' | b'\\') {
                    quoted.push(b'\\');
                }
                quoted.push(c);
            }
            quoted.push(b'"');
            phrase_parts.push(quoted);
        } else {
            phrase_parts.push(joined.clone());
        }
        if !joined.is_empty() {
            name_parts.push(joined);
        }
    }

    let phrase = String::from_utf8_lossy(&phrase_parts.join(&b' ')).into_owned();
    let real_name = if name_parts.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&name_parts.join(&b' ')).into_owned())
    };
    Some(Reordered {
        phrase,
        address,
        real_name,
    })
}
