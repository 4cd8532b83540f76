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

//! Classification and grammar checks of skinned values.

use std::ops::Range;

use super::{split::is_blank, AddressError, AddressKind, ParseContext};

/// Outcome of the byte walk over a skinned value that contains an `@`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AddrSpec {
    /// Offset of the `@` separating local part and domain.
    pub at: usize,
    /// The domain contains bytes that only IDNA conversion can make valid.
    pub needs_idna: bool,
}

/// Result of [`classify`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classified {
    pub kind: AddressKind,
    pub error: Option<AddressError>,
    /// The classified value; differs from the input only if a local domain
    /// was appended.
    pub skinned: String,
    pub domain: Option<Range<usize>>,
    pub needs_idna: bool,
    pub domain_synthesized: bool,
}

impl Classified {
    fn new(kind: AddressKind, skinned: &str) -> Self {
        Self {
            kind,
            error: None,
            skinned: skinned.to_string(),
            domain: None,
            needs_idna: false,
            domain_synthesized: false,
        }
    }

    fn with_error(mut self, err: AddressError) -> Self {
        self.error = Some(err);
        self
    }
}

/// The character that starts at byte `i`, for error reports.
pub(crate) fn char_at(s: &str, i: usize) -> char {
    s.get(i..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or_else(|| char::from(s.as_bytes()[i]))
}

#[inline(always)]
const fn is_structural(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b':' | b';' | b',' | b'\\'
    )
}

#[inline(always)]
const fn is_control_or_high(c: u8) -> bool {
    c < 0x20 || c >= 0x7f
}

/// Walk `s` byte by byte against the `addr-spec` grammar.
///
/// Returns `Ok(None)` if no `@` was seen at all. Bytes outside of printable
/// ASCII are tolerated inside the domain when `idna` is set and reported in
/// [`AddrSpec::needs_idna`]. A domain literal (`[...]`) takes any byte but a
/// backslash or whitespace, and nothing may follow its closing `]`.
pub fn check_addr_spec(s: &str, idna: bool) -> Result<Option<AddrSpec>, AddressError> {
    let bytes = s.as_bytes();
    let mut in_quote = false;
    let mut at: Option<usize> = None;
    let mut in_literal = false;
    let mut literal_closed = false;
    let mut needs_idna = false;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if in_quote {
            match c {
                b'\\' => i += 1,
                b'"' => in_quote = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        if let Some(at) = at {
            if literal_closed {
                return Err(AddressError::BadChar(char_at(s, i)));
            }
            if in_literal {
                match c {
                    b']' => {
                        in_literal = false;
                        literal_closed = true;
                    }
                    b'\\' => return Err(AddressError::BadChar('\\')),
                    _ if is_blank(c) || c.is_ascii_whitespace() => {
                        return Err(AddressError::BadChar(char::from(c)))
                    }
                    _ if is_control_or_high(c) && !idna => {
                        return Err(AddressError::BadChar(char_at(s, i)))
                    }
                    _ => {}
                }
            } else if c == b'[' && i == at + 1 {
                in_literal = true;
            } else if is_control_or_high(c) {
                if !idna {
                    return Err(AddressError::BadChar(char_at(s, i)));
                }
                needs_idna = true;
            } else if c == b'@' {
                return Err(AddressError::BadAtSequence('@'));
            } else if is_structural(c) || is_blank(c) || c == b'"' {
                return Err(AddressError::BadChar(char::from(c)));
            }
            i += 1;
            continue;
        }
        match c {
            b'"' => in_quote = true,
            b'@' if i == 0 => return Err(AddressError::BadAtSequence('@')),
            b'@' => at = Some(i),
            _ if is_control_or_high(c) => return Err(AddressError::BadChar(char_at(s, i))),
            _ if is_structural(c) || is_blank(c) => {
                return Err(AddressError::BadChar(char::from(c)))
            }
            _ => {}
        }
        i += 1;
    }
    if in_quote {
        return Err(AddressError::BadChar('"'));
    }
    if in_literal {
        return Err(AddressError::BadChar('['));
    }
    match at {
        None => Ok(None),
        Some(at) if at + 1 == bytes.len() => Err(AddressError::BadAtSequence('@')),
        Some(at) => Ok(Some(AddrSpec { at, needs_idna })),
    }
}

/// Whether `name` is acceptable as an alias name: letters, digits, `_`,
/// `-`, `#`, `:`, `@`, `!`, `.`, non-ASCII characters and a single trailing
/// `$`, not starting with `-`.
pub fn is_alias_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes[0] == b'-' {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &c)| match c {
        b'$' => i + 1 == bytes.len() && i > 0,
        b'_' | b'-' | b'#' | b':' | b'@' | b'!' | b'.' => true,
        _ => c.is_ascii_alphanumeric() || c >= 0x80,
    })
}

/// Classify and validate the skinned value `skinned`.
///
/// - `verbatim`: the skin equals the original input.
/// - `bracketed`: the value was found inside angle brackets.
pub fn classify(
    skinned: &str,
    verbatim: bool,
    bracketed: bool,
    idna: bool,
    ctx: &ParseContext<'_>,
) -> Classified {
    let t = skinned.trim();
    if t.is_empty() {
        return Classified::new(AddressKind::Address, t).with_error(AddressError::Empty);
    }
    if t.starts_with('|') {
        return Classified::new(AddressKind::Pipe, t);
    }
    if t == "-" || t.starts_with('/') || t.starts_with("./") {
        return Classified::new(AddressKind::File, t);
    }

    if verbatim && !bracketed && !t.contains('@') && is_alias_name(t) {
        return Classified::new(AddressKind::AliasName, t);
    }

    match check_addr_spec(t, idna) {
        Err(err) => Classified::new(AddressKind::Address, t).with_error(err),
        Ok(Some(spec)) => Classified {
            domain: Some(spec.at + 1..t.len()),
            needs_idna: spec.needs_idna,
            ..Classified::new(AddressKind::Address, t)
        },
        Ok(None) if verbatim && !bracketed => {
            let ret = Classified::new(AddressKind::AliasName, t);
            if is_alias_name(t) {
                ret
            } else {
                ret.with_error(AddressError::BadAliasName)
            }
        }
        Ok(None) if bracketed && ctx.host.is_local_user(t) => match ctx.hostname() {
            Some(host) => {
                let synthesized = format!("{}@{}", t, host);
                let mut ret = classify(&synthesized, false, false, idna, ctx);
                ret.domain_synthesized = ret.error.is_none();
                ret
            }
            None => Classified::new(AddressKind::Address, t)
                .with_error(AddressError::BadAtSequence('@')),
        },
        Ok(None) => {
            Classified::new(AddressKind::Address, t).with_error(AddressError::BadAtSequence('@'))
        }
    }
}
