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

//! Cutting a free-form line into per-address pieces.

use crate::utils::into_string;

#[inline(always)]
pub(crate) const fn is_blank(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

/// Index just past the `)` that closes the comment whose content begins at
/// `start`, honouring nesting and backslash escapes. Returns `input.len()`
/// for unterminated comments.
pub(crate) fn comment_end(input: &[u8], start: usize) -> usize {
    let mut depth = 1_usize;
    let mut i = start;
    while i < input.len() {
        match input[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    input.len()
}

/// Index just past the `"` that closes the quoted string whose content
/// begins at `start`. Returns `input.len()` for unterminated strings.
pub(crate) fn quoted_end(input: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < input.len() {
        match input[i] {
            b'\\' => i += 1,
            b'"' => return i + 1,
            _ => {}
        }
        i += 1;
    }
    input.len()
}

/// How [`AddressSplitter`] separates addresses.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SplitMode {
    /// [`SplitMode::Comma`] if the line contains any of `, " \ ( <`,
    /// [`SplitMode::Whitespace`] otherwise.
    #[default]
    Auto,
    /// Addresses are separated by commas, comments are kept.
    Comma,
    /// Addresses are separated by blanks or commas, comments are dropped.
    Whitespace,
    /// The whole line is one address, comments are kept.
    Single,
}

impl SplitMode {
    pub fn resolve(self, line: &str) -> Self {
        match self {
            Self::Auto
                if line
                    .bytes()
                    .any(|b| matches!(b, b',' | b'"' | b'\\' | b'(' | b'<')) =>
            {
                Self::Comma
            }
            Self::Auto => Self::Whitespace,
            other => other,
        }
    }
}

/// Lazy sequence of address substrings of a line.
///
/// Quoted strings and comments are copied verbatim (comments only if the
/// mode keeps them), blank runs collapse into a single space and leading or
/// trailing blanks are dropped.
///
/// ```rust
/// # use mailnames::address::split::{AddressSplitter, SplitMode};
/// let parts = AddressSplitter::new(
///     r#"Jane <jane@example.com>,  "Doe, John"   <john@example.com>"#,
///     SplitMode::Auto,
/// )
/// .collect::<Vec<String>>();
/// assert_eq!(
///     parts,
///     vec![
///         "Jane <jane@example.com>".to_string(),
///         r#""Doe, John" <john@example.com>"#.to_string(),
///     ]
/// );
/// ```
#[derive(Clone, Debug)]
pub struct AddressSplitter<'a> {
    input: &'a [u8],
    pos: usize,
    separators: &'static [u8],
    keep_comments: bool,
}

impl<'a> AddressSplitter<'a> {
    pub fn new(line: &'a str, mode: SplitMode) -> Self {
        let (separators, keep_comments): (&'static [u8], bool) = match mode.resolve(line) {
            SplitMode::Comma | SplitMode::Auto => (b",", true),
            SplitMode::Whitespace => (b" \t\r\n,", false),
            SplitMode::Single => (b"", true),
        };
        Self {
            input: line.as_bytes(),
            pos: 0,
            separators,
            keep_comments,
        }
    }

    fn next_piece(&mut self) -> Option<Vec<u8>> {
        let input = self.input;
        while self.pos < input.len()
            && (is_blank(input[self.pos]) || self.separators.contains(&input[self.pos]))
        {
            self.pos += 1;
        }
        if self.pos >= input.len() {
            return None;
        }

        let mut out = Vec::with_capacity(input.len() - self.pos);
        let mut pending_space = false;
        macro_rules! flush_space {
            () => {
                if pending_space {
                    out.push(b' ');
                    pending_space = false;
                }
            };
        }
        while self.pos < input.len() {
            let c = input[self.pos];
            match c {
                b'"' => {
                    flush_space!();
                    let end = quoted_end(input, self.pos + 1);
                    out.extend_from_slice(&input[self.pos..end]);
                    self.pos = end;
                }
                b'(' => {
                    let end = comment_end(input, self.pos + 1);
                    if self.keep_comments {
                        flush_space!();
                        out.extend_from_slice(&input[self.pos..end]);
                    }
                    self.pos = end;
                }
                b'\\' => {
                    flush_space!();
                    out.push(c);
                    self.pos += 1;
                    if let Some(&escaped) = input.get(self.pos) {
                        out.push(escaped);
                        self.pos += 1;
                    }
                }
                _ if self.separators.contains(&c) => {
                    self.pos += 1;
                    break;
                }
                _ if is_blank(c) => {
                    pending_space = !out.is_empty();
                    self.pos += 1;
                }
                _ => {
                    flush_space!();
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
        Some(out)
    }
}

impl Iterator for AddressSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let piece = self.next_piece()?;
            if !piece.is_empty() {
                return Some(into_string(piece));
            }
        }
    }
}

impl std::iter::FusedIterator for AddressSplitter<'_> {}
