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

//! Extraction of the bare `addr-spec` out of one address field ("skinning").
//!
//! ```text
//! >        input
//! > ┌────────┴───────────────────┐
//! > Jane (Doe) <jane@example.com>
//! >             └──────┬───────┘
//! >                  angle
//! ```
//!
//! Comments are dropped, quoted strings are kept verbatim, anything before an
//! opening angle bracket is discarded and the historical ` at ` / ` dot `
//! spellings are folded into `@` and `.`.

use std::ops::Range;

use super::{
    split::{comment_end, is_blank, quoted_end},
    ParseFlags,
};
use crate::utils::into_string;

/// Result of skinning one address field.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Skin {
    /// The input, with a `>` appended if an angle bracket was left open.
    pub input: String,
    /// The bare address, file, pipe or alias name.
    pub skinned: String,
    /// Location of the angle bracketed address inside `input`, brackets
    /// excluded.
    pub angle: Option<Range<usize>>,
    /// A closing angle bracket was appended to `input`.
    pub synthetic_angle: bool,
    /// Skinning was requested; if not, `skinned` is the trimmed input.
    pub skinned_ran: bool,
}

impl Skin {
    /// The input consists of nothing but the skinned value, optionally
    /// enclosed in angle brackets.
    pub fn is_bare(&self) -> bool {
        let t = self.input.trim();
        t == self.skinned
            || t.strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::trim)
                == Some(self.skinned.as_str())
    }

    /// The skin equals the original input verbatim.
    pub fn is_verbatim(&self) -> bool {
        self.input.trim() == self.skinned
    }

    /// Byte offset of the opening angle bracket inside `input`.
    pub fn angle_open(&self) -> Option<usize> {
        self.angle.as_ref().map(|r| r.start - 1)
    }
}

/// Case insensitive test for a blank delimited `word` at `pos`.
fn word_at(input: &[u8], pos: usize, word: &[u8]) -> bool {
    input
        .get(pos..pos + word.len())
        .map(|w| w.eq_ignore_ascii_case(word))
        .unwrap_or(false)
        && input
            .get(pos + word.len())
            .map(|&c| is_blank(c))
            .unwrap_or(false)
}

fn skip_blanks(input: &[u8], mut pos: usize) -> usize {
    while pos < input.len() && is_blank(input[pos]) {
        pos += 1;
    }
    pos
}

/// Skin `text`.
///
/// With [`ParseFlags::LIST`], a comma outside angle brackets becomes a space
/// and an angle bracket that follows it only discards what was copied after
/// that comma, so that a badly delimited list degrades to a best effort
/// result.
pub fn skin(text: &str, flags: ParseFlags) -> Skin {
    if !flags.contains(ParseFlags::SKIN) {
        return Skin {
            input: text.to_string(),
            skinned: text.trim().to_string(),
            angle: None,
            synthetic_angle: false,
            skinned_ran: false,
        };
    }

    let input = text.as_bytes();
    let list = flags.contains(ParseFlags::LIST);
    let mut out: Vec<u8> = Vec::with_capacity(input.len());
    let mut mark = 0_usize;
    let mut pending_space = false;
    let mut open: Option<usize> = None;
    let mut angle: Option<Range<usize>> = None;
    let mut pos = 0_usize;

    macro_rules! flush_space {
        () => {
            if pending_space {
                out.push(b' ');
                pending_space = false;
            }
        };
    }

    while pos < input.len() {
        let c = input[pos];
        match c {
            b'(' => {
                pos = comment_end(input, pos + 1);
            }
            b'"' => {
                flush_space!();
                let end = quoted_end(input, pos + 1);
                out.extend_from_slice(&input[pos..end]);
                pos = end;
            }
            b'<' => {
                open = Some(pos);
                out.truncate(mark);
                pending_space = false;
                pos += 1;
            }
            b'>' => {
                if let Some(lt) = open.take() {
                    angle = Some(lt + 1..pos);
                    pending_space = false;
                    pos += 1;
                    // The rest of this field is not part of the address.
                    while pos < input.len() && !(list && input[pos] == b',') {
                        pos = match input[pos] {
                            b'(' => comment_end(input, pos + 1),
                            b'"' => quoted_end(input, pos + 1),
                            _ => pos + 1,
                        };
                    }
                } else {
                    flush_space!();
                    out.push(c);
                    pos += 1;
                }
            }
            b',' if list && open.is_none() => {
                if out.len() > mark && out.last() != Some(&b' ') {
                    out.push(b' ');
                }
                mark = out.len();
                pending_space = false;
                pos = skip_blanks(input, pos + 1);
            }
            b'@' => {
                pending_space = false;
                out.push(c);
                pos = skip_blanks(input, pos + 1);
            }
            b'\\' => {
                flush_space!();
                out.push(c);
                pos += 1;
                if let Some(&escaped) = input.get(pos) {
                    out.push(escaped);
                    pos += 1;
                }
            }
            _ if is_blank(c) => {
                let next = skip_blanks(input, pos);
                if out.len() > mark && word_at(input, next, b"at") {
                    out.push(b'@');
                    pending_space = false;
                    pos = skip_blanks(input, next + 2);
                } else if out.len() > mark && word_at(input, next, b"dot") {
                    out.push(b'.');
                    pending_space = false;
                    pos = skip_blanks(input, next + 3);
                } else {
                    pending_space = out.len() > mark;
                    pos = next;
                }
            }
            _ => {
                flush_space!();
                out.push(c);
                pos += 1;
            }
        }
    }

    while out.last() == Some(&b' ') {
        out.pop();
    }

    let mut input = text.to_string();
    let mut synthetic_angle = false;
    if let Some(lt) = open {
        // Unmatched `<`: close it so offsets into `input` stay meaningful.
        let end = input.len();
        input.push('>');
        angle = Some(lt + 1..end);
        synthetic_angle = true;
    }

    Skin {
        input,
        skinned: into_string(out),
        angle,
        synthetic_angle,
        skinned_ran: true,
    }
}
