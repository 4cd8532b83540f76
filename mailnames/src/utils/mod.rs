//
// mailnames - utils module
//
// Copyright 2017 Manos Pitsidianakis
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

//! Utility modules for general use.

pub mod logging;

/// Turn bytes that were copied out of a `str` back into a `String`.
///
/// The address routines only ever cut at ASCII delimiters, so the input is
/// expected to be valid UTF-8; anything else is replaced lossily.
pub fn into_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Case-folded comparison key of an address or name.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}
