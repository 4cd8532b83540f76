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

//! Conversion of internationalized domains to their ASCII compatible
//! encoding ([RFC5891](https://tools.ietf.org/html/rfc5891)).

use std::ops::Range;

use super::AddressError;

/// A skinned address whose domain was converted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Converted {
    pub skinned: String,
    pub domain: Range<usize>,
}

/// Convert the domain at `domain` inside `skinned`.
///
/// Returns `Ok(None)` if the domain is printable ASCII or a domain literal
/// and needs no conversion.
pub fn to_ascii(skinned: &str, domain: Range<usize>) -> Result<Option<Converted>, AddressError> {
    let Some(name) = skinned.get(domain.clone()) else {
        return Err(AddressError::BadIdna);
    };
    if name.starts_with('[') || name.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return Ok(None);
    }
    if name.bytes().any(|b| b < 0x20 || b == 0x7f) {
        return Err(AddressError::BadIdna);
    }
    let ascii = match ::idna::domain_to_ascii(name) {
        Ok(ascii) => ascii,
        Err(err) => {
            log::debug!("IDNA conversion of {:?} failed: {:?}", name, err);
            return Err(AddressError::BadIdna);
        }
    };
    if ascii.is_empty() || !ascii.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(AddressError::BadIdna);
    }
    let mut ret = String::with_capacity(domain.start + ascii.len());
    ret.push_str(&skinned[..domain.start]);
    ret.push_str(&ascii);
    let domain = domain.start..ret.len();
    log::debug!("IDNA: {:?} -> {:?}", skinned, ret);
    Ok(Some(Converted {
        skinned: ret,
        domain,
    }))
}
