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

//! Removal of duplicate addresses.

use super::AddressList;
use crate::utils::fold_case;

/// Remove deleted entities and case insensitive duplicates from `list`.
///
/// Duplicates are found by sorting on the folded address and then on the
/// header field (`To` before `Cc` before `Bcc`). Of every group of
/// duplicates the one that comes first in `list` survives, and survivors
/// keep their relative order.
pub fn elide(mut list: AddressList) -> AddressList {
    list.retain(|a| !a.deleted);
    if list.len() <= 1 {
        return list;
    }

    let keys = list
        .iter()
        .map(|a| (fold_case(&a.skinned), a.field))
        .collect::<Vec<_>>();
    let mut sorted = (0..keys.len()).collect::<Vec<usize>>();
    sorted.sort_unstable_by(|&a, &b| keys[a].cmp(&keys[b]).then(a.cmp(&b)));

    let mut keep = vec![false; keys.len()];
    let mut run = 0;
    while run < sorted.len() {
        let name = &keys[sorted[run]].0;
        let mut end = run + 1;
        while end < sorted.len() && keys[sorted[end]].0 == *name {
            end += 1;
        }
        if let Some(&first) = sorted[run..end].iter().min() {
            keep[first] = true;
        }
        run = end;
    }

    let before = list.len();
    let mut i = 0;
    list.retain(|_| {
        let ret = keep[i];
        i += 1;
        ret
    });
    if before != list.len() {
        log::debug!("elide: removed {} duplicate(s)", before - list.len());
    }
    list
}
