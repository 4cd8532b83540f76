//
// mailnames - alternates module
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

//! Addresses that belong to the user ("alternates") and the "metoo" test
//! built on them.

use indexmap::IndexSet;

use crate::{
    address::{parse_list, parse_one, AddressList, HeaderField, ParseContext, ParseFlags},
    utils::fold_case,
};

/// Local part of `addr`, or `addr` itself if it has no domain.
fn local_part(addr: &str) -> &str {
    addr.rsplit_once('@').map(|(l, _)| l).unwrap_or(addr)
}

fn same_address(a: &str, b: &str, allnet: bool) -> bool {
    if allnet {
        fold_case(local_part(a)) == fold_case(local_part(b))
    } else {
        fold_case(a) == fold_case(b)
    }
}

/// Like [`same_address`], but a bare `name` (one without a domain) also
/// matches the local part of `own`.
fn is_own_address(name: &str, own: &str, allnet: bool) -> bool {
    same_address(name, own, allnet)
        || (!name.contains('@') && fold_case(name) == fold_case(local_part(own)))
}

/// Case-folded set of addresses the user receives mail at.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlternatesSet {
    set: IndexSet<String>,
}

impl AlternatesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding the configured `alternates`.
    pub fn from_settings(ctx: &ParseContext<'_>) -> Self {
        let mut ret = Self::new();
        for alt in &ctx.settings.alternates {
            ret.add(alt, ctx);
        }
        ret
    }

    /// Parse `text` and add every valid address in it. Returns how many
    /// addresses were new.
    pub fn add(&mut self, text: &str, ctx: &ParseContext<'_>) -> usize {
        let mut added = 0;
        for a in parse_list(text, HeaderField::Other, ParseFlags::RECIPIENT, ctx).iter() {
            if !a.is_expandable() {
                log::warn!("alternates: ignoring invalid address {:?}", a.raw);
                continue;
            }
            if self.set.insert(fold_case(&a.skinned)) {
                added += 1;
            }
        }
        added
    }

    pub fn clear(&mut self) {
        self.set.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.set.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.set.contains(&fold_case(addr))
    }

    /// Whether `name` is the user: their login name, one of the configured
    /// `from`, `sender` or (with `reply_to_is_me`) `reply_to` addresses, or a
    /// member of this set.
    pub fn is_metoo(&self, name: &str, ctx: &ParseContext<'_>) -> bool {
        let settings = ctx.settings;
        let allnet = settings.allnet;
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        if let Some(login) = ctx.login() {
            if same_address(name, &login, allnet) {
                return true;
            }
            if let Some(host) = ctx.hostname() {
                if same_address(name, &format!("{}@{}", login, host), allnet) {
                    return true;
                }
            }
        }

        let reply_to: &[String] = if settings.reply_to_is_me {
            &settings.reply_to
        } else {
            &[]
        };
        let own = settings
            .from
            .iter()
            .chain(settings.sender.iter())
            .chain(reply_to.iter());
        for text in own {
            if let Some(a) = parse_one(text, HeaderField::From, ParseFlags::RECIPIENT, ctx) {
                if a.is_valid() && is_own_address(name, &a.skinned, allnet) {
                    return true;
                }
            }
        }

        self.contains(name) || self.set.iter().any(|alt| is_own_address(name, alt, allnet))
    }

    /// Remove the user's own addresses from `list`.
    ///
    /// With `keep_one_if_none`, a list that consists of nothing but the user
    /// keeps its first entity instead of becoming empty.
    pub fn remove(
        &self,
        mut list: AddressList,
        keep_one_if_none: bool,
        ctx: &ParseContext<'_>,
    ) -> AddressList {
        let dropped = list
            .iter()
            .map(|a| a.is_expandable() && self.is_metoo(&a.skinned, ctx))
            .collect::<Vec<bool>>();
        let Some(first) = dropped.iter().position(|d| *d) else {
            return list;
        };
        let keep_first = keep_one_if_none && dropped.iter().all(|d| *d);

        let mut i = 0;
        list.retain(|_| {
            let keep = !dropped[i] || (keep_first && i == first);
            i += 1;
            keep
        });
        log::debug!(
            "alternates: removed {} of the user's own address(es)",
            dropped.iter().filter(|d| **d).count() - usize::from(keep_first)
        );
        list
    }
}
