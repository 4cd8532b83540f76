//
// mailnames - alias module
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

//! User defined aliases.
//!
//! An alias maps a name to a list of targets. Targets that are themselves
//! alias names are expanded recursively, up to a depth limit:
//!
//! ```text
//! alias team alice, bob@example.com, \carol
//! ```
//!
//! A target written with a leading backslash is never expanded further.

use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{space0, space1},
    combinator::{eof, map, rest, verify},
    multi::separated_list1,
    IResult,
};
use smallvec::SmallVec;

use crate::{
    address::{
        parse_one,
        split::{AddressSplitter, SplitMode},
        validate::is_alias_name,
        AddressKind, AddressList, HeaderField, ParseContext, ParseFlags,
    },
    alternates::AlternatesSet,
    conf::MAX_ALIAS_EXPANSION,
    error::{Error, ErrorKind, Result},
    utils::fold_case,
};


/// One target of an alias.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AliasTarget {
    /// The skinned target.
    pub short: String,
    /// The target as written, if it differs from `short`.
    pub full: Option<String>,
    /// The target is a bare name and may refer to another alias.
    pub is_name: bool,
    /// Expansion may recurse into this target.
    pub recurse: bool,
}

impl AliasTarget {
    fn text(&self) -> &str {
        self.full.as_deref().unwrap_or(&self.short)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AliasEntry {
    pub name: String,
    pub targets: SmallVec<[AliasTarget; 4]>,
}

/// An `alias` or `unalias` command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AliasCommand {
    Define { name: String, targets: String },
    /// Names to remove; `*` removes all.
    Undefine(Vec<String>),
}

fn define_command(input: &str) -> IResult<&str, AliasCommand> {
    let (input, _) = tag("alias")(input)?;
    let (input, _) = space1(input)?;
    let (input, name) = is_not(" \t")(input)?;
    let (input, _) = space1(input)?;
    let (input, targets) = verify(rest, |s: &str| !s.trim().is_empty())(input)?;
    Ok((
        input,
        AliasCommand::Define {
            name: name.to_string(),
            targets: targets.trim().to_string(),
        },
    ))
}

fn undefine_command(input: &str) -> IResult<&str, AliasCommand> {
    let (input, _) = tag("unalias")(input)?;
    let (input, _) = space1(input)?;
    let (input, names) = map(separated_list1(space1, is_not(" \t")), |names: Vec<&str>| {
        names.into_iter().map(str::to_string).collect::<Vec<String>>()
    })(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, AliasCommand::Undefine(names)))
}

/// Parse an `alias <name> <targets>` or `unalias <name>... | *` line.
pub fn parse_alias_command(line: &str) -> Result<AliasCommand> {
    let (_, command) = alt((define_command, undefine_command))(line.trim()).map_err(|err| {
        Error::from(err)
            .set_summary(format!("Could not parse alias command {:?}", line))
            .set_kind(ErrorKind::ValueError)
    })?;
    Ok(command)
}

/// Name to targets dictionary. Lookups are case insensitive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AliasStore {
    entries: IndexMap<String, AliasEntry>,
    max_expansion: usize,
}

impl Default for AliasStore {
    fn default() -> Self {
        Self::new(MAX_ALIAS_EXPANSION)
    }
}

impl AliasStore {
    pub fn new(max_expansion: usize) -> Self {
        Self {
            entries: IndexMap::default(),
            max_expansion,
        }
    }

    /// A store holding the configured aliases.
    pub fn from_settings(ctx: &ParseContext<'_>) -> Result<Self> {
        let mut ret = Self::new(ctx.settings.max_alias_expansion);
        for (name, targets) in &ctx.settings.aliases {
            ret.define(name, targets, ctx)?;
        }
        Ok(ret)
    }

    pub fn max_expansion(&self) -> usize {
        self.max_expansion
    }

    /// Define `name`, replacing any previous definition.
    ///
    /// Every item of `targets` may hold several comma separated targets.
    /// Invalid targets are skipped; a definition without any valid target is
    /// an error.
    pub fn define<I, S>(&mut self, name: &str, targets: I, ctx: &ParseContext<'_>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !is_alias_name(name) {
            return Err(Error::new(format!("Invalid alias name {:?}", name))
                .set_kind(ErrorKind::ValueError));
        }
        let mut list: SmallVec<[AliasTarget; 4]> = SmallVec::new();
        for item in targets {
            for piece in AddressSplitter::new(item.as_ref(), SplitMode::Auto) {
                let (text, recurse) = match piece.strip_prefix('\\') {
                    Some(text) => (text, false),
                    None => (piece.as_str(), true),
                };
                let Some(addr) = parse_one(text, HeaderField::Other, ParseFlags::RECIPIENT, ctx)
                else {
                    continue;
                };
                if let Some(err) = addr.error {
                    log::warn!("alias {}: skipping invalid target {:?}: {}", name, text, err);
                    continue;
                }
                let short = addr.skinned;
                if list
                    .iter()
                    .any(|t| fold_case(&t.short) == fold_case(&short))
                {
                    continue;
                }
                let full = (addr.display != short && !addr.display.is_empty())
                    .then_some(addr.display);
                list.push(AliasTarget {
                    is_name: addr.kind == AddressKind::AliasName,
                    short,
                    full,
                    recurse,
                });
            }
        }
        if list.is_empty() {
            return Err(
                Error::new(format!("Alias {:?} has no valid targets", name))
                    .set_kind(ErrorKind::ValueError),
            );
        }
        log::debug!("alias {}: {} target(s)", name, list.len());
        self.entries.insert(
            fold_case(name),
            AliasEntry {
                name: name.to_string(),
                targets: list,
            },
        );
        Ok(())
    }

    /// Remove `name`, or every alias if `name` is `*`.
    pub fn undefine(&mut self, name: &str) -> Result<()> {
        if name == "*" {
            self.clear();
            return Ok(());
        }
        match self.entries.shift_remove(&fold_case(name)) {
            Some(_) => Ok(()),
            None => Err(Error::new(format!("No such alias {:?}", name))
                .set_kind(ErrorKind::NotFound)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AliasEntry> {
        self.entries.get(&fold_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `name` as an `alias` command line.
    pub fn display_alias(&self, name: &str) -> Option<String> {
        let entry = self.get(name)?;
        let targets = entry
            .targets
            .iter()
            .map(|t| {
                if t.recurse {
                    t.text().to_string()
                } else {
                    format!("\\{}", t.text())
                }
            })
            .collect::<Vec<String>>();
        Some(format!("alias {} {}", entry.name, targets.join(", ")))
    }

    /// Expand `name` into the addresses it stands for.
    ///
    /// Unless `force_metoo` is set, targets that are the user's own
    /// addresses are left out. A name that is not an alias expands to
    /// itself.
    pub fn expand(
        &self,
        name: &str,
        force_metoo: bool,
        alternates: &AlternatesSet,
        ctx: &ParseContext<'_>,
    ) -> AddressList {
        let mut ret = AddressList::new();
        self.expand_into(0, &mut ret, name, force_metoo, alternates, ctx);
        ret
    }

    fn leaf(acc: &mut AddressList, text: &str, ctx: &ParseContext<'_>) {
        acc.extend(parse_one(
            text,
            HeaderField::Other,
            ParseFlags::RECIPIENT,
            ctx,
        ));
    }

    fn expand_into(
        &self,
        level: usize,
        acc: &mut AddressList,
        name: &str,
        force_metoo: bool,
        alternates: &AlternatesSet,
        ctx: &ParseContext<'_>,
    ) {
        if level >= self.max_expansion {
            log::warn!(
                "alias {}: expansion reached depth limit {}",
                name,
                self.max_expansion
            );
            Self::leaf(acc, name, ctx);
            return;
        }
        let Some(entry) = self.get(name) else {
            Self::leaf(acc, name, ctx);
            return;
        };
        for target in &entry.targets {
            if target.is_name
                && target.recurse
                && fold_case(&target.short) != fold_case(&entry.name)
                && self.get(&target.short).is_some()
            {
                self.expand_into(level + 1, acc, &target.short, force_metoo, alternates, ctx);
            } else if !force_metoo && alternates.is_metoo(&target.short, ctx) {
                log::debug!("alias {}: leaving out {:?}", entry.name, target.short);
            } else {
                Self::leaf(acc, target.text(), ctx);
            }
        }
    }

    /// Replace every alias in `list` with its expansion, in place.
    pub fn expand_list(
        &self,
        mut list: AddressList,
        force_metoo: bool,
        alternates: &AlternatesSet,
        ctx: &ParseContext<'_>,
    ) -> AddressList {
        for handle in list.handles().to_vec() {
            let (name, field) = match list.get(handle) {
                Some(a) if a.is_expandable() && self.get(&a.skinned).is_some() => {
                    (a.skinned.clone(), a.field)
                }
                _ => continue,
            };
            let mut expansion = self.expand(&name, force_metoo, alternates, ctx);
            for a in expansion.iter_mut() {
                a.field = field;
            }
            list.replace(handle, expansion);
        }
        list
    }

    /// Execute `command`.
    pub fn apply(&mut self, command: &AliasCommand, ctx: &ParseContext<'_>) -> Result<()> {
        match command {
            AliasCommand::Define { name, targets } => self.define(name, [targets], ctx),
            AliasCommand::Undefine(names) => {
                for name in names {
                    self.undefine(name)?;
                }
                Ok(())
            }
        }
    }
}
