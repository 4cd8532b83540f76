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

//! Parsing of free-form address fields into lists of [`Address`] entities.
//!
//! ```rust
//! # use mailnames::{address::*, conf::AddressSettings, host::StaticHost};
//! let settings = AddressSettings::default();
//! let host = StaticHost::default();
//! let ctx = ParseContext::new(&settings).with_host(&host);
//! let list = parse_list(
//!     "Jane (Doe) <jane@example.com>, bob@example.com",
//!     HeaderField::To,
//!     ParseFlags::RECIPIENT,
//!     &ctx,
//! );
//! assert_eq!(list.len(), 2);
//! let jane = list.first().unwrap();
//! assert_eq!(jane.skinned, "jane@example.com");
//! assert_eq!(jane.domain(), Some("example.com"));
//! ```

use std::{fmt, ops::Range, str::FromStr};

use crate::{
    conf::{AddressSettings, CheckPolicy},
    error::{Error, ErrorKind, Result},
    host::{HeaderDecoder, HostEnvironment, PlainDecoder, SystemHost},
};

pub mod elide;
pub mod idna;
pub mod reorder;
pub mod skin;
pub mod split;
pub mod validate;

#[cfg(test)]
mod tests;

pub use elide::elide;
use split::{AddressSplitter, SplitMode};

/// What an entity's `skinned` value designates.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AddressKind {
    /// A mailbox path (`/…`, `./…` or `-`).
    File,
    /// A command to pipe the message to (`|…`).
    Pipe,
    /// A bare name, to be resolved through the alias store.
    AliasName,
    #[default]
    Address,
}

/// Why an entity is invalid. Entities carry at most one of these.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AddressError {
    Empty,
    BadAtSequence(char),
    BadChar(char),
    BadIdna,
    BadAliasName,
}

impl fmt::Display for AddressError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Empty => write!(fmt, "empty address"),
            Self::BadAtSequence(c) => write!(fmt, "bad '{}' sequence", c),
            Self::BadChar(c) => write!(fmt, "bad character {:?}", c),
            Self::BadIdna => write!(fmt, "bad international domain name"),
            Self::BadAliasName => write!(fmt, "bad alias name"),
        }
    }
}

impl std::error::Error for AddressError {}

/// The header an entity was parsed out of.
///
/// The declaration order is the precedence used by [`elide`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HeaderField {
    To,
    Cc,
    Bcc,
    From,
    Sender,
    ReplyTo,
    MailFollowupTo,
    #[default]
    Other,
}

impl HeaderField {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::To => "To",
            Self::Cc => "Cc",
            Self::Bcc => "Bcc",
            Self::From => "From",
            Self::Sender => "Sender",
            Self::ReplyTo => "Reply-To",
            Self::MailFollowupTo => "Mail-Followup-To",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

impl FromStr for HeaderField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "to" => Self::To,
            "cc" => Self::Cc,
            "bcc" => Self::Bcc,
            "from" => Self::From,
            "sender" => Self::Sender,
            "reply-to" | "reply_to" => Self::ReplyTo,
            "mail-followup-to" | "mail_followup_to" => Self::MailFollowupTo,
            "other" => Self::Other,
            _ => {
                return Err(Error::new(format!("Unknown header field {:?}", s))
                    .set_kind(ErrorKind::ValueError))
            }
        })
    }
}

bitflags! {
    /// Options of [`parse_list`] and [`parse_one`].
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ParseFlags: u8 {
        /// Extract and validate the bare address.
        const SKIN       = 0b0000_0001;
        /// Commas outside angle brackets separate addresses inside one field.
        const LIST       = 0b0000_0010;
        /// Fill [`Address::display_extra`].
        const FULL_EXTRA = 0b0000_0100;
        /// The whole text is one field.
        const SINGLE     = 0b0000_1000;
        /// Never convert internationalized domains.
        const NO_IDNA    = 0b0001_0000;
        /// Flags for recipient headers.
        const RECIPIENT  = Self::SKIN.bits() | Self::LIST.bits();
    }
}

/// One parsed addressee.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Address {
    /// The text this entity was parsed from.
    pub raw: String,
    /// The bare `addr-spec`, file, pipe command or alias name.
    pub skinned: String,
    /// Full representation for display and headers.
    pub display: String,
    /// The free text name, if requested with [`ParseFlags::FULL_EXTRA`].
    pub display_extra: Option<String>,
    pub kind: AddressKind,
    pub error: Option<AddressError>,
    pub field: HeaderField,
    /// Byte range of the domain inside `skinned`, only for valid
    /// [`AddressKind::Address`] entities.
    pub domain: Option<Range<usize>>,
    /// The domain in `skinned` is the ASCII form of an internationalized
    /// domain; `display` keeps the original one.
    pub idna_applied: bool,
    /// Caller-set mark, consumed by [`elide`].
    pub deleted: bool,
}

impl Address {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_ref().and_then(|r| self.skinned.get(r.clone()))
    }

    pub fn local_part(&self) -> Option<&str> {
        self.domain
            .as_ref()
            .and_then(|r| self.skinned.get(..r.start.checked_sub(1)?))
    }

    /// Whether this entity takes part in alias and alternates processing.
    pub fn is_expandable(&self) -> bool {
        self.is_valid() && matches!(self.kind, AddressKind::Address | AddressKind::AliasName)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.display.is_empty() {
            write!(fmt, "{}", self.skinned)
        } else {
            write!(fmt, "{}", self.display)
        }
    }
}

/// Stable reference to an entity of an [`AddressList`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct AddrHandle(usize);

/// An ordered list of [`Address`] entities.
///
/// Entities live in an arena and the list order is kept as a separate vector
/// of handles; a handle stays valid until its entity is removed.
#[derive(Clone, Default)]
pub struct AddressList {
    arena: Vec<Option<Address>>,
    order: Vec<AddrHandle>,
}

impl AddressList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, address: Address) -> AddrHandle {
        let handle = AddrHandle(self.arena.len());
        self.arena.push(Some(address));
        self.order.push(handle);
        handle
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, handle: AddrHandle) -> Option<&Address> {
        self.arena.get(handle.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: AddrHandle) -> Option<&mut Address> {
        self.arena.get_mut(handle.0).and_then(Option::as_mut)
    }

    /// Handles in list order.
    pub fn handles(&self) -> &[AddrHandle] {
        &self.order
    }

    pub fn first(&self) -> Option<&Address> {
        self.order.first().and_then(|h| self.get(*h))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> + '_ {
        self.order
            .iter()
            .filter_map(move |h| self.arena[h.0].as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Address> + '_ {
        let mut slots = self
            .arena
            .iter_mut()
            .map(Option::as_mut)
            .collect::<Vec<Option<&mut Address>>>();
        self.order
            .iter()
            .filter_map(move |h| slots.get_mut(h.0).and_then(Option::take))
    }

    /// Move all entities of `other` to the end of this list.
    pub fn append(&mut self, other: Self) {
        for address in other {
            self.push(address);
        }
    }

    /// Keep only the entities for which `keep` returns `true`. `keep` is
    /// called once per entity, in list order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Address) -> bool,
    {
        let arena = &mut self.arena;
        self.order.retain(|h| {
            let kept = arena[h.0].as_ref().map(&mut keep).unwrap_or(false);
            if !kept {
                arena[h.0] = None;
            }
            kept
        });
    }

    /// Remove the entity at `handle` and put the entities of `other` in its
    /// place. Returns the removed entity.
    pub fn replace(&mut self, handle: AddrHandle, other: Self) -> Option<Address> {
        let pos = self.order.iter().position(|h| *h == handle)?;
        let removed = self.arena[handle.0].take();
        let mut handles = Vec::with_capacity(other.len());
        for address in other {
            let new = AddrHandle(self.arena.len());
            self.arena.push(Some(address));
            handles.push(new);
        }
        drop(self.order.splice(pos..pos + 1, handles));
        removed
    }

    /// Render the list as the body of an address header.
    pub fn to_header_value(&self) -> String {
        self.iter()
            .filter(|a| !a.deleted)
            .map(|a| a.to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

impl fmt::Debug for AddressList {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for AddressList {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for AddressList {}

impl IntoIterator for AddressList {
    type Item = Address;
    type IntoIter = std::vec::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        let mut arena = self.arena;
        self.order
            .into_iter()
            .filter_map(|h| arena.get_mut(h.0).and_then(Option::take))
            .collect::<Vec<Address>>()
            .into_iter()
    }
}

impl FromIterator<Address> for AddressList {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        let mut ret = Self::new();
        for address in iter {
            ret.push(address);
        }
        ret
    }
}

impl Extend<Address> for AddressList {
    fn extend<I: IntoIterator<Item = Address>>(&mut self, iter: I) {
        for address in iter {
            self.push(address);
        }
    }
}

/// Everything address parsing consults besides its input.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub settings: &'a AddressSettings,
    pub host: &'a dyn HostEnvironment,
    pub decoder: &'a dyn HeaderDecoder,
}

impl<'a> ParseContext<'a> {
    /// A context backed by the running system and identity decoding.
    pub fn new(settings: &'a AddressSettings) -> Self {
        Self {
            settings,
            host: &SystemHost,
            decoder: &PlainDecoder,
        }
    }

    pub fn with_host(self, host: &'a dyn HostEnvironment) -> Self {
        Self { host, ..self }
    }

    pub fn with_decoder(self, decoder: &'a dyn HeaderDecoder) -> Self {
        Self { decoder, ..self }
    }

    /// Domain appended to bracketed local user names.
    pub fn hostname(&self) -> Option<String> {
        self.settings
            .hostname
            .clone()
            .filter(|h| !h.is_empty())
            .or_else(|| self.host.hostname())
    }

    /// The user's login name.
    pub fn login(&self) -> Option<String> {
        self.settings
            .login
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| self.host.login_name())
    }
}

impl fmt::Debug for ParseContext<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct(stringify!(ParseContext))
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn build(raw: &str, field: HeaderField, flags: ParseFlags, ctx: &ParseContext<'_>) -> Address {
    let idna = ctx.settings.idna && !flags.contains(ParseFlags::NO_IDNA);
    let skin = skin::skin(raw, flags);

    if !skin.skinned_ran {
        let error = skin.skinned.is_empty().then_some(AddressError::Empty);
        return Address {
            raw: raw.to_string(),
            display: ctx.decoder.decode(&skin.skinned),
            skinned: skin.skinned,
            error,
            field,
            ..Address::default()
        };
    }

    let mut class = validate::classify(
        &skin.skinned,
        skin.is_verbatim(),
        skin.angle.is_some(),
        idna,
        ctx,
    );
    let mut rendered: Option<String> = None;
    let mut real_name: Option<String> = None;
    if class.kind == AddressKind::Address
        && class.error != Some(AddressError::Empty)
        && (class.error.is_some() || !skin.is_bare())
    {
        if let Some(reordered) = reorder::reorder(&skin) {
            class = validate::classify(&reordered.address, false, true, idna, ctx);
            let full = reordered.render(&class.skinned);
            log::debug!("reordered {:?} into {:?}", raw, full);
            rendered = Some(full);
            real_name = reordered.real_name;
        }
    }

    let display = match rendered {
        Some(full) => ctx.decoder.decode(&full),
        None if class.error.is_some() => ctx.decoder.decode(raw.trim()),
        None => ctx.decoder.decode(&class.skinned),
    };
    let display_extra = if flags.contains(ParseFlags::FULL_EXTRA) {
        real_name.map(|n| ctx.decoder.decode(&n))
    } else {
        None
    };

    let mut address = Address {
        raw: raw.to_string(),
        skinned: class.skinned,
        display,
        display_extra,
        kind: class.kind,
        error: class.error,
        field,
        domain: class.domain,
        idna_applied: false,
        deleted: false,
    };

    if address.error.is_none() && class.needs_idna {
        if let Some(domain) = address.domain.clone() {
            match idna::to_ascii(&address.skinned, domain) {
                Ok(Some(converted)) => {
                    address.skinned = converted.skinned;
                    address.domain = Some(converted.domain);
                    address.idna_applied = true;
                }
                Ok(None) => {}
                Err(err) => {
                    address.error = Some(err);
                    address.domain = None;
                }
            }
        }
    }
    if address.error.is_some() {
        address.domain = None;
    }

    log::trace!(
        "{:?}: kind {:?} skinned {:?} error {:?}",
        raw,
        address.kind,
        address.skinned,
        address.error
    );
    address
}

/// Parse `text` into a list of entities.
///
/// Invalid entities are kept in the list with their [`Address::error`] set.
pub fn parse_list(
    text: &str,
    field: HeaderField,
    flags: ParseFlags,
    ctx: &ParseContext<'_>,
) -> AddressList {
    let mode = if flags.contains(ParseFlags::SINGLE) {
        SplitMode::Single
    } else {
        SplitMode::Auto
    };
    AddressSplitter::new(text, mode)
        .map(|piece| build(&piece, field, flags, ctx))
        .collect()
}

/// Parse `text` as exactly one entity. Returns `None` for blank input.
pub fn parse_one(
    text: &str,
    field: HeaderField,
    flags: ParseFlags,
    ctx: &ParseContext<'_>,
) -> Option<Address> {
    parse_list(text, field, flags | ParseFlags::SINGLE, ctx)
        .into_iter()
        .next()
}

/// Apply `policy` to the invalid entities of `list`.
pub fn check(list: AddressList, policy: CheckPolicy) -> Result<AddressList> {
    match policy {
        CheckPolicy::Log => {
            for a in list.iter().filter(|a| !a.is_valid()) {
                if let Some(err) = a.error {
                    log::warn!("Invalid address {:?}: {}", a.raw, err);
                }
            }
            Ok(list)
        }
        CheckPolicy::Remove => {
            let mut list = list;
            list.retain(|a| match a.error {
                None => true,
                Some(err) => {
                    log::warn!("Dropping invalid address {:?}: {}", a.raw, err);
                    false
                }
            });
            Ok(list)
        }
        CheckPolicy::Fail => {
            let bad = list
                .iter()
                .find(|a| !a.is_valid())
                .map(|a| (a.raw.clone(), a.error));
            match bad {
                Some((raw, err)) => Err(Error::new(format!("Invalid address {:?}", raw))
                    .set_details(err.map(|e| e.to_string()).unwrap_or_default())
                    .set_kind(ErrorKind::ValueError)),
                None => Ok(list),
            }
        }
    }
}
