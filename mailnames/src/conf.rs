//
// mailnames - conf module
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

//! Settings for address handling.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result, ResultIntoError};

/// Default depth limit of alias expansion.
pub const MAX_ALIAS_EXPANSION: usize = 25;

pub mod default_values {
    //! default value functions for deserializing

    pub fn false_val<T: From<bool>>() -> T {
        false.into()
    }

    pub fn true_val<T: From<bool>>() -> T {
        true.into()
    }

    pub fn none<T>() -> Option<T> {
        None
    }

    pub fn max_alias_expansion() -> usize {
        super::MAX_ALIAS_EXPANSION
    }
}

use default_values::*;

/// What to do with invalid entities when a list is checked before use.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckPolicy {
    /// Keep everything, log invalid entries.
    #[default]
    Log,
    /// Drop invalid entries.
    Remove,
    /// Refuse the whole list.
    Fail,
}

/// Address related settings.
///
/// ```toml
/// idna = true
/// allnet = true
/// from = ["Jane Doe <jane@example.com>"]
/// alternates = ["jane@work.example.com"]
///
/// [aliases]
/// team = ["alice@example.com", "bob"]
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AddressSettings {
    /// Convert internationalized domains to their ASCII compatible encoding.
    /// Default: true
    #[serde(default = "true_val")]
    pub idna: bool,
    /// Keep our own addresses when expanding aliases.
    /// Default: false
    #[serde(default = "false_val")]
    pub metoo: bool,
    /// Compare only the local part of addresses when deciding whether an
    /// address is ours.
    /// Default: false
    #[serde(default = "false_val")]
    pub allnet: bool,
    /// Consider `reply_to` addresses as ours.
    /// Default: false
    #[serde(default = "false_val", alias = "reply-to-is-me")]
    pub reply_to_is_me: bool,
    /// Login name. If missing, it is looked up from the environment.
    /// Default: None
    #[serde(default = "none")]
    pub login: Option<String>,
    /// Domain appended to bracketed local user names such as `<jane>`.
    /// If missing, the host name is used.
    /// Default: None
    #[serde(default = "none")]
    pub hostname: Option<String>,
    /// Our `From` addresses.
    /// Default: empty
    #[serde(default)]
    pub from: Vec<String>,
    /// Our `Sender` address.
    /// Default: None
    #[serde(default = "none")]
    pub sender: Option<String>,
    /// Our `Reply-To` addresses.
    /// Default: empty
    #[serde(default, alias = "reply-to")]
    pub reply_to: Vec<String>,
    /// Other addresses that are ours.
    /// Default: empty
    #[serde(default)]
    pub alternates: Vec<String>,
    /// Alias definitions.
    /// Default: empty
    #[serde(default)]
    pub aliases: IndexMap<String, Vec<String>>,
    /// How deep alias expansion may recurse.
    /// Default: 25
    #[serde(default = "max_alias_expansion", alias = "max-alias-expansion")]
    pub max_alias_expansion: usize,
    /// Default: "log"
    #[serde(default, alias = "check-policy")]
    pub check_policy: CheckPolicy,
}

impl Default for AddressSettings {
    fn default() -> Self {
        Self {
            idna: true,
            metoo: false,
            allnet: false,
            reply_to_is_me: false,
            login: None,
            hostname: None,
            from: vec![],
            sender: None,
            reply_to: vec![],
            alternates: vec![],
            aliases: IndexMap::default(),
            max_alias_expansion: MAX_ALIAS_EXPANSION,
            check_policy: CheckPolicy::default(),
        }
    }
}

impl AddressSettings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let ret: Self = toml::from_str(s)
            .chain_err_summary(|| "Could not parse address settings")
            .chain_err_kind(ErrorKind::Configuration)?;
        ret.validate()?;
        Ok(ret)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).chain_err_summary(|| {
            format!("Could not read settings file {}", path.display())
        })?;
        Self::from_toml_str(&contents)
            .chain_err_summary(|| format!("Settings file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_alias_expansion == 0 {
            return Err(Error::new("max_alias_expansion must be greater than zero")
                .set_kind(ErrorKind::Configuration));
        }
        if let Some(hostname) = self.hostname.as_deref() {
            if hostname.trim().is_empty() || hostname.contains(char::is_whitespace) {
                return Err(Error::new(format!("Invalid hostname value {:?}", hostname))
                    .set_kind(ErrorKind::Configuration));
            }
        }
        Ok(())
    }
}
