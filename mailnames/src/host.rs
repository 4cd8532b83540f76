//
// mailnames - host module
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

//! Collaborators outside of address parsing proper: the host system and
//! header decoding.

use crate::error::{Error, ErrorKind, Result};

/// Facts about the local system that address parsing depends on.
pub trait HostEnvironment {
    /// Whether `name` is a user account on this host.
    fn is_local_user(&self, name: &str) -> bool;

    /// The domain to append to local user names.
    fn hostname(&self) -> Option<String>;

    /// The login name of the current user.
    fn login_name(&self) -> Option<String>;
}

/// [`HostEnvironment`] backed by the running system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn try_hostname(&self) -> Result<String> {
        let name = nix::unistd::gethostname()?;
        name.into_string().map_err(|name| {
            Error::new(format!("Host name {:?} is not valid UTF-8", name))
                .set_kind(ErrorKind::OSError)
        })
    }
}

impl HostEnvironment for SystemHost {
    fn is_local_user(&self, name: &str) -> bool {
        if name.is_empty() || name.contains(['/', '\0']) {
            return false;
        }
        match nix::unistd::User::from_name(name) {
            Ok(user) => user.is_some(),
            Err(err) => {
                log::debug!("Could not look up user {:?}: {}", name, err);
                false
            }
        }
    }

    fn hostname(&self) -> Option<String> {
        match self.try_hostname() {
            Ok(name) if !name.is_empty() => Some(name),
            Ok(_) => None,
            Err(err) => {
                log::debug!("{}", err);
                None
            }
        }
    }

    fn login_name(&self) -> Option<String> {
        ["LOGNAME", "USER"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty())
    }
}

/// Decodes raw header values (e.g. RFC 2047 encoded words) into displayable
/// text.
pub trait HeaderDecoder {
    fn decode(&self, raw: &str) -> String;
}

/// Identity [`HeaderDecoder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainDecoder;

impl HeaderDecoder for PlainDecoder {
    fn decode(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// A fixed [`HostEnvironment`], for tests and for embedding.
#[derive(Clone, Debug, Default)]
pub struct StaticHost {
    pub users: Vec<String>,
    pub hostname: Option<String>,
    pub login: Option<String>,
}

impl HostEnvironment for StaticHost {
    fn is_local_user(&self, name: &str) -> bool {
        self.users.iter().any(|u| u == name)
    }

    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }

    fn login_name(&self) -> Option<String> {
        self.login.clone()
    }
}
