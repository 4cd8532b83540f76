//
// mailnames - lib.rs
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

#![deny(
    rustdoc::redundant_explicit_links,
    unsafe_op_in_unsafe_fn,
    /* groups */
    clippy::correctness,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    /* restriction */
    clippy::dbg_macro,
    clippy::rc_buffer,
    clippy::as_underscore,
    /* rustdoc */
    rustdoc::broken_intra_doc_links,
    /* pedantic */
    clippy::doc_markdown,
    clippy::expect_fun_call,
    clippy::or_fun_call,
)]
#![allow(clippy::option_if_let_else, clippy::missing_const_for_fn)]

//! Address handling for e-mail clients.
//!
//! - Parse free-form address fields such as header bodies, command arguments
//!   and alias definitions into validated lists of addressees (see module
//!   [`address`]). Malformed input is repaired where possible and tagged
//!   with an [`address::AddressError`] otherwise.
//! - Remove duplicates from address lists (see [`address::elide`]).
//! - Define and expand aliases (see module [`alias`]).
//! - Recognize and strip the user's own addresses (see module
//!   [`alternates`]).
//!
//! Other exports are
//! - Settings, deserialized from TOML (see module [`conf`])
//! - A logger for binaries (see [`utils::logging`])

#[macro_use]
extern crate serde_derive;
pub extern crate log;
pub extern crate nom;

#[macro_use]
extern crate bitflags;
pub extern crate indexmap;
pub extern crate smallvec;

pub mod address;
pub use address::{
    check, elide, parse_list, parse_one, Address, AddressError, AddressKind, AddressList,
    HeaderField, ParseContext, ParseFlags,
};
pub mod alias;
pub use alias::{parse_alias_command, AliasCommand, AliasStore};
pub mod alternates;
pub use alternates::AlternatesSet;
pub mod conf;
pub use conf::{AddressSettings, CheckPolicy};
pub mod error;
pub use error::*;
pub mod host;
pub mod utils;
