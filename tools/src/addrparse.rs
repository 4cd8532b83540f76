//
// mailnames - addrparse
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

extern crate mailnames;

use std::{io::BufRead, path::PathBuf};

use mailnames::{
    address::{check, elide, parse_list, AddressList, HeaderField, ParseContext, ParseFlags},
    alias::AliasStore,
    alternates::AlternatesSet,
    conf::AddressSettings,
    utils::logging::{LogLevel, StderrLogger},
    Error, ErrorKind, Result, ResultIntoError,
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "addrparse", about = "parse address fields and print every addressee")]
struct Opt {
    /// use specified configuration file instead of
    /// `$XDG_CONFIG_HOME/mailnames/config.toml`
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// header the input comes from (to, cc, bcc, from, sender, reply-to, ...)
    #[structopt(short, long, default_value = "to")]
    field: HeaderField,

    /// treat every input line as one address
    #[structopt(long)]
    single: bool,

    /// do not extract bare addresses; print the input as-is
    #[structopt(long)]
    no_skin: bool,

    /// remove duplicate addresses
    #[structopt(long)]
    elide: bool,

    /// expand aliases
    #[structopt(long)]
    expand: bool,

    /// remove your own addresses
    #[structopt(long)]
    remove_me: bool,

    /// more verbose logging; repeat for more
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// address fields; read from standard input, one per line, if missing
    fields: Vec<String>,
}

fn config_path(opt: &Opt) -> Result<Option<PathBuf>> {
    if let Some(path) = opt.config.as_ref() {
        return Ok(Some(path.clone()));
    }
    let dirs = xdg::BaseDirectories::with_prefix("mailnames").map_err(|err| {
        Error::new("Could not find your XDG directories")
            .set_details(err.to_string())
            .set_kind(ErrorKind::External)
    })?;
    Ok(dirs.find_config_file("config.toml"))
}

fn print_list(line: &str, list: &AddressList) {
    println!("{}", line);
    for a in list.iter() {
        println!(
            "  {:?} {:?} display={:?} domain={:?} error={}",
            a.kind,
            a.skinned,
            a.display,
            a.domain(),
            a.error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "none".to_string()),
        );
    }
}

/// Parses address fields and prints every addressee found in them.
///
/// # Example invocation
/// ```sh
/// ./addrparse --elide 'Jane (Doe) <jane@example.com>, jane@EXAMPLE.com'
/// echo 'jane at example dot com' | ./addrparse --single
/// ```
fn main() -> Result<()> {
    let opt = Opt::from_args();
    let _logger = StderrLogger::new(LogLevel::from(
        (LogLevel::WARN as u8).saturating_add(opt.verbose),
    ));

    let settings = match config_path(&opt)? {
        Some(path) => {
            log::debug!("Loading settings from {}", path.display());
            AddressSettings::from_path(&path)?
        }
        None => AddressSettings::default(),
    };
    let ctx = ParseContext::new(&settings);
    let aliases = AliasStore::from_settings(&ctx)?;
    let alternates = AlternatesSet::from_settings(&ctx);

    let mut flags = ParseFlags::FULL_EXTRA;
    if !opt.no_skin {
        flags |= ParseFlags::RECIPIENT;
    }
    if opt.single {
        flags |= ParseFlags::SINGLE;
    }

    let lines: Vec<String> = if opt.fields.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<String>>>()
            .chain_err_summary(|| "Could not read standard input")?
    } else {
        opt.fields.clone()
    };

    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let mut list = parse_list(line, opt.field, flags, &ctx);
        if opt.expand {
            list = aliases.expand_list(list, settings.metoo, &alternates, &ctx);
        }
        if opt.remove_me {
            list = alternates.remove(list, true, &ctx);
        }
        if opt.elide {
            list = elide(list);
        }
        let list = check(list, settings.check_policy)?;
        print_list(line, &list);
    }
    Ok(())
}
