//
// mailnames
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


use mailnames::{
    address::{check, elide, parse_list, AddressKind, HeaderField, ParseContext, ParseFlags},
    alias::{parse_alias_command, AliasStore},
    alternates::AlternatesSet,
    conf::AddressSettings,
    host::StaticHost,
};

const SETTINGS: &str = r#"
login = "jane"
hostname = "example.com"
from = ["Jane Doe <jane@example.com>"]
alternates = ["jane@work.example.com"]
check_policy = "remove"

[aliases]
team = ["jane", "alice@example.com", "bob"]
bob = ["Bob <bob@example.com>"]
"#;

#[test]
fn test_reply_recipients() {
    let settings = AddressSettings::from_toml_str(SETTINGS).unwrap();
    let host = StaticHost::default();
    let ctx = ParseContext::new(&settings).with_host(&host);
    let aliases = AliasStore::from_settings(&ctx).unwrap();
    let alternates = AlternatesSet::from_settings(&ctx);
    assert_eq!(aliases.len(), 2);

    let to = parse_list(
        "team, Carol <carol@example.com>, JANE@work.example.com",
        HeaderField::To,
        ParseFlags::RECIPIENT,
        &ctx,
    );
    let mut list = aliases.expand_list(to, settings.metoo, &alternates, &ctx);
    list.append(parse_list(
        "Alice <ALICE@example.com>, broken;@example.com",
        HeaderField::Cc,
        ParseFlags::RECIPIENT,
        &ctx,
    ));
    let list = alternates.remove(list, true, &ctx);
    let list = check(list, settings.check_policy).unwrap();
    let list = elide(list);

    assert_eq!(
        list.iter().map(|a| a.skinned.as_str()).collect::<Vec<_>>(),
        vec!["alice@example.com", "bob@example.com", "carol@example.com"]
    );
    assert!(list
        .iter()
        .all(|a| a.kind == AddressKind::Address && a.is_valid()));
    assert_eq!(
        list.to_header_value(),
        "alice@example.com, Bob <bob@example.com>, Carol <carol@example.com>"
    );
    assert_eq!(elide(list.clone()), list);
}

#[test]
fn test_alias_commands() {
    let settings = AddressSettings::from_toml_str(SETTINGS).unwrap();
    let host = StaticHost::default();
    let ctx = ParseContext::new(&settings).with_host(&host);
    let mut aliases = AliasStore::from_settings(&ctx).unwrap();
    let alternates = AlternatesSet::from_settings(&ctx);

    for line in [
        "alias friends dave@example.net, \\bob, team",
        "unalias team",
    ] {
        aliases
            .apply(&parse_alias_command(line).unwrap(), &ctx)
            .unwrap();
    }
    assert_eq!(
        aliases.display_alias("friends").as_deref(),
        Some("alias friends dave@example.net, \\bob, team")
    );
    let expanded = aliases.expand("friends", false, &alternates, &ctx);
    assert_eq!(
        expanded
            .iter()
            .map(|a| a.skinned.as_str())
            .collect::<Vec<_>>(),
        vec!["dave@example.net", "bob", "team"]
    );
}
