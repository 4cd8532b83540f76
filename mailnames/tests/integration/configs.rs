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


use std::io::Write;

use mailnames::{conf::AddressSettings, CheckPolicy};

#[test]
fn test_address_settings_from_toml() {
    let s: AddressSettings = toml::from_str(
        r#"
idna = false
allnet = true
reply-to-is-me = true
from = ["Jane Doe <jane@example.com>"]
reply_to = ["jane@lists.example.com"]
alternates = ["jane@work.example.com"]
max_alias_expansion = 3
check_policy = "remove"

[aliases]
team = ["alice@example.com", "bob"]
bob = ["Bob <bob@example.com>"]
    "#,
    )
    .unwrap();
    assert!(!s.idna);
    assert!(s.allnet);
    assert!(s.reply_to_is_me);
    assert_eq!(s.from, vec!["Jane Doe <jane@example.com>".to_string()]);
    assert_eq!(s.max_alias_expansion, 3);
    assert_eq!(s.check_policy, CheckPolicy::Remove);
    assert_eq!(
        s.aliases.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["team", "bob"]
    );
}

#[test]
fn test_address_settings_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
login = "jane"
hostname = "example.com"
sender = "jane@example.com"
"#
    )
    .unwrap();
    let s = AddressSettings::from_path(file.path()).unwrap();
    assert_eq!(s.login.as_deref(), Some("jane"));
    assert_eq!(s.hostname.as_deref(), Some("example.com"));
    assert_eq!(s.sender.as_deref(), Some("jane@example.com"));
    assert!(s.idna);

    let tmp_dir = tempfile::TempDir::new().unwrap();
    let err = AddressSettings::from_path(&tmp_dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("missing.toml"), "{}", err);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "no_such_setting = 1").unwrap();
    let err = AddressSettings::from_path(file.path()).unwrap_err();
    assert!(err.kind.is_configuration(), "{:?}", err);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "hostname = \"two words\"").unwrap();
    let err = AddressSettings::from_path(file.path()).unwrap_err();
    assert!(err.kind.is_configuration(), "{:?}", err);
}
