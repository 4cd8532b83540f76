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

use crate::{
    address::{
        skin::skin,
        split::{AddressSplitter, SplitMode},
        validate::{check_addr_spec, is_alias_name},
        *,
    },
    conf::{AddressSettings, CheckPolicy},
    host::{HeaderDecoder, StaticHost},
};

fn host() -> StaticHost {
    StaticHost {
        users: vec!["alice".to_string(), "root".to_string()],
        hostname: Some("example.org".to_string()),
        login: Some("alice".to_string()),
    }
}

macro_rules! one {
    ($ctx:expr, $s:expr) => {{
        parse_one($s, HeaderField::To, ParseFlags::RECIPIENT, &$ctx).unwrap()
    }};
    ($ctx:expr, $s:expr, $flags:expr) => {{
        parse_one($s, HeaderField::To, $flags, &$ctx).unwrap()
    }};
}

fn split(line: &str, mode: SplitMode) -> Vec<String> {
    AddressSplitter::new(line, mode).collect()
}

#[test]
fn test_address_split() {
    assert_eq!(
        split("a@x  b@y\tc@z", SplitMode::Auto),
        vec!["a@x", "b@y", "c@z"]
    );
    assert_eq!(
        split("a@x (A),   b@y", SplitMode::Auto),
        vec!["a@x (A)", "b@y"]
    );
    assert_eq!(
        split(r#""Doe, J" <j@x>, k@y"#, SplitMode::Auto),
        vec![r#""Doe, J" <j@x>"#, "k@y"]
    );
    assert_eq!(
        split(r"a\,b@x, c@y", SplitMode::Auto),
        vec![r"a\,b@x", "c@y"]
    );
    assert_eq!(split("a@x, b@y", SplitMode::Single), vec!["a@x, b@y"]);
    assert_eq!(split(",, a@x ,,", SplitMode::Auto), vec!["a@x"]);
    assert_eq!(
        split("a@x (nested (comment)) b@y", SplitMode::Whitespace),
        vec!["a@x", "b@y"]
    );
    assert!(split("  \t ", SplitMode::Auto).is_empty());

    let mut iter = AddressSplitter::new("a@x", SplitMode::Auto);
    assert_eq!(iter.next().as_deref(), Some("a@x"));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next(), None);
}

#[test]
fn test_address_skin() {
    let s = skin("Jane (Doe) <jane@example.com>", ParseFlags::SKIN);
    assert_eq!(s.skinned, "jane@example.com");
    assert_eq!(&s.input[s.angle.clone().unwrap()], "jane@example.com");
    assert!(!s.synthetic_angle);
    assert!(!s.is_bare());

    for addr in ["a@b.c", "john.doe@example.com", "x+tag@sub.example.org"] {
        assert_eq!(skin(addr, ParseFlags::SKIN).skinned, addr);
        assert!(skin(addr, ParseFlags::SKIN).is_bare());
    }

    assert_eq!(
        skin("jane at example dot com", ParseFlags::SKIN).skinned,
        "jane@example.com"
    );
    assert_eq!(
        skin("jane AT example DOT com", ParseFlags::SKIN).skinned,
        "jane@example.com"
    );
    assert_eq!(
        skin("jane@ example.com", ParseFlags::SKIN).skinned,
        "jane@example.com"
    );
    assert_eq!(
        skin("jane@x (a (nested) comment)", ParseFlags::SKIN).skinned,
        "jane@x"
    );
    assert_eq!(
        skin(r#""john \"q\" doe"@x"#, ParseFlags::SKIN).skinned,
        r#""john \"q\" doe"@x"#
    );
    assert_eq!(skin(r"trailing\", ParseFlags::SKIN).skinned, r"trailing\");

    let s = skin("<foo@bar", ParseFlags::SKIN);
    assert_eq!(s.skinned, "foo@bar");
    assert_eq!(s.input, "<foo@bar>");
    assert!(s.synthetic_angle);
    assert!(s.is_bare());

    let s = skin("  Some <thing>  ", ParseFlags::empty());
    assert!(!s.skinned_ran);
    assert_eq!(s.skinned, "Some <thing>");
}

#[test]
fn test_address_check_addr_spec() {
    assert_eq!(
        check_addr_spec("a@[1.2.3.4]", false).unwrap().unwrap().at,
        1
    );
    assert_eq!(
        check_addr_spec("a@[1.2.3.4]x", false),
        Err(AddressError::BadChar('x'))
    );
    assert_eq!(
        check_addr_spec("a@[1.2", false),
        Err(AddressError::BadChar('['))
    );
    assert_eq!(
        check_addr_spec("\"unterminated@x", false),
        Err(AddressError::BadChar('"'))
    );
    assert_eq!(
        check_addr_spec("\"a@b\"@x", false).unwrap().unwrap().at,
        5
    );
    assert_eq!(check_addr_spec("a@[1[2]", false).unwrap().unwrap().at, 1);
    assert_eq!(
        check_addr_spec("a@[1 2]", false),
        Err(AddressError::BadChar(' '))
    );
    assert_eq!(
        check_addr_spec("a@[1\\2]", false),
        Err(AddressError::BadChar('\\'))
    );
    assert_eq!(
        check_addr_spec("a@[ü]", false),
        Err(AddressError::BadChar('ü'))
    );
    assert!(!check_addr_spec("a@[ü]", true).unwrap().unwrap().needs_idna);
    assert_eq!(check_addr_spec("plain", false), Ok(None));
    assert_eq!(
        check_addr_spec("a@b.c", false),
        Ok(Some(validate::AddrSpec {
            at: 1,
            needs_idna: false
        }))
    );
    assert!(
        check_addr_spec("a@bücher.example", true)
            .unwrap()
            .unwrap()
            .needs_idna
    );

    assert!(is_alias_name("team"));
    assert!(is_alias_name("team-2.old_list#x"));
    assert!(is_alias_name("team$"));
    assert!(!is_alias_name("te$m"));
    assert!(!is_alias_name("$"));
    assert!(!is_alias_name("-team"));
    assert!(!is_alias_name("te am"));
    assert!(!is_alias_name(""));
}

#[test]
fn test_address_parse_scenarios() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    let jane = one!(ctx, "Jane (Doe) <jane@example.com>");
    assert_eq!(jane.skinned, "jane@example.com");
    assert_eq!(jane.kind, AddressKind::Address);
    assert!(jane.is_valid());
    assert_eq!(jane.domain, Some(5..16));
    assert_eq!(jane.domain(), Some("example.com"));
    assert_eq!(jane.local_part(), Some("jane"));
    assert_eq!(jane.display, "Jane (Doe) <jane@example.com>");

    let jane = one!(ctx, "jane at example dot com");
    assert_eq!(jane.skinned, "jane@example.com");
    assert!(jane.is_valid());
    assert_eq!(jane.domain(), Some("example.com"));

    let foo = one!(ctx, "<foo@bar");
    assert_eq!(foo.skinned, "foo@bar");
    assert_eq!(foo.kind, AddressKind::Address);
    assert!(foo.is_valid());
    assert_eq!(foo.domain(), Some("bar"));

    let list = parse_list(
        "Foo@X.com, foo@x.com",
        HeaderField::To,
        ParseFlags::RECIPIENT,
        &ctx,
    );
    assert_eq!(list.len(), 2);
    let list = elide(list);
    assert_eq!(list.len(), 1);
    assert_eq!(list.first().unwrap().skinned, "Foo@X.com");
}

#[test]
fn test_address_kinds() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    for (input, kind) in [
        ("/var/mail/box", AddressKind::File),
        ("./box", AddressKind::File),
        ("-", AddressKind::File),
        ("|procmail -d", AddressKind::Pipe),
        ("team", AddressKind::AliasName),
        ("team$", AddressKind::AliasName),
        ("a:b", AddressKind::AliasName),
        ("jörg", AddressKind::AliasName),
        ("a@b", AddressKind::Address),
    ] {
        let a = one!(ctx, input);
        assert_eq!(a.kind, kind, "{}", input);
        assert!(a.is_valid(), "{}", input);
    }

    let a = one!(ctx, "-team");
    assert_eq!(a.kind, AddressKind::AliasName);
    assert_eq!(a.error, Some(AddressError::BadAliasName));
    let a = one!(ctx, "te$m");
    assert_eq!(a.error, Some(AddressError::BadAliasName));

    assert!(parse_one("   ", HeaderField::To, ParseFlags::RECIPIENT, &ctx).is_none());
    assert_eq!(one!(ctx, "<>").error, Some(AddressError::Empty));
    assert_eq!(one!(ctx, "()").error, Some(AddressError::Empty));
}

#[test]
fn test_address_errors() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    for (input, err) in [
        ("a@@b", AddressError::BadAtSequence('@')),
        ("a@b@c", AddressError::BadAtSequence('@')),
        ("@b", AddressError::BadAtSequence('@')),
        ("a@", AddressError::BadAtSequence('@')),
        ("jane;doe@x", AddressError::BadChar(';')),
        ("jane@x:y", AddressError::BadChar(':')),
        ("üser@x", AddressError::BadChar('ü')),
        ("jane (x)", AddressError::BadAtSequence('@')),
    ] {
        let a = one!(ctx, input);
        assert_eq!(a.kind, AddressKind::Address, "{}", input);
        assert_eq!(a.error, Some(err), "{}", input);
        assert_eq!(a.domain, None, "{}", input);
    }

    // Nothing panics, and every entity carries at most one error.
    for input in [
        "", "<", ">", "\\", "\"", "(", "@", "<<>>", "((((", "\"\\", "<a@b", "x <y", "Jane <",
        "ü@ü", "a at", "at dot", ",,,", "a@[", "a@[]", "\"\"@", "<a@b> <c@d>", "a@x, <b@y>",
    ] {
        for a in parse_list(
            input,
            HeaderField::Cc,
            ParseFlags::RECIPIENT | ParseFlags::FULL_EXTRA,
            &ctx,
        )
        .iter()
        {
            if a.domain.is_some() {
                assert!(a.is_valid(), "{:?}", input);
                assert_eq!(a.kind, AddressKind::Address, "{:?}", input);
            }
        }
    }
}

#[test]
fn test_address_reorder() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);
    let flags = ParseFlags::RECIPIENT | ParseFlags::FULL_EXTRA;

    let a = one!(ctx, "Jane jane@example.com", flags);
    assert!(a.is_valid());
    assert_eq!(a.skinned, "jane@example.com");
    assert_eq!(a.display, "Jane <jane@example.com>");
    assert_eq!(a.display_extra.as_deref(), Some("Jane"));

    let a = one!(ctx, "jane@example.com (Jane Doe)", flags);
    assert!(a.is_valid());
    assert_eq!(a.display, "(Jane Doe) <jane@example.com>");
    assert_eq!(a.display_extra.as_deref(), Some("Jane Doe"));

    let a = one!(ctx, r#""Doe, Jane" <jane@x>"#, flags);
    assert_eq!(a.skinned, "jane@x");
    assert_eq!(a.display, r#""Doe, Jane" <jane@x>"#);
    assert_eq!(a.display_extra.as_deref(), Some("Doe, Jane"));

    let a = one!(ctx, r#"Name "john doe"@example.com"#, flags);
    assert!(a.is_valid());
    assert_eq!(a.skinned, r#""john doe"@example.com"#);
    assert_eq!(a.display, r#"Name <"john doe"@example.com>"#);
    assert_eq!(a.domain(), Some("example.com"));

    let a = one!(ctx, "Jane Q. Doe <jane@x>", flags);
    assert_eq!(a.display, r#""Jane Q. Doe" <jane@x>"#);

    let a = one!(ctx, r"a\(b <x@y>", flags);
    assert!(a.is_valid());
    assert_eq!(a.skinned, "x@y");
    assert_eq!(a.display, r#""a(b" <x@y>"#);
    assert_eq!(a.display_extra.as_deref(), Some("a(b"));

    // Without FULL_EXTRA the name is not kept separately.
    let a = one!(ctx, "Jane <jane@x>");
    assert_eq!(a.display, "Jane <jane@x>");
    assert_eq!(a.display_extra, None);
}

#[test]
fn test_address_idna() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    let a = one!(ctx, "user@bücher.example");
    assert!(a.is_valid());
    assert!(a.idna_applied);
    assert_eq!(a.skinned, "user@xn--bcher-kva.example");
    assert_eq!(a.domain(), Some("xn--bcher-kva.example"));
    assert_eq!(a.local_part(), Some("user"));
    assert_eq!(a.display, "user@bücher.example");

    let a = one!(ctx, "Bob <user@bücher.example>");
    assert_eq!(a.skinned, "user@xn--bcher-kva.example");
    assert_eq!(a.display, "Bob <user@bücher.example>");

    let a = one!(
        ctx,
        "user@bücher.example",
        ParseFlags::RECIPIENT | ParseFlags::NO_IDNA
    );
    assert_eq!(a.error, Some(AddressError::BadChar('ü')));
    assert!(!a.idna_applied);

    let settings = AddressSettings {
        idna: false,
        ..AddressSettings::default()
    };
    let ctx = ParseContext::new(&settings).with_host(&host);
    let a = one!(ctx, "user@bücher.example");
    assert_eq!(a.error, Some(AddressError::BadChar('ü')));

    // Domain literals are never converted.
    let a = one!(ctx, "user@[127.0.0.1]");
    assert!(a.is_valid());
    assert_eq!(a.domain(), Some("[127.0.0.1]"));
}

#[test]
fn test_address_local_user() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    let a = one!(ctx, "<alice>");
    assert!(a.is_valid());
    assert_eq!(a.skinned, "alice@example.org");
    assert_eq!(a.domain(), Some("example.org"));

    let a = one!(ctx, "Alice <alice>");
    assert_eq!(a.skinned, "alice@example.org");
    assert_eq!(a.display, "Alice <alice@example.org>");

    assert_eq!(
        one!(ctx, "<mallory>").error,
        Some(AddressError::BadAtSequence('@'))
    );
    // Not bracketed: an alias name.
    assert_eq!(one!(ctx, "alice").kind, AddressKind::AliasName);

    let settings = AddressSettings {
        hostname: Some("mail.example.net".to_string()),
        ..AddressSettings::default()
    };
    let ctx = ParseContext::new(&settings).with_host(&host);
    assert_eq!(one!(ctx, "<root>").skinned, "root@mail.example.net");

    let settings = AddressSettings::default();
    let host = StaticHost {
        hostname: None,
        ..self::host()
    };
    let ctx = ParseContext::new(&settings).with_host(&host);
    assert_eq!(
        one!(ctx, "<alice>").error,
        Some(AddressError::BadAtSequence('@'))
    );
}

#[test]
fn test_address_unskinned() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    let a = one!(ctx, "  Some <thing>  ", ParseFlags::empty());
    assert_eq!(a.skinned, "Some <thing>");
    assert_eq!(a.kind, AddressKind::Address);
    assert!(a.is_valid());
    assert_eq!(a.domain, None);
}

#[test]
fn test_address_decoder() {
    struct Upper;
    impl HeaderDecoder for Upper {
        fn decode(&self, raw: &str) -> String {
            raw.to_uppercase()
        }
    }
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings)
        .with_host(&host)
        .with_decoder(&Upper);
    let a = one!(
        ctx,
        "Jane <jane@x>",
        ParseFlags::RECIPIENT | ParseFlags::FULL_EXTRA
    );
    assert_eq!(a.skinned, "jane@x");
    assert_eq!(a.display, "JANE <JANE@X>");
    assert_eq!(a.display_extra.as_deref(), Some("JANE"));
}

#[test]
fn test_address_elide() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);

    let list = parse_list(
        "b@x, A@x, a@X, c@x, B@x",
        HeaderField::To,
        ParseFlags::RECIPIENT,
        &ctx,
    );
    let once = elide(list.clone());
    assert_eq!(
        once.iter().map(|a| a.skinned.as_str()).collect::<Vec<_>>(),
        vec!["b@x", "A@x", "c@x"]
    );
    assert_eq!(elide(once.clone()), once);
    assert!(once.len() <= list.len());

    // First occurrence wins regardless of header field.
    let mut list = AddressList::new();
    list.extend(parse_one("a@x", HeaderField::Cc, ParseFlags::RECIPIENT, &ctx));
    list.extend(parse_one("A@x", HeaderField::To, ParseFlags::RECIPIENT, &ctx));
    list.extend(parse_one("z@x", HeaderField::Bcc, ParseFlags::RECIPIENT, &ctx));
    let list = elide(list);
    assert_eq!(list.len(), 2);
    assert_eq!(list.first().unwrap().field, HeaderField::Cc);

    let mut list = parse_list("a@x, b@x", HeaderField::To, ParseFlags::RECIPIENT, &ctx);
    if let Some(a) = list.iter_mut().next() {
        a.deleted = true;
    }
    let list = elide(list);
    assert_eq!(list.len(), 1);
    assert_eq!(list.first().unwrap().skinned, "b@x");

    let mut list = parse_list("a@x, a@x", HeaderField::To, ParseFlags::RECIPIENT, &ctx);
    for a in list.iter_mut() {
        a.deleted = true;
    }
    assert!(elide(list).is_empty());
    assert!(elide(AddressList::new()).is_empty());
}

#[test]
fn test_address_list() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);
    let parse = |s: &str| parse_one(s, HeaderField::To, ParseFlags::RECIPIENT, &ctx).unwrap();

    let mut list = AddressList::new();
    assert!(list.is_empty());
    let a = list.push(parse("a@x"));
    let b = list.push(parse("b@x"));
    let c = list.push(parse("c@x"));
    assert_eq!(list.handles(), &[a, b, c]);

    let removed = list.replace(b, vec![parse("d@x"), parse("e@x")].into_iter().collect());
    assert_eq!(removed.unwrap().skinned, "b@x");
    assert!(list.get(b).is_none());
    assert_eq!(list.to_header_value(), "a@x, d@x, e@x, c@x");
    assert!(list.replace(b, AddressList::new()).is_none());

    list.retain(|addr| addr.skinned != "a@x");
    assert!(list.get(a).is_none());
    assert_eq!(list.get(c).unwrap().skinned, "c@x");
    list.get_mut(c).unwrap().skinned = "C@x".to_string();
    assert_eq!(list.len(), 3);

    let mut other = AddressList::new();
    other.push(parse("Jane <jane@x>"));
    list.append(other);
    assert_eq!(list.to_header_value(), "d@x, e@x, c@x, Jane <jane@x>");
    assert_eq!(
        list.into_iter().map(|a| a.skinned).collect::<Vec<_>>(),
        vec!["d@x", "e@x", "C@x", "jane@x"]
    );
}

#[test]
fn test_address_check() {
    let settings = AddressSettings::default();
    let host = host();
    let ctx = ParseContext::new(&settings).with_host(&host);
    let list = parse_list(
        "good@x, bad;@x, team",
        HeaderField::To,
        ParseFlags::RECIPIENT,
        &ctx,
    );
    assert_eq!(list.len(), 3);

    assert_eq!(check(list.clone(), CheckPolicy::Log).unwrap().len(), 3);
    let removed = check(list.clone(), CheckPolicy::Remove).unwrap();
    assert_eq!(
        removed.iter().map(|a| a.skinned.as_str()).collect::<Vec<_>>(),
        vec!["good@x", "team"]
    );
    let err = check(list, CheckPolicy::Fail).unwrap_err();
    assert!(err.kind.is_value_error());
    assert!(err.to_string().contains("bad;@x"));
    assert!(check(removed, CheckPolicy::Fail).is_ok());
}

#[test]
fn test_address_header_field() {
    assert_eq!("To".parse::<HeaderField>().unwrap(), HeaderField::To);
    assert_eq!(
        "reply-to".parse::<HeaderField>().unwrap(),
        HeaderField::ReplyTo
    );
    assert!("x-nope".parse::<HeaderField>().is_err());
    assert!(HeaderField::To < HeaderField::Cc);
    assert!(HeaderField::Cc < HeaderField::Bcc);
    assert_eq!(HeaderField::MailFollowupTo.to_string(), "Mail-Followup-To");
}
