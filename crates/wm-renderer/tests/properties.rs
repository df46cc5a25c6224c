//! Property-based tests for the sanitizer and the conversion loop
//!
//! These tests check that:
//! - whatever tag soup goes in, only allow-listed tags and attributes come out
//! - conversion terminates on arbitrary input and never leaks token characters

use std::collections::BTreeMap;
use std::sync::LazyLock;

use proptest::prelude::*;
use regex::Regex;
use wm_renderer::{AllowList, AllowPolicy, Converter, Settings, TagPolicy};

static OUTPUT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([^\s>/]+)([^>]*)>").unwrap());
static OUTPUT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s([^\s="]+)(?:="[^"]*")?"#).unwrap());

fn restricted_policy() -> AllowPolicy {
    let mut tags = BTreeMap::new();
    tags.insert("a".to_owned(), AllowList::subset(["href"]));
    tags.insert("b".to_owned(), AllowList::None);
    tags.insert("img".to_owned(), AllowList::subset(["src"]));
    AllowPolicy {
        tags: TagPolicy::Subset(tags),
        classes: AllowList::None,
        styles: AllowList::None,
    }
}

/// Attributes each tag may carry in the output; `p` comes from paragraphs.
fn allowed_output(tag: &str) -> Option<&'static [&'static str]> {
    match tag {
        "p" | "b" => Some(&[]),
        "a" => Some(&["href"]),
        "img" => Some(&["src"]),
        _ => None,
    }
}

/// Generate tag names, allowed and not, in mixed case
fn tag_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_owned()),
        Just("b".to_owned()),
        Just("img".to_owned()),
        Just("B".to_owned()),
        Just("script".to_owned()),
        Just("div".to_owned()),
        Just("iframe".to_owned()),
        "[a-z]{1,6}",
    ]
}

/// Generate attribute names, including event handlers
fn attr_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("href".to_owned()),
        Just("src".to_owned()),
        Just("onclick".to_owned()),
        Just("class".to_owned()),
        Just("style".to_owned()),
        Just("id".to_owned()),
        Just("rel".to_owned()),
        "[a-z]{1,8}",
    ]
}

/// Generate attribute values, some of them hostile URLs
fn attr_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9:/. ]{0,12}",
        Just("javascript:alert(1)".to_owned()),
        Just("http://example.com/x.png".to_owned()),
        Just("color: red".to_owned()),
    ]
}

fn attribute_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (attr_name_strategy(), attr_value_strategy())
            .prop_map(|(k, v)| format!(" {k}=\"{v}\"")),
        (attr_name_strategy(), "[a-z0-9]{1,6}").prop_map(|(k, v)| format!(" {k}={v}")),
        attr_name_strategy().prop_map(|k| format!(" {k}")),
    ]
}

/// Generate one piece of tag soup: start, close or empty tag, or plain text
fn soup_piece_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (
            tag_name_strategy(),
            prop::collection::vec(attribute_strategy(), 0..4)
        )
            .prop_map(|(name, attrs)| format!("<{name}{}>", attrs.concat())),
        tag_name_strategy().prop_map(|name| format!("</{name}>")),
        tag_name_strategy().prop_map(|name| format!("<{name} />")),
        "[a-zA-Z0-9 <>&\"'=/]{0,10}",
        Just("\n\n".to_owned()),
    ]
}

fn soup_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(soup_piece_strategy(), 1..12).prop_map(|pieces| pieces.concat())
}

/// Generate input mixing markup characters, token-range characters and
/// arbitrary text
fn arbitrary_input_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{0,80}",
        "[#*`<>/!\\-=.()\\[\\]{}a-z \n]{0,80}",
        "[\u{E000}-\u{E01F}a<>*]{0,40}",
        soup_strategy(),
    ]
}

proptest! {
    #[test]
    fn output_respects_allow_list(input in soup_strategy()) {
        let settings = Settings::default()
            .with_policy(restricted_policy())
            .with_pass_comments(false);
        let html = Converter::new(settings).process(&input).unwrap().html;

        for tag in OUTPUT_TAG_RE.captures_iter(&html) {
            let name = &tag[2];
            let allowed = allowed_output(name);
            prop_assert!(allowed.is_some(), "tag {} leaked from {:?}: {}", name, input, html);
            let allowed = allowed.unwrap_or_default();
            if &tag[1] == "/" {
                continue;
            }
            for attr in OUTPUT_ATTR_RE.captures_iter(&tag[3]) {
                prop_assert!(
                    allowed.contains(&&attr[1]),
                    "attribute {} on {} leaked from {:?}: {}",
                    &attr[1],
                    name,
                    input,
                    html
                );
            }
        }
        prop_assert!(!html.contains("=\"javascript:"));
    }

    #[test]
    fn disabled_policy_emits_no_tags_but_paragraphs(input in soup_strategy()) {
        let settings = Settings::default()
            .with_policy(AllowPolicy::disabled())
            .with_pass_comments(false);
        let html = Converter::new(settings).process(&input).unwrap().html;

        for tag in OUTPUT_TAG_RE.captures_iter(&html) {
            prop_assert_eq!(&tag[2], "p");
        }
    }

    #[test]
    fn conversion_terminates_without_leaking_tokens(input in arbitrary_input_strategy()) {
        for settings in [Settings::default(), Settings::safe_mode()] {
            let rendered = Converter::new(settings).process(&input);
            prop_assert!(rendered.is_ok());
            let html = rendered.unwrap().html;
            prop_assert!(
                !html.chars().any(|c| ('\u{E000}'..='\u{E01F}').contains(&c)),
                "token characters in output for {:?}: {:?}",
                input,
                html
            );
        }
    }
}
