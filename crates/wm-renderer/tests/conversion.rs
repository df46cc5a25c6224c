//! End-to-end conversion scenarios.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use wm_renderer::chain::events;
use wm_renderer::{
    AllowList, AllowPolicy, AttrValue, ChainError, ConversionError, Converter, Element, Engine,
    Modifier, Outcome, Resolved, Settings, TagEvent, TagPolicy, TocSource, UrlFilter, UrlKind,
    VAlign,
};

fn convert(settings: Settings, text: &str) -> String {
    Converter::new(settings).process(text).unwrap().html
}

fn only_tags(tags: &[(&str, AllowList)]) -> AllowPolicy {
    let tags: BTreeMap<String, AllowList> = tags
        .iter()
        .map(|(name, attrs)| ((*name).to_owned(), attrs.clone()))
        .collect();
    AllowPolicy {
        tags: TagPolicy::Subset(tags),
        ..AllowPolicy::default()
    }
}

#[derive(Debug)]
struct RejectAll;

impl UrlFilter for RejectAll {
    fn check(&self, _url: &str, _kind: UrlKind) -> bool {
        false
    }
}

#[test]
fn test_chain_order_and_veto() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = Engine::new();
    for (name, forward) in [("A", true), ("B", false), ("C", true)] {
        let log = Rc::clone(&log);
        engine.add_handler(events::HTML_TAG, move |_inv, event| {
            log.borrow_mut().push(name);
            Ok(if forward {
                Outcome::Forward(event)
            } else {
                Outcome::Handled(Resolved::Nothing)
            })
        });
    }

    let settings = Settings::default();
    let mut ctx = wm_renderer::ConversionContext::new(&settings);
    let event = wm_renderer::Event::Tag(TagEvent {
        element: Element::new("b"),
        is_start: true,
        is_empty: false,
    });
    let resolved = engine.dispatch(&mut ctx, event).unwrap();

    assert_eq!(resolved, Some(Resolved::Nothing));
    assert_eq!(*log.borrow(), vec!["C", "B"]);
}

#[test]
fn test_img_attributes_filtered() {
    let policy = only_tags(&[("img", AllowList::subset(["src"]))]);
    let converter = Converter::new(Settings::default().with_policy(policy));
    let rendered = converter
        .process(r#"<img src="http://x/y.png" onclick="evil()">"#)
        .unwrap();

    assert_eq!(rendered.html, r#"<p><img src="http://x/y.png"></p>"#);
    assert_eq!(rendered.summary.images, vec!["http://x/y.png"]);
}

#[test]
fn test_img_suppressed_when_url_rejected() {
    let policy = only_tags(&[("img", AllowList::subset(["src"]))]);
    let settings = Settings::default()
        .with_policy(policy)
        .with_url_filter(RejectAll);
    let rendered = Converter::new(settings)
        .process(r#"before <img src="http://x/y.png"> after"#)
        .unwrap();

    assert_eq!(rendered.html, "<p>before  after</p>");
    assert!(rendered.summary.images.is_empty());
}

#[test]
fn test_self_closing_close_tag_stays_text() {
    assert_eq!(
        convert(Settings::default(), "a </div/> b"),
        "<p>a &lt;/div/&gt; b</p>"
    );
}

#[test]
fn test_close_tag_with_attributes_stays_text() {
    assert_eq!(
        convert(Settings::default(), r#"</b class="x">"#),
        "<p>&lt;/b class=\"x\"&gt;</p>"
    );
}

#[test]
fn test_comment_sanitized() {
    assert_eq!(
        convert(Settings::default(), "x <!-- a----b --> y"),
        "<p>x <!-- a - b --> y</p>"
    );
}

#[test]
fn test_comment_dropped() {
    assert_eq!(
        convert(Settings::default().with_pass_comments(false), "x <!-- a --> y"),
        "<p>x  y</p>"
    );
}

#[test]
fn test_nofollow_injected() {
    let rendered = Converter::new(Settings::default().with_force_nofollow(true))
        .process(r#"<a href="http://external/" rel="author">x</a>"#)
        .unwrap();
    assert_eq!(
        rendered.html,
        r#"<p><a href="http://external/" rel="author nofollow">x</a></p>"#
    );
    assert_eq!(rendered.summary.links, vec!["http://external/"]);
}

#[test]
fn test_phrase_modifier_applied() {
    assert_eq!(
        convert(
            Settings::default(),
            "say **word .(T)[c #w]{color: red}<** now"
        ),
        r#"<p>say <strong title="T" class="c" id="w" style="color: red; text-align: left">word</strong> now</p>"#
    );
}

#[test]
fn test_modifier_parsed_through_public_api() {
    let m = Modifier::parse("(Caption)[cls1 cls2 #main]{color: red; width: 10}^");
    assert_eq!(m.title.as_deref(), Some("Caption"));
    assert_eq!(m.classes, vec!["cls1", "cls2"]);
    assert_eq!(m.id.as_deref(), Some("main"));
    assert_eq!(m.v_align, Some(VAlign::Top));
}

#[test]
fn test_protected_span_not_rematched() {
    let mut converter = Converter::new(Settings::default());
    // a pattern that would match the markup the sanitizer produced
    converter
        .engine_mut()
        .register_line_pattern("shout", r"<b>", |_parser, _caps| {
            Ok(Some("BROKEN".to_owned()))
        });
    let html = converter.process("<b>x</b>").unwrap().html;
    assert_eq!(html, "<p><b>x</b></p>");
}

#[test]
fn test_disallowed_tag_removed_text_kept() {
    assert_eq!(
        convert(
            Settings::safe_mode(),
            r#"<div><script>alert(1)</script><b>ok</b></div>"#
        ),
        "<p>alert(1)<b>ok</b></p>"
    );
}

#[test]
fn test_misplaced_element_dropped_with_its_closing_tag() {
    assert_eq!(
        convert(Settings::default(), "<ul><div>x</div></ul>"),
        "<ul>x</ul>"
    );
    assert_eq!(
        convert(Settings::default(), "<b><div>x</div></b>"),
        "<p><b>x</b></p>"
    );
}

#[test]
fn test_safe_mode_rejects_classes_and_styles() {
    assert_eq!(
        convert(
            Settings::safe_mode(),
            r#"<b class="x" style="color: red">t</b> <a href="javascript:alert(1)">y</a>"#
        ),
        "<p><b>t</b> y</p>"
    );
}

#[test]
fn test_heading_toc_sources() {
    let rendered = Converter::new(Settings::default())
        .process("# Intro\n\n<h2>Details</h2>")
        .unwrap();
    assert_eq!(rendered.html, "<h1>Intro</h1>\n<h2>Details</h2>");
    let sources: Vec<_> = rendered.toc.iter().map(|e| (e.level, e.source)).collect();
    assert_eq!(
        sources,
        vec![(1, TocSource::Surrounded), (2, TocSource::Html)]
    );
}

#[test]
fn test_around_handler_post_processes_tags() {
    let mut converter = Converter::new(Settings::default());
    converter
        .engine_mut()
        .add_handler(events::HTML_TAG, |inv, event| {
            let resolved = inv.proceed(event)?;
            Ok(Outcome::Handled(match resolved {
                Resolved::Element(mut el) if el.name() == "img" => {
                    el.attrs.insert("loading", AttrValue::text("lazy"));
                    Resolved::Element(el)
                }
                other => other,
            }))
        });
    assert_eq!(
        converter.process(r#"<img src="a.png">"#).unwrap().html,
        r#"<p><img src="a.png" loading="lazy"></p>"#
    );
}

#[test]
fn test_broken_chain_aborts_conversion() {
    let mut converter = Converter::new(Settings::default());
    converter
        .engine_mut()
        .add_handler(events::HTML_COMMENT, |inv, event| {
            // skips past the terminal handler
            inv.proceed(event.clone())?;
            inv.proceed(event).map(Outcome::Handled)
        });
    let err = converter.process("<!-- x -->").unwrap_err();
    assert_eq!(
        err,
        ConversionError::Chain(ChainError::Exhausted {
            event: events::HTML_COMMENT
        })
    );
}

#[test]
fn test_roots_applied() {
    let settings = Settings::default()
        .with_link_root("https://docs.example.com/")
        .with_image_root("/static");
    let rendered = Converter::new(settings)
        .process(r#"<a href="guide.html">g</a> <img src="logo.png"> <a href="/abs">a</a>"#)
        .unwrap();
    assert_eq!(
        rendered.summary.links,
        vec!["https://docs.example.com/guide.html", "/abs"]
    );
    assert_eq!(rendered.summary.images, vec!["/static/logo.png"]);
}
