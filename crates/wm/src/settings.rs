//! Mapping of `wikimark.toml` onto renderer settings.

use std::collections::BTreeMap;

use wm_config::{Config, NameList, TagsSetting};
use wm_renderer::{AllowList, AllowPolicy, SchemeFilter, Settings, TagPolicy};

/// Build conversion settings from a loaded configuration.
///
/// `safe_mode` picks the starting preset; every section present in the file
/// then overrides the matching part of it. When the command line forced safe
/// mode, the preset's policy, nofollow and scheme filter are applied again
/// on top of the file sections.
pub(crate) fn settings_from_config(config: &Config) -> Settings {
    let mut settings = if config.safe_mode {
        Settings::safe_mode()
    } else {
        Settings::default()
    };

    settings.policy = policy_from_config(config, settings.policy.clone());
    if let Some(pass) = config.html.pass_comments_setting() {
        settings.pass_comments = pass;
    }
    if let Some(force) = config.links.force_nofollow_setting() {
        settings.force_nofollow = force;
    }

    if config.links.schemes.is_some() || config.images.schemes.is_some() {
        let mut filter = if config.safe_mode {
            SchemeFilter::safe()
        } else {
            SchemeFilter::new()
        };
        if let Some(schemes) = &config.links.schemes {
            filter = filter.with_anchor_schemes(schemes);
        }
        if let Some(schemes) = &config.images.schemes {
            filter = filter.with_image_schemes(schemes);
        }
        settings = settings.with_url_filter(filter);
    }

    if config.safe_forced {
        let safe = Settings::safe_mode();
        settings.policy = safe.policy;
        settings.force_nofollow = safe.force_nofollow;
        settings = settings.with_url_filter(SchemeFilter::safe());
    }

    if let Some(root) = &config.links.root {
        settings = settings.with_link_root(root.as_str());
    }
    if let Some(root) = &config.images.root {
        settings = settings.with_image_root(root.as_str());
    }

    tracing::debug!(
        safe_mode = config.safe_mode,
        pass_comments = settings.pass_comments,
        force_nofollow = settings.force_nofollow,
        "Settings resolved"
    );
    settings
}

fn policy_from_config(config: &Config, base: AllowPolicy) -> AllowPolicy {
    let mut policy = base;
    if let Some(tags) = &config.policy.tags {
        policy.tags = match tags {
            TagsSetting::Toggle(true) => TagPolicy::All,
            TagsSetting::Toggle(false) => TagPolicy::None,
            TagsSetting::PerTag(tags) => TagPolicy::Subset(
                tags.iter()
                    .map(|(tag, attrs)| (tag.to_ascii_lowercase(), attribute_list(attrs)))
                    .collect::<BTreeMap<_, _>>(),
            ),
        };
    }
    if let Some(classes) = &config.policy.classes {
        policy.classes = name_list(classes, |class| class.to_owned());
    }
    if let Some(styles) = &config.policy.styles {
        policy.styles = name_list(styles, str::to_ascii_lowercase);
    }
    policy
}

/// Attribute list of one tag: `false` keeps the tag but no attribute.
fn attribute_list(attrs: &NameList) -> AllowList {
    name_list(attrs, str::to_ascii_lowercase)
}

fn name_list(list: &NameList, normalize: fn(&str) -> String) -> AllowList {
    match list {
        NameList::Toggle(true) => AllowList::All,
        NameList::Toggle(false) => AllowList::None,
        NameList::Names(names) => AllowList::subset(names.iter().map(|n| normalize(n.trim()))),
    }
}

/// One line per policy part, for `check-policy`.
pub(crate) fn describe_policy(policy: &AllowPolicy) -> Vec<String> {
    let mut lines = Vec::new();
    match &policy.tags {
        TagPolicy::All => lines.push("tags: all".to_owned()),
        TagPolicy::None => lines.push("tags: none".to_owned()),
        TagPolicy::Subset(tags) => {
            lines.push(format!("tags: {}", tags.len()));
            for (tag, attrs) in tags {
                lines.push(format!("  {tag}: {}", describe_list(attrs)));
            }
        }
    }
    lines.push(format!("classes: {}", describe_list(&policy.classes)));
    lines.push(format!("styles: {}", describe_list(&policy.styles)));
    lines
}

fn describe_list(list: &AllowList) -> String {
    match list {
        AllowList::All => "all".to_owned(),
        AllowList::None => "none".to_owned(),
        AllowList::Subset(names) => names.iter().cloned().collect::<Vec<_>>().join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wm_renderer::Converter;

    fn config(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    fn convert(config: &Config, text: &str) -> String {
        Converter::new(settings_from_config(config))
            .process(text)
            .unwrap()
            .html
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from_config(&Config::default());
        assert_eq!(settings.policy, AllowPolicy::default());
        assert!(settings.pass_comments);
        assert!(!settings.force_nofollow);
        assert!(settings.link_root.is_none());
    }

    #[test]
    fn test_safe_mode_preset() {
        let settings = settings_from_config(&config("safe_mode = true\n"));
        assert_eq!(settings.policy, AllowPolicy::safe());
        assert!(settings.force_nofollow);
    }

    #[test]
    fn test_sections_override_safe_preset() {
        let cfg = config(
            r#"
safe_mode = true

[policy]
classes = ["note"]

[links]
force_nofollow = false
"#,
        );
        let settings = settings_from_config(&cfg);
        assert_eq!(settings.policy.classes, AllowList::subset(["note"]));
        assert_eq!(settings.policy.tags, AllowPolicy::safe().tags);
        assert!(!settings.force_nofollow);
    }

    #[test]
    fn test_forced_safe_mode_wins_over_sections() {
        let mut cfg = config(
            r#"
[policy]
tags = true
classes = true

[links]
force_nofollow = false
schemes = ["javascript", "http"]
"#,
        );
        cfg.safe_mode = true;
        cfg.safe_forced = true;

        let settings = settings_from_config(&cfg);
        assert_eq!(settings.policy, AllowPolicy::safe());
        assert!(settings.force_nofollow);
        assert_eq!(
            convert(&cfg, r#"<script>x</script><div>y</div> <a href="http://h/f">f</a>"#),
            r#"<p>xy <a href="http://h/f" rel="nofollow">f</a></p>"#
        );
    }

    #[test]
    fn test_per_tag_policy() {
        let cfg = config(
            r#"
[policy.tags]
A = ["HREF"]
br = false
span = true
"#,
        );
        let policy = settings_from_config(&cfg).policy;
        let TagPolicy::Subset(tags) = &policy.tags else {
            panic!("expected subset");
        };
        assert_eq!(tags["a"], AllowList::subset(["href"]));
        assert_eq!(tags["br"], AllowList::None);
        assert_eq!(tags["span"], AllowList::All);
        assert!(!policy.tags.allows_tag("div"));
    }

    #[test]
    fn test_tags_toggle() {
        let policy = settings_from_config(&config("[policy]\ntags = false\n")).policy;
        assert_eq!(policy.tags, TagPolicy::None);
        let policy = settings_from_config(&config("[policy]\ntags = true\n")).policy;
        assert_eq!(policy.tags, TagPolicy::All);
    }

    #[test]
    fn test_styles_lowercased() {
        let policy = settings_from_config(&config("[policy]\nstyles = [\"Color\"]\n")).policy;
        assert!(policy.allows_style("color"));
        assert!(!policy.allows_style("width"));
    }

    #[test]
    fn test_link_schemes_and_root() {
        let cfg = config(
            r#"
[links]
schemes = ["https"]
root = "/docs"
"#,
        );
        let rendered = Converter::new(settings_from_config(&cfg))
            .process(r#"<a href="http://x.org/">a <a href="https://x.org/">b</a> <a href="page">c</a>"#)
            .unwrap();
        assert_eq!(
            rendered.html,
            r#"<p>a <a href="https://x.org/">b</a> <a href="/docs/page">c</a></p>"#
        );
        assert_eq!(rendered.summary.links, vec!["https://x.org/", "/docs/page"]);
    }

    #[test]
    fn test_comments_toggle() {
        let cfg = config("[html]\npass_comments = false\n");
        assert_eq!(convert(&cfg, "x <!-- y -->"), "<p>x</p>");
    }

    #[test]
    fn test_describe_policy() {
        let lines = describe_policy(&AllowPolicy::safe());
        assert_eq!(lines[0], "tags: 13");
        assert!(lines.contains(&"  a: href title".to_owned()));
        assert!(lines.contains(&"  b: none".to_owned()));
        assert_eq!(lines.last().map(String::as_str), Some("styles: none"));
    }
}
