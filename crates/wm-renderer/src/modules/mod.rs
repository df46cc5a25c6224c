//! Built-in syntax modules.
//!
//! Each module registers patterns and a terminal handler on an [`Engine`].
//! Handlers registered afterwards wrap those, so callers can adjust results
//! without replacing a module:
//!
//! ```
//! use wm_renderer::{
//!     AttrValue, Converter, Outcome, Resolved, Settings,
//!     chain::events,
//! };
//!
//! let mut converter = Converter::new(Settings::default());
//! converter
//!     .engine_mut()
//!     .add_handler(events::HTML_TAG, |inv, event| {
//!         let resolved = inv.proceed(event)?;
//!         Ok(Outcome::Handled(match resolved {
//!             Resolved::Element(mut el) if el.name() == "table" => {
//!                 el.attrs.insert("class", AttrValue::List(vec!["grid".to_owned()]));
//!                 Resolved::Element(el)
//!             }
//!             other => other,
//!         }))
//!     });
//!
//! let html = converter.process("<table>").unwrap().html;
//! assert_eq!(html, r#"<table class="grid">"#);
//! ```
//!
//! [`Engine`]: crate::Engine

mod heading;
mod html;
mod phrase;

pub use heading::HeadingModule;
pub use html::{
    HtmlModule, comment_pattern, parse_attributes, sanitize_comment, sanitize_tag, tag_pattern,
};
pub use phrase::PhraseModule;
