//! Wiki-markup to sanitized HTML.
//!
//! The crate is built around four pieces every syntax module relies on:
//!
//! - [`chain`]: an ordered, interceptable handler chain per event;
//! - [`pattern`]: line and block pattern registries driven by [`Parser`];
//! - [`Modifier`]: the `.(title)[class #id]{style}<>` annotation parser;
//! - the tag sanitizer in [`modules`], enforcing an [`AllowPolicy`] and the
//!   [`Dtd`] content model.
//!
//! Finished output is parked as protected spans ([`ContentType`]) so it is
//! never scanned twice, and assembled at the end of a conversion.
//!
//! # Example
//!
//! ```
//! use wm_renderer::{Converter, Settings};
//!
//! let converter = Converter::new(Settings::safe_mode());
//! let rendered = converter
//!     .process("Hi **there** <a href=\"http://example.com/\" onclick=\"x()\">link</a>")
//!     .unwrap();
//!
//! assert_eq!(
//!     rendered.html,
//!     "<p>Hi <strong>there</strong> <a href=\"http://example.com/\" rel=\"nofollow\">link</a></p>"
//! );
//! assert_eq!(rendered.summary.links, vec!["http://example.com/"]);
//! ```

pub mod chain;
mod context;
mod converter;
mod dtd;
mod element;
mod engine;
mod modifier;
pub mod modules;
pub mod pattern;
mod policy;
mod protect;
mod url;
mod util;

pub use chain::{
    ChainError, CommentEvent, Event, HeadingEvent, Invocation, Outcome, PhraseEvent, PhraseKind,
    Resolved, TagEvent,
};
pub use context::{CloseMatch, ConversionContext, Settings, Summary, TocEntry, TocSource};
pub use converter::{ConversionError, Converter, Rendered};
pub use dtd::{Children, Dtd, ElementDef, ElementKind};
pub use element::{AttrValue, Attrs, Element};
pub use engine::{Engine, Module, Parser};
pub use modifier::{HAlign, Modifier, VAlign};
pub use modules::{HeadingModule, HtmlModule, PhraseModule};
pub use pattern::Modality;
pub use policy::{AllowList, AllowPolicy, TagPolicy};
pub use protect::{ContentType, ProtectedStore};
pub use url::{SchemeFilter, UrlFilter, UrlKind};
pub use util::{escape_html, unescape_html};
