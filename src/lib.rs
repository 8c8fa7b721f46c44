//! Deserialization core for ASDF YAML trees.
//!
//! Turns the event stream of a YAML tokenizer into an in-memory document
//! graph:
//! - Scalars are typed (null, bool, integer, float, string) from their text.
//! - Anchors and aliases share nodes by identity; cycles are allowed.
//! - A sequence tagged `!!omap` becomes an ordered mapping.
//! - Every other explicit tag is handed to a [`TagHook`].
//!
//! Exactly one document per stream is accepted.
//!
//! ```rust
//! let yaml = indoc::indoc! {"
//!     shape: &s [3, 4]
//!     again: *s
//!     unit: !unit/unit-1.0.0 m
//! "};
//! let doc = asdf_yaml::from_str(yaml).unwrap();
//! let root = doc.root_ref();
//! assert!(root.get("shape").unwrap().same_node(&root.get("again").unwrap()));
//! assert_eq!(root.get("unit").unwrap().tag(), Some("!unit/unit-1.0.0"));
//! ```

use std::io::Read;

mod anchors;
pub mod budget;
mod buffered_input;
mod builder;
mod error;
pub mod events;
pub mod live_events;
mod loader;
mod macros;
#[cfg(feature = "miette")]
pub mod miette;
mod node;
mod options;
pub mod parse_scalars;
mod tags;

pub use budget::{Budget, BudgetBreach, BudgetReport, MAX_NESTING_DEPTH};
pub use error::{Error, Location};
pub use events::{Event, EventSource, ScalarStyle, VecEvents};
pub use live_events::LiveEvents;
pub use loader::Loader;
pub use node::{Arena, Document, Node, NodeId, NodeRef, Scalar};
pub use options::{DuplicateKeyPolicy, Options};
pub use tags::{TAG_OMAP, TagHook, WrapTag, YAML_TAG_PREFIX};

/// Load the single document in a YAML string with default [`Options`].
///
/// ```rust
/// let doc = asdf_yaml::from_str("[1, 2.5, true, null, text]").unwrap();
/// let kinds: Vec<_> = doc
///     .root_ref()
///     .items()
///     .map(|n| n.as_scalar().unwrap().kind())
///     .collect();
/// assert_eq!(kinds, ["integer", "float", "bool", "null", "string"]);
/// ```
pub fn from_str(input: &str) -> Result<Document, Error> {
    from_str_with_options(input, Options::default())
}

/// Load the single document in a YAML string.
pub fn from_str_with_options(input: &str, options: Options) -> Result<Document, Error> {
    Loader::new(options).load_str(input)
}

/// Load from bytes; UTF-16 input is recognized by its BOM.
///
/// The slice is decoded in full before parsing. Bytes that are not valid
/// UTF-8 fail with an [`Error::Io`] of kind `InvalidData`.
pub fn from_slice(bytes: &[u8]) -> Result<Document, Error> {
    from_slice_with_options(bytes, Options::default())
}

pub fn from_slice_with_options(bytes: &[u8], options: Options) -> Result<Document, Error> {
    Loader::new(options).load_slice(bytes)
}

/// Load from a reader, which is read incrementally. Borrowed bytes go
/// through [`from_slice`] instead.
///
/// ```rust
/// use std::io::Cursor;
///
/// let doc = asdf_yaml::from_reader(Cursor::new(b"a: 1\n".to_vec())).unwrap();
/// assert_eq!(doc.root_ref().get("a").unwrap().as_i64(), Some(1));
/// ```
pub fn from_reader<R: Read + 'static>(reader: R) -> Result<Document, Error> {
    from_reader_with_options(reader, Options::default())
}

pub fn from_reader_with_options<R: Read + 'static>(reader: R, options: Options) -> Result<Document, Error> {
    Loader::new(options).load_reader(reader)
}

/// Build a document from any event producer with default [`Options`].
///
/// ```rust
/// use asdf_yaml::{Event, VecEvents};
///
/// let mut events = VecEvents::document([
///     Event::sequence_start(),
///     Event::plain("0x1A"),
///     Event::SequenceEnd,
/// ]);
/// let doc = asdf_yaml::from_events(&mut events).unwrap();
/// assert_eq!(doc.root_ref().index(0).unwrap().as_i64(), Some(26));
/// ```
pub fn from_events<S: EventSource + ?Sized>(events: &mut S) -> Result<Document, Error> {
    Loader::default().load_events(events)
}
