//! Document/stream driver.
//!
//! Enforces the outer protocol of a single-document stream:
//! stream start, document start, one root node, document end, stream end.
//! A second document where the stream should end is an error.

use std::io::Read;

use crate::buffered_input::decode_slice;
use crate::builder::Builder;
use crate::error::Error;
use crate::events::{Event, EventSource};
use crate::live_events::LiveEvents;
use crate::node::Document;
use crate::options::Options;
use crate::tags::{TagHook, WrapTag};

/// Loads ASDF YAML trees with explicit configuration.
///
/// Holds the [`Options`] and the [`TagHook`] applied to every tagged node.
/// Each load starts from a fresh anchor table; nothing is shared between
/// loads except the hook itself.
///
/// ```rust
/// use asdf_yaml::{Arena, Loader, NodeId, Options};
///
/// let mut tags = Vec::new();
/// let mut loader = Loader::new(Options::default()).with_tag_hook(
///     |tag: &str, node: NodeId, _: &mut Arena| {
///         tags.push(tag.to_owned());
///         Ok::<_, String>(node)
///     },
/// );
/// let doc = loader.load_str("--- !core/asdf-1.1.0\nlibrary: !core/software-1.0.0 {}\n").unwrap();
/// assert_eq!(doc.root_ref().len(), 1);
/// drop(loader);
/// assert_eq!(tags, ["!core/asdf-1.1.0", "!core/software-1.0.0"]);
/// ```
pub struct Loader<H = WrapTag> {
    options: Options,
    hook: H,
}

impl Loader<WrapTag> {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            hook: WrapTag,
        }
    }
}

impl Default for Loader<WrapTag> {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl<H: TagHook> Loader<H> {
    /// Replace the tag hook.
    pub fn with_tag_hook<T: TagHook>(self, hook: T) -> Loader<T> {
        Loader {
            options: self.options,
            hook,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Load the single document in `input`.
    pub fn load_str(&mut self, input: &str) -> Result<Document, Error> {
        self.check_input_size(input.len())?;
        let mut events = LiveEvents::from_str(input);
        self.load_events(&mut events)
    }

    /// Load from bytes. The encoding is sniffed from a BOM (UTF-8 otherwise).
    pub fn load_slice(&mut self, bytes: &[u8]) -> Result<Document, Error> {
        self.check_input_size(bytes.len())?;
        let text = decode_slice(bytes).map_err(|cause| Error::Io { cause })?;
        let mut events = LiveEvents::from_str(&text);
        self.load_events(&mut events)
    }

    /// Load from a reader, pulling [`Options::read_chunk_size`] bytes at a
    /// time. A read failure surfaces as [`Error::Io`].
    ///
    /// The reader must own its data; borrowed bytes go through
    /// [`Loader::load_slice`].
    pub fn load_reader<R: Read + 'static>(&mut self, reader: R) -> Result<Document, Error> {
        let mut events = LiveEvents::from_reader(
            reader,
            self.options.read_chunk_size,
            self.options.max_input_bytes,
        );
        self.load_events(&mut events)
    }

    fn check_input_size(&self, len: usize) -> Result<(), Error> {
        match self.options.max_input_bytes {
            Some(limit) if len > limit => Err(Error::Io {
                cause: std::io::Error::new(
                    std::io::ErrorKind::FileTooLarge,
                    format!("input size limit of {limit} bytes exceeded"),
                ),
            }),
            _ => Ok(()),
        }
    }

    /// Load from any event producer.
    pub fn load_events<S: EventSource + ?Sized>(&mut self, events: &mut S) -> Result<Document, Error> {
        let mut builder = Builder::new(
            events,
            &mut self.hook,
            &self.options.omap_tag,
            self.options.duplicate_keys,
            self.options.budget.clone(),
        );
        let result = drive(&mut builder);

        // Reported on success and on breach, not on unrelated failures.
        let report = builder.take_report();
        if let (Some(report), Some(callback)) = (report, self.options.budget_report) {
            if matches!(result, Ok(_) | Err(Error::Budget { .. })) {
                callback(&report);
            }
        }

        let root = result?;
        Ok(builder.into_document(root))
    }
}

/// Consume exactly `expected`, a stream or document marker.
fn expect_marker<S, H>(builder: &mut Builder<'_, S, H>, expected: Event) -> Result<(), Error>
where
    S: EventSource + ?Sized,
    H: TagHook + ?Sized,
{
    let ev = builder.next_event()?;
    if ev == expected {
        Ok(())
    } else {
        Err(builder.unexpected(expected.name(), &ev))
    }
}

fn drive<S, H>(builder: &mut Builder<'_, S, H>) -> Result<crate::node::NodeId, Error>
where
    S: EventSource + ?Sized,
    H: TagHook + ?Sized,
{
    expect_marker(builder, Event::StreamStart)?;
    expect_marker(builder, Event::DocumentStart)?;
    log::debug!("document begin");

    let root = builder.expect_node("document root")?;

    expect_marker(builder, Event::DocumentEnd)?;
    log::debug!("document end: root {root}, {} anchors", builder.anchor_count());
    // Only one document per stream.
    expect_marker(builder, Event::StreamEnd)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VecEvents;

    #[test]
    fn single_document() {
        let mut events = VecEvents::document([Event::plain("x")]);
        let doc = Loader::default().load_events(&mut events).unwrap();
        assert_eq!(doc.root_ref().as_str(), Some("x"));
        assert_eq!(events.remaining(), 0);
    }

    #[test]
    fn second_document_is_rejected() {
        let mut events = VecEvents::new([
            Event::StreamStart,
            Event::DocumentStart,
            Event::plain("1"),
            Event::DocumentEnd,
            Event::DocumentStart,
            Event::plain("2"),
            Event::DocumentEnd,
            Event::StreamEnd,
        ]);
        let err = Loader::default().load_events(&mut events).unwrap_err();
        assert!(
            matches!(
                err,
                Error::Unexpected {
                    expected: "stream end",
                    found: "document start",
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn missing_markers() {
        let mut events = VecEvents::new([Event::DocumentStart]);
        let err = Loader::default().load_events(&mut events).unwrap_err();
        assert!(matches!(err, Error::Unexpected { expected: "stream start", .. }));

        let mut events = VecEvents::new([Event::StreamStart, Event::StreamEnd]);
        let err = Loader::default().load_events(&mut events).unwrap_err();
        assert!(matches!(err, Error::Unexpected { expected: "document start", .. }));

        let mut events = VecEvents::new([Event::StreamStart, Event::DocumentStart, Event::DocumentEnd]);
        let err = Loader::default().load_events(&mut events).unwrap_err();
        assert!(matches!(err, Error::Unexpected { expected: "document root", .. }));
    }

    #[test]
    fn custom_omap_tag() {
        let options = crate::options! { omap_tag: "!ordered".to_owned() };
        let mut events = VecEvents::document([
            Event::sequence_start().with_tag("!ordered"),
            Event::mapping_start(),
            Event::plain("k"),
            Event::plain("v"),
            Event::MappingEnd,
            Event::SequenceEnd,
        ]);
        let doc = Loader::new(options).load_events(&mut events).unwrap();
        assert!(matches!(doc.root_ref().node(), crate::Node::OrderedMapping(_)));
    }
}
