//! Live events: owned events pulled from `saphyr_parser::Parser`.
//!
//! Responsibilities
//! - Convert the tokenizer's borrowed events into [`Event`]s.
//! - Render resolved tags as strings and numeric anchor ids as names.
//! - Drop the tokenizer's internal `Nothing` events.
//! - Turn the tokenizer's stand-in for an empty node back into empty text.
//! - Track the source location of the last event for diagnostics.
//! - Surface a read failure of the byte source in preference to the scan
//!   error it provoked.

use std::borrow::Cow;
use std::io::Read;

use saphyr_parser::{
    BorrowedInput, Event as RawEvent, Marker, Parser, ScalarStyle as RawStyle, StrInput, Tag,
};

use crate::buffered_input::{ReaderInput, SharedIoError, buffered_input_from_reader};
use crate::error::{Error, Location, location_from_span};
use crate::events::{Event, EventSource};

/// Event source backed by the `saphyr-parser` tokenizer.
///
/// Anchors are named by the tokenizer's numeric ids ("1", "2", ...), not by
/// their source spelling. Only string input keeps the text needed to name
/// an undefined alias in [`Error::UnknownAnchor`].
pub struct LiveEvents<'input, T: BorrowedInput<'input>> {
    parser: Parser<'input, T>,
    /// Source text, when parsing a string.
    source: Option<&'input str>,
    /// Read failure slot of a reader-backed input.
    io_error: Option<SharedIoError>,
    /// Location of the last yielded event.
    last_location: Location,
}

impl<'input> LiveEvents<'input, StrInput<'input>> {
    pub fn from_str(input: &'input str) -> Self {
        Self {
            parser: Parser::new_from_str(input),
            source: Some(input),
            io_error: None,
            last_location: Location::UNKNOWN,
        }
    }
}

impl LiveEvents<'static, ReaderInput<'static>> {
    /// Event source over a reader, pulling `chunk_size` bytes per read and
    /// failing with `FileTooLarge` past `max_bytes` decoded bytes.
    ///
    /// The tokenizer cannot lend text out of a streaming buffer, so the
    /// reader must own its data.
    pub fn from_reader<R: Read + 'static>(
        reader: R,
        chunk_size: usize,
        max_bytes: Option<usize>,
    ) -> Self {
        let (input, io_error) = buffered_input_from_reader(reader, chunk_size, max_bytes);
        Self {
            parser: Parser::new(input),
            source: None,
            io_error: Some(io_error),
            last_location: Location::UNKNOWN,
        }
    }
}

impl<'input, T: BorrowedInput<'input>> LiveEvents<'input, T> {
    fn take_io_error(&self) -> Option<Error> {
        let slot = self.io_error.as_ref()?;
        let cause = slot.borrow_mut().take()?;
        Some(Error::Io { cause })
    }

    /// Whether `value` is the `~` the tokenizer substitutes for an empty node.
    ///
    /// That stand-in is a static string. Text read from the input is either
    /// owned or a slice of the source, so a borrowed `~` from anywhere else
    /// was never written by the user.
    fn is_empty_node(&self, value: &Cow<'input, str>, style: RawStyle) -> bool {
        let Cow::Borrowed(text) = value else {
            return false;
        };
        if style != RawStyle::Plain || *text != "~" {
            return false;
        }
        !self
            .source
            .is_some_and(|src| src.as_bytes().as_ptr_range().contains(&text.as_ptr()))
    }

    /// Name of the alias written at `mark`, if the source text is at hand.
    fn alias_at(&self, mark: &Marker) -> Option<String> {
        let rest = self.source?.get(mark.byte_offset()?..)?;
        let rest = rest.strip_prefix('*').unwrap_or(rest);
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}'))
            .unwrap_or(rest.len());
        (end > 0).then(|| rest[..end].to_owned())
    }
}

impl<'input, T: BorrowedInput<'input>> EventSource for LiveEvents<'input, T> {
    fn next_event(&mut self) -> Result<Event, Error> {
        loop {
            let Some(item) = self.parser.next() else {
                if let Some(err) = self.take_io_error() {
                    return Err(err);
                }
                return Err(Error::eof().with_location(self.last_location));
            };
            let (raw, span) = match item {
                Ok(pair) => pair,
                Err(scan) => {
                    // Truncated input provokes scan errors; the read failure is the cause.
                    if let Some(err) = self.take_io_error() {
                        return Err(err);
                    }
                    let mark = *scan.marker();
                    let mut err = Error::from_scan_error(scan);
                    if let Error::UnknownAnchor { anchor, .. } = &mut err {
                        *anchor = self.alias_at(&mark);
                    }
                    return Err(err);
                }
            };
            let location = location_from_span(&span);

            let ev = match raw {
                RawEvent::Nothing => continue,
                RawEvent::StreamStart => Event::StreamStart,
                RawEvent::StreamEnd => {
                    // A read failure looks like a clean end of input to the tokenizer.
                    if let Some(err) = self.take_io_error() {
                        return Err(err);
                    }
                    Event::StreamEnd
                }
                RawEvent::DocumentStart(_) => Event::DocumentStart,
                RawEvent::DocumentEnd => Event::DocumentEnd,
                RawEvent::Alias(id) => Event::Alias {
                    anchor: anchor_name(id).unwrap_or_default(),
                },
                RawEvent::Scalar(value, style, id, tag) => {
                    let value = if self.is_empty_node(&value, style) {
                        String::new()
                    } else {
                        value.into_owned()
                    };
                    Event::Scalar {
                        value,
                        style: style.into(),
                        anchor: anchor_name(id),
                        tag: tag.map(render_tag),
                    }
                }
                RawEvent::SequenceStart(id, tag) => Event::SequenceStart {
                    anchor: anchor_name(id),
                    tag: tag.map(render_tag),
                },
                RawEvent::SequenceEnd => Event::SequenceEnd,
                RawEvent::MappingStart(id, tag) => Event::MappingStart {
                    anchor: anchor_name(id),
                    tag: tag.map(render_tag),
                },
                RawEvent::MappingEnd => Event::MappingEnd,
            };

            log::trace!("{location}: {ev:?}");
            self.last_location = location;
            return Ok(ev);
        }
    }

    fn last_location(&self) -> Location {
        self.last_location
    }
}

/// The tokenizer numbers anchors from 1; 0 means "no anchor".
fn anchor_name(id: usize) -> Option<String> {
    (id != 0).then(|| id.to_string())
}

/// Full tag text: the handle is already expanded by the tokenizer
/// (`!!` becomes `tag:yaml.org,2002:`).
fn render_tag(tag: Cow<'_, Tag>) -> String {
    format!("{}{}", tag.handle, tag.suffix)
}
