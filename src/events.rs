//! Owned syntactic events consumed by the tree builder.
//!
//! The builder never talks to a tokenizer directly. It pulls [`Event`]s from
//! an [`EventSource`], which is implemented by the `saphyr-parser` adapter
//! ([`crate::live_events`]) and by [`VecEvents`] for prepared streams.

use std::collections::VecDeque;

use crate::error::{Error, Location};

/// How a scalar was written in the source.
///
/// Only the quoted styles matter for typing: quoted scalars are always
/// strings, every other style goes through implicit type resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    #[inline]
    pub fn is_quoted(self) -> bool {
        matches!(self, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted)
    }
}

impl From<saphyr_parser::ScalarStyle> for ScalarStyle {
    #[allow(unreachable_patterns)]
    fn from(style: saphyr_parser::ScalarStyle) -> Self {
        match style {
            saphyr_parser::ScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            saphyr_parser::ScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            saphyr_parser::ScalarStyle::Literal => ScalarStyle::Literal,
            saphyr_parser::ScalarStyle::Folded => ScalarStyle::Folded,
            // Plain, and anything the tokenizer adds later, types like plain.
            _ => ScalarStyle::Plain,
        }
    }
}

/// One syntactic event. Tags are fully resolved strings; anchors are names.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
    },
    MappingEnd,
    Scalar {
        value: String,
        style: ScalarStyle,
        anchor: Option<String>,
        tag: Option<String>,
    },
    Alias {
        anchor: String,
    },
}

impl Event {
    /// Short human name used in structural error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Event::StreamStart => "stream start",
            Event::StreamEnd => "stream end",
            Event::DocumentStart => "document start",
            Event::DocumentEnd => "document end",
            Event::SequenceStart { .. } => "sequence start",
            Event::SequenceEnd => "sequence end",
            Event::MappingStart { .. } => "mapping start",
            Event::MappingEnd => "mapping end",
            Event::Scalar { .. } => "scalar",
            Event::Alias { .. } => "alias",
        }
    }

    /// Plain, untagged, unanchored scalar.
    pub fn plain(value: impl Into<String>) -> Self {
        Event::Scalar {
            value: value.into(),
            style: ScalarStyle::Plain,
            anchor: None,
            tag: None,
        }
    }

    /// Untagged, unanchored scalar with an explicit style.
    pub fn scalar(value: impl Into<String>, style: ScalarStyle) -> Self {
        Event::Scalar {
            value: value.into(),
            style,
            anchor: None,
            tag: None,
        }
    }

    pub fn sequence_start() -> Self {
        Event::SequenceStart {
            anchor: None,
            tag: None,
        }
    }

    pub fn mapping_start() -> Self {
        Event::MappingStart {
            anchor: None,
            tag: None,
        }
    }

    pub fn alias(anchor: impl Into<String>) -> Self {
        Event::Alias {
            anchor: anchor.into(),
        }
    }

    /// Attach an anchor to a node event. Other events are returned unchanged.
    pub fn with_anchor(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Event::SequenceStart { anchor, .. }
            | Event::MappingStart { anchor, .. }
            | Event::Scalar { anchor, .. } => *anchor = Some(name.into()),
            _ => {}
        }
        self
    }

    /// Attach a tag to a node event. Other events are returned unchanged.
    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Event::SequenceStart { tag, .. }
            | Event::MappingStart { tag, .. }
            | Event::Scalar { tag, .. } => *tag = Some(name.into()),
            _ => {}
        }
        self
    }
}

/// Pull-based producer of events.
pub trait EventSource {
    /// Consume the next event. Running past the end of the stream is an
    /// [`Error::Eof`].
    fn next_event(&mut self) -> Result<Event, Error>;

    /// Location of the most recently returned event.
    fn last_location(&self) -> Location;
}

/// Replays a prepared list of events.
///
/// Locations are unknown since there is no source text behind the events.
#[derive(Clone, Debug, Default)]
pub struct VecEvents {
    events: VecDeque<Event>,
}

impl VecEvents {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Wrap `body` (the events of one root node) in stream and document markers.
    pub fn document(body: impl IntoIterator<Item = Event>) -> Self {
        let mut events = VecDeque::new();
        events.push_back(Event::StreamStart);
        events.push_back(Event::DocumentStart);
        events.extend(body);
        events.push_back(Event::DocumentEnd);
        events.push_back(Event::StreamEnd);
        Self { events }
    }

    /// Events not consumed yet.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for VecEvents {
    fn next_event(&mut self) -> Result<Event, Error> {
        self.events.pop_front().ok_or_else(Error::eof)
    }

    fn last_location(&self) -> Location {
        Location::UNKNOWN
    }
}
