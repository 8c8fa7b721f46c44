//! Defines error and its location
use std::fmt;

use saphyr_parser::{ScanError, Span};

use crate::budget::BudgetBreach;

/// Row/column location within the source YAML document (1-indexed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    /// 1-indexed row number in the input stream.
    pub(crate) row: u32,
    /// 1-indexed column number in the input stream.
    pub(crate) column: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    ///
    /// Used when a precise position is not available, e.g. for events that
    /// were produced by hand rather than by the tokenizer.
    pub const UNKNOWN: Self = Self { row: 0, column: 0 };

    /// Create a new location record from 1-indexed coordinates.
    pub(crate) const fn new(row: usize, column: usize) -> Self {
        // Error reporting only; documents with more than 4G lines are not a concern.
        Self {
            row: row as u32,
            column: column as u32,
        }
    }

    /// 1-indexed line.
    pub fn line(&self) -> u64 {
        self.row as u64
    }

    /// 1-indexed column.
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    pub(crate) fn is_known(&self) -> bool {
        self != &Location::UNKNOWN
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.row, self.column)
    }
}

/// Convert a `saphyr_parser::Span` to a 1-indexed `Location`.
///
/// Called by:
/// - The live events adapter for each raw parser event.
pub(crate) fn location_from_span(span: &Span) -> Location {
    let start = &span.start;
    Location::new(start.line(), start.col() + 1)
}

/// Everything that can abort a parse.
///
/// There is no partial result: any of these unwinds the whole document and
/// releases every node built so far.
#[derive(Debug)]
pub enum Error {
    /// The byte source failed. Never retried.
    Io { cause: std::io::Error },
    /// The tokenizer rejected the input as malformed YAML.
    Scan { msg: String, location: Location },
    /// An event of the wrong kind appeared where the document protocol
    /// requires a specific one.
    Unexpected {
        /// What the construction step was waiting for.
        expected: &'static str,
        /// Name of the event actually observed.
        found: &'static str,
        location: Location,
    },
    /// The event stream ended before the document was complete.
    Eof { location: Location },
    /// Alias references an anchor that was never registered in this document.
    ///
    /// When the tokenizer catches the dangling alias, the name is read back
    /// from the source text; `anchor` is `None` for streaming input, which
    /// keeps no text to read it from.
    UnknownAnchor {
        anchor: Option<String>,
        location: Location,
    },
    /// The tag hook rejected a tag/node pair.
    Hook {
        tag: String,
        msg: String,
        location: Location,
    },
    /// A mapping key repeated under [`crate::DuplicateKeyPolicy::Error`].
    DuplicateKey { key: String, location: Location },
    /// A [`crate::Budget`] limit was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
}

impl Error {
    pub(crate) fn unexpected(expected: &'static str, found: &'static str) -> Self {
        Error::Unexpected {
            expected,
            found,
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn eof() -> Self {
        Error::Eof {
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unknown_anchor(anchor: &str) -> Self {
        Error::UnknownAnchor {
            anchor: Some(anchor.to_owned()),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn hook(tag: &str, msg: String) -> Self {
        Error::Hook {
            tag: tag.to_owned(),
            msg,
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn duplicate_key(key: String) -> Self {
        Error::DuplicateKey {
            key,
            location: Location::UNKNOWN,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    ///
    /// `Io` errors carry no location and are returned unchanged.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::Scan { location, .. }
            | Error::Unexpected { location, .. }
            | Error::Eof { location }
            | Error::UnknownAnchor { location, .. }
            | Error::Hook { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::Budget { location, .. } => {
                *location = set_location;
            }
            Error::Io { .. } => {}
        }
        self
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Scan { location, .. }
            | Error::Unexpected { location, .. }
            | Error::Eof { location }
            | Error::UnknownAnchor { location, .. }
            | Error::Hook { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::Budget { location, .. } => location.is_known().then_some(*location),
            Error::Io { .. } => None,
        }
    }

    /// Map a `saphyr_parser::ScanError` into our error type with location.
    ///
    /// The tokenizer resolves aliases itself and reports a dangling one as a
    /// scan error; that case is surfaced as [`Error::UnknownAnchor`] so callers
    /// see the same category regardless of which layer caught it. The name is
    /// left for the caller to fill in.
    pub(crate) fn from_scan_error(err: ScanError) -> Self {
        let mark = err.marker();
        let location = Location::new(mark.line(), mark.col() + 1);
        if err.info().contains("unknown anchor") {
            return Error::UnknownAnchor {
                anchor: None,
                location,
            };
        }
        Error::Scan {
            msg: err.info().to_owned(),
            location,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { cause } => write!(f, "IO error: {cause}"),
            Error::Scan { msg, location } => fmt_with_location(f, msg, location),
            Error::Unexpected {
                expected,
                found,
                location,
            } => fmt_with_location(
                f,
                &format!("unexpected event: expected {expected}, found {found}"),
                location,
            ),
            Error::Eof { location } => fmt_with_location(f, "unexpected end of input", location),
            Error::UnknownAnchor {
                anchor: Some(anchor),
                location,
            } => fmt_with_location(
                f,
                &format!("alias references unknown anchor `{anchor}`"),
                location,
            ),
            Error::UnknownAnchor {
                anchor: None,
                location,
            } => fmt_with_location(f, "alias references unknown anchor", location),
            Error::Hook { tag, msg, location } => {
                fmt_with_location(f, &format!("tag `{tag}` rejected: {msg}"), location)
            }
            Error::DuplicateKey { key, location } => {
                fmt_with_location(f, &format!("duplicate mapping key: {key}"), location)
            }
            Error::Budget { breach, location } => {
                fmt_with_location(f, &format!("YAML budget breached: {breach:?}"), location)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { cause } => Some(cause),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(cause: std::io::Error) -> Self {
        Error::Io { cause }
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location.is_known() {
        write!(f, "{msg} at {location}")
    } else {
        write!(f, "{msg}")
    }
}

/// Convert a budget breach report into a user-facing error.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}
