//! `miette` integration.
//!
//! This module is feature-gated behind the `miette` feature.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};

use crate::{Error, Location};

/// Convert a load [`Error`] into a `miette::Report`, labelling the error
/// position in `source` when it is known.
///
/// ```rust,no_run
/// let yaml = "a: *missing\n";
///
/// let err = asdf_yaml::from_str(yaml).expect_err("unknown alias");
/// let report = asdf_yaml::miette::to_miette_report(&err, yaml, "tree.yaml");
/// eprintln!("{report:?}");
/// ```
pub fn to_miette_report(err: &Error, source: &str, file: &str) -> miette::Report {
    let src = Arc::new(NamedSource::new(file, source.to_owned()));
    let labels = err
        .location()
        .and_then(|location| byte_offset(source, location))
        .map(|offset| {
            vec![LabeledSpan::new_with_span(
                Some(label(err).to_owned()),
                SourceSpan::new(offset.into(), 1),
            )]
        })
        .unwrap_or_default();
    miette::Report::new(ErrorDiagnostic {
        message: err.to_string(),
        code: code(err),
        src,
        labels,
    })
}

/// Stable diagnostic code per error category.
pub fn code(err: &Error) -> &'static str {
    match err {
        Error::Io { .. } => "asdf_yaml::io",
        Error::Scan { .. } => "asdf_yaml::syntax",
        Error::Unexpected { .. } | Error::Eof { .. } => "asdf_yaml::structure",
        Error::UnknownAnchor { .. } => "asdf_yaml::unknown_anchor",
        Error::Hook { .. } => "asdf_yaml::tag_hook",
        Error::DuplicateKey { .. } => "asdf_yaml::duplicate_key",
        Error::Budget { .. } => "asdf_yaml::budget",
    }
}

fn label(err: &Error) -> &'static str {
    match err {
        Error::Scan { .. } => "invalid syntax",
        Error::Unexpected { .. } => "unexpected here",
        Error::Eof { .. } => "input ends here",
        Error::UnknownAnchor { .. } => "alias",
        Error::Hook { .. } => "tagged node",
        Error::DuplicateKey { .. } => "repeated key",
        Error::Budget { .. } => "limit exceeded",
        Error::Io { .. } => "here",
    }
}

/// Byte offset of a 1-based line/column (columns count characters).
fn byte_offset(source: &str, location: Location) -> Option<usize> {
    let line = usize::try_from(location.line()).ok()?.checked_sub(1)?;
    let column = usize::try_from(location.column()).ok()?.checked_sub(1)?;
    let mut start = 0;
    for (n, text) in source.split_inclusive('\n').enumerate() {
        if n == line {
            let within = text
                .char_indices()
                .nth(column)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            return Some(start + within);
        }
        start += text.len();
    }
    // Position just past the last line (end of input).
    (line == source.split_inclusive('\n').count()).then_some(source.len())
}

#[derive(Clone, Debug)]
struct ErrorDiagnostic {
    message: String,
    code: &'static str,
    src: Arc<NamedSource<String>>,
    labels: Vec<LabeledSpan>,
}

impl fmt::Display for ErrorDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorDiagnostic {}

impl Diagnostic for ErrorDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            None
        } else {
            Some(Box::new(self.labels.iter().cloned()))
        }
    }
}
