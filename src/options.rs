use serde::{Deserialize, Serialize};

use crate::budget::{Budget, BudgetReport};
use crate::tags::TAG_OMAP;

/// What to do when a mapping key repeats.
///
/// The loader builds dictionary-like mappings, so by default a repeated key
/// overwrites the earlier value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Error out on encountering a duplicate key.
    Error,
    /// First key wins: later duplicate pairs are parsed and ignored.
    FirstWins,
    /// Last key wins: the later value replaces the earlier one, which keeps
    /// its position.
    #[default]
    LastWins,
}

/// Loader configuration.
///
/// ```rust
/// use asdf_yaml::{from_str_with_options, DuplicateKeyPolicy};
///
/// let options = asdf_yaml::options! {
///     duplicate_keys: DuplicateKeyPolicy::Error,
/// };
/// assert!(from_str_with_options("a: 1\na: 2\n", options).is_err());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Optional resource budget enforced on the event stream. `None` disables it.
    pub budget: Option<Budget>,
    /// Optional callback invoked with the final budget report, both when the
    /// document loaded and when the budget was breached.
    #[serde(skip)]
    pub budget_report: Option<fn(&BudgetReport)>,
    /// Policy for repeated mapping keys.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Tag that turns a sequence of single-entry mappings into an ordered map.
    pub omap_tag: String,
    /// Hard cap on input size in bytes, for every kind of source.
    pub max_input_bytes: Option<usize>,
    /// Number of bytes requested from the reader per read call.
    pub read_chunk_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            budget_report: None,
            duplicate_keys: DuplicateKeyPolicy::default(),
            omap_tag: TAG_OMAP.to_owned(),
            max_input_bytes: None,
            read_chunk_size: 8 * 1024,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("budget", &self.budget)
            .field(
                "budget_report",
                &if self.budget_report.is_some() { "set" } else { "none" },
            )
            .field("duplicate_keys", &self.duplicate_keys)
            .field("omap_tag", &self.omap_tag)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("read_chunk_size", &self.read_chunk_size)
            .finish()
    }
}
