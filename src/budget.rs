//! Streaming budget checker over the event stream.
//!
//! The loader feeds every event it consumes through a [`BudgetEnforcer`] and
//! aborts as soon as a limit is exceeded. This bounds the work and memory a
//! hostile document can demand. The recursion of the tree builder is bounded
//! separately by [`MAX_NESTING_DEPTH`], with or without a budget.

use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Nesting depth the builder never goes past, budget or not.
///
/// Deeper input fails with [`BudgetBreach::Depth`] instead of exhausting the
/// stack. A [`Budget::max_depth`] above this value has no further effect.
pub const MAX_NESTING_DEPTH: usize = 1_000;

/// Budgets for one parse.
///
/// The defaults are permissive for typical ASDF trees while stopping
/// resource-amplifying inputs. Tune them if you regularly load very large
/// metadata trees.
///
/// ```rust
/// let mut options = asdf_yaml::Options::default();
/// options.budget = asdf_yaml::budget! { max_depth: 64 };
///
/// let doc = asdf_yaml::from_str_with_options("a: [1, 2, 3]", options).unwrap();
/// assert_eq!(doc.root_ref().get("a").unwrap().len(), 3);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Maximum total events (counting every event).
    ///
    /// Default: 1,000,000
    pub max_events: usize,
    /// Maximum number of alias (`*ref`) events.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximum number of anchor definitions (`&anchor`).
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum structural nesting depth (sequences + mappings).
    ///
    /// Capped by [`MAX_NESTING_DEPTH`].
    ///
    /// Default: 1,000
    pub max_depth: usize,
    /// Maximum number of nodes (sequence starts, mapping starts, scalars).
    ///
    /// Default: 250,000
    pub max_nodes: usize,
    /// Maximum total bytes of scalar text.
    ///
    /// Default: 67,108,864 (64 MiB)
    pub max_total_scalar_bytes: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_anchors: 50_000,
            max_depth: MAX_NESTING_DEPTH,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetBreach {
    /// The total number of events exceeded [`Budget::max_events`].
    Events { events: usize },
    /// The number of alias events exceeded [`Budget::max_aliases`].
    Aliases { aliases: usize },
    /// The number of anchor definitions exceeded [`Budget::max_anchors`].
    Anchors { anchors: usize },
    /// The nesting depth exceeded [`Budget::max_depth`].
    Depth { depth: usize },
    /// The number of nodes exceeded [`Budget::max_nodes`].
    Nodes { nodes: usize },
    /// The cumulative scalar text exceeded [`Budget::max_total_scalar_bytes`].
    ScalarBytes { total_scalar_bytes: usize },
}

/// Counters collected while enforcing a budget.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded.
    pub breached: Option<BudgetBreach>,
    pub events: usize,
    pub aliases: usize,
    pub anchors: usize,
    pub nodes: usize,
    /// Deepest nesting reached.
    pub max_depth: usize,
    pub total_scalar_bytes: usize,
}

/// Stateful helper that enforces a [`Budget`] while consuming [`Event`]s.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
        }
    }

    /// Observe an event, updating the counters.
    ///
    /// Returns `Err(BudgetBreach)` as soon as a limit is exceeded; the breach
    /// is also recorded in the report.
    pub fn observe(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        self.check(ev).inspect_err(|breach| {
            self.report.breached = Some(breach.clone());
        })
    }

    fn check(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        self.report.events += 1;
        if self.report.events > self.budget.max_events {
            return Err(BudgetBreach::Events {
                events: self.report.events,
            });
        }

        match ev {
            Event::StreamStart | Event::StreamEnd | Event::DocumentStart | Event::DocumentEnd => {}
            Event::Alias { .. } => {
                self.report.aliases += 1;
                if self.report.aliases > self.budget.max_aliases {
                    return Err(BudgetBreach::Aliases {
                        aliases: self.report.aliases,
                    });
                }
            }
            Event::Scalar { value, anchor, .. } => {
                self.bump_nodes()?;
                self.report.total_scalar_bytes =
                    self.report.total_scalar_bytes.saturating_add(value.len());
                if self.report.total_scalar_bytes > self.budget.max_total_scalar_bytes {
                    return Err(BudgetBreach::ScalarBytes {
                        total_scalar_bytes: self.report.total_scalar_bytes,
                    });
                }
                self.record_anchor(anchor.as_deref())?;
            }
            Event::SequenceStart { anchor, .. } | Event::MappingStart { anchor, .. } => {
                self.bump_nodes()?;
                self.depth = self.depth.saturating_add(1);
                if self.depth > self.report.max_depth {
                    self.report.max_depth = self.depth;
                }
                if self.depth > self.budget.max_depth {
                    return Err(BudgetBreach::Depth { depth: self.depth });
                }
                self.record_anchor(anchor.as_deref())?;
            }
            Event::SequenceEnd | Event::MappingEnd => {
                // Unbalanced ends are a structural error reported by the builder.
                self.depth = self.depth.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn bump_nodes(&mut self) -> Result<(), BudgetBreach> {
        self.report.nodes += 1;
        if self.report.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            });
        }
        Ok(())
    }

    fn record_anchor(&mut self, anchor: Option<&str>) -> Result<(), BudgetBreach> {
        if anchor.is_some_and(|a| !a.is_empty()) {
            self.report.anchors += 1;
            if self.report.anchors > self.budget.max_anchors {
                return Err(BudgetBreach::Anchors {
                    anchors: self.report.anchors,
                });
            }
        }
        Ok(())
    }

    /// Current counters.
    pub fn report(&self) -> &BudgetReport {
        &self.report
    }

    /// Finish and return the report.
    pub fn finalize(self) -> BudgetReport {
        self.report
    }
}
