//! Recursive-descent construction of the document graph.
//!
//! "Parse one node" has three outcomes: a node, the event that ended the
//! enclosing collection ([`Step::End`]), or an error. Callers decide whether
//! the end event is the one they were waiting for.
//!
//! Ownership follows the arena: every node lives in the builder's [`Arena`]
//! until the document is handed out, so an error on any path drops the arena
//! and with it every partially built container.

use ahash::AHashMap;

use crate::anchors::AnchorTable;
use crate::budget::{Budget, BudgetBreach, BudgetEnforcer, BudgetReport, MAX_NESTING_DEPTH};
use crate::error::{Error, budget_error};
use crate::events::{Event, EventSource, ScalarStyle};
use crate::node::{Arena, Document, Node, NodeId, Scalar};
use crate::options::DuplicateKeyPolicy;
use crate::parse_scalars::resolve_scalar;
use crate::tags::{TagHook, apply_tag};

/// Outcome of parsing one node.
#[derive(Debug)]
pub(crate) enum Step {
    Node(NodeId),
    /// The consumed event was not a node start; it closes something.
    End(Event),
}

pub(crate) struct Builder<'a, S: EventSource + ?Sized, H: TagHook + ?Sized> {
    events: &'a mut S,
    hook: &'a mut H,
    omap_tag: &'a str,
    duplicate_keys: DuplicateKeyPolicy,
    budget: Option<BudgetEnforcer>,
    arena: Arena,
    anchors: AnchorTable,
    /// Containers currently open.
    depth: usize,
}

impl<'a, S: EventSource + ?Sized, H: TagHook + ?Sized> Builder<'a, S, H> {
    pub(crate) fn new(
        events: &'a mut S,
        hook: &'a mut H,
        omap_tag: &'a str,
        duplicate_keys: DuplicateKeyPolicy,
        budget: Option<Budget>,
    ) -> Self {
        Self {
            events,
            hook,
            omap_tag,
            duplicate_keys,
            budget: budget.map(BudgetEnforcer::new),
            arena: Arena::new(),
            anchors: AnchorTable::new(),
            depth: 0,
        }
    }

    /// Pull the next event, charging it to the budget.
    pub(crate) fn next_event(&mut self) -> Result<Event, Error> {
        let ev = self.events.next_event()?;
        if let Some(budget) = self.budget.as_mut() {
            budget
                .observe(&ev)
                .map_err(|breach| budget_error(breach).with_location(self.events.last_location()))?;
        }
        Ok(ev)
    }

    /// Structural error at the current position.
    pub(crate) fn unexpected(&self, expected: &'static str, found: &Event) -> Error {
        Error::unexpected(expected, found.name()).with_location(self.events.last_location())
    }

    /// Parse one node; ending the enclosing collection here is an error.
    pub(crate) fn expect_node(&mut self, expected: &'static str) -> Result<NodeId, Error> {
        match self.parse_node()? {
            Step::Node(id) => Ok(id),
            Step::End(ev) => Err(self.unexpected(expected, &ev)),
        }
    }

    pub(crate) fn parse_node(&mut self) -> Result<Step, Error> {
        match self.next_event()? {
            Event::Scalar {
                value,
                style,
                anchor,
                tag,
            } => self.parse_scalar(&value, style, anchor.as_deref(), tag.as_deref()),
            Event::SequenceStart { anchor, tag }
                if !self.omap_tag.is_empty() && tag.as_deref() == Some(self.omap_tag) =>
            {
                self.nested(|b| b.parse_ordered_map(anchor.as_deref()))
            }
            Event::SequenceStart { anchor, tag } => {
                self.nested(|b| b.parse_sequence(anchor.as_deref(), tag.as_deref()))
            }
            Event::MappingStart { anchor, tag } => {
                self.nested(|b| b.parse_mapping(anchor.as_deref(), tag.as_deref()))
            }
            Event::Alias { anchor } => match self.anchors.resolve(&anchor) {
                Some(id) => Ok(Step::Node(id)),
                None => Err(Error::unknown_anchor(&anchor).with_location(self.events.last_location())),
            },
            other => Ok(Step::End(other)),
        }
    }

    /// Parse the body of a container one level deeper.
    fn nested(&mut self, body: impl FnOnce(&mut Self) -> Result<Step, Error>) -> Result<Step, Error> {
        if self.depth >= MAX_NESTING_DEPTH {
            let breach = BudgetBreach::Depth { depth: self.depth + 1 };
            return Err(budget_error(breach).with_location(self.events.last_location()));
        }
        self.depth += 1;
        let step = body(self);
        self.depth -= 1;
        step
    }

    /// Run the tag hook over a freshly created node.
    fn tag(&mut self, tag: Option<&str>, node: NodeId) -> Result<NodeId, Error> {
        apply_tag(&mut *self.hook, tag, node, &mut self.arena).map_err(|msg| {
            Error::hook(tag.unwrap_or_default(), msg).with_location(self.events.last_location())
        })
    }

    fn parse_scalar(
        &mut self,
        value: &str,
        style: ScalarStyle,
        anchor: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Step, Error> {
        let id = self.arena.insert(Node::Scalar(resolve_scalar(value, style)));
        let handle = self.tag(tag, id)?;
        self.anchors.register(anchor, handle);
        Ok(Step::Node(handle))
    }

    fn parse_sequence(&mut self, anchor: Option<&str>, tag: Option<&str>) -> Result<Step, Error> {
        let id = self.arena.insert(Node::Sequence(Vec::new()));
        let handle = self.tag(tag, id)?;
        // Registered before the items so they can refer back to it.
        self.anchors.register(anchor, handle);

        let mut items = Vec::new();
        loop {
            match self.parse_node()? {
                Step::Node(item) => items.push(item),
                Step::End(Event::SequenceEnd) => break,
                Step::End(other) => {
                    return Err(self.unexpected("sequence item or sequence end", &other));
                }
            }
        }
        *self.arena.get_mut(id) = Node::Sequence(items);
        Ok(Step::Node(handle))
    }

    fn parse_mapping(&mut self, anchor: Option<&str>, tag: Option<&str>) -> Result<Step, Error> {
        let id = self.arena.insert(Node::Mapping(Vec::new()));
        let handle = self.tag(tag, id)?;
        self.anchors.register(anchor, handle);

        let mut entries = Entries::default();
        loop {
            match self.parse_node()? {
                Step::Node(key) => {
                    let value = self.expect_node("mapping value")?;
                    self.insert_entry(&mut entries, key, value)?;
                }
                Step::End(Event::MappingEnd) => break,
                Step::End(other) => {
                    return Err(self.unexpected("mapping key or mapping end", &other));
                }
            }
        }
        *self.arena.get_mut(id) = Node::Mapping(entries.pairs);
        Ok(Step::Node(handle))
    }

    /// A sequence of single-entry mappings flattened into one ordered mapping.
    ///
    /// The ordered-map tag itself is consumed here and never reaches the hook.
    /// Anchors and tags on the inner mappings are ignored: they name no node.
    fn parse_ordered_map(&mut self, anchor: Option<&str>) -> Result<Step, Error> {
        let id = self.arena.insert(Node::OrderedMapping(Vec::new()));
        self.anchors.register(anchor, id);

        let mut entries = Entries::default();
        loop {
            match self.next_event()? {
                Event::MappingStart { .. } => {}
                Event::SequenceEnd => break,
                other => {
                    return Err(self.unexpected("single-entry mapping or sequence end", &other));
                }
            }
            let key = self.expect_node("ordered map key")?;
            let value = self.expect_node("ordered map value")?;
            match self.next_event()? {
                Event::MappingEnd => {}
                other => {
                    return Err(self.unexpected("end of single-entry mapping", &other));
                }
            }
            self.insert_entry(&mut entries, key, value)?;
        }
        *self.arena.get_mut(id) = Node::OrderedMapping(entries.pairs);
        Ok(Step::Node(id))
    }

    fn insert_entry(&mut self, entries: &mut Entries, key: NodeId, value: NodeId) -> Result<(), Error> {
        let Some(fingerprint) = KeyFingerprint::of(&self.arena, key) else {
            entries.pairs.push((key, value));
            return Ok(());
        };
        match entries.seen.get(&fingerprint).copied() {
            None => {
                entries.seen.insert(fingerprint, entries.pairs.len());
                entries.pairs.push((key, value));
            }
            Some(index) => match self.duplicate_keys {
                DuplicateKeyPolicy::Error => {
                    return Err(Error::duplicate_key(describe_key(&self.arena, key))
                        .with_location(self.events.last_location()));
                }
                DuplicateKeyPolicy::FirstWins => {
                    log::debug!("duplicate key {} ignored", describe_key(&self.arena, key));
                }
                DuplicateKeyPolicy::LastWins => {
                    log::debug!("duplicate key {} replaces earlier value", describe_key(&self.arena, key));
                    entries.pairs[index].1 = value;
                }
            },
        }
        Ok(())
    }

    /// Counters of the budget, if one is enforced. Takes the enforcer out.
    pub(crate) fn take_report(&mut self) -> Option<BudgetReport> {
        self.budget.take().map(BudgetEnforcer::finalize)
    }

    /// Number of anchors defined so far.
    pub(crate) fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub(crate) fn into_document(self, root: NodeId) -> Document {
        Document::new(self.arena, root)
    }
}

#[derive(Default)]
struct Entries {
    pairs: Vec<(NodeId, NodeId)>,
    /// Fingerprint to index into `pairs`.
    seen: AHashMap<KeyFingerprint, usize>,
}

/// Equality class of a mapping key.
///
/// Scalars compare by resolved value plus tag, everything else by identity.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyFingerprint {
    Scalar { tag: Option<String>, value: ScalarKey },
    Node(NodeId),
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum ScalarKey {
    Null,
    Bool(bool),
    Integer(i64),
    Float(u64),
    String(String),
}

impl KeyFingerprint {
    /// `None` for keys that never collide (NaN).
    fn of(arena: &Arena, key: NodeId) -> Option<Self> {
        let (tag, scalar) = match arena.get(key) {
            Node::Scalar(scalar) => (None, scalar),
            Node::Tagged { tag, inner } => match arena.get(*inner) {
                Node::Scalar(scalar) => (Some(tag.clone()), scalar),
                _ => return Some(KeyFingerprint::Node(key)),
            },
            _ => return Some(KeyFingerprint::Node(key)),
        };
        let value = match scalar {
            Scalar::Null => ScalarKey::Null,
            Scalar::Bool(b) => ScalarKey::Bool(*b),
            Scalar::Integer(i) => ScalarKey::Integer(*i),
            Scalar::Float(x) if x.is_nan() => return None,
            // 0.0 == -0.0
            Scalar::Float(x) if *x == 0.0 => ScalarKey::Float(0f64.to_bits()),
            Scalar::Float(x) => ScalarKey::Float(x.to_bits()),
            Scalar::String(s) => ScalarKey::String(s.clone()),
        };
        Some(KeyFingerprint::Scalar { tag, value })
    }
}

fn describe_key(arena: &Arena, key: NodeId) -> String {
    match arena.get(arena.untag(key)) {
        Node::Scalar(scalar) => scalar.to_string(),
        node => format!("{} {key}", node.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VecEvents;
    use crate::tags::{TAG_OMAP, WrapTag};

    fn build_with(
        policy: DuplicateKeyPolicy,
        body: impl IntoIterator<Item = Event>,
    ) -> Result<Document, Error> {
        let mut events = VecEvents::new(body);
        let mut hook = WrapTag;
        let mut builder = Builder::new(&mut events, &mut hook, TAG_OMAP, policy, Some(Budget::default()));
        let root = builder.expect_node("root")?;
        Ok(builder.into_document(root))
    }

    fn build(body: impl IntoIterator<Item = Event>) -> Result<Document, Error> {
        build_with(DuplicateKeyPolicy::LastWins, body)
    }

    fn int(i: i64) -> Event {
        Event::plain(i.to_string())
    }

    #[test]
    fn scalar_root() {
        let doc = build([Event::plain("42")]).unwrap();
        assert_eq!(doc.root_ref().as_i64(), Some(42));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn nested_containers() {
        let doc = build([
            Event::mapping_start(),
            Event::plain("list"),
            Event::sequence_start(),
            int(1),
            int(2),
            Event::SequenceEnd,
            Event::plain("name"),
            Event::scalar("x", ScalarStyle::DoubleQuoted),
            Event::MappingEnd,
        ])
        .unwrap();
        let root = doc.root_ref();
        assert_eq!(root.len(), 2);
        let list: Vec<_> = root.get("list").unwrap().items().map(|n| n.as_i64()).collect();
        assert_eq!(list, [Some(1), Some(2)]);
        assert_eq!(root.get("name").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn alias_shares_the_anchored_node() {
        let doc = build([
            Event::sequence_start(),
            Event::mapping_start().with_anchor("m"),
            Event::MappingEnd,
            Event::alias("m"),
            Event::SequenceEnd,
        ])
        .unwrap();
        let items: Vec<_> = doc.root_ref().items().collect();
        assert!(items[0].same_node(&items[1]));
    }

    #[test]
    fn container_may_alias_itself() {
        let doc = build([
            Event::mapping_start().with_anchor("A"),
            Event::plain("self"),
            Event::alias("A"),
            Event::MappingEnd,
        ])
        .unwrap();
        let root = doc.root_ref();
        assert!(root.get("self").unwrap().same_node(&root));
    }

    #[test]
    fn unknown_alias() {
        let err = build([Event::sequence_start(), Event::alias("nope"), Event::SequenceEnd]).unwrap_err();
        assert!(
            matches!(&err, Error::UnknownAnchor { anchor: Some(a), .. } if a == "nope"),
            "{err:?}"
        );
    }

    #[test]
    fn tagged_container_is_registered_through_the_wrapper() {
        let doc = build([
            Event::sequence_start(),
            Event::sequence_start().with_anchor("s").with_tag("!core/list"),
            Event::SequenceEnd,
            Event::alias("s"),
            Event::SequenceEnd,
        ])
        .unwrap();
        let items: Vec<_> = doc.root_ref().items().collect();
        assert_eq!(items[0].tag(), Some("!core/list"));
        assert!(items[0].same_node(&items[1]));
    }

    #[test]
    fn omap_keeps_entry_order() {
        let doc = build([
            Event::sequence_start().with_tag(TAG_OMAP),
            Event::mapping_start(),
            Event::plain("b"),
            int(2),
            Event::MappingEnd,
            Event::mapping_start(),
            Event::plain("a"),
            int(1),
            Event::MappingEnd,
            Event::SequenceEnd,
        ])
        .unwrap();
        let root = doc.root_ref();
        assert!(matches!(root.node(), Node::OrderedMapping(_)));
        let keys: Vec<_> = root.entries().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, [Some("b"), Some("a")]);
    }

    #[test]
    fn omap_rejects_two_pairs_in_one_mapping() {
        let err = build([
            Event::sequence_start().with_tag(TAG_OMAP),
            Event::mapping_start(),
            Event::plain("a"),
            int(1),
            Event::plain("b"),
            int(2),
            Event::MappingEnd,
            Event::SequenceEnd,
        ])
        .unwrap_err();
        assert!(
            matches!(err, Error::Unexpected { found: "scalar", .. }),
            "{err:?}"
        );
    }

    #[test]
    fn omap_rejects_empty_inner_mapping_and_non_mappings() {
        let err = build([
            Event::sequence_start().with_tag(TAG_OMAP),
            Event::mapping_start(),
            Event::MappingEnd,
            Event::SequenceEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Unexpected { expected: "ordered map key", .. }));

        let err = build([
            Event::sequence_start().with_tag(TAG_OMAP),
            int(1),
            Event::SequenceEnd,
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Unexpected { found: "scalar", .. }));
    }

    #[test]
    fn mismatched_end_is_structural() {
        let err = build([Event::sequence_start(), int(1), Event::MappingEnd]).unwrap_err();
        assert!(
            matches!(
                err,
                Error::Unexpected {
                    expected: "sequence item or sequence end",
                    found: "mapping end",
                    ..
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn mapping_missing_value() {
        let err = build([Event::mapping_start(), Event::plain("k"), Event::MappingEnd]).unwrap_err();
        assert!(matches!(err, Error::Unexpected { expected: "mapping value", .. }));
    }

    #[test]
    fn truncated_stream_is_eof() {
        let err = build([Event::sequence_start(), int(1)]).unwrap_err();
        assert!(matches!(err, Error::Eof { .. }));
    }

    fn pairs_k1_twice() -> Vec<Event> {
        vec![
            Event::mapping_start(),
            Event::plain("k"),
            int(1),
            Event::plain("other"),
            int(0),
            Event::plain("k"),
            int(2),
            Event::MappingEnd,
        ]
    }

    #[test]
    fn duplicate_keys_last_wins_keeps_position() {
        let doc = build_with(DuplicateKeyPolicy::LastWins, pairs_k1_twice()).unwrap();
        let entries: Vec<_> = doc
            .root_ref()
            .entries()
            .map(|(k, v)| (k.as_str().unwrap(), v.as_i64().unwrap()))
            .collect();
        assert_eq!(entries, [("k", 2), ("other", 0)]);
    }

    #[test]
    fn duplicate_keys_first_wins() {
        let doc = build_with(DuplicateKeyPolicy::FirstWins, pairs_k1_twice()).unwrap();
        assert_eq!(doc.root_ref().get("k").unwrap().as_i64(), Some(1));
        assert_eq!(doc.root_ref().len(), 2);
    }

    #[test]
    fn duplicate_keys_error() {
        let err = build_with(DuplicateKeyPolicy::Error, pairs_k1_twice()).unwrap_err();
        assert!(matches!(&err, Error::DuplicateKey { key, .. } if key == "\"k\""), "{err:?}");
    }

    #[test]
    fn key_equality_classes() {
        let arena_keys = |events: Vec<Event>| {
            build_with(DuplicateKeyPolicy::Error, events).map(|doc| doc.root_ref().len())
        };
        // Same text, different tag: distinct.
        assert_eq!(
            arena_keys(vec![
                Event::mapping_start(),
                Event::plain("k"),
                int(1),
                Event::plain("k").with_tag("!x"),
                int(2),
                Event::MappingEnd,
            ])
            .unwrap(),
            2
        );
        // Integer and string spelling of the same text: distinct.
        assert_eq!(
            arena_keys(vec![
                Event::mapping_start(),
                Event::plain("1"),
                int(1),
                Event::scalar("1", ScalarStyle::SingleQuoted),
                int(2),
                Event::MappingEnd,
            ])
            .unwrap(),
            2
        );
        // NaN never collides.
        assert_eq!(
            arena_keys(vec![
                Event::mapping_start(),
                Event::plain(".nan"),
                int(1),
                Event::plain(".nan"),
                int(2),
                Event::MappingEnd,
            ])
            .unwrap(),
            2
        );
        // Distinct empty containers are distinct keys; the same one aliased is not.
        assert_eq!(
            arena_keys(vec![
                Event::mapping_start(),
                Event::sequence_start(),
                Event::SequenceEnd,
                int(1),
                Event::sequence_start(),
                Event::SequenceEnd,
                int(2),
                Event::MappingEnd,
            ])
            .unwrap(),
            2
        );
        assert!(
            arena_keys(vec![
                Event::mapping_start(),
                Event::sequence_start().with_anchor("s"),
                Event::SequenceEnd,
                int(1),
                Event::alias("s"),
                int(2),
                Event::MappingEnd,
            ])
            .is_err()
        );
    }

    #[test]
    fn duplicate_keys_in_omap() {
        let events = vec![
            Event::sequence_start().with_tag(TAG_OMAP),
            Event::mapping_start(),
            Event::plain("a"),
            int(1),
            Event::MappingEnd,
            Event::mapping_start(),
            Event::plain("a"),
            int(2),
            Event::MappingEnd,
            Event::SequenceEnd,
        ];
        let doc = build(events.clone()).unwrap();
        assert_eq!(doc.root_ref().get("a").unwrap().as_i64(), Some(2));
        assert!(build_with(DuplicateKeyPolicy::Error, events).is_err());
    }

    #[test]
    fn hook_errors_carry_the_tag() {
        let mut events = VecEvents::new([Event::plain("1").with_tag("!bad")]);
        let mut hook = |_: &str, _: NodeId, _: &mut Arena| Err::<NodeId, _>("not allowed".to_owned());
        let mut builder = Builder::new(&mut events, &mut hook, TAG_OMAP, DuplicateKeyPolicy::LastWins, None);
        let err = builder.expect_node("root").unwrap_err();
        assert!(
            matches!(&err, Error::Hook { tag, msg, .. } if tag == "!bad" && msg == "not allowed"),
            "{err:?}"
        );
    }

    #[test]
    fn budget_breach_stops_the_build() {
        let mut events = VecEvents::new([
            Event::sequence_start(),
            Event::sequence_start(),
            Event::sequence_start(),
            Event::SequenceEnd,
            Event::SequenceEnd,
            Event::SequenceEnd,
        ]);
        let budget = Budget {
            max_depth: 2,
            ..Budget::default()
        };
        let mut hook = WrapTag;
        let mut builder = Builder::new(&mut events, &mut hook, TAG_OMAP, DuplicateKeyPolicy::LastWins, Some(budget));
        let err = builder.expect_node("root").unwrap_err();
        assert!(matches!(err, Error::Budget { .. }));
        let report = builder.take_report().unwrap();
        assert_eq!(report.breached, Some(crate::budget::BudgetBreach::Depth { depth: 3 }));
    }

    /// Opens `depth` sequences and closes them again.
    fn nested_sequences(depth: usize) -> VecEvents {
        let mut body = vec![Event::sequence_start(); depth];
        body.extend(std::iter::repeat_n(Event::SequenceEnd, depth));
        VecEvents::new(body)
    }

    fn build_unbudgeted(events: &mut VecEvents) -> Result<NodeId, Error> {
        let mut hook = WrapTag;
        let mut builder = Builder::new(events, &mut hook, TAG_OMAP, DuplicateKeyPolicy::LastWins, None);
        builder.expect_node("root")
    }

    #[test]
    fn nesting_is_capped_without_a_budget() {
        // Sized like a main thread stack; test threads get less.
        let handle = std::thread::Builder::new()
            .stack_size(8 << 20)
            .spawn(|| {
                let at_cap = build_unbudgeted(&mut nested_sequences(MAX_NESTING_DEPTH));
                let too_deep = build_unbudgeted(&mut nested_sequences(200_000));
                (at_cap.is_ok(), too_deep)
            })
            .unwrap();
        let (at_cap, too_deep) = handle.join().unwrap();
        assert!(at_cap);
        match too_deep.unwrap_err() {
            Error::Budget { breach, .. } => {
                assert_eq!(breach, BudgetBreach::Depth { depth: MAX_NESTING_DEPTH + 1 })
            }
            other => panic!("expected depth breach, got {other:?}"),
        }
    }

    #[test]
    fn nesting_cap_overrides_a_larger_budget() {
        let mut events = nested_sequences(MAX_NESTING_DEPTH + 5);
        let budget = Budget {
            max_depth: 10 * MAX_NESTING_DEPTH,
            ..Budget::default()
        };
        let mut hook = WrapTag;
        let handle = std::thread::Builder::new()
            .stack_size(8 << 20)
            .spawn(move || {
                let mut builder =
                    Builder::new(&mut events, &mut hook, TAG_OMAP, DuplicateKeyPolicy::LastWins, Some(budget));
                builder.expect_node("root").map(|_| ())
            })
            .unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert!(
            matches!(err, Error::Budget { breach: BudgetBreach::Depth { depth }, .. } if depth == MAX_NESTING_DEPTH + 1),
            "{err:?}"
        );
    }
}
