//! Tag application.
//!
//! The loader makes no judgment about tag contents. Every freshly constructed
//! node that carries a non-empty explicit tag is handed to a [`TagHook`],
//! which decides what the tagged node looks like (or rejects it).

use crate::node::{Arena, Node, NodeId};

/// Prefix the tokenizer expands the `!!` handle to.
pub const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Default tag marking a sequence of single-entry mappings as an ordered map.
pub const TAG_OMAP: &str = "tag:yaml.org,2002:omap";

/// Extension point through which an external type system attaches semantic
/// tags to constructed nodes.
///
/// `node` has just been created. For containers it is still empty: children
/// are appended to it after the hook returns, so a hook must not assume the
/// final content is visible. The returned handle replaces `node` wherever the
/// node is referenced (anchor table, parent container, document root).
pub trait TagHook {
    fn apply(&mut self, tag: &str, node: NodeId, arena: &mut Arena) -> Result<NodeId, String>;
}

/// Wraps the node into [`Node::Tagged`]. Never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct WrapTag;

impl TagHook for WrapTag {
    fn apply(&mut self, tag: &str, node: NodeId, arena: &mut Arena) -> Result<NodeId, String> {
        Ok(arena.insert(Node::Tagged {
            tag: tag.to_owned(),
            inner: node,
        }))
    }
}

impl<F> TagHook for F
where
    F: FnMut(&str, NodeId, &mut Arena) -> Result<NodeId, String>,
{
    fn apply(&mut self, tag: &str, node: NodeId, arena: &mut Arena) -> Result<NodeId, String> {
        self(tag, node, arena)
    }
}

/// Run `hook` unless `tag` is absent or empty.
pub(crate) fn apply_tag<H: TagHook + ?Sized>(
    hook: &mut H,
    tag: Option<&str>,
    node: NodeId,
    arena: &mut Arena,
) -> Result<NodeId, String> {
    match tag {
        Some(tag) if !tag.is_empty() => hook.apply(tag, node, arena),
        _ => Ok(node),
    }
}
