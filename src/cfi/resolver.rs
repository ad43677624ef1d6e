//! Path and index resolution
//!
//! CFI child indices do not match DOM child positions. Even indices address
//! elements, odd indices address the (possibly empty) text between them, and
//! consecutive text or CDATA children count as a single unit:
//!
//! ```text
//! <p>text<b/><i/>tail</p>
//!     1   2  [3] 4   5        [3] is a virtual empty text slot
//! ```

use super::types::{RelativeToNode, ResolveOptions, Step};
use crate::document::{DocumentTree, NodeKind};
use crate::error::{CfiError, Result};

/// A node plus a character offset into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTarget<N> {
    pub node: N,
    pub offset: usize,
    /// Set when the index addressed the virtual slot before the first or
    /// after the last child
    pub relative_to_node: Option<RelativeToNode>,
}

impl<N> NodeTarget<N> {
    fn at(node: N, offset: usize) -> Self {
        Self {
            node,
            offset,
            relative_to_node: None,
        }
    }
}

/// Find the child of `parent` addressed by CFI index `index`
///
/// `offset` only matters when `index` lands on a text run made of several
/// text nodes: an offset past the end of one node spills into the next.
pub fn resolve_index<'a, D: DocumentTree>(
    doc: &'a D,
    parent: D::Node<'a>,
    index: usize,
    offset: Option<usize>,
) -> NodeTarget<D::Node<'a>> {
    let children = doc.children(parent);
    let Some(&first) = children.first() else {
        return NodeTarget::at(parent, 0);
    };

    if index == 0 {
        return NodeTarget {
            node: first,
            offset: 0,
            relative_to_node: Some(RelativeToNode::Before),
        };
    }

    let mut offset = offset;
    let mut count = 0usize;
    let mut last_child = None;

    for child in children {
        match doc.kind(child) {
            NodeKind::Element => {
                if count % 2 == 0 {
                    // Previous slot was an element or nothing, so a virtual
                    // empty text node sits in between
                    count += 2;
                    if count >= index {
                        return NodeTarget::at(child, 0);
                    }
                } else {
                    count += 1;
                    if count == index {
                        return NodeTarget::at(child, 0);
                    }
                    if count > index {
                        // The offset ran past the end of the preceding text
                        return match last_child {
                            Some(prev) => NodeTarget::at(prev, doc.text_len(prev)),
                            None => NodeTarget::at(parent, 0),
                        };
                    }
                }
                last_child = Some(child);
            }
            NodeKind::Text | NodeKind::CData => {
                // Adjacent text nodes share one index
                if count % 2 == 0 {
                    count += 1;
                }

                if count == index {
                    let len = doc.text_len(child);
                    match offset {
                        Some(o) if o >= len => offset = Some(o - len),
                        _ => return NodeTarget::at(child, offset.unwrap_or(0)),
                    }
                }
                last_child = Some(child);
            }
            NodeKind::Other => continue,
        }
    }

    let node = last_child.unwrap_or(parent);
    let end = if doc.kind(node).is_text() {
        doc.text_len(node)
    } else {
        0
    };

    if index > count {
        return NodeTarget {
            node,
            offset: end,
            relative_to_node: Some(RelativeToNode::After),
        };
    }

    // The offset spilled past the final text run: clamp to its end
    NodeTarget::at(node, end)
}

/// Resolve one part's steps against `doc`
///
/// Resolution starts from the package element for the first part and from
/// the root element otherwise, or from the last step whose ID assertion is
/// found in the document.
pub fn resolve_steps<'a, D: DocumentTree>(
    steps: &[Step],
    is_package: bool,
    doc: &'a D,
    opts: &ResolveOptions,
) -> Result<NodeTarget<D::Node<'a>>> {
    let start = if is_package {
        doc.package_element()
    } else {
        doc.root_element()
    };
    let start =
        start.ok_or_else(|| CfiError::Resolution("Document incompatible with CFIs".to_string()))?;

    let anchor = if opts.ignore_ids {
        None
    } else {
        steps.iter().enumerate().rev().find_map(|(i, step)| {
            let id = step.node_id.as_deref()?;
            doc.element_by_id(id).map(|node| (i + 1, node, id))
        })
    };

    let (start_from, node) = match anchor {
        Some((start_from, node, id)) => {
            tracing::debug!(id, skipped = start_from, "Anchored CFI resolution on ID");
            (start_from, node)
        }
        None => (0, start),
    };

    let mut target = NodeTarget::at(node, 0);
    for step in &steps[start_from..] {
        target = resolve_index(doc, target.node, step.node_index, step.offset);
        tracing::trace!(index = step.node_index, node = ?target.node, offset = target.offset, "Resolved CFI step");
    }

    Ok(target)
}
