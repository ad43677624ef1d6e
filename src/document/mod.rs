//! Document tree abstraction
//!
//! Resolution only reads the document it is given. Any tree that can
//! enumerate children, tell elements from text, read attributes and look up
//! IDs can be resolved against by implementing [`DocumentTree`].
//!
//! Two implementations ship with the crate:
//! - `roxmltree::Document`, for parsed package and content documents
//! - [`MemoryDocument`], a small arena tree built by hand

mod memory;
mod xml;

use std::fmt;

pub use memory::{MemoryDocument, NodeId};

/// XLink namespace, used by SVG `image` and `use` references
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// XML namespace, used by `xml:id`
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Node type discrimination needed by CFI child counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    CData,
    /// Comments, processing instructions, the document node
    Other,
}

impl NodeKind {
    /// Text and CDATA both count as character data
    pub fn is_text(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::CData)
    }
}

/// Read-only view of a document tree
pub trait DocumentTree {
    /// Cheap node handle borrowed from the tree
    type Node<'a>: Copy + PartialEq + fmt::Debug
    where
        Self: 'a;

    /// First element child of the document
    fn root_element(&self) -> Option<Self::Node<'_>>;

    /// First element named `package`, in document order
    fn package_element(&self) -> Option<Self::Node<'_>>;

    /// Element carrying `id` (or `xml:id`) equal to `id`
    fn element_by_id(&self, id: &str) -> Option<Self::Node<'_>>;

    /// Children of `node` in document order
    fn children<'a>(&'a self, node: Self::Node<'a>) -> Vec<Self::Node<'a>>;

    fn parent<'a>(&'a self, node: Self::Node<'a>) -> Option<Self::Node<'a>>;

    fn kind<'a>(&'a self, node: Self::Node<'a>) -> NodeKind;

    /// Tag name without namespace prefix, `None` for non-elements
    fn local_name<'a>(&'a self, node: Self::Node<'a>) -> Option<&'a str>;

    /// Attribute without a namespace
    fn attribute<'a>(&'a self, node: Self::Node<'a>, name: &str) -> Option<&'a str>;

    /// Attribute in `namespace`
    fn attribute_ns<'a>(
        &'a self,
        node: Self::Node<'a>,
        namespace: &str,
        name: &str,
    ) -> Option<&'a str>;

    /// Length of the node's text content in UTF-16 code units
    fn text_len<'a>(&'a self, node: Self::Node<'a>) -> usize;
}

/// UTF-16 length, the unit DOM ranges and CFI offsets are expressed in
pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
