//! `DocumentTree` over roxmltree
//!
//! roxmltree merges CDATA sections and adjacent text into a single text
//! node, so it never reports [`NodeKind::CData`].

use roxmltree::NodeType;

use super::{utf16_len, DocumentTree, NodeKind, XML_NS};

impl<'input> DocumentTree for roxmltree::Document<'input> {
    type Node<'a> = roxmltree::Node<'a, 'input> where Self: 'a;

    fn root_element(&self) -> Option<Self::Node<'_>> {
        Some(roxmltree::Document::root_element(self))
    }

    fn package_element(&self) -> Option<Self::Node<'_>> {
        self.descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "package")
    }

    fn element_by_id(&self, id: &str) -> Option<Self::Node<'_>> {
        self.descendants().find(|n| {
            n.is_element()
                && (n.attribute("id") == Some(id) || n.attribute((XML_NS, "id")) == Some(id))
        })
    }

    fn children<'a>(&'a self, node: Self::Node<'a>) -> Vec<Self::Node<'a>> {
        node.children().collect()
    }

    fn parent<'a>(&'a self, node: Self::Node<'a>) -> Option<Self::Node<'a>> {
        node.parent()
    }

    fn kind<'a>(&'a self, node: Self::Node<'a>) -> NodeKind {
        match node.node_type() {
            NodeType::Element => NodeKind::Element,
            NodeType::Text => NodeKind::Text,
            NodeType::Root | NodeType::Comment | NodeType::PI => NodeKind::Other,
        }
    }

    fn local_name<'a>(&'a self, node: Self::Node<'a>) -> Option<&'a str> {
        node.is_element().then(|| node.tag_name().name())
    }

    fn attribute<'a>(&'a self, node: Self::Node<'a>, name: &str) -> Option<&'a str> {
        node.attribute(name)
    }

    fn attribute_ns<'a>(
        &'a self,
        node: Self::Node<'a>,
        namespace: &str,
        name: &str,
    ) -> Option<&'a str> {
        node.attribute((namespace, name))
    }

    fn text_len<'a>(&'a self, node: Self::Node<'a>) -> usize {
        if node.is_text() {
            return node.text().map(utf16_len).unwrap_or(0);
        }
        node.descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .map(utf16_len)
            .sum()
    }
}
