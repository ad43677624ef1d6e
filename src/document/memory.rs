//! In-memory arena tree
//!
//! For callers that build their tree from another parser, and for shapes
//! roxmltree normalises away (separate adjacent text nodes, CDATA).

use super::{utf16_len, DocumentTree, NodeKind, XML_NS};

/// Handle to a node in a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Attribute {
    namespace: Option<String>,
    name: String,
    value: String,
}

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable arena tree implementing [`DocumentTree`]
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<MemoryNode>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![MemoryNode {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document node
    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append_element(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.append(
            parent,
            NodeData::Element {
                name: name.into(),
                attributes: Vec::new(),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeData::Text(text.into()))
    }

    pub fn append_cdata(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeData::CData(text.into()))
    }

    pub fn append_comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeData::Comment(text.into()))
    }

    /// Set an attribute without a namespace. Ignored on non-elements.
    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        self.put_attribute(node, None, name.into(), value.into());
    }

    /// Set an attribute in `namespace`. Ignored on non-elements.
    pub fn set_attribute_ns(
        &mut self,
        node: NodeId,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.put_attribute(node, Some(namespace.into()), name.into(), value.into());
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MemoryNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn put_attribute(&mut self, node: NodeId, namespace: Option<String>, name: String, value: String) {
        let NodeData::Element { attributes, .. } = &mut self.nodes[node.0].data else {
            return;
        };
        match attributes
            .iter_mut()
            .find(|a| a.namespace == namespace && a.name == name)
        {
            Some(existing) => existing.value = value,
            None => attributes.push(Attribute {
                namespace,
                name,
                value,
            }),
        }
    }

    fn node(&self, id: NodeId) -> &MemoryNode {
        &self.nodes[id.0]
    }

    /// Pre-order walk from `start`, `start` included
    fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }

    fn find_attribute(&self, id: NodeId, namespace: Option<&str>, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.namespace.as_deref() == namespace && a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }
}

impl DocumentTree for MemoryDocument {
    type Node<'a> = NodeId;

    fn root_element(&self) -> Option<NodeId> {
        self.node(self.document())
            .children
            .iter()
            .copied()
            .find(|&id| self.kind(id) == NodeKind::Element)
    }

    fn package_element(&self) -> Option<NodeId> {
        self.descendants(self.document())
            .into_iter()
            .find(|&id| self.local_name(id) == Some("package"))
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.document()).into_iter().find(|&node| {
            self.find_attribute(node, None, "id") == Some(id)
                || self.find_attribute(node, Some(XML_NS), "id") == Some(id)
        })
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.node(node).data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::CData(_) => NodeKind::CData,
            NodeData::Document | NodeData::Comment(_) => NodeKind::Other,
        }
    }

    fn local_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node).data {
            NodeData::Element { name, .. } => {
                Some(name.rsplit_once(':').map_or(name.as_str(), |(_, local)| local))
            }
            _ => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.find_attribute(node, None, name)
    }

    fn attribute_ns(&self, node: NodeId, namespace: &str, name: &str) -> Option<&str> {
        self.find_attribute(node, Some(namespace), name)
    }

    fn text_len(&self, node: NodeId) -> usize {
        self.descendants(node)
            .into_iter()
            .map(|id| match &self.node(id).data {
                NodeData::Text(text) | NodeData::CData(text) => utf16_len(text),
                _ => 0,
            })
            .sum()
    }
}
