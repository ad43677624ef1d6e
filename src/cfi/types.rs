//! CFI (Canonical Fragment Identifier) types for EPUB
//!
//! A CFI is a sequence of parts, one per document in the chain, and each part
//! is a sequence of steps.
//! Format: epubcfi(/6/4[chap01ref]!/4/2/22/3:268)
//!
//! Reference: <https://idpf.org/epub/linking/cfi/epub-cfi.html>

use serde::{Deserialize, Serialize};

/// Tie-break direction for a text location assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideBias {
    Before,
    After,
}

/// Which side of the returned node a resolved location sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeToNode {
    /// The virtual slot before the first child
    Before,
    /// The virtual slot after the last child
    After,
}

/// Text location assertion attached to a character offset
///
/// `[text]` yields [`TextLocationAssertion::Text`], `[pre,post]` yields
/// [`TextLocationAssertion::Split`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextLocationAssertion {
    Split {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pre: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post: Option<String>,
    },
    Text(String),
}

impl TextLocationAssertion {
    /// Empty split assertion, created when a `,` is seen inside the brackets
    pub(crate) fn split(pre: Option<String>) -> Self {
        TextLocationAssertion::Split { pre, post: None }
    }
}

/// Spatial range from an `@from:to` suffix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialRange {
    pub from: f64,
    pub to: f64,
}

/// A single step in a CFI part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// CFI virtual child index
    pub node_index: usize,
    /// Element ID assertion `[id]`
    #[serde(rename = "nodeID", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Character offset `:n`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_location_assertion: Option<TextLocationAssertion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_bias: Option<SideBias>,
    /// Temporal offset `~seconds`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<f64>,
    /// Spatial offset `@x:y`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialRange>,
}

impl Step {
    /// Create a step with only a node index
    pub fn new(node_index: usize) -> Self {
        Self {
            node_index,
            node_id: None,
            offset: None,
            text_location_assertion: None,
            side_bias: None,
            temporal: None,
            spatial: None,
        }
    }

    /// Create a step with an ID assertion
    pub fn with_id(node_index: usize, id: impl Into<String>) -> Self {
        Self {
            node_id: Some(id.into()),
            ..Self::new(node_index)
        }
    }
}

/// The steps addressing a location inside one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Part {
    pub steps: Vec<Step>,
}

impl Part {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn last_step(&self) -> Option<&Step> {
        self.steps.last()
    }
}

/// Options controlling resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveOptions {
    /// Never anchor resolution on ID assertions
    #[serde(alias = "ignoreIDs")]
    pub ignore_ids: bool,
}

/// Final location produced by [`crate::Cfi::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation<N> {
    pub node: N,
    /// Character offset into `node`. `None` when the CFI carried no offset
    /// (a zero offset is also reported as-is rather than recomputed).
    pub offset: Option<usize>,
    pub relative_to_node: Option<RelativeToNode>,
    pub node_id: Option<String>,
    pub side_bias: Option<SideBias>,
    pub text_location_assertion: Option<TextLocationAssertion>,
    pub temporal: Option<f64>,
    pub spatial: Option<SpatialRange>,
}
