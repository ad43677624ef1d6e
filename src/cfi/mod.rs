//! CFI (Canonical Fragment Identifier) module for EPUB
//!
//! Parses CFI strings and resolves them against document trees.
//!
//! # Example CFI
//!
//! ```text
//! epubcfi(/6/4[chap01ref]!/4[body01]/10/2/1:3[yes,no;s=a])
//!         │  │           │ │        │     │ │ └── text assertion + side bias
//!         │  │           │ │        │     │ └──── character offset 3
//!         │  │           │ │        │     └────── text node (odd = text)
//!         │  │           │ │        └──────────── element steps
//!         │  │           │ └───────────────────── element with ID assertion
//!         │  │           └─────────────────────── indirection (next document)
//!         │  └─────────────────────────────────── spine itemref with ID
//!         └────────────────────────────────────── spine element
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use epubcfi::{Cfi, ResolveOptions};
//!
//! let cfi = Cfi::new("epubcfi(/6/4!/4/2/1:42)")?;
//! let opts = ResolveOptions::default();
//!
//! // Package document → href of the content document
//! let href = cfi.resolve_uri(0, &package_doc, &opts)?;
//!
//! // Content document → node + offset
//! let location = cfi.resolve(&content_doc, &opts)?;
//! ```

mod parser;
mod resolver;
mod scanner;
mod types;
mod uri;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::document::DocumentTree;
use crate::error::{CfiError, Result};

pub use parser::parse_parts;
pub use resolver::{resolve_index, resolve_steps, NodeTarget};
pub use scanner::parse_spatial_range;
pub use types::{
    Part, RelativeToNode, ResolveOptions, ResolvedLocation, SideBias, SpatialRange, Step,
    TextLocationAssertion,
};
pub use uri::referenced_href;

/// A parsed CFI
///
/// Built once from its string and read-only afterwards; one instance can be
/// resolved any number of times against different documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cfi {
    /// The string this CFI was parsed from
    raw: String,
    /// One part per document in the chain
    parts: Vec<Part>,
}

impl Cfi {
    /// Parse a CFI string
    ///
    /// Fails with [`CfiError::Grammar`] if the input is not wrapped in
    /// `epubcfi(...)`, and with [`CfiError::Parse`] if a step has no index.
    pub fn new(raw: &str) -> Result<Self> {
        let parts = parse_parts(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    /// Alias for [`Cfi::new`]
    pub fn parse(raw: &str) -> Result<Self> {
        Self::new(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Last step of the last part, which carries the final offset and
    /// assertions
    pub fn last_step(&self) -> Option<&Step> {
        self.parts.last().and_then(Part::last_step)
    }

    /// Resolve part `index` to a node and offset in `doc`
    ///
    /// Part 0 is resolved from the document's `package` element, later parts
    /// from its root element.
    pub fn resolve_node<'a, D: DocumentTree>(
        &self,
        index: usize,
        doc: &'a D,
        opts: &ResolveOptions,
    ) -> Result<NodeTarget<D::Node<'a>>> {
        let part = self.parts.get(index).ok_or_else(|| {
            CfiError::Resolution(format!("Missing CFI part for index: {}", index))
        })?;
        resolve_steps(&part.steps, index == 0, doc, opts)
    }

    /// Resolve the href of the document that part `index + 1` lives in
    ///
    /// `doc` must be the document part `index` addresses. Only valid for
    /// `0..=part_count() - 2`. Returns `Ok(None)` if the resolved node is
    /// not something that references a document.
    pub fn resolve_uri<'a, D: DocumentTree>(
        &self,
        index: usize,
        doc: &'a D,
        opts: &ResolveOptions,
    ) -> Result<Option<String>> {
        if index >= self.parts.len().saturating_sub(1) {
            return Err(CfiError::Resolution(format!(
                "Part index {} is out of bounds for a CFI with {} parts",
                index,
                self.parts.len()
            )));
        }

        let target = self.resolve_node(index, doc, opts)?;
        referenced_href(doc, target.node)
    }

    /// Resolve the final part against the last document in the chain
    pub fn resolve<'a, D: DocumentTree>(
        &self,
        doc: &'a D,
        opts: &ResolveOptions,
    ) -> Result<ResolvedLocation<D::Node<'a>>> {
        let index = self
            .parts
            .len()
            .checked_sub(1)
            .ok_or_else(|| CfiError::Resolution("CFI has no parts to resolve".to_string()))?;
        let last = self
            .last_step()
            .cloned()
            .ok_or_else(|| CfiError::Resolution("CFI part has no steps".to_string()))?;

        let target = self.resolve_node(index, doc, opts)?;

        // A zero offset counts as absent and is reported unchanged instead of
        // taking the resolved offset. This also hides clamped offsets when
        // the CFI said `:0`.
        let offset = match last.offset {
            Some(offset) if offset != 0 => Some(target.offset),
            unset_or_zero => unset_or_zero,
        };

        Ok(ResolvedLocation {
            node: target.node,
            offset,
            relative_to_node: target.relative_to_node,
            node_id: last.node_id,
            side_bias: last.side_bias,
            text_location_assertion: last.text_location_assertion,
            temporal: last.temporal,
            spatial: last.spatial,
        })
    }
}

impl FromStr for Cfi {
    type Err = CfiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Cfi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, NodeId};

    /// `<html><head/><body><p id="para">hello <em>big</em> world</p></body></html>`
    fn content() -> (MemoryDocument, NodeId, NodeId) {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let html = doc.append_element(root, "html");
        doc.append_element(html, "head");
        let body = doc.append_element(html, "body");
        let p = doc.append_element(body, "p");
        doc.set_attribute(p, "id", "para");
        let hello = doc.append_text(p, "hello ");
        let em = doc.append_element(p, "em");
        doc.append_text(em, "big");
        doc.append_text(p, " world");
        (doc, hello, em)
    }

    #[test]
    fn test_new_keeps_raw_string() {
        let raw = " epubcfi(/6/4!/4/2) ";
        let cfi = Cfi::new(raw).unwrap();
        assert_eq!(cfi.as_str(), raw);
        assert_eq!(cfi.to_string(), raw);
        assert_eq!(cfi.part_count(), 2);
    }

    #[test]
    fn test_from_str() {
        let cfi: Cfi = "epubcfi(/4/2/1:3)".parse().unwrap();
        assert_eq!(cfi.last_step().unwrap().offset, Some(3));
        assert!("not-a-cfi".parse::<Cfi>().is_err());
    }

    #[test]
    fn test_new_errors() {
        assert!(matches!(Cfi::new("not-a-cfi"), Err(CfiError::Grammar(_))));
        assert!(matches!(Cfi::new("epubcfi(/4/[x])"), Err(CfiError::Parse(_))));
    }

    #[test]
    fn test_resolve_text_offset() {
        let (doc, hello, _) = content();
        let cfi = Cfi::new("epubcfi(/6/4!/4/2/1:3[lo;s=a])").unwrap();

        let location = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(location.node, hello);
        assert_eq!(location.offset, Some(3));
        assert_eq!(location.relative_to_node, None);
        assert_eq!(location.side_bias, Some(SideBias::After));
        assert_eq!(
            location.text_location_assertion,
            Some(TextLocationAssertion::Text("lo".to_string()))
        );
    }

    #[test]
    fn test_resolve_without_offset_leaves_it_unset() {
        let (doc, _, em) = content();
        let cfi = Cfi::new("epubcfi(/6/4!/4/2/2)").unwrap();

        let location = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(location.node, em);
        assert_eq!(location.offset, None);
    }

    #[test]
    fn test_resolve_zero_offset_is_not_recomputed() {
        let (doc, _, _) = content();

        // /5 is past the last child; the resolver points at the end of
        // " world" but the CFI's own zero offset is kept
        let cfi = Cfi::new("epubcfi(/6/4!/4/2/5:0)").unwrap();
        let location = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(location.offset, Some(0));
        assert_eq!(location.relative_to_node, Some(RelativeToNode::After));

        let cfi = Cfi::new("epubcfi(/6/4!/4/2/5:1)").unwrap();
        let location = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(location.offset, Some(6));
    }

    #[test]
    fn test_resolve_carries_metadata_without_mutating() {
        let (doc, _, em) = content();
        let cfi = Cfi::new("epubcfi(/6/4!/4/2[para]/2~3.5@1:2)").unwrap();
        let before = cfi.clone();

        let location = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(location.node, em);
        assert_eq!(location.temporal, Some(3.5));
        assert_eq!(location.spatial, Some(SpatialRange { from: 1.0, to: 2.0 }));
        assert_eq!(location.node_id, None);
        assert_eq!(cfi, before);

        // Resolving again gives the same answer
        let again = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(again, location);
    }

    #[test]
    fn test_resolve_uses_id_anchor() {
        let (doc, hello, _) = content();
        // Leading steps are bogus, the [para] anchor fixes the location
        let cfi = Cfi::new("epubcfi(/6/4!/4/40/2[para]/1:2)").unwrap();

        let location = cfi.resolve(&doc, &ResolveOptions::default()).unwrap();
        assert_eq!(location.node, hello);
        assert_eq!(location.offset, Some(2));

        let ignored = cfi
            .resolve(&doc, &ResolveOptions { ignore_ids: true })
            .unwrap();
        assert_ne!(ignored.node, hello);
    }

    #[test]
    fn test_resolve_empty_cfi_fails() {
        let (doc, _, _) = content();
        let cfi = Cfi::new("epubcfi()").unwrap();
        assert_eq!(cfi.part_count(), 0);
        assert!(matches!(
            cfi.resolve(&doc, &ResolveOptions::default()),
            Err(CfiError::Resolution(_))
        ));
    }

    #[test]
    fn test_resolve_uri_bounds() {
        let (doc, _, _) = content();
        let cfi = Cfi::new("epubcfi(/6/2!/4!/2)").unwrap();
        assert_eq!(cfi.part_count(), 3);

        // The last part names no next document
        assert!(matches!(
            cfi.resolve_uri(2, &doc, &ResolveOptions::default()),
            Err(CfiError::Resolution(_))
        ));
        assert!(matches!(
            cfi.resolve_uri(7, &doc, &ResolveOptions::default()),
            Err(CfiError::Resolution(_))
        ));
        assert!(matches!(
            cfi.resolve_uri(usize::MAX, &doc, &ResolveOptions::default()),
            Err(CfiError::Resolution(_))
        ));
        // In range, but content() has no package element for part 0
        assert!(matches!(
            cfi.resolve_uri(0, &doc, &ResolveOptions::default()),
            Err(CfiError::Resolution(_))
        ));
        // Part 1 resolves from <html> to <body>, which references nothing
        assert_eq!(
            cfi.resolve_uri(1, &doc, &ResolveOptions::default()).unwrap(),
            None
        );
    }

    #[test]
    fn test_resolve_uri_through_spine() {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let package = doc.append_element(root, "package");
        let _metadata = doc.append_element(package, "metadata");
        let manifest = doc.append_element(package, "manifest");
        let spine = doc.append_element(package, "spine");
        for (id, href) in [("c1", "c1.xhtml"), ("c2", "c2.xhtml")] {
            let item = doc.append_element(manifest, "item");
            doc.set_attribute(item, "id", id);
            doc.set_attribute(item, "href", href);
            let itemref = doc.append_element(spine, "itemref");
            doc.set_attribute(itemref, "idref", id);
        }

        let cfi = Cfi::new("epubcfi(/6/4!/4/2)").unwrap();
        assert_eq!(
            cfi.resolve_uri(0, &doc, &ResolveOptions::default()).unwrap(),
            Some("c2.xhtml".to_string())
        );
    }
}
