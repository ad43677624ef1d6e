//! Cross-document references
//!
//! The node a non-final part resolves to names the document the next part
//! lives in. Where that name sits depends on what the node is.

use crate::document::{DocumentTree, XLINK_NS};
use crate::error::{CfiError, Result};

/// Extract the href of the document referenced by `node`
///
/// Returns `Ok(None)` for nodes that do not reference another document.
pub fn referenced_href<'a, D: DocumentTree>(doc: &'a D, node: D::Node<'a>) -> Result<Option<String>> {
    let Some(name) = doc.local_name(node) else {
        return Ok(None);
    };
    let tag = name.to_ascii_lowercase();

    let href = match tag.as_str() {
        "itemref" if is_spine_child(doc, node) => Some(manifest_href(doc, node)?),
        "iframe" | "embed" => Some(required(doc.attribute(node, "src"), &tag, "src")?),
        "object" => Some(required(doc.attribute(node, "data"), &tag, "data")?),
        "image" | "use" => Some(required(
            doc.attribute_ns(node, XLINK_NS, "href"),
            &tag,
            "xlink:href",
        )?),
        _ => None,
    };

    if let Some(href) = &href {
        tracing::debug!(element = %tag, href = %href, "Resolved CFI document reference");
    }
    Ok(href)
}

fn is_spine_child<'a, D: DocumentTree>(doc: &'a D, node: D::Node<'a>) -> bool {
    doc.parent(node)
        .and_then(|parent| doc.local_name(parent))
        .is_some_and(|name| name.eq_ignore_ascii_case("spine"))
}

/// Follow a spine `itemref` through the manifest to its `href`
fn manifest_href<'a, D: DocumentTree>(doc: &'a D, itemref: D::Node<'a>) -> Result<String> {
    let idref = non_empty(doc.attribute(itemref, "idref")).ok_or_else(|| {
        CfiError::Resolution("Referenced node has no 'idref' attribute".to_string())
    })?;
    let item = doc.element_by_id(idref).ok_or_else(|| {
        CfiError::Resolution(format!("Spine item '{}' is missing from manifest", idref))
    })?;
    non_empty(doc.attribute(item, "href"))
        .map(str::to_string)
        .ok_or_else(|| {
            CfiError::Resolution(format!("Manifest item '{}' is missing href attribute", idref))
        })
}

/// Empty attribute values count as missing
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn required(value: Option<&str>, tag: &str, attribute: &str) -> Result<String> {
    non_empty(value).map(str::to_string).ok_or_else(|| {
        CfiError::Resolution(format!(
            "{} element is missing '{}' attribute",
            tag, attribute
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, NodeId};

    fn package() -> (MemoryDocument, NodeId, NodeId) {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let package = doc.append_element(root, "package");
        let manifest = doc.append_element(package, "manifest");
        let spine = doc.append_element(package, "spine");
        (doc, manifest, spine)
    }

    #[test]
    fn test_itemref_goes_through_manifest() {
        let (mut doc, manifest, spine) = package();
        let item = doc.append_element(manifest, "item");
        doc.set_attribute(item, "id", "chap1");
        doc.set_attribute(item, "href", "text/chap1.xhtml");
        let itemref = doc.append_element(spine, "itemref");
        doc.set_attribute(itemref, "idref", "chap1");

        assert_eq!(
            referenced_href(&doc, itemref).unwrap(),
            Some("text/chap1.xhtml".to_string())
        );
    }

    #[test]
    fn test_itemref_failures() {
        let (mut doc, manifest, spine) = package();
        let bare = doc.append_element(spine, "itemref");
        assert!(matches!(referenced_href(&doc, bare), Err(CfiError::Resolution(_))));

        let dangling = doc.append_element(spine, "itemref");
        doc.set_attribute(dangling, "idref", "nowhere");
        assert!(matches!(
            referenced_href(&doc, dangling),
            Err(CfiError::Resolution(_))
        ));

        let item = doc.append_element(manifest, "item");
        doc.set_attribute(item, "id", "nohref");
        let no_href = doc.append_element(spine, "itemref");
        doc.set_attribute(no_href, "idref", "nohref");
        assert!(matches!(
            referenced_href(&doc, no_href),
            Err(CfiError::Resolution(_))
        ));
    }

    #[test]
    fn test_itemref_outside_spine_is_not_a_reference() {
        let (mut doc, manifest, _) = package();
        let stray = doc.append_element(manifest, "itemref");
        doc.set_attribute(stray, "idref", "x");
        assert_eq!(referenced_href(&doc, stray).unwrap(), None);
    }

    #[test]
    fn test_embedded_content_attributes() {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let body = doc.append_element(root, "body");

        let iframe = doc.append_element(body, "IFRAME");
        doc.set_attribute(iframe, "src", "frame.xhtml");
        let embed = doc.append_element(body, "embed");
        doc.set_attribute(embed, "src", "movie.svg");
        let object = doc.append_element(body, "object");
        doc.set_attribute(object, "data", "widget.xhtml");
        let image = doc.append_element(body, "svg:image");
        doc.set_attribute_ns(image, XLINK_NS, "href", "cover.svg");
        let used = doc.append_element(body, "use");
        doc.set_attribute_ns(used, XLINK_NS, "href", "defs.svg");

        let href = |n: NodeId| referenced_href(&doc, n).unwrap();
        assert_eq!(href(iframe).as_deref(), Some("frame.xhtml"));
        assert_eq!(href(embed).as_deref(), Some("movie.svg"));
        assert_eq!(href(object).as_deref(), Some("widget.xhtml"));
        assert_eq!(href(image).as_deref(), Some("cover.svg"));
        assert_eq!(href(used).as_deref(), Some("defs.svg"));
    }

    #[test]
    fn test_missing_attribute_errors() {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let body = doc.append_element(root, "body");
        let iframe = doc.append_element(body, "iframe");
        let object = doc.append_element(body, "object");
        let image = doc.append_element(body, "image");
        doc.set_attribute(image, "href", "plain.png");

        for node in [iframe, object, image] {
            assert!(matches!(referenced_href(&doc, node), Err(CfiError::Resolution(_))));
        }
    }

    #[test]
    fn test_empty_attribute_errors() {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let body = doc.append_element(root, "body");
        let iframe = doc.append_element(body, "iframe");
        doc.set_attribute(iframe, "src", "");
        let embed = doc.append_element(body, "embed");
        doc.set_attribute(embed, "src", "");
        let object = doc.append_element(body, "object");
        doc.set_attribute(object, "data", "");
        let image = doc.append_element(body, "image");
        doc.set_attribute_ns(image, XLINK_NS, "href", "");
        let used = doc.append_element(body, "use");
        doc.set_attribute_ns(used, XLINK_NS, "href", "");

        for node in [iframe, embed, object, image, used] {
            assert!(matches!(referenced_href(&doc, node), Err(CfiError::Resolution(_))));
        }
    }

    #[test]
    fn test_itemref_empty_idref_or_href_errors() {
        let (mut doc, manifest, spine) = package();
        let empty_idref = doc.append_element(spine, "itemref");
        doc.set_attribute(empty_idref, "idref", "");
        assert!(matches!(
            referenced_href(&doc, empty_idref),
            Err(CfiError::Resolution(_))
        ));

        let item = doc.append_element(manifest, "item");
        doc.set_attribute(item, "id", "blank");
        doc.set_attribute(item, "href", "");
        let itemref = doc.append_element(spine, "itemref");
        doc.set_attribute(itemref, "idref", "blank");
        assert!(matches!(referenced_href(&doc, itemref), Err(CfiError::Resolution(_))));
    }

    #[test]
    fn test_other_nodes_have_no_reference() {
        let mut doc = MemoryDocument::new();
        let root = doc.document();
        let body = doc.append_element(root, "body");
        let p = doc.append_element(body, "p");
        let text = doc.append_text(p, "hello");

        assert_eq!(referenced_href(&doc, p).unwrap(), None);
        assert_eq!(referenced_href(&doc, text).unwrap(), None);
    }
}
