//! epubcfi command-line tool
//!
//! ```text
//! epubcfi <cfi>                  print the parsed parts as JSON
//! epubcfi <cfi> <package.opf>    follow the CFI through an unpacked EPUB
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epubcfi::config::Config;
use epubcfi::{
    Cfi, DocumentTree, NodeKind, RelativeToNode, ResolveOptions, SideBias, SpatialRange,
    TextLocationAssertion,
};

const USAGE: &str = "usage: epubcfi <cfi> [<package.opf>]";

/// Resolved location, printed as JSON
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationReport {
    document: String,
    node: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relative_to_node: Option<RelativeToNode>,
    #[serde(rename = "nodeID", skip_serializing_if = "Option::is_none")]
    node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    side_bias: Option<SideBias>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_location_assertion: Option<TextLocationAssertion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temporal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spatial: Option<SpatialRange>,
}

fn main() -> Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| "epubcfi=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(raw) = args.next() else {
        bail!(USAGE);
    };

    let cfi = Cfi::new(&raw).with_context(|| format!("Failed to parse '{}'", raw))?;

    match args.next() {
        None => println!("{}", serde_json::to_string_pretty(&cfi)?),
        Some(package) => {
            let report = resolve_on_disk(&cfi, Path::new(&package), &config.resolve)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Follow every part of `cfi` from the package document to the final
/// content document and resolve the location there
fn resolve_on_disk(cfi: &Cfi, package: &Path, opts: &ResolveOptions) -> Result<LocationReport> {
    if cfi.part_count() == 0 {
        bail!("CFI has no parts to resolve");
    }

    let mut path = package.to_path_buf();
    for index in 0..cfi.part_count() - 1 {
        let text = read(&path)?;
        let doc = parse_xml(&text, &path)?;
        let href = cfi
            .resolve_uri(index, &doc, opts)?
            .with_context(|| format!("Part {} does not reference another document", index))?;

        tracing::info!(part = index, href = %href, "Following document reference");
        path = next_document(&path, &href);
    }

    let text = read(&path)?;
    let doc = parse_xml(&text, &path)?;
    let location = cfi.resolve(&doc, opts)?;

    Ok(LocationReport {
        document: path.display().to_string(),
        node: describe(&doc, location.node),
        offset: location.offset,
        relative_to_node: location.relative_to_node,
        node_id: location.node_id,
        side_bias: location.side_bias,
        text_location_assertion: location.text_location_assertion,
        temporal: location.temporal,
        spatial: location.spatial,
    })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_xml<'input>(text: &'input str, path: &Path) -> Result<roxmltree::Document<'input>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(text, options)
        .with_context(|| format!("Failed to parse XML in {}", path.display()))
}

/// Hrefs are percent-encoded URIs relative to the referencing document;
/// fragments are dropped
fn next_document(current: &Path, href: &str) -> PathBuf {
    let href = href.split('#').next().unwrap_or(href);
    let decoded = urlencoding::decode(href).unwrap_or_else(|_| href.into());
    current
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(&*decoded)
}

/// Slash-separated element path, e.g. `/html/body/p/text()`
fn describe<'a, D: DocumentTree>(doc: &'a D, node: D::Node<'a>) -> String {
    let mut labels = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        match doc.kind(n) {
            NodeKind::Element => labels.push(doc.local_name(n).unwrap_or("*").to_string()),
            NodeKind::Text | NodeKind::CData => labels.push("text()".to_string()),
            NodeKind::Other => {}
        }
        current = doc.parent(n);
    }
    labels.reverse();
    format!("/{}", labels.join("/"))
}
