//! Load SVD XML into a labeled tree and resolve it using quick-xml.

pub mod resolve;
pub mod tree;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::trace;

pub use resolve::{propagate_properties, resolve, resolve_derived, Diagnostic};
pub use tree::{NodeData, NodeId, Tree};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed xml at byte {position}: {message}")]
    Malformed { position: usize, message: String },
    #[error("mixed text and elements are not supported in {path}")]
    MixedContent { path: String },
    #[error("internal parser error: {0}")]
    Internal(String),
}

/// Read the document at `path` and build its tree.
pub fn load_tree(path: impl AsRef<Path>) -> Result<Tree, XmlError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| XmlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let xml = String::from_utf8(bytes).map_err(|err| XmlError::Malformed {
        position: err.utf8_error().valid_up_to(),
        message: format!("invalid UTF-8: {err}"),
    })?;
    parse_tree(&xml)
}

/// Build the tree of an XML document. The returned tree is rooted at the
/// document's top-level element.
pub fn parse_tree(xml: &str) -> Result<Tree, XmlError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut nodes = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;

    loop {
        let position = reader.buffer_position();
        let malformed = |message: String| XmlError::Malformed { position, message };
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let id = open_element(&e, &mut nodes, &stack, &mut root, position)?;
                stack.push(id);
            }
            Ok(Event::Empty(e)) => {
                open_element(&e, &mut nodes, &stack, &mut root, position)?;
            }
            Ok(Event::End(_)) => {
                let id = stack
                    .pop()
                    .ok_or_else(|| XmlError::Internal("end tag without open element".into()))?;
                close_element(&mut nodes, id, root)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| malformed(err.to_string()))?;
                append_text(&mut nodes, &stack, &text, position)?;
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8(e.into_inner().into_owned())
                    .map_err(|err| malformed(format!("invalid UTF-8: {err}")))?;
                append_text(&mut nodes, &stack, text.trim(), position)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(err.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if let Some(&open) = stack.last() {
        return Err(XmlError::Malformed {
            position: reader.buffer_position(),
            message: format!("unterminated element <{}>", nodes[open.index()].name),
        });
    }
    let root = root.ok_or_else(|| XmlError::Internal("document has no root element".into()))?;
    trace!(nodes = nodes.len(), "built xml tree");
    Ok(Tree::from_parts(nodes, root))
}

/// Allocate the element described by `event` under the innermost open element.
fn open_element(
    event: &BytesStart<'_>,
    nodes: &mut Vec<NodeData>,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    position: usize,
) -> Result<NodeId, XmlError> {
    let parent = stack.last().copied();
    if parent.is_none() && root.is_some() {
        return Err(XmlError::Malformed {
            position,
            message: "more than one top-level element".into(),
        });
    }
    let name = std::str::from_utf8(event.name().as_ref())
        .map_err(|err| XmlError::Malformed {
            position,
            message: format!("invalid UTF-8 in element name: {err}"),
        })?
        .to_string();
    let attributes = attributes(event, position)?;
    let id = Tree::new_node(nodes, name, attributes, parent);
    if parent.is_none() {
        *root = Some(id);
    }
    Ok(id)
}

fn close_element(nodes: &mut [NodeData], id: NodeId, root: Option<NodeId>) -> Result<(), XmlError> {
    let node = &mut nodes[id.index()];
    let trimmed = node.text.trim();
    if trimmed.len() != node.text.len() {
        node.text = trimmed.to_string();
    }
    if node.is_mixed() {
        let tree = Tree::from_parts(nodes.to_vec(), root.unwrap_or(id));
        return Err(XmlError::MixedContent {
            path: tree.path(id),
        });
    }
    Ok(())
}

fn append_text(
    nodes: &mut [NodeData],
    stack: &[NodeId],
    text: &str,
    position: usize,
) -> Result<(), XmlError> {
    match stack.last() {
        Some(&current) => nodes[current.index()].text.push_str(text),
        None if !text.is_empty() => {
            return Err(XmlError::Malformed {
                position,
                message: "text outside the root element".into(),
            })
        }
        None => {}
    }
    Ok(())
}

fn attributes(event: &BytesStart<'_>, position: usize) -> Result<HashMap<String, String>, XmlError> {
    let malformed = |message: String| XmlError::Malformed { position, message };
    let mut out = HashMap::new();
    for attr in event.attributes() {
        let attr = attr.map_err(|err| malformed(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| malformed(format!("invalid UTF-8 in attribute name: {err}")))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| malformed(err.to_string()))?;
        out.insert(key, value.trim().to_string());
    }
    Ok(out)
}
