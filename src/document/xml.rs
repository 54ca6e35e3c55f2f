//! Textual form of a document.
//!
//! Both directions go through `quick-xml`: an indenting [`Writer`] on the
//! way out and the pull [`Reader`] on the way in. Reading only keeps
//! elements and attributes; text content, comments and processing
//! instructions carry no meaning here.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use tracing::debug;

use super::DocNode;
use crate::util::{Error, Result};

const INDENT: usize = 2;

/// Serialize a document tree to text with an XML declaration.
pub fn to_string(root: &DocNode) -> Result<String> {
    let bytes = write_document(Vec::with_capacity(root.count_nodes() * 48), root)?;
    String::from_utf8(bytes).map_err(Error::xml)
}

/// Parse document text into a tree.
pub fn from_str(text: &str) -> Result<DocNode> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<DocNode> = Vec::new();
    let mut root: Option<DocNode> = None;

    loop {
        match reader.read_event().map_err(Error::xml)? {
            Event::Start(e) => stack.push(element(&e)?),
            Event::Empty(e) => attach(&mut stack, &mut root, element(&e)?)?,
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("closing tag without opening tag".into()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Xml(format!("unclosed element <{}>", open.tag())));
    }
    root.ok_or_else(|| Error::Xml("document has no root element".into()))
}

/// Write a document to disk.
pub fn write_file(root: &DocNode, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut sink = write_document(BufWriter::new(File::create(path)?), root)?;
    sink.flush()?;
    debug!(path = %path.display(), nodes = root.count_nodes(), "document written");
    Ok(())
}

/// Read a document from disk.
pub fn read_file(path: impl AsRef<Path>) -> Result<DocNode> {
    let text = fs::read_to_string(path.as_ref())?;
    from_str(&text)
}

fn element(e: &BytesStart<'_>) -> Result<DocNode> {
    let mut node = DocNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(Error::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(Error::xml)?.into_owned();
        node.set(key, value);
    }
    Ok(node)
}

fn attach(stack: &mut [DocNode], root: &mut Option<DocNode>, node: DocNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(Error::Xml(format!("second root element <{}>", node.tag()))),
    }
}

fn write_document<W: Write>(sink: W, root: &DocNode) -> Result<W> {
    let mut writer = Writer::new_with_indent(sink, b' ', INDENT);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(Error::xml)?;
    write_node(&mut writer, root)?;
    let mut sink = writer.into_inner();
    sink.write_all(b"\n")?;
    Ok(sink)
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &DocNode) -> Result<()> {
    let mut start = BytesStart::new(node.tag());
    for (key, value) in node.attributes() {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escape_attribute(value).into_bytes()),
        });
    }

    if node.num_children() == 0 {
        return writer.write_event(Event::Empty(start)).map_err(Error::xml);
    }
    writer.write_event(Event::Start(start)).map_err(Error::xml)?;
    for child in node.children() {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.tag())))
        .map_err(Error::xml)
}

/// Escape an attribute value, keeping whitespace controls as character
/// references so attribute normalization cannot fold them into spaces.
fn escape_attribute(value: &str) -> String {
    let escaped = quick_xml::escape::escape(value);
    let mut out = String::with_capacity(escaped.len());
    for ch in escaped.chars() {
        match ch {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DocNode {
        let mut root = DocNode::new("SceneDocument").with_attr("source", "bike.blend");
        let libs = root.push(DocNode::new("Libraries"));
        libs.ensure_child("Meshes")
            .push(DocNode::new("Mesh").with_attr("name", "Wheel <front> & \"rear\""));
        root.push(DocNode::new("Scenes"))
            .push(DocNode::new("Scene").with_attr("name", "Line\nBreak\tTab"));
        root
    }

    #[test]
    fn test_text_round_trip() {
        let doc = sample();
        let text = to_string(&doc).expect("serialize");
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("&lt;front&gt;"));
        assert!(text.contains(r#"name="Line&#10;Break&#9;Tab""#), "{text}");
        let back = from_str(&text).expect("parse");
        assert_eq!(back, doc);
    }

    #[test]
    fn test_indented_layout() {
        let text = to_string(&sample()).expect("serialize");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], r#"<SceneDocument source="bike.blend">"#);
        assert_eq!(lines[2], "  <Libraries>");
        assert!(lines[4].starts_with(r#"      <Mesh name="Wheel"#) && lines[4].ends_with("/>"), "{text}");
        assert_eq!(lines.last(), Some(&"</SceneDocument>"));
    }

    #[test]
    fn test_carriage_return_survives() {
        let doc = DocNode::new("Root").with_attr("note", "a\r\nb");
        let back = from_str(&to_string(&doc).expect("serialize")).expect("parse");
        assert_eq!(back.get("note"), Some("a\r\nb"));
    }

    #[test]
    fn test_ignores_text_and_comments() {
        let text = r#"<?xml version="1.0"?>
            <!-- exported -->
            <Root a="1">some text<Child b="2"/></Root>"#;
        let doc = from_str(text).expect("parse");
        assert_eq!(doc.tag(), "Root");
        assert_eq!(doc.children().len(), 1);
        assert_eq!(doc.child("Child").and_then(|c| c.get("b")), Some("2"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(from_str("<A><B></A>"), Err(Error::Xml(_))));
        assert!(matches!(from_str("<A>"), Err(Error::Xml(_))));
        assert!(matches!(from_str(""), Err(Error::Xml(_))));
        assert!(matches!(from_str("<A/><B/>"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scene.sdoc");
        write_file(&sample(), &path).expect("write");
        assert_eq!(read_file(&path).expect("read"), sample());
    }
}
