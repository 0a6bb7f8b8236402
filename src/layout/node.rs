//! Minimal owned XML tree for the host layout dialects
//!
//! The layout and form dialects are small, attribute-heavy documents. Parsing
//! them through an owned tree keeps the traversal code total: once the tree is
//! built, navigation cannot fail, and a child that appears once or many times
//! is read through the same `children` iterator.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Error reading an XML document into a tree
#[derive(Debug, Error)]
pub(crate) enum XmlError {
    #[error("xml syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("document has no root element")]
    NoRoot,

    #[error("unclosed element <{0}>")]
    Unclosed(String),
}

/// One element: name, attributes, and child elements in document order.
///
/// Text content is not retained; both dialects carry their data in
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct XmlNode {
    pub(crate) name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Read a document and return its root element.
    pub(crate) fn parse(xml: &str) -> Result<XmlNode, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(start)) => stack.push(XmlNode::from_start(&start)),
                Ok(Event::Empty(start)) => attach(XmlNode::from_start(&start), &mut stack, &mut root),
                Ok(Event::End(_)) => {
                    if let Some(done) = stack.pop() {
                        attach(done, &mut stack, &mut root);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(XmlError::Syntax {
                        position: reader.buffer_position() as u64,
                        message: err.to_string(),
                    })
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        root.ok_or(XmlError::NoRoot)
    }

    fn from_start(start: &BytesStart) -> XmlNode {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            // Entity unescape failures keep the raw text rather than losing
            // the attribute.
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            attrs.push((key, value));
        }
        XmlNode {
            name,
            attrs,
            children: Vec::new(),
        }
    }

    /// Attribute value by name, if present.
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given name.
    pub(crate) fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name, in document order.
    ///
    /// This is the one lookup primitive for repeated children: a name that
    /// never occurs yields an empty iterator, a single occurrence yields one
    /// element, and repeats yield all of them. Every level of the layout and
    /// form walks reads through this, so "one child" and "many children"
    /// documents take the same code path.
    pub(crate) fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn attach(node: XmlNode, stack: &mut Vec<XmlNode>, root: &mut Option<XmlNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            // Keep the first top-level element; trailing junk is ignored.
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_elements_in_order() {
        let root = XmlNode::parse(r#"<grid><row><cell name="a"/><cell name="b"/></row></grid>"#)
            .expect("well-formed document");
        assert_eq!(root.name, "grid");
        let row = root.child("row").expect("row child");
        let names: Vec<_> = row
            .children("cell")
            .map(|c| c.attr("name").unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_single_child_reads_as_one_element_list() {
        let root = XmlNode::parse(r#"<tabs><tab name="only"/></tabs>"#).expect("parse");
        assert_eq!(root.children("tab").count(), 1);
        assert_eq!(root.children("missing").count(), 0);
    }

    #[test]
    fn test_attribute_entities_are_unescaped() {
        let root = XmlNode::parse(r#"<label description="P &amp; L"/>"#).expect("parse");
        assert_eq!(root.attr("description"), Some("P & L"));
    }

    #[test]
    fn test_truncated_document_is_an_error() {
        assert!(XmlNode::parse("<grid><row>").is_err());
    }

    #[test]
    fn test_mismatched_close_is_an_error() {
        assert!(XmlNode::parse("<grid><row></cell></grid>").is_err());
    }

    #[test]
    fn test_empty_document_has_no_root() {
        assert!(matches!(XmlNode::parse(""), Err(XmlError::NoRoot)));
        assert!(matches!(XmlNode::parse("   \n"), Err(XmlError::NoRoot)));
    }
}
