//! Wire document model
//!
//! A small element tree over `quick-xml`: the service only ever sends
//! element-only content (one child per field, text leaves), so mixed
//! content and namespaces are not modelled.

use crate::error::{Result, TrackerError};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use std::io::Cursor;

/// Attribute that marks an absent optional value
pub const NIL_ATTRIBUTE: &str = "nil";

/// A single element of a wire document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Leaf element carrying text content
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    /// Null marker: an empty element flagged with `nil="true"`
    pub fn nil(name: impl Into<String>) -> Self {
        Self::new(name).with_attribute(NIL_ATTRIBUTE, "true")
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Remove the first direct child with the given name
    pub fn remove_child(&mut self, name: &str) -> Option<Element> {
        let idx = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(idx))
    }

    /// Direct children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key || k.rsplit(':').next() == Some(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_nil(&self) -> bool {
        self.attribute(NIL_ATTRIBUTE) == Some("true")
    }

    /// Text of a child element; `None` when the child is absent or a null marker
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .filter(|c| !c.is_nil())
            .map(|c| c.text.as_str())
    }

    fn write_xml<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.text.is_empty() && self.children.is_empty() {
            writer.write_event(Event::Empty(start)).map_err(xml_err)?;
            return Ok(());
        }

        writer.write_event(Event::Start(start)).map_err(xml_err)?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(xml_err)?;
        }
        for child in &self.children {
            child.write_xml(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(xml_err)?;
        Ok(())
    }

    /// Render this element (and its subtree) as markup
    pub fn outer_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_xml(&mut writer)?;
        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| TrackerError::Xml(e.to_string()))
    }
}

fn xml_err(e: impl std::fmt::Display) -> TrackerError {
    TrackerError::Xml(e.to_string())
}

/// A parsed wire document with a single top-level element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parse a document from markup
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(start_element(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = start_element(e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| TrackerError::Xml("unbalanced end tag".to_string()))?;
                    // indentation between child elements is not content
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(t)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&t.unescape().map_err(xml_err)?);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(TrackerError::Xml(e.to_string())),
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(TrackerError::Xml("unexpected end of document".to_string()));
        }
        root.map(Self::new)
            .ok_or_else(|| TrackerError::Xml("document has no root element".to_string()))
    }

    /// The document's top-level element
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    /// Resolve a slash-separated path starting at the top-level element,
    /// e.g. `"story"` or `"/iteration/stories/"`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != self.root.name {
            return None;
        }
        segments.try_fold(&self.root, |el, seg| el.child(seg))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != self.root.name {
            return None;
        }
        segments.try_fold(&mut self.root, |el, seg| el.child_mut(seg))
    }

    /// Markup of the top-level element, without an XML declaration
    pub fn outer_xml(&self) -> Result<String> {
        self.root.outer_xml()
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
