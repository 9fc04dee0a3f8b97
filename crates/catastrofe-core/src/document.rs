//! In-memory element tree for cadastral XML documents
//!
//! The model keeps exactly what a split or export needs to round-trip:
//! element names, attributes in source order, text and ordered children.
//! Whitespace-only text between tags is formatting and is not kept, CDATA is
//! folded into text, and comments, processing instructions and DOCTYPE are
//! dropped. Namespace declarations are ordinary attributes.

use crate::error::{CatastroError, Result};
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Indentation width of pretty-printed output documents
pub const INDENT_WIDTH: usize = 2;

/// Why a document could not be turned into an element tree
#[derive(Error, Debug)]
pub enum ParseError {
    /// Syntax error reported by the XML reader
    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The markup is well-formed locally but is not a single rooted document
    #[error("{0}")]
    Structure(String),
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    #[inline]
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.into())
    }
}

/// One XML element with its subtree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Qualified tag name as written in the source (prefix included)
    pub name: String,
    /// Attributes in source order
    pub attributes: Vec<(String, String)>,
    /// Text content directly inside this element
    pub text: Option<String>,
    /// Child elements in source order
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element with no attributes, text or children
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: append an attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder: set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child element
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Copy of this element's name and attributes, without content
    #[must_use]
    pub fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            text: None,
            children: Vec::new(),
        }
    }

    fn shallow_clone_with_text(&self) -> Self {
        Self {
            text: self.text.clone(),
            ..self.shallow_clone()
        }
    }

    /// Tag name without its namespace prefix
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Text content with surrounding whitespace removed, `""` when absent
    #[inline]
    #[must_use]
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map_or("", str::trim)
    }

    /// Number of elements in this subtree, including `self`
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Self::element_count)
            .sum::<usize>()
    }

    /// Pre-order iterator over all descendants (excluding `self`)
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant in document order whose local name is `local`
    #[must_use]
    pub fn find_descendant(&self, local: &str) -> Option<&Self> {
        self.descendants().find(|e| e.local_name() == local)
    }

    /// Every descendant whose local name is `local`, in document order
    pub fn descendants_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.descendants().filter(move |e| e.local_name() == local)
    }

    fn push_text(&mut self, text: &str) {
        match &mut self.text {
            Some(existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }
}

/// Pre-order traversal of an element's descendants
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// Tag name without its namespace prefix (`cat:BIE` → `BIE`)
#[inline]
#[must_use]
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn element_from_start(start: &BytesStart<'_>) -> std::result::Result<Element, ParseError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Attach a finished element to its parent, or make it the root
fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> std::result::Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_some() {
        Err(ParseError::Structure(format!(
            "second root element <{}>",
            element.name
        )))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn append_text(text: &str, stack: &mut [Element]) -> std::result::Result<(), ParseError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(current) => {
            current.push_text(text);
            Ok(())
        }
        None => Err(ParseError::Structure(
            "text outside the root element".to_string(),
        )),
    }
}

/// Parse a complete document from a buffered reader
///
/// # Errors
///
/// Returns `ParseError::Xml` for syntax errors (including mismatched end tags
/// and unknown entities) and `ParseError::Structure` when the input is not a
/// single rooted element tree.
pub fn parse_reader<R: BufRead>(input: R) -> std::result::Result<Element, ParseError> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(ParseError::Structure(
                        "content after the root element".to_string(),
                    ));
                }
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(e) => {
                let element = stack.pop().ok_or_else(|| {
                    ParseError::Structure(format!(
                        "unexpected end tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => append_text(&e.unescape()?, &mut stack)?,
            Event::CData(e) => append_text(&String::from_utf8_lossy(&e.into_inner()), &mut stack)?,
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Structure(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| ParseError::Structure("missing root element".to_string()))
}

/// Parse a complete document held in memory
///
/// # Errors
///
/// See [`parse_reader`].
pub fn parse_str(xml: &str) -> std::result::Result<Element, ParseError> {
    parse_reader(xml.as_bytes())
}

/// Load and parse the document at `path`
///
/// # Errors
///
/// Returns `InputNotFound` / `InputUnreadable` if the file cannot be opened and
/// `MalformedDocument` if it does not parse.
pub fn load_document(path: &Path) -> Result<Element> {
    let file = File::open(path).map_err(|e| CatastroError::from_input_io(path, e))?;
    let root = parse_reader(BufReader::new(file)).map_err(|source| {
        CatastroError::MalformedDocument {
            path: path.to_path_buf(),
            source,
        }
    })?;
    debug!(
        "Loaded {} (<{}>, {} direct children)",
        path.display(),
        root.name,
        root.children.len()
    );
    Ok(root)
}

fn xml_to_io(err: quick_xml::Error) -> io::Error {
    match err {
        quick_xml::Error::Io(inner) => io::Error::new(inner.kind(), inner.to_string()),
        other => io::Error::other(other),
    }
}

fn start_tag(element: &Element) -> BytesStart<'_> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    start
}

fn write_subtree<W: Write>(
    writer: &mut Writer<W>,
    element: &Element,
) -> std::result::Result<(), quick_xml::Error> {
    let start = start_tag(element);

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in &element.children {
        write_subtree(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Write `element` without any formatting whitespace
///
/// # Errors
///
/// Returns any error raised by the underlying writer.
pub fn write_compact<W: Write>(element: &Element, out: W) -> io::Result<()> {
    let mut writer = Writer::new(out);
    write_subtree(&mut writer, element).map_err(xml_to_io)
}

/// Write `element` as a complete document: UTF-8 declaration, two-space
/// indentation and a trailing newline
///
/// # Errors
///
/// Returns any error raised by the underlying writer.
pub fn write_document<W: Write>(element: &Element, out: W) -> io::Result<()> {
    write_document_with_children(element, element.children.iter(), out)
}

/// Like [`write_document`], but the root's children are taken from `children`
/// instead of `head.children`
///
/// Lets a caller stitch a document together from borrowed parts without
/// cloning them into one tree first.
///
/// # Errors
///
/// Returns any error raised by the underlying writer.
pub fn write_document_with_children<'a, W, I>(head: &Element, children: I, out: W) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Element>,
{
    let mut writer = Writer::new_with_indent(out, b' ', INDENT_WIDTH);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_to_io)?;

    let mut children = children.into_iter().peekable();
    if children.peek().is_none() {
        write_subtree(&mut writer, &head.shallow_clone_with_text()).map_err(xml_to_io)?;
    } else {
        writer.write_event(Event::Start(start_tag(head))).map_err(xml_to_io)?;
        if let Some(text) = &head.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_to_io)?;
        }
        for child in children {
            write_subtree(&mut writer, child).map_err(xml_to_io)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(head.name.as_str())))
            .map_err(xml_to_io)?;
    }

    writer.get_mut().write_all(b"\n")
}

/// Compact serialisation as a string
#[must_use]
pub fn to_compact_string(element: &Element) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_compact(element, &mut out);
    String::from_utf8_lossy(&out).into_owned()
}
