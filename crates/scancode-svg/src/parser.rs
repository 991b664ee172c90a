//! SVG document tree
//!
//! Parses SVG files (XML format) into an owned tree that can be mutated and
//! written back. Markup the animator never touches (comments, doctype, text,
//! CDATA, foreign elements) is kept as raw quick-xml events and written back
//! verbatim.

use crate::error::{Result, SvgError};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use std::fs;
use std::path::Path;

/// Namespace URI of SVG elements
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Namespace an element name resolved to while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementNamespace {
    /// Bound to [`SVG_NAMESPACE`]
    Svg,
    /// No namespace in scope (bare `<svg>` documents)
    Unbound,
    /// Some other namespace
    Other,
}

impl ElementNamespace {
    fn from_resolved(ns: &ResolveResult<'_>) -> Self {
        match ns {
            ResolveResult::Bound(Namespace(uri)) if *uri == SVG_NAMESPACE.as_bytes() => Self::Svg,
            ResolveResult::Unbound => Self::Unbound,
            _ => Self::Other,
        }
    }
}

/// A node in the document tree
#[derive(Debug, Clone)]
pub enum Node {
    /// Element with attributes and children
    Element(Element),
    /// Character data, kept escaped exactly as read
    Text(BytesText<'static>),
    /// CDATA section
    CData(BytesCData<'static>),
    /// Comments, processing instructions, doctype
    Other(Event<'static>),
}

impl Node {
    pub(crate) fn is_whitespace(&self) -> bool {
        match self {
            Self::Text(text) => text.iter().all(u8::is_ascii_whitespace),
            _ => false,
        }
    }
}

/// An XML element
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    namespace: ElementNamespace,
    attrs: Vec<(String, String)>,

    /// Child nodes in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: ElementNamespace) -> Self {
        Self {
            name: name.into(),
            namespace,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(e: &BytesStart<'_>, namespace: ElementNamespace) -> Result<Self> {
        let name = utf8(e.name().as_ref())?.to_string();
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| SvgError::XmlError(err.to_string()))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            namespace,
            attrs,
            children: Vec::new(),
        })
    }

    /// Qualified name as written in the source (`rect`, `svg:rect`)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix
    #[inline]
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Namespace prefix, if the name carries one
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Resolved namespace
    #[inline]
    #[must_use]
    pub const fn namespace(&self) -> ElementNamespace {
        self.namespace
    }

    /// True for an SVG element (or un-namespaced element) with this local name
    #[must_use]
    pub fn is_svg(&self, local_name: &str) -> bool {
        matches!(
            self.namespace,
            ElementNamespace::Svg | ElementNamespace::Unbound
        ) && self.local_name() == local_name
    }

    /// Attribute value (unescaped)
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as a number; `None` when absent or not numeric
    #[must_use]
    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }

    /// Set an attribute, replacing in place or appending after existing ones
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    /// Attributes in source order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Direct element children
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Character data before the first child element.
    ///
    /// Comments in between are skipped, so `a<!--x-->b` reads as `ab`.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Element(_) => break,
                Node::Text(text) => match text.unescape() {
                    Ok(s) => out.push_str(&s),
                    Err(_) => out.push_str(&String::from_utf8_lossy(text)),
                },
                Node::CData(cdata) => out.push_str(&String::from_utf8_lossy(cdata)),
                Node::Other(_) => {}
            }
        }
        out
    }

    /// Replace the character data before the first child element
    pub fn set_text(&mut self, text: &str) {
        let first_element = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(_)))
            .unwrap_or(self.children.len());
        let mut index = 0;
        self.children.retain(|node| {
            let leading = index < first_element;
            index += 1;
            !(leading && matches!(node, Node::Text(_) | Node::CData(_)))
        });
        if !text.is_empty() {
            let escaped = partial_escape(text).into_owned();
            self.children
                .insert(0, Node::Text(BytesText::from_escaped(escaped)));
        }
    }
}

/// Parsed SVG document
#[derive(Debug, Clone)]
pub struct SvgDocument {
    prolog: Vec<Node>,

    /// Root element (normally `<svg>`)
    pub root: Element,

    epilog: Vec<Node>,
}

/// Accumulates nodes while the reader walks the event stream
#[derive(Debug, Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        let stray_text =
            matches!(node, Node::Text(_) | Node::CData(_)) && !node.is_whitespace();
        if stray_text {
            return Err(SvgError::InvalidStructure(
                "character data outside the root element".to_string(),
            ));
        }

        match node {
            Node::Element(el) => {
                if self.root.is_some() {
                    return Err(SvgError::InvalidStructure(format!(
                        "more than one root element (<{}>)",
                        el.name
                    )));
                }
                self.root = Some(el);
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<SvgDocument> {
        if let Some(open) = self.stack.last() {
            return Err(SvgError::InvalidStructure(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        let root = self
            .root
            .ok_or_else(|| SvgError::InvalidStructure("no root element".to_string()))?;
        Ok(SvgDocument {
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

/// Parse SVG file from path
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened or read (`SvgError::Io`)
/// - The content is not valid XML (`SvgError::XmlError`)
/// - The tree is incomplete (`SvgError::InvalidStructure`)
pub fn parse_svg(path: &Path) -> Result<SvgDocument> {
    let content = fs::read_to_string(path)?;
    parse_svg_str(&content)
}

/// Parse SVG from string content
///
/// # Errors
///
/// Returns an error if:
/// - The content is not valid XML (`SvgError::XmlError`)
/// - The tree is incomplete (`SvgError::InvalidStructure`)
pub fn parse_svg_str(content: &str) -> Result<SvgDocument> {
    let mut reader = NsReader::from_str(content);
    let mut builder = TreeBuilder::default();

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("XML parse error in SVG: {e}");
                return Err(SvgError::XmlError(e.to_string()));
            }
        };
        let namespace = ElementNamespace::from_resolved(&ns);

        match event {
            Event::Start(e) => builder.stack.push(Element::from_start(&e, namespace)?),
            Event::Empty(e) => builder.attach(Node::Element(Element::from_start(&e, namespace)?))?,
            Event::End(e) => {
                let el = builder.stack.pop().ok_or_else(|| {
                    SvgError::InvalidStructure(format!(
                        "unexpected end tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                builder.attach(Node::Element(el))?;
            }
            Event::Text(e) => builder.attach(Node::Text(e.into_owned()))?,
            Event::CData(e) => builder.attach(Node::CData(e.into_owned()))?,
            // A fresh declaration is written on output
            Event::Decl(_) => {}
            Event::Eof => break,
            other => builder.attach(Node::Other(other.into_owned()))?,
        }
    }

    builder.finish()
}

impl SvgDocument {
    /// Serialize with a standard XML declaration.
    ///
    /// Namespace declarations are ordinary attributes of the tree, so they
    /// are written back exactly as parsed.
    ///
    /// # Errors
    ///
    /// Returns `SvgError::XmlError` if the writer rejects an event.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        )?;
        emit(&mut writer, Event::Text(BytesText::from_escaped("\n")))?;

        for node in self.prolog.iter().skip_while(|node| node.is_whitespace()) {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        Ok(writer.into_inner())
    }

    /// Serialize to a UTF-8 string
    ///
    /// # Errors
    ///
    /// Same as [`SvgDocument::to_bytes`].
    pub fn to_svg_string(&self) -> Result<String> {
        let bytes = self.to_bytes()?;
        String::from_utf8(bytes).map_err(|e| SvgError::XmlError(e.to_string()))
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| SvgError::XmlError(e.to_string()))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(el) => write_element(writer, el),
        Node::Text(text) => emit(writer, Event::Text(text.clone())),
        Node::CData(cdata) => emit(writer, Event::CData(cdata.clone())),
        Node::Other(event) => emit(writer, event.clone()),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

#[inline]
fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| SvgError::XmlError(e.to_string()))
}
