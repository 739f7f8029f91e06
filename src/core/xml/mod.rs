//! Mutable XML document tree built on `quick_xml` events.
//!
//! ETS exports are rewritten in place (names changed, group addresses removed)
//! and saved back, so the parser keeps every node it sees and the writer
//! replays them. Element lookups are namespace-aware: each query takes the
//! [`Namespace`] sniffed from the document root rather than relying on a
//! process-wide setting.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::core::errors::{KnxError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Declaration {
    version: String,
    encoding: Option<String>,
    standalone: Option<String>,
}

/// XML namespace URI used to qualify element queries.
///
/// ETS changes the project schema URI between tool versions
/// (`http://knx.org/xml/project/14`, `.../20`, ...), so it is read from the
/// root element of every document instead of being hard-coded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespace {
    uri: String,
}

impl Namespace {
    /// Namespace with an explicit URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// The empty namespace (documents without a default `xmlns`)
    pub fn none() -> Self {
        Self::default()
    }

    /// Read the namespace the root element is in, following its prefix if it has one.
    pub fn sniff(document: &Document) -> Result<Self> {
        let root = document
            .root()
            .ok_or_else(|| KnxError::malformed(document.origin(), "document has no root element"))?;
        Ok(Self::new(document.namespace_uri(root).unwrap_or_default()))
    }

    /// Namespace URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn matches(&self, candidate: Option<&str>) -> bool {
        candidate.unwrap_or_default() == self.uri
    }
}

/// In-memory XML document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    origin: String,
    nodes: Vec<Node>,
    top_level: Vec<NodeId>,
    declaration: Option<Declaration>,
    doctype: Option<String>,
}

impl Document {
    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|err| {
            KnxError::io(format!("Failed to read XML document at {}", path.display()), err)
        })?;
        Self::parse(&bytes, path.display().to_string())
    }

    /// Parse a document from raw bytes. `origin` names the document in errors.
    pub fn parse(bytes: &[u8], origin: impl Into<String>) -> Result<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut document = Self {
            origin: origin.into(),
            ..Self::default()
        };

        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut open: Vec<NodeId> = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|err| {
                KnxError::malformed(
                    &document.origin,
                    format!("at byte {}: {err}", reader.buffer_position()),
                )
            })?;

            match event {
                Event::Decl(decl) => {
                    document.declaration = Some(document.read_declaration(&decl)?);
                }
                Event::DocType(text) => {
                    document.doctype = Some(String::from_utf8_lossy(&text).trim().to_string());
                }
                Event::Start(tag) => {
                    let data = document.read_element(&tag)?;
                    let id = document.push(data, open.last().copied());
                    open.push(id);
                }
                Event::Empty(tag) => {
                    let data = document.read_element(&tag)?;
                    document.push(data, open.last().copied());
                }
                Event::End(_) => {
                    if open.pop().is_none() {
                        return Err(KnxError::malformed(&document.origin, "unbalanced end tag"));
                    }
                }
                Event::Text(text) => {
                    let value = text
                        .unescape()
                        .map_err(|err| KnxError::malformed(&document.origin, err.to_string()))?
                        .into_owned();
                    document.push(NodeData::Text(value), open.last().copied());
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    document.push(NodeData::CData(value), open.last().copied());
                }
                Event::Comment(text) => {
                    let value = String::from_utf8_lossy(&text).into_owned();
                    document.push(NodeData::Comment(value), open.last().copied());
                }
                Event::PI(text) => {
                    let value = String::from_utf8_lossy(&text).into_owned();
                    document.push(NodeData::ProcessingInstruction(value), open.last().copied());
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        if !open.is_empty() {
            return Err(KnxError::malformed(
                &document.origin,
                format!("{} element(s) left unclosed", open.len()),
            ));
        }
        if document.root().is_none() {
            return Err(KnxError::malformed(&document.origin, "document has no root element"));
        }

        Ok(document)
    }

    /// Create an empty document with the given root element.
    pub fn with_root(origin: impl Into<String>, root_name: &str) -> (Self, NodeId) {
        let mut document = Self {
            origin: origin.into(),
            declaration: Some(Declaration {
                version: "1.0".to_string(),
                encoding: Some("utf-8".to_string()),
                standalone: None,
            }),
            ..Self::default()
        };
        let root = document.push(
            NodeData::Element {
                name: root_name.to_string(),
                attributes: Vec::new(),
            },
            None,
        );
        (document, root)
    }

    /// Serialize the document, indenting elements by two spaces.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        if let Some(decl) = &self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))?;
        }
        if let Some(doctype) = &self.doctype {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
        }
        for &id in &self.top_level {
            self.write_node(&mut writer, id)?;
        }

        Ok(writer.into_inner())
    }

    /// Serialize and write the document to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|err| {
            KnxError::io(format!("Failed to write XML document to {}", path.display()), err)
        })
    }

    /// Path or label the document was created from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// First top-level element
    pub fn root(&self) -> Option<NodeId> {
        self.top_level.iter().copied().find(|&id| self.is_element(id))
    }

    /// Whether the node is an element (as opposed to text, comments, ...)
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    /// Qualified element name, empty for non-element nodes
    pub fn name(&self, id: NodeId) -> &str {
        match &self.node(id).data {
            NodeData::Element { name, .. } => name,
            _ => "",
        }
    }

    /// Element name without its prefix
    pub fn local_name(&self, id: NodeId) -> &str {
        let name = self.name(id);
        name.split_once(':').map_or(name, |(_, local)| local)
    }

    /// Text content of a text or CDATA node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(value) | NodeData::CData(value) => Some(value),
            _ => None,
        }
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Set (or add) an attribute. Attribute order is preserved on update.
    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: impl Into<String>) {
        if let NodeData::Element { attributes, .. } = &mut self.nodes[id.0].data {
            let value = value.into();
            match attributes.iter_mut().find(|(name, _)| name == key) {
                Some(existing) => existing.1 = value,
                None => attributes.push((key.to_string(), value)),
            }
        }
    }

    /// Append a new child element and return its handle.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push(
            NodeData::Element {
                name: name.to_string(),
                attributes: Vec::new(),
            },
            Some(parent),
        )
    }

    /// Parent node, `None` for top-level and detached nodes
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Direct children in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// All descendants of `id` in document order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Namespace URI an element belongs to, resolved through `xmlns` declarations.
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let name = self.name(id);
        let declaration = match name.split_once(':') {
            Some((prefix, _)) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|candidate| self.attribute(candidate, &declaration))
    }

    /// Whether `id` is an element with the given local name in `namespace`
    pub fn is_named(&self, id: NodeId, namespace: &Namespace, local: &str) -> bool {
        self.is_element(id)
            && self.local_name(id) == local
            && namespace.matches(self.namespace_uri(id))
    }

    /// Every attached element named `local` in `namespace`, in document order
    pub fn find_all(&self, namespace: &Namespace, local: &str) -> Vec<NodeId> {
        self.top_level
            .iter()
            .flat_map(|&top| std::iter::once(top).chain(self.descendants(top)))
            .filter(|&id| self.is_named(id, namespace, local))
            .collect()
    }

    /// Descendants of `id` named `local` in `namespace`, in document order
    pub fn find_descendants(&self, id: NodeId, namespace: &Namespace, local: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&candidate| self.is_named(candidate, namespace, local))
            .collect()
    }

    /// Nearest ancestor named `local` in `namespace`
    pub fn nearest_ancestor(&self, id: NodeId, namespace: &Namespace, local: &str) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&candidate| self.is_named(candidate, namespace, local))
    }

    /// Remove a node (and its subtree) from the tree.
    pub fn detach(&mut self, id: NodeId) {
        match self.nodes[id.0].parent.take() {
            Some(parent) => self.nodes[parent.0].children.retain(|&child| child != id),
            None => self.top_level.retain(|&top| top != id),
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.top_level.push(id),
        }
        id
    }

    fn read_element(&self, tag: &BytesStart<'_>) -> Result<NodeData> {
        let name = std::str::from_utf8(tag.name().as_ref())
            .map_err(|err| KnxError::malformed(&self.origin, format!("element name: {err}")))?
            .to_string();

        let mut attributes = Vec::new();
        for attr in tag.attributes() {
            let attr = attr.map_err(|err| {
                KnxError::malformed(&self.origin, format!("attribute on <{name}>: {err}"))
            })?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| KnxError::malformed(&self.origin, format!("attribute name: {err}")))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| {
                    KnxError::malformed(&self.origin, format!("attribute {key} on <{name}>: {err}"))
                })?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(NodeData::Element { name, attributes })
    }

    fn read_declaration(&self, decl: &BytesDecl<'_>) -> Result<Declaration> {
        let lossy = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        let version = decl
            .version()
            .map_err(|err| KnxError::malformed(&self.origin, format!("XML declaration: {err}")))?;
        Ok(Declaration {
            version: lossy(&version),
            encoding: decl.encoding().and_then(|value| value.ok()).map(|v| lossy(&v)),
            standalone: decl.standalone().and_then(|value| value.ok()).map(|v| lossy(&v)),
        })
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        let node = self.node(id);
        match &node.data {
            NodeData::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    start.push_attribute(Attribute {
                        key: QName(key.as_bytes()),
                        value: Cow::Owned(escape_attribute(value).into_bytes()),
                    });
                }
                if node.children.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            NodeData::Text(value) => {
                writer.write_event(Event::Text(BytesText::new(value)))?;
            }
            NodeData::CData(value) => {
                writer.write_event(Event::CData(BytesCData::new(value.as_str())))?;
            }
            NodeData::Comment(value) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(value.as_str())))?;
            }
            NodeData::ProcessingInstruction(value) => {
                writer.write_event(Event::PI(BytesText::from_escaped(value.as_str())))?;
            }
        }
        Ok(())
    }
}

/// Escape an attribute value, keeping whitespace that attribute normalization would flatten.
fn escape_attribute(value: &str) -> String {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped.into_owned();
    }
    escaped
        .replace('\r', "&#xD;")
        .replace('\n', "&#xA;")
        .replace('\t', "&#x9;")
}
