use crate::element::{Element, ElementData};
use crate::error::{Error, Result};
use crate::parser::{DocumentParser, ReadOptions};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
    PI(String),
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<Element> {
        match self {
            Self::Element(elem) => Some(*elem),
            _ => None,
        }
    }

    pub(crate) fn build_text_content(&self, document: &Document, buf: &mut String) {
        match self {
            Node::Element(elem) => elem.build_text_content(document, buf),
            Node::Text(text) => buf.push_str(text),
            Node::CData(text) => buf.push_str(text),
            _ => {}
        }
    }
}

/// Represents a XML document.
///
/// Element data lives in an arena owned by the document; [`Element`] is only an index
/// into it. Top level nodes (the root element, comments, doctype...) are children of a
/// hidden container element.
///
/// # Examples
/// ```
/// use settings_scrub::Document;
/// use std::str::FromStr;
///
/// let doc = Document::from_str(r#"<?xml version="1.0" encoding="UTF-8"?>
/// <settings>
///     <fullscreen__F_>1</fullscreen__F_>
/// </settings>
/// "#).unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(root.full_name(&doc), "settings");
/// ```
#[derive(Debug)]
pub struct Document {
    pub(crate) counter: usize, // == self.store.len()
    pub(crate) store: Vec<ElementData>,
    container: Element,

    pub(crate) version: String, // empty if the source had no xml declaration
    pub(crate) standalone: bool,
}

impl Document {
    /// Create a blank new xml document.
    pub fn new() -> Document {
        let (container, container_data) = Element::container();
        Document {
            counter: 1, // because container is id 0
            store: vec![container_data],
            container,
            version: String::new(),
            standalone: false,
        }
    }

    pub fn container(&self) -> Element {
        self.container
    }

    /// Get first element of document.
    pub fn root_element(&self) -> Option<Element> {
        self.container.child_elements(self).get(0).copied()
    }

    /// Whether the document will be written with an xml declaration.
    pub fn has_decl(&self) -> bool {
        !self.version.is_empty()
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

// Read and write
impl Document {
    pub fn parse_str(str: &str) -> Result<Document> {
        Self::parse_str_with_opts(str, ReadOptions::default())
    }

    pub fn parse_str_with_opts(str: &str, opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_bytes(str.as_bytes(), opts)
    }

    /// Parses xml from reader.
    ///
    /// # Errors
    ///
    /// - [`Error::CannotDecode`]: Could not decode XML.
    /// - [`Error::MalformedXML`]: Could not read XML.
    /// - [`Error::Io`]: IO Error
    pub fn parse_reader<R: Read>(mut reader: R) -> Result<Document> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        DocumentParser::parse_bytes(&bytes, ReadOptions::default())
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
        Self::parse_file_with_opts(path, ReadOptions::default())
    }

    pub fn parse_file_with_opts<P: AsRef<Path>>(path: P, opts: ReadOptions) -> Result<Document> {
        let bytes = std::fs::read(path)?;
        DocumentParser::parse_bytes(&bytes, opts)
    }

    /// Writes document as xml string.
    pub fn write_str(&self) -> Result<String> {
        let mut buf: Vec<u8> = Vec::with_capacity(200);
        self.write(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write document to writer. Will be written in UTF-8, indented with 4 spaces.
    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.write_with_indent(writer, 4)
    }

    pub fn write_with_indent(&self, writer: &mut impl Write, indent: usize) -> Result<()> {
        let container = self.container();
        let mut writer = Writer::new_with_indent(writer, b' ', indent);
        self.write_decl(&mut writer)?;
        self.write_nodes(&mut writer, container.children(self))?;
        writer.write_event(Event::Eof)?;
        Ok(())
    }

    /// Replace the file at `path` with this document.
    ///
    /// The document is written to a temporary file in the same directory which is then
    /// renamed over `path`, so the file is never left half written.
    pub fn write_file<P: AsRef<Path>>(&self, path: P, indent: usize) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        if let Ok(meta) = std::fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.write_with_indent(&mut writer, indent)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|err| Error::Io(err.error))?;
        Ok(())
    }

    fn write_decl(&self, writer: &mut Writer<impl Write>) -> Result<()> {
        if !self.has_decl() {
            return Ok(());
        }
        let standalone = match self.standalone {
            true => Some("yes".as_bytes()),
            false => None,
        };
        writer.write_event(Event::Decl(BytesDecl::new(
            self.version.as_bytes(),
            Some("UTF-8".as_bytes()),
            standalone,
        )))?;
        Ok(())
    }

    fn write_nodes(&self, writer: &mut Writer<impl Write>, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            match node {
                Node::Element(eid) => self.write_element(writer, *eid)?,
                Node::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_plain_str(text)))?
                }
                // DocType, Comment, CData, and PI content is kept raw.
                Node::DocType(text) => {
                    writer.write_event(Event::DocType(BytesText::from_escaped_str(text)))?
                }
                Node::Comment(text) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped_str(text)))?
                }
                Node::CData(text) => {
                    writer.write_event(Event::CData(BytesText::from_escaped_str(text)))?
                }
                Node::PI(text) => {
                    writer.write_event(Event::PI(BytesText::from_escaped_str(text)))?
                }
            };
        }
        Ok(())
    }

    fn write_element(&self, writer: &mut Writer<impl Write>, element: Element) -> Result<()> {
        let name_bytes = element.full_name(self).as_bytes();
        let mut start = BytesStart::borrowed_name(name_bytes);
        for (key, val) in element.attributes(self) {
            // (&str, &str) escapes the value
            start.push_attribute((key.as_str(), val.as_str()));
        }
        if element.has_children(self) {
            writer.write_event(Event::Start(start))?;
            self.write_nodes(writer, element.children(self))?;
            writer.write_event(Event::End(BytesEnd::borrowed(name_bytes)))?;
        } else {
            writer.write_event(Event::Empty(start))?;
        }
        Ok(())
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Document> {
        Document::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_holds_top_level_nodes() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <!-- saved -->
        <basic>
            Text
            <c />
        </basic>
        "#;
        let document = Document::from_str(xml).unwrap();
        let container = document.container();
        let basic = document.root_element().unwrap();
        assert_eq!(container.children(&document).len(), 2);
        assert_eq!(basic.parent(&document), Some(container));
        let c = basic.child_elements(&document)[0];
        assert_eq!(c.parent(&document), Some(basic));
        assert!(!c.has_children(&document));
    }

    #[test]
    fn test_decl_written_only_when_present() {
        let with_decl = Document::from_str(r#"<?xml version="1.0"?><a/>"#).unwrap();
        let xml = with_decl.write_str().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));

        let without_decl = Document::from_str("<a/>").unwrap();
        let xml = without_decl.write_str().unwrap();
        assert!(!xml.contains("<?xml"));
        assert!(xml.contains("<a/>"));
    }

    #[test]
    fn test_escape_round_trip() {
        let xml = r#"<root attr="&gt;&lt;&amp;&quot;"><inner>a &amp; b &lt; c</inner></root>"#;
        let doc = Document::from_str(xml).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(root.attribute(&doc, "attr"), Some("><&\""));
        assert_eq!(root.text_content(&doc), "a & b < c");

        let written = doc.write_str().unwrap();
        let reparsed = Document::from_str(&written).unwrap();
        let root = reparsed.root_element().unwrap();
        assert_eq!(root.attribute(&reparsed, "attr"), Some("><&\""));
        assert_eq!(root.text_content(&reparsed), "a & b < c");
    }

    #[test]
    fn test_write_file_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xml");
        std::fs::write(&path, "<old/>").unwrap();
        let doc = Document::from_str("<new><kept>1</kept></new>").unwrap();
        doc.write_file(&path, 2).unwrap();

        let reread = Document::parse_file(&path).unwrap();
        let root = reread.root_element().unwrap();
        assert_eq!(root.full_name(&reread), "new");
        assert_eq!(root.text_content(&reread), "1");
        // no temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
