use crate::document::{Document, Node};
use crate::element::Element;
use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// Options when parsing xml.
///
/// `empty_text_node`: <tag></tag> will have a Node::Text("") as its children, while <tag /> won't.
///
/// `require_decl`: fail with [`Error::MalformedXML`] if the document doesn't start with
/// an xml declaration. Without a declaration the document is read as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub empty_text_node: bool,
    pub require_decl: bool,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            empty_text_node: true,
            require_decl: false,
        }
    }
}

// Encoding given by the BOM or the byte pattern of `<?`, and the BOM length.
fn sniff_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some(found) = Encoding::for_bom(bytes) {
        return found;
    }
    match bytes {
        [0x00, 0x3c, 0x00, 0x3f, ..] => (UTF_16BE, 0),
        [0x3c, 0x00, 0x3f, 0x00, ..] => (UTF_16LE, 0),
        _ => (UTF_8, 0),
    }
}

// Encoding named in the xml declaration of an ASCII compatible document.
fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let label = match reader.read_event(&mut buf) {
        Ok(Event::Decl(ev)) => match ev.encoding() {
            Some(label) => label?.into_owned(),
            None => return Ok(None),
        },
        // anything else is reported by the real parse
        _ => return Ok(None),
    };
    let encoding = Encoding::for_label(&label).ok_or(Error::CannotDecode)?;
    // "UTF-16" without a BOM can't be told apart from its ASCII declaration
    if encoding == UTF_16LE || encoding == UTF_16BE {
        return Ok(None);
    }
    Ok(Some(encoding))
}

/// Decode a whole document to UTF-8.
pub(crate) fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (sniffed, bom_len) = sniff_encoding(bytes);
    let body = &bytes[bom_len..];
    let encoding = if sniffed == UTF_8 {
        declared_encoding(body)?.unwrap_or(UTF_8)
    } else {
        sniffed
    };
    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(Error::CannotDecode);
    }
    Ok(text)
}

pub(crate) struct DocumentParser {
    document: Document,
    read_opts: ReadOptions,
    element_stack: Vec<Element>,
}

impl DocumentParser {
    pub(crate) fn parse_bytes(bytes: &[u8], opts: ReadOptions) -> Result<Document> {
        let text = decode(bytes)?;
        let document = Document::new();
        let container = document.container();
        let mut parser = DocumentParser {
            document,
            read_opts: opts,
            element_stack: vec![container],
        };
        parser.parse_content(&text)?;
        Ok(parser.document)
    }

    fn handle_decl(&mut self, ev: &BytesDecl) -> Result<()> {
        self.document.version = String::from_utf8(ev.version()?.to_vec())?;
        self.document.standalone = match ev.standalone() {
            Some(res) => {
                let val = std::str::from_utf8(&*res?)?.to_lowercase();
                if val == "yes" {
                    true
                } else if val == "no" {
                    false
                } else {
                    return Err(Error::MalformedXML(
                        "Standalone Document Declaration has non boolean value".to_string(),
                    ));
                }
            }
            None => false,
        };
        Ok(())
    }

    fn current(&self) -> Element {
        // element_stack always holds at least the container
        self.element_stack[self.element_stack.len() - 1]
    }

    fn handle_bytes_start(&mut self, ev: &BytesStart) -> Result<Element> {
        let parent = self.current();
        if parent.is_container() && self.document.root_element().is_some() {
            return Err(Error::MalformedXML(
                "Found more than one root element".to_string(),
            ));
        }
        let full_name = String::from_utf8(ev.name().to_vec())?;
        let mut attributes = Vec::new();
        for attr in ev.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.to_vec())?;
            let value = String::from_utf8(attr.unescaped_value()?.to_vec())?;
            attributes.push((key, value));
        }
        let element = Element::with_data(&mut self.document, full_name, attributes);
        parent.push_child(&mut self.document, Node::Element(element))?;
        Ok(element)
    }

    fn push_node(&mut self, node: Node) -> Result<()> {
        let elem = self.current();
        elem.push_child(&mut self.document, node)
    }

    // Returns if document parsing is finished.
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Start(ref ev) => {
                let element = self.handle_bytes_start(ev)?;
                self.element_stack.push(element);
                Ok(false)
            }
            Event::End(ref ev) => {
                if self.element_stack.len() <= 1 {
                    return Err(Error::MalformedXML(format!(
                        "Closing tag without opening tag: {}",
                        String::from_utf8_lossy(ev.name())
                    )));
                }
                // quick-xml checks if tag names match for us
                let elem = self.current();
                self.element_stack.pop();
                if self.read_opts.empty_text_node {
                    // distinguish <tag></tag> and <tag />
                    if !elem.has_children(&self.document) {
                        elem.push_child(&mut self.document, Node::Text(String::new()))?;
                    }
                }
                Ok(false)
            }
            Event::Empty(ref ev) => {
                self.handle_bytes_start(ev)?;
                Ok(false)
            }
            Event::Text(ev) => {
                // indentation between tags is dropped, any other text is kept as is
                if ev.iter().all(u8::is_ascii_whitespace) {
                    return Ok(false);
                }
                let content = String::from_utf8(ev.unescaped()?.to_vec())?;
                self.push_node(Node::Text(content))?;
                Ok(false)
            }
            // DocType, Comment, CData, and PI content is kept raw.
            Event::DocType(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::DocType(content))?;
                Ok(false)
            }
            Event::Comment(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::Comment(content))?;
                Ok(false)
            }
            Event::CData(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::CData(content))?;
                Ok(false)
            }
            Event::PI(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::PI(content))?;
                Ok(false)
            }
            Event::Decl(_) => Err(Error::MalformedXML(
                "XML Declaration is only allowed at the start of file".to_string(),
            )),
            Event::Eof => Ok(true),
        }
    }

    fn parse_content(&mut self, text: &str) -> Result<()> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        let mut buf = Vec::with_capacity(200); // reduce time increasing capacity at start.

        match reader.read_event(&mut buf)? {
            Event::Decl(ref ev) => self.handle_decl(ev)?,
            _ if self.read_opts.require_decl => {
                return Err(Error::MalformedXML(
                    "Didn't find XML Declaration at the start of file".to_string(),
                ))
            }
            ev => {
                if self.handle_event(ev)? {
                    return self.finish();
                }
            }
        }
        loop {
            buf.clear();
            let ev = reader.read_event(&mut buf)?;
            log::trace!("{:?}", ev);
            if self.handle_event(ev)? {
                return self.finish();
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if self.element_stack.len() > 1 {
            let unclosed = self.current().full_name(&self.document);
            return Err(Error::MalformedXML(format!("Unclosed tag: {}", unclosed)));
        }
        Ok(())
    }
}
