use crate::document::{Document, Node};
use crate::error::{Error, Result};

#[derive(Debug)]
pub(crate) struct ElementData {
    full_name: String,
    attributes: Vec<(String, String)>, // document order, values unescaped
    parent: Option<Element>,
    children: Vec<Node>,
}

/// Represents an Xml Element.
///
/// This struct only contains a unique usize id and implements trait `Copy`.
/// So you do not need to bother with having a reference.
///
/// Because the actual data of the element is stored in [`Document`],
/// most methods takes `&Document` or `&mut Document` as its first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element {
    id: usize,
}

impl Element {
    pub(crate) fn with_data(
        document: &mut Document,
        full_name: String,
        attributes: Vec<(String, String)>,
    ) -> Element {
        let elem = Element {
            id: document.counter,
        };
        let elem_data = ElementData {
            full_name,
            attributes,
            parent: None,
            children: vec![],
        };
        document.store.push(elem_data);
        document.counter += 1;
        elem
    }

    pub(crate) fn container() -> (Element, ElementData) {
        let elem_data = ElementData {
            full_name: String::new(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
        };
        (Element { id: 0 }, elem_data)
    }

    /// The container holds the top level nodes of a document and is never part of the tree.
    pub fn is_container(&self) -> bool {
        self.id == 0
    }
}

impl Element {
    fn data<'a>(&self, document: &'a Document) -> &'a ElementData {
        &document.store[self.id]
    }

    fn mut_data<'a>(&self, document: &'a mut Document) -> &'a mut ElementData {
        &mut document.store[self.id]
    }

    /// Get raw name of element, including its namespace prefix.
    pub fn full_name<'a>(&self, document: &'a Document) -> &'a str {
        &self.data(document).full_name
    }

    /// Attributes in the order they appeared in the source.
    pub fn attributes<'a>(&self, document: &'a Document) -> &'a [(String, String)] {
        &self.data(document).attributes
    }

    pub fn attribute<'a>(&self, document: &'a Document, key: &str) -> Option<&'a str> {
        self.attributes(document)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn parent(&self, document: &Document) -> Option<Element> {
        self.data(document).parent
    }

    pub fn children<'a>(&self, document: &'a Document) -> &'a Vec<Node> {
        &self.data(document).children
    }

    pub fn has_children(&self, document: &Document) -> bool {
        !self.children(document).is_empty()
    }

    pub fn child_elements(&self, document: &Document) -> Vec<Element> {
        self.children(document)
            .iter()
            .filter_map(|node| node.as_element())
            .collect()
    }

    fn _child_elements_recursive(&self, document: &Document, elems: &mut Vec<Element>) {
        for node in self.children(document) {
            if let Node::Element(elem) = node {
                elems.push(*elem);
                elem._child_elements_recursive(document, elems);
            }
        }
    }

    /// All descendant elements in depth-first pre-order, excluding self.
    pub fn child_elements_recursive(&self, document: &Document) -> Vec<Element> {
        let mut elems = Vec::new();
        self._child_elements_recursive(document, &mut elems);
        elems
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self, document: &Document) -> String {
        let mut buf = String::new();
        self.build_text_content(document, &mut buf);
        buf
    }

    pub(crate) fn build_text_content(&self, document: &Document, buf: &mut String) {
        for node in self.children(document) {
            node.build_text_content(document, buf);
        }
    }

    /// Equivalent to `vec.push()`.
    ///
    /// # Errors
    ///
    /// - [`Error::HasAParent`]: If node is an element, it must not have a parent.
    /// - [`Error::ContainerCannotMove`]: The container can never be a child.
    pub fn push_child(&self, document: &mut Document, node: Node) -> Result<()> {
        if let Node::Element(elem) = node {
            if elem.is_container() {
                return Err(Error::ContainerCannotMove);
            }
            let data = elem.mut_data(document);
            if data.parent.is_some() {
                return Err(Error::HasAParent);
            }
            data.parent = Some(*self);
        }
        self.mut_data(document).children.push(node);
        Ok(())
    }

    /// Remove child element by value. Other children keep their relative order.
    ///
    /// # Errors
    ///
    /// - [Error::NotFound]: Element was not found among its children.
    pub fn remove_child_elem(&self, document: &mut Document, element: Element) -> Result<()> {
        let children = &mut self.mut_data(document).children;
        let pos = children
            .iter()
            .position(|node| node.as_element() == Some(element))
            .ok_or(Error::NotFound)?;
        children.remove(pos);
        element.mut_data(document).parent = None;
        Ok(())
    }
}
