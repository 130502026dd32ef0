//! Removal specifiers: which element of a document to remove.
//!
//! A specifier is either a bare tag name, matched anywhere below the root element, or a
//! path relative to the root element. Both resolve to at most one element: the first
//! match in depth-first pre-order.

use crate::document::Document;
use crate::element::Element;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Name(String),
}

impl NameTest {
    fn matches(&self, document: &Document, element: Element) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Name(name) => element.full_name(document) == name,
        }
    }
}

impl fmt::Display for NameTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameTest::Any => write!(f, "*"),
            NameTest::Name(name) => write!(f, "{}", name),
        }
    }
}

/// One step of a relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `.`
    Current,
    /// `name` or `*`
    Child(NameTest),
    /// `//name` or `//*`
    Descendant(NameTest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specifier {
    /// First element with this tag anywhere below the root element.
    Tag(String),
    /// First element reachable from the root element by these steps.
    Path(Vec<Step>),
}

impl Specifier {
    pub fn tag<S: Into<String>>(name: S) -> Specifier {
        Specifier::Tag(name.into())
    }

    /// `.//parent/child`: a `child` of a `parent` at any depth below the root.
    pub fn descendant_child<P, C>(parent: P, child: C) -> Specifier
    where
        P: Into<String>,
        C: Into<String>,
    {
        Specifier::Path(vec![
            Step::Current,
            Step::Descendant(NameTest::Name(parent.into())),
            Step::Child(NameTest::Name(child.into())),
        ])
    }

    /// Resolve against `document`. Returns `None` if nothing matches.
    pub fn find(&self, document: &Document) -> Option<Element> {
        let root = document.root_element()?;
        match self {
            Specifier::Tag(name) => root
                .child_elements_recursive(document)
                .into_iter()
                .find(|elem| elem.full_name(document) == name),
            Specifier::Path(steps) => {
                let matched = evaluate_path(document, root, steps);
                if matched.is_empty() {
                    return None;
                }
                let matched: HashSet<Element> = matched.into_iter().collect();
                preorder(document, root)
                    .into_iter()
                    .find(|elem| matched.contains(elem))
            }
        }
    }
}

fn preorder(document: &Document, root: Element) -> Vec<Element> {
    let mut elems = vec![root];
    elems.extend(root.child_elements_recursive(document));
    elems
}

fn evaluate_path(document: &Document, root: Element, steps: &[Step]) -> Vec<Element> {
    let mut context = vec![root];
    for step in steps {
        let mut next = Vec::new();
        let mut seen = HashSet::new();
        for elem in &context {
            let candidates = match step {
                Step::Current => vec![*elem],
                Step::Child(test) => elem
                    .child_elements(document)
                    .into_iter()
                    .filter(|child| test.matches(document, *child))
                    .collect(),
                Step::Descendant(test) => elem
                    .child_elements_recursive(document)
                    .into_iter()
                    .filter(|child| test.matches(document, *child))
                    .collect(),
            };
            for candidate in candidates {
                if seen.insert(candidate) {
                    next.push(candidate);
                }
            }
        }
        if next.is_empty() {
            return next;
        }
        context = next;
    }
    context
}

impl FromStr for Specifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Specifier> {
        let invalid = |reason: &str| Error::InvalidSpecifier(format!("'{}': {}", s, reason));
        if s.is_empty() {
            return Err(invalid("empty"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        if !s.contains('/') && s != "." && s != "*" {
            return Ok(Specifier::Tag(s.to_string()));
        }
        if s.starts_with('/') {
            return Err(invalid("absolute paths are not supported"));
        }
        if s.ends_with('/') {
            return Err(invalid("path ends with '/'"));
        }

        let mut steps = Vec::new();
        let mut descendant = false;
        for segment in s.split('/') {
            if segment.is_empty() {
                if descendant {
                    return Err(invalid("'///' is not a path step"));
                }
                descendant = true;
                continue;
            }
            let test = match segment {
                "." if !descendant => {
                    steps.push(Step::Current);
                    continue;
                }
                "." | ".." => return Err(invalid("unsupported step")),
                "*" => NameTest::Any,
                name => NameTest::Name(name.to_string()),
            };
            steps.push(if descendant {
                Step::Descendant(test)
            } else {
                Step::Child(test)
            });
            descendant = false;
        }
        Ok(Specifier::Path(steps))
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::Tag(name) => write!(f, "{}", name),
            Specifier::Path(steps) => {
                for (i, step) in steps.iter().enumerate() {
                    match step {
                        Step::Current => {
                            if i > 0 {
                                write!(f, "/")?;
                            }
                            write!(f, ".")?;
                        }
                        Step::Child(test) => {
                            if i > 0 {
                                write!(f, "/")?;
                            }
                            write!(f, "{}", test)?;
                        }
                        Step::Descendant(test) => {
                            if i > 0 {
                                write!(f, "/")?;
                            }
                            write!(f, "/{}", test)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
