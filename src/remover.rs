use crate::document::Document;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::specifier::Specifier;
use std::collections::HashMap;
use std::str::FromStr;

/// Elements removed from every `.xml` file except `settings.xml`.
pub const GENERIC_REMOVALS: &[&str] = &[
    "fullscreen__F_",
    "show_gui__G_",
    "Source_mode__z_",
    "Send_to_Spout",
    "average_FPS",
    "minimum_FPS",
    ".//settings_transition/Transition_time",
    ".//settings_transition/Settings_file",
    ".//settings_transition/Jump_between_interval",
    ".//settings_transition/Jump_between_states",
    ".//settings_transition/UnknownName",
];

/// Elements removed from `settings.xml`.
pub const SETTINGS_REMOVALS: &[&str] = &[
    "fullscreen__F_",
    "show_gui__G_",
    "Source_mode__z_",
    "Send_to_Spout",
    ".//settings_transition/Settings_file",
    ".//settings_transition/UnknownName",
];

const NESTED_PREFIX: &str = ".//";

/// Ordered list of removal specifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalList {
    specifiers: Vec<Specifier>,
}

impl RemovalList {
    pub fn new(specifiers: Vec<Specifier>) -> RemovalList {
        RemovalList { specifiers }
    }

    /// # Errors
    ///
    /// - [`Error::InvalidSpecifier`]: one of the entries could not be parsed.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<RemovalList> {
        let specifiers = entries
            .iter()
            .map(|entry| Specifier::from_str(entry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(RemovalList { specifiers })
    }

    pub fn generic() -> RemovalList {
        Self::builtin(GENERIC_REMOVALS)
    }

    pub fn settings() -> RemovalList {
        Self::builtin(SETTINGS_REMOVALS)
    }

    // Built-in entries are plain tags or `.//parent/child`, which always parse.
    fn builtin(entries: &[&str]) -> RemovalList {
        let specifiers = entries
            .iter()
            .map(|entry| {
                let nested = entry
                    .strip_prefix(NESTED_PREFIX)
                    .and_then(|rest| rest.split_once('/'));
                match nested {
                    Some((parent, child)) => Specifier::descendant_child(parent, child),
                    None => Specifier::tag(*entry),
                }
            })
            .collect();
        RemovalList { specifiers }
    }

    pub fn specifiers(&self) -> &[Specifier] {
        &self.specifiers
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }
}

/// Maps every element below the root element to its parent.
///
/// Built once per document before anything is removed.
#[derive(Debug, Default)]
pub struct ParentIndex {
    parents: HashMap<Element, Element>,
}

impl ParentIndex {
    pub fn build(document: &Document) -> ParentIndex {
        let mut parents = HashMap::new();
        if let Some(root) = document.root_element() {
            let mut stack = vec![root];
            while let Some(elem) = stack.pop() {
                for child in elem.child_elements(document) {
                    parents.insert(child, elem);
                    stack.push(child);
                }
            }
        }
        ParentIndex { parents }
    }

    pub fn parent_of(&self, element: Element) -> Option<Element> {
        self.parents.get(&element).copied()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Remove the first match of every specifier in `list`, in list order.
///
/// Specifiers that match nothing are skipped. Returns the specifiers that removed an
/// element, in textual form.
///
/// # Errors
///
/// - [`Error::RootRemoval`]: a specifier matched the root element.
pub fn remove_elements(document: &mut Document, list: &RemovalList) -> Result<Vec<String>> {
    let index = ParentIndex::build(document);
    let mut removed = Vec::new();
    for specifier in list.specifiers() {
        let element = match specifier.find(document) {
            Some(element) => element,
            None => continue,
        };
        let parent = index
            .parent_of(element)
            .ok_or_else(|| Error::RootRemoval(specifier.to_string()))?;
        parent.remove_child_elem(document, element)?;
        log::debug!("removed <{}> ({})", element.full_name(document), specifier);
        removed.push(specifier.to_string());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(doc: &Document, elem: Element) -> Vec<String> {
        elem.child_elements(doc)
            .iter()
            .map(|e| e.full_name(doc).to_string())
            .collect()
    }

    #[test]
    fn test_builtin_lists_parse_the_same() {
        assert_eq!(
            RemovalList::generic(),
            RemovalList::parse(GENERIC_REMOVALS).unwrap()
        );
        assert_eq!(
            RemovalList::settings(),
            RemovalList::parse(SETTINGS_REMOVALS).unwrap()
        );
        assert_eq!(RemovalList::generic().len(), 11);
        assert_eq!(RemovalList::settings().len(), 6);
    }

    #[test]
    fn test_settings_list_is_subset_of_generic() {
        let generic = RemovalList::generic();
        for spec in RemovalList::settings().specifiers() {
            assert!(generic.specifiers().contains(spec), "{}", spec);
        }
    }

    #[test]
    fn test_parent_index() {
        let doc = Document::from_str("<r><a><b/></a><c/></r>").unwrap();
        let index = ParentIndex::build(&doc);
        let r = doc.root_element().unwrap();
        let a = r.child_elements(&doc)[0];
        let b = a.child_elements(&doc)[0];
        assert_eq!(index.len(), 3);
        assert_eq!(index.parent_of(b), Some(a));
        assert_eq!(index.parent_of(a), Some(r));
        assert_eq!(index.parent_of(r), None);
    }

    #[test]
    fn test_remove_direct_child_of_root() {
        let mut doc = Document::from_str(
            "<settings><speed>2</speed><fullscreen__F_>1</fullscreen__F_><color>red</color></settings>",
        )
        .unwrap();
        let removed = remove_elements(&mut doc, &RemovalList::generic()).unwrap();
        assert_eq!(removed, vec!["fullscreen__F_".to_string()]);
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["speed", "color"]);
    }

    #[test]
    fn test_remove_path_keeps_parent_and_siblings() {
        let mut doc = Document::from_str(
            "<settings><settings_transition><Transition_time>5</Transition_time><Keep_me>x</Keep_me></settings_transition></settings>",
        )
        .unwrap();
        remove_elements(&mut doc, &RemovalList::generic()).unwrap();
        let root = doc.root_element().unwrap();
        let transition = root.child_elements(&doc)[0];
        assert_eq!(transition.full_name(&doc), "settings_transition");
        assert_eq!(names(&doc, transition), vec!["Keep_me"]);
        assert_eq!(transition.text_content(&doc), "x");
    }

    #[test]
    fn test_nested_transition_is_reached() {
        let mut doc = Document::from_str(
            "<settings><scene><settings_transition>\
                <UnknownName>?</UnknownName>\
                <Settings_file>next.xml</Settings_file>\
                <Jump_between_states>1</Jump_between_states>\
            </settings_transition></scene></settings>",
        )
        .unwrap();
        let removed = remove_elements(&mut doc, &RemovalList::settings()).unwrap();
        assert_eq!(
            removed,
            vec![
                ".//settings_transition/Settings_file".to_string(),
                ".//settings_transition/UnknownName".to_string(),
            ]
        );
        let root = doc.root_element().unwrap();
        let transition = root.child_elements(&doc)[0].child_elements(&doc)[0];
        assert_eq!(names(&doc, transition), vec!["Jump_between_states"]);
    }

    #[test]
    fn test_no_match_is_noop() {
        let xml = r#"<settings><speed unit="bpm">120</speed><name>x</name></settings>"#;
        let mut doc = Document::from_str(xml).unwrap();
        let before = doc.write_str().unwrap();
        let removed = remove_elements(&mut doc, &RemovalList::generic()).unwrap();
        assert!(removed.is_empty());
        assert_eq!(doc.write_str().unwrap(), before);
    }

    #[test]
    fn test_only_first_match_is_removed() {
        let mut doc = Document::from_str("<r><x>1</x><y><x>2</x></y></r>").unwrap();
        let list = RemovalList::parse(&["x"]).unwrap();
        remove_elements(&mut doc, &list).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["y"]);
        assert_eq!(root.text_content(&doc), "2");
    }

    #[test]
    fn test_root_named_like_entry_is_kept() {
        let mut doc = Document::from_str("<fullscreen__F_><a>1</a></fullscreen__F_>").unwrap();
        let removed = remove_elements(&mut doc, &RemovalList::generic()).unwrap();
        assert!(removed.is_empty());
        assert_eq!(doc.root_element().unwrap().full_name(&doc), "fullscreen__F_");
    }

    #[test]
    fn test_root_removal_is_an_error() {
        let mut doc = Document::from_str("<settings><a/></settings>").unwrap();
        let list = RemovalList::parse(&["."]).unwrap();
        let err = remove_elements(&mut doc, &list).unwrap_err();
        assert!(matches!(err, Error::RootRemoval(ref spec) if spec == "."));
    }

    #[test]
    fn test_settings_list_keeps_transition_timing() {
        let xml = "<settings>\
            <show_gui__G_>1</show_gui__G_>\
            <average_FPS>60</average_FPS>\
            <settings_transition>\
                <Transition_time>5</Transition_time>\
                <Settings_file>b.xml</Settings_file>\
            </settings_transition>\
        </settings>";
        let mut doc = Document::from_str(xml).unwrap();
        remove_elements(&mut doc, &RemovalList::settings()).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(names(&doc, root), vec!["average_FPS", "settings_transition"]);
        let transition = root.child_elements(&doc)[1];
        assert_eq!(names(&doc, transition), vec!["Transition_time"]);
    }
}
