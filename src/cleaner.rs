//! Directory passes over saved settings.
//!
//! A run cleans the base directory and then each configured subfolder. In every
//! directory the file named like the settings file is cleaned with the settings list and
//! every other `.xml` file with the generic list.

use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::parser::ReadOptions;
use crate::remover::{remove_elements, RemovalList};
use std::path::{Path, PathBuf};

/// `base`, or `base/subfolder`. Does not check that the result exists.
pub fn resolve_directory(base: &Path, subfolder: Option<&str>) -> PathBuf {
    match subfolder {
        Some(sub) => base.join(sub),
        None => base.to_path_buf(),
    }
}

/// `.xml` files of one directory, split by removal list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct XmlFiles {
    /// Sorted by file name.
    pub generic: Vec<PathBuf>,
    pub settings: Option<PathBuf>,
}

impl XmlFiles {
    pub fn len(&self) -> usize {
        self.generic.len() + self.settings.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// List the regular files in `dir` whose name ends with `.xml`.
///
/// # Errors
///
/// - [`Error::DirectoryNotFound`]: `dir` does not exist or cannot be listed.
pub fn enumerate_xml_files(dir: &Path, settings_file_name: &str) -> Result<XmlFiles> {
    let not_found = |source| Error::DirectoryNotFound {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = XmlFiles::default();
    for entry in std::fs::read_dir(dir).map_err(not_found)? {
        let entry = entry.map_err(not_found)?;
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(name) => name,
            None => {
                log::debug!("skipping non utf-8 file name {:?}", name);
                continue;
            }
        };
        if !name.ends_with(".xml") {
            continue;
        }
        let path = entry.path();
        // follows symlinks
        if !path.is_file() {
            continue;
        }
        if name == settings_file_name {
            files.settings = Some(path);
        } else {
            files.generic.push(path);
        }
    }
    files.generic.sort();
    Ok(files)
}

/// Which removal list a file is cleaned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Generic,
    Settings,
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub kind: FileKind,
    /// Specifiers that removed an element.
    pub removed: Vec<String>,
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    pub cleaned: Vec<FileReport>,
    pub failed: Vec<FileFailure>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub directories: Vec<DirectoryReport>,
}

impl RunReport {
    pub fn files_cleaned(&self) -> usize {
        self.directories.iter().map(|d| d.cleaned.len()).sum()
    }

    pub fn elements_removed(&self) -> usize {
        self.directories
            .iter()
            .flat_map(|d| d.cleaned.iter())
            .map(|f| f.removed.len())
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.directories.iter().flat_map(|d| d.failed.iter())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Apply `list` to an in-memory document.
///
/// # Errors
///
/// - [`Error::MalformedXML`]: the document has no root element.
/// - [`Error::RootRemoval`]: a specifier matched the root element.
pub fn clean_document(document: &mut Document, list: &RemovalList) -> Result<Vec<String>> {
    if document.root_element().is_none() {
        return Err(Error::MalformedXML("No root element".to_string()));
    }
    remove_elements(document, list)
}

pub struct Cleaner {
    base: PathBuf,
    subfolders: Vec<String>,
    settings_file: String,
    isolate_failures: bool,
    indent: usize,
    generic: RemovalList,
    settings: RemovalList,
}

impl Cleaner {
    /// Cleaner with the built-in lists, cleaning `base` and its default subfolder.
    pub fn new<P: Into<PathBuf>>(base: P) -> Cleaner {
        let config = Config::default();
        Cleaner {
            base: base.into(),
            subfolders: config.subfolders,
            settings_file: config.settings_file,
            isolate_failures: config.isolate_failures,
            indent: config.indent,
            generic: RemovalList::generic(),
            settings: RemovalList::settings(),
        }
    }

    /// # Errors
    ///
    /// - [`Error::InvalidSpecifier`]: a configured removal list could not be parsed.
    /// - [`Error::Config`] / [`Error::Io`]: no base directory could be determined.
    pub fn from_config(config: &Config) -> Result<Cleaner> {
        Ok(Cleaner {
            base: config.base_directory()?,
            subfolders: config.subfolders.clone(),
            settings_file: config.settings_file.clone(),
            isolate_failures: config.isolate_failures,
            indent: config.indent,
            generic: config.generic_list()?,
            settings: config.settings_list()?,
        })
    }

    pub fn with_subfolders(mut self, subfolders: Vec<String>) -> Cleaner {
        self.subfolders = subfolders;
        self
    }

    pub fn with_lists(mut self, generic: RemovalList, settings: RemovalList) -> Cleaner {
        self.generic = generic;
        self.settings = settings;
        self
    }

    pub fn isolate_failures(mut self, isolate: bool) -> Cleaner {
        self.isolate_failures = isolate;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Clean the base directory, then every subfolder.
    ///
    /// # Errors
    ///
    /// - [`Error::DirectoryNotFound`]: aborts the run, even if earlier passes succeeded.
    /// - [`Error::File`]: first failing file, only when failures are not isolated.
    pub fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let passes = std::iter::once(None).chain(self.subfolders.iter().map(|s| Some(s.as_str())));
        for subfolder in passes {
            let dir = resolve_directory(&self.base, subfolder);
            report.directories.push(self.clean_directory(&dir)?);
        }
        log::info!(
            "cleaned {} file(s), removed {} element(s)",
            report.files_cleaned(),
            report.elements_removed()
        );
        Ok(report)
    }

    pub fn clean_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        log::info!("cleaning {}", dir.display());
        let files = enumerate_xml_files(dir, &self.settings_file)?;
        let mut report = DirectoryReport {
            directory: dir.to_path_buf(),
            cleaned: Vec::with_capacity(files.len()),
            failed: Vec::new(),
        };
        let jobs = files
            .generic
            .into_iter()
            .map(|path| (path, FileKind::Generic))
            .chain(files.settings.map(|path| (path, FileKind::Settings)));
        for (path, kind) in jobs {
            let list = match kind {
                FileKind::Generic => &self.generic,
                FileKind::Settings => &self.settings,
            };
            match self.clean_file(&path, list) {
                Ok(removed) => report.cleaned.push(FileReport {
                    path,
                    kind,
                    removed,
                }),
                Err(error) if self.isolate_failures => {
                    log::warn!("skipping {}: {}", path.display(), error);
                    report.failed.push(FileFailure { path, error });
                }
                Err(error) => return Err(error.in_file(path)),
            }
        }
        Ok(report)
    }

    /// Parse `path`, remove the elements of `list` and write the file back once.
    pub fn clean_file(&self, path: &Path, list: &RemovalList) -> Result<Vec<String>> {
        let opts = ReadOptions {
            require_decl: false,
            ..ReadOptions::default()
        };
        let mut document = Document::parse_file_with_opts(path, opts)?;
        let removed = clean_document(&mut document, list)?;
        document.write_file(path, self.indent)?;
        log::info!(
            "{}: removed {} element(s)",
            path.display(),
            removed.len()
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_directory() {
        let base = Path::new("/opt/visuals");
        assert_eq!(resolve_directory(base, None), PathBuf::from("/opt/visuals"));
        assert_eq!(
            resolve_directory(base, Some("pseyesettings")),
            PathBuf::from("/opt/visuals/pseyesettings")
        );
    }

    #[test]
    fn test_enumerate_partitions_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["b.xml", "a.xml", "settings.xml", "notes.txt", "A.XML", "x.xml.bak"] {
            fs::write(dir.path().join(name), "<a/>").unwrap();
        }
        fs::create_dir(dir.path().join("folder.xml")).unwrap();

        let files = enumerate_xml_files(dir.path(), "settings.xml").unwrap();
        assert_eq!(
            files.generic,
            vec![dir.path().join("a.xml"), dir.path().join("b.xml")]
        );
        assert_eq!(files.settings, Some(dir.path().join("settings.xml")));
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_enumerate_settings_name_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Settings.xml"), "<a/>").unwrap();
        fs::write(dir.path().join("oldsettings.xml"), "<a/>").unwrap();
        let files = enumerate_xml_files(dir.path(), "settings.xml").unwrap();
        assert_eq!(files.settings, None);
        // the name must match exactly, a shared suffix is not enough
        assert_eq!(
            files.generic,
            vec![
                dir.path().join("Settings.xml"),
                dir.path().join("oldsettings.xml")
            ]
        );
    }

    #[test]
    fn test_enumerate_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = enumerate_xml_files(&missing, "settings.xml").unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { ref path, .. } if *path == missing));
    }

    #[test]
    fn test_clean_document_without_root() {
        let mut doc = Document::new();
        let err = clean_document(&mut doc, &RemovalList::generic()).unwrap_err();
        assert!(matches!(err, Error::MalformedXML(_)));
    }
}
