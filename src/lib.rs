//! Strip display-mode elements from saved xml settings.
//!
//! Saved settings carry flags such as fullscreen or GUI visibility and transition timing.
//! Loading them back would switch the current display mode, so before settings are
//! reloaded or handed out, [`Cleaner`] removes those elements from every `.xml` file of a
//! directory and rewrites the files in place.
//!
//! ```no_run
//! use settings_scrub::Cleaner;
//!
//! let report = Cleaner::new("/opt/visuals").run()?;
//! println!("removed {} element(s)", report.elements_removed());
//! # Ok::<(), settings_scrub::Error>(())
//! ```
//!
//! Documents are kept in an arena: [`Element`] is a `Copy` id and most methods take the
//! owning [`Document`] as first argument.

mod cleaner;
mod config;
mod document;
mod element;
mod error;
mod parser;
mod remover;
mod specifier;

pub use crate::cleaner::{
    clean_document, enumerate_xml_files, resolve_directory, Cleaner, DirectoryReport,
    FileFailure, FileKind, FileReport, RunReport, XmlFiles,
};
pub use crate::config::{Config, CONFIG_FILE_NAME, PSEYE_SUBFOLDER, SETTINGS_FILE_NAME};
pub use crate::document::{Document, Node};
pub use crate::element::Element;
pub use crate::error::{Error, Result};
pub use crate::parser::ReadOptions;
pub use crate::remover::{
    remove_elements, ParentIndex, RemovalList, GENERIC_REMOVALS, SETTINGS_REMOVALS,
};
pub use crate::specifier::{NameTest, Specifier, Step};
